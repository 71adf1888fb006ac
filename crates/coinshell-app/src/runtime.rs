//! Generic runtime for shell orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Shell`]: bridge, gate, router and binding
//! - [`Driver`]: platform-specific I/O

use std::time::Instant;

use crate::{Driver, Shell, ShellAction};

/// Generic runtime that orchestrates a [`Shell`] and a [`Driver`].
pub struct Runtime<D: Driver> {
    driver: D,
    shell: Shell,
}

impl<D: Driver> Runtime<D> {
    /// Create a runtime around an already configured shell.
    pub fn new(driver: D, shell: Shell) -> Self {
        Self { driver, shell }
    }

    /// Run the main loop until the shell or the driver asks to quit.
    ///
    /// Each iteration:
    /// 1. Polls the driver for input (or a refresh tick)
    /// 2. Hands input to the shell
    /// 3. Advances the shell's timers and runs one refresh cycle (drain
    ///    events, surface fee requests)
    /// 4. Executes the resulting actions through the driver
    ///
    /// On return, successful or not, the driver is stopped and the shell is
    /// shut down, so a backend thread still blocked on a fee request is
    /// released.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        let result = self.run_loop().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Driver failed");
        }

        self.driver.stop();
        self.shell.shutdown();
        result
    }

    async fn run_loop(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.shell)?;

        loop {
            if self.process_cycle().await? {
                return Ok(());
            }
        }
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        if let Some(input) = self.driver.poll_input().await? {
            let actions = self.shell.handle(input);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }

        self.shell.tick(Instant::now());
        let actions = self.shell.cycle();
        self.process_actions(actions).await
    }

    /// Execute shell actions. Returns `true` if should quit.
    async fn process_actions(&mut self, actions: Vec<ShellAction>) -> Result<bool, D::Error> {
        for action in actions {
            match action {
                ShellAction::Render => self.driver.render(&self.shell)?,
                ShellAction::Quit => return Ok(true),
                ShellAction::PromptFee { id, fee } => {
                    let decision = self.driver.confirm_fee(fee).await?;
                    if let Err(e) = self.shell.resolve_fee(id, decision) {
                        tracing::debug!(%id, error = %e, "Fee prompt answered too late");
                    }
                },
                ShellAction::PrefillSend(request) => self.driver.prefill_send(&request)?,
            }
        }
        Ok(false)
    }

    /// Get a reference to the shell.
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Get a mutable reference to the shell.
    pub fn shell_mut(&mut self) -> &mut Shell {
        &mut self.shell
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
