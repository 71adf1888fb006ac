//! Line-oriented command parsing for the headless shell.

use std::path::PathBuf;

use coinshell_app::{ClientCommand, NavigationTarget, Passphrase, UserInput, WalletCommand};
use thiserror::Error;

/// Reasons a command line was not understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// First word is not a known command.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// Known command with the wrong arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// `go` with an unknown page name.
    #[error("unknown page: {0}")]
    UnknownPage(String),
}

/// Parse one input line.
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<UserInput>, CommandError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return Ok(None);
    };

    let input = match command {
        "quit" | "q" => UserInput::Quit,
        "back" | "b" => UserInput::Back,
        "go" => match args {
            [page, rest @ ..] => UserInput::Navigate(target(page, rest.first().copied())?),
            [] => return Err(CommandError::Usage("go <page> [address]")),
        },
        "open" => match args {
            [uri] => UserInput::OpenUri((*uri).to_string()),
            _ => return Err(CommandError::Usage("open <uri>")),
        },
        "reload" => UserInput::Command(ClientCommand::ReloadBlockchain.into()),
        "update" => UserInput::Command(ClientCommand::CheckForUpdate.into()),
        "rescan" => UserInput::Command(WalletCommand::Rescan.into()),
        "backup" => match args {
            [path] => wallet(WalletCommand::Backup { destination: PathBuf::from(*path) }),
            _ => return Err(CommandError::Usage("backup <path>")),
        },
        "encrypt" => match args {
            [pass] => wallet(WalletCommand::Encrypt { passphrase: Passphrase::new(*pass) }),
            _ => return Err(CommandError::Usage("encrypt <passphrase>")),
        },
        "unlock" => match args {
            [pass] => wallet(WalletCommand::Unlock {
                passphrase: Passphrase::new(*pass),
                staking_only: false,
            }),
            [pass, "staking"] => wallet(WalletCommand::Unlock {
                passphrase: Passphrase::new(*pass),
                staking_only: true,
            }),
            _ => return Err(CommandError::Usage("unlock <passphrase> [staking]")),
        },
        "passwd" => match args {
            [old, new] => wallet(WalletCommand::ChangePassphrase {
                old: Passphrase::new(*old),
                new: Passphrase::new(*new),
            }),
            _ => return Err(CommandError::Usage("passwd <old> <new>")),
        },
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(input))
}

fn wallet(command: WalletCommand) -> UserInput {
    UserInput::Command(command.into())
}

fn target(page: &str, address: Option<&str>) -> Result<NavigationTarget, CommandError> {
    let address = address.map(str::to_string);
    Ok(match page {
        "overview" => NavigationTarget::Overview,
        "history" => NavigationTarget::History,
        "addresses" => NavigationTarget::AddressBook,
        "receive" => NavigationTarget::ReceiveCoins,
        "send" => NavigationTarget::SendCoins,
        "sendalt" => NavigationTarget::SendAltCoins,
        "news" => NavigationTarget::News,
        "chat" => NavigationTarget::Chat,
        "explorer" => NavigationTarget::Explorer,
        "supernet" => NavigationTarget::SuperNet,
        "fiat" => NavigationTarget::Fiat,
        "sign" => NavigationTarget::SignMessage(address),
        "verify" => NavigationTarget::VerifyMessage(address),
        "nxt" => NavigationTarget::AccessNxt(address),
        other => return Err(CommandError::UnknownPage(other.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn navigation() {
        assert!(matches!(
            parse_line("go sign RAddr").unwrap(),
            Some(UserInput::Navigate(NavigationTarget::SignMessage(Some(a)))) if a == "RAddr"
        ));
        assert!(matches!(
            parse_line("go history").unwrap(),
            Some(UserInput::Navigate(NavigationTarget::History))
        ));
        assert_eq!(
            parse_line("go nowhere").unwrap_err(),
            CommandError::UnknownPage("nowhere".into())
        );
    }

    #[test]
    fn wallet_commands() {
        assert!(matches!(
            parse_line("unlock secret staking").unwrap(),
            Some(UserInput::Command(coinshell_app::Command::Wallet(WalletCommand::Unlock {
                staking_only: true,
                ..
            })))
        ));
        assert_eq!(
            parse_line("passwd onlyone").unwrap_err(),
            CommandError::Usage("passwd <old> <new>")
        );
        assert_eq!(
            parse_line("frobnicate").unwrap_err(),
            CommandError::Unknown("frobnicate".into())
        );
    }
}
