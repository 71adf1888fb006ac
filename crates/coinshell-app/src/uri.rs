//! Payment-request identifiers.
//!
//! Accepted form: `<scheme>:<address>[?amount=<coins>][&label=..][&message=..]`.
//! `<scheme>://<address>` is normalized to the single-colon form first.
//! Parameters prefixed with `req-` must be understood or the whole request is
//! rejected; other unknown parameters are ignored.

use url::Url;

use crate::error::UriError;

/// Base units per coin.
pub const COIN: i64 = 100_000_000;

/// Maximum fractional digits in a coin amount.
const DECIMALS: usize = 8;

/// Checks recipient addresses against the wallet's address grammar.
pub trait AddressValidator {
    /// Whether `address` is a valid recipient.
    fn validate_address(&self, address: &str) -> bool;
}

impl<F> AddressValidator for F
where
    F: Fn(&str) -> bool,
{
    fn validate_address(&self, address: &str) -> bool {
        self(address)
    }
}

/// Parsed payment request used to pre-fill the send page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Recipient address.
    pub address: String,
    /// Requested amount in base units.
    pub amount: Option<i64>,
    /// Recipient label.
    pub label: Option<String>,
    /// Free-form message.
    pub message: Option<String>,
}

impl PaymentRequest {
    /// Parse `uri` for `scheme`, checking the address with `validator`.
    pub fn parse(
        uri: &str,
        scheme: &str,
        validator: &dyn AddressValidator,
    ) -> Result<Self, UriError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(UriError::Empty);
        }

        let normalized = normalize(uri, scheme);
        let url = Url::parse(&normalized).map_err(|e| match e {
            url::ParseError::RelativeUrlWithoutBase => UriError::MissingScheme,
            other => UriError::Malformed(other.to_string()),
        })?;

        if !url.scheme().eq_ignore_ascii_case(scheme) {
            return Err(UriError::UnknownScheme {
                expected: scheme.to_ascii_lowercase(),
                found: url.scheme().to_string(),
            });
        }

        let address = url.path().trim_matches('/');
        if address.is_empty() {
            return Err(UriError::MissingAddress);
        }
        if !validator.validate_address(address) {
            return Err(UriError::InvalidAddress(address.to_string()));
        }

        let mut request =
            Self { address: address.to_string(), amount: None, label: None, message: None };

        for (key, value) in url.query_pairs() {
            let (key, required) = match key.strip_prefix("req-") {
                Some(stripped) => (stripped, true),
                None => (&*key, false),
            };
            match key {
                "amount" => {
                    let amount = parse_amount(&value)
                        .ok_or_else(|| UriError::InvalidAmount(value.to_string()))?;
                    request.amount = Some(amount);
                },
                "label" => request.label = Some(value.into_owned()),
                "message" => request.message = Some(value.into_owned()),
                other if required => {
                    return Err(UriError::UnsupportedParameter(other.to_string()));
                },
                _ => {},
            }
        }

        Ok(request)
    }
}

/// Rewrite `scheme://rest` as `scheme:rest`.
fn normalize(uri: &str, scheme: &str) -> String {
    let prefix_len = scheme.len() + 3;
    match uri.get(..prefix_len) {
        Some(prefix) if prefix.eq_ignore_ascii_case(&format!("{scheme}://")) => {
            format!("{}:{}", scheme, &uri[prefix_len..])
        },
        _ => uri.to_string(),
    }
}

/// Parse a decimal coin amount into base units.
///
/// Accepts `12`, `12.5`, `.5`; rejects signs, exponents, more than eight
/// fractional digits, and values that overflow.
pub fn parse_amount(text: &str) -> Option<i64> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.len() > DECIMALS
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i64 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<width$}", width = DECIMALS).parse().ok()?
    };

    whole.checked_mul(COIN)?.checked_add(fraction)
}

/// Format base units as a coin amount with eight fractional digits.
pub fn format_amount(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let units = amount.unsigned_abs();
    let coin = COIN.unsigned_abs();
    format!("{sign}{}.{:08}", units / coin, units % coin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_r_address(address: &str) -> bool {
        address.starts_with('R') && address.len() > 3
    }

    fn parse(uri: &str) -> Result<PaymentRequest, UriError> {
        PaymentRequest::parse(uri, "bitcoindark", &any_r_address)
    }

    #[test]
    fn parses_address_and_amount() {
        let request = parse("bitcoindark:RAbcd?amount=1.5&label=Shop").unwrap();

        assert_eq!(request.address, "RAbcd");
        assert_eq!(request.amount, Some(150_000_000));
        assert_eq!(request.label.as_deref(), Some("Shop"));
        assert_eq!(request.message, None);
    }

    #[test]
    fn double_slash_form_is_normalized() {
        let request = parse("BitcoinDark://RAbcd?message=hi%20there").unwrap();
        assert_eq!(request.address, "RAbcd");
        assert_eq!(request.message.as_deref(), Some("hi there"));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse(""), Err(UriError::Empty));
        assert_eq!(parse("   "), Err(UriError::Empty));
        assert_eq!(parse("RAbcd"), Err(UriError::MissingScheme));
        assert!(matches!(parse("bitcoin:RAbcd"), Err(UriError::UnknownScheme { .. })));
        assert_eq!(parse("bitcoindark:"), Err(UriError::MissingAddress));
        assert_eq!(parse("bitcoindark:Xyz12"), Err(UriError::InvalidAddress("Xyz12".into())));
        assert_eq!(
            parse("bitcoindark:RAbcd?amount=1.123456789"),
            Err(UriError::InvalidAmount("1.123456789".into()))
        );
        assert_eq!(
            parse("bitcoindark:RAbcd?req-expires=10"),
            Err(UriError::UnsupportedParameter("expires".into()))
        );
    }

    #[test]
    fn required_known_parameters_are_accepted() {
        let request = parse("bitcoindark:RAbcd?req-amount=2&foo=bar").unwrap();
        assert_eq!(request.amount, Some(2 * COIN));
    }

    #[test]
    fn amount_grammar() {
        assert_eq!(parse_amount("0"), Some(0));
        assert_eq!(parse_amount("12"), Some(12 * COIN));
        assert_eq!(parse_amount(".5"), Some(COIN / 2));
        assert_eq!(parse_amount("0.00000001"), Some(1));
        assert_eq!(parse_amount("."), None);
        assert_eq!(parse_amount("-1"), None);
        assert_eq!(parse_amount("1e5"), None);
        assert_eq!(parse_amount("99999999999999999999"), None);
    }

    #[test]
    fn amount_formatting() {
        assert_eq!(format_amount(150_000_000), "1.50000000");
        assert_eq!(format_amount(-1), "-0.00000001");
        assert_eq!(format_amount(0), "0.00000000");
        assert_eq!(parse_amount(&format_amount(123_456_789)), Some(123_456_789));
    }
}
