//! Locale-tolerant amount parsing.
//!
//! Card exports mix Brazilian (`1.234,56`) and US (`1,234.56`) number
//! formats, sometimes with a currency prefix. The trailing fragment decides
//! which separator is the decimal one.

use once_cell::sync::Lazy;
use regex::Regex;

static COMMA_CENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r",\d{2}$").unwrap());
static DOT_CENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\d{2}$").unwrap());

/// Parse one raw amount string into a signed value.
///
/// Returns `None` for anything that is not a number after normalization;
/// never panics.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s: String = raw.trim().replace("R$", "");
    s.retain(|c| !c.is_whitespace());

    let normalized = if COMMA_CENTS.is_match(&s) {
        // 1.234,56 -> comma is the decimal separator, dots are thousands
        s.replace('.', "").replace(',', ".")
    } else if DOT_CENTS.is_match(&s) {
        // 1,234.56 -> dot is the decimal separator, commas are thousands
        s.replace(',', "")
    } else {
        // No cents fragment; treat a bare comma as a decimal point
        s.replace(',', ".")
    };

    normalized.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brazilian_format() {
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
    }

    #[test]
    fn test_us_format() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
    }

    #[test]
    fn test_currency_prefix() {
        assert_eq!(parse_amount("R$ 72,39"), Some(72.39));
    }

    #[test]
    fn test_bare_comma_decimal() {
        assert_eq!(parse_amount("72,5"), Some(72.5));
    }

    #[test]
    fn test_plain_integer() {
        assert_eq!(parse_amount("1200"), Some(1200.0));
    }

    #[test]
    fn test_negative() {
        assert_eq!(parse_amount("-1.234,56"), Some(-1234.56));
        assert_eq!(parse_amount("R$ -15,00"), Some(-15.0));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("12,34abc"), None);
    }
}
