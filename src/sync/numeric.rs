//! Lenient numeric parsing and formatting for control-value inputs
//!
//! The board's command parser has no representation for "not a number",
//! so parsing here never fails: anything unparseable is coerced to zero.
//! A `0x`/`0X` prefix selects hexadecimal and latches hex display mode
//! for the owning control group; separators inside a hex literal are
//! tolerated for legibility.

/// Result of parsing a control-value input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedNumber {
    /// The parsed value, `0.0` when the input was unparseable
    pub value: f64,
    /// Whether the input was a hex literal (latches display mode)
    pub hex: bool,
}

/// Parse a user-entered numeric string.
///
/// Leading/trailing whitespace is stripped. `0x`-prefixed input is
/// parsed as hexadecimal with non-hex separator characters removed;
/// input containing a decimal point is parsed as floating point;
/// anything else is parsed as a decimal integer.
pub fn parse_value(raw: &str) -> ParsedNumber {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        // tolerate separators the user may have added for legibility
        let digits: String = rest.chars().filter(|c| c.is_ascii_hexdigit()).collect();
        let value = u64::from_str_radix(&digits, 16).map(|v| v as f64).unwrap_or(0.0);
        ParsedNumber { value, hex: true }
    } else if !trimmed.contains('.') {
        // no decimal separator, assume integer
        let value = trimmed.parse::<i64>().map(|v| v as f64).unwrap_or(0.0);
        ParsedNumber { value, hex: false }
    } else {
        let value = trimmed.parse::<f64>().unwrap_or(0.0);
        let value = if value.is_finite() { value } else { 0.0 };
        ParsedNumber { value, hex: false }
    }
}

/// Format a value for display, honoring the group's hex latch.
///
/// Hex mode only applies to non-negative integral values; everything
/// else falls back to decimal.
pub fn format_value(value: f64, hex: bool) -> String {
    if hex && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        format!("0x{:x}", value as u64)
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_hex() {
        let p = parse_value("0x1A");
        assert_eq!(p.value, 26.0);
        assert!(p.hex);
    }

    #[test]
    fn test_parse_hex_with_separators() {
        let p = parse_value("  0xFF_FF ");
        assert_eq!(p.value, 65535.0);
        assert!(p.hex);
    }

    #[test]
    fn test_parse_float() {
        let p = parse_value("3.5");
        assert_eq!(p.value, 3.5);
        assert!(!p.hex);
    }

    #[test]
    fn test_parse_integer() {
        let p = parse_value("7");
        assert_eq!(p.value, 7.0);
        assert!(!p.hex);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(parse_value("abc").value, 0.0);
        assert_eq!(parse_value("").value, 0.0);
        assert_eq!(parse_value("0x").value, 0.0);
        assert_eq!(parse_value("1.2.3").value, 0.0);
    }

    #[test]
    fn test_format_round_trip() {
        assert_eq!(format_value(26.0, true), "0x1a");
        assert_eq!(format_value(7.0, false), "7");
        assert_eq!(format_value(3.5, false), "3.5");
        // hex latch does not apply to fractional values
        assert_eq!(format_value(3.5, true), "3.5");
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(s in "\\PC{0,32}") {
            let p = parse_value(&s);
            prop_assert!(p.value.is_finite());
        }

        #[test]
        fn prop_integer_round_trip(v in 0u32..=u32::MAX) {
            let p = parse_value(&v.to_string());
            prop_assert_eq!(p.value, f64::from(v));
            prop_assert!(!p.hex);
        }

        #[test]
        fn prop_hex_round_trip(v in 0u32..=u32::MAX) {
            let s = format!("0x{:x}", v);
            let p = parse_value(&s);
            prop_assert_eq!(p.value, f64::from(v));
            prop_assert!(p.hex);
            prop_assert_eq!(format_value(p.value, p.hex), s);
        }
    }
}
