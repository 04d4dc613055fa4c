//! String to value conversion for CLI and TOML inputs

use anyhow::{Context, Result};

/// Parse a size string (e.g., "1G", "100M", "4k") to bytes
///
/// Units are binary (k = 1024). A bare number is taken as bytes.
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("kb") || s.ends_with('k') {
        (s.trim_end_matches("kb").trim_end_matches('k'), 1024u64)
    } else if s.ends_with("mb") || s.ends_with('m') {
        (s.trim_end_matches("mb").trim_end_matches('m'), 1024 * 1024)
    } else if s.ends_with("gb") || s.ends_with('g') {
        (s.trim_end_matches("gb").trim_end_matches('g'), 1024 * 1024 * 1024)
    } else if s.ends_with("tb") || s.ends_with('t') {
        (s.trim_end_matches("tb").trim_end_matches('t'), 1024 * 1024 * 1024 * 1024)
    } else {
        (s.trim_end_matches('b'), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid size format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Size out of range: {}", s))
}

/// Parse a duration string (e.g., "20", "20s", "5m", "1h") to whole seconds
pub fn parse_duration(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("sec") || s.ends_with('s') {
        (s.trim_end_matches("sec").trim_end_matches('s'), 1u64)
    } else if s.ends_with("min") || s.ends_with('m') {
        (s.trim_end_matches("min").trim_end_matches('m'), 60)
    } else if s.ends_with("hr") || s.ends_with('h') {
        (s.trim_end_matches("hr").trim_end_matches('h'), 3600)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Duration out of range: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("4k").unwrap(), 4096);
        assert_eq!(parse_size("4KB").unwrap(), 4096);
        assert_eq!(parse_size("128k").unwrap(), 128 * 1024);
        assert_eq!(parse_size("64M").unwrap(), 64 * 1024 * 1024);
        assert_eq!(parse_size("2G").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("1t").unwrap(), 1024u64.pow(4));
        assert_eq!(parse_size("512b").unwrap(), 512);
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("-4k").is_err());
        assert!(parse_size("99999999999999999999t").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("0").unwrap(), 0);
        assert_eq!(parse_duration("20").unwrap(), 20);
        assert_eq!(parse_duration("20s").unwrap(), 20);
        assert_eq!(parse_duration("3sec").unwrap(), 3);
        assert_eq!(parse_duration("2m").unwrap(), 120);
        assert_eq!(parse_duration("1h").unwrap(), 3600);
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("1.5s").is_err());
    }
}
