//! Human-readable formatting for durations, rates and sizes

use std::time::Duration;

/// Bytes per binary megabyte; all MB figures in reports use this unit
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Format a duration in human-readable form
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use storagebench::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
/// assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50us");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}us", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

/// Format a rate (operations per second)
///
/// # Examples
///
/// ```
/// use storagebench::util::time::format_rate;
///
/// assert_eq!(format_rate(500.0), "500");
/// assert_eq!(format_rate(1500.0), "1.50K");
/// assert_eq!(format_rate(2_500_000.0), "2.50M");
/// ```
pub fn format_rate(rate: f64) -> String {
    if rate < 1_000.0 {
        format!("{:.0}", rate)
    } else if rate < 1_000_000.0 {
        format!("{:.2}K", rate / 1_000.0)
    } else if rate < 1_000_000_000.0 {
        format!("{:.2}M", rate / 1_000_000.0)
    } else {
        format!("{:.2}G", rate / 1_000_000_000.0)
    }
}

/// Format a size in bytes with binary units
///
/// ```
/// use storagebench::util::time::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(128 * 1024), "128.00 KB");
/// assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.00 GB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_bytes_boundaries() {
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_format_rate_giga() {
        assert_eq!(format_rate(3_000_000_000.0), "3.00G");
    }
}
