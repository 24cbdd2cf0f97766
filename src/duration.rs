//! Duration parsing for the background refresh flags ("5m", "12h", "1h30m").

use crate::error::{Error, Result};
use std::time::Duration;

/// Parse a duration string made of one or more `<number><unit>` parts.
///
/// Supported units:
/// - `d` - days (24 hours)
/// - `h` - hours
/// - `m` - minutes
/// - `s` - seconds
///
/// A bare `0` is accepted and means "disabled" for the refresh interval.
///
/// # Examples
///
/// ```
/// use ar_cred_helper::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(5 * 60));
/// assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(12 * 60 * 60));
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(90 * 60));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let input = s.trim().to_lowercase();
    let invalid = || Error::InvalidDuration(s.to_string());

    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let unit: u64 = match c {
            'd' => 24 * 60 * 60,
            'h' => 60 * 60,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid()),
        };
        let num: u64 = digits.parse().map_err(|_| invalid())?;
        digits.clear();

        total = num
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(invalid)?;
    }

    if !digits.is_empty() {
        // Trailing number without a unit.
        return Err(invalid());
    }

    Ok(Duration::from_secs(total))
}

/// Format a duration using the largest units that fit, e.g. `1h30m`.
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }
    out
}
