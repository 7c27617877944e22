//! Human-readable data formatting utilities.
//!
//! Sizes are reported with decimal (1000-based) units and ages as a
//! relative duration, the way `images` listings present them.

use chrono::{DateTime, Duration, Utc};
use chrono_humanize::{Accuracy, HumanTime, Tense};


const SIZE_SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte size with decimal suffixes and three significant digits.
///
/// The largest suffix whose scaled value stays below 1000 is chosen, capped
/// at `TB`. Plain byte counts are printed as integers.
///
/// # Examples
///
/// ```
/// use libhold::format::formatted_size;
///
/// assert_eq!(formatted_size(999), "999 B");
/// assert_eq!(formatted_size(1000), "1.00 KB");
/// assert_eq!(formatted_size(1_500_000), "1.50 MB");
/// assert_eq!(formatted_size(123_456_789), "123 MB");
/// ```
pub fn formatted_size(size_bytes: u64) -> String {
    if size_bytes < 1000 {
        return format!("{} {}", size_bytes, SIZE_SUFFIXES[0]);
    }

    let mut value = size_bytes as f64;
    let mut index = 0;
    while value >= 1000.0 && index < SIZE_SUFFIXES.len() - 1 {
        value /= 1000.0;
        index += 1;
    }

    // Rounding to three digits can carry over into the next suffix (999.96 KB)
    let rendered = three_significant(value);
    if rendered == "1000" && index < SIZE_SUFFIXES.len() - 1 {
        return format!("{} {}", three_significant(value / 1000.0), SIZE_SUFFIXES[index + 1]);
    }
    format!("{} {}", rendered, SIZE_SUFFIXES[index])
}

fn three_significant(value: f64) -> String {
    let mut decimals: usize = if value < 10.0 {
        2
    } else if value < 100.0 {
        1
    } else {
        0
    };

    loop {
        let rendered = format!("{:.*}", decimals, value);
        let integral_digits = rendered.split('.').next().map_or(0, str::len);
        if integral_digits + decimals <= 3 || decimals == 0 {
            return rendered;
        }
        decimals -= 1;
    }
}

/// Formats a creation time as a relative age such as `"2 hours ago"`.
///
/// Ages of ten seconds or less, and timestamps in the future, read as
/// `"a few seconds ago"`.
///
/// # Examples
///
/// ```
/// use libhold::format::format_age;
/// use chrono::{Duration, Utc};
///
/// let one_day_ago = Utc::now() - Duration::days(1);
/// assert_eq!(format_age(&one_day_ago), "a day ago");
/// ```
pub fn format_age(created: &DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(*created);
    if elapsed <= Duration::seconds(10) {
        return "a few seconds ago".to_string();
    }
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}

/// Formats an optional creation time, using `N/A` when it is unset.
pub fn format_optional_age(created: Option<&DateTime<Utc>>) -> String {
    created
        .map(format_age)
        .unwrap_or_else(|| "N/A".to_string())
}
