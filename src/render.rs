//! Purpose: Human-readable formatting helpers for CLI output.
//! Exports: `relative_time`, `format_date`, `truncate`, `compact_count`,
//! `group_digits`.
//! Role: Presentation only; all inputs are backend strings or counts.
//! Invariants: Unparseable timestamps pass through unchanged, never panic.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Relative age label for a backend timestamp: "just now", "5m ago",
/// "3h ago", "2d ago", then the plain date once it is a week old.
pub fn relative_time(timestamp: &str, now: OffsetDateTime) -> String {
    let Ok(parsed) = OffsetDateTime::parse(timestamp.trim(), &Rfc3339) else {
        return timestamp.to_string();
    };
    let elapsed = now - parsed;
    let seconds = elapsed.whole_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    if seconds < 60 * 60 {
        return format!("{}m ago", seconds / 60);
    }
    if seconds < 24 * 60 * 60 {
        return format!("{}h ago", seconds / (60 * 60));
    }
    if seconds < 7 * 24 * 60 * 60 {
        return format!("{}d ago", seconds / (24 * 60 * 60));
    }
    format_date(timestamp)
}

/// Plain `YYYY-MM-DD` date for a backend timestamp.
pub fn format_date(timestamp: &str) -> String {
    let trimmed = timestamp.trim();
    let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) else {
        return trimmed.to_string();
    };
    let format = time::format_description::parse("[year]-[month]-[day]");
    let Ok(format) = format else {
        return trimmed.to_string();
    };
    parsed.format(&format).unwrap_or_else(|_| trimmed.to_string())
}

/// Cut `text` to at most `max` characters, appending an ellipsis when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

/// Compact count for view/like columns: 999, 1.2K, 3.4M.
pub fn compact_count(value: u64) -> String {
    const K: u64 = 1_000;
    const M: u64 = 1_000_000;
    if value < K {
        return value.to_string();
    }
    let (unit, suffix) = if value >= M { (M, "M") } else { (K, "K") };
    let scaled = value as f64 / unit as f64;
    if scaled >= 100.0 || value.is_multiple_of(unit) {
        format!("{}{}", value / unit, suffix)
    } else {
        format!("{scaled:.1}{suffix}")
    }
}

/// Thousands-grouped rendering: 1234567 -> "1,234,567".
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
