//! Presentation helpers for timestamps, sizes and scores.
//!
//! Everything here is display-only: bad input degrades to a marker string
//! rather than an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MISSING_DATE: &str = "N/A";
pub const INVALID_DATE: &str = "Invalid date";
pub const UNKNOWN_SIZE: &str = "Unknown size";

const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// Parse an API timestamp (RFC 3339, or a bare `YYYY-MM-DD` date)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Relative description of `timestamp` as seen from `now`, e.g.
/// "about 2 hours ago". Missing values render as "N/A" and unparsable ones as
/// "Invalid date".
pub fn format_relative(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = timestamp.filter(|ts| !ts.trim().is_empty()) else {
        return MISSING_DATE.to_string();
    };
    let Some(then) = parse_timestamp(raw) else {
        return INVALID_DATE.to_string();
    };

    let seconds = (now - then).num_seconds();
    let distance = format_distance(seconds.abs());
    if seconds >= 0 {
        format!("{} ago", distance)
    } else {
        format!("in {}", distance)
    }
}

/// Relative description against the current time
pub fn format_relative_now(timestamp: Option<&str>) -> String {
    format_relative(timestamp, Utc::now())
}

/// Absolute UTC rendering with the same degradation rules
pub fn format_absolute(timestamp: Option<&str>) -> String {
    match timestamp.filter(|ts| !ts.trim().is_empty()) {
        None => MISSING_DATE.to_string(),
        Some(raw) => parse_timestamp(raw)
            .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| INVALID_DATE.to_string()),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

fn round_div(value: i64, divisor: i64) -> i64 {
    (value as f64 / divisor as f64).round() as i64
}

fn format_distance(seconds: i64) -> String {
    let minutes = round_div(seconds, 60);

    if minutes < 2 {
        return if seconds < 30 {
            "less than a minute".to_string()
        } else {
            "1 minute".to_string()
        };
    }
    if minutes < 45 {
        return plural(minutes, "minute");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        return format!("about {}", plural(round_div(minutes, 60), "hour"));
    }
    if minutes < 2520 {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        return plural(round_div(minutes, MINUTES_IN_DAY), "day");
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        return format!("about {}", plural(round_div(minutes, MINUTES_IN_MONTH), "month"));
    }

    let months = minutes / MINUTES_IN_MONTH;
    if months < 12 {
        return plural(months, "month");
    }

    let years = months / 12;
    let remainder = months % 12;
    if remainder < 3 {
        format!("about {}", plural(years, "year"))
    } else if remainder < 9 {
        format!("over {}", plural(years, "year"))
    } else {
        format!("almost {}", plural(years + 1, "year"))
    }
}

/// Human-readable byte count using 1024-based units
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Size field as sent by the API (a decimal string)
pub fn format_size_str(size: &str) -> String {
    match size.trim().parse::<u64>() {
        Ok(bytes) => format_file_size(bytes),
        Err(_) => UNKNOWN_SIZE.to_string(),
    }
}

/// Relevance band of a search score in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    High,
    Good,
    Fair,
    Low,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ScoreTier::High
        } else if score >= 0.6 {
            ScoreTier::Good
        } else if score >= 0.4 {
            ScoreTier::Fair
        } else {
            ScoreTier::Low
        }
    }
}

/// Score as a whole percentage, e.g. `0.876` → "88%"
pub fn format_score(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

/// Shorten `text` to at most `max_chars` characters, appending an ellipsis
pub fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut out: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
