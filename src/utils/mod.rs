//! Utility functions.
//!
//! Collection of formatting helpers used by the bot and the web panel.

use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::i18n::format_text;

/// Escape HTML special characters (safe for text and attribute values).
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Group thousands: `1234567` -> `1.234.567` (id) / `1,234,567` (en).
pub fn format_points(points: i64, lang: &str) -> String {
    let sep = if lang == "en" { ',' } else { '.' };
    let digits = points.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if points < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(sep);
        }
        grouped.push(c);
    }
    grouped
}

/// Human readable time left, e.g. `5 jam 3 menit`.
pub fn format_remaining(remaining: Duration, lang: &str) -> String {
    let secs = remaining.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format_text(lang, "time.hours", &[("n", &hours.to_string())]));
    }
    if minutes > 0 {
        parts.push(format_text(lang, "time.minutes", &[("n", &minutes.to_string())]));
    }
    if parts.is_empty() {
        parts.push(format_text(lang, "time.seconds", &[("n", &secs.to_string())]));
    }
    parts.join(" ")
}

/// Unix timestamp as `YYYY-MM-DD HH:MM` (UTC).
pub fn format_timestamp(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Clickable HTML mention of a Telegram user.
pub fn mention_html(user_id: i64, name: &str) -> String {
    format!("<a href=\"tg://user?id={}\">{}</a>", user_id, html_escape(name))
}

/// Quote a CSV field when needed (RFC 4180).
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(0, "id"), "0");
        assert_eq!(format_points(999, "id"), "999");
        assert_eq!(format_points(1000, "id"), "1.000");
        assert_eq!(format_points(1234567, "en"), "1,234,567");
        assert_eq!(format_points(-150000, "id"), "-150.000");
    }

    #[test]
    fn test_format_remaining() {
        let d = Duration::from_secs(5 * 3600 + 3 * 60 + 10);
        assert_eq!(format_remaining(d, "id"), "5 jam 3 menit");
        assert_eq!(format_remaining(d, "en"), "5h 3m");
        assert_eq!(format_remaining(Duration::from_secs(42), "id"), "42 detik");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
    }

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_mention_html() {
        assert_eq!(mention_html(7, "<x>"), "<a href=\"tg://user?id=7\">&lt;x&gt;</a>");
    }
}
