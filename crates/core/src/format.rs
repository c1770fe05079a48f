use std::sync::LazyLock;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static KEY_POINT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n|\u{2022}|-|\d+\.").expect("valid regex"));
static VIMEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vimeo\.com/(?:video/)?(\d+)").expect("valid regex"));

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Progress label, floored so 99.9 never reads as 100.
pub fn format_watched(percent: f64) -> String {
    format!("Watched: {}%", percent.clamp(0.0, 100.0).floor() as u32)
}

pub fn format_phone_number(phone: Option<&str>) -> String {
    match phone {
        Some(p) if p.len() == 10 && p.chars().all(|c| c.is_ascii_digit()) => {
            format!("({}) {}-{}", &p[..3], &p[3..6], &p[6..])
        }
        Some(p) if !p.is_empty() => p.to_string(),
        _ => "N/A".to_string(),
    }
}

/// Backend dates (`2025-05-15 13:37:40`) as `May 15, 2025, 13:37`.
/// Missing or empty input shows today's date instead.
pub fn format_date(input: Option<&str>) -> String {
    format_date_on(input, Local::now().date_naive())
}

fn format_date_on(input: Option<&str>, today: NaiveDate) -> String {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return today.format("%B %d, %Y").to_string();
    };

    let parsed = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN))
        });

    match parsed {
        Ok(at) => at.format("%b %d, %Y, %H:%M").to_string(),
        Err(_) => "Invalid Date".to_string(),
    }
}

/// Break the HTML-ish `key_points` field into bullet items.
pub fn key_points(raw: &str) -> Vec<String> {
    let text = HTML_TAG.replace_all(raw, "");
    KEY_POINT_SPLIT
        .split(&text)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn vimeo_id(url: &str) -> Option<String> {
    VIMEO_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
