//! Field parsers for semi-structured detail-page text
//!
//! Pure functions, no I/O. Both parsers accept the source site's Japanese
//! unit markers (分 minutes, 秒 seconds, 時間 hours, 日 days).

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;

static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)分").unwrap());
static SECONDS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)秒").unwrap());

// Relative-time rules in fixed priority order. The first match wins, so a
// compound string like "1日2時間前" parses as 2 hours, not 1 day. This
// ordering is carried over from the original behavior; changing it would be
// a behavior change, not a bug fix.
static RELATIVE_RULES: LazyLock<Vec<(Regex, RelativeUnit)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(\d+)時間前").unwrap(), RelativeUnit::Hours),
        (Regex::new(r"(\d+)分前").unwrap(), RelativeUnit::Minutes),
        (Regex::new(r"(\d+)日前").unwrap(), RelativeUnit::Days),
        (Regex::new(r"(\d+)秒前").unwrap(), RelativeUnit::Seconds),
    ]
});

#[derive(Debug, Clone, Copy)]
enum RelativeUnit {
    Hours,
    Minutes,
    Days,
    Seconds,
}

/// Parses a duration string like "1分2秒" into total seconds
///
/// A missing minute or second component defaults to zero for that component.
/// A non-empty string containing neither token still parses to zero; only an
/// empty input means "no duration info" and yields None.
pub fn parse_duration(duration_str: &str) -> Option<u32> {
    if duration_str.is_empty() {
        return None;
    }

    let minutes = capture_number(&MINUTES_RE, duration_str).unwrap_or(0);
    let seconds = capture_number(&SECONDS_RE, duration_str).unwrap_or(0);

    Some(minutes * 60 + seconds)
}

/// Parses a relative-time expression like "@2時間前" into an absolute timestamp
///
/// The offset is applied to the wall clock at parse time, so the stored value
/// drifts by however long the post sat on the site before scraping.
/// Unrecognized input falls back to `now`. That is deliberately lossy: a
/// malformed timestamp must never abort ingestion of the item.
pub fn parse_posted_at(posted_str: &str) -> DateTime<Utc> {
    parse_posted_at_with_now(posted_str, Utc::now())
}

/// Like [`parse_posted_at`], with an injected "now" for deterministic tests
pub fn parse_posted_at_with_now(posted_str: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    for (rule, unit) in RELATIVE_RULES.iter() {
        if let Some(n) = capture_number(rule, posted_str) {
            let offset = match unit {
                RelativeUnit::Hours => Duration::hours(n as i64),
                RelativeUnit::Minutes => Duration::minutes(n as i64),
                RelativeUnit::Days => Duration::days(n as i64),
                RelativeUnit::Seconds => Duration::seconds(n as i64),
            };
            return now - offset;
        }
    }

    tracing::debug!("Unparsable posted-at text {:?}, falling back to now", posted_str);
    now
}

/// Extracts the first captured integer, ignoring overflow-sized garbage
fn capture_number(re: &Regex, haystack: &str) -> Option<u32> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
