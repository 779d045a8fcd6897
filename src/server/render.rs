//! HTML rendering for the browsing page
//!
//! Plain server-rendered HTML assembled with string building; no template
//! engine and no JS build step. Presentation only, no business logic.

use crate::storage::{CorpusSummary, VoiceRecord};
use chrono::{DateTime, Local, Utc};

/// One listing row: the stored record plus whether its audio file is present
pub struct VoiceRow {
    pub record: VoiceRecord,
    pub audio_available: bool,
}

/// Renders the full browsing page
pub fn index_page(
    rows: &[VoiceRow],
    summary: &CorpusSummary,
    search: Option<&str>,
    page: u32,
    total_pages: u32,
) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Koedex</title>\n<style>\n\
         body { font-family: sans-serif; max-width: 60rem; margin: 0 auto; padding: 1rem; }\n\
         .summary { color: #555; margin-bottom: 1rem; }\n\
         table { width: 100%; border-collapse: collapse; }\n\
         th, td { text-align: left; padding: 0.4rem; border-bottom: 1px solid #ddd; }\n\
         .pager a { margin-right: 0.5rem; }\n\
         .missing { color: #999; }\n\
         </style>\n</head>\n<body>\n<h1>Koedex</h1>\n",
    );

    // Corpus summary header
    html.push_str(&format!(
        "<p class=\"summary\">{} voices &middot; total {} &middot; {} on disk</p>\n",
        summary.voice_count,
        format_total_duration(summary.total_duration_seconds),
        format_bytes(summary.total_audio_bytes),
    ));

    // Search form
    html.push_str(&format!(
        "<form method=\"get\" action=\"/\">\n\
         <input type=\"text\" name=\"q\" value=\"{}\" placeholder=\"Search title or author\">\n\
         <button type=\"submit\">Search</button>\n</form>\n",
        escape(search.unwrap_or("")),
    ));

    // Listing table
    html.push_str(
        "<table>\n<tr><th>Title</th><th>Author</th><th>Posted</th><th>Length</th><th>Audio</th></tr>\n",
    );
    for row in rows {
        html.push_str(&render_row(row));
    }
    html.push_str("</table>\n");

    html.push_str(&render_pager(search, page, total_pages));
    html.push_str("</body>\n</html>\n");
    html
}

fn render_row(row: &VoiceRow) -> String {
    let record = &row.record;

    let audio = if row.audio_available {
        format!(
            "<audio controls preload=\"none\" src=\"/downloads/{}.mp3\"></audio>",
            escape(&record.external_id)
        )
    } else {
        "<span class=\"missing\">file missing</span>".to_string()
    };

    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        escape(&record.title),
        escape(&record.author),
        format_timestamp(record.posted_at),
        record
            .duration_seconds
            .map(format_duration)
            .unwrap_or_else(|| "-".to_string()),
        audio,
    )
}

fn render_pager(search: Option<&str>, page: u32, total_pages: u32) -> String {
    if total_pages <= 1 {
        return String::new();
    }

    let mut html = String::from("<p class=\"pager\">");
    for p in 1..=total_pages {
        if p == page {
            html.push_str(&format!("<strong>{}</strong> ", p));
        } else {
            let query = match search {
                Some(term) if !term.is_empty() => {
                    format!("?q={}&page={}", urlencode(term), p)
                }
                _ => format!("?page={}", p),
            };
            html.push_str(&format!("<a href=\"/{}\">{}</a>", query, p));
        }
    }
    html.push_str("</p>\n");
    html
}

/// Escapes text for safe interpolation into HTML
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Percent-encodes a query-string value
fn urlencode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(*byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Formats an item duration as m:ss
pub fn format_duration(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Formats the corpus-wide duration as h:mm:ss
pub fn format_total_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

/// Formats a byte count with a binary unit suffix
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
