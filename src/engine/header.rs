use chrono::{DateTime, Local};

/// Name printed after the access date in every page header
pub const PRODUCER: &str = "sitepdf";

/// Page header details stamped onto every rendered artifact
#[derive(Debug, Clone)]
pub struct HeaderMeta {
    /// Source URL of the page
    pub url: String,

    /// When the page was captured
    pub accessed_at: DateTime<Local>,
}

impl HeaderMeta {
    /// Header for a page captured now
    pub fn now(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accessed_at: Local::now(),
        }
    }

    /// Human-readable access timestamp, e.g. `2024-05-01 14:03:22 +02:00`
    pub fn accessed_display(&self) -> String {
        self.accessed_at.format("%Y-%m-%d %H:%M:%S %:z").to_string()
    }

    /// HTML header template for the print-to-PDF call
    ///
    /// Chromium renders header templates in an isolated document, so all
    /// styling is inline.
    pub fn template(&self) -> String {
        format!(
            concat!(
                "<div style=\"font-size: 9px; color: #444444; padding: 5px 15px; width: 100%; ",
                "text-align: left; font-family: Arial, sans-serif; box-sizing: border-box; ",
                "overflow: hidden; white-space: nowrap; text-overflow: ellipsis;\">",
                "<div style=\"margin-bottom:2px;\"><span>{url}</span></div>",
                "<div><span>Access Date: {date} by {producer}</span></div>",
                "</div>"
            ),
            url = escape_html(&self.url),
            date = self.accessed_display(),
            producer = PRODUCER,
        )
    }
}

/// Escapes the five HTML-special characters
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
