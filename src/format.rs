//! Markdown-lite presentation: `**bold**` markers and line breaks.
//!
//! Bold detection is purely positional. The text is split on every `**` and
//! odd-numbered runs are bold, so an unpaired trailing marker turns the rest of
//! the text bold. Model output relies on this exact behavior.

use serde::Serialize;

const BOLD_MARKER: &str = "**";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DisplaySegment {
    PlainText(String),
    BoldText(String),
    LineBreak,
}

/// Splits `text` into display segments.
///
/// Empty runs are dropped since they render nothing; line breaks are kept
/// between lines of the same run but never after a run's last line.
pub fn format(text: &str) -> Vec<DisplaySegment> {
    let mut segments = Vec::new();
    for (index, run) in text.split(BOLD_MARKER).enumerate() {
        let bold = index % 2 == 1;
        for (line_no, line) in run.split('\n').enumerate() {
            if line_no > 0 {
                segments.push(DisplaySegment::LineBreak);
            }
            if line.is_empty() {
                continue;
            }
            segments.push(if bold {
                DisplaySegment::BoldText(line.to_string())
            } else {
                DisplaySegment::PlainText(line.to_string())
            });
        }
    }
    segments
}

/// Renders segments as escaped HTML for the web page.
pub fn render_html(segments: &[DisplaySegment]) -> String {
    let mut html = String::new();
    for segment in segments {
        match segment {
            DisplaySegment::PlainText(text) => html.push_str(&html_escape(text)),
            DisplaySegment::BoldText(text) => {
                html.push_str(r#"<strong class="term-emphasis">"#);
                html.push_str(&html_escape(text));
                html.push_str("</strong>");
            }
            DisplaySegment::LineBreak => html.push_str("<br>"),
        }
    }
    html
}

/// Flattens segments back to plain text with newlines, dropping emphasis.
pub fn plain_text(segments: &[DisplaySegment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            DisplaySegment::PlainText(text) | DisplaySegment::BoldText(text) => text.as_str(),
            DisplaySegment::LineBreak => "\n",
        })
        .collect()
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
