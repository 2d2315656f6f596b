use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A piece of an assistant reply, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Segment {
    Text(String),
    Html(String),
}

fn fenced_html() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```html\r?\n(.*?)\r?\n```").expect("valid regex"))
}

fn raw_html_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<!doctype\s+html|<html\b").expect("valid regex"))
}

/// Whether `text` carries HTML that `extract_html` would pull out.
pub fn contains_html(text: &str) -> bool {
    fenced_html().is_match(text) || raw_html_start().is_match(text)
}

/// Split a model reply into prose and HTML documents.
///
/// Fenced ```` ```html ```` blocks win. Without any, an unfenced document is
/// taken from the first `<!doctype html` (or `<html`) to the end of the
/// reply. Whitespace-only prose between blocks is dropped.
pub fn extract_html(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    if fenced_html().is_match(text) {
        let mut cursor = 0;
        for captures in fenced_html().captures_iter(text) {
            let (Some(whole), Some(body)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            push_text(&mut segments, &text[cursor..whole.start()]);
            segments.push(Segment::Html(body.as_str().to_string()));
            cursor = whole.end();
        }
        push_text(&mut segments, &text[cursor..]);
        return segments;
    }

    let start = doctype_start(text).or_else(|| raw_html_start().find(text).map(|m| m.start()));
    match start {
        Some(start) => {
            push_text(&mut segments, &text[..start]);
            segments.push(Segment::Html(text[start..].to_string()));
        }
        None => push_text(&mut segments, text),
    }

    segments
}

// A doctype, when present, starts the document even if `<html` shows up in
// the prose before it.
fn doctype_start(text: &str) -> Option<usize> {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<!doctype\s+html").expect("valid regex"))
        .find(text)
        .map(|m| m.start())
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.trim().is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_segment() {
        let segments = extract_html("Just an answer.");
        assert_eq!(segments, vec![Segment::Text("Just an answer.".to_string())]);
        assert!(!contains_html("Just an answer."));
    }

    #[test]
    fn fenced_blocks_interleave_with_prose() {
        let reply = "Here is a button:\n```html\n<button>Hi</button>\n```\nAnd a card:\n```html\n<div class=\"card\"></div>\n```\nEnjoy!";
        let segments = extract_html(reply);

        assert_eq!(
            segments,
            vec![
                Segment::Text("Here is a button:\n".to_string()),
                Segment::Html("<button>Hi</button>".to_string()),
                Segment::Text("\nAnd a card:\n".to_string()),
                Segment::Html("<div class=\"card\"></div>".to_string()),
                Segment::Text("\nEnjoy!".to_string()),
            ]
        );
        assert!(contains_html(reply));
    }

    #[test]
    fn back_to_back_blocks_skip_blank_prose() {
        let reply = "```html\n<p>a</p>\n```\n\n```html\n<p>b</p>\n```";
        assert_eq!(
            extract_html(reply),
            vec![
                Segment::Html("<p>a</p>".to_string()),
                Segment::Html("<p>b</p>".to_string()),
            ]
        );
    }

    #[test]
    fn unfenced_document_runs_to_the_end() {
        let reply = "Your page:\n<!DOCTYPE html>\n<html><body>Hi</body></html>";
        assert_eq!(
            extract_html(reply),
            vec![
                Segment::Text("Your page:\n".to_string()),
                Segment::Html("<!DOCTYPE html>\n<html><body>Hi</body></html>".to_string()),
            ]
        );
    }

    #[test]
    fn bare_html_tag_without_doctype() {
        let reply = "<HTML><body>x</body></HTML>";
        assert_eq!(extract_html(reply), vec![Segment::Html(reply.to_string())]);
    }

    #[test]
    fn segments_serialize_tagged() {
        let json = serde_json::to_value(Segment::Html("<p/>".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "html", "content": "<p/>"}));
    }
}
