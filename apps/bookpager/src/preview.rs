//! Preview rendering: prints pages instead of delivering them.

use std::io::Write;

use serde::Serialize;

use crate::layout::{LayoutSummary, Page};

const FOOTER_RULE_WIDTH: usize = 20;

#[derive(Debug, Serialize)]
struct JsonPreview<'a> {
    page_count: usize,
    line_count: usize,
    pages: &'a [Page],
}

/// Plain-text preview: an index header, the page text, and a rule per page.
pub fn render_text(summary: &LayoutSummary) -> String {
    let total = summary.pages.len();
    let mut out = String::new();
    for page in &summary.pages {
        out.push_str(&format!("\n=== Page {}/{} ===\n", page.index, total));
        out.push_str(&page.to_text());
        out.push('\n');
        out.push_str(&"=".repeat(FOOTER_RULE_WIDTH));
        out.push('\n');
    }
    out
}

/// Machine-readable preview.
pub fn render_json(summary: &LayoutSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonPreview {
        page_count: summary.pages.len(),
        line_count: summary.line_count,
        pages: &summary.pages,
    })
}

/// Writes `rendered` to stdout and flushes.
pub fn print(rendered: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout_document, WidthConfig};

    fn summary() -> LayoutSummary {
        let config = WidthConfig::new(2, 6.0).unwrap();
        layout_document("ab cd\nefghij", &config)
    }

    #[test]
    fn test_text_preview_has_index_headers() {
        let out = render_text(&summary());
        assert!(out.contains("=== Page 1/3 ===\nab\n c\n"));
        assert!(out.contains("=== Page 3/3 ===\ngh\nij\n"));
        assert_eq!(out.matches(&"=".repeat(20)).count(), 3);
    }

    #[test]
    fn test_empty_preview_is_empty() {
        let empty = layout_document("", &WidthConfig::default());
        assert_eq!(render_text(&empty), "");
    }

    #[test]
    fn test_json_preview_shape() {
        let raw = render_json(&summary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["page_count"], 3);
        assert_eq!(value["line_count"], 6);
        assert_eq!(value["pages"][1]["index"], 2);
        assert_eq!(value["pages"][1]["lines"][0], "d");
    }
}
