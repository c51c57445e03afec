//! Pagination: groups wrapped lines into fixed-capacity book pages.
//!
//! Every page but the last holds exactly `lines_per_page` lines. The last page
//! holds the remainder. Zero lines produce zero pages, never one empty page.

use serde::{Deserialize, Serialize};

use crate::layout::width_model::WidthConfig;

/// Separator used when a page is flattened for delivery.
pub const LINE_SEPARATOR: &str = "\n";

/// One book page: a run of consecutive wrapped lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based position of this page in the document.
    pub index: usize,
    pub lines: Vec<String>,
}

impl Page {
    /// Page text as handed to the delivery driver.
    pub fn to_text(&self) -> String {
        self.lines.join(LINE_SEPARATOR)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Splits `lines` into pages of `config.lines_per_page()` lines, in order.
pub fn paginate(lines: &[String], config: &WidthConfig) -> Vec<Page> {
    lines
        .chunks(config.lines_per_page())
        .enumerate()
        .map(|(i, chunk)| Page {
            index: i + 1,
            lines: chunk.to_vec(),
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
