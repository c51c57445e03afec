// Layout engine: glyph width model, line wrapping, pagination.
// Pure and synchronous. Callers on the async runtime run it inside
// tokio::task::spawn_blocking and hand the finished pages to delivery.

pub mod pagination;
pub mod preprocess;
pub mod width_model;
pub mod wrap;

use serde::Serialize;

pub use pagination::{paginate, Page};
pub use preprocess::preprocess;
pub use width_model::{LayoutError, WidthConfig, WidthOverrides};
pub use wrap::wrap;

/// A wrapped line that exceeds the width budget (a single over-wide glyph).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverBudgetLine {
    /// 0-based index into the document's wrapped lines.
    pub line_index: usize,
    pub text: String,
    pub width: f64,
}

/// Result of laying out one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSummary {
    pub pages: Vec<Page>,
    pub line_count: usize,
    pub over_budget: Vec<OverBudgetLine>,
}

/// Preprocesses, wraps, and paginates a whole document.
pub fn layout_document(text: &str, config: &WidthConfig) -> LayoutSummary {
    let prepared = preprocess(text);
    let lines = wrap(&prepared, config);

    let over_budget = lines
        .iter()
        .enumerate()
        .filter_map(|(line_index, line)| {
            let width = config.measure_str(line);
            (width > config.max_line_width()).then(|| OverBudgetLine {
                line_index,
                text: line.clone(),
                width,
            })
        })
        .collect();

    LayoutSummary {
        line_count: lines.len(),
        pages: paginate(&lines, config),
        over_budget,
    }
}
