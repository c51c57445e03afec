//! Width-aware line wrapping at single-glyph granularity.
//!
//! # Rules
//! - `\n` always ends the current line, even an empty one, and is never measured.
//! - A glyph that would push the running width past `max_line_width` starts a
//!   new line. An empty buffer is never emitted for an overflow, so a glyph wider
//!   than the whole budget sits alone on its own over-budget line.
//! - A glyph with zero or negative width (other than the newline) is placed
//!   alone on its own line with a warning, so it cannot corrupt the running total.
//! - If the text ends with `\n`, trailing empty lines are dropped.

use tracing::warn;

use crate::layout::width_model::WidthConfig;

/// Wraps `text` into lines that respect `config.max_line_width()`.
///
/// Pure and deterministic. Returned lines never contain `\n`.
pub fn wrap(text: &str, config: &WidthConfig) -> Vec<String> {
    let max_width = config.max_line_width();
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f64;

    for c in text.chars() {
        if c == '\n' {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
            continue;
        }

        let glyph_width = config.width_of(c);

        if glyph_width <= 0.0 {
            warn!(
                glyph = %c.escape_unicode(),
                width = glyph_width,
                "Degenerate glyph width; placing glyph on its own line"
            );
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(c.to_string());
            current_width = 0.0;
            continue;
        }

        if current_width + glyph_width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push(c);
            current_width = glyph_width;
        } else {
            current.push(c);
            current_width += glyph_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    normalize_trailing_newline(text, lines)
}

/// Drops the dangling blank lines a trailing `\n` would otherwise produce.
fn normalize_trailing_newline(original: &str, mut lines: Vec<String>) -> Vec<String> {
    if original.ends_with('\n') {
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        if let Some(last) = lines.last_mut() {
            let kept = last.trim_end_matches('\n').len();
            last.truncate(kept);
        }
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
