//! Document preprocessing applied before wrapping.
//!
//! Trims the whole document, then collapses every run of two or more newlines
//! to exactly one blank line. Paragraph breaks survive; excess vertical
//! whitespace does not.

/// Trims surrounding whitespace and collapses blank-line runs. Idempotent.
pub fn preprocess(text: &str) -> String {
    let trimmed = text.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut newline_run = 0usize;

    for c in trimmed.chars() {
        if c == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(c);
            }
        } else {
            newline_run = 0;
            out.push(c);
        }
    }
    out
}
