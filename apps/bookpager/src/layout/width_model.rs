//! Static glyph-width model for the in-game book renderer.
//!
//! Widths are abstract width units calibrated against the book UI, not font
//! metrics. A small override table covers the glyphs whose rendered width is far
//! from their class average (narrow punctuation, brackets, arrows). Everything
//! else resolves to one of two flat per-class widths: CJK-class or not.
//!
//! Resolution order for a glyph:
//! 1. exact entry in the override table (including the newline sentinel)
//! 2. `cjk_width` if the glyph is CJK-class
//! 3. `default_width`

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Defaults
// ────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_LINES_PER_PAGE: i64 = 14;
pub const DEFAULT_MAX_LINE_WIDTH: f64 = 57.0;
pub const DEFAULT_CJK_WIDTH: f64 = 4.5;
pub const DEFAULT_LATIN_WIDTH: f64 = 3.0;

/// Width carried by the newline entry. Negative: a newline terminates a line
/// and is never measured.
pub const NEWLINE_SENTINEL_WIDTH: f64 = -1.0;

/// Ideograph block treated as CJK-class regardless of the punctuation set.
const CJK_IDEOGRAPHS: std::ops::RangeInclusive<u32> = 0x4E00..=0x9FFF;

#[rustfmt::skip]
static DEFAULT_GLYPH_WIDTHS: &[(char, f64)] = &[
    ('`', 1.5),
    // brackets, quotes, space
    ('[', 2.0), (']', 2.0), ('(', 2.0), (')', 2.0), ('"', 2.0),
    ('{', 2.0), ('}', 2.0), ('*', 2.0), (' ', 2.0),
    // narrow punctuation
    ('.', 1.0), (',', 1.0), (';', 1.0), (':', 1.0), ('\'', 1.0), ('!', 1.0), ('|', 1.0),
    ('<', 2.5), ('>', 2.5),
    ('→', 4.0), ('~', 4.0),
    ('\n', NEWLINE_SENTINEL_WIDTH),
];

#[rustfmt::skip]
static DEFAULT_CJK_PUNCTUATION: &[char] = &[
    '，', '。', '、', '？', '！', '】', '【', '（', '）',
    '·', '；', '：', '“', '‘', '《', '》', '…',
];

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Coarse glyph class used when a glyph has no override entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlyphClass {
    /// Ideographs and configured CJK punctuation.
    Cjk,
    /// Latin letters, digits, and any punctuation not explicitly classified.
    NonCjk,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("lines per page must be positive, got {0}")]
    InvalidLinesPerPage(i64),

    #[error("max line width must be a positive finite number, got {0}")]
    InvalidMaxLineWidth(f64),

    #[error("width table keys must be exactly one character, got {0:?}")]
    InvalidGlyphKey(String),

    #[error("width for {glyph:?} must be a finite number, got {width}")]
    InvalidGlyphWidth { glyph: String, width: f64 },
}

/// User-supplied overrides, merged over the built-in defaults.
///
/// This is the shape of the JSON width file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WidthOverrides {
    pub lines_per_page: Option<i64>,
    pub max_line_width: Option<f64>,
    pub cjk_width: Option<f64>,
    pub default_width: Option<f64>,
    /// Single-character keys. Merged over the default table entry by entry.
    #[serde(default)]
    pub char_widths: HashMap<String, f64>,
    /// Extra glyphs to treat as CJK-class, added to the default set.
    #[serde(default)]
    pub chinese_punctuation: Vec<String>,
}

/// Immutable width configuration shared by every layout call in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct WidthConfig {
    lines_per_page: usize,
    max_line_width: f64,
    cjk_width: f64,
    default_width: f64,
    char_widths: HashMap<char, f64>,
    chinese_punctuation: HashSet<char>,
}

impl Default for WidthConfig {
    fn default() -> Self {
        WidthConfig {
            lines_per_page: DEFAULT_LINES_PER_PAGE as usize,
            max_line_width: DEFAULT_MAX_LINE_WIDTH,
            cjk_width: DEFAULT_CJK_WIDTH,
            default_width: DEFAULT_LATIN_WIDTH,
            char_widths: DEFAULT_GLYPH_WIDTHS.iter().copied().collect(),
            chinese_punctuation: DEFAULT_CJK_PUNCTUATION.iter().copied().collect(),
        }
    }
}

impl WidthConfig {
    /// Builds a config with the default width tables and the given page geometry.
    pub fn new(lines_per_page: i64, max_line_width: f64) -> Result<Self, LayoutError> {
        Self::from_overrides(&WidthOverrides {
            lines_per_page: Some(lines_per_page),
            max_line_width: Some(max_line_width),
            ..WidthOverrides::default()
        })
    }

    /// Merges `overrides` over the defaults and validates the result.
    ///
    /// Fails fast on non-positive geometry, multi-character keys, or non-finite
    /// widths. Zero or negative glyph widths are accepted here and reported by
    /// the wrapper when such a glyph is actually laid out.
    pub fn from_overrides(overrides: &WidthOverrides) -> Result<Self, LayoutError> {
        let mut config = WidthConfig::default();

        let lines_per_page = overrides.lines_per_page.unwrap_or(DEFAULT_LINES_PER_PAGE);
        if lines_per_page <= 0 {
            return Err(LayoutError::InvalidLinesPerPage(lines_per_page));
        }
        config.lines_per_page = lines_per_page as usize;

        let max_line_width = overrides.max_line_width.unwrap_or(DEFAULT_MAX_LINE_WIDTH);
        if !max_line_width.is_finite() || max_line_width <= 0.0 {
            return Err(LayoutError::InvalidMaxLineWidth(max_line_width));
        }
        config.max_line_width = max_line_width;

        if let Some(width) = overrides.cjk_width {
            config.cjk_width = finite_width("<cjk>", width)?;
        }
        if let Some(width) = overrides.default_width {
            config.default_width = finite_width("<default>", width)?;
        }

        for (key, &width) in &overrides.char_widths {
            let glyph = single_glyph(key)?;
            config.char_widths.insert(glyph, finite_width(key, width)?);
        }

        for key in &overrides.chinese_punctuation {
            config.chinese_punctuation.insert(single_glyph(key)?);
        }

        Ok(config)
    }

    pub fn lines_per_page(&self) -> usize {
        self.lines_per_page
    }

    pub fn max_line_width(&self) -> f64 {
        self.max_line_width
    }

    pub fn cjk_width(&self) -> f64 {
        self.cjk_width
    }

    pub fn default_width(&self) -> f64 {
        self.default_width
    }

    pub fn classify(&self, c: char) -> GlyphClass {
        if self.chinese_punctuation.contains(&c) || CJK_IDEOGRAPHS.contains(&(c as u32)) {
            GlyphClass::Cjk
        } else {
            GlyphClass::NonCjk
        }
    }

    /// Width of a single glyph. The newline resolves to its negative sentinel.
    pub fn width_of(&self, c: char) -> f64 {
        if let Some(&width) = self.char_widths.get(&c) {
            return width;
        }
        match self.classify(c) {
            GlyphClass::Cjk => self.cjk_width,
            GlyphClass::NonCjk => self.default_width,
        }
    }

    /// Measured width of a string. Newlines are line terminators and are skipped.
    pub fn measure_str(&self, s: &str) -> f64 {
        s.chars()
            .filter(|&c| c != '\n')
            .map(|c| self.width_of(c))
            .sum()
    }
}

fn single_glyph(key: &str) -> Result<char, LayoutError> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(LayoutError::InvalidGlyphKey(key.to_string())),
    }
}

fn finite_width(glyph: &str, width: f64) -> Result<f64, LayoutError> {
    if width.is_finite() {
        Ok(width)
    } else {
        Err(LayoutError::InvalidGlyphWidth {
            glyph: glyph.to_string(),
            width,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
