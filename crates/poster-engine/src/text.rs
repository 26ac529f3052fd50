//! Caption fitting: wraps a title into a box, shrinking the font until it fits.

use tracing::debug;

use crate::font::{FontLoader, TitleFont};

/// A caption wrapped into lines at a concrete font.
#[derive(Debug, Clone)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub font: TitleFont,
    /// Sum of the rendered height of every line.
    pub height: u32,
}

/// Outcome of fitting a title into its caption band.
#[derive(Debug, Clone)]
pub enum TitleFit {
    /// The title fits at `layout.font`.
    Fits(TextLayout),
    /// No title was requested (blank text).
    Empty,
    /// No size above the minimum fits; `last_size` is the smallest size tried.
    GaveUp { last_size: u32 },
}

impl TitleFit {
    pub fn layout(&self) -> Option<&TextLayout> {
        match self {
            Self::Fits(layout) => Some(layout),
            _ => None,
        }
    }

    /// Rendered height of the fitted title, zero when nothing is drawn.
    pub fn height(&self) -> u32 {
        self.layout().map_or(0, |l| l.height)
    }
}

/// Box a caption must fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitBox {
    pub max_width: u32,
    pub max_height: u32,
    /// Shrinking stops once the font size is no longer above this value.
    pub min_font_size: u32,
}

/// Fit a title starting at `round(start_size × scale_factor)` pixels.
///
/// Shrinking stops once the size drops to `floor(8 × scale_factor)`.
pub fn fit_title(
    text: &str,
    fonts: &FontLoader,
    start_size: f32,
    max_width: u32,
    max_height: u32,
    scale_factor: f32,
) -> TitleFit {
    let bounds = FitBox {
        max_width,
        max_height,
        min_font_size: (8.0 * scale_factor).floor().max(0.0) as u32,
    };
    wrap_text(text, fonts.load(start_size, scale_factor), fonts, bounds)
}

/// Fit `text` into `bounds`, starting at `font` and shrinking one pixel at a time.
pub fn wrap_text(text: &str, font: TitleFont, fonts: &FontLoader, bounds: FitBox) -> TitleFit {
    if text.trim().is_empty() {
        return TitleFit::Empty;
    }

    let mut font = font;
    loop {
        let size = font.size();
        if size <= bounds.min_font_size {
            debug!(
                size,
                min = bounds.min_font_size,
                "Title does not fit at any allowed size"
            );
            return TitleFit::GaveUp { last_size: size };
        }

        let lines = wrap_words(text, chars_per_line(bounds.max_width, size));
        let height = text_height(&lines, &font);
        if height <= bounds.max_height {
            debug!(size, lines = lines.len(), height, "Title fitted");
            return TitleFit::Fits(TextLayout {
                lines,
                font,
                height,
            });
        }

        font = fonts.at_px(size - 1);
    }
}

/// Approximate characters per line: half the font size per character.
pub fn chars_per_line(max_width: u32, font_size: u32) -> usize {
    let per_char = font_size.max(1) as f32 / 2.0;
    ((max_width as f32 / per_char).floor() as usize).max(1)
}

/// Greedy whitespace wrap into lines of at most `width` characters.
///
/// Runs of whitespace collapse to one space; words longer than `width` are
/// broken across lines.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
            continue;
        }

        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if word_len <= width {
            current.push_str(word);
            current_len = word_len;
            continue;
        }

        // Force-break a word that cannot fit on any line.
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(width).peekable();
        while let Some(chunk) = chunks.next() {
            if chunks.peek().is_some() {
                lines.push(chunk.iter().collect());
            } else {
                current = chunk.iter().collect();
                current_len = chunk.len();
            }
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Total rendered height of `lines` stacked without extra leading.
pub fn text_height(lines: &[String], font: &TitleFont) -> u32 {
    lines.iter().map(|line| font.line_height(line)).sum()
}
