//! Inline image thumbnail rendered with half-block cells
//!
//! Each terminal cell shows two vertically stacked pixels: the upper one as
//! the foreground of a "▀" glyph, the lower one as its background. Decoding
//! happens once at construction; rendering is just copying prebuilt lines.

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

/// Maximum thumbnail width in terminal cells
const MAX_COLS: u32 = 40;

/// A decoded, downscaled image ready for transcript display
#[derive(Debug, Clone)]
pub struct Thumbnail {
    lines: Vec<Line<'static>>,
}

impl Thumbnail {
    /// Decode image bytes into a cell grid at most `max_cols` wide.
    /// Returns None if the bytes don't decode as an image.
    pub fn from_bytes(bytes: &[u8], max_cols: u16) -> Option<Self> {
        let img = image::load_from_memory(bytes).ok()?;
        let cols = (max_cols as u32).clamp(4, MAX_COLS);
        // Fit within a cols x cols pixel box; row pairs become one cell row,
        // which roughly matches the 1:2 cell aspect of most terminals.
        let rgba = img.thumbnail(cols, cols).to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut lines = Vec::with_capacity(height.div_ceil(2) as usize);
        for y in (0..height).step_by(2) {
            let mut spans = Vec::with_capacity(width as usize);
            for x in 0..width {
                let top = rgba.get_pixel(x, y);
                let mut style = Style::default().fg(Color::Rgb(top[0], top[1], top[2]));
                if y + 1 < height {
                    let bottom = rgba.get_pixel(x, y + 1);
                    style = style.bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                }
                spans.push(Span::styled("▀", style));
            }
            lines.push(Line::from(spans));
        }
        Some(Self { lines })
    }

    /// Prebuilt display lines
    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Height in cell rows
    pub fn height(&self) -> usize {
        self.lines.len()
    }
}
