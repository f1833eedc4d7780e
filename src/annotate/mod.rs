//! Drawing the quote onto the finished image.

mod font;

pub use font::{CaptionFont, InkBox};

use image::{DynamicImage, RgbImage, Rgba, RgbaImage};

use crate::compose::mix_channel;
use crate::constants::{
    LINE_SPACING, PANEL_ALPHA, PANEL_MARGIN, PANEL_PADDING, WRAP_COLUMNS,
};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Errors returned when drawing text.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AnnotateError {
    /// There is nothing to draw on.
    EmptyCanvas,
    /// The font couldn't produce sane metrics for a line.
    Metrics(String),
}

impl std::fmt::Display for AnnotateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCanvas => write!(f, "Image has no pixels to draw on"),
            Self::Metrics(line) => write!(f, "Failed to measure text line {line:?}"),
        }
    }
}

impl std::error::Error for AnnotateError {}

/// One wrapped line and its measured ink.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextLine {
    /// The text of the line
    pub text: String,
    /// What it covers once drawn
    pub ink: InkBox,
}

/// Wrapped text, measured and ready to lay out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextBlock {
    /// Lines in drawing order
    pub lines: Vec<TextLine>,
    /// Sum of the line heights plus the gaps between them
    pub height: u32,
}

impl TextBlock {
    /// Wraps and measures `text`.
    pub fn layout(text: &str, font: &CaptionFont) -> Result<Self, AnnotateError> {
        let mut lines = Vec::new();
        for text in wrap_text(text, WRAP_COLUMNS) {
            let ink = font.measure(&text)?;
            lines.push(TextLine { text, ink });
        }
        let gaps = u32::try_from(lines.len().saturating_sub(1)).unwrap_or(u32::MAX);
        let height = lines
            .iter()
            .map(|line| line.ink.height)
            .sum::<u32>()
            .saturating_add(gaps.saturating_mul(LINE_SPACING));
        Ok(Self { lines, height })
    }
}

/// The translucent box behind the text. Coordinates may fall outside the
/// image for very tall text, drawing clips them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Panel {
    /// Left edge before padding
    pub x: i64,
    /// Top edge before padding
    pub y: i64,
    /// Width before padding
    pub width: i64,
    /// Height before padding
    pub height: i64,
}

impl Panel {
    /// Sits at the bottom of a `width` x `height` image, tall enough for
    /// `text_height` pixels of text.
    pub fn for_text(width: u32, height: u32, text_height: u32) -> Self {
        let margin = i64::from(PANEL_MARGIN);
        let panel_height = i64::from(text_height) + margin;
        let panel_width = (i64::from(width) - 2 * margin).max(0);
        Self {
            x: margin,
            y: i64::from(height) - panel_height - margin,
            width: panel_width,
            height: panel_height,
        }
    }

    /// Inclusive (left, top, right, bottom) of the drawn box, padding included.
    pub fn padded_bounds(&self) -> (i64, i64, i64, i64) {
        let padding = i64::from(PANEL_PADDING);
        (
            self.x - padding,
            self.y - padding,
            self.x + self.width + padding,
            self.y + self.height + padding,
        )
    }

    fn fill(&self, canvas: &mut RgbaImage) {
        let (left, top, right, bottom) = self.padded_bounds();
        let max_x = i64::from(canvas.width()) - 1;
        let max_y = i64::from(canvas.height()) - 1;
        let weight = f32::from(PANEL_ALPHA) / 255.0;
        for y in top.max(0)..=bottom.min(max_y) {
            for x in left.max(0)..=right.min(max_x) {
                // both are clamped into the canvas above
                let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                for channel in 0..3 {
                    pixel.0[channel] = mix_channel(pixel.0[channel], 0, weight);
                }
            }
        }
    }
}

/// Greedy word wrap at `columns` characters. Words are never split, so a word
/// longer than a line gets a line to itself.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > columns {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Draws `text` in white on a dark translucent panel along the bottom of
/// `image`. The result has the same size as the input.
pub fn annotate(image: RgbImage, text: &str, font: &CaptionFont) -> Result<RgbImage, AnnotateError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(AnnotateError::EmptyCanvas);
    }

    let block = TextBlock::layout(text, font)?;
    let panel = Panel::for_text(width, height, block.height);

    let mut canvas = DynamicImage::ImageRgb8(image).into_rgba8();
    panel.fill(&mut canvas);

    let mut cursor_y = panel.y + i64::from(PANEL_PADDING);
    for line in &block.lines {
        let x = (i64::from(width) - i64::from(line.ink.width)) / 2;
        font.draw(&mut canvas, x, cursor_y, &line.text, WHITE)?;
        cursor_y += i64::from(line.ink.height) + i64::from(LINE_SPACING);
    }

    Ok(DynamicImage::ImageRgba8(canvas).into_rgb8())
}
