//! Fonts for the text overlay.
//!
//! A TrueType font is preferred, but the overlay must keep working on a bare
//! box with no fonts installed, so the 8x8 bitmap font from `font8x8` is
//! always available as a fallback.

use std::path::Path;

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};
use rusttype::{Font, Scale, point};
use tracing::{debug, info, warn};

use super::AnnotateError;
use crate::compose::mix_channel;
use crate::constants::{BITMAP_FONT_SCALE, FONT_DIRS, FONT_SIZE_PX, PREFERRED_FONT};

/// Tight box around the pixels a line of text actually covers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct InkBox {
    /// Offset of the left-most inked pixel from the pen position
    pub left: i32,
    /// Offset of the top-most inked pixel from the top of the line
    pub top: i32,
    /// Inked width
    pub width: u32,
    /// Inked height
    pub height: u32,
}

/// The font used to draw captions onto images.
pub enum CaptionFont {
    /// A scalable font loaded from disk
    TrueType {
        /// Parsed font
        font: Box<Font<'static>>,
        /// Pixel scale
        scale: Scale,
    },
    /// The built-in 8x8 font, each dot blown up to `scale` pixels
    Bitmap {
        /// Size of one font dot in pixels
        scale: u32,
    },
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrueType { scale, .. } => write!(f, "TrueType({}px)", scale.y),
            Self::Bitmap { scale } => write!(f, "Bitmap(x{scale})"),
        }
    }
}

impl CaptionFont {
    /// Loads `preferred` if given, then the usual system locations for
    /// [PREFERRED_FONT], and settles for the built-in font otherwise.
    pub fn load(preferred: Option<&Path>) -> Self {
        let candidates = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FONT_DIRS.iter().map(|dir| Path::new(dir).join(PREFERRED_FONT)));
        for path in candidates {
            if let Some(font) = Self::from_file(&path) {
                info!("Using font {}", path.display());
                return font;
            }
        }
        warn!("No TrueType font found, falling back to the built-in bitmap font");
        Self::builtin()
    }

    /// The always-available bitmap font.
    pub fn builtin() -> Self {
        Self::Bitmap {
            scale: BITMAP_FONT_SCALE,
        }
    }

    /// Parses TrueType/OpenType bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(bytes).map(|font| Self::TrueType {
            font: Box::new(font),
            scale: Scale::uniform(FONT_SIZE_PX),
        })
    }

    fn from_file(path: &Path) -> Option<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!("Can't read font {}: {}", path.display(), err);
                return None;
            }
        };
        let font = Self::from_bytes(bytes);
        if font.is_none() {
            warn!("{} is not a usable font", path.display());
        }
        font
    }

    /// Measures the inked area of `line`.
    pub fn measure(&self, line: &str) -> Result<InkBox, AnnotateError> {
        match self {
            Self::TrueType { font, scale } => truetype_ink(font, *scale, line),
            Self::Bitmap { scale } => Ok(bitmap_ink(*scale, line)),
        }
    }

    /// Draws `line` so that its ink box starts at (`x`, `y`).
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        x: i64,
        y: i64,
        line: &str,
        colour: Rgba<u8>,
    ) -> Result<(), AnnotateError> {
        match self {
            Self::TrueType { font, scale } => {
                let ink = truetype_ink(font, *scale, line)?;
                let ascent = font.v_metrics(*scale).ascent;
                let origin = point(
                    (x - i64::from(ink.left)) as f32,
                    (y - i64::from(ink.top)) as f32 + ascent,
                );
                for glyph in font.layout(line, *scale, origin) {
                    let Some(bounds) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, coverage| {
                        let px = i64::from(bounds.min.x) + i64::from(gx);
                        let py = i64::from(bounds.min.y) + i64::from(gy);
                        blend_dot(canvas, px, py, colour, coverage);
                    });
                }
                Ok(())
            }
            Self::Bitmap { scale } => {
                draw_bitmap_line(canvas, x, y, line, colour, *scale);
                Ok(())
            }
        }
    }
}

fn truetype_ink(font: &Font<'static>, scale: Scale, line: &str) -> Result<InkBox, AnnotateError> {
    let v_metrics = font.v_metrics(scale);
    if !v_metrics.ascent.is_finite() || !v_metrics.descent.is_finite() {
        return Err(AnnotateError::Metrics(line.to_string()));
    }
    let mut bounds: Option<(i32, i32, i32, i32)> = None;
    for glyph in font.layout(line, scale, point(0.0, v_metrics.ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            bounds = Some(match bounds {
                None => (bb.min.x, bb.min.y, bb.max.x, bb.max.y),
                Some((x0, y0, x1, y1)) => {
                    (x0.min(bb.min.x), y0.min(bb.min.y), x1.max(bb.max.x), y1.max(bb.max.y))
                }
            });
        }
    }
    Ok(match bounds {
        Some((x0, y0, x1, y1)) => InkBox {
            left: x0,
            top: y0,
            width: u32::try_from(x1 - x0).map_err(|_| AnnotateError::Metrics(line.to_string()))?,
            height: u32::try_from(y1 - y0)
                .map_err(|_| AnnotateError::Metrics(line.to_string()))?,
        },
        None => InkBox::default(),
    })
}

/// Maps characters the 8x8 font lacks onto something close.
fn bitmap_char(ch: char) -> char {
    match ch {
        '\u{2014}' | '\u{2013}' => '-',
        '\u{201c}' | '\u{201d}' => '"',
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{2026}' => '.',
        other if BASIC_FONTS.get(other).is_some() => other,
        _ => '?',
    }
}

fn bitmap_ink(scale: u32, line: &str) -> InkBox {
    let count = line.chars().count() as u32;
    if count == 0 {
        return InkBox::default();
    }
    let cell = 8 * scale;
    InkBox {
        left: 0,
        top: 0,
        width: count * cell + (count - 1) * scale,
        height: cell,
    }
}

fn draw_bitmap_line(canvas: &mut RgbaImage, x: i64, y: i64, line: &str, colour: Rgba<u8>, scale: u32) {
    let scale = i64::from(scale.max(1));
    let mut cursor_x = x;
    for ch in line.chars() {
        let Some(rows) = BASIC_FONTS.get(bitmap_char(ch)) else {
            continue;
        };
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..8 {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let dot_x = cursor_x + col * scale;
                let dot_y = y + row as i64 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        blend_dot(canvas, dot_x + dx, dot_y + dy, colour, 1.0);
                    }
                }
            }
        }
        cursor_x += 8 * scale + scale;
    }
}

fn blend_dot(canvas: &mut RgbaImage, x: i64, y: i64, colour: Rgba<u8>, coverage: f32) {
    if coverage <= 0.0 || x < 0 || y < 0 {
        return;
    }
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    let dst = canvas.get_pixel_mut(x, y);
    let weight = coverage.min(1.0) * f32::from(colour.0[3]) / 255.0;
    for channel in 0..3 {
        dst.0[channel] = mix_channel(dst.0[channel], colour.0[channel], weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_missing_font_falls_back() {
        let _ = crate::config::setup_logging(true);
        let font = CaptionFont::load(Some(Path::new("/definitely/not/here.ttf")));
        // the system may or may not have DejaVu, but loading never fails
        assert!(font.measure("hello").is_ok());
    }

    #[test]
    fn test_garbage_bytes_are_not_a_font() {
        assert!(CaptionFont::from_bytes(b"not a font".to_vec()).is_none());
    }

    #[test]
    fn test_bitmap_measure() {
        let font = CaptionFont::builtin();
        let ink = font.measure("abc").expect("bitmap fonts always measure");
        assert_eq!(ink.width, 3 * 32 + 2 * 4);
        assert_eq!(ink.height, 32);
        assert_eq!(font.measure("").expect("empty"), InkBox::default());
    }

    #[test]
    fn test_bitmap_draw_is_clipped() {
        let font = CaptionFont::builtin();
        let mut canvas = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        font.draw(&mut canvas, -10, 5, "HI", WHITE).expect("draws");
        font.draw(&mut canvas, 15, 15, "\u{2014}\u{201c}", WHITE)
            .expect("draws");
        assert!(canvas.pixels().any(|pixel| pixel.0[0] == 255));
    }

    #[test]
    fn test_unknown_chars_become_question_marks() {
        assert_eq!(bitmap_char('\u{2014}'), '-');
        assert_eq!(bitmap_char('A'), 'A');
        assert_eq!(bitmap_char('\u{1f525}'), '?');
    }
}
