//! Mixing two images into one.
//!
//! Both inputs are first brought to [TARGET_HEIGHT], then one of three
//! strategies is picked at random:
//!
//! - [Strategy::SideBySide] pastes them next to each other
//! - [Strategy::Blend] squashes them to the same width and cross-fades
//! - [Strategy::Overlay] drops a shrunken, slightly rotated copy of the second
//!   image somewhere in the middle of the first

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use rand::Rng;
use tracing::debug;

use crate::constants::{MAX_SCALED_WIDTH, TARGET_HEIGHT};

const BLEND_FACTOR_MIN: f32 = 0.35;
const BLEND_FACTOR_MAX: f32 = 0.65;
const OVERLAY_SCALE_MIN: f64 = 0.35;
const OVERLAY_SCALE_MAX: f64 = 0.6;
const OVERLAY_MAX_DEGREES: f32 = 12.0;
const PLACEMENT_BAND_START: f64 = 0.25;
const PLACEMENT_BAND_END: f64 = 0.65;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// How the two images get combined.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Strategy {
    /// Next to each other, no gap
    SideBySide,
    /// Cross-faded at a random weight
    Blend,
    /// Second image rotated and dropped onto the first
    Overlay,
}

impl Strategy {
    /// Every strategy, in no particular order.
    pub const ALL: [Strategy; 3] = [Strategy::SideBySide, Strategy::Blend, Strategy::Overlay];

    /// Picks one uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::SideBySide => "side-by-side",
            Strategy::Blend => "blend",
            Strategy::Overlay => "overlay",
        };
        f.write_str(name)
    }
}

/// Errors returned when composing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ComposeError {
    /// Not a single image made it through fetching.
    NoImagesAvailable,
    /// An input would be wider than [MAX_SCALED_WIDTH] once rescaled.
    TooWide {
        /// Width of the offending input
        width: u32,
        /// Height of the offending input
        height: u32,
    },
}

impl std::fmt::Display for ComposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoImagesAvailable => write!(f, "Failed to download images"),
            Self::TooWide { width, height } => write!(
                f,
                "{width}x{height} image is too wide to rescale to {TARGET_HEIGHT} high"
            ),
        }
    }
}

impl std::error::Error for ComposeError {}

/// Where the overlay ended up on the base image.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Placement {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width of the pasted (rotated) overlay
    pub width: u32,
    /// Height of the pasted (rotated) overlay
    pub height: u32,
}

impl Placement {
    /// True when the whole box sits inside a `width` x `height` canvas.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

/// Combines the first two images with a random strategy.
///
/// A single image comes back untouched, anything past the second is ignored.
pub fn compose<R: Rng + ?Sized>(
    images: Vec<RgbImage>,
    rng: &mut R,
) -> Result<RgbImage, ComposeError> {
    let mut images = images.into_iter();
    let Some(first) = images.next() else {
        return Err(ComposeError::NoImagesAvailable);
    };
    let Some(second) = images.next() else {
        debug!("Only one image available, passing it through");
        return Ok(first);
    };
    let strategy = Strategy::random(rng);
    compose_pair(&first, &second, strategy, rng)
}

/// Fails when `image` would end up wider than [MAX_SCALED_WIDTH] at
/// [TARGET_HEIGHT].
pub fn check_scaled_width(image: &RgbImage) -> Result<(), ComposeError> {
    let (width, height) = image.dimensions();
    if scale_dimension(width, TARGET_HEIGHT, height) > MAX_SCALED_WIDTH {
        return Err(ComposeError::TooWide { width, height });
    }
    Ok(())
}

/// Combines two images with the given strategy.
pub fn compose_pair<R: Rng + ?Sized>(
    first: &RgbImage,
    second: &RgbImage,
    strategy: Strategy,
    rng: &mut R,
) -> Result<RgbImage, ComposeError> {
    check_scaled_width(first)?;
    check_scaled_width(second)?;
    let first = resize_to_height(first, TARGET_HEIGHT);
    let second = resize_to_height(second, TARGET_HEIGHT);
    debug!(
        "Composing {}x{} and {}x{} using {}",
        first.width(),
        first.height(),
        second.width(),
        second.height(),
        strategy
    );

    match strategy {
        Strategy::SideBySide => side_by_side(&first, &second),
        Strategy::Blend => {
            let factor = rng.random_range(BLEND_FACTOR_MIN..=BLEND_FACTOR_MAX);
            debug!("Blend factor {:.3}", factor);
            Ok(blend(&first, &second, factor))
        }
        Strategy::Overlay => {
            let (image, placement) = overlay(first, &second, rng);
            debug!("Overlay placed at {:?}", placement);
            Ok(image)
        }
    }
}

/// Rescales to `height`, keeping the aspect ratio.
pub fn resize_to_height(image: &RgbImage, height: u32) -> RgbImage {
    let width = scale_dimension(image.width(), height, image.height());
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// `value * numerator / denominator`, rounded down, never below 1.
fn scale_dimension(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Pastes `right` directly to the right of `left`.
pub fn side_by_side(left: &RgbImage, right: &RgbImage) -> Result<RgbImage, ComposeError> {
    let height = left.height().max(right.height());
    let width = left
        .width()
        .checked_add(right.width())
        .filter(|width| *width <= 2 * MAX_SCALED_WIDTH)
        .ok_or(ComposeError::TooWide {
            width: left.width().saturating_add(right.width()),
            height,
        })?;
    let mut canvas = RgbImage::new(width, height);
    imageops::replace(&mut canvas, left, 0, 0);
    imageops::replace(&mut canvas, right, i64::from(left.width()), 0);
    Ok(canvas)
}

/// Cross-fades two images, `factor` being the weight of `second`.
///
/// Both are first squashed to the narrower of the two widths.
pub fn blend(first: &RgbImage, second: &RgbImage, factor: f32) -> RgbImage {
    let width = first.width().min(second.width());
    let height = first.height().min(second.height());
    let first = resize_exact(first, width, height);
    let second = resize_exact(second, width, height);

    let mut canvas = RgbImage::new(width, height);
    for ((out, a), b) in canvas.pixels_mut().zip(first.pixels()).zip(second.pixels()) {
        for channel in 0..3 {
            out.0[channel] = mix_channel(a.0[channel], b.0[channel], factor);
        }
    }
    canvas
}

fn resize_exact(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        image.clone()
    } else {
        imageops::resize(image, width, height, FilterType::Lanczos3)
    }
}

/// Linear mix of two channel values, `weight` being the share of `top`.
pub(crate) fn mix_channel(bottom: u8, top: u8, weight: f32) -> u8 {
    let mixed = f32::from(bottom) * (1.0 - weight) + f32::from(top) * weight;
    mixed.round().clamp(0.0, 255.0) as u8
}

/// Shrinks, rotates and pastes `top` somewhere near the middle of `base`.
pub fn overlay<R: Rng + ?Sized>(
    base: RgbImage,
    top: &RgbImage,
    rng: &mut R,
) -> (RgbImage, Placement) {
    let (base_width, base_height) = base.dimensions();

    let scale = rng.random_range(OVERLAY_SCALE_MIN..=OVERLAY_SCALE_MAX);
    let mut width = ((f64::from(base_width) * scale) as u32).max(1);
    let mut height = scale_dimension(top.height(), width, top.width());
    if height > base_height {
        width = scale_dimension(width, base_height, height);
        height = base_height;
    }
    let shrunk = imageops::resize(top, width, height, FilterType::Lanczos3);

    let degrees = rng.random_range(-OVERLAY_MAX_DEGREES..=OVERLAY_MAX_DEGREES);
    let mut rotated = rotate_expanded(&shrunk, degrees);
    if rotated.width() > base_width || rotated.height() > base_height {
        let (fit_width, fit_height) =
            fit_within(rotated.dimensions(), (base_width, base_height));
        rotated = imageops::resize(&rotated, fit_width, fit_height, FilterType::Lanczos3);
    }

    let placement = place_overlay((base_width, base_height), rotated.dimensions(), rng);
    let mut canvas = base;
    paste_with_alpha(&mut canvas, &rotated, placement.x, placement.y);
    (canvas, placement)
}

/// Scales `size` down so it fits inside `bounds`, keeping the aspect ratio.
fn fit_within(size: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let ratio = (f64::from(bounds.0) / f64::from(size.0.max(1)))
        .min(f64::from(bounds.1) / f64::from(size.1.max(1)));
    let width = ((f64::from(size.0) * ratio) as u32).clamp(1, bounds.0.max(1));
    let height = ((f64::from(size.1) * ratio) as u32).clamp(1, bounds.1.max(1));
    (width, height)
}

/// Rotates counter-clockwise by `degrees`, growing the canvas so nothing is
/// cut off. The new corners are transparent.
fn rotate_expanded(image: &RgbImage, degrees: f32) -> RgbaImage {
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let (width, height) = (image.width() as f32, image.height() as f32);
    let expanded_width = ((width * cos.abs() + height * sin.abs()).ceil() as u32).max(image.width());
    let expanded_height =
        ((width * sin.abs() + height * cos.abs()).ceil() as u32).max(image.height());

    let mut padded = RgbaImage::from_pixel(expanded_width, expanded_height, TRANSPARENT);
    let source = DynamicImage::ImageRgb8(image.clone()).into_rgba8();
    imageops::replace(
        &mut padded,
        &source,
        i64::from((expanded_width - image.width()) / 2),
        i64::from((expanded_height - image.height()) / 2),
    );
    // imageproc turns clockwise for positive angles
    rotate_about_center(&padded, -theta, Interpolation::Bilinear, TRANSPARENT)
}

/// Picks a spot for an `overlay` sized box inside `base`.
///
/// The spot is drawn from the 25%-65% band on each axis. When the box is too
/// big for the band it is centred in whatever room is left.
pub fn place_overlay<R: Rng + ?Sized>(
    base: (u32, u32),
    overlay: (u32, u32),
    rng: &mut R,
) -> Placement {
    let width = overlay.0.min(base.0);
    let height = overlay.1.min(base.1);
    Placement {
        x: place_on_axis(base.0, width, rng),
        y: place_on_axis(base.1, height, rng),
        width,
        height,
    }
}

fn place_on_axis<R: Rng + ?Sized>(extent: u32, size: u32, rng: &mut R) -> u32 {
    let max = extent.saturating_sub(size);
    let low = (f64::from(extent) * PLACEMENT_BAND_START) as i64;
    let high = ((f64::from(extent) * PLACEMENT_BAND_END - f64::from(size)) as i64)
        .min(i64::from(max));
    if high < low {
        max / 2
    } else {
        u32::try_from(rng.random_range(low..=high)).unwrap_or(max / 2)
    }
}

/// Alpha-composites `top` onto `base` at (`x`, `y`), clipping at the edges.
pub(crate) fn paste_with_alpha(base: &mut RgbImage, top: &RgbaImage, x: u32, y: u32) {
    for (dx, dy, pixel) in top.enumerate_pixels() {
        let alpha = pixel.0[3];
        if alpha == 0 {
            continue;
        }
        let (target_x, target_y) = (x + dx, y + dy);
        if target_x >= base.width() || target_y >= base.height() {
            continue;
        }
        let weight = f32::from(alpha) / 255.0;
        let target = base.get_pixel_mut(target_x, target_y);
        for channel in 0..3 {
            target.0[channel] = mix_channel(target.0[channel], pixel.0[channel], weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const RED: Rgb<u8> = Rgb([200, 30, 30]);
    const BLUE: Rgb<u8> = Rgb([20, 40, 220]);

    fn solid(width: u32, height: u32, colour: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(width, height, colour)
    }

    fn close(actual: Rgb<u8>, expected: [f32; 3]) -> bool {
        actual
            .0
            .iter()
            .zip(expected)
            .all(|(a, e)| (f32::from(*a) - e).abs() <= 1.0)
    }

    #[test]
    fn test_compose_nothing_fails() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            compose(Vec::new(), &mut rng),
            Err(ComposeError::NoImagesAvailable)
        );
    }

    #[test]
    fn test_compose_single_passes_through() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut image = solid(31, 17, RED);
        image.put_pixel(3, 4, BLUE);
        let out = compose(vec![image.clone()], &mut rng).expect("one image is enough");
        assert_eq!(out, image);
    }

    #[test]
    fn test_compose_always_targets_height() {
        for seed in 0..12 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = compose(
                vec![solid(400, 300, RED), solid(120, 500, BLUE), solid(9, 9, RED)],
                &mut rng,
            )
            .expect("two images");
            assert_eq!(out.height(), TARGET_HEIGHT);
        }
    }

    #[test]
    fn test_random_strategy_covers_all() {
        let mut rng = StdRng::seed_from_u64(3);
        let seen: Vec<Strategy> = (0..200).map(|_| Strategy::random(&mut rng)).collect();
        for strategy in Strategy::ALL {
            assert!(seen.contains(&strategy), "{strategy} never drawn");
        }
    }

    #[test]
    fn test_resize_keeps_aspect() {
        let resized = resize_to_height(&solid(400, 300, RED), TARGET_HEIGHT);
        assert_eq!(resized.dimensions(), (1066, 800));
        let resized = resize_to_height(&solid(1, 4000, RED), TARGET_HEIGHT);
        assert_eq!(resized.dimensions(), (1, 800));
    }

    #[test]
    fn test_side_by_side_widths_add_up() {
        let mut rng = StdRng::seed_from_u64(4);
        let out = compose_pair(
            &solid(400, 300, RED),
            &solid(640, 800, BLUE),
            Strategy::SideBySide,
            &mut rng,
        )
        .expect("fits");
        assert_eq!(out.dimensions(), (1066 + 640, TARGET_HEIGHT));
        assert!(close(*out.get_pixel(10, 400), [200.0, 30.0, 30.0]));
        assert!(close(*out.get_pixel(1066, 400), [20.0, 40.0, 220.0]));
        assert!(close(*out.get_pixel(1066 + 639, 799), [20.0, 40.0, 220.0]));
    }

    #[test]
    fn test_blend_mixes_by_factor() {
        let out = blend(&solid(300, 800, RED), &solid(500, 800, BLUE), 0.4);
        assert_eq!(out.dimensions(), (300, 800));
        let expected = [
            200.0 * 0.6 + 20.0 * 0.4,
            30.0 * 0.6 + 40.0 * 0.4,
            30.0 * 0.6 + 220.0 * 0.4,
        ];
        assert!(close(*out.get_pixel(0, 0), expected));
        assert!(close(*out.get_pixel(299, 799), expected));
    }

    #[test]
    fn test_blend_strategy_uses_narrower_width() {
        let mut rng = StdRng::seed_from_u64(5);
        let out = compose_pair(
            &solid(400, 300, RED),
            &solid(200, 400, BLUE),
            Strategy::Blend,
            &mut rng,
        )
        .expect("fits");
        assert_eq!(out.dimensions(), (400, TARGET_HEIGHT));
    }

    #[test]
    fn test_blend_factor_stays_in_range() {
        let bounds: Vec<(f32, f32)> = RED
            .0
            .iter()
            .zip(BLUE.0)
            .map(|(a, b)| {
                let low_weight = f32::from(*a) * 0.65 + f32::from(b) * 0.35;
                let high_weight = f32::from(*a) * 0.35 + f32::from(b) * 0.65;
                (low_weight.min(high_weight) - 1.0, low_weight.max(high_weight) + 1.0)
            })
            .collect();
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = compose_pair(
                &solid(300, 800, RED),
                &solid(300, 800, BLUE),
                Strategy::Blend,
                &mut rng,
            )
            .expect("fits");
            let pixel = out.get_pixel(150, 400);
            for (channel, (low, high)) in pixel.0.iter().zip(&bounds) {
                let value = f32::from(*channel);
                assert!(
                    (*low..=*high).contains(&value),
                    "seed {seed}: {pixel:?} is outside the blend range"
                );
            }
        }
    }

    #[test]
    fn test_overlay_rotation_is_small() {
        // a 2:1 overlay gets taller relative to its width the further it turns,
        // 12 degrees brings it to about 0.644
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (_, placement) = overlay(
                solid(1066, TARGET_HEIGHT, RED),
                &solid(1600, TARGET_HEIGHT, BLUE),
                &mut rng,
            );
            let ratio = f64::from(placement.height) / f64::from(placement.width);
            assert!(
                (0.49..=0.66).contains(&ratio),
                "seed {seed}: {placement:?} turned too far"
            );
        }
    }

    #[test]
    fn test_very_wide_input_is_refused() {
        let banner = solid(60000, 1, RED);
        let photo = solid(400, 300, BLUE);
        assert_eq!(
            check_scaled_width(&banner),
            Err(ComposeError::TooWide {
                width: 60000,
                height: 1
            })
        );
        for seed in 0..6 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(
                compose(vec![banner.clone(), photo.clone()], &mut rng),
                Err(ComposeError::TooWide {
                    width: 60000,
                    height: 1
                })
            );
            assert!(compose(vec![photo.clone(), banner.clone()], &mut rng).is_err());
        }
        // tall and narrow is fine, it just gets thinner
        let mut rng = StdRng::seed_from_u64(9);
        let out = compose_pair(&solid(1, 60000, RED), &photo, Strategy::SideBySide, &mut rng)
            .expect("narrow inputs fit");
        assert_eq!(out.dimensions(), (1 + 1066, TARGET_HEIGHT));
    }

    #[test]
    fn test_side_by_side_refuses_overflow() {
        let wide = RgbImage::new(2 * MAX_SCALED_WIDTH, 1);
        assert!(matches!(
            side_by_side(&wide, &RgbImage::new(1, 1)),
            Err(ComposeError::TooWide { .. })
        ));
    }

    #[test]
    fn test_overlay_stays_inside_base() {
        let tops: Vec<RgbImage> = [800, 3000, 40, 1]
            .into_iter()
            .map(|width| solid(width, TARGET_HEIGHT, BLUE))
            .collect();
        for seed in 0..15 {
            let mut rng = StdRng::seed_from_u64(seed);
            for top in &tops {
                let base = solid(1066, TARGET_HEIGHT, RED);
                let (out, placement) = overlay(base, top, &mut rng);
                assert_eq!(out.dimensions(), (1066, TARGET_HEIGHT));
                assert!(
                    placement.fits_within(1066, TARGET_HEIGHT),
                    "{placement:?} escapes the base for a {} wide overlay",
                    top.width()
                );
            }
        }
    }

    #[test]
    fn test_overlay_leaves_outside_untouched() {
        let mut rng = StdRng::seed_from_u64(6);
        let base = solid(1000, TARGET_HEIGHT, RED);
        let (out, placement) = overlay(base, &solid(1000, TARGET_HEIGHT, BLUE), &mut rng);
        assert!(placement.x > 0 && placement.y > 0);
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(999, 799), RED);
        let centre = out.get_pixel(
            placement.x + placement.width / 2,
            placement.y + placement.height / 2,
        );
        assert!(close(*centre, [20.0, 40.0, 220.0]));
    }

    #[test]
    fn test_placement_band_and_fallback() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let placement = place_overlay((1000, 800), (200, 100), &mut rng);
            assert!((250..=450).contains(&placement.x));
            assert!((200..=420).contains(&placement.y));
        }
        // too big for the band, centred in the remaining room
        let placement = place_overlay((100, 100), (90, 100), &mut rng);
        assert_eq!((placement.x, placement.y), (5, 0));
        // bigger than the base altogether
        let placement = place_overlay((100, 100), (300, 300), &mut rng);
        assert_eq!(placement, Placement { x: 0, y: 0, width: 100, height: 100 });
    }

    #[test]
    fn test_rotation_grows_canvas() {
        let rotated = rotate_expanded(&solid(100, 50, RED), 12.0);
        assert!(rotated.width() > 100 && rotated.height() > 50);
        assert_eq!(rotated.get_pixel(0, 0).0[3], 0);
        let flat = rotate_expanded(&solid(100, 50, RED), 0.0);
        assert_eq!(flat.dimensions(), (100, 50));
    }
}
