//! Overlay rendering with the `image` crate.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::color_utils::jet;
use crate::model::OffsetVector;
use crate::overlay::OverlayPlan;

/// Execute an overlay plan.
///
/// The depth image is resized to the RGB image, translated by the offset
/// (uncovered pixels become black), min-max normalized, colored with the jet
/// colormap and blended as `rgb * (1 - alpha) + depth * alpha`.
pub fn render_overlay(plan: &OverlayPlan<'_, RgbImage>) -> RgbImage {
    match *plan {
        OverlayPlan::Passthrough { base } => base.clone(),
        OverlayPlan::Blend {
            base,
            secondary,
            shift,
            alpha,
        } => {
            let (width, height) = base.dimensions();
            let gray = if secondary.dimensions() == (width, height) {
                imageops::grayscale(secondary)
            } else {
                let resized = imageops::resize(secondary, width, height, FilterType::Triangle);
                imageops::grayscale(&resized)
            };
            let depth = normalize(&translate(&gray, shift));

            let mut out = RgbImage::new(width, height);
            for (x, y, pixel) in out.enumerate_pixels_mut() {
                let Rgb(rgb) = *base.get_pixel(x, y);
                let colored = jet(depth.get_pixel(x, y).0[0]);
                *pixel = Rgb(std::array::from_fn(|c| mix(rgb[c], colored[c], alpha)));
            }
            log::trace!("Rendered {}x{} overlay with shift {}", width, height, shift);
            out
        }
    }
}

fn mix(base: u8, over: u8, alpha: f32) -> u8 {
    let v = f32::from(base) * (1.0 - alpha) + f32::from(over) * alpha;
    v.round().clamp(0.0, 255.0) as u8
}

/// Move image content by `shift`, filling uncovered pixels with 0.
fn translate(image: &GrayImage, shift: OffsetVector) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let src_x = i64::from(x) - i64::from(shift.dx());
        let src_y = i64::from(y) - i64::from(shift.dy());
        let (Ok(sx), Ok(sy)) = (u32::try_from(src_x), u32::try_from(src_y)) else {
            continue;
        };
        if sx < width && sy < height {
            *pixel = *image.get_pixel(sx, sy);
        }
    }
    out
}

/// Stretch intensities to the full 0-255 range. A flat image maps to 0.
fn normalize(image: &GrayImage) -> GrayImage {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if max <= min {
        return GrayImage::new(image.width(), image.height());
    }

    let scale = 255.0 / f32::from(max - min);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let v = f32::from(pixel.0[0] - min) * scale;
        *pixel = Luma([v.round() as u8]);
    }
    out
}
