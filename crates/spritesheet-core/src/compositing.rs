use crate::config::PixelFormat;
use image::buffer::ConvertBuffer;
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

/// Copy `src` into `canvas` with its top-left at (dx, dy), optionally rotated
/// 90° clockwise. Pixels are copied as-is (no blending); anything falling
/// outside the canvas is clipped.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, rotated: bool) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    // destination (rendered) size differs when rotated
    let (rw, rh) = if rotated { (sh, sw) } else { (sw, sh) };

    for yy in 0..rh {
        if dy + yy >= ch {
            break;
        }
        for xx in 0..rw {
            if dx + xx >= cw {
                break;
            }
            let (ix, iy) = if rotated { (yy, sh - 1 - xx) } else { (xx, yy) };
            canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(ix, iy));
        }
    }
}

/// Converts the composed RGBA canvas to the configured output layout.
pub fn to_output_format(rgba: &RgbaImage, format: PixelFormat) -> DynamicImage {
    match format {
        PixelFormat::Rgba8 => DynamicImage::ImageRgba8(rgba.clone()),
        PixelFormat::Rgb8 => DynamicImage::ImageRgb8(ConvertBuffer::<RgbImage>::convert(rgba)),
        PixelFormat::La8 => {
            DynamicImage::ImageLumaA8(ConvertBuffer::<GrayAlphaImage>::convert(rgba))
        }
        PixelFormat::L8 => DynamicImage::ImageLuma8(ConvertBuffer::<GrayImage>::convert(rgba)),
    }
}
