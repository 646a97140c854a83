use crate::config::TransparentPolicy;
use crate::model::Rect;
use image::{DynamicImage, RgbaImage, imageops};

/// Trim rectangle of a sprite together with its pre-trim size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimResult {
    /// Content bounds in the source image's own coordinates.
    pub rect: Rect,
    pub source_size: (u32, u32),
}

impl TrimResult {
    pub fn untrimmed(w: u32, h: u32) -> Self {
        Self {
            rect: Rect::new(0, 0, w, h),
            source_size: (w, h),
        }
    }

    pub fn is_trimmed(&self) -> bool {
        self.rect != Rect::new(0, 0, self.source_size.0, self.source_size.1)
    }
}

#[inline]
fn is_content(alpha: u8, strict: bool) -> bool {
    if strict { alpha == u8::MAX } else { alpha != 0 }
}

/// Bounding box of content pixels, or `None` if the image has none.
///
/// Rows are scanned top to bottom. Once a row yields a new left bound the scan
/// jumps straight to the current right bound, so a row is assumed to hold one
/// contiguous run between its first and last content pixel.
pub fn bounding_box(rgba: &RgbaImage, strict: bool) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    let mut left = w;
    let mut right = 0u32;
    let mut top = h;
    let mut bottom = 0u32;

    for y in 0..h {
        let mut row_filled = false;
        let mut x = 0u32;
        while x < w {
            if is_content(rgba.get_pixel(x, y)[3], strict) {
                row_filled = true;
                right = right.max(x);
                if left > x {
                    left = x;
                    x = right;
                }
            }
            x += 1;
        }
        if row_filled {
            top = top.min(y);
            bottom = y;
        }
    }

    if left > right || top > bottom {
        return None;
    }
    Some(Rect::new(left, top, right - left + 1, bottom - top + 1))
}

/// Crops transparent borders away from `image`.
///
/// Images smaller than 2x2 or without an alpha channel come back unchanged with a
/// full-size trim rectangle; so does an image whose content already touches every edge.
pub fn trim(
    image: DynamicImage,
    strict: bool,
    policy: TransparentPolicy,
) -> (RgbaImage, TrimResult) {
    let has_alpha = image.color().has_alpha();
    let rgba = image.into_rgba8();
    let (w, h) = rgba.dimensions();
    let full = TrimResult::untrimmed(w, h);

    if w < 2 || h < 2 || !has_alpha {
        return (rgba, full);
    }

    let rect = match bounding_box(&rgba, strict) {
        Some(r) => r,
        None => match policy {
            TransparentPolicy::Keep => return (rgba, full),
            TransparentPolicy::OneByOne => Rect::new(0, 0, 1, 1),
        },
    };

    if rect.x > 0 || rect.y > 0 || rect.w < w || rect.h < h {
        let cropped = imageops::crop_imm(&rgba, rect.x, rect.y, rect.w, rect.h).to_image();
        (
            cropped,
            TrimResult {
                rect,
                source_size: (w, h),
            },
        )
    } else {
        (rgba, full)
    }
}
