use image::RgbaImage;
use std::collections::HashMap;

/// Registry of accepted sprites used to spot pixel-identical ones.
///
/// Images are compared after trimming. A candidate is first checked at seven
/// sample points (corners, center, both diagonal quarter points) and only
/// compared in full when every sample matches.
///
/// The registry owns the accepted pixels; they are handed back with
/// [`DuplicateDetector::into_images`] once the layout is known.
#[derive(Default)]
pub struct DuplicateDetector {
    entries: Vec<(usize, RgbaImage)>,
    by_size: HashMap<(u32, u32), Vec<usize>>,
}

impl DuplicateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records frame `id` as accepted (non-duplicate) with its trimmed pixels.
    pub fn accept(&mut self, id: usize, image: RgbaImage) {
        self.by_size
            .entry(image.dimensions())
            .or_default()
            .push(self.entries.len());
        self.entries.push((id, image));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the earliest accepted frame id whose pixels equal `image`.
    pub fn find_duplicate(&self, image: &RgbaImage) -> Option<usize> {
        let slots = self.by_size.get(&image.dimensions())?;
        slots
            .iter()
            .map(|&slot| &self.entries[slot])
            .find(|(_, accepted)| pixels_equal(image, accepted))
            .map(|(id, _)| *id)
    }

    /// Accepted frames in acceptance order.
    pub fn into_images(self) -> Vec<(usize, RgbaImage)> {
        self.entries
    }
}

fn sample_points(w: u32, h: u32) -> [(u32, u32); 7] {
    let (mx, my) = (w - 1, h - 1);
    [
        (0, 0),
        (mx, 0),
        (0, my),
        (mx, my),
        (w / 2, h / 2),
        (w / 4, h / 4),
        (mx - w / 4, my - h / 4),
    ]
}

/// Pixel-exact equality with a cheap sampled rejection first.
pub fn pixels_equal(a: &RgbaImage, b: &RgbaImage) -> bool {
    if a.dimensions() != b.dimensions() {
        return false;
    }
    let (w, h) = a.dimensions();
    if w == 0 || h == 0 {
        return true;
    }
    if sample_points(w, h)
        .iter()
        .any(|&(x, y)| a.get_pixel(x, y) != b.get_pixel(x, y))
    {
        return false;
    }
    a.as_raw() == b.as_raw()
}
