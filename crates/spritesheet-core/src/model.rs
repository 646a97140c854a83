use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Exclusive right edge (`x + w`).
    pub fn right_ex(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom_ex(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x
            && r.y >= self.y
            && r.right_ex() <= self.right_ex()
            && r.bottom_ex() <= self.bottom_ex()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right_ex()
            || r.x >= self.right_ex()
            || self.y >= r.bottom_ex()
            || r.y >= self.bottom_ex())
    }
}

/// Where one source sprite ended up in the atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frame<K = String> {
    /// Frame identifier (path relative to the input root).
    pub key: K,
    /// Destination rectangle on the canvas (post-rotation width/height).
    pub frame: Rect,
    /// True if the sprite was rotated 90° clockwise when copied into the canvas.
    pub rotated: bool,
    /// True if transparent borders were trimmed away.
    pub trimmed: bool,
    /// Trim rectangle inside the pre-trim image, in the sprite's own unrotated space.
    pub source: Rect,
    /// Pre-trim image size.
    pub source_size: (u32, u32),
    /// Top-left shift of the trimmed content inside the pre-trim image.
    pub offset: (u32, u32),
    /// Key of the frame this one is pixel-identical to; such frames share its destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<K>,
}

impl<K> Frame<K> {
    pub fn is_duplicate(&self) -> bool {
        self.duplicate_of.is_some()
    }
}

/// Atlas-level metadata consumed by manifest writers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    /// Manifest format version tag.
    pub schema_version: String,
    pub app: String,
    pub version: String,
    /// Pixel format tag of the output buffer.
    pub format: String,
    pub scale: f32,
    pub power_of_two: bool,
    pub square: bool,
    pub max_dim: (u32, u32),
    /// (outer, inner) padding.
    pub padding: (u32, u32),
    pub allow_rotation: bool,
    pub trim_mode: String,
}

/// Resolved frame table plus canvas size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atlas<K = String> {
    pub width: u32,
    pub height: u32,
    /// Frames in packing order; duplicates directly follow their original.
    pub frames: Vec<Frame<K>>,
    pub meta: Meta,
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Total number of frames, duplicates included.
    pub num_frames: usize,
    /// Frames that share another frame's pixels.
    pub num_duplicates: usize,
    /// Canvas area (width * height).
    pub canvas_area: u64,
    /// Area covered by distinct (non-duplicate) frames.
    pub used_frame_area: u64,
    /// Occupancy ratio: used_frame_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
    pub width: u32,
    pub height: u32,
    pub num_rotated: usize,
    pub num_trimmed: usize,
}

impl<K> Atlas<K> {
    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> PackStats {
        let mut used_frame_area = 0u64;
        let mut num_duplicates = 0;
        let mut num_rotated = 0;
        let mut num_trimmed = 0;

        for frame in &self.frames {
            if frame.is_duplicate() {
                num_duplicates += 1;
            } else {
                used_frame_area += frame.frame.area();
            }
            if frame.rotated {
                num_rotated += 1;
            }
            if frame.trimmed {
                num_trimmed += 1;
            }
        }

        let canvas_area = self.width as u64 * self.height as u64;
        let occupancy = if canvas_area > 0 {
            used_frame_area as f64 / canvas_area as f64
        } else {
            0.0
        };

        PackStats {
            num_frames: self.frames.len(),
            num_duplicates,
            canvas_area,
            used_frame_area,
            occupancy,
            width: self.width,
            height: self.height,
            num_rotated,
            num_trimmed,
        }
    }

    /// Looks up a frame by key.
    pub fn frame(&self, key: &str) -> Option<&Frame<K>>
    where
        K: AsRef<str>,
    {
        self.frames.iter().find(|f| f.key.as_ref() == key)
    }
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Canvas: {}x{}, Frames: {} ({} duplicates), Occupancy: {:.2}%, Rotated: {}, Trimmed: {}",
            self.width,
            self.height,
            self.num_frames,
            self.num_duplicates,
            self.occupancy * 100.0,
            self.num_rotated,
            self.num_trimmed,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_frame_area)
    }
}
