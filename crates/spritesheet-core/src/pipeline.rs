use crate::compositing::{blit_rgba, to_output_format};
use crate::config::{AtlasConfig, PixelFormat, TrimMode};
use crate::dedup::DuplicateDetector;
use crate::error::{Result, SpritesheetError};
use crate::model::{Atlas, Frame, Meta, Rect};
use crate::order::{adjust_for_duplicates, sort_order};
use crate::sizing::{self, PackItem, PackedLayout};
use crate::trim::{TrimResult, trim};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// In-memory image to pack (key + decoded image).
pub struct InputImage {
    pub key: String,
    pub image: DynamicImage,
}

/// Image file to pack; decoded lazily, one at a time.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub key: String,
    pub path: PathBuf,
}

/// Output of a packing run: the frame table and the composed canvas.
pub struct PackOutput {
    pub atlas: Atlas,
    /// Canvas composed as RGBA; see [`PackOutput::image`] for the configured layout.
    pub rgba: RgbaImage,
    pub format: PixelFormat,
}

impl PackOutput {
    /// Canvas converted to the configured output pixel format.
    pub fn image(&self) -> DynamicImage {
        to_output_format(&self.rgba, self.format)
    }

    /// Computes packing statistics for this output.
    /// This is a convenience method that delegates to `atlas.stats()`.
    pub fn stats(&self) -> crate::model::PackStats {
        self.atlas.stats()
    }
}

/// Per-frame state after trimming and duplicate detection.
struct Prepared {
    key: String,
    trim: TrimResult,
    duplicate_of: Option<usize>,
}

/// Incremental trim + dedup stage. Accepted pixels are owned by the detector;
/// everything else is dropped as soon as a frame is recorded.
struct Preparer<'a> {
    cfg: &'a AtlasConfig,
    prepared: Vec<Prepared>,
    detector: DuplicateDetector,
    keys: HashMap<String, usize>,
}

impl<'a> Preparer<'a> {
    fn new(cfg: &'a AtlasConfig) -> Self {
        Self {
            cfg,
            prepared: Vec::new(),
            detector: DuplicateDetector::new(),
            keys: HashMap::new(),
        }
    }

    fn push(&mut self, key: String, image: DynamicImage) -> Result<()> {
        if self.keys.contains_key(&key) {
            return Err(SpritesheetError::InvalidConfig(format!(
                "frame key '{key}' appears more than once"
            )));
        }
        let image = downscale(&key, image, self.cfg.scale)?;

        let (pixels, trim_result) = match self.cfg.trim_mode {
            TrimMode::None => {
                let rgba = image.into_rgba8();
                let (w, h) = rgba.dimensions();
                (rgba, TrimResult::untrimmed(w, h))
            }
            mode => trim(
                image,
                mode == TrimMode::Strict,
                self.cfg.transparent_policy,
            ),
        };

        let id = self.prepared.len();
        let duplicate_of = if self.cfg.detect_duplicates {
            self.detector.find_duplicate(&pixels)
        } else {
            None
        };
        match duplicate_of {
            Some(original) => {
                debug!(key = %key, original = %self.prepared[original].key, "duplicate frame");
            }
            None => self.detector.accept(id, pixels),
        }

        self.keys.insert(key.clone(), id);
        self.prepared.push(Prepared {
            key,
            trim: trim_result,
            duplicate_of,
        });
        Ok(())
    }
}

fn downscale(key: &str, image: DynamicImage, scale: f32) -> Result<DynamicImage> {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return Err(SpritesheetError::invalid_source(key, "image has no pixels"));
    }
    if scale >= 1.0 {
        return Ok(image);
    }
    let nw = (w as f32 * scale).floor() as u32;
    let nh = (h as f32 * scale).floor() as u32;
    if nw == 0 || nh == 0 {
        return Err(SpritesheetError::invalid_source(
            key,
            format!("{w}x{h} scaled by {scale} collapses to {nw}x{nh}"),
        ));
    }
    Ok(image.resize_exact(nw, nh, FilterType::Lanczos3))
}

#[instrument(skip_all)]
/// Packs `inputs` into one atlas using configuration `cfg`.
///
/// Notes:
/// - Each input is trimmed and checked for duplicates as it is consumed; the
///   untrimmed buffer is released before the next input is looked at.
/// - Frames come back in packing order with duplicates right behind their original.
pub fn pack_images(inputs: Vec<InputImage>, cfg: AtlasConfig) -> Result<PackOutput> {
    cfg.validate()?;

    if inputs.is_empty() {
        return Err(SpritesheetError::Empty);
    }

    let mut preparer = Preparer::new(&cfg);
    for input in inputs {
        preparer.push(input.key, input.image)?;
    }
    compose(preparer)
}

#[instrument(skip_all, fields(count = sources.len()))]
/// Decodes and packs image files. Files are decoded one at a time; any decode
/// failure aborts the run with `InvalidSourceImage` naming the file.
pub fn pack_files(sources: &[SourceFile], cfg: AtlasConfig) -> Result<PackOutput> {
    cfg.validate()?;

    if sources.is_empty() {
        return Err(SpritesheetError::Empty);
    }

    let mut preparer = Preparer::new(&cfg);
    for src in sources {
        let image = decode_file(src)?;
        preparer.push(src.key.clone(), image)?;
    }
    compose(preparer)
}

fn decode_file(src: &SourceFile) -> Result<DynamicImage> {
    let reader = ImageReader::open(&src.path)
        .map_err(|e| SpritesheetError::invalid_source(&src.key, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| SpritesheetError::invalid_source(&src.key, e.to_string()))?;
    reader
        .decode()
        .map_err(|e| SpritesheetError::invalid_source(&src.key, e.to_string()))
}

fn compose(preparer: Preparer<'_>) -> Result<PackOutput> {
    let Preparer {
        cfg,
        prepared,
        detector,
        ..
    } = preparer;

    let (atlas, placed) = plan(&prepared, cfg)?;

    let mut canvas = RgbaImage::new(atlas.width, atlas.height);
    for (id, pixels) in detector.into_images() {
        if let Some((rect, rotated)) = placed[id] {
            blit_rgba(&pixels, &mut canvas, rect.x, rect.y, rotated);
        }
        // pixels dropped here, right after they reach the canvas
    }

    info!(
        width = atlas.width,
        height = atlas.height,
        frames = atlas.frames.len(),
        duplicates = atlas.frames.iter().filter(|f| f.is_duplicate()).count(),
        "atlas composed"
    );
    Ok(PackOutput {
        atlas,
        rgba: canvas,
        format: cfg.output_format,
    })
}

/// Orders, sizes and crops the layout. Returns the atlas record plus the final
/// destination rectangle and rotation of each prepared frame, by frame index.
fn plan(prepared: &[Prepared], cfg: &AtlasConfig) -> Result<(Atlas, Vec<Option<(Rect, bool)>>)> {
    let overhead = cfg.slot_overhead();
    let items: Vec<PackItem> = prepared
        .iter()
        .map(|p| PackItem {
            w: p.trim.rect.w.saturating_add(overhead),
            h: p.trim.rect.h.saturating_add(overhead),
            duplicate_of: p.duplicate_of,
        })
        .collect();
    let sizes: Vec<(u32, u32)> = prepared.iter().map(|p| (p.trim.rect.w, p.trim.rect.h)).collect();
    let duplicate_of: Vec<Option<usize>> = prepared.iter().map(|p| p.duplicate_of).collect();

    let mut order = sort_order(&sizes, cfg.sort_mode);
    adjust_for_duplicates(&mut order, &duplicate_of)?;

    let layout = sizing::search(&items, &order, cfg)?;
    let (width, height, origin) = crop_box(&layout, cfg)?;
    debug!(
        trials = layout.trials,
        slack = layout.slack,
        canvas_w = layout.canvas.0,
        canvas_h = layout.canvas.1,
        width,
        height,
        "layout accepted"
    );

    let mut placed: Vec<Option<(Rect, bool)>> = vec![None; prepared.len()];
    let mut frames: Vec<Frame> = Vec::with_capacity(order.len());
    for &i in &order {
        let p = &prepared[i];
        let slot = layout.placements[i].ok_or_else(|| {
            SpritesheetError::InvariantViolation(format!("frame '{}' has no placement", p.key))
        })?;
        let content = p.duplicate_of.map_or(&p.trim.rect, |o| &prepared[o].trim.rect);
        let (cw, ch) = if slot.rotated {
            (content.h, content.w)
        } else {
            (content.w, content.h)
        };
        let dest = Rect::new(
            slot.rect.x + cfg.border_padding - origin.0,
            slot.rect.y + cfg.border_padding - origin.1,
            cw,
            ch,
        );
        placed[i] = Some((dest, slot.rotated));
        frames.push(Frame {
            key: p.key.clone(),
            frame: dest,
            rotated: slot.rotated,
            trimmed: p.trim.is_trimmed(),
            source: p.trim.rect,
            source_size: p.trim.source_size,
            offset: (p.trim.rect.x, p.trim.rect.y),
            duplicate_of: p.duplicate_of.map(|o| prepared[o].key.clone()),
        });
    }

    let atlas = Atlas {
        width,
        height,
        frames,
        meta: build_meta(cfg),
    };
    Ok((atlas, placed))
}

/// Tight bounds of every placed slot, minus the inner padding overshoot at the
/// far edges, then rounded per configuration. Returns (width, height, origin).
fn crop_box(layout: &PackedLayout, cfg: &AtlasConfig) -> Result<(u32, u32, (u32, u32))> {
    let mut left = u32::MAX;
    let mut top = u32::MAX;
    let mut right = 0u32;
    let mut bottom = 0u32;
    for p in layout.placements.iter().flatten() {
        left = left.min(p.rect.x);
        top = top.min(p.rect.y);
        right = right.max(p.rect.right_ex());
        bottom = bottom.max(p.rect.bottom_ex());
    }
    if left > right || top > bottom {
        return Err(SpritesheetError::InvariantViolation(
            "accepted layout has no placed frames".into(),
        ));
    }
    let right = right.saturating_sub(cfg.texture_padding).max(left + 1);
    let bottom = bottom.saturating_sub(cfg.texture_padding).max(top + 1);
    let (width, height) = sizing::round_canvas(right - left, bottom - top, cfg);
    if width > cfg.max_width || height > cfg.max_height {
        return Err(SpritesheetError::PackingInfeasible {
            required: (width, height),
            available: (cfg.max_width, cfg.max_height),
        });
    }
    Ok((width, height, (left, top)))
}

fn build_meta(cfg: &AtlasConfig) -> Meta {
    Meta {
        schema_version: "1".into(),
        app: "spritesheet".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        format: cfg.output_format.as_str().into(),
        scale: cfg.scale.min(1.0),
        power_of_two: cfg.power_of_two,
        square: cfg.square,
        max_dim: (cfg.max_width, cfg.max_height),
        padding: (cfg.border_padding, cfg.texture_padding),
        allow_rotation: cfg.allow_rotation,
        trim_mode: cfg.trim_mode.as_str().into(),
    }
}

// ---------------- Layout-only API ----------------

/// Layout-only item: the (trimmed) size to pack plus optional trim metadata.
#[derive(Debug, Clone)]
pub struct LayoutItem<K = String> {
    pub key: K,
    pub w: u32,
    pub h: u32,
    /// Trim rectangle inside the pre-trim image; defaults to `(0, 0, w, h)`.
    pub source: Option<Rect>,
    /// Pre-trim size; defaults to `(w, h)`.
    pub source_size: Option<(u32, u32)>,
    /// Key of an earlier item with identical pixels.
    pub duplicate_of: Option<K>,
}

impl<K> LayoutItem<K> {
    pub fn new(key: K, w: u32, h: u32) -> Self {
        Self {
            key,
            w,
            h,
            source: None,
            source_size: None,
            duplicate_of: None,
        }
    }
}

/// Packs sizes into one atlas without touching pixel data. For equal sizes the
/// geometry matches [`pack_images`] exactly.
#[instrument(skip_all, fields(count = items.len()))]
pub fn pack_layout<K: Into<String>>(items: Vec<LayoutItem<K>>, cfg: AtlasConfig) -> Result<Atlas> {
    cfg.validate()?;

    if items.is_empty() {
        return Err(SpritesheetError::Empty);
    }

    let items: Vec<LayoutItem<String>> = items
        .into_iter()
        .map(|it| LayoutItem {
            key: it.key.into(),
            w: it.w,
            h: it.h,
            source: it.source,
            source_size: it.source_size,
            duplicate_of: it.duplicate_of.map(Into::into),
        })
        .collect();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(items.len());
    for (i, it) in items.iter().enumerate() {
        if it.w == 0 || it.h == 0 {
            return Err(SpritesheetError::invalid_source(&it.key, "zero-sized item"));
        }
        if index.insert(it.key.as_str(), i).is_some() {
            return Err(SpritesheetError::InvalidConfig(format!(
                "frame key '{}' appears more than once",
                it.key
            )));
        }
    }

    let mut prepared = Vec::with_capacity(items.len());
    for it in &items {
        let duplicate_of = match &it.duplicate_of {
            Some(k) => {
                let o = *index.get(k.as_str()).ok_or_else(|| {
                    SpritesheetError::InvariantViolation(format!(
                        "frame '{}' duplicates unknown frame '{k}'",
                        it.key
                    ))
                })?;
                let original = &items[o];
                if (original.w, original.h) != (it.w, it.h) {
                    return Err(SpritesheetError::InvariantViolation(format!(
                        "frame '{}' is {}x{} but duplicates '{k}' of {}x{}",
                        it.key, it.w, it.h, original.w, original.h
                    )));
                }
                Some(o)
            }
            None => None,
        };
        let source = it.source.unwrap_or(Rect::new(0, 0, it.w, it.h));
        prepared.push(Prepared {
            key: it.key.clone(),
            trim: TrimResult {
                rect: Rect::new(source.x, source.y, it.w, it.h),
                source_size: it.source_size.unwrap_or((it.w, it.h)),
            },
            duplicate_of,
        });
    }

    let (atlas, _) = plan(&prepared, &cfg)?;
    Ok(atlas)
}
