//! Canvas sizing search.
//!
//! Each trial derives a canvas size from the total slot area plus a slack
//! percentage and packs every distinct frame into a fresh [`MaxRectsPacker`].
//! A failed trial is thrown away and the next one starts from scratch with more
//! slack; only the slack value carries over between trials.

use crate::config::AtlasConfig;
use crate::error::{Result, SpritesheetError};
use crate::packer::Placement;
use crate::packer::maxrects::MaxRectsPacker;
use tracing::debug;

/// One frame as seen by the packer: its slot size (content plus padding) and,
/// for duplicates, the index of the frame whose placement it shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackItem {
    pub w: u32,
    pub h: u32,
    pub duplicate_of: Option<usize>,
}

impl PackItem {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            duplicate_of: None,
        }
    }

    pub fn duplicate(w: u32, h: u32, original: usize) -> Self {
        Self {
            w,
            h,
            duplicate_of: Some(original),
        }
    }
}

/// Canvas size for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSize {
    /// Size before power-of-two rounding and before clamping to the maximum.
    pub raw: (u32, u32),
    /// Size the packer is created with.
    pub canvas: (u32, u32),
}

/// A complete layout produced by one successful trial.
#[derive(Debug, Clone)]
pub struct PackedLayout {
    pub canvas: (u32, u32),
    /// Exclusive right/bottom extent of every placed slot.
    pub extent: (u32, u32),
    /// Slot placement per item, duplicates included; `None` for items not in the order.
    pub placements: Vec<Option<Placement>>,
    /// Trials run until this layout was accepted.
    pub trials: usize,
    pub slack: f64,
}

/// Why a single trial failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Infeasible {
    pub canvas: (u32, u32),
    /// First item that did not fit.
    pub item: usize,
}

pub fn next_pow2(mut v: u32) -> u32 {
    if v <= 1 {
        return 1;
    }
    v -= 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v + 1
}

pub fn prev_pow2(v: u32) -> u32 {
    if v <= 1 { 1 } else { 1 << (31 - v.leading_zeros()) }
}

/// Sum of slot areas over the distinct (non-duplicate) items in `order`.
pub fn packable_area(items: &[PackItem], order: &[usize]) -> u64 {
    order
        .iter()
        .map(|&i| &items[i])
        .filter(|it| it.duplicate_of.is_none())
        .map(|it| it.w as u64 * it.h as u64)
        .sum()
}

/// Canvas size for `area` grown by `slack`, honoring the square / power-of-two /
/// free-aspect settings of `cfg`. Free aspect keeps the area and follows the
/// width:height ratio of the configured maximum.
pub fn trial_size(area: u64, slack: f64, cfg: &AtlasConfig) -> TrialSize {
    let side = (area as f64 * (1.0 + slack)).sqrt().ceil().max(1.0);
    let raw = if cfg.square {
        let s = to_dim(side);
        (s, s)
    } else {
        let ratio = (cfg.max_width as f64 / cfg.max_height as f64).sqrt();
        (to_dim(side * ratio), to_dim(side / ratio))
    };
    let rounded = if cfg.power_of_two {
        (next_pow2(raw.0), next_pow2(raw.1))
    } else {
        raw
    };
    TrialSize {
        raw,
        canvas: (
            rounded.0.min(cfg.max_width),
            rounded.1.min(cfg.max_height),
        ),
    }
}

fn to_dim(v: f64) -> u32 {
    v.ceil().clamp(1.0, u32::MAX as f64) as u32
}

/// Packs every distinct item of `order` into a fresh `canvas`-sized packer.
///
/// Duplicates are resolved afterwards by copying their original's placement.
pub fn attempt_pack(
    items: &[PackItem],
    order: &[usize],
    canvas: (u32, u32),
    cfg: &AtlasConfig,
) -> std::result::Result<PackedLayout, Infeasible> {
    let mut packer = MaxRectsPacker::new(canvas.0, canvas.1, cfg.allow_rotation);
    let mut placements: Vec<Option<Placement>> = vec![None; items.len()];

    for &i in order {
        let item = &items[i];
        if item.duplicate_of.is_some() {
            continue;
        }
        match packer.insert(item.w, item.h, cfg.heuristic) {
            Some(p) => placements[i] = Some(p),
            None => return Err(Infeasible { canvas, item: i }),
        }
    }

    for &i in order {
        if let Some(original) = items[i].duplicate_of {
            placements[i] = placements[original];
        }
    }

    Ok(PackedLayout {
        canvas,
        extent: packer.used_extent(),
        placements,
        trials: 1,
        slack: 0.0,
    })
}

/// Runs trials with growing slack until every item fits.
///
/// Fails with `PackingInfeasible` once a trial at the configured maximum size
/// fails, or up front when a single item cannot fit the maximum at all.
pub fn search(items: &[PackItem], order: &[usize], cfg: &AtlasConfig) -> Result<PackedLayout> {
    let max = (cfg.max_width, cfg.max_height);
    for &i in order {
        let it = &items[i];
        if it.duplicate_of.is_some() {
            continue;
        }
        let fits = (it.w <= max.0 && it.h <= max.1)
            || (cfg.allow_rotation && it.h <= max.0 && it.w <= max.1);
        if !fits {
            return Err(SpritesheetError::PackingInfeasible {
                required: (it.w, it.h),
                available: max,
            });
        }
    }

    let area = packable_area(items, order);
    if area == 0 {
        return Err(SpritesheetError::Empty);
    }

    let mut slack = cfg.initial_slack;
    let mut trials = 0usize;
    loop {
        let size = trial_size(area, slack, cfg);
        trials += 1;
        match attempt_pack(items, order, size.canvas, cfg) {
            Ok(mut layout) => {
                debug!(trials, slack, w = size.canvas.0, h = size.canvas.1, "trial fits");
                if let Some(tighter) = tighter_pow2(items, order, &layout, size, cfg) {
                    trials += 1;
                    layout = tighter;
                }
                layout.trials = trials;
                layout.slack = slack;
                return Ok(layout);
            }
            Err(fail) => {
                debug!(
                    trials,
                    slack,
                    w = size.canvas.0,
                    h = size.canvas.1,
                    item = fail.item,
                    "trial failed"
                );
                if size.canvas == max {
                    let required = required_extent(items, order, slack, cfg);
                    return Err(SpritesheetError::PackingInfeasible {
                        required,
                        available: max,
                    });
                }
                slack += cfg.slack_step;
            }
        }
    }
}

/// One extra trial for sparse power-of-two canvases: when the packed extent
/// covers at most half of the canvas, the longer side is rounded down instead of up.
fn tighter_pow2(
    items: &[PackItem],
    order: &[usize],
    layout: &PackedLayout,
    size: TrialSize,
    cfg: &AtlasConfig,
) -> Option<PackedLayout> {
    if !cfg.power_of_two || cfg.square {
        return None;
    }
    let used = layout.extent.0 as u64 * layout.extent.1 as u64;
    let canvas_area = size.canvas.0 as u64 * size.canvas.1 as u64;
    if used * 2 > canvas_area {
        return None;
    }
    let (rw, rh) = size.raw;
    let alt = if rw >= rh {
        (prev_pow2(rw), next_pow2(rh))
    } else {
        (next_pow2(rw), prev_pow2(rh))
    };
    let alt = (alt.0.min(cfg.max_width), alt.1.min(cfg.max_height));
    if alt.0 as u64 * alt.1 as u64 >= canvas_area {
        return None;
    }
    match attempt_pack(items, order, alt, cfg) {
        Ok(tighter) => {
            debug!(w = alt.0, h = alt.1, "tighter power-of-two trial fits");
            Some(tighter)
        }
        Err(_) => None,
    }
}

/// Final size an unbounded search would settle on; only used for diagnostics.
fn required_extent(items: &[PackItem], order: &[usize], slack: f64, cfg: &AtlasConfig) -> (u32, u32) {
    let area = packable_area(items, order);
    let mut slack = slack + cfg.slack_step;
    loop {
        let size = trial_size(area, slack, cfg);
        let canvas = if cfg.power_of_two {
            (next_pow2(size.raw.0), next_pow2(size.raw.1))
        } else {
            size.raw
        };
        if let Ok(layout) = attempt_pack(items, order, canvas, cfg) {
            let (w, h) = (
                layout.extent.0.saturating_sub(cfg.texture_padding),
                layout.extent.1.saturating_sub(cfg.texture_padding),
            );
            return round_canvas(w, h, cfg);
        }
        slack += cfg.slack_step;
    }
}

/// Applies the power-of-two and square settings to a final canvas size.
pub fn round_canvas(w: u32, h: u32, cfg: &AtlasConfig) -> (u32, u32) {
    let (mut w, mut h) = (w.max(1), h.max(1));
    if cfg.power_of_two {
        w = next_pow2(w);
        h = next_pow2(h);
    }
    if cfg.square {
        let m = w.max(h);
        w = m;
        h = m;
    }
    (w, h)
}
