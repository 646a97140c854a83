use super::Placement;
use crate::config::MaxRectsHeuristic;
use crate::model::Rect;

/// Maximal-rectangles packer over a fixed `width x height` canvas.
///
/// The free list may hold overlapping rectangles; only placed rectangles are
/// guaranteed disjoint. Every insert rebuilds the free list from the previous
/// one, so a packer never shares state with another trial.
pub struct MaxRectsPacker {
    width: u32,
    height: u32,
    allow_rotation: bool,
    free: Vec<Rect>,
    used: Vec<Rect>,
}

impl MaxRectsPacker {
    pub fn new(width: u32, height: u32, allow_rotation: bool) -> Self {
        let free = if width > 0 && height > 0 {
            vec![Rect::new(0, 0, width, height)]
        } else {
            Vec::new()
        };
        Self {
            width,
            height,
            allow_rotation,
            free,
            used: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Places a `w x h` item (or `h x w` when rotation is allowed and scores better).
    /// Returns `None` when no free rectangle can hold it; the packer is left unchanged.
    #[must_use]
    pub fn insert(&mut self, w: u32, h: u32, heuristic: MaxRectsHeuristic) -> Option<Placement> {
        if w == 0 || h == 0 {
            return None;
        }
        let placement = self.find_position(w, h, heuristic)?;
        self.place_rect(&placement.rect);
        Some(placement)
    }

    /// True if a `w x h` item would currently fit somewhere.
    pub fn can_insert(&self, w: u32, h: u32) -> bool {
        w > 0
            && h > 0
            && self.free.iter().any(|fr| {
                (fr.w >= w && fr.h >= h) || (self.allow_rotation && fr.w >= h && fr.h >= w)
            })
    }

    fn score(fr: &Rect, w: u32, h: u32, heuristic: MaxRectsHeuristic) -> (u32, u32) {
        let leftover_h = fr.w - w;
        let leftover_v = fr.h - h;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        match heuristic {
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
        }
    }

    fn find_position(&self, w: u32, h: u32, heuristic: MaxRectsHeuristic) -> Option<Placement> {
        let mut best: Option<((u32, u32), Placement)> = None;
        let try_rotated = self.allow_rotation && w != h;

        // Strict `<` keeps the earliest free rectangle on ties.
        for fr in &self.free {
            if fr.w >= w && fr.h >= h {
                let s = Self::score(fr, w, h, heuristic);
                let candidate = Placement {
                    rect: Rect::new(fr.x, fr.y, w, h),
                    rotated: false,
                };
                if s == (0, 0) {
                    return Some(candidate);
                }
                if best.is_none_or(|(bs, _)| s < bs) {
                    best = Some((s, candidate));
                }
            }
            if try_rotated && fr.w >= h && fr.h >= w {
                let s = Self::score(fr, h, w, heuristic);
                let candidate = Placement {
                    rect: Rect::new(fr.x, fr.y, h, w),
                    rotated: true,
                };
                if s == (0, 0) {
                    return Some(candidate);
                }
                if best.is_none_or(|(bs, _)| s < bs) {
                    best = Some((s, candidate));
                }
            }
        }

        best.map(|(_, p)| p)
    }

    fn place_rect(&mut self, node: &Rect) {
        // split all free rectangles that intersect with node
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.iter() {
            if !fr.intersects(node) {
                new_free.push(*fr);
                continue;
            }
            let fr_x2 = fr.right_ex();
            let fr_y2 = fr.bottom_ex();
            let n_x2 = node.right_ex();
            let n_y2 = node.bottom_ex();

            // above
            if node.y > fr.y {
                new_free.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
            }
            // below
            if n_y2 < fr_y2 {
                new_free.push(Rect::new(fr.x, n_y2, fr.w, fr_y2 - n_y2));
            }
            // left
            if node.x > fr.x {
                new_free.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
            }
            // right
            if n_x2 < fr_x2 {
                new_free.push(Rect::new(n_x2, fr.y, fr_x2 - n_x2, fr.h));
            }
        }

        self.free = new_free;
        self.prune_free_list();
        self.used.push(*node);
    }

    /// Drops every free rectangle contained in another one. Of two identical
    /// rectangles the earlier survives.
    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if a != b && b.contains(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Rectangles placed so far, in insertion order.
    pub fn used(&self) -> &[Rect] {
        &self.used
    }

    /// Current free rectangles (may overlap each other).
    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    /// Bounding box of everything placed so far, anchored at the canvas origin.
    pub fn used_extent(&self) -> (u32, u32) {
        self.used.iter().fold((0, 0), |(w, h), r| {
            (w.max(r.right_ex()), h.max(r.bottom_ex()))
        })
    }
}
