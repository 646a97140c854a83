use crate::config::SortMode;
use crate::error::{Result, SpritesheetError};
use std::cmp::Ordering;

/// One comparison step over `(width, height)` pairs.
pub type Criterion = fn(&(u32, u32), &(u32, u32)) -> Ordering;

fn by_height(a: &(u32, u32), b: &(u32, u32)) -> Ordering {
    b.1.cmp(&a.1)
}
fn by_width(a: &(u32, u32), b: &(u32, u32)) -> Ordering {
    b.0.cmp(&a.0)
}
fn by_area(a: &(u32, u32), b: &(u32, u32)) -> Ordering {
    (b.0 as u64 * b.1 as u64).cmp(&(a.0 as u64 * a.1 as u64))
}
fn by_max_side(a: &(u32, u32), b: &(u32, u32)) -> Ordering {
    b.0.max(b.1).cmp(&a.0.max(a.1))
}
fn by_min_side(a: &(u32, u32), b: &(u32, u32)) -> Ordering {
    b.0.min(b.1).cmp(&a.0.min(a.1))
}

const HEIGHT_CHAIN: &[Criterion] = &[by_height, by_width];
const WIDTH_CHAIN: &[Criterion] = &[by_width, by_height];
const AREA_CHAIN: &[Criterion] = &[by_area, by_height, by_width];
const MAX_SIDE_CHAIN: &[Criterion] = &[by_max_side, by_min_side, by_height, by_width];

/// Comparator chain for `mode`; evaluated in order until one differs.
pub fn criteria(mode: SortMode) -> &'static [Criterion] {
    match mode {
        SortMode::Height => HEIGHT_CHAIN,
        SortMode::Width => WIDTH_CHAIN,
        SortMode::Area => AREA_CHAIN,
        SortMode::MaxSide => MAX_SIDE_CHAIN,
    }
}

/// Indices of `sizes`, largest first according to `mode`. Full ties keep input order.
pub fn sort_order(sizes: &[(u32, u32)], mode: SortMode) -> Vec<usize> {
    let chain = criteria(mode);
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        chain
            .iter()
            .map(|cmp| cmp(&sizes[a], &sizes[b]))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    order
}

/// Moves every duplicate directly behind the frame it duplicates.
///
/// `duplicate_of[i]` names the original of frame `i`. An original missing from
/// `order`, or one that is itself a duplicate, is an invariant violation.
pub fn adjust_for_duplicates(order: &mut Vec<usize>, duplicate_of: &[Option<usize>]) -> Result<()> {
    let duplicates: Vec<usize> = order
        .iter()
        .copied()
        .filter(|&i| duplicate_of.get(i).copied().flatten().is_some())
        .collect();

    for dup in duplicates {
        let Some(original) = duplicate_of[dup] else {
            continue;
        };
        if duplicate_of.get(original).copied().flatten().is_some() {
            return Err(SpritesheetError::InvariantViolation(format!(
                "frame {dup} duplicates frame {original}, which is itself a duplicate"
            )));
        }
        if let Some(pos) = order.iter().position(|&i| i == dup) {
            order.remove(pos);
        }
        let Some(pos) = order.iter().position(|&i| i == original) else {
            return Err(SpritesheetError::InvariantViolation(format!(
                "frame {dup} duplicates frame {original}, which is missing from the packing order"
            )));
        };
        order.insert(pos + 1, dup);
    }
    Ok(())
}
