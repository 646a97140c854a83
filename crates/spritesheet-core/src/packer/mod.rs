use crate::model::Rect;

pub mod maxrects;

/// Result of a successful packer insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Occupied canvas area. When `rotated`, `w`/`h` are the requested size swapped.
    pub rect: Rect,
    /// True if the item was placed as h×w instead of the requested w×h.
    pub rotated: bool,
}
