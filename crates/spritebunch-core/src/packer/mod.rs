use crate::config::MaxRectsHeuristic;
use crate::model::Rect;

pub mod maxrects;
pub mod rows;

/// A free-rectangle bin-packing primitive.
///
/// Holds sheet-scoped mutable state (its free list) for exactly one layout run; call
/// `init` before reusing it. Coordinates are in bin space starting at `(0, 0)`.
pub trait FreeRectBin {
    /// Resets the bin to an empty `width x height` area.
    fn init(&mut self, width: u32, height: u32, allow_rotation: bool);
    /// Places a `width x height` box and returns where it went. A rotated placement
    /// comes back with width and height swapped. `None` when nothing fits.
    fn insert(&mut self, width: u32, height: u32, heuristic: MaxRectsHeuristic) -> Option<Rect>;
    /// Fraction of the bin area covered by placed boxes (0.0 to 1.0).
    fn occupancy(&self) -> f32;
}
