//! Shared traits.

use crate::Aabb;
use nalgebra::Point3;

/// Types that occupy a region of space and can report its bounding box.
pub trait MeshBounds {
    /// Axis-aligned bounding box; empty when there is no geometry.
    fn bounds(&self) -> Aabb;

    /// Bounding box, or `None` when empty.
    fn bounds_opt(&self) -> Option<Aabb> {
        let b = self.bounds();
        if b.is_empty() { None } else { Some(b) }
    }

    /// Center of the bounding box.
    fn center(&self) -> Point3<f64> {
        self.bounds().center()
    }
}

/// Types whose points can be rewritten in place by a point map.
///
/// Used for the box-to-box transforms that place unit cells into voxels.
pub trait MapPoints {
    /// Replace every point `p` with `f(p)`.
    fn map_points<F>(&mut self, f: F)
    where
        F: Fn(&Point3<f64>) -> Point3<f64>;
}
