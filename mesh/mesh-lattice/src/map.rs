//! Box-to-box mapping of unit-cell geometry into voxels.

use mesh_types::{Aabb, MapPoints, Point3, Vector3};

use crate::error::{LatticeError, LatticeResult};

/// Source extents at or below this are treated as zero.
pub const DEGENERATE_EXTENT: f64 = 1e-12;

/// Affine map taking one box onto another: a per-axis scale plus a
/// translation, no rotation.
///
/// # Example
///
/// ```
/// use mesh_lattice::BoxMap;
/// use mesh_types::{Aabb, Point3};
///
/// let unit = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
/// let voxel = Aabb::new(Point3::new(10.0, 0.0, 0.0), Point3::new(12.0, 4.0, 1.0));
/// let map = BoxMap::new(&unit, &voxel).unwrap();
///
/// assert_eq!(map.apply(&Point3::new(0.5, 0.5, 0.5)), Point3::new(11.0, 2.0, 0.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMap {
    source_min: Point3<f64>,
    dest_min: Point3<f64>,
    scale: Vector3<f64>,
}

impl BoxMap {
    /// Build the map from `source` onto `dest`.
    ///
    /// A destination with zero extent on an axis is allowed and flattens
    /// geometry onto that plane.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::DegenerateBounds`] if `source` has zero extent on
    ///   any axis, or is empty.
    /// - [`LatticeError::InvalidVoxel`] if `dest` is empty or not finite.
    pub fn new(source: &Aabb, dest: &Aabb) -> LatticeResult<Self> {
        if !source.is_valid() || source.is_degenerate(DEGENERATE_EXTENT) {
            return Err(LatticeError::degenerate_bounds(source));
        }
        if !dest.is_valid() {
            return Err(LatticeError::InvalidVoxel {
                min: dest.min.coords.into(),
                max: dest.max.coords.into(),
            });
        }
        Ok(Self {
            source_min: source.min,
            dest_min: dest.min,
            scale: dest.size().component_div(&source.size()),
        })
    }

    /// Per-axis scale factors.
    #[must_use]
    pub const fn scale(&self) -> &Vector3<f64> {
        &self.scale
    }

    /// Map one point.
    #[inline]
    #[must_use]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.dest_min + (point - self.source_min).component_mul(&self.scale)
    }

    /// Map a copy of `geometry`.
    #[must_use]
    pub fn map<G: MapPoints + Clone>(&self, geometry: &G) -> G {
        let mut out = geometry.clone();
        out.map_points(|p| self.apply(p));
        out
    }
}

/// Map `geometry` from `source` onto `dest`.
///
/// # Errors
///
/// Fails like [`BoxMap::new`].
pub fn map_geometry<G: MapPoints + Clone>(geometry: &G, source: &Aabb, dest: &Aabb) -> LatticeResult<G> {
    Ok(BoxMap::new(source, dest)?.map(geometry))
}
