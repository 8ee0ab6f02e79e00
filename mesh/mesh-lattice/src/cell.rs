//! Unit cells: the repeating curve pattern and its connectivity.

use mesh_types::{Aabb, Geometry, MeshBounds, Point3, Polyline, union_bounds};
use tracing::debug;

use crate::error::{LatticeError, LatticeResult};
use crate::map::DEGENERATE_EXTENT;

/// Distance within which curve ends are joined.
pub const JOIN_TOLERANCE: f64 = 1e-6;

/// The repeating pattern of a lattice, in its own frame.
///
/// The frame is the bounding box of the cell curves; connectivity geometry
/// does not widen it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitCell {
    curves: Vec<Polyline>,
    joined: Vec<Polyline>,
    connectivity: Vec<Geometry>,
    bounds: Aabb,
}

impl UnitCell {
    /// Create a unit cell.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::EmptyUnitCell`] if no curve has points.
    /// - [`LatticeError::DegenerateBounds`] if the curves are flat along
    ///   some axis, since such a cell cannot be mapped into a voxel.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_lattice::UnitCell;
    /// use mesh_types::{Point3, Polyline};
    ///
    /// let diagonal = Polyline::from_segment(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
    /// let cell = UnitCell::new(vec![diagonal], Vec::new()).unwrap();
    /// assert_eq!(cell.bounds().max, Point3::new(1.0, 1.0, 1.0));
    /// ```
    pub fn new(curves: Vec<Polyline>, connectivity: Vec<Geometry>) -> LatticeResult<Self> {
        let curves: Vec<Polyline> = curves.into_iter().filter(|c| !c.is_empty()).collect();
        if curves.is_empty() {
            return Err(LatticeError::EmptyUnitCell);
        }
        let bounds = union_bounds(&curves);
        if !bounds.is_valid() || bounds.is_degenerate(DEGENERATE_EXTENT) {
            return Err(LatticeError::degenerate_bounds(&bounds));
        }
        let joined = join_curves(&curves, JOIN_TOLERANCE);
        debug!(
            curves = curves.len(),
            joined = joined.len(),
            connectivity = connectivity.len(),
            "built unit cell"
        );
        Ok(Self {
            curves,
            joined,
            connectivity,
            bounds,
        })
    }

    /// The cell curves as given.
    #[must_use]
    pub fn curves(&self) -> &[Polyline] {
        &self.curves
    }

    /// The cell curves chained end to end where they meet.
    #[must_use]
    pub fn joined_curves(&self) -> &[Polyline] {
        &self.joined
    }

    /// Connectivity geometry, curves or meshes.
    #[must_use]
    pub fn connectivity(&self) -> &[Geometry] {
        &self.connectivity
    }

    /// Source box for mapping.
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }
}

impl MeshBounds for UnitCell {
    fn bounds(&self) -> Aabb {
        self.bounds
    }
}

/// Chain curves whose ends meet within `tolerance` into longer curves.
///
/// Curves are reversed as needed. A chain that returns to its own start is
/// closed by snapping the last point onto the first. Curves that meet
/// nothing come back unchanged, and only two curves are ever joined at a
/// shared end so branching points stay branch points.
///
/// # Example
///
/// ```
/// use mesh_lattice::join_curves;
/// use mesh_types::{Point3, Polyline};
///
/// let a = Polyline::from_segment(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
/// let b = Polyline::from_segment(Point3::new(1.0, 1.0, 0.0), Point3::new(1.0, 0.0, 0.0));
/// let joined = join_curves(&[a, b], 1e-9);
/// assert_eq!(joined.len(), 1);
/// assert_eq!(joined[0].len(), 3);
/// ```
#[must_use]
pub fn join_curves(curves: &[Polyline], tolerance: f64) -> Vec<Polyline> {
    let near = |a: Point3<f64>, b: Point3<f64>| (a - b).norm() <= tolerance;
    let mut used = vec![false; curves.len()];
    let mut out = Vec::new();

    for seed in 0..curves.len() {
        if used[seed] || curves[seed].len() < 2 {
            continue;
        }
        used[seed] = true;
        let mut chain: Vec<Point3<f64>> = curves[seed].points().to_vec();

        // grow forward, then backward
        for backward in [false, true] {
            if backward {
                chain.reverse();
            }
            loop {
                let Some(&tail) = chain.last() else { break };
                if chain.len() > 2 && chain.first().is_some_and(|&head| near(head, tail)) {
                    break;
                }
                let Some((next, reverse)) = (0..curves.len())
                    .filter(|&i| !used[i] && curves[i].len() >= 2)
                    .find_map(|i| {
                        let c = &curves[i];
                        if c.start().is_some_and(|p| near(p, tail)) {
                            Some((i, false))
                        } else if c.end().is_some_and(|p| near(p, tail)) {
                            Some((i, true))
                        } else {
                            None
                        }
                    })
                else {
                    break;
                };
                used[next] = true;
                let points = curves[next].points();
                if reverse {
                    chain.extend(points.iter().rev().skip(1));
                } else {
                    chain.extend(points.iter().skip(1));
                }
            }
            if backward {
                chain.reverse();
            }
        }

        if chain.len() > 3 {
            let head = chain[0];
            if let Some(tail) = chain.last_mut() {
                if near(head, *tail) {
                    *tail = head;
                }
            }
        }
        out.push(Polyline::new(chain));
    }

    // single-point curves cannot join anything
    out.extend(curves.iter().filter(|c| c.len() == 1).cloned());
    out
}
