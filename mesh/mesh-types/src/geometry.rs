//! Heterogeneous geometry carried through lattice population.

use crate::{Aabb, IndexedMesh, MapPoints, MeshBounds, Polyline};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A curve or a mesh.
///
/// Unit cells are made of curves; connectivity may be curves or meshes,
/// and mapping preserves whichever kind went in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Geometry {
    /// A polyline curve.
    Curve(Polyline),
    /// A triangle mesh.
    Mesh(IndexedMesh),
}

impl Geometry {
    /// The curve, if this is one.
    #[must_use]
    pub const fn as_curve(&self) -> Option<&Polyline> {
        match self {
            Self::Curve(c) => Some(c),
            Self::Mesh(_) => None,
        }
    }

    /// The mesh, if this is one.
    #[must_use]
    pub const fn as_mesh(&self) -> Option<&IndexedMesh> {
        match self {
            Self::Mesh(m) => Some(m),
            Self::Curve(_) => None,
        }
    }

    /// Consume into a curve, if this is one.
    #[must_use]
    pub fn into_curve(self) -> Option<Polyline> {
        match self {
            Self::Curve(c) => Some(c),
            Self::Mesh(_) => None,
        }
    }

    /// Consume into a mesh, if this is one.
    #[must_use]
    pub fn into_mesh(self) -> Option<IndexedMesh> {
        match self {
            Self::Mesh(m) => Some(m),
            Self::Curve(_) => None,
        }
    }

    /// Check for no points or no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Curve(c) => c.is_empty(),
            Self::Mesh(m) => m.is_empty(),
        }
    }
}

impl MeshBounds for Geometry {
    fn bounds(&self) -> Aabb {
        match self {
            Self::Curve(c) => c.bounds(),
            Self::Mesh(m) => m.bounds(),
        }
    }
}

impl MapPoints for Geometry {
    fn map_points<F>(&mut self, f: F)
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        match self {
            Self::Curve(c) => c.map_points(f),
            Self::Mesh(m) => m.map_points(f),
        }
    }
}

impl From<Polyline> for Geometry {
    fn from(curve: Polyline) -> Self {
        Self::Curve(curve)
    }
}

impl From<IndexedMesh> for Geometry {
    fn from(mesh: IndexedMesh) -> Self {
        Self::Mesh(mesh)
    }
}

/// Union of the bounding boxes of every item; empty for no items.
///
/// # Example
///
/// ```
/// use mesh_types::{union_bounds, Point3, Polyline};
///
/// let a = Polyline::from_segment(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0));
/// let b = Polyline::from_segment(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 2.0));
/// let bounds = union_bounds([&a, &b]);
/// assert_eq!(bounds.max, Point3::new(1.0, 1.0, 2.0));
/// ```
#[must_use]
pub fn union_bounds<'a, T>(items: impl IntoIterator<Item = &'a T>) -> Aabb
where
    T: MeshBounds + 'a,
{
    items
        .into_iter()
        .fold(Aabb::empty(), |acc, item| acc.union(&item.bounds()))
}
