//! Mesh vertices.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A mesh vertex: a position plus an optional unit normal.
///
/// Normals are carried through for export but are never trusted by the
/// geometric passes; anything that moves vertices non-uniformly (box
/// mapping, welding) clears them.
///
/// # Example
///
/// ```
/// use mesh_types::{Vertex, Point3};
///
/// let a = Vertex::new(Point3::new(1.0, 2.0, 3.0));
/// let b = Vertex::from_coords(1.0, 2.0, 3.0);
/// assert_eq!(a.position, b.position);
/// assert!(a.normal.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,

    /// Unit normal, when known.
    pub normal: Option<Vector3<f64>>,
}

impl Vertex {
    /// Create a vertex with no normal.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
        }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Create a vertex with a normal.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Vertex, Point3, Vector3};
    ///
    /// let v = Vertex::with_normal(Point3::origin(), Vector3::z());
    /// assert_eq!(v.normal, Some(Vector3::z()));
    /// ```
    #[inline]
    #[must_use]
    pub const fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal: Some(normal),
        }
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::from_coords(x, y, z)
    }
}
