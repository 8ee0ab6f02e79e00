//! Distance and containment against a closed triangle mesh.

use mesh_types::{Aabb, IndexedMesh, MeshBounds, Triangle};
use nalgebra::{Point3, Vector3};

use crate::error::{SdfError, SdfResult};
use crate::query::{aabb_distance_squared, closest_point_on_triangle, ray_hits_aabb, ray_triangle_intersect};

/// Ray directions for the containment vote, chosen off every axis and
/// diagonal so they rarely graze shared edges of axis-aligned geometry.
const VOTE_DIRECTIONS: [[f64; 3]; 3] = [
    [1.0, 0.271_828, 0.141_421],
    [-0.318_309, 1.0, 0.577_215],
    [0.173_205, -0.414_213, 1.0],
];

/// A mesh prepared for repeated point queries.
///
/// Per-face boxes let distance and ray queries skip most triangles.
/// Containment takes a majority vote over three ray casts, so a ray that
/// slips through a crack or along an edge is outvoted.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, Point3};
/// use mesh_sdf::SignedDistanceField;
///
/// let sdf = SignedDistanceField::new(unit_cube()).unwrap();
/// assert!(sdf.is_inside(Point3::new(0.5, 0.5, 0.5)));
/// assert!(sdf.is_strictly_inside(Point3::new(0.5, 0.5, 0.5), 1e-3));
/// assert!(!sdf.is_strictly_inside(Point3::new(0.5, 0.5, 0.9995), 1e-3));
/// assert!((sdf.distance(Point3::new(2.0, 0.5, 0.5)) - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SignedDistanceField {
    triangles: Vec<Triangle>,
    face_bounds: Vec<Aabb>,
    bounds: Aabb,
}

impl SignedDistanceField {
    /// Prepare a mesh for queries.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::EmptyMesh`] for a mesh without faces and
    /// [`SdfError::InvalidIndex`] if a face points past the vertex list.
    pub fn new(mesh: IndexedMesh) -> SdfResult<Self> {
        Self::from_mesh(&mesh)
    }

    /// Prepare a borrowed mesh for queries.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_mesh(mesh: &IndexedMesh) -> SdfResult<Self> {
        if mesh.is_empty() {
            return Err(SdfError::EmptyMesh);
        }
        let vertex_count = mesh.vertex_count();
        for (face, indices) in mesh.faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(SdfError::InvalidIndex {
                    face,
                    index,
                    vertex_count,
                });
            }
        }

        let triangles: Vec<Triangle> = mesh.triangles().collect();
        let face_bounds = triangles.iter().map(Triangle::bounds).collect();
        Ok(Self {
            triangles,
            face_bounds,
            bounds: mesh.bounds(),
        })
    }

    /// Bounding box of the mesh.
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Closest point on the surface and its squared distance.
    fn closest(&self, point: Point3<f64>) -> (Point3<f64>, f64) {
        let mut best = (point, f64::INFINITY);
        for (tri, aabb) in self.triangles.iter().zip(&self.face_bounds) {
            if aabb_distance_squared(&point, aabb) >= best.1 {
                continue;
            }
            let candidate = closest_point_on_triangle(point, tri.v0, tri.v1, tri.v2);
            let d2 = (candidate - point).norm_squared();
            if d2 < best.1 {
                best = (candidate, d2);
            }
        }
        best
    }

    /// Closest point on the surface.
    #[must_use]
    pub fn closest_point(&self, point: Point3<f64>) -> Point3<f64> {
        self.closest(point).0
    }

    /// Distance to the surface, ignoring inside/outside.
    #[must_use]
    pub fn unsigned_distance(&self, point: Point3<f64>) -> f64 {
        self.closest(point).1.sqrt()
    }

    /// Signed distance: negative inside, positive outside.
    #[must_use]
    pub fn distance(&self, point: Point3<f64>) -> f64 {
        let d = self.unsigned_distance(point);
        if self.is_inside(point) { -d } else { d }
    }

    /// Count ray crossings along one direction.
    fn crossings(&self, point: Point3<f64>, dir: Vector3<f64>) -> usize {
        let inv_dir = dir.map(|c| 1.0 / c);
        self.triangles
            .iter()
            .zip(&self.face_bounds)
            .filter(|(_, aabb)| ray_hits_aabb(&point, &inv_dir, aabb))
            .filter(|(tri, _)| ray_triangle_intersect(point, dir, tri.v0, tri.v1, tri.v2).is_some())
            .count()
    }

    /// Inside test by majority vote of odd crossing counts.
    ///
    /// Points outside the bounding box are rejected without casting.
    #[must_use]
    pub fn is_inside(&self, point: Point3<f64>) -> bool {
        if !self.bounds.contains(&point) {
            return false;
        }
        let votes = VOTE_DIRECTIONS
            .iter()
            .filter(|d| self.crossings(point, Vector3::new(d[0], d[1], d[2])) % 2 == 1)
            .count();
        votes >= 2
    }

    /// Inside and farther than `tolerance` from the surface.
    ///
    /// Points on or within `tolerance` of the surface are not strictly
    /// inside, which keeps boundary-hugging geometry out of inside tests.
    #[must_use]
    pub fn is_strictly_inside(&self, point: Point3<f64>, tolerance: f64) -> bool {
        if !self.bounds.expanded(-tolerance).contains(&point) {
            return false;
        }
        self.is_inside(point) && self.unsigned_distance(point) > tolerance
    }
}

/// One-off signed distance query; prefer [`SignedDistanceField`] for many.
///
/// # Errors
///
/// Fails like [`SignedDistanceField::from_mesh`].
pub fn signed_distance(point: Point3<f64>, mesh: &IndexedMesh) -> SdfResult<f64> {
    Ok(SignedDistanceField::from_mesh(mesh)?.distance(point))
}

/// One-off containment query; prefer [`SignedDistanceField`] for many.
///
/// # Errors
///
/// Fails like [`SignedDistanceField::from_mesh`].
pub fn point_in_mesh(point: Point3<f64>, mesh: &IndexedMesh) -> SdfResult<bool> {
    Ok(SignedDistanceField::from_mesh(mesh)?.is_inside(point))
}
