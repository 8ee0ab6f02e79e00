//! Mixed triangle/quad mesh.
//!
//! Volumetric extraction emits quads; the repair stage is responsible for
//! converting them. [`PolyMesh`] carries both kinds of face until then.

use crate::mesh::signed_tetra_volume;
use crate::{Aabb, IndexedMesh, MapPoints, MeshBounds, Triangle, Vertex};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A triangle or quadrilateral face, counter-clockwise seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Face {
    /// Three vertex indices.
    Tri([u32; 3]),
    /// Four vertex indices, in order around the face.
    Quad([u32; 4]),
}

impl Face {
    /// Vertex indices in order.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        match self {
            Self::Tri(v) => v,
            Self::Quad(v) => v,
        }
    }

    /// Check for a quadrilateral.
    #[inline]
    #[must_use]
    pub const fn is_quad(&self) -> bool {
        matches!(self, Self::Quad(_))
    }

    /// Directed edges `(from, to)` around the face.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let idx = self.indices();
        let n = idx.len();
        (0..n).map(move |i| (idx[i], idx[(i + 1) % n]))
    }

    /// Split into triangles along the `0-2` diagonal.
    #[must_use]
    pub fn triangulate(&self) -> Vec<[u32; 3]> {
        match *self {
            Self::Tri(t) => vec![t],
            Self::Quad([a, b, c, d]) => vec![[a, b, c], [a, c, d]],
        }
    }

    /// Same face with reversed winding.
    #[must_use]
    pub fn reversed(&self) -> Self {
        match *self {
            Self::Tri([a, b, c]) => Self::Tri([a, c, b]),
            Self::Quad([a, b, c, d]) => Self::Quad([a, d, c, b]),
        }
    }

    /// Check whether any index appears twice.
    #[must_use]
    pub fn has_repeated_index(&self) -> bool {
        let idx = self.indices();
        (0..idx.len()).any(|i| idx[i + 1..].contains(&idx[i]))
    }
}

impl AsRef<[u32]> for Face {
    fn as_ref(&self) -> &[u32] {
        self.indices()
    }
}

impl From<[u32; 3]> for Face {
    fn from(v: [u32; 3]) -> Self {
        Self::Tri(v)
    }
}

impl From<[u32; 4]> for Face {
    fn from(v: [u32; 4]) -> Self {
        Self::Quad(v)
    }
}

/// A polygon mesh whose faces are triangles or quads.
///
/// # Example
///
/// ```
/// use mesh_types::{Face, PolyMesh, Vertex};
///
/// let mut mesh = PolyMesh::new();
/// for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
///     mesh.vertices.push(Vertex::from_coords(x, y, 0.0));
/// }
/// mesh.faces.push(Face::Quad([0, 1, 2, 3]));
///
/// assert_eq!(mesh.quad_count(), 1);
/// assert_eq!(mesh.to_indexed().face_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolyMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,
    /// Faces as indices into `vertices`.
    pub faces: Vec<Face>,
}

impl PolyMesh {
    /// Create an empty mesh.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces.
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces of either kind.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of quad faces.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.faces.iter().filter(|f| f.is_quad()).count()
    }

    /// Check for no faces.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() || self.vertices.is_empty()
    }

    /// Check that every face index refers to an existing vertex.
    #[must_use]
    pub fn indices_in_range(&self) -> bool {
        let n = self.vertices.len();
        self.faces
            .iter()
            .all(|f| f.indices().iter().all(|&i| (i as usize) < n))
    }

    /// Position of a vertex.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    #[must_use]
    pub fn position(&self, index: u32) -> Point3<f64> {
        self.vertices[index as usize].position
    }

    /// Triangles of one face after splitting quads along their `0-2` diagonal.
    pub fn face_triangles(&self, face: &Face) -> impl Iterator<Item = Triangle> + '_ {
        face.triangulate()
            .into_iter()
            .map(|[a, b, c]| Triangle::new(self.position(a), self.position(b), self.position(c)))
    }

    /// Face area; quads are measured as their two triangles.
    #[must_use]
    pub fn face_area(&self, face: &Face) -> f64 {
        self.face_triangles(face).map(|t| t.area()).sum()
    }

    /// Signed enclosed volume, quads counted as two triangles.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.faces
            .iter()
            .flat_map(|f| self.face_triangles(f))
            .map(|t| signed_tetra_volume(&t))
            .sum()
    }

    /// Total surface area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.faces.iter().map(|f| self.face_area(f)).sum()
    }

    /// Reverse the winding of every face and negate stored normals.
    pub fn flip_normals(&mut self) {
        for face in &mut self.faces {
            *face = face.reversed();
        }
        for vertex in &mut self.vertices {
            if let Some(normal) = vertex.normal.as_mut() {
                *normal = -*normal;
            }
        }
    }

    /// Copy into a triangle mesh, splitting quads.
    #[must_use]
    pub fn to_indexed(&self) -> IndexedMesh {
        IndexedMesh::from_parts(
            self.vertices.clone(),
            self.faces.iter().flat_map(Face::triangulate).collect(),
        )
    }

    /// Convert into a triangle mesh, splitting quads, without copying vertices.
    #[must_use]
    pub fn into_indexed(self) -> IndexedMesh {
        let faces = self.faces.iter().flat_map(Face::triangulate).collect();
        IndexedMesh::from_parts(self.vertices, faces)
    }
}

impl From<IndexedMesh> for PolyMesh {
    fn from(mesh: IndexedMesh) -> Self {
        Self {
            vertices: mesh.vertices,
            faces: mesh.faces.into_iter().map(Face::Tri).collect(),
        }
    }
}

impl MeshBounds for PolyMesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }
}

impl MapPoints for PolyMesh {
    fn map_points<F>(&mut self, f: F)
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        for vertex in &mut self.vertices {
            vertex.position = f(&vertex.position);
            vertex.normal = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_cube;
    use approx::assert_relative_eq;

    /// Unit cube with six quad faces.
    fn quad_cube() -> PolyMesh {
        let cube = unit_cube();
        let faces = vec![
            Face::Quad([0, 2, 3, 1]),
            Face::Quad([4, 5, 7, 6]),
            Face::Quad([0, 1, 5, 4]),
            Face::Quad([2, 6, 7, 3]),
            Face::Quad([0, 4, 6, 2]),
            Face::Quad([1, 3, 7, 5]),
        ];
        PolyMesh::from_parts(cube.vertices, faces)
    }

    #[test]
    fn quad_cube_measures_like_triangle_cube() {
        let mesh = quad_cube();
        assert_eq!(mesh.quad_count(), 6);
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.surface_area(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn flip_reverses_quads() {
        let mut mesh = quad_cube();
        mesh.flip_normals();
        assert_relative_eq!(mesh.signed_volume(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn to_indexed_splits_quads() {
        let tri = quad_cube().to_indexed();
        assert_eq!(tri.face_count(), 12);
        assert_relative_eq!(tri.signed_volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn face_edges_wrap_around() {
        let face = Face::Quad([3, 4, 5, 6]);
        let edges: Vec<_> = face.edges().collect();
        assert_eq!(edges, vec![(3, 4), (4, 5), (5, 6), (6, 3)]);
    }

    #[test]
    fn repeated_index_detected() {
        assert!(Face::Quad([0, 1, 1, 2]).has_repeated_index());
        assert!(Face::Tri([2, 0, 2]).has_repeated_index());
        assert!(!Face::Tri([0, 1, 2]).has_repeated_index());
    }

    #[test]
    fn from_indexed_keeps_triangles() {
        let mesh = PolyMesh::from(unit_cube());
        assert_eq!(mesh.face_count(), 12);
        assert_eq!(mesh.quad_count(), 0);
    }
}
