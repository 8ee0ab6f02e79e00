//! Indexed triangle mesh.

use crate::{Aabb, MapPoints, MeshBounds, Triangle, Vertex};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Faces reference vertices by index and use counter-clockwise winding
/// when viewed from outside, so a closed, correctly oriented mesh has a
/// positive [`signed_volume`](Self::signed_volume).
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.face_count(), 1);
/// assert!((mesh.surface_area() - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into `vertices`.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create an empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create an empty mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Create a mesh from plain positions and faces.
    #[must_use]
    pub fn from_positions(positions: &[Point3<f64>], faces: &[[u32; 3]]) -> Self {
        Self {
            vertices: positions.iter().copied().map(Vertex::new).collect(),
            faces: faces.to_vec(),
        }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// A mesh with no faces is empty, whatever its vertex list holds.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() || self.vertices.is_empty()
    }

    /// Check that every face index refers to an existing vertex.
    #[must_use]
    pub fn indices_in_range(&self) -> bool {
        let n = self.vertices.len();
        self.faces.iter().flatten().all(|&i| (i as usize) < n)
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

    /// Resolve a face into a [`Triangle`].
    ///
    /// Returns `None` if `face_index` is out of range.
    #[must_use]
    pub fn triangle(&self, face_index: usize) -> Option<Triangle> {
        self.faces
            .get(face_index)
            .map(|&[a, b, c]| Triangle::new(self.position(a), self.position(b), self.position(c)))
    }

    /// Iterate over all faces as resolved triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces
            .iter()
            .map(|&[a, b, c]| Triangle::new(self.position(a), self.position(b), self.position(c)))
    }

    /// Translate every vertex.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Signed enclosed volume by the divergence theorem.
    ///
    /// Positive for a closed mesh with outward-facing winding, negative
    /// when inside-out. Meaningless for open meshes.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.triangles().map(|t| signed_tetra_volume(&t)).sum()
    }

    /// Absolute enclosed volume.
    #[inline]
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Check whether the signed volume is negative.
    #[inline]
    #[must_use]
    pub fn is_inside_out(&self) -> bool {
        self.signed_volume() < 0.0
    }

    /// Total surface area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|t| t.area()).sum()
    }

    /// Reverse the winding of every face and negate stored normals.
    pub fn flip_normals(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
        for vertex in &mut self.vertices {
            if let Some(normal) = vertex.normal.as_mut() {
                *normal = -*normal;
            }
        }
    }

    /// Append another mesh, offsetting its face indices.
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, so vertex counts > 4B are unsupported
    pub fn merge(&mut self, other: &Self) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend(other.vertices.iter().cloned());
        self.faces
            .extend(other.faces.iter().map(|f| f.map(|i| i + offset)));
    }

    /// Axis-aligned box `aabb` as a closed, outward-wound mesh of 12 triangles.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, IndexedMesh, Point3};
    ///
    /// let b = IndexedMesh::cuboid(&Aabb::new(Point3::origin(), Point3::new(2.0, 3.0, 4.0)));
    /// assert!((b.signed_volume() - 24.0).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn cuboid(aabb: &Aabb) -> Self {
        let corners = aabb.corners();
        let faces = vec![
            // -z
            [0, 2, 3],
            [0, 3, 1],
            // +z
            [4, 5, 7],
            [4, 7, 6],
            // -y
            [0, 1, 5],
            [0, 5, 4],
            // +y
            [2, 6, 7],
            [2, 7, 3],
            // -x
            [0, 4, 6],
            [0, 6, 2],
            // +x
            [1, 3, 7],
            [1, 7, 5],
        ];
        Self::from_positions(&corners, &faces)
    }
}

impl MeshBounds for IndexedMesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }
}

impl MapPoints for IndexedMesh {
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

/// Signed volume of the tetrahedron spanned by the origin and a triangle.
#[inline]
pub(crate) fn signed_tetra_volume(t: &Triangle) -> f64 {
    let (a, b, c) = (t.v0.coords, t.v1.coords, t.v2.coords);
    let cross = Vector3::new(
        b.y.mul_add(c.z, -(b.z * c.y)),
        b.z.mul_add(c.x, -(b.x * c.z)),
        b.x.mul_add(c.y, -(b.y * c.x)),
    );
    a.z.mul_add(cross.z, a.x.mul_add(cross.x, a.y * cross.y)) / 6.0
}

/// Unit cube from (0,0,0) to (1,1,1) with outward-facing winding.
///
/// # Example
///
/// ```
/// use mesh_types::unit_cube;
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    IndexedMesh::cuboid(&Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)))
}
