//! Mesh adjacency data structures.
//!
//! Works on any face type that can be viewed as an index slice, so the same
//! lookups serve triangle meshes and mixed triangle/quad meshes.

use hashbrown::HashMap;

/// Adjacency information for a mesh.
///
/// Provides efficient lookups for:
/// - Faces adjacent to an edge
/// - Faces adjacent to a vertex
/// - Boundary (naked) edges, used by exactly one face
/// - Non-manifold edges, used by more than two faces
/// - Orientation conflicts, where two faces traverse an edge the same way
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    /// Undirected edge (v0 < v1) to adjacent face indices.
    edge_to_faces: HashMap<(u32, u32), Vec<usize>>,
    /// Vertex index to adjacent face indices.
    vertex_to_faces: HashMap<u32, Vec<usize>>,
    /// Directed edge as traversed by its faces, with a use count.
    half_edges: HashMap<(u32, u32), u32>,
}

impl MeshAdjacency {
    /// Build adjacency information from a list of faces.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_repair::MeshAdjacency;
    ///
    /// let faces = vec![[0, 1, 2], [1, 3, 2]];
    /// let adj = MeshAdjacency::build(&faces);
    ///
    /// assert_eq!(adj.boundary_edge_count(), 4);
    /// ```
    #[must_use]
    pub fn build<F: AsRef<[u32]>>(faces: &[F]) -> Self {
        let mut edge_to_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        let mut vertex_to_faces: HashMap<u32, Vec<usize>> = HashMap::new();
        let mut half_edges: HashMap<(u32, u32), u32> = HashMap::new();

        for (face_idx, face) in faces.iter().enumerate() {
            let idx = face.as_ref();
            let n = idx.len();
            for (i, &v) in idx.iter().enumerate() {
                vertex_to_faces.entry(v).or_default().push(face_idx);

                let next = idx[(i + 1) % n];
                if next == v {
                    continue;
                }
                edge_to_faces
                    .entry(normalize_edge(v, next))
                    .or_default()
                    .push(face_idx);
                *half_edges.entry((v, next)).or_default() += 1;
            }
        }

        Self {
            edge_to_faces,
            vertex_to_faces,
            half_edges,
        }
    }

    /// Faces adjacent to an edge, in either direction.
    ///
    /// Returns `None` if the edge doesn't exist in the mesh.
    #[must_use]
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[usize]> {
        self.edge_to_faces
            .get(&normalize_edge(v0, v1))
            .map(Vec::as_slice)
    }

    /// Faces adjacent to a vertex; empty if the vertex is unused.
    #[must_use]
    pub fn faces_for_vertex(&self, v: u32) -> &[usize] {
        self.vertex_to_faces.get(&v).map_or(&[], Vec::as_slice)
    }

    /// Iterate over undirected edges with their adjacent faces.
    pub fn edges(&self) -> impl Iterator<Item = ((u32, u32), &[usize])> + '_ {
        self.edge_to_faces
            .iter()
            .map(|(&edge, faces)| (edge, faces.as_slice()))
    }

    /// Iterate over boundary edges (exactly one adjacent face).
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(&edge, _)| edge)
    }

    /// Boundary edges in the direction their single face traverses them.
    pub fn boundary_half_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.boundary_edges().map(|(a, b)| {
            if self.half_edges.contains_key(&(a, b)) {
                (a, b)
            } else {
                (b, a)
            }
        })
    }

    /// Count the boundary (naked) edges.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() == 1)
            .count()
    }

    /// Count the edges with more than two adjacent faces.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() > 2)
            .count()
    }

    /// Count directed edges used more than once, i.e. shared by two faces
    /// with conflicting winding.
    #[must_use]
    pub fn inconsistent_edge_count(&self) -> usize {
        self.half_edges.values().filter(|&&n| n > 1).count()
    }

    /// Check that every edge has at most two adjacent faces.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() <= 2)
    }

    /// Check that no edge is naked.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() >= 2)
    }

    /// Total number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }

    /// Number of vertices referenced by at least one face.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_to_faces.len()
    }
}

/// Normalize edge direction so v0 < v1.
#[inline]
pub(crate) fn normalize_edge(v0: u32, v1: u32) -> (u32, u32) {
    if v0 < v1 { (v0, v1) } else { (v1, v0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::Face;

    #[test]
    fn two_triangles_share_one_edge() {
        let adj = MeshAdjacency::build(&[[0, 1, 2], [1, 3, 2]]);
        assert_eq!(adj.edge_count(), 5);
        assert_eq!(adj.faces_for_edge(2, 1).map(<[usize]>::len), Some(2));
        assert_eq!(adj.boundary_edge_count(), 4);
        assert_eq!(adj.faces_for_vertex(2).len(), 2);
        assert_eq!(adj.inconsistent_edge_count(), 0);
    }

    #[test]
    fn quad_edges_skip_diagonal() {
        let faces = [Face::Quad([0, 1, 2, 3])];
        let adj = MeshAdjacency::build(&faces);
        assert_eq!(adj.edge_count(), 4);
        assert!(adj.faces_for_edge(0, 2).is_none());
    }

    #[test]
    fn non_manifold_detection() {
        let adj = MeshAdjacency::build(&[[0, 1, 2], [0, 1, 3], [0, 1, 4]]);
        assert_eq!(adj.non_manifold_edge_count(), 1);
        assert!(!adj.is_manifold());
    }

    #[test]
    fn conflicting_winding_detected() {
        // Both faces walk 1 -> 2.
        let adj = MeshAdjacency::build(&[[0, 1, 2], [3, 1, 2]]);
        assert_eq!(adj.inconsistent_edge_count(), 1);
    }

    #[test]
    fn boundary_half_edges_follow_face_winding() {
        let adj = MeshAdjacency::build(&[[0, 1, 2]]);
        let mut half: Vec<_> = adj.boundary_half_edges().collect();
        half.sort_unstable();
        assert_eq!(half, vec![(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn unknown_lookups_are_empty() {
        let adj = MeshAdjacency::build(&[[0, 1, 2]]);
        assert!(adj.faces_for_edge(0, 5).is_none());
        assert!(adj.faces_for_vertex(99).is_empty());
    }
}
