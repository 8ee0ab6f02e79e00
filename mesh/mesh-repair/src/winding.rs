//! Face orientation consistency.
//!
//! Neighbouring faces of a consistently oriented mesh traverse their shared
//! edge in opposite directions. [`unify_normals`] restores that property by
//! walking each edge-connected patch from a seed face.

use std::collections::VecDeque;

use mesh_types::{Face, IndexedMesh, PolyMesh, Vertex};
use tracing::debug;

use crate::adjacency::MeshAdjacency;

/// A face whose winding can be reversed in place.
trait Winding: AsRef<[u32]> {
    fn reverse(&mut self);
}

impl Winding for [u32; 3] {
    fn reverse(&mut self) {
        self.swap(1, 2);
    }
}

impl Winding for Face {
    fn reverse(&mut self) {
        *self = self.reversed();
    }
}

/// Make face winding consistent across shared edges.
///
/// Each edge-connected patch keeps the orientation of its lowest-index
/// face; closed patches are then turned to agree with the sign of the
/// largest one, so a later whole-mesh flip fixes everything at once.
/// Returns the number of faces reversed.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, PolyMesh};
/// use mesh_repair::unify_normals;
///
/// let mut mesh = PolyMesh::from(unit_cube());
/// mesh.faces[3] = mesh.faces[3].reversed();
///
/// assert_eq!(unify_normals(&mut mesh), 1);
/// assert!((mesh.signed_volume() - 1.0).abs() < 1e-12);
/// ```
pub fn unify_normals(mesh: &mut PolyMesh) -> usize {
    unify(&mesh.vertices, &mut mesh.faces)
}

/// Triangle-mesh counterpart of [`unify_normals`].
pub fn unify_triangle_normals(mesh: &mut IndexedMesh) -> usize {
    unify(&mesh.vertices, &mut mesh.faces)
}

/// Number of edges whose two faces disagree on direction.
#[must_use]
pub fn count_inconsistent_edges<F: AsRef<[u32]>>(faces: &[F]) -> usize {
    MeshAdjacency::build(faces).inconsistent_edge_count()
}

fn unify<F: Winding>(vertices: &[Vertex], faces: &mut [F]) -> usize {
    let n = vertices.len();
    if faces
        .iter()
        .any(|f| f.as_ref().iter().any(|&i| i as usize >= n))
    {
        return 0;
    }

    let adjacency = MeshAdjacency::build(faces);
    let mut visited = vec![false; faces.len()];
    let mut flipped = vec![false; faces.len()];
    let mut patches: Vec<Vec<usize>> = Vec::new();

    for seed in 0..faces.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut patch = vec![seed];
        let mut queue = VecDeque::from([seed]);

        while let Some(current) = queue.pop_front() {
            let idx: Vec<u32> = faces[current].as_ref().to_vec();
            for k in 0..idx.len() {
                let (a, b) = (idx[k], idx[(k + 1) % idx.len()]);
                let Some(neighbors) = adjacency.faces_for_edge(a, b) else {
                    continue;
                };
                // Only propagate across manifold edges.
                if neighbors.len() != 2 {
                    continue;
                }
                for &other in neighbors {
                    if other == current || visited[other] {
                        continue;
                    }
                    visited[other] = true;
                    if traverses(faces[other].as_ref(), a, b) {
                        faces[other].reverse();
                        flipped[other] = true;
                    }
                    patch.push(other);
                    queue.push_back(other);
                }
            }
        }
        patches.push(patch);
    }

    align_closed_patches(vertices, faces, &patches, &mut flipped);

    let count = flipped.iter().filter(|&&f| f).count();
    if count > 0 {
        debug!(count, patches = patches.len(), "Unified face orientation");
    }
    count
}

/// Reverse closed patches whose volume sign disagrees with the largest patch.
fn align_closed_patches<F: Winding>(
    vertices: &[Vertex],
    faces: &mut [F],
    patches: &[Vec<usize>],
    flipped: &mut [bool],
) {
    if patches.len() < 2 {
        return;
    }
    let volumes: Vec<Option<f64>> = patches
        .iter()
        .map(|patch| {
            let subset: Vec<&[u32]> = patch.iter().map(|&f| faces[f].as_ref()).collect();
            MeshAdjacency::build(&subset)
                .is_watertight()
                .then(|| patch_volume(vertices, &subset))
        })
        .collect();

    let Some(reference) = volumes
        .iter()
        .flatten()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
    else {
        return;
    };

    for (patch, volume) in patches.iter().zip(&volumes) {
        if volume.is_some_and(|v| v * reference < 0.0) {
            for &f in patch {
                faces[f].reverse();
                flipped[f] = !flipped[f];
            }
        }
    }
}

/// Signed volume of a set of polygon faces, fanned from their first corner.
fn patch_volume(vertices: &[Vertex], faces: &[&[u32]]) -> f64 {
    let p = |i: u32| vertices[i as usize].position.coords;
    faces
        .iter()
        .flat_map(|idx| {
            (1..idx.len().saturating_sub(1)).map(move |k| (idx[0], idx[k], idx[k + 1]))
        })
        .map(|(a, b, c)| p(a).dot(&p(b).cross(&p(c))) / 6.0)
        .sum()
}

/// Whether the face walks the directed edge `a -> b`.
fn traverses(idx: &[u32], a: u32, b: u32) -> bool {
    let n = idx.len();
    (0..n).any(|i| idx[i] == a && idx[(i + 1) % n] == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{Aabb, Point3, Vector3, unit_cube};

    #[test]
    fn consistent_mesh_untouched() {
        let mut mesh = unit_cube();
        assert_eq!(unify_triangle_normals(&mut mesh), 0);
        assert_eq!(count_inconsistent_edges(&mesh.faces), 0);
    }

    #[test]
    fn several_flipped_faces_restored() {
        let mut mesh = unit_cube();
        for i in [1, 5, 9] {
            mesh.faces[i].swap(1, 2);
        }
        assert!(count_inconsistent_edges(&mesh.faces) > 0);
        assert_eq!(unify_triangle_normals(&mut mesh), 3);
        assert_eq!(count_inconsistent_edges(&mesh.faces), 0);
    }

    #[test]
    fn inside_out_patch_aligned_with_larger_one() {
        let mut big = IndexedMesh::cuboid(&Aabb::new(Point3::origin(), Point3::new(3.0, 3.0, 3.0)));
        let mut small = unit_cube();
        small.translate(Vector3::new(10.0, 0.0, 0.0));
        small.flip_normals();
        big.merge(&small);

        let flipped = unify_triangle_normals(&mut big);
        assert_eq!(flipped, 12);
        assert!((big.signed_volume() - 28.0).abs() < 1e-9);
    }
}
