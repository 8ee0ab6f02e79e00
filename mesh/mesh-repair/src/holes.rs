//! Hole detection and filling.
//!
//! A hole is a closed loop of naked edges. Loops are traced in the
//! direction a cap must wind to agree with the surrounding faces, so the
//! filled mesh stays consistently oriented.
//!
//! # Example
//!
//! ```
//! use mesh_types::unit_cube;
//! use mesh_repair::{fill_holes, MeshAdjacency};
//!
//! let mut mesh = unit_cube();
//! mesh.faces.drain(2..4); // open the top
//!
//! let outcome = fill_holes(&mut mesh, 100).unwrap();
//! assert_eq!(outcome.filled, 1);
//! assert!(MeshAdjacency::build(&mesh.faces).is_watertight());
//! ```

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3, Triangle, Vector3};
use tracing::{debug, info, warn};

use crate::adjacency::MeshAdjacency;
use crate::error::{RepairError, RepairResult};

/// A boundary loop, ordered in cap winding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLoop {
    /// Vertex indices around the hole.
    pub vertices: Vec<u32>,
}

impl BoundaryLoop {
    /// Number of edges (and vertices) in the loop.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }

    /// A loop needs at least three vertices to enclose anything.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.vertices.len() >= 3
    }
}

/// What [`fill_holes`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillOutcome {
    /// Holes capped.
    pub filled: usize,
    /// Holes left open: too large, or naked edges that never closed a loop.
    pub skipped: usize,
}

impl FillOutcome {
    /// Every hole found was capped.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.skipped == 0
    }
}

/// Detect all closed boundary loops.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use mesh_repair::{detect_holes, MeshAdjacency};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// let holes = detect_holes(&MeshAdjacency::build(&mesh.faces));
/// assert_eq!(holes.len(), 1);
/// assert_eq!(holes[0].vertices, vec![0, 2, 1]);
/// ```
#[must_use]
pub fn detect_holes(adjacency: &MeshAdjacency) -> Vec<BoundaryLoop> {
    trace_loops(adjacency).0
}

/// Trace naked edges into loops; also count chains that never closed.
fn trace_loops(adjacency: &MeshAdjacency) -> (Vec<BoundaryLoop>, usize) {
    // A cap walks each naked edge opposite to its face.
    let mut cap_edges: Vec<(u32, u32)> = adjacency
        .boundary_half_edges()
        .map(|(a, b)| (b, a))
        .collect();
    if cap_edges.is_empty() {
        return (Vec::new(), 0);
    }
    cap_edges.sort_unstable();
    debug!("Found {} boundary edges", cap_edges.len());

    let mut outgoing: HashMap<u32, Vec<u32>> = HashMap::new();
    for &(from, to) in cap_edges.iter().rev() {
        outgoing.entry(from).or_default().push(to);
    }

    let mut loops = Vec::new();
    let mut open = 0;
    for &(start, first) in &cap_edges {
        let Some(targets) = outgoing.get_mut(&start) else {
            continue;
        };
        let Some(slot) = targets.iter().position(|&t| t == first) else {
            continue;
        };
        targets.remove(slot);

        let mut vertices = vec![start];
        let mut current = first;
        let mut closed = false;
        while vertices.len() <= cap_edges.len() {
            if current == start {
                closed = true;
                break;
            }
            vertices.push(current);
            match outgoing.get_mut(&current).and_then(Vec::pop) {
                Some(next) => current = next,
                None => break,
            }
        }

        if closed && vertices.len() >= 3 {
            loops.push(BoundaryLoop { vertices });
        } else {
            warn!("Boundary chain starting at vertex {} is not closed", start);
            open += 1;
        }
    }

    info!(
        "Detected {} holes (boundary loops), sizes: {:?}",
        loops.len(),
        loops.iter().map(BoundaryLoop::edge_count).collect::<Vec<_>>()
    );
    (loops, open)
}

/// Triangulate one hole by ear clipping, falling back to a fan.
///
/// Triangles follow the loop order, so they inherit its winding.
#[must_use]
pub fn fill_hole_ear_clipping(mesh: &IndexedMesh, boundary: &BoundaryLoop) -> Vec<[u32; 3]> {
    let n = boundary.vertices.len();
    if n < 3 {
        return Vec::new();
    }

    let positions: Vec<Point3<f64>> = boundary
        .vertices
        .iter()
        .map(|&idx| mesh.position(idx))
        .collect();
    let hole_normal = newell_normal(&positions);

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let prev = remaining[(i + m - 1) % m];
            let next = remaining[(i + 1) % m];
            is_ear(&positions, &remaining, prev, remaining[i], next, &hole_normal)
        });
        let Some(i) = ear else {
            warn!(
                "Ear clipping stuck with {} vertices remaining, using fan triangulation",
                remaining.len()
            );
            break;
        };
        let prev = remaining[(i + m - 1) % m];
        let next = remaining[(i + 1) % m];
        triangles.push([
            boundary.vertices[prev],
            boundary.vertices[remaining[i]],
            boundary.vertices[next],
        ]);
        remaining.remove(i);
    }

    for k in 1..remaining.len() - 1 {
        triangles.push([
            boundary.vertices[remaining[0]],
            boundary.vertices[remaining[k]],
            boundary.vertices[remaining[k + 1]],
        ]);
    }

    debug!(
        "Filled hole with {} edges using {} triangles",
        n,
        triangles.len()
    );
    triangles
}

/// Polygon normal by Newell's method; +Z for a degenerate loop.
fn newell_normal(positions: &[Point3<f64>]) -> Vector3<f64> {
    let n = positions.len();
    let normal = (0..n).fold(Vector3::zeros(), |acc, i| {
        acc + positions[i].coords.cross(&positions[(i + 1) % n].coords)
    });
    normal
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::z)
}

fn is_ear(
    positions: &[Point3<f64>],
    remaining: &[usize],
    prev: usize,
    curr: usize,
    next: usize,
    hole_normal: &Vector3<f64>,
) -> bool {
    let tri = Triangle::new(positions[prev], positions[curr], positions[next]);
    let Some(tri_normal) = tri.normal() else {
        return false;
    };
    // Reflex corner.
    if tri_normal.dot(hole_normal) <= 0.0 {
        return false;
    }

    !remaining
        .iter()
        .filter(|&&idx| idx != prev && idx != curr && idx != next)
        .any(|&idx| point_in_triangle_projected(&positions[idx], &tri, hole_normal))
}

/// Point-in-triangle after dropping the axis most aligned with `normal`.
fn point_in_triangle_projected(p: &Point3<f64>, tri: &Triangle, normal: &Vector3<f64>) -> bool {
    let abs = normal.abs();
    let drop = if abs.z >= abs.x && abs.z >= abs.y {
        2
    } else if abs.y >= abs.x {
        1
    } else {
        0
    };
    let flat = |q: &Point3<f64>| match drop {
        2 => (q.x, q.y),
        1 => (q.x, q.z),
        _ => (q.y, q.z),
    };
    let (p, a, b, c) = (flat(p), flat(&tri.v0), flat(&tri.v1), flat(&tri.v2));

    let sign = |p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)| {
        (p1.0 - p3.0).mul_add(p2.1 - p3.1, -((p2.0 - p3.0) * (p1.1 - p3.1)))
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Cap every hole with at most `max_hole_edges` edges.
///
/// # Errors
///
/// Returns [`RepairError::EmptyMesh`] for a mesh without faces, an index
/// error for out-of-range faces, and [`RepairError::HoleFillFailed`] if a
/// loop cannot be triangulated.
pub fn fill_holes(mesh: &mut IndexedMesh, max_hole_edges: usize) -> RepairResult<FillOutcome> {
    if mesh.is_empty() {
        return Err(RepairError::EmptyMesh);
    }
    RepairError::check_indices(&mesh.faces, mesh.vertices.len())?;

    let adjacency = MeshAdjacency::build(&mesh.faces);
    let (holes, open) = trace_loops(&adjacency);

    let (fillable, too_large): (Vec<_>, Vec<_>) = holes
        .into_iter()
        .partition(|hole| hole.edge_count() <= max_hole_edges);
    for hole in &too_large {
        warn!(
            "Skipping large hole with {} edges (max: {})",
            hole.edge_count(),
            max_hole_edges
        );
    }

    let mut filled = 0;
    for hole in &fillable {
        let triangles = fill_hole_ear_clipping(mesh, hole);
        if triangles.is_empty() {
            return Err(RepairError::HoleFillFailed {
                reason: format!(
                    "failed to triangulate hole with {} edges",
                    hole.edge_count()
                ),
            });
        }
        mesh.faces.extend(triangles);
        filled += 1;
    }

    if filled > 0 {
        info!("Filled {} holes", filled);
    }
    Ok(FillOutcome {
        filled,
        skipped: too_large.len() + open,
    })
}
