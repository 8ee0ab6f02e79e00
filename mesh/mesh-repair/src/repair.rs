//! Core mesh repair operations.
//!
//! The lattice repair sequence is fixed: remove zero-area faces, split
//! quads, make winding consistent, then flip the whole mesh if it encloses
//! negative volume. [`repair_mesh`] runs it; the individual passes are
//! public for callers that need a different order.

use hashbrown::{HashMap, HashSet};
use mesh_types::{Face, IndexedMesh, PolyMesh, Vertex};
use nalgebra::Point3;
use tracing::{debug, info};

use crate::adjacency::MeshAdjacency;
use crate::validate::face_area;
use crate::winding::unify_normals;

/// Configuration parameters for mesh repair operations.
///
/// All distances are in mesh units.
///
/// # Example
///
/// ```
/// use mesh_repair::RepairParams;
///
/// let params = RepairParams::default().with_weld_epsilon(0.01);
/// assert_eq!(params.degenerate_area_threshold, 0.0);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepairParams {
    /// Faces with area at or below this are removed.
    ///
    /// Default: `0.0` (only exactly flat faces)
    pub degenerate_area_threshold: f64,

    /// Distance below which vertices are merged.
    ///
    /// Default: `1e-6`
    pub weld_epsilon: f64,

    /// Distance below which naked-edge vertices are snapped together.
    ///
    /// Default: `0.01`
    pub heal_distance: f64,

    /// Whether to drop vertices no face refers to.
    ///
    /// Default: `true`
    pub remove_unreferenced: bool,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            degenerate_area_threshold: 0.0,
            weld_epsilon: 1e-6,
            heal_distance: 0.01,
            remove_unreferenced: true,
        }
    }
}

impl RepairParams {
    /// Conservative settings for exact CAD input.
    #[must_use]
    pub fn for_cad() -> Self {
        Self {
            weld_epsilon: 1e-9,
            heal_distance: 1e-6,
            ..Default::default()
        }
    }

    /// Aggressive settings for noisy or scanned input.
    #[must_use]
    pub fn for_scans() -> Self {
        Self {
            degenerate_area_threshold: 1e-9,
            weld_epsilon: 0.01,
            heal_distance: 0.1,
            ..Default::default()
        }
    }

    /// Set the zero-area threshold.
    #[must_use]
    pub const fn with_degenerate_area_threshold(mut self, threshold: f64) -> Self {
        self.degenerate_area_threshold = threshold;
        self
    }

    /// Set the vertex welding distance.
    #[must_use]
    pub const fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    /// Set the naked-edge healing distance.
    #[must_use]
    pub const fn with_heal_distance(mut self, distance: f64) -> Self {
        self.heal_distance = distance;
        self
    }

    /// Set whether unreferenced vertices are removed.
    #[must_use]
    pub const fn with_remove_unreferenced(mut self, remove: bool) -> Self {
        self.remove_unreferenced = remove;
        self
    }
}

/// Counts from one run of [`repair_mesh`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairSummary {
    /// Faces removed for zero area or repeated corners.
    pub degenerate_faces: usize,
    /// Quads split into two triangles.
    pub quads_to_tris: usize,
    /// Faces reversed to agree with their neighbours.
    pub faces_reoriented: usize,
    /// Whether the whole mesh was flipped for negative volume.
    pub mesh_flipped: bool,
    /// Vertices dropped because nothing referenced them.
    pub unreferenced_removed: usize,
}

impl std::fmt::Display for RepairSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "degenerate={} quads_to_tris={} reoriented={} flipped={}",
            self.degenerate_faces, self.quads_to_tris, self.faces_reoriented, self.mesh_flipped
        )
    }
}

/// Run the fixed repair sequence.
///
/// 1. Remove zero-area faces
/// 2. Convert quads to triangles
/// 3. Unify face orientation
/// 4. Flip everything if the signed volume is negative
///
/// A second run on the output reports zero for every count.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, PolyMesh};
/// use mesh_repair::{repair_mesh, RepairParams};
///
/// let mut mesh = PolyMesh::from(unit_cube());
/// mesh.flip_normals();
///
/// let summary = repair_mesh(&mut mesh, &RepairParams::default());
/// assert!(summary.mesh_flipped);
/// assert!(mesh.signed_volume() > 0.0);
/// ```
pub fn repair_mesh(mesh: &mut PolyMesh, params: &RepairParams) -> RepairSummary {
    let degenerate_faces = remove_degenerate_faces(mesh, params.degenerate_area_threshold);
    let quads_to_tris = triangulate_quads(mesh);
    let faces_reoriented = unify_normals(mesh);
    let mesh_flipped = orient_outward(mesh);
    let unreferenced_removed = if params.remove_unreferenced {
        remove_unreferenced_poly_vertices(mesh)
    } else {
        0
    };

    let summary = RepairSummary {
        degenerate_faces,
        quads_to_tris,
        faces_reoriented,
        mesh_flipped,
        unreferenced_removed,
    };
    info!(%summary, "Repaired mesh");
    summary
}

/// Remove faces with repeated corners or area at or below the threshold.
///
/// Faces with out-of-range indices are left for validation to report.
/// Returns the number of faces removed.
///
/// # Example
///
/// ```
/// use mesh_types::{Face, PolyMesh, Vertex};
/// use mesh_repair::remove_degenerate_faces;
///
/// let mut mesh = PolyMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(10.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(5.0, 0.0, 0.0)); // collinear
/// mesh.faces.push(Face::Tri([0, 1, 2]));
///
/// assert_eq!(remove_degenerate_faces(&mut mesh, 0.0), 1);
/// ```
pub fn remove_degenerate_faces(mesh: &mut PolyMesh, area_threshold: f64) -> usize {
    retain_proper_faces(&mesh.vertices, &mut mesh.faces, area_threshold)
}

/// Triangle-mesh counterpart of [`remove_degenerate_faces`].
pub fn remove_degenerate_triangles(mesh: &mut IndexedMesh, area_threshold: f64) -> usize {
    retain_proper_faces(&mesh.vertices, &mut mesh.faces, area_threshold)
}

fn retain_proper_faces<F: AsRef<[u32]>>(
    vertices: &[Vertex],
    faces: &mut Vec<F>,
    area_threshold: f64,
) -> usize {
    let before = faces.len();
    let n = vertices.len();
    faces.retain(|face| {
        let idx = face.as_ref();
        if idx.iter().any(|&i| i as usize >= n) {
            return true;
        }
        let repeated = (0..idx.len()).any(|i| idx[i + 1..].contains(&idx[i]));
        !repeated && face_area(vertices, idx) > area_threshold
    });
    let removed = before - faces.len();
    if removed > 0 {
        debug!(removed, "Removed degenerate faces");
    }
    removed
}

/// Split every quad into two triangles.
///
/// The diagonal whose smaller triangle is larger wins, so a quad with three
/// collinear corners never leaves a zero-area half behind. Ties go to the
/// shorter diagonal.
///
/// Returns the number of quads converted.
pub fn triangulate_quads(mesh: &mut PolyMesh) -> usize {
    let quads = mesh.quad_count();
    if quads == 0 {
        return 0;
    }

    let n = mesh.vertices.len();
    let mut faces = Vec::with_capacity(mesh.faces.len() + quads);
    for face in &mesh.faces {
        match *face {
            Face::Tri(_) => faces.push(*face),
            Face::Quad([a, b, c, d]) => {
                let in_range = [a, b, c, d].iter().all(|&i| (i as usize) < n);
                if in_range && prefers_bd_split(&mesh.vertices, [a, b, c, d]) {
                    faces.push(Face::Tri([a, b, d]));
                    faces.push(Face::Tri([b, c, d]));
                } else {
                    faces.push(Face::Tri([a, b, c]));
                    faces.push(Face::Tri([a, c, d]));
                }
            }
        }
    }
    mesh.faces = faces;
    debug!(quads, "Converted quads to triangles");
    quads
}

fn prefers_bd_split(vertices: &[Vertex], [a, b, c, d]: [u32; 4]) -> bool {
    let ac = face_area(vertices, &[a, b, c]).min(face_area(vertices, &[a, c, d]));
    let bd = face_area(vertices, &[a, b, d]).min(face_area(vertices, &[b, c, d]));
    if (ac - bd).abs() > 1e-12 * (ac + bd) {
        return bd > ac;
    }
    let pos = |i: u32| vertices[i as usize].position;
    (pos(b) - pos(d)).norm_squared() < (pos(a) - pos(c)).norm_squared()
}

/// Flip the whole mesh if it encloses negative volume.
///
/// Returns whether a flip happened.
pub fn orient_outward(mesh: &mut PolyMesh) -> bool {
    if mesh.indices_in_range() && mesh.signed_volume() < 0.0 {
        mesh.flip_normals();
        true
    } else {
        false
    }
}

/// Triangle-mesh counterpart of [`orient_outward`].
pub fn orient_triangles_outward(mesh: &mut IndexedMesh) -> bool {
    if mesh.indices_in_range() && mesh.signed_volume() < 0.0 {
        mesh.flip_normals();
        true
    } else {
        false
    }
}

/// Weld vertices that are within `epsilon` of each other.
///
/// Uses spatial hashing. Faces that collapse are removed.
/// Returns the number of vertices merged.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use mesh_repair::weld_vertices;
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0001, 0.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([0, 3, 2]);
///
/// assert_eq!(weld_vertices(&mut mesh, 0.001), 1);
/// ```
#[allow(clippy::cast_possible_truncation)]
pub fn weld_vertices(mesh: &mut IndexedMesh, epsilon: f64) -> usize {
    let all = 0..mesh.vertices.len() as u32;
    merge_close_vertices(mesh, all, epsilon)
}

/// Snap together vertices on naked edges that lie within `distance`.
///
/// Only boundary vertices move, so interior detail is untouched.
/// Returns the number of vertices merged.
pub fn heal_naked_edges(mesh: &mut IndexedMesh, distance: f64) -> usize {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let mut boundary: Vec<u32> = adjacency
        .boundary_edges()
        .flat_map(|(a, b)| [a, b])
        .collect::<HashSet<u32>>()
        .into_iter()
        .collect();
    if boundary.is_empty() {
        return 0;
    }
    boundary.sort_unstable();
    let merged = merge_close_vertices(mesh, boundary.into_iter(), distance);
    if merged > 0 {
        debug!(merged, distance, "Healed naked edges");
    }
    merged
}

/// Merge candidates closer than `epsilon` into the lowest index among them,
/// then rewrite faces and drop the ones that collapse.
#[allow(clippy::cast_possible_truncation)]
fn merge_close_vertices(
    mesh: &mut IndexedMesh,
    candidates: impl Iterator<Item = u32>,
    epsilon: f64,
) -> usize {
    if mesh.vertices.is_empty() || epsilon <= 0.0 {
        return 0;
    }
    let cell_size = epsilon * 2.0;
    let candidates: Vec<u32> = candidates
        .filter(|&i| (i as usize) < mesh.vertices.len())
        .collect();

    let mut spatial_hash: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for &idx in &candidates {
        let cell = pos_to_cell(&mesh.vertices[idx as usize].position, cell_size);
        spatial_hash.entry(cell).or_default().push(idx);
    }

    let mut remap: Vec<u32> = (0..mesh.vertices.len() as u32).collect();
    let mut merged = 0;

    for &idx in &candidates {
        if remap[idx as usize] != idx {
            continue;
        }
        let position = mesh.vertices[idx as usize].position;
        let cell = pos_to_cell(&position, cell_size);

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = (cell.0 + dx, cell.1 + dy, cell.2 + dz);
                    let Some(others) = spatial_hash.get(&neighbor) else {
                        continue;
                    };
                    for &other in others {
                        if other <= idx || remap[other as usize] != other {
                            continue;
                        }
                        if (position - mesh.vertices[other as usize].position).norm() < epsilon {
                            remap[other as usize] = idx;
                            merged += 1;
                        }
                    }
                }
            }
        }
    }

    if merged == 0 {
        return 0;
    }

    for face in &mut mesh.faces {
        for i in face.iter_mut() {
            if (*i as usize) < remap.len() {
                *i = remap[*i as usize];
            }
        }
    }
    mesh.faces
        .retain(|&[a, b, c]| a != b && b != c && a != c);

    merged
}

/// Convert position to spatial hash cell.
#[allow(clippy::cast_possible_truncation)]
fn pos_to_cell(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Remove unreferenced vertices and compact the vertex array.
///
/// Returns the number of vertices removed.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use mesh_repair::remove_unreferenced_vertices;
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(100.0, 100.0, 100.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(remove_unreferenced_vertices(&mut mesh), 1);
/// assert_eq!(mesh.vertices.len(), 3);
/// ```
pub fn remove_unreferenced_vertices(mesh: &mut IndexedMesh) -> usize {
    compact_vertices(&mut mesh.vertices, mesh.faces.iter_mut().flat_map(|f| f.iter_mut()))
}

fn remove_unreferenced_poly_vertices(mesh: &mut PolyMesh) -> usize {
    let indices = mesh.faces.iter_mut().flat_map(|f| match f {
        Face::Tri(v) => v.as_mut_slice().iter_mut(),
        Face::Quad(v) => v.as_mut_slice().iter_mut(),
    });
    compact_vertices(&mut mesh.vertices, indices)
}

#[allow(clippy::cast_possible_truncation)]
fn compact_vertices<'a>(
    vertices: &mut Vec<Vertex>,
    indices: impl Iterator<Item = &'a mut u32>,
) -> usize {
    let indices: Vec<&mut u32> = indices.collect();
    let n = vertices.len();
    if indices.iter().any(|i| **i as usize >= n) {
        return 0;
    }

    let mut used = vec![false; n];
    for i in &indices {
        used[**i as usize] = true;
    }
    let kept = used.iter().filter(|&&u| u).count();
    if kept == n {
        return 0;
    }

    let mut remap = vec![u32::MAX; n];
    let mut compacted = Vec::with_capacity(kept);
    for (old, vertex) in vertices.iter().enumerate() {
        if used[old] {
            remap[old] = compacted.len() as u32;
            compacted.push(vertex.clone());
        }
    }
    for i in indices {
        *i = remap[*i as usize];
    }
    *vertices = compacted;
    n - kept
}
