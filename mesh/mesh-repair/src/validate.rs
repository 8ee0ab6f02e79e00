//! Mesh validation and health reporting.
//!
//! A [`MeshReport`] is a flat record with a fixed key order, so reports
//! produced at different pipeline stages line up when written side by side.

use std::fmt;

use mesh_types::{Face, IndexedMesh, PolyMesh, Triangle, Vertex};

use crate::adjacency::MeshAdjacency;
use crate::components::disjoint_count;

/// Stable report keys, in output order.
pub mod keys {
    /// Which stage produced the report.
    pub const REPORT_VERSION: &str = "report_version";
    /// Structural validity.
    pub const VALID_MESH: &str = "valid_mesh";
    /// Number of naked (boundary) edges.
    pub const NAKED_EDGES: &str = "naked_edges";
    /// Closed means no naked edges.
    pub const CLOSED_MESH: &str = "closed_mesh";
    /// No edge with more than two faces.
    pub const MANIFOLD_MESH: &str = "manifold_mesh";
    /// Number of vertex-connected pieces.
    pub const DISJOINT_COUNT: &str = "disjoint_count";
    /// Vertex count.
    pub const VERTEX_COUNT: &str = "vertex_count";
    /// Approximate in-memory size in megabytes.
    pub const MEMORY_ESTIMATE_MB: &str = "memory_estimate_mb";
    /// Validity log text; empty for a valid mesh.
    pub const LOG_INVALID: &str = "log_invalid";

    /// Zero-area faces removed by repair.
    pub const DEGENERATE_FACES: &str = "degenerate_faces";
    /// Quads converted to triangles by repair.
    pub const QUADS_TO_TRIS: &str = "quads_to_tris";
    /// Whether repair flipped the whole mesh.
    pub const MESH_FLIPPED: &str = "mesh_flipped";

    /// Whether the cut was retried with offset surfaces.
    pub const REVISED_CUT: &str = "revised_cut";
    /// Face count straight after the cut.
    pub const FACE_COUNT_CUT: &str = "face_count_cut";
    /// Whether hole filling closed every hole.
    pub const FILL_SUCCESS: &str = "fill_success";
    /// Face count after hole filling.
    pub const FACE_COUNT_FILLED: &str = "face_count_filled";
}

/// Report name for the freshly thickened lattice.
pub const ORIGINAL_REPORT: &str = "original_report";
/// Report name for the repaired lattice.
pub const MODIFIED_REPORT: &str = "modified_report";
/// Report name for the lattice after the boolean cut.
pub const CUT_REPORT: &str = "cut_report";

/// A single report value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ReportValue {
    /// Yes/no flag.
    Bool(bool),
    /// Non-negative count.
    Count(usize),
    /// Measured quantity.
    Float(f64),
    /// Free text.
    Text(String),
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Count(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ReportValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<usize> for ReportValue {
    fn from(n: usize) -> Self {
        Self::Count(n)
    }
}

impl From<f64> for ReportValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<String> for ReportValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Health record for a mesh at one pipeline stage.
///
/// Invalid meshes still produce a report; the problems are listed in
/// [`log_invalid`](Self::log_invalid).
#[derive(Debug, Clone, PartialEq)]
pub struct MeshReport {
    /// Stage name, e.g. [`ORIGINAL_REPORT`].
    pub version: String,
    /// Structural validity.
    pub valid_mesh: bool,
    /// Number of naked edges.
    pub naked_edges: usize,
    /// No naked edges and at least one face.
    pub closed_mesh: bool,
    /// No edge shared by more than two faces.
    pub manifold_mesh: bool,
    /// Number of vertex-connected pieces.
    pub disjoint_count: usize,
    /// Number of vertices.
    pub vertex_count: usize,
    /// Approximate memory footprint in megabytes.
    pub memory_estimate_mb: f64,
    /// One line per validity problem; empty when valid.
    pub log_invalid: String,
    /// Stage-specific entries, kept in insertion order after the core keys.
    pub extras: Vec<(&'static str, ReportValue)>,
}

impl MeshReport {
    /// Append or replace a stage-specific entry.
    #[must_use]
    pub fn with_extra(mut self, key: &'static str, value: impl Into<ReportValue>) -> Self {
        self.set_extra(key, value);
        self
    }

    /// Insert an entry, replacing an existing one with the same key in place.
    pub fn set_extra(&mut self, key: &'static str, value: impl Into<ReportValue>) {
        let value = value.into();
        match self.extras.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.extras.push((key, value)),
        }
    }

    /// Look up a stage-specific entry.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&ReportValue> {
        self.extras.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// All entries in output order: the core keys, then extras.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, ReportValue)> {
        let mut out = vec![
            (keys::REPORT_VERSION, ReportValue::Text(self.version.clone())),
            (keys::VALID_MESH, self.valid_mesh.into()),
            (keys::NAKED_EDGES, self.naked_edges.into()),
            (keys::CLOSED_MESH, self.closed_mesh.into()),
            (keys::MANIFOLD_MESH, self.manifold_mesh.into()),
            (keys::DISJOINT_COUNT, self.disjoint_count.into()),
            (keys::VERTEX_COUNT, self.vertex_count.into()),
            (keys::MEMORY_ESTIMATE_MB, self.memory_estimate_mb.into()),
            (keys::LOG_INVALID, ReportValue::Text(self.log_invalid.clone())),
        ];
        out.extend(self.extras.iter().cloned());
        out
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for MeshReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in &entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl fmt::Display for MeshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Report ({}):", self.version)?;
        for (key, value) in self.entries().iter().skip(1) {
            if *key == keys::LOG_INVALID && self.log_invalid.is_empty() {
                continue;
            }
            writeln!(f, "  {key}: {value}")?;
        }
        Ok(())
    }
}

/// Validate a triangle mesh.
///
/// # Example
///
/// ```
/// use mesh_types::unit_cube;
/// use mesh_repair::{validate_mesh, ORIGINAL_REPORT};
///
/// let report = validate_mesh(ORIGINAL_REPORT, &unit_cube());
/// assert!(report.valid_mesh);
/// assert!(report.closed_mesh);
/// assert_eq!(report.naked_edges, 0);
/// assert_eq!(report.disjoint_count, 1);
/// ```
#[must_use]
pub fn validate_mesh(version: &str, mesh: &IndexedMesh) -> MeshReport {
    let bytes = std::mem::size_of::<IndexedMesh>()
        + mesh.vertices.len() * std::mem::size_of::<Vertex>()
        + mesh.faces.len() * std::mem::size_of::<[u32; 3]>();
    build_report(version, &mesh.vertices, &mesh.faces, bytes)
}

/// Validate a mixed triangle/quad mesh.
#[must_use]
pub fn validate_poly_mesh(version: &str, mesh: &PolyMesh) -> MeshReport {
    let bytes = std::mem::size_of::<PolyMesh>()
        + mesh.vertices.len() * std::mem::size_of::<Vertex>()
        + mesh.faces.len() * std::mem::size_of::<Face>();
    build_report(version, &mesh.vertices, &mesh.faces, bytes)
}

#[allow(clippy::cast_precision_loss)]
fn build_report<F: AsRef<[u32]>>(
    version: &str,
    vertices: &[Vertex],
    faces: &[F],
    bytes: usize,
) -> MeshReport {
    let adjacency = MeshAdjacency::build(faces);
    let log_invalid = validity_log(vertices, faces);
    let naked_edges = adjacency.boundary_edge_count();

    MeshReport {
        version: version.to_string(),
        valid_mesh: log_invalid.is_empty(),
        naked_edges,
        closed_mesh: !faces.is_empty() && naked_edges == 0,
        manifold_mesh: adjacency.is_manifold(),
        disjoint_count: disjoint_count(faces, vertices.len()),
        vertex_count: vertices.len(),
        memory_estimate_mb: bytes as f64 * 1e-6,
        log_invalid,
        extras: Vec::new(),
    }
}

/// Collect structural problems, one line each.
fn validity_log<F: AsRef<[u32]>>(vertices: &[Vertex], faces: &[F]) -> String {
    let mut problems = Vec::new();
    if faces.is_empty() {
        problems.push("mesh has no faces".to_string());
    }

    let n = vertices.len();
    let mut out_of_range = 0;
    let mut repeated = 0;
    let mut zero_area = 0;
    for face in faces {
        let idx = face.as_ref();
        if idx.iter().any(|&i| i as usize >= n) {
            out_of_range += 1;
            continue;
        }
        if (0..idx.len()).any(|i| idx[i + 1..].contains(&idx[i])) {
            repeated += 1;
            continue;
        }
        if face_area(vertices, idx) <= 0.0 {
            zero_area += 1;
        }
    }
    let non_finite = vertices
        .iter()
        .filter(|v| !v.position.coords.iter().all(|c| c.is_finite()))
        .count();

    if out_of_range > 0 {
        problems.push(format!("{out_of_range} faces reference missing vertices"));
    }
    if repeated > 0 {
        problems.push(format!("{repeated} faces repeat a vertex index"));
    }
    if zero_area > 0 {
        problems.push(format!("{zero_area} faces have zero area"));
    }
    if non_finite > 0 {
        problems.push(format!("{non_finite} vertices have non-finite coordinates"));
    }
    problems.join("\n")
}

/// Area of a polygon face, fanned from its first corner.
pub(crate) fn face_area(vertices: &[Vertex], idx: &[u32]) -> f64 {
    let p = |i: u32| vertices[i as usize].position;
    (1..idx.len().saturating_sub(1))
        .map(|k| Triangle::new(p(idx[0]), p(idx[k]), p(idx[k + 1])).area())
        .sum()
}
