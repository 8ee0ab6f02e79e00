//! Mesh validation and repair.
//!
//! This crate provides tools for:
//! - Mesh validation into an ordered [`MeshReport`]
//! - The fixed lattice repair sequence ([`repair_mesh`]): zero-area face
//!   removal, quad splitting, orientation unification, outward flip
//! - Vertex welding and naked-edge healing
//! - Unreferenced vertex removal
//! - Hole detection and filling with consistently wound caps
//! - Connected component counting
//!
//! # Example
//!
//! ```
//! use mesh_types::{unit_cube, PolyMesh};
//! use mesh_repair::{keys, repair_mesh, validate_poly_mesh, RepairParams, MODIFIED_REPORT};
//!
//! let mut mesh = PolyMesh::from(unit_cube());
//! mesh.flip_normals();
//!
//! let summary = repair_mesh(&mut mesh, &RepairParams::default());
//! let report = validate_poly_mesh(MODIFIED_REPORT, &mesh)
//!     .with_extra(keys::MESH_FLIPPED, summary.mesh_flipped);
//!
//! assert!(report.closed_mesh);
//! println!("{report}");
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod adjacency;
mod components;
mod error;
mod holes;
mod repair;
mod validate;
mod winding;

pub use adjacency::MeshAdjacency;
pub use components::{disjoint_count, face_components};
pub use error::{RepairError, RepairResult};
pub use holes::{BoundaryLoop, FillOutcome, detect_holes, fill_hole_ear_clipping, fill_holes};
pub use repair::{
    RepairParams, RepairSummary, heal_naked_edges, orient_outward, orient_triangles_outward,
    remove_degenerate_faces, remove_degenerate_triangles, remove_unreferenced_vertices,
    repair_mesh, triangulate_quads, weld_vertices,
};
pub use validate::{
    CUT_REPORT, MODIFIED_REPORT, MeshReport, ORIGINAL_REPORT, ReportValue, keys, validate_mesh,
    validate_poly_mesh,
};
pub use winding::{count_inconsistent_edges, unify_normals, unify_triangle_normals};
