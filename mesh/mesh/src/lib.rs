//! Lattice generation toolkit.
//!
//! This umbrella crate re-exports every mesh-* layer, from the shared
//! geometry types up to the end-to-end lattice pipeline and its output
//! sinks.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh::prelude::*;
//! use mesh::io::{append_record, combine_reports, export_stl, report_record, ArtifactMetadata, ExportOptions};
//!
//! let p = Point3::new;
//! let cell = UnitCell::new(
//!     vec![
//!         Polyline::from_segment(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)),
//!         Polyline::from_segment(p(1.0, 0.0, 0.0), p(0.0, 1.0, 1.0)),
//!     ],
//!     Vec::new(),
//! )
//! .unwrap();
//! let solid = IndexedMesh::cuboid(&Aabb::new(p(0.0, 0.0, 0.0), p(3.0, 3.0, 3.0)));
//! let voxels = vec![Aabb::new(p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0))];
//! let input = LatticeInput::new(cell, voxels, Vec::new()).with_cut_surfaces(CutSurfaces::Primitive);
//!
//! // Generate
//! let output = run_pipeline(RawGeometry::Mesh(solid), &input, &PipelineParams::new(0.2)).unwrap();
//!
//! // Export and log
//! let meta = ArtifactMetadata::new("part-0001", "2024-01-01T00:00:00", "millimeter").with_save_dir("out");
//! let paths = meta.paths.clone().unwrap();
//! export_stl(output.mesh.clone(), paths.mesh_base(), &ExportOptions::default()).unwrap();
//!
//! let mut records = vec![meta.to_record().unwrap().to_string()];
//! for report in output.reports() {
//!     records.push(report_record(report).unwrap().to_string());
//! }
//! append_record(&paths.log, &combine_reports(&records).unwrap()).unwrap();
//! ```
//!
//! # Module Organization
//!
//! ## Foundation
//! - [`types`] - Meshes, polylines, bounding boxes
//! - [`io`] - STL export, report logging, artifact metadata
//!
//! ## Kernels
//! - [`repair`] - Validation reports and repair passes
//! - [`sdf`] - Distance and containment queries
//! - [`boolean`] - Intersection curves and sheet cutting
//! - [`from_curves`] - Thickening curve networks into meshes
//!
//! ## Lattice
//! - [`lattice`] - Population, trimming, meshing, cutting and the pipeline

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

// =============================================================================
// Re-exports
// =============================================================================

/// Meshes, polylines and bounding boxes.
pub use mesh_types as types;

/// STL export, report logging and artifact metadata.
pub use mesh_io as io;

/// Validation reports and repair passes.
pub use mesh_repair as repair;

/// Distance and containment queries.
pub use mesh_sdf as sdf;

/// Intersection curves and sheet cutting.
pub use mesh_boolean as boolean;

/// Thickening curve networks into meshes.
pub use mesh_from_curves as from_curves;

/// Lattice population, trimming, meshing and cutting.
pub use mesh_lattice as lattice;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for lattice generation.
///
/// # Usage
///
/// ```
/// use mesh::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{Aabb, Geometry, IndexedMesh, MeshBounds, Point3, PolyMesh, Polyline, Vector3};

    // Reports
    pub use mesh_repair::{MeshReport, validate_mesh};

    // Pipeline
    pub use mesh_lattice::{
        CutSurface, CutSurfaces, LatticeInput, PipelineOutput, PipelineParams, RawGeometry, UnitCell,
        run_pipeline,
    };
}

// =============================================================================
// Tests
// =============================================================================
