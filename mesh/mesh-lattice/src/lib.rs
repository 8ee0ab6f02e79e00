//! Unit-cell lattice generation inside an arbitrary solid.
//!
//! This crate fills a primitive solid with a repeating strut pattern and
//! turns the result into a closed, printable mesh:
//!
//! - **Mapping**: [`BoxMap`] scales and translates geometry from the
//!   unit-cell frame into each voxel
//! - **Population**: [`populate`] maps a [`UnitCell`] into every voxel of
//!   a list in parallel, keeping results aligned with the voxels
//! - **Trimming**: [`trim_curve`] and [`trim_all`] keep only the parts of
//!   curves inside the primitive
//! - **Meshing**: [`build_lattice_mesh`] thickens the curves, and
//!   [`repair_lattice_mesh`] cleans the result and reports on it
//! - **Cutting**: [`cut_with_retry`] cuts the mesh with planar surfaces,
//!   retrying with offset surfaces when a cut collapses
//! - **Primitive**: [`prepare_primitive`] cleans the input solid and
//!   derives its trim surfaces, symmetry planes and octant
//!
//! [`run_pipeline`] chains every stage.
//!
//! # Quick Start
//!
//! ```
//! use mesh_lattice::{run_pipeline, CutSurfaces, LatticeInput, PipelineParams, RawGeometry, UnitCell};
//! use mesh_types::{Aabb, IndexedMesh, Point3, Polyline};
//!
//! // A cross of struts through the cell center.
//! let p = Point3::new;
//! let cell = UnitCell::new(
//!     vec![
//!         Polyline::from_segment(p(0.0, 0.5, 0.5), p(1.0, 0.5, 0.5)),
//!         Polyline::from_segment(p(0.5, 0.0, 0.5), p(0.5, 1.0, 0.5)),
//!         Polyline::from_segment(p(0.5, 0.5, 0.0), p(0.5, 0.5, 1.0)),
//!     ],
//!     Vec::new(),
//! )
//! .unwrap();
//!
//! let solid = IndexedMesh::cuboid(&Aabb::new(p(0.0, 0.0, 0.0), p(4.0, 4.0, 4.0)));
//! let voxels = vec![
//!     Aabb::new(p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0)),
//!     Aabb::new(p(2.0, 1.0, 1.0), p(3.0, 2.0, 2.0)),
//! ];
//! let input = LatticeInput::new(cell, voxels, Vec::new()).with_cut_surfaces(CutSurfaces::Primitive);
//!
//! let output = run_pipeline(RawGeometry::Mesh(solid), &input, &PipelineParams::new(0.15)).unwrap();
//! assert!(output.volume > 0.0);
//! assert!(output.cut_report.is_some());
//! ```
//!
//! # Errors and warnings
//!
//! Stage failures are returned as [`LatticeError`]. Failures of single
//! voxels are collected as [`VoxelError`]s next to the results, and
//! problems the pipeline recovered from are returned as
//! [`PipelineWarning`]s. Every stage always produces its
//! [`MeshReport`](mesh_repair::MeshReport), even for an invalid mesh.
//!
//! # Logging
//!
//! Stages log through `tracing`; install a subscriber to see them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod build;
mod cell;
mod cut;
mod error;
mod map;
mod pipeline;
mod populate;
mod primitive;
mod trim;

pub use build::{RepairedMesh, build_lattice_mesh, repair_lattice_mesh};
pub use cell::{JOIN_TOLERANCE, UnitCell, join_curves};
pub use cut::{CutOutcome, CutParams, CutSurface, cut_with_retry};
pub use error::{LatticeError, LatticeResult, PipelineWarning, VoxelError};
pub use map::{BoxMap, DEGENERATE_EXTENT, map_geometry};
pub use pipeline::{CutSurfaces, LatticeInput, PipelineOutput, PipelineParams, run_pipeline};
pub use populate::{
    MappedGeometry, PopulateContext, PopulateKind, PopulateParams, Population, UniformLattice,
    VoxelSet, populate, populate_uniform,
};
pub use primitive::{PreparedPrimitive, PrimitiveParams, RawGeometry, prepare_primitive};
pub use trim::{TrimBoundary, TrimOutput, TrimParams, TrimmedCurves, trim_all, trim_curve};

// Thickening settings travel with the pipeline parameters.
pub use mesh_from_curves::{VolumeSettings, segment_points};
