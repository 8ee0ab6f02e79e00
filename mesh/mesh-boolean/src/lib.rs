//! Intersection queries and sheet-cutter boolean difference.
//!
//! This crate provides the narrow boolean kernel the lattice pipeline calls:
//!
//! - [`Bvh`] - bounding volume hierarchy over the triangles of a mesh
//! - [`intersect_polyline_mesh`] - where a curve crosses a mesh surface
//! - [`intersect_meshes`] - curves along which two mesh surfaces cross
//! - [`difference_with_sheets`] - subtract the back sides of planar sheets
//!
//! # Sheet Cutting
//!
//! A cutter is an open, near-planar sheet. It removes material on its back
//! side and keeps the side its normal points into. Faces that lie in a
//! cutter's plane make the result ambiguous; by default they are reported
//! as [`BooleanError::CoplanarFaces`] so the caller can nudge the sheet
//! off the face and try again.
//!
//! ```
//! use mesh_types::{unit_cube, IndexedMesh, MeshBounds, Point3};
//! use mesh_boolean::{difference_with_sheets, BooleanConfig, BooleanError};
//!
//! let top = IndexedMesh::from_positions(
//!     &[
//!         Point3::new(-1.0, -1.0, 1.0),
//!         Point3::new(2.0, -1.0, 1.0),
//!         Point3::new(2.0, 2.0, 1.0),
//!         Point3::new(-1.0, 2.0, 1.0),
//!     ],
//!     &[[0, 2, 1], [0, 3, 2]],
//! );
//!
//! let result = difference_with_sheets(&unit_cube(), &[top], &BooleanConfig::default());
//! assert!(matches!(result, Err(BooleanError::CoplanarFaces { .. })));
//! ```
//!
//! # Presets
//!
//! | Preset | Use Case | Tolerances |
//! |--------|----------|------------|
//! | `default()` | General purpose | Balanced |
//! | `for_scans()` | Noisy geometry | Loose |
//! | `for_cad()` | Exact geometry | Tight |

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
// Single-letter names are standard in geometry code.
#![allow(clippy::many_single_char_names)]
#![allow(clippy::suboptimal_flops)]

pub mod bvh;
pub mod config;
mod curves;
mod cut;
pub mod error;
pub mod intersect;

pub use bvh::{Bvh, BvhNode};
pub use config::{BooleanConfig, CoplanarStrategy};
pub use curves::{CurveHit, chain_segments, intersect_meshes, intersect_polyline_mesh};
pub use cut::difference_with_sheets;
pub use error::{BooleanError, BooleanResult};
pub use intersect::{Plane, SegmentHit, segment_triangle_intersect, triangle_triangle_segment};
