//! Core geometry types for lattice generation.
//!
//! This crate provides the foundational types every other layer shares:
//!
//! - [`Vertex`] - A point in 3D space with an optional normal
//! - [`IndexedMesh`] - A triangle mesh with indexed vertices
//! - [`PolyMesh`] / [`Face`] - A mesh whose faces may be triangles or quads
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Polyline`] - A piecewise linear curve with a vertex-index parameter domain
//! - [`Geometry`] - Either a curve or a mesh
//! - [`Aabb`] - Axis-aligned bounding box
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64` in
//! whatever document unit the caller works in; tolerances elsewhere in
//! the workspace are expressed in the same unit.
//!
//! # Coordinate System
//!
//! Right-handed, Z up. Face winding is **counter-clockwise (CCW) when
//! viewed from outside**, so normals point outward by the right-hand rule
//! and closed meshes have positive signed volume.
//!
//! # Example
//!
//! ```
//! use mesh_types::{unit_cube, MeshBounds, Point3};
//!
//! let cube = unit_cube();
//! assert_eq!(cube.face_count(), 12);
//! assert_eq!(cube.bounds().max, Point3::new(1.0, 1.0, 1.0));
//! assert!((cube.signed_volume() - 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod geometry;
mod mesh;
mod poly;
mod polyline;
mod traits;
mod triangle;
mod vertex;

pub use bounds::Aabb;
pub use geometry::{Geometry, union_bounds};
pub use mesh::{IndexedMesh, unit_cube};
pub use poly::{Face, PolyMesh};
pub use polyline::{CLOSURE_TOLERANCE, Polyline};
pub use traits::{MapPoints, MeshBounds};
pub use triangle::Triangle;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
