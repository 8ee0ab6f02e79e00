//! Thicken curve networks into closed volumetric meshes.
//!
//! A lattice is a network of centre-line curves. This crate turns such a
//! network into a printable solid by sampling the distance to the curves
//! on a regular grid and extracting the surface at the strut radius.
//!
//! # Features
//!
//! - **Thickening**: [`thicken_curves`] gives a closed quad mesh around
//!   every curve, joined smoothly where struts meet
//! - **Sampling control**: [`VolumeSettings`] sets grid spacing, padding
//!   and the extraction level
//! - **Curve stations**: [`segment_points`] samples curves at a spacing
//!   tied to the strut radius
//!
//! # Quick Start
//!
//! ```
//! use mesh_from_curves::{thicken_curves, VolumeSettings};
//! use mesh_types::{Point3, Polyline};
//!
//! let a = Polyline::from_segment(Point3::origin(), Point3::new(2.0, 0.0, 0.0));
//! let b = Polyline::from_segment(Point3::origin(), Point3::new(0.0, 2.0, 0.0));
//!
//! let mesh = thicken_curves(&[a, b], 0.3, &VolumeSettings::for_radius(0.3)).unwrap();
//! assert!(!mesh.is_empty());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod field;
mod grid;
mod nets;
mod thicken;

pub use error::{CurveError, CurveResult};
pub use field::CapsuleField;
pub use grid::ScalarGrid;
pub use nets::surface_nets;
pub use thicken::{VolumeSettings, segment_points, thicken_curves};
