//! Distance and containment queries against closed triangle meshes.
//!
//! Trimming decides which curve pieces lie inside a primitive, and the
//! boolean cutter needs to know which side of a surface a point falls on.
//! Both reduce to the queries here.
//!
//! # Example
//!
//! ```
//! use mesh_types::{unit_cube, Point3};
//! use mesh_sdf::SignedDistanceField;
//!
//! let sdf = SignedDistanceField::new(unit_cube()).unwrap();
//!
//! let inside = sdf.distance(Point3::new(0.5, 0.5, 0.5));
//! let outside = sdf.distance(Point3::new(0.5, 0.5, 5.0));
//! assert!(inside < 0.0 && outside > 0.0);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod field;
mod query;

pub use error::{SdfError, SdfResult};
pub use field::{SignedDistanceField, point_in_mesh, signed_distance};
pub use query::{
    aabb_distance_squared, closest_point_on_triangle, point_segment_distance_squared,
    ray_hits_aabb, ray_triangle_intersect,
};
