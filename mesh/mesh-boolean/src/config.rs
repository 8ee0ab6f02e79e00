//! Configuration and presets for boolean operations.
//!
//! # Presets
//!
//! - [`BooleanConfig::default()`] - Balanced settings for general use
//! - [`BooleanConfig::for_scans()`] - Looser tolerances for noisy geometry
//! - [`BooleanConfig::for_cad()`] - Tighter tolerances for exact geometry
//!
//! # Example
//!
//! ```
//! use mesh_boolean::{BooleanConfig, CoplanarStrategy};
//!
//! let config = BooleanConfig::for_cad()
//!     .with_coplanar_strategy(CoplanarStrategy::KeepFront)
//!     .with_parallel(false);
//! assert!(!config.parallel);
//! ```

/// What to do when mesh faces lie in a cutter plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoplanarStrategy {
    /// Fail with [`BooleanError::CoplanarFaces`](crate::BooleanError::CoplanarFaces).
    /// Callers can then retry with the cutter nudged off the face.
    #[default]
    Reject,

    /// Treat coplanar faces as lying on the kept side.
    KeepFront,

    /// Keep coplanar faces that bound material on the kept side, that is
    /// faces whose normal opposes the cutter's, and drop the rest.
    ByOrientation,
}

/// Configuration for boolean operations.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BooleanConfig {
    /// Distance under which a face counts as lying in a cutter plane.
    pub coplanar_tolerance: f64,

    /// Vertices closer than this to a cutter plane are snapped onto it,
    /// so no sliver edges are created.
    pub edge_tolerance: f64,

    /// Tolerance used when merging intersection points and chaining
    /// intersection segments.
    pub vertex_weld_tolerance: f64,

    /// Strategy for faces in a cutter plane.
    pub coplanar_strategy: CoplanarStrategy,

    /// Whether to use parallel processing (via rayon).
    pub parallel: bool,

    /// Maximum triangles per BVH leaf.
    pub bvh_leaf_size: usize,
}

impl Default for BooleanConfig {
    fn default() -> Self {
        Self {
            coplanar_tolerance: 1e-6,
            edge_tolerance: 1e-8,
            vertex_weld_tolerance: 1e-6,
            coplanar_strategy: CoplanarStrategy::default(),
            parallel: true,
            bvh_leaf_size: 8,
        }
    }
}

impl BooleanConfig {
    /// Looser tolerances for noisy geometry.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_boolean::BooleanConfig;
    ///
    /// let config = BooleanConfig::for_scans();
    /// assert!(config.vertex_weld_tolerance > BooleanConfig::default().vertex_weld_tolerance);
    /// ```
    #[must_use]
    pub fn for_scans() -> Self {
        Self {
            coplanar_tolerance: 1e-4,
            edge_tolerance: 1e-6,
            vertex_weld_tolerance: 1e-4,
            ..Default::default()
        }
    }

    /// Tighter tolerances for exact geometry.
    #[must_use]
    pub fn for_cad() -> Self {
        Self {
            coplanar_tolerance: 1e-9,
            edge_tolerance: 1e-10,
            vertex_weld_tolerance: 1e-9,
            ..Default::default()
        }
    }

    /// Set the coplanar face strategy.
    #[must_use]
    pub const fn with_coplanar_strategy(mut self, strategy: CoplanarStrategy) -> Self {
        self.coplanar_strategy = strategy;
        self
    }

    /// Set the coplanarity distance.
    #[must_use]
    pub const fn with_coplanar_tolerance(mut self, tolerance: f64) -> Self {
        self.coplanar_tolerance = tolerance;
        self
    }

    /// Enable or disable rayon.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the weld tolerance for intersection points.
    #[must_use]
    pub const fn with_vertex_weld_tolerance(mut self, tolerance: f64) -> Self {
        self.vertex_weld_tolerance = tolerance;
        self
    }

    /// Set the maximum BVH leaf size (at least 1).
    #[must_use]
    pub fn with_bvh_leaf_size(mut self, size: usize) -> Self {
        self.bvh_leaf_size = size.max(1);
        self
    }
}
