//! Error types for mesh-from-curves operations.

use thiserror::Error;

/// Result type for mesh-from-curves operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Errors that can occur while thickening curves.
#[derive(Debug, Error)]
pub enum CurveError {
    /// None of the curves has any points.
    #[error("no curves to thicken")]
    NoCurves,

    /// Radius is zero, negative or not finite.
    #[error("invalid radius: {0}")]
    InvalidRadius(f64),

    /// Volume settings cannot produce a grid.
    #[error("invalid volume settings: {reason}")]
    InvalidSettings {
        /// What is wrong with the settings.
        reason: String,
    },

    /// The sampling grid would exceed the configured cell limit.
    #[error("sampling grid needs {cells} points, limit is {limit}")]
    GridTooLarge {
        /// Grid points required.
        cells: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A curve contains a non-finite coordinate.
    #[error("curve {index} has non-finite coordinates")]
    NonFiniteCurve {
        /// Index of the curve.
        index: usize,
    },
}
