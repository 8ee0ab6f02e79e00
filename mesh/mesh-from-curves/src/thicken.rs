//! Curve network to closed volumetric mesh.

use mesh_types::{Point3, PolyMesh, Polyline};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{CurveError, CurveResult};
use crate::field::CapsuleField;
use crate::grid::ScalarGrid;
use crate::nets::surface_nets;

/// Sampling settings for thickening.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeSettings {
    /// Grid spacing in document units.
    pub voxel_size: f64,
    /// Empty grid cells kept around the thickened network.
    pub padding: usize,
    /// Level at which the surface is extracted, as a distance from the
    /// nominal capsule surface. Positive values grow the struts.
    pub iso_level: f64,
    /// Largest grid, in sample points, that will be allocated.
    pub max_grid_points: usize,
    /// Sample the field on the rayon pool.
    pub parallel: bool,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            voxel_size: 0.25,
            padding: 2,
            iso_level: 0.0,
            max_grid_points: 64_000_000,
            parallel: true,
        }
    }
}

impl VolumeSettings {
    /// Quick preview quality.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            voxel_size: 0.5,
            ..Self::default()
        }
    }

    /// Smooth output at higher cost.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            voxel_size: 0.1,
            padding: 3,
            ..Self::default()
        }
    }

    /// Spacing that puts four samples across a strut of `radius`.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_from_curves::VolumeSettings;
    ///
    /// let settings = VolumeSettings::for_radius(0.8);
    /// assert!((settings.voxel_size - 0.4).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn for_radius(radius: f64) -> Self {
        Self {
            voxel_size: radius * 0.5,
            ..Self::default()
        }
    }

    /// Set the grid spacing.
    #[must_use]
    pub const fn with_voxel_size(mut self, voxel_size: f64) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    /// Set the iso level.
    #[must_use]
    pub const fn with_iso_level(mut self, iso_level: f64) -> Self {
        self.iso_level = iso_level;
        self
    }

    /// Set the grid size limit.
    #[must_use]
    pub const fn with_max_grid_points(mut self, max_grid_points: usize) -> Self {
        self.max_grid_points = max_grid_points;
        self
    }

    /// Enable or disable rayon.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn validate(&self) -> CurveResult<()> {
        if !(self.voxel_size > 0.0 && self.voxel_size.is_finite()) {
            return Err(CurveError::InvalidSettings {
                reason: format!("voxel size must be positive, got {}", self.voxel_size),
            });
        }
        if !self.iso_level.is_finite() {
            return Err(CurveError::InvalidSettings {
                reason: format!("iso level must be finite, got {}", self.iso_level),
            });
        }
        Ok(())
    }
}

/// Thicken a curve network by `radius` into a closed quad mesh.
///
/// The union of capsules around every curve segment is sampled on a grid
/// and its surface extracted with surface nets. Faces come out as quads,
/// wound outward.
///
/// A network too thin for the grid to resolve yields an empty mesh rather
/// than an error, so the caller's report can say so.
///
/// # Errors
///
/// - [`CurveError::InvalidRadius`] for a radius that is not positive and finite.
/// - [`CurveError::NoCurves`] when no curve has any points.
/// - [`CurveError::NonFiniteCurve`] for NaN or infinite coordinates.
/// - [`CurveError::InvalidSettings`] / [`CurveError::GridTooLarge`] for
///   settings that cannot be sampled.
///
/// # Example
///
/// ```
/// use mesh_from_curves::{thicken_curves, VolumeSettings};
/// use mesh_types::{Point3, Polyline};
///
/// let strut = Polyline::from_segment(Point3::origin(), Point3::new(4.0, 0.0, 0.0));
/// let mesh = thicken_curves(&[strut], 0.5, &VolumeSettings::for_radius(0.5)).unwrap();
/// assert!(mesh.quad_count() > 0);
/// assert!(mesh.signed_volume() > 0.0);
/// ```
pub fn thicken_curves(
    curves: &[Polyline],
    radius: f64,
    settings: &VolumeSettings,
) -> CurveResult<PolyMesh> {
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(CurveError::InvalidRadius(radius));
    }
    settings.validate()?;
    if curves.iter().all(Polyline::is_empty) {
        return Err(CurveError::NoCurves);
    }
    if let Some(index) = curves
        .iter()
        .position(|c| c.points().iter().any(|p| !p.coords.iter().all(|x| x.is_finite())))
    {
        return Err(CurveError::NonFiniteCurve { index });
    }

    let reach = 2.0 * settings.voxel_size + settings.iso_level.max(0.0);
    let field = CapsuleField::new(curves, radius, reach);
    let bounds = field.bounds().expanded(settings.iso_level.max(0.0));

    // one extra cell keeps the surface off the outermost samples
    let padding = settings.padding + 1;
    let cells = ScalarGrid::point_count(&bounds, settings.voxel_size, padding);
    if cells > settings.max_grid_points {
        return Err(CurveError::GridTooLarge {
            cells,
            limit: settings.max_grid_points,
        });
    }

    let mut grid = ScalarGrid::covering(&bounds, settings.voxel_size, padding);
    debug!(
        segments = field.segment_count(),
        grid = ?grid.dims(),
        "sampling capsule field"
    );
    grid.sample(|p| field.value(p), settings.parallel);

    let mesh = surface_nets(&grid, settings.iso_level);
    if mesh.is_empty() {
        warn!(radius, voxel_size = settings.voxel_size, "thickening produced no faces");
    } else {
        info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "thickened curve network"
        );
    }
    Ok(mesh)
}

/// Sample every curve at spacing `radius / 5`.
///
/// Each entry holds the curve's start point, its interior division points
/// and its end point, in order. Empty curves give empty entries.
///
/// # Example
///
/// ```
/// use mesh_from_curves::segment_points;
/// use mesh_types::{Point3, Polyline};
///
/// let line = Polyline::from_segment(Point3::origin(), Point3::new(1.0, 0.0, 0.0));
/// let points = segment_points(&[line], 1.0);
/// assert_eq!(points[0].len(), 6);
/// ```
#[must_use]
pub fn segment_points(curves: &[Polyline], radius: f64) -> Vec<Vec<Point3<f64>>> {
    let step = radius / 5.0;
    curves
        .par_iter()
        .map(|curve| {
            let (Some(start), Some(end)) = (curve.start(), curve.end()) else {
                return Vec::new();
            };
            let mut points = vec![start];
            points.extend(curve.divide_by_length(step));
            points.push(end);
            points
        })
        .collect()
}
