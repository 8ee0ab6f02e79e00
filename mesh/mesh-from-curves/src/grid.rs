//! Regular grid of scalar samples.

use mesh_types::{Aabb, Point3};
use rayon::prelude::*;

/// Scalar samples on a regular grid, x varying fastest.
#[derive(Debug, Clone)]
pub struct ScalarGrid {
    values: Vec<f64>,
    dims: [usize; 3],
    origin: Point3<f64>,
    spacing: f64,
}

impl ScalarGrid {
    /// Grid of zeros covering `bounds` grown by `padding` cells per side.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_from_curves::ScalarGrid;
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let bounds = Aabb::new(Point3::origin(), Point3::new(1.0, 2.0, 0.0));
    /// let grid = ScalarGrid::covering(&bounds, 0.5, 1);
    /// assert_eq!(grid.dims(), [5, 7, 3]);
    /// ```
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn covering(bounds: &Aabb, spacing: f64, padding: usize) -> Self {
        let margin = padding as f64 * spacing;
        let origin = bounds.min - mesh_types::Vector3::repeat(margin);
        let size = bounds.size();
        let count = |extent: f64| ((extent + 2.0 * margin) / spacing).ceil() as usize + 1;
        let dims = [count(size.x), count(size.y), count(size.z)];
        Self {
            values: vec![0.0; dims[0] * dims[1] * dims[2]],
            dims,
            origin,
            spacing,
        }
    }

    /// Number of grid points needed to cover `bounds`; see [`covering`](Self::covering).
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn point_count(bounds: &Aabb, spacing: f64, padding: usize) -> usize {
        let margin = padding as f64 * spacing;
        let size = bounds.size();
        [size.x, size.y, size.z]
            .iter()
            .map(|e| ((e + 2.0 * margin) / spacing).ceil() as usize + 1)
            .fold(1usize, usize::saturating_mul)
    }

    /// Points per axis.
    #[must_use]
    pub const fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Position of grid point `0, 0, 0`.
    #[must_use]
    pub const fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Distance between neighbouring grid points.
    #[must_use]
    pub const fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Sample count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check for no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Linear index of grid point `[i, j, k]`.
    #[inline]
    #[must_use]
    pub const fn index(&self, [i, j, k]: [usize; 3]) -> usize {
        i + self.dims[0] * (j + self.dims[1] * k)
    }

    /// Sample at grid point `[i, j, k]`.
    ///
    /// # Panics
    ///
    /// Panics if the point is outside the grid.
    #[inline]
    #[must_use]
    pub fn value(&self, at: [usize; 3]) -> f64 {
        self.values[self.index(at)]
    }

    /// World position of grid point `[i, j, k]`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn position(&self, [i, j, k]: [usize; 3]) -> Point3<f64> {
        self.origin + mesh_types::Vector3::new(i as f64, j as f64, k as f64) * self.spacing
    }

    /// Fill every sample with `field` evaluated at its position.
    pub fn sample<F>(&mut self, field: F, parallel: bool)
    where
        F: Fn(&Point3<f64>) -> f64 + Sync,
    {
        let [nx, ny, _] = self.dims;
        let origin = self.origin;
        let spacing = self.spacing;
        #[allow(clippy::cast_precision_loss)]
        let at = |n: usize| {
            let (i, j, k) = (n % nx, (n / nx) % ny, n / (nx * ny));
            origin + mesh_types::Vector3::new(i as f64, j as f64, k as f64) * spacing
        };
        if parallel {
            self.values
                .par_iter_mut()
                .enumerate()
                .for_each(|(n, v)| *v = field(&at(n)));
        } else {
            for (n, v) in self.values.iter_mut().enumerate() {
                *v = field(&at(n));
            }
        }
    }
}
