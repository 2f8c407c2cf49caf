use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::EPS;

#[derive(Error, Debug, PartialEq)]
pub enum LayoutError {
    #[error("{axis} aperture must be in (0, {max}] radians (got {value})")]
    Aperture {
        axis: &'static str,
        max: f64,
        value: f64,
    },
    #[error("{axis} step must be positive (got {value})")]
    Step { axis: &'static str, value: f64 },
}

/// Pointing direction of one virtual camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileOrientation {
    /// First rotation, about the polar axis, radians in `[-π/2, π/2]`.
    pub phi: f64,
    /// Second rotation, about the horizontal y axis, radians in `[0, 2π)`.
    pub lambda: f64,
}

/// How the sphere is swept with overlapping virtual camera tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayout {
    /// Horizontal field of view of each tile, radians.
    pub aperture_x: f64,
    /// Vertical field of view of each tile, radians.
    pub aperture_y: f64,
    /// Increment of `lambda` between neighbouring tiles, radians.
    pub step_x: f64,
    /// Increment of `phi` between tile rows, radians.
    pub step_y: f64,
}

impl Default for TileLayout {
    fn default() -> Self {
        Self {
            aperture_x: FRAC_PI_2,
            aperture_y: FRAC_PI_2,
            step_x: FRAC_PI_4,
            step_y: FRAC_PI_4,
        }
    }
}

impl TileLayout {
    pub fn validate(&self) -> Result<(), LayoutError> {
        for (axis, value, max) in [("horizontal", self.aperture_x, TAU), ("vertical", self.aperture_y, PI)] {
            if !value.is_finite() || value <= 0.0 || value > max {
                return Err(LayoutError::Aperture { axis, max, value });
            }
        }
        for (axis, value) in [("horizontal", self.step_x), ("vertical", self.step_y)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::Step { axis, value });
            }
        }
        Ok(())
    }

    /// Tile size in pixels for a `width` × `height` equirectangular frame.
    pub fn tile_size(&self, width: u32, height: u32) -> (usize, usize) {
        let w = (width as f64 * self.aperture_x / TAU).round() as usize;
        let h = (height as f64 * self.aperture_y / PI).round() as usize;
        (w, h)
    }

    /// Every tile orientation, `phi` rows outermost.
    ///
    /// Rows take `phi = k · step_y` for `k < ⌊π / step_y⌋`, folding values
    /// past π/2 down by π. Within a row `lambda` starts at 0 and advances by
    /// `step_x` while below 2π.
    pub fn orientations(&self) -> Vec<TileOrientation> {
        let rows = (PI / self.step_y + EPS).floor() as usize;
        let cols = (0..)
            .map(|i| i as f64 * self.step_x)
            .take_while(|lambda| *lambda < TAU - EPS)
            .count();

        let mut out = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            let tilt = row as f64 * self.step_y;
            let phi = if tilt <= FRAC_PI_2 + EPS { tilt } else { tilt - PI };
            for col in 0..cols {
                out.push(TileOrientation {
                    phi,
                    lambda: col as f64 * self.step_x,
                });
            }
        }
        out
    }
}
