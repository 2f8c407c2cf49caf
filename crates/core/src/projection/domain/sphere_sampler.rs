//! Mapping between a rectilinear virtual-camera tile and the
//! equirectangular frame it looks into.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Rotation3, Vector3};

use crate::imaging::remap::SampleMap;
use crate::shared::rect::Rect;

use super::tile_layout::{TileLayout, TileOrientation};

/// Unit vector for longitude `lon` and colatitude `colat`.
fn to_cartesian(colat: f64, lon: f64) -> Vector3<f64> {
    let (sin_u, cos_u) = colat.sin_cos();
    let (sin_v, cos_v) = lon.sin_cos();
    Vector3::new(-sin_u * cos_v, sin_u * sin_v, cos_u)
}

/// `(longitude in [0, 2π), colatitude in [0, π])` of a unit vector.
fn to_spherical(p: &Vector3<f64>) -> (f64, f64) {
    let mut lon = p.y.atan2(-p.x);
    if lon < 0.0 {
        lon += TAU;
    } else if lon >= TAU {
        lon -= TAU;
    }
    (lon, p.z.clamp(-1.0, 1.0).acos())
}

#[derive(Debug, Clone)]
pub struct SphereSampler {
    frame_width: u32,
    frame_height: u32,
    tile_width: usize,
    tile_height: usize,
    aperture_x: f64,
    aperture_y: f64,
    orientation: TileOrientation,
    rotation: Rotation3<f64>,
}

impl SphereSampler {
    pub fn new(frame_width: u32, frame_height: u32, layout: &TileLayout, orientation: TileOrientation) -> Self {
        let (tile_width, tile_height) = layout.tile_size(frame_width, frame_height);
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), orientation.lambda)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), orientation.phi);
        Self {
            frame_width,
            frame_height,
            tile_width,
            tile_height,
            aperture_x: layout.aperture_x,
            aperture_y: layout.aperture_y,
            orientation,
            rotation,
        }
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn tile_size(&self) -> (usize, usize) {
        (self.tile_width, self.tile_height)
    }

    pub fn orientation(&self) -> TileOrientation {
        self.orientation
    }

    /// Source-frame pixel seen by tile pixel `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        let x_h = x / (self.tile_width as f64 - 1.0) - 0.5;
        let y_h = y / (self.tile_height as f64 - 1.0) - 0.5;
        let lon = x_h * self.aperture_x + PI;
        let colat = y_h * self.aperture_y + FRAC_PI_2;

        let source = self.rotation * to_cartesian(colat, lon);
        let (lon, colat) = to_spherical(&source);
        (
            lon / TAU * self.frame_width as f64,
            colat / PI * self.frame_height as f64,
        )
    }

    /// Tile pixel that sees source-frame pixel `(x, y)`. Exact inverse of
    /// [`SphereSampler::sample`]; points behind the camera land far outside
    /// the tile.
    pub fn inverse_sample(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = x / self.frame_width as f64 * TAU;
        let colat = y / self.frame_height as f64 * PI;

        let target = self.rotation.inverse() * to_cartesian(colat, lon);
        let (lon, colat) = to_spherical(&target);
        let x_h = (lon - PI) / self.aperture_x;
        let y_h = (colat - FRAC_PI_2) / self.aperture_y;
        (
            (x_h + 0.5) * (self.tile_width as f64 - 1.0),
            (y_h + 0.5) * (self.tile_height as f64 - 1.0),
        )
    }

    /// Tile-sized map from every tile pixel to its source pixel.
    pub fn forward_map(&self) -> SampleMap {
        SampleMap::from_fn(self.tile_width, self.tile_height, |x, y| {
            let (sx, sy) = self.sample(x as f64, y as f64);
            [sx as f32, sy as f32]
        })
    }

    /// Map from every source pixel of `rect` to its tile coordinate.
    pub fn inverse_map(&self, rect: Rect) -> SampleMap {
        SampleMap::from_fn(rect.width.max(0) as usize, rect.height.max(0) as usize, |x, y| {
            let (tx, ty) = self.inverse_sample((rect.x + x as i32) as f64, (rect.y + y as i32) as f64);
            [tx as f32, ty as f32]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f64::consts::FRAC_PI_4;

    fn sampler(phi: f64, lambda: f64) -> SphereSampler {
        SphereSampler::new(720, 360, &TileLayout::default(), TileOrientation { phi, lambda })
    }

    #[test]
    fn test_unrotated_tile_centre_looks_at_frame_centre() {
        let s = sampler(0.0, 0.0);
        let (w, h) = s.tile_size();
        let (x, y) = s.sample((w - 1) as f64 / 2.0, (h - 1) as f64 / 2.0);
        assert_relative_eq!(x, 360.0, epsilon = 1e-6);
        assert_relative_eq!(y, 180.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unrotated_tile_spans_its_aperture() {
        // a 90° tile centred on the frame covers columns 270..450
        let s = sampler(0.0, 0.0);
        let (left, _) = s.sample(0.0, 89.5);
        let (right, _) = s.sample(179.0, 89.5);
        assert_relative_eq!(left, 270.0, epsilon = 1e-6);
        assert_relative_eq!(right, 450.0, epsilon = 1e-6);
    }

    #[test]
    fn test_phi_turns_the_view_about_the_polar_axis() {
        // the centre ray moves 45° of longitude, i.e. 90 source columns
        let (x, y) = sampler(FRAC_PI_4, 0.0).sample(89.5, 89.5);
        assert_relative_eq!(x, 270.0, epsilon = 1e-6);
        assert_relative_eq!(y, 180.0, epsilon = 1e-6);
    }

    #[test]
    fn test_lambda_swings_the_view_towards_a_pole() {
        // after a quarter-pi turn about y the centre ray sits at colatitude 135°
        let (x, y) = sampler(0.0, FRAC_PI_4).sample(89.5, 89.5);
        assert_relative_eq!(x, 360.0, epsilon = 1e-6);
        assert_relative_eq!(y, 270.0, epsilon = 1e-6);
    }

    #[rstest]
    #[case::equator(0.0, 0.0)]
    #[case::panned(0.0, 3.0 * FRAC_PI_4)]
    #[case::tilted_up(FRAC_PI_4, FRAC_PI_4)]
    #[case::tilted_down(-FRAC_PI_4, 5.0 * FRAC_PI_4)]
    #[case::pole(FRAC_PI_2, 0.0)]
    fn test_round_trip_within_a_pixel(#[case] phi: f64, #[case] lambda: f64) {
        let s = sampler(phi, lambda);
        for &(x, y) in &[(20.0, 30.0), (90.0, 90.0), (150.0, 40.0), (60.0, 170.0)] {
            let (sx, sy) = s.sample(x, y);
            let (bx, by) = s.inverse_sample(sx, sy);
            assert!((bx - x).abs() < 1.0 && (by - y).abs() < 1.0, "({x}, {y}) -> ({bx}, {by})");
        }
    }

    #[test]
    fn test_longitude_always_wrapped_into_frame() {
        let s = sampler(FRAC_PI_4, 7.0 * FRAC_PI_4);
        let map = s.forward_map();
        for y in (0..map.height()).step_by(7) {
            for x in (0..map.width()).step_by(7) {
                let [sx, sy] = map.get(x, y);
                assert!((0.0..=720.0).contains(&sx), "x {sx}");
                assert!((0.0..=360.0).contains(&sy), "y {sy}");
            }
        }
    }

    #[test]
    fn test_inverse_map_matches_pointwise_inverse() {
        let s = sampler(0.0, 0.0);
        let rect = Rect::new(300, 150, 20, 10);
        let map = s.inverse_map(rect);
        assert_eq!((map.width(), map.height()), (20, 10));
        let (tx, ty) = s.inverse_sample(305.0, 157.0);
        let [mx, my] = map.get(5, 7);
        assert_relative_eq!(mx as f64, tx, epsilon = 1e-3);
        assert_relative_eq!(my as f64, ty, epsilon = 1e-3);
    }
}
