use crate::shared::constants::EPS;

/// The four discrete orientations a candidate window can carry between
/// cascade stages. Each selects a pre-rotated copy of the padded tile so
/// the network always sees an upright crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// 0°: the padded tile itself.
    Upright,
    /// 90°: the transposed tile.
    Rotated90,
    /// -90°: the transposed tile, flipped vertically.
    RotatedNeg90,
    /// 180°: the tile flipped vertically. Also the fallback for any other angle.
    Inverted,
}

impl Orientation {
    pub fn classify(angle: f64) -> Self {
        if angle.abs() < EPS {
            Orientation::Upright
        } else if (angle - 90.0).abs() < EPS {
            Orientation::Rotated90
        } else if (angle + 90.0).abs() < EPS {
            Orientation::RotatedNeg90
        } else {
            Orientation::Inverted
        }
    }

    /// Size of the oriented image for a `width` × `height` padded tile.
    pub fn oriented_size(self, width: usize, height: usize) -> (usize, usize) {
        match self {
            Orientation::Upright | Orientation::Inverted => (width, height),
            Orientation::Rotated90 | Orientation::RotatedNeg90 => (height, width),
        }
    }

    /// Top-left of a `size` window in the oriented image, given its
    /// top-left in the padded tile.
    pub fn to_oriented(self, x: i32, y: i32, size: i32, width: i32, height: i32) -> (i32, i32) {
        match self {
            Orientation::Upright => (x, y),
            Orientation::Inverted => (x, height - y - size),
            Orientation::Rotated90 => (y, x),
            Orientation::RotatedNeg90 => (y, width - x - size),
        }
    }

    /// Inverse of [`Orientation::to_oriented`].
    pub fn from_oriented(self, x: i32, y: i32, size: i32, width: i32, height: i32) -> (i32, i32) {
        match self {
            Orientation::Upright => (x, y),
            Orientation::Inverted => (x, height - y - size),
            Orientation::Rotated90 => (y, x),
            Orientation::RotatedNeg90 => (width - y - size, x),
        }
    }

    /// Combine a continuous correction measured in the oriented image with
    /// this discrete orientation.
    pub fn compose_angle(self, delta: f64) -> f64 {
        match self {
            Orientation::Upright => delta,
            Orientation::Inverted => 180.0 - delta,
            Orientation::Rotated90 => 90.0 - delta,
            Orientation::RotatedNeg90 => -90.0 + delta,
        }
    }

    /// Angle for the winning rotation bucket of the second stage:
    /// 0 is +90, 1 keeps the upright/inverted state, 2 is -90.
    pub fn coarse_angle(self, bucket: usize) -> f64 {
        match bucket {
            0 => 90.0,
            2 => -90.0,
            _ if self == Orientation::Upright => 0.0,
            _ => 180.0,
        }
    }
}
