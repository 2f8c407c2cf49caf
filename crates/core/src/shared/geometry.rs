//! Small pure helpers shared by every detection and compositing stage.

use std::f64::consts::PI;

/// An integer pixel location (landmarks, rotated window corners).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Degrees to radians. Any finite input, no range folding.
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Clamp `value` into `[lo, hi]`. `hi < lo` yields `lo`.
pub fn clamp<T: PartialOrd>(value: T, lo: T, hi: T) -> T {
    if value < lo {
        lo
    } else if value > hi {
        if hi < lo {
            lo
        } else {
            hi
        }
    } else {
        value
    }
}

/// Rotate `(x, y)` about `(cx, cy)` by `-angle_deg`, rounding to the
/// nearest pixel. This is the face-window convention: a window with angle
/// `a` has its corners at the upright corners rotated by `-a`.
pub fn rotate_point(x: f64, y: f64, cx: f64, cy: f64, angle_deg: f64) -> Point {
    let (rx, ry) = rotate_point_f(x, y, cx, cy, angle_deg);
    Point::new(rx.round() as i32, ry.round() as i32)
}

/// Sub-pixel variant of [`rotate_point`].
pub fn rotate_point_f(x: f64, y: f64, cx: f64, cy: f64, angle_deg: f64) -> (f64, f64) {
    let dx = x - cx;
    let dy = y - cy;
    let theta = -deg_to_rad(angle_deg);
    let (sin, cos) = theta.sin_cos();
    (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
}

/// Corners of the square `[x1, x2] × [y1, y2]` rotated by `-angle_deg`
/// about its centre, in the order top-left, bottom-left, bottom-right,
/// top-right of the unrotated square.
pub fn rotated_quad(x1: f64, y1: f64, x2: f64, y2: f64, angle_deg: f64) -> [Point; 4] {
    let cx = (x1 + x2) / 2.0;
    let cy = (y1 + y2) / 2.0;
    [
        rotate_point(x1, y1, cx, cy, angle_deg),
        rotate_point(x1, y2, cx, cy, angle_deg),
        rotate_point(x2, y2, cx, cy, angle_deg),
        rotate_point(x2, y1, cx, cy, angle_deg),
    ]
}

/// Shortest-arc midpoint of two angles on a 360° circle.
///
/// Order independent. The result is not folded into `[0, 360)`:
/// `smooth_angle(350.0, 10.0)` is `360.0`.
pub fn smooth_angle(a: f64, b: f64) -> f64 {
    let (a, b) = if a > b { (b, a) } else { (a, b) };
    let diff = (b - a) % 360.0;
    if diff < 180.0 {
        a + diff / 2.0
    } else {
        b + (360.0 - diff) / 2.0
    }
}

/// True when `(x, y)` is a pixel of a `width` × `height` image.
pub fn is_legal(x: i32, y: i32, width: usize, height: usize) -> bool {
    x >= 0 && y >= 0 && (x as i64) < width as i64 && (y as i64) < height as i64
}
