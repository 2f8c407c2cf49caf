use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// How samples that fall outside the source image are resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BorderMode {
    /// Out-of-range neighbours read as this BGR colour.
    Constant([u8; 3]),
    /// Coordinates wrap around both axes (equirectangular seams).
    Wrap,
    /// Destination pixels whose sample falls outside the source are left untouched.
    Transparent,
}

/// Per-pixel sub-pixel source coordinates for a `width` × `height` destination.
#[derive(Clone, Debug)]
pub struct SampleMap {
    width: usize,
    height: usize,
    coords: Vec<[f32; 2]>,
}

impl SampleMap {
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> [f32; 2]) -> Self {
        let mut coords = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                coords.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            coords,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Source coordinate for destination pixel `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> [f32; 2] {
        self.coords[y * self.width + x]
    }
}

/// Bilinearly sample a 3-channel frame at `(x, y)`.
///
/// Returns `None` for transparent borders outside the image and for
/// non-finite coordinates.
pub fn sample_bilinear(src: &Frame, x: f64, y: f64, border: BorderMode) -> Option<[u8; 3]> {
    debug_assert_eq!(src.channels(), 3);
    if src.is_empty() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    let w = src.width() as i64;
    let h = src.height() as i64;
    if border == BorderMode::Transparent
        && (x < 0.0 || y < 0.0 || x > (w - 1) as f64 || y > (h - 1) as f64)
    {
        return None;
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let taps = [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ];
    let mut acc = [0.0f64; 3];
    for (dx, dy, weight) in taps {
        if weight == 0.0 {
            continue;
        }
        let px = fetch(src, x0 + dx, y0 + dy, border);
        for c in 0..3 {
            acc[c] += px[c] as f64 * weight;
        }
    }
    Some(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

fn fetch(src: &Frame, x: i64, y: i64, border: BorderMode) -> [u8; 3] {
    let w = src.width() as i64;
    let h = src.height() as i64;
    let (sx, sy) = match border {
        BorderMode::Wrap => (x.rem_euclid(w), y.rem_euclid(h)),
        BorderMode::Constant(colour) => {
            if x < 0 || y < 0 || x >= w || y >= h {
                return colour;
            }
            (x, y)
        }
        BorderMode::Transparent => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
    };
    let p = src.pixel(sx as usize, sy as usize);
    [p[0], p[1], p[2]]
}

/// Build a new frame the size of `map`, sampling `src` at each mapped coordinate.
///
/// Pixels skipped by a transparent border stay black.
pub fn remap(src: &Frame, map: &SampleMap, border: BorderMode) -> Frame {
    let mut dst = Frame::filled(map.width() as u32, map.height() as u32, [0, 0, 0]);
    for y in 0..map.height() {
        for x in 0..map.width() {
            let [sx, sy] = map.get(x, y);
            if let Some(px) = sample_bilinear(src, sx as f64, sy as f64, border) {
                dst.pixel_mut(x, y).copy_from_slice(&px);
            }
        }
    }
    dst
}

/// Remap `src` into the `target` rectangle of `dst` in place, with a
/// transparent border. `map` must be `target`-sized; only pixels whose
/// source coordinate satisfies `accept` are written.
pub fn remap_into(
    src: &Frame,
    map: &SampleMap,
    dst: &mut Frame,
    target: Rect,
    accept: impl Fn(f64, f64) -> bool,
) -> usize {
    debug_assert_eq!(map.width(), target.width.max(0) as usize);
    debug_assert_eq!(map.height(), target.height.max(0) as usize);
    let mut written = 0;
    for y in 0..map.height() {
        for x in 0..map.width() {
            let [sx, sy] = map.get(x, y);
            let (sx, sy) = (sx as f64, sy as f64);
            if !accept(sx, sy) {
                continue;
            }
            if let Some(px) = sample_bilinear(src, sx, sy, BorderMode::Transparent) {
                let dx = (target.x as usize) + x;
                let dy = (target.y as usize) + y;
                dst.pixel_mut(dx, dy).copy_from_slice(&px);
                written += 1;
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gradient(width: u32, height: u32) -> Frame {
        let mut frame = Frame::filled(width, height, [0, 0, 0]);
        for y in 0..height as usize {
            for x in 0..width as usize {
                frame
                    .pixel_mut(x, y)
                    .copy_from_slice(&[(x * 10) as u8, (y * 10) as u8, 7]);
            }
        }
        frame
    }

    #[test]
    fn test_integer_coordinates_return_exact_pixel() {
        let frame = gradient(4, 3);
        assert_eq!(
            sample_bilinear(&frame, 2.0, 1.0, BorderMode::Transparent),
            Some([20, 10, 7])
        );
    }

    #[test]
    fn test_half_pixel_interpolates() {
        let frame = gradient(4, 3);
        assert_eq!(
            sample_bilinear(&frame, 1.5, 0.5, BorderMode::Transparent),
            Some([15, 5, 7])
        );
    }

    #[rstest]
    #[case::left(-0.5, 1.0)]
    #[case::right(3.5, 1.0)]
    #[case::below(1.0, 2.01)]
    fn test_transparent_outside_is_none(#[case] x: f64, #[case] y: f64) {
        let frame = gradient(4, 3);
        assert!(sample_bilinear(&frame, x, y, BorderMode::Transparent).is_none());
    }

    #[test]
    fn test_wrap_reads_opposite_edge() {
        let frame = gradient(4, 3);
        assert_eq!(
            sample_bilinear(&frame, -1.0, 0.0, BorderMode::Wrap),
            Some([30, 0, 7])
        );
        assert_eq!(
            sample_bilinear(&frame, 4.0, 3.0, BorderMode::Wrap),
            Some([0, 0, 7])
        );
    }

    #[test]
    fn test_constant_border_blends_colour() {
        let frame = Frame::filled(2, 2, [100, 100, 100]);
        assert_eq!(
            sample_bilinear(&frame, -0.5, 0.0, BorderMode::Constant([0, 0, 0])),
            Some([50, 50, 50])
        );
    }

    #[test]
    fn test_non_finite_coordinates_are_skipped() {
        let frame = gradient(4, 3);
        assert!(sample_bilinear(&frame, f64::NAN, 0.0, BorderMode::Wrap).is_none());
    }

    #[test]
    fn test_remap_identity() {
        let frame = gradient(5, 4);
        let map = SampleMap::from_fn(5, 4, |x, y| [x as f32, y as f32]);
        let out = remap(&frame, &map, BorderMode::Wrap);
        assert_eq!(out.data(), frame.data());
    }

    #[test]
    fn test_remap_into_respects_target_and_filter() {
        let src = Frame::filled(4, 4, [200, 200, 200]);
        let mut dst = Frame::filled(6, 6, [0, 0, 0]);
        let target = Rect::new(1, 2, 3, 2);
        let map = SampleMap::from_fn(3, 2, |x, y| [x as f32, y as f32]);
        let written = remap_into(&src, &map, &mut dst, target, |sx, _| sx < 2.0);
        assert_eq!(written, 4);
        assert_eq!(dst.pixel(1, 2), &[200, 200, 200]);
        assert_eq!(dst.pixel(2, 3), &[200, 200, 200]);
        assert_eq!(dst.pixel(3, 2), &[0, 0, 0]); // rejected by the filter
        assert_eq!(dst.pixel(0, 0), &[0, 0, 0]);
    }
}
