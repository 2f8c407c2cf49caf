//! Hides faces inside a tile and copies the touched tile pixels back into
//! the equirectangular frame.

use crate::blurring::domain::face_obscurer::FaceObscurer;
use crate::detection::domain::window::Face;
use crate::imaging::affine::{square_from_corners, warp_affine_inverse_into};
use crate::imaging::remap::{remap_into, BorderMode, SampleMap};
use crate::imaging::transform::{crop, paste};
use crate::projection::domain::sphere_sampler::SphereSampler;
use crate::shared::frame::Frame;
use crate::shared::geometry::{clamp, rotate_point_f};
use crate::shared::rect::Rect;

/// Obscure one face in `tile` in place and return the tile region that
/// changed, or `None` when the face covers no pixels.
pub fn obscure_face(tile: &mut Frame, face: &Face, obscurer: &dyn FaceObscurer) -> Option<Rect> {
    let pad = face.size as f64 / 4.0;
    let x1 = face.x as f64 - pad;
    let y1 = face.y as f64 - pad;
    let x2 = (face.x + face.size) as f64 + pad - 1.0;
    let y2 = (face.y + face.size) as f64 + pad - 1.0;
    let (cx, cy) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    let angle = face.angle as f64;
    let corners = [
        rotate_point_f(x1, y1, cx, cy, angle),
        rotate_point_f(x1, y2, cx, cy, angle),
        rotate_point_f(x2, y2, cx, cy, angle),
        rotate_point_f(x2, y1, cx, cy, angle),
    ];

    let (tw, th) = (tile.width() as i32, tile.height() as i32);
    let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min).floor() as i32;
    let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max).ceil() as i32;
    let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min).floor() as i32;
    let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max).ceil() as i32;
    let roi = Rect::from_corners(
        clamp(min_x, 0, tw - 1),
        clamp(min_y, 0, th - 1),
        clamp(max_x, 0, tw - 1),
        clamp(max_y, 0, th - 1),
    );
    if roi.is_empty() {
        log::warn!("skipping face at ({}, {}) with an empty region", face.x, face.y);
        return None;
    }

    let size = (face.size as f64 * 1.5).ceil() as usize;
    let local = corners.map(|(x, y)| (x - roi.x as f64, y - roi.y as f64));
    let to_square = square_from_corners(&local, size)?;

    let mut region = crop(tile, roi);
    let patch = obscurer.render(&region, &to_square, size)?;
    warp_affine_inverse_into(&patch, &to_square, &mut region, BorderMode::Transparent);
    paste(tile, &region, roi.x, roi.y);
    Some(roi)
}

/// Frame rectangles covering the source footprint of a tile region.
///
/// The footprint is bounded by the forward-mapped corners of `roi`. When it
/// crosses the right edge of the frame (`min_x > max_x`) or the bottom edge
/// (`min_y > max_y`) it is split at that edge, giving two or four
/// rectangles. Rectangles are clamped to the frame and empty ones dropped.
pub fn footprint_rects(forward: &SampleMap, roi: Rect, frame_width: u32, frame_height: u32) -> Vec<Rect> {
    let lookup = |x: i32, y: i32| {
        let mx = clamp(x, 0, forward.width() as i32 - 1) as usize;
        let my = clamp(y, 0, forward.height() as i32 - 1) as usize;
        let [sx, sy] = forward.get(mx, my);
        (sx as f64, sy as f64)
    };
    let c0 = lookup(roi.x, roi.y);
    let c1 = lookup(roi.x, roi.bottom());
    let c2 = lookup(roi.right(), roi.bottom());
    let c3 = lookup(roi.right(), roi.y);

    let min_x = c0.0.min(c1.0).floor() as i32;
    let max_x = c2.0.max(c3.0).ceil() as i32;
    let min_y = c0.1.min(c3.1).floor() as i32;
    let max_y = c1.1.max(c2.1).ceil() as i32;
    split_at_edges(min_x, max_x, min_y, max_y, frame_width as i32, frame_height as i32)
        .into_iter()
        .map(|r| r.clamp_to(frame_width, frame_height))
        .filter(|r| !r.is_empty())
        .collect()
}

fn split_at_edges(min_x: i32, max_x: i32, min_y: i32, max_y: i32, width: i32, height: i32) -> Vec<Rect> {
    let crosses_right = min_x > max_x;
    let crosses_bottom = min_y > max_y;
    match (crosses_right, crosses_bottom) {
        (true, true) => vec![
            Rect::from_corners(min_x, min_y, width, height),
            Rect::from_corners(0, min_y, max_x, height),
            Rect::from_corners(min_x, 0, width, max_y),
            Rect::from_corners(0, 0, max_x, max_y),
        ],
        (true, false) => vec![
            Rect::from_corners(min_x, min_y, width, max_y),
            Rect::from_corners(0, min_y, max_x, max_y),
        ],
        (false, true) => vec![
            Rect::from_corners(min_x, min_y, max_x, height),
            Rect::from_corners(min_x, 0, max_x, max_y),
        ],
        (false, false) => vec![Rect::from_corners(min_x, min_y, max_x, max_y)],
    }
}

/// Copy every obscured tile region back into `frame` through the inverse
/// projection. Only frame pixels whose tile coordinate falls inside one of
/// `regions` are written. Returns the number of pixels written.
pub fn project_to_frame(
    sampler: &SphereSampler,
    forward: &SampleMap,
    tile: &Frame,
    regions: &[Rect],
    frame: &mut Frame,
) -> usize {
    let (width, height) = (frame.width(), frame.height());
    let mut written = 0;
    for roi in regions {
        for rect in footprint_rects(forward, *roi, width, height) {
            let map = sampler.inverse_map(rect);
            written += remap_into(tile, &map, frame, rect, |tx, ty| roi.contains(tx, ty));
        }
    }
    written
}
