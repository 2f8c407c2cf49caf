use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb, RgbImage};

use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

// `imageops` only sees the byte layout, so BGR frames pass through as `Rgb`.
fn view(frame: &Frame) -> Option<ImageBuffer<Rgb<u8>, &[u8]>> {
    if frame.channels() != 3 {
        return None;
    }
    ImageBuffer::from_raw(frame.width(), frame.height(), frame.data())
}

fn view_mut(frame: &mut Frame) -> Option<ImageBuffer<Rgb<u8>, &mut [u8]>> {
    if frame.channels() != 3 {
        return None;
    }
    let (width, height) = (frame.width(), frame.height());
    ImageBuffer::from_raw(width, height, frame.data_mut())
}

fn from_image(image: RgbImage, index: usize) -> Frame {
    let (width, height) = image.dimensions();
    Frame::new(image.into_raw(), width, height, 3, index)
}

/// Bilinear resize with replicated edges.
pub fn resize(src: &Frame, width: usize, height: usize) -> Frame {
    match view(src) {
        Some(image) if !src.is_empty() && width > 0 && height > 0 => from_image(
            imageops::resize(&image, width as u32, height as u32, FilterType::Triangle),
            src.index(),
        ),
        _ => Frame::filled(width as u32, height as u32, [0, 0, 0]),
    }
}

/// Resize by `1 / scale`, truncating the target size.
pub fn resize_by(src: &Frame, scale: f64) -> Frame {
    let width = (src.width() as f64 / scale) as usize;
    let height = (src.height() as f64 / scale) as usize;
    resize(src, width, height)
}

/// Mirror rows top to bottom (a 180° flip about the horizontal axis).
pub fn flip_vertical(src: &Frame) -> Frame {
    match view(src) {
        Some(image) => from_image(imageops::flip_vertical(&image), src.index()),
        None => src.clone(),
    }
}

/// Swap rows and columns.
pub fn transpose(src: &Frame) -> Frame {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let mut dst = Frame::filled(h as u32, w as u32, [0, 0, 0]);
    for y in 0..h {
        for x in 0..w {
            let px = [src.pixel(x, y)[0], src.pixel(x, y)[1], src.pixel(x, y)[2]];
            dst.pixel_mut(y, x).copy_from_slice(&px);
        }
    }
    dst
}

/// Surround `src` with `rows` rows above and below and `cols` columns
/// left and right, all set to `colour`.
pub fn pad_constant(src: &Frame, rows: usize, cols: usize, colour: [u8; 3]) -> Frame {
    let width = src.width() as usize + 2 * cols;
    let height = src.height() as usize + 2 * rows;
    let mut dst = Frame::filled(width as u32, height as u32, colour);
    paste(&mut dst, src, cols as i32, rows as i32);
    dst
}

/// Copy `rect` out of `src`. Pixels outside `src` read as black.
pub fn crop(src: &Frame, rect: Rect) -> Frame {
    let mut dst = Frame::filled(rect.width.max(0) as u32, rect.height.max(0) as u32, [0, 0, 0]);
    paste(&mut dst, src, -rect.x, -rect.y);
    dst
}

/// Copy `src` into `dst` with its top-left at `(x, y)`, clipping at `dst`'s edges.
pub fn paste(dst: &mut Frame, src: &Frame, x: i32, y: i32) {
    if let (Some(mut bottom), Some(top)) = (view_mut(dst), view(src)) {
        imageops::replace(&mut bottom, &top, x as i64, y as i64);
    }
}
