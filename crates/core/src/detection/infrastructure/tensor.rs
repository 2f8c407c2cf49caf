use ndarray::Array4;

use crate::imaging::transform::{crop, pad_constant, resize};
use crate::shared::constants::{NETWORK_MEAN_BGR, PAD_FRACTION, PAD_MAX};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Convert a BGR frame to a `[1, 3, H, W]` tensor with the network mean
/// subtracted. No scaling and no channel swap.
pub fn to_input_tensor(image: &Frame) -> Array4<f32> {
    let h = image.height() as usize;
    let w = image.width() as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
    let pixels = image.as_ndarray();
    for y in 0..h {
        for x in 0..w {
            for c in 0..3 {
                tensor[[0, c, y, x]] = pixels[[y, x, c]] as f32 - NETWORK_MEAN_BGR[c] as f32;
            }
        }
    }
    tensor
}

/// Crop `rect`, resize it to `dim` × `dim` and convert it to a network input.
pub fn crop_to_input(image: &Frame, rect: Rect, dim: usize) -> Array4<f32> {
    to_input_tensor(&resize(&crop(image, rect), dim, dim))
}

/// A tile surrounded by a border of the network mean colour so faces cut
/// by the tile edge can still be scanned.
pub struct PaddedTile {
    pub image: Frame,
    pub pad_rows: usize,
    pub pad_cols: usize,
}

impl PaddedTile {
    pub fn new(tile: &Frame) -> Self {
        let pad_rows = padding_for(tile.height() as usize);
        let pad_cols = padding_for(tile.width() as usize);
        Self {
            image: pad_constant(tile, pad_rows, pad_cols, NETWORK_MEAN_BGR),
            pad_rows,
            pad_cols,
        }
    }

    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    pub fn height(&self) -> usize {
        self.image.height() as usize
    }
}

fn padding_for(dim: usize) -> usize {
    ((dim as f64 * PAD_FRACTION) as usize).min(PAD_MAX)
}
