use crate::blurring::domain::face_obscurer::{FaceObscurer, ObscureMode};

use super::fill_obscurer::FillObscurer;
use super::gaussian_obscurer::GaussianObscurer;

/// Creates the obscurer for `mode`.
pub fn create_obscurer(mode: ObscureMode) -> Box<dyn FaceObscurer> {
    log::info!("Obscuring faces with {:?}", mode);
    match mode {
        ObscureMode::Blur => Box::new(GaussianObscurer::default()),
        ObscureMode::DrawOver => Box::new(FillObscurer::default()),
    }
}
