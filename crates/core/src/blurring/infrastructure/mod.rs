pub mod compositor;
pub mod fill_obscurer;
mod gaussian;
pub mod gaussian_obscurer;
pub mod obscurer_factory;
