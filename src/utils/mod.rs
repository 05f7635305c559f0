// Utils compartidos

pub mod constants;
pub mod detector_ffi;

pub use constants::*;
