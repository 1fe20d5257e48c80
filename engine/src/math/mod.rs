//! Fixed point arithmetic and the lookup tables used to build affine
//! register values.

mod fixed;
mod sin_lut;

pub use fixed::Fixed;
pub use sin_lut::{degrees_sin_and_cos, lut_cos, lut_sin};
