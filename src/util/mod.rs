//! Contains some utility functions and structures

mod affine_field;

pub use affine_field::*;
pub use patch_test::*;
