//! Multi-point stress approximation (MPSA) of static linear elasticity on unstructured grids
//!
//! The discretization produces two sparse operators:
//!
//! * `stress` maps the cell displacements to the face tractions
//! * `bound_stress` maps the boundary data to the face tractions
//!
//! such that the face tractions are `t = stress · u - bound_stress · b`.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod fv;
pub mod prelude;
pub mod util;
