//! Implements the base structures: grid, material stiffness, boundary conditions, and configuration

mod boundary_condition;
mod config;
mod enums;
mod grid;
mod sample_meshes;
mod stiffness;
pub use crate::base::boundary_condition::*;
pub use crate::base::config::*;
pub use crate::base::enums::*;
pub use crate::base::grid::*;
pub use crate::base::sample_meshes::*;
pub use crate::base::stiffness::*;
