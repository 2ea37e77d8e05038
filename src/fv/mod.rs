//! Implements the multi-point stress approximation (MPSA) of linear elasticity

mod divergence;
mod elasticity_system;
mod inverter;
mod local_system;
mod mpsa;
mod sparse_operator;
mod subcell_topology;
pub use crate::fv::divergence::*;
pub use crate::fv::elasticity_system::*;
pub use crate::fv::inverter::*;
pub use crate::fv::local_system::*;
pub use crate::fv::mpsa::*;
pub use crate::fv::sparse_operator::*;
pub use crate::fv::subcell_topology::*;
