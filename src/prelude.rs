//! Makes available common structures needed to assemble and solve a problem
//!
//! You may write `use mpsa::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{Bc, BoundaryCondition, Config, Dof, Grid, Inverter, SampleMeshes, Stiffness};
pub use crate::fv::{assemble_mpsa, find_singular_systems, ElasticitySystem, Mpsa, SingularSystem, SparseOperator};
pub use crate::util::{run_patch_test, AffineField, PatchTestResults};
