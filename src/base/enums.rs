use crate::StrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Defines the displacement components (degrees-of-freedom)
///
/// Note: The fixed numbering scheme assists in sorting and indexing.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Dof {
    /// Displacement along the first dimension
    Ux = 0,

    /// Displacement along the second dimension
    Uy = 1,

    /// Displacement along the third dimension
    Uz = 2,
}

impl Dof {
    /// Returns the displacement components available in a space with `ndim` dimensions
    pub fn all(ndim: usize) -> &'static [Dof] {
        if ndim == 2 {
            &[Dof::Ux, Dof::Uy]
        } else {
            &[Dof::Ux, Dof::Uy, Dof::Uz]
        }
    }

    /// Returns the component index (0, 1, or 2)
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Returns the DOF corresponding to a component index
    pub fn from_index(index: usize) -> Result<Self, StrError> {
        match index {
            0 => Ok(Dof::Ux),
            1 => Ok(Dof::Uy),
            2 => Ok(Dof::Uz),
            _ => Err("component index must be 0, 1, or 2"),
        }
    }
}

/// Defines the kind of boundary condition on a face component
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum Bc {
    /// Prescribed displacement
    Dirichlet,

    /// Prescribed traction (force on the face)
    Neumann,
}

impl fmt::Display for Bc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bc::Dirichlet => write!(f, "dir"),
            Bc::Neumann => write!(f, "neu"),
        }
    }
}

impl FromStr for Bc {
    type Err = StrError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dir" | "dirichlet" => Ok(Bc::Dirichlet),
            "neu" | "neumann" => Ok(Bc::Neumann),
            _ => Err("boundary condition kind must be \"dir\" or \"neu\""),
        }
    }
}

/// Selects the strategy to invert the local (cluster) systems
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Inverter {
    /// Inverts each local system independently with a dense LU factorization
    Direct,

    /// Groups local systems of equal size and inverts each group in a single batched elimination
    Batched,
}

impl Default for Inverter {
    fn default() -> Self {
        Inverter::Direct
    }
}

impl FromStr for Inverter {
    type Err = StrError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(Inverter::Direct),
            "batched" => Ok(Inverter::Batched),
            _ => Err("inverter must be \"direct\" or \"batched\""),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
