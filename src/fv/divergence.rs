use super::SparseOperator;
use crate::base::Grid;
use crate::StrError;
use russell_sparse::{CooMatrix, Sym};

/// Assembles the discrete divergence of a vector field given by face fluxes (or forces)
///
/// Returns the (num_cells · ndim, num_faces · ndim) operator with entries
/// `D[c·ndim + k][f·ndim + k] = sign(c, f)` where the sign is +1 if the face normal
/// points out of the cell and -1 otherwise.
pub fn vector_divergence(grid: &Grid) -> Result<SparseOperator, StrError> {
    let ndim = grid.ndim;
    let capacity = grid.cell_faces.iter().map(|faces| faces.len() * ndim).sum();
    let mut coo = CooMatrix::new(grid.num_cells * ndim, grid.num_faces * ndim, capacity, Sym::No)?;
    for (c, faces) in grid.cell_faces.iter().enumerate() {
        for (f, sign) in faces {
            for k in 0..ndim {
                coo.put(c * ndim + k, f * ndim + k, *sign)?;
            }
        }
    }
    SparseOperator::from_coo(&coo)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
