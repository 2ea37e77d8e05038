use crate::base::{Bc, BoundaryCondition, Dof, Grid, Stiffness};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Implements an affine displacement field `u(x) = u₀ + G x`
///
/// In a homogeneous material, an affine field has uniform strain and stress; thus it solves the
/// static equilibrium equations without body forces exactly. The consistent discretizations
/// must reproduce such fields (the so-called patch test).
pub struct AffineField {
    /// Displacement at the origin
    pub u0: Vec<f64>,

    /// Displacement gradient `G[k][l] = ∂u_k/∂x_l`
    pub grad: Matrix,
}

impl AffineField {
    /// Allocates a new instance
    pub fn new(u0: &[f64], grad: &Matrix) -> Result<Self, StrError> {
        let ndim = u0.len();
        if ndim != 2 && ndim != 3 {
            return Err("u0.len() = ndim must be 2 or 3");
        }
        if grad.dims() != (ndim, ndim) {
            return Err("the displacement gradient must be an (ndim, ndim) matrix");
        }
        Ok(AffineField {
            u0: u0.to_vec(),
            grad: grad.clone(),
        })
    }

    /// Returns the space dimension
    #[inline]
    pub fn ndim(&self) -> usize {
        self.u0.len()
    }

    /// Calculates the displacement at a point
    pub fn displacement(&self, x: &[f64]) -> Vec<f64> {
        let ndim = self.ndim();
        (0..ndim)
            .map(|k| self.u0[k] + (0..ndim).map(|l| self.grad.get(k, l) * x[l]).sum::<f64>())
            .collect()
    }

    /// Calculates the displacements at the cell centers (num_cells · ndim)
    pub fn cell_displacements(&self, grid: &Grid) -> Result<Vector, StrError> {
        self.check(grid)?;
        let ndim = self.ndim();
        let mut u = Vector::new(grid.num_cells * ndim);
        for (c, x) in grid.cell_centers.iter().enumerate() {
            for (k, value) in self.displacement(x).iter().enumerate() {
                u[c * ndim + k] = *value;
            }
        }
        Ok(u)
    }

    /// Calculates the exact forces on all faces (num_faces · ndim)
    ///
    /// The force on face f is `σ · n_f` where n_f is the (area-weighted) face normal and σ is
    /// the stress in the first cell adjacent to the face.
    pub fn face_tractions(&self, grid: &Grid, stiffness: &Stiffness) -> Result<Vector, StrError> {
        self.check(grid)?;
        let ndim = self.ndim();
        let mut t = Vector::new(grid.num_faces * ndim);
        for f in 0..grid.num_faces {
            let sig = stiffness.stress(grid.face_cells[f][0], &self.grad);
            for i in 0..ndim {
                t[f * ndim + i] = (0..ndim).map(|j| sig.get(i, j) * grid.face_normals[f][j]).sum();
            }
        }
        Ok(t)
    }

    /// Calculates the boundary data (num_faces · ndim)
    ///
    /// The Dirichlet components receive the displacement at the face center and the Neumann
    /// components receive the force on the face. Interior faces receive zero.
    pub fn boundary_data(&self, grid: &Grid, stiffness: &Stiffness, bcs: &BoundaryCondition) -> Result<Vector, StrError> {
        let ndim = self.ndim();
        let forces = self.face_tractions(grid, stiffness)?;
        let mut b = Vector::new(grid.num_faces * ndim);
        for f in grid.boundary_faces() {
            let u = self.displacement(&grid.face_centers[f]);
            for k in 0..ndim {
                b[f * ndim + k] = match bcs.kind(f, Dof::from_index(k)?) {
                    Some(Bc::Dirichlet) => u[k],
                    Some(Bc::Neumann) => forces[f * ndim + k],
                    None => return Err("boundary face is missing the boundary condition of a component"),
                };
            }
        }
        Ok(b)
    }

    /// Checks the compatibility with a grid
    fn check(&self, grid: &Grid) -> Result<(), StrError> {
        if grid.ndim != self.ndim() {
            return Err("the affine field and the grid must have the same ndim");
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
