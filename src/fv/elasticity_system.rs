use super::{vector_divergence, Mpsa, SparseOperator};
use crate::base::Grid;
use crate::StrError;
use russell_lab::{solve_lin_sys, Vector};
use russell_sparse::{Genie, LinSolver};

/// Holds the global linear system of static equilibrium (without body forces)
///
/// The sum of the forces acting on the faces of each cell vanishes, thus:
///
/// ```text
/// div · stress · u = div · bound_stress · b
/// ```
pub struct ElasticitySystem {
    /// Discrete divergence (num_cells · ndim, num_faces · ndim)
    pub div: SparseOperator,

    /// Global matrix div · stress (num_cells · ndim, num_cells · ndim)
    pub kk: SparseOperator,

    /// Boundary matrix div · bound_stress (num_cells · ndim, num_faces · ndim)
    pub kb: SparseOperator,
}

impl ElasticitySystem {
    /// Allocates a new instance
    pub fn new(grid: &Grid, mpsa: &Mpsa) -> Result<Self, StrError> {
        let div = vector_divergence(grid)?;
        let kk = div.mat_mat_mul(&mpsa.stress)?;
        let kb = div.mat_mat_mul(&mpsa.bound_stress)?;
        Ok(ElasticitySystem { div, kk, kb })
    }

    /// Calculates the right-hand side `div · bound_stress · b`
    pub fn rhs(&self, b: &Vector) -> Result<Vector, StrError> {
        if b.dim() != self.kb.ncol() {
            return Err("the boundary data vector must have num_faces · ndim components");
        }
        let mut rhs = Vector::new(self.kb.nrow());
        self.kb.mat_vec_mul(&mut rhs, 1.0, b)?;
        Ok(rhs)
    }

    /// Solves the global system with a sparse solver and returns the cell displacements
    pub fn solve(&self, b: &Vector, genie: Genie) -> Result<Vector, StrError> {
        let rhs = self.rhs(b)?;
        let kk = self.kk.to_coo()?;
        let mut solver = LinSolver::new(genie)?;
        solver.actual.factorize(&kk, None)?;
        let mut u = Vector::new(self.kk.nrow());
        solver.actual.solve(&mut u, &rhs, false)?;
        Ok(u)
    }

    /// Solves the global system with a dense LU factorization (for small grids)
    pub fn solve_dense(&self, b: &Vector) -> Result<Vector, StrError> {
        let mut u = self.rhs(b)?;
        let mut kk = self.kk.as_dense();
        solve_lin_sys(&mut u, &mut kk)?;
        Ok(u)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ElasticitySystem;
    use crate::base::{Bc, BoundaryCondition, Config, Grid, SampleMeshes, Stiffness};
    use crate::fv::Mpsa;
    use russell_lab::{vec_approx_eq, Vector};
    use russell_sparse::Genie;

    #[test]
    fn solve_works_uniform_displacement() {
        let mesh = SampleMeshes::cartesian_2d(3, 2, 1.5, 1.0);
        let grid = Grid::from_mesh(&mesh).unwrap();
        let stiff = Stiffness::new_lame(2, grid.num_cells, 1.0, 1.0, false).unwrap();
        let bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);
        let mpsa = Mpsa::new(&grid, &stiff, &bcs, &Config::new(2)).unwrap();
        let system = ElasticitySystem::new(&grid, &mpsa).unwrap();
        assert_eq!(system.kk.nrow(), 12);
        assert_eq!(system.kk.ncol(), 12);

        let mut b = Vector::new(grid.num_faces * 2);
        for f in grid.boundary_faces() {
            b[f * 2] = 1.0;
            b[f * 2 + 1] = -2.0;
        }
        let mut correct = vec![0.0; 12];
        for c in 0..6 {
            correct[c * 2] = 1.0;
            correct[c * 2 + 1] = -2.0;
        }
        let u = system.solve_dense(&b).unwrap();
        vec_approx_eq(&u, &correct, 1e-12);
        let u = system.solve(&b, Genie::Umfpack).unwrap();
        vec_approx_eq(&u, &correct, 1e-12);

        assert_eq!(
            system.rhs(&Vector::new(3)).err(),
            Some("the boundary data vector must have num_faces · ndim components")
        );
    }
}
