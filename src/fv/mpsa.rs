use super::{allocate_inverter, invert_and_rcond, LocalSystem, SingularSystem, SparseOperator, SubcellTopology};
use crate::base::{BoundaryCondition, Config, Grid, Inverter, Stiffness};
use crate::StrError;
use rayon::prelude::*;
use russell_lab::{vec_add, Vector};
use russell_sparse::{CooMatrix, Sym};

/// Holds the MPSA discretization of the linear elasticity operator
///
/// The face tractions (forces on faces, oriented by the face normals) are
///
/// ```text
/// t = stress · u - bound_stress · b
/// ```
///
/// where `u` holds the cell displacements (num_cells · ndim) and `b` holds the boundary data
/// (num_faces · ndim). The boundary data of a Dirichlet component is the displacement at the
/// face center and the boundary data of a Neumann component is the force on the face. The
/// entries of `b` on interior faces are ignored.
pub struct Mpsa {
    /// Space dimension
    pub ndim: usize,

    /// Maps the cell displacements to the face tractions (num_faces · ndim, num_cells · ndim)
    pub stress: SparseOperator,

    /// Maps the boundary data to the face tractions (num_faces · ndim, num_faces · ndim)
    pub bound_stress: SparseOperator,
}

impl Mpsa {
    /// Assembles the stress and bound_stress operators
    pub fn new(grid: &Grid, stiffness: &Stiffness, bcs: &BoundaryCondition, config: &Config) -> Result<Self, StrError> {
        // local systems
        let mut systems = build_local_systems(grid, stiffness, bcs, config)?;
        let ndim = grid.ndim;

        // inverses
        let inverter = allocate_inverter(config);
        inverter.invert(&mut systems)?;

        // elimination (the order of the clusters is preserved)
        let (nc, nf) = (grid.num_cells, grid.num_faces);
        let parts: Vec<(CooMatrix, CooMatrix)> = if config.parallel {
            systems
                .par_iter()
                .map(|s| s.scatter(ndim, nc, nf))
                .collect::<Result<_, _>>()?
        } else {
            systems
                .iter()
                .map(|s| s.scatter(ndim, nc, nf))
                .collect::<Result<_, _>>()?
        };

        // global operators
        let capacity_stress = parts.iter().map(|(a, _)| a.get_info().2).sum();
        let capacity_bound = parts.iter().map(|(_, b)| b.get_info().2).sum();
        let mut stress = CooMatrix::new(nf * ndim, nc * ndim, usize::max(1, capacity_stress), Sym::No)?;
        let mut bound_stress = CooMatrix::new(nf * ndim, nf * ndim, usize::max(1, capacity_bound), Sym::No)?;
        for (a, b) in &parts {
            stress.augment(1.0, a)?;
            bound_stress.augment(1.0, b)?;
        }
        let mpsa = Mpsa {
            ndim,
            stress: SparseOperator::from_coo(&stress)?,
            bound_stress: SparseOperator::from_coo(&bound_stress)?,
        };

        if config.verbose {
            let max_dim = systems.iter().map(|s| s.dim()).max().unwrap_or(0);
            let rotation_free = systems.iter().filter(|s| s.rotation_free).count();
            println!("MPSA discretization");
            println!("===================");
            println!("number of cells    = {}", nc);
            println!("number of faces    = {}", nf);
            println!("number of clusters = {}", systems.len());
            println!("largest local dim  = {}", max_dim);
            println!("rotation-free      = {}", rotation_free);
            println!("inverter           = {:?}", config.inverter);
            println!("eta                = {:?}", config.eta_for(grid.simplex));
            println!("nnz(stress)        = {}", mpsa.stress.nnz());
            println!("nnz(bound_stress)  = {}", mpsa.bound_stress.nnz());
        }
        Ok(mpsa)
    }

    /// Calculates the face tractions `t = stress · u - bound_stress · b`
    pub fn traction(&self, u: &[f64], b: &[f64]) -> Result<Vec<f64>, StrError> {
        if u.len() != self.stress.ncol() {
            return Err("the displacement vector must have num_cells · ndim components");
        }
        if b.len() != self.bound_stress.ncol() {
            return Err("the boundary data vector must have num_faces · ndim components");
        }
        let n = self.stress.nrow();
        let mut su = Vector::new(n);
        let mut sb = Vector::new(n);
        self.stress.mat_vec_mul(&mut su, 1.0, &Vector::from(&u))?;
        self.bound_stress.mat_vec_mul(&mut sb, 1.0, &Vector::from(&b))?;
        let mut t = Vector::new(n);
        vec_add(&mut t, 1.0, &su, -1.0, &sb)?;
        Ok(t.as_data().clone())
    }
}

/// Checks the input and builds the local systems of all clusters
fn build_local_systems(
    grid: &Grid,
    stiffness: &Stiffness,
    bcs: &BoundaryCondition,
    config: &Config,
) -> Result<Vec<LocalSystem>, StrError> {
    // check
    config.check()?;
    let ndim = grid.ndim;
    if config.ndim != ndim {
        return Err("config.ndim must equal grid.ndim");
    }
    if stiffness.ndim != ndim {
        return Err("stiffness.ndim must equal grid.ndim");
    }
    if stiffness.num_cells() != grid.num_cells {
        return Err("stiffness must have one tensor per cell");
    }
    bcs.validate(grid)?;

    // local systems
    let topo = SubcellTopology::new(grid)?;
    let eta = config.eta_for(grid.simplex);
    let stabilization = config.stabilization;
    let nclusters = topo.clusters.len();
    if config.parallel {
        (0..nclusters)
            .into_par_iter()
            .map(|i| LocalSystem::new(grid, stiffness, bcs, &topo, i, eta, stabilization))
            .collect()
    } else {
        (0..nclusters)
            .map(|i| LocalSystem::new(grid, stiffness, bcs, &topo, i, eta, stabilization))
            .collect()
    }
}

/// Finds the local systems that cannot be inverted with the given configuration
///
/// Returns the cluster, node, and reciprocal condition number of each local system with
/// `rcond < config.singular_tolerance` (or a failed factorization), sorted by cluster. Rotation-free systems are skipped
/// because they receive the pseudo-inverse.
pub fn find_singular_systems(
    grid: &Grid,
    stiffness: &Stiffness,
    bcs: &BoundaryCondition,
    config: &Config,
) -> Result<Vec<SingularSystem>, StrError> {
    let mut systems = build_local_systems(grid, stiffness, bcs, config)?;
    let check = |system: &mut LocalSystem| {
        if system.rotation_free {
            return None;
        }
        let rcond = invert_and_rcond(system);
        if rcond == 0.0 || rcond < config.singular_tolerance {
            Some(SingularSystem {
                cluster: system.cluster,
                node: system.node,
                rcond,
            })
        } else {
            None
        }
    };
    let found = if config.parallel {
        systems.par_iter_mut().filter_map(check).collect()
    } else {
        systems.iter_mut().filter_map(check).collect()
    };
    Ok(found)
}

/// Assembles the stress and bound_stress operators with the default configuration
///
/// Returns `(stress, bound_stress)`.
///
/// # Examples
///
/// ```
/// use mpsa::base::{Bc, BoundaryCondition, Grid, Inverter, SampleMeshes, Stiffness};
/// use mpsa::fv::assemble_mpsa;
/// use mpsa::StrError;
///
/// fn main() -> Result<(), StrError> {
///     let mesh = SampleMeshes::cartesian_2d(2, 2, 1.0, 1.0);
///     let grid = Grid::from_mesh(&mesh)?;
///     let stiffness = Stiffness::new_lame(2, grid.num_cells, 1.0, 1.0, false)?;
///     let bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);
///     let (stress, bound_stress) = assemble_mpsa(&grid, &stiffness, &bcs, Inverter::Direct)?;
///     assert_eq!(stress.nrow(), grid.num_faces * 2);
///     assert_eq!(stress.ncol(), grid.num_cells * 2);
///     assert_eq!(bound_stress.ncol(), grid.num_faces * 2);
///     Ok(())
/// }
/// ```
pub fn assemble_mpsa(
    grid: &Grid,
    stiffness: &Stiffness,
    bcs: &BoundaryCondition,
    inverter: Inverter,
) -> Result<(SparseOperator, SparseOperator), StrError> {
    let mut config = Config::new(grid.ndim);
    config.set_inverter(inverter);
    let mpsa = Mpsa::new(grid, stiffness, bcs, &config)?;
    Ok((mpsa.stress, mpsa.bound_stress))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{assemble_mpsa, find_singular_systems, Mpsa};
    use crate::base::{Bc, BoundaryCondition, Config, Dof, Grid, Inverter, SampleMeshes, Stiffness};
    use russell_lab::{approx_eq, array_approx_eq};

    #[test]
    fn new_captures_errors() {
        let mesh = SampleMeshes::two_qua4();
        let grid = Grid::from_mesh(&mesh).unwrap();
        let stiff = Stiffness::new_lame(2, 2, 1.0, 1.0, false).unwrap();
        let bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);

        let mut config = Config::new(2);
        config.set_eta(1.0);
        assert_eq!(
            Mpsa::new(&grid, &stiff, &bcs, &config).err(),
            Some("cannot allocate discretization because config.validate() failed")
        );

        let config = Config::new(3);
        assert_eq!(
            Mpsa::new(&grid, &stiff, &bcs, &config).err(),
            Some("config.ndim must equal grid.ndim")
        );

        let config = Config::new(2);
        let stiff_3d = Stiffness::new_lame(3, 2, 1.0, 1.0, false).unwrap();
        assert_eq!(
            Mpsa::new(&grid, &stiff_3d, &bcs, &config).err(),
            Some("stiffness.ndim must equal grid.ndim")
        );

        let stiff_wrong = Stiffness::new_lame(2, 3, 1.0, 1.0, false).unwrap();
        assert_eq!(
            Mpsa::new(&grid, &stiff_wrong, &bcs, &config).err(),
            Some("stiffness must have one tensor per cell")
        );

        let mut bcs_wrong = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);
        bcs_wrong.all.remove(&(3, Dof::Ux));
        assert_eq!(
            Mpsa::new(&grid, &stiff, &bcs_wrong, &config).err(),
            Some("boundary face is missing the boundary condition of a component")
        );
    }

    #[test]
    fn new_works_and_traction_is_consistent() {
        let mesh = SampleMeshes::two_qua4();
        let grid = Grid::from_mesh(&mesh).unwrap();
        let stiff = Stiffness::new_lame(2, 2, 1.0, 1.0, false).unwrap();
        let bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);
        let mut config = Config::new(2);
        config.set_verbose(true);
        let mpsa = Mpsa::new(&grid, &stiff, &bcs, &config).unwrap();
        assert_eq!(mpsa.ndim, 2);
        assert_eq!(mpsa.stress.nrow(), 14);
        assert_eq!(mpsa.stress.ncol(), 4);
        assert_eq!(mpsa.bound_stress.nrow(), 14);
        assert_eq!(mpsa.bound_stress.ncol(), 14);

        // the columns of bound_stress of the interior face are empty
        for i in 0..14 {
            assert!(mpsa.bound_stress.row_columns(i).iter().all(|j| *j != 2 && *j != 3));
        }

        // uniform displacement produces no traction
        let u = vec![0.3, -0.2, 0.3, -0.2];
        let mut b = vec![0.0; 14];
        for f in grid.boundary_faces() {
            b[f * 2] = 0.3;
            b[f * 2 + 1] = -0.2;
        }
        let t = mpsa.traction(&u, &b).unwrap();
        array_approx_eq(&t, &[0.0; 14], 1e-13);

        assert_eq!(
            mpsa.traction(&[0.0; 3], &b).err(),
            Some("the displacement vector must have num_cells · ndim components")
        );
        assert_eq!(
            mpsa.traction(&u, &[0.0; 13]).err(),
            Some("the boundary data vector must have num_faces · ndim components")
        );
    }

    #[test]
    fn find_singular_systems_works() {
        //  6-----7-----8
        //  |     |     |
        //  3-----4-----5
        //  |     |     |
        //  0-----1-----2
        let mesh = SampleMeshes::cartesian_2d(2, 2, 1.0, 1.0);
        let grid = Grid::from_mesh(&mesh).unwrap();
        let stiff = Stiffness::new_lame(2, grid.num_cells, 1.0, 1.0, false).unwrap();
        let bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);
        let mut config = Config::new(2);
        let found = find_singular_systems(&grid, &stiff, &bcs, &config).unwrap();
        assert_eq!(found.len(), 0);

        // without stabilization, the rotation of the interior cluster is free
        config.set_stabilization(0.0).set_parallel(true);
        let found = find_singular_systems(&grid, &stiff, &bcs, &config).unwrap();
        let center: Vec<_> = found.iter().filter(|s| s.node == 4).collect();
        assert_eq!(center.len(), 1);
        assert!(center[0].rcond < 1e-13);
        assert!(found.windows(2).all(|w| w[0].cluster < w[1].cluster));
        assert_eq!(
            Mpsa::new(&grid, &stiff, &bcs, &config).err(),
            Some("local system is singular")
        );

        config.set_eta(1.0);
        assert_eq!(
            find_singular_systems(&grid, &stiff, &bcs, &config).err(),
            Some("cannot allocate discretization because config.validate() failed")
        );
    }

    #[test]
    fn assemble_mpsa_works() {
        let mesh = SampleMeshes::perturbed_2d(3, 2, 1.0, 1.0, 0.1);
        let grid = Grid::from_mesh(&mesh).unwrap();
        let stiff = Stiffness::new_lame(2, grid.num_cells, 1.0, 2.0, false).unwrap();
        let bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);
        let (s1, b1) = assemble_mpsa(&grid, &stiff, &bcs, Inverter::Direct).unwrap();
        let (s2, b2) = assemble_mpsa(&grid, &stiff, &bcs, Inverter::Batched).unwrap();
        approx_eq(s1.max_abs_diff(&s2).unwrap(), 0.0, 1e-10);
        approx_eq(b1.max_abs_diff(&b2).unwrap(), 0.0, 1e-10);
    }
}
