use super::SubcellTopology;
use crate::base::{Bc, BoundaryCondition, Dof, Grid, Stiffness};
use crate::StrError;
use russell_lab::{mat_mat_mul, Matrix};
use russell_sparse::{CooMatrix, Sym};
use std::collections::HashMap;

/// Holds the local system of a cluster of sub-cells around a node
///
/// The unknowns are the displacement gradients `G_s` of the sub-cells (ndim² per sub-cell,
/// row-major flattened). The displacement in a sub-cell of cell c is `u(x) = u_c + G_s (x - x_c)`.
/// The local system reads:
///
/// ```text
/// M g = A_u u + A_b b
/// ```
///
/// where `u` holds the displacements of the cells of the cluster and `b` holds the boundary
/// data of the boundary faces touched by the cluster. The sub-face tractions are `t = T g`.
///
/// Each interior sub-face contributes ndim rows of traction continuity and ndim rows of
/// displacement continuity; each boundary sub-face contributes ndim rows, one per component,
/// with either a Dirichlet or a Neumann condition.
pub struct LocalSystem {
    /// Index of the cluster
    pub cluster: usize,

    /// Node of the cluster
    pub node: usize,

    /// Holds the cell of each (local) sub-cell
    pub cells: Vec<usize>,

    /// Holds the face of each (local) sub-face
    pub faces: Vec<usize>,

    /// Holds the global boundary-data index (face · ndim + k) of each column of A_b
    pub bound_columns: Vec<usize>,

    /// Holds the matrix M of the unknowns
    pub mm: Matrix,

    /// Holds the matrix A_u multiplying the cell displacements
    pub aa_cell: Matrix,

    /// Holds the matrix A_b multiplying the boundary data
    pub aa_bound: Matrix,

    /// Holds the traction recovery matrix T
    pub tt: Matrix,

    /// Holds the inverse of M (computed by an inverter)
    pub mm_inv: Matrix,

    /// Indicates that no sub-face constrains the rotation of the (single) sub-cell
    ///
    /// This happens at corners where all boundary components are Neumann. The antisymmetric
    /// part of the gradient is then undetermined, M is singular, and the pseudo-inverse is
    /// used instead. The rotation produces no traction, thus `T M⁺` is well defined.
    pub rotation_free: bool,
}

impl LocalSystem {
    /// Allocates a new instance and builds the matrices M, A_u, A_b, and T
    ///
    /// # Input
    ///
    /// * `index` -- the index of the cluster in `topo.clusters`
    /// * `eta` -- the location parameter of the continuity points on interior sub-faces
    /// * `stabilization` -- the scaling factor of the rotational term in the traction continuity
    pub fn new(
        grid: &Grid,
        stiffness: &Stiffness,
        bcs: &BoundaryCondition,
        topo: &SubcellTopology,
        index: usize,
        eta: f64,
        stabilization: f64,
    ) -> Result<Self, StrError> {
        let ndim = grid.ndim;
        let nd2 = ndim * ndim;
        let cluster = &topo.clusters[index];
        let node = cluster.node;

        // local numbering of sub-cells
        let local: HashMap<usize, usize> = cluster.subcells.iter().enumerate().map(|(i, s)| (*s, i)).collect();
        let cells: Vec<usize> = cluster.subcells.iter().map(|s| topo.subcell_cell[*s]).collect();
        let faces: Vec<usize> = cluster.subfaces.iter().map(|q| topo.subface_face[*q]).collect();

        // dimensions
        let n = cells.len() * nd2;
        let nrow: usize = cluster
            .subfaces
            .iter()
            .map(|q| topo.subface_subcells[*q].len() * ndim)
            .sum();
        if nrow != n {
            return Err("local system is not square");
        }
        let mut bound_columns = Vec::new();
        for f in &faces {
            if grid.is_boundary_face(*f) {
                bound_columns.extend((0..ndim).map(|k| f * ndim + k));
            }
        }

        // matrices
        let mut mm = Matrix::new(n, n);
        let mut aa_cell = Matrix::new(n, cells.len() * ndim);
        let mut aa_bound = Matrix::new(n, bound_columns.len());
        let mut tt = Matrix::new(faces.len() * ndim, n);

        let xn = &grid.node_coords[node];
        let mut row = 0;
        let mut jb = 0;
        let mut constrained = false;
        for (iq, q) in cluster.subfaces.iter().enumerate() {
            let f = faces[iq];
            let xf = &grid.face_centers[f];
            let nn = grid.face_nodes[f].len() as f64;
            let normal: Vec<f64> = grid.face_normals[f].iter().map(|v| v / nn).collect();
            let subcells = &topo.subface_subcells[*q];

            // first sub-cell (the normal points out of its cell)
            let a = local[&subcells[0]];
            let c1 = cells[a];
            let xc1 = &grid.cell_centers[c1];
            let tm1 = stiffness.traction_map(c1, &normal);
            for i in 0..ndim {
                for m in 0..nd2 {
                    tt.set(iq * ndim + i, a * nd2 + m, tm1.get(i, m));
                }
            }

            if subcells.len() == 2 {
                constrained = true;
                let b = local[&subcells[1]];
                let c2 = cells[b];
                let xc2 = &grid.cell_centers[c2];
                let tm2 = stiffness.traction_map(c2, &normal);
                let kappa = stabilization * (stiffness.shear_modulus(c1) + stiffness.shear_modulus(c2)) / 2.0;
                let xp: Vec<f64> = (0..ndim).map(|l| xf[l] + eta * (xn[l] - xf[l])).collect();

                // traction continuity: t1(G1) - t2(G2) + κ [(G1 - G1ᵀ) - (G2 - G2ᵀ)]·n = 0
                for i in 0..ndim {
                    for k in 0..ndim {
                        for l in 0..ndim {
                            let m = k * ndim + l;
                            let rot = rotation_term(i, k, l, &normal);
                            mm.set(row + i, a * nd2 + m, tm1.get(i, m) + kappa * rot);
                            mm.set(row + i, b * nd2 + m, -tm2.get(i, m) - kappa * rot);
                        }
                    }
                }
                row += ndim;

                // displacement continuity: G1 (xp - xc1) - G2 (xp - xc2) = -u1 + u2
                for k in 0..ndim {
                    for l in 0..ndim {
                        mm.set(row + k, a * nd2 + k * ndim + l, xp[l] - xc1[l]);
                        mm.set(row + k, b * nd2 + k * ndim + l, -(xp[l] - xc2[l]));
                    }
                    aa_cell.set(row + k, a * ndim + k, -1.0);
                    aa_cell.set(row + k, b * ndim + k, 1.0);
                }
                row += ndim;
            } else {
                for k in 0..ndim {
                    match bcs.kind(f, Dof::from_index(k)?) {
                        // G (xf - xc) = -u + b
                        Some(Bc::Dirichlet) => {
                            constrained = true;
                            for l in 0..ndim {
                                mm.set(row, a * nd2 + k * ndim + l, xf[l] - xc1[l]);
                            }
                            aa_cell.set(row, a * ndim + k, -1.0);
                            aa_bound.set(row, jb, 1.0);
                        }
                        // t_k(G) = b / nn
                        Some(Bc::Neumann) => {
                            for m in 0..nd2 {
                                mm.set(row, a * nd2 + m, tm1.get(k, m));
                            }
                            aa_bound.set(row, jb, 1.0 / nn);
                        }
                        None => return Err("boundary face is missing the boundary condition of a component"),
                    }
                    row += 1;
                    jb += 1;
                }
            }
        }

        Ok(LocalSystem {
            cluster: index,
            node,
            cells,
            faces,
            bound_columns,
            mm,
            aa_cell,
            aa_bound,
            tt,
            mm_inv: Matrix::new(n, n),
            rotation_free: !constrained,
        })
    }

    /// Returns the number of unknowns (the dimension of M)
    #[inline]
    pub fn dim(&self) -> usize {
        self.mm.dims().0
    }

    /// Eliminates the unknowns and returns the blocks (T M⁻¹ A_u, T M⁻¹ A_b)
    ///
    /// **Note:** The inverse of M must have been computed already.
    pub fn eliminate(&self) -> Result<(Matrix, Matrix), StrError> {
        let (nt, n) = self.tt.dims();
        let mut tg = Matrix::new(nt, n);
        mat_mat_mul(&mut tg, 1.0, &self.tt, &self.mm_inv, 0.0)?;
        let mut cell_block = Matrix::new(nt, self.aa_cell.dims().1);
        mat_mat_mul(&mut cell_block, 1.0, &tg, &self.aa_cell, 0.0)?;
        let nb = self.bound_columns.len();
        let mut bound_block = Matrix::new(nt, nb);
        if nb > 0 {
            mat_mat_mul(&mut bound_block, 1.0, &tg, &self.aa_bound, 0.0)?;
        }
        Ok((cell_block, bound_block))
    }

    /// Eliminates the unknowns and puts the coefficients into the (partial) global operators
    ///
    /// Returns the COO matrices of the stress and bound_stress operators. Note that
    /// `bound_stress = -T M⁻¹ A_b` because the face traction is `stress · u - bound_stress · b`.
    pub fn scatter(&self, ndim: usize, num_cells: usize, num_faces: usize) -> Result<(CooMatrix, CooMatrix), StrError> {
        let (cell_block, bound_block) = self.eliminate()?;
        let nf = num_faces * ndim;
        let (nt, nu) = cell_block.dims();
        let nb = bound_block.dims().1;
        let mut stress = CooMatrix::new(nf, num_cells * ndim, nt * nu, Sym::No)?;
        let mut bound = CooMatrix::new(nf, nf, usize::max(1, nt * nb), Sym::No)?;
        for (iq, f) in self.faces.iter().enumerate() {
            for i in 0..ndim {
                let r = iq * ndim + i;
                let row = f * ndim + i;
                for (a, c) in self.cells.iter().enumerate() {
                    for k in 0..ndim {
                        let v = cell_block.get(r, a * ndim + k);
                        if v != 0.0 {
                            stress.put(row, c * ndim + k, v)?;
                        }
                    }
                }
                for (j, col) in self.bound_columns.iter().enumerate() {
                    let v = bound_block.get(r, j);
                    if v != 0.0 {
                        bound.put(row, *col, -v)?;
                    }
                }
            }
        }
        Ok((stress, bound))
    }
}

/// Returns the coefficient of G_kl in the rotational term [(G - Gᵀ)·n]_i
///
/// ```text
/// [(G - Gᵀ)·n]_i = Σ_kl (δ_ik n_l - δ_il n_k) G_kl
/// ```
#[inline]
fn rotation_term(i: usize, k: usize, l: usize, normal: &[f64]) -> f64 {
    let mut res = 0.0;
    if i == k {
        res += normal[l];
    }
    if i == l {
        res -= normal[k];
    }
    res
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{rotation_term, LocalSystem};
    use crate::base::{Bc, BoundaryCondition, Dof, Grid, SampleMeshes, Stiffness};
    use crate::fv::SubcellTopology;
    use russell_lab::{approx_eq, mat_approx_eq, mat_inverse, Matrix};

    #[test]
    fn rotation_term_works() {
        let n = &[0.3, 0.7];
        assert_eq!(rotation_term(0, 0, 0, n), 0.0);
        assert_eq!(rotation_term(0, 0, 1, n), 0.7);
        assert_eq!(rotation_term(0, 1, 0, n), -0.7);
        assert_eq!(rotation_term(1, 0, 1, n), -0.3);
        assert_eq!(rotation_term(1, 1, 0, n), 0.3);
    }

    #[test]
    fn new_captures_errors() {
        let mesh = SampleMeshes::two_qua4();
        let grid = Grid::from_mesh(&mesh).unwrap();
        let stiff = Stiffness::new_lame(2, 2, 1.0, 1.0, false).unwrap();
        let topo = SubcellTopology::new(&grid).unwrap();
        let mut bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);
        bcs.all.remove(&(0, Dof::Uy));
        assert_eq!(
            LocalSystem::new(&grid, &stiff, &bcs, &topo, 0, 0.0, 1.0).err(),
            Some("boundary face is missing the boundary condition of a component")
        );
    }

    #[test]
    fn new_works_corner() {
        //  3-------4-------5
        //  |       |       |
        //  |  [0]  |  [1]  |
        //  |       |       |
        //  0-------1-------2
        let mesh = SampleMeshes::two_qua4();
        let grid = Grid::from_mesh(&mesh).unwrap();
        let stiff = Stiffness::new_lame(2, 2, 1.0, 1.0, false).unwrap();
        let topo = SubcellTopology::new(&grid).unwrap();
        let mut bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);
        bcs.set(&[3], Dof::Ux, Bc::Neumann).set(&[3], Dof::Uy, Bc::Neumann);

        // cluster of node 0: bottom face 0 (Dirichlet) and left face 3 (Neumann)
        let sys = LocalSystem::new(&grid, &stiff, &bcs, &topo, 0, 0.0, 1.0).unwrap();
        assert_eq!(sys.node, 0);
        assert_eq!(sys.dim(), 4);
        assert_eq!(sys.cells, &[0]);
        assert_eq!(sys.faces, &[0, 3]);
        assert_eq!(sys.bound_columns, &[0, 1, 6, 7]);
        assert_eq!(sys.rotation_free, false);

        // Dirichlet rows: G (xf - xc) with xf - xc = (0, -0.5)
        // Neumann rows: (C:G)·n/2 with n = (-1, 0)
        #[rustfmt::skip]
        let mm_correct = Matrix::from(&[
            [ 0.0, -0.5,  0.0,  0.0],
            [ 0.0,  0.0,  0.0, -0.5],
            [-1.5,  0.0,  0.0, -0.5],
            [ 0.0, -0.5, -0.5,  0.0],
        ]);
        mat_approx_eq(&sys.mm, &mm_correct, 1e-15);
        #[rustfmt::skip]
        let aa_cell_correct = Matrix::from(&[
            [-1.0,  0.0],
            [ 0.0, -1.0],
            [ 0.0,  0.0],
            [ 0.0,  0.0],
        ]);
        mat_approx_eq(&sys.aa_cell, &aa_cell_correct, 1e-15);
        #[rustfmt::skip]
        let aa_bound_correct = Matrix::from(&[
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.5, 0.0],
            [0.0, 0.0, 0.0, 0.5],
        ]);
        mat_approx_eq(&sys.aa_bound, &aa_bound_correct, 1e-15);

        // traction recovery of the Neumann sub-face equals its rows in M
        for j in 0..4 {
            approx_eq(sys.tt.get(2, j), sys.mm.get(2, j), 1e-15);
            approx_eq(sys.tt.get(3, j), sys.mm.get(3, j), 1e-15);
        }
    }

    #[test]
    fn new_works_interior() {
        let mesh = SampleMeshes::two_qua4();
        let grid = Grid::from_mesh(&mesh).unwrap();
        let stiff = Stiffness::new_lame(2, 2, 1.0, 1.0, false).unwrap();
        let topo = SubcellTopology::new(&grid).unwrap();
        let bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);

        // cluster of node 1: faces 0 (cell 0), 1 (interior), and 4 (cell 1)
        let sys = LocalSystem::new(&grid, &stiff, &bcs, &topo, 1, 0.0, 1.0).unwrap();
        assert_eq!(sys.node, 1);
        assert_eq!(sys.dim(), 8);
        assert_eq!(sys.cells, &[0, 1]);
        assert_eq!(sys.faces, &[0, 1, 4]);
        assert_eq!(sys.bound_columns, &[0, 1, 8, 9]);
        assert_eq!(sys.tt.dims(), (6, 8));
        assert_eq!(sys.rotation_free, false);

        // the affine solution (uniform gradient) satisfies the local system
        let grad = [0.1, 0.2, -0.3, 0.4];
        let u = |x: &[f64]| {
            [
                grad[0] * x[0] + grad[1] * x[1],
                grad[2] * x[0] + grad[3] * x[1],
            ]
        };
        let mut g = vec![0.0; 8];
        for s in 0..2 {
            for m in 0..4 {
                g[s * 4 + m] = grad[m];
            }
        }
        let mut uc = vec![0.0; 4];
        for (a, c) in sys.cells.iter().enumerate() {
            let v = u(&grid.cell_centers[*c]);
            uc[a * 2] = v[0];
            uc[a * 2 + 1] = v[1];
        }
        let mut b = vec![0.0; 4];
        for (j, col) in sys.bound_columns.iter().enumerate() {
            let f = col / 2;
            b[j] = u(&grid.face_centers[f])[col % 2];
        }
        for r in 0..8 {
            let lhs: f64 = (0..8).map(|j| sys.mm.get(r, j) * g[j]).sum();
            let rhs: f64 = (0..4).map(|j| sys.aa_cell.get(r, j) * uc[j]).sum::<f64>()
                + (0..4).map(|j| sys.aa_bound.get(r, j) * b[j]).sum::<f64>();
            approx_eq(lhs, rhs, 1e-15);
        }
    }

    #[test]
    fn eliminate_and_scatter_work() {
        let mesh = SampleMeshes::two_qua4();
        let grid = Grid::from_mesh(&mesh).unwrap();
        let stiff = Stiffness::new_lame(2, 2, 1.0, 1.0, false).unwrap();
        let topo = SubcellTopology::new(&grid).unwrap();
        let mut bcs = BoundaryCondition::new_uniform(&grid, Bc::Dirichlet);
        bcs.set(&[3], Dof::Ux, Bc::Neumann).set(&[3], Dof::Uy, Bc::Neumann);
        let mut sys = LocalSystem::new(&grid, &stiff, &bcs, &topo, 0, 0.0, 1.0).unwrap();
        let mm = sys.mm.clone();
        mat_inverse(&mut sys.mm_inv, &mm).unwrap();
        let (cell_block, bound_block) = sys.eliminate().unwrap();
        assert_eq!(cell_block.dims(), (4, 2));
        assert_eq!(bound_block.dims(), (4, 4));

        // Neumann sub-face: the traction equals the boundary data divided by the number of nodes
        approx_eq(bound_block.get(2, 2), 0.5, 1e-15);
        approx_eq(bound_block.get(3, 3), 0.5, 1e-15);
        approx_eq(bound_block.get(2, 0), 0.0, 1e-15);
        approx_eq(cell_block.get(2, 0), 0.0, 1e-15);

        let (stress, bound) = sys.scatter(2, grid.num_cells, grid.num_faces).unwrap();
        let (nrow, ncol, _, _) = stress.get_info();
        assert_eq!((nrow, ncol), (14, 4));
        let (nrow, ncol, nnz, _) = bound.get_info();
        assert_eq!((nrow, ncol), (14, 14));
        let rows = &bound.get_row_indices()[0..nnz];
        assert!(rows.iter().all(|r| *r == 0 || *r == 1 || *r == 6 || *r == 7));
    }
}
