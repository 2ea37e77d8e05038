use crate::StrError;
use russell_lab::Matrix;
use russell_tensor::LinElasticity;

/// Tolerance to check the symmetries of the stiffness tensor (relative to the largest component)
const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Holds the fourth-order stiffness tensor of each cell
///
/// The components are stored in the full (standard) representation `C_ijkl` with the
/// flattened index `((i·ndim + j)·ndim + k)·ndim + l`. The traction on a plane with
/// normal `n` due to a displacement gradient `G_kl = ∂u_k/∂x_l` is
///
/// ```text
/// t_i = Σ_jkl C_ijkl n_j G_kl
/// ```
pub struct Stiffness {
    /// Space dimension
    pub ndim: usize,

    /// Holds the ndim⁴ components of each cell
    pub values: Vec<Vec<f64>>,
}

impl Stiffness {
    /// Allocates a new instance with the same isotropic material in all cells
    ///
    /// In 2D, `plane_stress` selects the plane-stress idealization; otherwise, plane-strain.
    pub fn new_isotropic(
        ndim: usize,
        num_cells: usize,
        young: f64,
        poisson: f64,
        plane_stress: bool,
    ) -> Result<Self, StrError> {
        let params = vec![(young, poisson); num_cells];
        Stiffness::new_isotropic_cells(ndim, &params, plane_stress)
    }

    /// Allocates a new instance with isotropic materials given by the Lamé parameters (μ, λ)
    pub fn new_lame(ndim: usize, num_cells: usize, mu: f64, lambda: f64, plane_stress: bool) -> Result<Self, StrError> {
        let (young, poisson) = young_poisson_from_lame(mu, lambda)?;
        Stiffness::new_isotropic(ndim, num_cells, young, poisson, plane_stress)
    }

    /// Allocates a new instance with one (Young's modulus, Poisson's coefficient) pair per cell
    pub fn new_isotropic_cells(ndim: usize, params: &[(f64, f64)], plane_stress: bool) -> Result<Self, StrError> {
        if ndim != 2 && ndim != 3 {
            return Err("ndim must be 2 or 3");
        }
        let two_dim = ndim == 2;
        let mut values = Vec::with_capacity(params.len());
        for (young, poisson) in params {
            if *young <= 0.0 {
                return Err("Young's modulus must be > 0.0");
            }
            if *poisson <= -1.0 || *poisson >= 0.5 {
                return Err("Poisson's coefficient must satisfy -1.0 < ν < 0.5");
            }
            let model = LinElasticity::new(*young, *poisson, two_dim, plane_stress);
            let dd = model.get_modulus();
            let mut cc = vec![0.0; ndim * ndim * ndim * ndim];
            for i in 0..ndim {
                for j in 0..ndim {
                    for k in 0..ndim {
                        for l in 0..ndim {
                            cc[((i * ndim + j) * ndim + k) * ndim + l] = dd.get(i, j, k, l);
                        }
                    }
                }
            }
            values.push(cc);
        }
        Ok(Stiffness { ndim, values })
    }

    /// Allocates a new instance from the raw components of each cell
    ///
    /// Each cell must have ndim⁴ components with the minor and major symmetries.
    pub fn from_components(ndim: usize, values: Vec<Vec<f64>>) -> Result<Self, StrError> {
        if ndim != 2 && ndim != 3 {
            return Err("ndim must be 2 or 3");
        }
        let n4 = ndim * ndim * ndim * ndim;
        let idx = |i: usize, j: usize, k: usize, l: usize| ((i * ndim + j) * ndim + k) * ndim + l;
        for cc in &values {
            if cc.len() != n4 {
                return Err("the number of stiffness components must equal ndim⁴");
            }
            let max = cc.iter().fold(0.0, |acc: f64, v| f64::max(acc, f64::abs(*v)));
            let tol = SYMMETRY_TOLERANCE * f64::max(max, 1.0);
            for i in 0..ndim {
                for j in 0..ndim {
                    for k in 0..ndim {
                        for l in 0..ndim {
                            let c = cc[idx(i, j, k, l)];
                            if f64::abs(c - cc[idx(j, i, k, l)]) > tol
                                || f64::abs(c - cc[idx(i, j, l, k)]) > tol
                                || f64::abs(c - cc[idx(k, l, i, j)]) > tol
                            {
                                return Err("the stiffness tensor must have the minor and major symmetries");
                            }
                        }
                    }
                }
            }
        }
        Ok(Stiffness { ndim, values })
    }

    /// Returns the number of cells
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.values.len()
    }

    /// Returns the C_ijkl component of a cell
    #[inline]
    pub fn get(&self, cell: usize, i: usize, j: usize, k: usize, l: usize) -> f64 {
        let n = self.ndim;
        self.values[cell][((i * n + j) * n + k) * n + l]
    }

    /// Returns the mean shear stiffness of a cell, i.e., the mean of C_ijij with i ≠ j
    ///
    /// This value equals the shear modulus μ for isotropic materials.
    pub fn shear_modulus(&self, cell: usize) -> f64 {
        let n = self.ndim;
        let mut sum = 0.0;
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    sum += self.get(cell, i, j, i, j);
                }
            }
        }
        sum / ((n * n - n) as f64)
    }

    /// Calculates the matrix mapping the (row-major flattened) displacement gradient to the traction
    ///
    /// Returns the (ndim, ndim²) matrix `A` with `A[i][k·ndim + l] = Σ_j C_ijkl n_j`.
    pub fn traction_map(&self, cell: usize, normal: &[f64]) -> Matrix {
        let n = self.ndim;
        let mut aa = Matrix::new(n, n * n);
        for i in 0..n {
            for k in 0..n {
                for l in 0..n {
                    let mut sum = 0.0;
                    for j in 0..n {
                        sum += self.get(cell, i, j, k, l) * normal[j];
                    }
                    aa.set(i, k * n + l, sum);
                }
            }
        }
        aa
    }

    /// Calculates the stress tensor σ_ij = Σ_kl C_ijkl G_kl due to a displacement gradient
    ///
    /// The gradient is given by `grad[k][l] = ∂u_k/∂x_l`. Returns σ as a (ndim, ndim) matrix.
    pub fn stress(&self, cell: usize, grad: &Matrix) -> Matrix {
        let n = self.ndim;
        let mut sig = Matrix::new(n, n);
        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for k in 0..n {
                    for l in 0..n {
                        sum += self.get(cell, i, j, k, l) * grad.get(k, l);
                    }
                }
                sig.set(i, j, sum);
            }
        }
        sig
    }
}

/// Converts the Lamé parameters (μ, λ) to Young's modulus and Poisson's coefficient
pub fn young_poisson_from_lame(mu: f64, lambda: f64) -> Result<(f64, f64), StrError> {
    if mu <= 0.0 {
        return Err("the shear modulus μ must be > 0.0");
    }
    if lambda + mu <= 0.0 {
        return Err("the Lamé parameters must satisfy λ + μ > 0.0");
    }
    let young = mu * (3.0 * lambda + 2.0 * mu) / (lambda + mu);
    let poisson = lambda / (2.0 * (lambda + mu));
    Ok((young, poisson))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
