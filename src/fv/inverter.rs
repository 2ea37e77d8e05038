use super::LocalSystem;
use crate::base::{Config, Inverter};
use crate::StrError;
use rayon::prelude::*;
use russell_lab::{mat_inverse, mat_norm, mat_pseudo_inverse, Norm};
use std::collections::BTreeMap;

/// Defines the default number of local systems inverted together by the batched inverter
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Holds the identity of a local system that cannot be inverted
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SingularSystem {
    /// Index of the cluster
    pub cluster: usize,

    /// Node of the cluster
    pub node: usize,

    /// Reciprocal condition number in the 1-norm (zero if the factorization failed)
    pub rcond: f64,
}

/// Defines the strategy to compute the inverse of the local matrices M
///
/// An implementation must fill `mm_inv` of every local system or return an error
/// if any local matrix is singular (or too badly conditioned). Systems flagged as
/// `rotation_free` receive the pseudo-inverse of M.
///
/// **Note:** The node and cluster of a singular system are printed to stdout; use
/// `find_singular_systems` to retrieve them programmatically.
pub trait LocalInverter: Send + Sync {
    /// Computes the inverse of M for all local systems
    fn invert(&self, systems: &mut [LocalSystem]) -> Result<(), StrError>;
}

/// Inverts each local system independently with a dense LU factorization
pub struct DirectInverter {
    /// Runs in parallel
    pub parallel: bool,

    /// Smallest allowed reciprocal condition number
    pub tolerance: f64,
}

/// Groups the local systems by size and inverts each group by Gauss-Jordan elimination
///
/// The matrices of a group are interleaved in memory such that the innermost loops
/// run over the systems of the batch.
pub struct BatchedInverter {
    /// Runs the batches in parallel
    pub parallel: bool,

    /// Smallest allowed reciprocal condition number
    pub tolerance: f64,

    /// Maximum number of systems in a batch
    pub batch_size: usize,
}

/// Allocates the local inverter selected in the configuration
pub fn allocate_inverter(config: &Config) -> Box<dyn LocalInverter> {
    match config.inverter {
        Inverter::Direct => Box::new(DirectInverter {
            parallel: config.parallel,
            tolerance: config.singular_tolerance,
        }),
        Inverter::Batched => Box::new(BatchedInverter {
            parallel: config.parallel,
            tolerance: config.singular_tolerance,
            batch_size: DEFAULT_BATCH_SIZE,
        }),
    }
}

impl LocalInverter for DirectInverter {
    fn invert(&self, systems: &mut [LocalSystem]) -> Result<(), StrError> {
        if self.parallel {
            systems.par_iter_mut().map(|s| invert_direct(s, self.tolerance)).collect()
        } else {
            systems.iter_mut().map(|s| invert_direct(s, self.tolerance)).collect()
        }
    }
}

impl LocalInverter for BatchedInverter {
    fn invert(&self, systems: &mut [LocalSystem]) -> Result<(), StrError> {
        if self.batch_size < 1 {
            return Err("batch size must be ≥ 1");
        }
        let mut groups: BTreeMap<usize, Vec<&mut LocalSystem>> = BTreeMap::new();
        for system in systems.iter_mut() {
            if system.rotation_free {
                invert_pseudo(system)?;
            } else {
                groups.entry(system.dim()).or_insert_with(Vec::new).push(system);
            }
        }
        for group in groups.values_mut() {
            if self.parallel {
                group
                    .par_chunks_mut(self.batch_size)
                    .map(|batch| invert_batch(batch, self.tolerance))
                    .collect::<Result<(), StrError>>()?;
            } else {
                group
                    .chunks_mut(self.batch_size)
                    .map(|batch| invert_batch(batch, self.tolerance))
                    .collect::<Result<(), StrError>>()?;
            }
        }
        Ok(())
    }
}

/// Inverts a single local system
fn invert_direct(system: &mut LocalSystem, tolerance: f64) -> Result<(), StrError> {
    if system.rotation_free {
        return invert_pseudo(system);
    }
    let rcond = invert_and_rcond(system);
    if rcond == 0.0 || rcond < tolerance {
        return singular(system);
    }
    Ok(())
}

/// Computes the pseudo-inverse of M of a system whose sub-cell rotation is free
///
/// The null space of M holds the antisymmetric gradients, which T maps to zero.
fn invert_pseudo(system: &mut LocalSystem) -> Result<(), StrError> {
    let mut mm = system.mm.clone();
    if mat_pseudo_inverse(&mut system.mm_inv, &mut mm).is_err() {
        return singular(system);
    }
    if system.mm_inv.as_data().iter().any(|v| !v.is_finite()) {
        return singular(system);
    }
    Ok(())
}

/// Computes the inverse of M by LU factorization and returns the reciprocal condition number
///
/// Returns zero if the factorization fails.
pub fn invert_and_rcond(system: &mut LocalSystem) -> f64 {
    if mat_inverse(&mut system.mm_inv, &system.mm).is_err() {
        return 0.0;
    }
    reciprocal_condition(system)
}

/// Inverts a batch of local systems with the same dimension
///
/// The matrices are stored as `a[(i·n + j)·nb + b]` where b is the index in the batch.
fn invert_batch(batch: &mut [&mut LocalSystem], tolerance: f64) -> Result<(), StrError> {
    let nb = batch.len();
    if nb == 0 {
        return Ok(());
    }
    let n = batch[0].dim();
    let mut a = vec![0.0; n * n * nb];
    let mut x = vec![0.0; n * n * nb];
    for (b, system) in batch.iter().enumerate() {
        for i in 0..n {
            for j in 0..n {
                a[(i * n + j) * nb + b] = system.mm.get(i, j);
            }
            x[(i * n + i) * nb + b] = 1.0;
        }
    }

    let mut failed = vec![false; nb];
    let mut factor = vec![0.0; nb];
    for k in 0..n {
        // partial pivoting (per system)
        for b in 0..nb {
            if failed[b] {
                continue;
            }
            let mut p = k;
            let mut max = f64::abs(a[(k * n + k) * nb + b]);
            for i in (k + 1)..n {
                let v = f64::abs(a[(i * n + k) * nb + b]);
                if v > max {
                    max = v;
                    p = i;
                }
            }
            if max == 0.0 {
                failed[b] = true;
                continue;
            }
            if p != k {
                for j in 0..n {
                    a.swap((k * n + j) * nb + b, (p * n + j) * nb + b);
                    x.swap((k * n + j) * nb + b, (p * n + j) * nb + b);
                }
            }
        }

        // scale the pivot row
        for b in 0..nb {
            factor[b] = if failed[b] { 0.0 } else { 1.0 / a[(k * n + k) * nb + b] };
        }
        for j in 0..n {
            let row = (k * n + j) * nb;
            for b in 0..nb {
                a[row + b] *= factor[b];
                x[row + b] *= factor[b];
            }
        }

        // eliminate the other rows
        for i in 0..n {
            if i == k {
                continue;
            }
            for b in 0..nb {
                factor[b] = a[(i * n + k) * nb + b];
            }
            for j in 0..n {
                let row_i = (i * n + j) * nb;
                let row_k = (k * n + j) * nb;
                for b in 0..nb {
                    a[row_i + b] -= factor[b] * a[row_k + b];
                    x[row_i + b] -= factor[b] * x[row_k + b];
                }
            }
        }
    }

    for (b, system) in batch.iter_mut().enumerate() {
        if failed[b] {
            return singular(system);
        }
        for i in 0..n {
            for j in 0..n {
                system.mm_inv.set(i, j, x[(i * n + j) * nb + b]);
            }
        }
        check_inverse(system, tolerance)?;
    }
    Ok(())
}

/// Returns the reciprocal condition number in the 1-norm (zero if the inverse is not finite)
fn reciprocal_condition(system: &LocalSystem) -> f64 {
    if system.mm_inv.as_data().iter().any(|v| !v.is_finite()) {
        return 0.0;
    }
    let rcond = 1.0 / (mat_norm(&system.mm, Norm::One) * mat_norm(&system.mm_inv, Norm::One));
    if rcond.is_finite() {
        rcond
    } else {
        0.0
    }
}

/// Checks the inverse using the reciprocal condition number in the 1-norm
fn check_inverse(system: &LocalSystem, tolerance: f64) -> Result<(), StrError> {
    let rcond = reciprocal_condition(system);
    if rcond == 0.0 || rcond < tolerance {
        return singular(system);
    }
    Ok(())
}

/// Reports a singular local system
fn singular(system: &LocalSystem) -> Result<(), StrError> {
    println!(
        "ERROR: singular local system at node {} (cluster {})",
        system.node, system.cluster
    );
    Err("local system is singular")
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
