use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_sparse::{CooMatrix, CsrMatrix, Sym};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds a sparse linear operator in compressed sparse row (CSR) format
///
/// The column indices of each row are sorted and unique. An operator without
/// entries holds a single explicit zero at (0,0).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SparseOperator {
    /// Holds the CSR matrix
    pub csr: CsrMatrix,
}

impl SparseOperator {
    /// Allocates a new instance by converting a COO matrix (duplicates are summed)
    ///
    /// The duplicates are summed in the order they were inserted; thus the result
    /// depends only on the order of the entries of the COO matrix.
    pub fn from_coo(coo: &CooMatrix) -> Result<Self, StrError> {
        let (nrow, ncol, nnz, _) = coo.get_info();
        let csr = if nnz == 0 {
            let mut zero = CooMatrix::new(nrow, ncol, 1, Sym::No)?;
            zero.put(0, 0, 0.0)?;
            CsrMatrix::from_coo(&zero)?
        } else {
            CsrMatrix::from_coo(coo)?
        };
        Ok(SparseOperator { csr })
    }

    /// Returns the number of rows
    #[inline]
    pub fn nrow(&self) -> usize {
        self.csr.get_info().0
    }

    /// Returns the number of columns
    #[inline]
    pub fn ncol(&self) -> usize {
        self.csr.get_info().1
    }

    /// Returns the number of stored entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.csr.get_info().2
    }

    /// Returns the range of positions of the entries of row i
    fn row_range(&self, i: usize) -> (usize, usize) {
        let pp = self.csr.get_row_pointers();
        (pp[i] as usize, pp[i + 1] as usize)
    }

    /// Returns the (i,j) entry (zero if not stored)
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (start, end) = self.row_range(i);
        match self.csr.get_col_indices()[start..end].binary_search(&(j as i32)) {
            Ok(p) => self.csr.get_values()[start + p],
            Err(_) => 0.0,
        }
    }

    /// Returns the column indices of the entries of row i
    pub fn row_columns(&self, i: usize) -> Vec<usize> {
        let (start, end) = self.row_range(i);
        self.csr.get_col_indices()[start..end].iter().map(|j| *j as usize).collect()
    }

    /// Returns the values of the entries of row i
    pub fn row_values(&self, i: usize) -> &[f64] {
        let (start, end) = self.row_range(i);
        &self.csr.get_values()[start..end]
    }

    /// Performs the matrix-vector multiplication v := α · A · u
    pub fn mat_vec_mul(&self, v: &mut Vector, alpha: f64, u: &Vector) -> Result<(), StrError> {
        self.csr.mat_vec_mul(v, alpha, u)
    }

    /// Computes the product C = A · B of this operator (A) with another one (B)
    pub fn mat_mat_mul(&self, other: &SparseOperator) -> Result<SparseOperator, StrError> {
        if self.ncol() != other.nrow() {
            return Err("operators are incompatible for multiplication");
        }
        let (nrow, ncol) = (self.nrow(), other.ncol());
        let (a_cols, a_vals) = (self.csr.get_col_indices(), self.csr.get_values());
        let (b_cols, b_vals) = (other.csr.get_col_indices(), other.csr.get_values());
        let mut entries: Vec<(usize, usize, f64)> = Vec::new();
        let mut work = vec![0.0; ncol];
        let mut used = vec![false; ncol];
        let mut pattern = Vec::new();
        for i in 0..nrow {
            pattern.clear();
            let (start, end) = self.row_range(i);
            for p in start..end {
                let k = a_cols[p] as usize;
                let (first, last) = other.row_range(k);
                for q in first..last {
                    let j = b_cols[q] as usize;
                    if !used[j] {
                        used[j] = true;
                        pattern.push(j);
                    }
                    work[j] += a_vals[p] * b_vals[q];
                }
            }
            pattern.sort();
            for j in &pattern {
                entries.push((i, *j, work[*j]));
                work[*j] = 0.0;
                used[*j] = false;
            }
        }
        let mut coo = CooMatrix::new(nrow, ncol, usize::max(1, entries.len()), Sym::No)?;
        for (i, j, v) in entries {
            coo.put(i, j, v)?;
        }
        SparseOperator::from_coo(&coo)
    }

    /// Returns the dense representation
    pub fn as_dense(&self) -> Matrix {
        self.csr.as_dense()
    }

    /// Converts this operator into a COO matrix (e.g., to be used by a sparse solver)
    pub fn to_coo(&self) -> Result<CooMatrix, StrError> {
        let mut coo = CooMatrix::new(self.nrow(), self.ncol(), self.nnz(), Sym::No)?;
        let (cols, vals) = (self.csr.get_col_indices(), self.csr.get_values());
        for i in 0..self.nrow() {
            let (start, end) = self.row_range(i);
            for p in start..end {
                coo.put(i, cols[p] as usize, vals[p])?;
            }
        }
        Ok(coo)
    }

    /// Returns the maximum absolute difference between the entries of two operators
    pub fn max_abs_diff(&self, other: &SparseOperator) -> Result<f64, StrError> {
        if self.nrow() != other.nrow() || self.ncol() != other.ncol() {
            return Err("operators must have the same dimensions to be compared");
        }
        let mut max = 0.0;
        for i in 0..self.nrow() {
            for (j, v) in self.row_columns(i).iter().zip(self.row_values(i)) {
                max = f64::max(max, f64::abs(v - other.get(i, *j)));
            }
            for (j, v) in other.row_columns(i).iter().zip(other.row_values(i)) {
                max = f64::max(max, f64::abs(self.get(i, *j) - v));
            }
        }
        Ok(max)
    }

    /// Reads a JSON file containing the operator
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let input = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(input);
        let operator: SparseOperator = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        let (nrow, _, _, _) = operator.csr.get_info();
        let pp = operator.csr.get_row_pointers();
        if pp.len() != nrow + 1
            || operator.csr.get_col_indices().len() < pp[nrow] as usize
            || operator.csr.get_values().len() < pp[nrow] as usize
        {
            return Err("JSON file contains an inconsistent operator");
        }
        Ok(operator)
    }

    /// Writes a JSON file with the operator
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
