use super::{Bc, Dof, Grid};
use crate::StrError;
use std::collections::HashMap;
use std::fmt;

/// Holds the kind of boundary condition of each (boundary face, displacement component) pair
///
/// Every boundary face must have exactly one kind per displacement component and interior
/// faces must have none. The prescribed values (the boundary data) are given separately,
/// as a vector of length `num_faces · ndim` indexed by `face · ndim + k`.
pub struct BoundaryCondition {
    pub all: HashMap<(usize, Dof), Bc>,
}

impl BoundaryCondition {
    /// Allocates a new (empty) instance
    pub fn new() -> Self {
        BoundaryCondition { all: HashMap::new() }
    }

    /// Allocates a new instance with the same kind on all components of all boundary faces
    pub fn new_uniform(grid: &Grid, bc: Bc) -> Self {
        let mut res = BoundaryCondition::new();
        res.set_all_dofs(&grid.boundary_faces(), grid.ndim, bc);
        res
    }

    /// Sets the kind of boundary condition of a component on some faces
    pub fn set(&mut self, faces: &[usize], dof: Dof, bc: Bc) -> &mut Self {
        for face in faces {
            self.all.insert((*face, dof), bc);
        }
        self
    }

    /// Sets the kind of boundary condition of all components on some faces
    pub fn set_all_dofs(&mut self, faces: &[usize], ndim: usize, bc: Bc) -> &mut Self {
        for dof in Dof::all(ndim) {
            self.set(faces, *dof, bc);
        }
        self
    }

    /// Returns the kind of boundary condition of a face component (if any)
    #[inline]
    pub fn kind(&self, face: usize, dof: Dof) -> Option<Bc> {
        self.all.get(&(face, dof)).copied()
    }

    /// Checks that the boundary conditions are consistent with the grid
    pub fn validate(&self, grid: &Grid) -> Result<(), StrError> {
        let mut keys: Vec<_> = self.all.keys().collect();
        keys.sort();
        for (face, dof) in keys {
            if *face >= grid.num_faces {
                return Err("boundary condition refers to a non-existent face");
            }
            if dof.index() >= grid.ndim {
                return Err("boundary condition component is incompatible with ndim");
            }
            if !grid.is_boundary_face(*face) {
                return Err("boundary condition cannot be assigned to an interior face");
            }
        }
        for face in grid.boundary_faces() {
            for dof in Dof::all(grid.ndim) {
                if !self.all.contains_key(&(face, *dof)) {
                    return Err("boundary face is missing the boundary condition of a component");
                }
            }
        }
        Ok(())
    }

    /// Returns the faces (sorted) whose component is of the given kind
    pub fn faces_with(&self, dof: Dof, bc: Bc) -> Vec<usize> {
        let mut faces: Vec<_> = self
            .all
            .iter()
            .filter(|((_, d), b)| *d == dof && **b == bc)
            .map(|((f, _), _)| *f)
            .collect();
        faces.sort();
        faces
    }
}

impl fmt::Display for BoundaryCondition {
    /// Prints a formatted summary of Boundary Conditions
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Boundary conditions\n").unwrap();
        write!(f, "===================\n").unwrap();
        let mut entries: Vec<_> = self.all.iter().collect();
        entries.sort_by_key(|(key, _)| **key);
        for (key, bc) in entries {
            write!(f, "{:?} : {:?} = {}\n", key.0, key.1, bc).unwrap();
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
