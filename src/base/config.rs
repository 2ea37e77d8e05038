use super::Inverter;
use crate::StrError;
use russell_sparse::Genie;
use std::fmt;

/// Defines the default tolerance on the reciprocal condition number of the local systems
pub const DEFAULT_SINGULAR_TOLERANCE: f64 = 1e-13;

/// Defines the continuity-point parameter η used on simplex grids (when not set)
pub const DEFAULT_ETA_SIMPLEX: f64 = 1.0 / 3.0;

/// Defines the default scaling factor of the rotational stabilization
pub const DEFAULT_STABILIZATION: f64 = 1.0;

/// Holds the configuration of the discretization
pub struct Config {
    /// Space dimension
    pub ndim: usize,

    /// Location of the continuity points along the sub-faces
    ///
    /// The continuity point of the sub-face (face f, node n) is `x_f + η (x_n - x_f)`.
    /// If None, η = 1/3 for simplex grids and η = 0 otherwise.
    pub eta: Option<f64>,

    /// Scaling factor of the rotational stabilization of the interior traction continuity
    ///
    /// The interior traction rows use `(C:G)·n + κ (G - Gᵀ)·n` with `κ = stabilization · μ`,
    /// where μ is the mean shear stiffness of the cell. Zero disables the stabilization; in
    /// this case, the local systems of Cartesian grids are singular.
    pub stabilization: f64,

    /// Strategy to invert the local systems
    pub inverter: Inverter,

    /// Runs the local computations in parallel (rayon thread pool)
    pub parallel: bool,

    /// Smallest allowed reciprocal condition number of a local system
    pub singular_tolerance: f64,

    /// 2D plane-stress problem, otherwise plane-strain in 2D
    pub plane_stress: bool,

    /// Linear solver used to solve the global system
    pub lin_sol_genie: Genie,

    /// Prints a summary of the assembly
    pub verbose: bool,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new(ndim: usize) -> Self {
        Config {
            ndim,
            eta: None,
            stabilization: DEFAULT_STABILIZATION,
            inverter: Inverter::Direct,
            parallel: false,
            singular_tolerance: DEFAULT_SINGULAR_TOLERANCE,
            plane_stress: false,
            lin_sol_genie: Genie::Umfpack,
            verbose: false,
        }
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.ndim != 2 && self.ndim != 3 {
            return Some(format!("ndim = {:?} is incorrect; it must be 2 or 3", self.ndim));
        }
        if let Some(eta) = self.eta {
            if eta < 0.0 || eta >= 1.0 {
                return Some(format!("eta = {:?} is incorrect; it must be 0.0 ≤ η < 1.0", eta));
            }
        }
        if self.stabilization < 0.0 {
            return Some(format!(
                "stabilization = {:?} is incorrect; it must be ≥ 0.0",
                self.stabilization
            ));
        }
        if self.singular_tolerance < 0.0 || self.singular_tolerance >= 1.0 {
            return Some(format!(
                "singular_tolerance = {:?} is incorrect; it must be 0.0 ≤ tol < 1.0",
                self.singular_tolerance
            ));
        }
        if self.plane_stress && self.ndim == 3 {
            return Some("plane_stress = true is incorrect in 3D".to_string());
        }
        None // all good
    }

    /// Sets the continuity-point parameter η
    pub fn set_eta(&mut self, eta: f64) -> &mut Self {
        self.eta = Some(eta);
        self
    }

    /// Sets the scaling factor of the rotational stabilization
    pub fn set_stabilization(&mut self, value: f64) -> &mut Self {
        self.stabilization = value;
        self
    }

    /// Sets the strategy to invert the local systems
    pub fn set_inverter(&mut self, inverter: Inverter) -> &mut Self {
        self.inverter = inverter;
        self
    }

    /// Enables or disables the parallel computation of the local systems
    pub fn set_parallel(&mut self, flag: bool) -> &mut Self {
        self.parallel = flag;
        self
    }

    /// Sets the smallest allowed reciprocal condition number of a local system
    pub fn set_singular_tolerance(&mut self, value: f64) -> &mut Self {
        self.singular_tolerance = value;
        self
    }

    /// Sets a 2D plane-stress problem, otherwise plane-strain in 2D
    pub fn set_plane_stress(&mut self, flag: bool) -> &mut Self {
        self.plane_stress = flag;
        self
    }

    /// Sets the linear solver used to solve the global system
    pub fn set_lin_sol_genie(&mut self, genie: Genie) -> &mut Self {
        self.lin_sol_genie = genie;
        self
    }

    /// Enables or disables the printing of the assembly summary
    pub fn set_verbose(&mut self, flag: bool) -> &mut Self {
        self.verbose = flag;
        self
    }

    /// Returns the continuity-point parameter η for a grid (simplex or not)
    pub fn eta_for(&self, simplex: bool) -> f64 {
        match self.eta {
            Some(eta) => eta,
            None => {
                if simplex {
                    DEFAULT_ETA_SIMPLEX
                } else {
                    0.0
                }
            }
        }
    }

    /// Validates the configuration and prints the error message, if any
    pub(crate) fn check(&self) -> Result<(), StrError> {
        if let Some(msg) = self.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate discretization because config.validate() failed");
        }
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration data\n").unwrap();
        write!(f, "==================\n").unwrap();
        write!(f, "ndim = {:?}\n", self.ndim).unwrap();
        write!(f, "eta = {:?}\n", self.eta).unwrap();
        write!(f, "stabilization = {:?}\n", self.stabilization).unwrap();
        write!(f, "inverter = {:?}\n", self.inverter).unwrap();
        write!(f, "parallel = {:?}\n", self.parallel).unwrap();
        write!(f, "singular_tolerance = {:?}\n", self.singular_tolerance).unwrap();
        write!(f, "plane_stress = {:?}\n", self.plane_stress).unwrap();
        write!(f, "lin_sol_genie = {:?}\n", self.lin_sol_genie).unwrap();
        write!(f, "verbose = {:?}\n", self.verbose).unwrap();
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
