//! Run configuration.
//!
//! The file is JSON with three sections:
//!
//! ```json
//! {
//!   "basic": {
//!     "run_id": "ntpfa_L45", "nalpha0": 90, "nE": 100,
//!     "L": 4.5, "alpha0_min_bct": 1,
//!     "Emin": 0.2, "Emax": 5.0, "T": 1.0, "nsteps": 1000
//!   },
//!   "diagnostics": { "nplots": 10 },
//!   "diffusion_coefficients": {
//!     "dID": "chorus", "nalpha0_D": 90, "alpha0_min_D": 0.5,
//!     "alpha0_max_D": 89.5, "nE_D": 100, "Emin_D": 0.1, "Emax_D": 10.0
//!   }
//! }
//! ```
//!
//! Angles are in degrees in the file and radians everywhere else.

use crate::constants::PhysicalConstants;
use crate::diffusion::TableGrid;
use crate::error::ConfigError;
use crate::mesh::MeshSpec;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BasicSection {
    pub run_id: String,
    pub nalpha0: usize,
    #[serde(rename = "nE")]
    pub n_e: usize,
    /// L shell, sets the loss cone.
    #[serde(rename = "L")]
    pub l_shell: f64,
    /// 0: the grid starts at zero pitch angle, otherwise at the loss cone.
    pub alpha0_min_bct: i32,
    /// MeV.
    #[serde(rename = "Emin")]
    pub e_min: f64,
    #[serde(rename = "Emax")]
    pub e_max: f64,
    /// Total simulated time, days.
    #[serde(rename = "T")]
    pub total_time: f64,
    pub nsteps: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiagnosticsSection {
    pub nplots: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiffusionSection {
    #[serde(rename = "dID")]
    pub d_id: String,
    #[serde(rename = "nalpha0_D")]
    pub nalpha0: usize,
    /// Degrees.
    #[serde(rename = "alpha0_min_D")]
    pub alpha0_min: f64,
    #[serde(rename = "alpha0_max_D")]
    pub alpha0_max: f64,
    #[serde(rename = "nE_D")]
    pub n_e: usize,
    #[serde(rename = "Emin_D")]
    pub e_min: f64,
    #[serde(rename = "Emax_D")]
    pub e_max: f64,
}

/// Contents of the configuration file, as written.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParameterFile {
    pub basic: BasicSection,
    pub diagnostics: DiagnosticsSection,
    pub diffusion_coefficients: DiffusionSection,
}

/// Quantities computed from the file.
#[derive(Serialize, Debug, Copy, Clone, PartialEq)]
pub struct DerivedParameters {
    pub alpha0_lc: f64,
    pub alpha0_min: f64,
    pub alpha0_max: f64,
    pub pmin: f64,
    pub pmax: f64,
    pub nsteps: usize,
    pub save_every_step: usize,
    pub dt: f64,
}

/// Validated configuration.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Parameters {
    #[serde(flatten)]
    file: ParameterFile,
    derived: DerivedParameters,
}

impl Parameters {
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        constants: &PhysicalConstants,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let file: ParameterFile =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let parameters = Self::new(file, constants)?;
        log::info!("read parameters from {:?}", path);
        Ok(parameters)
    }

    pub fn from_json_str(
        text: &str,
        constants: &PhysicalConstants,
    ) -> Result<Self, ConfigError> {
        let file: ParameterFile =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        Self::new(file, constants)
    }

    pub fn new(
        file: ParameterFile,
        constants: &PhysicalConstants,
    ) -> Result<Self, ConfigError> {
        validate(&file)?;
        let basic = &file.basic;

        let l = basic.l_shell;
        let alpha0_lc = (l.powi(5) * (4.0 * l - 3.0)).powf(-0.25).asin();
        let alpha0_min = if basic.alpha0_min_bct == 0 {
            0.0
        } else {
            alpha0_lc
        };
        let alpha0_max = FRAC_PI_2;
        if alpha0_min >= alpha0_max {
            return Err(ConfigError::invalid(
                "L",
                format!("loss cone {} rad leaves no pitch angle range", alpha0_lc),
            ));
        }

        // nsteps is rounded down to a whole number of snapshots
        let save_every_step = basic.nsteps / file.diagnostics.nplots;
        let nsteps = save_every_step * file.diagnostics.nplots;

        let derived = DerivedParameters {
            alpha0_lc,
            alpha0_min,
            alpha0_max,
            pmin: constants.e2p(basic.e_min),
            pmax: constants.e2p(basic.e_max),
            nsteps,
            save_every_step,
            dt: basic.total_time / nsteps as f64,
        };
        if nsteps != basic.nsteps {
            log::warn!(
                "nsteps {} rounded down to {} ({} snapshots)",
                basic.nsteps,
                nsteps,
                file.diagnostics.nplots
            );
        }
        Ok(Parameters { file, derived })
    }

    pub fn file(&self) -> &ParameterFile {
        &self.file
    }

    pub fn run_id(&self) -> &str {
        &self.file.basic.run_id
    }

    pub fn nalpha0(&self) -> usize {
        self.file.basic.nalpha0
    }

    pub fn n_e(&self) -> usize {
        self.file.basic.n_e
    }

    pub fn alpha0_lc(&self) -> f64 {
        self.derived.alpha0_lc
    }

    pub fn alpha0_min(&self) -> f64 {
        self.derived.alpha0_min
    }

    pub fn alpha0_max(&self) -> f64 {
        self.derived.alpha0_max
    }

    pub fn pmin(&self) -> f64 {
        self.derived.pmin
    }

    pub fn pmax(&self) -> f64 {
        self.derived.pmax
    }

    pub fn total_time(&self) -> f64 {
        self.file.basic.total_time
    }

    pub fn nsteps(&self) -> usize {
        self.derived.nsteps
    }

    pub fn dt(&self) -> f64 {
        self.derived.dt
    }

    pub fn nplots(&self) -> usize {
        self.file.diagnostics.nplots
    }

    pub fn save_every_step(&self) -> usize {
        self.derived.save_every_step
    }

    pub fn d_id(&self) -> &str {
        &self.file.diffusion_coefficients.d_id
    }

    pub fn mesh_spec(&self) -> MeshSpec {
        let nx = self.nalpha0();
        let ny = self.n_e();
        MeshSpec {
            nx,
            ny,
            x_origin: self.alpha0_min(),
            y_origin: self.pmin(),
            dx: (self.alpha0_max() - self.alpha0_min()) / nx as f64,
            dy: (self.pmax() - self.pmin()) / ny as f64,
        }
    }

    pub fn table_grid(&self) -> TableGrid {
        let d = &self.file.diffusion_coefficients;
        TableGrid {
            n_alpha: d.nalpha0,
            alpha_min: d.alpha0_min.to_radians(),
            alpha_max: d.alpha0_max.to_radians(),
            n_energy: d.n_e,
            e_min: d.e_min,
            e_max: d.e_max,
        }
    }

    /// Pretty JSON of the file contents plus the derived quantities.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("must be positive, got {}", value)))
    }
}

fn validate(file: &ParameterFile) -> Result<(), ConfigError> {
    let b = &file.basic;
    if b.run_id.trim().is_empty() {
        return Err(ConfigError::invalid("run_id", "must not be empty"));
    }
    if b.nalpha0 == 0 {
        return Err(ConfigError::invalid("nalpha0", "must be at least 1"));
    }
    if b.n_e == 0 {
        return Err(ConfigError::invalid("nE", "must be at least 1"));
    }
    if !(b.l_shell.is_finite() && b.l_shell >= 1.0) {
        return Err(ConfigError::invalid(
            "L",
            format!("must be at least 1, got {}", b.l_shell),
        ));
    }
    positive("Emin", b.e_min)?;
    positive("Emax", b.e_max)?;
    if b.e_max <= b.e_min {
        return Err(ConfigError::invalid("Emax", "must exceed Emin"));
    }
    positive("T", b.total_time)?;
    if b.nsteps == 0 {
        return Err(ConfigError::invalid("nsteps", "must be at least 1"));
    }

    let nplots = file.diagnostics.nplots;
    if nplots == 0 || nplots > b.nsteps {
        return Err(ConfigError::invalid(
            "nplots",
            format!("must be between 1 and nsteps = {}, got {}", b.nsteps, nplots),
        ));
    }

    let d = &file.diffusion_coefficients;
    if d.d_id.trim().is_empty() {
        return Err(ConfigError::invalid("dID", "must not be empty"));
    }
    if d.nalpha0 < 2 {
        return Err(ConfigError::invalid("nalpha0_D", "table needs at least 2 angles"));
    }
    if d.n_e < 2 {
        return Err(ConfigError::invalid("nE_D", "table needs at least 2 energies"));
    }
    if !(d.alpha0_min.is_finite() && d.alpha0_max.is_finite())
        || d.alpha0_max <= d.alpha0_min
        || d.alpha0_min < 0.0
        || d.alpha0_max > 180.0
    {
        return Err(ConfigError::invalid(
            "alpha0_max_D",
            format!(
                "table angles must satisfy 0 <= min < max <= 180, got {} .. {}",
                d.alpha0_min, d.alpha0_max
            ),
        ));
    }
    positive("Emin_D", d.e_min)?;
    positive("Emax_D", d.e_max)?;
    if d.e_max <= d.e_min {
        return Err(ConfigError::invalid("Emax_D", "must exceed Emin_D"));
    }
    Ok(())
}
