//! Diffusion tensor field on the mesh.
//!
//! Coefficients come from an external table sampled on its own regular
//! grid: uniform in pitch angle, uniform in `ln(E)`. They are bilinearly
//! interpolated onto mesh cell centers once, at `t = 0`.

use crate::constants::PhysicalConstants;
use crate::error::TableError;
use crate::mesh::Mesh;
use crate::util::*;
use nalgebra::DMatrix;
use std::path::{Path, PathBuf};

/// Source of the per-cell diffusion tensor.
///
/// The time argument is part of the contract so time-varying tensors can
/// be plugged into the solver; `DiffusionField` ignores it.
pub trait DiffusionTensor {
    /// Tensor `[[Daa, Dap], [Dap, Dpp]]` at cell `(i, j)` and time `t`.
    fn tensor(&self, t: f64, i: usize, j: usize) -> Tensor;
}

/// Grid the external table is sampled on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TableGrid {
    pub n_alpha: usize,
    /// Radians.
    pub alpha_min: f64,
    pub alpha_max: f64,
    pub n_energy: usize,
    /// MeV.
    pub e_min: f64,
    pub e_max: f64,
}

/// Lower-left table index and interpolation weights for one query.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Loc {
    pub i0: usize,
    pub j0: usize,
    pub wi: f64,
    pub wj: f64,
}

impl TableGrid {
    pub fn d_alpha(&self) -> f64 {
        (self.alpha_max - self.alpha_min) / (self.n_alpha - 1) as f64
    }

    pub fn d_log_e(&self) -> f64 {
        (self.e_max.ln() - self.e_min.ln()) / (self.n_energy - 1) as f64
    }

    pub fn buffer_size(&self) -> usize {
        self.n_alpha * self.n_energy
    }

    /// Find the table cell containing `(alpha0, p)`. Queries outside the
    /// table are clamped onto the nearest edge sample.
    pub fn locate(
        &self,
        alpha0: f64,
        p: f64,
        constants: &PhysicalConstants,
    ) -> Loc {
        let log_e = constants.p2e(p).ln();
        let pos_alpha = (alpha0 - self.alpha_min) / self.d_alpha();
        let pos_e = (log_e - self.e_min.ln()) / self.d_log_e();

        let (i0, wi) = clamp_axis(pos_alpha, self.n_alpha);
        let (j0, wj) = clamp_axis(pos_e, self.n_energy);
        Loc { i0, j0, wi, wj }
    }
}

/// Weight is the share of the lower sample. A position on or past the
/// last grid line uses the last interval with all weight on its upper end.
fn clamp_axis(pos: f64, n: usize) -> (usize, f64) {
    debug_assert!(n >= 2);
    let lower = pos.floor();
    if lower < 0.0 || lower.is_nan() {
        (0, 1.0)
    } else if lower >= (n - 1) as f64 {
        (n - 2, 0.0)
    } else {
        (lower as usize, 1.0 - (pos - lower))
    }
}

/// Bilinear blend of the four samples around `loc`.
pub fn interpolate(table: &DMatrix<f64>, loc: &Loc) -> f64 {
    let Loc { i0, j0, wi, wj } = *loc;
    table[(i0, j0)] * wi * wj
        + table[(i0 + 1, j0)] * (1.0 - wi) * wj
        + table[(i0 + 1, j0 + 1)] * (1.0 - wi) * (1.0 - wj)
        + table[(i0, j0 + 1)] * wi * (1.0 - wj)
}

/// Raw coefficient tables, `n_alpha x n_energy` each, already denormalized.
#[derive(Debug, Clone)]
pub struct DiffusionTable {
    pub grid: TableGrid,
    pub daa: DMatrix<f64>,
    pub dap: DMatrix<f64>,
    pub dpp: DMatrix<f64>,
}

impl DiffusionTable {
    /// Read `<dir>/<id>/<id>.Daa`, `.Dap` and `.Dpp`.
    pub fn read<P: AsRef<Path>>(
        dir: P,
        id: &str,
        grid: TableGrid,
        constants: &PhysicalConstants,
    ) -> Result<Self, TableError> {
        let base = dir.as_ref().join(id);
        let path = |component: &str| -> PathBuf {
            base.join(format!("{}.{}", id, component))
        };
        let factor = constants.table_denormalization();
        let table = DiffusionTable {
            grid,
            daa: read_component(&path("Daa"), &grid, factor)?,
            dap: read_component(&path("Dap"), &grid, factor)?,
            dpp: read_component(&path("Dpp"), &grid, factor)?,
        };
        log::info!(
            "loaded diffusion table `{}` ({} x {}) from {:?}",
            id,
            grid.n_alpha,
            grid.n_energy,
            base
        );
        Ok(table)
    }
}

fn read_component(
    path: &Path,
    grid: &TableGrid,
    factor: f64,
) -> Result<DMatrix<f64>, TableError> {
    let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let values = parse_values(&text, grid, factor).map_err(|err| match err {
        ParseFailure::BadToken { position, token } => TableError::Parse {
            path: path.to_path_buf(),
            position,
            token,
        },
        ParseFailure::TooFew { found } => TableError::Truncated {
            path: path.to_path_buf(),
            expected: grid.buffer_size(),
            found,
        },
    })?;
    log::trace!("read {:?}", path);
    Ok(values)
}

#[derive(Debug, PartialEq)]
enum ParseFailure {
    BadToken { position: usize, token: String },
    TooFew { found: usize },
}

/// Values are listed angle-major: all energies for the first angle, then
/// the next angle. Anything after the expected count is ignored.
fn parse_values(
    text: &str,
    grid: &TableGrid,
    factor: f64,
) -> Result<DMatrix<f64>, ParseFailure> {
    let expected = grid.buffer_size();
    let mut values = Vec::with_capacity(expected);
    for (position, token) in text.split_whitespace().take(expected).enumerate() {
        let v: f64 = token.parse().map_err(|_| ParseFailure::BadToken {
            position,
            token: token.to_string(),
        })?;
        values.push(v * factor);
    }
    if values.len() < expected {
        return Err(ParseFailure::TooFew {
            found: values.len(),
        });
    }
    Ok(DMatrix::from_row_slice(grid.n_alpha, grid.n_energy, &values))
}

/// Diffusion tensor components at every mesh cell, in mesh coordinates.
#[derive(Debug, Clone)]
pub struct DiffusionField {
    daa: DMatrix<f64>,
    dap: DMatrix<f64>,
    dpp: DMatrix<f64>,
}

impl DiffusionField {
    /// Interpolate the table onto cell centers. The table is in
    /// (pitch angle, energy) units; the mesh uses momentum, hence the
    /// division of `Daa` by `p^2` and `Dap` by `p`.
    pub fn from_table(
        mesh: &Mesh,
        table: &DiffusionTable,
        constants: &PhysicalConstants,
    ) -> Self {
        let (nx, ny) = (mesh.nx(), mesh.ny());
        let mut daa = DMatrix::zeros(nx, ny);
        let mut dap = DMatrix::zeros(nx, ny);
        let mut dpp = DMatrix::zeros(nx, ny);
        for i in 0..nx {
            let a = mesh.x(i);
            for j in 0..ny {
                let p = mesh.y(j);
                let loc = table.grid.locate(a, p, constants);
                daa[(i, j)] = interpolate(&table.daa, &loc) / (p * p);
                dap[(i, j)] = interpolate(&table.dap, &loc) / p;
                dpp[(i, j)] = interpolate(&table.dpp, &loc);
            }
        }
        DiffusionField { daa, dap, dpp }
    }

    /// The same tensor in every cell.
    pub fn uniform(mesh: &Mesh, daa: f64, dap: f64, dpp: f64) -> Self {
        let (nx, ny) = (mesh.nx(), mesh.ny());
        DiffusionField {
            daa: DMatrix::from_element(nx, ny, daa),
            dap: DMatrix::from_element(nx, ny, dap),
            dpp: DMatrix::from_element(nx, ny, dpp),
        }
    }

    pub fn daa(&self, _t: f64, i: usize, j: usize) -> f64 {
        self.daa[(i, j)]
    }

    pub fn dap(&self, _t: f64, i: usize, j: usize) -> f64 {
        self.dap[(i, j)]
    }

    pub fn dpp(&self, _t: f64, i: usize, j: usize) -> f64 {
        self.dpp[(i, j)]
    }
}

impl DiffusionTensor for DiffusionField {
    fn tensor(&self, t: f64, i: usize, j: usize) -> Tensor {
        let ap = self.dap(t, i, j);
        matrix![self.daa(t, i, j), ap; ap, self.dpp(t, i, j)]
    }
}
