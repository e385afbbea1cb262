//! Plain-text and PNG snapshots of a run.
//!
//! Everything lands under `<root>/<run_id>/`:
//! the effective configuration `<run_id>.json`, the axes
//! `<run_id>_a0.dat` (degrees) and `<run_id>_E.dat` (MeV), and one
//! field matrix `<run_id><k>` per snapshot, with rows indexed by pitch
//! angle and columns by momentum.

use crate::constants::PhysicalConstants;
use crate::mesh::Mesh;
use crate::parameters::Parameters;
use nalgebra::DMatrix;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct OutputPaths {
    run_dir: PathBuf,
    run_id: String,
}

impl OutputPaths {
    pub fn new<P: AsRef<Path>>(root: P, run_id: &str) -> Self {
        OutputPaths {
            run_dir: root.as_ref().join(run_id),
            run_id: run_id.to_string(),
        }
    }

    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.run_dir)
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn config(&self) -> PathBuf {
        self.run_dir.join(format!("{}.json", self.run_id))
    }

    pub fn angles(&self) -> PathBuf {
        self.run_dir.join(format!("{}_a0.dat", self.run_id))
    }

    pub fn energies(&self) -> PathBuf {
        self.run_dir.join(format!("{}_E.dat", self.run_id))
    }

    pub fn snapshot(&self, k: usize) -> PathBuf {
        self.run_dir.join(format!("{}{}", self.run_id, k))
    }

    pub fn image(&self, k: usize) -> PathBuf {
        self.run_dir.join(format!("{}{}.png", self.run_id, k))
    }
}

pub fn write_config<P: AsRef<Path>>(
    parameters: &Parameters,
    path: &P,
) -> std::io::Result<()> {
    std::fs::write(path, parameters.to_json_pretty()?)
}

/// One value per line.
pub fn write_column<P: AsRef<Path>>(
    values: &[f64],
    path: &P,
) -> std::io::Result<()> {
    let mut output = std::io::BufWriter::new(std::fs::File::create(path)?);
    for v in values {
        writeln!(output, "{}", v)?;
    }
    output.flush()
}

/// Cell-center pitch angles in degrees and energies in MeV.
pub fn write_coordinates(
    mesh: &Mesh,
    constants: &PhysicalConstants,
    paths: &OutputPaths,
) -> std::io::Result<()> {
    let angles: Vec<f64> = mesh.xs().iter().map(|a| a.to_degrees()).collect();
    let energies: Vec<f64> =
        mesh.ys().iter().map(|&p| constants.p2e(p)).collect();
    write_column(&angles, &paths.angles())?;
    write_column(&energies, &paths.energies())
}

/// Rows are pitch-angle indices, columns momentum indices.
pub fn write_field<P: AsRef<Path>>(
    f: &DMatrix<f64>,
    path: &P,
) -> std::io::Result<()> {
    log::debug!("Writing: {:?}", path.as_ref());
    let mut output = std::io::BufWriter::new(std::fs::File::create(path)?);
    for i in 0..f.nrows() {
        for j in 0..f.ncols() {
            if j > 0 {
                write!(output, " ")?;
            }
            write!(output, "{:e}", f[(i, j)])?;
        }
        writeln!(output)?;
    }
    output.flush()
}

/// Read a matrix written by `write_field`.
pub fn read_field<P: AsRef<Path>>(path: &P) -> std::io::Result<DMatrix<f64>> {
    let text = std::fs::read_to_string(path)?;
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let row = line
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>().map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e)
                })
            })
            .collect::<std::io::Result<Vec<f64>>>()?;
        rows.push(row);
    }
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, |r| r.len());
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "ragged field matrix",
        ));
    }
    Ok(DMatrix::from_fn(nrows, ncols, |i, j| rows[i][j]))
}

/// Pitch angle along x, momentum along y with the highest momentum on
/// top, colored by value over the field maximum.
pub fn write_image<P: AsRef<Path>>(
    f: &DMatrix<f64>,
    path: &P,
) -> image::ImageResult<()> {
    let (nx, ny) = (f.nrows(), f.ncols());
    let max = f.iter().cloned().fold(0.0, f64::max);
    let scale = if max > 0.0 { 1.0 / max } else { 0.0 };
    let gradient = colorous::TURBO;
    let mut img = image::RgbImage::new(nx as u32, ny as u32);
    for j in 0..ny {
        for i in 0..nx {
            let r = (f[(i, j)] * scale).clamp(0.0, 1.0);
            let c = gradient.eval_continuous(r);
            img.put_pixel(
                i as u32,
                (ny - 1 - j) as u32,
                image::Rgb(c.as_array()),
            );
        }
    }
    img.save(path)
}
