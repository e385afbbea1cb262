//! Finite-volume integration of 2-D pitch-angle / momentum diffusion
//! with a Nonlinear Two-Point Flux Approximation (NTPFA) for the
//! cross terms of the diffusion tensor.
//!
//! The pieces are wired leaves first:
//! `Mesh` -> `DiffusionField` -> `Solver`, with a `BoundaryConditions`
//! implementor supplying the initial and Dirichlet data.

pub mod boundary;
pub mod build_info;
pub mod constants;
pub mod diffusion;
pub mod error;
pub mod mesh;
pub mod output;
pub mod parameters;
pub mod solver;
pub mod util;

pub use boundary::*;
pub use constants::*;
pub use diffusion::*;
pub use error::*;
pub use mesh::*;
pub use parameters::*;
pub use solver::*;
