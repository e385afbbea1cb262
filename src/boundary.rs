//! Initial and Dirichlet boundary data.
//!
//! All functions take physical coordinates (radians, momentum), never
//! grid indices. The time argument is part of the contract even where
//! the values do not depend on it.

use crate::constants::PhysicalConstants;

/// How the pitch-angle maximum edge (usually 90 degrees) is treated.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum AngleMaxEdge {
    /// Zero flux across the edge, vertex values copied from the interior.
    #[default]
    Symmetric,
    /// Prescribed by `boundary_at_angle_max`.
    Dirichlet,
}

pub trait BoundaryConditions {
    /// Initial distribution at cell centers.
    fn init(&self, alpha0: f64, p: f64) -> f64;

    /// Value on the pitch-angle minimum edge.
    fn boundary_at_angle_min(&self, t: f64, p: f64) -> f64;

    /// Value on the momentum minimum edge.
    fn boundary_at_momentum_min(&self, t: f64, alpha0: f64) -> f64;

    /// Value on the momentum maximum edge.
    fn boundary_at_momentum_max(&self, t: f64, alpha0: f64) -> f64;

    fn angle_max_edge(&self) -> AngleMaxEdge {
        AngleMaxEdge::Symmetric
    }

    /// Only consulted when `angle_max_edge` is `Dirichlet`.
    fn boundary_at_angle_max(&self, _t: f64, _p: f64) -> f64 {
        0.0
    }
}

/// Loss-cone boundary of the reference radiation belt runs. The initial
/// spectrum is exponential in energy and vanishes at the loss cone; the
/// lowest-momentum edge keeps the initial values.
#[derive(Debug, Copy, Clone)]
pub struct LossConeBoundary {
    /// Loss-cone angle, radians.
    pub alpha0_lc: f64,
    pub pmin: f64,
    pub constants: PhysicalConstants,
}

impl LossConeBoundary {
    pub fn new(alpha0_lc: f64, pmin: f64, constants: PhysicalConstants) -> Self {
        LossConeBoundary {
            alpha0_lc,
            pmin,
            constants,
        }
    }
}

impl BoundaryConditions for LossConeBoundary {
    fn init(&self, alpha0: f64, p: f64) -> f64 {
        let e = self.constants.p2e(p);
        (-(e - 0.2) / 0.1).exp() * (alpha0.sin() - self.alpha0_lc.sin())
            / (p * p)
    }

    fn boundary_at_angle_min(&self, _t: f64, _p: f64) -> f64 {
        0.0
    }

    fn boundary_at_momentum_min(&self, _t: f64, alpha0: f64) -> f64 {
        self.init(alpha0, self.pmin)
    }

    fn boundary_at_momentum_max(&self, _t: f64, _alpha0: f64) -> f64 {
        0.0
    }
}

/// One constant Dirichlet value on all four edges, with an arbitrary
/// initial distribution.
pub struct UniformDirichlet<F: Fn(f64, f64) -> f64> {
    value: f64,
    init: F,
}

impl<F: Fn(f64, f64) -> f64> UniformDirichlet<F> {
    pub fn new(value: f64, init: F) -> Self {
        UniformDirichlet { value, init }
    }
}

impl<F: Fn(f64, f64) -> f64> BoundaryConditions for UniformDirichlet<F> {
    fn init(&self, alpha0: f64, p: f64) -> f64 {
        (self.init)(alpha0, p)
    }

    fn boundary_at_angle_min(&self, _t: f64, _p: f64) -> f64 {
        self.value
    }

    fn boundary_at_momentum_min(&self, _t: f64, _alpha0: f64) -> f64 {
        self.value
    }

    fn boundary_at_momentum_max(&self, _t: f64, _alpha0: f64) -> f64 {
        self.value
    }

    fn angle_max_edge(&self) -> AngleMaxEdge {
        AngleMaxEdge::Dirichlet
    }

    fn boundary_at_angle_max(&self, _t: f64, _p: f64) -> f64 {
        self.value
    }
}
