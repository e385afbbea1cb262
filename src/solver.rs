//! NTPFA finite-volume assembly and implicit time stepping.
//!
//! Every step builds `M f = R` from scratch. Interior edges use the
//! nonlinear two-point flux: each side of an edge forms its own flux
//! estimate from the vertex values at the edge endpoints, the two
//! estimates are blended with state dependent weights, and the
//! remainder is split into positive and negative parts so the matrix
//! keeps a monotone structure. The vertex values come from the previous
//! step's solution, so the linearization lags by one step.

use crate::boundary::{AngleMaxEdge, BoundaryConditions};
use crate::diffusion::DiffusionTensor;
use crate::error::SolverError;
use crate::mesh::{Direction, Edge, Mesh};
use crate::util::*;
use faer::prelude::*;
use faer::sparse::SparseColMat;
use faer::Mat;
use nalgebra::{DMatrix, DVector};

/// Added to the field value before dividing by it.
pub const FIELD_FLOOR: f64 = 1e-15;

/// One-sided flux coefficients of a cell across one of its edges,
/// attached to the edge endpoints A and B.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct OneSidedFlux {
    pub a: f64,
    pub b: f64,
}

impl OneSidedFlux {
    pub fn sum(&self) -> f64 {
        self.a + self.b
    }

    /// Flux estimate from the values at the two endpoints.
    pub fn estimate(&self, f_a: f64, f_b: f64) -> f64 {
        self.a * f_a + self.b * f_b
    }
}

/// Jacobian of the (pitch angle, momentum) coordinates.
pub fn jacobian(alpha: f64, p: f64) -> f64 {
    let t = 1.30 - 0.56 * alpha.sin();
    p * p * p * t * alpha.sin() * alpha.cos()
}

/// `(x, y)` rotated 90 degrees clockwise.
fn rot(v: &Point) -> Point {
    vector![v[1], -v[0]]
}

/// One-sided flux coefficients of cell center `k` with tensor `lambda`
/// across the edge `a -> b`.
pub fn one_sided_flux(
    lambda: &Tensor,
    k: &Point,
    a: &Point,
    b: &Point,
) -> OneSidedFlux {
    let xak = a - k;
    let xbk = b - k;
    let ba = b - a;
    let sigma = ba.norm();
    let normal = rot(&ba) / sigma;

    let rxak = rot(&xak);
    let rxbk = rot(&xbk);
    // n^T Lambda
    let n_lambda = lambda.transpose() * normal;

    OneSidedFlux {
        a: sigma * n_lambda.dot(&rxbk) / xak.dot(&rxbk),
        b: sigma * n_lambda.dot(&rxak) / xbk.dot(&rxak),
    }
}

/// Convex weight of the K side, `|aL| / (|aK| + |aL|)`.
pub fn weight(a_k: f64, a_l: f64) -> f64 {
    if a_k != 0.0 || a_l != 0.0 {
        a_l.abs() / (a_k.abs() + a_l.abs())
    } else {
        0.5
    }
}

pub fn plus(x: f64) -> f64 {
    (x.abs() + x) / 2.0
}

pub fn minus(x: f64) -> f64 {
    (x.abs() - x) / 2.0
}

/// Time integrator for the field on `mesh`.
///
/// The collaborators are borrowed for the lifetime of the solver and
/// never modified.
pub struct Solver<'a, Field: DiffusionTensor, BC: BoundaryConditions> {
    mesh: &'a Mesh,
    diffusion: &'a Field,
    bcs: &'a BC,

    dt: f64,
    t: f64,

    f: DMatrix<f64>,
    rhs: DVector<f64>,
    triplets: Vec<(usize, usize, f64)>,

    // indexed by 4 * ind2to1(i, j) + direction
    alpha_osf: Vec<OneSidedFlux>,

    // f at the (nx + 1) x (ny + 1) vertices, source of the edge endpoint values
    vertex_f: DMatrix<f64>,
}

impl<'a, Field: DiffusionTensor, BC: BoundaryConditions> Solver<'a, Field, BC> {
    pub fn new(
        mesh: &'a Mesh,
        diffusion: &'a Field,
        bcs: &'a BC,
        dt: f64,
    ) -> Self {
        debug_assert!(dt > 0.0);
        let (nx, ny) = (mesh.nx(), mesh.ny());
        let n = mesh.n_cells();
        let mut solver = Solver {
            mesh,
            diffusion,
            bcs,
            dt,
            t: 0.0,
            f: DMatrix::zeros(nx, ny),
            rhs: DVector::zeros(n),
            triplets: Vec::with_capacity(10 * n),
            alpha_osf: vec![OneSidedFlux::default(); 4 * n],
            vertex_f: DMatrix::zeros(nx + 1, ny + 1),
        };
        solver.init();
        solver
    }

    fn init(&mut self) {
        let mesh = self.mesh;
        for j in 0..mesh.ny() {
            for i in 0..mesh.nx() {
                self.f[(i, j)] = self.bcs.init(mesh.x(i), mesh.y(j));
            }
        }
        self.t = 0.0;
        self.construct_alpha_osf();
        self.update_vertex_f();
        log::info!(
            "solver ready: {} cells, dt = {:e}, angle max edge {:?}",
            mesh.n_cells(),
            self.dt,
            self.bcs.angle_max_edge()
        );
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Field values, `nx x ny`.
    pub fn f(&self) -> &DMatrix<f64> {
        &self.f
    }

    pub fn vertex_f(&self) -> &DMatrix<f64> {
        &self.vertex_f
    }

    pub fn one_sided(&self, i: usize, j: usize, d: Direction) -> OneSidedFlux {
        self.alpha_osf[4 * self.mesh.ind2to1(i, j) + d.index()]
    }

    /// `sum(G f dx dy)`, the quantity the mass term conserves.
    pub fn phase_space_content(&self) -> f64 {
        let mesh = self.mesh;
        let mut total = 0.0;
        for j in 0..mesh.ny() {
            for i in 0..mesh.nx() {
                total += jacobian(mesh.x(i), mesh.y(j)) * self.f[(i, j)];
            }
        }
        total * mesh.area()
    }

    /// `sum(f dx dy)`.
    pub fn plain_content(&self) -> f64 {
        self.f.sum() * self.mesh.area()
    }

    /// Advance the field by one step of `dt`.
    /// On error the field and time are left unchanged.
    pub fn update(&mut self) -> Result<(), SolverError> {
        profiling::scope!("Solver::update");
        self.rhs.fill(0.0);
        self.triplets.clear();

        self.construct_alpha_osf();
        self.assemble();
        let f_new = self.solve()?;

        self.f = f_new;
        self.t += self.dt;

        self.construct_alpha_osf();
        self.update_vertex_f();
        log::debug!(
            "t = {:e}, content = {:e}",
            self.t,
            self.phase_space_content()
        );
        Ok(())
    }

    fn construct_alpha_osf(&mut self) {
        profiling::scope!("construct_alpha_osf");
        let mesh = self.mesh;
        for j in 0..mesh.ny() {
            for i in 0..mesh.nx() {
                let k = mesh.center(i, j);
                let lambda =
                    self.diffusion.tensor(self.t, i, j) * jacobian(k[0], k[1]);
                let base = 4 * mesh.ind2to1(i, j);
                for d in Direction::ALL {
                    let edge = mesh.edge(i, j, d);
                    self.alpha_osf[base + d.index()] =
                        one_sided_flux(&lambda, &k, &edge.a, &edge.b);
                }
            }
        }
    }

    fn endpoint_values(&self, edge: &Edge) -> (f64, f64) {
        let (ai, aj) = self.mesh.vertex_index(&edge.a);
        let (bi, bj) = self.mesh.vertex_index(&edge.b);
        (self.vertex_f[(ai, aj)], self.vertex_f[(bi, bj)])
    }

    /// Edge of cell `(i, j)` in direction `d` shared with a cell in the grid.
    fn coeff_add_inner(&mut self, i: usize, j: usize, d: Direction) {
        let mesh = self.mesh;
        let neighbor = mesh.neighbor(i, j, d);
        let (li, lj) = (neighbor.coord[0] as usize, neighbor.coord[1] as usize);
        let (f_a, f_b) = self.endpoint_values(&neighbor.edge);

        let osf_k = self.one_sided(i, j, d);
        // the neighbor sees the edge with A and B swapped
        let osf_l = self.one_sided(li, lj, d.reverse());
        let a_k = osf_k.estimate(f_a, f_b);
        let a_l = osf_l.estimate(f_b, f_a);

        let mu_k = weight(a_k, a_l);
        let mu_l = 1.0 - mu_k;

        let b_sigma = mu_l * a_l - mu_k * a_k;
        let coeff_k =
            mu_k * osf_k.sum() + plus(b_sigma) / (self.f[(i, j)] + FIELD_FLOOR);
        let coeff_l = mu_l * osf_l.sum()
            + minus(b_sigma) / (self.f[(li, lj)] + FIELD_FLOOR);

        let ii = mesh.ind2to1(i, j);
        let jj = mesh.ind2to1(li, lj);
        self.triplets.push((ii, ii, coeff_k));
        self.triplets.push((ii, jj, -coeff_l));
    }

    /// Edge of cell `(i, j)` in direction `d` on a Dirichlet boundary.
    fn coeff_add_dirbc(&mut self, i: usize, j: usize, d: Direction) {
        let mesh = self.mesh;
        let (f_a, f_b) = self.endpoint_values(mesh.edge(i, j, d));
        let osf = self.one_sided(i, j, d);

        let ii = mesh.ind2to1(i, j);
        self.rhs[ii] += osf.estimate(f_a, f_b);
        self.triplets.push((ii, ii, osf.sum()));
    }

    fn outer_edge_is_dirichlet(&self, d: Direction) -> bool {
        match d {
            Direction::IPlus => {
                self.bcs.angle_max_edge() == AngleMaxEdge::Dirichlet
            }
            Direction::IMinus | Direction::JPlus | Direction::JMinus => true,
        }
    }

    fn assemble(&mut self) {
        profiling::scope!("assemble");
        let mesh = self.mesh;
        for j in 0..mesh.ny() {
            for i in 0..mesh.nx() {
                for d in Direction::ALL {
                    if mesh.contains(&mesh.neighbor(i, j, d).coord) {
                        self.coeff_add_inner(i, j, d);
                    } else if self.outer_edge_is_dirichlet(d) {
                        self.coeff_add_dirbc(i, j, d);
                    }
                }
            }
        }

        // implicit Euler mass term
        let area_dt = mesh.area() / self.dt;
        for j in 0..mesh.ny() {
            for i in 0..mesh.nx() {
                let ii = mesh.ind2to1(i, j);
                let u = jacobian(mesh.x(i), mesh.y(j)) * area_dt;
                self.triplets.push((ii, ii, u));
                self.rhs[ii] += u * self.f[(i, j)];
            }
        }
        log::trace!("assembled {} triplets", self.triplets.len());
    }

    /// Fresh sparse LU factorization of the assembled system.
    fn solve(&mut self) -> Result<DMatrix<f64>, SolverError> {
        let mesh = self.mesh;
        let n = mesh.n_cells();
        let t = self.t;

        sum_duplicates(&mut self.triplets);
        let matrix =
            SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &self.triplets)
                .map_err(|err| SolverError::Assembly {
                    t,
                    reason: format!("{:?}", err),
                })?;

        let lu = {
            profiling::scope!("factorize");
            matrix
                .as_ref()
                .sp_lu()
                .map_err(|err| SolverError::Factorization {
                    t,
                    reason: format!("{:?}", err),
                })?
        };

        let mut x = Mat::<f64>::from_fn(n, 1, |row, _| self.rhs[row]);
        {
            profiling::scope!("solve");
            lu.solve_in_place(x.as_mut());
        }

        let f_new =
            DMatrix::from_fn(mesh.nx(), mesh.ny(), |i, j| x[(mesh.ind2to1(i, j), 0)]);
        if let Some(bad) = f_new.iter().position(|v| !v.is_finite()) {
            let (i, j) = mesh.ind1to2(bad);
            return Err(SolverError::Factorization {
                t,
                reason: format!("non-finite solution at cell ({}, {})", i, j),
            });
        }
        Ok(f_new)
    }

    /// Interior vertices average the four surrounding cells, boundary
    /// vertices take the boundary data at the current time.
    fn update_vertex_f(&mut self) {
        let mesh = self.mesh;
        let (nx, ny) = (mesh.nx(), mesh.ny());
        let f = &self.f;
        for j in 1..ny {
            for i in 1..nx {
                self.vertex_f[(i, j)] = (f[(i - 1, j - 1)]
                    + f[(i - 1, j)]
                    + f[(i, j - 1)]
                    + f[(i, j)])
                    / 4.0;
            }
        }

        let angle_max = self.bcs.angle_max_edge();
        for j in 1..ny {
            let p = mesh.vertex_y(j);
            self.vertex_f[(0, j)] = self.bcs.boundary_at_angle_min(self.t, p);
            self.vertex_f[(nx, j)] = match angle_max {
                AngleMaxEdge::Dirichlet => {
                    self.bcs.boundary_at_angle_max(self.t, p)
                }
                AngleMaxEdge::Symmetric => self.vertex_f[(nx - 1, j)],
            };
        }

        for i in 0..=nx {
            let a = mesh.vertex_x(i);
            self.vertex_f[(i, 0)] = self.bcs.boundary_at_momentum_min(self.t, a);
            self.vertex_f[(i, ny)] = self.bcs.boundary_at_momentum_max(self.t, a);
        }
    }
}

/// Merge entries with the same (row, column), leaving them in column
/// major order.
fn sum_duplicates(triplets: &mut Vec<(usize, usize, f64)>) {
    triplets.sort_by_key(|&(row, col, _)| (col, row));
    triplets.dedup_by(|next, kept| {
        if next.0 == kept.0 && next.1 == kept.1 {
            kept.2 += next.2;
            true
        } else {
            false
        }
    });
}
