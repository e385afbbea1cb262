use float_cmp::assert_approx_eq;
use nalgebra::DMatrix;
use ntpfa::util::*;
use ntpfa::*;
use std::cell::RefCell;

fn mesh(nx: usize, ny: usize) -> Mesh {
    Mesh::new(MeshSpec {
        nx,
        ny,
        x_origin: 0.2,
        y_origin: 1.0,
        dx: 1.0 / nx as f64,
        dy: 1.0 / ny as f64,
    })
    .unwrap()
}

fn bump(alpha0: f64, p: f64) -> f64 {
    1.0 + (3.0 * alpha0).sin() * (2.0 * p).cos().abs()
}

#[test]
fn vertex_field_averages_cells_after_update() {
    let mesh = mesh(5, 4);
    let field = DiffusionField::uniform(&mesh, 0.3, 0.05, 0.2);
    let bc = UniformDirichlet::new(0.5, bump);
    let mut solver = Solver::new(&mesh, &field, &bc, 0.05);
    solver.update().unwrap();
    solver.update().unwrap();

    let f = solver.f();
    let v = solver.vertex_f();
    for j in 1..mesh.ny() {
        for i in 1..mesh.nx() {
            let mean = (f[(i - 1, j - 1)]
                + f[(i, j - 1)]
                + f[(i - 1, j)]
                + f[(i, j)])
                / 4.0;
            assert_approx_eq!(f64, v[(i, j)], mean, epsilon = 1e-12);
        }
    }
    for i in 0..=mesh.nx() {
        assert_eq!(v[(i, 0)], 0.5);
        assert_eq!(v[(i, mesh.ny())], 0.5);
    }
    assert_approx_eq!(f64, solver.t(), 0.1, epsilon = 1e-15);
}

#[test]
fn zero_tensor_conserves_content() {
    let mesh = mesh(6, 5);
    let field = DiffusionField::uniform(&mesh, 0.0, 0.0, 0.0);
    let bc = UniformDirichlet::new(0.0, bump);
    let mut solver = Solver::new(&mesh, &field, &bc, 0.1);
    let phase = solver.phase_space_content();
    let plain = solver.plain_content();
    let f0 = solver.f().clone();
    for _ in 0..5 {
        solver.update().unwrap();
    }
    assert_approx_eq!(
        f64,
        solver.phase_space_content(),
        phase,
        epsilon = 1e-12 * phase
    );
    assert_approx_eq!(
        f64,
        solver.plain_content(),
        plain,
        epsilon = 1e-12 * plain
    );
    for (a, b) in solver.f().iter().zip(f0.iter()) {
        assert_approx_eq!(f64, *a, *b, epsilon = 1e-12);
    }
}

#[test]
fn diagonal_tensor_content_does_not_grow() {
    let mesh = mesh(8, 6);
    let field = DiffusionField::uniform(&mesh, 0.4, 0.0, 0.1);
    let bc = UniformDirichlet::new(0.0, bump);
    let mut solver = Solver::new(&mesh, &field, &bc, 0.02);
    let start = solver.phase_space_content();
    let mut previous = start;
    for _ in 0..10 {
        solver.update().unwrap();
        let current = solver.phase_space_content();
        assert!(
            current <= previous * (1.0 + 1e-12),
            "content grew from {} to {}",
            previous,
            current
        );
        previous = current;
        assert!(solver.f().iter().all(|v| v.is_finite() && *v >= 0.0));
    }
    // outflow through the zero boundary removes something
    assert!(previous < start);
}

#[test]
fn single_cell_decays_on_two_by_two_grid() {
    let mesh = mesh(2, 2);
    let grid = TableGrid {
        n_alpha: 3,
        alpha_min: 0.0,
        alpha_max: std::f64::consts::FRAC_PI_2,
        n_energy: 3,
        e_min: 0.1,
        e_max: 10.0,
    };
    let table = DiffusionTable {
        grid,
        daa: DMatrix::from_element(3, 3, 1.0),
        dap: DMatrix::zeros(3, 3),
        dpp: DMatrix::from_element(3, 3, 1.0),
    };
    let constants = PhysicalConstants::default();
    let field = DiffusionField::from_table(&mesh, &table, &constants);
    assert_eq!(field.dap(0.0, 1, 1), 0.0);

    let (x_mid, y_mid) = (mesh.vertex_x(1), mesh.vertex_y(1));
    let bc = UniformDirichlet::new(0.0, |a: f64, p: f64| {
        if a < x_mid && p < y_mid {
            1.0
        } else {
            0.0
        }
    });
    let mut solver = Solver::new(&mesh, &field, &bc, 0.01);
    assert_eq!(solver.f()[(0, 0)], 1.0);
    solver.update().unwrap();

    let f = solver.f();
    assert!(f[(0, 0)] < 1.0);
    assert!(f[(0, 0)] > 0.0);
    for v in f.iter() {
        assert!(v.is_finite());
        assert!(*v >= 0.0);
    }
}

/// Records every time at which the tensor is sampled.
struct RecordingTensor {
    inner: DiffusionField,
    times: RefCell<Vec<f64>>,
}

impl DiffusionTensor for RecordingTensor {
    fn tensor(&self, t: f64, i: usize, j: usize) -> Tensor {
        self.times.borrow_mut().push(t);
        self.inner.tensor(t, i, j)
    }
}

#[test]
fn tensor_sees_solver_time() {
    let mesh = mesh(3, 3);
    let field = RecordingTensor {
        inner: DiffusionField::uniform(&mesh, 0.2, 0.0, 0.2),
        times: RefCell::new(Vec::new()),
    };
    let bc = UniformDirichlet::new(0.0, bump);
    let mut solver = Solver::new(&mesh, &field, &bc, 0.25);
    solver.update().unwrap();
    solver.update().unwrap();

    let mut times = field.times.borrow().clone();
    times.sort_by(|a, b| a.partial_cmp(b).unwrap());
    times.dedup();
    assert_eq!(times, vec![0.0, 0.25, 0.5]);
}

#[test]
fn content_decreases_with_cross_terms() {
    let mesh = mesh(6, 6);
    let field = DiffusionField::uniform(&mesh, 0.5, 0.1, 0.3);
    let bc = UniformDirichlet::new(0.0, bump);
    let mut solver = Solver::new(&mesh, &field, &bc, 0.01);
    let start = solver.phase_space_content();
    for _ in 0..5 {
        solver.update().unwrap();
    }
    assert!(solver.f().iter().all(|v| v.is_finite()));
    assert!(solver.phase_space_content() < start);
}

#[test]
fn constant_field_stays_constant_with_dirichlet_data() {
    let mesh = mesh(6, 5);
    let field = DiffusionField::uniform(&mesh, 0.5, 0.2, 0.3);
    let bc = UniformDirichlet::new(2.0, |_, _| 2.0);
    let mut solver = Solver::new(&mesh, &field, &bc, 0.05);
    for _ in 0..5 {
        solver.update().unwrap();
    }
    for v in solver.f().iter() {
        assert_approx_eq!(f64, *v, 2.0, epsilon = 1e-12);
    }
}

/// Full tensor inside, nothing on the outer ring of cells, so no flux
/// reaches the boundary.
struct InsulatedTensor {
    inner: DiffusionField,
    nx: usize,
    ny: usize,
}

impl DiffusionTensor for InsulatedTensor {
    fn tensor(&self, t: f64, i: usize, j: usize) -> Tensor {
        if i == 0 || j == 0 || i + 1 == self.nx || j + 1 == self.ny {
            Tensor::zeros()
        } else {
            self.inner.tensor(t, i, j)
        }
    }
}

#[test]
fn cross_terms_conserve_content_without_boundary_flux() {
    let mesh = mesh(7, 7);
    let field = InsulatedTensor {
        inner: DiffusionField::uniform(&mesh, 0.5, 0.2, 0.3),
        nx: mesh.nx(),
        ny: mesh.ny(),
    };
    let bc = UniformDirichlet::new(0.0, bump);
    let mut solver = Solver::new(&mesh, &field, &bc, 0.05);
    let start = solver.phase_space_content();
    let f0 = solver.f().clone();
    for _ in 0..5 {
        solver.update().unwrap();
        assert_approx_eq!(
            f64,
            solver.phase_space_content(),
            start,
            epsilon = 1e-12 * start
        );
    }
    let moved = solver
        .f()
        .iter()
        .zip(f0.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    assert!(moved > 1e-6, "field did not evolve");
}
