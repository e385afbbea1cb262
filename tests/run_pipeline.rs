use ntpfa::output::{self, OutputPaths};
use ntpfa::*;
use std::io::prelude::*;
use std::path::Path;

/// `n_alpha * n_e` values, five per line like the coefficient tables.
fn write_table(
    path: &Path,
    n_alpha: usize,
    n_e: usize,
    value: impl Fn(usize, usize) -> f64,
) {
    let mut out =
        std::io::BufWriter::new(std::fs::File::create(path).unwrap());
    let mut count = 0;
    for i in 0..n_alpha {
        for j in 0..n_e {
            write!(out, "{:e} ", value(i, j)).unwrap();
            count += 1;
            if count % 5 == 0 {
                writeln!(out).unwrap();
            }
        }
    }
    writeln!(out).unwrap();
}

fn config(run_id: &str) -> String {
    format!(
        r#"{{
        "basic": {{
            "run_id": "{}", "nalpha0": 12, "nE": 10,
            "L": 4.5, "alpha0_min_bct": 1,
            "Emin": 0.2, "Emax": 2.0, "T": 0.01, "nsteps": 9
        }},
        "diagnostics": {{ "nplots": 4 }},
        "diffusion_coefficients": {{
            "dID": "flat", "nalpha0_D": 10, "alpha0_min_D": 1.0,
            "alpha0_max_D": 89.0, "nE_D": 8, "Emin_D": 0.1, "Emax_D": 5.0
        }}
    }}"#,
        run_id
    )
}

#[test]
fn table_to_snapshots() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = scratch.path();
    let tables = dir.join("D");
    std::fs::create_dir_all(tables.join("flat")).unwrap();
    let flat = tables.join("flat");
    write_table(&flat.join("flat.Daa"), 10, 8, |i, _| 1e-6 * (1 + i) as f64);
    write_table(&flat.join("flat.Dap"), 10, 8, |_, _| -2e-8);
    write_table(&flat.join("flat.Dpp"), 10, 8, |_, j| 1e-7 * (1 + j) as f64);

    let config_path = dir.join("p.json");
    std::fs::write(&config_path, config("smoke")).unwrap();

    let constants = PhysicalConstants::default();
    let parameters = Parameters::from_file(&config_path, &constants).unwrap();
    assert_eq!(parameters.nsteps(), 8);
    assert_eq!(parameters.save_every_step(), 2);

    let mesh = Mesh::new(parameters.mesh_spec()).unwrap();
    let table = DiffusionTable::read(
        &tables,
        parameters.d_id(),
        parameters.table_grid(),
        &constants,
    )
    .unwrap();
    let field = DiffusionField::from_table(&mesh, &table, &constants);
    let bcs = LossConeBoundary::new(
        parameters.alpha0_lc(),
        parameters.pmin(),
        constants,
    );

    let paths = OutputPaths::new(dir.join("output"), parameters.run_id());
    paths.create_dirs().unwrap();
    output::write_config(&parameters, &paths.config()).unwrap();
    output::write_coordinates(&mesh, &constants, &paths).unwrap();

    let mut solver = Solver::new(&mesh, &field, &bcs, parameters.dt());
    assert!(solver.f().iter().all(|v| *v >= 0.0));
    output::write_field(solver.f(), &paths.snapshot(0)).unwrap();
    for step in 1..=parameters.nsteps() {
        solver.update().unwrap();
        if step % parameters.save_every_step() == 0 {
            let k = step / parameters.save_every_step();
            output::write_field(solver.f(), &paths.snapshot(k)).unwrap();
            output::write_image(solver.f(), &paths.image(k)).unwrap();
        }
    }
    assert!(solver.f().iter().all(|v| v.is_finite()));

    for k in 0..=parameters.nplots() {
        let f = output::read_field(&paths.snapshot(k)).unwrap();
        assert_eq!((f.nrows(), f.ncols()), (12, 10));
    }
    assert!(paths.image(4).exists());
    let last = output::read_field(&paths.snapshot(4)).unwrap();
    assert_eq!(&last, solver.f());

    let angles = std::fs::read_to_string(paths.angles()).unwrap();
    assert_eq!(angles.lines().count(), 12);
    let first: f64 = angles.lines().next().unwrap().parse().unwrap();
    assert!(first > parameters.alpha0_lc().to_degrees());

    let saved = std::fs::read_to_string(paths.config()).unwrap();
    assert!(saved.contains("\"run_id\": \"smoke\""));

}

#[test]
fn missing_table_is_reported() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = scratch.path();
    let constants = PhysicalConstants::default();
    let parameters =
        Parameters::from_json_str(&config("missing"), &constants).unwrap();
    let err = DiffusionTable::read(
        dir,
        parameters.d_id(),
        parameters.table_grid(),
        &constants,
    )
    .unwrap_err();
    assert!(matches!(err, TableError::Io { .. }));

    // a short table names the expected count
    std::fs::create_dir_all(dir.join("flat")).unwrap();
    write_table(&dir.join("flat/flat.Daa"), 10, 8, |_, _| 1.0);
    write_table(&dir.join("flat/flat.Dap"), 3, 8, |_, _| 1.0);
    let err = DiffusionTable::read(
        dir,
        parameters.d_id(),
        parameters.table_grid(),
        &constants,
    )
    .unwrap_err();
    match err {
        TableError::Truncated {
            expected, found, ..
        } => {
            assert_eq!(expected, 80);
            assert_eq!(found, 24);
        }
        other => panic!("unexpected {:?}", other),
    }
}
