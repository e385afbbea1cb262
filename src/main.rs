use anyhow::Context;
use clap::Parser;
use ntpfa::output::{self, OutputPaths};
use ntpfa::*;
use std::path::PathBuf;

/// ntpfa pitch-angle / momentum diffusion executable
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Run configuration (JSON).
    #[arg(short, long, default_value = "p.json")]
    pub config: PathBuf,

    /// Root for run directories, `<output_root>/<run_id>` is created.
    #[arg(short, long, default_value = "output")]
    pub output_root: PathBuf,

    /// Root of the diffusion coefficient tables, read from
    /// `<table_root>/<dID>/<dID>.{Daa,Dap,Dpp}`.
    #[arg(short, long, default_value = "D")]
    pub table_root: PathBuf,

    /// Also write a PNG next to every field snapshot.
    #[arg(short, long)]
    pub write_images: bool,

    /// Print build information and quit
    #[arg(long)]
    pub build_info: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.build_info {
        build_info::print_report("ntpfa");
        return Ok(());
    }
    env_logger::init();
    log::info!("{}", build_info::summary());

    let constants = PhysicalConstants::default();
    let parameters = Parameters::from_file(&args.config, &constants)
        .with_context(|| format!("loading {:?}", args.config))?;
    log::info!(
        "run `{}`: {} x {} cells, T = {}, dt = {}, {} steps, snapshot every {}",
        parameters.run_id(),
        parameters.nalpha0(),
        parameters.n_e(),
        parameters.total_time(),
        parameters.dt(),
        parameters.nsteps(),
        parameters.save_every_step()
    );

    let mesh = Mesh::new(parameters.mesh_spec()).context("building mesh")?;
    let table = DiffusionTable::read(
        &args.table_root,
        parameters.d_id(),
        parameters.table_grid(),
        &constants,
    )
    .context("reading diffusion coefficients")?;
    let field = DiffusionField::from_table(&mesh, &table, &constants);
    let bcs = LossConeBoundary::new(
        parameters.alpha0_lc(),
        parameters.pmin(),
        constants,
    );

    let paths = OutputPaths::new(&args.output_root, parameters.run_id());
    paths
        .create_dirs()
        .with_context(|| format!("creating {:?}", paths.run_dir()))?;
    output::write_config(&parameters, &paths.config())?;
    output::write_coordinates(&mesh, &constants, &paths)?;

    let mut solver = Solver::new(&mesh, &field, &bcs, parameters.dt());
    let save = |solver: &Solver<_, _>, k: usize| -> anyhow::Result<()> {
        output::write_field(solver.f(), &paths.snapshot(k))?;
        if args.write_images {
            output::write_image(solver.f(), &paths.image(k))?;
        }
        log::info!(
            "snapshot {} at t = {:.6}, content = {:e}",
            k,
            solver.t(),
            solver.phase_space_content()
        );
        Ok(())
    };
    save(&solver, 0)?;

    let start = std::time::Instant::now();
    for step in 1..=parameters.nsteps() {
        profiling::scope!("time_step");
        solver
            .update()
            .with_context(|| format!("time step {}", step))?;
        if step % parameters.save_every_step() == 0 {
            save(&solver, step / parameters.save_every_step())?;
        }
        profiling::finish_frame!();
    }
    log::info!(
        "finished {} steps in {:.3}s",
        parameters.nsteps(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
