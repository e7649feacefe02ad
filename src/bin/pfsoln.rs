use anyhow::{format_err, Result};
use clap::Parser;
use pfsoln::total_load::ZipLoad;
use pfsoln::{
    bus_types, ext_to_int, int_to_ext, load_case, make_ybus, pfsoln, save_case, write_case,
    MPOptBuilder, SysWideZipLoads,
};
use std::path::PathBuf;

/// Update case data to match a solved power flow voltage vector.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The input case (JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file, stdout if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Voltage vector pairs are magnitude and angle (degrees).
    #[arg(long, default_value_t = false)]
    polar: bool,

    /// Guard added to the denominator of the proportional Qg split.
    #[arg(long)]
    eps: Option<f64>,

    /// Qg range below which a bus gets the equal violation split.
    #[arg(long)]
    zero_range_tol: Option<f64>,

    /// ZIP weights [p, i, z] for active power demand.
    #[arg(long, value_delimiter = ',')]
    zip_pw: Option<Vec<f64>>,

    /// ZIP weights [p, i, z] for reactive power demand.
    #[arg(long, value_delimiter = ',')]
    zip_qw: Option<Vec<f64>>,
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_level(false)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(_) => {
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(2);
        }
    }
}

fn zip_weights(w: &Option<Vec<f64>>) -> Result<Option<[f64; 3]>> {
    match w {
        None => Ok(None),
        Some(w) => {
            let w: [f64; 3] = w
                .as_slice()
                .try_into()
                .map_err(|_| format_err!("ZIP weights must have 3 elements"))?;
            Ok(Some(w))
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let case = load_case(&cli.input)?;
    let v = case.voltages(cli.polar);

    let mut builder = MPOptBuilder::default();
    if let Some(eps) = cli.eps {
        builder.eps(eps);
    }
    if let Some(tol) = cli.zero_range_tol {
        builder.zero_range_tol(tol);
    }
    builder.sys_wide_zip_loads(SysWideZipLoads {
        pw: zip_weights(&cli.zip_pw)?,
        qw: zip_weights(&cli.zip_qw)?,
    });
    let mpopt = builder.build()?;

    let (mpc, order) = ext_to_int(&case.mpc)?;
    let (ref_, pv, pq) = bus_types(&mpc.bus, &mpc.gen)?;
    let (y_bus, y_f, y_t) = make_ybus(mpc.base_mva, &mpc.bus, &mpc.branch);
    log::debug!(
        "{} buses ({} ref, {} pv, {} pq), {} gens, {} branches",
        mpc.bus.len(),
        ref_.len(),
        pv.len(),
        pq.len(),
        mpc.gen.len(),
        mpc.branch.len()
    );

    let soln = pfsoln(
        mpc.base_mva,
        &mpc.bus,
        &mpc.gen,
        &mpc.branch,
        &mpc.load,
        &y_bus,
        &y_f,
        &y_t,
        &v,
        &ref_,
        &pv,
        &pq,
        &ZipLoad::new(mpopt.sys_wide_zip_loads),
        &mpopt,
    )?;
    for diagnostic in &soln.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    let mut mpc = mpc;
    mpc.bus = soln.bus;
    mpc.gen = soln.gen;
    mpc.branch = soln.branch;
    let results = int_to_ext(&mpc, &order)?;

    match &cli.output {
        Some(out_path) => save_case(out_path, &results, Some(&v))?,
        None => write_case(std::io::stdout().lock(), &results, Some(&v))?,
    }

    Ok(())
}
