//! qnetsim command-line front end.
//!
//! Runs the replicates of a queueing network and prints the averaged report.
//!
//! # Example
//!
//! ```bash
//! # Reference scenario, 5 replicates of 500 time units
//! qnetsim
//!
//! # Custom network, event logs and JSON output
//! qnetsim --config network.toml --log-dir logs --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use qnetsim::tracing::SimulationTime;
use qnetsim::{replication, SimConfig, SimError};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Queueing network simulator
///
/// Simulates an open network of exponential service stations over a fixed
/// horizon and reports per-station waiting time, response time and
/// utilization averaged across independent replicates.
#[derive(Parser, Debug)]
#[command(name = "qnetsim")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file. The reference scenario is used when omitted.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of replicates
    #[arg(short = 'r', long)]
    replicates: Option<usize>,

    /// Base random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated duration of each replicate, in model time units
    #[arg(long)]
    horizon: Option<f64>,

    /// Maximum number of generated jobs per replicate
    #[arg(long)]
    max_jobs: Option<u64>,

    /// Directory receiving per-station event logs
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn into_config(self) -> Result<(SimConfig, bool), SimError> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };

        if let Some(replicates) = self.replicates {
            config.replicates = replicates;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if let Some(max_jobs) = self.max_jobs {
            config.max_jobs = Some(max_jobs);
        }
        if let Some(log_dir) = self.log_dir {
            config.log_dir = Some(log_dir);
        }

        Ok((config, self.json))
    }
}

fn run(args: Args) -> Result<(), SimError> {
    let (config, json) = args.into_config()?;
    let topology = config.validate()?;

    info!(
        horizon = config.horizon,
        arrival_rate = config.arrival_rate,
        max_jobs = topology.max_jobs,
        replicates = topology.replicates,
        seed = topology.seed,
        stations = topology.stations.len(),
        "starting simulation"
    );

    let report = replication::run(&topology)?;

    if json {
        report.write_json(std::io::stdout().lock())?;
        println!();
    } else {
        print!("{report}");
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,qnetsim=info")),
        )
        .with_timer(SimulationTime::with_system_timer())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut message = err.to_string();
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                message.push_str(": ");
                message.push_str(&cause.to_string());
                source = cause.source();
            }
            eprintln!("error: {message}");

            ExitCode::FAILURE
        }
    }
}
