//! Example: computer system with a CPU, a printer, a disk and an I/O device.
//!
//! This example demonstrates in particular:
//!
//! * programmatic configuration of a network,
//! * running replicates and printing the averaged report,
//! * driving a single network on a caller-owned simulation and inspecting its
//!   stations at intermediate times,
//! * the effect of the shortest-job-first discipline on waiting times.
//!
//! ```text
//!                         0.5 ┌─────────┐
//!                     ┌──────▶│ printer ├──────┐
//!                     │       └─────────┘      │
//! ┌───────────┐    ┌──┴──┐                     │
//! │ io_device ├───▶│ cpu │◀────────────────────┤
//! └───────────┘    └──┬──┘    0.5 ┌──────┐ 0.6 │
//!       ▲             └──────────▶│ disk ├─────┘
//!    arrivals                     └──┬───┘
//!                                    │ 0.4
//!                                    ▼
//!                                  sink
//! ```

use std::time::Duration;

use qnetsim::config::{SimConfig, StationConfig};
use qnetsim::network::{Discipline, Network};
use qnetsim::replication::{self, replicate_seed};
use qnetsim::simulation::Simulation;
use qnetsim::SimError;

fn network_config(cpu_discipline: Discipline) -> SimConfig {
    SimConfig {
        horizon: 500.0,
        arrival_rate: 2.0,
        replicates: 5,
        seed: 2018,
        entry: "io_device".into(),
        stations: vec![
            StationConfig::new("cpu", 25.0)
                .with_discipline(cpu_discipline)
                .with_routes(&[("printer", 0.5), ("disk", 0.5)]),
            StationConfig::new("printer", 1.0 / 0.03).with_routes(&[("cpu", 1.0)]),
            StationConfig::new("disk", 1.0 / 0.06).with_routes(&[("cpu", 0.6), ("sink", 0.4)]),
            StationConfig::new("io_device", 20.0).with_routes(&[("cpu", 1.0)]),
            StationConfig::new("sink", 1.0).unreported(),
        ],
        ..SimConfig::default()
    }
}

fn main() -> Result<(), SimError> {
    // ---------------
    // Replicated run.
    // ---------------

    let topology = network_config(Discipline::Fifo).validate()?;
    let report = replication::run(&topology)?;
    print!("{report}");

    // -----------------------------
    // Step-by-step single network.
    // -----------------------------

    let network = Network::build(&topology, replicate_seed(topology.seed, 0));
    let mut simu = Simulation::new();
    network.spawn_on(&mut simu);

    for _ in 0..5 {
        simu.run_for(Duration::from_secs(100))?;
        let queues: Vec<_> = network
            .stations()
            .iter()
            .map(|s| format!("{}={}", s.name(), s.queue_len()))
            .collect();
        println!(
            "t={:>5.1} jobs={:>5} queues: {}",
            simu.elapsed().as_secs_f64(),
            network.jobs_generated(),
            queues.join(" ")
        );
    }

    // -------------------------
    // FIFO vs SJF at the CPU.
    // -------------------------

    let sjf = replication::run(&network_config(Discipline::Sjf).validate()?)?;
    let (fifo_cpu, sjf_cpu) = (report.station("cpu"), sjf.station("cpu"));
    if let (Some(fifo_cpu), Some(sjf_cpu)) = (fifo_cpu, sjf_cpu) {
        println!(
            "cpu average waiting time: FIFO {:.4}, SJF {:.4}",
            fifo_cpu.average_waiting_time, sjf_cpu.average_waiting_time
        );
    }

    Ok(())
}
