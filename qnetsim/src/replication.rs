//! Replication driver.
//!
//! Each replicate builds a fresh [`Network`] from the topology, runs it on its
//! own [`Simulation`] up to the horizon and snapshots the station statistics.
//! Replicates are independent: their seeds are derived from the base seed and
//! the replicate index with a SplitMix64 finalizer.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Topology;
use crate::error::SimError;
use crate::log::StationLog;
use crate::network::{Network, StationStats};
use crate::report::Report;
use crate::simulation::Simulation;
use crate::time::{units_from_duration, MonotonicTime};

/// Golden-ratio increment of the SplitMix64 generator.
const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Derives the seed of replicate `index` from the base seed.
pub fn replicate_seed(base_seed: u64, index: usize) -> u64 {
    let mut z = base_seed.wrapping_add(GOLDEN_GAMMA.wrapping_mul(index as u64 + 1));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);

    z ^ (z >> 31)
}

/// Statistics of one replicate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplicateResult {
    /// Replicate index.
    pub index: usize,
    /// Seed of the replicate.
    pub seed: u64,
    /// Number of jobs produced by the generator.
    pub jobs_generated: u64,
    /// Statistics of every station, in topology order.
    pub stations: Vec<StationStats>,
}

/// A single replicate, ready to run.
#[derive(Debug)]
pub struct Replicate<'a> {
    topology: &'a Topology,
    index: usize,
    seed: u64,
    network: Network,
}

impl<'a> Replicate<'a> {
    /// Builds replicate `index` and opens its station logs, if logging is
    /// enabled.
    pub fn new(topology: &'a Topology, index: usize) -> Result<Self, SimError> {
        let seed = replicate_seed(topology.seed, index);
        let network = Network::build(topology, seed);

        if let Some(dir) = &topology.log_dir {
            fs::create_dir_all(dir).map_err(|source| SimError::LogDir {
                path: dir.clone(),
                source,
            })?;
            for id in topology.reported() {
                let path = log_path(dir.clone(), &topology.stations[id].name, index);
                let log = StationLog::create(&path)
                    .map_err(|source| SimError::LogDir { path, source })?;
                if let Some(station) = network.station(id) {
                    station.set_log(log);
                }
            }
        }

        Ok(Self {
            topology,
            index,
            seed,
            network,
        })
    }

    /// Network of the replicate.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Runs the replicate to the horizon.
    ///
    /// A station whose log fails halts the simulation at the time of the
    /// failed write. The statistics are then discarded and an error is
    /// returned.
    pub fn run(self) -> Result<ReplicateResult, SimError> {
        let mut simu = Simulation::new();
        self.network.spawn_on(&mut simu);

        let horizon = MonotonicTime::EPOCH + self.topology.horizon;
        simu.run_until(horizon)?;
        simu.discard_pending();

        if let Err((id, source)) = self.network.finish_logs() {
            return Err(SimError::Log {
                replicate: self.index,
                station: self.topology.stations[id].name.clone(),
                time: units_from_duration(simu.elapsed()),
                source,
            });
        }

        let result = ReplicateResult {
            index: self.index,
            seed: self.seed,
            jobs_generated: self.network.jobs_generated(),
            stations: self.network.snapshot(horizon),
        };
        debug!(
            replicate = self.index,
            jobs_generated = result.jobs_generated,
            "replicate statistics collected"
        );

        Ok(result)
    }
}

/// Path of the log of `station` for replicate `index`.
pub fn log_path(mut dir: PathBuf, station: &str, index: usize) -> PathBuf {
    dir.push(format!("{station}{index}.csv"));

    dir
}

/// Runs every replicate of the topology and aggregates their statistics.
///
/// The first failing replicate aborts the run.
pub fn run(topology: &Topology) -> Result<Report, SimError> {
    let results = run_replicates(topology)?;

    Ok(Report::aggregate(topology, &results))
}

/// Runs every replicate of the topology and returns their raw statistics.
pub fn run_replicates(topology: &Topology) -> Result<Vec<ReplicateResult>, SimError> {
    let mut results = Vec::with_capacity(topology.replicates);

    for index in 0..topology.replicates {
        let result = Replicate::new(topology, index).and_then(Replicate::run);
        match result {
            Ok(result) => {
                info!(
                    replicate = index,
                    seed = result.seed,
                    jobs_generated = result.jobs_generated,
                    "replicate completed"
                );
                results.push(result);
            }
            Err(err) => {
                warn!(replicate = index, error = %err, "replicate aborted");
                return Err(err);
            }
        }
    }

    Ok(results)
}
