//! Queueing network model.
//!
//! A [`Network`] bundles the stations, the routing table and the job
//! generator of one replicate. Each station and the generator run as their own
//! logical thread once the network is spawned on a
//! [`Simulation`](crate::simulation::Simulation).
//!
//! # Examples
//!
//! A single M/M/1 station fed at rate 1 and served at rate 2.
//!
//! ```
//! use std::time::Duration;
//!
//! use qnetsim::network::{Discipline, JobGenerator, Network, RoutingTable, Station};
//! use qnetsim::simulation::Simulation;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use rand_distr::Exp;
//!
//! let station = Station::new(
//!     "server",
//!     Discipline::Fifo,
//!     Exp::new(2.0).unwrap(),
//!     ChaCha8Rng::seed_from_u64(1),
//! );
//! let generator = JobGenerator::new(0, Exp::new(1.0).unwrap(), 1000, ChaCha8Rng::seed_from_u64(2));
//! let network = Network::new(vec![station], RoutingTable::new(1), generator);
//!
//! let mut simu = Simulation::new();
//! network.spawn_on(&mut simu);
//! simu.run_for(Duration::from_secs(100)).unwrap();
//!
//! let stats = network.snapshot(simu.time());
//! assert!(stats[0].jobs_completed > 0);
//! assert!(stats[0].response_time >= stats[0].waiting_time);
//! ```

mod generator;
mod job;
mod routing;
mod station;

pub use generator::JobGenerator;
pub use job::{Job, JobId};
pub use routing::{Route, RoutingError, RoutingTable, PROBABILITY_SUM_TOLERANCE};
pub use station::{Discipline, Station, StationId, StationState, StationStats};

use std::fmt;
use std::io;
use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::Topology;
use crate::simulation::Simulation;
use crate::time::MonotonicTime;

/// Stations, routing and arrivals of one replicate.
pub struct Network {
    stations: Rc<[Station]>,
    routing: Rc<RoutingTable>,
    generator: Rc<JobGenerator>,
}

impl Network {
    /// Assembles a network.
    ///
    /// # Panics
    ///
    /// Panics if the routing table or the generator target do not match the
    /// station list.
    pub fn new(stations: Vec<Station>, routing: RoutingTable, generator: JobGenerator) -> Self {
        assert_eq!(
            routing.station_count(),
            stations.len(),
            "the routing table does not match the station count"
        );
        assert!(
            generator.target() < stations.len(),
            "the generator targets a non-existent station"
        );

        Self {
            stations: stations.into(),
            routing: Rc::new(routing),
            generator: Rc::new(generator),
        }
    }

    /// Builds a fresh network from a validated topology.
    ///
    /// The generator draws from stream 0 of a ChaCha generator seeded with
    /// `seed` and station `k` from stream `k + 1`, so that the draws of one
    /// component never shift those of another.
    pub fn build(topology: &Topology, seed: u64) -> Self {
        let stations = topology
            .stations
            .iter()
            .enumerate()
            .map(|(k, spec)| {
                Station::new(
                    spec.name.clone(),
                    spec.discipline,
                    spec.service,
                    component_rng(seed, k as u64 + 1),
                )
            })
            .collect();
        let generator = JobGenerator::new(
            topology.entry,
            topology.arrival,
            topology.max_jobs,
            component_rng(seed, 0),
        );

        Self::new(stations, topology.routing.clone(), generator)
    }

    /// Stations of the network, in index order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Returns the station with the specified index, if any.
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    /// Routing table of the network.
    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// Number of jobs produced by the generator so far.
    pub fn jobs_generated(&self) -> u64 {
        self.generator.produced()
    }

    /// Spawns the logical threads of all stations, in index order, followed
    /// by the generator thread.
    pub fn spawn_on(&self, simu: &mut Simulation) {
        for id in 0..self.stations.len() {
            simu.spawn(station::serve(
                self.stations.clone(),
                self.routing.clone(),
                id,
                simu.scheduler().clone(),
            ));
        }
        simu.spawn(
            self.generator
                .clone()
                .run(self.stations.clone(), simu.scheduler().clone()),
        );
    }

    /// Computes the statistics of all stations at the specified horizon.
    pub fn snapshot(&self, horizon: MonotonicTime) -> Vec<StationStats> {
        self.stations
            .iter()
            .map(|station| station.snapshot(horizon))
            .collect()
    }

    /// Detaches and flushes all station logs.
    ///
    /// Every log is finished even if an earlier one failed; the first failure
    /// is returned together with the index of its station.
    pub fn finish_logs(&self) -> Result<(), (StationId, io::Error)> {
        let mut first_error = None;
        for (id, station) in self.stations.iter().enumerate() {
            if let Some(Err(err)) = station.finish_log() {
                first_error.get_or_insert((id, err));
            }
        }

        match first_error {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("stations", &self.stations)
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

fn component_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);

    rng
}
