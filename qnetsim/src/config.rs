//! Simulation configuration.
//!
//! A [`SimConfig`] is a plain record, usually deserialized from TOML, whose
//! defaults describe the reference computer-system scenario: a CPU, a printer,
//! a disk and an I/O device, with jobs entering through the I/O device.
//! [`SimConfig::validate()`] checks it and resolves station names into a
//! [`Topology`], the index-based form consumed by the replication driver.
//!
//! # Examples
//!
//! ```
//! use qnetsim::config::SimConfig;
//!
//! let config = SimConfig::from_toml_str(
//!     r#"
//!     horizon = 100.0
//!     arrival_rate = 1.0
//!     entry = "server"
//!
//!     [[stations]]
//!     name = "server"
//!     service_rate = 2.0
//!     "#,
//! )
//! .unwrap();
//!
//! let topology = config.validate().unwrap();
//! assert_eq!(topology.stations.len(), 1);
//! assert_eq!(topology.max_jobs, 1000);
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand_distr::Exp;
use serde::Deserialize;
use thiserror::Error;

use crate::network::{Discipline, RoutingError, RoutingTable, StationId};
use crate::time::duration_from_units;

/// Largest accepted horizon, in model time units.
pub const MAX_HORIZON: f64 = 1e12;

/// Multiple of `horizon × arrival_rate` used as the default arrival cap.
pub const DEFAULT_CAP_FACTOR: f64 = 10.0;

/// Configuration of a simulation run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Simulated duration of each replicate, in model time units.
    pub horizon: f64,
    /// Rate of the Poisson arrival process.
    pub arrival_rate: f64,
    /// Maximum number of jobs generated per replicate; defaults to
    /// `10 × horizon × arrival_rate`.
    pub max_jobs: Option<u64>,
    /// Number of independent replicates.
    pub replicates: usize,
    /// Base seed from which the seed of each replicate is derived.
    pub seed: u64,
    /// Name of the station receiving generated jobs.
    pub entry: String,
    /// Directory receiving the station logs; logging is disabled if unset.
    pub log_dir: Option<PathBuf>,
    /// Stations of the network.
    pub stations: Vec<StationConfig>,
}

/// Configuration of a station.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StationConfig {
    /// Unique station name.
    pub name: String,
    /// Rate of the exponential service time distribution.
    pub service_rate: f64,
    /// Queueing discipline.
    #[serde(default)]
    pub discipline: Discipline,
    /// Outgoing routes; no route makes the station a sink.
    #[serde(default)]
    pub routes: RoutesConfig,
    /// Whether the station appears in reports and gets a log file.
    #[serde(default = "default_report")]
    pub report: bool,
}

/// Outgoing routes of a station.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutesConfig {
    /// Destination station names.
    pub to: Vec<String>,
    /// Probability of each destination.
    pub probabilities: Vec<f64>,
}

fn default_report() -> bool {
    true
}

impl StationConfig {
    /// Creates a reported FIFO station.
    pub fn new(name: impl Into<String>, service_rate: f64) -> Self {
        Self {
            name: name.into(),
            service_rate,
            discipline: Discipline::Fifo,
            routes: RoutesConfig::default(),
            report: true,
        }
    }

    /// Sets the outgoing routes.
    pub fn with_routes(mut self, routes: &[(&str, f64)]) -> Self {
        self.routes = RoutesConfig {
            to: routes.iter().map(|(name, _)| name.to_string()).collect(),
            probabilities: routes.iter().map(|(_, p)| *p).collect(),
        };

        self
    }

    /// Sets the queueing discipline.
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;

        self
    }

    /// Excludes the station from reports and logs.
    pub fn unreported(mut self) -> Self {
        self.report = false;

        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            horizon: 500.0,
            arrival_rate: 2.0,
            max_jobs: None,
            replicates: 5,
            seed: 2018,
            entry: "io_device".into(),
            log_dir: None,
            stations: vec![
                StationConfig::new("cpu", 25.0).with_routes(&[("printer", 0.5), ("disk", 0.5)]),
                StationConfig::new("printer", 1.0 / 0.03).with_routes(&[("cpu", 1.0)]),
                StationConfig::new("disk", 1.0 / 0.06).with_routes(&[("cpu", 0.6), ("sink", 0.4)]),
                StationConfig::new("io_device", 20.0).with_routes(&[("cpu", 1.0)]),
                StationConfig::new("sink", 1.0).unreported(),
            ],
        }
    }
}

impl SimConfig {
    /// Parses a TOML document; missing fields take their default value.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&text)
    }

    /// Arrival cap in effect.
    pub fn effective_max_jobs(&self) -> u64 {
        self.max_jobs
            .unwrap_or((DEFAULT_CAP_FACTOR * self.horizon * self.arrival_rate) as u64)
    }

    /// Checks the configuration and resolves it into a [`Topology`].
    pub fn validate(&self) -> Result<Topology, ConfigError> {
        if !(self.horizon.is_finite() && self.horizon > 0.0 && self.horizon <= MAX_HORIZON) {
            return Err(ConfigError::InvalidHorizon(self.horizon));
        }
        let arrival = positive_rate(self.arrival_rate)
            .ok_or(ConfigError::InvalidArrivalRate(self.arrival_rate))?;
        if self.replicates == 0 {
            return Err(ConfigError::NoReplicates);
        }
        if self.stations.is_empty() {
            return Err(ConfigError::NoStations);
        }

        let mut ids: HashMap<&str, StationId> = HashMap::with_capacity(self.stations.len());
        for (id, station) in self.stations.iter().enumerate() {
            if ids.insert(station.name.as_str(), id).is_some() {
                return Err(ConfigError::DuplicateStation(station.name.clone()));
            }
        }

        let mut stations = Vec::with_capacity(self.stations.len());
        let mut routing = RoutingTable::new(self.stations.len());
        for (id, station) in self.stations.iter().enumerate() {
            let service = positive_rate(station.service_rate).ok_or_else(|| {
                ConfigError::InvalidRate {
                    station: station.name.clone(),
                    rate: station.service_rate,
                }
            })?;

            let destinations = station
                .routes
                .to
                .iter()
                .map(|name| {
                    ids.get(name.as_str())
                        .copied()
                        .ok_or_else(|| ConfigError::UnknownStation {
                            station: station.name.clone(),
                            destination: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            routing
                .set_route(id, destinations, station.routes.probabilities.clone())
                .map_err(|source| ConfigError::Routing {
                    station: station.name.clone(),
                    source,
                })?;

            stations.push(StationSpec {
                name: station.name.clone(),
                service_rate: station.service_rate,
                service,
                discipline: station.discipline,
                report: station.report,
            });
        }

        let entry = *ids
            .get(self.entry.as_str())
            .ok_or_else(|| ConfigError::UnknownEntry(self.entry.clone()))?;

        Ok(Topology {
            horizon: duration_from_units(self.horizon),
            arrival_rate: self.arrival_rate,
            arrival,
            max_jobs: self.effective_max_jobs(),
            replicates: self.replicates,
            seed: self.seed,
            entry,
            stations,
            routing,
            log_dir: self.log_dir.clone(),
        })
    }
}

fn positive_rate(rate: f64) -> Option<Exp<f64>> {
    if !(rate.is_finite() && rate > 0.0) {
        return None;
    }

    Exp::new(rate).ok()
}

/// A validated, index-based network description.
#[derive(Clone, Debug)]
pub struct Topology {
    /// Simulated duration of each replicate.
    pub horizon: Duration,
    /// Rate of the arrival process.
    pub arrival_rate: f64,
    /// Interarrival time distribution.
    pub arrival: Exp<f64>,
    /// Maximum number of jobs generated per replicate.
    pub max_jobs: u64,
    /// Number of replicates.
    pub replicates: usize,
    /// Base seed.
    pub seed: u64,
    /// Station receiving generated jobs.
    pub entry: StationId,
    /// Stations, in configuration order.
    pub stations: Vec<StationSpec>,
    /// Routing between stations.
    pub routing: RoutingTable,
    /// Directory receiving the station logs, if any.
    pub log_dir: Option<PathBuf>,
}

impl Topology {
    /// Indices of the stations that appear in reports.
    pub fn reported(&self) -> impl Iterator<Item = StationId> + '_ {
        self.stations
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.report)
            .map(|(id, _)| id)
    }
}

/// A validated station description.
#[derive(Clone, Debug)]
pub struct StationSpec {
    /// Station name.
    pub name: String,
    /// Service rate.
    pub service_rate: f64,
    /// Service time distribution.
    pub service: Exp<f64>,
    /// Queueing discipline.
    pub discipline: Discipline,
    /// Whether the station appears in reports and gets a log file.
    pub report: bool,
}

/// Error returned when a configuration cannot be loaded or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A service rate is not positive and finite.
    #[error("station `{station}`: the service rate must be positive and finite, got {rate}")]
    InvalidRate {
        /// Station name.
        station: String,
        /// Rejected rate.
        rate: f64,
    },
    /// The arrival rate is not positive and finite.
    #[error("the arrival rate must be positive and finite, got {0}")]
    InvalidArrivalRate(f64),
    /// The horizon is not positive and finite, or too large.
    #[error("the horizon must be positive and at most 1e12, got {0}")]
    InvalidHorizon(f64),
    /// No replicate was requested.
    #[error("at least one replicate is required")]
    NoReplicates,
    /// The network has no station.
    #[error("at least one station is required")]
    NoStations,
    /// Two stations share a name.
    #[error("duplicate station `{0}`")]
    DuplicateStation(String),
    /// A route names a station that does not exist.
    #[error("station `{station}` routes to unknown station `{destination}`")]
    UnknownStation {
        /// Source station name.
        station: String,
        /// Unknown destination name.
        destination: String,
    },
    /// The entry station does not exist.
    #[error("unknown entry station `{0}`")]
    UnknownEntry(String),
    /// The routing distribution of a station is invalid.
    #[error("invalid routing for station `{station}`")]
    Routing {
        /// Station name.
        station: String,
        /// Cause.
        #[source]
        source: RoutingError,
    },
    /// The configuration file could not be read.
    #[error("cannot read configuration file `{}`", .path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid TOML or has unknown fields.
    #[error("invalid configuration file")]
    Parse(#[from] toml::de::Error),
}
