//! A discrete-event simulator for open queueing networks.
//!
//! qnetsim estimates the steady-state performance of a network of service
//! stations (waiting time, response time and utilization) under Poisson job
//! arrivals, exponential service times and probabilistic routing between
//! stations. Results are averaged over independent replicates.
//!
//! Every station, as well as the job generator, is a *logical thread*: a Rust
//! future driven by a single-threaded cooperative executor. Logical threads
//! only yield when they suspend on the simulation clock, either for a fixed
//! virtual duration or until another thread wakes them up. No real time
//! elapses and the whole simulation is a deterministic function of its seed.
//!
//!
//! # A practical overview
//!
//! Running a study typically involves three activities:
//!
//! 1. describing the network, most conveniently with a [`SimConfig`] record
//!    loaded from TOML,
//! 2. validating it into a [`Topology`](config::Topology),
//! 3. running the replicates and formatting the [`Report`].
//!
//! ## Describing the network
//!
//! The default configuration is the reference scenario of a small computer
//! system:
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
//!
//! The same network written as TOML:
//!
//! ```toml
//! horizon = 500.0
//! arrival_rate = 2.0
//! replicates = 5
//! seed = 2018
//! entry = "io_device"
//!
//! [[stations]]
//! name = "cpu"
//! service_rate = 25.0
//! routes = { to = ["printer", "disk"], probabilities = [0.5, 0.5] }
//!
//! [[stations]]
//! name = "printer"
//! service_rate = 33.333333333333336
//! routes = { to = ["cpu"], probabilities = [1.0] }
//!
//! [[stations]]
//! name = "disk"
//! service_rate = 16.666666666666668
//! routes = { to = ["cpu", "sink"], probabilities = [0.6, 0.4] }
//!
//! [[stations]]
//! name = "io_device"
//! service_rate = 20.0
//! routes = { to = ["cpu"], probabilities = [1.0] }
//!
//! [[stations]]
//! name = "sink"
//! service_rate = 1.0
//! report = false
//! ```
//!
//! Stations serve their queue first-in first-out unless
//! `discipline = "sjf"` is set, in which case the job with the shortest
//! service demand is served first. A station without routes is a sink: jobs
//! leave the network after being served there.
//!
//! ## Running replicates
//!
//! ```
//! use qnetsim::{replication, SimConfig};
//!
//! let config = SimConfig {
//!     horizon: 50.0,
//!     replicates: 2,
//!     ..SimConfig::default()
//! };
//! let topology = config.validate()?;
//! let report = replication::run(&topology)?;
//!
//! let cpu = report.station("cpu").unwrap();
//! assert!(cpu.utilization > 0.0 && cpu.utilization < 1.0);
//! println!("{report}");
//! # Ok::<(), qnetsim::SimError>(())
//! ```
//!
//! ## Building custom simulations
//!
//! The [`simulation`], [`time`] and [`network`] modules can also be used
//! directly, for instance to run a single network on a caller-owned
//! [`Simulation`](simulation::Simulation) and inspect its stations
//! mid-course.
//!
//!
//! # Modules documentation
//!
//! * the [`simulation`] module discusses the ordering guarantees of the
//!   scheduler,
//! * the [`time`] module describes the timed and signal-based suspension
//!   primitives available to logical threads,
//! * the [`network`] module describes stations, routing and job generation,
//! * the [`log`] module documents the per-station event log format,
//! * the [`tracing`] module explains how to stamp log events with the
//!   simulation time.
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod config;
pub mod error;
pub(crate) mod executor;
pub mod log;
pub mod network;
pub mod replication;
pub mod report;
pub mod simulation;
pub mod time;
pub mod tracing;
pub(crate) mod util;

pub use config::{ConfigError, SimConfig};
pub use error::SimError;
pub use report::Report;
