//! Aggregate report.

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::config::Topology;
use crate::error::SimError;
use crate::network::StationStats;
use crate::replication::ReplicateResult;
use crate::time::units_from_duration;

/// Mean statistics of a reported station across replicates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StationSummary {
    /// Station name.
    pub name: String,
    /// Mean cumulative waiting time.
    pub waiting_time: f64,
    /// Mean cumulative waiting time per generated job.
    pub average_waiting_time: f64,
    /// Mean cumulative response time.
    pub response_time: f64,
    /// Mean cumulative response time per generated job.
    pub average_response_time: f64,
    /// Mean cumulative idle time.
    pub idle_time: f64,
    /// Mean cumulative service time.
    pub busy_time: f64,
    /// Mean number of completed services.
    pub jobs_completed: f64,
    /// Utilization, `1 - idle_time / horizon`.
    pub utilization: f64,
}

/// Totals over all reported stations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverallSummary {
    /// Sum of the station waiting times.
    pub waiting_time: f64,
    /// Sum of the station waiting times per generated job.
    pub average_waiting_time: f64,
    /// Sum of the station response times.
    pub response_time: f64,
    /// Sum of the station response times per generated job.
    pub average_response_time: f64,
    /// Sum of the station idle times.
    pub idle_time: f64,
    /// Mean station utilization, `1 - idle_time / horizon / station_count`.
    pub utilization: f64,
}

/// Statistics of a run, averaged across replicates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    /// Horizon of each replicate, in model time units.
    pub horizon: f64,
    /// Number of replicates.
    pub replicates: usize,
    /// Mean number of jobs generated per replicate.
    pub mean_jobs_generated: f64,
    /// Reported stations, in topology order.
    pub stations: Vec<StationSummary>,
    /// Totals over the reported stations.
    pub overall: OverallSummary,
    /// Raw statistics of each replicate.
    pub results: Vec<ReplicateResult>,
}

impl Report {
    /// Averages replicate statistics for the reported stations of the
    /// topology.
    ///
    /// Per-job averages divide the mean totals by the mean number of
    /// generated jobs, and are 0 if no job was generated.
    pub fn aggregate(topology: &Topology, results: &[ReplicateResult]) -> Self {
        let horizon = units_from_duration(topology.horizon);
        let mean_jobs_generated = mean(results.iter().map(|r| r.jobs_generated as f64));
        let per_job = |total: f64| {
            if mean_jobs_generated > 0.0 {
                total / mean_jobs_generated
            } else {
                0.0
            }
        };

        let stations: Vec<_> = topology
            .reported()
            .map(|id| {
                let of = |metric: fn(&StationStats) -> f64| {
                    mean(results.iter().filter_map(|r| r.stations.get(id)).map(metric))
                };
                let waiting_time = of(|s| s.waiting_time);
                let response_time = of(|s| s.response_time);
                let idle_time = of(|s| s.idle_time);

                StationSummary {
                    name: topology.stations[id].name.clone(),
                    waiting_time,
                    average_waiting_time: per_job(waiting_time),
                    response_time,
                    average_response_time: per_job(response_time),
                    idle_time,
                    busy_time: of(|s| s.busy_time),
                    jobs_completed: of(|s| s.jobs_completed as f64),
                    utilization: 1.0 - idle_time / horizon,
                }
            })
            .collect();

        let waiting_time: f64 = stations.iter().map(|s| s.waiting_time).sum();
        let response_time: f64 = stations.iter().map(|s| s.response_time).sum();
        let idle_time: f64 = stations.iter().map(|s| s.idle_time).sum();
        let utilization = if stations.is_empty() {
            0.0
        } else {
            1.0 - idle_time / horizon / stations.len() as f64
        };

        Self {
            horizon,
            replicates: results.len(),
            mean_jobs_generated,
            overall: OverallSummary {
                waiting_time,
                average_waiting_time: per_job(waiting_time),
                response_time,
                average_response_time: per_job(response_time),
                idle_time,
                utilization,
            },
            stations,
            results: results.to_vec(),
        }
    }

    /// Returns the summary of the named station, if reported.
    pub fn station(&self, name: &str) -> Option<&StationSummary> {
        self.stations.iter().find(|s| s.name == name)
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), SimError> {
        serde_json::to_writer_pretty(writer, self)?;

        Ok(())
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0.0;
    }

    sum / count as f64
}

fn write_block(
    f: &mut fmt::Formatter<'_>,
    waiting: (f64, f64),
    response: (f64, f64),
    idle: f64,
    utilization: f64,
) -> fmt::Result {
    writeln!(f, "Total waiting time     : {:.2}", waiting.0)?;
    writeln!(f, "Average waiting time   : {:.2}", waiting.1)?;
    writeln!(f, "Total response time    : {:.2}", response.0)?;
    writeln!(f, "Average response time  : {:.2}", response.1)?;
    writeln!(f, "Total server idle time : {idle:.2} (U={utilization:.2})")?;
    writeln!(f)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------- Simulation performance -------------")?;
        for station in &self.stations {
            writeln!(f, "{}:", station.name)?;
            write_block(
                f,
                (station.waiting_time, station.average_waiting_time),
                (station.response_time, station.average_response_time),
                station.idle_time,
                station.utilization,
            )?;
        }

        let overall = &self.overall;
        writeln!(f, "Overall System:")?;
        write_block(
            f,
            (overall.waiting_time, overall.average_waiting_time),
            (overall.response_time, overall.average_response_time),
            overall.idle_time,
            overall.utilization,
        )
    }
}
