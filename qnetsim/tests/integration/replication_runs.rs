//! Replicated runs and aggregate reports.

use qnetsim::config::SimConfig;
use qnetsim::replication::{self, replicate_seed};
use qnetsim::Report;

#[test]
fn reference_scenario_produces_distinct_valid_replicates() {
    let topology = SimConfig::default().validate().unwrap();

    let results = replication::run_replicates(&topology).unwrap();

    assert_eq!(results.len(), 5);
    for (index, result) in results.iter().enumerate() {
        assert_eq!(result.index, index);
        assert_eq!(result.seed, replicate_seed(2018, index));
        assert!(result.jobs_generated > 0);
        assert!(result.jobs_generated <= topology.max_jobs);
        for s in &result.stations {
            assert!(s.waiting_time >= 0.0);
            assert!(s.response_time >= s.waiting_time);
            assert!(s.idle_time >= 0.0);
            assert!(s.idle_time + s.busy_time <= 500.0 + 1e-9);
        }
    }
    for (i, a) in results.iter().enumerate() {
        for b in &results[i + 1..] {
            assert_ne!(a.stations, b.stations);
        }
    }

    let report = Report::aggregate(&topology, &results);
    assert_eq!(report.stations.len(), 4);
    for station in &report.stations {
        assert!(station.utilization > 0.0 && station.utilization < 1.0);
    }
}

#[test]
fn report_means_match_replicates() {
    let topology = SimConfig {
        replicates: 3,
        horizon: 100.0,
        ..SimConfig::default()
    }
    .validate()
    .unwrap();

    let report = replication::run(&topology).unwrap();

    assert_eq!(report.replicates, 3);
    let cpu = report.station("cpu").unwrap();
    let mean_waiting = report
        .results
        .iter()
        .map(|r| r.stations[0].waiting_time)
        .sum::<f64>()
        / 3.0;
    assert!((cpu.waiting_time - mean_waiting).abs() < 1e-9);
    assert!((cpu.utilization - (1.0 - cpu.idle_time / 100.0)).abs() < 1e-12);
    assert!(
        (cpu.average_waiting_time - cpu.waiting_time / report.mean_jobs_generated).abs() < 1e-12
    );

    let idle_sum: f64 = report.stations.iter().map(|s| s.idle_time).sum();
    assert!((report.overall.idle_time - idle_sum).abs() < 1e-9);
    assert!((report.overall.utilization - (1.0 - idle_sum / 100.0 / 4.0)).abs() < 1e-12);
}

#[test]
fn runs_are_reproducible() {
    let topology = SimConfig {
        replicates: 2,
        horizon: 100.0,
        ..SimConfig::default()
    }
    .validate()
    .unwrap();

    let first = replication::run(&topology).unwrap();
    let second = replication::run(&topology).unwrap();
    assert_eq!(first, second);

    let reseeded = SimConfig {
        replicates: 2,
        horizon: 100.0,
        seed: 7,
        ..SimConfig::default()
    }
    .validate()
    .unwrap();
    assert_ne!(replication::run(&reseeded).unwrap().results, first.results);
}

#[test]
fn report_serializes_to_json() {
    let topology = SimConfig {
        replicates: 1,
        horizon: 20.0,
        ..SimConfig::default()
    }
    .validate()
    .unwrap();
    let report = replication::run(&topology).unwrap();

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["replicates"], 1);
    assert_eq!(json["stations"][0]["name"], "cpu");
    assert_eq!(json["stations"].as_array().unwrap().len(), 4);
    assert!(json["overall"]["utilization"].is_number());
    assert_eq!(json["results"][0]["index"], 0);
}
