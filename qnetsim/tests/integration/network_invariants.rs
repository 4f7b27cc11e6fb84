//! Statistical invariants of simulated networks.

use std::time::Duration;

use qnetsim::config::{SimConfig, StationConfig, Topology};
use qnetsim::network::{Discipline, JobId, Network, StationState, StationStats};
use qnetsim::simulation::Simulation;
use qnetsim::time::MonotonicTime;

const EPSILON: f64 = 1e-9;

fn run_network(topology: &Topology, seed: u64) -> (Network, Vec<StationStats>) {
    let network = Network::build(topology, seed);
    let mut simu = Simulation::new();
    network.spawn_on(&mut simu);
    simu.run_until(MonotonicTime::EPOCH + topology.horizon)
        .unwrap();
    let stats = network.snapshot(simu.time());

    (network, stats)
}

fn check_invariants(stats: &[StationStats], horizon: f64) {
    for s in stats {
        assert!(s.waiting_time >= 0.0, "{s:?}");
        assert!(s.response_time >= s.waiting_time, "{s:?}");
        assert!(s.idle_time >= 0.0, "{s:?}");
        assert!(s.busy_time >= 0.0, "{s:?}");
        assert!(s.idle_time + s.busy_time <= horizon + EPSILON, "{s:?}");
        assert!(s.jobs_completed <= s.jobs_started, "{s:?}");
        assert!(s.jobs_started <= s.jobs_received, "{s:?}");
    }
}

#[test]
fn reference_network_statistics_are_consistent() {
    let topology = SimConfig::default().validate().unwrap();

    for seed in [1, 2, 3] {
        let (network, stats) = run_network(&topology, seed);

        check_invariants(&stats, 500.0);
        assert!(network.jobs_generated() > 0);
        assert!(network.jobs_generated() <= topology.max_jobs);
        // Every generated job enters through the I/O device.
        assert_eq!(stats[topology.entry].jobs_received, network.jobs_generated());
        // Jobs only leave through the disk, which feeds the sink.
        assert!(stats[4].jobs_received <= stats[2].jobs_completed);
    }
}

#[test]
fn zero_cap_leaves_every_station_idle() {
    let topology = SimConfig {
        max_jobs: Some(0),
        ..SimConfig::default()
    }
    .validate()
    .unwrap();

    let (network, stats) = run_network(&topology, 9);

    assert_eq!(network.jobs_generated(), 0);
    for (station, s) in network.stations().iter().zip(&stats) {
        assert_eq!(station.state(), StationState::Idle);
        assert_eq!(s.idle_time, 500.0);
        assert_eq!(s.waiting_time, 0.0);
        assert_eq!(s.response_time, 0.0);
        assert_eq!(s.jobs_received, 0);
    }
}

#[test]
fn arrivals_never_exceed_cap() {
    let topology = SimConfig {
        max_jobs: Some(7),
        ..SimConfig::default()
    }
    .validate()
    .unwrap();

    let network = Network::build(&topology, 5);
    let mut simu = Simulation::new();
    network.spawn_on(&mut simu);

    let mut produced = 0;
    for _ in 0..50 {
        simu.run_for(Duration::from_secs(10)).unwrap();
        assert!(network.jobs_generated() >= produced);
        produced = network.jobs_generated();
        assert!(produced <= 7);
    }
    assert_eq!(produced, 7);
}

#[test]
fn sink_absorbs_jobs() {
    let topology = SimConfig {
        horizon: 200.0,
        arrival_rate: 1.0,
        entry: "front".into(),
        stations: vec![
            StationConfig::new("front", 5.0),
            StationConfig::new("back", 5.0),
        ],
        ..SimConfig::default()
    }
    .validate()
    .unwrap();

    let (_, stats) = run_network(&topology, 11);

    assert!(stats[0].jobs_completed > 0);
    assert_eq!(stats[1].jobs_received, 0);
    assert_eq!(stats[1].idle_time, 200.0);
    check_invariants(&stats, 200.0);
}

#[test]
fn self_loop_is_supported() {
    let topology = SimConfig {
        horizon: 100.0,
        arrival_rate: 1.0,
        entry: "loop".into(),
        stations: vec![StationConfig::new("loop", 10.0).with_routes(&[("loop", 0.5)])],
        ..SimConfig::default()
    };
    // A single half-weighted edge does not sum to 1.
    assert!(topology.validate().is_err());

    let topology = SimConfig {
        stations: vec![
            StationConfig::new("loop", 10.0).with_routes(&[("loop", 0.5), ("out", 0.5)]),
            StationConfig::new("out", 10.0),
        ],
        ..topology
    }
    .validate()
    .unwrap();

    let (_, stats) = run_network(&topology, 4);

    // Each job visits the loop station twice on average.
    assert!(stats[0].jobs_received > stats[1].jobs_received);
    check_invariants(&stats, 100.0);
}

#[test]
fn same_seed_gives_same_statistics() {
    let topology = SimConfig::default().validate().unwrap();

    let (_, first) = run_network(&topology, 2018);
    let (_, second) = run_network(&topology, 2018);
    let (_, other) = run_network(&topology, 2019);

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn sjf_dequeues_shortest_demand_first() {
    let topology = SimConfig {
        entry: "cpu".into(),
        stations: vec![StationConfig::new("cpu", 1.0).with_discipline(Discipline::Sjf)],
        ..SimConfig::default()
    }
    .validate()
    .unwrap();
    let network = Network::build(&topology, 3);
    let simu = Simulation::new();
    let station = &network.stations()[0];

    for id in 0..20 {
        station.enqueue(JobId(id), simu.scheduler());
    }

    let demands: Vec<_> = std::iter::from_fn(|| station.dequeue())
        .map(|job| job.service_time)
        .collect();
    assert_eq!(demands.len(), 20);
    assert!(demands.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn sjf_and_fifo_serve_the_same_jobs() {
    let base = SimConfig {
        horizon: 300.0,
        ..SimConfig::default()
    };
    let fifo = base.validate().unwrap();
    let mut sjf_config = base.clone();
    for station in &mut sjf_config.stations {
        station.discipline = Discipline::Sjf;
    }
    let sjf = sjf_config.validate().unwrap();

    let (fifo_network, fifo_stats) = run_network(&fifo, 8);
    let (sjf_network, sjf_stats) = run_network(&sjf, 8);

    // Arrivals do not depend on the discipline.
    assert_eq!(fifo_network.jobs_generated(), sjf_network.jobs_generated());
    check_invariants(&fifo_stats, 300.0);
    check_invariants(&sjf_stats, 300.0);
}
