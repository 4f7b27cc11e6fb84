//! Per-station event logs.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

use qnetsim::config::{SimConfig, StationConfig};
use qnetsim::log::{StationLog, LOG_HEADER};
use qnetsim::network::Network;
use qnetsim::replication::{self, Replicate};
use qnetsim::simulation::Simulation;
use qnetsim::time::MonotonicTime;
use qnetsim::SimError;

/// Writer that keeps its output in memory.
#[derive(Clone, Default)]
struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.borrow().clone())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that always fails.
struct Broken;

impl Write for Broken {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "device unplugged"))
    }
    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "device unplugged"))
    }
}

fn small_config() -> SimConfig {
    SimConfig {
        horizon: 20.0,
        arrival_rate: 1.0,
        replicates: 2,
        entry: "front".into(),
        stations: vec![
            StationConfig::new("front", 4.0).with_routes(&[("back", 1.0)]),
            StationConfig::new("back", 4.0),
        ],
        ..SimConfig::default()
    }
}

#[test]
fn log_records_arrivals_and_service_starts() {
    let topology = small_config().validate().unwrap();
    let network = Network::build(&topology, 1);
    let capture = Capture::default();
    network.stations()[0].set_log(StationLog::new(capture.clone()));

    let mut simu = Simulation::new();
    network.spawn_on(&mut simu);
    simu.run_until(MonotonicTime::EPOCH + topology.horizon)
        .unwrap();
    network.finish_logs().unwrap();

    let lines = capture.lines();
    assert_eq!(lines[0], LOG_HEADER);

    let mut arrivals = 0;
    let mut starts = 0;
    let mut last_time = 0.0;
    for line in &lines[1..] {
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 5, "{line}");

        let time: f64 = fields[2].parse().unwrap();
        assert!(time >= last_time);
        last_time = time;
        assert_eq!(fields[2].split('.').nth(1).map(str::len), Some(6));

        let queue_len: usize = fields[4].parse().unwrap();
        assert_eq!(fields[3], if queue_len > 0 { "1" } else { "0" });

        match fields[1] {
            "1" => arrivals += 1,
            "0" => starts += 1,
            kind => panic!("unexpected event kind {kind}"),
        }
    }

    let stats = network.snapshot(simu.time());
    assert_eq!(arrivals, stats[0].jobs_received);
    assert_eq!(starts, stats[0].jobs_started);
    assert!(arrivals > 0);
}

#[test]
fn routed_jobs_are_not_logged_as_arrivals() {
    let topology = small_config().validate().unwrap();
    let network = Network::build(&topology, 7);
    let front = Capture::default();
    let back = Capture::default();
    network.stations()[0].set_log(StationLog::new(front.clone()));
    network.stations()[1].set_log(StationLog::new(back.clone()));

    let mut simu = Simulation::new();
    network.spawn_on(&mut simu);
    simu.run_until(MonotonicTime::EPOCH + topology.horizon)
        .unwrap();
    network.finish_logs().unwrap();

    let kinds = |capture: &Capture| -> Vec<String> {
        capture.lines()[1..]
            .iter()
            .map(|line| line.split('\t').nth(1).unwrap().to_owned())
            .collect()
    };
    let front_kinds = kinds(&front);
    let back_kinds = kinds(&back);
    let stats = network.snapshot(simu.time());

    let front_arrivals = front_kinds.iter().filter(|k| *k == "1").count() as u64;
    assert_eq!(front_arrivals, network.jobs_generated());

    assert!(stats[1].jobs_received > 0);
    assert!(back_kinds.iter().all(|k| k == "0"));
    assert_eq!(back_kinds.len() as u64, stats[1].jobs_started);
}

#[test]
fn log_failure_halts_the_network() {
    let topology = small_config().validate().unwrap();
    let network = Network::build(&topology, 3);
    network.stations()[0].set_log(StationLog::new(Broken));

    let mut simu = Simulation::new();
    network.spawn_on(&mut simu);
    simu.run_until(MonotonicTime::EPOCH + Duration::from_secs(50))
        .unwrap();

    assert!(simu.is_halted());
    assert!(simu.elapsed() < Duration::from_secs(50));
    assert_eq!(network.jobs_generated(), 1);
    assert!(network.finish_logs().is_err());
}

#[test]
fn log_files_are_created_per_replicate() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("nested").join("logs");
    let mut config = small_config();
    config.log_dir = Some(log_dir.clone());
    config.stations[1].report = false;

    replication::run(&config.validate().unwrap()).unwrap();

    for index in 0..2 {
        let text = fs::read_to_string(log_dir.join(format!("front{index}.csv"))).unwrap();
        assert_eq!(text.lines().next(), Some(LOG_HEADER));
        assert!(text.lines().count() > 1);
        assert!(!log_dir.join(format!("back{index}.csv")).exists());
    }
}

#[test]
fn log_failure_aborts_the_replicate() {
    let topology = small_config().validate().unwrap();
    let replicate = Replicate::new(&topology, 0).unwrap();
    replicate.network().stations()[1].set_log(StationLog::new(Broken));

    match replicate.run() {
        Err(SimError::Log {
            replicate,
            station,
            time,
            ..
        }) => {
            assert_eq!(replicate, 0);
            assert_eq!(station, "back");
            // The first service start at `back` stops the clock.
            assert!(time > 0.0 && time < topology.horizon.as_secs_f64());
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn unwritable_log_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("occupied");
    fs::write(&file, "not a directory").unwrap();

    let mut config = small_config();
    config.log_dir = Some(file);

    assert!(matches!(
        replication::run(&config.validate().unwrap()),
        Err(SimError::LogDir { .. })
    ));
}
