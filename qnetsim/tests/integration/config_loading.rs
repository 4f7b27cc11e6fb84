//! Configuration files.

use std::fs;

use qnetsim::config::{ConfigError, SimConfig};
use qnetsim::network::{Discipline, RoutingError};

#[test]
fn load_reads_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("network.toml");
    fs::write(
        &path,
        r#"
        horizon = 50.0
        arrival_rate = 0.5
        replicates = 3
        entry = "front"

        [[stations]]
        name = "front"
        service_rate = 2.0
        discipline = "sjf"
        routes = { to = ["back", "front"], probabilities = [0.75, 0.25] }

        [[stations]]
        name = "back"
        service_rate = 3.0
        "#,
    )
    .unwrap();

    let config = SimConfig::load(&path).unwrap();
    assert_eq!(config.replicates, 3);
    assert_eq!(config.seed, SimConfig::default().seed);
    assert_eq!(config.stations[0].discipline, Discipline::Sjf);

    let topology = config.validate().unwrap();
    assert_eq!(topology.entry, 0);
    assert_eq!(topology.max_jobs, 250);
    assert_eq!(topology.routing.route(0).unwrap().destinations(), &[1, 0]);
    assert!(topology.routing.route(1).is_none());
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    let err = SimConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn load_reports_syntax_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "horizon = [").unwrap();

    assert!(matches!(
        SimConfig::load(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn routing_errors_name_the_station() {
    let config = SimConfig::from_toml_str(
        r#"
        entry = "a"

        [[stations]]
        name = "a"
        service_rate = 1.0
        routes = { to = ["a"], probabilities = [-1.0] }
        "#,
    )
    .unwrap();

    let err = config.validate().unwrap_err();
    assert_eq!(err.to_string(), "invalid routing for station `a`");
    assert!(matches!(
        err,
        ConfigError::Routing {
            source: RoutingError::InvalidProbability(_),
            ..
        }
    ));
}

#[test]
fn unknown_discipline_is_rejected() {
    let result = SimConfig::from_toml_str(
        r#"
        [[stations]]
        name = "a"
        service_rate = 1.0
        discipline = "lifo"
        "#,
    );

    assert!(matches!(result, Err(ConfigError::Parse(_))));
}
