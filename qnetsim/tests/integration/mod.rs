mod config_loading;
mod network_invariants;
mod replication_runs;
mod routing_draws;
mod simulation_scheduling;
mod station_logs;
