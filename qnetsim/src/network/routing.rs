//! Probabilistic routing between stations.

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use thiserror::Error;

use crate::network::StationId;

/// Tolerance on the sum of routing probabilities.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-9;

/// Outgoing edges of a station.
#[derive(Clone, Debug)]
pub struct Route {
    destinations: Vec<StationId>,
    probabilities: Vec<f64>,
    weights: WeightedIndex<f64>,
}

impl Route {
    /// Creates a route after checking that the probabilities form a valid
    /// distribution over `destinations`, all of which must be lower than
    /// `station_count`.
    ///
    /// Returns `Ok(None)` when both lists are empty, which marks a sink.
    pub fn new(
        destinations: Vec<StationId>,
        probabilities: Vec<f64>,
        station_count: usize,
    ) -> Result<Option<Self>, RoutingError> {
        if destinations.len() != probabilities.len() {
            return Err(RoutingError::LengthMismatch {
                destinations: destinations.len(),
                probabilities: probabilities.len(),
            });
        }
        if destinations.is_empty() {
            return Ok(None);
        }
        if let Some(&destination) = destinations.iter().find(|&&d| d >= station_count) {
            return Err(RoutingError::UnknownDestination(destination));
        }
        if let Some(&p) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(RoutingError::InvalidProbability(p));
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(RoutingError::BadSum(sum));
        }

        let weights = WeightedIndex::new(&probabilities)?;

        Ok(Some(Self {
            destinations,
            probabilities,
            weights,
        }))
    }

    /// Candidate destinations, in configuration order.
    pub fn destinations(&self) -> &[StationId] {
        &self.destinations
    }

    /// Probabilities matching [`destinations()`](Route::destinations).
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Draws one destination.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> StationId {
        self.destinations[self.weights.sample(rng)]
    }
}

/// Read-only routing lookup, indexed by source station.
#[derive(Clone, Debug, Default)]
pub struct RoutingTable {
    routes: Vec<Option<Route>>,
}

impl RoutingTable {
    /// Creates a table for `station_count` stations, all of which are sinks.
    pub fn new(station_count: usize) -> Self {
        Self {
            routes: vec![None; station_count],
        }
    }

    /// Number of stations covered by the table.
    pub fn station_count(&self) -> usize {
        self.routes.len()
    }

    /// Sets the outgoing edges of a station; empty lists make it a sink.
    pub fn set_route(
        &mut self,
        source: StationId,
        destinations: Vec<StationId>,
        probabilities: Vec<f64>,
    ) -> Result<(), RoutingError> {
        let station_count = self.routes.len();
        let slot = self
            .routes
            .get_mut(source)
            .ok_or(RoutingError::UnknownSource(source))?;
        *slot = Route::new(destinations, probabilities, station_count)?;

        Ok(())
    }

    /// Returns the outgoing edges of a station, or `None` for a sink.
    pub fn route(&self, source: StationId) -> Option<&Route> {
        self.routes.get(source).and_then(Option::as_ref)
    }

    /// Samples the next hop of a job leaving `source`, or `None` if the
    /// station is a sink.
    pub fn next_hop<R: Rng + ?Sized>(&self, source: StationId, rng: &mut R) -> Option<StationId> {
        self.route(source).map(|route| route.sample(rng))
    }
}

/// Error returned when a routing distribution is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RoutingError {
    /// Destination and probability lists have different lengths.
    #[error("{destinations} destination(s) but {probabilities} probability(ies)")]
    LengthMismatch {
        /// Number of destinations.
        destinations: usize,
        /// Number of probabilities.
        probabilities: usize,
    },
    /// A probability is negative or not finite.
    #[error("invalid probability {0}")]
    InvalidProbability(f64),
    /// Probabilities do not sum to 1.
    #[error("probabilities sum to {0} instead of 1")]
    BadSum(f64),
    /// A destination does not name an existing station.
    #[error("unknown destination station #{0}")]
    UnknownDestination(StationId),
    /// The source does not name an existing station.
    #[error("unknown source station #{0}")]
    UnknownSource(StationId),
    /// The weighted sampler rejected the distribution.
    #[error(transparent)]
    Weights(#[from] WeightedError),
}
