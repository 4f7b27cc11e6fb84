//! Destination sampling.

use proptest::prelude::*;
use qnetsim::network::RoutingTable;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Normalized weights over 1 to 6 destinations.
fn distribution() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..10.0, 1..6).prop_filter_map("all weights zero", |weights| {
        let sum: f64 = weights.iter().sum();
        (sum > 0.0).then(|| weights.iter().map(|w| w / sum).collect())
    })
}

proptest! {
    /// Property: every sampled destination is a candidate with non-zero
    /// probability.
    #[test]
    fn prop_sampled_destination_is_a_candidate(
        probabilities in distribution(),
        seed in any::<u64>(),
    ) {
        let count = probabilities.len();
        // Destinations are stations 1..=count; station 0 is the source.
        let destinations: Vec<_> = (1..=count).collect();
        let mut table = RoutingTable::new(count + 1);
        table.set_route(0, destinations.clone(), probabilities.clone()).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..200 {
            let next = table.next_hop(0, &mut rng).unwrap();
            prop_assert!(destinations.contains(&next));
            prop_assert!(probabilities[next - 1] > 0.0);
        }
    }

    /// Property: probabilities that do not sum to 1 are rejected.
    #[test]
    fn prop_unnormalized_distribution_is_rejected(
        probabilities in distribution(),
        scale in prop_oneof![0.1f64..0.99, 1.01f64..10.0],
    ) {
        let count = probabilities.len();
        let scaled: Vec<_> = probabilities.iter().map(|p| p * scale).collect();
        let mut table = RoutingTable::new(count + 1);

        prop_assert!(table.set_route(0, (1..=count).collect(), scaled).is_err());
    }
}

#[test]
fn empirical_frequencies_converge() {
    let probabilities = [0.6, 0.3, 0.1];
    let mut table = RoutingTable::new(4);
    table
        .set_route(0, vec![1, 2, 3], probabilities.to_vec())
        .unwrap();

    let draws = 100_000;
    let mut counts = [0usize; 4];
    let mut rng = ChaCha8Rng::seed_from_u64(2018);
    for _ in 0..draws {
        counts[table.next_hop(0, &mut rng).unwrap()] += 1;
    }

    assert_eq!(counts[0], 0);
    for (k, p) in probabilities.iter().enumerate() {
        let frequency = counts[k + 1] as f64 / draws as f64;
        // About 6 standard deviations for the largest variance.
        assert!((frequency - p).abs() < 0.01, "destination {}: {frequency}", k + 1);
    }
}
