//! Nearest-neighbor search and voting.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::speaker::{Label, TrainingSample};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
}

impl DistanceMetric {
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        let pairs = a.iter().zip(b);
        match self {
            DistanceMetric::Euclidean => pairs.map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt(),
            DistanceMetric::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Manhattan => "manhattan",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Neighbor {
    /// Position of the sample in enrollment order.
    pub index: usize,
    pub label: Label,
    pub distance: f64,
}

/// Finds the `k` training samples closest to a query.
///
/// Implementations must return neighbors sorted by ascending distance, with
/// equal distances kept in enrollment order.
pub trait NeighborSearch {
    fn nearest(
        &self,
        query: &[f64],
        samples: &[TrainingSample],
        k: usize,
        metric: DistanceMetric,
    ) -> Vec<Neighbor>;
}

/// Exhaustive search over every sample.
#[derive(Clone, Copy, Debug, Default)]
pub struct BruteForce;

impl NeighborSearch for BruteForce {
    fn nearest(
        &self,
        query: &[f64],
        samples: &[TrainingSample],
        k: usize,
        metric: DistanceMetric,
    ) -> Vec<Neighbor> {
        let mut ranked: Vec<Neighbor> = samples
            .iter()
            .enumerate()
            .map(|(index, sample)| Neighbor {
                index,
                label: sample.label,
                distance: metric.distance(query, &sample.features),
            })
            .collect();
        // sort_by is stable, so ties keep enrollment order
        ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        ranked.truncate(k);
        ranked
    }
}

/// Majority label among ranked neighbors, with its vote count.
///
/// When several labels share the top count, the one whose closest member
/// ranks first wins.
pub fn majority_vote(neighbors: &[Neighbor]) -> Option<(Label, usize)> {
    // (label, votes, best rank)
    let mut tally: Vec<(Label, usize, usize)> = Vec::new();
    for (rank, n) in neighbors.iter().enumerate() {
        match tally.iter_mut().find(|(label, _, _)| *label == n.label) {
            Some(entry) => entry.1 += 1,
            None => tally.push((n.label, 1, rank)),
        }
    }
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)))
        .map(|(label, votes, _)| (label, votes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(features: &[f64], label: Label) -> TrainingSample {
        TrainingSample {
            features: features.to_vec(),
            label,
        }
    }

    fn neighbor(label: Label, distance: f64) -> Neighbor {
        Neighbor {
            index: 0,
            label,
            distance,
        }
    }

    #[test]
    fn metrics() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!((DistanceMetric::Euclidean.distance(&a, &b) - 5.0).abs() < 1e-12);
        assert!((DistanceMetric::Manhattan.distance(&a, &b) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn brute_force_ranks_by_distance() {
        let samples = vec![sample(&[10.0], 1), sample(&[1.0], 0), sample(&[4.0], 2)];
        let found = BruteForce.nearest(&[0.0], &samples, 2, DistanceMetric::Euclidean);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].index, 1);
        assert_eq!(found[1].index, 2);
    }

    #[test]
    fn equal_distances_keep_enrollment_order() {
        let samples = vec![sample(&[-1.0], 7), sample(&[1.0], 3)];
        let found = BruteForce.nearest(&[0.0], &samples, 2, DistanceMetric::Euclidean);
        assert_eq!(found[0].label, 7);
        assert_eq!(found[1].label, 3);
    }

    #[test]
    fn vote_takes_majority() {
        let ranked = [neighbor(1, 0.1), neighbor(0, 0.2), neighbor(0, 0.3)];
        assert_eq!(majority_vote(&ranked), Some((0, 2)));
    }

    #[test]
    fn vote_tie_goes_to_closest_label() {
        let ranked = [
            neighbor(4, 0.1),
            neighbor(2, 0.2),
            neighbor(2, 0.3),
            neighbor(4, 0.4),
        ];
        assert_eq!(majority_vote(&ranked), Some((4, 2)));
    }

    #[test]
    fn vote_on_nothing() {
        assert_eq!(majority_vote(&[]), None);
    }

    #[test]
    fn metric_names() {
        assert_eq!(DistanceMetric::Euclidean.to_string(), "euclidean");
        assert_eq!(DistanceMetric::Manhattan.to_string(), "manhattan");
    }
}
