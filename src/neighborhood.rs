/**
 * RateRec
 * Copyright (C) 2026 The RateRec authors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use Recommender;
use stats::{Indexing, RatingStats};
use types::{clamp_rating, new_dense_matrix, DenseMatrix, Rating};
use utils;

const NUM_NEIGHBOURS: usize = 3;

/// User-user collaborative filtering over mean-centered ratings.
///
/// Fitting builds an item×user deviation matrix (rating minus global mean,
/// zero where unobserved), a presence mask of observed pairs, and a dense
/// user×user correlation matrix. Prediction averages the deviations of the
/// most correlated co-raters of the queried item.
pub struct NeighborhoodRecommender {
    stats: RatingStats,
    indexing: Indexing,
    deviations: DenseMatrix,
    presence: DenseMatrix,
    correlations: DenseMatrix,
}

/// Candidate neighbor for the top-k selection. Ordered by the magnitude of
/// the correlation score, reversed so that the binary heap keeps the weakest
/// candidate on top for cheap replacement. There is no total order on floats,
/// incomparable scores are treated as equal.
#[derive(PartialEq, Debug)]
struct ScoredNeighbour {
    user_index: usize,
    score: f64,
}

fn cmp_reverse_by_magnitude(a: &ScoredNeighbour, b: &ScoredNeighbour) -> Ordering {
    match a.score.abs().partial_cmp(&b.score.abs()) {
        Some(Ordering::Less) => Ordering::Greater,
        Some(Ordering::Greater) => Ordering::Less,
        Some(Ordering::Equal) => Ordering::Equal,
        None => Ordering::Equal,
    }
}

impl Eq for ScoredNeighbour {}

impl Ord for ScoredNeighbour {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reverse_by_magnitude(self, other)
    }
}

impl PartialOrd for ScoredNeighbour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_reverse_by_magnitude(self, other))
    }
}

impl NeighborhoodRecommender {

    pub fn fit(ratings: &[Rating]) -> Self {

        let fit_start = Instant::now();

        let stats = RatingStats::from_ratings(ratings);
        let indexing = Indexing::from_ratings(ratings);

        let num_users = indexing.num_users();
        let num_items = indexing.num_items();

        let global_mean = stats.global_mean();

        // Deviation matrix D[item][user] = rating - R̂, zero means unobserved.
        // The presence mask tracks observed pairs so that we never have to
        // compare deviations against zero later on.
        let mut deviations = new_dense_matrix(num_items, num_users);
        let mut presence = new_dense_matrix(num_items, num_users);

        for rating in ratings {
            let item_index = indexing.item_index(rating.item).unwrap();
            let user_index = indexing.user_index(rating.user).unwrap();

            deviations[(item_index, user_index)] = rating.rating - global_mean;
            presence[(item_index, user_index)] = 1.0;
        }

        let correlations = user_correlations(&deviations, &presence);

        let fit_duration = utils::to_millis(fit_start.elapsed());
        println!(
            "Fitted neighborhood model on {} ratings ({} users, {} items) in {}ms",
            ratings.len(), num_users, num_items, fit_duration,
        );

        NeighborhoodRecommender { stats, indexing, deviations, presence, correlations }
    }

    /// Raw correlation of two users, 0 if either user was not part of the
    /// fit data. The derived formula can exceed [-1, 1] in edge cases, we
    /// report it as computed.
    pub fn user_similarity(&self, user1: u32, user2: u32) -> f64 {

        match (self.indexing.user_index(user1), self.indexing.user_index(user2)) {
            (Some(index1), Some(index2)) => self.correlations[(index1, index2)],
            _ => 0.0,
        }
    }

    fn neighbour_deviation(&self, user_index: usize, item_index: usize) -> f64 {

        let mut candidates: BinaryHeap<ScoredNeighbour> =
            BinaryHeap::with_capacity(NUM_NEIGHBOURS);

        for other_user in 0..self.indexing.num_users() {

            // Candidates must have rated the item; the queried user itself
            // and uncorrelated users carry no signal and stay missing
            if other_user == user_index {
                continue;
            }
            if self.presence[(item_index, other_user)] == 0.0 {
                continue;
            }

            let score = self.correlations[(user_index, other_user)];
            if score == 0.0 {
                continue;
            }

            let candidate = ScoredNeighbour { user_index: other_user, score };

            if candidates.len() < NUM_NEIGHBOURS {
                candidates.push(candidate);
            } else {
                let mut weakest = candidates.peek_mut().unwrap();
                if candidate < *weakest {
                    *weakest = candidate;
                }
            }
        }

        let mut weighted_deviations = 0.0;
        let mut weight_magnitudes = 0.0;

        for candidate in candidates.iter() {
            weighted_deviations +=
                candidate.score * self.deviations[(item_index, candidate.user_index)];
            weight_magnitudes += candidate.score.abs();
        }

        if weight_magnitudes == 0.0 {
            0.0
        } else {
            weighted_deviations / weight_magnitudes
        }
    }
}

impl Recommender for NeighborhoodRecommender {

    fn predict(&self, user: u32, item: u32, _timestamp: i64) -> f64 {

        let global_mean = self.stats.global_mean();

        let (user_bias, item_bias) =
            match (self.stats.user_bias(user), self.stats.item_bias(item)) {
                (Some(user_bias), Some(item_bias)) => (user_bias, item_bias),
                _ => return clamp_rating(global_mean),
            };

        let user_index = self.indexing.user_index(user).unwrap();
        let item_index = self.indexing.item_index(item).unwrap();

        let neighbour_deviation = self.neighbour_deviation(user_index, item_index);

        clamp_rating(global_mean + user_bias + item_bias + neighbour_deviation)
    }
}

/// Correlation of every pair of users over the items both have rated:
///
///   numerator   = DᵗD
///   A           = (D∘D)ᵗ P
///   denominator = A(a,b)·A(b,a)
///   corr(a,b)   = numerator(a,b) / sqrt(denominator(a,b))
///
/// A(a,b) restricts the squared deviations of user a to the items user b
/// also rated, so the product A(a,b)·A(b,a) is symmetric even though A is
/// not. Indeterminate entries (no shared items) are fixed to 0.
fn user_correlations(deviations: &DenseMatrix, presence: &DenseMatrix) -> DenseMatrix {

    let numerator = deviations.t().dot(deviations);

    let squared_deviations = deviations.mapv(|value| value * value);
    let restricted_norms = squared_deviations.t().dot(presence);

    let num_users = deviations.ncols();
    let mut correlations = new_dense_matrix(num_users, num_users);

    for a in 0..num_users {
        for b in 0..num_users {
            let denominator = restricted_norms[(a, b)] * restricted_norms[(b, a)];
            let correlation = numerator[(a, b)] / denominator.sqrt();

            correlations[(a, b)] = if correlation.is_finite() {
                correlation
            } else {
                0.0
            };
        }
    }

    correlations
}

#[cfg(test)]
mod tests {

    use Recommender;
    use baseline::BaselineRecommender;
    use neighborhood::NeighborhoodRecommender;
    use types::{Rating, MAX_RATING, MIN_RATING};

    fn small_ratings() -> Vec<Rating> {
        vec![
            Rating { user: 1, item: 1, rating: 5.0, timestamp: 100 },
            Rating { user: 1, item: 2, rating: 3.0, timestamp: 100 },
            Rating { user: 2, item: 1, rating: 4.0, timestamp: 200 },
            Rating { user: 2, item: 2, rating: 2.0, timestamp: 200 },
        ]
    }

    #[test]
    fn correlations_match_manual_computation() {
        let model = NeighborhoodRecommender::fit(&small_ratings());

        // Deviations: item 1 -> (1.5, 0.5), item 2 -> (-0.5, -1.5).
        // numerator(1,2) = 1.5·0.5 + 0.5·1.5 = 1.5
        // A(1,2) = A(2,1) = 2.25 + 0.25 = 2.5, denominator = 6.25
        // corr(1,2) = 1.5 / 2.5 = 0.6
        assert!((model.user_similarity(1, 2) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn correlation_matrix_is_symmetric() {
        let ratings = vec![
            Rating { user: 1, item: 1, rating: 5.0, timestamp: 0 },
            Rating { user: 1, item: 2, rating: 1.0, timestamp: 0 },
            Rating { user: 2, item: 1, rating: 4.0, timestamp: 0 },
            Rating { user: 2, item: 3, rating: 2.0, timestamp: 0 },
            Rating { user: 3, item: 2, rating: 3.0, timestamp: 0 },
            Rating { user: 3, item: 3, rating: 5.0, timestamp: 0 },
            Rating { user: 4, item: 4, rating: 2.5, timestamp: 0 },
        ];

        let model = NeighborhoodRecommender::fit(&ratings);

        for &a in &[1, 2, 3, 4] {
            for &b in &[1, 2, 3, 4] {
                let forward = model.user_similarity(a, b);
                let backward = model.user_similarity(b, a);
                assert!(
                    (forward - backward).abs() < 1e-12,
                    "corr({}, {}) = {} but corr({}, {}) = {}",
                    a, b, forward, b, a, backward,
                );
            }
        }
    }

    #[test]
    fn self_similarity_is_one_for_active_users() {
        // A(a,a) equals the full squared deviation norm of user a, so the
        // self-correlation evaluates to 1 for every user with ratings
        let model = NeighborhoodRecommender::fit(&small_ratings());

        assert!((model.user_similarity(1, 1) - 1.0).abs() < 1e-9);
        assert!((model.user_similarity(2, 2) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_of_unseen_users_is_zero() {
        let model = NeighborhoodRecommender::fit(&small_ratings());

        assert_eq!(model.user_similarity(1, 99), 0.0);
        assert_eq!(model.user_similarity(99, 1), 0.0);
    }

    #[test]
    fn prediction_uses_neighbour_deviations() {
        let model = NeighborhoodRecommender::fit(&small_ratings());

        // For predict(2, 2, _) the only candidate is user 1 with score 0.6,
        // contributing deviation D[2][1] = -0.5. The prediction is
        // 3.5 - 0.5 - 1.0 - 0.5 = 1.5
        assert!((model.predict(2, 2, 0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn without_neighbours_the_prediction_reduces_to_the_baseline() {
        // User 3 shares no items with anybody, so predicting item 1 for it
        // finds raters but no correlated ones
        let ratings = vec![
            Rating { user: 1, item: 1, rating: 5.0, timestamp: 0 },
            Rating { user: 2, item: 1, rating: 4.0, timestamp: 0 },
            Rating { user: 3, item: 2, rating: 3.0, timestamp: 0 },
        ];

        let neighborhood = NeighborhoodRecommender::fit(&ratings);
        let baseline = BaselineRecommender::fit(&ratings);

        let from_neighborhood = neighborhood.predict(3, 1, 0);
        let from_baseline = baseline.predict(3, 1, 0);

        assert!((from_neighborhood - from_baseline).abs() < 1e-12);
    }

    #[test]
    fn falls_back_to_global_mean_for_unseen_entities() {
        let model = NeighborhoodRecommender::fit(&small_ratings());

        assert!((model.predict(99, 1, 0) - 3.5).abs() < 1e-9);
        assert!((model.predict(1, 99, 0) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn predictions_stay_in_the_valid_range() {
        let model = NeighborhoodRecommender::fit(&small_ratings());

        for user in 0..5 {
            for item in 0..5 {
                let prediction = model.predict(user, item, 0);
                assert!(prediction >= MIN_RATING && prediction <= MAX_RATING);
            }
        }
    }
}
