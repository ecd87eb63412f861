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

extern crate fnv;
extern crate ndarray;
extern crate sprs;

use std::time::Instant;

use fnv::FnvHashMap;
use ndarray::Array1;
use sprs::TriMat;

use Recommender;
use solver;
use temporal::Context;
use types::{clamp_rating, DenseVector, Rating};
use utils;

const DAMPING: f64 = 0.1;
const MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-12;

/// Damped least squares over an extended one-hot design matrix.
///
/// On top of the user, item and context-flag columns this model one-hot
/// encodes the (year, quarter) of every rating, assembles the design matrix
/// directly in sparse triplet form (all entries are 0/1 indicators) and
/// solves the Tikhonov-damped system with the iterative solver. The damping
/// guards against the rank deficiency of the exploded one-hot column space.
pub struct RegularizedLeastSquaresRecommender {
    global_mean: f64,
    user_columns: FnvHashMap<u32, usize>,
    item_columns: FnvHashMap<u32, usize>,
    period_columns: FnvHashMap<(i32, u8), usize>,
    weekend_column: usize,
    daytime_column: usize,
    nighttime_column: usize,
    coefficients: DenseVector,
}

impl RegularizedLeastSquaresRecommender {

    pub fn fit(ratings: &[Rating]) -> Self {

        let fit_start = Instant::now();

        let global_mean = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().map(|rating| rating.rating).sum::<f64>() / ratings.len() as f64
        };

        let mut user_columns: FnvHashMap<u32, usize> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());
        let mut item_columns: FnvHashMap<u32, usize> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());
        let mut period_columns: FnvHashMap<(i32, u8), usize> =
            FnvHashMap::with_capacity_and_hasher(16, Default::default());

        for rating in ratings {
            let next_user_column = user_columns.len();
            user_columns.entry(rating.user).or_insert(next_user_column);
        }

        for rating in ratings {
            let next_item_column = user_columns.len() + item_columns.len();
            item_columns.entry(rating.item).or_insert(next_item_column);
        }

        for rating in ratings {
            let context = Context::from_timestamp(rating.timestamp);
            let next_period_column =
                user_columns.len() + item_columns.len() + period_columns.len();
            period_columns.entry((context.year, context.quarter)).or_insert(next_period_column);
        }

        let weekend_column = user_columns.len() + item_columns.len() + period_columns.len();
        let daytime_column = weekend_column + 1;
        let nighttime_column = weekend_column + 2;
        let num_columns = weekend_column + 3;

        // All design matrix entries are 0/1 indicators, assembled straight
        // into triplet form
        let mut triplets = TriMat::new((ratings.len(), num_columns));
        let mut targets = Array1::zeros(ratings.len());

        for (row, rating) in ratings.iter().enumerate() {

            let context = Context::from_timestamp(rating.timestamp);

            triplets.add_triplet(row, user_columns[&rating.user], 1.0);
            triplets.add_triplet(row, item_columns[&rating.item], 1.0);
            triplets.add_triplet(row, period_columns[&(context.year, context.quarter)], 1.0);

            if context.is_weekend {
                triplets.add_triplet(row, weekend_column, 1.0);
            }
            if context.is_daytime {
                triplets.add_triplet(row, daytime_column, 1.0);
            } else {
                triplets.add_triplet(row, nighttime_column, 1.0);
            }

            targets[row] = rating.rating - global_mean;
        }

        let design = triplets.to_csr();

        let coefficients = solver::lsqr(&design, &targets, DAMPING, MAX_ITERATIONS, TOLERANCE);

        let fit_duration = utils::to_millis(fit_start.elapsed());
        println!(
            "Fitted regularized model on {} ratings ({} columns) in {}ms",
            ratings.len(), num_columns, fit_duration,
        );

        RegularizedLeastSquaresRecommender {
            global_mean,
            user_columns,
            item_columns,
            period_columns,
            weekend_column,
            daytime_column,
            nighttime_column,
            coefficients,
        }
    }

    /// Unclamped prediction, exposed for evaluation.
    ///
    /// The user and the (year, quarter) period of the timestamp are required,
    /// missing either degrades the prediction to the global mean. An unseen
    /// item however is silently omitted from the coefficient sum. This
    /// asymmetry tolerates new items but not new users or time periods and
    /// is a deliberate behavioral contract.
    pub fn raw_predict(&self, user: u32, item: u32, timestamp: i64) -> f64 {

        let context = Context::from_timestamp(timestamp);

        let user_column = match self.user_columns.get(&user) {
            Some(&column) => column,
            None => return self.global_mean,
        };
        let period_column = match self.period_columns.get(&(context.year, context.quarter)) {
            Some(&column) => column,
            None => return self.global_mean,
        };

        let mut deviation = self.coefficients[user_column] + self.coefficients[period_column];

        if let Some(&item_column) = self.item_columns.get(&item) {
            deviation += self.coefficients[item_column];
        }

        if context.is_weekend {
            deviation += self.coefficients[self.weekend_column];
        }
        if context.is_daytime {
            deviation += self.coefficients[self.daytime_column];
        } else {
            deviation += self.coefficients[self.nighttime_column];
        }

        self.global_mean + deviation
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }
}

impl Recommender for RegularizedLeastSquaresRecommender {

    fn predict(&self, user: u32, item: u32, timestamp: i64) -> f64 {
        clamp_rating(self.raw_predict(user, item, timestamp))
    }
}

#[cfg(test)]
mod tests {

    use Recommender;
    use regularized::RegularizedLeastSquaresRecommender;
    use temporal::Context;
    use types::{Rating, MAX_RATING, MIN_RATING};

    // 2019-01-03 12:00:00 UTC, a Thursday noon
    const THURSDAY_NOON: i64 = 1546516800;
    const DAY: i64 = 86400;
    const YEAR: i64 = 365 * DAY;

    fn synthetic_ratings() -> Vec<Rating> {

        let mut ratings = Vec::new();

        for user in 0..4u32 {
            for item in 0..4u32 {
                let value = 1.0 + ((user * 5 + item * 2) % 8) as f64 * 0.5;
                let timestamp = THURSDAY_NOON
                    + (item as i64 % 2) * DAY
                    + (user as i64 % 2) * 9 * 3600;
                ratings.push(Rating { user, item, rating: value, timestamp });
            }
        }

        ratings
    }

    #[test]
    fn unseen_item_is_omitted_instead_of_triggering_fallback() {
        let ratings = synthetic_ratings();
        let model = RegularizedLeastSquaresRecommender::fit(&ratings);

        let timestamp = THURSDAY_NOON;
        let raw = model.raw_predict(0, 999, timestamp);

        // The item coefficient is dropped, everything else still applies
        let context = Context::from_timestamp(timestamp);
        let user_column = model.user_columns[&0];
        let period_column = model.period_columns[&(context.year, context.quarter)];

        let mut expected = model.global_mean()
            + model.coefficients[user_column]
            + model.coefficients[period_column];
        if context.is_weekend {
            expected += model.coefficients[model.weekend_column];
        }
        expected += if context.is_daytime {
            model.coefficients[model.daytime_column]
        } else {
            model.coefficients[model.nighttime_column]
        };

        assert!((raw - expected).abs() < 1e-12);
    }

    #[test]
    fn unseen_user_triggers_fallback() {
        let model = RegularizedLeastSquaresRecommender::fit(&synthetic_ratings());

        let raw = model.raw_predict(999, 0, THURSDAY_NOON);

        assert_eq!(raw, model.global_mean());
    }

    #[test]
    fn unseen_period_triggers_fallback() {
        let model = RegularizedLeastSquaresRecommender::fit(&synthetic_ratings());

        // Five years after the fit data, the (year, quarter) column is missing
        let raw = model.raw_predict(0, 0, THURSDAY_NOON + 5 * YEAR);

        assert_eq!(raw, model.global_mean());
    }

    #[test]
    fn seen_entities_use_all_coefficients() {
        let ratings = synthetic_ratings();
        let model = RegularizedLeastSquaresRecommender::fit(&ratings);

        let sample = &ratings[5];
        let raw = model.raw_predict(sample.user, sample.item, sample.timestamp);

        let context = Context::from_timestamp(sample.timestamp);
        let mut expected = model.global_mean()
            + model.coefficients[model.user_columns[&sample.user]]
            + model.coefficients[model.item_columns[&sample.item]]
            + model.coefficients[model.period_columns[&(context.year, context.quarter)]];
        if context.is_weekend {
            expected += model.coefficients[model.weekend_column];
        }
        expected += if context.is_daytime {
            model.coefficients[model.daytime_column]
        } else {
            model.coefficients[model.nighttime_column]
        };

        assert!((raw - expected).abs() < 1e-12);
    }

    #[test]
    fn refitting_is_deterministic() {
        let ratings = synthetic_ratings();

        let first = RegularizedLeastSquaresRecommender::fit(&ratings);
        let second = RegularizedLeastSquaresRecommender::fit(&ratings);

        assert_eq!(first.coefficients.len(), second.coefficients.len());
        for (a, b) in first.coefficients.iter().zip(second.coefficients.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn predictions_stay_in_the_valid_range() {
        let model = RegularizedLeastSquaresRecommender::fit(&synthetic_ratings());

        for user in 0..6 {
            for item in 0..6 {
                for &timestamp in &[THURSDAY_NOON, THURSDAY_NOON + DAY, THURSDAY_NOON + 5 * YEAR] {
                    let prediction = model.predict(user, item, timestamp);
                    assert!(prediction >= MIN_RATING && prediction <= MAX_RATING);
                }
            }
        }
    }
}
