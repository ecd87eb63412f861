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

use fnv::FnvHashMap;
use ndarray::Array1;
use sprs::{CsMat, TriMat};

use Recommender;
use solver;
use temporal::Context;
use types::{clamp_rating, new_dense_matrix, DenseMatrix, DenseVector, Rating};

const MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-12;

/// Ordinary least squares over a one-hot design matrix.
///
/// Each fit record becomes one row of the design matrix X, with an indicator
/// column per observed user, one per observed item, and three binary context
/// flags (weekend, daytime, nighttime). The target is the mean-centered
/// rating. The column set is fixed at fit time; entities without a column
/// cannot contribute at inference.
pub struct LeastSquaresRecommender {
    global_mean: f64,
    user_columns: FnvHashMap<u32, usize>,
    item_columns: FnvHashMap<u32, usize>,
    weekend_column: usize,
    daytime_column: usize,
    nighttime_column: usize,
    design: DenseMatrix,
    targets: DenseVector,
    coefficients: DenseVector,
}

impl LeastSquaresRecommender {

    pub fn fit(ratings: &[Rating]) -> Self {

        let global_mean = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().map(|rating| rating.rating).sum::<f64>() / ratings.len() as f64
        };

        // Explicit (category, id) -> column mappings, assigned in first-seen
        // order: users first, then items, then the three context flags
        let mut user_columns: FnvHashMap<u32, usize> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());
        let mut item_columns: FnvHashMap<u32, usize> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());

        for rating in ratings {
            let next_user_column = user_columns.len();
            user_columns.entry(rating.user).or_insert(next_user_column);
        }

        for rating in ratings {
            let next_item_column = user_columns.len() + item_columns.len();
            item_columns.entry(rating.item).or_insert(next_item_column);
        }

        let weekend_column = user_columns.len() + item_columns.len();
        let daytime_column = weekend_column + 1;
        let nighttime_column = weekend_column + 2;
        let num_columns = weekend_column + 3;

        let mut design = new_dense_matrix(ratings.len(), num_columns);
        let mut targets = Array1::zeros(ratings.len());

        for (row, rating) in ratings.iter().enumerate() {

            design[(row, user_columns[&rating.user])] = 1.0;
            design[(row, item_columns[&rating.item])] = 1.0;

            let context = Context::from_timestamp(rating.timestamp);
            if context.is_weekend {
                design[(row, weekend_column)] = 1.0;
            }
            if context.is_daytime {
                design[(row, daytime_column)] = 1.0;
            } else {
                design[(row, nighttime_column)] = 1.0;
            }

            targets[row] = rating.rating - global_mean;
        }

        // The user and item indicator blocks are collinear (each sums to one
        // per row), so the system is rank deficient and we solve for the
        // minimum-norm coefficients with the undamped iterative solver
        let coefficients = solver::lsqr(
            &sparsify(&design),
            &targets,
            0.0,
            MAX_ITERATIONS,
            TOLERANCE,
        );

        LeastSquaresRecommender {
            global_mean,
            user_columns,
            item_columns,
            weekend_column,
            daytime_column,
            nighttime_column,
            design,
            targets,
            coefficients,
        }
    }

    /// The solved regression as (X, beta, y), where beta minimizes ‖Xβ − y‖₂.
    pub fn solve_ls(&self) -> (&DenseMatrix, &DenseVector, &DenseVector) {
        (&self.design, &self.coefficients, &self.targets)
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }
}

impl Recommender for LeastSquaresRecommender {

    fn predict(&self, user: u32, item: u32, timestamp: i64) -> f64 {

        // Both the user and the item column must exist, otherwise the
        // prediction degrades to the global mean
        let user_column = match self.user_columns.get(&user) {
            Some(&column) => column,
            None => return clamp_rating(self.global_mean),
        };
        let item_column = match self.item_columns.get(&item) {
            Some(&column) => column,
            None => return clamp_rating(self.global_mean),
        };

        let context = Context::from_timestamp(timestamp);

        let mut deviation = self.coefficients[user_column] + self.coefficients[item_column];

        if context.is_weekend {
            deviation += self.coefficients[self.weekend_column];
        }
        if context.is_daytime {
            deviation += self.coefficients[self.daytime_column];
        } else {
            deviation += self.coefficients[self.nighttime_column];
        }

        clamp_rating(self.global_mean + deviation)
    }
}

/// Binary indicator matrices compress well, the solver only touches the
/// nonzero entries.
fn sparsify(design: &DenseMatrix) -> CsMat<f64> {

    let mut triplets = TriMat::new((design.nrows(), design.ncols()));

    for ((row, column), &value) in design.indexed_iter() {
        if value != 0.0 {
            triplets.add_triplet(row, column, value);
        }
    }

    triplets.to_csr()
}
