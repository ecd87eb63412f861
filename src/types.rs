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

extern crate ndarray;

use ndarray::{Array1, Array2};

/// A single observed rating. The collection of these tuples is the only input
/// to model fitting; records are never mutated once fitting has started.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rating {
    pub user: u32,
    pub item: u32,
    pub rating: f64,
    pub timestamp: i64,
}

pub type DenseVector = Array1<f64>;
pub type DenseMatrix = Array2<f64>;

pub const MIN_RATING: f64 = 0.5;
pub const MAX_RATING: f64 = 5.0;

/// All predictions are clamped into the valid rating range.
pub fn clamp_rating(value: f64) -> f64 {
    value.max(MIN_RATING).min(MAX_RATING)
}

pub fn new_dense_matrix(num_rows: usize, num_columns: usize) -> DenseMatrix {
    Array2::zeros((num_rows, num_columns))
}
