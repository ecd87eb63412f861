extern crate chrono;
extern crate csv;
extern crate fnv;
extern crate ndarray;
extern crate scoped_pool;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;
extern crate sprs;

use scoped_pool::Pool;

pub mod baseline;
pub mod io;
pub mod least_squares;
pub mod neighborhood;
pub mod regularized;
pub mod solver;
pub mod stats;
pub mod temporal;
pub mod types;
pub mod utils;


use types::Rating;

/// Common interface of all rating predictors. Models fit eagerly at
/// construction and are immutable afterwards, so concurrent read-only
/// prediction against one fitted model is safe.
pub trait Recommender {

    /// Predicted rating of the user for the item, always a finite value in
    /// the valid rating range. Lookup failures for unseen entities degrade
    /// the prediction internally and are never surfaced.
    fn predict(&self, user: u32, item: u32, timestamp: i64) -> f64;

    /// Root-mean-squared error of row-wise predictions against the rating
    /// column of a held-out set.
    fn rmse(&self, held_out: &[Rating]) -> f64 {

        let squared_error_sum: f64 = held_out.iter()
            .map(|row| {
                let prediction = self.predict(row.user, row.item, row.timestamp);
                (row.rating - prediction) * (row.rating - prediction)
            })
            .sum();

        (squared_error_sum / held_out.len() as f64).sqrt()
    }
}

/// Scores the evaluation rows in parallel, sharding them over a pool of the
/// given size. Every worker predicts against a read-only borrow of the
/// fitted model and fills a disjoint part of the output, so the results come
/// back in input order. Purely a performance optimization, the outcome is
/// identical to calling `predict` row by row.
pub fn batch_predict(
    model: &(dyn Recommender + Sync),
    rows: &[Rating],
    pool_size: usize,
) -> Vec<f64> {

    if rows.is_empty() {
        return Vec::new();
    }

    let num_shards = pool_size.max(1);
    let pool = Pool::new(num_shards);

    let mut predictions = vec![0.0; rows.len()];

    let rows_per_shard = (rows.len() + num_shards - 1) / num_shards;

    pool.scoped(|scope| {
        for (row_shard, prediction_shard) in
            rows.chunks(rows_per_shard).zip(predictions.chunks_mut(rows_per_shard)) {

            scope.execute(move || {
                for (row, slot) in row_shard.iter().zip(prediction_shard.iter_mut()) {
                    *slot = model.predict(row.user, row.item, row.timestamp);
                }
            });
        }
    });

    pool.shutdown();

    predictions
}
