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

use Recommender;
use stats::RatingStats;
use types::{clamp_rating, Rating};

/// Global mean plus per-user and per-item mean deviations.
pub struct BaselineRecommender {
    stats: RatingStats,
}

impl BaselineRecommender {

    pub fn fit(ratings: &[Rating]) -> Self {
        BaselineRecommender { stats: RatingStats::from_ratings(ratings) }
    }

    pub fn global_mean(&self) -> f64 {
        self.stats.global_mean()
    }
}

impl Recommender for BaselineRecommender {

    fn predict(&self, user: u32, item: u32, _timestamp: i64) -> f64 {

        let global_mean = self.stats.global_mean();

        // An unseen user or item degrades the prediction to the global mean
        match (self.stats.user_bias(user), self.stats.item_bias(item)) {
            (Some(user_bias), Some(item_bias)) =>
                clamp_rating(global_mean + user_bias + item_bias),
            _ => clamp_rating(global_mean),
        }
    }
}
