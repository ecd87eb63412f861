extern crate fnv;

use fnv::FnvHashMap;

use types::Rating;

/// Global mean and per-user/per-item mean deviations, computed once at fit
/// time. Every user and item that occurs in the fit data has exactly one
/// bias entry.
pub struct RatingStats {
    global_mean: f64,
    user_bias: FnvHashMap<u32, f64>,
    item_bias: FnvHashMap<u32, f64>,
}

impl RatingStats {

    pub fn from_ratings(ratings: &[Rating]) -> Self {

        let mut rating_sum = 0.0;

        let mut user_sums: FnvHashMap<u32, (f64, usize)> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());
        let mut item_sums: FnvHashMap<u32, (f64, usize)> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());

        for rating in ratings {
            rating_sum += rating.rating;

            let user_entry = user_sums.entry(rating.user).or_insert((0.0, 0));
            user_entry.0 += rating.rating;
            user_entry.1 += 1;

            let item_entry = item_sums.entry(rating.item).or_insert((0.0, 0));
            item_entry.0 += rating.rating;
            item_entry.1 += 1;
        }

        let global_mean = if ratings.is_empty() {
            0.0
        } else {
            rating_sum / ratings.len() as f64
        };

        let user_bias = user_sums.into_iter()
            .map(|(user, (sum, count))| (user, sum / count as f64 - global_mean))
            .collect();

        let item_bias = item_sums.into_iter()
            .map(|(item, (sum, count))| (item, sum / count as f64 - global_mean))
            .collect();

        RatingStats { global_mean, user_bias, item_bias }
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn user_bias(&self, user: u32) -> Option<f64> {
        self.user_bias.get(&user).cloned()
    }

    pub fn item_bias(&self, item: u32) -> Option<f64> {
        self.item_bias.get(&item).cloned()
    }

    pub fn num_users(&self) -> usize {
        self.user_bias.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_bias.len()
    }
}

/// Maps the raw user and item identifiers to consecutive matrix indexes,
/// assigned in first-seen order over the fit data.
pub struct Indexing {
    user_indexes: FnvHashMap<u32, usize>,
    item_indexes: FnvHashMap<u32, usize>,
}

impl Indexing {

    pub fn from_ratings(ratings: &[Rating]) -> Self {

        let mut user_indexes: FnvHashMap<u32, usize> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());
        let mut item_indexes: FnvHashMap<u32, usize> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());

        for rating in ratings {
            let next_user_index = user_indexes.len();
            user_indexes.entry(rating.user).or_insert(next_user_index);

            let next_item_index = item_indexes.len();
            item_indexes.entry(rating.item).or_insert(next_item_index);
        }

        Indexing { user_indexes, item_indexes }
    }

    pub fn user_index(&self, user: u32) -> Option<usize> {
        self.user_indexes.get(&user).cloned()
    }

    pub fn item_index(&self, item: u32) -> Option<usize> {
        self.item_indexes.get(&item).cloned()
    }

    pub fn num_users(&self) -> usize {
        self.user_indexes.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_indexes.len()
    }
}

#[cfg(test)]
mod tests {

    use stats::{Indexing, RatingStats};
    use types::Rating;

    fn small_ratings() -> Vec<Rating> {
        vec![
            Rating { user: 1, item: 1, rating: 5.0, timestamp: 100 },
            Rating { user: 1, item: 2, rating: 3.0, timestamp: 100 },
            Rating { user: 2, item: 1, rating: 4.0, timestamp: 200 },
            Rating { user: 2, item: 2, rating: 2.0, timestamp: 200 },
        ]
    }

    #[test]
    fn global_mean_is_arithmetic_mean() {
        let stats = RatingStats::from_ratings(&small_ratings());
        assert!((stats.global_mean() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn biases_are_mean_deviations() {
        let stats = RatingStats::from_ratings(&small_ratings());

        assert!((stats.user_bias(1).unwrap() - 0.5).abs() < 1e-9);
        assert!((stats.user_bias(2).unwrap() + 0.5).abs() < 1e-9);
        assert!((stats.item_bias(1).unwrap() - 1.0).abs() < 1e-9);
        assert!((stats.item_bias(2).unwrap() + 1.0).abs() < 1e-9);

        assert!(stats.user_bias(99).is_none());
        assert!(stats.item_bias(99).is_none());
    }

    #[test]
    fn user_biases_are_centered() {
        // The interaction-weighted sum of the user biases must vanish.
        let ratings = small_ratings();
        let stats = RatingStats::from_ratings(&ratings);

        let weighted_sum: f64 = ratings.iter()
            .map(|rating| stats.user_bias(rating.user).unwrap())
            .sum();

        assert!(weighted_sum.abs() < 1e-9);
    }

    #[test]
    fn indexes_are_consecutive() {
        let indexing = Indexing::from_ratings(&small_ratings());

        assert_eq!(indexing.num_users(), 2);
        assert_eq!(indexing.num_items(), 2);
        assert_eq!(indexing.user_index(1), Some(0));
        assert_eq!(indexing.user_index(2), Some(1));
        assert_eq!(indexing.item_index(1), Some(0));
        assert_eq!(indexing.item_index(2), Some(1));
        assert_eq!(indexing.user_index(99), None);
    }
}
