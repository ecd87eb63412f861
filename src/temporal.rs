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

extern crate chrono;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

/// Temporal context of a rating, derived from its epoch timestamp (UTC).
///
/// Note that the weekend covers Friday and Saturday, not Saturday and Sunday.
/// This definition is a behavioral contract of the models and must not be
/// changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub is_weekend: bool,
    pub is_daytime: bool,
    pub is_nighttime: bool,
    pub year: i32,
    pub quarter: u8,
}

impl Context {

    pub fn from_timestamp(timestamp: i64) -> Self {

        let time: DateTime<Utc> = DateTime::from_timestamp(timestamp, 0)
            .unwrap_or_default();

        let weekday = time.weekday();
        let is_weekend = weekday == Weekday::Fri || weekday == Weekday::Sat;

        // Daytime is the half-open interval [06:00, 18:00)
        let is_daytime = time.hour() >= 6 && time.hour() < 18;

        Context {
            is_weekend,
            is_daytime,
            is_nighttime: !is_daytime,
            year: time.year(),
            quarter: ((time.month() - 1) / 3 + 1) as u8,
        }
    }
}
