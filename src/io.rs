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

extern crate csv;
extern crate serde;
extern crate serde_json;

use std;
use std::error::Error;
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::stdout;
use std::path::Path;

use types::Rating;

/// Reads a CSV input file. We expect NO headers and one
/// user, item, rating, timestamp tuple per line, tab separated, in exactly
/// this column order.
pub fn csv_reader(file: &str) -> Result<csv::Reader<File>, csv::Error> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_path(file)?;

    Ok(reader)
}

/// Reads all rating records from a CSV source. A malformed row is a caller
/// contract violation and fails the whole read.
pub fn ratings_from_csv<R>(reader: &mut csv::Reader<R>) -> Result<Vec<Rating>, Box<dyn Error>>
    where R: std::io::Read {

    let mut ratings = Vec::new();

    for record in reader.deserialize() {
        let rating: Rating = record?;
        ratings.push(rating);
    }

    Ok(ratings)
}

pub fn read_ratings(file: &str) -> Result<Vec<Rating>, Box<dyn Error>> {
    let mut reader = csv_reader(file)?;
    ratings_from_csv(&mut reader)
}

/// Struct used for JSON serialization of computed predictions. Field names
/// will be used in JSON.
#[derive(Serialize)]
struct Prediction {
    user: u32,
    item: u32,
    predicted: f64,
}

/// Output one prediction per evaluated row in JSON format. If a
/// `predictions_path` is supplied, we write to a file at the specified path,
/// otherwise, we output to stdout.
pub fn write_predictions(
    rows: &[Rating],
    predictions: &[f64],
    predictions_path: Option<String>,
) -> io::Result<()> {

    let mut out: Box<dyn Write> = match predictions_path {
        Some(path) => Box::new(File::create(&Path::new(&path))?),
        _ => Box::new(stdout()),
    };

    for (row, &predicted) in rows.iter().zip(predictions.iter()) {

        let prediction_as_json = json!(
            Prediction {
                user: row.user,
                item: row.item,
                predicted,
            });

        write!(out, "{}\n", prediction_as_json.to_string())?;
    }

    Ok(())
}
