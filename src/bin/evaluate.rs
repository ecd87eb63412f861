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

extern crate getopts;
extern crate num_cpus;
extern crate raterec;

use std::env;
use std::error::Error;
use std::time::Instant;

use getopts::Options;

use raterec::baseline::BaselineRecommender;
use raterec::least_squares::LeastSquaresRecommender;
use raterec::neighborhood::NeighborhoodRecommender;
use raterec::regularized::RegularizedLeastSquaresRecommender;
use raterec::{batch_predict, io, utils, Recommender};

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("t", "trainfile", "Training file name (required). The input consists of observed \
        ratings. The input file must contain a user, item, rating and epoch timestamp per line, \
        separated by a tab.", "PATH");
    opts.optopt("e", "evalfile", "Evaluation file name (optional). Same format as the training \
        file; predictions are computed for every line and the RMSE against the rating column is \
        reported.", "PATH");
    opts.optopt("m", "model", "Model to fit: baseline, neighborhood, ls or regularized \
        (optional, defaults to baseline).", "NAME");
    opts.optopt("o", "outputfile", "Output file name for the predictions of the evaluation file \
        (optional, output will be written to stdout by default).", "PATH");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    if !matches.opt_present("t") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a training file via --trainfile."),
        );
    }

    let train_path = matches.opt_str("t").unwrap();
    let eval_path = matches.opt_str("e");
    let output_path = matches.opt_str("o");

    let model_name = matches.opt_str("m").unwrap_or_else(|| "baseline".to_string());

    if let Err(failure) = evaluate(&train_path, eval_path, &model_name, output_path) {
        eprintln!("Error: {}", failure);
        std::process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn evaluate(
    train_path: &str,
    eval_path: Option<String>,
    model_name: &str,
    output_path: Option<String>,
) -> Result<(), Box<dyn Error>> {

    println!("Reading {} to fit the {} model", train_path, model_name);

    let ratings = io::read_ratings(train_path)?;

    println!("Found {} ratings.", ratings.len());

    let fit_start = Instant::now();

    let model: Box<dyn Recommender + Sync> = match model_name {
        "baseline" => Box::new(BaselineRecommender::fit(&ratings)),
        "neighborhood" => Box::new(NeighborhoodRecommender::fit(&ratings)),
        "ls" => Box::new(LeastSquaresRecommender::fit(&ratings)),
        "regularized" => Box::new(RegularizedLeastSquaresRecommender::fit(&ratings)),
        other => return Err(format!("Unknown model '{}'", other).into()),
    };

    println!("Model fitted in {}ms", utils::to_millis(fit_start.elapsed()));

    if let Some(eval_path) = eval_path {

        println!("Reading {} to score the evaluation set", eval_path);

        let held_out = io::read_ratings(&eval_path)?;

        let scoring_start = Instant::now();
        let predictions = batch_predict(model.as_ref(), &held_out, num_cpus::get());
        println!(
            "Scored {} rows in {}ms",
            held_out.len(),
            utils::to_millis(scoring_start.elapsed()),
        );

        let squared_error_sum: f64 = held_out.iter()
            .zip(predictions.iter())
            .map(|(row, prediction)| (row.rating - prediction) * (row.rating - prediction))
            .sum();
        println!("RMSE: {}", (squared_error_sum / held_out.len() as f64).sqrt());

        println!("Writing predictions...");
        io::write_predictions(&held_out, &predictions, output_path)?;
    }

    Ok(())
}
