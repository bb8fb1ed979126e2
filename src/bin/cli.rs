//! Batch front-end: reads observed values from a file or stdin, runs
//! detection, and prints predicted values.

use std::fs;
use std::io::{self, Read};

use clap::Parser;
use derandom::{NumberSequence, NumberType, RandomManager};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "derandom-cli", about = "File/stdin front-end for PRNG detection and prediction")]
struct Args {
    /// Path to a file of one observed value per line; reads stdin if omitted.
    #[arg(long)]
    input: Option<String>,

    #[arg(long, default_value_t = 1024)]
    history_capacity: usize,

    /// How many future values to predict once a generator is detected.
    #[arg(long, default_value_t = 10)]
    predict: usize,

    /// Colorize retrospective predictions that matched observed history.
    #[arg(long, default_value_t = false)]
    color_past_predictions: bool,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let raw = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let values: Vec<String> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();

    // Feed values one at a time so each call's retrospective prediction
    // (what the previously selected generator would have said about this
    // new value) is available to color it against, rather than losing that
    // information in a single whole-batch call.
    let mut manager = RandomManager::new(args.history_capacity, NumberType::Raw);
    for value in &values {
        if let Err(err) = manager.detect_generator(std::slice::from_ref(value)) {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
        if args.color_past_predictions {
            let observed = NumberSequence::parse(std::slice::from_ref(value), manager.number_type())
                .unwrap_or_else(|_| NumberSequence::empty(manager.number_type()));
            if !observed.is_empty() && *manager.incoming_prediction() == observed {
                println!("\x1b[32m{value}\x1b[0m");
                continue;
            }
        }
        println!("{value}");
    }

    match manager.current_generator_name() {
        Some(name) => {
            info!(generator = name, "detected");
            println!("detected: {name}");
        }
        None => {
            println!("no catalog generator matches the observed sequence");
            return Ok(());
        }
    }

    match manager.predict(args.predict) {
        Ok(predicted) => {
            for word in predicted.words() {
                println!("{word}");
            }
        }
        Err(err) => {
            eprintln!("error predicting: {err}");
            std::process::exit(1);
        }
    }
    Ok(())
}
