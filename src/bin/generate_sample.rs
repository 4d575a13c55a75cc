use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use arrow::array::{ArrayRef, Float32Array, Int32Array};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tabloader::data::io::write_parquet;
use tabloader::make_df;

/// Write a synthetic categorical/continuous/label table to Parquet
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Number of rows
    #[arg(short, long, default_value_t = 1000)]
    rows: usize,

    /// Output file
    #[arg(short, long, default_value = "sample_data.parquet")]
    output: PathBuf,

    /// Draw random values instead of constant columns
    #[arg(long)]
    random: bool,

    /// Seed for --random
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let n = args.rows;

    let columns: Vec<(&str, ArrayRef)> = if args.random {
        let mut rng = StdRng::seed_from_u64(args.seed);
        let mut cat = |cardinality: i32| -> ArrayRef {
            Arc::new(Int32Array::from_iter_values(
                (0..n).map(|_| rng.random_range(0..cardinality)),
            ))
        };
        let cat1 = cat(10);
        let cat2 = cat(100);
        let cat3 = cat(1000);
        let label = cat(2);
        let cont1: ArrayRef = Arc::new(Float32Array::from_iter_values(
            (0..n).map(|_| rng.random::<f32>()),
        ));
        let cont2: ArrayRef = Arc::new(Float32Array::from_iter_values(
            (0..n).map(|_| rng.random_range(-1.0f32..1.0)),
        ));
        vec![
            ("cat1", cat1),
            ("cat2", cat2),
            ("cat3", cat3),
            ("label", label),
            ("cont1", cont1),
            ("cont2", cont2),
        ]
    } else {
        vec![
            ("cat1", Arc::new(Int32Array::from(vec![1; n])) as ArrayRef),
            ("cat2", Arc::new(Int32Array::from(vec![2; n]))),
            ("cat3", Arc::new(Int32Array::from(vec![3; n]))),
            ("label", Arc::new(Int32Array::from(vec![0; n]))),
            ("cont1", Arc::new(Float32Array::from(vec![1.0f32; n]))),
            ("cont2", Arc::new(Float32Array::from(vec![2.0f32; n]))),
        ]
    };

    let frame = make_df(columns)?;
    write_parquet(&args.output, &frame)?;

    println!(
        "Wrote {} rows ({} columns) to {}",
        frame.num_rows(),
        frame.num_columns(),
        args.output.display()
    );
    Ok(())
}
