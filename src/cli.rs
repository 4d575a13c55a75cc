//! Command-line interface for inspecting a dataset through the loader.
//!
//! ```bash
//! tabloader data.parquet --target label
//! tabloader data.csv --target label --batch-size 256 --shuffle --seed 7
//! tabloader data.json --config loader.json --tag cat1=categorical
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::data::dataset::Device;
use crate::data::schema::Tag;
use crate::loader::LoaderConfig;

/// Peek the first batch of a tabular dataset
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "tabloader")]
#[command(version)]
#[command(about = "Split a tabular dataset into input and target batches")]
pub struct Cli {
    /// Parquet, CSV or JSON file to load
    pub file: PathBuf,

    /// Column to tag as the training target (repeatable)
    #[arg(short, long = "target", value_name = "COLUMN")]
    pub targets: Vec<String>,

    /// Extra tag for a column, as COLUMN=TAG (repeatable)
    #[arg(long = "tag", value_name = "COLUMN=TAG", value_parser = parse_tag)]
    pub tags: Vec<(String, Tag)>,

    /// JSON loader config; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Rows per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Shuffle rows each epoch
    #[arg(long)]
    pub shuffle: bool,

    /// Shuffle seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Drop a trailing short batch
    #[arg(long)]
    pub drop_last: bool,

    /// Device to place batches on
    #[arg(long, default_value = "cpu")]
    pub device: Device,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_tag(s: &str) -> Result<(String, Tag), String> {
    let (column, tag) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=TAG, got '{s}'"))?;
    if column.is_empty() {
        return Err(format!("missing column name in '{s}'"));
    }
    let tag = tag.parse::<Tag>().map_err(|e| e.to_string())?;
    Ok((column.to_string(), tag))
}

/// Parse arguments (testable entry point).
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Layer command-line flags over a base config.
pub fn apply_overrides(mut config: LoaderConfig, cli: &Cli) -> LoaderConfig {
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if cli.shuffle {
        config.shuffle = true;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.drop_last {
        config.drop_last = true;
    }
    config
}
