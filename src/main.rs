use anyhow::{Context, Result};
use arrow::array::Array;
use log::info;

use tabloader::cli::{self, Cli};
use tabloader::{Dataset, Loader, LoaderConfig, Tag, Target};

fn main() -> Result<()> {
    let cli: Cli = clap::Parser::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let mut dataset = Dataset::from_file(&cli.file, cli.device)
        .with_context(|| format!("loading {}", cli.file.display()))?;

    for column in &cli.targets {
        dataset.schema_mut().tag(column, [Tag::Target])?;
    }
    for (column, tag) in &cli.tags {
        dataset.schema_mut().tag(column, [*tag])?;
    }

    let base = match &cli.config {
        Some(path) => LoaderConfig::from_json_file(path)?,
        None => LoaderConfig::default(),
    };
    let config = cli::apply_overrides(base, cli);

    println!("{} rows, {} column(s):", dataset.num_rows(), dataset.schema().len());
    for column in dataset.schema().iter() {
        let tags: Vec<&str> = column.tags.iter().map(|t| t.as_str()).collect();
        println!("  {:<20} {:<8} [{}]", column.name, column.dtype, tags.join(", "));
    }

    let loader = Loader::new(&dataset, config)?;
    info!("{} batch(es) per epoch", loader.len());

    let batch = loader.peek()?;
    println!("first batch: {} rows", batch.num_rows());
    println!("  inputs: {}", batch.input_names().join(", "));
    println!("{}", batch.preview(5)?);
    match &batch.target {
        Target::None => println!("  target: <none>"),
        Target::Single(values) => println!(
            "  target: {} ({} values)",
            loader.target_names().join(", "),
            values.len()
        ),
        Target::Multi(map) => {
            let names: Vec<&str> = map.keys().map(String::as_str).collect();
            println!("  targets: {}", names.join(", "));
        }
    }
    Ok(())
}
