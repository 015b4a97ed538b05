//! Merges the top-level `sources` of several catalog files into one.
//!
//! Later files win when two define the same name. Entries are copied as-is,
//! unknown keys included, so nested references keep pointing wherever they
//! pointed before.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use zonecat::init_tracing;
use zonecat::shallow::{merge_catalog_files, write_merged};

#[derive(Parser, Debug)]
#[command(
    name = "merge-catalogs",
    about = "Merge multiple YAML catalogs into a single catalog",
    version
)]
struct Cli {
    /// Catalog files to merge; last in list wins
    #[arg(required = true)]
    catalogs: Vec<PathBuf>,

    /// Output file for the merged catalog
    #[arg(long, default_value = "merged_catalog.yaml")]
    output: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("merge-catalogs: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let merged = merge_catalog_files(&cli.catalogs)?;
    write_merged(&merged, &cli.output)
        .with_context(|| format!("saving merged catalog to {}", cli.output.display()))?;
    println!("Merged catalog saved to {}", cli.output.display());
    Ok(())
}
