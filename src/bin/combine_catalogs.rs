//! Builds one catalog per availability zone from a multi-provider catalog.
//!
//! Reads the zone definition and the root catalog next to it (or `--catalog`),
//! merges every provider's variant of each logical source, and writes the zone
//! catalogs, the flat `mlds.json` index, and a top-level catalog of catalogs
//! into OUTDIR. Nothing is written when any input conflicts.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use zonecat::config::{CombineConfig, LEAF_DRIVERS_ENV, env_non_empty};
use zonecat::{combine, init_tracing};

#[derive(Parser, Debug)]
#[command(
    name = "combine-catalogs",
    about = "Project a multi-provider catalog into one catalog per zone",
    version
)]
struct Cli {
    /// Availability zone definition file (zone -> ordered provider list)
    zones_file: PathBuf,

    /// Output folder
    outdir: PathBuf,

    /// Root catalog whose top-level entries are the providers
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Additional driver accepted for data-source leaves (repeatable)
    #[arg(long = "leaf-driver", value_name = "NAME")]
    leaf_drivers: Vec<String>,

    /// File name of the flat index inside OUTDIR
    #[arg(long, value_name = "NAME")]
    index_name: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("combine-catalogs: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let env_drivers = env_non_empty(LEAF_DRIVERS_ENV);
    let config = CombineConfig::resolve(
        cli.zones_file,
        cli.outdir,
        cli.catalog,
        &cli.leaf_drivers,
        env_drivers.as_deref(),
        cli.index_name,
    )?;

    let zoned = combine(&config)?;
    println!(
        "wrote {} zone catalog(s) and {} source(s) to {}",
        zoned.zones.len(),
        zoned.index.len(),
        config.outdir.display()
    );
    Ok(())
}
