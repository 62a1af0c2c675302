use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use county_search::{bls, store::CountyStore, Settings};

/// Standardize the BLS 14-month county unemployment table into CSV and load it
/// into the store the county data API reads from.
///
/// Source: https://www.bls.gov/web/metro/laucntycur14.txt
#[derive(Debug, Parser)]
#[command(name = "clean_bls")]
struct Args {
    /// Local copy of laucntycur14.txt
    #[arg(default_value = "laucntycur14.txt")]
    input: PathBuf,

    /// Only write the CSV
    #[arg(long)]
    no_store: bool,
}

fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;
    let args = Args::parse();
    let cfg = Settings::new()?;

    let infile = File::open(&args.input)
        .with_context(|| format!("could not open {}", args.input.display()))?;
    let rows = bls::parse_table(BufReader::new(infile))?;

    let out_path = bls::output_path(&args.input)?;
    log::info!("Converting {} -> {}", args.input.display(), out_path.display());
    bls::write_csv(&rows, File::create(&out_path)?)?;
    log::info!("Wrote {} rows", rows.len());

    if !args.no_store {
        let store = CountyStore::open(&cfg.database_name, cfg.db_compression_enabled)?;
        let n = store.batch_write(&rows)?;
        log::info!("Loaded {} rows into {}", n, cfg.database_name);
    }
    Ok(())
}
