mod cli;
mod config;
mod cosmology;
mod data;
mod error;
mod export;
mod pipeline;
mod redshift;

#[cfg(feature = "charts")]
mod charts;
#[cfg(feature = "charts")]
mod color;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{debug, info, warn};

use cosmology::PLANCK18;

use cli::Cli;
use data::loader::{describe_file, discover_fits_files, source_id};
use pipeline::run_batch;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let files = discover_fits_files(&config.data_dir)?;
    println!(
        "Found {} FITS files in {}/",
        files.len(),
        config.data_dir.display()
    );

    if cli.inventory {
        print_inventory(&files);
    }

    info!(
        "Reference cosmology {} (H0 = {} km/s/Mpc, Om0 = {})",
        PLANCK18.name, PLANCK18.h0, PLANCK18.om0
    );
    let report = run_batch(&files);
    println!(
        "\nSuccessfully processed {} files out of {} total files.",
        report.results.len(),
        report.total()
    );
    for (kind, count) in report.failure_counts() {
        println!("  {count} file(s) skipped: {kind}");
    }
    for failure in &report.failures {
        debug!("{} ({}): {}", failure.source_id, failure.kind, failure.message);
    }

    let Some(summary) = report.summary() else {
        println!("No valid results to save.");
        return Ok(());
    };

    export::write_csv(&config.csv_path, &report.results)?;
    println!("\nTable saved to {}", config.csv_path.display());
    if let Some(parquet_path) = &config.parquet_path {
        export::write_parquet(parquet_path, &report.results)?;
        println!("Table saved to {}", parquet_path.display());
    }

    println!("\nResults Summary:");
    println!("{}", export::preview_table(&report.results, 10)?);
    println!("\n{summary}");

    if config.charts {
        #[cfg(feature = "charts")]
        {
            let written = charts::render_all(&report, &summary, &config.images_dir)?;
            println!("\nCharts generated in {}/:", config.images_dir.display());
            for path in written {
                println!("  {}", path.display());
            }
        }
        #[cfg(not(feature = "charts"))]
        info!("built without the `charts` feature; skipping chart rendering");
    }

    Ok(())
}

fn print_inventory(files: &[PathBuf]) {
    for path in files {
        match describe_file(path) {
            Ok(hdus) => {
                println!("{}:", source_id(path));
                for hdu in hdus {
                    println!("  {:>3}  {:<12} {}", hdu.index, hdu.name, hdu.description);
                }
            }
            Err(err) => warn!("Cannot list HDUs of {}: {err}", source_id(path)),
        }
    }
}
