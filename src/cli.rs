use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::AnalysisConfig;

#[derive(Parser, Debug)]
#[command(
    name = "jades-redshift",
    version,
    about = "Estimate Lyman-α redshifts, distances and cosmic ages from JWST x1d/s2d spectra",
    after_help = "Files whose name contains x1d are read as EXTRACT1D tables, s2d as SCI/WAVELENGTH images; anything else is skipped."
)]
pub struct Cli {
    /// Directory containing the FITS files (overrides the config file)
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output CSV table
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Also write the results table as Parquet
    #[arg(long)]
    pub parquet: Option<PathBuf>,

    /// Directory for PNG charts
    #[arg(long)]
    pub images_dir: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Print the HDU layout of every FITS file before processing
    #[arg(long)]
    pub inventory: bool,
}

impl Cli {
    /// Defaults, then the config file, then command-line flags.
    pub fn resolve_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(csv) = &self.csv {
            config.csv_path = csv.clone();
        }
        if let Some(parquet) = &self.parquet {
            config.parquet_path = Some(parquet.clone());
        }
        if let Some(images) = &self.images_dir {
            config.images_dir = images.clone();
        }
        if self.no_charts {
            config.charts = false;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("run.json");
        std::fs::write(
            &config_path,
            r#"{ "data_dir": "from_file", "csv_path": "file.csv", "images_dir": "plots" }"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "jades-redshift",
            "from_cli",
            "--config",
            config_path.to_str().unwrap(),
            "--parquet",
            "out.parquet",
            "--no-charts",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("from_cli"));
        assert_eq!(config.csv_path, PathBuf::from("file.csv"));
        assert_eq!(config.images_dir, PathBuf::from("plots"));
        assert_eq!(config.parquet_path, Some(PathBuf::from("out.parquet")));
        assert!(!config.charts);
    }

    #[test]
    fn no_arguments_gives_defaults() {
        let cli = Cli::try_parse_from(["jades-redshift"]).unwrap();
        assert!(!cli.inventory);
        assert_eq!(cli.resolve_config().unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
