use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::data::filter::extract;
use crate::data::loader::{read_record, source_id};
use crate::data::model::{CleanedSpectrum, RedshiftResult, SpectralRecord};
use crate::error::{FailureKind, PipelineError};
use crate::redshift::estimate;

// ---------------------------------------------------------------------------
// Per-record pipeline: extract → estimate
// ---------------------------------------------------------------------------

/// A successfully processed record: the cleaned samples plus derived values.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    pub spectrum: CleanedSpectrum,
    pub result: RedshiftResult,
}

/// Run the pure core on an in-memory record.
pub fn process_record(record: &SpectralRecord) -> Result<ProcessedRecord, PipelineError> {
    let spectrum = extract(&record.raw)?;
    let result = estimate(&record.source_id, &spectrum)?;
    Ok(ProcessedRecord { spectrum, result })
}

/// Classify, read and process one file on disk.
pub fn process_file(path: &Path) -> Result<ProcessedRecord, PipelineError> {
    let record = read_record(path)?;
    process_record(&record)
}

// ---------------------------------------------------------------------------
// Batch report
// ---------------------------------------------------------------------------

/// A file that produced no result.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub source_id: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Everything a batch run produced. Successes and failures are independent.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<RedshiftResult>,
    /// Cleaned spectra, parallel to `results`.
    pub spectra: Vec<CleanedSpectrum>,
    pub failures: Vec<RecordFailure>,
}

impl BatchReport {
    /// Fold one record's outcome into the report.
    pub fn record(&mut self, source_id: &str, outcome: Result<ProcessedRecord, PipelineError>) {
        match outcome {
            Ok(ProcessedRecord { spectrum, result }) => {
                info!(
                    "Processed {source_id} ({} samples): z_obs={:.2}, z_model={:.2}, delta_z={:.2}",
                    spectrum.len(),
                    result.z_observed,
                    result.z_model,
                    result.delta_z
                );
                self.results.push(result);
                self.spectra.push(spectrum);
            }
            Err(err) => {
                let kind = err.kind();
                if kind == FailureKind::UnrecognizedKind {
                    info!("Skipping {source_id}: {err}");
                } else {
                    warn!("File {source_id}: {err}");
                }
                self.failures.push(RecordFailure {
                    source_id: source_id.to_string(),
                    kind,
                    message: err.to_string(),
                });
            }
        }
    }

    /// Total number of files seen.
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    /// Failure counts per kind, sorted by kind.
    pub fn failure_counts(&self) -> Vec<(FailureKind, usize)> {
        let mut counts: Vec<(FailureKind, usize)> = Vec::new();
        for failure in &self.failures {
            match counts.iter_mut().find(|(kind, _)| *kind == failure.kind) {
                Some((_, n)) => *n += 1,
                None => counts.push((failure.kind, 1)),
            }
        }
        counts.sort();
        counts
    }

    /// Summary statistics, or `None` when nothing succeeded.
    pub fn summary(&self) -> Option<BatchSummary> {
        BatchSummary::from_results(&self.results, self.total())
    }
}

/// Process every file in order; one file's failure never stops the batch.
pub fn run_batch(paths: &[PathBuf]) -> BatchReport {
    let mut report = BatchReport::default();
    for path in paths {
        let id = source_id(path);
        report.record(&id, process_file(path));
    }
    report
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub processed: usize,
    pub total: usize,
    pub z_observed_min: f64,
    pub z_observed_max: f64,
    pub z_observed_mean: f64,
    pub z_model_mean: f64,
    pub delta_z_mean: f64,
    pub age_standard_mean: f64,
    pub age_standard_std: f64,
    pub age_model_mean: f64,
    pub age_model_std: f64,
}

impl BatchSummary {
    pub fn from_results(results: &[RedshiftResult], total: usize) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        let column = |f: fn(&RedshiftResult) -> f64| results.iter().map(f).collect::<Vec<f64>>();
        let z_observed = column(|r| r.z_observed);
        let age_standard = column(|r| r.age_standard_gyr);
        let age_model = column(|r| r.age_model_gyr);

        Some(BatchSummary {
            processed: results.len(),
            total,
            z_observed_min: z_observed.iter().copied().fold(f64::INFINITY, f64::min),
            z_observed_max: z_observed.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            z_observed_mean: mean(&z_observed),
            z_model_mean: mean(&column(|r| r.z_model)),
            delta_z_mean: mean(&column(|r| r.delta_z)),
            age_standard_mean: mean(&age_standard),
            age_standard_std: population_std(&age_standard),
            age_model_mean: mean(&age_model),
            age_model_std: population_std(&age_model),
        })
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis Summary:")?;
        writeln!(f, "  Total galaxies analyzed: {} of {} files", self.processed, self.total)?;
        writeln!(
            f,
            "  Redshift range: {:.2} - {:.2}",
            self.z_observed_min, self.z_observed_max
        )?;
        writeln!(f, "  Average observed redshift: {:.2}", self.z_observed_mean)?;
        writeln!(f, "  Average model redshift: {:.2}", self.z_model_mean)?;
        writeln!(f, "  Average delta_z: {:.3}", self.delta_z_mean)?;
        writeln!(
            f,
            "  Average LCDM age: {:.3} ± {:.3} Gyr",
            self.age_standard_mean, self.age_standard_std
        )?;
        write!(
            f,
            "  Average model age: {:.3} ± {:.3} Gyr",
            self.age_model_mean, self.age_model_std
        )
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with divisor n.
fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Least-squares line `y = slope·x + intercept`.
///
/// `None` with fewer than two points or when every x is the same.
pub fn trend_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let x_mean = mean(xs);
    let y_mean = mean(ys);
    let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - x_mean) * (y - y_mean)).sum();
    let slope = sxy / sxx;
    Some((slope, y_mean - slope * x_mean))
}
