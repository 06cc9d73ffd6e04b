use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

use crate::data::model::RedshiftResult;

/// Column order shared by every export format.
pub const COLUMNS: [&str; 9] = [
    "File",
    "z_observed",
    "z_model",
    "delta_z",
    "Distance_Mpc",
    "Distance_m",
    "Tau_s",
    "Age_LCDM_Gyr",
    "Age_Model_Gyr",
];

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Write one row per result, header first.
pub fn write_csv(path: &Path, results: &[RedshiftResult]) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating CSV file {}", path.display()))?;
    for result in results {
        writer
            .serialize(result)
            .with_context(|| format!("writing CSV row for {}", result.source_id))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Arrow / Parquet
// ---------------------------------------------------------------------------

/// Results as a single Arrow record batch.
pub fn results_batch(results: &[RedshiftResult]) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(COLUMNS[0], DataType::Utf8, false)];
    fields.extend(
        COLUMNS[1..]
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let float_column = |f: fn(&RedshiftResult) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(results.iter().map(f).collect::<Vec<f64>>()))
    };
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            results.iter().map(|r| r.source_id.as_str()).collect::<Vec<_>>(),
        )),
        float_column(|r| r.z_observed),
        float_column(|r| r.z_model),
        float_column(|r| r.delta_z),
        float_column(|r| r.distance_mpc),
        float_column(|r| r.distance_m),
        float_column(|r| r.tau_seconds),
        float_column(|r| r.age_standard_gyr),
        float_column(|r| r.age_model_gyr),
    ];

    RecordBatch::try_new(schema, columns).context("building results record batch")
}

pub fn write_parquet(path: &Path, results: &[RedshiftResult]) -> Result<()> {
    ensure_parent_dir(path)?;
    let batch = results_batch(results)?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating parquet file {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Console preview of the first `limit` rows.
pub fn preview_table(results: &[RedshiftResult], limit: usize) -> Result<String> {
    let shown = &results[..results.len().min(limit)];
    let batch = results_batch(shown)?;
    let table = pretty_format_batches(&[batch]).context("formatting results table")?;
    Ok(table.to_string())
}
