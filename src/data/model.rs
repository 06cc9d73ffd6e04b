use serde::Serialize;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// FileKind – which on-disk layout a file name announces
// ---------------------------------------------------------------------------

/// Layout announced by the JWST pipeline naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `*x1d*` – extracted 1-D spectrum stored as a binary table.
    Table,
    /// `*s2d*` – rectified 2-D spectrum stored as image extensions.
    Grid,
    Unrecognized,
}

impl FileKind {
    /// Classify a file by name (case-insensitive). `x1d` wins over `s2d`.
    pub fn classify(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if lower.contains("x1d") {
            FileKind::Table
        } else if lower.contains("s2d") {
            FileKind::Grid
        } else {
            FileKind::Unrecognized
        }
    }
}

// ---------------------------------------------------------------------------
// Grid2D – row-major 2-D array (rows = spatial, columns = spectral)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Grid2D {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, PipelineError> {
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(PipelineError::missing(format!(
                "grid of shape {rows}x{cols} holds {} values",
                values.len()
            )));
        }
        Ok(Grid2D { rows, cols, values })
    }

    /// Build from an image shape as reported by the FITS reader (slowest axis first).
    pub fn from_shape(shape: &[usize], values: Vec<f64>) -> Result<Self, PipelineError> {
        match shape {
            [rows, cols] => Grid2D::new(*rows, *cols, values),
            other => Err(PipelineError::missing(format!(
                "expected a 2-D image, got {} axes",
                other.len()
            ))),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.cols;
        Some(&self.values[start..start + self.cols])
    }
}

// ---------------------------------------------------------------------------
// Raw input records
// ---------------------------------------------------------------------------

/// A spectrum exactly as read from disk, before any cleaning.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSpectrum {
    /// Two named columns of equal length.
    Table { wavelength: Vec<f64>, flux: Vec<f64> },
    /// Flux and wavelength images of identical shape.
    Grid { flux: Grid2D, wavelength: Grid2D },
}

/// One input file's worth of spectral data.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralRecord {
    pub source_id: String,
    pub raw: RawSpectrum,
}

// ---------------------------------------------------------------------------
// CleanedSpectrum
// ---------------------------------------------------------------------------

/// Equal-length wavelength (µm) / flux samples, all finite, no zero flux,
/// in source order. Only [`crate::data::filter`] constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSpectrum {
    wavelength: Vec<f64>,
    flux: Vec<f64>,
}

impl CleanedSpectrum {
    pub(crate) fn from_parts(wavelength: Vec<f64>, flux: Vec<f64>) -> Self {
        debug_assert_eq!(wavelength.len(), flux.len());
        CleanedSpectrum { wavelength, flux }
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn len(&self) -> usize {
        self.flux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    /// `(wavelength, flux)` pairs, convenient for plotting.
    #[cfg_attr(not(feature = "charts"), allow(dead_code))]
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelength.iter().copied().zip(self.flux.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// RedshiftResult – one row of the output table
// ---------------------------------------------------------------------------

/// Derived quantities for one successfully processed record.
///
/// Serialized field names are the column headers of the exported table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedshiftResult {
    #[serde(rename = "File")]
    pub source_id: String,
    pub z_observed: f64,
    pub z_model: f64,
    pub delta_z: f64,
    #[serde(rename = "Distance_Mpc")]
    pub distance_mpc: f64,
    #[serde(rename = "Distance_m")]
    pub distance_m: f64,
    #[serde(rename = "Tau_s")]
    pub tau_seconds: f64,
    #[serde(rename = "Age_LCDM_Gyr")]
    pub age_standard_gyr: f64,
    #[serde(rename = "Age_Model_Gyr")]
    pub age_model_gyr: f64,
}
