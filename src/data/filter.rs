use super::model::{CleanedSpectrum, RawSpectrum};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Sample selection: raw record → one 1-D wavelength/flux pair
// ---------------------------------------------------------------------------

/// Row used to cut a 1-D spectrum out of a 2-D grid. No averaging.
pub fn middle_row(rows: usize) -> usize {
    rows / 2
}

fn select_samples(raw: &RawSpectrum) -> Result<(&[f64], &[f64]), PipelineError> {
    match raw {
        RawSpectrum::Table { wavelength, flux } => {
            if wavelength.len() != flux.len() {
                return Err(PipelineError::missing(format!(
                    "WAVELENGTH has {} values but FLUX has {}",
                    wavelength.len(),
                    flux.len()
                )));
            }
            Ok((wavelength, flux))
        }
        RawSpectrum::Grid { flux, wavelength } => {
            if flux.shape() != wavelength.shape() {
                return Err(PipelineError::missing(format!(
                    "SCI shape {:?} does not match WAVELENGTH shape {:?}",
                    flux.shape(),
                    wavelength.shape()
                )));
            }
            let row = middle_row(flux.rows());
            match (wavelength.row(row), flux.row(row)) {
                (Some(w), Some(f)) => Ok((w, f)),
                _ => Err(PipelineError::missing("No valid SCI or WAVELENGTH data")),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Keep-mask: both values finite and flux nonzero.
pub fn valid_mask(wavelength: &[f64], flux: &[f64]) -> Vec<bool> {
    wavelength
        .iter()
        .zip(flux)
        .map(|(w, f)| w.is_finite() && f.is_finite() && *f != 0.0)
        .collect()
}

/// Apply [`valid_mask`] to both sequences, preserving order.
pub fn clean(wavelength: &[f64], flux: &[f64]) -> CleanedSpectrum {
    let mask = valid_mask(wavelength, flux);
    let (kept_wavelength, kept_flux): (Vec<f64>, Vec<f64>) = wavelength
        .iter()
        .zip(flux)
        .zip(&mask)
        .filter(|(_, keep)| **keep)
        .map(|((w, f), _)| (*w, *f))
        .unzip();
    CleanedSpectrum::from_parts(kept_wavelength, kept_flux)
}

/// Normalize either raw layout into a [`CleanedSpectrum`].
///
/// Errors with `MissingData` when the record does not have a usable shape and
/// with `EmptySpectrum` when nothing survives cleaning.
pub fn extract(raw: &RawSpectrum) -> Result<CleanedSpectrum, PipelineError> {
    let (wavelength, flux) = select_samples(raw)?;
    let cleaned = clean(wavelength, flux);
    if cleaned.is_empty() {
        return Err(PipelineError::EmptySpectrum);
    }
    Ok(cleaned)
}
