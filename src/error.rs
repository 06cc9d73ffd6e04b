use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::cosmology::CosmologyError;

// ---------------------------------------------------------------------------
// FailureKind – flat per-record failure taxonomy
// ---------------------------------------------------------------------------

/// Why a single input file produced no [`RedshiftResult`](crate::data::model::RedshiftResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FailureKind {
    MissingData,
    EmptySpectrum,
    InvalidRedshift,
    CosmologyError,
    UnrecognizedKind,
    /// The FITS reader could not open or decode the file at all.
    Unreadable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::MissingData => "missing data",
            FailureKind::EmptySpectrum => "empty spectrum",
            FailureKind::InvalidRedshift => "invalid redshift",
            FailureKind::CosmologyError => "cosmology error",
            FailureKind::UnrecognizedKind => "unrecognized kind",
            FailureKind::Unreadable => "unreadable",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// PipelineError – everything that can go wrong for one record
// ---------------------------------------------------------------------------

/// A per-record failure. None of these abort a batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing data: {0}")]
    MissingData(String),

    #[error("no valid samples left after removing non-finite and zero-flux points")]
    EmptySpectrum,

    #[error("non-physical redshift z = {0:.4}")]
    InvalidRedshift(f64),

    #[error(transparent)]
    Cosmology(#[from] CosmologyError),

    #[error("unknown file type (not x1d or s2d): {0}")]
    UnrecognizedKind(String),

    #[error("FITS read failed: {0}")]
    Fits(#[from] fitsio::errors::Error),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::MissingData(_) => FailureKind::MissingData,
            PipelineError::EmptySpectrum => FailureKind::EmptySpectrum,
            PipelineError::InvalidRedshift(_) => FailureKind::InvalidRedshift,
            PipelineError::Cosmology(_) => FailureKind::CosmologyError,
            PipelineError::UnrecognizedKind(_) => FailureKind::UnrecognizedKind,
            PipelineError::Fits(_) => FailureKind::Unreadable,
        }
    }

    pub(crate) fn missing(what: impl Into<String>) -> Self {
        PipelineError::MissingData(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_one_to_one() {
        assert_eq!(PipelineError::missing("FLUX").kind(), FailureKind::MissingData);
        assert_eq!(PipelineError::EmptySpectrum.kind(), FailureKind::EmptySpectrum);
        assert_eq!(
            PipelineError::InvalidRedshift(-1.5).kind(),
            FailureKind::InvalidRedshift
        );
        assert_eq!(
            PipelineError::from(CosmologyError::OutOfDomain(-2.0)).kind(),
            FailureKind::CosmologyError
        );
        assert_eq!(
            PipelineError::UnrecognizedKind("foo.fits".into()).kind(),
            FailureKind::UnrecognizedKind
        );
    }

    #[test]
    fn messages_name_the_problem() {
        let err = PipelineError::missing("Missing WAVELENGTH or FLUX columns");
        assert_eq!(
            err.to_string(),
            "missing data: Missing WAVELENGTH or FLUX columns"
        );
        assert_eq!(FailureKind::EmptySpectrum.to_string(), "empty spectrum");
    }
}
