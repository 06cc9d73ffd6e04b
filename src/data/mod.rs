/// Data layer: record types, FITS loading, and sample cleaning.
///
/// Architecture:
/// ```text
///  *_x1d.fits / *_s2d.fits
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  classify by name, read HDUs → SpectralRecord
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  middle row (grids), finite & nonzero mask → CleanedSpectrum
///   └──────────┘
///        │
///        ▼
///   redshift::estimate → RedshiftResult
/// ```

pub mod filter;
pub mod loader;
pub mod model;
