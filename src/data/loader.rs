use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::FitsFile;

use super::model::{FileKind, Grid2D, RawSpectrum, SpectralRecord};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Input discovery
// ---------------------------------------------------------------------------

/// List `*.fits` files directly inside `dir`, sorted by name.
pub fn discover_fits_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading data directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.context("reading directory entry")?.path();
        let is_fits = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("fits"));
        if is_fits && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Identifier used for a file in results and failure reports: its file name.
pub fn source_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Record reading
// ---------------------------------------------------------------------------

/// Read one spectral record, dispatching on the file name.
///
/// Supported layouts:
/// * `*x1d*` – HDU 1 `EXTRACT1D` binary table with `WAVELENGTH` and `FLUX` columns
/// * `*s2d*` – HDU 1 `SCI` image and HDU 3 `WAVELENGTH` image of the same shape
///
/// The file handle lives only inside this call and is closed on every path.
pub fn read_record(path: &Path) -> Result<SpectralRecord, PipelineError> {
    let source_id = source_id(path);
    let raw = match FileKind::classify(&source_id) {
        FileKind::Table => read_table(path)?,
        FileKind::Grid => read_grid(path)?,
        FileKind::Unrecognized => return Err(PipelineError::UnrecognizedKind(source_id)),
    };
    Ok(SpectralRecord { source_id, raw })
}

fn extname(fptr: &mut FitsFile, hdu: &FitsHdu) -> String {
    hdu.read_key::<String>(fptr, "EXTNAME")
        .map(|name| name.trim().to_ascii_uppercase())
        .unwrap_or_default()
}

/// Fetch HDU `index` if its EXTNAME contains `marker`.
fn named_hdu(fptr: &mut FitsFile, index: usize, marker: &str) -> Option<FitsHdu> {
    let hdu = fptr.hdu(index).ok()?;
    extname(fptr, &hdu).contains(marker).then_some(hdu)
}

fn read_table(path: &Path) -> Result<RawSpectrum, PipelineError> {
    let mut fptr = FitsFile::open(path)?;
    let hdu = named_hdu(&mut fptr, 1, "EXTRACT1D")
        .ok_or_else(|| PipelineError::missing("No EXTRACT1D extension found"))?;

    let HduInfo::TableInfo { column_descriptions, .. } = &hdu.info else {
        return Err(PipelineError::missing("Data is not in expected table format"));
    };
    let has_column = |name: &str| {
        column_descriptions
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name))
    };
    if !has_column("WAVELENGTH") || !has_column("FLUX") {
        return Err(PipelineError::missing("Missing WAVELENGTH or FLUX columns"));
    }

    let wavelength: Vec<f64> = hdu.read_col(&mut fptr, "WAVELENGTH")?;
    let flux: Vec<f64> = hdu.read_col(&mut fptr, "FLUX")?;
    Ok(RawSpectrum::Table { wavelength, flux })
}

fn read_grid(path: &Path) -> Result<RawSpectrum, PipelineError> {
    let mut fptr = FitsFile::open(path)?;
    let sci = named_hdu(&mut fptr, 1, "SCI")
        .ok_or_else(|| PipelineError::missing("No SCI extension found"))?;
    let wave = named_hdu(&mut fptr, 3, "WAVELENGTH")
        .ok_or_else(|| PipelineError::missing("No valid SCI or WAVELENGTH data"))?;

    let flux = read_image_grid(&mut fptr, &sci)?;
    let wavelength = read_image_grid(&mut fptr, &wave)?;
    Ok(RawSpectrum::Grid { flux, wavelength })
}

fn read_image_grid(fptr: &mut FitsFile, hdu: &FitsHdu) -> Result<Grid2D, PipelineError> {
    let HduInfo::ImageInfo { shape, .. } = &hdu.info else {
        return Err(PipelineError::missing("No valid SCI or WAVELENGTH data"));
    };
    if shape.is_empty() {
        return Err(PipelineError::missing("No valid SCI or WAVELENGTH data"));
    }
    let values: Vec<f64> = hdu.read_image(fptr)?;
    Grid2D::from_shape(shape, values)
}

// ---------------------------------------------------------------------------
// HDU inventory
// ---------------------------------------------------------------------------

/// One line of a file's HDU listing.
#[derive(Debug, Clone, PartialEq)]
pub struct HduSummary {
    pub index: usize,
    pub name: String,
    pub description: String,
}

/// Walk every HDU of a FITS file and summarise it.
pub fn describe_file(path: &Path) -> Result<Vec<HduSummary>, PipelineError> {
    let mut fptr = FitsFile::open(path)?;
    let mut summaries = Vec::new();

    for index in 0_usize.. {
        let Ok(hdu) = fptr.hdu(index) else {
            break;
        };
        let name = match extname(&mut fptr, &hdu) {
            n if n.is_empty() && index == 0 => "PRIMARY".to_string(),
            n => n,
        };
        let description = match &hdu.info {
            HduInfo::ImageInfo { shape, .. } if shape.is_empty() => "empty image".to_string(),
            HduInfo::ImageInfo { shape, .. } => format!("image {shape:?}"),
            HduInfo::TableInfo {
                column_descriptions,
                num_rows,
            } => format!(
                "table {num_rows} rows × {} cols",
                column_descriptions.len()
            ),
            _ => "unknown".to_string(),
        };
        summaries.push(HduSummary {
            index,
            name,
            description,
        });
    }
    Ok(summaries)
}

// ---------------------------------------------------------------------------
// Test fixtures: write small x1d / s2d files
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::fixtures::{write_s2d, write_x1d};
    use super::*;

    #[test]
    fn discovers_only_fits_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_x1d.fits"), b"").unwrap();
        std::fs::write(dir.path().join("a_s2d.FITS"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub.fits")).unwrap();

        let names: Vec<String> = discover_fits_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| source_id(p))
            .collect();
        assert_eq!(names, vec!["a_s2d.FITS", "b_x1d.fits"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_fits_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn reads_x1d_table_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_x1d(dir.path(), "gs_x1d.fits", &[1.0, 1.5, 2.0], &[3.0, 0.0, 4.0]);

        let record = read_record(&path).unwrap();
        assert_eq!(record.source_id, "gs_x1d.fits");
        assert_eq!(
            record.raw,
            RawSpectrum::Table {
                wavelength: vec![1.0, 1.5, 2.0],
                flux: vec![3.0, 0.0, 4.0],
            }
        );
    }

    #[test]
    fn reads_s2d_images_with_row_major_shape() {
        let dir = tempfile::tempdir().unwrap();
        let flux: Vec<f64> = (0..6).map(|i| i as f64 + 1.0).collect();
        let wavelength: Vec<f64> = (0..6).map(|i| 1.0 + 0.1 * i as f64).collect();
        let path = write_s2d(dir.path(), "gs_s2d.fits", 3, 2, &flux, &wavelength);

        let record = read_record(&path).unwrap();
        let RawSpectrum::Grid { flux: f, wavelength: w } = record.raw else {
            panic!("expected a grid record");
        };
        assert_eq!(f.shape(), (3, 2));
        assert_eq!(w.shape(), (3, 2));
        assert_eq!(f.row(1), Some(&[3.0, 4.0][..]));
    }

    #[test]
    fn wrong_extension_names_are_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        // a table file named like a grid file: HDU 1 is EXTRACT1D, not SCI
        let path = write_x1d(dir.path(), "mislabelled_s2d.fits", &[1.0], &[1.0]);
        assert!(matches!(read_record(&path), Err(PipelineError::MissingData(_))));

        // a grid file named like a table file
        let path = write_s2d(dir.path(), "mislabelled_x1d.fits", 1, 1, &[1.0], &[1.0]);
        assert!(matches!(read_record(&path), Err(PipelineError::MissingData(_))));
    }

    #[test]
    fn unrecognized_names_are_not_opened() {
        // the file does not exist: classification happens before any I/O
        let err = read_record(Path::new("/nonexistent/cal.fits")).unwrap_err();
        assert!(matches!(err, PipelineError::UnrecognizedKind(ref id) if id == "cal.fits"));
    }

    #[test]
    fn unreadable_file_reports_fits_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken_x1d.fits");
        std::fs::write(&path, b"not a fits file").unwrap();
        let err = read_record(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::Unreadable);
    }

    #[test]
    fn inventory_lists_every_hdu() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_s2d(dir.path(), "inv_s2d.fits", 2, 4, &[1.0; 8], &[1.0; 8]);
        let hdus = describe_file(&path).unwrap();
        let names: Vec<&str> = hdus.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["PRIMARY", "SCI", "ERR", "WAVELENGTH"]);
        assert_eq!(hdus[1].description, "image [2, 4]");
    }
}
