//! Write a small set of synthetic NIRSpec-like files for trying the pipeline:
//! x1d tables, s2d image stacks and one file with an unrecognized name.
//!
//! Usage: `generate_sample [DATA_DIR]` (default `data`).

use std::path::{Path, PathBuf};

use fitsio::images::{ImageDescription, ImageType};
use fitsio::tables::{ColumnDataType, ColumnDescription};
use fitsio::FitsFile;

const LYMAN_ALPHA_UM: f64 = 0.1216;
const N_SAMPLES: usize = 600;
const S2D_ROWS: usize = 5;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Continuum plus a redshifted Lyman-α line, with a few NaN and zero samples.
fn generate_spectrum(wavelength: &[f64], z: f64, noise_level: f64, rng: &mut SimpleRng) -> Vec<f64> {
    let line_center = LYMAN_ALPHA_UM * (1.0 + z);
    wavelength
        .iter()
        .map(|&wl| {
            let u = rng.next_f64();
            if u < 0.01 {
                f64::NAN
            } else if u < 0.02 {
                0.0
            } else {
                let signal = 1.0 + gaussian(wl, line_center, 0.004, 8.0);
                signal + rng.gauss(0.0, noise_level)
            }
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Wavelength grid (µm) covering the line at redshift `z`.
fn wavelength_grid(z: f64) -> Vec<f64> {
    let center = LYMAN_ALPHA_UM * (1.0 + z);
    let (start, stop) = (center * 0.8, center * 1.2);
    let step = (stop - start) / (N_SAMPLES - 1) as f64;
    (0..N_SAMPLES).map(|i| start + i as f64 * step).collect()
}

fn create_fits(path: &Path) -> FitsFile {
    if path.exists() {
        std::fs::remove_file(path).expect("Failed to replace existing file");
    }
    FitsFile::create(path).open().expect("Failed to create FITS file")
}

fn write_x1d(path: &Path, wavelength: &[f64], flux: &[f64]) {
    let mut fptr = create_fits(path);
    let columns = [
        ColumnDescription::new("WAVELENGTH")
            .with_type(ColumnDataType::Double)
            .create()
            .expect("Invalid column description"),
        ColumnDescription::new("FLUX")
            .with_type(ColumnDataType::Double)
            .create()
            .expect("Invalid column description"),
    ];
    let hdu = fptr
        .create_table("EXTRACT1D".to_string(), &columns)
        .expect("Failed to create EXTRACT1D table");
    hdu.write_col(&mut fptr, "WAVELENGTH", wavelength)
        .expect("Failed to write WAVELENGTH");
    hdu.write_col(&mut fptr, "FLUX", flux)
        .expect("Failed to write FLUX");
}

/// SCI / ERR / WAVELENGTH images; only the middle row carries the source.
fn write_s2d(path: &Path, wavelength: &[f64], source_row: &[f64], rng: &mut SimpleRng) {
    let cols = wavelength.len();
    let mut flux = Vec::with_capacity(S2D_ROWS * cols);
    for row in 0..S2D_ROWS {
        if row == S2D_ROWS / 2 {
            flux.extend_from_slice(source_row);
        } else {
            flux.extend((0..cols).map(|_| 0.2 + rng.gauss(0.0, 0.05)));
        }
    }
    let errors = vec![0.05; S2D_ROWS * cols];
    let wavelength_image: Vec<f64> = (0..S2D_ROWS).flat_map(|_| wavelength.iter().copied()).collect();

    let mut fptr = create_fits(path);
    let description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: &[S2D_ROWS, cols],
    };
    for (extname, data) in [
        ("SCI", &flux),
        ("ERR", &errors),
        ("WAVELENGTH", &wavelength_image),
    ] {
        let hdu = fptr
            .create_image(extname.to_string(), &description)
            .expect("Failed to create image extension");
        hdu.write_image(&mut fptr, data)
            .expect("Failed to write image data");
    }
}

fn main() {
    let data_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "data".to_string()));
    std::fs::create_dir_all(&data_dir).expect("Failed to create data directory");

    let mut rng = SimpleRng::new(42);

    let sources: [(&str, f64); 6] = [
        ("jw01180_gs-1001_nirspec_clear-prism", 5.2),
        ("jw01180_gs-1002_nirspec_clear-prism", 6.8),
        ("jw01210_gs-2001_nirspec_clear-prism", 8.4),
        ("jw01210_gs-2002_nirspec_clear-prism", 9.7),
        ("jw01287_gn-3001_nirspec_clear-prism", 11.3),
        ("jw01287_gn-3002_nirspec_clear-prism", 13.1),
    ];

    let mut written = 0;
    for (i, &(stem, z)) in sources.iter().enumerate() {
        let wavelength = wavelength_grid(z);
        let flux = generate_spectrum(&wavelength, z, 0.05, &mut rng);
        let path = if i % 2 == 0 {
            let path = data_dir.join(format!("{stem}_x1d.fits"));
            write_x1d(&path, &wavelength, &flux);
            path
        } else {
            let path = data_dir.join(format!("{stem}_s2d.fits"));
            write_s2d(&path, &wavelength, &flux, &mut rng);
            path
        };
        println!("Wrote {} (z = {z})", path.display());
        written += 1;
    }

    // Calibrated product: neither x1d nor s2d, skipped by the pipeline.
    let cal_path = data_dir.join("jw01180_gs-1001_nirspec_cal.fits");
    let wavelength = wavelength_grid(7.0);
    let flux = generate_spectrum(&wavelength, 7.0, 0.05, &mut rng);
    write_x1d(&cal_path, &wavelength, &flux);
    println!("Wrote {} (unrecognized name)", cal_path.display());
    written += 1;

    println!("Generated {written} files in {}/", data_dir.display());
}
