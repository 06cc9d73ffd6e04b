use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use plotters::prelude::*;

use crate::color::{generate_palette, series_color};
use crate::data::model::{CleanedSpectrum, RedshiftResult};
use crate::pipeline::{trend_line, BatchReport, BatchSummary};

const CHART_SIZE: (u32, u32) = (1000, 800);
const WIDE_CHART_SIZE: (u32, u32) = (1200, 800);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 26);

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Render every chart into `images_dir`; returns the files written.
pub fn render_all(
    report: &BatchReport,
    summary: &BatchSummary,
    images_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(images_dir)
        .with_context(|| format!("creating images directory {}", images_dir.display()))?;

    let mut written = Vec::new();
    let mut target = |name: &str| {
        let path = images_dir.join(name);
        written.push(path.clone());
        path
    };

    age_vs_redshift(&report.results, &target("age_vs_z.png")).context("age vs z chart")?;
    average_age_bars(summary, &target("avg_age_bar.png")).context("average age chart")?;
    delta_z_vs_distance(&report.results, &target("delta_z_vs_distance.png"))
        .context("delta_z vs distance chart")?;
    if let (Some(spectrum), Some(result)) = (report.spectra.first(), report.results.first()) {
        sample_spectrum(spectrum, result, &target("sample_spectrum.png"))
            .context("sample spectrum chart")?;
    }
    all_spectra(&report.spectra, &report.results, &target("jades_spectra_plot.png"))
        .context("spectra overlay chart")?;

    for path in &written {
        info!("Chart written to {}", path.display());
    }
    Ok(written)
}

/// Min/max of the finite values, widened by 5 % (or ±5 % of |value| when flat).
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    let pad = if span > 0.0 {
        0.05 * span
    } else {
        0.05 * lo.abs().max(1.0)
    };
    (lo - pad, hi + pad)
}

// ---------------------------------------------------------------------------
// Result charts
// ---------------------------------------------------------------------------

fn age_vs_redshift(results: &[RedshiftResult], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (x0, x1) = padded_range(results.iter().map(|r| r.z_observed));
    let (y0, y1) = padded_range(
        results
            .iter()
            .flat_map(|r| [r.age_standard_gyr, r.age_model_gyr]),
    );
    let mut chart = ChartBuilder::on(&root)
        .caption("Age vs Redshift", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc("Observed Redshift (z)")
        .y_desc("Age (Gyr)")
        .draw()?;

    let colors = generate_palette(2);
    let (standard, model) = (colors[0], colors[1]);
    chart
        .draw_series(results.iter().map(|r| {
            Circle::new((r.z_observed, r.age_standard_gyr), 5, standard.filled())
        }))?
        .label("LCDM age")
        .legend(move |(x, y)| Circle::new((x, y), 5, standard.filled()));
    chart
        .draw_series(
            results
                .iter()
                .map(|r| Circle::new((r.z_observed, r.age_model_gyr), 5, model.filled())),
        )?
        .label("Time delay model age")
        .legend(move |(x, y)| Circle::new((x, y), 5, model.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn average_age_bars(summary: &BatchSummary, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let bars = [
        ("LCDM model", summary.age_standard_mean, summary.age_standard_std),
        ("Time delay model", summary.age_model_mean, summary.age_model_std),
    ];
    let top = bars
        .iter()
        .map(|(_, mean, std)| mean + std)
        .fold(0.0_f64, f64::max);
    let top = if top > 0.0 { top * 1.2 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Age Comparison", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5_f64..1.5_f64, 0.0..top)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .y_desc("Average Age (Gyr)")
        .draw()?;

    let colors = generate_palette(bars.len());
    for (i, ((label, mean, std), color)) in bars.iter().zip(colors).enumerate() {
        let x = i as f64;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - 0.3, 0.0), (x + 0.3, *mean)],
                color.mix(0.7).filled(),
            )))?
            .label(*label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));

        let (lo, hi) = (mean - std, mean + std);
        chart.draw_series([
            PathElement::new(vec![(x, lo), (x, hi)], BLACK.stroke_width(2)),
            PathElement::new(vec![(x - 0.05, lo), (x + 0.05, lo)], BLACK.stroke_width(2)),
            PathElement::new(vec![(x - 0.05, hi), (x + 0.05, hi)], BLACK.stroke_width(2)),
        ])?;
        chart.draw_series(std::iter::once(Text::new(
            format!("{mean:.3}"),
            (x + 0.08, hi),
            ("sans-serif", 18).into_font(),
        )))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn delta_z_vs_distance(results: &[RedshiftResult], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let distances: Vec<f64> = results.iter().map(|r| r.distance_mpc).collect();
    let delta_zs: Vec<f64> = results.iter().map(|r| r.delta_z).collect();
    let (x0, x1) = padded_range(distances.iter().copied());
    let (y0, y1) = padded_range(delta_zs.iter().copied());

    let mut chart = ChartBuilder::on(&root)
        .caption("Redshift Shift vs Distance", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc("Distance (Mpc)")
        .y_desc("delta_z (Redshift Shift)")
        .draw()?;

    let point_color = series_color(1, 3);
    chart.draw_series(
        distances
            .iter()
            .zip(&delta_zs)
            .map(|(&d, &dz)| Circle::new((d, dz), 5, point_color.filled())),
    )?;

    if let Some((slope, intercept)) = trend_line(&distances, &delta_zs) {
        let (lo, hi) = padded_range(distances.iter().copied());
        chart
            .draw_series(LineSeries::new(
                [lo, hi].map(|d| (d, slope * d + intercept)),
                RED.stroke_width(2),
            ))?
            .label(format!("Trend line (slope: {slope:.2e})"))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    root.present()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Spectrum charts
// ---------------------------------------------------------------------------

fn sample_spectrum(spectrum: &CleanedSpectrum, result: &RedshiftResult, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, WIDE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (x0, x1) = padded_range(spectrum.wavelength().iter().copied());
    let (y0, y1) = padded_range(spectrum.flux().iter().copied());
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Sample Spectrum (z ≈ {:.2})", result.z_observed),
            CAPTION_FONT,
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc("Wavelength (µm)")
        .y_desc("Flux")
        .draw()?;

    let color = series_color(0, 1);
    chart
        .draw_series(LineSeries::new(spectrum.points(), color.stroke_width(2)))?
        .label(format!("Spectrum: {}", result.source_id))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn all_spectra(spectra: &[CleanedSpectrum], results: &[RedshiftResult], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, WIDE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (x0, x1) = padded_range(spectra.iter().flat_map(|s| s.wavelength().iter().copied()));
    let (y0, y1) = padded_range(spectra.iter().flat_map(|s| s.flux().iter().copied()));
    let mut chart = ChartBuilder::on(&root)
        .caption("Spectra", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc("Wavelength (microns)")
        .y_desc("Flux")
        .draw()?;

    let colors = generate_palette(spectra.len());
    for ((spectrum, result), color) in spectra.iter().zip(results).zip(colors) {
        chart
            .draw_series(LineSeries::new(spectrum.points(), color.mix(0.7).stroke_width(1)))?
            .label(format!("{} (z={:.2})", result.source_id, result.z_observed))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_range_widens_span() {
        let (lo, hi) = padded_range([1.0, 3.0, f64::NAN]);
        assert!((lo - 0.9).abs() < 1e-12);
        assert!((hi - 3.1).abs() < 1e-12);
    }

    #[test]
    fn padded_range_handles_flat_and_empty_input() {
        // every delta_z is identical
        let (lo, hi) = padded_range([0.05, 0.05]);
        assert!(lo < 0.05 && hi > 0.05);
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
    }
}
