use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Series colours for charts
// ---------------------------------------------------------------------------

/// `n` visually distinct colours using evenly spaced hues, starting at blue.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (220.0 + (i as f32 / n as f32) * 360.0) % 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            RGBColor(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Colour for series `index` out of `n`, wrapping if `index >= n`.
pub fn series_color(index: usize, n: usize) -> RGBColor {
    let palette = generate_palette(n.max(1));
    palette[index % palette.len()]
}
