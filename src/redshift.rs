//! Peak-based redshift estimate and the time-delay model built on top of it.
//!
//! The brightest sample is taken to be Lyman-α. This is a crude heuristic:
//! no line fitting, no continuum subtraction, and any brighter artefact wins.

use crate::cosmology::{FlatLambdaCdm, MPC_M, PLANCK18};
use crate::data::model::{CleanedSpectrum, RedshiftResult};
use crate::error::PipelineError;

/// Rest-frame Lyman-α wavelength (µm).
pub const LYMAN_ALPHA_REST_UM: f64 = 0.1216;

/// Speed of light used by the delay model (m/s). Deliberately rounded.
pub const DELAY_MODEL_C_M_S: f64 = 3e8;

/// Dimensionless delay coefficient k.
pub const DELAY_COEFFICIENT: f64 = 0.05;

/// Index of the maximum flux; ties go to the first occurrence.
pub fn peak_index(flux: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in flux.iter().enumerate() {
        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// Redshift implied by placing Lyman-α at `lambda_observed_um`.
pub fn observed_redshift(lambda_observed_um: f64) -> f64 {
    lambda_observed_um / LYMAN_ALPHA_REST_UM - 1.0
}

/// Delay τ = k·d/c and the redshift shift Δz = τ·c/d it implies.
///
/// Δz cancels to k for every distance. The relation is reproduced as is; at
/// d = 0 the cancelled value k is returned instead of 0/0.
pub fn delay_model(distance_m: f64) -> (f64, f64) {
    let tau_seconds = DELAY_COEFFICIENT * distance_m / DELAY_MODEL_C_M_S;
    let delta_z = if distance_m != 0.0 {
        tau_seconds * DELAY_MODEL_C_M_S / distance_m
    } else {
        DELAY_COEFFICIENT
    };
    (tau_seconds, delta_z)
}

/// Estimate against the reference cosmology ([`PLANCK18`]).
pub fn estimate(
    source_id: &str,
    spectrum: &CleanedSpectrum,
) -> Result<RedshiftResult, PipelineError> {
    estimate_with(&PLANCK18, source_id, spectrum)
}

pub fn estimate_with(
    cosmology: &FlatLambdaCdm,
    source_id: &str,
    spectrum: &CleanedSpectrum,
) -> Result<RedshiftResult, PipelineError> {
    let peak = peak_index(spectrum.flux()).ok_or(PipelineError::EmptySpectrum)?;
    let lambda_observed = spectrum.wavelength()[peak];

    let z_observed = observed_redshift(lambda_observed);
    if !z_observed.is_finite() || z_observed <= -1.0 {
        return Err(PipelineError::InvalidRedshift(z_observed));
    }

    let distance_mpc = cosmology.luminosity_distance_mpc(z_observed)?;
    let distance_m = distance_mpc * MPC_M;

    let (tau_seconds, delta_z) = delay_model(distance_m);
    let z_model = z_observed - delta_z;

    let age_standard_gyr = cosmology.age_gyr(z_observed)?;
    let age_model_gyr = cosmology.age_gyr(z_model)?;

    Ok(RedshiftResult {
        source_id: source_id.to_string(),
        z_observed,
        z_model,
        delta_z,
        distance_mpc,
        distance_m,
        tau_seconds,
        age_standard_gyr,
        age_model_gyr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::clean;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn spectrum(wavelength: &[f64], flux: &[f64]) -> CleanedSpectrum {
        clean(wavelength, flux)
    }

    #[test]
    fn peak_ties_resolve_to_first() {
        assert_eq!(peak_index(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(peak_index(&[-2.0, -1.0, -5.0]), Some(1));
        assert_eq!(peak_index(&[]), None);
    }

    #[test]
    fn reference_spectrum_gives_slight_blueshift() {
        let sp = spectrum(&[0.10, 0.12, 0.15, 0.13], &[1.0, 5.0, 2.0, 0.0]);
        let result = estimate("ref_x1d.fits", &sp).unwrap();
        assert_abs_diff_eq!(result.z_observed, 0.12 / 0.1216 - 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(result.z_observed, -0.01316, epsilon = 1e-5);
        assert!(result.distance_mpc < 0.0);
        assert!(result.age_standard_gyr > PLANCK18.age_gyr(0.0).unwrap());
    }

    // Δz = τc/d cancels to k. Asserted literally: this is the model's
    // documented behaviour, not an accident to be corrected here.
    #[test]
    fn delta_z_is_always_the_delay_coefficient() {
        for lambda in [0.05, 0.1216, 0.5, 1.0, 1.824, 5.0] {
            let sp = spectrum(&[lambda, 0.9 * lambda], &[10.0, 1.0]);
            let result = estimate("x1d", &sp).unwrap();
            assert_relative_eq!(result.delta_z, DELAY_COEFFICIENT, max_relative = 1e-12);
            assert_relative_eq!(
                result.z_model,
                result.z_observed - 0.05,
                max_relative = 1e-12,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn zero_distance_keeps_every_field_finite() {
        // peak exactly at the rest wavelength: z = 0, d = 0
        let sp = spectrum(&[LYMAN_ALPHA_REST_UM], &[1.0]);
        let result = estimate("rest_x1d", &sp).unwrap();
        assert_eq!(result.z_observed, 0.0);
        assert_eq!(result.distance_m, 0.0);
        assert_eq!(result.tau_seconds, 0.0);
        assert_eq!(result.delta_z, DELAY_COEFFICIENT);
    }

    #[test]
    fn high_redshift_galaxy_quantities() {
        // Lyman-α redshifted to z = 14
        let lambda = LYMAN_ALPHA_REST_UM * 15.0;
        let sp = spectrum(&[1.0, lambda, 2.0], &[0.5, 8.0, 0.7]);
        let result = estimate("gs_z14_x1d.fits", &sp).unwrap();
        assert_relative_eq!(result.z_observed, 14.0, max_relative = 1e-12);
        assert_relative_eq!(result.distance_mpc, 154_844.0, max_relative = 1e-3);
        assert_relative_eq!(result.distance_m, result.distance_mpc * MPC_M);
        assert_relative_eq!(
            result.tau_seconds,
            0.05 * result.distance_m / 3e8,
            max_relative = 1e-12
        );
        assert_abs_diff_eq!(result.age_standard_gyr, 0.2957, epsilon = 2e-3);
        // lower z_model → slightly older universe
        assert!(result.age_model_gyr > result.age_standard_gyr);
        for value in [
            result.z_observed,
            result.z_model,
            result.delta_z,
            result.distance_mpc,
            result.distance_m,
            result.tau_seconds,
            result.age_standard_gyr,
            result.age_model_gyr,
        ] {
            assert!(value.is_finite());
        }
    }

    #[test]
    fn non_positive_peak_wavelength_is_invalid_redshift() {
        let sp = spectrum(&[-0.3, 0.1], &[9.0, 1.0]);
        assert!(matches!(
            estimate("neg", &sp),
            Err(PipelineError::InvalidRedshift(z)) if z <= -1.0
        ));

        let sp = spectrum(&[0.0, 0.1], &[9.0, 1.0]);
        assert!(matches!(
            estimate("zero", &sp),
            Err(PipelineError::InvalidRedshift(_))
        ));
    }

    #[test]
    fn model_redshift_below_domain_is_cosmology_error() {
        // z_obs = -0.97 is physical, z_model = -1.02 is not
        let sp = spectrum(&[0.03 * LYMAN_ALPHA_REST_UM], &[1.0]);
        let err = estimate("edge", &sp).unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::CosmologyError);
    }

    #[test]
    fn estimate_is_deterministic() {
        let sp = spectrum(&[0.8, 1.9, 2.4], &[1.0, 6.0, 2.0]);
        let first = estimate("again", &sp).unwrap();
        let second = estimate("again", &sp).unwrap();
        assert_eq!(first.z_model.to_bits(), second.z_model.to_bits());
        assert_eq!(first.age_model_gyr.to_bits(), second.age_model_gyr.to_bits());
        assert_eq!(first, second);
    }
}
