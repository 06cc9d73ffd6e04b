//! Flat ΛCDM background cosmology.
//!
//! Distances and ages are evaluated for the fixed [`PLANCK18`] parameter set
//! (Planck 2018 TT,TE,EE+lowE+lensing+BAO). Radiation is included: photons
//! from the CMB temperature and three neutrino species, one of them massive,
//! using the Komatsu et al. (2011) interpolation between the relativistic and
//! non-relativistic limits.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

/// Speed of light, exact (km/s).
const C_KM_S: f64 = 299_792.458;
/// Speed of light, exact (m/s).
const C_M_S: f64 = 299_792_458.0;
/// Metres in one megaparsec.
pub const MPC_M: f64 = 3.085_677_581_491_367_3e22;
/// Kilometres in one megaparsec.
const MPC_KM: f64 = 3.085_677_581_491_367_3e19;
/// Seconds in one gigayear (Julian years).
const GYR_S: f64 = 3.155_76e16;
/// Stefan–Boltzmann constant (W m⁻² K⁻⁴).
const SIGMA_SB: f64 = 5.670_374_419e-8;
/// Newtonian gravitational constant (m³ kg⁻¹ s⁻²).
const G_NEWTON: f64 = 6.674_30e-11;
/// Boltzmann constant (eV/K).
const K_B_EV: f64 = 8.617_333_262e-5;

/// Neutrino-to-photon temperature ratio, (4/11)^(1/3).
const T_NU_RATIO: f64 = 0.713_765_855_503_608_2;
/// 7/8 (4/11)^(4/3): energy density per relativistic neutrino over photons.
const NU_PREFACTOR: f64 = 0.227_107_317_66;
const NU_FIT_P: f64 = 1.83;
const NU_FIT_K: f64 = 0.3173;

const INTEGRATION_TOLERANCE: f64 = 1e-10;
const MAX_BISECTIONS: u32 = 48;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CosmologyError {
    #[error("redshift z = {0} is outside the model domain (z > -1)")]
    OutOfDomain(f64),

    #[error("{quantity} is not finite at z = {z}")]
    NonFinite { quantity: &'static str, z: f64 },
}

// ---------------------------------------------------------------------------
// FlatLambdaCdm
// ---------------------------------------------------------------------------

/// A spatially flat ΛCDM model. Dark energy fills whatever density the
/// other components leave, so Ω_total = 1 exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatLambdaCdm {
    pub name: &'static str,
    /// Hubble constant (km/s/Mpc).
    pub h0: f64,
    /// Cold matter density today, excluding massive neutrinos.
    pub om0: f64,
    /// CMB temperature today (K).
    pub tcmb0: f64,
    /// Effective number of neutrino species.
    pub neff: f64,
    /// Neutrino masses (eV).
    pub m_nu_ev: [f64; 3],
}

/// Planck 2018 reference cosmology.
pub const PLANCK18: FlatLambdaCdm = FlatLambdaCdm {
    name: "Planck18",
    h0: 67.66,
    om0: 0.30966,
    tcmb0: 2.7255,
    neff: 3.046,
    m_nu_ev: [0.0, 0.0, 0.06],
};

impl FlatLambdaCdm {
    /// Hubble distance c/H0 (Mpc).
    pub fn hubble_distance_mpc(&self) -> f64 {
        C_KM_S / self.h0
    }

    /// Hubble time 1/H0 (Gyr).
    pub fn hubble_time_gyr(&self) -> f64 {
        MPC_KM / self.h0 / GYR_S
    }

    /// Photon density parameter today.
    pub fn ogamma0(&self) -> f64 {
        let h0_si = self.h0 * 1.0e3 / MPC_M;
        let critical_density = 3.0 * h0_si * h0_si / (8.0 * std::f64::consts::PI * G_NEWTON);
        4.0 * SIGMA_SB * self.tcmb0.powi(4) / C_M_S.powi(3) / critical_density
    }

    /// Neutrino density parameter today.
    pub fn onu0(&self) -> f64 {
        self.ogamma0() * self.nu_relative_density(1.0)
    }

    /// Dark-energy density parameter today (closes the flat budget).
    pub fn ode0(&self) -> f64 {
        1.0 - self.om0 - self.ogamma0() - self.onu0()
    }

    /// Neutrino over photon energy density at scale factor `a`.
    fn nu_relative_density(&self, a: f64) -> f64 {
        let kt_nu0 = K_B_EV * T_NU_RATIO * self.tcmb0;
        let per_species: f64 = self
            .m_nu_ev
            .iter()
            .map(|&mass| {
                if mass > 0.0 {
                    let y = mass / kt_nu0 * a;
                    (1.0 + (NU_FIT_K * y).powf(NU_FIT_P)).powf(1.0 / NU_FIT_P)
                } else {
                    1.0
                }
            })
            .sum();
        NU_PREFACTOR * (self.neff / self.m_nu_ev.len() as f64) * per_species
    }

    /// E(a)² · a⁴, finite at a = 0.
    fn e2_a4(&self, a: f64, densities: &Densities) -> f64 {
        let radiation = densities.ogamma0 * (1.0 + self.nu_relative_density(a));
        self.om0 * a + radiation + densities.ode0 * a.powi(4)
    }

    /// Line-of-sight comoving distance (Mpc).
    pub fn comoving_distance_mpc(&self, z: f64) -> Result<f64, CosmologyError> {
        check_domain(z)?;
        let densities = Densities::of(self);
        let inv_efunc = |zz: f64| {
            let a = 1.0 / (1.0 + zz);
            a * a / self.e2_a4(a, &densities).sqrt()
        };
        let distance = self.hubble_distance_mpc() * integrate(inv_efunc, 0.0, z);
        finite("comoving distance", z, distance)
    }

    /// Luminosity distance (Mpc). Negative for blueshifts.
    pub fn luminosity_distance_mpc(&self, z: f64) -> Result<f64, CosmologyError> {
        let comoving = self.comoving_distance_mpc(z)?;
        finite("luminosity distance", z, (1.0 + z) * comoving)
    }

    /// Age of the universe at redshift `z` (Gyr).
    pub fn age_gyr(&self, z: f64) -> Result<f64, CosmologyError> {
        check_domain(z)?;
        let densities = Densities::of(self);
        // ∫ da / (a E(a)) = ∫ a da / sqrt(a⁴ E²)
        let integrand = |a: f64| a / self.e2_a4(a, &densities).sqrt();
        let a_z = 1.0 / (1.0 + z);
        let age = self.hubble_time_gyr() * integrate(integrand, 0.0, a_z);
        finite("age", z, age)
    }
}

/// Density parameters that stay fixed during one integration.
struct Densities {
    ogamma0: f64,
    ode0: f64,
}

impl Densities {
    fn of(model: &FlatLambdaCdm) -> Self {
        Densities {
            ogamma0: model.ogamma0(),
            ode0: model.ode0(),
        }
    }
}

fn check_domain(z: f64) -> Result<(), CosmologyError> {
    if !z.is_finite() || z <= -1.0 {
        return Err(CosmologyError::OutOfDomain(z));
    }
    Ok(())
}

fn finite(quantity: &'static str, z: f64, value: f64) -> Result<f64, CosmologyError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CosmologyError::NonFinite { quantity, z })
    }
}

// ---------------------------------------------------------------------------
// Adaptive Simpson quadrature
// ---------------------------------------------------------------------------

/// ∫ₐᵇ f. Signed, so `b < a` is allowed.
fn integrate<F: Fn(f64) -> f64>(f: F, a: f64, b: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = (b - a) / 6.0 * (fa + 4.0 * fm + fb);
    let tolerance = INTEGRATION_TOLERANCE * whole.abs().max(f64::MIN_POSITIVE);
    simpson_step(&f, a, b, fa, fm, fb, whole, tolerance, MAX_BISECTIONS)
}

#[allow(clippy::too_many_arguments)]
fn simpson_step<F: Fn(f64) -> f64>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tolerance: f64,
    depth: u32,
) -> f64 {
    let m = 0.5 * (a + b);
    let left_mid = 0.5 * (a + m);
    let right_mid = 0.5 * (m + b);
    let f_left_mid = f(left_mid);
    let f_right_mid = f(right_mid);
    let left = (m - a) / 6.0 * (fa + 4.0 * f_left_mid + fm);
    let right = (b - m) / 6.0 * (fm + 4.0 * f_right_mid + fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * tolerance {
        return left + right + delta / 15.0;
    }
    simpson_step(f, a, m, fa, f_left_mid, fm, left, tolerance / 2.0, depth - 1)
        + simpson_step(f, m, b, fm, f_right_mid, fb, right, tolerance / 2.0, depth - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn density_budget_matches_published_planck18() {
        assert_relative_eq!(PLANCK18.ogamma0(), 5.4020e-5, max_relative = 1e-3);
        assert_relative_eq!(PLANCK18.onu0(), 1.4404e-3, max_relative = 2e-3);
        assert_abs_diff_eq!(PLANCK18.ode0(), 0.68885, epsilon = 1e-4);
        // E(z = 0) = 1 closes the flat budget
        let densities = Densities::of(&PLANCK18);
        assert_abs_diff_eq!(PLANCK18.e2_a4(1.0, &densities), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn age_today_is_about_13_8_gyr() {
        assert_abs_diff_eq!(PLANCK18.age_gyr(0.0).unwrap(), 13.787, epsilon = 0.01);
    }

    #[test]
    fn age_decreases_with_redshift() {
        let ages: Vec<f64> = [-0.5, 0.0, 1.0, 5.0, 14.0]
            .iter()
            .map(|&z| PLANCK18.age_gyr(z).unwrap())
            .collect();
        assert!(ages.windows(2).all(|pair| pair[0] > pair[1]));
        // z ≈ 14 galaxies sit a few hundred Myr after the big bang
        assert!(ages[4] > 0.25 && ages[4] < 0.33, "age(14) = {}", ages[4]);
    }

    #[test]
    fn luminosity_distance_at_unit_redshift() {
        let dl = PLANCK18.luminosity_distance_mpc(1.0).unwrap();
        assert_relative_eq!(dl, 6791.0, max_relative = 2e-3);
    }

    #[test]
    fn luminosity_distance_signs() {
        assert_eq!(PLANCK18.luminosity_distance_mpc(0.0).unwrap(), 0.0);
        let blue = PLANCK18.luminosity_distance_mpc(-0.013).unwrap();
        assert!(blue < 0.0 && blue.is_finite());
        // low-z Hubble law: d ≈ cz/H0
        let near = PLANCK18.luminosity_distance_mpc(1e-4).unwrap();
        assert_relative_eq!(near, 1e-4 * PLANCK18.hubble_distance_mpc(), max_relative = 1e-3);
    }

    #[test]
    fn rejects_redshift_at_or_below_minus_one() {
        assert_eq!(
            PLANCK18.age_gyr(-1.0),
            Err(CosmologyError::OutOfDomain(-1.0))
        );
        assert!(PLANCK18.luminosity_distance_mpc(-2.0).is_err());
        assert!(PLANCK18.age_gyr(f64::NAN).is_err());
    }

    #[test]
    fn simpson_is_exact_enough_on_smooth_functions() {
        assert_abs_diff_eq!(integrate(|x| x * x, 0.0, 3.0), 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(integrate(f64::sin, 0.0, std::f64::consts::PI), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(integrate(|x| x, 1.0, 0.0), -0.5, epsilon = 1e-12);
    }
}
