/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Magnetic form factors
//!
//! Tabulated ⟨j0⟩ coefficients in the dipole approximation for common
//! magnetic ions:
//!
//! ⟨j0⟩(s) = A exp(−a s²) + B exp(−b s²) + C exp(−c s²) + D, with s = q/4π.
//!
//! Keys are the element symbol followed by the oxidation state, e.g. `"Mn2"`.

use super::errors::{MagneticError, Result};
use crate::utils::constants::{DEFAULT_FF_QMAX, DEFAULT_FF_QSTEP};
use crate::utils::uniform_grid;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::f64::consts::PI;

/// Coefficients of the analytic ⟨j0⟩ approximation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormFactorCoefficients {
    pub a_amp: f64,
    pub a_exp: f64,
    pub b_amp: f64,
    pub b_exp: f64,
    pub c_amp: f64,
    pub c_exp: f64,
    pub d: f64,
}

impl FormFactorCoefficients {
    const fn new(table: [f64; 7]) -> Self {
        Self {
            a_amp: table[0],
            a_exp: table[1],
            b_amp: table[2],
            b_exp: table[3],
            c_amp: table[4],
            c_exp: table[5],
            d: table[6],
        }
    }

    /// Evaluate the form factor at momentum transfer `q` (Å⁻¹)
    pub fn evaluate(&self, q: f64) -> f64 {
        let s = q / (4.0 * PI);
        let s2 = s * s;
        self.a_amp * (-self.a_exp * s2).exp()
            + self.b_amp * (-self.b_exp * s2).exp()
            + self.c_amp * (-self.c_exp * s2).exp()
            + self.d
    }
}

static J0_TABLE: Lazy<HashMap<&'static str, FormFactorCoefficients>> = Lazy::new(|| {
    let entries: [(&str, [f64; 7]); 12] = [
        ("Cr2", [1.2024, -0.0055, 0.4158, 20.5475, 0.6032, 6.9560, -1.2218]),
        ("Cr3", [-0.3094, 0.0274, 0.3680, 17.0355, 0.6559, 6.5236, 0.2856]),
        ("V3", [0.4086, 28.8109, 0.6077, 10.5783, -0.0295, 0.1123, 0.0121]),
        ("Mn2", [0.4220, 17.6840, 0.5948, 6.0050, 0.0043, -0.6090, -0.0219]),
        ("Mn3", [0.4198, 14.2829, 0.6054, 5.4689, 0.9241, -0.0088, -0.9498]),
        ("Mn4", [0.3760, 12.5661, 0.6602, 5.1329, -0.0372, 0.5630, 0.0011]),
        ("Fe2", [0.0263, 34.9597, 0.3668, 15.9435, 0.6188, 5.5935, -0.0119]),
        ("Fe3", [0.3972, 13.2442, 0.6295, 4.9034, -0.0314, 0.3496, 0.0044]),
        ("Co2", [0.4332, 14.3553, 0.5857, 4.6077, -0.0382, 0.1338, 0.0179]),
        ("Co3", [0.3902, 12.5078, 0.6324, 4.4574, -0.1500, 0.0343, 0.1272]),
        ("Ni2", [0.0163, 35.8826, 0.3916, 13.2233, 0.6052, 4.3388, -0.0133]),
        ("Cu2", [0.0232, 34.9686, 0.4023, 11.5640, 0.5882, 3.8428, -0.0137]),
    ];
    entries
        .iter()
        .map(|(key, table)| (*key, FormFactorCoefficients::new(*table)))
        .collect()
});

/// Look up the ⟨j0⟩ coefficients for an ion key such as `"Fe3"`
pub fn coefficients(key: &str) -> Result<FormFactorCoefficients> {
    J0_TABLE
        .get(key)
        .copied()
        .ok_or_else(|| MagneticError::UnknownFormFactor(key.to_string()))
}

/// All known form factor keys, sorted
pub fn available_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = J0_TABLE.keys().copied().collect();
    keys.sort_unstable();
    keys
}

/// Default momentum-transfer grid (Å⁻¹) on which form factors are sampled
pub fn default_q_grid() -> Vec<f64> {
    // constants are valid grid bounds, so this cannot fail
    uniform_grid(0.0, DEFAULT_FF_QMAX, DEFAULT_FF_QSTEP).unwrap_or_default()
}

/// Sample the form factor for `key` on `q`
///
/// With no key the form factor is the constant 1.
pub fn evaluate_on_grid(key: Option<&str>, q: &[f64]) -> Result<Vec<f64>> {
    match key {
        Some(key) => {
            let coeffs = coefficients(key)?;
            Ok(q.iter().map(|&qi| coeffs.evaluate(qi)).collect())
        }
        None => Ok(vec![1.0; q.len()]),
    }
}
