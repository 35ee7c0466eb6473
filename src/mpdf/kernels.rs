/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Numerical kernels of the mPDF calculation
//!
//! Pair accumulation follows Frandsen, Yang & Billinge, Acta Cryst. A 70,
//! 3 (2014): for every pair the bond direction defines x̂ and
//!
//! ```text
//! A_ij = S_i·S_j − (S_i·x̂)(S_j·x̂)
//! B_ij = 2(S_i·x̂)(S_j·x̂) − A_ij
//! f(r) = 1/N Σ [ A_ij/r δ(r − r_ij) + B_ij r/r_ij³ Θ(r_ij − r) ]
//! ```
//!
//! Everything here works on a padded radial grid so that broadening and
//! termination ripples near the requested range edges are computed from the
//! pairs just outside it.

use super::errors::{MpdfError, Result};
use crate::atoms::Vector3D;
use crate::utils::constants::COINCIDENT_TOLERANCE;
use crate::utils::{convolve_same, integrate_trapezoid, uniform_grid};
use rayon::prelude::*;
use std::f64::consts::PI;

/// Number of calculation centres handled by one parallel task
///
/// Fixed so that the order of floating point sums does not depend on the
/// thread count.
const CENTRES_PER_TASK: usize = 16;

/// Gaussian kernels are cut off at this many standard deviations
const GAUSSIAN_CUTOFF: f64 = 5.0;

/// Uniform radial grid padded beyond the requested `[rmin, rmax]`
#[derive(Debug, Clone)]
pub struct ExtendedGrid {
    start: f64,
    step: f64,
    len: usize,
    inner_offset: usize,
    inner_len: usize,
}

impl ExtendedGrid {
    /// Build the grid `rmin, rmin + step, ...` (up to and including `rmax`)
    /// padded by at most `pad_low` below (never below r = 0) and `pad_high`
    /// above, in whole steps
    pub fn new(rmin: f64, rmax: f64, step: f64, pad_low: f64, pad_high: f64) -> Result<Self> {
        let inner = uniform_grid(rmin, rmax, step)?;
        let low_steps = (pad_low.min(rmin) / step + 1e-9).floor() as usize;
        let high_steps = (pad_high / step - 1e-9).ceil().max(0.0) as usize;
        Ok(Self {
            start: rmin - low_steps as f64 * step,
            step,
            len: low_steps + inner.len() + high_steps,
            inner_offset: low_steps,
            inner_len: inner.len(),
        })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All points of the padded grid
    pub fn points(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.start + i as f64 * self.step).collect()
    }

    /// Points of the requested range only
    pub fn inner_points(&self) -> Vec<f64> {
        (self.inner_offset..self.inner_offset + self.inner_len)
            .map(|i| self.start + i as f64 * self.step)
            .collect()
    }

    /// Index of the bin nearest `distance`, if it falls on the grid
    pub fn bin(&self, distance: f64) -> Option<usize> {
        let position = ((distance - self.start) / self.step).round();
        if position < 0.0 || position >= self.len as f64 {
            return None;
        }
        Some(position as usize)
    }

    /// Restrict values on the padded grid to the requested range
    pub fn trim(&self, values: &[f64]) -> Vec<f64> {
        values[self.inner_offset..self.inner_offset + self.inner_len].to_vec()
    }
}

/// Everything the pair accumulation reads from a magnetic structure
#[derive(Debug, Clone, Default)]
pub struct PairInputs {
    pub positions: Vec<Vector3D>,
    pub spins: Vec<Vector3D>,
    pub g_factors: Vec<f64>,
    pub corr_lengths: Vec<f64>,
    pub calc_idxs: Vec<usize>,
}

impl PairInputs {
    /// Mean of (g/2)²|S|² over the calculation centres
    pub fn mean_moment_squared(&self) -> f64 {
        if self.calc_idxs.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .calc_idxs
            .iter()
            .map(|&i| {
                let half_g = self.g_factors[i] / 2.0;
                half_g * half_g * self.spins[i].length_squared()
            })
            .sum();
        total / self.calc_idxs.len() as f64
    }
}

/// A and B pair terms binned on an [`ExtendedGrid`]
///
/// `b` holds B_ij/r_ij³ so that the tail term is a running sum.
#[derive(Debug, Clone)]
pub struct PairHistograms {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl PairHistograms {
    fn zeros(len: usize) -> Self {
        Self {
            a: vec![0.0; len],
            b: vec![0.0; len],
        }
    }

    fn add(&mut self, other: &PairHistograms) {
        for (x, y) in self.a.iter_mut().zip(&other.a) {
            *x += y;
        }
        for (x, y) in self.b.iter_mut().zip(&other.b) {
            *x += y;
        }
    }
}

/// Frandsen A and B terms for spins `si`, `sj` along unit bond vector `x_hat`
pub fn pair_terms(si: &Vector3D, sj: &Vector3D, x_hat: &Vector3D) -> (f64, f64) {
    let along = si.dot(x_hat) * sj.dot(x_hat);
    let a = si.dot(sj) - along;
    (a, 2.0 * along - a)
}

/// Pair weight from finite correlation lengths; exactly 1 when both are infinite
pub fn correlation_weight(distance: f64, xi_i: f64, xi_j: f64) -> f64 {
    (-0.5 * distance * (xi_i.recip() + xi_j.recip())).exp()
}

/// Bin the pair terms of every calculation centre against every other atom
pub fn accumulate_pairs(inputs: &PairInputs, grid: &ExtendedGrid) -> PairHistograms {
    let partials: Vec<PairHistograms> = inputs
        .calc_idxs
        .par_chunks(CENTRES_PER_TASK)
        .map(|centres| {
            let mut histograms = PairHistograms::zeros(grid.len());
            for &i in centres {
                accumulate_centre(inputs, grid, i, &mut histograms);
            }
            histograms
        })
        .collect();

    let mut total = PairHistograms::zeros(grid.len());
    for partial in &partials {
        total.add(partial);
    }
    total
}

fn accumulate_centre(inputs: &PairInputs, grid: &ExtendedGrid, i: usize, out: &mut PairHistograms) {
    let pos_i = inputs.positions[i];
    let spin_i = inputs.spins[i];
    for (j, pos_j) in inputs.positions.iter().enumerate() {
        if j == i {
            continue;
        }
        let bond = *pos_j - pos_i;
        let distance = bond.length();
        if distance < COINCIDENT_TOLERANCE {
            continue;
        }
        let Some(bin) = grid.bin(distance) else {
            continue;
        };

        let (a, b) = pair_terms(&spin_i, &inputs.spins[j], &(bond * distance.recip()));
        let weight = inputs.g_factors[i] * inputs.g_factors[j] / 4.0
            * correlation_weight(distance, inputs.corr_lengths[i], inputs.corr_lengths[j]);
        out.a[bin] += weight * a;
        out.b[bin] += weight * b / (distance * distance * distance);
    }
}

/// Turn binned pair terms into f(r) on the padded grid
///
/// The A term is a delta density (histogram / Δr) divided by r and vanishes
/// at r = 0; the B term is r times the sum over all bins beyond r.
pub fn pair_function(histograms: &PairHistograms, grid: &ExtendedGrid, num_centres: usize) -> Vec<f64> {
    let mut f = vec![0.0; grid.len()];
    if num_centres == 0 {
        return f;
    }
    let step = grid.step();
    let norm = num_centres as f64;

    let mut tail = 0.0;
    for (m, r) in grid.points().into_iter().enumerate().rev() {
        let a_term = if r > COINCIDENT_TOLERANCE {
            histograms.a[m] / (step * r)
        } else {
            0.0
        };
        f[m] = (a_term + r * tail) / norm;
        tail += histograms.b[m];
    }
    f
}

/// Convolve with a unit-area Gaussian of width `sigma`; σ = 0 leaves the
/// values untouched
pub fn gaussian_smear(values: &[f64], step: f64, sigma: f64) -> Result<Vec<f64>> {
    if sigma <= 0.0 {
        return Ok(values.to_vec());
    }
    let half = (GAUSSIAN_CUTOFF * sigma / step).ceil() as usize;
    let mut kernel: Vec<f64> = (0..=2 * half)
        .map(|k| {
            let u = (k as f64 - half as f64) * step;
            (-0.5 * (u / sigma).powi(2)).exp()
        })
        .collect();
    let area: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= area);
    Ok(convolve_same(values, &kernel)?)
}

/// Real-space image of the band-pass `qmin < |Q| < qmax`
///
/// K(u) = [sin(qmax u) − sin(qmin u)] / (π u), sampled at `u = k·step` for
/// `k = −half..=half`.
pub fn termination_kernel(qmin: f64, qmax: f64, step: f64, half: usize) -> Vec<f64> {
    (0..=2 * half)
        .map(|k| {
            let u = (k as f64 - half as f64) * step;
            if u == 0.0 {
                (qmax - qmin) / PI
            } else {
                ((qmax * u).sin() - (qmin * u).sin()) / (PI * u)
            }
        })
        .collect()
}

/// Apply the finite-Q termination ripple to values on `grid`
pub fn apply_termination(values: &[f64], grid: &ExtendedGrid, qmin: f64, qmax: f64) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let kernel = termination_kernel(qmin, qmax, grid.step(), values.len() - 1);
    let mut filtered = convolve_same(values, &kernel)?;
    filtered.iter_mut().for_each(|v| *v *= grid.step());
    Ok(filtered)
}

/// Multiply by the instrumental envelope exp(−(r·qdamp)²/2)
pub fn apply_qdamp(values: &mut [f64], r: &[f64], qdamp: f64) {
    if qdamp <= 0.0 {
        return;
    }
    for (v, r) in values.iter_mut().zip(r) {
        *v *= (-0.5 * (r * qdamp).powi(2)).exp();
    }
}

/// Real-space kernel S(u) = (1/π) ∫ F(q)² cos(qu) dq on `u = k·step`,
/// `k = −half..=half`
///
/// `q` must be uniform; a grid of fewer than two points gives a zero kernel.
pub fn form_factor_kernel(q: &[f64], ff: &[f64], step: f64, half: usize) -> Vec<f64> {
    let dq = grid_spacing(q);
    let ff_squared: Vec<f64> = ff.iter().map(|f| f * f).collect();
    (0..=2 * half)
        .map(|k| {
            let u = (k as f64 - half as f64) * step;
            let integrand: Vec<f64> = q
                .iter()
                .zip(&ff_squared)
                .map(|(q, f2)| f2 * (q * u).cos())
                .collect();
            integrate_trapezoid(&integrand, dq) / PI
        })
        .collect()
}

/// Single-ion self-scattering profile (1/π) ∫ q F(q)² sin(qr) dq
pub fn self_scattering_profile(q: &[f64], ff: &[f64], r: &[f64]) -> Vec<f64> {
    let dq = grid_spacing(q);
    let weights: Vec<f64> = q.iter().zip(ff).map(|(q, f)| q * f * f).collect();
    r.iter()
        .map(|r| {
            let integrand: Vec<f64> = q
                .iter()
                .zip(&weights)
                .map(|(q, w)| w * (q * r).sin())
                .collect();
            integrate_trapezoid(&integrand, dq) / PI
        })
        .collect()
}

/// Number of grid points spanning `distance`, at least one
pub fn half_width(distance: f64, step: f64) -> Result<usize> {
    if distance <= 0.0 || !distance.is_finite() {
        return Err(MpdfError::InvalidRange(format!(
            "kernel half width must be positive, got {}",
            distance
        )));
    }
    Ok(((distance / step).round() as usize).max(1))
}

fn grid_spacing(q: &[f64]) -> f64 {
    if q.len() < 2 {
        0.0
    } else {
        q[1] - q[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extended_grid_alignment() {
        let grid = ExtendedGrid::new(1.0, 2.0, 0.01, 4.0, 4.0).unwrap();
        // padding below stops at r = 0
        assert_relative_eq!(grid.points()[0], 0.0, epsilon = 1e-12);
        let inner = grid.inner_points();
        assert_eq!(inner.len(), 101);
        assert_relative_eq!(inner[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(inner[100], 2.0, epsilon = 1e-9);
        assert_relative_eq!(*grid.points().last().unwrap(), 6.0, epsilon = 1e-9);

        assert_eq!(grid.bin(1.004), Some(100));
        assert_eq!(grid.bin(6.5), None);
        assert_eq!(grid.trim(&grid.points()).len(), 101);
    }

    #[test]
    fn test_pair_terms_perpendicular_and_parallel() {
        let x = Vector3D::new(1.0, 0.0, 0.0);
        let up = Vector3D::new(0.0, 0.0, 1.0);
        let (a, b) = pair_terms(&up, &-up, &x);
        assert_relative_eq!(a, -1.0);
        assert_relative_eq!(b, 1.0);

        let (a, b) = pair_terms(&x, &x, &x);
        assert_relative_eq!(a, 0.0);
        assert_relative_eq!(b, 2.0);
    }

    #[test]
    fn test_correlation_weight() {
        assert_eq!(correlation_weight(4.0, f64::INFINITY, f64::INFINITY), 1.0);
        assert_relative_eq!(correlation_weight(4.0, 2.0, 2.0), (-2.0_f64).exp());
    }

    #[test]
    fn test_gaussian_smear_conserves_area() {
        let mut values = vec![0.0; 201];
        values[100] = 1.0;
        let smeared = gaussian_smear(&values, 0.01, 0.1).unwrap();
        assert_relative_eq!(smeared.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
        assert!(smeared[100] < 1.0);
        assert_relative_eq!(smeared[90], smeared[110], epsilon = 1e-12);
        assert_eq!(gaussian_smear(&values, 0.01, 0.0).unwrap(), values);
    }

    #[test]
    fn test_unit_form_factor_kernel_has_unit_area() {
        let q: Vec<f64> = (0..=2500).map(|i| i as f64 * 0.01).collect();
        let ff = vec![1.0; q.len()];
        let kernel = form_factor_kernel(&q, &ff, 0.01, 500);
        assert_relative_eq!(kernel[500], 25.0 / PI, epsilon = 1e-9);
        assert_relative_eq!(kernel.iter().sum::<f64>() * 0.01, 1.0, epsilon = 0.02);
    }

    #[test]
    fn test_self_scattering_vanishes_at_origin() {
        let q: Vec<f64> = (0..=100).map(|i| i as f64 * 0.1).collect();
        let ff: Vec<f64> = q.iter().map(|q| (-q * q / 50.0).exp()).collect();
        let profile = self_scattering_profile(&q, &ff, &[0.0, 0.5]);
        assert_eq!(profile[0], 0.0);
        assert!(profile[1] > 0.0);
    }
}
