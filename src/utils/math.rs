/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Mathematical utility functions for mPDF calculations
//!
//! FFT-based convolution and simple quadrature on uniform grids.

#![allow(clippy::needless_range_loop)]
use super::errors::{Result, UtilsError};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Relative slack used when counting the points of a uniform grid, so that
/// an end point that is an exact multiple of the step is not lost to rounding
const GRID_SLACK: f64 = 1e-9;

/// Uniform grid `start, start + step, ...` up to and including `stop`
///
/// # Arguments
///
/// * `start` - First grid point
/// * `stop` - Last grid point (included when it lies on the grid)
/// * `step` - Grid spacing, must be positive
///
/// # Returns
///
/// The grid points, or an error if the step is not positive or `stop < start`
pub fn uniform_grid(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if step <= 0.0 || !step.is_finite() {
        return Err(UtilsError::Math(format!("grid step must be positive, got {}", step)));
    }
    if stop < start {
        return Err(UtilsError::Math(format!(
            "grid end {} lies before grid start {}",
            stop, start
        )));
    }
    let n = ((stop - start) / step + GRID_SLACK).floor() as usize + 1;
    Ok((0..n).map(|i| start + i as f64 * step).collect())
}

/// Integrates uniformly sampled values with the trapezoidal rule
///
/// # Arguments
///
/// * `values` - Samples of the integrand
/// * `dx` - Spacing between samples
///
/// # Returns
///
/// The approximate value of the integral (zero for fewer than two samples)
pub fn integrate_trapezoid(values: &[f64], dx: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let interior: f64 = values[1..values.len() - 1].iter().sum();
    (interior + 0.5 * (values[0] + values[values.len() - 1])) * dx
}

/// Performs a Fast Fourier Transform using the Cooley-Tukey algorithm
///
/// # Arguments
///
/// * `input` - The complex input vector to transform (length must be a power of 2)
/// * `inverse` - Whether to perform an inverse transform
///
/// # Returns
///
/// The complex result of the Fourier transform or an error if input length is not a power of 2
pub fn fast_fourier_transform(input: &[Complex64], inverse: bool) -> Result<Vec<Complex64>> {
    let n = input.len();

    if !n.is_power_of_two() {
        return Err(UtilsError::Generic(format!(
            "FFT requires input length to be a power of 2, got {}",
            n
        )));
    }

    let scale = if inverse { 1.0 / n as f64 } else { 1.0 };
    let sign = if inverse { 1.0 } else { -1.0 };

    let mut output = bit_reversal_permutation(input);

    for s in 1..=n.trailing_zeros() {
        let m = 1 << s;
        let m_half = m / 2;

        // Twiddle factor: w_m = e^(±2πi/m)
        let omega_m = Complex64::new(
            (sign * 2.0 * PI / m as f64).cos(),
            (sign * 2.0 * PI / m as f64).sin(),
        );

        for k in (0..n).step_by(m) {
            let mut omega = Complex64::new(1.0, 0.0);

            for j in 0..m_half {
                let t = omega * output[k + j + m_half];
                let u = output[k + j];

                output[k + j] = u + t;
                output[k + j + m_half] = u - t;

                omega *= omega_m;
            }
        }
    }

    if inverse {
        for value in output.iter_mut() {
            *value *= scale;
        }
    }

    Ok(output)
}

/// Performs the bit-reversal permutation step of the FFT algorithm
fn bit_reversal_permutation(input: &[Complex64]) -> Vec<Complex64> {
    let n = input.len();
    let bits = n.trailing_zeros();
    let mut output = vec![Complex64::new(0.0, 0.0); n];

    for i in 0..n {
        let mut reversed = 0;
        for j in 0..bits {
            reversed |= ((i >> j) & 1) << (bits - 1 - j);
        }

        output[reversed] = input[i];
    }

    output
}

/// Computes the full linear convolution of two sequences using FFT
///
/// # Arguments
///
/// * `a` - First input sequence
/// * `b` - Second input sequence
///
/// # Returns
///
/// The convolution of a and b (length `a.len() + b.len() - 1`), or an
/// error if either input is empty
pub fn convolve(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    let na = a.len();
    let nb = b.len();
    if na == 0 || nb == 0 {
        return Err(UtilsError::Math("cannot convolve an empty sequence".to_string()));
    }

    let n = (na + nb - 1).next_power_of_two();

    let mut a_padded = vec![Complex64::new(0.0, 0.0); n];
    let mut b_padded = vec![Complex64::new(0.0, 0.0); n];

    for i in 0..na {
        a_padded[i] = Complex64::new(a[i], 0.0);
    }

    for i in 0..nb {
        b_padded[i] = Complex64::new(b[i], 0.0);
    }

    let a_fft = fast_fourier_transform(&a_padded, false)?;
    let b_fft = fast_fourier_transform(&b_padded, false)?;

    let c_fft: Vec<Complex64> = a_fft.iter().zip(b_fft.iter()).map(|(x, y)| x * y).collect();

    let c_complex = fast_fourier_transform(&c_fft, true)?;

    Ok(c_complex[..na + nb - 1].iter().map(|c| c.re).collect())
}

/// Convolves `signal` with a centred kernel, keeping the length of `signal`
///
/// The kernel must have odd length 2h+1; its middle element is the zero
/// offset. Output element i is Σ_j kernel[j]·signal[i + h − j].
pub fn convolve_same(signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>> {
    if kernel.len() % 2 == 0 {
        return Err(UtilsError::Math(format!(
            "centred convolution needs an odd kernel length, got {}",
            kernel.len()
        )));
    }
    if signal.is_empty() {
        return Ok(Vec::new());
    }
    let half = kernel.len() / 2;
    let full = convolve(signal, kernel)?;
    Ok(full[half..half + signal.len()].to_vec())
}
