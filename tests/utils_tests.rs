/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

use approx::assert_relative_eq;
use mpdf_rs::utils::{constants, convolve, convolve_same, integrate_trapezoid, uniform_grid};

#[test]
fn test_fft_convolution_matches_direct_sum() {
    let a = [1.0, -2.0, 0.5, 3.0, 0.0, 1.5, -1.0];
    let b = [0.25, 1.0, -0.5];
    let fast = convolve(&a, &b).unwrap();

    assert_eq!(fast.len(), a.len() + b.len() - 1);
    for (k, value) in fast.iter().enumerate() {
        let direct: f64 = (0..a.len())
            .filter(|&i| k >= i && k - i < b.len())
            .map(|i| a[i] * b[k - i])
            .sum();
        assert_relative_eq!(*value, direct, epsilon = 1e-12);
    }
    assert!(convolve(&[], &b).is_err());
}

#[test]
fn test_centred_convolution_keeps_length() {
    let signal = [0.0, 1.0, 2.0, 3.0, 4.0];
    let smoothed = convolve_same(&signal, &[0.25, 0.5, 0.25]).unwrap();
    assert_eq!(smoothed.len(), signal.len());
    assert_relative_eq!(smoothed[2], 2.0, epsilon = 1e-12);
    assert!(convolve_same(&signal, &[0.5, 0.5]).is_err());
}

#[test]
fn test_gaussian_integral() {
    let dx = 0.01;
    let x = uniform_grid(-6.0, 6.0, dx).unwrap();
    let y: Vec<f64> = x.iter().map(|x| (-x * x / 2.0).exp()).collect();
    assert_relative_eq!(
        integrate_trapezoid(&y, dx),
        (2.0 * std::f64::consts::PI).sqrt(),
        epsilon = 1e-8
    );
}

#[test]
fn test_mpdf_prefactor() {
    // (2/3)(γ r0 / 2)² in barn
    let expected = 2.0 / 3.0 * (1.913 * 2.81794 / 2.0_f64).powi(2) / 100.0;
    assert_relative_eq!(constants::MPDF_PREFACTOR, expected, epsilon = 1e-12);
    assert!(constants::MPDF_PREFACTOR > 0.048 && constants::MPDF_PREFACTOR < 0.049);
}
