/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Utility functions for mPDF calculations
//!
//! Physical constants and the numerical helpers (FFT convolution,
//! integration on uniform grids) shared by the calculator.

pub mod constants;
pub mod errors;
pub mod math;

pub use errors::{Result, UtilsError};
pub use math::{convolve, convolve_same, fast_fourier_transform, integrate_trapezoid, uniform_grid};
