/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Magnetic pair distribution function calculation
//!
//! [`MPDFCalculator`] turns the atoms and spins of a shared
//! [`MagStructure`](crate::magnetic::MagStructure) into normalized and
//! unnormalized mPDFs on a uniform real-space grid.

pub mod calculator;
pub mod errors;
pub mod kernels;

pub use calculator::{share, MPDFCalculator, MpdfParameters, MpdfProfile, SharedStructure};
pub use errors::{MpdfError, Result};
