/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! # mpdf-rs
//!
//! Magnetic pair distribution function (mPDF) calculations in Rust.
//!
//! A [`MagSpecies`](magnetic::MagSpecies) expands a unit cell with
//! propagation and basis vectors into atoms and spins within a radius, a
//! [`MagStructure`](magnetic::MagStructure) aggregates species, and an
//! [`MPDFCalculator`](mpdf::MPDFCalculator) turns the structure into
//! normalized and unnormalized mPDFs.

pub mod atoms;
pub mod cli;
pub mod input;
pub mod magnetic;
pub mod mpdf;
pub mod utils;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
