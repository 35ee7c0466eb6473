/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Error types for the mpdf module

use crate::magnetic::MagneticError;
use crate::utils::errors::UtilsError;
use thiserror::Error;

/// Errors that can occur during mPDF calculations
#[derive(Error, Debug)]
pub enum MpdfError {
    /// Invalid calculator parameter or range
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// The shared magnetic structure could not be accessed
    #[error("Magnetic structure unavailable: {0}")]
    StructureUnavailable(String),

    #[error("Magnetic structure error: {0}")]
    Magnetic(#[from] MagneticError),

    #[error("Numerical error: {0}")]
    Utils(#[from] UtilsError),
}

/// A specialized Result type for mPDF operations
pub type Result<T> = std::result::Result<T, MpdfError>;
