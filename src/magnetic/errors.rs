/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Error and warning types for the magnetic module

use crate::atoms::AtomError;
use std::fmt;
use thiserror::Error;

/// Errors raised while building magnetic species and structures
#[derive(Error, Debug)]
pub enum MagneticError {
    /// Missing or contradictory species setup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A species with this label is already loaded
    #[error("Duplicate species label: {0}")]
    DuplicateLabel(String),

    /// Methods called out of their required sequence
    #[error("Order error: {0}")]
    Order(String),

    /// Invalid numeric value or range
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Unknown magnetic form factor key
    #[error("Unknown magnetic form factor: {0}")]
    UnknownFormFactor(String),

    /// No species with this label is loaded
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    /// Atom and spin arrays do not line up
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Atom error: {0}")]
    Atom(#[from] AtomError),
}

/// Result type for magnetic operations
pub type Result<T> = std::result::Result<T, MagneticError>;

/// Non-fatal findings recorded while generating spins
#[derive(Debug, Clone, PartialEq)]
pub enum MagneticWarning {
    /// The propagation/basis vectors left an imaginary spin component
    NonRealSpin {
        /// Label of the offending species
        species: String,
        /// Largest imaginary component seen
        max_imaginary: f64,
    },
}

impl fmt::Display for MagneticWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MagneticWarning::NonRealSpin {
                species,
                max_imaginary,
            } => write!(
                f,
                "species {} has non-real spins (max imaginary component {:.3e})",
                species, max_imaginary
            ),
        }
    }
}
