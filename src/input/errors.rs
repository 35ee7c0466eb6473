/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Error types for run-description loading

use crate::atoms::AtomError;
use crate::magnetic::MagneticError;
use std::io;
use thiserror::Error;

/// Errors that can occur while loading a run description
#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The description parsed but does not describe a usable structure
    #[error("Invalid description: {0}")]
    InvalidDescription(String),

    #[error("Invalid crystal structure: {0}")]
    Atom(#[from] AtomError),

    #[error("Magnetic structure error: {0}")]
    Magnetic(#[from] MagneticError),
}

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;
