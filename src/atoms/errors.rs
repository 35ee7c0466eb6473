/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Error types for the atoms module

/// Error types for the atoms module
#[derive(Debug, thiserror::Error)]
pub enum AtomError {
    #[error("Invalid lattice: {0}")]
    InvalidLattice(String),

    #[error("Invalid atom site: {0}")]
    InvalidSite(String),

    #[error("Coordinate conversion error: {0}")]
    CoordinateError(String),
}

/// Result type for atom operations
pub type Result<T> = std::result::Result<T, AtomError>;
