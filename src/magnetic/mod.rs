/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Magnetic species and structures
//!
//! Species generate atom positions and spins from a unit cell with
//! propagation and basis vectors; a structure aggregates species into the
//! arrays consumed by the mPDF calculator.

pub mod errors;
pub mod form_factor;
pub mod generation;
pub mod species;
pub mod structure;

pub use errors::{MagneticError, MagneticWarning, Result};
pub use form_factor::FormFactorCoefficients;
pub use generation::{GeneratedAtoms, PropagationMode};
pub use species::{MagSpecies, SpeciesSource};
pub use structure::MagStructure;
