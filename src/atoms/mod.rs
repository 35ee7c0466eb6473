/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Crystallographic building blocks
//!
//! Vectors (real and complex), lattices and the crystal structures that
//! magnetic species are expanded from.

pub mod crystal;
pub mod errors;
pub mod lattice;
pub mod vector;

pub use crystal::{AtomSite, CrystalStructure};
pub use errors::{AtomError, Result};
pub use lattice::Lattice;
pub use vector::{ComplexVector3D, Vector3D};
