/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Run descriptions
//!
//! Loads JSON run descriptions and builds ready-to-use magnetic structures
//! from them.

pub mod config;
pub mod errors;
pub mod model;

pub use config::BuildOptions;
pub use errors::{InputError, Result};
pub use model::{
    BasisVectorDescription, LatticeDescription, RunDescription, SiteDescription, SourceDescription,
    SpeciesDescription, StructureDescription,
};

use crate::magnetic::MagStructure;
use log::info;
use std::fs;
use std::path::Path;

/// Parse a run description from JSON text
pub fn parse_description(text: &str) -> Result<RunDescription> {
    Ok(serde_json::from_str(text)?)
}

/// Read and parse a run description file
pub fn load_description<P: AsRef<Path>>(path: P) -> Result<RunDescription> {
    let path = path.as_ref();
    let description = parse_description(&fs::read_to_string(path)?)?;
    info!(
        "loaded {} with {} magnetic species",
        path.display(),
        description.structure.species.len()
    );
    Ok(description)
}

/// Build a generated magnetic structure straight from a description file
///
/// `ff_key` and `rmax`, when given, replace the form factor key and the
/// generation radius of every species.
pub fn create_from_file<P: AsRef<Path>>(path: P, ff_key: Option<&str>, rmax: Option<f64>) -> Result<MagStructure> {
    load_description(path)?.build_structure_with(&BuildOptions::new(ff_key, rmax))
}
