/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Settings applied on top of a run description when building a structure

use serde::{Deserialize, Serialize};

/// Overrides applied to every species of a description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Form factor key replacing each species' own key
    pub ff_key: Option<String>,
    /// Generation radius in Å replacing each species' own radius
    pub rmax: Option<f64>,
}

impl BuildOptions {
    pub fn new(ff_key: Option<&str>, rmax: Option<f64>) -> Self {
        Self {
            ff_key: ff_key.map(str::to_string),
            rmax,
        }
    }
}
