/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Crystal structure: a lattice plus a basis of labelled atom sites
//!
//! This is the data a crystallographic structure loader hands to the
//! magnetic species builder: lattice vectors, fractional coordinates and
//! site labels. Symmetry expansion is expected to have been done already.

use super::errors::{AtomError, Result};
use super::lattice::Lattice;
use super::vector::Vector3D;
use std::fmt;

/// One atom of the crystallographic basis
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    /// Site label, e.g. "Mn1"
    pub label: String,
    /// Element symbol, e.g. "Mn"
    pub element: String,
    /// Position in fractional coordinates
    pub fractional: Vector3D,
    /// Site occupancy
    pub occupancy: f64,
}

impl AtomSite {
    /// Create a fully occupied site
    pub fn new(label: &str, element: &str, fractional: Vector3D) -> Self {
        Self {
            label: label.to_string(),
            element: element.to_string(),
            fractional,
            occupancy: 1.0,
        }
    }
}

impl fmt::Display for AtomSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.label, self.element, self.fractional)
    }
}

/// A crystal structure: lattice and fractional atom sites
#[derive(Debug, Clone)]
pub struct CrystalStructure {
    /// Title or description of the structure
    title: String,
    lattice: Lattice,
    sites: Vec<AtomSite>,
}

impl CrystalStructure {
    /// Create an empty structure on the given lattice
    pub fn new(lattice: Lattice) -> Self {
        Self {
            title: String::new(),
            lattice,
            sites: Vec::new(),
        }
    }

    /// Create an empty structure with a title
    pub fn with_title(title: &str, lattice: Lattice) -> Self {
        let mut structure = Self::new(lattice);
        structure.title = title.to_string();
        structure
    }

    /// Get the title of the structure
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the lattice
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Add a site and return its index
    pub fn add_site(&mut self, site: AtomSite) -> Result<usize> {
        if !(0.0..=1.0).contains(&site.occupancy) {
            return Err(AtomError::InvalidSite(format!(
                "occupancy {} of site {} is outside [0, 1]",
                site.occupancy, site.label
            )));
        }
        self.sites.push(site);
        Ok(self.sites.len() - 1)
    }

    /// Get a site by index
    pub fn site(&self, index: usize) -> Option<&AtomSite> {
        self.sites.get(index)
    }

    /// All sites
    pub fn sites(&self) -> &[AtomSite] {
        &self.sites
    }

    /// Number of sites in the basis
    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// Indices of the sites of a given element
    pub fn indices_of_element(&self, element: &str) -> Vec<usize> {
        self.sites
            .iter()
            .enumerate()
            .filter(|(_, site)| site.element == element)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Cartesian positions of the basis sites in the home cell
    pub fn cartesian_positions(&self) -> Vec<Vector3D> {
        self.sites
            .iter()
            .map(|site| self.lattice.frac_to_cart(&site.fractional))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mno_structure() -> CrystalStructure {
        let lattice = Lattice::cubic(4.445).unwrap();
        let mut structure = CrystalStructure::with_title("MnO", lattice);
        structure
            .add_site(AtomSite::new("Mn1", "Mn", Vector3D::new(0.0, 0.0, 0.0)))
            .unwrap();
        structure
            .add_site(AtomSite::new("O1", "O", Vector3D::new(0.5, 0.5, 0.5)))
            .unwrap();
        structure
    }

    #[test]
    fn test_crystal_structure_sites() {
        let structure = mno_structure();

        assert_eq!(structure.title(), "MnO");
        assert_eq!(structure.num_sites(), 2);
        assert_eq!(structure.indices_of_element("Mn"), vec![0]);
        assert_eq!(structure.indices_of_element("O"), vec![1]);
        assert!(structure.site(2).is_none());

        let positions = structure.cartesian_positions();
        assert_relative_eq!(positions[1].x, 2.2225, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_occupancy() {
        let mut structure = mno_structure();
        let mut site = AtomSite::new("X", "Mn", Vector3D::origin());
        site.occupancy = 1.5;
        assert!(structure.add_site(site).is_err());
    }
}
