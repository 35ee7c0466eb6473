/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Serde model of a JSON run description
//!
//! A description lists the magnetic species of a structure (each either
//! taken from crystal sites or from an explicit lattice) and, optionally,
//! the calculator parameters.
//!
//! ```json
//! {
//!   "structure": {
//!     "uiso": 0.005,
//!     "species": [{
//!       "label": "Mn",
//!       "source": {
//!         "type": "lattice",
//!         "lattice": { "a": 4.445, "b": 4.445, "c": 4.445,
//!                      "alpha": 90.0, "beta": 90.0, "gamma": 90.0 },
//!         "atom_basis": [[0.0, 0.0, 0.0]],
//!         "spin_basis": [[0.0, 0.0, 2.5]]
//!       },
//!       "kvecs": [[0.5, 0.5, 0.5]],
//!       "ff_key": "Mn2"
//!     }]
//!   },
//!   "calculator": { "rmax": 20.0, "qmax": 25.0 }
//! }
//! ```

use super::config::BuildOptions;
use super::errors::{InputError, Result};
use crate::atoms::{AtomSite, ComplexVector3D, CrystalStructure, Lattice, Vector3D};
use crate::magnetic::{MagSpecies, MagStructure};
use crate::mpdf::{share, MPDFCalculator, MpdfParameters};
use log::debug;
use serde::{Deserialize, Serialize};

/// Lattice given by cell parameters (Å, degrees) or by its three vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LatticeDescription {
    Parameters {
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    },
    Vectors {
        vectors: [[f64; 3]; 3],
    },
}

impl LatticeDescription {
    pub fn build(&self) -> Result<Lattice> {
        let lattice = match *self {
            LatticeDescription::Parameters {
                a,
                b,
                c,
                alpha,
                beta,
                gamma,
            } => Lattice::from_parameters(a, b, c, alpha, beta, gamma)?,
            LatticeDescription::Vectors { vectors } => Lattice::from_vectors(vectors)?,
        };
        Ok(lattice)
    }
}

/// A spin basis vector; a plain triple is real
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BasisVectorDescription {
    Real([f64; 3]),
    Complex {
        re: [f64; 3],
        #[serde(default)]
        im: [f64; 3],
    },
}

impl BasisVectorDescription {
    pub fn to_vector(&self) -> ComplexVector3D {
        match self {
            BasisVectorDescription::Real(re) => ComplexVector3D::from_real(Vector3D::from_array(*re)),
            BasisVectorDescription::Complex { re, im } => {
                ComplexVector3D::from_parts(Vector3D::from_array(*re), Vector3D::from_array(*im))
            }
        }
    }
}

fn default_occupancy() -> f64 {
    1.0
}

/// One crystallographic site in fractional coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDescription {
    pub label: String,
    pub element: String,
    pub position: [f64; 3],
    #[serde(default = "default_occupancy")]
    pub occupancy: f64,
}

/// Where a species takes its unit cell from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceDescription {
    /// Sites of a crystal structure, selected by index and/or element
    Crystal {
        #[serde(default)]
        title: String,
        lattice: LatticeDescription,
        sites: Vec<SiteDescription>,
        #[serde(default)]
        struc_idxs: Vec<usize>,
        #[serde(default)]
        element: Option<String>,
        #[serde(default)]
        basis_vecs: Vec<BasisVectorDescription>,
    },
    /// Explicit lattice with one spin per fractional atom position
    Lattice {
        lattice: LatticeDescription,
        atom_basis: Vec<[f64; 3]>,
        spin_basis: Vec<BasisVectorDescription>,
    },
}

/// Settings of one magnetic species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDescription {
    pub label: Option<String>,
    pub source: SourceDescription,
    /// Propagation vectors in reciprocal lattice units
    #[serde(default)]
    pub kvecs: Vec<[f64; 3]>,
    /// Cartesian origin of the generated cluster in Å
    #[serde(default)]
    pub origin: [f64; 3],
    pub rmax: Option<f64>,
    pub ff_key: Option<String>,
    pub g_factor: Option<f64>,
    pub corr_length: Option<f64>,
}

impl SpeciesDescription {
    /// Build the species; `default_corr_length` applies when the species
    /// sets none of its own
    pub fn build(&self, options: &BuildOptions, default_corr_length: Option<f64>) -> Result<MagSpecies> {
        let mut species = match &self.source {
            SourceDescription::Crystal {
                title,
                lattice,
                sites,
                struc_idxs,
                element,
                basis_vecs,
            } => {
                let mut crystal = CrystalStructure::with_title(title, lattice.build()?);
                for site in sites {
                    let mut atom_site =
                        AtomSite::new(&site.label, &site.element, Vector3D::from_array(site.position));
                    atom_site.occupancy = site.occupancy;
                    crystal.add_site(atom_site)?;
                }

                let mut idxs = struc_idxs.clone();
                if let Some(element) = element {
                    let matching = crystal.indices_of_element(element);
                    if matching.is_empty() {
                        return Err(InputError::InvalidDescription(format!(
                            "no site of element {} in the crystal structure",
                            element
                        )));
                    }
                    idxs.extend(matching);
                }

                let mut species = MagSpecies::from_crystal(crystal, idxs);
                species.set_basis_vecs(basis_vecs.iter().map(BasisVectorDescription::to_vector).collect())?;
                species
            }
            SourceDescription::Lattice {
                lattice,
                atom_basis,
                spin_basis,
            } => MagSpecies::from_lattice(
                lattice.build()?,
                atom_basis.iter().copied().map(Vector3D::from_array).collect(),
                spin_basis.iter().map(BasisVectorDescription::to_vector).collect(),
            ),
        };

        species.set_kvecs(self.kvecs.iter().copied().map(Vector3D::from_array).collect());
        species.set_origin(Vector3D::from_array(self.origin));
        if let Some(label) = &self.label {
            species = species.with_label(label);
        }
        if let Some(rmax) = options.rmax.or(self.rmax) {
            species.set_rmax(rmax)?;
        }
        if let Some(key) = options.ff_key.as_deref().or(self.ff_key.as_deref()) {
            species.set_ff_key(Some(key));
        }
        if let Some(g_factor) = self.g_factor {
            species.set_g_factor(g_factor);
        }
        if let Some(corr_length) = self.corr_length.or(default_corr_length) {
            species.set_corr_length(corr_length)?;
        }
        Ok(species)
    }
}

/// Structure-level settings and the species list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureDescription {
    #[serde(default)]
    pub species: Vec<SpeciesDescription>,
    /// Isotropic displacement parameter in Å²
    pub uiso: Option<f64>,
    /// Correlation length in Å for species without their own
    pub corr_length: Option<f64>,
    /// Explicit calculation indices into the generated atoms
    pub calc_idxs: Option<Vec<usize>>,
    /// Centre the calculation on every generated atom
    #[serde(default)]
    pub use_all_atoms: bool,
}

impl StructureDescription {
    /// Build and fully generate the magnetic structure
    pub fn build(&self, options: &BuildOptions) -> Result<MagStructure> {
        if self.species.is_empty() {
            return Err(InputError::InvalidDescription(
                "structure lists no magnetic species".to_string(),
            ));
        }

        let mut structure = MagStructure::new();
        if let Some(uiso) = self.uiso {
            structure.set_uiso(uiso)?;
        }
        for description in &self.species {
            structure.load_species(description.build(options, self.corr_length)?)?;
        }
        structure.make_all()?;

        if self.use_all_atoms {
            structure.use_all_atoms_for_calc();
        } else if let Some(idxs) = &self.calc_idxs {
            structure.set_calc_idxs(idxs.clone())?;
        }
        debug!(
            "built structure with {} species, {} atoms, {} calculation centres",
            structure.num_species(),
            structure.num_atoms(),
            structure.calc_idxs().len()
        );
        Ok(structure)
    }
}

/// A complete run: the structure and the calculator parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDescription {
    pub structure: StructureDescription,
    #[serde(default)]
    pub calculator: MpdfParameters,
}

impl RunDescription {
    pub fn build_structure(&self) -> Result<MagStructure> {
        self.structure.build(&BuildOptions::default())
    }

    pub fn build_structure_with(&self, options: &BuildOptions) -> Result<MagStructure> {
        self.structure.build(options)
    }

    /// Build the structure and attach it to a calculator with the described
    /// parameters
    pub fn build_calculator(&self, options: &BuildOptions) -> Result<MPDFCalculator> {
        let structure = self.build_structure_with(options)?;
        Ok(MPDFCalculator::with_parameters(share(structure), self.calculator.clone()))
    }
}
