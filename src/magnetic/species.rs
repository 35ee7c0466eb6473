/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Magnetic species: a generator of atom positions and spin vectors
//!
//! A species is defined either from a crystal structure (a subset of its
//! sites plus propagation and basis vectors) or from an explicit lattice
//! with fractional atom and spin bases. Both variants expand into the same
//! magnetic cell and share the tiling and Fourier spin generation.

use super::errors::{MagneticError, MagneticWarning, Result};
use super::form_factor;
use super::generation::{generate_atoms, generate_spins, GeneratedAtoms, PropagationMode};
use crate::atoms::{ComplexVector3D, CrystalStructure, Lattice, Vector3D};
use crate::utils::constants::{
    DEFAULT_GENERATION_RADIUS, DEFAULT_G_FACTOR, IMAGINARY_SPIN_TOLERANCE,
};
use log::{debug, warn};
use ndarray::{Array2, ArrayView2};

/// Label used in messages for species that have not been labelled yet
const UNLABELLED: &str = "<unlabelled>";

/// Where a species takes its unit cell from
#[derive(Debug, Clone)]
pub enum SpeciesSource {
    /// Sites of a crystal structure, one basis vector per propagation vector
    /// shared by all selected sites
    Crystal {
        structure: CrystalStructure,
        struc_idxs: Vec<usize>,
        basis_vecs: Vec<ComplexVector3D>,
    },
    /// An explicit lattice with one moment per fractional basis position,
    /// modulated by every propagation vector
    Lattice {
        lattice: Lattice,
        atom_basis: Vec<Vector3D>,
        spin_basis: Vec<ComplexVector3D>,
    },
}

/// The expanded cell both source variants reduce to
struct MagneticCell {
    lattice: Lattice,
    sites: Vec<Vector3D>,
    modes: Vec<PropagationMode>,
}

/// A magnetic species and the atoms/spins generated from it
#[derive(Debug, Clone)]
pub struct MagSpecies {
    label: Option<String>,
    source: Option<SpeciesSource>,
    kvecs: Vec<Vector3D>,
    origin: Vector3D,
    rmax: f64,
    ff_key: Option<String>,
    g_factor: f64,
    corr_length: f64,
    generated: Option<GeneratedAtoms>,
    atoms: Array2<f64>,
    spins: Array2<f64>,
    ff: Option<Vec<f64>>,
    warnings: Vec<MagneticWarning>,
    builder_error: Option<String>,
}

impl Default for MagSpecies {
    fn default() -> Self {
        Self {
            label: None,
            source: None,
            kvecs: Vec::new(),
            origin: Vector3D::origin(),
            rmax: DEFAULT_GENERATION_RADIUS,
            ff_key: None,
            g_factor: DEFAULT_G_FACTOR,
            corr_length: f64::INFINITY,
            generated: None,
            atoms: Array2::zeros((0, 3)),
            spins: Array2::zeros((0, 3)),
            ff: None,
            warnings: Vec::new(),
            builder_error: None,
        }
    }
}

impl MagSpecies {
    /// Create a species with no unit cell configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a species from selected sites of a crystal structure
    ///
    /// Repeated indices are dropped, keeping the first occurrence.
    pub fn from_crystal(structure: CrystalStructure, struc_idxs: Vec<usize>) -> Self {
        Self {
            source: Some(SpeciesSource::Crystal {
                structure,
                struc_idxs: dedup_indices(struc_idxs),
                basis_vecs: Vec::new(),
            }),
            ..Self::default()
        }
    }

    /// Create a species from an explicit lattice and fractional bases
    pub fn from_lattice(
        lattice: Lattice,
        atom_basis: Vec<Vector3D>,
        spin_basis: Vec<ComplexVector3D>,
    ) -> Self {
        Self {
            source: Some(SpeciesSource::Lattice {
                lattice,
                atom_basis,
                spin_basis,
            }),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_kvecs(mut self, kvecs: Vec<Vector3D>) -> Self {
        self.kvecs = kvecs;
        self
    }

    /// Set the basis vectors of a crystal-derived species (builder form)
    ///
    /// Explicit-lattice species keep their moments in the spin basis; the
    /// conflict is held and reported by the next generation call.
    pub fn with_basis_vecs(mut self, basis_vecs: Vec<ComplexVector3D>) -> Self {
        if let Err(MagneticError::Configuration(message)) = self.set_basis_vecs(basis_vecs) {
            self.builder_error = Some(message);
        }
        self
    }

    pub fn with_origin(mut self, origin: Vector3D) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_rmax(mut self, rmax: f64) -> Self {
        self.rmax = rmax;
        self
    }

    pub fn with_ff_key(mut self, key: &str) -> Self {
        self.ff_key = Some(key.to_string());
        self
    }

    pub fn with_g_factor(mut self, g_factor: f64) -> Self {
        self.g_factor = g_factor;
        self
    }

    pub fn with_corr_length(mut self, corr_length: f64) -> Self {
        self.corr_length = corr_length;
        self
    }

    /// The label, if one has been set or assigned
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn set_label(&mut self, label: &str) {
        self.label = Some(label.to_string());
    }

    pub fn source(&self) -> Option<&SpeciesSource> {
        self.source.as_ref()
    }

    /// Propagation vectors in reciprocal lattice units
    pub fn kvecs(&self) -> &[Vector3D] {
        &self.kvecs
    }

    pub fn set_kvecs(&mut self, kvecs: Vec<Vector3D>) {
        self.kvecs = kvecs;
    }

    /// Replace the basis vectors of a crystal-derived species
    pub fn set_basis_vecs(&mut self, new_basis: Vec<ComplexVector3D>) -> Result<()> {
        let label = self.display_label().to_string();
        match &mut self.source {
            Some(SpeciesSource::Crystal { basis_vecs, .. }) => {
                *basis_vecs = new_basis;
                Ok(())
            }
            _ => Err(MagneticError::Configuration(format!(
                "species {} is not crystal-derived; set its spin basis instead",
                label
            ))),
        }
    }

    /// Replace the per-site moments of an explicit-lattice species
    pub fn set_spin_basis(&mut self, new_basis: Vec<ComplexVector3D>) -> Result<()> {
        let label = self.display_label().to_string();
        match &mut self.source {
            Some(SpeciesSource::Lattice { spin_basis, .. }) => {
                *spin_basis = new_basis;
                Ok(())
            }
            _ => Err(MagneticError::Configuration(format!(
                "species {} has no explicit lattice; set its basis vectors instead",
                label
            ))),
        }
    }

    /// Replace the selected sites of a crystal-derived species
    pub fn set_struc_idxs(&mut self, idxs: Vec<usize>) -> Result<()> {
        let label = self.display_label().to_string();
        match &mut self.source {
            Some(SpeciesSource::Crystal { struc_idxs, .. }) => {
                *struc_idxs = dedup_indices(idxs);
                Ok(())
            }
            _ => Err(MagneticError::Configuration(format!(
                "species {} is not crystal-derived",
                label
            ))),
        }
    }

    /// Centre of the generation sphere (Cartesian, Å)
    pub fn origin(&self) -> Vector3D {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Vector3D) {
        self.origin = origin;
    }

    /// Generation radius in Å
    pub fn rmax(&self) -> f64 {
        self.rmax
    }

    pub fn set_rmax(&mut self, rmax: f64) -> Result<()> {
        validate_radius(rmax)?;
        self.rmax = rmax;
        Ok(())
    }

    pub fn ff_key(&self) -> Option<&str> {
        self.ff_key.as_deref()
    }

    pub fn set_ff_key(&mut self, key: Option<&str>) {
        self.ff_key = key.map(str::to_string);
        self.ff = None;
    }

    pub fn g_factor(&self) -> f64 {
        self.g_factor
    }

    pub fn set_g_factor(&mut self, g_factor: f64) {
        self.g_factor = g_factor;
    }

    /// Spin correlation length in Å (infinite when disabled)
    pub fn corr_length(&self) -> f64 {
        self.corr_length
    }

    pub fn set_corr_length(&mut self, corr_length: f64) -> Result<()> {
        validate_corr_length(corr_length)?;
        self.corr_length = corr_length;
        Ok(())
    }

    /// Generated positions, N×3 in Å
    pub fn atoms(&self) -> ArrayView2<'_, f64> {
        self.atoms.view()
    }

    /// Generated spins, N×3, index-aligned with [`atoms`](Self::atoms)
    pub fn spins(&self) -> ArrayView2<'_, f64> {
        self.spins.view()
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.nrows()
    }

    /// Form factor sampled on the grid passed to [`make_ff`](Self::make_ff)
    pub fn ff(&self) -> Option<&[f64]> {
        self.ff.as_deref()
    }

    /// Warnings from the last spin generation
    pub fn warnings(&self) -> &[MagneticWarning] {
        &self.warnings
    }

    /// Index of the generated atom closest to the origin
    pub fn representative_index(&self) -> Option<usize> {
        self.generated
            .as_ref()
            .and_then(|generated| generated.closest_to(&self.origin))
    }

    /// Generate all atom positions within `rmax` of the origin
    ///
    /// Spins are reset to zero until [`make_spins`](Self::make_spins) runs.
    pub fn make_atoms(&mut self) -> Result<()> {
        validate_radius(self.rmax)?;
        let cell = self.magnetic_cell()?;
        let generated = generate_atoms(&cell.lattice, &cell.sites, &self.origin, self.rmax);
        debug!(
            "species {}: generated {} atoms within {} Å",
            self.display_label(),
            generated.len(),
            self.rmax
        );

        self.atoms = vectors_to_array(&generated.cartesian);
        self.spins = Array2::zeros((generated.len(), 3));
        self.generated = Some(generated);
        self.warnings.clear();
        Ok(())
    }

    /// Evaluate the spins of the generated atoms from the current basis
    pub fn make_spins(&mut self) -> Result<()> {
        let Some(generated) = self.generated.as_ref() else {
            return Err(MagneticError::Order(format!(
                "make_atoms must run before make_spins for species {}",
                self.display_label()
            )));
        };
        let cell = self.magnetic_cell()?;
        if cell.sites.len() != generated.num_sites {
            return Err(MagneticError::Order(format!(
                "basis of species {} changed since make_atoms; regenerate atoms first",
                self.display_label()
            )));
        }

        let origin_frac = cell.lattice.cart_to_frac(&self.origin);
        let (spins, max_imaginary) = generate_spins(generated, &cell.modes, &origin_frac);

        let scale = spins.iter().map(Vector3D::length).fold(1.0_f64, f64::max);
        self.warnings.clear();
        if max_imaginary > IMAGINARY_SPIN_TOLERANCE * scale {
            let warning = MagneticWarning::NonRealSpin {
                species: self.display_label().to_string(),
                max_imaginary,
            };
            warn!("{}", warning);
            self.warnings.push(warning);
        }

        self.spins = vectors_to_array(&spins);
        Ok(())
    }

    /// Sample this species' form factor on `q`
    pub fn make_ff(&mut self, q: &[f64]) -> Result<()> {
        self.ff = Some(form_factor::evaluate_on_grid(self.ff_key.as_deref(), q)?);
        Ok(())
    }

    /// Generate atoms, spins and form factor in one call
    pub fn make_all(&mut self, q: &[f64]) -> Result<()> {
        self.make_atoms()?;
        self.make_spins()?;
        self.make_ff(q)
    }

    /// Rotate every generated spin about `axis` by `angle` radians
    pub fn rotate_spins(&mut self, axis: &Vector3D, angle: f64) {
        rotate_rows(&mut self.spins, axis, angle);
    }

    fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(UNLABELLED)
    }

    fn magnetic_cell(&self) -> Result<MagneticCell> {
        if let Some(message) = &self.builder_error {
            return Err(MagneticError::Configuration(message.clone()));
        }
        let kvecs = if self.kvecs.is_empty() {
            vec![Vector3D::origin()]
        } else {
            self.kvecs.clone()
        };

        match &self.source {
            None => Err(MagneticError::Configuration(format!(
                "species {} has neither a crystal structure nor a lattice and basis",
                self.display_label()
            ))),
            Some(SpeciesSource::Crystal {
                structure,
                struc_idxs,
                basis_vecs,
            }) => {
                if struc_idxs.is_empty() {
                    return Err(MagneticError::Configuration(format!(
                        "species {} selects no sites of its crystal structure",
                        self.display_label()
                    )));
                }
                if kvecs.len() != basis_vecs.len() {
                    return Err(MagneticError::Configuration(format!(
                        "species {} has {} propagation vectors but {} basis vectors",
                        self.display_label(),
                        kvecs.len(),
                        basis_vecs.len()
                    )));
                }
                let sites = struc_idxs
                    .iter()
                    .map(|&idx| {
                        structure.site(idx).map(|site| site.fractional).ok_or_else(|| {
                            MagneticError::Configuration(format!(
                                "site index {} is out of range for a structure with {} sites",
                                idx,
                                structure.num_sites()
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let modes = kvecs
                    .iter()
                    .zip(basis_vecs.iter())
                    .map(|(kvec, basis)| PropagationMode {
                        kvec: *kvec,
                        amplitudes: vec![*basis; sites.len()],
                    })
                    .collect();
                Ok(MagneticCell {
                    lattice: *structure.lattice(),
                    sites,
                    modes,
                })
            }
            Some(SpeciesSource::Lattice {
                lattice,
                atom_basis,
                spin_basis,
            }) => {
                if atom_basis.is_empty() {
                    return Err(MagneticError::Configuration(format!(
                        "species {} has an empty atom basis",
                        self.display_label()
                    )));
                }
                if atom_basis.len() != spin_basis.len() {
                    return Err(MagneticError::Configuration(format!(
                        "species {} has {} basis atoms but {} basis spins",
                        self.display_label(),
                        atom_basis.len(),
                        spin_basis.len()
                    )));
                }
                let modes = kvecs
                    .into_iter()
                    .map(|kvec| PropagationMode {
                        kvec,
                        amplitudes: spin_basis.clone(),
                    })
                    .collect();
                Ok(MagneticCell {
                    lattice: *lattice,
                    sites: atom_basis.clone(),
                    modes,
                })
            }
        }
    }
}

fn dedup_indices(idxs: Vec<usize>) -> Vec<usize> {
    let mut unique = Vec::with_capacity(idxs.len());
    for idx in idxs {
        if unique.contains(&idx) {
            warn!("site index {} selected more than once; keeping one copy", idx);
        } else {
            unique.push(idx);
        }
    }
    unique
}

pub(crate) fn validate_radius(rmax: f64) -> Result<()> {
    if rmax < 0.0 || rmax.is_nan() {
        return Err(MagneticError::InvalidRange(format!(
            "generation radius must be non-negative, got {}",
            rmax
        )));
    }
    Ok(())
}

pub(crate) fn validate_corr_length(corr_length: f64) -> Result<()> {
    if corr_length <= 0.0 || corr_length.is_nan() {
        return Err(MagneticError::InvalidRange(format!(
            "correlation length must be positive, got {}",
            corr_length
        )));
    }
    Ok(())
}

pub(crate) fn vectors_to_array(vectors: &[Vector3D]) -> Array2<f64> {
    let mut array = Array2::zeros((vectors.len(), 3));
    for (mut row, v) in array.rows_mut().into_iter().zip(vectors.iter()) {
        row[0] = v.x;
        row[1] = v.y;
        row[2] = v.z;
    }
    array
}

pub(crate) fn rotate_rows(array: &mut Array2<f64>, axis: &Vector3D, angle: f64) {
    for mut row in array.rows_mut() {
        let rotated = Vector3D::new(row[0], row[1], row[2]).rotate(axis, angle);
        row[0] = rotated.x;
        row[1] = rotated.y;
        row[2] = rotated.z;
    }
}
