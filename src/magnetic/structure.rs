/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Magnetic structure: the aggregate of one or more magnetic species
//!
//! Owns the unified N×3 atom and spin arrays, per-atom g-factors and
//! correlation lengths, the averaged form factor and the calculation-index
//! set used by the mPDF calculator.

use super::errors::{MagneticError, MagneticWarning, Result};
use super::form_factor;
use super::species::{rotate_rows, validate_corr_length, vectors_to_array, MagSpecies};
use crate::atoms::Vector3D;
use crate::utils::constants::{DEFAULT_G_FACTOR, DEFAULT_UISO};
use log::{debug, warn};
use ndarray::{concatenate, Array2, ArrayView2, ArrayViewMut2, Axis};

/// A collection of magnetic species and the arrays generated from them
#[derive(Debug, Clone)]
pub struct MagStructure {
    species: Vec<MagSpecies>,
    atoms: Array2<f64>,
    spins: Array2<f64>,
    g_factors: Vec<f64>,
    corr_lengths: Vec<f64>,
    atom_species: Vec<usize>,
    uiso: f64,
    ff_key: Option<String>,
    q: Vec<f64>,
    ff: Vec<f64>,
    calc_idxs: Vec<usize>,
    custom_calc_idxs: bool,
    atoms_made: bool,
    warnings: Vec<MagneticWarning>,
}

impl Default for MagStructure {
    fn default() -> Self {
        Self::new()
    }
}

impl MagStructure {
    /// Create an empty structure
    pub fn new() -> Self {
        Self {
            species: Vec::new(),
            atoms: Array2::zeros((0, 3)),
            spins: Array2::zeros((0, 3)),
            g_factors: Vec::new(),
            corr_lengths: Vec::new(),
            atom_species: Vec::new(),
            uiso: DEFAULT_UISO,
            ff_key: None,
            q: Vec::new(),
            ff: Vec::new(),
            calc_idxs: Vec::new(),
            custom_calc_idxs: false,
            atoms_made: false,
            warnings: Vec::new(),
        }
    }

    /// Build a species-less structure directly from N×3 atom and spin arrays
    ///
    /// Every atom takes part in the calculation-index set.
    pub fn from_arrays(atoms: Array2<f64>, spins: Array2<f64>) -> Result<Self> {
        if atoms.ncols() != 3 || spins.ncols() != 3 {
            return Err(MagneticError::ShapeMismatch(format!(
                "atoms and spins must be N×3, got {:?} and {:?}",
                atoms.dim(),
                spins.dim()
            )));
        }
        if atoms.nrows() != spins.nrows() {
            return Err(MagneticError::ShapeMismatch(format!(
                "{} atoms but {} spins",
                atoms.nrows(),
                spins.nrows()
            )));
        }
        let n = atoms.nrows();
        Ok(Self {
            atoms,
            spins,
            g_factors: vec![DEFAULT_G_FACTOR; n],
            corr_lengths: vec![f64::INFINITY; n],
            calc_idxs: (0..n).collect(),
            atoms_made: true,
            ..Self::new()
        })
    }

    /// Convenience wrapper around [`from_arrays`](Self::from_arrays)
    pub fn from_vectors(atoms: &[Vector3D], spins: &[Vector3D]) -> Result<Self> {
        Self::from_arrays(vectors_to_array(atoms), vectors_to_array(spins))
    }

    /// Append a species; an unlabelled species gets a unique label
    ///
    /// Loading invalidates the arrays until [`make_atoms`](Self::make_atoms)
    /// runs again.
    pub fn load_species(&mut self, mut species: MagSpecies) -> Result<()> {
        match species.label() {
            Some(label) if self.species_index(label).is_some() => {
                return Err(MagneticError::DuplicateLabel(label.to_string()));
            }
            Some(_) => {}
            None => {
                let label = self.next_auto_label();
                species.set_label(&label);
            }
        }
        self.species.push(species);
        self.atoms_made = false;
        Ok(())
    }

    /// Remove and return the species with `label`
    pub fn remove_species(&mut self, label: &str) -> Result<MagSpecies> {
        let idx = self
            .species_index(label)
            .ok_or_else(|| MagneticError::UnknownSpecies(label.to_string()))?;
        self.atoms_made = false;
        Ok(self.species.remove(idx))
    }

    pub fn species(&self, label: &str) -> Option<&MagSpecies> {
        self.species_index(label).map(|idx| &self.species[idx])
    }

    /// Mutable access to a species; regenerate the arrays afterwards for
    /// the change to reach the calculator
    pub fn species_mut(&mut self, label: &str) -> Option<&mut MagSpecies> {
        self.species_index(label).map(move |idx| &mut self.species[idx])
    }

    /// Labels in load order
    pub fn species_labels(&self) -> Vec<&str> {
        self.species.iter().filter_map(MagSpecies::label).collect()
    }

    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    /// Generate every species' atoms and concatenate them in load order
    ///
    /// Spins are zeroed; a structure built from arrays keeps its arrays.
    pub fn make_atoms(&mut self) -> Result<()> {
        if self.species.is_empty() {
            debug!("structure has no species; keeping {} existing atoms", self.num_atoms());
            self.atoms_made = true;
            return Ok(());
        }

        let mut g_factors = Vec::new();
        let mut corr_lengths = Vec::new();
        let mut atom_species = Vec::new();
        let mut representatives = Vec::new();
        for (index, species) in self.species.iter_mut().enumerate() {
            species.make_atoms()?;
            if let Some(rep) = species.representative_index() {
                representatives.push(g_factors.len() + rep);
            }
            g_factors.extend(std::iter::repeat(species.g_factor()).take(species.num_atoms()));
            corr_lengths.extend(std::iter::repeat(species.corr_length()).take(species.num_atoms()));
            atom_species.extend(std::iter::repeat(index).take(species.num_atoms()));
        }

        self.atoms = stack_rows(self.species.iter().map(MagSpecies::atoms).collect())?;
        self.spins = Array2::zeros(self.atoms.dim());
        self.g_factors = g_factors;
        self.corr_lengths = corr_lengths;
        self.atom_species = atom_species;
        self.warnings.clear();
        self.atoms_made = true;

        let n = self.num_atoms();
        if self.custom_calc_idxs && self.calc_idxs.iter().all(|&idx| idx < n) {
            debug!("keeping {} user-selected calculation indices", self.calc_idxs.len());
        } else {
            if self.custom_calc_idxs {
                warn!("calculation indices no longer fit {} atoms; using species representatives", n);
            }
            self.custom_calc_idxs = false;
            self.calc_idxs = sorted_unique(representatives);
        }
        debug!("structure now holds {} atoms from {} species", n, self.species.len());
        Ok(())
    }

    /// Evaluate every species' spins and concatenate them in load order
    pub fn make_spins(&mut self) -> Result<()> {
        if !self.atoms_made {
            return Err(MagneticError::Order(
                "make_atoms must run before make_spins".to_string(),
            ));
        }
        if self.species.is_empty() {
            return Ok(());
        }

        for species in self.species.iter_mut() {
            species.make_spins()?;
        }
        let spins = stack_rows(self.species.iter().map(MagSpecies::spins).collect())?;
        if spins.dim() != self.atoms.dim() {
            return Err(MagneticError::ShapeMismatch(format!(
                "species now generate {} spins for {} atoms; call make_atoms again",
                spins.nrows(),
                self.atoms.nrows()
            )));
        }
        // write in place so the arrays keep their allocation
        self.spins.assign(&spins);
        self.warnings = self
            .species
            .iter()
            .flat_map(|species| species.warnings().iter().cloned())
            .collect();
        Ok(())
    }

    /// Sample the form factor on the default q grid
    ///
    /// The structure form factor is the atom-count weighted mean of the
    /// species' form factors.
    pub fn make_ff(&mut self) -> Result<()> {
        let q = form_factor::default_q_grid();
        let ff = if self.species.is_empty() {
            form_factor::evaluate_on_grid(self.ff_key.as_deref(), &q)?
        } else {
            let mut total = vec![0.0; q.len()];
            let mut weight_sum = 0.0;
            for species in self.species.iter_mut() {
                species.make_ff(&q)?;
                // species with no atoms yet still count once so the mean is defined
                let weight = species.num_atoms().max(1) as f64;
                if let Some(values) = species.ff() {
                    for (t, v) in total.iter_mut().zip(values) {
                        *t += weight * v;
                    }
                }
                weight_sum += weight;
            }
            total.iter().map(|t| t / weight_sum).collect()
        };
        self.q = q;
        self.ff = ff;
        Ok(())
    }

    /// Run [`make_atoms`](Self::make_atoms), [`make_spins`](Self::make_spins)
    /// and [`make_ff`](Self::make_ff)
    pub fn make_all(&mut self) -> Result<()> {
        self.make_atoms()?;
        self.make_spins()?;
        self.make_ff()
    }

    /// Deep copy; the copy shares no state with `self`
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.nrows()
    }

    /// Atom positions, N×3 in Å
    pub fn atoms(&self) -> ArrayView2<'_, f64> {
        self.atoms.view()
    }

    /// Spins, N×3, index-aligned with the atoms
    pub fn spins(&self) -> ArrayView2<'_, f64> {
        self.spins.view()
    }

    /// Mutable spins; the atom count cannot change through this view
    pub fn spins_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.spins.view_mut()
    }

    pub fn set_spin(&mut self, index: usize, spin: Vector3D) -> Result<()> {
        let n = self.num_atoms();
        if index >= n {
            return Err(MagneticError::InvalidRange(format!(
                "spin index {} out of range for {} atoms",
                index, n
            )));
        }
        let mut row = self.spins.row_mut(index);
        row[0] = spin.x;
        row[1] = spin.y;
        row[2] = spin.z;
        Ok(())
    }

    /// Rotate every spin about `axis` by `angle` radians
    pub fn rotate_spins(&mut self, axis: &Vector3D, angle: f64) {
        rotate_rows(&mut self.spins, axis, angle);
    }

    /// Per-atom g-factors
    pub fn g_factors(&self) -> &[f64] {
        &self.g_factors
    }

    /// Per-atom correlation lengths in Å (infinite when disabled)
    pub fn corr_lengths(&self) -> &[f64] {
        &self.corr_lengths
    }

    /// Label of the species that generated atom `index`
    ///
    /// None for structures built from arrays or before generation.
    pub fn species_of_atom(&self, index: usize) -> Option<&str> {
        self.atom_species
            .get(index)
            .and_then(|&species| self.species.get(species))
            .and_then(MagSpecies::label)
    }

    /// Set one correlation length for every atom and species
    pub fn set_corr_length(&mut self, corr_length: f64) -> Result<()> {
        validate_corr_length(corr_length)?;
        for species in self.species.iter_mut() {
            species.set_corr_length(corr_length)?;
        }
        self.corr_lengths.iter_mut().for_each(|xi| *xi = corr_length);
        Ok(())
    }

    /// Set the correlation length of one species' atoms
    pub fn set_species_corr_length(&mut self, label: &str, corr_length: f64) -> Result<()> {
        let idx = self
            .species_index(label)
            .ok_or_else(|| MagneticError::UnknownSpecies(label.to_string()))?;
        self.species[idx].set_corr_length(corr_length)?;

        if self.atoms_made {
            let start: usize = self.species[..idx].iter().map(MagSpecies::num_atoms).sum();
            let end = start + self.species[idx].num_atoms();
            if end <= self.corr_lengths.len() {
                self.corr_lengths[start..end].iter_mut().for_each(|xi| *xi = corr_length);
            }
        }
        Ok(())
    }

    /// Isotropic displacement parameter in Å²
    pub fn uiso(&self) -> f64 {
        self.uiso
    }

    pub fn set_uiso(&mut self, uiso: f64) -> Result<()> {
        if uiso < 0.0 || uiso.is_nan() {
            return Err(MagneticError::InvalidRange(format!(
                "Uiso must be non-negative, got {}",
                uiso
            )));
        }
        self.uiso = uiso;
        Ok(())
    }

    /// Form factor key used when the structure has no species
    pub fn set_ff_key(&mut self, key: Option<&str>) {
        self.ff_key = key.map(str::to_string);
    }

    /// Momentum-transfer grid of the form factor (empty before `make_ff`)
    pub fn q(&self) -> &[f64] {
        &self.q
    }

    /// Form factor on [`q`](Self::q)
    pub fn ff(&self) -> &[f64] {
        &self.ff
    }

    /// Sorted, duplicate-free indices of the atoms the calculator centres on
    pub fn calc_idxs(&self) -> &[usize] {
        &self.calc_idxs
    }

    /// Choose the calculation-index set explicitly
    pub fn set_calc_idxs(&mut self, idxs: Vec<usize>) -> Result<()> {
        let n = self.num_atoms();
        if let Some(bad) = idxs.iter().find(|&&idx| idx >= n) {
            return Err(MagneticError::InvalidRange(format!(
                "calculation index {} out of range for {} atoms",
                bad, n
            )));
        }
        if idxs.is_empty() {
            return Err(MagneticError::Configuration(
                "calculation-index set must not be empty".to_string(),
            ));
        }
        self.calc_idxs = sorted_unique(idxs);
        self.custom_calc_idxs = true;
        Ok(())
    }

    /// Centre the calculation on every atom
    pub fn use_all_atoms_for_calc(&mut self) {
        self.calc_idxs = (0..self.num_atoms()).collect();
        self.custom_calc_idxs = true;
    }

    /// Warnings from the last spin generation of every species
    pub fn warnings(&self) -> &[MagneticWarning] {
        &self.warnings
    }

    fn species_index(&self, label: &str) -> Option<usize> {
        self.species
            .iter()
            .position(|species| species.label() == Some(label))
    }

    fn next_auto_label(&self) -> String {
        (1..)
            .map(|n| format!("species_{}", n))
            .find(|label| self.species_index(label).is_none())
            .unwrap_or_default()
    }
}

fn stack_rows(views: Vec<ArrayView2<'_, f64>>) -> Result<Array2<f64>> {
    if views.is_empty() {
        return Ok(Array2::zeros((0, 3)));
    }
    concatenate(Axis(0), &views).map_err(|err| MagneticError::ShapeMismatch(err.to_string()))
}

fn sorted_unique(mut idxs: Vec<usize>) -> Vec<usize> {
    idxs.sort_unstable();
    idxs.dedup();
    idxs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{ComplexVector3D, Lattice};
    use approx::assert_relative_eq;

    fn ferromagnet(label: Option<&str>, rmax: f64) -> MagSpecies {
        let species = MagSpecies::from_lattice(
            Lattice::cubic(3.0).unwrap(),
            vec![Vector3D::origin()],
            vec![ComplexVector3D::from_real(Vector3D::new(0.0, 0.0, 1.0))],
        )
        .with_rmax(rmax);
        match label {
            Some(label) => species.with_label(label),
            None => species,
        }
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut structure = MagStructure::new();
        structure.load_species(ferromagnet(Some("Fe"), 3.0)).unwrap();
        assert!(matches!(
            structure.load_species(ferromagnet(Some("Fe"), 3.0)),
            Err(MagneticError::DuplicateLabel(label)) if label == "Fe"
        ));
    }

    #[test]
    fn test_auto_labels_are_unique() {
        let mut structure = MagStructure::new();
        structure.load_species(ferromagnet(Some("species_1"), 3.0)).unwrap();
        structure.load_species(ferromagnet(None, 3.0)).unwrap();
        structure.load_species(ferromagnet(None, 3.0)).unwrap();
        assert_eq!(
            structure.species_labels(),
            vec!["species_1", "species_2", "species_3"]
        );
    }

    #[test]
    fn test_spins_before_atoms_is_an_order_error() {
        let mut structure = MagStructure::new();
        structure.load_species(ferromagnet(None, 3.0)).unwrap();
        assert!(matches!(structure.make_spins(), Err(MagneticError::Order(_))));
    }

    #[test]
    fn test_make_all_concatenates_species() {
        let mut structure = MagStructure::new();
        structure.load_species(ferromagnet(Some("a"), 3.0)).unwrap();
        structure
            .load_species(ferromagnet(Some("b"), 3.0).with_origin(Vector3D::new(1.5, 0.0, 0.0)))
            .unwrap();
        structure.make_all().unwrap();

        let n_a = structure.species("a").unwrap().num_atoms();
        let n_b = structure.species("b").unwrap().num_atoms();
        assert_eq!(structure.num_atoms(), n_a + n_b);
        assert_eq!(structure.spins().dim(), structure.atoms().dim());
        assert_eq!(structure.g_factors().len(), structure.num_atoms());
        assert_eq!(structure.calc_idxs().len(), 2);
        assert_eq!(structure.q().len(), structure.ff().len());
        assert!(structure.ff().iter().all(|&v| v == 1.0));
        assert_eq!(structure.species_of_atom(0), Some("a"));
        assert_eq!(structure.species_of_atom(n_a), Some("b"));
        assert_eq!(structure.species_of_atom(n_a + n_b), None);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut structure = MagStructure::new();
        structure.load_species(ferromagnet(Some("a"), 3.0)).unwrap();
        structure.make_all().unwrap();

        let mut copy = structure.copy();
        copy.set_spin(0, Vector3D::new(1.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(structure.spins()[[0, 2]], 1.0);
        assert_relative_eq!(copy.spins()[[0, 0]], 1.0);
    }

    #[test]
    fn test_from_arrays_shape_checks() {
        let atoms = Array2::zeros((2, 3));
        assert!(MagStructure::from_arrays(atoms.clone(), Array2::zeros((3, 3))).is_err());
        assert!(MagStructure::from_arrays(atoms.clone(), Array2::zeros((2, 2))).is_err());
        let structure = MagStructure::from_arrays(atoms, Array2::zeros((2, 3))).unwrap();
        assert_eq!(structure.calc_idxs(), &[0, 1]);
    }

    #[test]
    fn test_calc_idxs_are_deduplicated_and_checked() {
        let mut structure = MagStructure::from_vectors(
            &[Vector3D::origin(), Vector3D::new(1.0, 0.0, 0.0)],
            &[Vector3D::new(0.0, 0.0, 1.0), Vector3D::new(0.0, 0.0, 1.0)],
        )
        .unwrap();
        structure.set_calc_idxs(vec![1, 0, 1]).unwrap();
        assert_eq!(structure.calc_idxs(), &[0, 1]);
        assert!(structure.set_calc_idxs(vec![2]).is_err());
        assert!(structure.set_calc_idxs(vec![]).is_err());
    }

    #[test]
    fn test_uiso_and_corr_length_validation() {
        let mut structure = MagStructure::new();
        assert!(structure.set_uiso(-0.1).is_err());
        assert!(structure.set_corr_length(0.0).is_err());
        assert!(structure.set_corr_length(f64::INFINITY).is_ok());
    }

    #[test]
    fn test_species_corr_length_updates_only_its_atoms() {
        let mut structure = MagStructure::new();
        structure.load_species(ferromagnet(Some("a"), 3.0)).unwrap();
        structure.load_species(ferromagnet(Some("b"), 3.0)).unwrap();
        structure.make_all().unwrap();
        structure.set_species_corr_length("b", 5.0).unwrap();

        let n_a = structure.species("a").unwrap().num_atoms();
        assert!(structure.corr_lengths()[..n_a].iter().all(|xi| xi.is_infinite()));
        assert!(structure.corr_lengths()[n_a..].iter().all(|&xi| xi == 5.0));
        assert!(structure.set_species_corr_length("c", 5.0).is_err());
    }

    #[test]
    fn test_remake_after_basis_change_keeps_shape() {
        let mut structure = MagStructure::new();
        structure.load_species(ferromagnet(Some("a"), 6.0)).unwrap();
        structure.make_all().unwrap();
        let n = structure.num_atoms();

        structure
            .species_mut("a")
            .unwrap()
            .set_spin_basis(vec![ComplexVector3D::from_real(Vector3D::new(1.0, 0.0, 0.0))])
            .unwrap();
        structure.make_spins().unwrap();

        assert_eq!(structure.num_atoms(), n);
        assert_relative_eq!(structure.spins()[[0, 0]], 1.0);
        assert_relative_eq!(structure.spins()[[0, 2]], 0.0);
    }
}
