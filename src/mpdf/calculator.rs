/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! mPDF calculator
//!
//! The calculator holds a shared handle to a [`MagStructure`] and reads the
//! structure's current arrays on every call, so spins changed between calls
//! are picked up without re-attaching the structure.

use super::errors::{MpdfError, Result};
use super::kernels::{
    accumulate_pairs, apply_qdamp, apply_termination, form_factor_kernel, gaussian_smear,
    half_width, pair_function, self_scattering_profile, ExtendedGrid, PairInputs,
};
use crate::atoms::Vector3D;
use crate::magnetic::{form_factor, MagStructure};
use crate::utils::constants::{DEFAULT_RSTEP, MPDF_PREFACTOR};
use crate::utils::convolve_same;
use log::{debug, warn};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A magnetic structure shared between calculators and the caller
pub type SharedStructure = Arc<RwLock<MagStructure>>;

/// Wrap a structure for sharing with one or more calculators
pub fn share(structure: MagStructure) -> SharedStructure {
    Arc::new(RwLock::new(structure))
}

/// mPDF calculation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpdfParameters {
    /// Start of the output grid in Å
    pub rmin: f64,
    /// End of the output grid in Å (must exceed `rmin`)
    pub rmax: f64,
    /// Output grid step in Å
    pub rstep: f64,
    /// Lower edge of the measured Q range in Å⁻¹
    pub qmin: f64,
    /// Upper edge of the measured Q range in Å⁻¹ (None or 0 disables the
    /// termination filter)
    pub qmax: Option<f64>,
    /// Gaussian Q-resolution damping in Å⁻¹
    pub qdamp: f64,
    /// Scale of the correlated pair term
    pub ord_scale: f64,
    /// Scale of the paramagnetic self-scattering term
    pub para_scale: f64,
    /// Gaussian peak width in Å (None derives it from the structure's Uiso)
    pub gauss_peak_width: Option<f64>,
    /// Padding below `rmin` in Å for pairs that broaden into the range
    pub extended_rmin: f64,
    /// Padding above `rmax` in Å
    pub extended_rmax: f64,
    /// Half width in Å of the real-space form-factor kernel
    pub ff_transform_rmax: f64,
}

impl Default for MpdfParameters {
    fn default() -> Self {
        Self {
            rmin: 0.0,
            rmax: 20.0,
            rstep: DEFAULT_RSTEP,
            qmin: 0.0,
            qmax: None,
            qdamp: 0.0,
            ord_scale: 1.0,
            para_scale: 1.0,
            gauss_peak_width: None,
            extended_rmin: 4.0,
            extended_rmax: 4.0,
            ff_transform_rmax: 5.0,
        }
    }
}

impl MpdfParameters {
    /// Check ranges; called at the start of every calculation
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("rmin", self.rmin),
            ("rmax", self.rmax),
            ("rstep", self.rstep),
            ("qmin", self.qmin),
            ("qdamp", self.qdamp),
            ("ord_scale", self.ord_scale),
            ("para_scale", self.para_scale),
            ("extended_rmin", self.extended_rmin),
            ("extended_rmax", self.extended_rmax),
            ("ff_transform_rmax", self.ff_transform_rmax),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(MpdfError::InvalidRange(format!("{} must be finite, got {}", name, value)));
        }
        if self.rmin < 0.0 {
            return Err(invalid(format!("rmin must be non-negative, got {}", self.rmin)));
        }
        if self.rmax <= self.rmin {
            return Err(invalid(format!(
                "rmax ({}) must be greater than rmin ({})",
                self.rmax, self.rmin
            )));
        }
        if self.rstep <= 0.0 {
            return Err(invalid(format!("rstep must be positive, got {}", self.rstep)));
        }
        if self.qmin < 0.0 || self.qdamp < 0.0 {
            return Err(invalid(format!(
                "qmin and qdamp must be non-negative, got {} and {}",
                self.qmin, self.qdamp
            )));
        }
        if let Some(qmax) = self.termination_qmax() {
            if qmax <= self.qmin {
                return Err(invalid(format!(
                    "qmax ({}) must be greater than qmin ({})",
                    qmax, self.qmin
                )));
            }
        }
        if self.extended_rmin < 0.0 || self.extended_rmax < 0.0 {
            return Err(invalid("grid padding must be non-negative".to_string()));
        }
        if let Some(width) = self.gauss_peak_width {
            if width < 0.0 || !width.is_finite() {
                return Err(invalid(format!("peak width must be non-negative, got {}", width)));
            }
        }
        if self.ff_transform_rmax <= 0.0 {
            return Err(invalid(format!(
                "ff_transform_rmax must be positive, got {}",
                self.ff_transform_rmax
            )));
        }
        Ok(())
    }

    /// The active termination cutoff, if any
    pub fn termination_qmax(&self) -> Option<f64> {
        self.qmax.filter(|&qmax| qmax > 0.0)
    }

    /// Gaussian width used for a structure with displacement parameter `uiso`
    pub fn peak_width(&self, uiso: f64) -> f64 {
        self.gauss_peak_width.unwrap_or_else(|| (2.0 * uiso).sqrt())
    }
}

fn invalid(message: String) -> MpdfError {
    MpdfError::InvalidRange(message)
}

/// Every output of one calculation on a common grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpdfProfile {
    /// Output grid in Å
    pub r: Vec<f64>,
    /// Normalized mPDF f(r)
    pub normalized: Vec<f64>,
    /// Unnormalized mPDF d(r) without the self-scattering term
    pub unnormalized: Vec<f64>,
    /// Unnormalized mPDF plus the self-scattering term
    pub total: Vec<f64>,
}

impl MpdfProfile {
    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }
}

/// Snapshot of the structure data one calculation needs
struct StructureData {
    pairs: PairInputs,
    uiso: f64,
    q: Vec<f64>,
    ff: Vec<f64>,
}

/// Calculator of normalized and unnormalized mPDFs
///
/// `Clone` shares the structure with the clone; use
/// [`deep_copy`](Self::deep_copy) for an independent calculator.
#[derive(Debug, Clone)]
pub struct MPDFCalculator {
    structure: SharedStructure,
    /// Calculation parameters
    pub params: MpdfParameters,
}

impl MPDFCalculator {
    /// Create a calculator with default parameters on a shared structure
    pub fn new(structure: SharedStructure) -> Self {
        Self::with_parameters(structure, MpdfParameters::default())
    }

    pub fn with_parameters(structure: SharedStructure, params: MpdfParameters) -> Self {
        Self { structure, params }
    }

    /// Take ownership of a structure; retrieve it again through
    /// [`structure`](Self::structure)
    pub fn from_structure(structure: MagStructure) -> Self {
        Self::new(share(structure))
    }

    /// Handle to the structure this calculator reads
    pub fn structure(&self) -> SharedStructure {
        Arc::clone(&self.structure)
    }

    pub fn set_structure(&mut self, structure: SharedStructure) {
        self.structure = structure;
    }

    /// Duplicate the calculator together with its structure
    pub fn deep_copy(&self) -> Result<Self> {
        let copy = self.read_structure(|structure| structure.copy())?;
        Ok(Self::with_parameters(share(copy), self.params.clone()))
    }

    /// The output grid `rmin, rmin + rstep, ...` up to `rmax`
    pub fn r_grid(&self) -> Result<Vec<f64>> {
        Ok(self.grid()?.inner_points())
    }

    /// Normalized mPDF f(r), scaled by `ord_scale`
    pub fn calc_normalized(&self) -> Result<Vec<f64>> {
        let grid = self.grid()?;
        let data = self.snapshot()?;
        let f = self.broadened_pair_function(&data, &grid)?;
        self.normalize(&data, &grid, &f)
    }

    /// Unnormalized mPDF d(r) of the pair term, scaled by `ord_scale`
    pub fn calc_unnormalized(&self) -> Result<Vec<f64>> {
        let grid = self.grid()?;
        let data = self.snapshot()?;
        let f = self.broadened_pair_function(&data, &grid)?;
        self.unnormalize(&data, &grid, &f)
    }

    /// Paramagnetic self-scattering term, scaled by `para_scale`
    pub fn calc_self_term(&self) -> Result<Vec<f64>> {
        let grid = self.grid()?;
        let data = self.snapshot()?;
        Ok(self.self_term(&data, &grid))
    }

    /// Normalized or unnormalized mPDF of the pair term
    pub fn calc(&self, normalized: bool) -> Result<Vec<f64>> {
        if normalized {
            self.calc_normalized()
        } else {
            self.calc_unnormalized()
        }
    }

    /// All outputs from a single pair accumulation
    pub fn calc_all(&self) -> Result<MpdfProfile> {
        let grid = self.grid()?;
        let data = self.snapshot()?;
        let f = self.broadened_pair_function(&data, &grid)?;

        let normalized = self.normalize(&data, &grid, &f)?;
        let unnormalized = self.unnormalize(&data, &grid, &f)?;
        let total = unnormalized
            .iter()
            .zip(self.self_term(&data, &grid))
            .map(|(d, s)| d + s)
            .collect();

        Ok(MpdfProfile {
            r: grid.inner_points(),
            normalized,
            unnormalized,
            total,
        })
    }

    fn grid(&self) -> Result<ExtendedGrid> {
        self.params.validate()?;
        let grid = ExtendedGrid::new(
            self.params.rmin,
            self.params.rmax,
            self.params.rstep,
            self.params.extended_rmin,
            self.params.extended_rmax,
        )?;
        debug!(
            "mPDF grid: {} output points, {} accumulated",
            grid.inner_points().len(),
            grid.len()
        );
        Ok(grid)
    }

    fn read_structure<T>(&self, read: impl FnOnce(&MagStructure) -> T) -> Result<T> {
        let structure = self
            .structure
            .read()
            .map_err(|err| MpdfError::StructureUnavailable(err.to_string()))?;
        Ok(read(&structure))
    }

    fn snapshot(&self) -> Result<StructureData> {
        let data = self.read_structure(|structure| StructureData {
            pairs: PairInputs {
                positions: rows_to_vectors(structure.atoms()),
                spins: rows_to_vectors(structure.spins()),
                g_factors: structure.g_factors().to_vec(),
                corr_lengths: structure.corr_lengths().to_vec(),
                calc_idxs: structure.calc_idxs().to_vec(),
            },
            uiso: structure.uiso(),
            q: structure.q().to_vec(),
            ff: structure.ff().to_vec(),
        })?;

        if data.pairs.positions.len() != data.pairs.spins.len()
            || data.pairs.g_factors.len() != data.pairs.positions.len()
            || data.pairs.corr_lengths.len() != data.pairs.positions.len()
        {
            return Err(MpdfError::InvalidRange(format!(
                "structure arrays disagree: {} atoms, {} spins, {} g-factors, {} correlation lengths",
                data.pairs.positions.len(),
                data.pairs.spins.len(),
                data.pairs.g_factors.len(),
                data.pairs.corr_lengths.len()
            )));
        }
        if let Some(&bad) = data.pairs.calc_idxs.iter().find(|&&i| i >= data.pairs.positions.len()) {
            return Err(MpdfError::InvalidRange(format!(
                "calculation index {} out of range for {} atoms",
                bad,
                data.pairs.positions.len()
            )));
        }

        if data.q.is_empty() {
            // make_ff has not run; fall back to a unit form factor
            let q = form_factor::default_q_grid();
            let ff = form_factor::evaluate_on_grid(None, &q)?;
            return Ok(StructureData { q, ff, ..data });
        }
        Ok(data)
    }

    /// f(r) on the padded grid, Gaussian broadened
    fn broadened_pair_function(&self, data: &StructureData, grid: &ExtendedGrid) -> Result<Vec<f64>> {
        let histograms = accumulate_pairs(&data.pairs, grid);
        let f = pair_function(&histograms, grid, data.pairs.calc_idxs.len());
        gaussian_smear(&f, grid.step(), self.params.peak_width(data.uiso))
    }

    /// Termination filter, Q damping and trimming to the output range
    fn finish(&self, values: &[f64], grid: &ExtendedGrid) -> Result<Vec<f64>> {
        let mut values = match self.params.termination_qmax() {
            Some(qmax) => apply_termination(values, grid, self.params.qmin, qmax)?,
            None => values.to_vec(),
        };
        apply_qdamp(&mut values, &grid.points(), self.params.qdamp);
        Ok(grid.trim(&values))
    }

    fn normalize(&self, data: &StructureData, grid: &ExtendedGrid, f: &[f64]) -> Result<Vec<f64>> {
        let moment = data.pairs.mean_moment_squared();
        if moment == 0.0 {
            warn!("calculation centres carry no magnetic moment; normalized mPDF is zero");
            return Ok(vec![0.0; grid.inner_points().len()]);
        }
        let scale = self.params.ord_scale / moment;
        Ok(self.finish(f, grid)?.into_iter().map(|v| v * scale).collect())
    }

    fn unnormalize(&self, data: &StructureData, grid: &ExtendedGrid, f: &[f64]) -> Result<Vec<f64>> {
        let half = half_width(self.params.ff_transform_rmax, grid.step())?;
        let kernel = form_factor_kernel(&data.q, &data.ff, grid.step(), half);
        let mut d = convolve_same(f, &kernel)?;
        d.iter_mut().for_each(|v| *v *= grid.step());

        let scale = self.params.ord_scale * MPDF_PREFACTOR;
        Ok(self.finish(&d, grid)?.into_iter().map(|v| v * scale).collect())
    }

    fn self_term(&self, data: &StructureData, grid: &ExtendedGrid) -> Vec<f64> {
        let amplitude = self.params.para_scale * MPDF_PREFACTOR * data.pairs.mean_moment_squared();
        if amplitude == 0.0 {
            return vec![0.0; grid.inner_points().len()];
        }
        self_scattering_profile(&data.q, &data.ff, &grid.inner_points())
            .into_iter()
            .map(|v| v * amplitude)
            .collect()
    }
}

fn rows_to_vectors(array: ArrayView2<'_, f64>) -> Vec<Vector3D> {
    array
        .rows()
        .into_iter()
        .map(|row| Vector3D::new(row[0], row[1], row[2]))
        .collect()
}
