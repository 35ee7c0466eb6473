/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Crystal lattice: lattice vectors and fractional/Cartesian conversion

use super::errors::{AtomError, Result};
use super::vector::Vector3D;
use serde::{Deserialize, Serialize};

/// Volumes below this are treated as a degenerate (flat) cell
const MIN_CELL_VOLUME: f64 = 1e-10;

/// A crystal lattice described by its three lattice vectors (Cartesian, Å)
///
/// Rows of `matrix` are the a, b and c vectors, so a fractional position
/// (u, v, w) maps to u·a + v·b + w·c.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// Build a lattice from cell lengths (Å) and angles (degrees)
    ///
    /// The a vector lies along x and b lies in the xy-plane.
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
        if a <= 0.0 || b <= 0.0 || c <= 0.0 {
            return Err(AtomError::InvalidLattice(format!(
                "cell lengths must be positive, got ({}, {}, {})",
                a, b, c
            )));
        }
        for angle in [alpha, beta, gamma] {
            if angle <= 0.0 || angle >= 180.0 {
                return Err(AtomError::InvalidLattice(format!(
                    "cell angle {} is outside (0, 180) degrees",
                    angle
                )));
            }
        }

        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let a_vec = [a, 0.0, 0.0];
        let b_vec = [b * cos_gamma, b * sin_gamma, 0.0];

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3_sq = c * c - c1 * c1 - c2 * c2;
        if c3_sq <= 0.0 {
            return Err(AtomError::InvalidLattice(format!(
                "angles ({}, {}, {}) do not describe a valid cell",
                alpha, beta, gamma
            )));
        }

        Self::from_vectors([a_vec, b_vec, [c1, c2, c3_sq.sqrt()]])
    }

    /// Build a lattice from explicit lattice vectors (rows a, b, c)
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Result<Self> {
        let lattice = Self { matrix };
        if lattice.volume().abs() < MIN_CELL_VOLUME {
            return Err(AtomError::InvalidLattice(
                "lattice vectors are linearly dependent".to_string(),
            ));
        }
        Ok(lattice)
    }

    /// Simple cubic lattice with edge `a`
    pub fn cubic(a: f64) -> Result<Self> {
        Self::from_parameters(a, a, a, 90.0, 90.0, 90.0)
    }

    /// The lattice vectors as rows
    pub fn matrix(&self) -> &[[f64; 3]; 3] {
        &self.matrix
    }

    /// Lattice vector `i` (0 = a, 1 = b, 2 = c)
    pub fn vector(&self, i: usize) -> Vector3D {
        Vector3D::from_array(self.matrix[i])
    }

    /// Cell parameters (a, b, c, alpha, beta, gamma) with angles in degrees
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let (va, vb, vc) = (self.vector(0), self.vector(1), self.vector(2));
        let (a, b, c) = (va.length(), vb.length(), vc.length());

        let alpha = (vb.dot(&vc) / (b * c)).clamp(-1.0, 1.0).acos().to_degrees();
        let beta = (va.dot(&vc) / (a * c)).clamp(-1.0, 1.0).acos().to_degrees();
        let gamma = (va.dot(&vb) / (a * b)).clamp(-1.0, 1.0).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// Signed cell volume a·(b×c)
    pub fn volume(&self) -> f64 {
        self.vector(0).dot(&self.vector(1).cross(&self.vector(2)))
    }

    /// Convert fractional coordinates to Cartesian (Å)
    pub fn frac_to_cart(&self, frac: &Vector3D) -> Vector3D {
        self.vector(0).scale(frac.x) + self.vector(1).scale(frac.y) + self.vector(2).scale(frac.z)
    }

    /// Convert Cartesian coordinates (Å) to fractional
    pub fn cart_to_frac(&self, cart: &Vector3D) -> Vector3D {
        // rows of the inverse are the reciprocal vectors (without 2π)
        let [ra, rb, rc] = self.reciprocal_vectors();
        Vector3D::new(ra.dot(cart), rb.dot(cart), rc.dot(cart))
    }

    /// Reciprocal lattice vectors without the 2π factor, so that
    /// a_i · b*_j = δ_ij
    pub fn reciprocal_vectors(&self) -> [Vector3D; 3] {
        let (va, vb, vc) = (self.vector(0), self.vector(1), self.vector(2));
        let volume = self.volume();
        [
            vb.cross(&vc).scale(1.0 / volume),
            vc.cross(&va).scale(1.0 / volume),
            va.cross(&vb).scale(1.0 / volume),
        ]
    }

    /// Distances between adjacent lattice planes along each cell axis
    ///
    /// A sphere of radius R is covered by |n_i| <= ceil(R / d_i) translations.
    pub fn plane_spacings(&self) -> [f64; 3] {
        let [ra, rb, rc] = self.reciprocal_vectors();
        [1.0 / ra.length(), 1.0 / rb.length(), 1.0 / rc.length()]
    }
}
