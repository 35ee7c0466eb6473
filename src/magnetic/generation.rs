/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Lattice tiling and Fourier spin generation
//!
//! Atoms are generated by tiling lattice translations around an origin and
//! keeping every site within the generation radius. Spins follow from the
//! propagation vectors k and their complex basis vectors S_k:
//!
//! S(T + d) = Re Σ_k S_k exp(2πi k·(T + d − origin)),
//!
//! with k in reciprocal lattice units and positions in fractional
//! coordinates. Nothing here assumes the spin pattern repeats, so
//! incommensurate k is handled the same way as commensurate k.

use crate::atoms::{ComplexVector3D, Lattice, Vector3D};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Slack on the generation radius so sites exactly on the sphere are kept
const RADIUS_SLACK: f64 = 1e-9;

/// One propagation vector with a complex amplitude for every basis site
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationMode {
    /// Propagation vector in reciprocal lattice units
    pub kvec: Vector3D,
    /// Complex basis vector for each site of the magnetic cell
    pub amplitudes: Vec<ComplexVector3D>,
}

/// Atoms produced by tiling a magnetic cell
#[derive(Debug, Clone, Default)]
pub struct GeneratedAtoms {
    /// Cartesian positions in Å
    pub cartesian: Vec<Vector3D>,
    /// Fractional positions (translation + site)
    pub fractional: Vec<Vector3D>,
    /// Index of the basis site each atom was generated from
    pub site_index: Vec<usize>,
    /// Number of sites in the cell that was tiled
    pub num_sites: usize,
}

impl GeneratedAtoms {
    pub fn len(&self) -> usize {
        self.cartesian.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cartesian.is_empty()
    }

    /// Index of the atom closest to `origin`, lowest index on ties
    pub fn closest_to(&self, origin: &Vector3D) -> Option<usize> {
        self.cartesian
            .iter()
            .enumerate()
            .map(|(idx, pos)| (idx, pos.distance(origin)))
            .fold(None, |best: Option<(usize, f64)>, (idx, dist)| match best {
                Some((_, best_dist)) if best_dist <= dist => best,
                _ => Some((idx, dist)),
            })
            .map(|(idx, _)| idx)
    }
}

/// Tile `sites` (fractional) over lattice translations and keep every atom
/// within `radius` Å of the Cartesian `origin`
pub fn generate_atoms(
    lattice: &Lattice,
    sites: &[Vector3D],
    origin: &Vector3D,
    radius: f64,
) -> GeneratedAtoms {
    let mut generated = GeneratedAtoms {
        num_sites: sites.len(),
        ..GeneratedAtoms::default()
    };
    if sites.is_empty() {
        return generated;
    }

    let origin_frac = lattice.cart_to_frac(origin);
    let spacings = lattice.plane_spacings();
    let center = [origin_frac.x, origin_frac.y, origin_frac.z];

    // translation ranges covering the sphere for every site offset, sites
    // need not lie inside the home cell
    let bounds: Vec<(i64, i64)> = (0..3)
        .map(|axis| {
            let reach = radius / spacings[axis];
            let (lowest, highest) = sites.iter().map(|site| site_component(site, axis)).fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), value| (lo.min(value), hi.max(value)),
            );
            (
                (center[axis] - reach - highest).floor() as i64 - 1,
                (center[axis] + reach - lowest).ceil() as i64 + 1,
            )
        })
        .collect();

    for na in bounds[0].0..=bounds[0].1 {
        for nb in bounds[1].0..=bounds[1].1 {
            for nc in bounds[2].0..=bounds[2].1 {
                let translation = Vector3D::new(na as f64, nb as f64, nc as f64);
                for (site_idx, site) in sites.iter().enumerate() {
                    let frac = translation + *site;
                    let cart = lattice.frac_to_cart(&frac);
                    if cart.distance(origin) <= radius + RADIUS_SLACK {
                        generated.cartesian.push(cart);
                        generated.fractional.push(frac);
                        generated.site_index.push(site_idx);
                    }
                }
            }
        }
    }

    generated
}

fn site_component(site: &Vector3D, axis: usize) -> f64 {
    match axis {
        0 => site.x,
        1 => site.y,
        _ => site.z,
    }
}

/// Evaluate the Fourier sum for every generated atom
///
/// Returns the real spins and the largest imaginary component encountered,
/// which must be negligible for a physical spin configuration.
pub fn generate_spins(
    generated: &GeneratedAtoms,
    modes: &[PropagationMode],
    origin_frac: &Vector3D,
) -> (Vec<Vector3D>, f64) {
    let mut max_imaginary: f64 = 0.0;
    let spins = generated
        .fractional
        .iter()
        .zip(generated.site_index.iter())
        .map(|(frac, &site)| {
            let offset = *frac - *origin_frac;
            let total = modes
                .iter()
                .fold(ComplexVector3D::default(), |acc, mode| {
                    let phase = 2.0 * PI * mode.kvec.dot(&offset);
                    acc + mode.amplitudes[site].scale(Complex64::from_polar(1.0, phase))
                });
            max_imaginary = max_imaginary.max(total.max_imag());
            total.real()
        })
        .collect();
    (spins, max_imaginary)
}
