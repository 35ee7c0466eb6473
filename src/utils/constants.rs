/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Physical constants and numerical defaults used in mPDF calculations

/// Neutron magnetic moment in nuclear magnetons (|γ|)
pub const NEUTRON_GYROMAGNETIC_RATIO: f64 = 1.913;

/// Classical electron radius in fm
pub const CLASSICAL_ELECTRON_RADIUS: f64 = 2.81794;

/// Magnetic scattering length γr₀/2 in fm
pub const MAGNETIC_SCATTERING_LENGTH: f64 =
    NEUTRON_GYROMAGNETIC_RATIO * CLASSICAL_ELECTRON_RADIUS / 2.0;

/// Prefactor (2/3)(γr₀/2)² of the unnormalized mPDF, in barn
///
/// 1 barn = 100 fm².
pub const MPDF_PREFACTOR: f64 =
    2.0 / 3.0 * MAGNETIC_SCATTERING_LENGTH * MAGNETIC_SCATTERING_LENGTH / 100.0;

/// Default real-space grid step in Å
pub const DEFAULT_RSTEP: f64 = 0.01;

/// Default spin-only g-factor
pub const DEFAULT_G_FACTOR: f64 = 2.0;

/// Default isotropic displacement parameter in Å²
pub const DEFAULT_UISO: f64 = 0.01;

/// Default radius for generating atoms around a species origin, in Å
pub const DEFAULT_GENERATION_RADIUS: f64 = 20.0;

/// Upper end of the momentum-transfer grid for form factors, in Å⁻¹
pub const DEFAULT_FF_QMAX: f64 = 25.0;

/// Step of the momentum-transfer grid for form factors, in Å⁻¹
pub const DEFAULT_FF_QSTEP: f64 = 0.01;

/// Separations below this (Å) are treated as coincident sites
pub const COINCIDENT_TOLERANCE: f64 = 1e-6;

/// Imaginary spin residue tolerated before a spin is reported as non-real
pub const IMAGINARY_SPIN_TOLERANCE: f64 = 1e-6;
