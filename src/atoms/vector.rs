/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Real and complex 3D vectors for positions, spins and basis vectors

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Represents a 3D vector for positions, spins and other spatial quantities
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3D {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vector3D {
    /// Create a new 3D vector
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a new vector at the origin
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Create a vector from a `[x, y, z]` array
    pub fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    /// Components as a `[x, y, z]` array
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Calculate the distance to another vector
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    /// Calculate the length (magnitude) of the vector
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Squared length, avoids the square root in hot loops
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Calculate the dot product with another vector
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Calculate the cross product with another vector
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Multiply every component by a scalar
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Normalize the vector to unit length
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 1e-10 {
            self.scale(1.0 / len)
        } else {
            Self::origin()
        }
    }

    /// Rotate the vector about `axis` by `angle` radians (Rodrigues' formula)
    ///
    /// A zero-length axis leaves the vector unchanged.
    pub fn rotate(&self, axis: &Self, angle: f64) -> Self {
        let k = axis.normalize();
        if k.length_squared() == 0.0 {
            return *self;
        }
        let (sin, cos) = angle.sin_cos();
        self.scale(cos) + k.cross(self).scale(sin) + k.scale(k.dot(self) * (1.0 - cos))
    }
}

impl fmt::Display for Vector3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6}, {:.6})", self.x, self.y, self.z)
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vector3D {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        self.scale(factor)
    }
}

/// A 3D vector with complex components
///
/// Used for the basis vectors of helical and incommensurate magnetic
/// structures, where the physical spin is the real part of a Fourier sum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComplexVector3D {
    pub x: Complex64,
    pub y: Complex64,
    pub z: Complex64,
}

impl ComplexVector3D {
    /// Create a new complex vector
    pub fn new(x: Complex64, y: Complex64, z: Complex64) -> Self {
        Self { x, y, z }
    }

    /// Build from separate real and imaginary parts
    pub fn from_parts(re: Vector3D, im: Vector3D) -> Self {
        Self {
            x: Complex64::new(re.x, im.x),
            y: Complex64::new(re.y, im.y),
            z: Complex64::new(re.z, im.z),
        }
    }

    /// A purely real vector
    pub fn from_real(re: Vector3D) -> Self {
        Self::from_parts(re, Vector3D::origin())
    }

    /// Real part of each component
    pub fn real(&self) -> Vector3D {
        Vector3D::new(self.x.re, self.y.re, self.z.re)
    }

    /// Imaginary part of each component
    pub fn imag(&self) -> Vector3D {
        Vector3D::new(self.x.im, self.y.im, self.z.im)
    }

    /// Largest absolute imaginary component
    pub fn max_imag(&self) -> f64 {
        self.x.im.abs().max(self.y.im.abs()).max(self.z.im.abs())
    }

    /// Multiply every component by a complex scalar
    pub fn scale(&self, factor: Complex64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl Add for ComplexVector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}
