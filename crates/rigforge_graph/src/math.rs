// SPDX-License-Identifier: MIT OR Apache-2.0
//! Geometric value types carried by guide and build documents.
//!
//! These are the "rich" values that the codec converts to a plain encoding
//! on save and back on load.

use std::ops::{Add, Mul, Sub};

/// 3D vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Vector with every component set to one
    pub const fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Dot product
    pub fn dot(&self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    pub fn cross(&self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean length
    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    /// Component-wise product
    pub fn scale(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    /// Components as an array
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    /// Vector part X
    pub x: f64,
    /// Vector part Y
    pub y: f64,
    /// Vector part Z
    pub z: f64,
    /// Scalar part
    pub w: f64,
}

impl Quat {
    /// The identity rotation
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Create a new quaternion
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians around `axis` (need not be normalized)
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let len = axis.length();
        if len == 0.0 {
            return Self::IDENTITY;
        }
        let half = angle * 0.5;
        let s = half.sin() / len;
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Rotate a vector by this quaternion
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q x v) + 2(q x (q x v))
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Components as an array, `[x, y, z, w]`
    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; 4]> for Quat {
    fn from([x, y, z, w]: [f64; 4]) -> Self {
        Self::new(x, y, z, w)
    }
}

/// Transform: translation, orientation and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xfo {
    /// Translation
    pub tr: Vec3,
    /// Orientation
    pub ori: Quat,
    /// Scale
    pub sc: Vec3,
}

impl Xfo {
    /// The identity transform
    pub const IDENTITY: Xfo = Xfo {
        tr: Vec3::new(0.0, 0.0, 0.0),
        ori: Quat::IDENTITY,
        sc: Vec3::one(),
    };

    /// Identity transform moved to `tr`
    pub fn from_translation(tr: Vec3) -> Self {
        Self { tr, ..Self::IDENTITY }
    }

    /// Apply this transform to a point (scale, then rotate, then translate)
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.ori.rotate(point.scale(self.sc)) + self.tr
    }

    /// Transform translated along its own local X axis by `distance`
    pub fn offset_along_x(&self, distance: f64) -> Xfo {
        Xfo {
            tr: self.tr + self.ori.rotate(Vec3::new(distance, 0.0, 0.0)),
            ..*self
        }
    }
}

impl Default for Xfo {
    fn default() -> Self {
        Self::IDENTITY
    }
}
