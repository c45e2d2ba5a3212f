//! Minimal vector math for agent poses, object positions, and trigger volumes.
//!
//! The coordinate frame is Y-up. Yaw is measured in degrees about the Y
//! axis, with yaw 0 facing `+Z`.

use core::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing positions and heights.
pub const EPSILON: f64 = 1e-5;

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y (up) component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit vector pointing up.
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);

    /// Construct a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y.mul_add(other.y, self.z * other.z))
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Distance measured on the ground plane, ignoring height.
    pub fn horizontal_distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx.hypot(dz)
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len <= EPSILON {
            None
        } else {
            Some(self * len.recip())
        }
    }

    /// Same point projected onto the ground plane at the given height.
    pub const fn with_y(self, y: f64) -> Self {
        Self::new(self.x, y, self.z)
    }

    /// Forward unit vector for a yaw angle in degrees.
    pub fn forward_from_yaw(yaw_degrees: f64) -> Self {
        let rad = yaw_degrees.to_radians();
        Self::new(rad.sin(), 0.0, rad.cos())
    }

    /// Yaw in degrees that faces along this vector on the ground plane.
    pub fn yaw_degrees(self) -> f64 {
        self.x.atan2(self.z).to_degrees()
    }

    /// Whether the point lies inside an axis-aligned box.
    pub fn within_box(self, center: Self, half_extents: Self) -> bool {
        (self.x - center.x).abs() <= half_extents.x
            && (self.y - center.y).abs() <= half_extents.y
            && (self.z - center.z).abs() <= half_extents.z
    }

    /// Step from `self` toward `target` by at most `max_delta`.
    pub fn move_towards(self, target: Self, max_delta: f64) -> Self {
        let offset = target - self;
        let dist = offset.length();
        if dist <= max_delta || dist <= EPSILON {
            target
        } else {
            self + offset * (max_delta / dist)
        }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// A two-axis input vector (manual move stick).
///
/// `x` turns the agent, `y` drives it forward or backward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Turn axis.
    pub x: f64,
    /// Drive axis.
    pub y: f64,
}

impl Vec2 {
    /// No input.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Construct an input vector.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Magnitude of the input.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Scalar step toward a target, never overshooting.
pub fn move_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(target - current)
    }
}

/// Whether two scalars are equal within [`EPSILON`].
pub fn approximately(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}
