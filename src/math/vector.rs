//! Fixed-arity float vectors.
//!
//! All vectors are `Copy`; every operator returns a new value and never touches its
//! operands. The named constructors (`zero`, `one`, `unit_*`) build fresh values on
//! each call so there is no shared template to corrupt.

use std::ops::{Add, Mul, Neg, Sub};

use crate::error::{Error, Result};

macro_rules! impl_vector {
    ($name:ident, $cg:ident, $n:literal, $($field:ident),+) => {
        impl $name {
            #[inline]
            pub const fn new($($field: f32),+) -> Self {
                Self { $($field),+ }
            }

            /// All components set to `value`.
            #[inline]
            pub const fn splat(value: f32) -> Self {
                Self { $($field: value),+ }
            }

            #[inline]
            pub const fn zero() -> Self {
                Self::splat(0.0)
            }

            #[inline]
            pub const fn one() -> Self {
                Self::splat(1.0)
            }

            #[inline]
            pub fn dot(self, rhs: Self) -> f32 {
                0.0 $(+ self.$field * rhs.$field)+
            }

            #[inline]
            pub fn length(self) -> f32 {
                self.dot(self).sqrt()
            }

            /// Scales the vector to unit length.
            ///
            /// A zero-length vector has no direction, so it is rejected with
            /// [`Error::ZeroLengthVector`] instead of producing NaNs.
            pub fn normalize(self) -> Result<Self> {
                let length = self.length();
                if length == 0.0 || !length.is_finite() {
                    return Err(Error::ZeroLengthVector);
                }
                Ok(self * (1.0 / length))
            }

            #[inline]
            pub fn to_array(self) -> [f32; $n] {
                [$(self.$field),+]
            }

            /// Component-wise comparison within `tolerance`.
            pub fn approx_eq(self, rhs: Self, tolerance: f32) -> bool {
                true $(&& (self.$field - rhs.$field).abs() <= tolerance)+
            }
        }

        impl Add for $name {
            type Output = $name;
            #[inline]
            fn add(self, rhs: $name) -> $name {
                $name::new($(self.$field + rhs.$field),+)
            }
        }

        impl Sub for $name {
            type Output = $name;
            #[inline]
            fn sub(self, rhs: $name) -> $name {
                $name::new($(self.$field - rhs.$field),+)
            }
        }

        impl Mul<f32> for $name {
            type Output = $name;
            #[inline]
            fn mul(self, rhs: f32) -> $name {
                $name::new($(self.$field * rhs),+)
            }
        }

        impl Neg for $name {
            type Output = $name;
            #[inline]
            fn neg(self) -> $name {
                $name::new($(-self.$field),+)
            }
        }

        impl From<[f32; $n]> for $name {
            fn from(array: [f32; $n]) -> Self {
                let [$($field),+] = array;
                Self { $($field),+ }
            }
        }

        impl From<$name> for [f32; $n] {
            fn from(vector: $name) -> Self {
                vector.to_array()
            }
        }

        impl From<cgmath::$cg<f32>> for $name {
            fn from(vector: cgmath::$cg<f32>) -> Self {
                Self { $($field: vector.$field),+ }
            }
        }

        impl From<$name> for cgmath::$cg<f32> {
            fn from(vector: $name) -> Self {
                cgmath::$cg::new($(vector.$field),+)
            }
        }
    };
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl_vector!(Vector2, Vector2, 2, x, y);
impl_vector!(Vector3, Vector3, 3, x, y, z);
impl_vector!(Vector4, Vector4, 4, x, y, z, w);

impl Vector2 {
    pub const fn unit_x() -> Self {
        Self::new(1.0, 0.0)
    }

    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0)
    }
}

impl Vector3 {
    pub const fn unit_x() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    pub const fn unit_z() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn cross(self, rhs: Vector3) -> Vector3 {
        Vector3::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn extend(self, w: f32) -> Vector4 {
        Vector4::new(self.x, self.y, self.z, w)
    }
}

impl Vector4 {
    pub const fn unit_x() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0, 0.0, 0.0)
    }

    pub const fn unit_z() -> Self {
        Self::new(0.0, 0.0, 1.0, 0.0)
    }

    pub const fn unit_w() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    pub fn truncate(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}
