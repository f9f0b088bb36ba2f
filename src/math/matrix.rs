//! 4x4 transform matrix with a row-major public API.
//!
//! Points are treated as row vectors (`v' = v * M`), so translation lives in row 3 and
//! `a * b` applies `a` first. The storage is a `cgmath::Matrix4` whose columns are our
//! rows; this makes [`Matrix4::to_array`] directly uploadable to a WGSL `mat4x4<f32>`,
//! where the same data is read as a column-major matrix for column-vector math.

use std::ops::Mul;

use cgmath::{Matrix, SquareMatrix, Zero};

use crate::{
    error::{Error, Result},
    math::{
        EPSILON,
        vector::{Vector3, Vector4},
    },
};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix4 {
    inner: cgmath::Matrix4<f32>,
}

impl Matrix4 {
    pub fn from_rows(row0: Vector4, row1: Vector4, row2: Vector4, row3: Vector4) -> Self {
        Self {
            inner: cgmath::Matrix4::from_cols(row0.into(), row1.into(), row2.into(), row3.into()),
        }
    }

    pub fn identity() -> Self {
        Self {
            inner: cgmath::Matrix4::identity(),
        }
    }

    pub fn zero() -> Self {
        Self {
            inner: cgmath::Matrix4::zero(),
        }
    }

    pub fn row(&self, index: usize) -> Vector4 {
        self.inner[index].into()
    }

    pub fn column(&self, index: usize) -> Vector4 {
        self.inner.row(index).into()
    }

    pub fn translation(offset: Vector3) -> Self {
        let mut result = Self::identity();
        result.inner.w = offset.extend(1.0).into();
        result
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::from_rows(
            Vector4::unit_x(),
            Vector4::new(0.0, cos, sin, 0.0),
            Vector4::new(0.0, -sin, cos, 0.0),
            Vector4::unit_w(),
        )
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::from_rows(
            Vector4::new(cos, 0.0, -sin, 0.0),
            Vector4::unit_y(),
            Vector4::new(sin, 0.0, cos, 0.0),
            Vector4::unit_w(),
        )
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::from_rows(
            Vector4::new(cos, sin, 0.0, 0.0),
            Vector4::new(-sin, cos, 0.0, 0.0),
            Vector4::unit_z(),
            Vector4::unit_w(),
        )
    }

    /// Right-handed view matrix looking from `eye` towards `target`.
    ///
    /// Fails with [`Error::ZeroLengthVector`] when `eye == target` or `up` is parallel to
    /// the viewing direction.
    pub fn look_at(eye: Vector3, target: Vector3, up: Vector3) -> Result<Self> {
        let z = (eye - target).normalize()?;
        let x = up.cross(z).normalize()?;
        let y = z.cross(x).normalize()?;

        Ok(Self::from_rows(
            Vector4::new(x.x, y.x, z.x, 0.0),
            Vector4::new(x.y, y.y, z.y, 0.0),
            Vector4::new(x.z, y.z, z.z, 0.0),
            Vector4::new(-x.dot(eye), -y.dot(eye), -z.dot(eye), 1.0),
        ))
    }

    /// Symmetric perspective frustum with OpenGL clip-space depth (`-1..1`).
    ///
    /// `fov` is the vertical field of view in radians and must lie in `(0, PI]`.
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Result<Self> {
        if !(fov > 0.0 && fov <= std::f32::consts::PI) {
            return Err(Error::InvalidProjectionParameter("wrong field of view"));
        }
        if !(aspect > 0.0) {
            return Err(Error::InvalidProjectionParameter("wrong aspect ratio"));
        }
        if !(near > 0.0) {
            return Err(Error::InvalidProjectionParameter(
                "depth near must be greater than zero",
            ));
        }
        if !(far > 0.0) {
            return Err(Error::InvalidProjectionParameter(
                "depth far must be greater than zero",
            ));
        }
        if far == near {
            return Err(Error::InvalidProjectionParameter(
                "depth far must differ from depth near",
            ));
        }

        let max_y = near * (0.5 * fov).tan();
        let min_y = -max_y;
        let min_x = min_y * aspect;
        let max_x = max_y * aspect;

        let x = 2.0 * near / (max_x - min_x);
        let y = 2.0 * near / (max_y - min_y);
        let a = (max_x + min_x) / (max_x - min_x);
        let b = (max_y + min_y) / (max_y - min_y);
        let c = -(far + near) / (far - near);
        let d = -(2.0 * far * near) / (far - near);

        Ok(Self::from_rows(
            Vector4::new(x, 0.0, 0.0, 0.0),
            Vector4::new(0.0, y, 0.0, 0.0),
            Vector4::new(a, b, c, -1.0),
            Vector4::new(0.0, 0.0, d, 0.0),
        ))
    }

    pub fn transpose(&self) -> Self {
        Self {
            inner: self.inner.transpose(),
        }
    }

    pub fn determinant(&self) -> f32 {
        self.inner.determinant()
    }

    /// Inverse by cofactor expansion; near-singular and non-finite matrices are rejected.
    pub fn invert(&self) -> Result<Self> {
        let determinant = self.determinant();
        if !determinant.is_finite() || determinant.abs() < EPSILON {
            return Err(Error::MatrixSingularity { determinant });
        }
        self.inner
            .invert()
            .map(|inner| Self { inner })
            .ok_or(Error::MatrixSingularity { determinant })
    }

    /// Rows flattened in order, ready for a uniform buffer.
    pub fn to_array(&self) -> [[f32; 4]; 4] {
        self.inner.into()
    }

    pub fn approx_eq(&self, other: &Matrix4, tolerance: f32) -> bool {
        (0..4).all(|i| self.row(i).approx_eq(other.row(i), tolerance))
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        // Row-major a * b is (B^T A^T)^T, and the storage already holds the transposes.
        Matrix4 {
            inner: rhs.inner * self.inner,
        }
    }
}

impl Mul<Matrix4> for Vector4 {
    type Output = Vector4;

    fn mul(self, rhs: Matrix4) -> Vector4 {
        (rhs.inner * cgmath::Vector4::from(self)).into()
    }
}

impl From<Matrix4> for [[f32; 4]; 4] {
    fn from(matrix: Matrix4) -> Self {
        matrix.to_array()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    use super::*;

    fn sample() -> Matrix4 {
        Matrix4::rotation_x(0.3)
            * Matrix4::rotation_y(-1.2)
            * Matrix4::rotation_z(2.0)
            * Matrix4::translation(Vector3::new(4.0, -2.0, 7.5))
    }

    #[test]
    fn identity_is_neutral_for_multiplication() {
        let m = sample();
        assert_eq!(m * Matrix4::identity(), m);
        assert_eq!(Matrix4::identity() * m, m);
    }

    #[test]
    fn identity_and_zero_are_fresh_copies() {
        let mut id = Matrix4::identity();
        id = id * Matrix4::translation(Vector3::one());
        assert_ne!(id, Matrix4::identity());
        assert_eq!(Matrix4::identity().row(3), Vector4::unit_w());
        assert_eq!(Matrix4::zero().row(2), Vector4::zero());
    }

    #[test]
    fn multiplication_is_not_commutative() {
        let r = Matrix4::rotation_y(FRAC_PI_2);
        let t = Matrix4::translation(Vector3::unit_x());
        assert!(!(r * t).approx_eq(&(t * r), 1e-6));
    }

    #[test]
    fn row_major_product_applies_left_operand_first() {
        let p = Vector4::new(1.0, 0.0, 0.0, 1.0);
        // rotate +x onto -z, then move up
        let m = Matrix4::rotation_y(FRAC_PI_2) * Matrix4::translation(Vector3::unit_y());
        let moved = p * m;
        assert!(moved.approx_eq(Vector4::new(0.0, 1.0, -1.0, 1.0), 1e-6), "{moved:?}");
    }

    #[test]
    fn translation_lives_in_row_three() {
        let m = Matrix4::translation(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(m.row(3), Vector4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(m.column(3), Vector4::unit_w());
    }

    #[test]
    fn invert_times_original_is_identity() {
        let m = sample();
        let inv = m.invert().unwrap();
        assert!((m * inv).approx_eq(&Matrix4::identity(), 1e-5));
        assert!((inv * m).approx_eq(&Matrix4::identity(), 1e-5));
    }

    #[test]
    fn invert_rejects_zero_row() {
        let m = Matrix4::from_rows(
            Vector4::unit_x(),
            Vector4::zero(),
            Vector4::unit_z(),
            Vector4::unit_w(),
        );
        assert!(matches!(m.invert(), Err(Error::MatrixSingularity { .. })));
        assert!(matches!(
            Matrix4::zero().invert(),
            Err(Error::MatrixSingularity { .. })
        ));
    }

    #[test]
    fn invert_rejects_nearly_singular_matrix() {
        let tiny = Matrix4::from_rows(
            Vector4::new(1e-3, 0.0, 0.0, 0.0),
            Vector4::new(0.0, 1e-3, 0.0, 0.0),
            Vector4::new(0.0, 0.0, 1e-3, 0.0),
            Vector4::unit_w(),
        );
        assert!(matches!(tiny.invert(), Err(Error::MatrixSingularity { .. })));
    }

    #[test]
    fn invert_rejects_non_finite_matrix() {
        let broken = Matrix4::translation(Vector3::new(f32::NAN, 0.0, 0.0));
        assert!(matches!(broken.invert(), Err(Error::MatrixSingularity { .. })));
    }

    #[test]
    fn double_transpose_is_identity_operation() {
        let m = sample();
        assert_eq!(m.transpose().transpose(), m);
        assert_eq!(m.transpose().row(0), m.column(0));
    }

    #[test]
    fn perspective_rejects_out_of_domain_parameters() {
        let rejected = [
            (0.0, 1.0, 0.1, 100.0),
            (3.2, 1.0, 0.1, 100.0),
            (FRAC_PI_4, 0.0, 0.1, 100.0),
            (FRAC_PI_4, 1.0, 0.0, 100.0),
            (FRAC_PI_4, 1.0, 0.1, -1.0),
        ];
        for (fov, aspect, near, far) in rejected {
            assert!(
                matches!(
                    Matrix4::perspective(fov, aspect, near, far),
                    Err(Error::InvalidProjectionParameter(_))
                ),
                "accepted fov={fov} aspect={aspect} near={near} far={far}"
            );
        }
        assert!(Matrix4::perspective(PI, 1.0, 0.1, 100.0).is_ok());
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let (near, far) = (0.5, 50.0);
        let p = Matrix4::perspective(FRAC_PI_4, 16.0 / 9.0, near, far).unwrap();
        let on_near = Vector4::new(0.0, 0.0, -near, 1.0) * p;
        let on_far = Vector4::new(0.0, 0.0, -far, 1.0) * p;
        assert!((on_near.z / on_near.w + 1.0).abs() < 1e-5);
        assert!((on_far.z / on_far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn look_at_moves_target_onto_negative_z() {
        let eye = Vector3::new(0.0, 0.0, 10.0);
        let view = Matrix4::look_at(eye, Vector3::zero(), Vector3::unit_y()).unwrap();
        let target = Vector4::unit_w() * view;
        assert!(target.approx_eq(Vector4::new(0.0, 0.0, -10.0, 1.0), 1e-5));
        let at_eye = eye.extend(1.0) * view;
        assert!(at_eye.approx_eq(Vector4::unit_w(), 1e-5));
    }

    #[test]
    fn look_at_rejects_degenerate_input() {
        let eye = Vector3::new(1.0, 2.0, 3.0);
        assert!(Matrix4::look_at(eye, eye, Vector3::unit_y()).is_err());
        assert!(Matrix4::look_at(Vector3::unit_y(), Vector3::zero(), Vector3::unit_y()).is_err());
    }

    #[test]
    fn axis_rotations_match_cgmath() {
        let angle = 0.7;
        let ours = Matrix4::rotation_y(angle).to_array();
        let theirs: [[f32; 4]; 4] = cgmath::Matrix4::from_angle_y(cgmath::Rad(angle)).into();
        assert_eq!(ours, theirs);
    }
}
