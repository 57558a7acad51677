use crate::mat::Mat4;
use crate::vec::{Vec3, Vec4};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

/// Quaternion `x·i + y·j + z·k + w`.
///
/// Unit quaternions represent rotations; nothing here enforces unit length.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Pod, Zeroable)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Builds a quaternion whose imaginary part is `axis * sin(angle)` and
    /// whose real part is `cos(angle / 2)`.
    ///
    /// Because the imaginary part uses the full angle, the result is a unit
    /// rotation quaternion only for special angles. Use
    /// [`Quat::from_axis_angle`] for the conventional half-angle form.
    pub fn axis_angle(axis: Vec3, angle: f32) -> Self {
        let a = angle / 2.0;
        let s = angle.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, a.cos())
    }

    /// Rotation of `angle` radians about the unit vector `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    #[inline]
    pub fn imaginary(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn magnitude(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Zero magnitude yields NaN components.
    #[inline]
    pub fn normalized(self) -> Self {
        let m = self.magnitude();
        Self::new(self.x / m, self.y / m, self.z / m, self.w / m)
    }

    #[inline]
    pub fn conjugated(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotated -Z.
    pub fn forward(self) -> Vec3 {
        self * Vec3::new(0.0, 0.0, -1.0)
    }

    /// Rotated +X.
    pub fn right(self) -> Vec3 {
        self * Vec3::X
    }

    /// Rotated +Y.
    pub fn up(self) -> Vec3 {
        self * Vec3::Y
    }

    /// Rotation matrix whose columns are the rotated basis vectors.
    pub fn to_mat4(self) -> Mat4 {
        Mat4::from_rows([
            (self * Vec3::X).extend(0.0),
            (self * Vec3::Y).extend(0.0),
            (self * Vec3::Z).extend(0.0),
            Vec4::W,
        ])
        .transposed()
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl Add for Quat {
    type Output = Quat;
    #[inline]
    fn add(self, q: Quat) -> Quat {
        Quat::new(self.x + q.x, self.y + q.y, self.z + q.z, self.w + q.w)
    }
}

/// Hamilton product.
impl Mul for Quat {
    type Output = Quat;
    #[inline]
    #[rustfmt::skip]
    fn mul(self, o: Quat) -> Quat {
        Quat::new(
             self.w * o.x - self.z * o.y + self.y * o.z + self.x * o.w,
             self.z * o.x + self.w * o.y - self.x * o.z + self.y * o.w,
            -self.y * o.x + self.x * o.y + self.w * o.z + self.z * o.w,
            -self.x * o.x - self.y * o.y - self.z * o.z + self.w * o.w,
        )
    }
}

/// Rotates `v` by conjugation: `q ⊗ (v, 0) ⊗ q*`.
impl Mul<Vec3> for Quat {
    type Output = Vec3;
    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        let p = Quat::new(v.x, v.y, v.z, 0.0);
        (self * (p * self.conjugated())).imaginary()
    }
}

impl Mul<f32> for Quat {
    type Output = Quat;
    #[inline]
    fn mul(self, s: f32) -> Quat {
        Quat::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

impl From<glam::Quat> for Quat {
    fn from(q: glam::Quat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

impl From<Quat> for glam::Quat {
    fn from(q: Quat) -> Self {
        glam::Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-5;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn hamilton_product_basis() {
        let i = Quat::new(1.0, 0.0, 0.0, 0.0);
        let j = Quat::new(0.0, 1.0, 0.0, 0.0);
        let k = Quat::new(0.0, 0.0, 1.0, 0.0);
        assert_eq!(i * j, k);
        assert_eq!(j * i, k * -1.0);
        assert_eq!(i * i, Quat::new(0.0, 0.0, 0.0, -1.0));
    }

    #[test]
    fn product_matches_glam() {
        let a = Quat::new(0.1, -0.4, 0.7, 0.3).normalized();
        let b = Quat::new(-0.6, 0.2, 0.05, 0.9).normalized();
        let ours = a * b;
        let theirs = glam::Quat::from(a) * glam::Quat::from(b);
        assert!((ours.x - theirs.x).abs() < EPS);
        assert!((ours.y - theirs.y).abs() < EPS);
        assert!((ours.z - theirs.z).abs() < EPS);
        assert!((ours.w - theirs.w).abs() < EPS);
    }

    #[test]
    fn rotates_vector_by_conjugation() {
        let q = Quat::from_axis_angle(Vec3::Z, FRAC_PI_2);
        assert!(close(q * Vec3::X, Vec3::Y));
        assert!(close(q.right(), Vec3::Y));
        assert!(close(q.up(), Vec3::new(-1.0, 0.0, 0.0)));
        assert!(close(q.forward(), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn conjugate_round_trips_vector_for_unit_rotation() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5).normalized(), 1.1);
        let samples = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-3.0, 4.0, 2.5),
            Vec3::new(0.2, -0.1, 9.0),
        ];
        for v in samples {
            let back = q * (q.conjugated() * v);
            assert!(close(back, v), "{back:?} != {v:?}");
        }
    }

    #[test]
    fn axis_angle_scales_axis_by_full_angle_sine() {
        let angle = 0.8_f32;
        let q = Quat::axis_angle(Vec3::Y, angle);
        assert!((q.y - angle.sin()).abs() < EPS);
        assert!((q.w - (angle / 2.0).cos()).abs() < EPS);
        assert_eq!(q.x, 0.0);
        assert_eq!(q.z, 0.0);
    }

    #[test]
    fn from_axis_angle_matches_glam() {
        let axis = Vec3::new(0.0, 0.6, 0.8);
        let ours = Quat::from_axis_angle(axis, 2.0);
        let theirs = glam::Quat::from_axis_angle(axis.into(), 2.0);
        assert!((ours.x - theirs.x).abs() < EPS);
        assert!((ours.y - theirs.y).abs() < EPS);
        assert!((ours.z - theirs.z).abs() < EPS);
        assert!((ours.w - theirs.w).abs() < EPS);
    }

    #[test]
    fn magnitude_and_normalization() {
        let q = Quat::new(1.0, 2.0, 2.0, 4.0);
        assert!((q.magnitude() - 5.0).abs() < EPS);
        assert!((q.normalized().magnitude() - 1.0).abs() < EPS);
        assert!(((q * 2.0).magnitude() - 10.0).abs() < EPS);
        assert_eq!(q.conjugated().imaginary(), Vec3::new(-1.0, -2.0, -2.0));
        assert_eq!(q + q, q * 2.0);
    }

    #[test]
    fn to_mat4_agrees_with_vector_rotation() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalized(), PI / 3.0);
        let m = q.to_mat4();
        let v = Vec3::new(0.3, -1.2, 2.0);
        assert!(close(m * v, q * v));
        assert_eq!(m.row(3), Vec4::W);
    }
}
