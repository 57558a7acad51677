use crate::vec::{Vec3, Vec4};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// 4×4 matrix stored as four row vectors.
///
/// Vectors are columns: `m * v` dots every row with `v`, and translation
/// lives in the last column. [`Mat4::to_cols_array`] gives the column-major
/// order GPU uniform uploads expect.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Pod, Zeroable)]
pub struct Mat4 {
    rows: [Vec4; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[inline]
fn vec4(a: [f32; 4]) -> Vec4 {
    Vec4::new(a[0], a[1], a[2], a[3])
}

impl Mat4 {
    #[rustfmt::skip]
    pub const IDENTITY: Self = Self {
        rows: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    pub const fn from_rows(rows: [Vec4; 4]) -> Self {
        Self { rows }
    }

    /// Builds a matrix from 16 values in row-major order.
    pub fn from_row_array(v: [f32; 16]) -> Self {
        Self::from_rows([
            Vec4::new(v[0], v[1], v[2], v[3]),
            Vec4::new(v[4], v[5], v[6], v[7]),
            Vec4::new(v[8], v[9], v[10], v[11]),
            Vec4::new(v[12], v[13], v[14], v[15]),
        ])
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub fn row(&self, i: usize) -> Vec4 {
        self.rows[i]
    }

    #[inline]
    pub fn col(&self, j: usize) -> Vec4 {
        Vec4::new(
            self.get(0, j),
            self.get(1, j),
            self.get(2, j),
            self.get(3, j),
        )
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.rows[row].values()[col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        let mut r = self.rows[row].values();
        r[col] = value;
        self.rows[row] = vec4(r);
    }

    pub fn to_rows_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (i, row) in self.rows.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&row.values());
        }
        out
    }

    /// Column-major values, the layout of a non-transposed uniform upload.
    pub fn to_cols_array(&self) -> [f32; 16] {
        self.transposed().to_rows_array()
    }

    pub fn transposed(&self) -> Self {
        let [a, b, c, d] = self.rows;
        #[rustfmt::skip]
        let m = Self::from_row_array([
            a.x, b.x, c.x, d.x,
            a.y, b.y, c.y, d.y,
            a.z, b.z, c.z, d.z,
            a.w, b.w, c.w, d.w,
        ]);
        m
    }

    /// Transposed source plus its cofactor matrix (rows of the adjugate).
    fn cofactors(&self) -> ([f32; 16], [[f32; 4]; 4]) {
        let mut src = [0.0f32; 16];
        let mut tmp = [0.0f32; 12];
        let mut dst = [[0.0f32; 4]; 4];

        for i in 0..4 {
            src[i] = self.get(i, 0);
            src[i + 4] = self.get(i, 1);
            src[i + 8] = self.get(i, 2);
            src[i + 12] = self.get(i, 3);
        }

        // pairs for the first eight cofactors
        tmp[0] = src[10] * src[15];
        tmp[1] = src[11] * src[14];
        tmp[2] = src[9] * src[15];
        tmp[3] = src[11] * src[13];
        tmp[4] = src[9] * src[14];
        tmp[5] = src[10] * src[13];
        tmp[6] = src[8] * src[15];
        tmp[7] = src[11] * src[12];
        tmp[8] = src[8] * src[14];
        tmp[9] = src[10] * src[12];
        tmp[10] = src[8] * src[13];
        tmp[11] = src[9] * src[12];

        dst[0][0] = tmp[0] * src[5] + tmp[3] * src[6] + tmp[4] * src[7];
        dst[0][0] -= tmp[1] * src[5] + tmp[2] * src[6] + tmp[5] * src[7];
        dst[0][1] = tmp[1] * src[4] + tmp[6] * src[6] + tmp[9] * src[7];
        dst[0][1] -= tmp[0] * src[4] + tmp[7] * src[6] + tmp[8] * src[7];
        dst[0][2] = tmp[2] * src[4] + tmp[7] * src[5] + tmp[10] * src[7];
        dst[0][2] -= tmp[3] * src[4] + tmp[6] * src[5] + tmp[11] * src[7];
        dst[0][3] = tmp[5] * src[4] + tmp[8] * src[5] + tmp[11] * src[6];
        dst[0][3] -= tmp[4] * src[4] + tmp[9] * src[5] + tmp[10] * src[6];
        dst[1][0] = tmp[1] * src[1] + tmp[2] * src[2] + tmp[5] * src[3];
        dst[1][0] -= tmp[0] * src[1] + tmp[3] * src[2] + tmp[4] * src[3];
        dst[1][1] = tmp[0] * src[0] + tmp[7] * src[2] + tmp[8] * src[3];
        dst[1][1] -= tmp[1] * src[0] + tmp[6] * src[2] + tmp[9] * src[3];
        dst[1][2] = tmp[3] * src[0] + tmp[6] * src[1] + tmp[11] * src[3];
        dst[1][2] -= tmp[2] * src[0] + tmp[7] * src[1] + tmp[10] * src[3];
        dst[1][3] = tmp[4] * src[0] + tmp[9] * src[1] + tmp[10] * src[2];
        dst[1][3] -= tmp[5] * src[0] + tmp[8] * src[1] + tmp[11] * src[2];

        // pairs for the second eight cofactors
        tmp[0] = src[2] * src[7];
        tmp[1] = src[3] * src[6];
        tmp[2] = src[1] * src[7];
        tmp[3] = src[3] * src[5];
        tmp[4] = src[1] * src[6];
        tmp[5] = src[2] * src[5];
        tmp[6] = src[0] * src[7];
        tmp[7] = src[3] * src[4];
        tmp[8] = src[0] * src[6];
        tmp[9] = src[2] * src[4];
        tmp[10] = src[0] * src[5];
        tmp[11] = src[1] * src[4];

        dst[2][0] = tmp[0] * src[13] + tmp[3] * src[14] + tmp[4] * src[15];
        dst[2][0] -= tmp[1] * src[13] + tmp[2] * src[14] + tmp[5] * src[15];
        dst[2][1] = tmp[1] * src[12] + tmp[6] * src[14] + tmp[9] * src[15];
        dst[2][1] -= tmp[0] * src[12] + tmp[7] * src[14] + tmp[8] * src[15];
        dst[2][2] = tmp[2] * src[12] + tmp[7] * src[13] + tmp[10] * src[15];
        dst[2][2] -= tmp[3] * src[12] + tmp[6] * src[13] + tmp[11] * src[15];
        dst[2][3] = tmp[5] * src[12] + tmp[8] * src[13] + tmp[11] * src[14];
        dst[2][3] -= tmp[4] * src[12] + tmp[9] * src[13] + tmp[10] * src[14];
        dst[3][0] = tmp[2] * src[10] + tmp[5] * src[11] + tmp[1] * src[9];
        dst[3][0] -= tmp[4] * src[11] + tmp[0] * src[9] + tmp[3] * src[10];
        dst[3][1] = tmp[8] * src[11] + tmp[0] * src[8] + tmp[7] * src[10];
        dst[3][1] -= tmp[6] * src[10] + tmp[9] * src[11] + tmp[1] * src[8];
        dst[3][2] = tmp[6] * src[9] + tmp[11] * src[11] + tmp[3] * src[8];
        dst[3][2] -= tmp[10] * src[11] + tmp[2] * src[8] + tmp[7] * src[9];
        dst[3][3] = tmp[10] * src[10] + tmp[4] * src[8] + tmp[9] * src[9];
        dst[3][3] -= tmp[8] * src[9] + tmp[11] * src[10] + tmp[5] * src[8];

        (src, dst)
    }

    pub fn determinant(&self) -> f32 {
        let (src, dst) = self.cofactors();
        src[0] * dst[0][0] + src[1] * dst[0][1] + src[2] * dst[0][2] + src[3] * dst[0][3]
    }

    /// Cofactor-expansion inverse.
    ///
    /// The determinant is used as a divisor unchecked: a singular matrix
    /// produces infinite or NaN entries.
    pub fn inverted(&self) -> Self {
        let (src, mut dst) = self.cofactors();
        let det = 1.0
            / (src[0] * dst[0][0] + src[1] * dst[0][1] + src[2] * dst[0][2] + src[3] * dst[0][3]);
        for row in dst.iter_mut() {
            for v in row.iter_mut() {
                *v *= det;
            }
        }
        Self::from_rows(dst.map(vec4))
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        #[rustfmt::skip]
        let m = Self::from_row_array([
            1.0, 0.0, 0.0, x,
            0.0, 1.0, 0.0, y,
            0.0, 0.0, 1.0, z,
            0.0, 0.0, 0.0, 1.0,
        ]);
        m
    }

    pub fn translation_vec(v: Vec3) -> Self {
        Self::translation(v.x, v.y, v.z)
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        #[rustfmt::skip]
        let m = Self::from_row_array([
            x,   0.0, 0.0, 0.0,
            0.0, y,   0.0, 0.0,
            0.0, 0.0, z,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        m
    }

    pub fn scale_vec(v: Vec3) -> Self {
        Self::scale(v.x, v.y, v.z)
    }

    pub fn uniform_scale(s: f32) -> Self {
        Self::scale(s, s, s)
    }

    pub fn rotation_x(a: f32) -> Self {
        let (s, c) = a.sin_cos();
        #[rustfmt::skip]
        let m = Self::from_row_array([
            1.0, 0.0, 0.0, 0.0,
            0.0,   c,  -s, 0.0,
            0.0,   s,   c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        m
    }

    pub fn rotation_y(a: f32) -> Self {
        let (s, c) = a.sin_cos();
        #[rustfmt::skip]
        let m = Self::from_row_array([
              c, 0.0,   s, 0.0,
            0.0, 1.0, 0.0, 0.0,
             -s, 0.0,   c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        m
    }

    pub fn rotation_z(a: f32) -> Self {
        let (s, c) = a.sin_cos();
        #[rustfmt::skip]
        let m = Self::from_row_array([
              c,  -s, 0.0, 0.0,
              s,   c, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        m
    }

    /// Rotation of `a` radians about `axis` (normalized here).
    pub fn axis_angle(axis: Vec3, a: f32) -> Self {
        let (s, c) = a.sin_cos();
        let t = 1.0 - c;
        let Vec3 { x, y, z } = axis.normalized();
        #[rustfmt::skip]
        let m = Self::from_row_array([
            t * x * x + c,     t * x * y - z * s, t * x * z + y * s, 0.0,
            t * x * y + z * s, t * y * y + c,     t * y * z - x * s, 0.0,
            t * x * z - y * s, t * y * z + x * s, t * z * z + c,     0.0,
            0.0,               0.0,               0.0,               1.0,
        ]);
        m
    }

    /// Orthographic projection into the OpenGL clip cube.
    pub fn ortho(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Self {
        let w = r - l;
        let h = t - b;
        let d = f - n;
        #[rustfmt::skip]
        let m = Self::from_row_array([
            2.0 / w, 0.0,     0.0,      -(r + l) / w,
            0.0,     2.0 / h, 0.0,      -(t + b) / h,
            0.0,     0.0,     -2.0 / d, -(f + n) / d,
            0.0,     0.0,     0.0,      1.0,
        ]);
        m
    }

    /// Pixel-space projection with the origin at the top-left corner.
    pub fn ortho_2d(width: f32, height: f32) -> Self {
        Self::ortho(0.0, width, height, 0.0, -1.0, 1.0)
    }

    pub fn frustum(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Self {
        let n2 = 2.0 * n;
        let w = r - l;
        let h = t - b;
        let d = f - n;
        #[rustfmt::skip]
        let m = Self::from_row_array([
            n2 / w, 0.0,    (r + l) / w, 0.0,
            0.0,    n2 / h, (t + b) / h, 0.0,
            0.0,    0.0,    (-f - n) / d, (-n2 * f) / d,
            0.0,    0.0,    -1.0,        0.0,
        ]);
        m
    }

    /// Symmetric perspective projection; `fov_y` is the full vertical angle.
    pub fn perspective(fov_y: f32, aspect: f32, n: f32, f: f32) -> Self {
        let ymax = n * (fov_y * 0.5).tan();
        let xmax = ymax * aspect;
        Self::frustum(-xmax, xmax, -ymax, ymax, n, f)
    }

    /// Right-handed view matrix looking from `eye` towards `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let z = (eye - target).normalized();
        let x = up.cross(z).normalized();
        let y = z.cross(x);
        Self::from_rows([
            x.extend(-x.dot(eye)),
            y.extend(-y.dot(eye)),
            z.extend(-z.dot(eye)),
            Vec4::W,
        ])
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, rhs: Mat4) -> Mat4 {
        let ot = rhs.transposed();
        let mut d = [[0.0f32; 4]; 4];
        for (j, row) in d.iter_mut().enumerate() {
            for (i, v) in row.iter_mut().enumerate() {
                *v = self.rows[j].dot(ot.rows[i]);
            }
        }
        Mat4::from_rows(d.map(vec4))
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, v: Vec4) -> Vec4 {
        Vec4::new(
            self.rows[0].dot(v),
            self.rows[1].dot(v),
            self.rows[2].dot(v),
            self.rows[3].dot(v),
        )
    }
}

/// Transforms a point: `w` is taken as 1 and dropped from the result.
impl Mul<Vec3> for Mat4 {
    type Output = Vec3;
    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        let p = v.extend(1.0);
        Vec3::new(self.rows[0].dot(p), self.rows[1].dot(p), self.rows[2].dot(p))
    }
}

impl Mul<f32> for Mat4 {
    type Output = Mat4;
    fn mul(self, s: f32) -> Mat4 {
        Mat4::from_rows(self.rows.map(|r| r * s))
    }
}

impl From<glam::Mat4> for Mat4 {
    fn from(m: glam::Mat4) -> Self {
        Self::from_row_array(m.transpose().to_cols_array())
    }
}

impl From<Mat4> for glam::Mat4 {
    fn from(m: Mat4) -> Self {
        glam::Mat4::from_cols_array(&m.to_cols_array())
    }
}
