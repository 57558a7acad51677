use glfx_math::{Mat4, Vec2, Vec3, Vec4};
use serde::Serialize;
use tracing::trace;

use crate::backend::GpuBackend;
use crate::shader::ShaderLike;

/// A value uploaded to a shader uniform.
///
/// Matrices are held in column-major order, the layout a non-transposed
/// matrix upload expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v.to_array())
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v.to_array())
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v.values())
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m.to_cols_array())
    }
}

/// A resolved uniform location of the currently used program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uniform {
    location: u32,
}

impl Uniform {
    pub fn new(location: u32) -> Self {
        Self { location }
    }

    pub fn location(&self) -> u32 {
        self.location
    }

    pub fn set(&self, gpu: &mut impl GpuBackend, value: impl Into<UniformValue>) {
        gpu.set_uniform(self.location, value.into());
    }

    pub fn set_int(&self, gpu: &mut impl GpuBackend, v: i32) {
        self.set(gpu, v);
    }

    pub fn set_float(&self, gpu: &mut impl GpuBackend, v: f32) {
        self.set(gpu, v);
    }

    pub fn set_vec2(&self, gpu: &mut impl GpuBackend, v: Vec2) {
        self.set(gpu, v);
    }

    pub fn set_vec3(&self, gpu: &mut impl GpuBackend, v: Vec3) {
        self.set(gpu, v);
    }

    pub fn set_vec4(&self, gpu: &mut impl GpuBackend, v: Vec4) {
        self.set(gpu, v);
    }

    /// Uploads `m` column-major.
    pub fn set_mat4(&self, gpu: &mut impl GpuBackend, m: Mat4) {
        self.set(gpu, m);
    }
}

/// Looks `name` up on `shader` and uploads `value` when the program exposes
/// it. Returns whether anything was uploaded.
pub fn set_uniform(
    gpu: &mut impl GpuBackend,
    shader: &mut impl ShaderLike,
    name: &str,
    value: impl Into<UniformValue>,
) -> bool {
    match shader.uniform(name) {
        Some(uniform) => {
            uniform.set(gpu, value);
            true
        }
        None => {
            trace!(name, "skipping upload to missing uniform");
            false
        }
    }
}
