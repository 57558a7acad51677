use glfx_math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::format::VertexFormat;

/// A vertex type a [`Mesh`](crate::Mesh) can store and upload.
///
/// `write_components` must append exactly `format().components()` floats,
/// in the order the format lists its attributes.
pub trait Vertex {
    fn format(&self) -> VertexFormat;
    fn write_components(&self, out: &mut Vec<f32>);
    fn position(&self) -> Vec3;
    fn normal(&self) -> Vec3;
    fn set_normal(&mut self, normal: Vec3);
}

/// Position, normal and texture coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LitVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl LitVertex {
    /// Vertex with a zero normal, ready for normal calculation.
    pub fn new(position: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal: Vec3::ZERO,
            uv,
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }

    pub fn layout() -> VertexFormat {
        VertexFormat::new()
            .with("a_position", 3, false)
            .with("a_normal", 3, false)
            .with("a_uv", 2, false)
    }
}

impl Vertex for LitVertex {
    fn format(&self) -> VertexFormat {
        Self::layout()
    }

    fn write_components(&self, out: &mut Vec<f32>) {
        out.extend_from_slice(&self.position.to_array());
        out.extend_from_slice(&self.normal.to_array());
        out.extend_from_slice(&self.uv.to_array());
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn normal(&self) -> Vec3 {
        self.normal
    }

    fn set_normal(&mut self, normal: Vec3) {
        self.normal = normal;
    }
}
