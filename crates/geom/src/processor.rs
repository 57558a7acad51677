use glfx_render::PrimitiveMode;
use tracing::{debug, info_span};

use crate::mesh::Mesh;
use crate::vertex::Vertex;

/// In-place transformation of a mesh's vertex data.
pub trait MeshProcessor<V: Vertex> {
    fn process(&self, mesh: &mut Mesh<V>);
}

/// Recomputes vertex normals from the triangles `mode` assembles.
///
/// Face normals are accumulated unnormalized, so larger faces weigh more,
/// and every vertex normal is normalized at the end. Existing normals are
/// part of the sum; zero them first for a clean recompute. A vertex that
/// ends with a zero normal becomes NaN.
///
/// Fans advance two elements per step starting at element 0, so the
/// first triangle is degenerate and every other fan triangle is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalCalculator {
    pub mode: PrimitiveMode,
}

impl NormalCalculator {
    pub fn new(mode: PrimitiveMode) -> Self {
        Self { mode }
    }
}

fn accumulate<V: Vertex>(vertices: &mut [V], [i0, i1, i2]: [usize; 3]) {
    let p0 = vertices[i0].position();
    let p1 = vertices[i1].position();
    let p2 = vertices[i2].position();
    let n = (p1 - p0).cross(p2 - p0);
    for i in [i0, i1, i2] {
        let sum = vertices[i].normal() + n;
        vertices[i].set_normal(sum);
    }
}

impl<V: Vertex> MeshProcessor<V> for NormalCalculator {
    fn process(&self, mesh: &mut Mesh<V>) {
        let _span = info_span!("normals", mode = ?self.mode, vertices = mesh.vertex_count())
            .entered();
        let n = mesh.element_count();

        let triangles: Vec<[usize; 3]> = match self.mode {
            PrimitiveMode::Points
            | PrimitiveMode::Lines
            | PrimitiveMode::LineLoop
            | PrimitiveMode::LineStrip => Vec::new(),
            PrimitiveMode::Triangles => (0..n)
                .step_by(3)
                .take_while(|i| i + 2 < n)
                .map(|i| [mesh.get_index(i), mesh.get_index(i + 1), mesh.get_index(i + 2)])
                .collect(),
            PrimitiveMode::TriangleFan => (0..n)
                .step_by(2)
                .take_while(|i| i + 1 < n)
                .map(|i| [mesh.get_index(0), mesh.get_index(i), mesh.get_index(i + 1)])
                .collect(),
            PrimitiveMode::TriangleStrip => (0..n.saturating_sub(2))
                .map(|i| {
                    if i % 2 == 0 {
                        [mesh.get_index(i), mesh.get_index(i + 1), mesh.get_index(i + 2)]
                    } else {
                        [mesh.get_index(i + 2), mesh.get_index(i + 1), mesh.get_index(i)]
                    }
                })
                .collect(),
        };

        let vertices = mesh.vertices_mut();
        for tri in &triangles {
            accumulate(vertices, *tri);
        }
        for v in vertices.iter_mut() {
            let normal = v.normal().normalized();
            v.set_normal(normal);
        }
        debug!(faces = triangles.len(), "normals recomputed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::LitVertex;
    use glfx_math::{Vec2, Vec3};

    const EPS: f32 = 1e-5;

    fn lit(x: f32, y: f32, z: f32) -> LitVertex {
        LitVertex::new(Vec3::new(x, y, z), Vec2::ZERO)
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn non_indexed_triangle_faces_plus_z() {
        let mut mesh = Mesh::new(false, false);
        mesh.add_vertex(lit(0.0, 0.0, 0.0));
        mesh.add_vertex(lit(1.0, 0.0, 0.0));
        mesh.add_vertex(lit(0.0, 1.0, 0.0));
        mesh.process(&NormalCalculator::new(PrimitiveMode::Triangles));
        for v in mesh.vertices() {
            assert!(close(v.normal, Vec3::Z), "{:?}", v.normal);
        }
    }

    #[test]
    fn shared_vertices_average_adjacent_faces() {
        // two faces folded along the y axis: one in the XY plane, one in YZ
        let mut mesh = Mesh::default();
        mesh.add_vertex(lit(0.0, 0.0, 0.0));
        mesh.add_vertex(lit(0.0, 1.0, 0.0));
        mesh.add_vertex(lit(1.0, 0.0, 0.0));
        mesh.add_vertex(lit(0.0, 0.0, 1.0));
        mesh.add_triangle(0, 2, 1);
        mesh.add_triangle(0, 1, 3);
        mesh.process(&NormalCalculator::new(PrimitiveMode::Triangles));

        let diagonal = Vec3::new(1.0, 0.0, 1.0).normalized();
        assert!(close(mesh.vertices()[0].normal, diagonal));
        assert!(close(mesh.vertices()[1].normal, diagonal));
        assert!(close(mesh.vertices()[2].normal, Vec3::Z));
        assert!(close(mesh.vertices()[3].normal, Vec3::X));
    }

    #[test]
    fn strip_alternates_winding() {
        let mut mesh = Mesh::new(false, false);
        for (x, y) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0), (2.0, 0.0)] {
            mesh.add_vertex(lit(x, y, 0.0));
        }
        mesh.process(&NormalCalculator::new(PrimitiveMode::TriangleStrip));
        for v in mesh.vertices() {
            assert!(close(v.normal, Vec3::new(0.0, 0.0, -1.0)), "{:?}", v.normal);
        }
    }

    #[test]
    fn fan_advances_two_elements_per_step() {
        let mut mesh = Mesh::new(false, false);
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            mesh.add_vertex(lit(x, y, 0.0));
        }
        mesh.process(&NormalCalculator::new(PrimitiveMode::TriangleFan));
        let normals: Vec<_> = mesh.vertices().iter().map(|v| v.normal).collect();
        assert!(close(normals[0], Vec3::Z));
        assert!(close(normals[2], Vec3::Z));
        assert!(close(normals[3], Vec3::Z));
        // only touched by the degenerate first step
        assert!(normals[1].x.is_nan());
    }

    #[test]
    fn line_modes_only_normalize() {
        let mut mesh = Mesh::new(false, false);
        mesh.add_vertex(lit(0.0, 0.0, 0.0).with_normal(Vec3::new(0.0, 3.0, 4.0)));
        mesh.add_vertex(lit(1.0, 0.0, 0.0).with_normal(Vec3::new(2.0, 0.0, 0.0)));
        mesh.process(&NormalCalculator::new(PrimitiveMode::Lines));
        assert!(close(mesh.vertices()[0].normal, Vec3::new(0.0, 0.6, 0.8)));
        assert!(close(mesh.vertices()[1].normal, Vec3::X));
    }

    #[test]
    fn incomplete_trailing_triangle_is_ignored() {
        let mut mesh = Mesh::new(false, false);
        mesh.add_vertex(lit(0.0, 0.0, 0.0));
        mesh.add_vertex(lit(1.0, 0.0, 0.0));
        mesh.add_vertex(lit(0.0, 1.0, 0.0));
        mesh.add_vertex(lit(5.0, 5.0, 5.0).with_normal(Vec3::Y));
        mesh.process(&NormalCalculator::new(PrimitiveMode::Triangles));
        assert!(close(mesh.vertices()[3].normal, Vec3::Y));
    }
}
