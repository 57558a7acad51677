use glfx_render::{
    BackendResult, BufferHandle, BufferTarget, BufferUsage, GpuBackend, IndexType, PrimitiveMode,
    ShaderLike,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::format::VertexFormat;
use crate::processor::MeshProcessor;
use crate::vertex::Vertex;

/// Construction-time mesh settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshOptions {
    /// Draw through an index buffer with `draw_elements`.
    pub indexed: bool,
    /// Vertex data is expected to change between flushes.
    pub dynamic: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            indexed: true,
            dynamic: false,
        }
    }
}

impl MeshOptions {
    /// Usage hint passed with every allocation.
    pub fn usage(&self) -> BufferUsage {
        if self.dynamic {
            BufferUsage::Dynamic
        } else {
            BufferUsage::Static
        }
    }
}

/// CPU-side vertex and index lists mirrored into GPU buffers on `flush`.
///
/// Buffers are created on the first flush and grow only when the data
/// outgrows the recorded capacity. Smaller or equal uploads update the
/// existing storage in place.
#[derive(Debug)]
pub struct Mesh<V> {
    vertices: Vec<V>,
    indices: Vec<u16>,
    vbo: Option<BufferHandle>,
    ibo: Option<BufferHandle>,
    vbo_capacity: usize,
    ibo_capacity: usize,
    format: Option<VertexFormat>,
    options: MeshOptions,
}

impl<V: Vertex> Default for Mesh<V> {
    fn default() -> Self {
        Self::with_options(MeshOptions::default())
    }
}

impl<V: Vertex> Mesh<V> {
    /// Empty mesh. `indexed` selects `draw_elements` over `draw_arrays`;
    /// `dynamic` selects the dynamic upload path.
    pub fn new(indexed: bool, dynamic: bool) -> Self {
        Self::with_options(MeshOptions { indexed, dynamic })
    }

    /// Empty mesh with the given options. No GPU resources are created
    /// until the first flush.
    pub fn with_options(options: MeshOptions) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            vbo: None,
            ibo: None,
            vbo_capacity: 0,
            ibo_capacity: 0,
            format: None,
            options,
        }
    }

    /// Options fixed at construction.
    pub fn options(&self) -> MeshOptions {
        self.options
    }

    /// Whether draws go through the index buffer.
    pub fn is_indexed(&self) -> bool {
        self.options.indexed
    }

    pub fn is_dynamic(&self) -> bool {
        self.options.dynamic
    }

    /// Appends a vertex. Takes effect on the GPU at the next flush.
    pub fn add_vertex(&mut self, v: V) {
        self.vertices.push(v);
    }

    /// Appends one element index. Ignored by non-indexed meshes.
    pub fn add_index(&mut self, i: u16) {
        self.indices.push(i);
    }

    /// Appends three element indices.
    pub fn add_triangle(&mut self, i0: u16, i1: u16, i2: u16) {
        self.indices.extend_from_slice(&[i0, i1, i2]);
    }

    /// Vertex number of element `i`: the stored index when indexed, `i`
    /// itself otherwise.
    ///
    /// Panics if the mesh is indexed and `i` is past the index list.
    pub fn get_index(&self, i: usize) -> usize {
        if self.options.indexed {
            usize::from(self.indices[i])
        } else {
            i
        }
    }

    /// Number of CPU-side vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of CPU-side indices.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of elements a draw call walks.
    pub fn element_count(&self) -> usize {
        if self.options.indexed {
            self.indices.len()
        } else {
            self.vertices.len()
        }
    }

    /// CPU-side vertices in upload order.
    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    /// Mutable vertices. Edits reach the GPU at the next flush.
    pub fn vertices_mut(&mut self) -> &mut [V] {
        &mut self.vertices
    }

    /// CPU-side element indices.
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Vertex `i`, if present.
    pub fn vertex(&self, i: usize) -> Option<&V> {
        self.vertices.get(i)
    }

    /// Mutable vertex `i`, if present.
    pub fn vertex_mut(&mut self, i: usize) -> Option<&mut V> {
        self.vertices.get_mut(i)
    }

    /// Format resolved from the first vertex at the first non-empty flush.
    pub fn format(&self) -> Option<&VertexFormat> {
        self.format.as_ref()
    }

    /// Bytes of vertex storage allocated on the GPU.
    pub fn vertex_capacity(&self) -> usize {
        self.vbo_capacity
    }

    /// Bytes of index storage allocated on the GPU.
    pub fn index_capacity(&self) -> usize {
        self.ibo_capacity
    }

    /// Runs `processor` over this mesh's data in place.
    pub fn process<P: MeshProcessor<V> + ?Sized>(&mut self, processor: &P) {
        processor.process(self);
    }

    /// Drops the CPU-side data. GPU buffers and their capacities are kept
    /// for the next flush.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Interleaved vertex data in format order.
    pub fn vertex_data(&self) -> Vec<f32> {
        let per_vertex = self.format.as_ref().map_or(0, VertexFormat::components);
        let mut out = Vec::with_capacity(per_vertex * self.vertices.len());
        for v in &self.vertices {
            v.write_components(&mut out);
        }
        out
    }

    /// Uploads the current data, growing GPU storage only when needed.
    /// Does nothing while the mesh has no vertices.
    pub fn flush(&mut self, gpu: &mut impl GpuBackend) -> BackendResult<()> {
        let Some(first) = self.vertices.first() else {
            return Ok(());
        };
        if self.format.is_none() {
            self.format = Some(first.format());
        }
        debug_assert!(
            !self.options.indexed
                || self
                    .indices
                    .iter()
                    .all(|&i| usize::from(i) < self.vertices.len()),
            "index out of range for {} vertices",
            self.vertices.len()
        );

        let usage = self.options.usage();
        let vbo = match self.vbo {
            Some(h) => h,
            None => {
                let h = gpu.create_buffer()?;
                debug!(handle = h.0, ?usage, "created vertex buffer");
                self.vbo = Some(h);
                h
            }
        };
        let data = self.vertex_data();
        upload(
            gpu,
            BufferTarget::Vertex,
            vbo,
            bytemuck::cast_slice(&data),
            &mut self.vbo_capacity,
            usage,
        )?;

        if self.options.indexed {
            let ibo = match self.ibo {
                Some(h) => h,
                None => {
                    let h = gpu.create_buffer()?;
                    debug!(handle = h.0, ?usage, "created index buffer");
                    self.ibo = Some(h);
                    h
                }
            };
            upload(
                gpu,
                BufferTarget::Index,
                ibo,
                bytemuck::cast_slice(&self.indices),
                &mut self.ibo_capacity,
                usage,
            )?;
        }
        Ok(())
    }

    /// Draws what the last flush uploaded. Never uploads.
    ///
    /// Attributes and buffer bindings are released even when binding or
    /// drawing fails; the first error is returned.
    pub fn render(
        &self,
        gpu: &mut impl GpuBackend,
        mode: PrimitiveMode,
        shader: &mut impl ShaderLike,
    ) -> BackendResult<()> {
        let (Some(vbo), Some(format)) = (self.vbo, self.format.as_ref()) else {
            warn!("render called on a mesh that was never flushed");
            return Ok(());
        };

        let drawn = self.bind_and_draw(gpu, vbo, format, mode, shader);
        format.unbind(gpu, shader);
        let released = self.release_buffers(gpu);
        drawn.and(released)
    }

    fn bind_and_draw(
        &self,
        gpu: &mut impl GpuBackend,
        vbo: BufferHandle,
        format: &VertexFormat,
        mode: PrimitiveMode,
        shader: &mut impl ShaderLike,
    ) -> BackendResult<()> {
        if self.options.indexed {
            gpu.bind_buffer(BufferTarget::Index, self.ibo)?;
        }
        gpu.bind_buffer(BufferTarget::Vertex, Some(vbo))?;
        format.bind(gpu, shader)?;
        if self.options.indexed {
            trace!(?mode, count = self.indices.len(), "draw elements");
            gpu.draw_elements(mode, self.indices.len() as u32, IndexType::U16, 0)
        } else {
            trace!(?mode, count = self.vertices.len(), "draw arrays");
            gpu.draw_arrays(mode, 0, self.vertices.len() as u32)
        }
    }

    fn release_buffers(&self, gpu: &mut impl GpuBackend) -> BackendResult<()> {
        if self.options.indexed {
            gpu.bind_buffer(BufferTarget::Index, None)?;
        }
        gpu.bind_buffer(BufferTarget::Vertex, None)
    }

    /// Releases the GPU buffers. Consumes the mesh, so it cannot be drawn or
    /// destroyed again.
    pub fn destroy(self, gpu: &mut impl GpuBackend) -> BackendResult<()> {
        for handle in [self.vbo, self.ibo].into_iter().flatten() {
            gpu.delete_buffer(handle)?;
        }
        Ok(())
    }
}

fn upload(
    gpu: &mut impl GpuBackend,
    target: BufferTarget,
    handle: BufferHandle,
    bytes: &[u8],
    capacity: &mut usize,
    usage: BufferUsage,
) -> BackendResult<()> {
    gpu.bind_buffer(target, Some(handle))?;
    if bytes.len() > *capacity {
        debug!(?target, from = *capacity, to = bytes.len(), "growing buffer");
        match usage {
            BufferUsage::Static => gpu.buffer_data(target, bytes, usage)?,
            BufferUsage::Dynamic => {
                gpu.allocate_buffer(target, bytes.len(), usage)?;
                gpu.buffer_sub_data(target, 0, bytes)?;
            }
        }
        *capacity = bytes.len();
    } else if !bytes.is_empty() {
        trace!(?target, len = bytes.len(), "updating buffer in place");
        gpu.buffer_sub_data(target, 0, bytes)?;
    }
    gpu.bind_buffer(target, None)
}
