use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::uniform::UniformValue;

/// Opaque GPU buffer name issued by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    Vertex,
    /// Element indices.
    Index,
}

/// Upload frequency hint passed with every allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferUsage {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleFan,
    TriangleStrip,
}

impl PrimitiveMode {
    pub const ALL: [PrimitiveMode; 7] = [
        PrimitiveMode::Points,
        PrimitiveMode::Lines,
        PrimitiveMode::LineLoop,
        PrimitiveMode::LineStrip,
        PrimitiveMode::Triangles,
        PrimitiveMode::TriangleFan,
        PrimitiveMode::TriangleStrip,
    ];

    /// Whether the mode assembles filled triangles.
    pub fn is_triangles(self) -> bool {
        matches!(
            self,
            PrimitiveMode::Triangles | PrimitiveMode::TriangleFan | PrimitiveMode::TriangleStrip
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    U16,
}

impl IndexType {
    pub fn size_bytes(self) -> usize {
        match self {
            IndexType::U16 => std::mem::size_of::<u16>(),
        }
    }
}

/// Errors reported by a [`GpuBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("unknown or deleted buffer {0:?}")]
    UnknownBuffer(BufferHandle),
    #[error("no buffer bound to the {0:?} target")]
    NothingBound(BufferTarget),
    #[error("range {offset}..{end} exceeds buffer of {size} bytes")]
    OutOfRange {
        offset: usize,
        end: usize,
        size: usize,
    },
    #[error("buffer names exhausted")]
    OutOfHandles,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// The slice of a GPU context that mesh code drives.
///
/// Buffer operations act on whatever buffer is currently bound to the given
/// target, mirroring the bind-then-operate model of GL-style APIs. Attribute
/// pointers refer to the buffer bound to [`BufferTarget::Vertex`].
pub trait GpuBackend {
    fn create_buffer(&mut self) -> BackendResult<BufferHandle>;

    /// Deleting a bound buffer also unbinds it.
    fn delete_buffer(&mut self, handle: BufferHandle) -> BackendResult<()>;

    /// `None` unbinds the target.
    fn bind_buffer(
        &mut self,
        target: BufferTarget,
        handle: Option<BufferHandle>,
    ) -> BackendResult<()>;

    /// Reserves `size` bytes of undefined content, dropping the old storage.
    fn allocate_buffer(
        &mut self,
        target: BufferTarget,
        size: usize,
        usage: BufferUsage,
    ) -> BackendResult<()>;

    /// Replaces the storage with exactly `bytes`.
    fn buffer_data(
        &mut self,
        target: BufferTarget,
        bytes: &[u8],
        usage: BufferUsage,
    ) -> BackendResult<()>;

    /// Overwrites part of the existing storage without re-allocating.
    fn buffer_sub_data(
        &mut self,
        target: BufferTarget,
        offset: usize,
        bytes: &[u8],
    ) -> BackendResult<()>;

    fn enable_vertex_attrib(&mut self, location: u32);

    fn disable_vertex_attrib(&mut self, location: u32);

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: u32,
        normalized: bool,
        stride: usize,
        offset: usize,
    ) -> BackendResult<()>;

    /// Uploads to a uniform of the program in use.
    fn set_uniform(&mut self, location: u32, value: UniformValue);

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) -> BackendResult<()>;

    fn draw_elements(
        &mut self,
        mode: PrimitiveMode,
        count: u32,
        ty: IndexType,
        offset: usize,
    ) -> BackendResult<()>;
}
