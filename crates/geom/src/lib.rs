//! Geometry: vertex formats, CPU-side meshes mirrored into GPU buffers, and
//! mesh processors such as normal recalculation.
//!
//! # Invariants
//! - A mesh's vertex format is fixed by its first vertex at the first flush.
//! - GPU storage grows only when uploaded data exceeds recorded capacity.
//! - Rendering never uploads; call `flush` after editing data.
//! - A mesh owns its buffer handles and releases them in `destroy(self)`.

pub mod format;
pub mod mesh;
pub mod processor;
pub mod vertex;

pub use format::{VertexAttrib, VertexFormat};
pub use mesh::{Mesh, MeshOptions};
pub use processor::{MeshProcessor, NormalCalculator};
pub use vertex::{LitVertex, Vertex};
