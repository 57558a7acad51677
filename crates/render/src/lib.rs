//! GPU interface: the buffer, uniform and draw calls mesh code issues,
//! shader input lookup, and an in-memory recording backend.
//!
//! # Invariants
//! - Buffer operations act on the buffer bound to their target.
//! - Shader locations resolve to `Some(loc)` or `None`; misses are never cached.
//! - Uploads to a missing uniform are skipped, never sent to the backend.
//! - The recording backend rejects misuse with a [`BackendError`] instead of
//!   silently ignoring it.

mod backend;
mod recording;
mod shader;
mod uniform;

pub use backend::{
    BackendError, BackendResult, BufferHandle, BufferTarget, BufferUsage, GpuBackend, IndexType,
    PrimitiveMode,
};
pub use recording::{BackendStats, GpuCommand, RecordingBackend};
pub use shader::{CachedShader, FixedLocations, LocationQuery, ShaderLike};
pub use uniform::{Uniform, UniformValue, set_uniform};
