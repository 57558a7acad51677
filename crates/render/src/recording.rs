use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::backend::{
    BackendError, BackendResult, BufferHandle, BufferTarget, BufferUsage, GpuBackend, IndexType,
    PrimitiveMode,
};
use crate::uniform::UniformValue;

/// One backend call, as recorded by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GpuCommand {
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    BindBuffer {
        target: BufferTarget,
        handle: Option<BufferHandle>,
    },
    AllocateBuffer {
        target: BufferTarget,
        size: usize,
        usage: BufferUsage,
    },
    BufferData {
        target: BufferTarget,
        len: usize,
        usage: BufferUsage,
    },
    BufferSubData {
        target: BufferTarget,
        offset: usize,
        len: usize,
    },
    EnableVertexAttrib(u32),
    DisableVertexAttrib(u32),
    VertexAttribPointer {
        location: u32,
        components: u32,
        normalized: bool,
        stride: usize,
        offset: usize,
    },
    SetUniform {
        location: u32,
        value: UniformValue,
    },
    DrawArrays {
        mode: PrimitiveMode,
        first: u32,
        count: u32,
    },
    DrawElements {
        mode: PrimitiveMode,
        count: u32,
        ty: IndexType,
        offset: usize,
    },
}

/// Summary counters for reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackendStats {
    pub commands: usize,
    pub live_buffers: usize,
    pub allocations: usize,
    pub allocated_bytes: usize,
    pub draw_calls: usize,
    pub enabled_attribs: usize,
    pub uniforms_set: usize,
}

#[derive(Debug, Default)]
struct BufferState {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
}

/// In-memory backend that validates and records every call.
///
/// Buffer contents are kept byte for byte so callers can inspect what an
/// upload produced. Handle names start at 1; 0 is never issued.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_name: u32,
    buffers: HashMap<BufferHandle, BufferState>,
    vertex_binding: Option<BufferHandle>,
    index_binding: Option<BufferHandle>,
    enabled: BTreeSet<u32>,
    uniforms: BTreeMap<u32, UniformValue>,
    commands: Vec<GpuCommand>,
    allocations: usize,
    draw_calls: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drains the command log, keeping buffer state.
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of storage (re)allocations: `allocate_buffer` plus `buffer_data`.
    pub fn allocation_count(&self) -> usize {
        self.allocations
    }

    pub fn buffer_contents(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&handle).map(|b| b.data.as_slice())
    }

    pub fn buffer_usage(&self, handle: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(&handle).and_then(|b| b.usage)
    }

    pub fn live_buffers(&self) -> Vec<BufferHandle> {
        let mut live: Vec<_> = self.buffers.keys().copied().collect();
        live.sort();
        live
    }

    pub fn bound(&self, target: BufferTarget) -> Option<BufferHandle> {
        match target {
            BufferTarget::Vertex => self.vertex_binding,
            BufferTarget::Index => self.index_binding,
        }
    }

    pub fn enabled_attribs(&self) -> Vec<u32> {
        self.enabled.iter().copied().collect()
    }

    /// Last value uploaded to `location`.
    pub fn uniform_value(&self, location: u32) -> Option<UniformValue> {
        self.uniforms.get(&location).copied()
    }

    pub fn stats(&self) -> BackendStats {
        BackendStats {
            commands: self.commands.len(),
            live_buffers: self.buffers.len(),
            allocations: self.allocations,
            allocated_bytes: self.buffers.values().map(|b| b.data.len()).sum(),
            draw_calls: self.draw_calls,
            enabled_attribs: self.enabled.len(),
            uniforms_set: self.uniforms.len(),
        }
    }

    fn binding_mut(&mut self, target: BufferTarget) -> &mut Option<BufferHandle> {
        match target {
            BufferTarget::Vertex => &mut self.vertex_binding,
            BufferTarget::Index => &mut self.index_binding,
        }
    }

    fn bound_state(&mut self, target: BufferTarget) -> BackendResult<&mut BufferState> {
        let handle = self
            .bound(target)
            .ok_or(BackendError::NothingBound(target))?;
        self.buffers
            .get_mut(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))
    }
}

impl GpuBackend for RecordingBackend {
    fn create_buffer(&mut self) -> BackendResult<BufferHandle> {
        self.next_name = self
            .next_name
            .checked_add(1)
            .ok_or(BackendError::OutOfHandles)?;
        let handle = BufferHandle(self.next_name);
        self.buffers.insert(handle, BufferState::default());
        self.commands.push(GpuCommand::CreateBuffer(handle));
        Ok(handle)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) -> BackendResult<()> {
        self.buffers
            .remove(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))?;
        for target in [BufferTarget::Vertex, BufferTarget::Index] {
            let binding = self.binding_mut(target);
            if *binding == Some(handle) {
                *binding = None;
            }
        }
        self.commands.push(GpuCommand::DeleteBuffer(handle));
        Ok(())
    }

    fn bind_buffer(
        &mut self,
        target: BufferTarget,
        handle: Option<BufferHandle>,
    ) -> BackendResult<()> {
        if let Some(h) = handle {
            if !self.buffers.contains_key(&h) {
                return Err(BackendError::UnknownBuffer(h));
            }
        }
        *self.binding_mut(target) = handle;
        self.commands.push(GpuCommand::BindBuffer { target, handle });
        Ok(())
    }

    fn allocate_buffer(
        &mut self,
        target: BufferTarget,
        size: usize,
        usage: BufferUsage,
    ) -> BackendResult<()> {
        let state = self.bound_state(target)?;
        state.data = vec![0; size];
        state.usage = Some(usage);
        self.allocations += 1;
        self.commands.push(GpuCommand::AllocateBuffer {
            target,
            size,
            usage,
        });
        Ok(())
    }

    fn buffer_data(
        &mut self,
        target: BufferTarget,
        bytes: &[u8],
        usage: BufferUsage,
    ) -> BackendResult<()> {
        let state = self.bound_state(target)?;
        state.data = bytes.to_vec();
        state.usage = Some(usage);
        self.allocations += 1;
        self.commands.push(GpuCommand::BufferData {
            target,
            len: bytes.len(),
            usage,
        });
        Ok(())
    }

    fn buffer_sub_data(
        &mut self,
        target: BufferTarget,
        offset: usize,
        bytes: &[u8],
    ) -> BackendResult<()> {
        let state = self.bound_state(target)?;
        let end = offset + bytes.len();
        if end > state.data.len() {
            return Err(BackendError::OutOfRange {
                offset,
                end,
                size: state.data.len(),
            });
        }
        state.data[offset..end].copy_from_slice(bytes);
        self.commands.push(GpuCommand::BufferSubData {
            target,
            offset,
            len: bytes.len(),
        });
        Ok(())
    }

    fn enable_vertex_attrib(&mut self, location: u32) {
        self.enabled.insert(location);
        self.commands.push(GpuCommand::EnableVertexAttrib(location));
    }

    fn disable_vertex_attrib(&mut self, location: u32) {
        self.enabled.remove(&location);
        self.commands.push(GpuCommand::DisableVertexAttrib(location));
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: u32,
        normalized: bool,
        stride: usize,
        offset: usize,
    ) -> BackendResult<()> {
        self.bound_state(BufferTarget::Vertex)?;
        self.commands.push(GpuCommand::VertexAttribPointer {
            location,
            components,
            normalized,
            stride,
            offset,
        });
        Ok(())
    }

    fn set_uniform(&mut self, location: u32, value: UniformValue) {
        self.uniforms.insert(location, value);
        self.commands
            .push(GpuCommand::SetUniform { location, value });
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) -> BackendResult<()> {
        self.bound_state(BufferTarget::Vertex)?;
        self.draw_calls += 1;
        self.commands
            .push(GpuCommand::DrawArrays { mode, first, count });
        Ok(())
    }

    fn draw_elements(
        &mut self,
        mode: PrimitiveMode,
        count: u32,
        ty: IndexType,
        offset: usize,
    ) -> BackendResult<()> {
        let size = self.bound_state(BufferTarget::Index)?.data.len();
        let end = offset + count as usize * ty.size_bytes();
        if end > size {
            return Err(BackendError::OutOfRange { offset, end, size });
        }
        self.draw_calls += 1;
        self.commands.push(GpuCommand::DrawElements {
            mode,
            count,
            ty,
            offset,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_start_at_one_and_are_unique() {
        let mut gpu = RecordingBackend::new();
        let a = gpu.create_buffer().unwrap();
        let b = gpu.create_buffer().unwrap();
        assert_eq!(a, BufferHandle(1));
        assert_ne!(a, b);
        assert_eq!(gpu.live_buffers(), vec![a, b]);
    }

    #[test]
    fn upload_requires_binding() {
        let mut gpu = RecordingBackend::new();
        let err = gpu
            .buffer_data(BufferTarget::Vertex, &[1, 2], BufferUsage::Static)
            .unwrap_err();
        assert_eq!(err, BackendError::NothingBound(BufferTarget::Vertex));
        assert!(gpu.commands().is_empty());
    }

    #[test]
    fn sub_data_updates_in_place() {
        let mut gpu = RecordingBackend::new();
        let h = gpu.create_buffer().unwrap();
        gpu.bind_buffer(BufferTarget::Vertex, Some(h)).unwrap();
        gpu.allocate_buffer(BufferTarget::Vertex, 4, BufferUsage::Dynamic)
            .unwrap();
        gpu.buffer_sub_data(BufferTarget::Vertex, 1, &[7, 8])
            .unwrap();
        assert_eq!(gpu.buffer_contents(h), Some(&[0, 7, 8, 0][..]));
        assert_eq!(gpu.buffer_usage(h), Some(BufferUsage::Dynamic));
        assert_eq!(gpu.allocation_count(), 1);
    }

    #[test]
    fn sub_data_out_of_range_is_rejected() {
        let mut gpu = RecordingBackend::new();
        let h = gpu.create_buffer().unwrap();
        gpu.bind_buffer(BufferTarget::Index, Some(h)).unwrap();
        gpu.buffer_data(BufferTarget::Index, &[0; 4], BufferUsage::Static)
            .unwrap();
        let err = gpu
            .buffer_sub_data(BufferTarget::Index, 2, &[1, 2, 3])
            .unwrap_err();
        assert_eq!(
            err,
            BackendError::OutOfRange {
                offset: 2,
                end: 5,
                size: 4
            }
        );
    }

    #[test]
    fn delete_unbinds_and_forgets() {
        let mut gpu = RecordingBackend::new();
        let h = gpu.create_buffer().unwrap();
        gpu.bind_buffer(BufferTarget::Vertex, Some(h)).unwrap();
        gpu.delete_buffer(h).unwrap();
        assert_eq!(gpu.bound(BufferTarget::Vertex), None);
        assert_eq!(gpu.delete_buffer(h), Err(BackendError::UnknownBuffer(h)));
        assert_eq!(
            gpu.bind_buffer(BufferTarget::Vertex, Some(h)),
            Err(BackendError::UnknownBuffer(h))
        );
        assert!(gpu.live_buffers().is_empty());
    }

    #[test]
    fn draw_elements_checks_index_storage() {
        let mut gpu = RecordingBackend::new();
        let h = gpu.create_buffer().unwrap();
        gpu.bind_buffer(BufferTarget::Index, Some(h)).unwrap();
        gpu.buffer_data(BufferTarget::Index, &[0; 6], BufferUsage::Static)
            .unwrap();
        gpu.draw_elements(PrimitiveMode::Triangles, 3, IndexType::U16, 0)
            .unwrap();
        assert!(
            gpu.draw_elements(PrimitiveMode::Triangles, 4, IndexType::U16, 0)
                .is_err()
        );
        assert_eq!(gpu.stats().draw_calls, 1);
    }

    #[test]
    fn attrib_tracking_and_stats() {
        let mut gpu = RecordingBackend::new();
        let h = gpu.create_buffer().unwrap();
        gpu.bind_buffer(BufferTarget::Vertex, Some(h)).unwrap();
        gpu.buffer_data(BufferTarget::Vertex, &[0; 12], BufferUsage::Static)
            .unwrap();
        gpu.enable_vertex_attrib(3);
        gpu.enable_vertex_attrib(0);
        gpu.vertex_attrib_pointer(0, 3, false, 12, 0).unwrap();
        assert_eq!(gpu.enabled_attribs(), vec![0, 3]);
        gpu.disable_vertex_attrib(3);

        let stats = gpu.stats();
        assert_eq!(stats.live_buffers, 1);
        assert_eq!(stats.allocated_bytes, 12);
        assert_eq!(stats.enabled_attribs, 1);
        assert_eq!(stats.commands, 7);

        let drained = gpu.take_commands();
        assert_eq!(drained[0], GpuCommand::CreateBuffer(h));
        assert!(gpu.commands().is_empty());
        assert_eq!(gpu.buffer_contents(h).map(<[u8]>::len), Some(12));
    }

    #[test]
    fn attrib_pointer_needs_vertex_buffer() {
        let mut gpu = RecordingBackend::new();
        assert_eq!(
            gpu.vertex_attrib_pointer(0, 3, false, 12, 0),
            Err(BackendError::NothingBound(BufferTarget::Vertex))
        );
    }
}
