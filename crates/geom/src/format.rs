use glfx_render::{BackendResult, GpuBackend, ShaderLike};
use serde::{Deserialize, Serialize};

/// A float attribute of `components` lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexAttrib {
    pub components: u32,
    /// Fixed-point data is mapped to 0..1 by the GPU when set.
    pub normalized: bool,
}

impl VertexAttrib {
    /// Bytes this attribute occupies in one vertex.
    pub fn size_bytes(&self) -> usize {
        self.components as usize * std::mem::size_of::<f32>()
    }
}

/// Ordered list of named vertex attributes, interleaved in registration
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexFormat {
    attribs: Vec<(String, VertexAttrib)>,
}

impl VertexFormat {
    /// Format with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`. Re-registering an existing name replaces its
    /// description but keeps its position.
    pub fn add(&mut self, name: &str, components: u32, normalized: bool) -> &mut Self {
        let attrib = VertexAttrib {
            components,
            normalized,
        };
        match self.attribs.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = attrib,
            None => self.attribs.push((name.to_owned(), attrib)),
        }
        self
    }

    /// Builder form of [`VertexFormat::add`].
    pub fn with(mut self, name: &str, components: u32, normalized: bool) -> Self {
        self.add(name, components, normalized);
        self
    }

    /// Description of `name`, if registered.
    pub fn get(&self, name: &str) -> Option<VertexAttrib> {
        self.attribs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| *a)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attribs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attribs.is_empty()
    }

    /// Stride of one interleaved vertex in bytes.
    pub fn size(&self) -> usize {
        self.attribs.iter().map(|(_, a)| a.size_bytes()).sum()
    }

    /// Floats per vertex.
    pub fn components(&self) -> usize {
        self.attribs.iter().map(|(_, a)| a.components as usize).sum()
    }

    /// `(name, attribute, byte offset)` in interleave order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, VertexAttrib, usize)> + '_ {
        self.attribs.iter().scan(0usize, |offset, (name, attrib)| {
            let at = *offset;
            *offset += attrib.size_bytes();
            Some((name.as_str(), *attrib, at))
        })
    }

    /// Enables and points every attribute the shader exposes at the bound
    /// vertex buffer. Attributes the shader lacks are skipped but still
    /// occupy their slot in the stride.
    pub fn bind(
        &self,
        gpu: &mut impl GpuBackend,
        shader: &mut impl ShaderLike,
    ) -> BackendResult<()> {
        let stride = self.size();
        for (name, attrib, offset) in self.attributes() {
            let Some(loc) = shader.attrib_location(name) else {
                continue;
            };
            gpu.enable_vertex_attrib(loc);
            gpu.vertex_attrib_pointer(loc, attrib.components, attrib.normalized, stride, offset)?;
        }
        Ok(())
    }

    /// Disables every attribute the shader exposes.
    pub fn unbind(&self, gpu: &mut impl GpuBackend, shader: &mut impl ShaderLike) {
        for (name, _) in &self.attribs {
            if let Some(loc) = shader.attrib_location(name) {
                gpu.disable_vertex_attrib(loc);
            }
        }
    }
}
