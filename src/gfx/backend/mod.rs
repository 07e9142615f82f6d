//! # Render Backend
//!
//! The seam between scene objects and the GPU. Meshes, models and shader
//! programs only ever talk to a [`RenderBackend`]; the production
//! implementation is [`RenderEngine`](crate::gfx::rendering::RenderEngine)
//! on wgpu, and [`RecordingBackend`] captures the same command stream
//! headlessly.
//!
//! The interface is a small state machine: a program is made active, named
//! uniforms are written into the active program (they persist between
//! draws), textures are bound to numbered units until unbound, and indexed
//! draws consume whatever state is current at the time of the call.
//!
//! Resource handles are owned values. Dropping a handle releases the GPU
//! resource behind it.

pub mod recording;

use std::fmt;

use crate::gfx::{
    color::Color,
    resources::{texture::TextureImage, uniforms::UniformValue},
    scene::vertex::Vertex,
};

pub use recording::RecordingBackend;

/// A programmable pipeline stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// WGSL entry point every source for this stage must define.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

impl From<IndexFormat> for wgpu::IndexFormat {
    fn from(format: IndexFormat) -> Self {
        match format {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        }
    }
}

/// Index data handed to [`RenderBackend::create_index_buffer`].
#[derive(Copy, Clone, Debug)]
pub enum IndexData<'a> {
    U16(&'a [u16]),
    U32(&'a [u32]),
}

impl IndexData<'_> {
    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(indices) => indices.len(),
            IndexData::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            IndexData::U16(_) => IndexFormat::Uint16,
            IndexData::U32(_) => IndexFormat::Uint32,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(indices) => bytemuck::cast_slice(indices),
            IndexData::U32(indices) => bytemuck::cast_slice(indices),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            IndexData::U16(indices) => Box::new(indices.iter().map(|&i| i as u32)),
            IndexData::U32(indices) => Box::new(indices.iter().copied()),
        }
    }
}

/// How triangles are rasterized.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
}

/// GPU operations needed to upload and draw the scene.
pub trait RenderBackend {
    /// A compiled but unlinked shader stage.
    type Stage;
    /// A linked vertex + fragment program.
    type Program;
    type Buffer;
    type Texture;

    /// Compiles one stage. `Err` carries the compiler diagnostic.
    fn compile_stage(
        &mut self,
        label: &str,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Self::Stage, String>;

    /// Links two compiled stages into a program. `Err` carries the linker
    /// diagnostic. The stages may be dropped once this returns.
    fn link_program(
        &mut self,
        label: &str,
        vertex: &Self::Stage,
        fragment: &Self::Stage,
    ) -> Result<Self::Program, String>;

    fn create_vertex_buffer(&mut self, label: &str, vertices: &[Vertex]) -> Self::Buffer;

    fn create_index_buffer(&mut self, label: &str, indices: IndexData<'_>) -> Self::Buffer;

    fn create_texture(&mut self, label: &str, image: &TextureImage) -> Self::Texture;

    /// Makes `program` the target of subsequent uniform writes and draws.
    fn use_program(&mut self, program: &Self::Program);

    /// Writes a named uniform into the active program.
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn bind_texture(&mut self, unit: u32, texture: &Self::Texture);

    /// Empties every texture unit. A sampler pointing at an empty unit
    /// samples opaque white.
    fn unbind_textures(&mut self);

    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Starts a frame that will be cleared to `clear` (color) and 1.0 (depth).
    fn begin_frame(&mut self, clear: Color);

    /// Draws `count` indexed triangles-list vertices with the current state.
    fn draw_indexed(
        &mut self,
        vertices: &Self::Buffer,
        indices: &Self::Buffer,
        format: IndexFormat,
        count: u32,
    );

    /// Finishes the frame and presents it.
    fn end_frame(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_data_reports_format_and_bytes() {
        let small = [0u16, 1, 2];
        let data = IndexData::U16(&small);
        assert_eq!(data.format(), IndexFormat::Uint16);
        assert_eq!(data.as_bytes().len(), 6);

        let large = [0u32, 70_000];
        let data = IndexData::U32(&large);
        assert_eq!(data.format(), IndexFormat::Uint32);
        assert_eq!(data.iter().collect::<Vec<_>>(), vec![0, 70_000]);
    }

    #[test]
    fn test_stage_entry_points() {
        assert_eq!(ShaderStage::Vertex.entry_point(), "vs_main");
        assert_eq!(ShaderStage::Fragment.to_string(), "fragment");
    }
}
