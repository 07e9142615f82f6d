//! # Geometry Buffers
//!
//! GPU-resident vertex and index buffers shared by primitive and imported
//! meshes. Buffers are uploaded once at construction and never resized;
//! dropping a [`GeometryBuffers`] releases both.
//!
//! Index data is validated before upload so that every draw stays inside
//! the vertex buffer.

use std::fmt;

use crate::{
    error::MeshError,
    gfx::{
        backend::{IndexData, IndexFormat, RenderBackend},
        scene::vertex::Vertex,
    },
};

/// Checks that every index addresses an existing vertex.
pub fn validate_indices(
    indices: impl IntoIterator<Item = u32>,
    vertex_count: usize,
) -> Result<(), MeshError> {
    match indices
        .into_iter()
        .enumerate()
        .find(|&(_, index)| index as usize >= vertex_count)
    {
        Some((position, index)) => Err(MeshError::IndexOutOfRange {
            index,
            position,
            vertex_count,
        }),
        None => Ok(()),
    }
}

/// An uploaded vertex buffer with its index buffer.
pub struct GeometryBuffers<B: RenderBackend> {
    vertex_buffer: B::Buffer,
    index_buffer: B::Buffer,
    index_format: IndexFormat,
    vertex_count: usize,
    index_count: u32,
}

impl<B: RenderBackend> fmt::Debug for GeometryBuffers<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryBuffers")
            .field("index_format", &self.index_format)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .finish()
    }
}

impl<B: RenderBackend> GeometryBuffers<B> {
    /// Validates and uploads `vertices` and `indices`.
    pub fn upload(
        backend: &mut B,
        label: &str,
        vertices: &[Vertex],
        indices: IndexData<'_>,
    ) -> Result<Self, MeshError> {
        validate_indices(indices.iter(), vertices.len())?;

        let vertex_buffer =
            backend.create_vertex_buffer(&format!("{label} Vertex Buffer"), vertices);
        let index_buffer = backend.create_index_buffer(&format!("{label} Index Buffer"), indices);

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_format: indices.format(),
            vertex_count: vertices.len(),
            index_count: indices.len() as u32,
        })
    }

    /// Issues one indexed draw with whatever program and textures are bound.
    /// Empty geometry draws nothing.
    pub fn draw(&self, backend: &mut B) {
        if self.index_count == 0 {
            return;
        }
        backend.draw_indexed(
            &self.vertex_buffer,
            &self.index_buffer,
            self.index_format,
            self.index_count,
        );
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn index_format(&self) -> IndexFormat {
        self.index_format
    }
}
