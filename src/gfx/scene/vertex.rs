//! # Vertex Data Structures
//!
//! GPU-compatible vertex format shared by primitive and imported meshes,
//! plus the parser for flat interleaved float arrays.

/// Number of floats making up one interleaved vertex:
/// position (3), normal (3), texture coordinate (2).
pub const FLOATS_PER_VERTEX: usize = 8;

/// A 3D vertex with position, normal and texture coordinate.
///
/// The `#[repr(C)]` layout is uploaded verbatim into vertex buffers, so the
/// field order must match [`Vertex::desc`] and the WGSL `VertexInput` struct.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// Normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
    /// Texture coordinate [s, t]
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Attribute 0: Position (Float32x3) at shader location 0
    /// - Attribute 1: Normal (Float32x3) at shader location 1
    /// - Attribute 2: Texture coordinate (Float32x2) at shader location 2
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Result of parsing a flat interleaved float array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatVertices {
    pub vertices: Vec<Vertex>,
    /// Trailing floats that did not form a complete vertex and were dropped.
    pub dropped: usize,
}

impl FlatVertices {
    /// Groups `floats` into vertices of [`FLOATS_PER_VERTEX`] elements.
    ///
    /// Parsing stops at the first group whose last element would lie past
    /// the end of the input; a partial vertex is never produced and the
    /// leftover count is reported in [`FlatVertices::dropped`].
    pub fn parse(floats: &[f32]) -> Self {
        let groups = floats.chunks_exact(FLOATS_PER_VERTEX);
        let dropped = groups.remainder().len();
        let vertices = groups
            .map(|g| Vertex::new([g[0], g[1], g[2]], [g[3], g[4], g[5]], [g[6], g[7]]))
            .collect();

        Self { vertices, dropped }
    }

    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), FLOATS_PER_VERTEX * 4);
        let layout = Vertex::desc();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[2].offset, 24);
    }

    #[test]
    fn test_parse_complete_groups() {
        let floats: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let parsed = FlatVertices::parse(&floats);

        assert_eq!(parsed.vertices.len(), 2);
        assert!(!parsed.is_truncated());
        assert_eq!(parsed.vertices[1].position, [8.0, 9.0, 10.0]);
        assert_eq!(parsed.vertices[1].normal, [11.0, 12.0, 13.0]);
        assert_eq!(parsed.vertices[1].tex_coords, [14.0, 15.0]);
    }

    #[test]
    fn test_parse_stops_before_partial_group() {
        // Two full vertices followed by seven floats of a third
        let floats: Vec<f32> = (0..23).map(|i| i as f32).collect();
        let parsed = FlatVertices::parse(&floats);

        assert_eq!(parsed.vertices.len(), 2);
        assert_eq!(parsed.dropped, 7);
        assert!(parsed.is_truncated());
    }

    #[test]
    fn test_parse_short_input_yields_nothing() {
        let parsed = FlatVertices::parse(&[1.0, 2.0, 3.0]);
        assert!(parsed.vertices.is_empty());
        assert_eq!(parsed.dropped, 3);

        let empty = FlatVertices::parse(&[]);
        assert!(empty.vertices.is_empty());
        assert!(!empty.is_truncated());
    }
}
