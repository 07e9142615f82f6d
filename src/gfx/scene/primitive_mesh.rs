//! Hand-authored meshes with one texture and a Phong material.

use std::{fmt, path::Path, rc::Rc};

use crate::{
    error::{MeshError, TransformError},
    gfx::{
        backend::{IndexData, RenderBackend},
        geometry::GeometryBuffers,
        resources::{
            material::Material,
            shader::ShaderProgram,
            texture::{Texture, TextureKind},
            uniforms::{self, UniformValue},
        },
        scene::{
            transform::Transform,
            vertex::{FlatVertices, Vertex},
        },
    },
};

/// Texture unit the primitive mesh samples its diffuse map from.
const DIFFUSE_UNIT: u32 = 0;

/// A drawable built from literal geometry.
///
/// Geometry is uploaded once at construction. The mesh draws with its own
/// shader, which it shares with other meshes through an [`Rc`].
pub struct PrimitiveMesh<B: RenderBackend> {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    geometry: GeometryBuffers<B>,
    shader: Rc<ShaderProgram<B>>,
    texture: Option<Texture<B>>,
    material: Material,
    transform: Transform,
    dropped_floats: usize,
}

impl<B: RenderBackend> fmt::Debug for PrimitiveMesh<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveMesh")
            .field("vertices", &self.vertices.len())
            .field("indices", &self.indices.len())
            .field("shader", &self.shader)
            .field("texture", &self.texture)
            .field("material", &self.material)
            .field("transform", &self.transform)
            .finish()
    }
}

impl<B: RenderBackend> PrimitiveMesh<B> {
    /// Uploads `vertices` and `indices` and loads the texture at
    /// `texture_path`.
    ///
    /// A texture that fails to decode is logged and the mesh draws without
    /// one. Indices that point past the vertex list are rejected.
    pub fn new(
        backend: &mut B,
        vertices: Vec<Vertex>,
        indices: Vec<u16>,
        shader: Rc<ShaderProgram<B>>,
        texture_path: &Path,
        material: Material,
    ) -> Result<Self, MeshError> {
        if vertices.len() > u16::MAX as usize + 1 {
            return Err(MeshError::TooManyVertices {
                vertex_count: vertices.len(),
            });
        }

        let label = texture_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Primitive".to_owned());
        let geometry =
            GeometryBuffers::upload(backend, &label, &vertices, IndexData::U16(&indices))?;
        let texture = Texture::load(backend, texture_path, TextureKind::Diffuse);

        Ok(Self {
            vertices,
            indices,
            geometry,
            shader,
            texture,
            material,
            transform: Transform::default(),
            dropped_floats: 0,
        })
    }

    /// Builds a mesh from interleaved floats, eight per vertex.
    ///
    /// Trailing floats that do not form a whole vertex are dropped without
    /// error; [`PrimitiveMesh::dropped_floats`] reports how many.
    pub fn from_flat(
        backend: &mut B,
        floats: &[f32],
        indices: Vec<u16>,
        shader: Rc<ShaderProgram<B>>,
        texture_path: &Path,
        material: Material,
    ) -> Result<Self, MeshError> {
        let FlatVertices { vertices, dropped } = FlatVertices::parse(floats);
        let mut mesh = Self::new(backend, vertices, indices, shader, texture_path, material)?;
        mesh.dropped_floats = dropped;
        Ok(mesh)
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.transform.translate(x, y, z);
    }

    /// Rotates about `'x'`, `'y'` or `'z'`. Any other axis is logged and
    /// ignored.
    pub fn rotate(&mut self, degrees: f32, axis: char) -> Result<(), TransformError> {
        self.transform.rotate(degrees, axis)
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.transform.scale(x, y, z);
    }

    /// Binds this mesh's shader, pushes material and model uniforms, binds
    /// the texture and draws with 16-bit indices.
    ///
    /// Texture units are emptied first, so a mesh without a texture samples
    /// white rather than whatever the previous draw left bound.
    pub fn draw(&self, backend: &mut B) {
        self.shader.activate(backend);
        self.material.apply(backend, DIFFUSE_UNIT);
        backend.set_uniform(uniforms::MODEL, UniformValue::Mat4(self.transform.matrix()));

        backend.unbind_textures();
        if let Some(texture) = &self.texture {
            backend.bind_texture(DIFFUSE_UNIT, texture.handle());
        }
        self.geometry.draw(backend);
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn texture(&self) -> Option<&Texture<B>> {
        self.texture.as_ref()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn shader(&self) -> &Rc<ShaderProgram<B>> {
        &self.shader
    }

    /// Floats left over by [`PrimitiveMesh::from_flat`].
    pub fn dropped_floats(&self) -> usize {
        self.dropped_floats
    }
}
