//! Sub-meshes extracted from an imported model file.

use std::fmt;

use crate::{
    error::MeshError,
    gfx::{
        backend::{IndexData, RenderBackend},
        geometry::GeometryBuffers,
        resources::{
            shader::ShaderProgram,
            texture::{Texture, TextureKind},
            uniforms::{self, UniformValue},
        },
        scene::vertex::Vertex,
    },
};

/// One drawable piece of a [`Model`](super::model::Model).
///
/// Textures are shared with the owning model's cache; the mesh only holds
/// handles to them.
pub struct ImportedMesh<B: RenderBackend> {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<Texture<B>>,
    geometry: GeometryBuffers<B>,
}

impl<B: RenderBackend> fmt::Debug for ImportedMesh<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportedMesh")
            .field("vertices", &self.vertices.len())
            .field("indices", &self.indices.len())
            .field("textures", &self.textures)
            .finish()
    }
}

impl<B: RenderBackend> ImportedMesh<B> {
    pub fn new(
        backend: &mut B,
        label: &str,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Texture<B>>,
    ) -> Result<Self, MeshError> {
        let geometry =
            GeometryBuffers::upload(backend, label, &vertices, IndexData::U32(&indices))?;
        Ok(Self {
            vertices,
            indices,
            textures,
            geometry,
        })
    }

    /// Draws with `shader`, which the caller owns.
    ///
    /// Texture `i` is bound to unit `i` and its sampler uniform is named
    /// from its kind and a per-kind counter starting at 1, so the first
    /// diffuse map feeds `material.texture_diffuse1`. A kind the mesh has no
    /// map for points at an empty unit and samples white.
    pub fn draw(&self, backend: &mut B, shader: &ShaderProgram<B>) {
        shader.activate(backend);

        backend.unbind_textures();
        let empty_unit = UniformValue::Sampler(self.textures.len() as u32);
        backend.set_uniform(uniforms::MATERIAL_DIFFUSE_MAP, empty_unit);
        backend.set_uniform(uniforms::MATERIAL_SPECULAR_MAP, empty_unit);

        let (mut diffuse_number, mut specular_number) = (0u32, 0u32);
        for (unit, texture) in self.textures.iter().enumerate() {
            let number = match texture.kind() {
                TextureKind::Diffuse => {
                    diffuse_number += 1;
                    diffuse_number
                }
                TextureKind::Specular => {
                    specular_number += 1;
                    specular_number
                }
            };
            let name = format!("material.{}{number}", texture.kind().uniform_prefix());
            backend.set_uniform(&name, UniformValue::Sampler(unit as u32));
            backend.bind_texture(unit as u32, texture.handle());
        }

        self.geometry.draw(backend);
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[Texture<B>] {
        &self.textures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        backend::{recording::Command, IndexFormat, RecordingBackend},
        resources::texture::TextureImage,
    };
    use std::rc::Rc;

    fn texture(
        backend: &mut RecordingBackend,
        kind: TextureKind,
        name: &str,
    ) -> Texture<RecordingBackend> {
        let handle = backend.create_texture(name, &TextureImage::white());
        Texture::new(Rc::new(handle), kind, name)
    }

    #[test]
    fn test_sampler_names_are_counted_per_kind() {
        let mut backend = RecordingBackend::new();
        let shader = ShaderProgram::from_sources(
            &mut backend,
            "object",
            "fn vs_main() {}",
            "fn fs_main() {}",
        )
        .unwrap();
        let textures = vec![
            texture(&mut backend, TextureKind::Diffuse, "a.png"),
            texture(&mut backend, TextureKind::Specular, "b.png"),
            texture(&mut backend, TextureKind::Diffuse, "c.png"),
        ];
        let mesh = ImportedMesh::new(
            &mut backend,
            "part",
            vec![Vertex::default(); 3],
            vec![0, 1, 2],
            textures,
        )
        .unwrap();

        backend.clear_commands();
        backend.begin_frame(crate::gfx::color::GREY);
        mesh.draw(&mut backend, &shader);
        backend.end_frame();

        let samplers: Vec<(String, UniformValue)> = backend
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::SetUniform { name, value, .. } => Some((name, value)),
                _ => None,
            })
            .collect();
        assert_eq!(
            samplers,
            vec![
                ("material.texture_diffuse1".to_owned(), UniformValue::Sampler(3)),
                ("material.texture_specular1".to_owned(), UniformValue::Sampler(3)),
                ("material.texture_diffuse1".to_owned(), UniformValue::Sampler(0)),
                ("material.texture_specular1".to_owned(), UniformValue::Sampler(1)),
                ("material.texture_diffuse2".to_owned(), UniformValue::Sampler(2)),
            ]
        );

        let draws = backend.draw_calls();
        assert!(matches!(
            draws.as_slice(),
            [Command::DrawIndexed {
                format: IndexFormat::Uint32,
                count: 3,
                out_of_range: false,
                ..
            }]
        ));
    }

    #[test]
    fn test_missing_specular_map_samples_white() {
        let mut backend = RecordingBackend::new();
        let shader = ShaderProgram::from_sources(
            &mut backend,
            "object",
            "fn vs_main() {}",
            "fn fs_main() {}",
        )
        .unwrap();
        let both = vec![
            texture(&mut backend, TextureKind::Diffuse, "a.png"),
            texture(&mut backend, TextureKind::Specular, "b.png"),
        ];
        let diffuse_only = vec![texture(&mut backend, TextureKind::Diffuse, "c.png")];
        let diffuse_id = diffuse_only[0].handle().id();
        let first = ImportedMesh::new(
            &mut backend,
            "first",
            vec![Vertex::default(); 3],
            vec![0, 1, 2],
            both,
        )
        .unwrap();
        let second = ImportedMesh::new(
            &mut backend,
            "second",
            vec![Vertex::default(); 3],
            vec![0, 1, 2],
            diffuse_only,
        )
        .unwrap();

        backend.begin_frame(crate::gfx::color::GREY);
        first.draw(&mut backend, &shader);
        second.draw(&mut backend, &shader);
        backend.end_frame();

        let draws = backend.draw_calls();
        assert!(matches!(
            draws[1],
            Command::DrawIndexed { diffuse: Some(d), specular: None, .. } if d == diffuse_id
        ));
    }

    #[test]
    fn test_out_of_range_indices_are_rejected() {
        let mut backend = RecordingBackend::new();
        let result = ImportedMesh::new(
            &mut backend,
            "bad",
            vec![Vertex::default(); 2],
            vec![0, 1, 2],
            vec![],
        );
        assert!(result.is_err());
    }
}
