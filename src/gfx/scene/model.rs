//! Imported models: flattened sub-meshes under one transform.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    error::TransformError,
    gfx::{
        backend::RenderBackend,
        import::{self, ImportOptions, SourceMaterial, SourceScene},
        resources::{
            shader::ShaderProgram,
            texture::{Texture, TextureImage, TextureKind},
            uniforms::{self, UniformValue},
        },
        scene::{imported_mesh::ImportedMesh, transform::Transform},
    },
};

/// An imported asset drawn as a flat list of meshes.
///
/// The source hierarchy is discarded: node transforms are ignored and only
/// the model's own transform applies. Textures are loaded once per path and
/// shared between meshes.
pub struct Model<B: RenderBackend> {
    meshes: Vec<ImportedMesh<B>>,
    transform: Transform,
    /// Texture path -> uploaded handle. `None` records a failed load.
    textures_loaded: HashMap<String, Option<Rc<B::Texture>>>,
    directory: PathBuf,
}

impl<B: RenderBackend> fmt::Debug for Model<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("directory", &self.directory)
            .field("meshes", &self.meshes.len())
            .field("textures_loaded", &self.textures_loaded.len())
            .field("transform", &self.transform)
            .finish()
    }
}

impl<B: RenderBackend> Model<B> {
    /// Imports the model at `path` with triangulation and UV flipping.
    ///
    /// Import failures are logged and produce a model without meshes, which
    /// draws nothing.
    pub fn import(backend: &mut B, path: &Path) -> Self {
        Self::import_with(backend, path, &ImportOptions::default())
    }

    pub fn import_with(backend: &mut B, path: &Path, options: &ImportOptions) -> Self {
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        match import::load_scene(path, options) {
            Ok(scene) => Self::from_scene(backend, &scene, directory),
            Err(err) => {
                log::error!("{err}");
                Self::empty(directory)
            }
        }
    }

    /// Builds meshes for every mesh reachable from the scene root.
    /// Texture paths are resolved against `directory`.
    pub fn from_scene(backend: &mut B, scene: &SourceScene, directory: impl Into<PathBuf>) -> Self {
        let mut model = Self::empty(directory.into());

        for mesh_index in scene.mesh_order() {
            let source = &scene.meshes[mesh_index];
            let textures = match scene.material(source.material) {
                Some(material) => model.load_material_textures(backend, material),
                None => Vec::new(),
            };

            match ImportedMesh::new(
                backend,
                &source.name,
                source.vertices(),
                source.indices.clone(),
                textures,
            ) {
                Ok(mesh) => model.meshes.push(mesh),
                Err(err) => log::warn!("skipping mesh `{}`: {err}", source.name),
            }
        }

        log::info!(
            "loaded model from {} with {} mesh(es) and {} texture(s)",
            model.directory.display(),
            model.meshes.len(),
            model.textures_loaded.values().filter(|t| t.is_some()).count()
        );
        model
    }

    fn empty(directory: PathBuf) -> Self {
        Self {
            meshes: Vec::new(),
            transform: Transform::default(),
            textures_loaded: HashMap::new(),
            directory,
        }
    }

    /// Diffuse maps first, then specular maps.
    fn load_material_textures(
        &mut self,
        backend: &mut B,
        material: &SourceMaterial,
    ) -> Vec<Texture<B>> {
        let diffuse = material
            .diffuse_maps
            .iter()
            .map(|path| (path, TextureKind::Diffuse));
        let specular = material
            .specular_maps
            .iter()
            .map(|path| (path, TextureKind::Specular));

        diffuse
            .chain(specular)
            .filter_map(|(path, kind)| {
                let handle = self.cached_texture(backend, path)?;
                Some(Texture::new(handle, kind, path.as_str()))
            })
            .collect()
    }

    fn cached_texture(&mut self, backend: &mut B, path: &str) -> Option<Rc<B::Texture>> {
        if let Some(cached) = self.textures_loaded.get(path) {
            return cached.clone();
        }

        let full_path = self.directory.join(path);
        let handle = match TextureImage::load(&full_path) {
            Ok(image) => Some(Rc::new(backend.create_texture(path, &image))),
            Err(err) => {
                log::error!("texture failed to load: {err}");
                None
            }
        };
        self.textures_loaded.insert(path.to_owned(), handle.clone());
        handle
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.transform.translate(x, y, z);
    }

    pub fn rotate(&mut self, degrees: f32, axis: char) -> Result<(), TransformError> {
        self.transform.rotate(degrees, axis)
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.transform.scale(x, y, z);
    }

    /// Pushes the model matrix into `shader` once, then draws every mesh
    /// with it.
    pub fn draw(&self, backend: &mut B, shader: &ShaderProgram<B>) {
        shader.set_uniform(backend, uniforms::MODEL, UniformValue::Mat4(self.transform.matrix()));
        for mesh in &self.meshes {
            mesh.draw(backend, shader);
        }
    }

    pub fn meshes(&self) -> &[ImportedMesh<B>] {
        &self.meshes
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Number of distinct texture paths requested so far, failed loads
    /// included.
    pub fn textures_loaded(&self) -> usize {
        self.textures_loaded.len()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        backend::{recording::Command, RecordingBackend},
        import::{SourceMesh, SourceNode},
    };

    const VS: &str = "@vertex fn vs_main() {}";
    const FS: &str = "@fragment fn fs_main() {}";

    fn triangle(name: &str, material: Option<usize>) -> SourceMesh {
        SourceMesh {
            name: name.to_owned(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            material,
            ..Default::default()
        }
    }

    fn temp_texture_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tabletop-model-{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        image::RgbImage::from_pixel(4, 4, image::Rgb([120, 80, 40]))
            .save(dir.join("wood.png"))
            .unwrap();
        dir
    }

    #[test]
    fn test_shared_texture_path_is_loaded_once() {
        let dir = temp_texture_dir();
        let scene = SourceScene {
            nodes: vec![
                SourceNode {
                    name: "root".into(),
                    meshes: vec![0],
                    children: vec![1],
                },
                SourceNode {
                    name: "child".into(),
                    meshes: vec![1],
                    children: vec![],
                },
            ],
            root: 0,
            meshes: vec![triangle("a", Some(0)), triangle("b", Some(1))],
            materials: vec![
                SourceMaterial {
                    name: "first".into(),
                    diffuse_maps: vec!["wood.png".into()],
                    specular_maps: vec![],
                },
                SourceMaterial {
                    name: "second".into(),
                    diffuse_maps: vec!["wood.png".into()],
                    specular_maps: vec!["wood.png".into()],
                },
            ],
        };

        let mut backend = RecordingBackend::new();
        let model = Model::from_scene(&mut backend, &scene, &dir);

        assert_eq!(backend.textures_created(), 1);
        assert_eq!(model.meshes().len(), 2);
        assert_eq!(model.textures_loaded(), 1);

        let a = &model.meshes()[0].textures()[0];
        let b = &model.meshes()[1].textures()[0];
        assert!(a.same_resource(b));
        // Same image used as a specular map keeps its own role
        let spec = &model.meshes()[1].textures()[1];
        assert_eq!(spec.kind(), TextureKind::Specular);
        assert!(spec.same_resource(a));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_failed_texture_is_not_retried() {
        let scene = SourceScene {
            nodes: vec![SourceNode {
                name: "root".into(),
                meshes: vec![0, 1],
                children: vec![],
            }],
            root: 0,
            meshes: vec![triangle("a", Some(0)), triangle("b", Some(0))],
            materials: vec![SourceMaterial {
                name: "broken".into(),
                diffuse_maps: vec!["missing.png".into()],
                specular_maps: vec![],
            }],
        };

        let mut backend = RecordingBackend::new();
        let model = Model::from_scene(&mut backend, &scene, "nowhere");
        assert_eq!(model.meshes().len(), 2);
        assert!(model.meshes()[0].textures().is_empty());
        assert_eq!(model.textures_loaded(), 1);
        assert_eq!(backend.textures_created(), 0);
    }

    #[test]
    fn test_missing_model_draws_nothing() {
        let mut backend = RecordingBackend::new();
        let shader = ShaderProgram::from_sources(&mut backend, "object", VS, FS).unwrap();
        let model = Model::import(&mut backend, Path::new("models/not_here.obj"));
        assert!(model.meshes().is_empty());

        backend.begin_frame(crate::gfx::color::GREY);
        model.draw(&mut backend, &shader);
        backend.end_frame();
        assert!(backend.draw_calls().is_empty());
    }

    #[test]
    fn test_bad_sub_mesh_is_skipped() {
        let mut broken = triangle("broken", None);
        broken.indices = vec![0, 1, 7];
        let scene = SourceScene {
            nodes: vec![SourceNode {
                name: "root".into(),
                meshes: vec![0, 1],
                children: vec![],
            }],
            root: 0,
            meshes: vec![broken, triangle("ok", None)],
            materials: vec![],
        };

        let mut backend = RecordingBackend::new();
        let model = Model::from_scene(&mut backend, &scene, ".");
        assert_eq!(model.meshes().len(), 1);
        assert_eq!(model.meshes()[0].indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_draw_sets_model_matrix_once() {
        let scene = SourceScene {
            nodes: vec![SourceNode {
                name: "root".into(),
                meshes: vec![0, 1],
                children: vec![],
            }],
            root: 0,
            meshes: vec![triangle("a", None), triangle("b", None)],
            materials: vec![],
        };

        let mut backend = RecordingBackend::new();
        let shader = ShaderProgram::from_sources(&mut backend, "object", VS, FS).unwrap();
        let mut model = Model::from_scene(&mut backend, &scene, ".");
        model.translate(-5.0, 0.1, 5.0);
        model.rotate(180.0, 'y').unwrap();

        backend.clear_commands();
        backend.begin_frame(crate::gfx::color::GREY);
        model.draw(&mut backend, &shader);
        backend.end_frame();

        let model_sets = backend
            .commands()
            .into_iter()
            .filter(|c| matches!(c, Command::SetUniform { name, .. } if name == uniforms::MODEL))
            .count();
        assert_eq!(model_sets, 1);
        assert_eq!(backend.draw_calls().len(), 2);

        let state = backend.uniforms(shader.program().id()).unwrap();
        assert_eq!(state.block.model[3], [-5.0, 0.1, 5.0, 1.0]);
    }
}
