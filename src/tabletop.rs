//! The shipped tabletop scene: a lamp, a wooden table and four models.

use std::rc::Rc;

use crate::{
    config::ViewerConfig,
    error::{SceneError, ShaderError},
    gfx::{
        backend::RenderBackend,
        resources::{material::Material, shader::ShaderProgram},
        scene::{model::Model, primitive_mesh::PrimitiveMesh, scene::Scene},
    },
};

pub const OBJECT_VERTEX_SHADER: &str = "vertex_shader.wgsl";
pub const OBJECT_FRAGMENT_SHADER: &str = "fragment_shader.wgsl";
pub const LIGHT_VERTEX_SHADER: &str = "light_source_vertex_shader.wgsl";
pub const LIGHT_FRAGMENT_SHADER: &str = "light_source_fragment_shader.wgsl";

const LIGHT_TEXTURE: &str = "light_01.jpg";
const TABLE_TEXTURE: &str = "wood_table_01.jpg";
const LIGHT_SCALE: f32 = 5.0;

/// A half-unit cube. Normals are zero since the lamp is drawn unlit.
#[rustfmt::skip]
const LIGHT_CUBE_VERTICES: [f32; 128] = [
    // position               normal          uv
    -0.25,  0.25,  0.25,   0.0, 0.0, 0.0,   0.0, 1.0,
     0.25,  0.25,  0.25,   0.0, 0.0, 0.0,   1.0, 1.0,
    -0.25, -0.25,  0.25,   0.0, 0.0, 0.0,   0.0, 0.0,
     0.25, -0.25,  0.25,   0.0, 0.0, 0.0,   1.0, 0.0,

    -0.25,  0.25, -0.25,   0.0, 0.0, 0.0,   3.0, 1.0,
     0.25,  0.25, -0.25,   0.0, 0.0, 0.0,   2.0, 1.0,
    -0.25, -0.25, -0.25,   0.0, 0.0, 0.0,   3.0, 0.0,
     0.25, -0.25, -0.25,   0.0, 0.0, 0.0,   2.0, 0.0,

    // top
    -0.25,  0.25,  0.25,   0.0, 0.0, 0.0,   0.0, 0.0,
     0.25,  0.25,  0.25,   0.0, 0.0, 0.0,   1.0, 0.0,
    -0.25,  0.25, -0.25,   0.0, 0.0, 0.0,   0.0, 1.0,
     0.25,  0.25, -0.25,   0.0, 0.0, 0.0,   1.0, 1.0,

    // bottom
    -0.25, -0.25,  0.25,   0.0, 0.0, 0.0,   0.0, 1.0,
     0.25, -0.25,  0.25,   0.0, 0.0, 0.0,   1.0, 1.0,
    -0.25, -0.25, -0.25,   0.0, 0.0, 0.0,   0.0, 0.0,
     0.25, -0.25, -0.25,   0.0, 0.0, 0.0,   1.0, 0.0,
];

#[rustfmt::skip]
const LIGHT_CUBE_INDICES: [u16; 36] = [
    0, 1, 2,    1, 2, 3,    // front
    4, 5, 6,    5, 6, 7,    // back
    8, 9, 10,   9, 10, 11,  // top
    12, 13, 14, 13, 14, 15, // bottom
    0, 2, 6,    0, 4, 6,    // left
    1, 3, 5,    3, 5, 7,    // right
];

/// 50x50 plane at y = 0; the texture repeats 12 times across it.
#[rustfmt::skip]
const TABLE_VERTICES: [f32; 32] = [
    -25.0, 0.0, -25.0,   0.0, 1.0, 0.0,    0.0, 12.0,
     25.0, 0.0, -25.0,   0.0, 1.0, 0.0,   12.0, 12.0,
    -25.0, 0.0,  25.0,   0.0, 1.0, 0.0,    0.0,  0.0,
     25.0, 0.0,  25.0,   0.0, 1.0, 0.0,   12.0,  0.0,
];

const TABLE_INDICES: [u16; 6] = [0, 2, 3, 0, 1, 3];

/// Where an imported model sits on the table.
struct Placement {
    file: &'static str,
    translation: [f32; 3],
    rotation_y: Option<f32>,
}

const MODELS: [Placement; 4] = [
    Placement {
        file: "book/book.obj",
        translation: [0.0, 0.0, 10.0],
        rotation_y: Some(-90.0),
    },
    Placement {
        file: "headphones/headphones.obj",
        translation: [5.0, 0.5, 6.0],
        rotation_y: Some(225.0),
    },
    Placement {
        file: "pen/pen.obj",
        translation: [-2.0, 0.25, 11.0],
        rotation_y: None,
    },
    Placement {
        file: "cup/cup.obj",
        translation: [-5.0, 0.1, 5.0],
        rotation_y: Some(180.0),
    },
];

/// Loads both shader programs and every object of the tabletop scene, then
/// pushes the static uniforms.
///
/// Missing textures and models only cost that asset. A shader program that
/// fails to build only costs the objects drawn with it; the scene fails when
/// neither program builds.
pub fn build_scene<B: RenderBackend>(
    backend: &mut B,
    config: &ViewerConfig,
    aspect: f32,
) -> Result<Scene<B>, SceneError> {
    let assets = &config.assets;

    let light_shader = ShaderProgram::from_files(
        backend,
        &assets.shader(LIGHT_VERTEX_SHADER),
        &assets.shader(LIGHT_FRAGMENT_SHADER),
    );
    let object_shader = ShaderProgram::from_files(
        backend,
        &assets.shader(OBJECT_VERTEX_SHADER),
        &assets.shader(OBJECT_FRAGMENT_SHADER),
    );
    let (light_shader, object_shader) = match (light_shader, object_shader) {
        (Err(err), Err(_)) => return Err(err.into()),
        (light, object) => (
            usable_program(light, "lamp"),
            usable_program(object, "table and models"),
        ),
    };

    let mut scene = Scene::new(
        object_shader.clone(),
        light_shader.clone(),
        config.light,
        config.clear_color,
        config.projection.matrix(aspect),
    );

    if let Some(light_shader) = light_shader {
        let mut lamp = PrimitiveMesh::from_flat(
            backend,
            &LIGHT_CUBE_VERTICES,
            LIGHT_CUBE_INDICES.to_vec(),
            light_shader,
            &assets.texture(LIGHT_TEXTURE),
            Material::new([0.5, 0.5, 0.5, 1.0], 1.0),
        )
        .map_err(|source| SceneError::Mesh { name: "lamp", source })?;
        let light_position = config.light.position;
        lamp.translate(light_position.x, light_position.y, light_position.z);
        lamp.scale(LIGHT_SCALE, LIGHT_SCALE, LIGHT_SCALE);
        scene.add_primitive(lamp);
    }

    if let Some(object_shader) = object_shader {
        let table = PrimitiveMesh::from_flat(
            backend,
            &TABLE_VERTICES,
            TABLE_INDICES.to_vec(),
            object_shader,
            &assets.texture(TABLE_TEXTURE),
            Material::new([0.25, 0.25, 0.25, 1.0], 1.0),
        )
        .map_err(|source| SceneError::Mesh { name: "table", source })?;
        scene.add_primitive(table);

        for placement in &MODELS {
            let mut model = Model::import(backend, &assets.model(placement.file));
            let [x, y, z] = placement.translation;
            model.translate(x, y, z);
            if let Some(degrees) = placement.rotation_y {
                model.rotate(degrees, 'y')?;
            }
            scene.add_model(model);
        }
    }

    log::info!(
        "scene built: {} primitive mesh(es), {} model(s)",
        scene.primitives().len(),
        scene.models().len()
    );
    Ok(scene)
}

fn usable_program<B: RenderBackend>(
    program: Result<ShaderProgram<B>, ShaderError>,
    dependents: &str,
) -> Option<Rc<ShaderProgram<B>>> {
    match program {
        Ok(program) => Some(Rc::new(program)),
        Err(err) => {
            log::error!("skipping {dependents}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AssetPaths,
        gfx::{
            backend::{recording::Command, RecordingBackend},
            camera::fly_camera::CameraState,
        },
    };
    use std::path::{Path, PathBuf};

    const VS: &str = "@vertex fn vs_main() {}";
    const FS: &str = "@fragment fn fs_main() {}";

    fn asset_root(with_shaders: bool) -> PathBuf {
        let root = std::env::temp_dir().join(format!("tabletop-scene-{}", rand::random::<u64>()));
        let shaders = root.join("shader_source");
        std::fs::create_dir_all(&shaders).unwrap();
        if with_shaders {
            for (file, source) in [
                (OBJECT_VERTEX_SHADER, VS),
                (OBJECT_FRAGMENT_SHADER, FS),
                (LIGHT_VERTEX_SHADER, VS),
                (LIGHT_FRAGMENT_SHADER, FS),
            ] {
                std::fs::write(shaders.join(file), source).unwrap();
            }
        }
        root
    }

    fn config_at(root: &Path) -> ViewerConfig {
        ViewerConfig::default().with_assets(AssetPaths::rooted_at(root))
    }

    #[test]
    fn test_scene_has_lamp_table_and_models() {
        let root = asset_root(true);
        let mut backend = RecordingBackend::new();
        let scene = build_scene(&mut backend, &config_at(&root), 960.0 / 540.0).unwrap();

        assert_eq!(scene.primitives().len(), 2);
        assert_eq!(scene.models().len(), 4);

        let lamp = &scene.primitives()[0];
        assert_eq!(lamp.vertices().len(), 16);
        assert_eq!(lamp.indices().len(), 36);
        assert_eq!(lamp.dropped_floats(), 0);
        assert!(Rc::ptr_eq(lamp.shader(), scene.light_shader().unwrap()));
        let matrix = lamp.transform().matrix();
        assert_eq!(matrix.w.truncate(), config_at(&root).light.position);
        assert_eq!(matrix.x.x, LIGHT_SCALE);

        let table = &scene.primitives()[1];
        assert_eq!(table.vertices().len(), 4);
        assert_eq!(table.vertices()[1].tex_coords, [12.0, 12.0]);
        assert!(Rc::ptr_eq(table.shader(), scene.object_shader().unwrap()));

        // No texture or model files exist under the temporary root
        assert!(lamp.texture().is_none());
        assert!(scene.models().iter().all(|m| m.meshes().is_empty()));
        let cup = scene.models()[3].transform().matrix();
        assert!((cup.w.x + 5.0).abs() < 1e-6 && (cup.x.x + 1.0).abs() < 1e-6);

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_first_frame_draws_both_primitives() {
        let root = asset_root(true);
        let mut backend = RecordingBackend::new();
        let scene = build_scene(&mut backend, &config_at(&root), 16.0 / 9.0).unwrap();
        let camera = CameraState::default();
        scene.apply_static_uniforms(&mut backend, &camera);

        backend.clear_commands();
        scene.render_frame(&mut backend, &camera);

        let draws = backend.draw_calls();
        assert_eq!(draws.len(), 2);
        assert!(draws
            .iter()
            .all(|d| matches!(d, Command::DrawIndexed { out_of_range: false, .. })));
        assert!(matches!(draws[0], Command::DrawIndexed { count: 36, .. }));
        assert!(matches!(draws[1], Command::DrawIndexed { count: 6, .. }));

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_broken_lamp_shader_keeps_table_and_models() {
        let root = asset_root(true);
        std::fs::write(
            root.join("shader_source").join(LIGHT_FRAGMENT_SHADER),
            "@fragment fn broken(",
        )
        .unwrap();
        let mut backend = RecordingBackend::new();
        let scene = build_scene(&mut backend, &config_at(&root), 16.0 / 9.0).unwrap();

        assert!(scene.light_shader().is_none());
        assert_eq!(scene.primitives().len(), 1);
        assert_eq!(scene.models().len(), 4);

        let camera = CameraState::default();
        scene.apply_static_uniforms(&mut backend, &camera);
        backend.clear_commands();
        scene.render_frame(&mut backend, &camera);

        let draws = backend.draw_calls();
        assert_eq!(draws.len(), 1);
        assert!(matches!(draws[0], Command::DrawIndexed { count: 6, .. }));

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_missing_shaders_fail_the_scene() {
        let root = asset_root(false);
        let mut backend = RecordingBackend::new();
        let result = build_scene(&mut backend, &config_at(&root), 1.0);
        assert!(matches!(
            result,
            Err(SceneError::Shader(ShaderError::Compile { .. }))
        ));

        std::fs::remove_dir_all(root).ok();
    }
}
