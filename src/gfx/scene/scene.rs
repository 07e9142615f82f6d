use std::rc::Rc;

use cgmath::Matrix4;

use crate::gfx::{
    backend::RenderBackend,
    camera::fly_camera::CameraState,
    color::Color,
    resources::{
        shader::ShaderProgram,
        uniforms::{self, UniformValue},
    },
    scene::{light::PointLight, model::Model, primitive_mesh::PrimitiveMesh},
};

const LIGHT_SOURCE_AMBIENT_STRENGTH: f32 = 1.0;

/// Everything drawn each frame, with the two shader programs it uses.
///
/// The object program shades with the point light; the light-source
/// program draws unlit geometry such as the lamp itself. Either program may
/// be missing when it failed to build; only what depends on it is lost.
pub struct Scene<B: RenderBackend> {
    object_shader: Option<Rc<ShaderProgram<B>>>,
    light_shader: Option<Rc<ShaderProgram<B>>>,
    light: PointLight,
    clear_color: Color,
    projection: Matrix4<f32>,
    primitives: Vec<PrimitiveMesh<B>>,
    models: Vec<Model<B>>,
}

impl<B: RenderBackend> Scene<B> {
    pub fn new(
        object_shader: Option<Rc<ShaderProgram<B>>>,
        light_shader: Option<Rc<ShaderProgram<B>>>,
        light: PointLight,
        clear_color: Color,
        projection: Matrix4<f32>,
    ) -> Self {
        Self {
            object_shader,
            light_shader,
            light,
            clear_color,
            projection,
            primitives: Vec::new(),
            models: Vec::new(),
        }
    }

    pub fn add_primitive(&mut self, mesh: PrimitiveMesh<B>) {
        self.primitives.push(mesh);
    }

    pub fn add_model(&mut self, model: Model<B>) {
        self.models.push(model);
    }

    /// Sets the uniforms that do not change from frame to frame: the light,
    /// the initial view position and both projections.
    pub fn apply_static_uniforms(&self, backend: &mut B, camera: &CameraState) {
        if let Some(object_shader) = &self.object_shader {
            object_shader.activate(backend);
            self.light.apply(backend);
            backend.set_uniform(uniforms::VIEW_POS, UniformValue::Vec3(camera.position));
            backend.set_uniform(uniforms::PROJECTION, UniformValue::Mat4(self.projection));
        }

        if let Some(light_shader) = &self.light_shader {
            light_shader.activate(backend);
            backend.set_uniform(
                uniforms::AMBIENT_STRENGTH,
                UniformValue::Float(LIGHT_SOURCE_AMBIENT_STRENGTH),
            );
            backend.set_uniform(uniforms::PROJECTION, UniformValue::Mat4(self.projection));
        }
    }

    /// Replaces the projection in both programs, e.g. after a resize.
    pub fn set_projection(&mut self, backend: &mut B, projection: Matrix4<f32>) {
        self.projection = projection;
        for shader in self.shaders() {
            shader.set_uniform(backend, uniforms::PROJECTION, UniformValue::Mat4(projection));
        }
    }

    fn shaders(&self) -> impl Iterator<Item = &Rc<ShaderProgram<B>>> {
        self.object_shader.iter().chain(self.light_shader.iter())
    }

    /// Clears, refreshes the camera uniforms and draws every primitive mesh
    /// followed by every model.
    pub fn render_frame(&self, backend: &mut B, camera: &CameraState) {
        backend.begin_frame(self.clear_color);

        let view = UniformValue::Mat4(camera.view());
        if let Some(object_shader) = &self.object_shader {
            object_shader.set_uniform(backend, uniforms::VIEW, view);
            backend.set_uniform(uniforms::VIEW_POS, UniformValue::Vec3(camera.position));
        }
        if let Some(light_shader) = &self.light_shader {
            light_shader.set_uniform(backend, uniforms::VIEW, view);
        }

        for mesh in &self.primitives {
            mesh.draw(backend);
        }
        if let Some(object_shader) = &self.object_shader {
            for model in &self.models {
                model.draw(backend, object_shader);
            }
        }

        backend.end_frame();
    }

    pub fn primitives(&self) -> &[PrimitiveMesh<B>] {
        &self.primitives
    }

    pub fn models(&self) -> &[Model<B>] {
        &self.models
    }

    pub fn light(&self) -> &PointLight {
        &self.light
    }

    pub fn object_shader(&self) -> Option<&Rc<ShaderProgram<B>>> {
        self.object_shader.as_ref()
    }

    pub fn light_shader(&self) -> Option<&Rc<ShaderProgram<B>>> {
        self.light_shader.as_ref()
    }
}

/// A frame with nothing but the clear colour, used when the scene could not
/// be built.
pub fn render_clear_frame<B: RenderBackend>(backend: &mut B, clear_color: Color) {
    backend.begin_frame(clear_color);
    backend.end_frame();
}
