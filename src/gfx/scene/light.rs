use cgmath::Vector3;

use crate::gfx::{
    backend::RenderBackend,
    color::{self, Color},
    resources::uniforms::{self, UniformValue},
};

/// The scene's single point light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vector3::new(20.0, 20.0, 20.0),
            ambient: Color::grey(0.1),
            diffuse: color::WHITE,
            specular: color::WHITE,
        }
    }
}

impl PointLight {
    /// Writes the `light.*` uniforms into the active program.
    pub fn apply<B: RenderBackend>(&self, backend: &mut B) {
        backend.set_uniform(uniforms::LIGHT_POSITION, UniformValue::Vec3(self.position));
        backend.set_uniform(uniforms::LIGHT_AMBIENT, UniformValue::Vec4(self.ambient.to_array()));
        backend.set_uniform(uniforms::LIGHT_DIFFUSE, UniformValue::Vec4(self.diffuse.to_array()));
        backend.set_uniform(uniforms::LIGHT_SPECULAR, UniformValue::Vec4(self.specular.to_array()));
    }
}
