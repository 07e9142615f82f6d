//! Phong material parameters for primitive meshes.

use crate::gfx::{
    backend::RenderBackend,
    resources::uniforms::{self, UniformValue},
};

/// Specular colour and shininess pushed before every primitive mesh draw.
///
/// Imported meshes carry diffuse/specular maps instead.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub specular: [f32; 4],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            specular: [0.5, 0.5, 0.5, 1.0],
            shininess: 32.0,
        }
    }
}

impl Material {
    pub fn new(specular: [f32; 4], shininess: f32) -> Self {
        Self {
            specular,
            shininess,
        }
    }

    /// Writes the material into the active program. The diffuse sampler is
    /// pointed at `diffuse_unit` and the specular map at the unit after it,
    /// which the caller leaves empty so specular is not masked by a map.
    pub fn apply<B: RenderBackend>(&self, backend: &mut B, diffuse_unit: u32) {
        backend.set_uniform(uniforms::MATERIAL_DIFFUSE, UniformValue::Sampler(diffuse_unit));
        backend.set_uniform(
            uniforms::MATERIAL_SPECULAR_MAP,
            UniformValue::Sampler(diffuse_unit + 1),
        );
        backend.set_uniform(uniforms::MATERIAL_SPECULAR, UniformValue::Vec4(self.specular));
        backend.set_uniform(uniforms::MATERIAL_SHININESS, UniformValue::Float(self.shininess));
    }
}
