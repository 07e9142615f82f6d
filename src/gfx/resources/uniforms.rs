//! The uniform contract between host code and the shading stage.
//!
//! Uniforms are addressed by name. The names below are mirrored as field
//! paths in the WGSL `Uniforms` struct (for example `u.light.position`), so
//! they must not change without editing `shader_source/` as well.

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::gfx::camera::camera_utils::convert_matrix4_to_array;

pub const MODEL: &str = "model";
pub const VIEW: &str = "view";
pub const PROJECTION: &str = "projection";
pub const VIEW_POS: &str = "viewPos";
pub const AMBIENT_STRENGTH: &str = "ambientStrength";

pub const LIGHT_POSITION: &str = "light.position";
pub const LIGHT_AMBIENT: &str = "light.ambient";
pub const LIGHT_DIFFUSE: &str = "light.diffuse";
pub const LIGHT_SPECULAR: &str = "light.specular";

pub const MATERIAL_DIFFUSE: &str = "material.diffuse";
pub const MATERIAL_SPECULAR: &str = "material.specular";
pub const MATERIAL_SHININESS: &str = "material.shininess";
pub const MATERIAL_DIFFUSE_MAP: &str = "material.texture_diffuse1";
pub const MATERIAL_SPECULAR_MAP: &str = "material.texture_specular1";

/// A value pushed into a named uniform.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UniformValue {
    Mat4(Matrix4<f32>),
    Vec3(Vector3<f32>),
    Vec4([f32; 4]),
    Float(f32),
    /// A texture unit index for sampler uniforms.
    Sampler(u32),
}

/// Which sampled texture a sampler uniform feeds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SamplerSlot {
    Diffuse,
    Specular,
}

impl SamplerSlot {
    /// Maps a sampler uniform name to the slot the shaders sample it from.
    ///
    /// Only the first map of each kind is sampled; `texture_diffuse2` and
    /// later are accepted by the contract but have no slot.
    pub fn for_uniform(name: &str) -> Option<Self> {
        match name {
            MATERIAL_DIFFUSE | MATERIAL_DIFFUSE_MAP => Some(SamplerSlot::Diffuse),
            MATERIAL_SPECULAR_MAP => Some(SamplerSlot::Specular),
            _ => None,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightBlock {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialBlock {
    pub specular: [f32; 4],
    pub shininess: f32,
    pub _padding: [f32; 3],
}

/// CPU-side copy of one program's uniforms, laid out like the WGSL struct.
///
/// MUST match `struct Uniforms` in the shader sources exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformBlock {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
    pub light: LightBlock,
    pub material: MaterialBlock,
    pub ambient_strength: f32,
    pub _padding: [f32; 3],
}
// 3 * 64 + 16 + 64 + 32 + 16 = 320 bytes

impl Default for UniformBlock {
    fn default() -> Self {
        let identity = convert_matrix4_to_array(Matrix4::identity());
        Self {
            model: identity,
            view: identity,
            projection: identity,
            ..bytemuck::Zeroable::zeroed()
        }
    }
}

impl UniformBlock {
    /// Stores `value` under `name`.
    ///
    /// Returns `false` when the name is not part of the contract or the value
    /// has the wrong shape; like an unresolved uniform location, that write
    /// is silently dropped.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        use UniformValue::*;

        match (name, value) {
            (MODEL, Mat4(m)) => self.model = convert_matrix4_to_array(m),
            (VIEW, Mat4(m)) => self.view = convert_matrix4_to_array(m),
            (PROJECTION, Mat4(m)) => self.projection = convert_matrix4_to_array(m),
            (VIEW_POS, Vec3(v)) => self.view_pos = [v.x, v.y, v.z, 1.0],
            (AMBIENT_STRENGTH, Float(f)) => self.ambient_strength = f,
            (LIGHT_POSITION, Vec3(v)) => self.light.position = [v.x, v.y, v.z, 1.0],
            (LIGHT_AMBIENT, Vec4(c)) => self.light.ambient = c,
            (LIGHT_DIFFUSE, Vec4(c)) => self.light.diffuse = c,
            (LIGHT_SPECULAR, Vec4(c)) => self.light.specular = c,
            (MATERIAL_SPECULAR, Vec4(c)) => self.material.specular = c,
            (MATERIAL_SHININESS, Float(f)) => self.material.shininess = f,
            _ => return false,
        }
        true
    }
}

/// Texture units assigned to the diffuse and specular samplers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SamplerUnits {
    pub diffuse: Option<u32>,
    pub specular: Option<u32>,
}

impl SamplerUnits {
    pub fn set(&mut self, slot: SamplerSlot, unit: u32) {
        match slot {
            SamplerSlot::Diffuse => self.diffuse = Some(unit),
            SamplerSlot::Specular => self.specular = Some(unit),
        }
    }
}

/// Everything a program remembers between draws: its uniform block and the
/// texture units its samplers point at.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ProgramUniforms {
    pub block: UniformBlock,
    pub samplers: SamplerUnits,
}

impl ProgramUniforms {
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        match (SamplerSlot::for_uniform(name), value) {
            (Some(slot), UniformValue::Sampler(unit)) => {
                self.samplers.set(slot, unit);
                true
            }
            _ => self.block.set(name, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<UniformBlock>(), 320);
        assert_eq!(std::mem::size_of::<UniformBlock>() % 16, 0);
    }

    #[test]
    fn test_known_names_are_stored() {
        let mut uniforms = ProgramUniforms::default();
        assert!(uniforms.set(LIGHT_POSITION, UniformValue::Vec3(Vector3::new(20.0, 20.0, 20.0))));
        assert!(uniforms.set(MATERIAL_SHININESS, UniformValue::Float(32.0)));
        assert!(uniforms.set(MATERIAL_DIFFUSE, UniformValue::Sampler(0)));
        assert!(uniforms.set(MATERIAL_SPECULAR_MAP, UniformValue::Sampler(1)));

        assert_eq!(uniforms.block.light.position, [20.0, 20.0, 20.0, 1.0]);
        assert_eq!(uniforms.block.material.shininess, 32.0);
        assert_eq!(uniforms.samplers.diffuse, Some(0));
        assert_eq!(uniforms.samplers.specular, Some(1));
    }

    #[test]
    fn test_unknown_or_mistyped_uniforms_are_dropped() {
        let mut uniforms = ProgramUniforms::default();
        let before = uniforms;

        assert!(!uniforms.set("light.colour", UniformValue::Float(1.0)));
        assert!(!uniforms.set(MODEL, UniformValue::Float(1.0)));
        assert!(!uniforms.set("material.texture_diffuse2", UniformValue::Sampler(3)));
        assert_eq!(uniforms, before);
    }
}
