//! GPU resource management
//!
//! Shader programs, textures, materials and the uniform contract shared by
//! every backend.

pub mod material;
pub mod shader;
pub mod texture;
pub mod texture_resource;
pub mod uniforms;

pub use material::Material;
pub use shader::ShaderProgram;
pub use texture::{Texture, TextureImage, TextureKind};
pub use texture_resource::TextureResource;
