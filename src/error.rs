//! Error types shared across the viewer.
//!
//! None of these abort the render loop: callers log them and degrade
//! (a model with no meshes, a mesh without a texture, an empty frame).

use std::path::PathBuf;

use crate::gfx::backend::ShaderStage;

/// Shader program construction failure.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader `{label}` failed to compile:\n{diagnostic}")]
    Compile {
        label: String,
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("shader program `{label}` failed to link:\n{diagnostic}")]
    Link { label: String, diagnostic: String },
}

/// Geometry rejected at mesh construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertex_count: usize,
    },

    #[error("mesh has {vertex_count} vertices, more than 16-bit indices can address")]
    TooManyVertices { vertex_count: usize },
}

/// Failure while importing a 3D model file.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to load OBJ file {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to load glTF file {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("incomplete scene: {0}")]
    IncompleteScene(String),
}

/// Failure while decoding a texture image.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failure of a transform mutator. The transform is left unchanged.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum TransformError {
    #[error("invalid rotation axis `{0}`, expected one of 'x', 'y', 'z'")]
    InvalidAxis(char),
}

/// Failure to assemble the shipped scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("built-in mesh `{name}` is invalid: {source}")]
    Mesh {
        name: &'static str,
        #[source]
        source: MeshError,
    },

    #[error(transparent)]
    Transform(#[from] TransformError),
}
