//! # Scene Module
//!
//! Drawable objects and the scene that owns them.
//!
//! ## Key Components
//!
//! - [`Scene`] - Shader programs, the point light and every drawable
//! - [`PrimitiveMesh`] - Hand-authored geometry with one texture and a material
//! - [`Model`] - An imported file flattened into [`ImportedMesh`]es
//! - [`Transform`] - Accumulated translate/rotate/scale matrix
//! - [`Vertex`] - Interleaved position, normal and texture coordinate
//!
//! All drawables are generic over a [`RenderBackend`](crate::gfx::backend::RenderBackend)
//! and release their GPU buffers when dropped.

pub mod imported_mesh;
pub mod light;
pub mod model;
pub mod primitive_mesh;
pub mod scene;
pub mod transform;
pub mod vertex;

// Re-export main types
pub use imported_mesh::ImportedMesh;
pub use light::PointLight;
pub use model::Model;
pub use primitive_mesh::PrimitiveMesh;
pub use scene::{render_clear_frame, Scene};
pub use transform::{Axis, Transform};
pub use vertex::{FlatVertices, Vertex};
