//! # Graphics Module
//!
//! Everything between the scene description and the GPU.
//!
//! - **Backend** ([`backend`]) - the [`RenderBackend`] seam and a recording
//!   implementation for tests
//! - **Rendering** ([`rendering`]) - the wgpu [`RenderEngine`]
//! - **Camera** ([`camera`]) - fly camera state and input mapping
//! - **Scene** ([`scene`]) - meshes, models, the light and the frame loop
//! - **Import** ([`import`]) - OBJ and glTF loading
//! - **Resources** ([`resources`]) - shaders, textures, materials and the
//!   uniform contract
//!
//! [`RenderBackend`]: backend::RenderBackend

pub mod backend;
pub mod camera;
pub mod color;
pub mod geometry;
pub mod import;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use backend::RenderBackend;
pub use camera::{CameraController, CameraState};
pub use rendering::render_engine::RenderEngine;
