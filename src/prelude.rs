//! # Tabletop Prelude
//!
//! Commonly used types in one import:
//!
//! ```no_run
//! use tabletop::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ViewerConfig::default().with_camera(CameraConfig::default().with_speed(0.5));
//!     ViewerApp::new(config)?.run()
//! }
//! ```

// Re-export core application types
pub use crate::app::ViewerApp;
pub use crate::config::{AssetPaths, CameraConfig, ProjectionConfig, ViewerConfig, WindowConfig};
pub use crate::tabletop::build_scene;

// Re-export graphics and scene types
pub use crate::gfx::backend::{RecordingBackend, RenderBackend};
pub use crate::gfx::camera::{CameraController, CameraState, Movement};
pub use crate::gfx::color::Color;
pub use crate::gfx::import::ImportOptions;
pub use crate::gfx::rendering::RenderEngine;
pub use crate::gfx::resources::{Material, ShaderProgram};
pub use crate::gfx::scene::{Model, PointLight, PrimitiveMesh, Scene, Transform, Vertex};

// Re-export common external dependencies
pub use cgmath::Vector3;
