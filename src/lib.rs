//! Tabletop
//!
//! An interactive 3D scene viewer built on wgpu and winit: textured
//! primitive meshes, imported OBJ/glTF models, one point light and a fly
//! camera.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod prelude;
pub mod tabletop;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use config::ViewerConfig;

/// Runs the viewer with the default configuration.
pub fn run() -> anyhow::Result<()> {
    ViewerApp::new(ViewerConfig::default())?.run()
}
