//! wgpu rendering: pipelines and the production backend.

pub mod pipeline_manager;
pub mod render_engine;

pub use pipeline_manager::PipelineManager;
pub use render_engine::RenderEngine;
