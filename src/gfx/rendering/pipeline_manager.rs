//! Render pipeline management for shader programs
//!
//! Owns the bind group layouts every scene pipeline shares and turns WGSL
//! stage sources into linked pipelines. wgpu reports shader and pipeline
//! errors asynchronously, so each creation is wrapped in a validation error
//! scope and the scope is waited on to get a diagnostic back.

use std::sync::Arc;
use wgpu::*;

use crate::{
    gfx::{
        backend::ShaderStage, resources::texture_resource::TextureResource, scene::vertex::Vertex,
    },
    wgpu_utils::binding_types,
};

/// A compiled WGSL module for one stage.
pub struct CompiledStage {
    pub module: ShaderModule,
    pub stage: ShaderStage,
}

/// The pipelines a program draws with, one per polygon mode.
pub struct ProgramPipelines {
    pub fill: RenderPipeline,
    /// Only created when the device supports line rasterization.
    pub line: Option<RenderPipeline>,
}

/// Creates shader modules and pipelines against the shared layouts.
///
/// Bind group layout:
/// - group 0: the uniform block, with a dynamic offset per draw
/// - group 1: diffuse texture and sampler
/// - group 2: specular texture and sampler
pub struct PipelineManager {
    device: Arc<Device>,
    surface_format: TextureFormat,
    line_mode: bool,
    uniform_layout: BindGroupLayout,
    texture_layout: BindGroupLayout,
    pipeline_layout: PipelineLayout,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>, surface_format: TextureFormat) -> Self {
        let uniform_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Uniform Layout"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: binding_types::uniform_dynamic(),
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Texture Layout"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: binding_types::texture_2d(),
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: binding_types::sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let line_mode = device.features().contains(Features::POLYGON_MODE_LINE);

        Self {
            device,
            surface_format,
            line_mode,
            uniform_layout,
            texture_layout,
            pipeline_layout,
        }
    }

    pub fn uniform_layout(&self) -> &BindGroupLayout {
        &self.uniform_layout
    }

    pub fn texture_layout(&self) -> &BindGroupLayout {
        &self.texture_layout
    }

    /// Whether programs get a line-mode pipeline.
    pub fn supports_line_mode(&self) -> bool {
        self.line_mode
    }

    /// Compiles `source` as a standalone module for `stage`.
    ///
    /// # Returns
    /// The compiler diagnostic on failure, or a note that the stage's entry
    /// point is missing.
    pub fn compile(
        &self,
        label: &str,
        stage: ShaderStage,
        source: &str,
    ) -> Result<CompiledStage, String> {
        if !source.contains(&format!("fn {}", stage.entry_point())) {
            return Err(format!(
                "entry point `{}` not found in {stage} source",
                stage.entry_point()
            ));
        }

        let module = self.capture_validation(|device| {
            device.create_shader_module(ShaderModuleDescriptor {
                label: Some(label),
                source: ShaderSource::Wgsl(source.into()),
            })
        })?;

        Ok(CompiledStage { module, stage })
    }

    /// Links a vertex and a fragment module into the program's pipelines.
    pub fn link(
        &self,
        label: &str,
        vertex: &CompiledStage,
        fragment: &CompiledStage,
    ) -> Result<ProgramPipelines, String> {
        if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
            return Err(format!(
                "stage mismatch: expected vertex + fragment, got {} + {}",
                vertex.stage, fragment.stage
            ));
        }

        let fill = self.create_pipeline(label, vertex, fragment, PolygonMode::Fill)?;
        let line = if self.line_mode {
            let line_label = format!("{label} (line)");
            Some(self.create_pipeline(&line_label, vertex, fragment, PolygonMode::Line)?)
        } else {
            None
        };

        Ok(ProgramPipelines { fill, line })
    }

    fn create_pipeline(
        &self,
        label: &str,
        vertex: &CompiledStage,
        fragment: &CompiledStage,
        polygon_mode: PolygonMode,
    ) -> Result<RenderPipeline, String> {
        let color_targets = [Some(ColorTargetState {
            format: self.surface_format,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];

        self.capture_validation(|device| {
            device.create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&self.pipeline_layout),
                vertex: VertexState {
                    module: &vertex.module,
                    entry_point: Some(ShaderStage::Vertex.entry_point()),
                    buffers: &[Vertex::desc()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: &fragment.module,
                    entry_point: Some(ShaderStage::Fragment.entry_point()),
                    targets: &color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(DepthStencilState {
                    format: TextureResource::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: CompareFunction::Less,
                    stencil: StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })
    }

    /// Runs `create` inside a validation error scope and turns a captured
    /// error into its message.
    fn capture_validation<T>(&self, create: impl FnOnce(&Device) -> T) -> Result<T, String> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let created = create(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(created),
        }
    }
}
