//! WGPU-based implementation of the render backend
//!
//! The backend contract is immediate-mode: uniforms are written between
//! draws and each draw sees the values current at that moment. wgpu wants a
//! whole frame recorded into one render pass, so the engine snapshots the
//! active program's uniform block and bound textures at every draw call and
//! replays the list at [`RenderEngine::end_frame`], giving each draw its own
//! slot of a dynamically offset uniform buffer.

use std::{borrow::Cow, cell::RefCell, collections::HashMap, rc::Rc, sync::Arc};

use anyhow::Context;
use wgpu::TextureFormat;

use crate::{
    gfx::{
        backend::{IndexData, IndexFormat, PolygonMode, RenderBackend, ShaderStage},
        color::{self, Color},
        resources::{
            texture::TextureImage,
            texture_resource::TextureResource,
            uniforms::{ProgramUniforms, UniformBlock, UniformValue},
        },
        scene::vertex::Vertex,
    },
    wgpu_utils::DynamicUniformBuffer,
};

use super::pipeline_manager::{CompiledStage, PipelineManager, ProgramPipelines};

const INITIAL_DRAW_SLOTS: usize = 64;

/// Program handle. Uniform state lives with the program so it survives
/// switching programs and is freed with it.
pub struct GpuProgram {
    inner: Rc<ProgramState>,
}

struct ProgramState {
    label: String,
    pipelines: ProgramPipelines,
    uniforms: RefCell<ProgramUniforms>,
}

impl GpuProgram {
    pub fn label(&self) -> &str {
        &self.inner.label
    }
}

pub struct GpuBuffer {
    buffer: wgpu::Buffer,
}

/// A sampled texture with the bind group that exposes it to the shaders.
pub struct GpuTexture {
    resource: TextureResource,
    bind_group: wgpu::BindGroup,
}

impl GpuTexture {
    pub fn resource(&self) -> &TextureResource {
        &self.resource
    }
}

/// Everything one deferred draw needs, captured when it was issued.
struct DrawCall {
    pipeline: wgpu::RenderPipeline,
    uniforms: UniformBlock,
    diffuse: wgpu::BindGroup,
    specular: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    format: IndexFormat,
    count: u32,
}

/// Core rendering engine managing the surface, device and draw calls.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pipeline_manager: PipelineManager,

    uniform_buffer: DynamicUniformBuffer<UniformBlock>,
    uniform_bind_group: wgpu::BindGroup,
    /// Bound in place of a missing texture so untextured draws sample white.
    fallback_texture: GpuTexture,

    active_program: Option<Rc<ProgramState>>,
    texture_units: HashMap<u32, wgpu::BindGroup>,
    polygon_mode: PolygonMode,

    clear_color: Color,
    in_frame: bool,
    draws: Vec<DrawCall>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create a rendering surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;

        // Wireframe needs line rasterization, which not every adapter has
        let required_features = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features,
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to open the graphics device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("surface reports no supported formats")?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let device = Arc::new(device);
        let queue = Arc::new(queue);
        let pipeline_manager = PipelineManager::new(device.clone(), format);
        if !pipeline_manager.supports_line_mode() {
            log::warn!("adapter lacks line rasterization, wireframe mode is unavailable");
        }

        let uniform_buffer = DynamicUniformBuffer::new(&device, INITIAL_DRAW_SLOTS);
        let uniform_bind_group =
            Self::create_uniform_bind_group(&device, &pipeline_manager, &uniform_buffer);

        let white =
            TextureResource::create_mipmapped(&device, &queue, &TextureImage::white(), "white");
        let fallback_texture = GpuTexture {
            bind_group: Self::create_texture_bind_group(
                &device,
                &pipeline_manager,
                &white,
                "white",
            ),
            resource: white,
        };

        log::info!(
            "render engine ready: {} ({:?}), surface {}x{} {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.width,
            config.height,
            format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            format,
            pipeline_manager,
            uniform_buffer,
            uniform_bind_group,
            fallback_texture,
            active_program: None,
            texture_units: HashMap::new(),
            polygon_mode: PolygonMode::Fill,
            clear_color: color::GREY,
            in_frame: false,
            draws: Vec::new(),
        })
    }

    fn create_uniform_bind_group(
        device: &wgpu::Device,
        pipeline_manager: &PipelineManager,
        uniform_buffer: &DynamicUniformBuffer<UniformBlock>,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: pipeline_manager.uniform_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.binding_resource(),
            }],
        })
    }

    fn create_texture_bind_group(
        device: &wgpu::Device,
        pipeline_manager: &PipelineManager,
        texture: &TextureResource,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: pipeline_manager.texture_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    /// Resizes the surface and recreates the depth buffer.
    ///
    /// Zero-sized requests (a minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Returns current surface dimensions
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn texture_for_unit(&self, unit: Option<u32>) -> wgpu::BindGroup {
        unit.and_then(|unit| self.texture_units.get(&unit))
            .unwrap_or(&self.fallback_texture.bind_group)
            .clone()
    }

    fn acquire_frame(&mut self) -> Option<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                None
            }
            Err(err) => {
                log::error!("failed to acquire the next frame: {err}");
                None
            }
        }
    }

    fn submit(&mut self, frame: wgpu::SurfaceTexture, draws: &[DrawCall]) {
        let blocks: Vec<UniformBlock> = draws.iter().map(|draw| draw.uniforms).collect();
        if self.uniform_buffer.update_content(&self.device, &self.queue, &blocks) {
            self.uniform_bind_group = Self::create_uniform_bind_group(
                &self.device,
                &self.pipeline_manager,
                &self.uniform_buffer,
            );
        }

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.into()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for (slot, draw) in draws.iter().enumerate() {
                render_pass.set_pipeline(&draw.pipeline);
                let offset = self.uniform_buffer.offset(slot);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                render_pass.set_bind_group(1, &draw.diffuse, &[]);
                render_pass.set_bind_group(2, &draw.specular, &[]);
                render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                render_pass.set_index_buffer(draw.index_buffer.slice(..), draw.format.into());
                render_pass.draw_indexed(0..draw.count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

impl RenderBackend for RenderEngine {
    type Stage = CompiledStage;
    type Program = GpuProgram;
    type Buffer = GpuBuffer;
    type Texture = GpuTexture;

    fn compile_stage(
        &mut self,
        label: &str,
        stage: ShaderStage,
        source: &str,
    ) -> Result<CompiledStage, String> {
        self.pipeline_manager.compile(label, stage, source)
    }

    fn link_program(
        &mut self,
        label: &str,
        vertex: &CompiledStage,
        fragment: &CompiledStage,
    ) -> Result<GpuProgram, String> {
        let pipelines = self.pipeline_manager.link(label, vertex, fragment)?;
        Ok(GpuProgram {
            inner: Rc::new(ProgramState {
                label: label.to_owned(),
                pipelines,
                uniforms: RefCell::new(ProgramUniforms::default()),
            }),
        })
    }

    fn create_vertex_buffer(&mut self, label: &str, vertices: &[Vertex]) -> GpuBuffer {
        use wgpu::util::DeviceExt;
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        GpuBuffer { buffer }
    }

    fn create_index_buffer(&mut self, label: &str, indices: IndexData<'_>) -> GpuBuffer {
        use wgpu::util::DeviceExt;
        // Buffer writes must be a multiple of four bytes
        let mut contents = indices.as_bytes().to_vec();
        contents.resize(contents.len().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize), 0);

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: &contents,
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuBuffer { buffer }
    }

    fn create_texture(&mut self, label: &str, image: &TextureImage) -> GpuTexture {
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        let image = image.fitted_to(max_dimension);
        if matches!(image, Cow::Owned(_)) {
            log::warn!(
                "texture {label} exceeds the {max_dimension}px device limit, \
                 uploading a {}x{} mip level instead",
                image.width,
                image.height
            );
        }

        let resource =
            TextureResource::create_mipmapped(&self.device, &self.queue, &image, label);
        let bind_group =
            Self::create_texture_bind_group(&self.device, &self.pipeline_manager, &resource, label);
        log::debug!(
            "uploaded texture {label} ({}x{}, {} mip levels)",
            image.width,
            image.height,
            image.mip_level_count()
        );
        GpuTexture { resource, bind_group }
    }

    fn use_program(&mut self, program: &GpuProgram) {
        self.active_program = Some(program.inner.clone());
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        match &self.active_program {
            Some(program) => {
                if !program.uniforms.borrow_mut().set(name, value) {
                    log::trace!("program `{}` has no uniform `{name}`", program.label);
                }
            }
            None => log::warn!("uniform `{name}` written with no active program"),
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: &GpuTexture) {
        self.texture_units.insert(unit, texture.bind_group.clone());
    }

    fn unbind_textures(&mut self) {
        self.texture_units.clear();
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        if mode == PolygonMode::Line && !self.pipeline_manager.supports_line_mode() {
            log::warn!("wireframe mode requested but not supported by this adapter");
            return;
        }
        self.polygon_mode = mode;
    }

    fn begin_frame(&mut self, clear: Color) {
        if self.in_frame {
            log::warn!("frame begun twice without end_frame, discarding recorded draws");
        }
        self.clear_color = clear;
        self.draws.clear();
        self.in_frame = true;
    }

    fn draw_indexed(
        &mut self,
        vertices: &GpuBuffer,
        indices: &GpuBuffer,
        format: IndexFormat,
        count: u32,
    ) {
        if !self.in_frame {
            log::warn!("draw issued outside of a frame, ignoring");
            return;
        }
        let Some(program) = &self.active_program else {
            log::warn!("draw issued with no active program, ignoring");
            return;
        };

        let pipeline = match (self.polygon_mode, &program.pipelines.line) {
            (PolygonMode::Line, Some(line)) => line.clone(),
            _ => program.pipelines.fill.clone(),
        };
        let uniforms = *program.uniforms.borrow();

        let draw = DrawCall {
            pipeline,
            uniforms: uniforms.block,
            diffuse: self.texture_for_unit(uniforms.samplers.diffuse),
            specular: self.texture_for_unit(uniforms.samplers.specular),
            vertex_buffer: vertices.buffer.clone(),
            index_buffer: indices.buffer.clone(),
            format,
            count,
        };
        self.draws.push(draw);
    }

    fn end_frame(&mut self) {
        if !self.in_frame {
            log::warn!("end_frame without begin_frame");
            return;
        }
        self.in_frame = false;

        let draws = std::mem::take(&mut self.draws);
        if let Some(frame) = self.acquire_frame() {
            self.submit(frame, &draws);
        }
    }
}
