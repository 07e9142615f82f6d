//! Headless backend that records every GPU command.
//!
//! Used by the test suite to observe exactly what the scene asks of the GPU:
//! which uniforms were written into which program, which textures were
//! bound, how many draws were issued and when resources were released.
//! Index buffers are kept on the CPU so draws can be checked for
//! out-of-range vertex access.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::{IndexData, IndexFormat, PolygonMode, RenderBackend, ShaderStage};
use crate::gfx::{
    color::Color,
    resources::{
        texture::TextureImage,
        uniforms::{ProgramUniforms, UniformValue},
    },
    scene::vertex::Vertex,
};

pub type ResourceId = u64;

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CompileStage {
        label: String,
        stage: ShaderStage,
        ok: bool,
    },
    LinkProgram {
        label: String,
        program: Option<ResourceId>,
    },
    CreateVertexBuffer {
        id: ResourceId,
        label: String,
        vertex_count: usize,
    },
    CreateIndexBuffer {
        id: ResourceId,
        label: String,
        format: IndexFormat,
        index_count: usize,
    },
    CreateTexture {
        id: ResourceId,
        label: String,
        width: u32,
        height: u32,
    },
    UseProgram(ResourceId),
    SetUniform {
        program: Option<ResourceId>,
        name: String,
        value: UniformValue,
    },
    BindTexture {
        unit: u32,
        texture: ResourceId,
    },
    UnbindTextures,
    SetPolygonMode(PolygonMode),
    BeginFrame(Color),
    DrawIndexed {
        program: Option<ResourceId>,
        vertex_buffer: ResourceId,
        index_buffer: ResourceId,
        format: IndexFormat,
        count: u32,
        /// True when any drawn index addresses a vertex past the end of the
        /// vertex buffer, or `count` exceeds the index buffer.
        out_of_range: bool,
        /// Texture the diffuse sampler reads; `None` samples white.
        diffuse: Option<ResourceId>,
        /// Texture the specular sampler reads; `None` samples white.
        specular: Option<ResourceId>,
    },
    EndFrame,
    Release(ResourceId),
}

type CommandLog = Rc<RefCell<Vec<Command>>>;

/// A recorded resource; pushes [`Command::Release`] when dropped.
#[derive(Debug)]
pub struct RecordedResource {
    id: ResourceId,
    log: CommandLog,
}

impl RecordedResource {
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl Drop for RecordedResource {
    fn drop(&mut self) {
        self.log.borrow_mut().push(Command::Release(self.id));
    }
}

#[derive(Debug)]
pub struct RecordedStage {
    resource: RecordedResource,
    stage: ShaderStage,
}

#[derive(Debug)]
pub struct RecordedProgram {
    resource: RecordedResource,
}

impl RecordedProgram {
    pub fn id(&self) -> ResourceId {
        self.resource.id
    }
}

#[derive(Debug)]
enum BufferContents {
    Vertices(usize),
    Indices(Vec<u32>),
}

#[derive(Debug)]
pub struct RecordedBuffer {
    resource: RecordedResource,
    contents: BufferContents,
}

impl RecordedBuffer {
    pub fn id(&self) -> ResourceId {
        self.resource.id
    }
}

#[derive(Debug)]
pub struct RecordedTexture {
    resource: RecordedResource,
}

impl RecordedTexture {
    pub fn id(&self) -> ResourceId {
        self.resource.id
    }
}

/// Backend that stores commands instead of executing them.
///
/// A stage compiles when its source defines the stage's entry point
/// (`fn vs_main` / `fn fs_main`); linking fails when the stages are swapped.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    log: CommandLog,
    next_id: ResourceId,
    active_program: Option<ResourceId>,
    uniforms: HashMap<ResourceId, ProgramUniforms>,
    texture_units: HashMap<u32, ResourceId>,
    in_frame: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every command recorded so far.
    pub fn commands(&self) -> Vec<Command> {
        self.log.borrow().clone()
    }

    pub fn clear_commands(&mut self) {
        self.log.borrow_mut().clear();
    }

    pub fn draw_calls(&self) -> Vec<Command> {
        self.log
            .borrow()
            .iter()
            .filter(|c| matches!(c, Command::DrawIndexed { .. }))
            .cloned()
            .collect()
    }

    pub fn textures_created(&self) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|c| matches!(c, Command::CreateTexture { .. }))
            .count()
    }

    /// Current uniform state of a program.
    pub fn uniforms(&self, program: ResourceId) -> Option<&ProgramUniforms> {
        self.uniforms.get(&program)
    }

    pub fn is_released(&self, id: ResourceId) -> bool {
        self.log.borrow().contains(&Command::Release(id))
    }

    fn push(&self, command: Command) {
        self.log.borrow_mut().push(command);
    }

    fn allocate(&mut self) -> RecordedResource {
        self.next_id += 1;
        RecordedResource {
            id: self.next_id,
            log: self.log.clone(),
        }
    }
}

impl RenderBackend for RecordingBackend {
    type Stage = RecordedStage;
    type Program = RecordedProgram;
    type Buffer = RecordedBuffer;
    type Texture = RecordedTexture;

    fn compile_stage(
        &mut self,
        label: &str,
        stage: ShaderStage,
        source: &str,
    ) -> Result<RecordedStage, String> {
        let ok = source.contains(&format!("fn {}", stage.entry_point()));
        self.push(Command::CompileStage {
            label: label.to_owned(),
            stage,
            ok,
        });

        if ok {
            Ok(RecordedStage {
                resource: self.allocate(),
                stage,
            })
        } else {
            Err(format!(
                "entry point `{}` not found in {stage} source",
                stage.entry_point()
            ))
        }
    }

    fn link_program(
        &mut self,
        label: &str,
        vertex: &RecordedStage,
        fragment: &RecordedStage,
    ) -> Result<RecordedProgram, String> {
        if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
            self.push(Command::LinkProgram {
                label: label.to_owned(),
                program: None,
            });
            return Err(format!(
                "stage mismatch: linked {} ({}) with {} ({})",
                vertex.stage,
                vertex.resource.id,
                fragment.stage,
                fragment.resource.id
            ));
        }

        let resource = self.allocate();
        self.uniforms.insert(resource.id, ProgramUniforms::default());
        self.push(Command::LinkProgram {
            label: label.to_owned(),
            program: Some(resource.id),
        });
        Ok(RecordedProgram { resource })
    }

    fn create_vertex_buffer(&mut self, label: &str, vertices: &[Vertex]) -> RecordedBuffer {
        let resource = self.allocate();
        self.push(Command::CreateVertexBuffer {
            id: resource.id,
            label: label.to_owned(),
            vertex_count: vertices.len(),
        });
        RecordedBuffer {
            resource,
            contents: BufferContents::Vertices(vertices.len()),
        }
    }

    fn create_index_buffer(&mut self, label: &str, indices: IndexData<'_>) -> RecordedBuffer {
        let resource = self.allocate();
        self.push(Command::CreateIndexBuffer {
            id: resource.id,
            label: label.to_owned(),
            format: indices.format(),
            index_count: indices.len(),
        });
        RecordedBuffer {
            resource,
            contents: BufferContents::Indices(indices.iter().collect()),
        }
    }

    fn create_texture(&mut self, label: &str, image: &TextureImage) -> RecordedTexture {
        let resource = self.allocate();
        self.push(Command::CreateTexture {
            id: resource.id,
            label: label.to_owned(),
            width: image.width,
            height: image.height,
        });
        RecordedTexture { resource }
    }

    fn use_program(&mut self, program: &RecordedProgram) {
        self.active_program = Some(program.id());
        self.push(Command::UseProgram(program.id()));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if let Some(uniforms) = self
            .active_program
            .and_then(|id| self.uniforms.get_mut(&id))
        {
            uniforms.set(name, value);
        }
        self.push(Command::SetUniform {
            program: self.active_program,
            name: name.to_owned(),
            value,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: &RecordedTexture) {
        self.texture_units.insert(unit, texture.id());
        self.push(Command::BindTexture {
            unit,
            texture: texture.id(),
        });
    }

    fn unbind_textures(&mut self) {
        self.texture_units.clear();
        self.push(Command::UnbindTextures);
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.push(Command::SetPolygonMode(mode));
    }

    fn begin_frame(&mut self, clear: Color) {
        self.in_frame = true;
        self.push(Command::BeginFrame(clear));
    }

    fn draw_indexed(
        &mut self,
        vertices: &RecordedBuffer,
        indices: &RecordedBuffer,
        format: IndexFormat,
        count: u32,
    ) {
        let out_of_range = match (&vertices.contents, &indices.contents) {
            (BufferContents::Vertices(vertex_count), BufferContents::Indices(data)) => {
                count as usize > data.len()
                    || data
                        .iter()
                        .take(count as usize)
                        .any(|&i| i as usize >= *vertex_count)
            }
            _ => true,
        };

        if !self.in_frame {
            log::warn!("draw issued outside of a frame");
        }

        let samplers = self
            .active_program
            .and_then(|id| self.uniforms.get(&id))
            .map(|uniforms| uniforms.samplers)
            .unwrap_or_default();
        let sampled =
            |unit: Option<u32>| unit.and_then(|unit| self.texture_units.get(&unit).copied());
        let (diffuse, specular) = (sampled(samplers.diffuse), sampled(samplers.specular));

        self.push(Command::DrawIndexed {
            program: self.active_program,
            vertex_buffer: vertices.id(),
            index_buffer: indices.id(),
            format,
            count,
            out_of_range,
            diffuse,
            specular,
        });
    }

    fn end_frame(&mut self) {
        self.in_frame = false;
        self.push(Command::EndFrame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "@vertex fn vs_main() {}";
    const FS: &str = "@fragment fn fs_main() {}";

    #[test]
    fn test_missing_entry_point_fails_to_compile() {
        let mut backend = RecordingBackend::new();
        assert!(backend.compile_stage("empty", ShaderStage::Vertex, "").is_err());
        assert!(backend.compile_stage("ok", ShaderStage::Vertex, VS).is_ok());
        assert!(backend.compile_stage("wrong", ShaderStage::Fragment, VS).is_err());
    }

    #[test]
    fn test_uniforms_persist_per_program() {
        let mut backend = RecordingBackend::new();
        let vs = backend.compile_stage("vs", ShaderStage::Vertex, VS).unwrap();
        let fs = backend.compile_stage("fs", ShaderStage::Fragment, FS).unwrap();
        let a = backend.link_program("a", &vs, &fs).unwrap();
        let b = backend.link_program("b", &vs, &fs).unwrap();

        backend.use_program(&a);
        backend.set_uniform("material.shininess", UniformValue::Float(8.0));
        backend.use_program(&b);
        backend.set_uniform("material.shininess", UniformValue::Float(2.0));

        assert_eq!(backend.uniforms(a.id()).unwrap().block.material.shininess, 8.0);
        assert_eq!(backend.uniforms(b.id()).unwrap().block.material.shininess, 2.0);
    }

    #[test]
    fn test_dropping_a_handle_records_release() {
        let mut backend = RecordingBackend::new();
        let buffer = backend.create_vertex_buffer("v", &[Vertex::default()]);
        let id = buffer.id();
        assert!(!backend.is_released(id));
        drop(buffer);
        assert!(backend.is_released(id));
    }

    #[test]
    fn test_unbound_units_sample_nothing() {
        let mut backend = RecordingBackend::new();
        let vs = backend.compile_stage("vs", ShaderStage::Vertex, VS).unwrap();
        let fs = backend.compile_stage("fs", ShaderStage::Fragment, FS).unwrap();
        let program = backend.link_program("p", &vs, &fs).unwrap();
        let texture = backend.create_texture("t", &TextureImage::white());
        let vertices = backend.create_vertex_buffer("v", &[Vertex::default(); 3]);
        let indices = backend.create_index_buffer("i", IndexData::U16(&[0, 1, 2]));

        backend.use_program(&program);
        backend.set_uniform("material.diffuse", UniformValue::Sampler(0));
        backend.bind_texture(0, &texture);
        backend.begin_frame(Color::grey(0.5));
        backend.draw_indexed(&vertices, &indices, IndexFormat::Uint16, 3);
        backend.unbind_textures();
        backend.draw_indexed(&vertices, &indices, IndexFormat::Uint16, 3);
        backend.end_frame();

        let sampled: Vec<_> = backend
            .draw_calls()
            .into_iter()
            .map(|c| match c {
                Command::DrawIndexed { diffuse, specular, .. } => (diffuse, specular),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(sampled, vec![(Some(texture.id()), None), (None, None)]);
    }

    #[test]
    fn test_out_of_range_draw_is_flagged() {
        let mut backend = RecordingBackend::new();
        let vertices = backend.create_vertex_buffer("v", &[Vertex::default(); 3]);
        let good = backend.create_index_buffer("good", IndexData::U16(&[0, 1, 2]));
        let bad = backend.create_index_buffer("bad", IndexData::U16(&[0, 1, 3]));

        backend.begin_frame(Color::grey(0.5));
        backend.draw_indexed(&vertices, &good, IndexFormat::Uint16, 3);
        backend.draw_indexed(&vertices, &bad, IndexFormat::Uint16, 3);
        backend.draw_indexed(&vertices, &good, IndexFormat::Uint16, 4);
        backend.end_frame();

        let flags: Vec<bool> = backend
            .draw_calls()
            .into_iter()
            .map(|c| match c {
                Command::DrawIndexed { out_of_range, .. } => out_of_range,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(flags, vec![false, true, true]);
    }
}
