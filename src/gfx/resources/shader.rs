//! Shader programs built from a vertex and a fragment source file.

use std::{fmt, path::Path};

use crate::{
    error::ShaderError,
    gfx::{
        backend::{RenderBackend, ShaderStage},
        resources::uniforms::UniformValue,
    },
};

/// Reads a shader source file line by line, ending every line (the last
/// one included) with `\n`.
///
/// A file that cannot be opened is logged and read as empty, which makes the
/// stage fail to compile further down instead of aborting here.
pub fn read_source(path: &Path, stage: ShaderStage) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let mut source = String::with_capacity(text.len() + 1);
            for line in text.lines() {
                source.push_str(line);
                source.push('\n');
            }
            source
        }
        Err(err) => {
            log::error!("{stage} shader file {} failed to open: {err}", path.display());
            String::new()
        }
    }
}

/// A successfully linked shader program.
///
/// There is no "invalid" program value: construction either links or
/// returns a [`ShaderError`], so a mesh can never hold an unusable shader.
pub struct ShaderProgram<B: RenderBackend> {
    program: B::Program,
    label: String,
}

impl<B: RenderBackend> fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("label", &self.label)
            .finish()
    }
}

impl<B: RenderBackend> ShaderProgram<B> {
    /// Loads, compiles and links the two stage files.
    pub fn from_files(
        backend: &mut B,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> Result<Self, ShaderError> {
        let label = vertex_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "shader".to_owned());

        let vertex_source = read_source(vertex_path, ShaderStage::Vertex);
        let fragment_source = read_source(fragment_path, ShaderStage::Fragment);
        Self::from_sources(backend, &label, &vertex_source, &fragment_source)
    }

    /// Compiles both stages and links them.
    ///
    /// Each stage is compiled even if the other fails so that every compiler
    /// diagnostic is logged. The compiled stages are dropped once linking is
    /// done; only the program survives.
    pub fn from_sources(
        backend: &mut B,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = compile(backend, label, ShaderStage::Vertex, vertex_source);
        let fragment = compile(backend, label, ShaderStage::Fragment, fragment_source);

        let (vertex, fragment) = match (vertex, fragment) {
            (Ok(vertex), Ok(fragment)) => (vertex, fragment),
            (Err(err), _) | (_, Err(err)) => {
                log::error!("shader program `{label}` failed to link: a stage did not compile");
                return Err(err);
            }
        };

        match backend.link_program(label, &vertex, &fragment) {
            Ok(program) => {
                log::debug!("linked shader program `{label}`");
                Ok(Self {
                    program,
                    label: label.to_owned(),
                })
            }
            Err(diagnostic) => {
                let err = ShaderError::Link {
                    label: label.to_owned(),
                    diagnostic,
                };
                log::error!("{err}");
                Err(err)
            }
        }
    }

    /// Makes this program the active one for subsequent uniforms and draws.
    pub fn activate(&self, backend: &mut B) {
        backend.use_program(&self.program);
    }

    /// Activates this program and writes one uniform into it.
    pub fn set_uniform(&self, backend: &mut B, name: &str, value: UniformValue) {
        self.activate(backend);
        backend.set_uniform(name, value);
    }

    pub fn program(&self) -> &B::Program {
        &self.program
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

fn compile<B: RenderBackend>(
    backend: &mut B,
    label: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<B::Stage, ShaderError> {
    backend.compile_stage(label, stage, source).map_err(|diagnostic| {
        let err = ShaderError::Compile {
            label: label.to_owned(),
            stage,
            diagnostic,
        };
        log::error!("{err}");
        err
    })
}
