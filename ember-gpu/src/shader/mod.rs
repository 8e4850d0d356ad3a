//! Shader programs built from multi-stage source files.

mod compile;
mod library;
mod source;
mod uniform;

pub use compile::compile_program;
pub use library::ShaderLibrary;
pub use source::{name_from_path, read_file, split_stages};
pub use uniform::UniformValue;

use crate::context::Context;
use crate::error::ShaderError;
use crate::handle::{Handle, ProgramObject};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;
use tracing::info;

/// Kind of a compilable stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShaderStage {
    type Err = ShaderError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "vertex" => Ok(ShaderStage::Vertex),
            "fragment" | "pixel" => Ok(ShaderStage::Fragment),
            other => Err(ShaderError::UnknownStage(other.to_string())),
        }
    }
}

/// Stage sources keyed by stage kind, at most one entry per stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    stages: BTreeMap<ShaderStage, String>,
}

impl ShaderSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stage, returning the source it replaced.
    pub fn insert(&mut self, stage: ShaderStage, source: impl Into<String>) -> Option<String> {
        self.stages.insert(stage, source.into())
    }

    pub fn get(&self, stage: ShaderStage) -> Option<&str> {
        self.stages.get(&stage).map(String::as_str)
    }

    pub fn contains(&self, stage: ShaderStage) -> bool {
        self.stages.contains_key(&stage)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stages in pipeline order, vertex first.
    pub fn iter(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        self.stages.iter().map(|(stage, src)| (*stage, src.as_str()))
    }
}

impl FromIterator<(ShaderStage, String)> for ShaderSources {
    fn from_iter<I: IntoIterator<Item = (ShaderStage, String)>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

/// A linked shader program.
///
/// A `Shader` only exists once every stage compiled and the program linked;
/// the program is deleted when the shader is dropped.
pub struct Shader {
    ctx: Rc<Context>,
    program: Handle<ProgramObject>,
    name: String,
}

impl Shader {
    /// Load a multi-stage shader file. The shader is named after the file stem.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(ctx: &Rc<Context>, path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let source = read_file(path)?;
        let sources = split_stages(&source)?;
        Self::from_stage_sources(ctx, name_from_path(path), &sources)
    }

    /// Build a shader from separate vertex and fragment sources.
    pub fn from_sources(
        ctx: &Rc<Context>,
        name: impl Into<String>,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, ShaderError> {
        let sources: ShaderSources = [
            (ShaderStage::Vertex, vertex_src.to_string()),
            (ShaderStage::Fragment, fragment_src.to_string()),
        ]
        .into_iter()
        .collect();
        Self::from_stage_sources(ctx, name, &sources)
    }

    /// Compile and link the given stages. On success the program is left bound.
    pub fn from_stage_sources(
        ctx: &Rc<Context>,
        name: impl Into<String>,
        sources: &ShaderSources,
    ) -> Result<Self, ShaderError> {
        let name = name.into();
        let program = compile_program(ctx, sources)?;
        info!(shader = %name, ?program, "Shader program linked");
        Ok(Self {
            ctx: Rc::clone(ctx),
            program,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> Handle<ProgramObject> {
        self.program
    }

    pub fn bind(&self) {
        self.ctx.use_program(Some(self.program));
    }

    pub fn unbind(&self) {
        self.ctx.use_program(None);
    }

    pub fn is_bound(&self) -> bool {
        self.ctx.active_program() == Some(self.program)
    }
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.name)
            .field("program", &self.program)
            .finish()
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.ctx.delete_program(self.program);
    }
}
