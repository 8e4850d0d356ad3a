//! Error types for the shader pipeline and vertex arrays.

use crate::shader::ShaderStage;
use std::path::PathBuf;
use thiserror::Error;

/// A native object could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{api} failed to create {object}: {message}")]
pub struct BackendError {
    pub api: &'static str,
    pub object: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("Could not open file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Shader file '{path}' is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Unknown shader type '{0}'")]
    UnknownStage(String),

    #[error("Only {max} shader stages are supported, found {0}", max = crate::constants::MAX_STAGES)]
    TooManyStages(usize),

    #[error("Shader stage {0} declared more than once")]
    DuplicateStage(ShaderStage),

    #[error("Shader source contains no stages")]
    NoStages,

    #[error("{stage} shader compilation failure:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("Program linking failure:\n{log}")]
    Link { log: String },

    #[error("Shader '{0}' already exists")]
    AlreadyExists(String),

    #[error("Shader '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ShaderError {
    /// Native diagnostic attached to compile and link failures.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ShaderError::Compile { log, .. } | ShaderError::Link { log } => Some(log),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum VertexArrayError {
    #[error("Vertex buffer has no layout")]
    EmptyLayout,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
