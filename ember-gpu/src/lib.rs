//! Ember GPU Crate
//!
//! Shader programs, vertex arrays and a perspective camera on top of an
//! OpenGL-style graphics API. The native API sits behind [`GraphicsApi`];
//! [`GlowApi`] drives a real OpenGL context and [`HeadlessApi`] runs without
//! one.

pub mod api;
pub mod buffer;
pub mod camera;
pub mod constants;
pub mod context;
pub mod error;
pub mod glow_api;
pub mod handle;
pub mod headless;
pub mod shader;
pub mod vertex_array;

pub use api::{BufferTarget, BufferUsage, GraphicsApi, UniformLocation};
pub use buffer::{BufferElement, BufferLayout, IndexBuffer, ShaderDataType, VertexBuffer};
pub use camera::PerspectiveCamera;
pub use context::Context;
pub use error::{BackendError, ShaderError, VertexArrayError};
pub use glow_api::GlowApi;
pub use handle::Handle;
pub use headless::HeadlessApi;
pub use shader::{Shader, ShaderLibrary, ShaderSources, ShaderStage, UniformValue};
pub use vertex_array::VertexArray;

// Re-export so callers use the same versions
pub use glam;
pub use glow;
