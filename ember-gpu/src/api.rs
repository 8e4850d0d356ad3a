//! Boundary to the native graphics API.
//!
//! `GraphicsApi` is a one-to-one description of the native calls the engine
//! issues. Implementations do no bookkeeping of their own beyond what the
//! native API does; the bound-state tracking lives in [`crate::Context`].

use crate::error::BackendError;
use crate::handle::{BufferObject, Handle, ProgramObject, ShaderObject, VertexArrayObject};
use crate::shader::{ShaderStage, UniformValue};

/// Resolved uniform slot inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Binding point of a buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data
    Array,
    /// Index data, captured by the bound vertex array
    ElementArray,
}

/// Buffer usage hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times
    Static,
    /// Updated frequently with `buffer_sub_data`
    Dynamic,
}

/// Scalar type an attribute is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttribBaseType {
    Float,
    Int,
    Bool,
}

impl AttribBaseType {
    /// Integer attributes must go through the integer pointer call.
    pub fn is_integer(&self) -> bool {
        matches!(self, AttribBaseType::Int | AttribBaseType::Bool)
    }
}

/// Arguments of a single vertex attribute pointer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribPointer {
    pub components: i32,
    pub base_type: AttribBaseType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
}

pub trait GraphicsApi {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn create_shader(&self, stage: ShaderStage) -> Result<Handle<ShaderObject>, BackendError>;
    fn shader_source(&self, shader: Handle<ShaderObject>, source: &str);
    fn compile_shader(&self, shader: Handle<ShaderObject>);
    fn shader_compile_status(&self, shader: Handle<ShaderObject>) -> bool;
    fn shader_info_log(&self, shader: Handle<ShaderObject>) -> String;
    fn delete_shader(&self, shader: Handle<ShaderObject>);

    fn create_program(&self) -> Result<Handle<ProgramObject>, BackendError>;
    fn attach_shader(&self, program: Handle<ProgramObject>, shader: Handle<ShaderObject>);
    fn detach_shader(&self, program: Handle<ProgramObject>, shader: Handle<ShaderObject>);
    fn link_program(&self, program: Handle<ProgramObject>);
    fn program_link_status(&self, program: Handle<ProgramObject>) -> bool;
    fn program_info_log(&self, program: Handle<ProgramObject>) -> String;
    fn delete_program(&self, program: Handle<ProgramObject>);
    fn use_program(&self, program: Option<Handle<ProgramObject>>);

    fn uniform_location(&self, program: Handle<ProgramObject>, name: &str)
    -> Option<UniformLocation>;
    /// Push a value into the currently bound program. `None` is a no-op.
    fn set_uniform(&self, location: Option<&UniformLocation>, value: &UniformValue);

    fn create_vertex_array(&self) -> Result<Handle<VertexArrayObject>, BackendError>;
    fn delete_vertex_array(&self, vertex_array: Handle<VertexArrayObject>);
    fn bind_vertex_array(&self, vertex_array: Option<Handle<VertexArrayObject>>);
    fn enable_vertex_attrib(&self, index: u32);
    fn vertex_attrib_pointer(&self, index: u32, pointer: &VertexAttribPointer);

    fn create_buffer(&self) -> Result<Handle<BufferObject>, BackendError>;
    fn delete_buffer(&self, buffer: Handle<BufferObject>);
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Handle<BufferObject>>);
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn buffer_sub_data(&self, target: BufferTarget, offset: i32, data: &[u8]);
}
