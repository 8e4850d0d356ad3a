//! OpenGL backend on top of `glow`.

use crate::api::{
    AttribBaseType, BufferTarget, BufferUsage, GraphicsApi, UniformLocation, VertexAttribPointer,
};
use crate::error::BackendError;
use crate::handle::{BufferObject, Handle, NativeObject, ProgramObject, ShaderObject, VertexArrayObject};
use crate::shader::{ShaderStage, UniformValue};
use glow::HasContext;

const API_NAME: &str = "OpenGL";

/// `GraphicsApi` over a current OpenGL context.
///
/// Every call assumes the wrapped context is current on the calling thread.
pub struct GlowApi {
    gl: glow::Context,
}

impl GlowApi {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

fn creation_error<T: NativeObject>(message: String) -> BackendError {
    BackendError {
        api: API_NAME,
        object: T::LABEL,
        message,
    }
}

fn shader(handle: Handle<ShaderObject>) -> glow::NativeShader {
    glow::NativeShader(handle.id())
}

fn program(handle: Handle<ProgramObject>) -> glow::NativeProgram {
    glow::NativeProgram(handle.id())
}

fn vertex_array(handle: Handle<VertexArrayObject>) -> glow::NativeVertexArray {
    glow::NativeVertexArray(handle.id())
}

fn buffer(handle: Handle<BufferObject>) -> glow::NativeBuffer {
    glow::NativeBuffer(handle.id())
}

fn gl_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn gl_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
    }
}

impl GraphicsApi for GlowApi {
    fn name(&self) -> &'static str {
        API_NAME
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<Handle<ShaderObject>, BackendError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        let native = unsafe { self.gl.create_shader(kind) }.map_err(creation_error::<ShaderObject>)?;
        Ok(Handle::new(native.0))
    }

    fn shader_source(&self, handle: Handle<ShaderObject>, source: &str) {
        unsafe { self.gl.shader_source(shader(handle), source) }
    }

    fn compile_shader(&self, handle: Handle<ShaderObject>) {
        unsafe { self.gl.compile_shader(shader(handle)) }
    }

    fn shader_compile_status(&self, handle: Handle<ShaderObject>) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader(handle)) }
    }

    fn shader_info_log(&self, handle: Handle<ShaderObject>) -> String {
        unsafe { self.gl.get_shader_info_log(shader(handle)) }
    }

    fn delete_shader(&self, handle: Handle<ShaderObject>) {
        unsafe { self.gl.delete_shader(shader(handle)) }
    }

    fn create_program(&self) -> Result<Handle<ProgramObject>, BackendError> {
        let native = unsafe { self.gl.create_program() }.map_err(creation_error::<ProgramObject>)?;
        Ok(Handle::new(native.0))
    }

    fn attach_shader(&self, p: Handle<ProgramObject>, s: Handle<ShaderObject>) {
        unsafe { self.gl.attach_shader(program(p), shader(s)) }
    }

    fn detach_shader(&self, p: Handle<ProgramObject>, s: Handle<ShaderObject>) {
        unsafe { self.gl.detach_shader(program(p), shader(s)) }
    }

    fn link_program(&self, p: Handle<ProgramObject>) {
        unsafe { self.gl.link_program(program(p)) }
    }

    fn program_link_status(&self, p: Handle<ProgramObject>) -> bool {
        unsafe { self.gl.get_program_link_status(program(p)) }
    }

    fn program_info_log(&self, p: Handle<ProgramObject>) -> String {
        unsafe { self.gl.get_program_info_log(program(p)) }
    }

    fn delete_program(&self, p: Handle<ProgramObject>) {
        unsafe { self.gl.delete_program(program(p)) }
    }

    fn use_program(&self, p: Option<Handle<ProgramObject>>) {
        unsafe { self.gl.use_program(p.map(program)) }
    }

    fn uniform_location(&self, p: Handle<ProgramObject>, name: &str) -> Option<UniformLocation> {
        unsafe { self.gl.get_uniform_location(program(p), name) }.map(|l| UniformLocation(l.0))
    }

    fn set_uniform(&self, location: Option<&UniformLocation>, value: &UniformValue) {
        let native = location.map(|l| glow::NativeUniformLocation(l.0));
        let location = native.as_ref();
        let gl = &self.gl;
        unsafe {
            match *value {
                UniformValue::Bool(v) => gl.uniform_1_i32(location, v as i32),
                UniformValue::Int(v) => gl.uniform_1_i32(location, v),
                UniformValue::Int2(v) => gl.uniform_2_i32(location, v.x, v.y),
                UniformValue::Int3(v) => gl.uniform_3_i32(location, v.x, v.y, v.z),
                UniformValue::Int4(v) => gl.uniform_4_i32(location, v.x, v.y, v.z, v.w),
                UniformValue::Float(v) => gl.uniform_1_f32(location, v),
                UniformValue::Float2(v) => gl.uniform_2_f32(location, v.x, v.y),
                UniformValue::Float3(v) => gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Float4(v) => gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
                UniformValue::Mat3(m) => {
                    gl.uniform_matrix_3_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::Mat4(m) => {
                    gl.uniform_matrix_4_f32_slice(location, false, &m.to_cols_array())
                }
            }
        }
    }

    fn create_vertex_array(&self) -> Result<Handle<VertexArrayObject>, BackendError> {
        let native = unsafe { self.gl.create_vertex_array() }
            .map_err(creation_error::<VertexArrayObject>)?;
        Ok(Handle::new(native.0))
    }

    fn delete_vertex_array(&self, handle: Handle<VertexArrayObject>) {
        unsafe { self.gl.delete_vertex_array(vertex_array(handle)) }
    }

    fn bind_vertex_array(&self, handle: Option<Handle<VertexArrayObject>>) {
        unsafe { self.gl.bind_vertex_array(handle.map(vertex_array)) }
    }

    fn enable_vertex_attrib(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer(&self, index: u32, pointer: &VertexAttribPointer) {
        let VertexAttribPointer {
            components,
            base_type,
            normalized,
            stride,
            offset,
        } = *pointer;
        if !base_type.is_integer() {
            unsafe {
                self.gl.vertex_attrib_pointer_f32(
                    index, components, glow::FLOAT, normalized, stride, offset,
                )
            }
            return;
        }
        let data_type = match base_type {
            AttribBaseType::Bool => glow::UNSIGNED_BYTE,
            _ => glow::INT,
        };
        unsafe {
            self.gl
                .vertex_attrib_pointer_i32(index, components, data_type, stride, offset)
        }
    }

    fn create_buffer(&self) -> Result<Handle<BufferObject>, BackendError> {
        let native = unsafe { self.gl.create_buffer() }.map_err(creation_error::<BufferObject>)?;
        Ok(Handle::new(native.0))
    }

    fn delete_buffer(&self, handle: Handle<BufferObject>) {
        unsafe { self.gl.delete_buffer(buffer(handle)) }
    }

    fn bind_buffer(&self, target: BufferTarget, handle: Option<Handle<BufferObject>>) {
        unsafe { self.gl.bind_buffer(gl_target(target), handle.map(buffer)) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(gl_target(target), data, gl_usage(usage))
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: i32, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(gl_target(target), offset, data)
        }
    }
}
