//! Vertex and index buffers and the layouts describing vertex data.

use crate::api::{AttribBaseType, BufferTarget, BufferUsage};
use crate::context::Context;
use crate::error::BackendError;
use crate::handle::{BufferObject, Handle, NativeObject};
use std::rc::Rc;
use tracing::debug;

/// Type of a single vertex attribute as seen by a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDataType {
    Float,
    Float2,
    Float3,
    Float4,
    Mat3,
    Mat4,
    Int,
    Int2,
    Int3,
    Int4,
    Bool,
}

impl ShaderDataType {
    /// Size in bytes.
    pub fn size(&self) -> u32 {
        match self {
            ShaderDataType::Float => 4,
            ShaderDataType::Float2 => 4 * 2,
            ShaderDataType::Float3 => 4 * 3,
            ShaderDataType::Float4 => 4 * 4,
            ShaderDataType::Mat3 => 4 * 3 * 3,
            ShaderDataType::Mat4 => 4 * 4 * 4,
            ShaderDataType::Int => 4,
            ShaderDataType::Int2 => 4 * 2,
            ShaderDataType::Int3 => 4 * 3,
            ShaderDataType::Int4 => 4 * 4,
            ShaderDataType::Bool => 1,
        }
    }

    /// Number of scalar components.
    pub fn component_count(&self) -> u32 {
        match self {
            ShaderDataType::Float | ShaderDataType::Int | ShaderDataType::Bool => 1,
            ShaderDataType::Float2 | ShaderDataType::Int2 => 2,
            ShaderDataType::Float3 | ShaderDataType::Int3 => 3,
            ShaderDataType::Float4 | ShaderDataType::Int4 => 4,
            ShaderDataType::Mat3 => 3 * 3,
            ShaderDataType::Mat4 => 4 * 4,
        }
    }

    pub fn base_type(&self) -> AttribBaseType {
        match self {
            ShaderDataType::Float
            | ShaderDataType::Float2
            | ShaderDataType::Float3
            | ShaderDataType::Float4
            | ShaderDataType::Mat3
            | ShaderDataType::Mat4 => AttribBaseType::Float,
            ShaderDataType::Int
            | ShaderDataType::Int2
            | ShaderDataType::Int3
            | ShaderDataType::Int4 => AttribBaseType::Int,
            ShaderDataType::Bool => AttribBaseType::Bool,
        }
    }

    /// Number of attribute slots the type occupies: one per matrix column.
    pub fn attribute_slots(&self) -> u32 {
        match self {
            ShaderDataType::Mat3 => 3,
            ShaderDataType::Mat4 => 4,
            _ => 1,
        }
    }
}

/// One named attribute inside a buffer layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferElement {
    pub name: String,
    pub data_type: ShaderDataType,
    pub size: u32,
    pub offset: u32,
    pub normalized: bool,
}

impl BufferElement {
    pub fn new(data_type: ShaderDataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            size: data_type.size(),
            offset: 0,
            normalized: false,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    pub fn component_count(&self) -> u32 {
        self.data_type.component_count()
    }
}

/// Ordered attributes of an interleaved vertex buffer.
///
/// Offsets and stride are derived from the element order when the layout
/// is built and never edited independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    pub fn new(elements: impl IntoIterator<Item = BufferElement>) -> Self {
        let mut elements: Vec<BufferElement> = elements.into_iter().collect();
        let mut offset = 0;
        for element in &mut elements {
            element.offset = offset;
            offset += element.size;
        }
        Self {
            elements,
            stride: offset,
        }
    }

    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BufferElement> {
        self.elements.iter()
    }
}

impl FromIterator<BufferElement> for BufferLayout {
    fn from_iter<I: IntoIterator<Item = BufferElement>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a BufferLayout {
    type Item = &'a BufferElement;
    type IntoIter = std::slice::Iter<'a, BufferElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// GPU buffer holding vertex data plus the layout describing it.
pub struct VertexBuffer {
    ctx: Rc<Context>,
    buffer: Handle<BufferObject>,
    layout: BufferLayout,
    size: usize,
}

impl VertexBuffer {
    /// Create a static buffer initialised with `vertices`.
    pub fn with_data<T: bytemuck::Pod>(
        ctx: &Rc<Context>,
        vertices: &[T],
    ) -> Result<Self, BackendError> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        Self::create(ctx, bytes, BufferUsage::Static)
    }

    /// Create a zero-filled dynamic buffer of `size` bytes, filled later with `set_data`.
    pub fn with_capacity(ctx: &Rc<Context>, size: usize) -> Result<Self, BackendError> {
        Self::create(ctx, &vec![0u8; size], BufferUsage::Dynamic)
    }

    fn create(ctx: &Rc<Context>, bytes: &[u8], usage: BufferUsage) -> Result<Self, BackendError> {
        let buffer = ctx.api().create_buffer()?;
        ctx.bind_buffer(BufferTarget::Array, Some(buffer));
        ctx.api().buffer_data(BufferTarget::Array, bytes, usage);
        debug!(?buffer, bytes = bytes.len(), ?usage, "Created vertex buffer");
        Ok(Self {
            ctx: Rc::clone(ctx),
            buffer,
            layout: BufferLayout::default(),
            size: bytes.len(),
        })
    }

    /// Overwrite the start of the buffer with `vertices`.
    pub fn set_data<T: bytemuck::Pod>(&self, vertices: &[T]) {
        self.bind();
        self.ctx
            .api()
            .buffer_sub_data(BufferTarget::Array, 0, bytemuck::cast_slice(vertices));
    }

    pub fn bind(&self) {
        self.ctx.bind_buffer(BufferTarget::Array, Some(self.buffer));
    }

    pub fn unbind(&self) {
        self.ctx.bind_buffer(BufferTarget::Array, None);
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: BufferLayout) {
        self.layout = layout;
    }

    pub fn handle(&self) -> Handle<BufferObject> {
        self.buffer
    }

    /// Allocated size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        self.ctx.delete_buffer(self.buffer);
    }
}

/// GPU buffer of `u32` indices.
pub struct IndexBuffer {
    ctx: Rc<Context>,
    buffer: Handle<BufferObject>,
    count: u32,
}

impl IndexBuffer {
    /// Upload `indices` without touching the bound vertex array's element
    /// binding; the buffer only becomes an array's index buffer through
    /// [`crate::VertexArray::set_index_buffer`].
    pub fn new(ctx: &Rc<Context>, indices: &[u32]) -> Result<Self, BackendError> {
        let count = index_count(ctx.api().name(), indices.len())?;
        let buffer = ctx.api().create_buffer()?;
        ctx.bind_buffer(BufferTarget::Array, Some(buffer));
        ctx.api().buffer_data(
            BufferTarget::Array,
            bytemuck::cast_slice(indices),
            BufferUsage::Static,
        );
        debug!(?buffer, count, "Created index buffer");
        Ok(Self {
            ctx: Rc::clone(ctx),
            buffer,
            count,
        })
    }

    pub fn bind(&self) {
        self.ctx
            .bind_buffer(BufferTarget::ElementArray, Some(self.buffer));
    }

    pub fn unbind(&self) {
        self.ctx.bind_buffer(BufferTarget::ElementArray, None);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn handle(&self) -> Handle<BufferObject> {
        self.buffer
    }
}

/// Index counts are `u32` on the native side.
fn index_count(api: &'static str, len: usize) -> Result<u32, BackendError> {
    u32::try_from(len).map_err(|_| BackendError {
        api,
        object: BufferObject::LABEL,
        message: format!("{len} indices exceed the u32 index count"),
    })
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        self.ctx.delete_buffer(self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessApi;

    #[test]
    fn test_layout_offsets_and_stride() {
        let layout = BufferLayout::new([
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float4, "a_Color").normalized(),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
            BufferElement::new(ShaderDataType::Int, "a_EntityId"),
        ]);

        let offsets: Vec<u32> = layout.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0, 12, 28, 36]);
        assert_eq!(layout.stride(), 40);
        assert!(layout.elements()[1].normalized);
    }

    #[test]
    fn test_data_type_table() {
        assert_eq!(ShaderDataType::Mat3.size(), 36);
        assert_eq!(ShaderDataType::Mat4.component_count(), 16);
        assert_eq!(ShaderDataType::Mat4.attribute_slots(), 4);
        assert_eq!(ShaderDataType::Bool.size(), 1);
        assert_eq!(ShaderDataType::Int3.base_type(), AttribBaseType::Int);
        assert_eq!(ShaderDataType::Float2.attribute_slots(), 1);
    }

    #[test]
    fn test_empty_layout() {
        let layout: BufferLayout = std::iter::empty().collect();
        assert!(layout.is_empty());
        assert_eq!(layout.stride(), 0);
    }

    #[test]
    fn test_vertex_buffer_upload() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let vertices: [f32; 6] = [-0.5, -0.5, 0.5, -0.5, 0.0, 0.5];

        let buffer = VertexBuffer::with_data(&ctx, &vertices).unwrap();

        assert_eq!(buffer.size(), 24);
        assert_eq!(
            headless.buffer_contents(buffer.handle()).unwrap(),
            bytemuck::cast_slice::<f32, u8>(&vertices)
        );
        drop(buffer);
        assert_eq!(headless.live_buffers(), 0);
    }

    #[repr(C)]
    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    struct QuadVertex {
        position: [f32; 3],
        color: [f32; 4],
        tex_coord: [f32; 2],
    }

    #[test]
    fn test_interleaved_vertices_match_layout() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let layout = BufferLayout::new([
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float4, "a_Color"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
        ]);
        let vertices = [QuadVertex {
            position: [0.0, 1.0, 0.0],
            color: [1.0, 0.0, 0.0, 1.0],
            tex_coord: [0.5, 1.0],
        }; 4];

        let mut buffer = VertexBuffer::with_data(&ctx, &vertices).unwrap();
        buffer.set_layout(layout);

        assert_eq!(buffer.layout().stride() as usize, std::mem::size_of::<QuadVertex>());
        assert_eq!(buffer.size(), 4 * std::mem::size_of::<QuadVertex>());
        assert_eq!(headless.buffer_contents(buffer.handle()).unwrap().len(), buffer.size());
    }

    #[test]
    fn test_dynamic_vertex_buffer_set_data() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let buffer = VertexBuffer::with_capacity(&ctx, 16).unwrap();

        buffer.set_data(&[1.0f32, 2.0]);

        let contents = headless.buffer_contents(buffer.handle()).unwrap();
        assert_eq!(contents.len(), 16);
        assert_eq!(&contents[..8], bytemuck::cast_slice::<f32, u8>(&[1.0, 2.0]));
        assert!(contents[8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_index_buffer_count() {
        let ctx = Context::new(HeadlessApi::new());
        let indices = IndexBuffer::new(&ctx, &[0, 1, 2, 2, 3, 0]).unwrap();
        assert_eq!(indices.count(), 6);
    }

    #[test]
    fn test_index_buffer_creation_leaves_element_binding_alone() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let vertex_array = ctx.api().create_vertex_array().unwrap();
        ctx.bind_vertex_array(Some(vertex_array));

        let indices = IndexBuffer::new(&ctx, &[0, 1, 2]).unwrap();

        assert_eq!(headless.element_buffer(vertex_array), None);
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), None);
        assert_eq!(
            headless.buffer_contents(indices.handle()).unwrap(),
            bytemuck::cast_slice::<u32, u8>(&[0, 1, 2])
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_index_count_overflow() {
        assert_eq!(index_count("headless", 6).unwrap(), 6);
        let err = index_count("headless", u32::MAX as usize + 1).unwrap_err();
        assert_eq!(err.object, "Buffer");
    }
}
