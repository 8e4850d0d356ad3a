use crate::api::VertexAttribPointer;
use crate::buffer::{IndexBuffer, VertexBuffer};
use crate::context::Context;
use crate::error::{BackendError, VertexArrayError};
use crate::handle::{Handle, VertexArrayObject};
use std::rc::Rc;
use tracing::{debug, warn};

/// Vertex array binding vertex buffers to attribute slots.
///
/// Attribute slots are handed out sequentially across every buffer added,
/// so buffers never share a slot.
pub struct VertexArray {
    ctx: Rc<Context>,
    vertex_array: Handle<VertexArrayObject>,
    next_attribute: u32,
    vertex_buffers: Vec<Rc<VertexBuffer>>,
    index_buffer: Option<Rc<IndexBuffer>>,
}

impl VertexArray {
    pub fn new(ctx: &Rc<Context>) -> Result<Self, BackendError> {
        let vertex_array = ctx.api().create_vertex_array()?;
        debug!(?vertex_array, "Created vertex array");
        Ok(Self {
            ctx: Rc::clone(ctx),
            vertex_array,
            next_attribute: 0,
            vertex_buffers: Vec::new(),
            index_buffer: None,
        })
    }

    pub fn bind(&self) {
        self.ctx.bind_vertex_array(Some(self.vertex_array));
    }

    pub fn unbind(&self) {
        self.ctx.bind_vertex_array(None);
    }

    /// Describe every element of the buffer's layout at the next free slots.
    pub fn add_vertex_buffer(&mut self, buffer: Rc<VertexBuffer>) -> Result<(), VertexArrayError> {
        let layout = buffer.layout();
        if layout.is_empty() {
            return Err(VertexArrayError::EmptyLayout);
        }

        self.bind();
        buffer.bind();

        let api = self.ctx.api();
        let stride = layout.stride() as i32;
        for element in layout {
            let slots = element.data_type.attribute_slots();
            let components = (element.component_count() / slots) as i32;
            let column_size = element.size / slots;

            for column in 0..slots {
                let index = self.next_attribute;
                api.enable_vertex_attrib(index);
                api.vertex_attrib_pointer(
                    index,
                    &VertexAttribPointer {
                        components,
                        base_type: element.data_type.base_type(),
                        normalized: element.normalized,
                        stride,
                        offset: (element.offset + column * column_size) as i32,
                    },
                );
                self.next_attribute += 1;
            }
            debug!(
                attribute = %element.name,
                first_slot = self.next_attribute - slots,
                slots,
                "Bound vertex attribute"
            );
        }

        self.vertex_buffers.push(buffer);
        Ok(())
    }

    /// Attach the index buffer, replacing any previous one.
    pub fn set_index_buffer(&mut self, buffer: Rc<IndexBuffer>) {
        self.bind();
        buffer.bind();

        if let Some(previous) = self.index_buffer.replace(buffer) {
            warn!(
                vertex_array = ?self.vertex_array,
                previous = ?previous.handle(),
                "Replacing index buffer"
            );
        }
    }

    pub fn vertex_buffers(&self) -> &[Rc<VertexBuffer>] {
        &self.vertex_buffers
    }

    pub fn index_buffer(&self) -> Option<&Rc<IndexBuffer>> {
        self.index_buffer.as_ref()
    }

    /// Slot the next added attribute will use.
    pub fn next_attribute_index(&self) -> u32 {
        self.next_attribute
    }

    pub fn handle(&self) -> Handle<VertexArrayObject> {
        self.vertex_array
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.ctx.delete_vertex_array(self.vertex_array);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AttribBaseType, BufferTarget};
    use crate::buffer::{BufferElement, BufferLayout, ShaderDataType};
    use crate::headless::{Call, HeadlessApi};

    fn buffer_with(ctx: &Rc<Context>, layout: BufferLayout) -> Rc<VertexBuffer> {
        let mut buffer = VertexBuffer::with_capacity(ctx, 256).unwrap();
        buffer.set_layout(layout);
        Rc::new(buffer)
    }

    #[test]
    fn test_sequential_slots_across_buffers() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let mut vertex_array = VertexArray::new(&ctx).unwrap();

        let first = buffer_with(
            &ctx,
            BufferLayout::new([
                BufferElement::new(ShaderDataType::Float3, "a_Position"),
                BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
            ]),
        );
        let second = buffer_with(
            &ctx,
            BufferLayout::new([
                BufferElement::new(ShaderDataType::Float4, "a_Color"),
                BufferElement::new(ShaderDataType::Float, "a_TexIndex"),
                BufferElement::new(ShaderDataType::Int, "a_EntityId"),
            ]),
        );

        vertex_array.add_vertex_buffer(Rc::clone(&first)).unwrap();
        vertex_array.add_vertex_buffer(Rc::clone(&second)).unwrap();

        let vao = vertex_array.handle();
        assert_eq!(headless.enabled_attributes(vao), vec![0, 1, 2, 3, 4]);
        for index in 0..2 {
            assert_eq!(headless.attribute(vao, index).unwrap().buffer, Some(first.handle()));
        }
        for index in 2..5 {
            assert_eq!(headless.attribute(vao, index).unwrap().buffer, Some(second.handle()));
        }
        assert_eq!(vertex_array.next_attribute_index(), 5);
        assert_eq!(vertex_array.vertex_buffers().len(), 2);
    }

    #[test]
    fn test_attribute_pointer_arguments() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let mut vertex_array = VertexArray::new(&ctx).unwrap();
        let buffer = buffer_with(
            &ctx,
            BufferLayout::new([
                BufferElement::new(ShaderDataType::Float3, "a_Position"),
                BufferElement::new(ShaderDataType::Float4, "a_Color").normalized(),
                BufferElement::new(ShaderDataType::Int, "a_EntityId"),
            ]),
        );

        vertex_array.add_vertex_buffer(buffer).unwrap();

        let vao = vertex_array.handle();
        let color = headless.attribute(vao, 1).unwrap().pointer.unwrap();
        assert_eq!(
            color,
            VertexAttribPointer {
                components: 4,
                base_type: AttribBaseType::Float,
                normalized: true,
                stride: 32,
                offset: 12,
            }
        );
        let entity = headless.attribute(vao, 2).unwrap().pointer.unwrap();
        assert_eq!(entity.base_type, AttribBaseType::Int);
        assert_eq!(entity.offset, 28);
    }

    #[test]
    fn test_matrix_takes_one_slot_per_column() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let mut vertex_array = VertexArray::new(&ctx).unwrap();
        let buffer = buffer_with(
            &ctx,
            BufferLayout::new([
                BufferElement::new(ShaderDataType::Mat4, "a_Transform"),
                BufferElement::new(ShaderDataType::Float, "a_Weight"),
            ]),
        );

        vertex_array.add_vertex_buffer(buffer).unwrap();

        let vao = vertex_array.handle();
        assert_eq!(vertex_array.next_attribute_index(), 5);
        for column in 0..4u32 {
            let pointer = headless.attribute(vao, column).unwrap().pointer.unwrap();
            assert_eq!(pointer.components, 4);
            assert_eq!(pointer.offset, (column * 16) as i32);
            assert_eq!(pointer.stride, 68);
        }
        assert_eq!(headless.attribute(vao, 4).unwrap().pointer.unwrap().offset, 64);
    }

    #[test]
    fn test_empty_layout_rejected() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let mut vertex_array = VertexArray::new(&ctx).unwrap();
        let buffer = Rc::new(VertexBuffer::with_capacity(&ctx, 16).unwrap());
        headless.clear_calls();

        let result = vertex_array.add_vertex_buffer(buffer);

        assert!(matches!(result, Err(VertexArrayError::EmptyLayout)));
        assert!(headless.calls().iter().all(|c| !matches!(
            c,
            Call::EnableVertexAttrib(_) | Call::VertexAttribPointer(..)
        )));
        assert_eq!(vertex_array.next_attribute_index(), 0);
        assert!(vertex_array.vertex_buffers().is_empty());
    }

    #[test]
    fn test_set_index_buffer_replaces_previous() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let mut vertex_array = VertexArray::new(&ctx).unwrap();

        let first = Rc::new(IndexBuffer::new(&ctx, &[0, 1, 2]).unwrap());
        vertex_array.set_index_buffer(first);
        assert_eq!(headless.live_buffers(), 1);

        let second = Rc::new(IndexBuffer::new(&ctx, &[0, 1, 2, 2, 3, 0]).unwrap());
        vertex_array.set_index_buffer(Rc::clone(&second));

        // The first buffer was only owned by the array and is gone now.
        assert_eq!(headless.live_buffers(), 1);
        assert_eq!(vertex_array.index_buffer().unwrap().count(), 6);
        assert_eq!(headless.element_buffer(vertex_array.handle()), Some(second.handle()));
    }

    #[test]
    fn test_shared_index_buffer_survives_replacement() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let mut vertex_array = VertexArray::new(&ctx).unwrap();

        let shared = Rc::new(IndexBuffer::new(&ctx, &[0, 1, 2]).unwrap());
        vertex_array.set_index_buffer(Rc::clone(&shared));
        vertex_array.set_index_buffer(Rc::new(IndexBuffer::new(&ctx, &[2, 1, 0]).unwrap()));

        assert_eq!(headless.live_buffers(), 2);
        assert_eq!(shared.count(), 3);
    }

    #[test]
    fn test_creating_index_buffer_while_bound_keeps_index_buffer() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let mut vertex_array = VertexArray::new(&ctx).unwrap();
        let first = Rc::new(IndexBuffer::new(&ctx, &[0, 1, 2]).unwrap());
        vertex_array.set_index_buffer(Rc::clone(&first));
        assert_eq!(ctx.bound_vertex_array(), Some(vertex_array.handle()));

        let other = IndexBuffer::new(&ctx, &[5, 6, 7]).unwrap();
        assert_eq!(headless.element_buffer(vertex_array.handle()), Some(first.handle()));

        drop(other);
        assert_eq!(headless.element_buffer(vertex_array.handle()), Some(first.handle()));
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), Some(first.handle()));
        assert_eq!(vertex_array.index_buffer().unwrap().handle(), first.handle());
    }

    #[test]
    fn test_dropping_other_array_keeps_bound_index_buffer() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let x = Rc::new(IndexBuffer::new(&ctx, &[0, 1, 2]).unwrap());
        let y = Rc::new(IndexBuffer::new(&ctx, &[2, 1, 0]).unwrap());
        let mut a = VertexArray::new(&ctx).unwrap();
        let mut b = VertexArray::new(&ctx).unwrap();

        b.set_index_buffer(Rc::clone(&y));
        a.set_index_buffer(x);
        b.bind();
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), Some(y.handle()));

        drop(a);

        assert_eq!(headless.element_buffer(b.handle()), Some(y.handle()));
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), Some(y.handle()));
        assert_eq!(b.index_buffer().unwrap().handle(), y.handle());
        assert_eq!(headless.live_buffers(), 1);
    }

    #[test]
    fn test_replacing_index_buffer_leaves_other_array_alone() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let mut a = VertexArray::new(&ctx).unwrap();
        let mut b = VertexArray::new(&ctx).unwrap();

        a.set_index_buffer(Rc::new(IndexBuffer::new(&ctx, &[0, 1, 2]).unwrap()));
        let y = Rc::new(IndexBuffer::new(&ctx, &[2, 1, 0]).unwrap());
        b.set_index_buffer(Rc::clone(&y));
        assert_eq!(ctx.bound_vertex_array(), Some(b.handle()));

        let replacement = Rc::new(IndexBuffer::new(&ctx, &[3, 4, 5]).unwrap());
        a.set_index_buffer(Rc::clone(&replacement));

        assert_eq!(headless.element_buffer(a.handle()), Some(replacement.handle()));
        assert_eq!(headless.element_buffer(b.handle()), Some(y.handle()));
        b.bind();
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), Some(y.handle()));
        a.bind();
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), Some(replacement.handle()));
    }

    #[test]
    fn test_drop_unbinds_and_deletes() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let vertex_array = VertexArray::new(&ctx).unwrap();
        vertex_array.bind();
        assert_eq!(ctx.bound_vertex_array(), Some(vertex_array.handle()));

        drop(vertex_array);

        assert_eq!(ctx.bound_vertex_array(), None);
        assert_eq!(headless.live_vertex_arrays(), 0);
    }
}
