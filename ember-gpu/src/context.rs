//! Owned graphics context with explicit bound-state tracking.

use crate::api::{BufferTarget, GraphicsApi};
use crate::handle::{BufferObject, Handle, ProgramObject, VertexArrayObject};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Wraps a native API and records which objects are currently bound.
///
/// The native context keeps one active program, one bound vertex array and
/// one buffer per target. Every bind goes through here so that state is
/// observable instead of hidden inside the driver. The element buffer
/// binding belongs to the bound vertex array and follows it on every
/// vertex array bind. A context belongs to the
/// thread that created it; share it with `Rc`.
pub struct Context {
    api: Box<dyn GraphicsApi>,
    active_program: Cell<Option<Handle<ProgramObject>>>,
    vertex_array: Cell<Option<Handle<VertexArrayObject>>>,
    array_buffer: Cell<Option<Handle<BufferObject>>>,
    element_buffer: Cell<Option<Handle<BufferObject>>>,
    element_bindings: RefCell<HashMap<Handle<VertexArrayObject>, Handle<BufferObject>>>,
}

impl Context {
    pub fn new(api: impl GraphicsApi + 'static) -> Rc<Self> {
        debug!(api = api.name(), "Created graphics context");
        Rc::new(Self {
            api: Box::new(api),
            active_program: Cell::new(None),
            vertex_array: Cell::new(None),
            array_buffer: Cell::new(None),
            element_buffer: Cell::new(None),
            element_bindings: RefCell::new(HashMap::new()),
        })
    }

    pub fn api(&self) -> &dyn GraphicsApi {
        self.api.as_ref()
    }

    pub fn use_program(&self, program: Option<Handle<ProgramObject>>) {
        trace!(?program, "use program");
        self.api.use_program(program);
        self.active_program.set(program);
    }

    pub fn active_program(&self) -> Option<Handle<ProgramObject>> {
        self.active_program.get()
    }

    pub fn bind_vertex_array(&self, vertex_array: Option<Handle<VertexArrayObject>>) {
        trace!(?vertex_array, "bind vertex array");
        self.api.bind_vertex_array(vertex_array);
        self.vertex_array.set(vertex_array);
        let element_buffer =
            vertex_array.and_then(|vao| self.element_bindings.borrow().get(&vao).copied());
        self.element_buffer.set(element_buffer);
    }

    pub fn bound_vertex_array(&self) -> Option<Handle<VertexArrayObject>> {
        self.vertex_array.get()
    }

    pub fn bind_buffer(&self, target: BufferTarget, buffer: Option<Handle<BufferObject>>) {
        trace!(?target, ?buffer, "bind buffer");
        self.api.bind_buffer(target, buffer);
        self.buffer_slot(target).set(buffer);
        if target == BufferTarget::ElementArray {
            if let Some(vao) = self.vertex_array.get() {
                let mut bindings = self.element_bindings.borrow_mut();
                match buffer {
                    Some(buffer) => bindings.insert(vao, buffer),
                    None => bindings.remove(&vao),
                };
            }
        }
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<Handle<BufferObject>> {
        self.buffer_slot(target).get()
    }

    /// Unbind and delete a program.
    pub(crate) fn delete_program(&self, program: Handle<ProgramObject>) {
        if self.active_program.get() == Some(program) {
            self.use_program(None);
        }
        self.api.delete_program(program);
    }

    pub(crate) fn delete_vertex_array(&self, vertex_array: Handle<VertexArrayObject>) {
        if self.vertex_array.get() == Some(vertex_array) {
            self.bind_vertex_array(None);
        }
        self.element_bindings.borrow_mut().remove(&vertex_array);
        self.api.delete_vertex_array(vertex_array);
    }

    /// Delete a buffer. The native delete drops it from the bound vertex
    /// array, so no element unbind is issued here.
    pub(crate) fn delete_buffer(&self, buffer: Handle<BufferObject>) {
        if self.array_buffer.get() == Some(buffer) {
            self.bind_buffer(BufferTarget::Array, None);
        }
        if self.element_buffer.get() == Some(buffer) {
            self.element_buffer.set(None);
        }
        self.element_bindings
            .borrow_mut()
            .retain(|_, bound| *bound != buffer);
        self.api.delete_buffer(buffer);
    }

    fn buffer_slot(&self, target: BufferTarget) -> &Cell<Option<Handle<BufferObject>>> {
        match target {
            BufferTarget::Array => &self.array_buffer,
            BufferTarget::ElementArray => &self.element_buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessApi;

    #[test]
    fn test_bind_state_is_tracked() {
        let ctx = Context::new(HeadlessApi::new());
        let program = ctx.api().create_program().unwrap();
        assert_eq!(ctx.active_program(), None);

        ctx.use_program(Some(program));
        assert_eq!(ctx.active_program(), Some(program));

        ctx.use_program(None);
        assert_eq!(ctx.active_program(), None);
    }

    #[test]
    fn test_deleting_bound_buffer_clears_binding() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let buffer = ctx.api().create_buffer().unwrap();

        ctx.bind_buffer(BufferTarget::Array, Some(buffer));
        assert_eq!(ctx.bound_buffer(BufferTarget::Array), Some(buffer));

        ctx.delete_buffer(buffer);
        assert_eq!(ctx.bound_buffer(BufferTarget::Array), None);
        assert_eq!(headless.live_buffers(), 0);
    }

    #[test]
    fn test_element_binding_follows_vertex_array() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let a = ctx.api().create_vertex_array().unwrap();
        let b = ctx.api().create_vertex_array().unwrap();
        let x = ctx.api().create_buffer().unwrap();
        let y = ctx.api().create_buffer().unwrap();

        ctx.bind_vertex_array(Some(b));
        ctx.bind_buffer(BufferTarget::ElementArray, Some(y));
        ctx.bind_vertex_array(Some(a));
        ctx.bind_buffer(BufferTarget::ElementArray, Some(x));
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), Some(x));

        ctx.bind_vertex_array(Some(b));
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), Some(y));

        ctx.bind_vertex_array(None);
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), None);
    }

    #[test]
    fn test_deleting_other_arrays_index_buffer_keeps_bound_binding() {
        let headless = HeadlessApi::new();
        let ctx = Context::new(headless.clone());
        let a = ctx.api().create_vertex_array().unwrap();
        let b = ctx.api().create_vertex_array().unwrap();
        let x = ctx.api().create_buffer().unwrap();
        let y = ctx.api().create_buffer().unwrap();

        ctx.bind_vertex_array(Some(b));
        ctx.bind_buffer(BufferTarget::ElementArray, Some(y));
        ctx.bind_vertex_array(Some(a));
        ctx.bind_buffer(BufferTarget::ElementArray, Some(x));
        ctx.bind_vertex_array(Some(b));

        ctx.delete_vertex_array(a);
        ctx.delete_buffer(x);

        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), Some(y));
        assert_eq!(headless.element_buffer(b), Some(y));
    }
}
