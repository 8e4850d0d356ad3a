use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroU32;

/// Type-safe handle to a native graphics object
pub struct Handle<T> {
    id: NonZeroU32,
    _phantom: PhantomData<T>,
}

impl<T> Handle<T> {
    pub fn new(id: NonZeroU32) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Build a handle from a raw native name; zero is never a valid object.
    pub fn from_raw(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self::new)
    }

    pub fn id(&self) -> NonZeroU32 {
        self.id
    }

    pub fn raw(&self) -> u32 {
        self.id.get()
    }
}

// Manual impls so the marker type does not need to be Copy/Eq itself.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: NativeObject> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::LABEL, self.id)
    }
}

/// Marker trait for the kinds of native objects a backend hands out
pub trait NativeObject: 'static {
    const LABEL: &'static str;
}

/// A single compilable stage unit.
pub enum ShaderObject {}
/// A linked (or linking) program.
pub enum ProgramObject {}
pub enum VertexArrayObject {}
pub enum BufferObject {}

impl NativeObject for ShaderObject {
    const LABEL: &'static str = "Shader";
}
impl NativeObject for ProgramObject {
    const LABEL: &'static str = "Program";
}
impl NativeObject for VertexArrayObject {
    const LABEL: &'static str = "VertexArray";
}
impl NativeObject for BufferObject {
    const LABEL: &'static str = "Buffer";
}
