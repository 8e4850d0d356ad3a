//! Typed uniform uploads.

use super::Shader;
use glam::{IVec2, IVec3, IVec4, Mat3, Mat4, Vec2, Vec3, Vec4};

/// A value that can be pushed into a uniform slot.
///
/// Matrices are uploaded column-major without transposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Int2(IVec2),
    Int3(IVec3),
    Int4(IVec4),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    UniformValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i32 => Int,
    IVec2 => Int2,
    IVec3 => Int3,
    IVec4 => Int4,
    f32 => Float,
    Vec2 => Float2,
    Vec3 => Float3,
    Vec4 => Float4,
    Mat3 => Mat3,
    Mat4 => Mat4,
}

impl Shader {
    /// Push `value` into the uniform called `name`.
    ///
    /// The location is looked up in this shader's program but the value lands
    /// in whichever program is bound, so bind first. Unknown names are ignored.
    pub fn upload_uniform(&self, name: &str, value: impl Into<UniformValue>) {
        let api = self.ctx.api();
        let location = api.uniform_location(self.program, name);
        api.set_uniform(location.as_ref(), &value.into());
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.upload_uniform(name, value);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.upload_uniform(name, value);
    }

    pub fn set_int2(&self, name: &str, value: IVec2) {
        self.upload_uniform(name, value);
    }

    pub fn set_int3(&self, name: &str, value: IVec3) {
        self.upload_uniform(name, value);
    }

    pub fn set_int4(&self, name: &str, value: IVec4) {
        self.upload_uniform(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.upload_uniform(name, value);
    }

    pub fn set_float2(&self, name: &str, value: Vec2) {
        self.upload_uniform(name, value);
    }

    pub fn set_float3(&self, name: &str, value: Vec3) {
        self.upload_uniform(name, value);
    }

    pub fn set_float4(&self, name: &str, value: Vec4) {
        self.upload_uniform(name, value);
    }

    pub fn set_mat3(&self, name: &str, value: &Mat3) {
        self.upload_uniform(name, *value);
    }

    pub fn set_mat4(&self, name: &str, value: &Mat4) {
        self.upload_uniform(name, *value);
    }
}
