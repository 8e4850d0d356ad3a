//! Constants shared across the shader pipeline and camera.

/// Token that opens a stage block in a multi-stage shader file.
pub const TYPE_TOKEN: &str = "#type";

/// Maximum number of stages a single shader file may declare.
pub const MAX_STAGES: usize = 2;

/// Default near clip plane of the perspective camera.
pub const DEFAULT_NEAR: f32 = 0.1;

/// Default far clip plane of the perspective camera.
pub const DEFAULT_FAR: f32 = 100.0;
