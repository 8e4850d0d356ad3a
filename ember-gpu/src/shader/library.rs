use super::Shader;
use crate::context::Context;
use crate::error::ShaderError;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tracing::info;

/// Shaders registered by name
#[derive(Default)]
pub struct ShaderLibrary {
    shaders: HashMap<String, Rc<Shader>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shader under its own name.
    pub fn add(&mut self, shader: Rc<Shader>) -> Result<(), ShaderError> {
        let name = shader.name().to_string();
        self.add_named(name, shader)
    }

    pub fn add_named(
        &mut self,
        name: impl Into<String>,
        shader: Rc<Shader>,
    ) -> Result<(), ShaderError> {
        let name = name.into();
        if self.exists(&name) {
            return Err(ShaderError::AlreadyExists(name));
        }
        self.shaders.insert(name, shader);
        Ok(())
    }

    /// Load a shader file and register it under the file stem.
    pub fn load(
        &mut self,
        ctx: &Rc<Context>,
        path: impl AsRef<Path>,
    ) -> Result<Rc<Shader>, ShaderError> {
        let shader = Rc::new(Shader::from_file(ctx, path)?);
        self.add(Rc::clone(&shader))?;
        info!(shader = shader.name(), "Shader added to library");
        Ok(shader)
    }

    pub fn load_named(
        &mut self,
        ctx: &Rc<Context>,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Rc<Shader>, ShaderError> {
        let name = name.into();
        // Check first so a name clash does not cost a compile.
        if self.exists(&name) {
            return Err(ShaderError::AlreadyExists(name));
        }
        let shader = Rc::new(Shader::from_file(ctx, path)?);
        self.add_named(name, Rc::clone(&shader))?;
        Ok(shader)
    }

    pub fn get(&self, name: &str) -> Result<Rc<Shader>, ShaderError> {
        self.shaders
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderError::NotFound(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}
