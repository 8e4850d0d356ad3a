//! In-memory graphics backend.
//!
//! `HeadlessApi` stands in for a driver when no GPU context exists: it keeps
//! object tables, records every state-changing call and performs a light
//! syntax check when a stage compiles. Clones share the same state, so a
//! test can hand one clone to a [`crate::Context`] and inspect the other.

use crate::api::{BufferTarget, BufferUsage, GraphicsApi, UniformLocation, VertexAttribPointer};
use crate::error::BackendError;
use crate::handle::{BufferObject, Handle, NativeObject, ProgramObject, ShaderObject, VertexArrayObject};
use crate::shader::{ShaderStage, UniformValue};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;
use std::rc::Rc;

const API_NAME: &str = "headless";

/// A state-changing call as received by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader(u32, ShaderStage),
    ShaderSource(u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    SetUniform(Option<UniformLocation>, UniformValue),
    CreateVertexArray(u32),
    DeleteVertexArray(u32),
    BindVertexArray(Option<u32>),
    EnableVertexAttrib(u32),
    VertexAttribPointer(u32, VertexAttribPointer),
    CreateBuffer(u32),
    DeleteBuffer(u32),
    BindBuffer(BufferTarget, Option<u32>),
    BufferData(BufferTarget, usize, BufferUsage),
    BufferSubData(BufferTarget, i32, usize),
}

/// One attribute slot of a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttribState {
    pub enabled: bool,
    pub pointer: Option<VertexAttribPointer>,
    pub buffer: Option<Handle<BufferObject>>,
}

struct ShaderState {
    source: String,
    compiled: bool,
    log: String,
    stage: ShaderStage,
}

#[derive(Default)]
struct ProgramState {
    attached: Vec<Handle<ShaderObject>>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
    values: HashMap<u32, UniformValue>,
}

#[derive(Default)]
struct VertexArrayState {
    attribs: BTreeMap<u32, AttribState>,
    element_buffer: Option<Handle<BufferObject>>,
}

struct BufferState {
    data: Vec<u8>,
}

struct State {
    next_id: Option<NonZeroU32>,
    shaders: HashMap<Handle<ShaderObject>, ShaderState>,
    programs: HashMap<Handle<ProgramObject>, ProgramState>,
    vertex_arrays: HashMap<Handle<VertexArrayObject>, VertexArrayState>,
    buffers: HashMap<Handle<BufferObject>, BufferState>,
    current_program: Option<Handle<ProgramObject>>,
    current_vertex_array: Option<Handle<VertexArrayObject>>,
    array_buffer: Option<Handle<BufferObject>>,
    element_buffer: Option<Handle<BufferObject>>,
    calls: Vec<Call>,
}

impl State {
    fn allocate<T: NativeObject>(&mut self) -> Result<Handle<T>, BackendError> {
        let id = self.next_id.ok_or_else(|| BackendError {
            api: API_NAME,
            object: T::LABEL,
            message: "object names exhausted".to_string(),
        })?;
        self.next_id = id.checked_add(1);
        Ok(Handle::new(id))
    }

    fn buffer_for(&self, target: BufferTarget) -> Option<Handle<BufferObject>> {
        match target {
            BufferTarget::Array => self.array_buffer,
            BufferTarget::ElementArray => self.element_buffer,
        }
    }
}

#[derive(Clone)]
pub struct HeadlessApi {
    state: Rc<RefCell<State>>,
}

impl HeadlessApi {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                next_id: Some(NonZeroU32::MIN),
                shaders: HashMap::new(),
                programs: HashMap::new(),
                vertex_arrays: HashMap::new(),
                buffers: HashMap::new(),
                current_program: None,
                current_vertex_array: None,
                array_buffer: None,
                element_buffer: None,
                calls: Vec::new(),
            })),
        }
    }

    /// Every state-changing call received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn is_linked(&self, program: Handle<ProgramObject>) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    pub fn attached_shaders(&self, program: Handle<ProgramObject>) -> Vec<Handle<ShaderObject>> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.attached.clone())
            .unwrap_or_default()
    }

    /// Last value pushed into the named uniform of `program`.
    pub fn uniform_value(&self, program: Handle<ProgramObject>, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        let location = program.uniforms.iter().position(|n| n == name)?;
        program.values.get(&(location as u32)).copied()
    }

    pub fn attribute(&self, vertex_array: Handle<VertexArrayObject>, index: u32) -> Option<AttribState> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)?
            .attribs
            .get(&index)
            .copied()
    }

    /// Indices of enabled attribute slots, ascending.
    pub fn enabled_attributes(&self, vertex_array: Handle<VertexArrayObject>) -> Vec<u32> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .map(|vao| {
                vao.attribs
                    .iter()
                    .filter(|(_, attrib)| attrib.enabled)
                    .map(|(index, _)| *index)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn element_buffer(&self, vertex_array: Handle<VertexArrayObject>) -> Option<Handle<BufferObject>> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)?
            .element_buffer
    }

    pub fn buffer_contents(&self, buffer: Handle<BufferObject>) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .buffers
            .get(&buffer)
            .map(|b| b.data.clone())
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl Default for HeadlessApi {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsApi for HeadlessApi {
    fn name(&self) -> &'static str {
        API_NAME
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<Handle<ShaderObject>, BackendError> {
        let mut state = self.state.borrow_mut();
        let shader = state.allocate::<ShaderObject>()?;
        state.shaders.insert(
            shader,
            ShaderState {
                source: String::new(),
                compiled: false,
                log: String::new(),
                stage,
            },
        );
        state.calls.push(Call::CreateShader(shader.raw(), stage));
        Ok(shader)
    }

    fn shader_source(&self, shader: Handle<ShaderObject>, source: &str) {
        if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader) {
            s.source = source.to_string();
        }
        self.record(Call::ShaderSource(shader.raw()));
    }

    fn compile_shader(&self, shader: Handle<ShaderObject>) {
        if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader) {
            match check_syntax(&s.source) {
                Ok(()) => {
                    s.compiled = true;
                    s.log.clear();
                }
                Err(log) => {
                    s.compiled = false;
                    s.log = log;
                }
            }
        }
        self.record(Call::CompileShader(shader.raw()));
    }

    fn shader_compile_status(&self, shader: Handle<ShaderObject>) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: Handle<ShaderObject>) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: Handle<ShaderObject>) {
        self.state.borrow_mut().shaders.remove(&shader);
        self.record(Call::DeleteShader(shader.raw()));
    }

    fn create_program(&self) -> Result<Handle<ProgramObject>, BackendError> {
        let mut state = self.state.borrow_mut();
        let program = state.allocate::<ProgramObject>()?;
        state.programs.insert(program, ProgramState::default());
        state.calls.push(Call::CreateProgram(program.raw()));
        Ok(program)
    }

    fn attach_shader(&self, program: Handle<ProgramObject>, shader: Handle<ShaderObject>) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
            p.attached.push(shader);
        }
        self.record(Call::AttachShader {
            program: program.raw(),
            shader: shader.raw(),
        });
    }

    fn detach_shader(&self, program: Handle<ProgramObject>, shader: Handle<ShaderObject>) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
        self.record(Call::DetachShader {
            program: program.raw(),
            shader: shader.raw(),
        });
    }

    fn link_program(&self, program: Handle<ProgramObject>) {
        {
            let mut state = self.state.borrow_mut();
            let State {
                programs, shaders, ..
            } = &mut *state;
            if let Some(p) = programs.get_mut(&program) {
                match link(&p.attached, shaders) {
                    Ok(uniforms) => {
                        p.linked = true;
                        p.log.clear();
                        p.uniforms = uniforms;
                        p.values.clear();
                    }
                    Err(log) => {
                        p.linked = false;
                        p.log = log;
                    }
                }
            }
        }
        self.record(Call::LinkProgram(program.raw()));
    }

    fn program_link_status(&self, program: Handle<ProgramObject>) -> bool {
        self.is_linked(program)
    }

    fn program_info_log(&self, program: Handle<ProgramObject>) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: Handle<ProgramObject>) {
        self.state.borrow_mut().programs.remove(&program);
        self.record(Call::DeleteProgram(program.raw()));
    }

    fn use_program(&self, program: Option<Handle<ProgramObject>>) {
        self.state.borrow_mut().current_program = program;
        self.record(Call::UseProgram(program.map(|p| p.raw())));
    }

    fn uniform_location(
        &self,
        program: Handle<ProgramObject>,
        name: &str,
    ) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let program = state.programs.get(&program).filter(|p| p.linked)?;
        program
            .uniforms
            .iter()
            .position(|n| n == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn set_uniform(&self, location: Option<&UniformLocation>, value: &UniformValue) {
        {
            let mut state = self.state.borrow_mut();
            if let (Some(location), Some(current)) = (location, state.current_program) {
                if let Some(p) = state.programs.get_mut(&current) {
                    if (location.0 as usize) < p.uniforms.len() {
                        p.values.insert(location.0, *value);
                    }
                }
            }
        }
        self.record(Call::SetUniform(location.copied(), *value));
    }

    fn create_vertex_array(&self) -> Result<Handle<VertexArrayObject>, BackendError> {
        let mut state = self.state.borrow_mut();
        let vertex_array = state.allocate::<VertexArrayObject>()?;
        state
            .vertex_arrays
            .insert(vertex_array, VertexArrayState::default());
        state.calls.push(Call::CreateVertexArray(vertex_array.raw()));
        Ok(vertex_array)
    }

    fn delete_vertex_array(&self, vertex_array: Handle<VertexArrayObject>) {
        self.state.borrow_mut().vertex_arrays.remove(&vertex_array);
        self.record(Call::DeleteVertexArray(vertex_array.raw()));
    }

    fn bind_vertex_array(&self, vertex_array: Option<Handle<VertexArrayObject>>) {
        {
            let mut state = self.state.borrow_mut();
            state.current_vertex_array = vertex_array;
            // The element binding is part of vertex array state.
            let element_buffer = vertex_array
                .and_then(|vao| state.vertex_arrays.get(&vao))
                .and_then(|vao| vao.element_buffer);
            state.element_buffer = element_buffer;
        }
        self.record(Call::BindVertexArray(vertex_array.map(|v| v.raw())));
    }

    fn enable_vertex_attrib(&self, index: u32) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(current) = state.current_vertex_array {
                if let Some(vao) = state.vertex_arrays.get_mut(&current) {
                    vao.attribs.entry(index).or_default().enabled = true;
                }
            }
        }
        self.record(Call::EnableVertexAttrib(index));
    }

    fn vertex_attrib_pointer(&self, index: u32, pointer: &VertexAttribPointer) {
        {
            let mut state = self.state.borrow_mut();
            let buffer = state.array_buffer;
            if let Some(current) = state.current_vertex_array {
                if let Some(vao) = state.vertex_arrays.get_mut(&current) {
                    let attrib = vao.attribs.entry(index).or_default();
                    attrib.pointer = Some(*pointer);
                    attrib.buffer = buffer;
                }
            }
        }
        self.record(Call::VertexAttribPointer(index, *pointer));
    }

    fn create_buffer(&self) -> Result<Handle<BufferObject>, BackendError> {
        let mut state = self.state.borrow_mut();
        let buffer = state.allocate::<BufferObject>()?;
        state.buffers.insert(buffer, BufferState { data: Vec::new() });
        state.calls.push(Call::CreateBuffer(buffer.raw()));
        Ok(buffer)
    }

    fn delete_buffer(&self, buffer: Handle<BufferObject>) {
        {
            let mut state = self.state.borrow_mut();
            state.buffers.remove(&buffer);
            if state.array_buffer == Some(buffer) {
                state.array_buffer = None;
            }
            if state.element_buffer == Some(buffer) {
                state.element_buffer = None;
            }
            for vao in state.vertex_arrays.values_mut() {
                if vao.element_buffer == Some(buffer) {
                    vao.element_buffer = None;
                }
            }
        }
        self.record(Call::DeleteBuffer(buffer.raw()));
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Handle<BufferObject>>) {
        {
            let mut state = self.state.borrow_mut();
            match target {
                BufferTarget::Array => state.array_buffer = buffer,
                BufferTarget::ElementArray => {
                    state.element_buffer = buffer;
                    if let Some(current) = state.current_vertex_array {
                        if let Some(vao) = state.vertex_arrays.get_mut(&current) {
                            vao.element_buffer = buffer;
                        }
                    }
                }
            }
        }
        self.record(Call::BindBuffer(target, buffer.map(|b| b.raw())));
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(bound) = state.buffer_for(target) {
                if let Some(buffer) = state.buffers.get_mut(&bound) {
                    buffer.data = data.to_vec();
                }
            }
        }
        self.record(Call::BufferData(target, data.len(), usage));
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: i32, data: &[u8]) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(bound) = state.buffer_for(target) {
                if let Some(buffer) = state.buffers.get_mut(&bound) {
                    let start = offset.max(0) as usize;
                    let end = start + data.len();
                    // Out-of-range writes are rejected by real drivers too.
                    if end <= buffer.data.len() {
                        buffer.data[start..end].copy_from_slice(data);
                    }
                }
            }
        }
        self.record(Call::BufferSubData(target, offset, data.len()));
    }
}

/// Check delimiter balance and the presence of a `main` entry point.
fn check_syntax(source: &str) -> Result<(), String> {
    let mut open: Vec<(char, usize, usize)> = Vec::new();
    let mut line = 1;
    let mut col = 0;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        col += 1;
        match c {
            '\n' => {
                line += 1;
                col = 0;
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        col = 0;
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        col = 0;
                    } else {
                        col += 1;
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '(' | '{' | '[' => open.push((c, line, col)),
            ')' | '}' | ']' => {
                let expected = match c {
                    ')' => '(',
                    '}' => '{',
                    _ => '[',
                };
                match open.pop() {
                    Some((opener, _, _)) if opener == expected => {}
                    _ => return Err(format!("0:{line}({col}): error: syntax error, unexpected '{c}'")),
                }
            }
            _ => {}
        }
    }

    if let Some((opener, line, col)) = open.pop() {
        return Err(format!(
            "0:{line}({col}): error: syntax error, unmatched '{opener}' at end of input"
        ));
    }

    let tokens: Vec<&str> = source
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect();
    if !tokens.windows(2).any(|pair| matches!(pair, ["void", "main"])) {
        return Err("0:0: error: missing entry point 'void main()'".to_string());
    }
    Ok(())
}

/// Link the attached stages, returning uniform names in location order.
fn link(
    attached: &[Handle<ShaderObject>],
    shaders: &HashMap<Handle<ShaderObject>, ShaderState>,
) -> Result<Vec<String>, String> {
    let mut has_vertex = false;
    let mut uniforms: Vec<String> = Vec::new();

    for handle in attached {
        let shader = shaders
            .get(handle)
            .ok_or_else(|| format!("error: attached {:?} does not exist", handle))?;
        if !shader.compiled {
            return Err(format!("error: {} shader {:?} is not compiled", shader.stage, handle));
        }
        has_vertex |= shader.stage == ShaderStage::Vertex;

        for name in uniform_declarations(&shader.source) {
            if !uniforms.contains(&name) {
                uniforms.push(name);
            }
        }
    }

    if !has_vertex {
        return Err("error: program has no vertex shader attached".to_string());
    }
    Ok(uniforms)
}

/// Names declared by plain `uniform <type> <name>[, <name>];` statements.
fn uniform_declarations(source: &str) -> Vec<String> {
    const QUALIFIERS: [&str; 3] = ["lowp", "mediump", "highp"];
    let mut names = Vec::new();

    for statement in source.split(';') {
        let mut words = statement.split_whitespace().skip_while(|w| *w != "uniform");
        if words.next().is_none() || statement.contains('{') {
            continue;
        }
        let mut words = words.skip_while(|w| QUALIFIERS.contains(w));
        // Type name
        if words.next().is_none() {
            continue;
        }
        let declarators: String = words.collect::<Vec<_>>().join(" ");
        for declarator in declarators.split(',') {
            let name = declarator.split('[').next().unwrap_or("").trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }
    names
}
