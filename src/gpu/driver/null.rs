//! A headless [`Driver`] that keeps every object in memory.
//!
//! Buffers and textures hold real bytes, uniforms hold real values and
//! shader sources are scanned line by line for their declarations, so
//! wrappers behave the same as against a live context as far as their own
//! logic goes. Every call is counted by name for assertions on bind elision.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::rc::Rc;

use super::*;
use crate::utils::{Handle, Pool};

/// One recorded draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub mode: GLenum,
    pub first: i32,
    pub count: i32,
    pub instances: i32,
    /// Index type for indexed draws.
    pub element_type: Option<GLenum>,
    pub vertex_array: Option<VertexArrayHandle>,
    pub program: Option<ProgramHandle>,
    pub framebuffer: Option<FramebufferHandle>,
    /// Primitive mode of the active transform feedback, if any.
    pub transform_feedback: Option<GLenum>,
    pub rasterizer_discard: bool,
}

/// One recorded `glClear`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClearCall {
    pub framebuffer: Option<FramebufferHandle>,
    pub mask: GLenum,
    pub color: [f32; 4],
    pub depth: f32,
}

/// A registered vertex attribute pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttribPointer {
    pub buffer: Option<BufferHandle>,
    pub size: i32,
    pub data_type: GLenum,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
    pub divisor: u32,
    pub enabled: bool,
}

#[derive(Clone, Debug, Default)]
struct DeclaredUniform {
    name: String,
    utype: GLenum,
    size: i32,
    array: bool,
}

#[derive(Clone, Debug, Default)]
struct ShaderInfo {
    uniforms: Vec<DeclaredUniform>,
    block_uniforms: Vec<DeclaredUniform>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    geometry_input: Option<GLenum>,
    geometry_output: Option<(GLenum, i32)>,
}

struct NullShader {
    stage: GLenum,
    source: String,
    compiled: Option<std::result::Result<ShaderInfo, String>>,
    attachments: usize,
    delete_pending: bool,
}

struct LinkedUniform {
    declared: DeclaredUniform,
    location: Option<u32>,
    values: Vec<u32>,
}

#[derive(Default)]
struct NullProgram {
    attached: Vec<ShaderHandle>,
    varyings: Vec<String>,
    buffer_mode: GLenum,
    linked: bool,
    log: String,
    uniforms: Vec<LinkedUniform>,
    attributes: HashMap<String, u32>,
    geometry: Option<(GLenum, GLenum, i32)>,
}

#[derive(Default)]
struct NullVertexArray {
    attributes: BTreeMap<u32, AttribPointer>,
    element_buffer: Option<BufferHandle>,
}

#[derive(Default)]
struct NullTexture {
    width: i32,
    height: i32,
    internal_format: i32,
    bytes_per_pixel: usize,
    levels: HashMap<i32, Vec<u8>>,
    parameters: HashMap<GLenum, i32>,
    mipmaps_generated: bool,
}

#[derive(Default)]
struct NullFramebuffer {
    attachments: BTreeMap<GLenum, TextureHandle>,
}

struct NullState {
    calls: HashMap<&'static str, usize>,
    parameters: HashMap<GLenum, i32>,
    errors: VecDeque<GLenum>,

    shaders: Pool<NullShader>,
    programs: Pool<NullProgram>,
    buffers: Pool<Vec<u8>>,
    vertex_arrays: Pool<NullVertexArray>,
    textures: Pool<NullTexture>,
    framebuffers: Pool<NullFramebuffer>,

    current_program: Option<ProgramHandle>,
    bound_buffers: HashMap<GLenum, BufferHandle>,
    indexed_buffers: HashMap<(GLenum, u32), BufferHandle>,
    bound_vertex_array: Option<VertexArrayHandle>,
    active_texture: GLenum,
    bound_textures: HashMap<(GLenum, GLenum), TextureHandle>,
    bound_framebuffer: Option<FramebufferHandle>,
    pixel_store: HashMap<GLenum, i32>,
    capabilities: HashSet<GLenum>,
    transform_feedback: Option<GLenum>,

    viewport: [i32; 4],
    depth_mask: bool,
    clear_color: [f32; 4],
    clear_depth: f32,
    draw_buffers: Vec<GLenum>,

    draws: Vec<DrawCall>,
    clears: Vec<ClearCall>,
}

impl Default for NullState {
    fn default() -> Self {
        let parameters = [
            (glow::MAJOR_VERSION, 3),
            (glow::MINOR_VERSION, 3),
            (glow::CONTEXT_PROFILE_MASK, glow::CONTEXT_CORE_PROFILE_BIT as i32),
            (glow::SUBPIXEL_BITS, 4),
            (glow::UNIFORM_BUFFER_OFFSET_ALIGNMENT, 256),
            (glow::MAX_ARRAY_TEXTURE_LAYERS, 2048),
            (glow::MAX_3D_TEXTURE_SIZE, 2048),
            (glow::MAX_COLOR_ATTACHMENTS, 8),
            (glow::MAX_COLOR_TEXTURE_SAMPLES, 8),
            (glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS, 48),
            (glow::MAX_COMBINED_UNIFORM_BLOCKS, 36),
            (glow::MAX_CUBE_MAP_TEXTURE_SIZE, 16384),
            (glow::MAX_DRAW_BUFFERS, 8),
            (glow::MAX_ELEMENTS_INDICES, 1 << 20),
            (glow::MAX_ELEMENTS_VERTICES, 1 << 20),
            (glow::MAX_SAMPLES, 8),
            (glow::MAX_RENDERBUFFER_SIZE, 16384),
            (glow::MAX_TEXTURE_SIZE, 16384),
            (glow::MAX_UNIFORM_BLOCK_SIZE, 65536),
            (glow::MAX_UNIFORM_BUFFER_BINDINGS, 72),
            (glow::MAX_VARYING_VECTORS, 16),
            (glow::MAX_VERTEX_ATTRIBS, 16),
            (glow::MAX_VERTEX_TEXTURE_IMAGE_UNITS, 16),
            (glow::MAX_VERTEX_UNIFORM_COMPONENTS, 4096),
            (glow::MAX_FRAGMENT_UNIFORM_COMPONENTS, 4096),
        ]
        .into_iter()
        .collect();

        Self {
            calls: HashMap::new(),
            parameters,
            errors: VecDeque::new(),
            shaders: Pool::new(),
            programs: Pool::new(),
            buffers: Pool::new(),
            vertex_arrays: Pool::new(),
            textures: Pool::new(),
            framebuffers: Pool::new(),
            current_program: None,
            bound_buffers: HashMap::new(),
            indexed_buffers: HashMap::new(),
            bound_vertex_array: None,
            active_texture: glow::TEXTURE0,
            bound_textures: HashMap::new(),
            bound_framebuffer: None,
            pixel_store: HashMap::new(),
            capabilities: HashSet::new(),
            transform_feedback: None,
            viewport: [0; 4],
            depth_mask: true,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            draw_buffers: Vec::new(),
            draws: Vec::new(),
            clears: Vec::new(),
        }
    }
}

impl NullState {
    fn error(&mut self, code: GLenum) {
        self.errors.push_back(code);
    }

    fn bound_buffer(&self, target: GLenum) -> Option<BufferHandle> {
        if target == glow::ELEMENT_ARRAY_BUFFER {
            let vao = self.bound_vertex_array?;
            return self.vertex_arrays.get_ref(vao.get())?.element_buffer;
        }
        self.bound_buffers.get(&target).copied()
    }

    fn bound_buffer_data(&mut self, target: GLenum) -> Option<&mut Vec<u8>> {
        let buffer = self.bound_buffer(target)?;
        self.buffers.get_mut_ref(buffer.get())
    }

    fn bound_texture(&self, target: GLenum) -> Option<TextureHandle> {
        self.bound_textures
            .get(&(self.active_texture, target))
            .copied()
    }

    fn uniform_mut(&mut self, location: UniformLocation) -> Option<&mut LinkedUniform> {
        let program = self.current_program?;
        self.programs
            .get_mut_ref(program.get())?
            .uniforms
            .iter_mut()
            .find(|u| u.location == Some(location.0))
    }

    fn uniform_ref(&self, program: ProgramHandle, location: UniformLocation) -> Option<&LinkedUniform> {
        self.programs
            .get_ref(program.get())?
            .uniforms
            .iter()
            .find(|u| u.location == Some(location.0))
    }

    fn release_shader_if_unused(&mut self, shader: ShaderHandle) {
        let unused = self
            .shaders
            .get_ref(shader.get())
            .map(|s| s.delete_pending && s.attachments == 0)
            .unwrap_or(false);
        if unused {
            self.shaders.release(shader.get());
        }
    }

    fn link(&mut self, program: ProgramHandle) {
        let Some(prog) = self.programs.get_ref(program.get()) else {
            self.error(glow::INVALID_VALUE);
            return;
        };

        let mut stages: Vec<(GLenum, ShaderInfo)> = Vec::new();
        let mut log = String::new();
        for shader in &prog.attached {
            match self.shaders.get_ref(shader.get()).and_then(|s| s.compiled.clone().map(|c| (s.stage, c))) {
                Some((stage, Ok(info))) => stages.push((stage, info)),
                _ => log.push_str("error: linking with uncompiled/unspecialized shader\n"),
            }
        }

        let stage = |kind: GLenum| stages.iter().find(|(s, _)| *s == kind).map(|(_, i)| i);
        let vertex = stage(glow::VERTEX_SHADER);
        let geometry = stage(glow::GEOMETRY_SHADER);
        if vertex.is_none() {
            log.push_str("error: program lacks a vertex shader\n");
        }

        let captured = geometry.or(vertex).map(|i| i.outputs.clone()).unwrap_or_default();
        for varying in &prog.varyings {
            if !captured.contains(varying) {
                log.push_str(&format!(
                    "error: Transform feedback varying `{}' undeclared\n",
                    varying
                ));
            }
        }

        let mut uniforms: Vec<LinkedUniform> = Vec::new();
        let mut next_location = 0u32;
        for (_, info) in &stages {
            for declared in &info.uniforms {
                if uniforms.iter().any(|u| u.declared.name == declared.name) {
                    continue;
                }
                uniforms.push(LinkedUniform {
                    declared: declared.clone(),
                    location: Some(next_location),
                    values: vec![0; components_of(declared.utype) * declared.size as usize],
                });
                next_location += 1;
            }
        }
        for (_, info) in &stages {
            for declared in &info.block_uniforms {
                if uniforms.iter().any(|u| u.declared.name == declared.name) {
                    continue;
                }
                uniforms.push(LinkedUniform {
                    declared: declared.clone(),
                    location: None,
                    values: Vec::new(),
                });
            }
        }

        let attributes = vertex
            .map(|v| {
                v.inputs
                    .iter()
                    .enumerate()
                    .map(|(i, name)| (name.clone(), i as u32))
                    .collect()
            })
            .unwrap_or_default();

        let geometry = geometry.map(|g| {
            let (output, vertices) = g.geometry_output.unwrap_or((glow::TRIANGLE_STRIP, 0));
            (g.geometry_input.unwrap_or(glow::TRIANGLES), output, vertices)
        });

        let linked = log.is_empty();
        if let Some(prog) = self.programs.get_mut_ref(program.get()) {
            prog.linked = linked;
            prog.log = log;
            if linked {
                prog.uniforms = uniforms;
                prog.attributes = attributes;
                prog.geometry = geometry;
            }
        }
    }
}

/// In-memory [`Driver`]. Clones share the same state, so a test can keep
/// one clone for inspection while the context owns another.
#[derive(Clone, Default)]
pub struct NullDriver {
    state: Rc<RefCell<NullState>>,
}

impl NullDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, call: &'static str, f: impl FnOnce(&mut NullState) -> R) -> R {
        let mut state = self.state.borrow_mut();
        *state.calls.entry(call).or_default() += 1;
        f(&mut *state)
    }

    /// How many times the driver entry point `call` was invoked.
    pub fn call_count(&self, call: &str) -> usize {
        self.state.borrow().calls.get(call).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.borrow().calls.values().sum()
    }

    pub fn reset_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Overrides the value reported for an implementation limit.
    pub fn set_parameter(&self, parameter: GLenum, value: i32) {
        self.state.borrow_mut().parameters.insert(parameter, value);
    }

    /// Queues an error code for the next `get_error`.
    pub fn push_error(&self, code: GLenum) {
        self.state.borrow_mut().error(code);
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.state.borrow().framebuffers.len()
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state.borrow().current_program
    }

    pub fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.state.borrow().bound_framebuffer
    }

    pub fn bound_buffer(&self, target: GLenum) -> Option<BufferHandle> {
        self.state.borrow().bound_buffer(target)
    }

    pub fn bound_buffer_base(&self, target: GLenum, index: u32) -> Option<BufferHandle> {
        self.state.borrow().indexed_buffers.get(&(target, index)).copied()
    }

    pub fn viewport(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    pub fn depth_mask(&self) -> bool {
        self.state.borrow().depth_mask
    }

    pub fn draw_buffers(&self) -> Vec<GLenum> {
        self.state.borrow().draw_buffers.clone()
    }

    pub fn is_enabled(&self, capability: GLenum) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    pub fn pixel_store(&self, parameter: GLenum) -> Option<i32> {
        self.state.borrow().pixel_store.get(&parameter).copied()
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn clears(&self) -> Vec<ClearCall> {
        self.state.borrow().clears.clone()
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get_ref(buffer.get()).cloned()
    }

    /// Attribute pointers of `vertex_array`, ordered by location.
    pub fn vertex_attributes(&self, vertex_array: VertexArrayHandle) -> Vec<(u32, AttribPointer)> {
        self.state
            .borrow()
            .vertex_arrays
            .get_ref(vertex_array.get())
            .map(|vao| {
                vao.attributes
                    .iter()
                    .map(|(loc, ptr)| (*loc, ptr.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn element_buffer(&self, vertex_array: VertexArrayHandle) -> Option<BufferHandle> {
        self.state
            .borrow()
            .vertex_arrays
            .get_ref(vertex_array.get())?
            .element_buffer
    }

    pub fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.state
            .borrow()
            .programs
            .get_ref(program.get())?
            .attributes
            .get(name)
            .copied()
    }

    pub fn transform_feedback_varyings(&self, program: ProgramHandle) -> Vec<String> {
        self.state
            .borrow()
            .programs
            .get_ref(program.get())
            .map(|p| p.varyings.clone())
            .unwrap_or_default()
    }

    pub fn attached_shaders(&self, program: ProgramHandle) -> Vec<ShaderHandle> {
        self.state
            .borrow()
            .programs
            .get_ref(program.get())
            .map(|p| p.attached.clone())
            .unwrap_or_default()
    }

    pub fn texture_parameter(&self, texture: TextureHandle, parameter: GLenum) -> Option<i32> {
        self.state
            .borrow()
            .textures
            .get_ref(texture.get())?
            .parameters
            .get(&parameter)
            .copied()
    }

    pub fn texture_internal_format(&self, texture: TextureHandle) -> Option<i32> {
        Some(self.state.borrow().textures.get_ref(texture.get())?.internal_format)
    }

    pub fn texture_level(&self, texture: TextureHandle, level: i32) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .textures
            .get_ref(texture.get())?
            .levels
            .get(&level)
            .cloned()
    }

    pub fn mipmaps_generated(&self, texture: TextureHandle) -> bool {
        self.state
            .borrow()
            .textures
            .get_ref(texture.get())
            .map(|t| t.mipmaps_generated)
            .unwrap_or(false)
    }

    pub fn framebuffer_attachment(
        &self,
        framebuffer: FramebufferHandle,
        attachment: GLenum,
    ) -> Option<TextureHandle> {
        self.state
            .borrow()
            .framebuffers
            .get_ref(framebuffer.get())?
            .attachments
            .get(&attachment)
            .copied()
    }
}

impl Driver for NullDriver {
    fn get_parameter_i32(&self, parameter: GLenum) -> i32 {
        self.with("get_parameter_i32", |s| {
            s.parameters.get(&parameter).copied().unwrap_or(0)
        })
    }

    fn get_error(&self) -> GLenum {
        self.with("get_error", |s| s.errors.pop_front().unwrap_or(glow::NO_ERROR))
    }

    fn create_shader(&self, stage: GLenum) -> Result<ShaderHandle, String> {
        self.with("create_shader", |s| {
            if !matches!(
                stage,
                glow::VERTEX_SHADER | glow::FRAGMENT_SHADER | glow::GEOMETRY_SHADER
            ) {
                return Err(format!("unsupported shader stage {:#06x}", stage));
            }
            let name = s.shaders.insert(NullShader {
                stage,
                source: String::new(),
                compiled: None,
                attachments: 0,
                delete_pending: false,
            });
            Ok(Handle::from_raw(name))
        })
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        self.with("shader_source", |s| match s.shaders.get_mut_ref(shader.get()) {
            Some(entry) => entry.source = source.to_string(),
            None => s.error(glow::INVALID_VALUE),
        })
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        self.with("compile_shader", |s| match s.shaders.get_mut_ref(shader.get()) {
            Some(entry) => entry.compiled = Some(scan_source(entry.stage, &entry.source)),
            None => s.error(glow::INVALID_VALUE),
        })
    }

    fn get_shader_compile_status(&self, shader: ShaderHandle) -> bool {
        self.with("get_shader_compile_status", |s| {
            matches!(
                s.shaders.get_ref(shader.get()).and_then(|e| e.compiled.as_ref()),
                Some(Ok(_))
            )
        })
    }

    fn get_shader_info_log(&self, shader: ShaderHandle) -> String {
        self.with("get_shader_info_log", |s| {
            match s.shaders.get_ref(shader.get()).and_then(|e| e.compiled.as_ref()) {
                Some(Err(log)) => log.clone(),
                _ => String::new(),
            }
        })
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.with("delete_shader", |s| {
            if let Some(entry) = s.shaders.get_mut_ref(shader.get()) {
                entry.delete_pending = true;
            }
            s.release_shader_if_unused(shader);
        })
    }

    fn create_program(&self) -> Result<ProgramHandle, String> {
        self.with("create_program", |s| {
            Ok(Handle::from_raw(s.programs.insert(NullProgram::default())))
        })
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        self.with("attach_shader", |s| {
            let Some(entry) = s.shaders.get_mut_ref(shader.get()) else {
                return s.error(glow::INVALID_VALUE);
            };
            entry.attachments += 1;
            match s.programs.get_mut_ref(program.get()) {
                Some(prog) => prog.attached.push(shader),
                None => s.error(glow::INVALID_VALUE),
            }
        })
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        self.with("detach_shader", |s| {
            let Some(prog) = s.programs.get_mut_ref(program.get()) else {
                return s.error(glow::INVALID_VALUE);
            };
            let before = prog.attached.len();
            prog.attached.retain(|h| *h != shader);
            if prog.attached.len() == before {
                return s.error(glow::INVALID_OPERATION);
            }
            if let Some(entry) = s.shaders.get_mut_ref(shader.get()) {
                entry.attachments = entry.attachments.saturating_sub(1);
            }
            s.release_shader_if_unused(shader);
        })
    }

    fn transform_feedback_varyings(
        &self,
        program: ProgramHandle,
        varyings: &[&str],
        buffer_mode: GLenum,
    ) {
        self.with("transform_feedback_varyings", |s| {
            match s.programs.get_mut_ref(program.get()) {
                Some(prog) => {
                    prog.varyings = varyings.iter().map(|v| v.to_string()).collect();
                    prog.buffer_mode = buffer_mode;
                }
                None => s.error(glow::INVALID_VALUE),
            }
        })
    }

    fn link_program(&self, program: ProgramHandle) {
        self.with("link_program", |s| s.link(program))
    }

    fn get_program_link_status(&self, program: ProgramHandle) -> bool {
        self.with("get_program_link_status", |s| {
            s.programs
                .get_ref(program.get())
                .map(|p| p.linked)
                .unwrap_or(false)
        })
    }

    fn get_program_info_log(&self, program: ProgramHandle) -> String {
        self.with("get_program_info_log", |s| {
            s.programs
                .get_ref(program.get())
                .map(|p| p.log.clone())
                .unwrap_or_default()
        })
    }

    fn get_program_parameter_i32(&self, program: ProgramHandle, parameter: GLenum) -> i32 {
        self.with("get_program_parameter_i32", |s| {
            let Some(prog) = s.programs.get_ref(program.get()) else {
                return 0;
            };
            match parameter {
                glow::LINK_STATUS => prog.linked as i32,
                glow::ACTIVE_UNIFORMS => prog.uniforms.len() as i32,
                glow::ATTACHED_SHADERS => prog.attached.len() as i32,
                glow::TRANSFORM_FEEDBACK_VARYINGS => prog.varyings.len() as i32,
                glow::TRANSFORM_FEEDBACK_BUFFER_MODE => prog.buffer_mode as i32,
                glow::GEOMETRY_INPUT_TYPE => prog.geometry.map_or(0, |g| g.0 as i32),
                glow::GEOMETRY_OUTPUT_TYPE => prog.geometry.map_or(0, |g| g.1 as i32),
                glow::GEOMETRY_VERTICES_OUT => prog.geometry.map_or(0, |g| g.2),
                _ => 0,
            }
        })
    }

    fn get_active_uniforms(&self, program: ProgramHandle) -> u32 {
        self.with("get_active_uniforms", |s| {
            s.programs
                .get_ref(program.get())
                .map_or(0, |p| p.uniforms.len() as u32)
        })
    }

    fn get_active_uniform(&self, program: ProgramHandle, index: u32) -> Option<ActiveUniform> {
        self.with("get_active_uniform", |s| {
            let uniform = s.programs.get_ref(program.get())?.uniforms.get(index as usize)?;
            let declared = &uniform.declared;
            let name = if declared.array {
                format!("{}[0]", declared.name)
            } else {
                declared.name.clone()
            };
            Some(ActiveUniform {
                name,
                utype: declared.utype,
                size: declared.size,
            })
        })
    }

    fn get_uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.with("get_uniform_location", |s| {
            let base = name.strip_suffix("[0]").unwrap_or(name);
            s.programs
                .get_ref(program.get())?
                .uniforms
                .iter()
                .find(|u| u.declared.name == base)?
                .location
                .map(UniformLocation)
        })
    }

    fn get_attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.with("get_attrib_location", |s| {
            s.programs
                .get_ref(program.get())?
                .attributes
                .get(name)
                .copied()
        })
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.with("use_program", |s| {
            let usable = program
                .map(|p| s.programs.get_ref(p.get()).is_some_and(|p| p.linked))
                .unwrap_or(true);
            if usable {
                s.current_program = program;
            } else {
                s.error(glow::INVALID_OPERATION);
            }
        })
    }

    fn delete_program(&self, program: ProgramHandle) {
        self.with("delete_program", |s| {
            let Some(prog) = s.programs.release(program.get()) else {
                return s.error(glow::INVALID_VALUE);
            };
            for shader in prog.attached {
                if let Some(entry) = s.shaders.get_mut_ref(shader.get()) {
                    entry.attachments = entry.attachments.saturating_sub(1);
                }
                s.release_shader_if_unused(shader);
            }
            if s.current_program == Some(program) {
                s.current_program = None;
            }
        })
    }

    fn uniform_i32_slice(&self, location: UniformLocation, _components: u32, values: &[i32]) {
        self.with("uniform_i32_slice", |s| match s.uniform_mut(location) {
            Some(uniform) => uniform
                .values
                .iter_mut()
                .zip(values)
                .for_each(|(dst, src)| *dst = *src as u32),
            None => s.error(glow::INVALID_OPERATION),
        })
    }

    fn uniform_f32_slice(&self, location: UniformLocation, _components: u32, values: &[f32]) {
        self.with("uniform_f32_slice", |s| match s.uniform_mut(location) {
            Some(uniform) => uniform
                .values
                .iter_mut()
                .zip(values)
                .for_each(|(dst, src)| *dst = src.to_bits()),
            None => s.error(glow::INVALID_OPERATION),
        })
    }

    fn uniform_matrix_f32_slice(
        &self,
        location: UniformLocation,
        _dim: u32,
        _transpose: bool,
        values: &[f32],
    ) {
        self.with("uniform_matrix_f32_slice", |s| match s.uniform_mut(location) {
            Some(uniform) => uniform
                .values
                .iter_mut()
                .zip(values)
                .for_each(|(dst, src)| *dst = src.to_bits()),
            None => s.error(glow::INVALID_OPERATION),
        })
    }

    fn get_uniform_i32(&self, program: ProgramHandle, location: UniformLocation, values: &mut [i32]) {
        self.with("get_uniform_i32", |s| {
            if let Some(uniform) = s.uniform_ref(program, location) {
                values
                    .iter_mut()
                    .zip(&uniform.values)
                    .for_each(|(dst, src)| *dst = *src as i32);
            }
        })
    }

    fn get_uniform_f32(&self, program: ProgramHandle, location: UniformLocation, values: &mut [f32]) {
        self.with("get_uniform_f32", |s| {
            if let Some(uniform) = s.uniform_ref(program, location) {
                values
                    .iter_mut()
                    .zip(&uniform.values)
                    .for_each(|(dst, src)| *dst = f32::from_bits(*src));
            }
        })
    }

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        self.with("create_buffer", |s| Ok(Handle::from_raw(s.buffers.insert(Vec::new()))))
    }

    fn bind_buffer(&self, target: GLenum, buffer: Option<BufferHandle>) {
        self.with("bind_buffer", |s| {
            if target == glow::ELEMENT_ARRAY_BUFFER {
                if let Some(vao) = s.bound_vertex_array {
                    if let Some(vao) = s.vertex_arrays.get_mut_ref(vao.get()) {
                        vao.element_buffer = buffer;
                    }
                    return;
                }
            }
            match buffer {
                Some(buffer) => s.bound_buffers.insert(target, buffer),
                None => s.bound_buffers.remove(&target),
            };
        })
    }

    fn bind_buffer_base(&self, target: GLenum, index: u32, buffer: Option<BufferHandle>) {
        self.with("bind_buffer_base", |s| {
            match buffer {
                Some(buffer) => {
                    s.indexed_buffers.insert((target, index), buffer);
                    s.bound_buffers.insert(target, buffer);
                }
                None => {
                    s.indexed_buffers.remove(&(target, index));
                    s.bound_buffers.remove(&target);
                }
            };
        })
    }

    fn buffer_data(&self, target: GLenum, data: BufferData<'_>, _usage: GLenum) {
        self.with("buffer_data", |s| match s.bound_buffer_data(target) {
            Some(store) => {
                *store = match data {
                    BufferData::Bytes(bytes) => bytes.to_vec(),
                    BufferData::Reserve(size) => vec![0; size],
                }
            }
            None => s.error(glow::INVALID_OPERATION),
        })
    }

    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]) {
        self.with("buffer_sub_data", |s| {
            match s.bound_buffer_data(target) {
                Some(store) if offset + data.len() <= store.len() => {
                    store[offset..offset + data.len()].copy_from_slice(data)
                }
                Some(_) => s.error(glow::INVALID_VALUE),
                None => s.error(glow::INVALID_OPERATION),
            }
        })
    }

    fn get_buffer_sub_data(&self, target: GLenum, offset: usize, dst: &mut [u8]) {
        self.with("get_buffer_sub_data", |s| {
            match s.bound_buffer_data(target) {
                Some(store) if offset + dst.len() <= store.len() => {
                    dst.copy_from_slice(&store[offset..offset + dst.len()])
                }
                Some(_) => s.error(glow::INVALID_VALUE),
                None => s.error(glow::INVALID_OPERATION),
            }
        })
    }

    fn copy_buffer_sub_data(
        &self,
        src_target: GLenum,
        dst_target: GLenum,
        src_offset: usize,
        dst_offset: usize,
        size: usize,
    ) {
        self.with("copy_buffer_sub_data", |s| {
            let Some(source) = s.bound_buffer_data(src_target).map(|b| b.clone()) else {
                return s.error(glow::INVALID_OPERATION);
            };
            match s.bound_buffer_data(dst_target) {
                Some(dst)
                    if src_offset + size <= source.len() && dst_offset + size <= dst.len() =>
                {
                    dst[dst_offset..dst_offset + size]
                        .copy_from_slice(&source[src_offset..src_offset + size])
                }
                Some(_) => s.error(glow::INVALID_VALUE),
                None => s.error(glow::INVALID_OPERATION),
            }
        })
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        self.with("delete_buffer", |s| {
            if s.buffers.release(buffer.get()).is_none() {
                return s.error(glow::INVALID_VALUE);
            }
            s.bound_buffers.retain(|_, b| *b != buffer);
            s.indexed_buffers.retain(|_, b| *b != buffer);
        })
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        self.with("create_vertex_array", |s| {
            Ok(Handle::from_raw(s.vertex_arrays.insert(NullVertexArray::default())))
        })
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.with("bind_vertex_array", |s| s.bound_vertex_array = vertex_array)
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: GLenum,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.with("vertex_attrib_pointer", |s| {
            let buffer = s.bound_buffers.get(&glow::ARRAY_BUFFER).copied();
            let Some(vao) = s.bound_vertex_array.and_then(|v| s.vertex_arrays.get_mut_ref(v.get()))
            else {
                return s.error(glow::INVALID_OPERATION);
            };
            let entry = vao.attributes.entry(index).or_insert(AttribPointer {
                buffer: None,
                size: 4,
                data_type: glow::FLOAT,
                normalized: false,
                stride: 0,
                offset: 0,
                divisor: 0,
                enabled: false,
            });
            entry.buffer = buffer;
            entry.size = size;
            entry.data_type = data_type;
            entry.normalized = normalized;
            entry.stride = stride;
            entry.offset = offset;
        })
    }

    fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        self.with("vertex_attrib_divisor", |s| {
            let pointer = s
                .bound_vertex_array
                .and_then(|v| s.vertex_arrays.get_mut_ref(v.get()))
                .and_then(|vao| vao.attributes.get_mut(&index));
            match pointer {
                Some(pointer) => pointer.divisor = divisor,
                None => s.error(glow::INVALID_OPERATION),
            }
        })
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.with("enable_vertex_attrib_array", |s| {
            let pointer = s
                .bound_vertex_array
                .and_then(|v| s.vertex_arrays.get_mut_ref(v.get()))
                .and_then(|vao| vao.attributes.get_mut(&index));
            match pointer {
                Some(pointer) => pointer.enabled = true,
                None => s.error(glow::INVALID_OPERATION),
            }
        })
    }

    fn draw_arrays_instanced(&self, mode: GLenum, first: i32, count: i32, instances: i32) {
        self.with("draw_arrays_instanced", |s| {
            let call = DrawCall {
                mode,
                first,
                count,
                instances,
                element_type: None,
                vertex_array: s.bound_vertex_array,
                program: s.current_program,
                framebuffer: s.bound_framebuffer,
                transform_feedback: s.transform_feedback,
                rasterizer_discard: s.capabilities.contains(&glow::RASTERIZER_DISCARD),
            };
            s.draws.push(call);
        })
    }

    fn draw_elements_instanced(
        &self,
        mode: GLenum,
        count: i32,
        element_type: GLenum,
        offset: i32,
        instances: i32,
    ) {
        self.with("draw_elements_instanced", |s| {
            if s.bound_buffer(glow::ELEMENT_ARRAY_BUFFER).is_none() {
                return s.error(glow::INVALID_OPERATION);
            }
            let call = DrawCall {
                mode,
                first: offset,
                count,
                instances,
                element_type: Some(element_type),
                vertex_array: s.bound_vertex_array,
                program: s.current_program,
                framebuffer: s.bound_framebuffer,
                transform_feedback: s.transform_feedback,
                rasterizer_discard: s.capabilities.contains(&glow::RASTERIZER_DISCARD),
            };
            s.draws.push(call);
        })
    }

    fn begin_transform_feedback(&self, primitive_mode: GLenum) {
        self.with("begin_transform_feedback", |s| {
            if s.transform_feedback.is_some() {
                return s.error(glow::INVALID_OPERATION);
            }
            s.transform_feedback = Some(primitive_mode);
        })
    }

    fn end_transform_feedback(&self) {
        self.with("end_transform_feedback", |s| {
            if s.transform_feedback.take().is_none() {
                s.error(glow::INVALID_OPERATION);
            }
        })
    }

    fn enable(&self, capability: GLenum) {
        self.with("enable", |s| {
            s.capabilities.insert(capability);
        })
    }

    fn disable(&self, capability: GLenum) {
        self.with("disable", |s| {
            s.capabilities.remove(&capability);
        })
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        self.with("delete_vertex_array", |s| {
            if s.vertex_arrays.release(vertex_array.get()).is_none() {
                return s.error(glow::INVALID_VALUE);
            }
            if s.bound_vertex_array == Some(vertex_array) {
                s.bound_vertex_array = None;
            }
        })
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        self.with("create_texture", |s| {
            Ok(Handle::from_raw(s.textures.insert(NullTexture::default())))
        })
    }

    fn active_texture(&self, unit: GLenum) {
        self.with("active_texture", |s| s.active_texture = unit)
    }

    fn bind_texture(&self, target: GLenum, texture: Option<TextureHandle>) {
        self.with("bind_texture", |s| {
            let key = (s.active_texture, target);
            match texture {
                Some(texture) => s.bound_textures.insert(key, texture),
                None => s.bound_textures.remove(&key),
            };
        })
    }

    fn pixel_store_i32(&self, parameter: GLenum, value: i32) {
        self.with("pixel_store_i32", |s| {
            s.pixel_store.insert(parameter, value);
        })
    }

    fn tex_image_2d(
        &self,
        target: GLenum,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: GLenum,
        ty: GLenum,
        pixels: PixelUnpack<'_>,
    ) {
        self.with("tex_image_2d", |s| {
            let bytes_per_pixel = format_components(format) * type_size(ty);
            let size = width.max(0) as usize * height.max(0) as usize * bytes_per_pixel;
            let data = match pixels {
                PixelUnpack::None => vec![0; size],
                PixelUnpack::Bytes(bytes) => bytes.to_vec(),
                PixelUnpack::BufferOffset(offset) => {
                    let offset = offset as usize;
                    match s.bound_buffer_data(glow::PIXEL_UNPACK_BUFFER) {
                        Some(src) if offset + size <= src.len() => src[offset..offset + size].to_vec(),
                        _ => return s.error(glow::INVALID_OPERATION),
                    }
                }
            };
            if data.len() != size {
                return s.error(glow::INVALID_VALUE);
            }

            let Some(texture) = s
                .bound_texture(target)
                .and_then(|t| s.textures.get_mut_ref(t.get()))
            else {
                return s.error(glow::INVALID_OPERATION);
            };
            if level == 0 {
                texture.width = width;
                texture.height = height;
                texture.internal_format = internal_format;
                texture.bytes_per_pixel = bytes_per_pixel;
            }
            texture.levels.insert(level, data);
        })
    }

    fn tex_sub_image_2d(&self, target: GLenum, region: &PixelRegion, pixels: PixelUnpack<'_>) {
        self.with("tex_sub_image_2d", |s| {
            let bpp = format_components(region.format) * type_size(region.ty);
            let row = region.width.max(0) as usize * bpp;
            let size = row * region.height.max(0) as usize;
            let src = match pixels {
                PixelUnpack::None => return,
                PixelUnpack::Bytes(bytes) => bytes.to_vec(),
                PixelUnpack::BufferOffset(offset) => {
                    let offset = offset as usize;
                    match s.bound_buffer_data(glow::PIXEL_UNPACK_BUFFER) {
                        Some(src) if offset + size <= src.len() => src[offset..offset + size].to_vec(),
                        _ => return s.error(glow::INVALID_OPERATION),
                    }
                }
            };
            if src.len() < size {
                return s.error(glow::INVALID_VALUE);
            }

            let Some(texture) = s
                .bound_texture(target)
                .and_then(|t| s.textures.get_mut_ref(t.get()))
            else {
                return s.error(glow::INVALID_OPERATION);
            };
            let level_width = level_extent(texture.width, region.level) as usize;
            let level_height = level_extent(texture.height, region.level) as usize;
            let Some(store) = texture.levels.get_mut(&region.level) else {
                return s.error(glow::INVALID_OPERATION);
            };
            if region.x < 0
                || region.y < 0
                || region.x as usize + region.width as usize > level_width
                || region.y as usize + region.height as usize > level_height
                || bpp != texture.bytes_per_pixel
            {
                return s.error(glow::INVALID_VALUE);
            }

            for y in 0..region.height as usize {
                let dst = ((region.y as usize + y) * level_width + region.x as usize) * bpp;
                store[dst..dst + row].copy_from_slice(&src[y * row..(y + 1) * row]);
            }
        })
    }

    fn get_tex_image(&self, target: GLenum, level: i32, _format: GLenum, _ty: GLenum, pixels: &mut [u8]) {
        self.with("get_tex_image", |s| {
            let data = s
                .bound_texture(target)
                .and_then(|t| s.textures.get_ref(t.get()))
                .and_then(|t| t.levels.get(&level));
            match data {
                Some(data) => {
                    let n = data.len().min(pixels.len());
                    pixels[..n].copy_from_slice(&data[..n]);
                }
                None => s.error(glow::INVALID_OPERATION),
            }
        })
    }

    fn tex_parameter_i32(&self, target: GLenum, parameter: GLenum, value: i32) {
        self.with("tex_parameter_i32", |s| {
            match s
                .bound_texture(target)
                .and_then(|t| s.textures.get_mut_ref(t.get()))
            {
                Some(texture) => {
                    texture.parameters.insert(parameter, value);
                }
                None => s.error(glow::INVALID_OPERATION),
            }
        })
    }

    fn generate_mipmap(&self, target: GLenum) {
        self.with("generate_mipmap", |s| {
            let Some(texture) = s
                .bound_texture(target)
                .and_then(|t| s.textures.get_mut_ref(t.get()))
            else {
                return s.error(glow::INVALID_OPERATION);
            };
            let mut level = 1;
            while level_extent(texture.width, level - 1) > 1 || level_extent(texture.height, level - 1) > 1 {
                let size = level_extent(texture.width, level) as usize
                    * level_extent(texture.height, level) as usize
                    * texture.bytes_per_pixel;
                texture.levels.entry(level).or_insert_with(|| vec![0; size]);
                level += 1;
            }
            texture.mipmaps_generated = true;
        })
    }

    fn delete_texture(&self, texture: TextureHandle) {
        self.with("delete_texture", |s| {
            if s.textures.release(texture.get()).is_none() {
                return s.error(glow::INVALID_VALUE);
            }
            s.bound_textures.retain(|_, t| *t != texture);
        })
    }

    fn create_framebuffer(&self) -> Result<FramebufferHandle, String> {
        self.with("create_framebuffer", |s| {
            Ok(Handle::from_raw(s.framebuffers.insert(NullFramebuffer::default())))
        })
    }

    fn bind_framebuffer(&self, _target: GLenum, framebuffer: Option<FramebufferHandle>) {
        self.with("bind_framebuffer", |s| s.bound_framebuffer = framebuffer)
    }

    fn framebuffer_texture_2d(
        &self,
        _target: GLenum,
        attachment: GLenum,
        _texture_target: GLenum,
        texture: Option<TextureHandle>,
        _level: i32,
    ) {
        self.with("framebuffer_texture_2d", |s| {
            let Some(framebuffer) = s
                .bound_framebuffer
                .and_then(|f| s.framebuffers.get_mut_ref(f.get()))
            else {
                return s.error(glow::INVALID_OPERATION);
            };
            match texture {
                Some(texture) => framebuffer.attachments.insert(attachment, texture),
                None => framebuffer.attachments.remove(&attachment),
            };
        })
    }

    fn check_framebuffer_status(&self, _target: GLenum) -> GLenum {
        self.with("check_framebuffer_status", |s| {
            let Some(framebuffer) = s
                .bound_framebuffer
                .and_then(|f| s.framebuffers.get_ref(f.get()))
            else {
                return glow::FRAMEBUFFER_COMPLETE;
            };
            if framebuffer.attachments.is_empty() {
                return glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT;
            }
            let broken = framebuffer.attachments.values().any(|texture| {
                s.textures
                    .get_ref(texture.get())
                    .map_or(true, |t| t.width <= 0 || t.height <= 0)
            });
            if broken {
                glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT
            } else {
                glow::FRAMEBUFFER_COMPLETE
            }
        })
    }

    fn draw_buffers(&self, buffers: &[GLenum]) {
        self.with("draw_buffers", |s| s.draw_buffers = buffers.to_vec())
    }

    fn depth_mask(&self, flag: bool) {
        self.with("depth_mask", |s| s.depth_mask = flag)
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.with("viewport", |s| s.viewport = [x, y, width, height])
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.with("clear_color", |s| s.clear_color = [red, green, blue, alpha])
    }

    fn clear_depth(&self, depth: f32) {
        self.with("clear_depth", |s| s.clear_depth = depth)
    }

    fn clear(&self, mask: GLenum) {
        self.with("clear", |s| {
            let call = ClearCall {
                framebuffer: s.bound_framebuffer,
                mask,
                color: s.clear_color,
                depth: s.clear_depth,
            };
            s.clears.push(call);
        })
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferHandle) {
        self.with("delete_framebuffer", |s| {
            if s.framebuffers.release(framebuffer.get()).is_none() {
                return s.error(glow::INVALID_VALUE);
            }
            if s.bound_framebuffer == Some(framebuffer) {
                s.bound_framebuffer = None;
            }
        })
    }
}

fn level_extent(size: i32, level: i32) -> i32 {
    if size <= 0 {
        return 0;
    }
    (size >> level.clamp(0, 31)).max(1)
}

fn format_components(format: GLenum) -> usize {
    match format {
        glow::RED | glow::RED_INTEGER | glow::DEPTH_COMPONENT => 1,
        glow::RG | glow::RG_INTEGER => 2,
        glow::RGB | glow::RGB_INTEGER => 3,
        _ => 4,
    }
}

fn type_size(ty: GLenum) -> usize {
    match ty {
        glow::UNSIGNED_BYTE | glow::BYTE => 1,
        glow::HALF_FLOAT | glow::SHORT | glow::UNSIGNED_SHORT => 2,
        _ => 4,
    }
}

fn components_of(utype: GLenum) -> usize {
    match utype {
        glow::FLOAT_VEC2 | glow::INT_VEC2 | glow::BOOL_VEC2 => 2,
        glow::FLOAT_VEC3 | glow::INT_VEC3 | glow::BOOL_VEC3 => 3,
        glow::FLOAT_VEC4 | glow::INT_VEC4 | glow::BOOL_VEC4 | glow::FLOAT_MAT2 => 4,
        glow::FLOAT_MAT2x3 | glow::FLOAT_MAT3x2 => 6,
        glow::FLOAT_MAT2x4 | glow::FLOAT_MAT4x2 => 8,
        glow::FLOAT_MAT3 => 9,
        glow::FLOAT_MAT3x4 | glow::FLOAT_MAT4x3 => 12,
        glow::FLOAT_MAT4 => 16,
        _ => 1,
    }
}

fn glsl_type(name: &str) -> Option<GLenum> {
    Some(match name {
        "float" => glow::FLOAT,
        "vec2" => glow::FLOAT_VEC2,
        "vec3" => glow::FLOAT_VEC3,
        "vec4" => glow::FLOAT_VEC4,
        "int" => glow::INT,
        "ivec2" => glow::INT_VEC2,
        "ivec3" => glow::INT_VEC3,
        "ivec4" => glow::INT_VEC4,
        "uint" => glow::UNSIGNED_INT,
        "bool" => glow::BOOL,
        "bvec2" => glow::BOOL_VEC2,
        "bvec3" => glow::BOOL_VEC3,
        "bvec4" => glow::BOOL_VEC4,
        "mat2" => glow::FLOAT_MAT2,
        "mat3" => glow::FLOAT_MAT3,
        "mat4" => glow::FLOAT_MAT4,
        "mat2x3" => glow::FLOAT_MAT2x3,
        "mat3x2" => glow::FLOAT_MAT3x2,
        "mat2x4" => glow::FLOAT_MAT2x4,
        "mat4x2" => glow::FLOAT_MAT4x2,
        "mat3x4" => glow::FLOAT_MAT3x4,
        "mat4x3" => glow::FLOAT_MAT4x3,
        "sampler2D" => glow::SAMPLER_2D,
        "sampler3D" => glow::SAMPLER_3D,
        "samplerCube" => glow::SAMPLER_CUBE,
        "isampler2D" => glow::INT_SAMPLER_2D,
        "usampler2D" => glow::UNSIGNED_INT_SAMPLER_2D,
        _ => return None,
    })
}

fn primitive(name: &str) -> Option<GLenum> {
    Some(match name {
        "points" => glow::POINTS,
        "lines" => glow::LINES,
        "lines_adjacency" => glow::LINES_ADJACENCY,
        "triangles" => glow::TRIANGLES,
        "triangles_adjacency" => glow::TRIANGLES_ADJACENCY,
        "line_strip" => glow::LINE_STRIP,
        "triangle_strip" => glow::TRIANGLE_STRIP,
        _ => return None,
    })
}

/// `type name;` or `type name[N];`, with precision qualifiers ignored.
fn parse_declaration(
    text: &str,
    defines: &HashMap<String, String>,
) -> std::result::Result<Option<DeclaredUniform>, String> {
    let text = text.trim().trim_end_matches(';');
    let mut tokens = text
        .split_whitespace()
        .filter(|t| !matches!(*t, "lowp" | "mediump" | "highp"));
    let (Some(type_name), Some(name)) = (tokens.next(), tokens.next()) else {
        return Ok(None);
    };

    let utype = glsl_type(type_name).ok_or_else(|| format!("error: unknown type `{}'", type_name))?;
    let (name, size, array) = match name.split_once('[') {
        Some((base, rest)) => {
            let size = rest.trim_end_matches(']');
            let size = defines
                .get(size)
                .map(String::as_str)
                .unwrap_or(size)
                .parse::<i32>()
                .map_err(|_| format!("error: array size of `{}' must be a constant", base))?;
            (base.to_string(), size, true)
        }
        None => (name.to_string(), 1, false),
    };

    Ok(Some(DeclaredUniform {
        name,
        utype,
        size,
        array,
    }))
}

/// The statement after an optional `layout(...)` qualifier, and the
/// qualifier contents.
fn split_layout(line: &str) -> (Option<&str>, &str) {
    if let Some(rest) = line.strip_prefix("layout") {
        let rest = rest.trim_start();
        if let (Some(inner), Some(close)) = (rest.strip_prefix('('), rest.find(')')) {
            return (Some(&inner[..close - 1]), rest[close + 1..].trim());
        }
    }
    (None, line)
}

fn scan_source(stage: GLenum, source: &str) -> std::result::Result<ShaderInfo, String> {
    if !source.lines().any(|l| l.trim_start().starts_with("#version")) {
        return Err("0:1(1): error: #version directive missing".to_string());
    }
    if !source.contains("void main") {
        return Err("error: main function not found".to_string());
    }

    let mut info = ShaderInfo::default();
    let mut defines = HashMap::new();
    let mut in_block = false;

    for raw in source.lines() {
        let line = raw.trim();
        if let Some(rest) = line.strip_prefix("#define") {
            let mut parts = rest.split_whitespace();
            if let (Some(name), Some(value)) = (parts.next(), parts.next()) {
                defines.insert(name.to_string(), value.to_string());
            }
            continue;
        }
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }

        if in_block {
            if line.starts_with('}') {
                in_block = false;
            } else if line != "{" {
                if let Some(member) = parse_declaration(line, &defines)? {
                    info.block_uniforms.push(member);
                }
            }
            continue;
        }

        let (layout, body) = split_layout(line);
        if let Some(decl) = body.strip_prefix("uniform ") {
            if body.contains('{') || !body.ends_with(';') {
                in_block = !body.contains('}');
                continue;
            }
            if let Some(uniform) = parse_declaration(decl, &defines)? {
                info.uniforms.push(uniform);
            }
        } else if body.starts_with("in ") {
            if stage == glow::VERTEX_SHADER {
                if let Some(name) = body.split_whitespace().nth(2) {
                    info.inputs.push(name.trim_end_matches(';').to_string());
                }
            }
        } else if body.starts_with("out ") {
            if let Some(name) = body.split_whitespace().nth(2) {
                info.outputs.push(name.trim_end_matches(';').to_string());
            }
        } else if let (Some(layout), true) = (layout, stage == glow::GEOMETRY_SHADER) {
            let mut items = layout.split(',').map(str::trim);
            let kind = items.next().and_then(primitive);
            let max_vertices = items
                .filter_map(|item| item.strip_prefix("max_vertices"))
                .find_map(|rest| rest.trim_start().strip_prefix('=')?.trim().parse().ok())
                .unwrap_or(0);
            match body {
                "in;" => info.geometry_input = kind,
                "out;" => info.geometry_output = kind.map(|k| (k, max_vertices)),
                _ => {}
            }
        }
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_declarations() {
        let src = "#version 330\n\
                   uniform mat4 projection;\n\
                   uniform float weights[3];\n\
                   layout(std140) uniform Block {\n\
                       vec4 tint;\n\
                   };\n\
                   layout(location = 0) in vec2 in_pos;\n\
                   in vec4 in_color;\n\
                   out vec4 v_color;\n\
                   void main() {}";
        let info = scan_source(glow::VERTEX_SHADER, src).unwrap();
        assert_eq!(info.uniforms.len(), 2);
        assert_eq!(info.uniforms[1].name, "weights");
        assert_eq!(info.uniforms[1].size, 3);
        assert_eq!(info.block_uniforms[0].name, "tint");
        assert_eq!(info.inputs, vec!["in_pos", "in_color"]);
        assert_eq!(info.outputs, vec!["v_color"]);
    }

    #[test]
    fn scans_geometry_layouts() {
        let src = "#version 330\n\
                   layout(points) in;\n\
                   layout(triangle_strip, max_vertices = 4) out;\n\
                   void main() {}";
        let info = scan_source(glow::GEOMETRY_SHADER, src).unwrap();
        assert_eq!(info.geometry_input, Some(glow::POINTS));
        assert_eq!(info.geometry_output, Some((glow::TRIANGLE_STRIP, 4)));
    }

    #[test]
    fn missing_main_fails_to_compile() {
        assert!(scan_source(glow::FRAGMENT_SHADER, "#version 330\n").is_err());
    }
}
