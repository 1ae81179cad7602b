#![allow(dead_code)]

use std::rc::Rc;

use gloam::*;

pub const PASSTHROUGH_FS: &str = "#version 330
in vec4 v_color;
out vec4 f_color;

void main() {
    f_color = v_color;
}
";

/// Three attributes and a projection, enough to exercise vertex layouts.
pub const COLORED_VS: &str = "#version 330
uniform mat4 Projection;

in vec3 in_vert;
in vec4 in_color;
in vec2 in_offset;

out vec4 v_color;

void main() {
    gl_Position = Projection * vec4(in_vert.xy + in_offset, in_vert.z, 1.0);
    v_color = in_color;
}
";

/// A context over a fresh [`NullDriver`], plus a clone of that driver for
/// inspecting what the context did.
pub fn context() -> (Context, NullDriver) {
    context_with(NullDriver::new(), &ContextInfo::default())
}

/// Like [`context`] but skips the builtin programs, so object counts start
/// at zero.
pub fn bare_context() -> (Context, NullDriver) {
    context_with(
        NullDriver::new(),
        &ContextInfo {
            load_builtin_programs: false,
            ..Default::default()
        },
    )
}

pub fn context_with(driver: NullDriver, info: &ContextInfo) -> (Context, NullDriver) {
    let ctx = Context::new(driver.clone(), info).expect("null context");
    (ctx, driver)
}

pub fn colored_program(ctx: &Context) -> Rc<Program> {
    ctx.program(&ProgramInfo {
        vertex_shader: COLORED_VS,
        fragment_shader: Some(PASSTHROUGH_FS),
        ..Default::default()
    })
    .expect("colored program")
}

pub fn buffer_from_floats(ctx: &Context, values: &[f32]) -> Rc<Buffer> {
    ctx.buffer(&BufferInfo {
        data: Some(bytemuck::cast_slice(values)),
        ..Default::default()
    })
    .expect("float buffer")
}

pub fn reserved_buffer(ctx: &Context, size: usize) -> Rc<Buffer> {
    ctx.buffer(&BufferInfo {
        reserve: size,
        ..Default::default()
    })
    .expect("reserved buffer")
}

pub fn rgba_texture(ctx: &Context, width: u32, height: u32) -> Rc<Texture> {
    ctx.texture(&TextureInfo {
        size: [width, height],
        components: 4,
        ..Default::default()
    })
    .expect("rgba texture")
}
