use glow::HasContext;

use super::types::*;
use super::Driver;
use crate::utils::Handle;

/// Forwards every call to a `glow` context.
///
/// The wrapped context must be current on the thread that owns this driver
/// for as long as the driver lives. All slices passed down are sized by the
/// callers in this crate from the same layout information that determines
/// how many bytes the native call reads or writes.
pub struct GlowDriver {
    gl: glow::Context,
}

impl GlowDriver {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

fn program(handle: ProgramHandle) -> glow::NativeProgram {
    glow::NativeProgram(handle.raw())
}

fn shader(handle: ShaderHandle) -> glow::NativeShader {
    glow::NativeShader(handle.raw())
}

fn buffer(handle: BufferHandle) -> glow::NativeBuffer {
    glow::NativeBuffer(handle.raw())
}

fn texture(handle: TextureHandle) -> glow::NativeTexture {
    glow::NativeTexture(handle.raw())
}

fn location(location: UniformLocation) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(location.0)
}

fn unpack(pixels: PixelUnpack<'_>) -> glow::PixelUnpackData<'_> {
    match pixels {
        PixelUnpack::None => glow::PixelUnpackData::Slice(None),
        PixelUnpack::Bytes(bytes) => glow::PixelUnpackData::Slice(Some(bytes)),
        PixelUnpack::BufferOffset(offset) => glow::PixelUnpackData::BufferOffset(offset),
    }
}

impl Driver for GlowDriver {
    fn get_parameter_i32(&self, parameter: GLenum) -> i32 {
        unsafe { self.gl.get_parameter_i32(parameter) }
    }

    fn get_error(&self) -> GLenum {
        unsafe { self.gl.get_error() }
    }

    fn create_shader(&self, stage: GLenum) -> Result<ShaderHandle, String> {
        unsafe { self.gl.create_shader(stage) }.map(|s| Handle::from_raw(s.0))
    }

    fn shader_source(&self, s: ShaderHandle, source: &str) {
        unsafe { self.gl.shader_source(shader(s), source) }
    }

    fn compile_shader(&self, s: ShaderHandle) {
        unsafe { self.gl.compile_shader(shader(s)) }
    }

    fn get_shader_compile_status(&self, s: ShaderHandle) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader(s)) }
    }

    fn get_shader_info_log(&self, s: ShaderHandle) -> String {
        unsafe { self.gl.get_shader_info_log(shader(s)) }
    }

    fn delete_shader(&self, s: ShaderHandle) {
        unsafe { self.gl.delete_shader(shader(s)) }
    }

    fn create_program(&self) -> Result<ProgramHandle, String> {
        unsafe { self.gl.create_program() }.map(|p| Handle::from_raw(p.0))
    }

    fn attach_shader(&self, p: ProgramHandle, s: ShaderHandle) {
        unsafe { self.gl.attach_shader(program(p), shader(s)) }
    }

    fn detach_shader(&self, p: ProgramHandle, s: ShaderHandle) {
        unsafe { self.gl.detach_shader(program(p), shader(s)) }
    }

    fn transform_feedback_varyings(&self, p: ProgramHandle, varyings: &[&str], buffer_mode: GLenum) {
        unsafe {
            self.gl
                .transform_feedback_varyings(program(p), varyings, buffer_mode)
        }
    }

    fn link_program(&self, p: ProgramHandle) {
        unsafe { self.gl.link_program(program(p)) }
    }

    fn get_program_link_status(&self, p: ProgramHandle) -> bool {
        unsafe { self.gl.get_program_link_status(program(p)) }
    }

    fn get_program_info_log(&self, p: ProgramHandle) -> String {
        unsafe { self.gl.get_program_info_log(program(p)) }
    }

    fn get_program_parameter_i32(&self, p: ProgramHandle, parameter: GLenum) -> i32 {
        unsafe { self.gl.get_program_parameter_i32(program(p), parameter) }
    }

    fn get_active_uniforms(&self, p: ProgramHandle) -> u32 {
        unsafe { self.gl.get_active_uniforms(program(p)) }
    }

    fn get_active_uniform(&self, p: ProgramHandle, index: u32) -> Option<ActiveUniform> {
        unsafe { self.gl.get_active_uniform(program(p), index) }.map(|u| ActiveUniform {
            name: u.name,
            utype: u.utype,
            size: u.size,
        })
    }

    fn get_uniform_location(&self, p: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe { self.gl.get_uniform_location(program(p), name) }.map(|l| UniformLocation(l.0))
    }

    fn get_attrib_location(&self, p: ProgramHandle, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program(p), name) }
    }

    fn use_program(&self, p: Option<ProgramHandle>) {
        unsafe { self.gl.use_program(p.map(program)) }
    }

    fn delete_program(&self, p: ProgramHandle) {
        unsafe { self.gl.delete_program(program(p)) }
    }

    fn uniform_i32_slice(&self, l: UniformLocation, components: u32, values: &[i32]) {
        let l = location(l);
        unsafe {
            match components {
                1 => self.gl.uniform_1_i32_slice(Some(&l), values),
                2 => self.gl.uniform_2_i32_slice(Some(&l), values),
                3 => self.gl.uniform_3_i32_slice(Some(&l), values),
                _ => self.gl.uniform_4_i32_slice(Some(&l), values),
            }
        }
    }

    fn uniform_f32_slice(&self, l: UniformLocation, components: u32, values: &[f32]) {
        let l = location(l);
        unsafe {
            match components {
                1 => self.gl.uniform_1_f32_slice(Some(&l), values),
                2 => self.gl.uniform_2_f32_slice(Some(&l), values),
                3 => self.gl.uniform_3_f32_slice(Some(&l), values),
                _ => self.gl.uniform_4_f32_slice(Some(&l), values),
            }
        }
    }

    fn uniform_matrix_f32_slice(&self, l: UniformLocation, dim: u32, transpose: bool, values: &[f32]) {
        let l = location(l);
        unsafe {
            match dim {
                2 => self.gl.uniform_matrix_2_f32_slice(Some(&l), transpose, values),
                3 => self.gl.uniform_matrix_3_f32_slice(Some(&l), transpose, values),
                _ => self.gl.uniform_matrix_4_f32_slice(Some(&l), transpose, values),
            }
        }
    }

    fn get_uniform_i32(&self, p: ProgramHandle, l: UniformLocation, values: &mut [i32]) {
        unsafe { self.gl.get_uniform_i32(program(p), &location(l), values) }
    }

    fn get_uniform_f32(&self, p: ProgramHandle, l: UniformLocation, values: &mut [f32]) {
        unsafe { self.gl.get_uniform_f32(program(p), &location(l), values) }
    }

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        unsafe { self.gl.create_buffer() }.map(|b| Handle::from_raw(b.0))
    }

    fn bind_buffer(&self, target: GLenum, b: Option<BufferHandle>) {
        unsafe { self.gl.bind_buffer(target, b.map(buffer)) }
    }

    fn bind_buffer_base(&self, target: GLenum, index: u32, b: Option<BufferHandle>) {
        unsafe { self.gl.bind_buffer_base(target, index, b.map(buffer)) }
    }

    fn buffer_data(&self, target: GLenum, data: BufferData<'_>, usage: GLenum) {
        unsafe {
            match data {
                BufferData::Bytes(bytes) => self.gl.buffer_data_u8_slice(target, bytes, usage),
                BufferData::Reserve(size) => self.gl.buffer_data_size(target, size as i32, usage),
            }
        }
    }

    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]) {
        unsafe { self.gl.buffer_sub_data_u8_slice(target, offset as i32, data) }
    }

    fn get_buffer_sub_data(&self, target: GLenum, offset: usize, dst: &mut [u8]) {
        unsafe { self.gl.get_buffer_sub_data(target, offset as i32, dst) }
    }

    fn copy_buffer_sub_data(
        &self,
        src_target: GLenum,
        dst_target: GLenum,
        src_offset: usize,
        dst_offset: usize,
        size: usize,
    ) {
        unsafe {
            self.gl.copy_buffer_sub_data(
                src_target,
                dst_target,
                src_offset as i32,
                dst_offset as i32,
                size as i32,
            )
        }
    }

    fn delete_buffer(&self, b: BufferHandle) {
        unsafe { self.gl.delete_buffer(buffer(b)) }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        unsafe { self.gl.create_vertex_array() }.map(|v| Handle::from_raw(v.0))
    }

    fn bind_vertex_array(&self, v: Option<VertexArrayHandle>) {
        unsafe {
            self.gl
                .bind_vertex_array(v.map(|v| glow::NativeVertexArray(v.raw())))
        }
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
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, data_type, normalized, stride, offset)
        }
    }

    fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        unsafe { self.gl.vertex_attrib_divisor(index, divisor) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn draw_arrays_instanced(&self, mode: GLenum, first: i32, count: i32, instances: i32) {
        unsafe { self.gl.draw_arrays_instanced(mode, first, count, instances) }
    }

    fn draw_elements_instanced(
        &self,
        mode: GLenum,
        count: i32,
        element_type: GLenum,
        offset: i32,
        instances: i32,
    ) {
        unsafe {
            self.gl
                .draw_elements_instanced(mode, count, element_type, offset, instances)
        }
    }

    fn begin_transform_feedback(&self, primitive_mode: GLenum) {
        unsafe { self.gl.begin_transform_feedback(primitive_mode) }
    }

    fn end_transform_feedback(&self) {
        unsafe { self.gl.end_transform_feedback() }
    }

    fn enable(&self, capability: GLenum) {
        unsafe { self.gl.enable(capability) }
    }

    fn disable(&self, capability: GLenum) {
        unsafe { self.gl.disable(capability) }
    }

    fn delete_vertex_array(&self, v: VertexArrayHandle) {
        unsafe { self.gl.delete_vertex_array(glow::NativeVertexArray(v.raw())) }
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        unsafe { self.gl.create_texture() }.map(|t| Handle::from_raw(t.0))
    }

    fn active_texture(&self, unit: GLenum) {
        unsafe { self.gl.active_texture(unit) }
    }

    fn bind_texture(&self, target: GLenum, t: Option<TextureHandle>) {
        unsafe { self.gl.bind_texture(target, t.map(texture)) }
    }

    fn pixel_store_i32(&self, parameter: GLenum, value: i32) {
        unsafe { self.gl.pixel_store_i32(parameter, value) }
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
        unsafe {
            self.gl.tex_image_2d(
                target,
                level,
                internal_format,
                width,
                height,
                0,
                format,
                ty,
                unpack(pixels),
            )
        }
    }

    fn tex_sub_image_2d(&self, target: GLenum, region: &PixelRegion, pixels: PixelUnpack<'_>) {
        unsafe {
            self.gl.tex_sub_image_2d(
                target,
                region.level,
                region.x,
                region.y,
                region.width,
                region.height,
                region.format,
                region.ty,
                unpack(pixels),
            )
        }
    }

    fn get_tex_image(&self, target: GLenum, level: i32, format: GLenum, ty: GLenum, pixels: &mut [u8]) {
        unsafe {
            self.gl.get_tex_image(
                target,
                level,
                format,
                ty,
                glow::PixelPackData::Slice(Some(pixels)),
            )
        }
    }

    fn tex_parameter_i32(&self, target: GLenum, parameter: GLenum, value: i32) {
        unsafe { self.gl.tex_parameter_i32(target, parameter, value) }
    }

    fn generate_mipmap(&self, target: GLenum) {
        unsafe { self.gl.generate_mipmap(target) }
    }

    fn delete_texture(&self, t: TextureHandle) {
        unsafe { self.gl.delete_texture(texture(t)) }
    }

    fn create_framebuffer(&self) -> Result<FramebufferHandle, String> {
        unsafe { self.gl.create_framebuffer() }.map(|f| Handle::from_raw(f.0))
    }

    fn bind_framebuffer(&self, target: GLenum, f: Option<FramebufferHandle>) {
        unsafe {
            self.gl
                .bind_framebuffer(target, f.map(|f| glow::NativeFramebuffer(f.raw())))
        }
    }

    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        texture_target: GLenum,
        t: Option<TextureHandle>,
        level: i32,
    ) {
        unsafe {
            self.gl
                .framebuffer_texture_2d(target, attachment, texture_target, t.map(texture), level)
        }
    }

    fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        unsafe { self.gl.check_framebuffer_status(target) }
    }

    fn draw_buffers(&self, buffers: &[GLenum]) {
        unsafe { self.gl.draw_buffers(buffers) }
    }

    fn depth_mask(&self, flag: bool) {
        unsafe { self.gl.depth_mask(flag) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { self.gl.clear_color(red, green, blue, alpha) }
    }

    fn clear_depth(&self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) }
    }

    fn clear(&self, mask: GLenum) {
        unsafe { self.gl.clear(mask) }
    }

    fn delete_framebuffer(&self, f: FramebufferHandle) {
        unsafe { self.gl.delete_framebuffer(glow::NativeFramebuffer(f.raw())) }
    }
}
