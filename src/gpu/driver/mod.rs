//! The native call surface.
//!
//! Every wrapper in this crate issues its OpenGL calls through [`Driver`].
//! [`GlowDriver`] forwards them to a live `glow` context; [`NullDriver`]
//! answers them from memory and counts them, which is what the test-suite
//! runs against.

pub mod glow_driver;
pub mod null;
pub mod types;

pub use glow_driver::GlowDriver;
pub use null::NullDriver;
pub use types::*;

/// The subset of the OpenGL 3.3 core profile this crate relies on.
///
/// Methods mirror the native entry points one-to-one. Implementations assume
/// the calling thread owns the rendering context; none of them are expected
/// to be called from any other thread.
pub trait Driver {
    fn get_parameter_i32(&self, parameter: GLenum) -> i32;
    fn get_error(&self) -> GLenum;

    fn create_shader(&self, stage: GLenum) -> Result<ShaderHandle, String>;
    fn shader_source(&self, shader: ShaderHandle, source: &str);
    fn compile_shader(&self, shader: ShaderHandle);
    fn get_shader_compile_status(&self, shader: ShaderHandle) -> bool;
    fn get_shader_info_log(&self, shader: ShaderHandle) -> String;
    fn delete_shader(&self, shader: ShaderHandle);

    fn create_program(&self) -> Result<ProgramHandle, String>;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn transform_feedback_varyings(
        &self,
        program: ProgramHandle,
        varyings: &[&str],
        buffer_mode: GLenum,
    );
    fn link_program(&self, program: ProgramHandle);
    fn get_program_link_status(&self, program: ProgramHandle) -> bool;
    fn get_program_info_log(&self, program: ProgramHandle) -> String;
    fn get_program_parameter_i32(&self, program: ProgramHandle, parameter: GLenum) -> i32;
    fn get_active_uniforms(&self, program: ProgramHandle) -> u32;
    fn get_active_uniform(&self, program: ProgramHandle, index: u32) -> Option<ActiveUniform>;
    fn get_uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn get_attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;
    fn use_program(&self, program: Option<ProgramHandle>);
    fn delete_program(&self, program: ProgramHandle);

    /// `glUniform{components}iv`; the element count is `values.len() / components`.
    fn uniform_i32_slice(&self, location: UniformLocation, components: u32, values: &[i32]);
    /// `glUniform{components}fv`; the element count is `values.len() / components`.
    fn uniform_f32_slice(&self, location: UniformLocation, components: u32, values: &[f32]);
    /// `glUniformMatrix{dim}fv` for square matrices.
    fn uniform_matrix_f32_slice(
        &self,
        location: UniformLocation,
        dim: u32,
        transpose: bool,
        values: &[f32],
    );
    fn get_uniform_i32(&self, program: ProgramHandle, location: UniformLocation, values: &mut [i32]);
    fn get_uniform_f32(&self, program: ProgramHandle, location: UniformLocation, values: &mut [f32]);

    fn create_buffer(&self) -> Result<BufferHandle, String>;
    fn bind_buffer(&self, target: GLenum, buffer: Option<BufferHandle>);
    fn bind_buffer_base(&self, target: GLenum, index: u32, buffer: Option<BufferHandle>);
    fn buffer_data(&self, target: GLenum, data: BufferData<'_>, usage: GLenum);
    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]);
    fn get_buffer_sub_data(&self, target: GLenum, offset: usize, dst: &mut [u8]);
    fn copy_buffer_sub_data(
        &self,
        src_target: GLenum,
        dst_target: GLenum,
        src_offset: usize,
        dst_offset: usize,
        size: usize,
    );
    fn delete_buffer(&self, buffer: BufferHandle);

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String>;
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: GLenum,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn vertex_attrib_divisor(&self, index: u32, divisor: u32);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn draw_arrays_instanced(&self, mode: GLenum, first: i32, count: i32, instances: i32);
    fn draw_elements_instanced(
        &self,
        mode: GLenum,
        count: i32,
        element_type: GLenum,
        offset: i32,
        instances: i32,
    );
    fn begin_transform_feedback(&self, primitive_mode: GLenum);
    fn end_transform_feedback(&self);
    fn enable(&self, capability: GLenum);
    fn disable(&self, capability: GLenum);
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);

    fn create_texture(&self) -> Result<TextureHandle, String>;
    fn active_texture(&self, unit: GLenum);
    fn bind_texture(&self, target: GLenum, texture: Option<TextureHandle>);
    fn pixel_store_i32(&self, parameter: GLenum, value: i32);
    #[allow(clippy::too_many_arguments)]
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
    );
    fn tex_sub_image_2d(&self, target: GLenum, region: &PixelRegion, pixels: PixelUnpack<'_>);
    fn get_tex_image(&self, target: GLenum, level: i32, format: GLenum, ty: GLenum, pixels: &mut [u8]);
    fn tex_parameter_i32(&self, target: GLenum, parameter: GLenum, value: i32);
    fn generate_mipmap(&self, target: GLenum);
    fn delete_texture(&self, texture: TextureHandle);

    fn create_framebuffer(&self) -> Result<FramebufferHandle, String>;
    fn bind_framebuffer(&self, target: GLenum, framebuffer: Option<FramebufferHandle>);
    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        texture_target: GLenum,
        texture: Option<TextureHandle>,
        level: i32,
    );
    fn check_framebuffer_status(&self, target: GLenum) -> GLenum;
    fn draw_buffers(&self, buffers: &[GLenum]);
    fn depth_mask(&self, flag: bool);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    fn clear_depth(&self, depth: f32);
    fn clear(&self, mask: GLenum);
    fn delete_framebuffer(&self, framebuffer: FramebufferHandle);
}
