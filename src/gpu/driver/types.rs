use crate::utils::Handle;

/// Raw OpenGL enumerant.
pub type GLenum = u32;

/// Marker for linked program objects.
#[derive(Debug)]
pub enum ProgramObj {}
/// Marker for shader stage objects.
#[derive(Debug)]
pub enum ShaderObj {}
/// Marker for buffer objects.
#[derive(Debug)]
pub enum BufferObj {}
/// Marker for vertex array objects.
#[derive(Debug)]
pub enum VertexArrayObj {}
/// Marker for texture objects.
#[derive(Debug)]
pub enum TextureObj {}
/// Marker for framebuffer objects.
#[derive(Debug)]
pub enum FramebufferObj {}

pub type ProgramHandle = Handle<ProgramObj>;
pub type ShaderHandle = Handle<ShaderObj>;
pub type BufferHandle = Handle<BufferObj>;
pub type VertexArrayHandle = Handle<VertexArrayObj>;
pub type TextureHandle = Handle<TextureObj>;
pub type FramebufferHandle = Handle<FramebufferObj>;

/// Location of a program-scope uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// One entry of the active uniform list of a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    pub name: String,
    pub utype: GLenum,
    pub size: i32,
}

/// Initial content of a buffer data store.
#[derive(Debug, Clone, Copy)]
pub enum BufferData<'a> {
    Bytes(&'a [u8]),
    Reserve(usize),
}

/// Source of pixels for a texture upload.
#[derive(Debug, Clone, Copy)]
pub enum PixelUnpack<'a> {
    /// No data; storage is allocated but left undefined.
    None,
    Bytes(&'a [u8]),
    /// Byte offset into the buffer bound to `PIXEL_UNPACK_BUFFER`.
    BufferOffset(u32),
}

/// Texture level upload parameters shared by full and partial uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub level: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub format: GLenum,
    pub ty: GLenum,
}
