use std::path::PathBuf;

use thiserror::Error;

use super::driver::GLenum;
use super::structs::ShaderType;

#[derive(Debug, Error)]
pub enum GPUError {
    #[error("Buffer takes byte data or a number of reserved bytes, exactly one of the two")]
    BufferInitialization,
    #[error("Attempting to read 0 or less bytes from buffer")]
    EmptyRead,
    #[error(
        "Attempting to access outside the buffer. Buffer size: {buffer_size} Accessing from {offset} to {end}",
        end = .offset.saturating_add(*.size)
    )]
    BufferOutOfRange {
        buffer_size: usize,
        offset: usize,
        size: usize,
    },
    #[error("Wrong format `{0}`; expected a component count 1-4 followed by one of f, i, B")]
    InvalidAttributeFormat(String),
    #[error("Different lengths of formats ({formats}) and attributes ({attributes})")]
    FormatCountMismatch { formats: usize, attributes: usize },
    #[error("A buffer description needs at least one attribute")]
    EmptyBufferDescription,
    #[error("Normalized attribute `{0}` not found in attributes")]
    NormalizedNotInAttributes(String),
    #[error("The first vertex attribute cannot be a per instance attribute")]
    PerInstanceFirst,
    #[error("Attribute `{0}` not found in shader program")]
    AttributeNotFound(String),
    #[error("Uniform with the name `{0}` was not found")]
    UniformNotFound(String),
    #[error("Unsupported uniform type {gl_type:#06x} for uniform `{name}`")]
    UnsupportedUniformType { name: String, gl_type: GLenum },
    #[error("Uniform `{name}` type not supported: {reason}")]
    UnsupportedUniformShape { name: String, reason: &'static str },
    #[error("Uniform `{name}` expects {expected} {kind} values, got {got}")]
    UniformValueMismatch {
        name: String,
        kind: &'static str,
        expected: usize,
        got: usize,
    },
    #[error(
        "Cannot find #version in shader source. Please provide at least a #version 330 statement in the beginning of the shader"
    )]
    MissingVersion,
    #[error("{stage:?} shader compile failure: {log}")]
    ShaderCompile { stage: ShaderType, log: String },
    #[error("Program link error: {0}")]
    ProgramLink(String),
    #[error("Framebuffer is incomplete. {0}")]
    FramebufferIncomplete(&'static str),
    #[error("Framebuffer must at least have one color attachment")]
    MissingColorAttachment,
    #[error("Framebuffer supports at most {max} color attachments, got {got}")]
    TooManyColorAttachments { max: usize, got: usize },
    #[error("All framebuffer attachments should have the same size: expected {expected:?}, found {found:?}")]
    AttachmentSizeMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("Components must be 1, 2, 3 or 4, got {0}")]
    InvalidComponents(u8),
    #[error("dtype `{0}` not supported. Supported types are: f1, f2, f4, i1, i2, i4, u1, u2, u4")]
    UnsupportedDtype(String),
    #[error("Texture size {width}x{height} exceeds MAX_TEXTURE_SIZE = {max}")]
    TextureTooLarge { width: u32, height: u32, max: i32 },
    #[error("Pixel data is {got} bytes, expected {expected}")]
    PixelDataSize { expected: usize, got: usize },
    #[error("Region {region:?} is outside a {width}x{height} texture level")]
    RegionOutOfBounds {
        region: [i32; 4],
        width: u32,
        height: u32,
    },
    #[error("Magnification filter must be Nearest or Linear")]
    InvalidMagFilter,
    #[error("Driver failed to create a {kind} object: {reason}")]
    ObjectCreation { kind: &'static str, reason: String },
    #[error("Failed to read shader source {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("The rendering context has been torn down")]
    ContextLost,
}

/// Convenient crate-wide result type.
pub type Result<T, E = GPUError> = std::result::Result<T, E>;

impl GPUError {
    pub(crate) fn creation(kind: &'static str) -> impl FnOnce(String) -> GPUError {
        move |reason| GPUError::ObjectCreation { kind, reason }
    }
}
