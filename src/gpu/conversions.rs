use super::driver::GLenum;
use super::{BufferUsage, Filter, PrimitiveMode, ShaderType, WrapMode};

impl From<ShaderType> for GLenum {
    fn from(stage: ShaderType) -> Self {
        match stage {
            ShaderType::Vertex => glow::VERTEX_SHADER,
            ShaderType::Fragment => glow::FRAGMENT_SHADER,
            ShaderType::Geometry => glow::GEOMETRY_SHADER,
        }
    }
}

impl From<BufferUsage> for GLenum {
    fn from(usage: BufferUsage) -> Self {
        match usage {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
            BufferUsage::Stream => glow::STREAM_DRAW,
        }
    }
}

impl From<Filter> for GLenum {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => glow::NEAREST,
            Filter::Linear => glow::LINEAR,
            Filter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
            Filter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
            Filter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
            Filter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl From<WrapMode> for GLenum {
    fn from(mode: WrapMode) -> Self {
        match mode {
            WrapMode::Repeat => glow::REPEAT,
            WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
            WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
            WrapMode::ClampToBorder => glow::CLAMP_TO_BORDER,
        }
    }
}

impl From<PrimitiveMode> for GLenum {
    fn from(mode: PrimitiveMode) -> Self {
        match mode {
            PrimitiveMode::Points => glow::POINTS,
            PrimitiveMode::Lines => glow::LINES,
            PrimitiveMode::LinesAdjacency => glow::LINES_ADJACENCY,
            PrimitiveMode::LineStrip => glow::LINE_STRIP,
            PrimitiveMode::LineStripAdjacency => glow::LINE_STRIP_ADJACENCY,
            PrimitiveMode::Triangles => glow::TRIANGLES,
            PrimitiveMode::TrianglesAdjacency => glow::TRIANGLES_ADJACENCY,
            PrimitiveMode::TriangleStrip => glow::TRIANGLE_STRIP,
            PrimitiveMode::TriangleStripAdjacency => glow::TRIANGLE_STRIP_ADJACENCY,
            PrimitiveMode::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

impl PrimitiveMode {
    /// Inverse of the native mapping, used for geometry shader metadata.
    pub fn from_gl(value: GLenum) -> Option<Self> {
        Some(match value {
            glow::POINTS => PrimitiveMode::Points,
            glow::LINES => PrimitiveMode::Lines,
            glow::LINES_ADJACENCY => PrimitiveMode::LinesAdjacency,
            glow::LINE_STRIP => PrimitiveMode::LineStrip,
            glow::LINE_STRIP_ADJACENCY => PrimitiveMode::LineStripAdjacency,
            glow::TRIANGLES => PrimitiveMode::Triangles,
            glow::TRIANGLES_ADJACENCY => PrimitiveMode::TrianglesAdjacency,
            glow::TRIANGLE_STRIP => PrimitiveMode::TriangleStrip,
            glow::TRIANGLE_STRIP_ADJACENCY => PrimitiveMode::TriangleStripAdjacency,
            glow::TRIANGLE_FAN => PrimitiveMode::TriangleFan,
            _ => return None,
        })
    }
}

/// Description of a `glCheckFramebufferStatus` result, `None` when complete.
pub(crate) fn framebuffer_status_message(status: GLenum) -> Option<&'static str> {
    match status {
        glow::FRAMEBUFFER_COMPLETE => None,
        glow::FRAMEBUFFER_UNSUPPORTED => Some("Framebuffer unsupported. Try another format."),
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => Some("Framebuffer incomplete attachment."),
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => Some("Framebuffer missing attachment."),
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => Some("Framebuffer incomplete draw buffer."),
        glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => Some("Framebuffer incomplete read buffer."),
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => Some("Framebuffer incomplete multisample."),
        _ => Some("Unknown error"),
    }
}

/// Name of a `glGetError` code, `None` for `NO_ERROR`.
pub(crate) fn error_name(code: GLenum) -> Option<&'static str> {
    match code {
        glow::NO_ERROR => None,
        glow::INVALID_ENUM => Some("GL_INVALID_ENUM"),
        glow::INVALID_VALUE => Some("GL_INVALID_VALUE"),
        glow::INVALID_OPERATION => Some("GL_INVALID_OPERATION"),
        glow::INVALID_FRAMEBUFFER_OPERATION => Some("GL_INVALID_FRAMEBUFFER_OPERATION"),
        glow::OUT_OF_MEMORY => Some("GL_OUT_OF_MEMORY"),
        glow::STACK_UNDERFLOW => Some("GL_STACK_UNDERFLOW"),
        glow::STACK_OVERFLOW => Some("GL_STACK_OVERFLOW"),
        _ => Some("GL_UNKNOWN_ERROR"),
    }
}
