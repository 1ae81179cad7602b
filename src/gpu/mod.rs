//! Wrappers over the native OpenGL object model.
//!
//! # Examples
//! ```ignore
//! use gloam::*;
//!
//! let ctx = Context::from_glow(gl, &ContextInfo::default())?;
//! let program = ctx.program(&ProgramInfo {
//!     vertex_shader: VS,
//!     fragment_shader: Some(FS),
//!     ..Default::default()
//! })?;
//! program.set("projection", glam::Mat4::IDENTITY)?;
//! ```

pub mod buffer;
pub mod buffer_description;
pub mod context;
pub mod conversions;
pub mod driver;
pub mod error;
pub mod framebuffer;
pub mod limits;
pub mod program;
pub mod shader_source;
pub mod structs;
pub mod tables;
pub mod texture;
pub mod uniform;
pub mod vertex_array;

pub use buffer::Buffer;
pub use buffer_description::{parse_formats, AttributeFormat, AttributeKind, BufferDescription};
pub use context::{BuiltinPrograms, Context};
pub use driver::{Driver, GLenum, GlowDriver, NullDriver};
pub use error::{GPUError, Result};
pub use framebuffer::Framebuffer;
pub use limits::Limits;
pub use program::{GeometryInfo, Program};
pub use shader_source::ShaderSource;
pub use structs::*;
pub use tables::{StorageKind, TextureDtype, UniformType};
pub use texture::{PixelSource, Texture};
pub use uniform::{Uniform, UniformValue};
pub use vertex_array::VertexArray;
