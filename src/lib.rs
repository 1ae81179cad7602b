//! Typed handles over the OpenGL 3.3 core object model.
//!
//! A [`Context`] wraps a [`Driver`] and is the factory for programs, buffers,
//! vertex arrays, textures and framebuffers. Every wrapper owns its native
//! object and deletes it on drop unless the context has been torn down.

pub mod utils;
pub mod gpu;
pub use utils::Handle;

pub use gpu::*;
