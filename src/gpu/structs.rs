use std::path::Path;
use std::rc::Rc;

use super::tables::TextureDtype;
use super::Texture;

#[cfg(feature = "gloam-serde")]
use serde::{Deserialize, Serialize};

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum ShaderType {
    Vertex,
    Fragment,
    Geometry,
}

/// Hint for the driver's memory residency strategy. Does not affect
/// correctness.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
    Stream,
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl Filter {
    /// Only the two plain filters are valid for magnification.
    pub fn is_mag_filter(self) -> bool {
        matches!(self, Filter::Nearest | Filter::Linear)
    }
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum WrapMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum PrimitiveMode {
    Points,
    Lines,
    LinesAdjacency,
    LineStrip,
    LineStripAdjacency,
    Triangles,
    TrianglesAdjacency,
    TriangleStrip,
    TriangleStripAdjacency,
    TriangleFan,
}

/// A rectangle in window coordinates, origin bottom-left.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Width and height with an implied zero origin.
impl From<(i32, i32)> for Viewport {
    fn from((width, height): (i32, i32)) -> Self {
        Self::new(0, 0, width, height)
    }
}

impl From<(i32, i32, i32, i32)> for Viewport {
    fn from((x, y, width, height): (i32, i32, i32, i32)) -> Self {
        Self::new(x, y, width, height)
    }
}

/// Color accepted by [`Framebuffer::clear`](super::Framebuffer::clear).
///
/// Byte colors are divided by 255. Three component colors are fully opaque.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum ClearColor {
    Rgb8([u8; 3]),
    Rgba8([u8; 4]),
    Rgb([f32; 3]),
    Rgba([f32; 4]),
}

impl Default for ClearColor {
    fn default() -> Self {
        ClearColor::Rgba([0.0; 4])
    }
}

impl ClearColor {
    pub fn normalized(&self) -> [f32; 4] {
        let n = |c: u8| c as f32 / 255.0;
        match *self {
            ClearColor::Rgb8([r, g, b]) => [n(r), n(g), n(b), 1.0],
            ClearColor::Rgba8([r, g, b, a]) => [n(r), n(g), n(b), n(a)],
            ClearColor::Rgb([r, g, b]) => [r, g, b, 1.0],
            ClearColor::Rgba(rgba) => rgba,
        }
    }
}

impl From<[u8; 3]> for ClearColor {
    fn from(value: [u8; 3]) -> Self {
        ClearColor::Rgb8(value)
    }
}

impl From<[u8; 4]> for ClearColor {
    fn from(value: [u8; 4]) -> Self {
        ClearColor::Rgba8(value)
    }
}

impl From<[f32; 3]> for ClearColor {
    fn from(value: [f32; 3]) -> Self {
        ClearColor::Rgb(value)
    }
}

impl From<[f32; 4]> for ClearColor {
    fn from(value: [f32; 4]) -> Self {
        ClearColor::Rgba(value)
    }
}

pub struct ContextInfo {
    /// Size of the window's implicit render target.
    pub window_size: [u32; 2],
    pub load_builtin_programs: bool,
}

impl Default for ContextInfo {
    fn default() -> Self {
        Self {
            window_size: [800, 600],
            load_builtin_programs: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BufferInfo<'a> {
    pub debug_name: &'a str,
    pub data: Option<&'a [u8]>,
    pub reserve: usize,
    pub usage: BufferUsage,
}

impl<'a> Default for BufferInfo<'a> {
    fn default() -> Self {
        Self {
            debug_name: "",
            data: None,
            reserve: 0,
            usage: BufferUsage::Static,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TextureInfo<'a> {
    pub debug_name: &'a str,
    pub size: [u32; 2],
    pub components: u8,
    pub dtype: TextureDtype,
    pub data: Option<&'a [u8]>,
    /// `(min, mag)`; linear/linear when unset.
    pub filter: Option<(Filter, Filter)>,
    pub wrap_x: Option<WrapMode>,
    pub wrap_y: Option<WrapMode>,
}

impl<'a> Default for TextureInfo<'a> {
    fn default() -> Self {
        Self {
            debug_name: "",
            size: [1, 1],
            components: 4,
            dtype: TextureDtype::F1,
            data: None,
            filter: None,
            wrap_x: None,
            wrap_y: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct FramebufferInfo<'a> {
    pub debug_name: &'a str,
    pub color_attachments: &'a [Rc<Texture>],
    pub depth_attachment: Option<&'a Rc<Texture>>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ProgramInfo<'a> {
    pub vertex_shader: &'a str,
    pub fragment_shader: Option<&'a str>,
    pub geometry_shader: Option<&'a str>,
    /// `#define` values substituted into every stage.
    pub defines: &'a [(&'a str, &'a str)],
}

#[derive(Clone, Copy, Debug)]
pub struct ProgramPaths<'a> {
    pub vertex_shader: &'a Path,
    pub fragment_shader: Option<&'a Path>,
    pub geometry_shader: Option<&'a Path>,
    pub defines: &'a [(&'a str, &'a str)],
}

impl<'a> Default for ProgramPaths<'a> {
    fn default() -> Self {
        Self {
            vertex_shader: Path::new(""),
            fragment_shader: None,
            geometry_shader: None,
            defines: &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_colors_are_normalized() {
        assert_eq!(
            ClearColor::from([255u8, 0, 51, 255]).normalized(),
            [1.0, 0.0, 0.2, 1.0]
        );
    }

    #[test]
    fn three_component_colors_are_opaque() {
        assert_eq!(ClearColor::from([0u8, 0, 0]).normalized()[3], 1.0);
        assert_eq!(ClearColor::from([0.5f32, 0.5, 0.5]).normalized()[3], 1.0);
    }

    #[test]
    fn two_component_viewport_has_zero_origin() {
        assert_eq!(Viewport::from((64, 32)), Viewport::new(0, 0, 64, 32));
    }
}
