use log::warn;

#[cfg(feature = "gloam-serde")]
use serde::{Deserialize, Serialize};

use super::conversions::error_name;
use super::driver::{Driver, GLenum};

macro_rules! limits {
    ($($(#[$doc:meta])* $field:ident => $pname:ident,)*) => {
        /// Implementation limits of the rendering context, queried once when
        /// the context is created.
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
        pub struct Limits {
            $($(#[$doc])* pub $field: i32,)*
        }

        impl Limits {
            /// Every parameter queried, paired with its field name.
            pub const PARAMETERS: &'static [(&'static str, GLenum)] = &[
                $((stringify!($field), glow::$pname),)*
            ];

            pub(crate) fn query(driver: &dyn Driver) -> Self {
                let limits = Self {
                    $($field: driver.get_parameter_i32(glow::$pname),)*
                };

                let error = driver.get_error();
                if let Some(name) = error_name(error) {
                    warn!("{} happened while querying limits. Moving on", name);
                }

                limits
            }
        }
    };
}

limits! {
    minor_version => MINOR_VERSION,
    major_version => MAJOR_VERSION,
    /// Number of sample buffers associated with the framebuffer.
    sample_buffers => SAMPLE_BUFFERS,
    /// Bits of subpixel resolution used to position rasterized geometry.
    subpixel_bits => SUBPIXEL_BITS,
    /// Core or compatibility profile bits.
    context_profile_mask => CONTEXT_PROFILE_MASK,
    /// Required alignment for uniform buffer sizes and offsets.
    uniform_buffer_offset_alignment => UNIFORM_BUFFER_OFFSET_ALIGNMENT,
    max_array_texture_layers => MAX_ARRAY_TEXTURE_LAYERS,
    max_3d_texture_size => MAX_3D_TEXTURE_SIZE,
    /// Color attachments allowed on one framebuffer.
    max_color_attachments => MAX_COLOR_ATTACHMENTS,
    max_color_texture_samples => MAX_COLOR_TEXTURE_SAMPLES,
    max_combined_fragment_uniform_components => MAX_COMBINED_FRAGMENT_UNIFORM_COMPONENTS,
    max_combined_geometry_uniform_components => MAX_COMBINED_GEOMETRY_UNIFORM_COMPONENTS,
    max_combined_texture_image_units => MAX_COMBINED_TEXTURE_IMAGE_UNITS,
    max_combined_uniform_blocks => MAX_COMBINED_UNIFORM_BLOCKS,
    max_combined_vertex_uniform_components => MAX_COMBINED_VERTEX_UNIFORM_COMPONENTS,
    max_cube_map_texture_size => MAX_CUBE_MAP_TEXTURE_SIZE,
    max_depth_texture_samples => MAX_DEPTH_TEXTURE_SAMPLES,
    /// Simultaneous fragment shader outputs.
    max_draw_buffers => MAX_DRAW_BUFFERS,
    max_dual_source_draw_buffers => MAX_DUAL_SOURCE_DRAW_BUFFERS,
    max_elements_indices => MAX_ELEMENTS_INDICES,
    max_elements_vertices => MAX_ELEMENTS_VERTICES,
    max_fragment_input_components => MAX_FRAGMENT_INPUT_COMPONENTS,
    max_fragment_uniform_components => MAX_FRAGMENT_UNIFORM_COMPONENTS,
    max_fragment_uniform_vectors => MAX_FRAGMENT_UNIFORM_VECTORS,
    max_fragment_uniform_blocks => MAX_FRAGMENT_UNIFORM_BLOCKS,
    max_geometry_input_components => MAX_GEOMETRY_INPUT_COMPONENTS,
    max_geometry_output_components => MAX_GEOMETRY_OUTPUT_COMPONENTS,
    max_geometry_texture_image_units => MAX_GEOMETRY_TEXTURE_IMAGE_UNITS,
    max_geometry_uniform_blocks => MAX_GEOMETRY_UNIFORM_BLOCKS,
    max_geometry_uniform_components => MAX_GEOMETRY_UNIFORM_COMPONENTS,
    max_integer_samples => MAX_INTEGER_SAMPLES,
    max_samples => MAX_SAMPLES,
    max_rectangle_texture_size => MAX_RECTANGLE_TEXTURE_SIZE,
    max_renderbuffer_size => MAX_RENDERBUFFER_SIZE,
    max_sample_mask_words => MAX_SAMPLE_MASK_WORDS,
    max_texture_buffer_size => MAX_TEXTURE_BUFFER_SIZE,
    max_uniform_buffer_bindings => MAX_UNIFORM_BUFFER_BINDINGS,
    /// Largest width or height accepted for a 2D texture.
    max_texture_size => MAX_TEXTURE_SIZE,
    /// Size in bytes of the largest uniform block.
    max_uniform_block_size => MAX_UNIFORM_BLOCK_SIZE,
    max_varying_vectors => MAX_VARYING_VECTORS,
    max_vertex_attribs => MAX_VERTEX_ATTRIBS,
    max_vertex_texture_image_units => MAX_VERTEX_TEXTURE_IMAGE_UNITS,
    max_vertex_uniform_components => MAX_VERTEX_UNIFORM_COMPONENTS,
    max_vertex_uniform_vectors => MAX_VERTEX_UNIFORM_VECTORS,
    max_vertex_output_components => MAX_VERTEX_OUTPUT_COMPONENTS,
    max_vertex_uniform_blocks => MAX_VERTEX_UNIFORM_BLOCKS,
}

impl Limits {
    pub fn gl_version(&self) -> (i32, i32) {
        (self.major_version, self.minor_version)
    }
}
