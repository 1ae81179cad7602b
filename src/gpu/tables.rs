//! Static uniform and texture format tables.

use std::str::FromStr;

use super::driver::GLenum;
use super::error::GPUError;

#[cfg(feature = "gloam-serde")]
use serde::{Deserialize, Serialize};

/// Native element type of a uniform's storage.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Int,
    Float,
}

impl StorageKind {
    pub fn name(self) -> &'static str {
        match self {
            StorageKind::Int => "int",
            StorageKind::Float => "float",
        }
    }
}

/// The native uniform transfer entry point.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    Uniform1iv,
    Uniform2iv,
    Uniform3iv,
    Uniform4iv,
    Uniform1fv,
    Uniform2fv,
    Uniform3fv,
    Uniform4fv,
    UniformMatrix2fv,
    UniformMatrix3fv,
    UniformMatrix4fv,
}

impl Transfer {
    /// Components per element for vector transfers, rows for matrix transfers.
    pub fn width(self) -> u32 {
        match self {
            Transfer::Uniform1iv | Transfer::Uniform1fv => 1,
            Transfer::Uniform2iv | Transfer::Uniform2fv | Transfer::UniformMatrix2fv => 2,
            Transfer::Uniform3iv | Transfer::Uniform3fv | Transfer::UniformMatrix3fv => 3,
            Transfer::Uniform4iv | Transfer::Uniform4fv | Transfer::UniformMatrix4fv => 4,
        }
    }
}

/// One row of the uniform setter table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformSetterInfo {
    pub storage: StorageKind,
    pub transfer: Transfer,
    /// Storage elements per logical value.
    pub length: usize,
    /// Transfer count multiplier, reserved for non-1 counts.
    pub count: usize,
}

/// Every uniform type with a native accessor.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum UniformType {
    Int,
    IntVec2,
    IntVec3,
    IntVec4,
    Float,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    Sampler2D,
    FloatMat2,
    FloatMat3,
    FloatMat4,
}

impl UniformType {
    /// Anything missing here is rejected at introspection time.
    pub fn from_gl(value: GLenum) -> Option<Self> {
        Some(match value {
            glow::INT => UniformType::Int,
            glow::INT_VEC2 => UniformType::IntVec2,
            glow::INT_VEC3 => UniformType::IntVec3,
            glow::INT_VEC4 => UniformType::IntVec4,
            glow::FLOAT => UniformType::Float,
            glow::FLOAT_VEC2 => UniformType::FloatVec2,
            glow::FLOAT_VEC3 => UniformType::FloatVec3,
            glow::FLOAT_VEC4 => UniformType::FloatVec4,
            glow::SAMPLER_2D => UniformType::Sampler2D,
            glow::FLOAT_MAT2 => UniformType::FloatMat2,
            glow::FLOAT_MAT3 => UniformType::FloatMat3,
            glow::FLOAT_MAT4 => UniformType::FloatMat4,
            _ => return None,
        })
    }

    pub fn to_gl(self) -> GLenum {
        match self {
            UniformType::Int => glow::INT,
            UniformType::IntVec2 => glow::INT_VEC2,
            UniformType::IntVec3 => glow::INT_VEC3,
            UniformType::IntVec4 => glow::INT_VEC4,
            UniformType::Float => glow::FLOAT,
            UniformType::FloatVec2 => glow::FLOAT_VEC2,
            UniformType::FloatVec3 => glow::FLOAT_VEC3,
            UniformType::FloatVec4 => glow::FLOAT_VEC4,
            UniformType::Sampler2D => glow::SAMPLER_2D,
            UniformType::FloatMat2 => glow::FLOAT_MAT2,
            UniformType::FloatMat3 => glow::FLOAT_MAT3,
            UniformType::FloatMat4 => glow::FLOAT_MAT4,
        }
    }

    pub fn is_matrix(self) -> bool {
        matches!(
            self,
            UniformType::FloatMat2 | UniformType::FloatMat3 | UniformType::FloatMat4
        )
    }

    pub fn setter_info(self) -> UniformSetterInfo {
        use StorageKind::*;
        use Transfer::*;
        let (storage, transfer, length) = match self {
            UniformType::Int => (Int, Uniform1iv, 1),
            UniformType::IntVec2 => (Int, Uniform2iv, 2),
            UniformType::IntVec3 => (Int, Uniform3iv, 3),
            UniformType::IntVec4 => (Int, Uniform4iv, 4),
            UniformType::Float => (Float, Uniform1fv, 1),
            UniformType::FloatVec2 => (Float, Uniform2fv, 2),
            UniformType::FloatVec3 => (Float, Uniform3fv, 3),
            UniformType::FloatVec4 => (Float, Uniform4fv, 4),
            UniformType::Sampler2D => (Int, Uniform1iv, 1),
            UniformType::FloatMat2 => (Float, UniformMatrix2fv, 4),
            UniformType::FloatMat3 => (Float, UniformMatrix3fv, 9),
            UniformType::FloatMat4 => (Float, UniformMatrix4fv, 16),
        };

        UniformSetterInfo {
            storage,
            transfer,
            length,
            count: 1,
        }
    }
}

/// Element format of a texture: float / integer variants at 1, 2 and 4
/// bytes per component. Parses from the short tags `f1`, `i2`, `u4`, ...
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum TextureDtype {
    #[default]
    F1,
    F2,
    F4,
    I1,
    I2,
    I4,
    U1,
    U2,
    U4,
}

/// One row of the texture format table. The format arrays are indexed by
/// component count; index 0 is unused.
#[derive(Debug, PartialEq, Eq)]
pub struct TextureFormat {
    pub base_formats: [GLenum; 5],
    pub internal_formats: [GLenum; 5],
    pub transfer_type: GLenum,
    pub component_size: usize,
}

const FLOAT_BASE_FORMAT: [GLenum; 5] = [0, glow::RED, glow::RG, glow::RGB, glow::RGBA];
const INT_BASE_FORMAT: [GLenum; 5] = [
    0,
    glow::RED_INTEGER,
    glow::RG_INTEGER,
    glow::RGB_INTEGER,
    glow::RGBA_INTEGER,
];

static F1: TextureFormat = TextureFormat {
    base_formats: FLOAT_BASE_FORMAT,
    internal_formats: [0, glow::R8, glow::RG8, glow::RGB8, glow::RGBA8],
    transfer_type: glow::UNSIGNED_BYTE,
    component_size: 1,
};
static F2: TextureFormat = TextureFormat {
    base_formats: FLOAT_BASE_FORMAT,
    internal_formats: [0, glow::R16F, glow::RG16F, glow::RGB16F, glow::RGBA16F],
    transfer_type: glow::HALF_FLOAT,
    component_size: 2,
};
static F4: TextureFormat = TextureFormat {
    base_formats: FLOAT_BASE_FORMAT,
    internal_formats: [0, glow::R32F, glow::RG32F, glow::RGB32F, glow::RGBA32F],
    transfer_type: glow::FLOAT,
    component_size: 4,
};
static I1: TextureFormat = TextureFormat {
    base_formats: INT_BASE_FORMAT,
    internal_formats: [0, glow::R8UI, glow::RG8UI, glow::RGB8UI, glow::RGBA8UI],
    transfer_type: glow::UNSIGNED_BYTE,
    component_size: 1,
};
static I2: TextureFormat = TextureFormat {
    base_formats: INT_BASE_FORMAT,
    internal_formats: [0, glow::R16UI, glow::RG16UI, glow::RGB16UI, glow::RGBA16UI],
    transfer_type: glow::UNSIGNED_SHORT,
    component_size: 2,
};
static I4: TextureFormat = TextureFormat {
    base_formats: INT_BASE_FORMAT,
    internal_formats: [0, glow::R32UI, glow::RG32UI, glow::RGB32UI, glow::RGBA32UI],
    transfer_type: glow::UNSIGNED_INT,
    component_size: 4,
};
static U1: TextureFormat = TextureFormat {
    base_formats: INT_BASE_FORMAT,
    internal_formats: [0, glow::R8UI, glow::RG8UI, glow::RGB8UI, glow::RGBA8UI],
    transfer_type: glow::BYTE,
    component_size: 1,
};
static U2: TextureFormat = TextureFormat {
    base_formats: INT_BASE_FORMAT,
    internal_formats: [0, glow::R16UI, glow::RG16UI, glow::RGB16UI, glow::RGBA16UI],
    transfer_type: glow::SHORT,
    component_size: 2,
};
static U4: TextureFormat = TextureFormat {
    base_formats: INT_BASE_FORMAT,
    internal_formats: [0, glow::R32UI, glow::RG32UI, glow::RGB32UI, glow::RGBA32UI],
    transfer_type: glow::INT,
    component_size: 4,
};

impl TextureDtype {
    pub fn format(self) -> &'static TextureFormat {
        match self {
            TextureDtype::F1 => &F1,
            TextureDtype::F2 => &F2,
            TextureDtype::F4 => &F4,
            TextureDtype::I1 => &I1,
            TextureDtype::I2 => &I2,
            TextureDtype::I4 => &I4,
            TextureDtype::U1 => &U1,
            TextureDtype::U2 => &U2,
            TextureDtype::U4 => &U4,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            TextureDtype::F1 => "f1",
            TextureDtype::F2 => "f2",
            TextureDtype::F4 => "f4",
            TextureDtype::I1 => "i1",
            TextureDtype::I2 => "i2",
            TextureDtype::I4 => "i4",
            TextureDtype::U1 => "u1",
            TextureDtype::U2 => "u2",
            TextureDtype::U4 => "u4",
        }
    }
}

impl FromStr for TextureDtype {
    type Err = GPUError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "f1" => TextureDtype::F1,
            "f2" => TextureDtype::F2,
            "f4" => TextureDtype::F4,
            "i1" => TextureDtype::I1,
            "i2" => TextureDtype::I2,
            "i4" => TextureDtype::I4,
            "u1" => TextureDtype::U1,
            "u2" => TextureDtype::U2,
            "u4" => TextureDtype::U4,
            other => return Err(GPUError::UnsupportedDtype(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_lengths_match_their_dimensions() {
        assert_eq!(UniformType::FloatMat2.setter_info().length, 4);
        assert_eq!(UniformType::FloatMat3.setter_info().length, 9);
        assert_eq!(UniformType::FloatMat4.setter_info().length, 16);
        assert_eq!(UniformType::FloatMat3.setter_info().transfer.width(), 3);
    }

    #[test]
    fn samplers_are_stored_as_ints() {
        let info = UniformType::Sampler2D.setter_info();
        assert_eq!(info.storage, StorageKind::Int);
        assert_eq!(info.transfer, Transfer::Uniform1iv);
    }

    #[test]
    fn unsupported_native_types_have_no_row() {
        assert_eq!(UniformType::from_gl(glow::BOOL), None);
        assert_eq!(UniformType::from_gl(glow::FLOAT_MAT2x3), None);
        assert_eq!(UniformType::from_gl(glow::SAMPLER_3D), None);
        assert_eq!(
            UniformType::from_gl(glow::FLOAT_VEC3),
            Some(UniformType::FloatVec3)
        );
    }

    #[test]
    fn dtype_tags_parse() {
        for tag in ["f1", "f2", "f4", "i1", "i2", "i4", "u1", "u2", "u4"] {
            let dtype: TextureDtype = tag.parse().unwrap();
            assert_eq!(dtype.tag(), tag);
        }
        assert!(matches!(
            "f3".parse::<TextureDtype>(),
            Err(GPUError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn integer_formats_use_integer_base_formats() {
        let format = TextureDtype::I2.format();
        assert_eq!(format.base_formats[4], glow::RGBA_INTEGER);
        assert_eq!(format.internal_formats[1], glow::R16UI);
        assert_eq!(format.component_size, 2);
        assert_eq!(TextureDtype::F4.format().transfer_type, glow::FLOAT);
    }
}
