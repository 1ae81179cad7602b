use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::context::ContextShared;
use super::driver::{Driver, GLenum, ProgramHandle, UniformLocation};
use super::error::{GPUError, Result};
use super::tables::{StorageKind, Transfer, UniformType};

#[cfg(feature = "gloam-serde")]
use serde::{Deserialize, Serialize};

/// A value written to or read from a uniform.
///
/// Matrices are column-major. Array uniforms take and return the flat
/// `FloatArray` / `IntArray` variants, though any variant whose flattened
/// length matches the uniform's storage is accepted by a setter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
}

impl UniformValue {
    pub fn kind(&self) -> StorageKind {
        match self {
            UniformValue::Int(_)
            | UniformValue::IVec2(_)
            | UniformValue::IVec3(_)
            | UniformValue::IVec4(_)
            | UniformValue::IntArray(_) => StorageKind::Int,
            _ => StorageKind::Float,
        }
    }

    /// Number of scalar elements once flattened.
    pub fn len(&self) -> usize {
        match self {
            UniformValue::Float(_) | UniformValue::Int(_) => 1,
            UniformValue::Vec2(_) | UniformValue::IVec2(_) => 2,
            UniformValue::Vec3(_) | UniformValue::IVec3(_) => 3,
            UniformValue::Vec4(_) | UniformValue::IVec4(_) | UniformValue::Mat2(_) => 4,
            UniformValue::Mat3(_) => 9,
            UniformValue::Mat4(_) => 16,
            UniformValue::FloatArray(v) => v.len(),
            UniformValue::IntArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f32_slice(&self) -> Option<&[f32]> {
        f32::values(self)
    }

    pub fn as_i32_slice(&self) -> Option<&[i32]> {
        i32::values(self)
    }
}

/// Native element type backing a uniform's scratch buffer. Each storage type
/// knows its own transfer and read-back entry points.
pub(crate) trait UniformStorage: Copy + Default + fmt::Debug + 'static {
    const KIND: StorageKind;

    fn values(value: &UniformValue) -> Option<&[Self]>;
    fn transfer(driver: &dyn Driver, location: UniformLocation, transfer: Transfer, values: &[Self]);
    fn read_back(
        driver: &dyn Driver,
        program: ProgramHandle,
        location: UniformLocation,
        values: &mut [Self],
    );
    /// Rebuild the declared shape of a single (non-array) uniform.
    fn shape(utype: UniformType, values: &[Self]) -> UniformValue;
    fn array(values: &[Self]) -> UniformValue;
}

impl UniformStorage for f32 {
    const KIND: StorageKind = StorageKind::Float;

    fn values(value: &UniformValue) -> Option<&[f32]> {
        match value {
            UniformValue::Float(v) => Some(std::slice::from_ref(v)),
            UniformValue::Vec2(v) => Some(v.as_slice()),
            UniformValue::Vec3(v) => Some(v.as_slice()),
            UniformValue::Vec4(v) => Some(v.as_slice()),
            UniformValue::Mat2(v) => Some(v.as_slice()),
            UniformValue::Mat3(v) => Some(v.as_slice()),
            UniformValue::Mat4(v) => Some(v.as_slice()),
            UniformValue::FloatArray(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    fn transfer(driver: &dyn Driver, location: UniformLocation, transfer: Transfer, values: &[f32]) {
        match transfer {
            Transfer::UniformMatrix2fv | Transfer::UniformMatrix3fv | Transfer::UniformMatrix4fv => {
                driver.uniform_matrix_f32_slice(location, transfer.width(), false, values)
            }
            _ => driver.uniform_f32_slice(location, transfer.width(), values),
        }
    }

    fn read_back(
        driver: &dyn Driver,
        program: ProgramHandle,
        location: UniformLocation,
        values: &mut [f32],
    ) {
        driver.get_uniform_f32(program, location, values);
    }

    fn shape(utype: UniformType, v: &[f32]) -> UniformValue {
        match utype {
            UniformType::Float => UniformValue::Float(v[0]),
            UniformType::FloatVec2 => UniformValue::Vec2(std::array::from_fn(|i| v[i])),
            UniformType::FloatVec3 => UniformValue::Vec3(std::array::from_fn(|i| v[i])),
            UniformType::FloatVec4 => UniformValue::Vec4(std::array::from_fn(|i| v[i])),
            UniformType::FloatMat2 => UniformValue::Mat2(std::array::from_fn(|i| v[i])),
            UniformType::FloatMat3 => UniformValue::Mat3(std::array::from_fn(|i| v[i])),
            UniformType::FloatMat4 => UniformValue::Mat4(std::array::from_fn(|i| v[i])),
            _ => Self::array(v),
        }
    }

    fn array(values: &[f32]) -> UniformValue {
        UniformValue::FloatArray(values.to_vec())
    }
}

impl UniformStorage for i32 {
    const KIND: StorageKind = StorageKind::Int;

    fn values(value: &UniformValue) -> Option<&[i32]> {
        match value {
            UniformValue::Int(v) => Some(std::slice::from_ref(v)),
            UniformValue::IVec2(v) => Some(v.as_slice()),
            UniformValue::IVec3(v) => Some(v.as_slice()),
            UniformValue::IVec4(v) => Some(v.as_slice()),
            UniformValue::IntArray(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    fn transfer(driver: &dyn Driver, location: UniformLocation, transfer: Transfer, values: &[i32]) {
        driver.uniform_i32_slice(location, transfer.width(), values);
    }

    fn read_back(
        driver: &dyn Driver,
        program: ProgramHandle,
        location: UniformLocation,
        values: &mut [i32],
    ) {
        driver.get_uniform_i32(program, location, values);
    }

    fn shape(utype: UniformType, v: &[i32]) -> UniformValue {
        match utype {
            UniformType::Int | UniformType::Sampler2D => UniformValue::Int(v[0]),
            UniformType::IntVec2 => UniformValue::IVec2(std::array::from_fn(|i| v[i])),
            UniformType::IntVec3 => UniformValue::IVec3(std::array::from_fn(|i| v[i])),
            UniformType::IntVec4 => UniformValue::IVec4(std::array::from_fn(|i| v[i])),
            _ => Self::array(v),
        }
    }

    fn array(values: &[i32]) -> UniformValue {
        UniformValue::IntArray(values.to_vec())
    }
}

type Getter = Box<dyn Fn() -> Result<UniformValue>>;
type Setter = Box<dyn Fn(&UniformValue) -> Result<()>>;

/// A program-scope uniform with its accessors bound at link time.
pub struct Uniform {
    name: String,
    location: UniformLocation,
    utype: UniformType,
    array_length: usize,
    getter: Getter,
    setter: Setter,
}

impl Uniform {
    pub(crate) fn new(
        shared: &Rc<ContextShared>,
        program: ProgramHandle,
        name: String,
        location: UniformLocation,
        utype: UniformType,
        array_length: usize,
    ) -> Result<Self> {
        let (getter, setter) = match utype.setter_info().storage {
            StorageKind::Float => {
                build_accessors::<f32>(shared, program, &name, location, utype, array_length)?
            }
            StorageKind::Int => {
                build_accessors::<i32>(shared, program, &name, location, utype, array_length)?
            }
        };

        Ok(Self {
            name,
            location,
            utype,
            array_length,
            getter,
            setter,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> UniformLocation {
        self.location
    }

    pub fn uniform_type(&self) -> UniformType {
        self.utype
    }

    pub fn gl_type(&self) -> GLenum {
        self.utype.to_gl()
    }

    pub fn array_length(&self) -> usize {
        self.array_length
    }

    /// Number of storage elements the setter expects.
    pub fn storage_len(&self) -> usize {
        self.utype.setter_info().length * self.array_length
    }

    pub fn get(&self) -> Result<UniformValue> {
        (self.getter)()
    }

    /// Writes `value`, activating the owning program first.
    pub fn set(&self, value: &UniformValue) -> Result<()> {
        (self.setter)(value)
    }
}

impl fmt::Debug for Uniform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uniform")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("type", &self.utype)
            .field("array_length", &self.array_length)
            .finish()
    }
}

fn build_accessors<T: UniformStorage>(
    shared: &Rc<ContextShared>,
    program: ProgramHandle,
    name: &str,
    location: UniformLocation,
    utype: UniformType,
    array_length: usize,
) -> Result<(Getter, Setter)> {
    let info = utype.setter_info();
    let width = info.transfer.width() as usize;

    let consistent = if utype.is_matrix() {
        info.length == width * width
    } else {
        info.length == width
    };
    if !consistent || info.storage != T::KIND {
        return Err(GPUError::UnsupportedUniformShape {
            name: name.to_string(),
            reason: "storage layout does not match the transfer call",
        });
    }

    let size = info.length * info.count * array_length;
    let scratch = Rc::new(RefCell::new(vec![T::default(); size]));

    let getter: Getter = {
        let shared = Rc::clone(shared);
        let scratch = Rc::clone(&scratch);
        Box::new(move || {
            if !shared.is_alive() {
                return Err(GPUError::ContextLost);
            }
            let mut values = scratch.borrow_mut();
            T::read_back(shared.driver(), program, location, &mut values);
            Ok(if array_length > 1 {
                T::array(&values)
            } else {
                T::shape(utype, &values)
            })
        })
    };

    let setter: Setter = {
        let shared = Rc::clone(shared);
        let name = name.to_string();
        Box::new(move |value: &UniformValue| {
            if !shared.is_alive() {
                return Err(GPUError::ContextLost);
            }
            let values = T::values(value)
                .filter(|v| v.len() == size)
                .ok_or_else(|| GPUError::UniformValueMismatch {
                    name: name.clone(),
                    kind: T::KIND.name(),
                    expected: size,
                    got: value.len(),
                })?;

            let mut buffer = scratch.borrow_mut();
            buffer.copy_from_slice(values);
            shared.use_program(program);
            T::transfer(shared.driver(), location, info.transfer, &buffer);
            Ok(())
        })
    };

    Ok((getter, setter))
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<[i32; 2]> for UniformValue {
    fn from(value: [i32; 2]) -> Self {
        UniformValue::IVec2(value)
    }
}

impl From<[i32; 3]> for UniformValue {
    fn from(value: [i32; 3]) -> Self {
        UniformValue::IVec3(value)
    }
}

impl From<[i32; 4]> for UniformValue {
    fn from(value: [i32; 4]) -> Self {
        UniformValue::IVec4(value)
    }
}

impl From<[f32; 9]> for UniformValue {
    fn from(value: [f32; 9]) -> Self {
        UniformValue::Mat3(value)
    }
}

impl From<[f32; 16]> for UniformValue {
    fn from(value: [f32; 16]) -> Self {
        UniformValue::Mat4(value)
    }
}

impl From<Vec<f32>> for UniformValue {
    fn from(value: Vec<f32>) -> Self {
        UniformValue::FloatArray(value)
    }
}

impl From<Vec<i32>> for UniformValue {
    fn from(value: Vec<i32>) -> Self {
        UniformValue::IntArray(value)
    }
}

#[cfg(feature = "gloam-glam")]
mod glam_conversions {
    use super::UniformValue;

    impl From<glam::Vec2> for UniformValue {
        fn from(value: glam::Vec2) -> Self {
            UniformValue::Vec2(value.to_array())
        }
    }

    impl From<glam::Vec3> for UniformValue {
        fn from(value: glam::Vec3) -> Self {
            UniformValue::Vec3(value.to_array())
        }
    }

    impl From<glam::Vec4> for UniformValue {
        fn from(value: glam::Vec4) -> Self {
            UniformValue::Vec4(value.to_array())
        }
    }

    impl From<glam::IVec2> for UniformValue {
        fn from(value: glam::IVec2) -> Self {
            UniformValue::IVec2(value.to_array())
        }
    }

    impl From<glam::IVec3> for UniformValue {
        fn from(value: glam::IVec3) -> Self {
            UniformValue::IVec3(value.to_array())
        }
    }

    impl From<glam::IVec4> for UniformValue {
        fn from(value: glam::IVec4) -> Self {
            UniformValue::IVec4(value.to_array())
        }
    }

    impl From<glam::Mat2> for UniformValue {
        fn from(value: glam::Mat2) -> Self {
            UniformValue::Mat2(value.to_cols_array())
        }
    }

    impl From<glam::Mat3> for UniformValue {
        fn from(value: glam::Mat3) -> Self {
            UniformValue::Mat3(value.to_cols_array())
        }
    }

    impl From<glam::Mat4> for UniformValue {
        fn from(value: glam::Mat4) -> Self {
            UniformValue::Mat4(value.to_cols_array())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattened_lengths() {
        assert_eq!(UniformValue::Mat3([0.0; 9]).len(), 9);
        assert_eq!(UniformValue::IVec3([1, 2, 3]).len(), 3);
        assert_eq!(UniformValue::FloatArray(vec![1.0; 7]).len(), 7);
    }

    #[test]
    fn storage_kind_follows_variant() {
        assert_eq!(UniformValue::from(3).kind(), StorageKind::Int);
        assert_eq!(UniformValue::from([1.0f32, 2.0]).kind(), StorageKind::Float);
        assert!(UniformValue::Int(1).as_f32_slice().is_none());
        assert_eq!(UniformValue::Vec2([1.0, 2.0]).as_f32_slice(), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn scalar_types_rebuild_their_shape() {
        assert_eq!(
            f32::shape(UniformType::FloatVec3, &[1.0, 2.0, 3.0]),
            UniformValue::Vec3([1.0, 2.0, 3.0])
        );
        assert_eq!(i32::shape(UniformType::Sampler2D, &[2]), UniformValue::Int(2));
    }
}
