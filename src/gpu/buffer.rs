use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use bytemuck::Pod;
use log::{debug, trace};

use super::context::ContextShared;
use super::driver::{BufferData, BufferHandle, GLenum};
use super::error::{GPUError, Result};
use super::structs::{BufferInfo, BufferUsage};

/// A block of GPU-resident bytes.
///
/// The bind target used for the calls below does not restrict what the
/// buffer can be used for afterwards.
pub struct Buffer {
    shared: Rc<ContextShared>,
    handle: BufferHandle,
    size: Cell<usize>,
    usage: BufferUsage,
    debug_name: String,
}

impl Buffer {
    pub(crate) fn new(shared: &Rc<ContextShared>, info: &BufferInfo) -> Result<Self> {
        let data = match (info.data, info.reserve) {
            (Some(bytes), 0) if !bytes.is_empty() => BufferData::Bytes(bytes),
            (None, reserve) if reserve > 0 => BufferData::Reserve(reserve),
            _ => return Err(GPUError::BufferInitialization),
        };
        let size = match data {
            BufferData::Bytes(bytes) => bytes.len(),
            BufferData::Reserve(reserve) => reserve,
        };

        let driver = shared.driver();
        let handle = driver.create_buffer().map_err(GPUError::creation("buffer"))?;
        driver.bind_buffer(glow::ARRAY_BUFFER, Some(handle));
        driver.buffer_data(glow::ARRAY_BUFFER, data, info.usage.into());

        debug!("Created buffer {} '{}' of {} bytes", handle, info.debug_name, size);
        Ok(Self {
            shared: Rc::clone(shared),
            handle,
            size: Cell::new(size),
            usage: info.usage,
            debug_name: info.debug_name.to_string(),
        })
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size.get()
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// Reads `size` bytes (the whole buffer when `None`) starting at `offset`.
    pub fn read(&self, size: Option<usize>, offset: usize) -> Result<Vec<u8>> {
        self.shared.check_alive()?;
        let size = size.unwrap_or(self.size());
        if size < 1 {
            return Err(GPUError::EmptyRead);
        }
        self.check_range(offset, size)?;

        let mut data = vec![0u8; size];
        let driver = self.shared.driver();
        driver.bind_buffer(glow::ARRAY_BUFFER, Some(self.handle));
        driver.get_buffer_sub_data(glow::ARRAY_BUFFER, offset, &mut data);
        Ok(data)
    }

    pub fn write(&self, data: &[u8], offset: usize) -> Result<()> {
        self.shared.check_alive()?;
        self.check_range(offset, data.len())?;

        let driver = self.shared.driver();
        driver.bind_buffer(glow::ARRAY_BUFFER, Some(self.handle));
        driver.buffer_sub_data(glow::ARRAY_BUFFER, offset, data);
        Ok(())
    }

    /// Writes plain values, e.g. vertex data as `&[f32]`, starting at byte
    /// `offset`.
    pub fn write_slice<T: Pod>(&self, data: &[T], offset: usize) -> Result<()> {
        self.write(bytemuck::cast_slice(data), offset)
    }

    /// Reads `count` values of `T` starting at byte `offset`.
    pub fn read_slice<T: Pod>(&self, count: usize, offset: usize) -> Result<Vec<T>> {
        let stride = std::mem::size_of::<T>();
        let bytes = self.read(Some(count * stride), offset)?;
        Ok(bytes
            .chunks_exact(stride)
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }

    /// Copies `size` bytes (all of `source` when `None`) from
    /// `source[source_offset..]` into `self[offset..]`.
    pub fn copy_from_buffer(
        &self,
        source: &Buffer,
        size: Option<usize>,
        offset: usize,
        source_offset: usize,
    ) -> Result<()> {
        self.shared.check_alive()?;
        let size = size.unwrap_or(source.size());
        source.check_range(source_offset, size)?;
        self.check_range(offset, size)?;

        let driver = self.shared.driver();
        driver.bind_buffer(glow::COPY_READ_BUFFER, Some(source.handle));
        driver.bind_buffer(glow::COPY_WRITE_BUFFER, Some(self.handle));
        driver.copy_buffer_sub_data(
            glow::COPY_READ_BUFFER,
            glow::COPY_WRITE_BUFFER,
            source_offset,
            offset,
            size,
        );
        Ok(())
    }

    /// Reallocates the data store, optionally at a new size. Storage still
    /// in use by pending draws is released by the driver once they finish.
    pub fn orphan(&self, size: Option<usize>) {
        if let Some(size) = size {
            self.size.set(size);
        }
        if !self.shared.is_alive() {
            return;
        }

        let driver = self.shared.driver();
        driver.bind_buffer(glow::ARRAY_BUFFER, Some(self.handle));
        driver.buffer_data(
            glow::ARRAY_BUFFER,
            BufferData::Reserve(self.size()),
            self.usage.into(),
        );
    }

    /// Binds to `target`, e.g. `ELEMENT_ARRAY_BUFFER` or `PIXEL_UNPACK_BUFFER`.
    pub(crate) fn bind(&self, target: GLenum) {
        self.shared.driver().bind_buffer(target, Some(self.handle));
    }

    pub(crate) fn bind_base(&self, target: GLenum, index: u32) {
        self.shared
            .driver()
            .bind_buffer_base(target, index, Some(self.handle));
    }

    fn check_range(&self, offset: usize, size: usize) -> Result<()> {
        let buffer_size = self.size();
        match offset.checked_add(size) {
            Some(end) if end <= buffer_size => Ok(()),
            _ => Err(GPUError::BufferOutOfRange {
                buffer_size,
                offset,
                size,
            }),
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.handle)
            .field("size", &self.size())
            .field("usage", &self.usage)
            .finish()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if !self.shared.is_alive() {
            return;
        }
        self.shared.driver().delete_buffer(self.handle);
        trace!("Deleted buffer {}", self.handle);
    }
}
