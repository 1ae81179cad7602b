use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use super::context::ContextShared;
use super::driver::{GLenum, PixelRegion, PixelUnpack, TextureHandle};
use super::error::{GPUError, Result};
use super::structs::{Filter, TextureInfo, Viewport, WrapMode};
use super::tables::TextureDtype;
use super::Buffer;

/// Where the pixels of a [`Texture::write`] come from.
#[derive(Clone, Copy, Debug)]
pub enum PixelSource<'a> {
    Bytes(&'a [u8]),
    /// Read through `PIXEL_UNPACK_BUFFER` starting at byte 0.
    Buffer(&'a Buffer),
}

impl<'a> From<&'a [u8]> for PixelSource<'a> {
    fn from(value: &'a [u8]) -> Self {
        PixelSource::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for PixelSource<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        PixelSource::Bytes(value)
    }
}

impl<'a> From<&'a Buffer> for PixelSource<'a> {
    fn from(value: &'a Buffer) -> Self {
        PixelSource::Buffer(value)
    }
}

/// A 2D texture.
pub struct Texture {
    shared: Rc<ContextShared>,
    handle: TextureHandle,
    width: u32,
    height: u32,
    components: u8,
    dtype: TextureDtype,
    format: GLenum,
    transfer_type: GLenum,
    component_size: usize,
    filter: Cell<(Filter, Filter)>,
    wrap_x: Cell<WrapMode>,
    wrap_y: Cell<WrapMode>,
}

impl Texture {
    pub(crate) fn new(shared: &Rc<ContextShared>, info: &TextureInfo) -> Result<Self> {
        if !(1..=4).contains(&info.components) {
            return Err(GPUError::InvalidComponents(info.components));
        }

        let [width, height] = info.size;
        let max = shared.limits().max_texture_size;
        if max > 0 && (width > max as u32 || height > max as u32) {
            return Err(GPUError::TextureTooLarge { width, height, max });
        }

        let (min_filter, mag_filter) = info.filter.unwrap_or_default();
        if !mag_filter.is_mag_filter() {
            return Err(GPUError::InvalidMagFilter);
        }

        let table = info.dtype.format();
        let components = info.components as usize;
        let expected = width as usize * height as usize * components * table.component_size;
        if let Some(data) = info.data {
            if data.len() != expected {
                return Err(GPUError::PixelDataSize {
                    expected,
                    got: data.len(),
                });
            }
        }

        let driver = shared.driver();
        let handle = driver.create_texture().map_err(GPUError::creation("texture"))?;

        let texture = Self {
            shared: Rc::clone(shared),
            handle,
            width,
            height,
            components: info.components,
            dtype: info.dtype,
            format: table.base_formats[components],
            transfer_type: table.transfer_type,
            component_size: table.component_size,
            filter: Cell::new((min_filter, mag_filter)),
            wrap_x: Cell::new(info.wrap_x.unwrap_or_default()),
            wrap_y: Cell::new(info.wrap_y.unwrap_or_default()),
        };

        texture.prepare();
        driver.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            table.internal_formats[components] as i32,
            width as i32,
            height as i32,
            texture.format,
            texture.transfer_type,
            info.data.map_or(PixelUnpack::None, PixelUnpack::Bytes),
        );
        texture.apply_filter();
        texture.apply_wrap(glow::TEXTURE_WRAP_S, texture.wrap_x.get());
        texture.apply_wrap(glow::TEXTURE_WRAP_T, texture.wrap_y.get());

        debug!(
            "Created texture {} '{}' {}x{} {}x{}",
            handle,
            info.debug_name,
            width,
            height,
            info.components,
            info.dtype.tag()
        );
        Ok(texture)
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn components(&self) -> u8 {
        self.components
    }

    pub fn dtype(&self) -> TextureDtype {
        self.dtype
    }

    /// `(min, mag)`
    pub fn filter(&self) -> (Filter, Filter) {
        self.filter.get()
    }

    /// Mipmap filters are only valid as the minification filter.
    pub fn set_filter(&self, min: Filter, mag: Filter) -> Result<()> {
        if !mag.is_mag_filter() {
            return Err(GPUError::InvalidMagFilter);
        }
        self.shared.check_alive()?;
        self.filter.set((min, mag));
        self.prepare();
        self.apply_filter();
        Ok(())
    }

    pub fn wrap_x(&self) -> WrapMode {
        self.wrap_x.get()
    }

    pub fn set_wrap_x(&self, mode: WrapMode) {
        self.wrap_x.set(mode);
        if !self.shared.is_alive() {
            return;
        }
        self.prepare();
        self.apply_wrap(glow::TEXTURE_WRAP_S, mode);
    }

    pub fn wrap_y(&self) -> WrapMode {
        self.wrap_y.get()
    }

    pub fn set_wrap_y(&self, mode: WrapMode) {
        self.wrap_y.set(mode);
        if !self.shared.is_alive() {
            return;
        }
        self.prepare();
        self.apply_wrap(glow::TEXTURE_WRAP_T, mode);
    }

    /// The whole texel store of `level` as raw bytes. Empty once the
    /// context is gone.
    pub fn read(&self, level: u32) -> Vec<u8> {
        if !self.shared.is_alive() {
            return Vec::new();
        }
        let (width, height) = self.level_size(level);
        let mut pixels = vec![0u8; self.byte_size(width as usize, height as usize)];

        self.prepare();
        self.shared.driver().get_tex_image(
            glow::TEXTURE_2D,
            level as i32,
            self.format,
            self.transfer_type,
            &mut pixels,
        );
        pixels
    }

    /// Uploads pixels to `level`. `viewport` selects the region, the whole
    /// level when `None`.
    pub fn write<'a>(
        &self,
        data: impl Into<PixelSource<'a>>,
        level: u32,
        viewport: Option<Viewport>,
    ) -> Result<()> {
        self.shared.check_alive()?;
        let (level_width, level_height) = self.level_size(level);
        let Viewport {
            x,
            y,
            width,
            height,
        } = viewport.unwrap_or_else(|| Viewport::from((level_width as i32, level_height as i32)));

        let inside = x >= 0
            && y >= 0
            && width >= 0
            && height >= 0
            && x as i64 + width as i64 <= level_width as i64
            && y as i64 + height as i64 <= level_height as i64;
        if !inside {
            return Err(GPUError::RegionOutOfBounds {
                region: [x, y, width, height],
                width: level_width,
                height: level_height,
            });
        }

        let expected = self.byte_size(width as usize, height as usize);
        let region = PixelRegion {
            level: level as i32,
            x,
            y,
            width,
            height,
            format: self.format,
            ty: self.transfer_type,
        };
        let driver = self.shared.driver();

        match data.into() {
            PixelSource::Bytes(bytes) => {
                if bytes.len() != expected {
                    return Err(GPUError::PixelDataSize {
                        expected,
                        got: bytes.len(),
                    });
                }
                self.prepare();
                driver.tex_sub_image_2d(glow::TEXTURE_2D, &region, PixelUnpack::Bytes(bytes));
            }
            PixelSource::Buffer(buffer) => {
                if buffer.size() < expected {
                    return Err(GPUError::PixelDataSize {
                        expected,
                        got: buffer.size(),
                    });
                }
                buffer.bind(glow::PIXEL_UNPACK_BUFFER);
                self.prepare();
                driver.tex_sub_image_2d(glow::TEXTURE_2D, &region, PixelUnpack::BufferOffset(0));
                driver.bind_buffer(glow::PIXEL_UNPACK_BUFFER, None);
            }
        }
        Ok(())
    }

    /// Generates the mip chain between `base` and `max` inclusive.
    pub fn build_mipmaps(&self, base: i32, max: i32) {
        if !self.shared.is_alive() {
            return;
        }
        let driver = self.shared.driver();
        self.prepare();
        driver.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_BASE_LEVEL, base);
        driver.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAX_LEVEL, max);
        driver.generate_mipmap(glow::TEXTURE_2D);
    }

    /// Binds to texture unit `unit` for sampling.
    pub fn bind(&self, unit: u32) {
        if !self.shared.is_alive() {
            return;
        }
        let driver = self.shared.driver();
        driver.active_texture(glow::TEXTURE0 + unit);
        driver.bind_texture(glow::TEXTURE_2D, Some(self.handle));
    }

    /// Unit 0, bound, byte aligned rows.
    fn prepare(&self) {
        let driver = self.shared.driver();
        self.bind(0);
        driver.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
        driver.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
    }

    fn apply_filter(&self) {
        let (min, mag) = self.filter.get();
        let driver = self.shared.driver();
        driver.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            GLenum::from(min) as i32,
        );
        driver.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MAG_FILTER,
            GLenum::from(mag) as i32,
        );
    }

    fn apply_wrap(&self, parameter: GLenum, mode: WrapMode) {
        self.shared
            .driver()
            .tex_parameter_i32(glow::TEXTURE_2D, parameter, GLenum::from(mode) as i32);
    }

    fn level_size(&self, level: u32) -> (u32, u32) {
        let shrink = |size: u32| match size {
            0 => 0,
            _ => size.checked_shr(level).unwrap_or(0).max(1),
        };
        (shrink(self.width), shrink(self.height))
    }

    fn byte_size(&self, width: usize, height: usize) -> usize {
        width * height * self.components as usize * self.component_size
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("handle", &self.handle)
            .field("size", &self.size())
            .field("components", &self.components)
            .field("dtype", &self.dtype)
            .finish()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if !self.shared.is_alive() {
            return;
        }
        self.shared.driver().delete_texture(self.handle);
        trace!("Deleted texture {}", self.handle);
    }
}
