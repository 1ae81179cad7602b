use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use super::context::ContextShared;
use super::conversions::framebuffer_status_message;
use super::driver::{Driver, FramebufferHandle, GLenum};
use super::error::{GPUError, Result};
use super::structs::{ClearColor, FramebufferInfo, Viewport};
use super::Texture;

/// Something draw calls can be directed at.
pub(crate) trait RenderTarget {
    /// `None` for the window.
    fn framebuffer_handle(&self) -> Option<FramebufferHandle>;
    /// Issues the binds that make this the draw target. Does not touch the
    /// context's tracking.
    fn bind(&self, driver: &dyn Driver);
}

/// The window's implicit framebuffer.
pub(crate) struct ScreenTarget {
    viewport: Cell<Viewport>,
    depth_mask: Cell<bool>,
}

impl ScreenTarget {
    pub(crate) fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Cell::new(viewport),
            depth_mask: Cell::new(true),
        }
    }

    pub(crate) fn depth_mask(&self) -> bool {
        self.depth_mask.get()
    }

    pub(crate) fn set_depth_mask(&self, flag: bool) {
        self.depth_mask.set(flag);
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    pub(crate) fn set_viewport(&self, viewport: Viewport) {
        self.viewport.set(viewport);
    }
}

impl RenderTarget for ScreenTarget {
    fn framebuffer_handle(&self) -> Option<FramebufferHandle> {
        None
    }

    fn bind(&self, driver: &dyn Driver) {
        let vp = self.viewport.get();
        driver.bind_framebuffer(glow::FRAMEBUFFER, None);
        driver.depth_mask(self.depth_mask.get());
        driver.viewport(vp.x, vp.y, vp.width, vp.height);
    }
}

/// An offscreen render target built from texture attachments.
pub struct Framebuffer {
    shared: Rc<ContextShared>,
    handle: FramebufferHandle,
    width: u32,
    height: u32,
    color_attachments: Vec<Rc<Texture>>,
    depth_attachment: Option<Rc<Texture>>,
    draw_buffers: Vec<GLenum>,
    viewport: Cell<Viewport>,
    depth_mask: Cell<bool>,
}

impl Framebuffer {
    pub(crate) fn new(shared: &Rc<ContextShared>, info: &FramebufferInfo) -> Result<Self> {
        let Some(first) = info.color_attachments.first() else {
            return Err(GPUError::MissingColorAttachment);
        };

        let max = shared.limits().max_color_attachments;
        if max > 0 && info.color_attachments.len() > max as usize {
            return Err(GPUError::TooManyColorAttachments {
                max: max as usize,
                got: info.color_attachments.len(),
            });
        }

        let expected = first.size();
        let mismatch = info
            .color_attachments
            .iter()
            .chain(info.depth_attachment)
            .map(|texture| texture.size())
            .find(|size| *size != expected);
        if let Some(found) = mismatch {
            return Err(GPUError::AttachmentSizeMismatch { expected, found });
        }

        let driver = shared.driver();
        let handle = driver
            .create_framebuffer()
            .map_err(GPUError::creation("framebuffer"))?;
        let (width, height) = expected;

        let framebuffer = Self {
            shared: Rc::clone(shared),
            handle,
            width,
            height,
            color_attachments: info.color_attachments.to_vec(),
            depth_attachment: info.depth_attachment.cloned(),
            draw_buffers: (0..info.color_attachments.len() as u32)
                .map(|i| glow::COLOR_ATTACHMENT0 + i)
                .collect(),
            viewport: Cell::new(Viewport::new(0, 0, width as i32, height as i32)),
            depth_mask: Cell::new(true),
        };

        driver.bind_framebuffer(glow::FRAMEBUFFER, Some(handle));
        for (slot, texture) in framebuffer
            .draw_buffers
            .iter()
            .zip(&framebuffer.color_attachments)
        {
            driver.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                *slot,
                glow::TEXTURE_2D,
                Some(texture.handle()),
                0,
            );
        }
        if let Some(depth) = &framebuffer.depth_attachment {
            driver.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::TEXTURE_2D,
                Some(depth.handle()),
                0,
            );
        }

        let status = driver.check_framebuffer_status(glow::FRAMEBUFFER);
        shared.rebind_active_target();
        if let Some(message) = framebuffer_status_message(status) {
            return Err(GPUError::FramebufferIncomplete(message));
        }

        debug!(
            "Created framebuffer {} '{}' {}x{} with {} color attachments",
            handle,
            info.debug_name,
            width,
            height,
            framebuffer.color_attachments.len()
        );
        Ok(framebuffer)
    }

    pub fn handle(&self) -> FramebufferHandle {
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

    pub fn color_attachments(&self) -> &[Rc<Texture>] {
        &self.color_attachments
    }

    pub fn depth_attachment(&self) -> Option<&Rc<Texture>> {
        self.depth_attachment.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_active_target(Some(self.handle))
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    /// Takes `(width, height)` or `(x, y, width, height)`. Applied
    /// immediately if this framebuffer is active, otherwise on activation.
    pub fn set_viewport(&self, viewport: impl Into<Viewport>) {
        let vp = viewport.into();
        self.viewport.set(vp);
        if self.is_active() {
            self.shared.driver().viewport(vp.x, vp.y, vp.width, vp.height);
        }
    }

    /// Whether depth values are written when depth testing is enabled.
    pub fn depth_mask(&self) -> bool {
        self.depth_mask.get()
    }

    pub fn set_depth_mask(&self, flag: bool) {
        self.depth_mask.set(flag);
        if self.is_active() {
            self.shared.driver().depth_mask(flag);
        }
    }

    /// Makes this the active render target. Does nothing if it already is.
    pub fn activate(self: &Rc<Self>) {
        let target: Rc<dyn RenderTarget> = Rc::clone(self) as Rc<dyn RenderTarget>;
        self.shared.activate_target(target);
    }

    /// Clears the attachments. The depth attachment, if any, is cleared to
    /// `depth`. Whatever target was active before stays active. Does
    /// nothing once the context is gone.
    pub fn clear(&self, color: impl Into<ClearColor>, depth: f32) {
        if !self.shared.is_alive() {
            return;
        }
        let driver = self.shared.driver();
        let active = self.is_active();
        if !active {
            self.bind(driver);
        }

        let [r, g, b, a] = color.into().normalized();
        driver.clear_color(r, g, b, a);
        if self.depth_attachment.is_some() {
            driver.clear_depth(depth);
            driver.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        } else {
            driver.clear(glow::COLOR_BUFFER_BIT);
        }

        if !active {
            self.shared.rebind_active_target();
        }
    }
}

impl RenderTarget for Framebuffer {
    fn framebuffer_handle(&self) -> Option<FramebufferHandle> {
        Some(self.handle)
    }

    fn bind(&self, driver: &dyn Driver) {
        let vp = self.viewport.get();
        driver.bind_framebuffer(glow::FRAMEBUFFER, Some(self.handle));
        driver.draw_buffers(&self.draw_buffers);
        driver.depth_mask(self.depth_mask.get());
        driver.viewport(vp.x, vp.y, vp.width, vp.height);
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framebuffer")
            .field("handle", &self.handle)
            .field("size", &self.size())
            .field("color_attachments", &self.color_attachments.len())
            .field("depth", &self.depth_attachment.is_some())
            .field("viewport", &self.viewport.get())
            .finish()
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if !self.shared.is_alive() {
            return;
        }
        self.shared.driver().delete_framebuffer(self.handle);
        trace!("Deleted framebuffer {}", self.handle);
    }
}
