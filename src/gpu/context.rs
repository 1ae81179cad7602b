use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::{info, trace};

use super::conversions::error_name;
use super::driver::{Driver, FramebufferHandle, GlowDriver, ProgramHandle};
use super::error::{GPUError, Result};
use super::framebuffer::{RenderTarget, ScreenTarget};
use super::limits::Limits;
use super::structs::*;
use super::{Buffer, BufferDescription, Framebuffer, Program, Texture, VertexArray};

/// State shared by a [`Context`] and every resource created through it.
///
/// Resources keep this alive through an `Rc`, so the driver outlives them
/// even after the [`Context`] itself is dropped. `alive` is what decides
/// whether their destructors still talk to the driver.
pub(crate) struct ContextShared {
    driver: Box<dyn Driver>,
    alive: Cell<bool>,
    limits: Limits,
    active_program: Cell<Option<ProgramHandle>>,
    active_target: RefCell<Rc<dyn RenderTarget>>,
    screen: Rc<ScreenTarget>,
}

impl ContextShared {
    pub(crate) fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub(crate) fn check_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(GPUError::ContextLost)
        }
    }

    pub(crate) fn limits(&self) -> &Limits {
        &self.limits
    }

    pub(crate) fn active_program(&self) -> Option<ProgramHandle> {
        self.active_program.get()
    }

    /// Binds `program` unless it already is the active program.
    pub(crate) fn use_program(&self, program: ProgramHandle) {
        if !self.is_alive() {
            return;
        }
        if self.active_program.get() == Some(program) {
            trace!("program {} already active", program);
            return;
        }
        self.driver.use_program(Some(program));
        self.active_program.set(Some(program));
    }

    /// Forget `program` if it is the tracked one, so a recycled name is
    /// never mistaken for it.
    pub(crate) fn release_program(&self, program: ProgramHandle) {
        if self.active_program.get() == Some(program) {
            self.active_program.set(None);
        }
    }

    pub(crate) fn active_target_handle(&self) -> Option<FramebufferHandle> {
        self.active_target.borrow().framebuffer_handle()
    }

    pub(crate) fn is_active_target(&self, handle: Option<FramebufferHandle>) -> bool {
        self.active_target_handle() == handle
    }

    /// Binds `target` and publishes it as the active render target, unless
    /// it already is.
    pub(crate) fn activate_target(&self, target: Rc<dyn RenderTarget>) {
        if !self.is_alive() {
            return;
        }
        if self.is_active_target(target.framebuffer_handle()) {
            trace!("render target {:?} already active", target.framebuffer_handle());
            return;
        }
        target.bind(self.driver());
        *self.active_target.borrow_mut() = target;
    }

    /// Re-issues the binds of the tracked render target without touching
    /// the tracking itself.
    pub(crate) fn rebind_active_target(&self) {
        if !self.is_alive() {
            return;
        }
        let target = Rc::clone(&*self.active_target.borrow());
        target.bind(self.driver());
    }

    pub(crate) fn screen(&self) -> &Rc<ScreenTarget> {
        &self.screen
    }

    fn teardown(&self) {
        self.alive.set(false);
        self.active_program.set(None);
        let screen: Rc<dyn RenderTarget> = self.screen.clone();
        *self.active_target.borrow_mut() = screen;
    }
}

/// Programs compiled when the context is created, for use by higher layers.
pub struct BuiltinPrograms {
    pub line: Rc<Program>,
    pub line_generic_with_colors: Rc<Program>,
    pub shape_element_list: Rc<Program>,
    pub sprite_list: Rc<Program>,
}

const BUILTIN_SOURCES: [(&str, &str, &str); 4] = [
    (
        "line",
        include_str!("shaders/line_vertex_shader_vs.glsl"),
        include_str!("shaders/line_vertex_shader_fs.glsl"),
    ),
    (
        "line_generic_with_colors",
        include_str!("shaders/line_generic_with_colors_vs.glsl"),
        include_str!("shaders/line_generic_with_colors_fs.glsl"),
    ),
    (
        "shape_element_list",
        include_str!("shaders/shape_element_list_vs.glsl"),
        include_str!("shaders/shape_element_list_fs.glsl"),
    ),
    (
        "sprite_list",
        include_str!("shaders/sprite_list_vs.glsl"),
        include_str!("shaders/sprite_list_fs.glsl"),
    ),
];

impl BuiltinPrograms {
    fn load(shared: &Rc<ContextShared>) -> Result<Self> {
        let compile = |index: usize| {
            let (name, vertex_shader, fragment_shader) = BUILTIN_SOURCES[index];
            trace!("compiling builtin program {}", name);
            Program::new(
                shared,
                &ProgramInfo {
                    vertex_shader,
                    fragment_shader: Some(fragment_shader),
                    ..Default::default()
                },
            )
            .map(Rc::new)
        };

        Ok(Self {
            line: compile(0)?,
            line_generic_with_colors: compile(1)?,
            shape_element_list: compile(2)?,
            sprite_list: compile(3)?,
        })
    }
}

/// A rendering context: the factory for every GPU resource and the owner of
/// the active program and render target tracking.
///
/// All resources created here, and the context itself, must stay on the
/// thread that owns the native context.
pub struct Context {
    shared: Rc<ContextShared>,
    builtins: Option<BuiltinPrograms>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("gl_version", &self.gl_version())
            .field("alive", &self.is_alive())
            .field("active_program", &self.active_program())
            .field("active_framebuffer", &self.active_framebuffer())
            .finish()
    }
}

impl Context {
    pub fn new(driver: impl Driver + 'static, info: &ContextInfo) -> Result<Self> {
        let driver: Box<dyn Driver> = Box::new(driver);
        let limits = Limits::query(driver.as_ref());
        let screen = Rc::new(ScreenTarget::new(Viewport::new(
            0,
            0,
            info.window_size[0] as i32,
            info.window_size[1] as i32,
        )));
        let active_target: Rc<dyn RenderTarget> = screen.clone();

        info!(
            "Created context, OpenGL {}.{}",
            limits.major_version, limits.minor_version
        );

        let shared = Rc::new(ContextShared {
            driver,
            alive: Cell::new(true),
            limits,
            active_program: Cell::new(None),
            active_target: RefCell::new(active_target),
            screen,
        });

        let builtins = if info.load_builtin_programs {
            Some(BuiltinPrograms::load(&shared)?)
        } else {
            None
        };

        Ok(Self { shared, builtins })
    }

    /// Wraps a current `glow` context.
    pub fn from_glow(gl: glow::Context, info: &ContextInfo) -> Result<Self> {
        Self::new(GlowDriver::new(gl), info)
    }

    pub fn driver(&self) -> &dyn Driver {
        self.shared.driver()
    }

    pub fn limits(&self) -> &Limits {
        self.shared.limits()
    }

    /// `(major, minor)`
    pub fn gl_version(&self) -> (i32, i32) {
        self.shared.limits().gl_version()
    }

    /// Polls the driver error flag. `None` when no error is pending.
    pub fn error(&self) -> Option<&'static str> {
        error_name(self.shared.driver().get_error())
    }

    pub fn is_alive(&self) -> bool {
        self.shared.is_alive()
    }

    /// Declares the native context gone. Resource destructors stop issuing
    /// driver calls from here on.
    pub fn mark_lost(&self) {
        self.shared.teardown();
    }

    pub fn builtins(&self) -> Option<&BuiltinPrograms> {
        self.builtins.as_ref()
    }

    pub fn active_program(&self) -> Option<ProgramHandle> {
        self.shared.active_program()
    }

    /// Handle of the active render target; `None` is the window.
    pub fn active_framebuffer(&self) -> Option<FramebufferHandle> {
        self.shared.active_target_handle()
    }

    /// Makes the window the active render target.
    pub fn activate_screen(&self) {
        let screen: Rc<dyn RenderTarget> = self.shared.screen().clone();
        self.shared.activate_target(screen);
    }

    pub fn screen_viewport(&self) -> Viewport {
        self.shared.screen().viewport()
    }

    /// Applied immediately when the window is the active target.
    pub fn set_screen_viewport(&self, viewport: impl Into<Viewport>) {
        let viewport = viewport.into();
        self.shared.screen().set_viewport(viewport);
        if self.shared.is_alive() && self.shared.is_active_target(None) {
            self.shared
                .driver()
                .viewport(viewport.x, viewport.y, viewport.width, viewport.height);
        }
    }

    pub fn screen_depth_mask(&self) -> bool {
        self.shared.screen().depth_mask()
    }

    /// Applied immediately when the window is the active target.
    pub fn set_screen_depth_mask(&self, flag: bool) {
        self.shared.screen().set_depth_mask(flag);
        if self.shared.is_alive() && self.shared.is_active_target(None) {
            self.shared.driver().depth_mask(flag);
        }
    }

    pub fn buffer(&self, info: &BufferInfo) -> Result<Rc<Buffer>> {
        self.check_alive()?;
        Buffer::new(&self.shared, info).map(Rc::new)
    }

    pub fn texture(&self, info: &TextureInfo) -> Result<Rc<Texture>> {
        self.check_alive()?;
        Texture::new(&self.shared, info).map(Rc::new)
    }

    pub fn framebuffer(&self, info: &FramebufferInfo) -> Result<Rc<Framebuffer>> {
        self.check_alive()?;
        Framebuffer::new(&self.shared, info).map(Rc::new)
    }

    pub fn program(&self, info: &ProgramInfo) -> Result<Rc<Program>> {
        self.check_alive()?;
        Program::new(&self.shared, info).map(Rc::new)
    }

    /// Like [`Context::program`], reading every stage from disk first.
    pub fn load_program(&self, paths: &ProgramPaths) -> Result<Rc<Program>> {
        let vertex_shader = read_source(paths.vertex_shader)?;
        let fragment_shader = paths.fragment_shader.map(read_source).transpose()?;
        let geometry_shader = paths.geometry_shader.map(read_source).transpose()?;

        self.program(&ProgramInfo {
            vertex_shader: &vertex_shader,
            fragment_shader: fragment_shader.as_deref(),
            geometry_shader: geometry_shader.as_deref(),
            defines: paths.defines,
        })
    }

    pub fn vertex_array(
        &self,
        program: &Rc<Program>,
        content: Vec<BufferDescription>,
        index_buffer: Option<Rc<Buffer>>,
    ) -> Result<VertexArray> {
        self.check_alive()?;
        VertexArray::new(&self.shared, Rc::clone(program), content, index_buffer)
    }

    fn check_alive(&self) -> Result<()> {
        self.shared.check_alive()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| GPUError::Io {
        path: path.to_path_buf(),
        source,
    })
}
