use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use super::context::ContextShared;
use super::driver::{Driver, GLenum, VertexArrayHandle};
use super::error::{GPUError, Result};
use super::structs::PrimitiveMode;
use super::{Buffer, BufferDescription, Program};

/// Binds a program's vertex attributes to the buffers that feed them.
pub struct VertexArray {
    shared: Rc<ContextShared>,
    handle: VertexArrayHandle,
    program: Rc<Program>,
    content: Vec<BufferDescription>,
    index_buffer: Option<Rc<Buffer>>,
    num_vertices: usize,
}

impl VertexArray {
    pub(crate) fn new(
        shared: &Rc<ContextShared>,
        program: Rc<Program>,
        content: Vec<BufferDescription>,
        index_buffer: Option<Rc<Buffer>>,
    ) -> Result<Self> {
        let driver = shared.driver();
        let handle = driver
            .create_vertex_array()
            .map_err(GPUError::creation("vertex array"))?;

        let mut vertex_array = Self {
            shared: Rc::clone(shared),
            handle,
            program,
            content,
            index_buffer,
            num_vertices: 0,
        };

        driver.bind_vertex_array(Some(handle));
        let layout = bind_layout(driver, &vertex_array.program, &vertex_array.content);
        if layout.is_ok() {
            if let Some(ibo) = &vertex_array.index_buffer {
                ibo.bind(glow::ELEMENT_ARRAY_BUFFER);
            }
        }
        driver.bind_vertex_array(None);
        vertex_array.num_vertices = layout?;

        debug!(
            "Created vertex array {} with {} vertices",
            handle, vertex_array.num_vertices
        );
        Ok(vertex_array)
    }

    pub fn handle(&self) -> VertexArrayHandle {
        self.handle
    }

    pub fn program(&self) -> &Rc<Program> {
        &self.program
    }

    pub fn content(&self) -> &[BufferDescription] {
        &self.content
    }

    pub fn index_buffer(&self) -> Option<&Rc<Buffer>> {
        self.index_buffer.as_ref()
    }

    /// Vertices in the largest per-vertex buffer.
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Draws into the active render target. With an index buffer the
    /// indices are read as 32-bit unsigned integers. Nothing is drawn once
    /// the context is gone.
    pub fn render(&self, mode: PrimitiveMode, instances: i32) {
        if !self.shared.is_alive() {
            debug!("skipping draw of vertex array {}: context lost", self.handle);
            return;
        }
        let driver = self.shared.driver();
        driver.bind_vertex_array(Some(self.handle));
        self.program.activate();

        match &self.index_buffer {
            Some(ibo) => {
                let count = (ibo.size() / 4) as i32;
                driver.draw_elements_instanced(
                    mode.into(),
                    count,
                    glow::UNSIGNED_INT,
                    0,
                    instances,
                );
            }
            None => {
                driver.draw_arrays_instanced(mode.into(), 0, self.num_vertices as i32, instances)
            }
        }
    }

    /// Runs the vertex stages with rasterization disabled, capturing the
    /// program's out attributes into `output`.
    pub fn transform(&self, output: &Buffer, mode: PrimitiveMode) {
        if !self.shared.is_alive() {
            debug!("skipping transform of vertex array {}: context lost", self.handle);
            return;
        }
        let driver = self.shared.driver();
        let capture = self
            .program
            .geometry_output()
            .map(feedback_primitive)
            .unwrap_or_else(|| feedback_primitive(mode));

        driver.enable(glow::RASTERIZER_DISCARD);
        output.bind_base(glow::TRANSFORM_FEEDBACK_BUFFER, 0);
        driver.bind_vertex_array(Some(self.handle));
        self.program.activate();

        driver.begin_transform_feedback(capture);
        driver.draw_arrays_instanced(mode.into(), 0, self.num_vertices as i32, 1);
        driver.end_transform_feedback();

        driver.bind_buffer_base(glow::TRANSFORM_FEEDBACK_BUFFER, 0, None);
        driver.disable(glow::RASTERIZER_DISCARD);
    }
}

/// Points, lines or triangles: the only modes transform feedback records.
fn feedback_primitive(mode: PrimitiveMode) -> GLenum {
    match mode {
        PrimitiveMode::Points => glow::POINTS,
        PrimitiveMode::Lines
        | PrimitiveMode::LinesAdjacency
        | PrimitiveMode::LineStrip
        | PrimitiveMode::LineStripAdjacency => glow::LINES,
        PrimitiveMode::Triangles
        | PrimitiveMode::TrianglesAdjacency
        | PrimitiveMode::TriangleStrip
        | PrimitiveMode::TriangleStripAdjacency
        | PrimitiveMode::TriangleFan => glow::TRIANGLES,
    }
}

/// Registers every attribute pointer and returns the derived vertex count.
/// Expects the vertex array to be bound.
fn bind_layout(
    driver: &dyn Driver,
    program: &Program,
    content: &[BufferDescription],
) -> Result<usize> {
    let mut num_vertices: Option<usize> = None;

    for description in content {
        let stride = description.stride();
        if description.is_instanced() {
            if num_vertices.is_none() {
                return Err(GPUError::PerInstanceFirst);
            }
        } else {
            let count = description.buffer().size() / stride;
            num_vertices = Some(num_vertices.map_or(count, |n| n.max(count)));
        }

        description.buffer().bind(glow::ARRAY_BUFFER);
        for (name, format, offset) in description.layout() {
            let location = driver
                .get_attrib_location(program.handle(), name)
                .ok_or_else(|| GPUError::AttributeNotFound(name.to_string()))?;

            driver.vertex_attrib_pointer(
                location,
                format.components as i32,
                format.kind.gl_type(),
                description.is_normalized(name),
                stride as i32,
                offset as i32,
            );
            if description.is_instanced() {
                driver.vertex_attrib_divisor(location, 1);
            }
            driver.enable_vertex_attrib_array(location);
        }
    }

    Ok(num_vertices.unwrap_or(0))
}

impl fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexArray")
            .field("handle", &self.handle)
            .field("program", &self.program.handle())
            .field("num_vertices", &self.num_vertices)
            .field("indexed", &self.index_buffer.is_some())
            .finish()
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        if !self.shared.is_alive() {
            return;
        }
        self.shared.driver().delete_vertex_array(self.handle);
        trace!("Deleted vertex array {}", self.handle);
    }
}
