use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace, warn};

use super::context::ContextShared;
use super::driver::{Driver, GLenum, ProgramHandle, ShaderHandle};
use super::error::{GPUError, Result};
use super::shader_source::ShaderSource;
use super::structs::{PrimitiveMode, ProgramInfo, ShaderType};
use super::tables::UniformType;
use super::uniform::{Uniform, UniformValue};

/// Primitive metadata reported for programs with a geometry stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryInfo {
    pub input: GLenum,
    pub output: GLenum,
    pub vertices: i32,
}

/// A compiled and linked shader program.
///
/// Programs without a fragment stage are treated as transform feedback
/// programs: the `out` declarations of the last vertex-processing stage are
/// registered as interleaved varyings before linking.
pub struct Program {
    shared: Rc<ContextShared>,
    handle: ProgramHandle,
    /// Flagged for deletion after link; detached when the program goes away.
    shaders: Vec<ShaderHandle>,
    uniforms: Vec<Uniform>,
    uniform_index: HashMap<String, usize>,
    skipped_uniforms: Vec<String>,
    out_attributes: Vec<String>,
    geometry: Option<GeometryInfo>,
}

/// Deletes a half-built program if construction bails out early.
struct ProgramGuard<'a> {
    driver: &'a dyn Driver,
    program: ProgramHandle,
    shaders: Vec<ShaderHandle>,
    armed: bool,
}

impl<'a> ProgramGuard<'a> {
    fn disarm(mut self) -> Vec<ShaderHandle> {
        self.armed = false;
        std::mem::take(&mut self.shaders)
    }
}

impl<'a> Drop for ProgramGuard<'a> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for shader in self.shaders.drain(..) {
            self.driver.detach_shader(self.program, shader);
            self.driver.delete_shader(shader);
        }
        self.driver.delete_program(self.program);
    }
}

impl Program {
    pub(crate) fn new(shared: &Rc<ContextShared>, info: &ProgramInfo) -> Result<Self> {
        let vertex = ShaderSource::new(info.vertex_shader, ShaderType::Vertex)?;
        let fragment = info
            .fragment_shader
            .map(|src| ShaderSource::new(src, ShaderType::Fragment))
            .transpose()?;
        let geometry = info
            .geometry_shader
            .map(|src| ShaderSource::new(src, ShaderType::Geometry))
            .transpose()?;

        let out_attributes = match (&fragment, &geometry) {
            (Some(_), _) => Vec::new(),
            (None, Some(geometry)) => geometry.out_attributes().to_vec(),
            (None, None) => vertex.out_attributes().to_vec(),
        };

        let driver = shared.driver();
        let handle = driver.create_program().map_err(GPUError::creation("program"))?;
        let mut guard = ProgramGuard {
            driver,
            program: handle,
            shaders: Vec::new(),
            armed: true,
        };

        for source in [Some(&vertex), fragment.as_ref(), geometry.as_ref()]
            .into_iter()
            .flatten()
        {
            let shader = compile_shader(driver, source, info.defines)?;
            driver.attach_shader(handle, shader);
            guard.shaders.push(shader);
        }

        if !out_attributes.is_empty() {
            let varyings: Vec<&str> = out_attributes.iter().map(String::as_str).collect();
            driver.transform_feedback_varyings(handle, &varyings, glow::INTERLEAVED_ATTRIBS);
        }

        driver.link_program(handle);
        if !driver.get_program_link_status(handle) {
            return Err(GPUError::ProgramLink(driver.get_program_info_log(handle)));
        }

        let geometry = geometry.map(|_| GeometryInfo {
            input: driver.get_program_parameter_i32(handle, glow::GEOMETRY_INPUT_TYPE) as GLenum,
            output: driver.get_program_parameter_i32(handle, glow::GEOMETRY_OUTPUT_TYPE) as GLenum,
            vertices: driver.get_program_parameter_i32(handle, glow::GEOMETRY_VERTICES_OUT),
        });

        for shader in &guard.shaders {
            driver.delete_shader(*shader);
        }

        let mut program = Self {
            shared: Rc::clone(shared),
            handle,
            shaders: Vec::new(),
            uniforms: Vec::new(),
            uniform_index: HashMap::new(),
            skipped_uniforms: Vec::new(),
            out_attributes,
            geometry,
        };

        // From here on Drop owns the cleanup.
        program.shaders = guard.disarm();
        program.introspect_uniforms()?;

        debug!(
            "Created program {} with {} uniforms",
            handle,
            program.uniforms.len()
        );
        Ok(program)
    }

    fn introspect_uniforms(&mut self) -> Result<()> {
        let driver = self.shared.driver();
        let count = driver.get_active_uniforms(self.handle);

        for index in 0..count {
            let Some(active) = driver.get_active_uniform(self.handle, index) else {
                continue;
            };

            let Some(location) = driver.get_uniform_location(self.handle, &active.name) else {
                // Lives in a uniform block.
                warn!(
                    "Uniform {} (type {:#06x}, size {}) has no location, skipped",
                    active.name, active.utype, active.size
                );
                self.skipped_uniforms.push(active.name);
                continue;
            };

            let name = active
                .name
                .strip_suffix("[0]")
                .unwrap_or(&active.name)
                .to_string();
            let utype = UniformType::from_gl(active.utype).ok_or_else(|| {
                GPUError::UnsupportedUniformType {
                    name: name.clone(),
                    gl_type: active.utype,
                }
            })?;

            let uniform = Uniform::new(
                &self.shared,
                self.handle,
                name.clone(),
                location,
                utype,
                active.size.max(1) as usize,
            )?;
            self.uniform_index.insert(name, self.uniforms.len());
            self.uniforms.push(uniform);
        }

        Ok(())
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Names registered as transform feedback varyings, in capture order.
    pub fn out_attributes(&self) -> &[String] {
        &self.out_attributes
    }

    pub fn geometry_info(&self) -> Option<GeometryInfo> {
        self.geometry
    }

    pub fn geometry_input(&self) -> Option<PrimitiveMode> {
        self.geometry.and_then(|g| PrimitiveMode::from_gl(g.input))
    }

    pub fn geometry_output(&self) -> Option<PrimitiveMode> {
        self.geometry.and_then(|g| PrimitiveMode::from_gl(g.output))
    }

    /// Maximum number of vertices the geometry stage may emit, 0 without one.
    pub fn geometry_vertices(&self) -> i32 {
        self.geometry.map(|g| g.vertices).unwrap_or(0)
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniform_index.get(name).map(|&i| &self.uniforms[i])
    }

    /// Uniforms in introspection order.
    pub fn uniforms(&self) -> impl Iterator<Item = &Uniform> {
        self.uniforms.iter()
    }

    /// Active uniforms that could not be bound, e.g. uniform block members.
    pub fn skipped_uniforms(&self) -> &[String] {
        &self.skipped_uniforms
    }

    pub fn get(&self, name: &str) -> Result<UniformValue> {
        self.find(name)?.get()
    }

    pub fn set(&self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.find(name)?.set(&value.into())
    }

    /// Makes this the active program. Does nothing if it already is.
    pub fn activate(&self) {
        self.shared.use_program(self.handle);
    }

    pub fn is_active(&self) -> bool {
        self.shared.active_program() == Some(self.handle)
    }

    fn find(&self, name: &str) -> Result<&Uniform> {
        self.uniform(name)
            .ok_or_else(|| GPUError::UniformNotFound(name.to_string()))
    }
}

fn compile_shader(
    driver: &dyn Driver,
    source: &ShaderSource,
    defines: &[(&str, &str)],
) -> Result<ShaderHandle> {
    let shader = driver
        .create_shader(source.stage().into())
        .map_err(GPUError::creation("shader"))?;
    driver.shader_source(shader, &source.get_source(defines));
    driver.compile_shader(shader);

    if !driver.get_shader_compile_status(shader) {
        let log = driver.get_shader_info_log(shader);
        driver.delete_shader(shader);
        return Err(GPUError::ShaderCompile {
            stage: source.stage(),
            log,
        });
    }
    Ok(shader)
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("handle", &self.handle)
            .field("uniforms", &self.uniforms)
            .field("out_attributes", &self.out_attributes)
            .field("geometry", &self.geometry)
            .finish()
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        self.shared.release_program(self.handle);
        if !self.shared.is_alive() {
            return;
        }

        let driver = self.shared.driver();
        for shader in &self.shaders {
            driver.detach_shader(self.handle, *shader);
        }
        driver.delete_program(self.handle);
        trace!("Deleted program {}", self.handle);
    }
}
