use super::error::{GPUError, Result};
use super::structs::ShaderType;

/// GLSL text for one stage, with the few pieces of it this crate reads:
/// the `#version` pragma, `#define` lines and `out` declarations.
///
/// The scan is line based and assumes one statement per line.
#[derive(Clone, Debug)]
pub struct ShaderSource {
    source: String,
    stage: ShaderType,
    version: u32,
    out_attributes: Vec<String>,
}

impl ShaderSource {
    pub fn new(source: &str, stage: ShaderType) -> Result<Self> {
        let source = source.trim().to_string();
        let version = find_version(&source).ok_or(GPUError::MissingVersion)?;
        let out_attributes = source.lines().filter_map(parse_out_attribute).collect();

        Ok(Self {
            source,
            stage,
            version,
            out_attributes,
        })
    }

    pub fn stage(&self) -> ShaderType {
        self.stage
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Names declared `out` in this stage, in declaration order.
    pub fn out_attributes(&self) -> &[String] {
        &self.out_attributes
    }

    /// The source with `defines` applied. Unmatched defines are ignored.
    pub fn get_source(&self, defines: &[(&str, &str)]) -> String {
        if defines.is_empty() {
            return self.source.clone();
        }

        let lines: Vec<&str> = self.source.lines().collect();
        apply_defines(&lines, defines).join("\n")
    }
}

fn find_version(source: &str) -> Option<u32> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("#version"))
        .find_map(|line| line.split_whitespace().nth(1)?.parse().ok())
}

fn parse_out_attribute(line: &str) -> Option<String> {
    if !line.trim_start().starts_with("out ") {
        return None;
    }
    line.split_whitespace()
        .nth(2)
        .map(|name| name.replace(';', ""))
}

/// Rewrites `#define NAME VALUE` lines whose name has a non-empty override.
pub fn apply_defines(lines: &[&str], defines: &[(&str, &str)]) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let trimmed = line.trim();
            if !trimmed.starts_with("#define") {
                return line.to_string();
            }

            let override_value = trimmed.split_whitespace().nth(1).and_then(|name| {
                defines
                    .iter()
                    .find(|(key, value)| *key == name && !value.is_empty())
                    .map(|(key, value)| format!("#define {} {}", key, value))
            });
            override_value.unwrap_or_else(|| line.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "
        #version 330
        #define NUM_LIGHTS 4
        #define SCALE
        in vec2 in_pos;
        out vec2 out_pos;
        out float out_size;
        void main() {
            out_pos = in_pos;
        }
    ";

    #[test]
    fn version_is_required() {
        assert!(matches!(
            ShaderSource::new("void main() {}", ShaderType::Vertex),
            Err(GPUError::MissingVersion)
        ));
        let src = ShaderSource::new(VS, ShaderType::Vertex).unwrap();
        assert_eq!(src.version(), 330);
    }

    #[test]
    fn finds_out_attributes() {
        let src = ShaderSource::new(VS, ShaderType::Vertex).unwrap();
        assert_eq!(src.out_attributes(), &["out_pos", "out_size"]);
    }

    #[test]
    fn geometry_stage_out_attributes_are_scanned() {
        let gs = "#version 330\nlayout(points) in;\nout vec4 gs_color;\nvoid main() {}";
        let src = ShaderSource::new(gs, ShaderType::Geometry).unwrap();
        assert_eq!(src.out_attributes(), &["gs_color"]);
    }

    #[test]
    fn defines_are_rewritten() {
        let src = ShaderSource::new(VS, ShaderType::Vertex).unwrap();
        let out = src.get_source(&[("NUM_LIGHTS", "8"), ("SCALE", ""), ("MISSING", "1")]);
        assert!(out.contains("#define NUM_LIGHTS 8"));
        assert!(!out.contains("NUM_LIGHTS 4"));
        assert!(out.contains("#define SCALE"));
        assert_eq!(src.get_source(&[]), VS.trim());
    }
}
