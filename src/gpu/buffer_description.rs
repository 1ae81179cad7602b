use std::collections::HashSet;
use std::rc::Rc;
use std::str::FromStr;

#[cfg(feature = "gloam-serde")]
use serde::{Deserialize, Serialize};

use super::driver::GLenum;
use super::error::{GPUError, Result};
use super::Buffer;

/// Element type of a vertex attribute: `f`, `i` or `B` in a format string.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub enum AttributeKind {
    Float,
    Int,
    UnsignedByte,
}

impl AttributeKind {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'f' => Some(AttributeKind::Float),
            'i' => Some(AttributeKind::Int),
            'B' => Some(AttributeKind::UnsignedByte),
            _ => None,
        }
    }

    pub fn gl_type(self) -> GLenum {
        match self {
            AttributeKind::Float => glow::FLOAT,
            AttributeKind::Int => glow::INT,
            AttributeKind::UnsignedByte => glow::UNSIGNED_BYTE,
        }
    }

    /// Bytes per component.
    pub fn size(self) -> usize {
        match self {
            AttributeKind::Float => std::mem::size_of::<f32>(),
            AttributeKind::Int => std::mem::size_of::<i32>(),
            AttributeKind::UnsignedByte => std::mem::size_of::<u8>(),
        }
    }
}

/// One token of a format string, e.g. `3f`.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "gloam-serde", derive(Serialize, Deserialize))]
pub struct AttributeFormat {
    pub components: u8,
    pub kind: AttributeKind,
}

impl AttributeFormat {
    pub fn byte_size(&self) -> usize {
        self.components as usize * self.kind.size()
    }
}

impl FromStr for AttributeFormat {
    type Err = GPUError;

    fn from_str(token: &str) -> Result<Self> {
        let invalid = || GPUError::InvalidAttributeFormat(token.to_string());
        let mut chars = token.chars();
        let (Some(count), Some(kind), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid());
        };

        let components = match count {
            '1'..='4' => count as u8 - b'0',
            _ => return Err(invalid()),
        };
        let kind = AttributeKind::from_char(kind).ok_or_else(invalid)?;
        Ok(Self { components, kind })
    }
}

/// Parses a whitespace separated format string such as `"2f 4B"`.
pub fn parse_formats(formats: &str) -> Result<Vec<AttributeFormat>> {
    formats.split_whitespace().map(str::parse).collect()
}

/// A buffer paired with a description of the interleaved attributes it
/// holds, ready to be bound into a [`VertexArray`](super::VertexArray).
///
/// ```ignore
/// // x, y position followed by an rgba color in bytes, normalized to 0..1
/// let desc = BufferDescription::new(vbo, "2f 4B", &["in_pos", "in_color"], &["in_color"], false)?;
/// ```
#[derive(Clone, Debug)]
pub struct BufferDescription {
    buffer: Rc<Buffer>,
    formats: Vec<AttributeFormat>,
    attributes: Vec<String>,
    normalized: HashSet<String>,
    instanced: bool,
}

impl BufferDescription {
    pub fn new(
        buffer: Rc<Buffer>,
        formats: &str,
        attributes: &[&str],
        normalized: &[&str],
        instanced: bool,
    ) -> Result<Self> {
        if let Some(missing) = normalized.iter().find(|n| !attributes.contains(*n)) {
            return Err(GPUError::NormalizedNotInAttributes(missing.to_string()));
        }

        let tokens: Vec<&str> = formats.split_whitespace().collect();
        if tokens.len() != attributes.len() {
            return Err(GPUError::FormatCountMismatch {
                formats: tokens.len(),
                attributes: attributes.len(),
            });
        }
        if tokens.is_empty() {
            return Err(GPUError::EmptyBufferDescription);
        }

        let formats = tokens
            .iter()
            .map(|token| token.parse())
            .collect::<Result<Vec<AttributeFormat>>>()?;

        Ok(Self {
            buffer,
            formats,
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            normalized: normalized.iter().map(|n| n.to_string()).collect(),
            instanced,
        })
    }

    pub fn buffer(&self) -> &Rc<Buffer> {
        &self.buffer
    }

    pub fn formats(&self) -> &[AttributeFormat] {
        &self.formats
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn is_normalized(&self, attribute: &str) -> bool {
        self.normalized.contains(attribute)
    }

    pub fn is_instanced(&self) -> bool {
        self.instanced
    }

    /// Bytes between consecutive vertices.
    pub fn stride(&self) -> usize {
        self.formats.iter().map(AttributeFormat::byte_size).sum()
    }

    /// `(name, format, byte offset)` for each attribute in buffer order.
    pub fn layout(&self) -> impl Iterator<Item = (&str, AttributeFormat, usize)> + '_ {
        self.attributes
            .iter()
            .zip(&self.formats)
            .scan(0usize, |offset, (name, format)| {
                let current = *offset;
                *offset += format.byte_size();
                Some((name.as_str(), *format, current))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tokens() {
        let formats = parse_formats("2f 4B 1i").unwrap();
        assert_eq!(
            formats,
            vec![
                AttributeFormat { components: 2, kind: AttributeKind::Float },
                AttributeFormat { components: 4, kind: AttributeKind::UnsignedByte },
                AttributeFormat { components: 1, kind: AttributeKind::Int },
            ]
        );
        assert_eq!(formats.iter().map(|f| f.byte_size()).sum::<usize>(), 16);
    }

    #[test]
    fn rejects_bad_tokens() {
        for token in ["5f", "0f", "2d", "2", "2ff", "f2"] {
            assert!(
                matches!(
                    token.parse::<AttributeFormat>(),
                    Err(GPUError::InvalidAttributeFormat(_))
                ),
                "{token} should not parse"
            );
        }
    }

    #[test]
    fn byte_attributes_are_one_byte_per_component() {
        let format: AttributeFormat = "3B".parse().unwrap();
        assert_eq!(format.byte_size(), 3);
        assert_eq!(format.kind.gl_type(), glow::UNSIGNED_BYTE);
    }
}
