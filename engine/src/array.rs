//! Typed, length-tagged flat buffers that flow across ports and links.
//!
//! An [`Array`] always owns its storage. NuPIC-style engines often allow a
//! borrowed view alongside an owned buffer; this crate resolves that as an
//! owned-only representation — see DESIGN.md's "Array ownership" entry for
//! why.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of primitive element kinds an [`Array`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Byte,
    Bool,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElementType::U32 => "u32",
            ElementType::I32 => "i32",
            ElementType::U64 => "u64",
            ElementType::I64 => "i64",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::Byte => "byte",
            ElementType::Bool => "bool",
        };
        f.write_str(s)
    }
}

impl ElementType {
    /// Inverse of `Display`, used when parsing the persisted link frame.
    pub fn parse(s: &str) -> Result<ElementType> {
        match s {
            "u32" => Ok(ElementType::U32),
            "i32" => Ok(ElementType::I32),
            "u64" => Ok(ElementType::U64),
            "i64" => Ok(ElementType::I64),
            "f32" => Ok(ElementType::F32),
            "f64" => Ok(ElementType::F64),
            "byte" => Ok(ElementType::Byte),
            "bool" => Ok(ElementType::Bool),
            other => Err(EngineError::MalformedState(format!(
                "unknown element type '{other}'"
            ))),
        }
    }
}

/// A typed, owned, flat buffer. `count` is always `buffer.len()` in elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Array {
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Byte(Vec<u8>),
    Bool(Vec<bool>),
}

impl Array {
    /// A zero-filled array of `count` elements of `element_type`.
    pub fn zeros(element_type: ElementType, count: usize) -> Self {
        match element_type {
            ElementType::U32 => Array::U32(vec![0; count]),
            ElementType::I32 => Array::I32(vec![0; count]),
            ElementType::U64 => Array::U64(vec![0; count]),
            ElementType::I64 => Array::I64(vec![0; count]),
            ElementType::F32 => Array::F32(vec![0.0; count]),
            ElementType::F64 => Array::F64(vec![0.0; count]),
            ElementType::Byte => Array::Byte(vec![0; count]),
            ElementType::Bool => Array::Bool(vec![false; count]),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Array::U32(_) => ElementType::U32,
            Array::I32(_) => ElementType::I32,
            Array::U64(_) => ElementType::U64,
            Array::I64(_) => ElementType::I64,
            Array::F32(_) => ElementType::F32,
            Array::F64(_) => ElementType::F64,
            Array::Byte(_) => ElementType::Byte,
            Array::Bool(_) => ElementType::Bool,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Array::U32(v) => v.len(),
            Array::I32(v) => v.len(),
            Array::U64(v) => v.len(),
            Array::I64(v) => v.len(),
            Array::F32(v) => v.len(),
            Array::F64(v) => v.len(),
            Array::Byte(v) => v.len(),
            Array::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize in place, filling any new elements with the zero value.
    pub fn resize(&mut self, count: usize) {
        match self {
            Array::U32(v) => v.resize(count, 0),
            Array::I32(v) => v.resize(count, 0),
            Array::U64(v) => v.resize(count, 0),
            Array::I64(v) => v.resize(count, 0),
            Array::F32(v) => v.resize(count, 0.0),
            Array::F64(v) => v.resize(count, 0.0),
            Array::Byte(v) => v.resize(count, 0),
            Array::Bool(v) => v.resize(count, false),
        }
    }

    /// Copy `src`'s contents into `self` at `offset`, failing if the
    /// element types differ or the region doesn't fit.
    pub fn copy_into(&mut self, offset: usize, src: &Array) -> Result<()> {
        if self.element_type() != src.element_type() {
            return Err(EngineError::MalformedState(format!(
                "cannot copy {} array into {} array",
                src.element_type(),
                self.element_type()
            )));
        }
        macro_rules! copy_variant {
            ($dst:ident, $src:ident) => {{
                let end = offset + $src.len();
                if end > $dst.len() {
                    return Err(EngineError::MalformedState(format!(
                        "copy_into out of bounds: offset {} + len {} > dst len {}",
                        offset,
                        $src.len(),
                        $dst.len()
                    )));
                }
                $dst[offset..end].clone_from_slice($src);
            }};
        }
        match (self, src) {
            (Array::U32(d), Array::U32(s)) => copy_variant!(d, s),
            (Array::I32(d), Array::I32(s)) => copy_variant!(d, s),
            (Array::U64(d), Array::U64(s)) => copy_variant!(d, s),
            (Array::I64(d), Array::I64(s)) => copy_variant!(d, s),
            (Array::F32(d), Array::F32(s)) => copy_variant!(d, s),
            (Array::F64(d), Array::F64(s)) => copy_variant!(d, s),
            (Array::Byte(d), Array::Byte(s)) => copy_variant!(d, s),
            (Array::Bool(d), Array::Bool(s)) => copy_variant!(d, s),
            _ => unreachable!("element type check above guarantees matching variants"),
        }
        Ok(())
    }

    pub fn as_f64(&self) -> Result<&[f64]> {
        match self {
            Array::F64(v) => Ok(v),
            other => Err(wrong_type("f64", other.element_type())),
        }
    }

    pub fn as_f64_mut(&mut self) -> Result<&mut [f64]> {
        match self {
            Array::F64(v) => Ok(v),
            other => Err(wrong_type("f64", other.element_type())),
        }
    }

    pub fn as_f32(&self) -> Result<&[f32]> {
        match self {
            Array::F32(v) => Ok(v),
            other => Err(wrong_type("f32", other.element_type())),
        }
    }

    pub fn as_i32(&self) -> Result<&[i32]> {
        match self {
            Array::I32(v) => Ok(v),
            other => Err(wrong_type("i32", other.element_type())),
        }
    }

    pub fn as_i64(&self) -> Result<&[i64]> {
        match self {
            Array::I64(v) => Ok(v),
            other => Err(wrong_type("i64", other.element_type())),
        }
    }

    pub fn as_u32(&self) -> Result<&[u32]> {
        match self {
            Array::U32(v) => Ok(v),
            other => Err(wrong_type("u32", other.element_type())),
        }
    }

    pub fn as_u64(&self) -> Result<&[u64]> {
        match self {
            Array::U64(v) => Ok(v),
            other => Err(wrong_type("u64", other.element_type())),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Array::Byte(v) => Ok(v),
            other => Err(wrong_type("byte", other.element_type())),
        }
    }

    pub fn as_bool(&self) -> Result<&[bool]> {
        match self {
            Array::Bool(v) => Ok(v),
            other => Err(wrong_type("bool", other.element_type())),
        }
    }
}

fn wrong_type(expected: &'static str, found: ElementType) -> EngineError {
    EngineError::ParameterTypeMismatch {
        name: "<array>".to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_has_requested_count_and_type() {
        let a = Array::zeros(ElementType::F64, 64);
        assert_eq!(a.len(), 64);
        assert_eq!(a.element_type(), ElementType::F64);
        assert_eq!(a.as_f64().unwrap(), &[0.0; 64][..]);
    }

    #[test]
    fn test_equality_compares_type_count_and_contents() {
        let a = Array::F64(vec![1.0, 2.0, 3.0]);
        let b = Array::F64(vec![1.0, 2.0, 3.0]);
        let c = Array::F64(vec![1.0, 2.0, 4.0]);
        let d = Array::F32(vec![1.0, 2.0, 3.0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_copy_into_writes_at_offset() {
        let mut dst = Array::F64(vec![0.0; 4]);
        let src = Array::F64(vec![9.0, 9.0]);
        dst.copy_into(2, &src).unwrap();
        assert_eq!(dst.as_f64().unwrap(), &[0.0, 0.0, 9.0, 9.0]);
    }

    #[test]
    fn test_copy_into_rejects_type_mismatch() {
        let mut dst = Array::F64(vec![0.0; 2]);
        let src = Array::I32(vec![1, 2]);
        assert!(dst.copy_into(0, &src).is_err());
    }

    #[test]
    fn test_copy_into_rejects_out_of_bounds() {
        let mut dst = Array::F64(vec![0.0; 2]);
        let src = Array::F64(vec![1.0, 2.0]);
        assert!(dst.copy_into(1, &src).is_err());
    }

    #[test]
    fn test_element_type_parse_round_trips_with_display() {
        for ty in [
            ElementType::U32,
            ElementType::I32,
            ElementType::U64,
            ElementType::I64,
            ElementType::F32,
            ElementType::F64,
            ElementType::Byte,
            ElementType::Bool,
        ] {
            assert_eq!(ElementType::parse(&ty.to_string()).unwrap(), ty);
        }
        assert!(ElementType::parse("nope").is_err());
    }
}
