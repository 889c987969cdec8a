//! Parses a region's parameter string into a typed [`ValueMap`].
//!
//! Grammar: comma-separated `key=value` pairs, where `value` is either a
//! bare scalar (`42`, `3.5`, `true`, `hello`) or a bracketed list of
//! scalars of one kind (`[1,2,3]`, `[0.5,1.5]`). There is no nesting and
//! no quoting; a bare string value runs to the next top-level comma or the
//! end of input. This is new code, not a translation of anything retrieved
//! — see DESIGN.md.

use std::collections::HashMap;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    I64(i64),
    F64(f64),
    Bool(bool),
    String(String),
    ArrayI64(Vec<i64>),
    ArrayF64(Vec<f64>),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::I64(_) => "i64",
            ParamValue::F64(_) => "f64",
            ParamValue::Bool(_) => "bool",
            ParamValue::String(_) => "string",
            ParamValue::ArrayI64(_) => "array<i64>",
            ParamValue::ArrayF64(_) => "array<f64>",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    values: HashMap<String, ParamValue>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `"key=value,key2=value2"`. An empty or all-whitespace string
    /// parses to an empty map.
    pub fn parse(input: &str) -> Result<Self> {
        let mut values = HashMap::new();
        for pair in split_top_level(input.trim(), ',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, raw_value) = pair.split_once('=').ok_or_else(|| {
                EngineError::MalformedState(format!("parameter clause '{pair}' is missing '='"))
            })?;
            let key = key.trim().to_string();
            values.insert(key, parse_value(raw_value.trim())?);
        }
        Ok(Self { values })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get_i64(&self, name: &str) -> Result<i64> {
        match self.values.get(name) {
            Some(ParamValue::I64(v)) => Ok(*v),
            Some(other) => Err(type_mismatch(name, "i64", other)),
            None => Err(EngineError::UnknownParameter(name.to_string())),
        }
    }

    pub fn get_f64(&self, name: &str) -> Result<f64> {
        match self.values.get(name) {
            Some(ParamValue::F64(v)) => Ok(*v),
            Some(ParamValue::I64(v)) => Ok(*v as f64),
            Some(other) => Err(type_mismatch(name, "f64", other)),
            None => Err(EngineError::UnknownParameter(name.to_string())),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.values.get(name) {
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(other) => Err(type_mismatch(name, "bool", other)),
            None => Err(EngineError::UnknownParameter(name.to_string())),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<&str> {
        match self.values.get(name) {
            Some(ParamValue::String(v)) => Ok(v.as_str()),
            Some(other) => Err(type_mismatch(name, "string", other)),
            None => Err(EngineError::UnknownParameter(name.to_string())),
        }
    }

    pub fn get_array_f64(&self, name: &str) -> Result<&[f64]> {
        match self.values.get(name) {
            Some(ParamValue::ArrayF64(v)) => Ok(v.as_slice()),
            Some(other) => Err(type_mismatch(name, "array<f64>", other)),
            None => Err(EngineError::UnknownParameter(name.to_string())),
        }
    }

    pub fn get_array_i64(&self, name: &str) -> Result<&[i64]> {
        match self.values.get(name) {
            Some(ParamValue::ArrayI64(v)) => Ok(v.as_slice()),
            Some(other) => Err(type_mismatch(name, "array<i64>", other)),
            None => Err(EngineError::UnknownParameter(name.to_string())),
        }
    }
}

fn type_mismatch(name: &str, expected: &str, found: &ParamValue) -> EngineError {
    EngineError::ParameterTypeMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
}

fn parse_value(raw: &str) -> Result<ParamValue> {
    if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return parse_array(inner);
    }
    Ok(parse_scalar(raw))
}

fn parse_array(inner: &str) -> Result<ParamValue> {
    let items: Vec<&str> = split_top_level(inner, ',')
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.iter().all(|s| s.parse::<i64>().is_ok()) {
        let parsed = items.iter().map(|s| s.parse::<i64>().unwrap()).collect();
        return Ok(ParamValue::ArrayI64(parsed));
    }
    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let v = item
            .parse::<f64>()
            .map_err(|_| EngineError::MalformedState(format!("'{item}' is not a number")))?;
        parsed.push(v);
    }
    Ok(ParamValue::ArrayF64(parsed))
}

fn parse_scalar(raw: &str) -> ParamValue {
    if raw == "true" {
        return ParamValue::Bool(true);
    }
    if raw == "false" {
        return ParamValue::Bool(false);
    }
    if let Ok(v) = raw.parse::<i64>() {
        return ParamValue::I64(v);
    }
    if let Ok(v) = raw.parse::<f64>() {
        return ParamValue::F64(v);
    }
    ParamValue::String(raw.to_string())
}

/// Splits `input` on `sep` while ignoring separators inside `[...]`.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_mixed_scalars() {
        let vm = ValueMap::parse("count=5,rate=0.25,verbose=true,name=sp1").unwrap();
        assert_eq!(vm.get_i64("count").unwrap(), 5);
        assert_eq!(vm.get_f64("rate").unwrap(), 0.25);
        assert!(vm.get_bool("verbose").unwrap());
        assert_eq!(vm.get_string("name").unwrap(), "sp1");
    }

    #[test]
    fn test_parses_bracketed_arrays() {
        let vm = ValueMap::parse("dims=[32,32,1],weights=[0.1,0.2]").unwrap();
        assert_eq!(vm.get_array_i64("dims").unwrap(), &[32, 32, 1]);
        assert_eq!(vm.get_array_f64("weights").unwrap(), &[0.1, 0.2]);
    }

    #[test]
    fn test_empty_string_parses_empty_map() {
        let vm = ValueMap::parse("").unwrap();
        assert!(!vm.contains("anything"));
    }

    #[test]
    fn test_missing_key_is_unknown_parameter() {
        let vm = ValueMap::parse("a=1").unwrap();
        assert!(matches!(vm.get_i64("b"), Err(EngineError::UnknownParameter(_))));
    }

    #[test]
    fn test_wrong_type_is_parameter_type_mismatch() {
        let vm = ValueMap::parse("a=hello").unwrap();
        assert!(matches!(
            vm.get_i64("a"),
            Err(EngineError::ParameterTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_clause_is_rejected() {
        assert!(ValueMap::parse("no-equals-here").is_err());
    }
}
