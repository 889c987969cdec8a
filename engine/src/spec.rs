//! Declarative description of a Region type: its ports and parameters.
//!
//! A [`RegionSpec`] is produced once per `nodeType` (via
//! [`crate::region::RegionImpl::create_spec`]) and cached by the factory —
//! see `factory.rs`.

use crate::array::ElementType;

/// Read/write access a parameter exposes to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamAccess {
    ReadOnly,
    ReadWrite,
    CreateOnly,
}

/// Declarative description of one input or output port.
#[derive(Debug, Clone)]
pub struct PortSpec {
    pub name: String,
    pub element_type: ElementType,
    /// `0` means wildcard: ask the impl at init time via
    /// [`crate::region::RegionImpl::get_node_output_element_count`].
    pub count: usize,
    pub required: bool,
    pub region_level: bool,
    /// At most one input and at most one output per region may set this.
    pub default_flag: bool,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, element_type: ElementType, count: usize) -> Self {
        Self {
            name: name.into(),
            element_type,
            count,
            required: true,
            region_level: false,
            default_flag: false,
        }
    }

    pub fn wildcard(name: impl Into<String>, element_type: ElementType) -> Self {
        Self::new(name, element_type, 0)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn as_default(mut self) -> Self {
        self.default_flag = true;
        self
    }
}

/// Declarative description of one parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub element_type: ElementType,
    /// `1` for a scalar parameter; `>1`/`0` (wildcard) for an array parameter.
    pub count: usize,
    pub constraints: String,
    pub default: Option<String>,
    pub access: ParamAccess,
}

impl ParamSpec {
    pub fn scalar(name: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            name: name.into(),
            element_type,
            count: 1,
            constraints: String::new(),
            default: None,
            access: ParamAccess::ReadWrite,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.access = ParamAccess::ReadOnly;
        self
    }
}

/// Ordered catalog of input specs, output specs, and parameter specs for a
/// `nodeType`. Produced once and cached by the factory.
#[derive(Debug, Clone, Default)]
pub struct RegionSpec {
    pub node_type: String,
    pub description: String,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    pub parameters: Vec<ParamSpec>,
}

impl RegionSpec {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_input(mut self, spec: PortSpec) -> Self {
        self.inputs.push(spec);
        self
    }

    pub fn with_output(mut self, spec: PortSpec) -> Self {
        self.outputs.push(spec);
        self
    }

    pub fn with_param(mut self, spec: ParamSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn input(&self, name: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn default_input_name(&self) -> Option<&str> {
        self.inputs
            .iter()
            .find(|p| p.default_flag)
            .map(|p| p.name.as_str())
    }

    pub fn default_output_name(&self) -> Option<&str> {
        self.outputs
            .iter()
            .find(|p| p.default_flag)
            .map(|p| p.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_lookup() {
        let spec = RegionSpec::new("Test")
            .with_output(PortSpec::new("bottomUpOut", ElementType::F64, 64).as_default())
            .with_input(PortSpec::wildcard("bottomUpIn", ElementType::F64).optional());

        assert_eq!(spec.default_output_name(), Some("bottomUpOut"));
        assert_eq!(spec.default_input_name(), None);
        assert!(!spec.input("bottomUpIn").unwrap().required);
    }
}
