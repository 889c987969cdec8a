//! Named node; owns a RegionImpl (plugin), its Inputs/Outputs, and its
//! phase membership.

use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::array::Array;
use crate::collections::OrderedMap;
use crate::error::{EngineError, Result};
use crate::link::Link;
use crate::port::{Input, Output};
use crate::spec::RegionSpec;

/// Borrowed access to one Region's ports, handed to a [`RegionImpl`] on
/// every `initialize`/`compute`/`execute_command` call.
///
/// The original plugin contract lets an impl retain borrowed references to
/// its Inputs/Outputs from `initialize` onward; Rust's borrow checker won't
/// allow a struct to hold a self-referential borrow like that, so this
/// crate re-derives a fresh `RegionIo` per call instead — see DESIGN.md.
pub struct RegionIo<'a> {
    pub region_name: &'a str,
    pub inputs: &'a OrderedMap<Input>,
    pub outputs: &'a mut OrderedMap<Output>,
}

impl<'a> RegionIo<'a> {
    pub fn input(&self, name: &str) -> Result<&Input> {
        self.inputs
            .get(name)
            .ok_or_else(|| EngineError::UnknownPort {
                region: self.region_name.to_string(),
                port: name.to_string(),
            })
    }

    pub fn output(&mut self, name: &str) -> Result<&mut Output> {
        self.outputs
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownPort {
                region: self.region_name.to_string(),
                port: name.to_string(),
            })
    }
}

/// The plugin contract an algorithm implementation must satisfy. This is
/// the decoupling seam between the engine and region-specific computation
/// (spatial poolers, cell algorithms, test nodes, ...) — those
/// implementations are out of this crate's scope; only the trait and a
/// couple of test-only impls (see `testing.rs`) live here.
pub trait RegionImpl {
    /// One-time setup, run once `initOutputs`/`initInputs` have sized this
    /// region's ports.
    fn initialize(&mut self, _io: &mut RegionIo) -> Result<()> {
        Ok(())
    }

    fn compute(&mut self, io: &mut RegionIo) -> Result<()>;

    /// Element count for a wildcard (`count == 0`) output port, queried at
    /// `initOutputs` time.
    fn get_node_output_element_count(&self, output_name: &str) -> Result<usize> {
        Err(EngineError::UnknownPort {
            region: String::new(),
            port: output_name.to_string(),
        })
    }

    fn execute_command(&mut self, args: &[String]) -> Result<String> {
        let _ = args;
        Ok(String::new())
    }

    fn get_parameter_i64(&self, name: &str) -> Result<i64> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }
    fn set_parameter_i64(&mut self, name: &str, _value: i64) -> Result<()> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }

    fn get_parameter_f64(&self, name: &str) -> Result<f64> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }
    fn set_parameter_f64(&mut self, name: &str, _value: f64) -> Result<()> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }

    fn get_parameter_bool(&self, name: &str) -> Result<bool> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }
    fn set_parameter_bool(&mut self, name: &str, _value: bool) -> Result<()> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }

    fn get_parameter_array(&self, name: &str) -> Result<Array> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }
    fn set_parameter_array(&mut self, name: &str, _value: &Array) -> Result<()> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }

    /// Opaque byte bundle capturing internal state, consumed later by this
    /// `nodeType`'s deserializing constructor (see `factory.rs`).
    fn serialize(&self) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfilingStats {
    pub compute_calls: u64,
    pub compute_time: Duration,
}

pub struct Region {
    pub name: String,
    pub node_type: String,
    pub spec: Rc<RegionSpec>,
    pub region_impl: Box<dyn RegionImpl>,
    pub inputs: OrderedMap<Input>,
    pub outputs: OrderedMap<Output>,
    pub phases: BTreeSet<u32>,
    pub initialized: bool,
    pub profiling_enabled: bool,
    pub profiling: ProfilingStats,
}

impl Region {
    pub fn new(
        name: impl Into<String>,
        node_type: impl Into<String>,
        spec: Rc<RegionSpec>,
        region_impl: Box<dyn RegionImpl>,
    ) -> Self {
        let name = name.into();
        let mut inputs = OrderedMap::new();
        for port_spec in &spec.inputs {
            inputs.insert(
                port_spec.name.clone(),
                Input::new(name.clone(), port_spec.name.clone(), port_spec.element_type, port_spec.required),
            );
        }
        let mut outputs = OrderedMap::new();
        for port_spec in &spec.outputs {
            outputs.insert(
                port_spec.name.clone(),
                Output::new(name.clone(), port_spec.name.clone(), port_spec.element_type),
            );
        }
        Self {
            name,
            node_type: node_type.into(),
            spec,
            region_impl,
            inputs,
            outputs,
            phases: BTreeSet::new(),
            initialized: false,
            profiling_enabled: false,
            profiling: ProfilingStats::default(),
        }
    }

    fn io(&mut self) -> RegionIo<'_> {
        RegionIo {
            region_name: &self.name,
            inputs: &self.inputs,
            outputs: &mut self.outputs,
        }
    }

    /// For each Output, size its Array: spec count if nonzero, otherwise
    /// ask the impl (wildcard output).
    pub fn init_outputs(&mut self) -> Result<()> {
        for port_spec in self.spec.outputs.clone() {
            let count = if port_spec.count == 0 {
                self.region_impl.get_node_output_element_count(&port_spec.name)?
            } else {
                port_spec.count
            };
            let output = self.outputs.get_mut(&port_spec.name).ok_or_else(|| EngineError::UnknownPort {
                region: self.name.clone(),
                port: port_spec.name.clone(),
            })?;
            output.array.resize(count);
        }
        Ok(())
    }

    /// Size each Input's Array to the sum of its inbound links' contributions.
    pub fn init_inputs(&mut self) -> Result<()> {
        for (_, input) in self.inputs_iter_mut_names() {
            let count = input.required_element_count();
            input.array.resize(count);
        }
        Ok(())
    }

    fn inputs_iter_mut_names(&mut self) -> Vec<(String, &mut Input)> {
        // OrderedMap has no iter_mut (see collections.rs); ports are few per
        // region, so look each one up by name instead.
        let names: Vec<String> = self.inputs.keys().map(|k| k.to_string()).collect();
        names
            .into_iter()
            .map(|n| {
                let input = self.inputs.get_mut(&n).expect("name came from keys()");
                (n, input)
            })
            .collect()
    }

    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        {
            let mut io = self.io();
            self.region_impl.initialize(&mut io)?;
        }
        self.initialized = true;
        Ok(())
    }

    pub fn compute(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(EngineError::NotInitialized(self.name.clone()));
        }
        let start = self.profiling_enabled.then(Instant::now);
        {
            let mut io = self.io();
            self.region_impl.compute(&mut io)?;
        }
        if let Some(start) = start {
            self.profiling.compute_calls += 1;
            self.profiling.compute_time += start.elapsed();
        }
        Ok(())
    }

    pub fn execute_command(&mut self, args: &[String]) -> Result<String> {
        if args.is_empty() {
            return Err(EngineError::EmptyCommand);
        }
        let start = self.profiling_enabled.then(Instant::now);
        let result = self.region_impl.execute_command(args)?;
        if let Some(start) = start {
            self.profiling.compute_calls += 1;
            self.profiling.compute_time += start.elapsed();
        }
        Ok(result)
    }

    pub fn uninitialize(&mut self) {
        self.initialized = false;
    }

    pub fn has_outgoing_links(&self) -> bool {
        self.outputs.iter().any(|(_, o)| o.has_outgoing_links())
    }

    /// Detach and return every inbound link across all Inputs. The caller
    /// (Network) is responsible for decrementing the matching source
    /// Output's outbound count for each returned link.
    pub fn remove_all_incoming_links(&mut self) -> Vec<Link> {
        let names: Vec<String> = self.inputs.keys().map(|k| k.to_string()).collect();
        let mut removed = Vec::new();
        for name in names {
            if let Some(input) = self.inputs.get_mut(&name) {
                removed.extend(input.take_all_links());
            }
        }
        removed
    }

    pub fn apply_prepared_input(&mut self, port_name: &str, offset: usize, data: &Array) -> Result<()> {
        let input = self.inputs.get_mut(port_name).ok_or_else(|| EngineError::UnknownPort {
            region: self.name.clone(),
            port: port_name.to_string(),
        })?;
        input.array.copy_into(offset, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ElementType;
    use crate::spec::PortSpec;

    struct Noop;
    impl RegionImpl for Noop {
        fn compute(&mut self, _io: &mut RegionIo) -> Result<()> {
            Ok(())
        }
        fn serialize(&self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn region() -> Region {
        let spec = Rc::new(
            RegionSpec::new("Noop")
                .with_output(PortSpec::new("out", ElementType::F64, 4)),
        );
        Region::new("r1", "Noop", spec, Box::new(Noop))
    }

    #[test]
    fn test_compute_before_initialize_fails() {
        let mut r = region();
        assert!(matches!(r.compute(), Err(EngineError::NotInitialized(_))));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut r = region();
        r.init_outputs().unwrap();
        r.init_inputs().unwrap();
        r.initialize().unwrap();
        assert!(r.initialized);
        r.initialize().unwrap();
        assert!(r.initialized);
    }

    #[test]
    fn test_execute_command_rejects_empty_args() {
        let mut r = region();
        assert!(matches!(r.execute_command(&[]), Err(EngineError::EmptyCommand)));
    }
}
