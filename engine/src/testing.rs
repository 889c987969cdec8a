//! Built-in `RegionImpl`s used by this crate's own tests (unit and
//! `engine/tests/` integration suites). Exported so integration tests can
//! build a `RegionImplFactory` without duplicating these: a
//! [`ConstantRegion`] that emits a fixed value plus whatever arrives on an
//! optional `feedbackIn` input, an [`AdderRegion`] that sums its fan-in
//! `in` port and adds a base value (used to reproduce multi-region
//! feedback/lateral scenarios), and a [`SinkRegion`] that records what it
//! receives.

use crate::array::{Array, ElementType};
use crate::error::{EngineError, Result};
use crate::factory::{RegionImplDescriptor, RegionImplFactory};
use crate::params::ValueMap;
use crate::region::{RegionImpl, RegionIo};
use crate::spec::{PortSpec, RegionSpec};

/// Emits `value + sum(feedbackIn)` on every compute call. `feedbackIn` is
/// optional, so an unconnected instance just emits `value`. `count`
/// controls the output's element width (default 4); a single-element
/// instance (`count=1`) makes `value + feedbackIn` behave as plain scalar
/// addition, which is how this crate's feedback/phase-suppression
/// integration tests are wired.
pub struct ConstantRegion {
    pub value: f64,
    count: usize,
}

impl RegionImpl for ConstantRegion {
    fn compute(&mut self, io: &mut RegionIo) -> Result<()> {
        let feedback: f64 = io.input("feedbackIn")?.array.as_f64()?.iter().sum();
        let out = io.output("out")?;
        out.array.as_f64_mut()?.fill(self.value + feedback);
        Ok(())
    }

    fn get_node_output_element_count(&self, _output_name: &str) -> Result<usize> {
        Ok(self.count)
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut bytes = self.value.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(self.count as u64).to_le_bytes());
        Ok(bytes)
    }
}

pub fn constant_spec() -> RegionSpec {
    RegionSpec::new("Constant")
        .with_input(PortSpec::wildcard("feedbackIn", ElementType::F64).optional())
        .with_output(PortSpec::wildcard("out", ElementType::F64).as_default())
}

fn output_count(params: &ValueMap) -> Result<usize> {
    if params.contains("count") {
        Ok(params.get_i64("count")? as usize)
    } else {
        Ok(4)
    }
}

fn constant_from_params(params: &ValueMap) -> Result<Box<dyn RegionImpl>> {
    let value = params.get_f64("value").unwrap_or(0.0);
    let count = output_count(params)?;
    Ok(Box::new(ConstantRegion { value, count }))
}

fn constant_from_serialized(bundle: &[u8]) -> Result<Box<dyn RegionImpl>> {
    if bundle.len() != 16 {
        return Err(EngineError::MalformedState("Constant bundle must be 16 bytes".into()));
    }
    let value = f64::from_le_bytes(bundle[0..8].try_into().expect("checked length"));
    let count = u64::from_le_bytes(bundle[8..16].try_into().expect("checked length")) as usize;
    Ok(Box::new(ConstantRegion { value, count }))
}

/// Emits `base + sum(in)` on every compute call. `in` accepts fan-in, so
/// this doubles as the region type for cyclic/lateral-link scenarios —
/// wiring several `AdderRegion`s together reproduces feedback and
/// phase-suppressed self-loop behavior without a bespoke region per
/// scenario. `count` controls the output's element width (default 4), the
/// same way it does for [`ConstantRegion`].
pub struct AdderRegion {
    pub base: f64,
    count: usize,
}

impl RegionImpl for AdderRegion {
    fn compute(&mut self, io: &mut RegionIo) -> Result<()> {
        let total: f64 = io.input("in")?.array.as_f64()?.iter().sum();
        let out = io.output("out")?;
        out.array.as_f64_mut()?.fill(self.base + total);
        Ok(())
    }

    fn get_node_output_element_count(&self, _output_name: &str) -> Result<usize> {
        Ok(self.count)
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut bytes = self.base.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(self.count as u64).to_le_bytes());
        Ok(bytes)
    }
}

pub fn adder_spec() -> RegionSpec {
    RegionSpec::new("Adder")
        .with_input(PortSpec::wildcard("in", ElementType::F64).optional())
        .with_output(PortSpec::wildcard("out", ElementType::F64).as_default())
}

fn adder_from_params(params: &ValueMap) -> Result<Box<dyn RegionImpl>> {
    let base = params.get_f64("base").unwrap_or(0.0);
    let count = output_count(params)?;
    Ok(Box::new(AdderRegion { base, count }))
}

fn adder_from_serialized(bundle: &[u8]) -> Result<Box<dyn RegionImpl>> {
    if bundle.len() != 16 {
        return Err(EngineError::MalformedState("Adder bundle must be 16 bytes".into()));
    }
    let base = f64::from_le_bytes(bundle[0..8].try_into().expect("checked length"));
    let count = u64::from_le_bytes(bundle[8..16].try_into().expect("checked length")) as usize;
    Ok(Box::new(AdderRegion { base, count }))
}

/// Copies `in` to `out` unchanged and remembers the last value received,
/// available via the `received` parameter.
#[derive(Default)]
pub struct SinkRegion {
    received: Vec<f64>,
}

impl RegionImpl for SinkRegion {
    fn compute(&mut self, io: &mut RegionIo) -> Result<()> {
        let input = io.input("in")?.array.as_f64()?.to_vec();
        self.received = input.clone();
        let out = io.output("out")?;
        for (i, v) in out.array.as_f64_mut()?.iter_mut().enumerate() {
            *v = input.get(i).copied().unwrap_or(0.0);
        }
        Ok(())
    }

    fn get_parameter_array(&self, name: &str) -> Result<Array> {
        match name {
            "received" => Ok(Array::F64(self.received.clone())),
            other => Err(EngineError::UnknownParameter(other.to_string())),
        }
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

pub fn sink_spec() -> RegionSpec {
    RegionSpec::new("Sink")
        .with_input(PortSpec::new("in", ElementType::F64, 4).as_default())
        .with_output(PortSpec::new("out", ElementType::F64, 4).as_default())
}

fn sink_from_params(_params: &ValueMap) -> Result<Box<dyn RegionImpl>> {
    Ok(Box::new(SinkRegion::default()))
}

fn sink_from_serialized(_bundle: &[u8]) -> Result<Box<dyn RegionImpl>> {
    Ok(Box::new(SinkRegion::default()))
}

/// Registers `Constant`, `Adder`, and `Sink` node types on `factory`.
pub fn register_test_regions(factory: &mut RegionImplFactory) -> Result<()> {
    factory.register(
        "Constant",
        RegionImplDescriptor {
            create_spec: constant_spec,
            create_from_params: constant_from_params,
            create_from_serialized: constant_from_serialized,
        },
    )?;
    factory.register(
        "Adder",
        RegionImplDescriptor {
            create_spec: adder_spec,
            create_from_params: adder_from_params,
            create_from_serialized: adder_from_serialized,
        },
    )?;
    factory.register(
        "Sink",
        RegionImplDescriptor {
            create_spec: sink_spec,
            create_from_params: sink_from_params,
            create_from_serialized: sink_from_serialized,
        },
    )?;
    Ok(())
}
