//! Graph container: owns the Regions, the phase scheduler, and the run
//! loop. This is the module that resolves the cyclic-ownership problem —
//! see DESIGN.md's "cyclic graph of owned nodes" entry — by never letting a
//! Region or Link hold a live reference to another Region; every
//! cross-region read goes through `Network` and uses a gather-then-apply
//! pattern (collect the data needed under an immutable borrow, release it,
//! then mutate).

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::array::Array;
use crate::collections::OrderedMap;
use crate::error::{EngineError, Result};
use crate::factory::RegionImplFactory;
use crate::link::{Link, LinkType};
use crate::params::ValueMap;
use crate::region::Region;

/// A per-iteration user hook. Runs synchronously after all enabled phases
/// have computed and before the end-of-iteration link shift.
pub type Callback = Box<dyn FnMut(&mut Network, u64)>;

pub struct Network {
    pub(crate) factory: RegionImplFactory,
    pub(crate) regions: OrderedMap<Region>,
    /// `phase_info[p]` is the set of region names assigned to phase `p`,
    /// in the order they were added — an [`OrderedMap<()>`] used purely as
    /// an insertion-ordered set.
    pub(crate) phase_info: Vec<OrderedMap<()>>,
    pub(crate) min_enabled_phase: u32,
    pub(crate) max_enabled_phase: u32,
    pub(crate) iteration: u64,
    pub(crate) initialized: bool,
    callbacks: OrderedMap<Callback>,
}

impl Network {
    pub fn new(factory: RegionImplFactory) -> Self {
        Self {
            factory,
            regions: OrderedMap::new(),
            phase_info: Vec::new(),
            min_enabled_phase: 0,
            max_enabled_phase: 0,
            iteration: 0,
            initialized: false,
            callbacks: OrderedMap::new(),
        }
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn region(&self, name: &str) -> Result<&Region> {
        self.regions
            .get(name)
            .ok_or_else(|| EngineError::UnknownRegion(name.to_string()))
    }

    pub fn region_mut(&mut self, name: &str) -> Result<&mut Region> {
        self.regions
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownRegion(name.to_string()))
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys()
    }

    // ---- graph construction -------------------------------------------------

    pub fn add_region(&mut self, name: impl Into<String>, node_type: &str, param_string: &str) -> Result<()> {
        let name = name.into();
        if self.regions.contains_key(&name) {
            return Err(EngineError::DuplicateRegion(name));
        }
        let params = ValueMap::parse(param_string)?;
        let (spec, region_impl) = self.factory.create_region_impl(node_type, &params)?;
        let region = Region::new(name.clone(), node_type, spec, region_impl);
        self.regions.insert(name.clone(), region);
        self.assign_default_phase(&name);
        self.initialized = false;
        debug!(region = %name, %node_type, "added region");
        Ok(())
    }

    fn assign_default_phase(&mut self, name: &str) {
        let next_phase = self.phase_info.len() as u32;
        let mut slot = OrderedMap::new();
        slot.insert(name.to_string(), ());
        self.phase_info.push(slot);
        if let Some(region) = self.regions.get_mut(name) {
            region.phases.clear();
            region.phases.insert(next_phase);
        }
        self.reset_enabled_phases();
    }

    pub fn remove_region(&mut self, name: &str) -> Result<()> {
        {
            let region = self.region(name)?;
            if region.has_outgoing_links() {
                return Err(EngineError::HasOutgoingLinks(name.to_string()));
            }
        }
        let removed_links = {
            let region = self.region_mut(name)?;
            region.uninitialize();
            region.remove_all_incoming_links()
        };
        for link in removed_links {
            if let Some(src) = self.regions.get_mut(&link.src_region) {
                if let Some(output) = src.outputs.get_mut(&link.src_output) {
                    output.remove_outbound();
                }
            }
        }
        self.regions.remove(name);
        for phase in self.phase_info.iter_mut() {
            phase.remove(name);
        }
        while matches!(self.phase_info.last(), Some(slot) if slot.is_empty()) {
            self.phase_info.pop();
        }
        self.reset_enabled_phases();
        self.initialized = false;
        debug!(region = %name, "removed region");
        Ok(())
    }

    fn resolve_output_name(&self, region: &str, requested: Option<&str>) -> Result<String> {
        let r = self.region(region)?;
        match requested {
            Some(n) => Ok(n.to_string()),
            None => r
                .spec
                .default_output_name()
                .map(|n| n.to_string())
                .ok_or_else(|| EngineError::UnknownPort {
                    region: region.to_string(),
                    port: String::new(),
                }),
        }
    }

    fn resolve_input_name(&self, region: &str, requested: Option<&str>) -> Result<String> {
        let r = self.region(region)?;
        match requested {
            Some(n) => Ok(n.to_string()),
            None => r
                .spec
                .default_input_name()
                .map(|n| n.to_string())
                .ok_or_else(|| EngineError::UnknownPort {
                    region: region.to_string(),
                    port: String::new(),
                }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn link(
        &mut self,
        src_region: &str,
        dst_region: &str,
        link_type: LinkType,
        link_params: &str,
        src_output: Option<&str>,
        dst_input: Option<&str>,
        propagation_delay: u32,
    ) -> Result<()> {
        let src_output_name = self.resolve_output_name(src_region, src_output)?;
        let dst_input_name = self.resolve_input_name(dst_region, dst_input)?;

        let (element_type, element_count) = {
            let src = self.region(src_region)?;
            let port_spec = src.spec.output(&src_output_name).ok_or_else(|| EngineError::UnknownPort {
                region: src_region.to_string(),
                port: src_output_name.clone(),
            })?;
            let output = src.outputs.get(&src_output_name).ok_or_else(|| EngineError::UnknownPort {
                region: src_region.to_string(),
                port: src_output_name.clone(),
            })?;
            let count = if port_spec.count != 0 { port_spec.count } else { output.array.len() };
            (output.element_type, count)
        };

        {
            let dst = self.region(dst_region)?;
            let input = dst.inputs.get(&dst_input_name).ok_or_else(|| EngineError::UnknownPort {
                region: dst_region.to_string(),
                port: dst_input_name.clone(),
            })?;
            if input.element_type != element_type {
                return Err(EngineError::LinkTypeMismatch {
                    src_region: src_region.to_string(),
                    src_port: src_output_name.clone(),
                    src_type: element_type,
                    dst_region: dst_region.to_string(),
                    dst_port: dst_input_name.clone(),
                    dst_type: input.element_type,
                });
            }
        }

        let link = Link::new(
            link_type,
            link_params,
            src_region,
            src_output_name.clone(),
            dst_region,
            dst_input_name.clone(),
            propagation_delay,
            element_type,
            element_count,
        );

        {
            let dst = self.region_mut(dst_region)?;
            let input = dst.inputs.get_mut(&dst_input_name).ok_or_else(|| EngineError::UnknownPort {
                region: dst_region.to_string(),
                port: dst_input_name.clone(),
            })?;
            input.add_link(link)?;
        }
        {
            let src = self.region_mut(src_region)?;
            if let Some(output) = src.outputs.get_mut(&src_output_name) {
                output.add_outbound();
            }
        }
        self.initialized = false;
        Ok(())
    }

    pub fn unlink(
        &mut self,
        src_region: &str,
        dst_region: &str,
        src_output: Option<&str>,
        dst_input: Option<&str>,
    ) -> Result<()> {
        let src_output_name = self.resolve_output_name(src_region, src_output)?;
        let dst_input_name = self.resolve_input_name(dst_region, dst_input)?;

        {
            let dst = self.region(dst_region)?;
            if dst.initialized {
                return Err(EngineError::RegionInitialized(dst_region.to_string()));
            }
        }

        let removed = {
            let dst = self.region_mut(dst_region)?;
            let input = dst.inputs.get_mut(&dst_input_name).ok_or_else(|| EngineError::UnknownPort {
                region: dst_region.to_string(),
                port: dst_input_name.clone(),
            })?;
            input.remove_link(src_region, &src_output_name)?
        };
        if let Some(src) = self.regions.get_mut(&removed.src_region) {
            if let Some(output) = src.outputs.get_mut(&removed.src_output) {
                output.remove_outbound();
            }
        }
        self.initialized = false;
        Ok(())
    }

    // ---- phase scheduler ------------------------------------------------

    pub fn set_phases(&mut self, name: &str, new_phases: &BTreeSet<u32>) -> Result<()> {
        if !self.regions.contains_key(name) {
            return Err(EngineError::UnknownRegion(name.to_string()));
        }
        if new_phases.is_empty() {
            return Err(EngineError::EmptyPhases(name.to_string()));
        }
        let max_phase = *new_phases.iter().max().expect("checked non-empty above");
        let required_len = max_phase as usize + 1;
        if required_len > self.phase_info.len() {
            let jump = required_len - self.phase_info.len();
            if jump > 3 {
                return Err(EngineError::PhaseTooLarge {
                    region: name.to_string(),
                    requested: max_phase,
                    next_phase: self.phase_info.len() as u32,
                });
            }
            while self.phase_info.len() < required_len {
                self.phase_info.push(OrderedMap::new());
            }
        }
        for (p, slot) in self.phase_info.iter_mut().enumerate() {
            if new_phases.contains(&(p as u32)) {
                if !slot.contains_key(name) {
                    slot.insert(name.to_string(), ());
                }
            } else {
                slot.remove(name);
            }
        }
        if let Some(region) = self.regions.get_mut(name) {
            region.phases = new_phases.clone();
        }
        self.reset_enabled_phases();
        Ok(())
    }

    fn reset_enabled_phases(&mut self) {
        let mut min = None;
        let mut max = None;
        for (i, slot) in self.phase_info.iter().enumerate() {
            if !slot.is_empty() {
                min.get_or_insert(i as u32);
                max = Some(i as u32);
            }
        }
        self.min_enabled_phase = min.unwrap_or(0);
        self.max_enabled_phase = max.unwrap_or(0);
    }

    pub fn set_min_enabled_phase(&mut self, phase: u32) -> Result<()> {
        if phase as usize >= self.phase_info.len() {
            return Err(EngineError::PhaseOutOfRange {
                requested: phase,
                phase_count: self.phase_info.len(),
            });
        }
        self.min_enabled_phase = phase;
        Ok(())
    }

    pub fn set_max_enabled_phase(&mut self, phase: u32) -> Result<()> {
        if phase as usize >= self.phase_info.len() {
            return Err(EngineError::PhaseOutOfRange {
                requested: phase,
                phase_count: self.phase_info.len(),
            });
        }
        self.max_enabled_phase = phase;
        Ok(())
    }

    pub fn min_enabled_phase(&self) -> u32 {
        self.min_enabled_phase
    }

    pub fn max_enabled_phase(&self) -> u32 {
        self.max_enabled_phase
    }

    // ---- callbacks --------------------------------------------------------

    pub fn set_callback(&mut self, name: impl Into<String>, callback: Callback) -> Result<()> {
        let name = name.into();
        if self.callbacks.contains_key(&name) {
            return Err(EngineError::DuplicateCallback(name));
        }
        self.callbacks.insert(name, callback);
        Ok(())
    }

    pub fn unset_callback(&mut self, name: &str) {
        self.callbacks.remove(name);
    }

    fn fire_callbacks(&mut self) {
        let names: Vec<String> = self.callbacks.keys().map(|s| s.to_string()).collect();
        for name in names {
            if let Some(mut callback) = self.callbacks.remove(&name) {
                callback(self, self.iteration);
                self.callbacks.insert(name, callback);
            }
        }
    }

    // ---- initialize / run --------------------------------------------------

    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        let names: Vec<String> = self.regions.keys().map(|s| s.to_string()).collect();
        for name in &names {
            self.region_mut(name)?.init_outputs()?;
        }
        self.resize_links_for_producers(&names);
        for name in &names {
            self.region_mut(name)?.init_inputs()?;
        }
        for name in &names {
            self.region_mut(name)?.initialize()?;
        }
        self.reset_enabled_phases();
        self.initialized = true;
        debug!(regions = names.len(), "network initialized");
        Ok(())
    }

    /// Matches each link's `element_count`/delay-queue width to its
    /// producer's actual Output length, now that `initOutputs` has run.
    /// A no-op for links whose width is already correct (e.g. restored
    /// from a save — see [`crate::link::Link::resize_for_producer`]).
    fn resize_links_for_producers(&mut self, names: &[String]) {
        for dst_name in names {
            let mut resizes: Vec<(String, usize, usize)> = Vec::new();
            {
                let dst = match self.regions.get(dst_name) {
                    Some(r) => r,
                    None => continue,
                };
                for (input_name, input) in dst.inputs.iter() {
                    for (idx, link) in input.links().iter().enumerate() {
                        if let Some(src) = self.regions.get(&link.src_region) {
                            if let Some(output) = src.outputs.get(&link.src_output) {
                                resizes.push((input_name.to_string(), idx, output.array.len()));
                            }
                        }
                    }
                }
            }
            if let Some(dst) = self.regions.get_mut(dst_name) {
                for (input_name, idx, producer_len) in resizes {
                    if let Some(input) = dst.inputs.get_mut(&input_name) {
                        if let Some(link) = input.links_mut().get_mut(idx) {
                            link.resize_for_producer(producer_len);
                        }
                    }
                }
            }
        }
    }

    pub fn run(&mut self, n: u64) -> Result<()> {
        if !self.initialized {
            self.initialize()?;
        }
        if self.phase_info.is_empty() {
            return Ok(());
        }
        if self.max_enabled_phase as usize >= self.phase_info.len() {
            return Err(EngineError::PhaseOutOfRange {
                requested: self.max_enabled_phase,
                phase_count: self.phase_info.len(),
            });
        }
        for _ in 0..n {
            self.iteration += 1;
            self.run_one_iteration()?;
        }
        Ok(())
    }

    fn run_one_iteration(&mut self) -> Result<()> {
        trace!(iteration = self.iteration, "begin iteration");
        for phase in self.min_enabled_phase..=self.max_enabled_phase {
            let region_names: Vec<String> = match self.phase_info.get(phase as usize) {
                Some(slot) => slot.keys().map(|s| s.to_string()).collect(),
                None => continue,
            };
            for name in region_names {
                self.prepare_inputs(&name)?;
                self.region_mut(&name)?.compute()?;
            }
        }
        self.fire_callbacks();
        self.shift_all_links();
        Ok(())
    }

    /// Gathers live data for every inbound link of `region_name` (from the
    /// link's delay queue, or — for zero-delay links — the producer's
    /// current Output), then applies it to the destination Input buffer.
    /// Two passes because the gather may need to read another region
    /// (including `region_name` itself, for self-loops) while the apply
    /// pass needs a mutable borrow of `region_name`.
    pub(crate) fn prepare_inputs(&mut self, region_name: &str) -> Result<()> {
        let mut writes: Vec<(String, usize, Array)> = Vec::new();
        {
            let region = self.region(region_name)?;
            for (input_name, input) in region.inputs.iter() {
                for link in input.links() {
                    let data = match link.delayed_head() {
                        Some(buf) => buf.clone(),
                        None => {
                            let src = self.region(&link.src_region)?;
                            let output = src.outputs.get(&link.src_output).ok_or_else(|| EngineError::UnknownPort {
                                region: link.src_region.clone(),
                                port: link.src_output.clone(),
                            })?;
                            output.array.clone()
                        }
                    };
                    writes.push((input_name.to_string(), link.dst_offset, data));
                }
            }
        }
        let region = self.region_mut(region_name)?;
        for (input_name, offset, data) in writes {
            region.apply_prepared_input(&input_name, offset, &data)?;
        }
        Ok(())
    }

    /// End-of-iteration commit: every inbound link (regardless of its
    /// region's phase enablement) enqueues its producer's current Output
    /// and drops the oldest buffer.
    pub(crate) fn shift_all_links(&mut self) {
        let names: Vec<String> = self.regions.keys().map(|s| s.to_string()).collect();
        for dst_name in &names {
            let mut updates: Vec<(String, usize, Array)> = Vec::new();
            {
                let dst = match self.regions.get(dst_name) {
                    Some(r) => r,
                    None => continue,
                };
                for (input_name, input) in dst.inputs.iter() {
                    for (idx, link) in input.links().iter().enumerate() {
                        if let Some(src) = self.regions.get(&link.src_region) {
                            if let Some(output) = src.outputs.get(&link.src_output) {
                                updates.push((input_name.to_string(), idx, output.array.clone()));
                            }
                        }
                    }
                }
            }
            if let Some(dst) = self.regions.get_mut(dst_name) {
                for (input_name, idx, current_output) in updates {
                    if let Some(input) = dst.inputs.get_mut(&input_name) {
                        if let Some(link) = input.links_mut().get_mut(idx) {
                            link.shift_buffered_data(&current_output);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ElementType;
    use crate::factory::RegionImplDescriptor;
    use crate::region::{RegionImpl, RegionIo};
    use crate::spec::{PortSpec, RegionSpec};

    /// Emits a constant value into its single output; echoes its input
    /// (if connected) into a side field for assertions.
    struct ConstantRegion {
        value: f64,
    }

    impl RegionImpl for ConstantRegion {
        fn compute(&mut self, io: &mut RegionIo) -> Result<()> {
            let out = io.output("out")?;
            out.array.as_f64_mut()?.fill(self.value);
            Ok(())
        }
        fn get_node_output_element_count(&self, _output_name: &str) -> Result<usize> {
            Ok(4)
        }
        fn serialize(&self) -> Result<Vec<u8>> {
            Ok(self.value.to_le_bytes().to_vec())
        }
    }

    fn constant_spec() -> RegionSpec {
        RegionSpec::new("Constant").with_output(PortSpec::new("out", ElementType::F64, 4).as_default())
    }

    fn constant_from_params(params: &ValueMap) -> Result<Box<dyn RegionImpl>> {
        let value = params.get_f64("value").unwrap_or(0.0);
        Ok(Box::new(ConstantRegion { value }))
    }

    fn constant_from_serialized(bundle: &[u8]) -> Result<Box<dyn RegionImpl>> {
        let bytes: [u8; 8] = bundle.try_into().map_err(|_| EngineError::MalformedState("bad bundle".into()))?;
        Ok(Box::new(ConstantRegion { value: f64::from_le_bytes(bytes) }))
    }

    /// Passes its input straight through to its output, unchanged.
    struct SinkRegion;
    impl RegionImpl for SinkRegion {
        fn compute(&mut self, io: &mut RegionIo) -> Result<()> {
            let input_data: Vec<f64> = io.input("in")?.array.as_f64()?.to_vec();
            let out = io.output("out")?;
            for (i, v) in out.array.as_f64_mut()?.iter_mut().enumerate() {
                *v = input_data.get(i).copied().unwrap_or(0.0);
            }
            Ok(())
        }
        fn serialize(&self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn sink_spec() -> RegionSpec {
        RegionSpec::new("Sink")
            .with_input(PortSpec::new("in", ElementType::F64, 4).as_default())
            .with_output(PortSpec::new("out", ElementType::F64, 4).as_default())
    }

    fn sink_from_params(_params: &ValueMap) -> Result<Box<dyn RegionImpl>> {
        Ok(Box::new(SinkRegion))
    }

    fn sink_from_serialized(_bundle: &[u8]) -> Result<Box<dyn RegionImpl>> {
        Ok(Box::new(SinkRegion))
    }

    fn test_factory() -> RegionImplFactory {
        let mut factory = RegionImplFactory::new();
        factory
            .register(
                "Constant",
                RegionImplDescriptor {
                    create_spec: constant_spec,
                    create_from_params: constant_from_params,
                    create_from_serialized: constant_from_serialized,
                },
            )
            .unwrap();
        factory
            .register(
                "Sink",
                RegionImplDescriptor {
                    create_spec: sink_spec,
                    create_from_params: sink_from_params,
                    create_from_serialized: sink_from_serialized,
                },
            )
            .unwrap();
        factory
    }

    #[test]
    fn test_feed_forward_zero_delay() {
        let mut net = Network::new(test_factory());
        net.add_region("r1", "Constant", "value=10").unwrap();
        net.add_region("r2", "Sink", "").unwrap();
        net.link("r1", "r2", LinkType::Identity, "", None, None, 0).unwrap();
        net.run(1).unwrap();
        let r2 = net.region("r2").unwrap();
        assert_eq!(r2.outputs.get("out").unwrap().array, Array::F64(vec![10.0; 4]));
    }

    #[test]
    fn test_feed_forward_delay_two_yields_value_from_two_iterations_ago() {
        let mut net = Network::new(test_factory());
        net.add_region("r1", "Constant", "value=10").unwrap();
        net.add_region("r2", "Sink", "").unwrap();
        net.link("r1", "r2", LinkType::Identity, "", None, None, 2).unwrap();
        net.initialize().unwrap();

        // iteration 1: r1 emits 10.
        net.run(1).unwrap();
        assert_eq!(net.region("r2").unwrap().inputs.get("in").unwrap().array, Array::F64(vec![0.0; 4]));

        // iteration 2 onward: r1 emits 100.
        net.region_mut("r1").unwrap().region_impl = Box::new(ConstantRegion { value: 100.0 });
        net.run(1).unwrap();
        assert_eq!(net.region("r2").unwrap().inputs.get("in").unwrap().array, Array::F64(vec![0.0; 4]));
        net.run(1).unwrap();
        assert_eq!(net.region("r2").unwrap().inputs.get("in").unwrap().array, Array::F64(vec![10.0; 4]));
        net.run(1).unwrap();
        assert_eq!(net.region("r2").unwrap().inputs.get("in").unwrap().array, Array::F64(vec![100.0; 4]));
    }

    #[test]
    fn test_removal_rejected_while_outgoing_links_exist() {
        let mut net = Network::new(test_factory());
        net.add_region("r1", "Constant", "value=1").unwrap();
        net.add_region("r2", "Sink", "").unwrap();
        net.link("r1", "r2", LinkType::Identity, "", None, None, 0).unwrap();
        net.run(1).unwrap();

        assert!(matches!(net.remove_region("r1"), Err(EngineError::HasOutgoingLinks(_))));

        net.region_mut("r2").unwrap().uninitialize();
        net.unlink("r1", "r2", None, None).unwrap();
        net.remove_region("r1").unwrap();
        assert!(net.region("r1").is_err());
    }

    #[test]
    fn test_self_loop_phase_suppression_freezes_output_while_disabled() {
        let mut net = Network::new(test_factory());
        net.add_region("r1", "Sink", "").unwrap();
        net.link("r1", "r1", LinkType::Identity, "", None, None, 1).unwrap();
        // A second region occupies phase 1, so phase 0 (r1's phase) can be
        // disabled without running out of phase slots.
        net.add_region("r2", "Sink", "").unwrap();
        net.initialize().unwrap();

        net.run(1).unwrap();
        let first = net.region("r1").unwrap().outputs.get("out").unwrap().array.clone();

        net.set_min_enabled_phase(1).unwrap();
        net.run(1).unwrap();
        net.set_min_enabled_phase(0).unwrap();
        let frozen = net.region("r1").unwrap().outputs.get("out").unwrap().array.clone();
        assert_eq!(frozen, first, "disabled region's output must not change");
    }

    #[test]
    fn test_duplicate_region_name_rejected() {
        let mut net = Network::new(test_factory());
        net.add_region("r1", "Constant", "").unwrap();
        assert!(matches!(net.add_region("r1", "Constant", ""), Err(EngineError::DuplicateRegion(_))));
    }

    #[test]
    fn test_set_phases_rejects_empty_set() {
        let mut net = Network::new(test_factory());
        net.add_region("r1", "Constant", "").unwrap();
        assert!(matches!(net.set_phases("r1", &BTreeSet::new()), Err(EngineError::EmptyPhases(_))));
    }

    #[test]
    fn test_callbacks_fire_in_insertion_order() {
        let mut net = Network::new(test_factory());
        net.add_region("r1", "Constant", "value=1").unwrap();
        net.add_region("r2", "Sink", "").unwrap();
        net.link("r1", "r2", LinkType::Identity, "", None, None, 0).unwrap();

        let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let order_a = order.clone();
        let order_b = order.clone();
        net.set_callback("a", Box::new(move |_net, _it| order_a.borrow_mut().push("a"))).unwrap();
        net.set_callback("b", Box::new(move |_net, _it| order_b.borrow_mut().push("b"))).unwrap();
        net.run(1).unwrap();
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }
}
