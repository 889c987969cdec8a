//! Input and Output ports: the named, typed buffers attached to a Region.

use crate::array::{Array, ElementType};
use crate::error::{EngineError, Result};
use crate::link::Link;

/// The producer side of a connection. Passive: it does not observe its
/// consumers beyond a count used to answer `has_outgoing_links`.
#[derive(Debug, Clone)]
pub struct Output {
    pub owning_region: String,
    pub name: String,
    pub element_type: ElementType,
    pub array: Array,
    outbound_count: usize,
}

impl Output {
    pub fn new(owning_region: impl Into<String>, name: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            owning_region: owning_region.into(),
            name: name.into(),
            element_type,
            array: Array::zeros(element_type, 0),
            outbound_count: 0,
        }
    }

    pub fn has_outgoing_links(&self) -> bool {
        self.outbound_count > 0
    }

    pub(crate) fn add_outbound(&mut self) {
        self.outbound_count += 1;
    }

    pub(crate) fn remove_outbound(&mut self) {
        self.outbound_count = self.outbound_count.saturating_sub(1);
    }
}

/// The consumer side of a connection. Owns the ordered list of inbound
/// [`Link`]s that feed it — order is the order `add_link` was called in,
/// and determines placement for multi-link ("fan-in") inputs.
#[derive(Debug, Clone)]
pub struct Input {
    pub owning_region: String,
    pub name: String,
    pub element_type: ElementType,
    pub array: Array,
    pub required: bool,
    links: Vec<Link>,
}

impl Input {
    pub fn new(
        owning_region: impl Into<String>,
        name: impl Into<String>,
        element_type: ElementType,
        required: bool,
    ) -> Self {
        Self {
            owning_region: owning_region.into(),
            name: name.into(),
            element_type,
            array: Array::zeros(element_type, 0),
            required,
            links: Vec::new(),
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }

    /// Sum of contributions across all inbound links — the size this
    /// Input's array should be allocated to at `initInputs` time.
    pub fn required_element_count(&self) -> usize {
        self.links.iter().map(|l| l.element_count).sum()
    }

    pub fn add_link(&mut self, mut link: Link) -> Result<()> {
        if !self.links.is_empty() && !link.link_type.accepts_fan_in() {
            return Err(EngineError::LinkFanInUnsupported {
                region: self.owning_region.clone(),
                port: self.name.clone(),
            });
        }
        link.dst_offset = self.required_element_count();
        self.links.push(link);
        Ok(())
    }

    /// Remove the link pointing back at `(src_region, src_output)`. Fails if
    /// no such link is attached.
    pub fn remove_link(&mut self, src_region: &str, src_output: &str) -> Result<Link> {
        let pos = self
            .links
            .iter()
            .position(|l| l.src_region == src_region && l.src_output == src_output)
            .ok_or_else(|| EngineError::NoSuchLink {
                src_region: src_region.to_string(),
                src_port: src_output.to_string(),
                dst_region: self.owning_region.clone(),
                dst_port: self.name.clone(),
            })?;
        Ok(self.links.remove(pos))
    }

    pub fn find_link(&self, src_region: &str, src_output: &str) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| l.src_region == src_region && l.src_output == src_output)
    }

    pub fn take_all_links(&mut self) -> Vec<Link> {
        std::mem::take(&mut self.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkType;

    fn test_link(src: &str, delay: u32) -> Link {
        Link::new(
            LinkType::Concat,
            "",
            src,
            "out",
            "r2",
            "in",
            delay,
            ElementType::F64,
            2,
        )
    }

    #[test]
    fn test_single_link_starts_at_offset_zero() {
        let mut input = Input::new("r2", "in", ElementType::F64, true);
        input.add_link(test_link("r1", 0)).unwrap();
        assert_eq!(input.links()[0].dst_offset, 0);
        assert_eq!(input.required_element_count(), 2);
    }

    #[test]
    fn test_second_fanin_link_offsets_after_first() {
        let mut input = Input::new("r2", "in", ElementType::F64, true);
        input.add_link(test_link("r1", 0)).unwrap();
        input.add_link(test_link("r1b", 0)).unwrap();
        assert_eq!(input.links()[1].dst_offset, 2);
        assert_eq!(input.required_element_count(), 4);
    }

    #[test]
    fn test_identity_link_rejects_second_connection() {
        let mut input = Input::new("r2", "in", ElementType::F64, true);
        let identity_link = Link::new(
            LinkType::Identity,
            "",
            "r1",
            "out",
            "r2",
            "in",
            0,
            ElementType::F64,
            2,
        );
        input.add_link(identity_link).unwrap();
        let second = Link::new(
            LinkType::Identity,
            "",
            "r1b",
            "out",
            "r2",
            "in",
            0,
            ElementType::F64,
            2,
        );
        assert!(input.add_link(second).is_err());
    }

    #[test]
    fn test_output_tracks_outgoing_link_count() {
        let mut output = Output::new("r1", "out", ElementType::F64);
        assert!(!output.has_outgoing_links());
        output.add_outbound();
        assert!(output.has_outgoing_links());
        output.remove_outbound();
        assert!(!output.has_outgoing_links());
    }
}
