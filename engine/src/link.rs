//! One-to-one pipe from a source Output to a destination Input, optionally
//! delayed by a FIFO of past buffers (propagation delay).
//!
//! Ownership follows DESIGN.md's "cyclic graph of owned nodes" resolution:
//! a [`Link`] is pure data, owned by its destination [`crate::port::Input`],
//! and refers to its producer only by region/port name. The engine resolves
//! those names against the [`crate::network::Network`] at the moments it
//! needs live data (`prepareInputs` for zero-delay links, `shiftBufferedData`
//! always); a `Link` never holds a pointer back into another region, which
//! sidesteps the aliasing/lifetime problems a literal port of raw
//! `Output*`/`Input*` pointers would create in Rust.

use std::collections::VecDeque;

use crate::array::{Array, ElementType};

/// Selects a size/fan-in policy for a link. `Identity` is a strict 1:1 pipe
/// and rejects a second connection to the same input; `Concat` accepts
/// fan-in and gives each additional link a well-defined offset into the
/// destination's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Identity,
    Concat,
}

impl LinkType {
    pub fn accepts_fan_in(&self) -> bool {
        matches!(self, LinkType::Concat)
    }

    pub fn parse(name: &str) -> LinkType {
        match name {
            "concat" | "fanin" => LinkType::Concat,
            _ => LinkType::Identity,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Identity => "identity",
            LinkType::Concat => "concat",
        }
    }
}

/// A directed, optionally-delayed connection between one Output and one
/// Input.
#[derive(Debug, Clone)]
pub struct Link {
    pub link_type: LinkType,
    pub link_params: String,
    pub src_region: String,
    pub src_output: String,
    pub dst_region: String,
    pub dst_input: String,
    pub propagation_delay: u32,
    /// Offset, in elements, this link's contribution starts at within the
    /// destination Input's array. `0` for a plain 1:1 link.
    pub dst_offset: usize,
    pub element_type: ElementType,
    /// Number of elements this link contributes (the producer's current
    /// Output size at the time the link was sized).
    pub element_count: usize,
    /// Exactly `propagation_delay` buffers once initialized. Empty for
    /// delay 0 — in that case the "head" is always read live from the
    /// producer's current Output (see `crate::network`).
    delay_queue: VecDeque<Array>,
}

impl Link {
    pub fn new(
        link_type: LinkType,
        link_params: impl Into<String>,
        src_region: impl Into<String>,
        src_output: impl Into<String>,
        dst_region: impl Into<String>,
        dst_input: impl Into<String>,
        propagation_delay: u32,
        element_type: ElementType,
        element_count: usize,
    ) -> Self {
        let mut delay_queue = VecDeque::with_capacity(propagation_delay as usize);
        for _ in 0..propagation_delay {
            delay_queue.push_back(Array::zeros(element_type, element_count));
        }
        Self {
            link_type,
            link_params: link_params.into(),
            src_region: src_region.into(),
            src_output: src_output.into(),
            dst_region: dst_region.into(),
            dst_input: dst_input.into(),
            propagation_delay,
            dst_offset: 0,
            element_type,
            element_count,
            delay_queue,
        }
    }

    /// The currently delivered buffer for a delayed link (`None` for
    /// delay 0 — the caller must read the producer's live Output instead).
    pub fn delayed_head(&self) -> Option<&Array> {
        self.delay_queue.front()
    }

    /// Enqueue `current_output` (a copy of the producer's current Output)
    /// at the tail and drop the head. No-op when `propagation_delay == 0`.
    pub fn shift_buffered_data(&mut self, current_output: &Array) {
        if self.propagation_delay == 0 {
            return;
        }
        self.delay_queue.push_back(current_output.clone());
        self.delay_queue.pop_front();
    }

    /// Queue contents excluding the newest slot, for persistence — the
    /// newest slot is redundant with the source Output's saved buffer.
    pub fn queue_without_newest(&self) -> Vec<Array> {
        let mut items: Vec<Array> = self.delay_queue.iter().cloned().collect();
        items.pop();
        items
    }

    /// Re-sizes this link for a producer whose current Output length is
    /// `producer_len`, rebuilding the delay queue to zero-filled buffers of
    /// the new length. A no-op if the length hasn't changed, so it never
    /// clobbers a queue that already holds real delayed data (e.g. one just
    /// restored by [`Link::restore_queue`]).
    pub fn resize_for_producer(&mut self, producer_len: usize) {
        if self.element_count == producer_len {
            return;
        }
        self.element_count = producer_len;
        let mut queue = VecDeque::with_capacity(self.propagation_delay as usize);
        for _ in 0..self.propagation_delay {
            queue.push_back(Array::zeros(self.element_type, producer_len));
        }
        self.delay_queue = queue;
    }

    /// Rebuild the delay queue from persisted "older slots" content (oldest
    /// first), preceded by a placeholder for the not-yet-restored newest
    /// slot. The placeholder sits at the front so the post-load
    /// `shift_buffered_data` call evicts exactly it — pushing the restored
    /// current Output to the back — reproducing the pre-save queue exactly.
    pub fn restore_queue(&mut self, older_slots: Vec<Array>) {
        let mut queue: VecDeque<Array> = VecDeque::with_capacity(older_slots.len() + 1);
        queue.push_back(Array::zeros(self.element_type, self.element_count));
        queue.extend(older_slots);
        self.delay_queue = queue;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(delay: u32) -> Link {
        Link::new(
            LinkType::Identity,
            "",
            "r1",
            "out",
            "r2",
            "in",
            delay,
            ElementType::F64,
            4,
        )
    }

    #[test]
    fn test_zero_delay_queue_is_empty_and_head_is_none() {
        let l = link(0);
        assert_eq!(l.delayed_head(), None);
    }

    #[test]
    fn test_delay_queue_starts_zero_filled() {
        let l = link(2);
        assert_eq!(l.delayed_head(), Some(&Array::F64(vec![0.0; 4])));
    }

    #[test]
    fn test_shift_enqueues_and_drops_head() {
        let mut l = link(1);
        let out = Array::F64(vec![10.0; 4]);
        assert_eq!(l.delayed_head(), Some(&Array::F64(vec![0.0; 4])));
        l.shift_buffered_data(&out);
        assert_eq!(l.delayed_head(), Some(&out));
    }

    #[test]
    fn test_zero_delay_shift_is_noop() {
        let mut l = link(0);
        l.shift_buffered_data(&Array::F64(vec![1.0; 4]));
        assert_eq!(l.delayed_head(), None);
    }

    #[test]
    fn test_queue_without_newest_drops_last_slot() {
        let mut l = link(2);
        l.shift_buffered_data(&Array::F64(vec![1.0; 4]));
        l.shift_buffered_data(&Array::F64(vec![2.0; 4]));
        // queue now holds [1.0*4, 2.0*4]; newest is 2.0*4, dropped for persistence.
        let persisted = l.queue_without_newest();
        assert_eq!(persisted, vec![Array::F64(vec![1.0; 4])]);
    }

    #[test]
    fn test_resize_for_producer_is_noop_when_length_unchanged() {
        let mut l = link(1);
        l.shift_buffered_data(&Array::F64(vec![7.0; 4]));
        l.resize_for_producer(4);
        assert_eq!(l.delayed_head(), Some(&Array::F64(vec![7.0; 4])));
    }

    #[test]
    fn test_resize_for_producer_rebuilds_on_length_change() {
        let mut l = link(1);
        l.shift_buffered_data(&Array::F64(vec![7.0; 4]));
        l.resize_for_producer(8);
        assert_eq!(l.delayed_head(), Some(&Array::F64(vec![0.0; 8])));
    }

    #[test]
    fn test_restore_then_shift_reproduces_saved_queue() {
        let mut l = link(2);
        l.shift_buffered_data(&Array::F64(vec![1.0; 4]));
        l.shift_buffered_data(&Array::F64(vec![2.0; 4]));
        let persisted = l.queue_without_newest();
        let restored_current_output = Array::F64(vec![2.0; 4]);

        let mut l2 = link(2);
        l2.restore_queue(persisted);
        l2.shift_buffered_data(&restored_current_output);

        assert_eq!(l.delayed_head(), l2.delayed_head());
    }
}
