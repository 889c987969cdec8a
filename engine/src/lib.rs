//! A dataflow engine for wiring named, typed computation nodes into a
//! graph and running it iteration by iteration.
//!
//! A [`network::Network`] owns a set of named [`region::Region`]s, each
//! backed by a [`region::RegionImpl`] plugin. Regions are wired together
//! with [`link::Link`]s — one-to-one pipes with an optional propagation
//! delay — and assigned to phases that control which regions compute on a
//! given iteration. The design is modeled on NuPIC-style region/link
//! dataflow engines; region-specific algorithms (spatial poolers, temporal
//! memory, and the like) are out of scope — this crate only provides the
//! graph container, phase scheduler, run loop, and save/load around it.
//!
//! ```
//! use dataflow_engine::factory::RegionImplFactory;
//! use dataflow_engine::link::LinkType;
//! use dataflow_engine::network::Network;
//! use dataflow_engine::testing::register_test_regions;
//!
//! let mut factory = RegionImplFactory::new();
//! register_test_regions(&mut factory).unwrap();
//!
//! let mut net = Network::new(factory);
//! net.add_region("source", "Constant", "value=10").unwrap();
//! net.add_region("sink", "Sink", "").unwrap();
//! net.link("source", "sink", LinkType::Identity, "", None, None, 0).unwrap();
//! net.run(1).unwrap();
//! ```

pub mod array;
pub mod collections;
pub mod error;
pub mod factory;
pub mod link;
pub mod network;
pub mod params;
mod persistence;
pub mod port;
pub mod region;
pub mod spec;
pub mod testing;

pub use error::{EngineError, Result};
pub use network::Network;
