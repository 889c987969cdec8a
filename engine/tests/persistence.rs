//! Integration coverage for save/load: building a multi-phase feedback
//! cycle, running it partway, saving, loading into a fresh engine, and
//! confirming both continue identically.

use std::collections::BTreeSet;

use dataflow_engine::factory::RegionImplFactory;
use dataflow_engine::link::LinkType;
use dataflow_engine::network::Network;
use dataflow_engine::testing::register_test_regions;

fn factory() -> RegionImplFactory {
    let mut f = RegionImplFactory::new();
    register_test_regions(&mut f).unwrap();
    f
}

fn first(net: &Network, region: &str) -> f64 {
    net.region(region).unwrap().outputs.get("out").unwrap().array.as_f64().unwrap()[0]
}

fn build_feedback_lateral_cycle(net: &mut Network) {
    net.add_region("r1", "Constant", "value=1,count=1").unwrap();
    net.add_region("r2", "Constant", "value=5,count=1").unwrap();
    net.add_region("r3", "Adder", "base=0,count=1").unwrap();
    net.add_region("r4", "Adder", "base=0,count=1").unwrap();

    net.set_phases("r1", &BTreeSet::from([0])).unwrap();
    net.set_phases("r2", &BTreeSet::from([0])).unwrap();
    net.set_phases("r3", &BTreeSet::from([1])).unwrap();
    net.set_phases("r4", &BTreeSet::from([1])).unwrap();

    net.link("r1", "r3", LinkType::Concat, "", None, None, 0).unwrap();
    net.link("r2", "r4", LinkType::Concat, "", None, None, 0).unwrap();
    net.link("r3", "r1", LinkType::Identity, "", None, Some("feedbackIn"), 1).unwrap();
    net.link("r4", "r2", LinkType::Identity, "", None, Some("feedbackIn"), 1).unwrap();
    net.link("r3", "r4", LinkType::Concat, "", None, None, 1).unwrap();
    net.link("r4", "r3", LinkType::Concat, "", None, None, 1).unwrap();
}

#[test]
fn test_save_load_mid_flight_continues_identically() {
    let mut original = Network::new(factory());
    build_feedback_lateral_cycle(&mut original);
    original.run(2).unwrap();
    assert_eq!(
        (first(&original, "r1"), first(&original, "r2"), first(&original, "r3"), first(&original, "r4")),
        (2.0, 10.0, 7.0, 11.0)
    );

    let saved = original.save().unwrap();

    let mut restored = Network::new(factory());
    restored.load(&saved).unwrap();
    assert_eq!(restored.iteration(), 2);
    assert_eq!(
        (first(&restored, "r1"), first(&restored, "r2"), first(&restored, "r3"), first(&restored, "r4")),
        (2.0, 10.0, 7.0, 11.0)
    );

    original.run(2).unwrap();
    restored.run(2).unwrap();
    assert_eq!(
        (first(&original, "r1"), first(&original, "r2"), first(&original, "r3"), first(&original, "r4")),
        (first(&restored, "r1"), first(&restored, "r2"), first(&restored, "r3"), first(&restored, "r4"))
    );
    assert_eq!(
        (first(&original, "r1"), first(&original, "r2"), first(&original, "r3"), first(&original, "r4")),
        (8.0, 16.0, 19.0, 23.0)
    );
}

#[test]
fn test_save_is_deterministic_for_unchanged_state() {
    let mut net = Network::new(factory());
    build_feedback_lateral_cycle(&mut net);
    net.run(1).unwrap();
    assert_eq!(net.save().unwrap(), net.save().unwrap());
}

#[test]
fn test_load_of_garbage_input_is_an_error_and_leaves_network_empty() {
    let mut net = Network::new(factory());
    build_feedback_lateral_cycle(&mut net);
    assert!(net.load("not a valid frame at all").is_err());
    assert_eq!(net.region_names().count(), 0);
}
