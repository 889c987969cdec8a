//! Registry mapping a `nodeType` string to a Spec and constructors for
//! fresh or deserialized [`RegionImpl`]s.
//!
//! A plain `HashMap` keyed by name, a lazily-memoized descriptor per
//! entry, and register/unregister/create-instance operations — the same
//! shape as a typical plugin-discovery registry, but without a
//! process-wide `OnceLock<Mutex<_>>` singleton backing it: nothing here
//! needs cross-thread sharing, so the caller just owns one and passes it
//! to whatever needs to resolve a `nodeType`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{EngineError, Result};
use crate::params::ValueMap;
use crate::region::RegionImpl;
use crate::spec::RegionSpec;

pub type CreateSpecFn = fn() -> RegionSpec;
pub type CreateFromParamsFn = fn(&ValueMap) -> Result<Box<dyn RegionImpl>>;
pub type CreateFromSerializedFn = fn(&[u8]) -> Result<Box<dyn RegionImpl>>;

/// Everything the factory needs to know about one `nodeType`.
#[derive(Clone)]
pub struct RegionImplDescriptor {
    pub create_spec: CreateSpecFn,
    pub create_from_params: CreateFromParamsFn,
    pub create_from_serialized: CreateFromSerializedFn,
}

struct Registration {
    descriptor: RegionImplDescriptor,
    spec: Option<Rc<RegionSpec>>,
}

/// Caller-owned catalog of registered `nodeType`s. Not a process-wide
/// singleton — see the module doc for why.
#[derive(Default)]
pub struct RegionImplFactory {
    entries: HashMap<String, Registration>,
}

impl RegionImplFactory {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register(&mut self, node_type: impl Into<String>, descriptor: RegionImplDescriptor) -> Result<()> {
        let node_type = node_type.into();
        if self.entries.contains_key(&node_type) {
            return Err(EngineError::DuplicateRegistration(node_type));
        }
        self.entries.insert(
            node_type,
            Registration {
                descriptor,
                spec: None,
            },
        );
        Ok(())
    }

    pub fn unregister(&mut self, node_type: &str) -> bool {
        self.entries.remove(node_type).is_some()
    }

    pub fn is_registered(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// Lazily constructs and caches the Spec for `node_type` on first call.
    pub fn get_spec(&mut self, node_type: &str) -> Result<Rc<RegionSpec>> {
        let entry = self
            .entries
            .get_mut(node_type)
            .ok_or_else(|| EngineError::UnknownNodeType(node_type.to_string()))?;
        if entry.spec.is_none() {
            entry.spec = Some(Rc::new((entry.descriptor.create_spec)()));
        }
        Ok(entry.spec.clone().expect("just populated"))
    }

    pub fn create_region_impl(&mut self, node_type: &str, params: &ValueMap) -> Result<(Rc<RegionSpec>, Box<dyn RegionImpl>)> {
        let spec = self.get_spec(node_type)?;
        let descriptor = &self
            .entries
            .get(node_type)
            .ok_or_else(|| EngineError::UnknownNodeType(node_type.to_string()))?
            .descriptor;
        let region_impl = (descriptor.create_from_params)(params)?;
        Ok((spec, region_impl))
    }

    pub fn deserialize_region_impl(&mut self, node_type: &str, bundle: &[u8]) -> Result<(Rc<RegionSpec>, Box<dyn RegionImpl>)> {
        let spec = self.get_spec(node_type)?;
        let descriptor = &self
            .entries
            .get(node_type)
            .ok_or_else(|| EngineError::UnknownNodeType(node_type.to_string()))?
            .descriptor;
        let region_impl = (descriptor.create_from_serialized)(bundle)?;
        Ok((spec, region_impl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ElementType;
    use crate::region::RegionIo;
    use crate::spec::PortSpec;

    struct Echo;
    impl RegionImpl for Echo {
        fn compute(&mut self, _io: &mut RegionIo) -> Result<()> {
            Ok(())
        }
        fn serialize(&self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn echo_spec() -> RegionSpec {
        RegionSpec::new("Echo").with_output(PortSpec::new("out", ElementType::F64, 1))
    }

    fn echo_from_params(_params: &ValueMap) -> Result<Box<dyn RegionImpl>> {
        Ok(Box::new(Echo))
    }

    fn echo_from_serialized(_bundle: &[u8]) -> Result<Box<dyn RegionImpl>> {
        Ok(Box::new(Echo))
    }

    fn echo_descriptor() -> RegionImplDescriptor {
        RegionImplDescriptor {
            create_spec: echo_spec,
            create_from_params: echo_from_params,
            create_from_serialized: echo_from_serialized,
        }
    }

    #[test]
    fn test_register_then_create() {
        let mut factory = RegionImplFactory::new();
        factory.register("Echo", echo_descriptor()).unwrap();
        let params = ValueMap::new();
        let (spec, _impl) = factory.create_region_impl("Echo", &params).unwrap();
        assert_eq!(spec.node_type, "Echo");
    }

    #[test]
    fn test_spec_is_memoized() {
        let mut factory = RegionImplFactory::new();
        factory.register("Echo", echo_descriptor()).unwrap();
        let a = factory.get_spec("Echo").unwrap();
        let b = factory.get_spec("Echo").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut factory = RegionImplFactory::new();
        factory.register("Echo", echo_descriptor()).unwrap();
        assert!(matches!(
            factory.register("Echo", echo_descriptor()),
            Err(EngineError::DuplicateRegistration(_))
        ));
    }

    #[test]
    fn test_unknown_node_type_rejected() {
        let mut factory = RegionImplFactory::new();
        assert!(matches!(
            factory.get_spec("Nope"),
            Err(EngineError::UnknownNodeType(_))
        ));
    }
}
