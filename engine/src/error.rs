//! Error types for the dataflow engine.
//!
//! One variant per failure family named in the engine's error design;
//! variants carry enough context (region/port/phase) that a caller never
//! has to reconstruct the failure from a bare string.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no region named '{0}' in this network")]
    UnknownRegion(String),

    #[error("region '{region}' has no port named '{port}'")]
    UnknownPort { region: String, port: String },

    #[error("no region impl registered for nodeType '{0}'")]
    UnknownNodeType(String),

    #[error("a region named '{0}' already exists in this network")]
    DuplicateRegion(String),

    #[error("a callback named '{0}' is already registered")]
    DuplicateCallback(String),

    #[error("nodeType '{0}' is already registered in the factory")]
    DuplicateRegistration(String),

    #[error("cannot remove region '{0}': it still has outgoing links")]
    HasOutgoingLinks(String),

    #[error(
        "link type mismatch: source '{src_region}.{src_port}' is {src_type:?}, \
         destination '{dst_region}.{dst_port}' is {dst_type:?}"
    )]
    LinkTypeMismatch {
        src_region: String,
        src_port: String,
        src_type: crate::array::ElementType,
        dst_region: String,
        dst_port: String,
        dst_type: crate::array::ElementType,
    },

    #[error("input '{region}.{port}' does not accept more than one incoming link")]
    LinkFanInUnsupported { region: String, port: String },

    #[error("no link from '{src_region}.{src_port}' to '{dst_region}.{dst_port}'")]
    NoSuchLink {
        src_region: String,
        src_port: String,
        dst_region: String,
        dst_port: String,
    },

    #[error("cannot set an empty phase set for region '{0}'")]
    EmptyPhases(String),

    #[error(
        "phase {requested} is too far past the next phase {next_phase} for region '{region}' \
         (jump of more than 3 is probably a mistake)"
    )]
    PhaseTooLarge {
        region: String,
        requested: u32,
        next_phase: u32,
    },

    #[error("phase {requested} is out of range; network only has {phase_count} phase slots")]
    PhaseOutOfRange { requested: u32, phase_count: usize },

    #[error("region '{0}' has not been initialized")]
    NotInitialized(String),

    #[error("cannot modify links on region '{0}' while it is initialized")]
    RegionInitialized(String),

    #[error("executeCommand called with an empty argument list")]
    EmptyCommand,

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("parameter '{name}' expected type {expected}, found {found}")]
    ParameterTypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("persisted network version {found} is older than the minimum supported version {minimum}")]
    UnsupportedVersion { found: u32, minimum: u32 },

    #[error("malformed persisted state: {0}")]
    MalformedState(String),

    #[error("link reference to unknown endpoint: {0}")]
    InvalidLinkRef(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
