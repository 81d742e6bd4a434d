//! Error type shared by the whole crate.

use crate::core::types::{AreaId, CellId, SegmentId, SynapseId};

/// Errors raised by configuration, graph and engine operations.
///
/// Every variant describes a precondition violation by the caller. The engine
/// never returns an error halfway through a cycle: checks run before mutation starts.
#[derive(Debug, thiserror::Error)]
pub enum AssociationError {
    #[error("invalid configuration:\n{0}")]
    InvalidConfig(String),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown cell {0}")]
    UnknownCell(CellId),

    #[error("unknown or destroyed segment {0}")]
    UnknownSegment(SegmentId),

    #[error("unknown or destroyed synapse {0}")]
    UnknownSynapse(SynapseId),

    #[error("unknown area {0}")]
    UnknownArea(AreaId),

    #[error("an area named '{0}' already exists")]
    DuplicateArea(String),

    #[error("cell index {index} is outside area '{area}' of {size} cells")]
    CellOutOfRange {
        area: String,
        index: usize,
        size: usize,
    },

    #[error("{cell} does not belong to area '{area}'")]
    CellNotInArea { area: String, cell: CellId },

    #[error("engine owns area {expected} but was given area {actual}")]
    AreaMismatch { expected: AreaId, actual: AreaId },

    #[error("graph invariant violated: {0}")]
    Invariant(String),

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] bincode::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AssociationError>;
