//! Dendritic segments.
//!
//! A segment is a bundle of synapses on one cell representing one associative
//! pattern. Segments come in two kinds that share all fields and operations:
//!
//! - **Apical** segments hold associations with cells of *other* areas.
//! - **Distal** segments hold associations with cells of the *same* area.
//!
//! The kind is a plain tag. Everything that depends on it matches on it
//! exhaustively, so there is no way to hand the graph a segment it does not know
//! how to file.

use super::types::{AreaId, CellId, SynapseId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a segment holds cross-area or same-area associations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    Apical,
    Distal,
}

impl SegmentKind {
    /// Both kinds, in the order segments of a cell are enumerated.
    pub const ALL: [SegmentKind; 2] = [SegmentKind::Apical, SegmentKind::Distal];

    /// Kind of segment a responding area grows for activity coming from `driving`.
    #[inline]
    pub fn for_association(responding: AreaId, driving: AreaId) -> Self {
        if responding == driving {
            SegmentKind::Distal
        } else {
            SegmentKind::Apical
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentKind::Apical => f.write_str("apical"),
            SegmentKind::Distal => f.write_str("distal"),
        }
    }
}

/// A segment slot in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentData {
    pub(crate) kind: SegmentKind,
    pub(crate) cell: CellId,
    /// Engine iteration at which the segment was created.
    pub(crate) created: u64,
    /// Engine iteration at which the segment was last adapted.
    pub(crate) last_used: u64,
    /// Unique for the lifetime of the graph, unlike the recycled slot id.
    pub(crate) ordinal: u64,
    /// Owned synapses in insertion order.
    pub(crate) synapses: Vec<SynapseId>,
}

impl SegmentData {
    pub(crate) fn new(kind: SegmentKind, cell: CellId, iteration: u64, ordinal: u64) -> Self {
        Self {
            kind,
            cell,
            created: iteration,
            last_used: iteration,
            ordinal,
            synapses: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// The cell owning this segment.
    #[inline]
    pub fn cell(&self) -> CellId {
        self.cell
    }

    #[inline]
    pub fn created(&self) -> u64 {
        self.created
    }

    #[inline]
    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    #[inline]
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    #[inline]
    pub fn synapses(&self) -> &[SynapseId] {
        &self.synapses
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.synapses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.synapses.is_empty()
    }
}
