//! A `Synapse` is a directed, weighted edge from a presynaptic cell to a segment.
//!
//! Each synapse is owned by exactly one segment. The presynaptic cell only keeps a
//! back-reference to it (its "receptor synapses"), which lets the graph find every
//! outgoing edge of a cell without scanning all segments.
//!
//! If the permanence is at or above the connected threshold, the synapse is
//! "connected" and counts toward the segment's classification. During learning the
//! permanence is increased when the presynaptic cell drove the cycle and decreased
//! otherwise. Once it drops below epsilon the synapse is destroyed.
//!
//! The data itself lives in a flat slot vector inside
//! [`Connections`](super::connections::Connections); this module only defines what
//! a slot holds and how permanence moves.

use super::config::AssociationConfig;
use super::types::{clamp_permanence, CellId, Permanence, SegmentId};

/// A synapse connecting a presynaptic cell with a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SynapseData {
    pub(crate) presynaptic_cell: CellId,
    pub(crate) segment: SegmentId,
    pub(crate) permanence: Permanence,
    /// Graph-wide creation counter. Orders synapses by insertion.
    pub(crate) ordinal: u64,
}

impl SynapseData {
    pub(crate) fn new(
        presynaptic_cell: CellId,
        segment: SegmentId,
        permanence: Permanence,
        ordinal: u64,
    ) -> Self {
        Self {
            presynaptic_cell,
            segment,
            permanence: clamp_permanence(permanence),
            ordinal,
        }
    }

    /// The cell this synapse receives activity from.
    #[inline]
    pub fn presynaptic_cell(&self) -> CellId {
        self.presynaptic_cell
    }

    /// The segment owning this synapse.
    #[inline]
    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    #[inline]
    pub fn permanence(&self) -> Permanence {
        self.permanence
    }

    /// Insertion order of this synapse among all synapses ever created in the graph.
    #[inline]
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// True if the permanence reaches `threshold`.
    #[inline]
    pub fn is_connected(&self, threshold: Permanence) -> bool {
        self.permanence >= threshold
    }
}

/// Options governing how synapse permanence is adjusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermanenceOptions {
    pub increment: Permanence,
    pub decrement: Permanence,
    pub epsilon: Permanence,
}

impl PermanenceOptions {
    pub fn from_config(config: &AssociationConfig) -> Self {
        Self {
            increment: config.permanence_increment,
            decrement: config.permanence_decrement,
            epsilon: config.epsilon,
        }
    }

    /// Returns the adapted permanence, or `None` if the synapse should be destroyed.
    #[inline]
    pub fn adapt(&self, permanence: Permanence, driving: bool) -> Option<Permanence> {
        let permanence = if driving {
            permanence + self.increment
        } else {
            permanence - self.decrement
        };
        let permanence = clamp_permanence(permanence);

        if permanence < self.epsilon {
            None
        } else {
            Some(permanence)
        }
    }
}
