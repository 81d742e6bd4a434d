//! A `Cell` is one binary unit of a cortical area.
//!
//! Biological inspiration:
//! Pyramidal neurons receive feed-forward input near the soma, context from their own
//! layer on distal dendrites, and feedback from other areas on apical dendrites.
//!
//! Meaning here:
//! A cell owns two ordered lists of segments, apical (cross-area) and distal
//! (same-area). It also remembers every synapse elsewhere in the graph that uses it
//! as presynaptic source. Those receptor synapses are lookup handles only; each
//! synapse is owned by its segment.

use super::segment::SegmentKind;
use super::types::{AreaId, SegmentId, SynapseId};

/// Represents a cell and the segments it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct CellData {
    pub(crate) area: AreaId,
    /// Index of the cell inside its area.
    pub(crate) index: usize,
    pub(crate) apical: Vec<SegmentId>,
    pub(crate) distal: Vec<SegmentId>,
    pub(crate) receptors: Vec<SynapseId>,
}

impl CellData {
    pub(crate) fn new(area: AreaId, index: usize) -> Self {
        Self {
            area,
            index,
            apical: Vec::new(),
            distal: Vec::new(),
            receptors: Vec::new(),
        }
    }

    #[inline]
    pub fn area(&self) -> AreaId {
        self.area
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Segments of the given kind, oldest first.
    #[inline]
    pub fn segments(&self, kind: SegmentKind) -> &[SegmentId] {
        match kind {
            SegmentKind::Apical => &self.apical,
            SegmentKind::Distal => &self.distal,
        }
    }

    #[inline]
    pub(crate) fn segments_mut(&mut self, kind: SegmentKind) -> &mut Vec<SegmentId> {
        match kind {
            SegmentKind::Apical => &mut self.apical,
            SegmentKind::Distal => &mut self.distal,
        }
    }

    /// All segments, apical before distal.
    pub fn all_segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.apical.iter().chain(self.distal.iter()).copied()
    }

    /// Total number of apical and distal segments.
    #[inline]
    pub fn num_segments(&self) -> usize {
        self.apical.len() + self.distal.len()
    }

    /// Synapses on other segments that use this cell as their source.
    #[inline]
    pub fn receptor_synapses(&self) -> &[SynapseId] {
        &self.receptors
    }
}
