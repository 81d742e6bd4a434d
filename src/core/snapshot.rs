//! Canonical, serializable view of a graph.
//!
//! Slot ids depend on the order in which slots were freed and reused, so the
//! snapshot leaves them out and lists the structure instead: every cell that owns
//! segments, its apical and distal segments in order, and their synapses in
//! insertion order. Two graphs that learned the same thing produce identical bytes.

use super::connections::Connections;
use super::segment::SegmentKind;
use super::types::{CellId, Permanence};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseSnapshot {
    pub presynaptic_cell: CellId,
    pub permanence: Permanence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSnapshot {
    pub kind: SegmentKind,
    pub created: u64,
    pub last_used: u64,
    pub synapses: Vec<SynapseSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub cell: CellId,
    pub segments: Vec<SegmentSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub num_cells: usize,
    pub cells: Vec<CellSnapshot>,
}

impl GraphSnapshot {
    pub fn capture(graph: &Connections) -> Self {
        let mut cells = Vec::new();

        for (cell, data) in graph.cells() {
            let mut segments = Vec::new();
            for segment in data.all_segments() {
                let Some(seg) = graph.segment(segment) else {
                    continue;
                };
                let synapses = seg
                    .synapses()
                    .iter()
                    .filter_map(|&s| graph.synapse(s))
                    .map(|syn| SynapseSnapshot {
                        presynaptic_cell: syn.presynaptic_cell(),
                        permanence: syn.permanence(),
                    })
                    .collect();
                segments.push(SegmentSnapshot {
                    kind: seg.kind(),
                    created: seg.created(),
                    last_used: seg.last_used(),
                    synapses,
                });
            }
            if !segments.is_empty() {
                cells.push(CellSnapshot { cell, segments });
            }
        }

        Self {
            num_cells: graph.num_cells(),
            cells,
        }
    }

    /// Encodes the snapshot with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn num_segments(&self) -> usize {
        self.cells.iter().map(|c| c.segments.len()).sum()
    }

    pub fn num_synapses(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|c| &c.segments)
            .map(|s| s.synapses.len())
            .sum()
    }
}

impl Connections {
    /// Shorthand for [`GraphSnapshot::capture`].
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(self)
    }
}
