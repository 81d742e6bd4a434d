//! Per-cycle activity record of an area's segments.
//!
//! At the end of every compute call the engine counts, for each segment of the
//! owning area, how many of its synapses come from cells that were active in the
//! associated areas. The next call reads the potential counts to size synapse
//! growth on the matching segment it adapts. Downstream logic can use the connected
//! counts to find depolarized cells.
//!
//! Counting walks the receptor synapses of the active cells, so the cost depends on
//! the number of outgoing edges of active cells rather than the size of the graph.

use super::area::CorticalArea;
use super::connections::Connections;
use super::types::{CellId, Permanence, SegmentId};
use fxhash::FxHashMap;

/// Activity counts of one segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SegmentCounts {
    /// Ordinal of the segment the counts belong to.
    pub ordinal: u64,
    /// Synapses from active cells at or above the potential threshold.
    pub active_potential: usize,
    /// Synapses from active cells at or above the connected threshold.
    pub active_connected: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentActivity {
    iteration: u64,
    segments: FxHashMap<SegmentId, SegmentCounts>,
}

impl SegmentActivity {
    /// Counts synapses from `active_cells` on segments owned by cells of `area`.
    ///
    /// `active_cells` must be free of duplicates.
    pub fn compute(
        graph: &Connections,
        area: &CorticalArea,
        active_cells: &[CellId],
        potential_permanence: Permanence,
        connected_permanence: Permanence,
        iteration: u64,
    ) -> Self {
        let mut segments: FxHashMap<SegmentId, SegmentCounts> = FxHashMap::default();

        for &cell in active_cells {
            let Ok(receptors) = graph.receptor_synapses(cell) else {
                continue;
            };
            for &synapse in receptors {
                let Some(syn) = graph.synapse(synapse) else {
                    continue;
                };
                let Some(segment) = graph.segment(syn.segment()) else {
                    continue;
                };
                if !area.contains(segment.cell()) {
                    continue;
                }

                let counts = segments.entry(syn.segment()).or_insert(SegmentCounts {
                    ordinal: segment.ordinal(),
                    ..Default::default()
                });
                if syn.permanence() >= potential_permanence {
                    counts.active_potential += 1;
                }
                if syn.permanence() >= connected_permanence {
                    counts.active_connected += 1;
                }
            }
        }

        Self {
            iteration,
            segments,
        }
    }

    /// Engine iteration at which the record was taken.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Number of segments with at least one synapse from an active cell.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Recorded counts for a segment, regardless of whether its slot was reused since.
    pub fn counts(&self, segment: SegmentId) -> Option<&SegmentCounts> {
        self.segments.get(&segment)
    }

    /// Recorded potential count of `segment`, or 0 when the segment was not
    /// recorded or its slot now holds a different segment.
    pub fn active_potential(&self, graph: &Connections, segment: SegmentId) -> usize {
        match (self.segments.get(&segment), graph.segment(segment)) {
            (Some(counts), Some(data)) if counts.ordinal == data.ordinal() => {
                counts.active_potential
            }
            _ => 0,
        }
    }

    /// Segments with at least `threshold` connected synapses from active cells, ascending.
    pub fn active_segments(&self, threshold: usize) -> Vec<SegmentId> {
        let mut segments: Vec<SegmentId> = self
            .segments
            .iter()
            .filter(|(_, counts)| counts.active_connected >= threshold)
            .map(|(&segment, _)| segment)
            .collect();
        segments.sort_unstable();
        segments
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &SegmentCounts)> {
        self.segments.iter().map(|(&segment, counts)| (segment, counts))
    }
}
