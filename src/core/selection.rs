//! Segment classification and the selection heuristics built on it.
//!
//! Everything here is a pure function of the current graph. Classification is a
//! snapshot: adaptation changes connected-synapse counts, so callers classify
//! again after mutating instead of holding on to an old result.
//!
//! Classification looks at one segment kind at a time: apical segments answer to
//! other areas, distal segments to the cell's own area. Enumeration order, which
//! also decides ties, is fixed: cells in the order given (ascending ids when they
//! come from an area), then the position of the segment on its cell.

use super::config::AssociationConfig;
use super::connections::Connections;
use super::random::RandomSource;
use super::segment::SegmentKind;
use super::types::{CellId, Permanence, SegmentId};

/// Segments of a set of cells partitioned by connected-synapse count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentClassification {
    /// At least `activation_threshold` connected synapses.
    pub active: Vec<SegmentId>,
    /// At least `min_threshold` but fewer than `activation_threshold` connected synapses.
    pub matching: Vec<SegmentId>,
    /// Fewer than `min_threshold` connected synapses.
    pub inactive: Vec<SegmentId>,
}

impl SegmentClassification {
    pub fn len(&self) -> usize {
        self.active.len() + self.matching.len() + self.inactive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classifies the segments of `kind` on `cells`.
///
/// Unknown cells are skipped.
pub fn classify_segments(
    graph: &Connections,
    cells: &[CellId],
    kind: SegmentKind,
    config: &AssociationConfig,
) -> SegmentClassification {
    let mut classification = SegmentClassification::default();

    for &cell in cells {
        let Ok(data) = graph.cell(cell) else {
            continue;
        };
        for &segment in data.segments(kind) {
            let connected = graph.num_synapses_at_least(segment, config.connected_permanence);
            if connected >= config.activation_threshold {
                classification.active.push(segment);
            } else if connected >= config.min_threshold {
                classification.matching.push(segment);
            } else {
                classification.inactive.push(segment);
            }
        }
    }

    classification
}

/// Picks the segment with the most potential synapses (permanence at or above
/// `potential_permanence`). The first one in `segments` wins ties.
pub fn segment_with_highest_potential(
    graph: &Connections,
    segments: &[SegmentId],
    potential_permanence: Permanence,
) -> Option<SegmentId> {
    let mut best: Option<(SegmentId, usize)> = None;

    for &segment in segments {
        if graph.segment(segment).is_none() {
            continue;
        }
        let potential = graph.num_synapses_at_least(segment, potential_permanence);
        if best.map_or(true, |(_, score)| potential > score) {
            best = Some((segment, potential));
        }
    }

    best.map(|(segment, _)| segment)
}

/// Identifies the cell with the fewest segments (apical plus distal).
///
/// If several cells share the minimum, one of them is chosen by a single draw from
/// `rng` over the tied cells in ascending id order. No draw happens when there is
/// only one candidate.
pub fn least_used_cell<R: RandomSource + ?Sized>(
    graph: &Connections,
    cells: &[CellId],
    rng: &mut R,
) -> Option<CellId> {
    let mut min_segments = usize::MAX;
    let mut min_cells = Vec::new();

    for &cell in cells {
        let Ok(data) = graph.cell(cell) else {
            continue;
        };
        let count = data.num_segments();
        if count < min_segments {
            min_segments = count;
            min_cells.clear();
            min_cells.push(cell);
        } else if count == min_segments {
            min_cells.push(cell);
        }
    }

    min_cells.sort_unstable();
    min_cells.dedup();

    match min_cells.len() {
        0 => None,
        1 => Some(min_cells[0]),
        n => Some(min_cells[rng.next_index(n)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::seeded;

    fn config() -> AssociationConfig {
        AssociationConfig {
            activation_threshold: 3,
            min_threshold: 2,
            connected_permanence: 0.5,
            potential_permanence: 0.1,
            ..Default::default()
        }
    }

    /// Segment on `cell` with one synapse per permanence, sources starting at cell 100.
    fn segment_with(
        graph: &mut Connections,
        cell: u32,
        kind: SegmentKind,
        perms: &[f64],
    ) -> SegmentId {
        let segment = graph.create_segment(CellId(cell), kind, 0, 16).unwrap();
        for (i, &p) in perms.iter().enumerate() {
            graph
                .create_synapse(segment, CellId(100 + i as u32), p, 32)
                .unwrap();
        }
        segment
    }

    fn graph() -> Connections {
        let mut graph = Connections::new();
        graph.add_area("a", 200).unwrap();
        graph
    }

    #[test]
    fn segments_are_partitioned_by_connected_count() {
        let mut graph = graph();
        let active = segment_with(&mut graph, 0, SegmentKind::Distal, &[0.6, 0.6, 0.6]);
        let matching = segment_with(&mut graph, 0, SegmentKind::Distal, &[0.6, 0.6, 0.2]);
        let inactive = segment_with(&mut graph, 1, SegmentKind::Distal, &[0.6, 0.3]);
        segment_with(&mut graph, 2, SegmentKind::Distal, &[0.9, 0.9, 0.9]);

        let cells = [CellId(0), CellId(1)];
        let classes = classify_segments(&graph, &cells, SegmentKind::Distal, &config());

        assert_eq!(classes.active, vec![active]);
        assert_eq!(classes.matching, vec![matching]);
        assert_eq!(classes.inactive, vec![inactive]);
        assert_eq!(classes.len(), 3);
    }

    #[test]
    fn only_requested_kind_is_classified() {
        let mut graph = graph();
        let distal = segment_with(&mut graph, 0, SegmentKind::Distal, &[0.6, 0.6]);
        let apical = segment_with(&mut graph, 0, SegmentKind::Apical, &[0.6, 0.6, 0.6]);

        let classes = classify_segments(&graph, &[CellId(0)], SegmentKind::Apical, &config());
        assert_eq!(classes.active, vec![apical]);
        assert!(classes.matching.is_empty());

        let classes = classify_segments(&graph, &[CellId(0)], SegmentKind::Distal, &config());
        assert_eq!(classes.matching, vec![distal]);
        assert_eq!(classes.len(), 1);
    }

    #[test]
    fn highest_potential_wins() {
        let mut graph = graph();
        let three = segment_with(&mut graph, 0, SegmentKind::Distal, &[0.6, 0.6, 0.2]);
        let five = segment_with(
            &mut graph,
            1,
            SegmentKind::Distal,
            &[0.6, 0.6, 0.2, 0.2, 0.2],
        );

        let best = segment_with_highest_potential(&graph, &[three, five], 0.1);
        assert_eq!(best, Some(five));
    }

    #[test]
    fn synapses_below_potential_threshold_do_not_count() {
        let mut graph = graph();
        let strong = segment_with(&mut graph, 0, SegmentKind::Distal, &[0.6, 0.6, 0.3]);
        let weak = segment_with(&mut graph, 1, SegmentKind::Distal, &[0.6, 0.6, 0.05, 0.05]);

        assert_eq!(
            segment_with_highest_potential(&graph, &[weak, strong], 0.1),
            Some(strong)
        );
    }

    #[test]
    fn potential_ties_go_to_first_segment() {
        let mut graph = graph();
        let first = segment_with(&mut graph, 3, SegmentKind::Distal, &[0.6, 0.6]);
        let second = segment_with(&mut graph, 1, SegmentKind::Distal, &[0.6, 0.6]);

        assert_eq!(
            segment_with_highest_potential(&graph, &[first, second], 0.1),
            Some(first)
        );
        assert_eq!(
            segment_with_highest_potential(&graph, &[second, first], 0.1),
            Some(second)
        );
        assert_eq!(segment_with_highest_potential(&graph, &[], 0.1), None);
    }

    #[test]
    fn least_used_cell_has_fewest_segments() {
        let mut graph = graph();
        segment_with(&mut graph, 0, SegmentKind::Distal, &[0.5]);
        segment_with(&mut graph, 1, SegmentKind::Apical, &[0.5]);
        segment_with(&mut graph, 1, SegmentKind::Distal, &[0.5]);

        let mut rng = seeded(1);
        let cells = [CellId(0), CellId(1), CellId(2)];
        assert_eq!(least_used_cell(&graph, &cells, &mut rng), Some(CellId(2)));
        assert_eq!(least_used_cell(&graph, &[], &mut rng), None);
    }

    #[test]
    fn least_used_cell_ties_are_reproducible() {
        let graph = graph();
        let cells: Vec<CellId> = (0..10).map(CellId).collect();
        let reversed: Vec<CellId> = cells.iter().rev().copied().collect();

        let picks = |cells: &[CellId]| {
            let mut rng = seeded(5);
            (0..8)
                .map(|_| least_used_cell(&graph, cells, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };

        assert_eq!(picks(&cells), picks(&reversed));
        assert!(picks(&cells).iter().all(|c| c.0 < 10));
    }
}
