//! Connections - the synaptic graph shared by all cortical areas.
//!
//! Cells, segments and synapses are kept in flat vectors and addressed by typed
//! indices. Destroyed segment and synapse slots go to free lists and are reused by
//! later creations, so a slot id alone does not identify a segment across cycles;
//! the segment ordinal does.
//!
//! Every synapse is recorded in two places: the segment that owns it and the
//! receptor list of its presynaptic cell. All removal paths go through
//! `release_synapse`, which updates both in one step.
//!
//! Capacity is enforced here:
//! - creating a segment on a cell that already holds `max_segments_per_cell`
//!   segments of that kind evicts the least recently used one,
//! - creating a synapse on a full segment evicts the synapse with the lowest
//!   permanence (the earliest inserted one on ties),
//! - a segment whose last synapse is destroyed is destroyed as well.

use super::area::CorticalArea;
use super::cell::CellData;
use super::config::AssociationConfig;
use super::random::RandomSource;
use super::segment::{SegmentData, SegmentKind};
use super::synapses::{PermanenceOptions, SynapseData};
use super::types::{
    clamp_permanence, AreaId, CellId, Permanence, SegmentId, SynapseId, MAX_PERMANENCE,
    MIN_PERMANENCE,
};
use crate::error::{AssociationError, Result};
use fxhash::FxHashSet;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
struct AreaRecord {
    name: String,
    first_cell: u32,
    num_cells: usize,
}

/// The cell/segment/synapse graph.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    cells: Vec<CellData>,
    areas: Vec<AreaRecord>,

    /// Segment slots; `None` marks a destroyed slot waiting in `free_segments`.
    segments: Vec<Option<SegmentData>>,
    free_segments: Vec<SegmentId>,

    /// Synapse slots; `None` marks a destroyed slot waiting in `free_synapses`.
    synapses: Vec<Option<SynapseData>>,
    free_synapses: Vec<SynapseId>,

    next_segment_ordinal: u64,
    next_synapse_ordinal: u64,

    /// Statistics: number of destroyed synapses.
    pruned_synapses: usize,

    /// Statistics: number of destroyed segments.
    pruned_segments: usize,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Areas and cells
    // ========================================================================

    /// Allocates `num_cells` new cells and registers them as a named area.
    pub fn add_area(&mut self, name: impl Into<String>, num_cells: usize) -> Result<CorticalArea> {
        let name = name.into();
        if self.areas.iter().any(|area| area.name == name) {
            return Err(AssociationError::DuplicateArea(name));
        }

        let id = AreaId::from(self.areas.len());
        let first_cell = self.cells.len() as u32;
        self.cells
            .extend((0..num_cells).map(|index| CellData::new(id, index)));
        self.areas.push(AreaRecord {
            name: name.clone(),
            first_cell,
            num_cells,
        });

        debug!(area = %name, %id, cells = num_cells, "registered cortical area");
        Ok(CorticalArea::new(id, name, first_cell, num_cells))
    }

    /// Fails unless `area` was created by this graph.
    pub fn check_area(&self, area: &CorticalArea) -> Result<()> {
        match self.areas.get(area.id().index()) {
            Some(record)
                if record.name == area.name()
                    && record.first_cell == area.first_cell()
                    && record.num_cells == area.len() =>
            {
                Ok(())
            }
            _ => Err(AssociationError::UnknownArea(area.id())),
        }
    }

    pub fn num_areas(&self) -> usize {
        self.areas.len()
    }

    pub fn area_name(&self, area: AreaId) -> Option<&str> {
        self.areas.get(area.index()).map(|record| record.name.as_str())
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, cell: CellId) -> Result<&CellData> {
        self.cells
            .get(cell.index())
            .ok_or(AssociationError::UnknownCell(cell))
    }

    /// All cells with their ids, ascending.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &CellData)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, cell)| (CellId::from(index), cell))
    }

    /// Segments of one kind on a cell, oldest first.
    pub fn segments_for_cell(&self, cell: CellId, kind: SegmentKind) -> Result<&[SegmentId]> {
        Ok(self.cell(cell)?.segments(kind))
    }

    /// Synapses anywhere in the graph whose presynaptic cell is `cell`.
    pub fn receptor_synapses(&self, cell: CellId) -> Result<&[SynapseId]> {
        Ok(self.cell(cell)?.receptor_synapses())
    }

    // ========================================================================
    // Counts and lookups
    // ========================================================================

    /// Returns the number of live segments.
    pub fn num_segments(&self) -> usize {
        self.segments.len() - self.free_segments.len()
    }

    /// Returns the number of live synapses.
    pub fn num_synapses(&self) -> usize {
        self.synapses.len() - self.free_synapses.len()
    }

    pub fn pruned_segments(&self) -> usize {
        self.pruned_segments
    }

    pub fn pruned_synapses(&self) -> usize {
        self.pruned_synapses
    }

    #[inline]
    pub fn segment(&self, segment: SegmentId) -> Option<&SegmentData> {
        self.segments.get(segment.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn synapse(&self, synapse: SynapseId) -> Option<&SynapseData> {
        self.synapses.get(synapse.index()).and_then(Option::as_ref)
    }

    /// Live segments with their ids, in slot order.
    pub fn segments(&self) -> impl Iterator<Item = (SegmentId, &SegmentData)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|data| (SegmentId::from(index), data)))
    }

    pub fn synapses_for_segment(&self, segment: SegmentId) -> Result<&[SynapseId]> {
        Ok(self.checked_segment(segment)?.synapses())
    }

    /// Presynaptic cells of a segment in synapse insertion order.
    pub fn presynaptic_cells(&self, segment: SegmentId) -> Result<Vec<CellId>> {
        Ok(self
            .checked_segment(segment)?
            .synapses
            .iter()
            .map(|&s| self.syn(s).presynaptic_cell)
            .collect())
    }

    /// The synapse on `segment` coming from `presynaptic_cell`, if any.
    pub fn synapse_to(&self, segment: SegmentId, presynaptic_cell: CellId) -> Option<SynapseId> {
        self.segment(segment)?
            .synapses
            .iter()
            .copied()
            .find(|&s| self.syn(s).presynaptic_cell == presynaptic_cell)
    }

    /// Number of synapses on `segment` whose permanence reaches `threshold`.
    ///
    /// # Panics
    ///
    /// Panics if the segment is not alive.
    pub fn num_synapses_at_least(&self, segment: SegmentId, threshold: Permanence) -> usize {
        self.seg(segment)
            .synapses
            .iter()
            .filter(|&&s| self.syn(s).is_connected(threshold))
            .count()
    }

    fn checked_segment(&self, segment: SegmentId) -> Result<&SegmentData> {
        self.segment(segment)
            .ok_or(AssociationError::UnknownSegment(segment))
    }

    fn seg(&self, segment: SegmentId) -> &SegmentData {
        self.segment(segment)
            .unwrap_or_else(|| panic!("{segment} is not alive"))
    }

    fn seg_mut(&mut self, segment: SegmentId) -> &mut SegmentData {
        self.segments
            .get_mut(segment.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{segment} is not alive"))
    }

    fn syn(&self, synapse: SynapseId) -> &SynapseData {
        self.synapse(synapse)
            .unwrap_or_else(|| panic!("{synapse} is not alive"))
    }

    fn syn_mut(&mut self, synapse: SynapseId) -> &mut SynapseData {
        self.synapses
            .get_mut(synapse.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{synapse} is not alive"))
    }

    // ========================================================================
    // Segment operations
    // ========================================================================

    /// Creates a new segment of `kind` on `cell`.
    ///
    /// While the cell already holds `max_segments_per_cell` segments of that kind,
    /// the least recently used one is destroyed first.
    pub fn create_segment(
        &mut self,
        cell: CellId,
        kind: SegmentKind,
        iteration: u64,
        max_segments_per_cell: usize,
    ) -> Result<SegmentId> {
        self.cell(cell)?;

        while self.cells[cell.index()].segments(kind).len() >= max_segments_per_cell {
            let Some(lru) = self.least_recently_used_segment(cell, kind) else {
                break;
            };
            debug!(%cell, %kind, segment = %lru, "evicting least recently used segment");
            self.remove_segment(lru);
        }

        let ordinal = self.next_segment_ordinal;
        self.next_segment_ordinal += 1;
        let data = SegmentData::new(kind, cell, iteration, ordinal);

        let segment = if let Some(reuse) = self.free_segments.pop() {
            self.segments[reuse.index()] = Some(data);
            reuse
        } else {
            let segment = SegmentId::from(self.segments.len());
            self.segments.push(Some(data));
            segment
        };

        self.cells[cell.index()].segments_mut(kind).push(segment);
        trace!(%cell, %kind, %segment, iteration, "created segment");
        Ok(segment)
    }

    /// The segment of `kind` on `cell` with the smallest last-used iteration.
    /// Ties go to the oldest segment.
    pub fn least_recently_used_segment(
        &self,
        cell: CellId,
        kind: SegmentKind,
    ) -> Option<SegmentId> {
        self.cells
            .get(cell.index())?
            .segments(kind)
            .iter()
            .copied()
            .min_by_key(|&s| self.seg(s).last_used)
    }

    /// Destroys a segment together with all its synapses.
    pub fn destroy_segment(&mut self, segment: SegmentId) -> Result<()> {
        self.checked_segment(segment)?;
        self.remove_segment(segment);
        Ok(())
    }

    fn remove_segment(&mut self, segment: SegmentId) {
        let data = self.segments[segment.index()]
            .take()
            .unwrap_or_else(|| panic!("{segment} is not alive"));

        for &synapse in &data.synapses {
            self.release_synapse(synapse);
        }

        let cell_segments = self.cells[data.cell.index()].segments_mut(data.kind);
        if let Some(pos) = cell_segments.iter().position(|&s| s == segment) {
            cell_segments.remove(pos);
        }

        self.free_segments.push(segment);
        self.pruned_segments += 1;
    }

    /// Records that the segment was used at `iteration`.
    pub fn mark_used(&mut self, segment: SegmentId, iteration: u64) -> Result<()> {
        self.checked_segment(segment)?;
        self.seg_mut(segment).last_used = iteration;
        Ok(())
    }

    // ========================================================================
    // Synapse operations
    // ========================================================================

    /// Creates a synapse from `presynaptic_cell` on `segment`.
    ///
    /// If the segment already has a synapse from that cell, it is returned instead
    /// (its permanence raised to `permanence` if that is higher). While the segment
    /// holds `max_synapses_per_segment` synapses, the weakest one is evicted first.
    pub fn create_synapse(
        &mut self,
        segment: SegmentId,
        presynaptic_cell: CellId,
        permanence: Permanence,
        max_synapses_per_segment: usize,
    ) -> Result<SynapseId> {
        self.checked_segment(segment)?;
        self.cell(presynaptic_cell)?;

        if let Some(existing) = self.synapse_to(segment, presynaptic_cell) {
            let data = self.syn_mut(existing);
            if permanence > data.permanence {
                data.permanence = clamp_permanence(permanence);
            }
            return Ok(existing);
        }

        while self.seg(segment).len() >= max_synapses_per_segment.max(1) {
            let Some(weakest) = self.min_permanence_synapse(segment) else {
                break;
            };
            trace!(%segment, synapse = %weakest, "evicting weakest synapse");
            self.unlink_synapse(weakest);
        }

        let ordinal = self.next_synapse_ordinal;
        self.next_synapse_ordinal += 1;
        let data = SynapseData::new(presynaptic_cell, segment, permanence, ordinal);

        let synapse = if let Some(reuse) = self.free_synapses.pop() {
            self.synapses[reuse.index()] = Some(data);
            reuse
        } else {
            let synapse = SynapseId::from(self.synapses.len());
            self.synapses.push(Some(data));
            synapse
        };

        self.seg_mut(segment).synapses.push(synapse);
        self.cells[presynaptic_cell.index()].receptors.push(synapse);
        Ok(synapse)
    }

    /// The synapse on `segment` with the lowest permanence, the earliest inserted on ties.
    pub fn min_permanence_synapse(&self, segment: SegmentId) -> Option<SynapseId> {
        self.segment(segment)?.synapses.iter().copied().min_by(|&a, &b| {
            let (a, b) = (self.syn(a), self.syn(b));
            a.permanence
                .total_cmp(&b.permanence)
                .then(a.ordinal.cmp(&b.ordinal))
        })
    }

    /// Destroys a synapse. A segment left without synapses is destroyed too.
    pub fn destroy_synapse(&mut self, synapse: SynapseId) -> Result<()> {
        if self.synapse(synapse).is_none() {
            return Err(AssociationError::UnknownSynapse(synapse));
        }

        let segment = self.unlink_synapse(synapse);
        if self.seg(segment).is_empty() {
            self.remove_segment(segment);
        }
        Ok(())
    }

    /// Removes a synapse from its segment and from its presynaptic cell.
    /// The segment is kept even if it becomes empty.
    fn unlink_synapse(&mut self, synapse: SynapseId) -> SegmentId {
        let data = self.release_synapse(synapse);
        let segment_synapses = &mut self.seg_mut(data.segment).synapses;
        if let Some(pos) = segment_synapses.iter().position(|&s| s == synapse) {
            segment_synapses.remove(pos);
        }
        data.segment
    }

    /// Frees the synapse slot and drops it from its presynaptic cell's receptors.
    fn release_synapse(&mut self, synapse: SynapseId) -> SynapseData {
        let data = self.synapses[synapse.index()]
            .take()
            .unwrap_or_else(|| panic!("{synapse} is not alive"));

        let receptors = &mut self.cells[data.presynaptic_cell.index()].receptors;
        if let Some(pos) = receptors.iter().position(|&s| s == synapse) {
            receptors.swap_remove(pos);
        }

        self.free_synapses.push(synapse);
        self.pruned_synapses += 1;
        data
    }

    /// Sets a synapse's permanence, clamped to `[0, 1]`.
    pub fn update_synapse_permanence(
        &mut self,
        synapse: SynapseId,
        permanence: Permanence,
    ) -> Result<()> {
        if self.synapse(synapse).is_none() {
            return Err(AssociationError::UnknownSynapse(synapse));
        }
        self.syn_mut(synapse).permanence = clamp_permanence(permanence);
        Ok(())
    }

    // ========================================================================
    // Learning operations
    // ========================================================================

    /// Strengthens synapses from `driving` cells and weakens all others.
    ///
    /// Synapses falling below epsilon are destroyed after the pass. Returns `false`
    /// if that left the segment empty, in which case the segment is destroyed too.
    pub fn adapt_segment(
        &mut self,
        segment: SegmentId,
        driving: &FxHashSet<CellId>,
        options: &PermanenceOptions,
    ) -> Result<bool> {
        // Destroying a synapse modifies the list we iterate through.
        let synapses = self.checked_segment(segment)?.synapses.clone();
        let mut synapses_to_destroy = Vec::new();

        for synapse in synapses {
            let data = self.syn_mut(synapse);
            let is_driving = driving.contains(&data.presynaptic_cell);
            match options.adapt(data.permanence, is_driving) {
                Some(permanence) => data.permanence = permanence,
                None => synapses_to_destroy.push(synapse),
            }
        }

        for synapse in synapses_to_destroy {
            trace!(%segment, %synapse, "synapse fell below epsilon");
            self.unlink_synapse(synapse);
        }

        if self.seg(segment).is_empty() {
            trace!(%segment, "segment lost its last synapse");
            self.remove_segment(segment);
            return Ok(false);
        }
        Ok(true)
    }

    /// Grows up to `desired` synapses on `segment` from randomly picked candidates.
    ///
    /// Candidates are sorted and deduplicated, cells already presynaptic on the
    /// segment are dropped, then cells are drawn uniformly without replacement.
    /// Returns how many synapses were created.
    pub fn grow_synapses<R: RandomSource + ?Sized>(
        &mut self,
        segment: SegmentId,
        candidates: &[CellId],
        initial_permanence: Permanence,
        desired: usize,
        max_synapses_per_segment: usize,
        rng: &mut R,
    ) -> Result<usize> {
        let data = self.checked_segment(segment)?;
        if desired == 0 || candidates.is_empty() {
            return Ok(0);
        }

        let existing: FxHashSet<CellId> = data
            .synapses
            .iter()
            .map(|&s| self.syn(s).presynaptic_cell)
            .collect();

        let mut pool = candidates.to_vec();
        pool.sort_unstable();
        pool.dedup();
        pool.retain(|cell| !existing.contains(cell));

        for &cell in &pool {
            self.cell(cell)?;
        }

        let num_new = desired.min(pool.len());
        for _ in 0..num_new {
            let cell = pool.remove(rng.next_index(pool.len()));
            self.create_synapse(segment, cell, initial_permanence, max_synapses_per_segment)?;
        }

        Ok(num_new)
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Verifies every structural invariant of the graph against `config`.
    pub fn check_invariants(&self, config: &AssociationConfig) -> Result<()> {
        let fail = |message: String| Err(AssociationError::Invariant(message));

        for (segment, data) in self.segments() {
            if data.synapses.is_empty() {
                return fail(format!("{segment} has no synapses"));
            }
            if data.synapses.len() > config.max_synapses_per_segment {
                return fail(format!(
                    "{segment} holds {} synapses, limit is {}",
                    data.synapses.len(),
                    config.max_synapses_per_segment
                ));
            }
            if !self.cells[data.cell.index()].segments(data.kind).contains(&segment) {
                return fail(format!("{segment} is missing from {}", data.cell));
            }

            let mut sources = FxHashSet::default();
            for &synapse in &data.synapses {
                let Some(syn) = self.synapse(synapse) else {
                    return fail(format!("{segment} references dead {synapse}"));
                };
                if syn.segment != segment {
                    return fail(format!(
                        "{synapse} points at {} instead of {segment}",
                        syn.segment
                    ));
                }
                if !(MIN_PERMANENCE..=MAX_PERMANENCE).contains(&syn.permanence) {
                    return fail(format!("{synapse} has permanence {}", syn.permanence));
                }
                if !sources.insert(syn.presynaptic_cell) {
                    return fail(format!(
                        "{segment} has two synapses from {}",
                        syn.presynaptic_cell
                    ));
                }
                if !self.cells[syn.presynaptic_cell.index()].receptors.contains(&synapse) {
                    return fail(format!(
                        "{synapse} is missing from receptors of {}",
                        syn.presynaptic_cell
                    ));
                }
            }
        }

        let mut receptor_count = 0;
        for (cell, data) in self.cells() {
            for kind in SegmentKind::ALL {
                let segments = data.segments(kind);
                if segments.len() > config.max_segments_per_cell {
                    return fail(format!(
                        "{cell} holds {} {kind} segments, limit is {}",
                        segments.len(),
                        config.max_segments_per_cell
                    ));
                }
                for &segment in segments {
                    match self.segment(segment) {
                        Some(seg) if seg.cell == cell && seg.kind == kind => {}
                        _ => return fail(format!("{cell} lists foreign or dead {segment}")),
                    }
                }
            }

            for &synapse in &data.receptors {
                match self.synapse(synapse) {
                    Some(syn) if syn.presynaptic_cell == cell => {}
                    _ => return fail(format!("{cell} lists foreign or dead receptor {synapse}")),
                }
            }
            receptor_count += data.receptors.len();
        }

        if receptor_count != self.num_synapses() {
            return fail(format!(
                "{receptor_count} receptor references for {} synapses",
                self.num_synapses()
            ));
        }

        Ok(())
    }
}
