//! The `AssociationEngine` learns associations between the cells of one owning
//! area and the active cells of other (or the same) areas.
//!
//! At a high level, every area that should respond to activity elsewhere gets its
//! own engine. All engines write into one shared [`Connections`] graph: segments grow
//! on the cells of the owning area, synapses point back at the cells of the
//! associated areas.
//!
//! Responding cells:
//! - The active cells of the owning area, or all of its cells when none are active.
//!
//! Driving cells:
//! - The active cells of the associated area currently processed.
//!
//! How It Works:
//! - `compute` processes the associated areas one after another, in the given order.
//! - Only segments of one kind take part in a pass: distal segments when the
//!   associated area is the owning area itself, apical segments otherwise. The
//!   responding cells' segments of that kind are classified by their
//!   connected-synapse count.
//! - Every active segment is adapted: synapses from driving cells are reinforced, all
//!   others are punished, and new synapses are grown toward driving cells until the
//!   segment holds `max_new_synapse_count` synapses.
//! - The classification is taken again, and the single matching segment with the
//!   most potential synapses is adapted the same way. Its growth budget is reduced by
//!   the potential synapses it had in the previous call's activity record.
//! - If there was neither an active nor a matching segment, the least used responding
//!   cell gets a new segment (distal for its own area, apical for any other) with
//!   synapses to up to `max_new_synapse_count` driving cells.
//! - The iteration counter advances once per associated area. It timestamps segment
//!   creation and use, which drives least-recently-used eviction.
//! - Finally the activity of the owning area's segments is recorded, returned, and
//!   kept for the next call.
//!
//! Without `learn` the engine only classifies and records activity; the graph is not
//! touched.

use super::activity::SegmentActivity;
use super::area::CorticalArea;
use super::config::AssociationConfig;
use super::connections::Connections;
use super::random::{seeded, RandomSource};
use super::segment::SegmentKind;
use super::selection::{classify_segments, least_used_cell, segment_with_highest_potential};
use super::shared::SharedConnections;
use super::synapses::PermanenceOptions;
use super::types::{AreaId, CellId, SegmentId};
use crate::error::{AssociationError, Result};
use fxhash::FxHashSet;
use rand::rngs::StdRng;
use tracing::debug;

/// What happened while associating with one area.
#[derive(Debug, Default)]
struct AssociationStats {
    active: usize,
    matching: usize,
    adapted: usize,
    created: Option<SegmentId>,
    grown: usize,
}

/// Learns associations for the cells of one owning area.
///
/// The engine holds the parameters, the random generator and the iteration
/// counter, but not the graph: every `compute` call borrows the shared
/// [`Connections`] so several engines can take turns on it. The activity of the
/// previous call is kept to size synapse growth on matching segments.
#[derive(Debug)]
pub struct AssociationEngine<R = StdRng> {
    area: AreaId,
    config: AssociationConfig,
    permanence: PermanenceOptions,
    rng: R,
    /// Advanced once per associated area processed.
    iteration: u64,
    last_activity: SegmentActivity,
}

impl AssociationEngine<StdRng> {
    /// Creates an engine for `area`, seeding its generator from `config.seed`.
    pub fn new(config: AssociationConfig, area: &CorticalArea) -> Result<Self> {
        let rng = seeded(config.seed);
        Self::with_rng(config, area, rng)
    }
}

impl<R: RandomSource> AssociationEngine<R> {
    /// Creates an engine for `area` drawing all random choices from `rng`.
    pub fn with_rng(config: AssociationConfig, area: &CorticalArea, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            area: area.id(),
            permanence: PermanenceOptions::from_config(&config),
            config,
            rng,
            iteration: 0,
            last_activity: SegmentActivity::default(),
        })
    }

    /// The owning area.
    pub fn area(&self) -> AreaId {
        self.area
    }

    pub fn config(&self) -> &AssociationConfig {
        &self.config
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Activity recorded by the most recent `compute` call.
    pub fn last_activity(&self) -> &SegmentActivity {
        &self.last_activity
    }

    /// Runs one compute cycle of `area` against a single associated area.
    pub fn compute_one(
        &mut self,
        graph: &mut Connections,
        area: &CorticalArea,
        associated_area: &CorticalArea,
        learn: bool,
    ) -> Result<SegmentActivity> {
        self.compute(graph, area, &[associated_area], learn)
    }

    /// Runs one compute cycle while holding the shared graph's lock.
    pub fn compute_shared(
        &mut self,
        shared: &SharedConnections,
        area: &CorticalArea,
        associated_areas: &[&CorticalArea],
        learn: bool,
    ) -> Result<SegmentActivity> {
        let mut graph = shared.lock();
        self.compute(&mut graph, area, associated_areas, learn)
    }

    /// Runs one compute cycle of the owning `area` against each associated area.
    ///
    /// All inputs are checked before anything is mutated.
    pub fn compute(
        &mut self,
        graph: &mut Connections,
        area: &CorticalArea,
        associated_areas: &[&CorticalArea],
        learn: bool,
    ) -> Result<SegmentActivity> {
        if area.id() != self.area {
            return Err(AssociationError::AreaMismatch {
                expected: self.area,
                actual: area.id(),
            });
        }
        graph.check_area(area)?;
        for associated in associated_areas {
            graph.check_area(associated)?;
        }

        let responding: Vec<CellId> = if area.active_cells().is_empty() {
            area.cells().collect()
        } else {
            area.active_cells().to_vec()
        };

        let mut active_inputs = Vec::new();
        for associated in associated_areas {
            let stats = self.associate(graph, area, &responding, associated, learn)?;
            debug!(
                area = area.name(),
                associated = associated.name(),
                iteration = self.iteration,
                driving = associated.active_cells().len(),
                active = stats.active,
                matching = stats.matching,
                adapted = stats.adapted,
                created = ?stats.created,
                grown = stats.grown,
                "associated areas"
            );

            active_inputs.extend_from_slice(associated.active_cells());
            self.iteration += 1;
        }

        active_inputs.sort_unstable();
        active_inputs.dedup();

        let activity = SegmentActivity::compute(
            graph,
            area,
            &active_inputs,
            self.config.potential_permanence,
            self.config.connected_permanence,
            self.iteration,
        );
        self.last_activity = activity.clone();
        Ok(activity)
    }

    /// Active, then matching, then new-segment adaptation against one associated area.
    fn associate(
        &mut self,
        graph: &mut Connections,
        area: &CorticalArea,
        responding: &[CellId],
        associated: &CorticalArea,
        learn: bool,
    ) -> Result<AssociationStats> {
        let driving = associated.active_cells();
        let driving_set: FxHashSet<CellId> = driving.iter().copied().collect();
        let kind = SegmentKind::for_association(area.id(), associated.id());
        let mut stats = AssociationStats::default();

        let active = classify_segments(graph, responding, kind, &self.config).active;
        stats.active = active.len();

        if learn {
            for &segment in &active {
                if !graph.adapt_segment(segment, &driving_set, &self.permanence)? {
                    continue;
                }
                graph.mark_used(segment, self.iteration)?;
                stats.adapted += 1;

                // Even an active segment keeps growing toward driving cells it lacks.
                let len = graph.synapses_for_segment(segment)?.len();
                let desired = self.config.max_new_synapse_count.saturating_sub(len);
                stats.grown += self.grow(graph, segment, driving, desired)?;
            }
        }

        // Adaptation changed connected counts, so classify again.
        let matching: Vec<SegmentId> = classify_segments(graph, responding, kind, &self.config)
            .matching
            .into_iter()
            .filter(|segment| !active.contains(segment))
            .collect();
        stats.matching = matching.len();

        let best =
            segment_with_highest_potential(graph, &matching, self.config.potential_permanence);

        if let (Some(segment), true) = (best, learn) {
            let previous = self.last_activity.active_potential(graph, segment);
            if graph.adapt_segment(segment, &driving_set, &self.permanence)? {
                graph.mark_used(segment, self.iteration)?;
                stats.adapted += 1;

                let desired = self.config.max_new_synapse_count.saturating_sub(previous);
                stats.grown += self.grow(graph, segment, driving, desired)?;
            }
        }

        if learn && active.is_empty() && best.is_none() {
            let created =
                self.create_segment(graph, area, responding, associated, kind, &mut stats)?;
            stats.created = created;
        }

        Ok(stats)
    }

    /// Grows a new segment on the least used responding cell.
    fn create_segment(
        &mut self,
        graph: &mut Connections,
        area: &CorticalArea,
        responding: &[CellId],
        associated: &CorticalArea,
        kind: SegmentKind,
        stats: &mut AssociationStats,
    ) -> Result<Option<SegmentId>> {
        let driving = associated.active_cells();
        let budget = self.config.max_new_synapse_count.min(driving.len());
        if budget == 0 {
            return Ok(None);
        }

        let Some(cell) = least_used_cell(graph, responding, &mut self.rng) else {
            return Ok(None);
        };

        let segment =
            graph.create_segment(cell, kind, self.iteration, self.config.max_segments_per_cell)?;
        stats.grown += self.grow(graph, segment, driving, budget)?;

        debug!(area = area.name(), %cell, %kind, %segment, "grew new segment");
        Ok(Some(segment))
    }

    fn grow(
        &mut self,
        graph: &mut Connections,
        segment: SegmentId,
        driving: &[CellId],
        desired: usize,
    ) -> Result<usize> {
        graph.grow_synapses(
            segment,
            driving,
            self.config.initial_permanence,
            desired,
            self.config.max_synapses_per_segment,
            &mut self.rng,
        )
    }
}
