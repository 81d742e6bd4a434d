//! End-to-end learning scenarios driven through `AssociationEngine`.

use anyhow::Result;
use htm_assoc::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const TOLERANCE: f64 = 1e-9;

fn permanence_from(graph: &Connections, segment: SegmentId, source: CellId) -> Option<Permanence> {
    let synapse = graph.synapse_to(segment, source)?;
    graph.synapse(synapse).map(|s| s.permanence())
}

fn assert_close(actual: Option<Permanence>, expected: Permanence) {
    let actual = actual.expect("synapse is missing");
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected permanence {expected}, got {actual}"
    );
}

#[test]
fn lone_cell_grows_distal_segment_to_itself() -> Result<()> {
    let mut graph = Connections::new();
    let mut area = graph.add_area("single", 1)?;
    area.set_active_cells([0])?;
    let cell = area.cell(0)?;

    let config = AssociationConfig::default();
    let mut engine = AssociationEngine::new(config.clone(), &area)?;
    engine.compute_one(&mut graph, &area, &area, true)?;

    assert!(graph.segments_for_cell(cell, SegmentKind::Apical)?.is_empty());
    let distal = graph.segments_for_cell(cell, SegmentKind::Distal)?;
    assert_eq!(distal.len(), 1);

    let synapses = graph.synapses_for_segment(distal[0])?;
    assert_eq!(synapses.len(), 1);
    let synapse = graph.synapse(synapses[0]).expect("synapse is alive");
    assert_eq!(synapse.presynaptic_cell(), cell);
    assert_eq!(synapse.permanence(), config.initial_permanence);

    graph.check_invariants(&config)?;
    Ok(())
}

#[test]
fn active_segment_reinforces_driving_and_punishes_silent_synapses() -> Result<()> {
    let mut graph = Connections::new();
    let owner = graph.add_area("owner", 1)?;
    let mut inputs = graph.add_area("inputs", 2)?;
    let (a, b) = (inputs.cell(0)?, inputs.cell(1)?);

    let segment = graph.create_segment(owner.cell(0)?, SegmentKind::Apical, 0, 255)?;
    graph.create_synapse(segment, a, 0.6, 255)?;
    graph.create_synapse(segment, b, 0.6, 255)?;

    inputs.set_active_cells([0])?;
    let config = AssociationConfig {
        activation_threshold: 2,
        min_threshold: 1,
        max_new_synapse_count: 2,
        ..Default::default()
    };
    let mut engine = AssociationEngine::new(config.clone(), &owner)?;
    engine.compute_one(&mut graph, &owner, &inputs, true)?;

    assert_close(permanence_from(&graph, segment, a), 0.7);
    assert_close(permanence_from(&graph, segment, b), 0.5);
    assert_eq!(graph.num_segments(), 1);
    assert_eq!(graph.segment(segment).map(|s| s.last_used()), Some(0));

    graph.check_invariants(&config)?;
    Ok(())
}

#[test]
fn synapse_decayed_below_epsilon_is_removed() -> Result<()> {
    let mut graph = Connections::new();
    let owner = graph.add_area("owner", 1)?;
    let mut inputs = graph.add_area("inputs", 2)?;
    let (a, b) = (inputs.cell(0)?, inputs.cell(1)?);

    let segment = graph.create_segment(owner.cell(0)?, SegmentKind::Apical, 0, 255)?;
    graph.create_synapse(segment, a, 0.6, 255)?;
    graph.create_synapse(segment, b, 0.1, 255)?;

    inputs.set_active_cells([0])?;
    let config = AssociationConfig {
        activation_threshold: 2,
        min_threshold: 1,
        max_new_synapse_count: 2,
        connected_permanence: 0.05,
        ..Default::default()
    };
    let mut engine = AssociationEngine::new(config.clone(), &owner)?;
    engine.compute_one(&mut graph, &owner, &inputs, true)?;

    assert_eq!(graph.presynaptic_cells(segment)?, vec![a]);
    assert_close(permanence_from(&graph, segment, a), 0.7);
    assert!(graph.receptor_synapses(b)?.is_empty());
    assert_eq!(graph.num_synapses(), 1);

    graph.check_invariants(&config)?;
    Ok(())
}

#[test]
fn only_matching_segment_with_most_potential_is_adapted() -> Result<()> {
    let mut graph = Connections::new();
    let owner = graph.add_area("owner", 2)?;
    let mut inputs = graph.add_area("inputs", 10)?;

    let weaker = graph.create_segment(owner.cell(0)?, SegmentKind::Apical, 0, 255)?;
    for index in 0..3 {
        graph.create_synapse(weaker, inputs.cell(index)?, 0.6, 255)?;
    }
    let stronger = graph.create_segment(owner.cell(1)?, SegmentKind::Apical, 0, 255)?;
    for index in 3..8 {
        graph.create_synapse(stronger, inputs.cell(index)?, 0.6, 255)?;
    }

    inputs.set_active_cells([9])?;
    let config = AssociationConfig {
        activation_threshold: 6,
        min_threshold: 2,
        ..Default::default()
    };
    let mut engine = AssociationEngine::new(config.clone(), &owner)?;
    let activity = engine.compute_one(&mut graph, &owner, &inputs, true)?;

    for index in 0..3 {
        assert_close(permanence_from(&graph, weaker, inputs.cell(index)?), 0.6);
    }
    assert_eq!(graph.synapses_for_segment(weaker)?.len(), 3);

    for index in 3..8 {
        assert_close(permanence_from(&graph, stronger, inputs.cell(index)?), 0.5);
    }
    // The driving cell was missing and is grown onto the adapted segment.
    assert_close(
        permanence_from(&graph, stronger, inputs.cell(9)?),
        config.initial_permanence,
    );
    assert_eq!(graph.num_segments(), 2);
    assert_eq!(activity.active_potential(&graph, stronger), 1);
    assert_eq!(activity.active_potential(&graph, weaker), 0);

    graph.check_invariants(&config)?;
    Ok(())
}

#[test]
fn matching_growth_is_reduced_by_previous_potential() -> Result<()> {
    let mut graph = Connections::new();
    let owner = graph.add_area("owner", 1)?;
    let mut inputs = graph.add_area("inputs", 10)?;

    let segment = graph.create_segment(owner.cell(0)?, SegmentKind::Apical, 0, 255)?;
    for index in 0..3 {
        graph.create_synapse(segment, inputs.cell(index)?, 0.6, 255)?;
    }

    let config = AssociationConfig {
        activation_threshold: 10,
        min_threshold: 1,
        max_new_synapse_count: 4,
        ..Default::default()
    };
    let mut engine = AssociationEngine::new(config.clone(), &owner)?;

    // Two of the three sources fire; nothing new can be grown from them.
    inputs.set_active_cells([0, 1])?;
    let activity = engine.compute_one(&mut graph, &owner, &inputs, true)?;
    assert_eq!(activity.active_potential(&graph, segment), 2);
    assert_eq!(graph.synapses_for_segment(segment)?.len(), 3);

    // Budget is 4 - 2, not the full 4 and not 4 minus the 3 existing synapses.
    inputs.set_active_cells([3, 4, 5, 6, 7])?;
    engine.compute_one(&mut graph, &owner, &inputs, true)?;

    let first_new = inputs.cell(3)?;
    let sources = graph.presynaptic_cells(segment)?;
    assert_eq!(sources.len(), 5);
    let grown = sources.iter().filter(|&&cell| cell >= first_new).count();
    assert_eq!(grown, 2);
    assert_eq!(graph.num_segments(), 1);

    graph.check_invariants(&config)?;
    Ok(())
}

#[test]
fn full_cell_evicts_least_recently_used_segment() -> Result<()> {
    let mut graph = Connections::new();
    let mut area = graph.add_area("area", 3)?;
    let (cell, quiet) = (area.cell(0)?, area.cell(1)?);

    let recent = graph.create_segment(cell, SegmentKind::Distal, 0, 2)?;
    graph.create_synapse(recent, quiet, 0.3, 255)?;
    graph.mark_used(recent, 5)?;

    let stale = graph.create_segment(cell, SegmentKind::Distal, 0, 2)?;
    graph.create_synapse(stale, quiet, 0.3, 255)?;
    graph.mark_used(stale, 3)?;

    let recent_ordinal = graph.segment(recent).map(|s| s.ordinal());
    let stale_ordinal = graph.segment(stale).map(|s| s.ordinal());

    area.set_active_cells([0])?;
    let config = AssociationConfig {
        max_segments_per_cell: 2,
        ..Default::default()
    };
    let mut engine = AssociationEngine::new(config.clone(), &area)?;
    engine.compute_one(&mut graph, &area, &area, true)?;

    let distal = graph.segments_for_cell(cell, SegmentKind::Distal)?;
    assert_eq!(distal.len(), 2);

    let ordinals: Vec<u64> = distal
        .iter()
        .filter_map(|&s| graph.segment(s))
        .map(|s| s.ordinal())
        .collect();
    assert!(ordinals.contains(&recent_ordinal.expect("segment is alive")));
    assert!(!ordinals.contains(&stale_ordinal.expect("segment is alive")));

    let newest = distal[1];
    assert_eq!(graph.presynaptic_cells(newest)?, vec![cell]);
    assert_eq!(graph.pruned_segments(), 1);

    graph.check_invariants(&config)?;
    Ok(())
}

#[test]
fn full_segment_evicts_weakest_synapse() -> Result<()> {
    let mut graph = Connections::new();
    let owner = graph.add_area("owner", 1)?;
    let inputs = graph.add_area("inputs", 4)?;

    let segment = graph.create_segment(owner.cell(0)?, SegmentKind::Apical, 0, 255)?;
    graph.create_synapse(segment, inputs.cell(0)?, 0.3, 3)?;
    graph.create_synapse(segment, inputs.cell(1)?, 0.2, 3)?;
    graph.create_synapse(segment, inputs.cell(2)?, 0.4, 3)?;
    graph.create_synapse(segment, inputs.cell(3)?, 0.21, 3)?;

    let mut sources = graph.presynaptic_cells(segment)?;
    sources.sort_unstable();
    assert_eq!(sources, vec![inputs.cell(0)?, inputs.cell(2)?, inputs.cell(3)?]);
    assert!(graph.receptor_synapses(inputs.cell(1)?)?.is_empty());

    let config = AssociationConfig {
        max_synapses_per_segment: 3,
        ..Default::default()
    };
    graph.check_invariants(&config)?;
    Ok(())
}

/// Replays a fixed pseudo-random activity sequence and returns the final graph bytes.
fn train(seed: u64) -> Result<Vec<u8>> {
    let mut graph = Connections::new();
    let mut labels = graph.add_area("labels", 8)?;
    let mut inputs = graph.add_area("inputs", 32)?;

    let config = AssociationConfig {
        activation_threshold: 4,
        min_threshold: 2,
        max_new_synapse_count: 6,
        max_segments_per_cell: 3,
        max_synapses_per_segment: 8,
        seed,
        ..Default::default()
    };
    let mut label_engine = AssociationEngine::new(config.clone(), &labels)?;
    let mut input_engine = AssociationEngine::new(config.clone(), &inputs)?;

    let mut activity = StdRng::seed_from_u64(0xA550C);
    for _ in 0..50 {
        labels.set_active_cells(rand::seq::index::sample(&mut activity, 8, 1).into_vec())?;
        inputs.set_active_cells(rand::seq::index::sample(&mut activity, 32, 5).into_vec())?;

        label_engine.compute(&mut graph, &labels, &[&inputs, &labels], true)?;
        input_engine.compute(&mut graph, &inputs, &[&labels], true)?;
        graph.check_invariants(&config)?;
    }

    Ok(graph.snapshot().to_bytes()?)
}

#[test]
fn same_seed_and_inputs_give_identical_graphs() -> Result<()> {
    assert_eq!(train(7)?, train(7)?);
    Ok(())
}

#[test]
fn inference_leaves_graph_untouched() -> Result<()> {
    let mut graph = Connections::new();
    let mut labels = graph.add_area("labels", 4)?;
    let mut inputs = graph.add_area("inputs", 16)?;

    let config = AssociationConfig {
        activation_threshold: 3,
        min_threshold: 1,
        max_new_synapse_count: 4,
        ..Default::default()
    };
    let mut engine = AssociationEngine::new(config, &labels)?;

    for step in 0..10 {
        labels.set_active_cells([step % 4])?;
        inputs.set_active_cells([step % 16, (step + 3) % 16, (step + 7) % 16])?;
        engine.compute_one(&mut graph, &labels, &inputs, true)?;
    }

    let before = graph.snapshot().to_bytes()?;
    let stats = (graph.num_segments(), graph.num_synapses(), graph.pruned_synapses());

    labels.set_active_cells([1])?;
    inputs.set_active_cells([0, 5, 11])?;
    let activity = engine.compute_one(&mut graph, &labels, &inputs, false)?;

    assert_eq!(graph.snapshot().to_bytes()?, before);
    assert_eq!(
        (graph.num_segments(), graph.num_synapses(), graph.pruned_synapses()),
        stats
    );
    assert_eq!(engine.last_activity(), &activity);
    Ok(())
}
