//! Parameters of the association algorithm.
//!
//! The configuration is supplied once per engine and stays immutable while a
//! compute cycle runs. It can be built in code (all fields are public and
//! `Default` carries the usual HTM values) or parsed from TOML, in which case
//! missing keys fall back to their defaults:
//!
//! ```toml
//! activation_threshold = 8
//! min_threshold = 4
//! max_new_synapse_count = 12
//! seed = 7
//! ```

use crate::core::types::Permanence;
use crate::error::{AssociationError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds, learning rates and capacity limits for segment and synapse adaptation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    /// Minimum number of connected synapses for a segment to be classified as active.
    pub activation_threshold: usize,

    /// Minimum number of connected synapses for a segment to be classified as matching.
    pub min_threshold: usize,

    /// Added to the permanence of a synapse whose presynaptic cell drove the cycle.
    pub permanence_increment: Permanence,

    /// Subtracted from the permanence of a synapse whose presynaptic cell stayed silent.
    pub permanence_decrement: Permanence,

    /// Permanence of newly grown synapses.
    pub initial_permanence: Permanence,

    /// A synapse at or above this permanence is connected.
    pub connected_permanence: Permanence,

    /// A synapse at or above this permanence is a potential synapse.
    pub potential_permanence: Permanence,

    /// Growth budget for an adapted or newly created segment.
    pub max_new_synapse_count: usize,

    /// Hard cap on synapses per segment. Growing past it evicts the weakest synapse.
    pub max_synapses_per_segment: usize,

    /// Hard cap on segments of one kind per cell. Creating past it evicts the least
    /// recently used one.
    pub max_segments_per_cell: usize,

    /// Synapses whose permanence drops below this value are destroyed.
    pub epsilon: Permanence,

    /// Seed of the engine's random generator.
    pub seed: u64,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 13,
            min_threshold: 10,
            permanence_increment: 0.10,
            permanence_decrement: 0.10,
            initial_permanence: 0.21,
            connected_permanence: 0.5,
            potential_permanence: 0.0,
            max_new_synapse_count: 20,
            max_synapses_per_segment: 255,
            max_segments_per_cell: 255,
            epsilon: 0.00001,
            seed: 42,
        }
    }
}

impl AssociationConfig {
    /// Parses a TOML document and validates the result.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded association config");
        Ok(config)
    }

    /// Checks every parameter and reports all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.min_threshold >= self.activation_threshold {
            errors.push(format!(
                "min_threshold ({}) must be lower than activation_threshold ({})",
                self.min_threshold, self.activation_threshold
            ));
        }

        for (name, value) in [
            ("permanence_increment", self.permanence_increment),
            ("permanence_decrement", self.permanence_decrement),
            ("initial_permanence", self.initial_permanence),
            ("connected_permanence", self.connected_permanence),
            ("potential_permanence", self.potential_permanence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name} ({value}) must lie within [0, 1]"));
            }
        }

        if self.potential_permanence >= self.connected_permanence {
            errors.push(format!(
                "potential_permanence ({}) must be lower than connected_permanence ({})",
                self.potential_permanence, self.connected_permanence
            ));
        }

        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            errors.push(format!("epsilon ({}) must lie within (0, 1)", self.epsilon));
        }

        if self.initial_permanence < self.epsilon {
            errors.push(format!(
                "initial_permanence ({}) must not be below epsilon ({})",
                self.initial_permanence, self.epsilon
            ));
        }

        for (name, value) in [
            ("max_synapses_per_segment", self.max_synapses_per_segment),
            ("max_segments_per_cell", self.max_segments_per_cell),
        ] {
            if value == 0 {
                errors.push(format!("{name} must be greater than zero"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            let message = errors
                .iter()
                .map(|e| format!("  - {e}"))
                .collect::<Vec<_>>()
                .join("\n");
            Err(AssociationError::InvalidConfig(message))
        }
    }
}
