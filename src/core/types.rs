//! Typed indices into the connection graph.
//!
//! Cells, segments and synapses are stored in flat vectors inside
//! [`Connections`](super::connections::Connections) and referenced by these
//! small copyable handles instead of pointers. A handle stays meaningful only while
//! the entity it names is alive; segment and synapse slots are recycled.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strength of a synapse, always kept within `[0.0, 1.0]`.
pub type Permanence = f64;

/// Lowest permanence a synapse can hold.
pub const MIN_PERMANENCE: Permanence = 0.0;

/// Highest permanence a synapse can hold.
pub const MAX_PERMANENCE: Permanence = 1.0;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Position of the entity in its backing vector.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

index_type!(
    /// Global index of a cell across all areas of a graph.
    CellId,
    "cell#"
);

index_type!(
    /// Slot of a segment in the graph.
    SegmentId,
    "segment#"
);

index_type!(
    /// Slot of a synapse in the graph.
    SynapseId,
    "synapse#"
);

index_type!(
    /// Index of a cortical area registered in a graph.
    AreaId,
    "area#"
);

/// Clamps a permanence into the valid range.
#[inline]
pub fn clamp_permanence(permanence: Permanence) -> Permanence {
    permanence.clamp(MIN_PERMANENCE, MAX_PERMANENCE)
}
