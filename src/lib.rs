//! Neural associations between cortical areas, built from HTM segments and synapses.
//!
//! Cells are grouped into named cortical areas that all live in one
//! [`Connections`](core::connections::Connections) graph. Every cycle, the caller
//! marks a subset of each area's cells as active. An
//! [`AssociationEngine`](core::engine::AssociationEngine) owned by one area then
//! strengthens the segments of that area whose synapses point at active cells of the
//! associated areas, weakens and prunes the rest, and grows new segments when nothing
//! matched. Over time, cells that tend to be co-active end up strongly connected.
//!
//! ```
//! use htm_assoc::prelude::*;
//!
//! let mut graph = Connections::new();
//! let mut labels = graph.add_area("labels", 8).unwrap();
//! let mut inputs = graph.add_area("inputs", 64).unwrap();
//!
//! let mut engine = AssociationEngine::new(AssociationConfig::default(), &labels).unwrap();
//!
//! labels.set_active_cells([3]).unwrap();
//! inputs.set_active_cells([1, 9, 17, 33]).unwrap();
//! engine.compute(&mut graph, &labels, &[&inputs], true).unwrap();
//!
//! let cell = labels.cell(3).unwrap();
//! assert_eq!(graph.segments_for_cell(cell, SegmentKind::Apical).unwrap().len(), 1);
//! ```

pub mod core;
pub mod error;

pub use crate::error::{AssociationError, Result};

/// Re-export of commonly used types.
pub mod prelude {
    pub use crate::core::activity::{SegmentActivity, SegmentCounts};
    pub use crate::core::area::CorticalArea;
    pub use crate::core::config::AssociationConfig;
    pub use crate::core::connections::Connections;
    pub use crate::core::engine::AssociationEngine;
    pub use crate::core::random::{seeded, RandomSource};
    pub use crate::core::segment::SegmentKind;
    pub use crate::core::shared::SharedConnections;
    pub use crate::core::snapshot::GraphSnapshot;
    pub use crate::core::types::{AreaId, CellId, Permanence, SegmentId, SynapseId};
    pub use crate::error::{AssociationError, Result};
}
