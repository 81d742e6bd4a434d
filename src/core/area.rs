//! A `CorticalArea` is a named population of cells with a per-cycle active subset.
//!
//! Areas are registered on a [`Connections`](super::connections::Connections)
//! graph, which allocates a contiguous block of cells for them. The active subset
//! is produced upstream (by an encoder or pooler) and replaced by the caller before
//! each compute cycle. The engine only reads it.

use super::types::{AreaId, CellId};
use crate::error::{AssociationError, Result};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct CorticalArea {
    id: AreaId,
    name: String,
    first_cell: u32,
    num_cells: usize,
    /// Sorted and free of duplicates.
    active_cells: Vec<CellId>,
}

impl CorticalArea {
    pub(crate) fn new(id: AreaId, name: String, first_cell: u32, num_cells: usize) -> Self {
        Self {
            id,
            name,
            first_cell,
            num_cells,
            active_cells: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> AreaId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of cells in the area.
    #[inline]
    pub fn len(&self) -> usize {
        self.num_cells
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_cells == 0
    }

    /// Global ids of all cells of the area, ascending.
    pub fn cells(&self) -> impl Iterator<Item = CellId> {
        self.cell_range().map(CellId)
    }

    #[inline]
    pub(crate) fn first_cell(&self) -> u32 {
        self.first_cell
    }

    fn cell_range(&self) -> Range<u32> {
        self.first_cell..self.first_cell + self.num_cells as u32
    }

    /// True if the cell belongs to this area.
    #[inline]
    pub fn contains(&self, cell: CellId) -> bool {
        self.cell_range().contains(&cell.0)
    }

    /// Maps an index inside the area to the cell's global id.
    pub fn cell(&self, index: usize) -> Result<CellId> {
        if index >= self.num_cells {
            return Err(AssociationError::CellOutOfRange {
                area: self.name.clone(),
                index,
                size: self.num_cells,
            });
        }
        Ok(CellId(self.first_cell + index as u32))
    }

    /// Replaces the active cells with the given area-local indices.
    ///
    /// Duplicates are ignored. On error the previous active set is kept.
    pub fn set_active_cells<I>(&mut self, indices: I) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut active = indices
            .into_iter()
            .map(|index| self.cell(index))
            .collect::<Result<Vec<_>>>()?;
        active.sort_unstable();
        active.dedup();
        self.active_cells = active;
        Ok(())
    }

    /// Replaces the active cells with the given global cell ids.
    pub fn set_active_cell_ids<I>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = CellId>,
    {
        let mut active = Vec::new();
        for cell in cells {
            if !self.contains(cell) {
                return Err(AssociationError::CellNotInArea {
                    area: self.name.clone(),
                    cell,
                });
            }
            active.push(cell);
        }
        active.sort_unstable();
        active.dedup();
        self.active_cells = active;
        Ok(())
    }

    /// Marks every cell as inactive.
    pub fn clear_active_cells(&mut self) {
        self.active_cells.clear();
    }

    /// Cells active in the current cycle, ascending.
    #[inline]
    pub fn active_cells(&self) -> &[CellId] {
        &self.active_cells
    }
}
