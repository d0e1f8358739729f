//! Per-tick occupancy index for the grid
//!
//! `OccupancyGrid` maps each occupied cell to the agents covering it and is
//! rebuilt from scratch every tick. `CellMask` is a flat bitset of blocked
//! cells used by spawn and food placement.

use bitvec::prelude::*;
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::game::state::Agent;
use crate::util::vec2::Vec2;

/// Packed cell key (`y * cols + x`)
pub type CellKey = u32;

/// Agents covering one cell. More than one only while a safe agent overlaps another body.
pub type Occupants = SmallVec<[usize; 2]>;

/// Initial capacity for the cell map (cells covered by a handful of bodies)
const OCCUPANCY_INITIAL_CAPACITY: usize = 64;

/// Cell -> agent index map built from living agents
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cols: u32,
    rows: u32,
    cells: HashMap<CellKey, Occupants>,
}

impl OccupancyGrid {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            cells: HashMap::with_capacity(OCCUPANCY_INITIAL_CAPACITY),
        }
    }

    /// Build from the current segments of every living agent.
    /// Stored indices refer to positions in `agents`.
    pub fn build(agents: &[Agent], cols: u32, rows: u32) -> Self {
        let mut grid = Self::new(cols, rows);
        for (index, agent) in agents.iter().enumerate() {
            if !agent.alive {
                continue;
            }
            for cell in &agent.segments {
                grid.insert(*cell, index);
            }
        }
        grid
    }

    /// Record an agent on a cell (out-of-bounds cells are ignored)
    #[inline]
    pub fn insert(&mut self, cell: Vec2, agent: usize) {
        if !cell.in_bounds(self.cols, self.rows) {
            return;
        }
        let occupants = self.cells.entry(cell.cell_key(self.cols)).or_default();
        if !occupants.contains(&agent) {
            occupants.push(agent);
        }
    }

    /// Agents covering a cell, in agent order
    #[inline]
    pub fn occupants(&self, cell: Vec2) -> &[usize] {
        if !cell.in_bounds(self.cols, self.rows) {
            return &[];
        }
        self.cells
            .get(&cell.cell_key(self.cols))
            .map(|o| o.as_slice())
            .unwrap_or(&[])
    }

    #[inline]
    pub fn is_occupied(&self, cell: Vec2) -> bool {
        !self.occupants(cell).is_empty()
    }

    /// Check if a cell is covered by any agent other than `agent`
    #[inline]
    pub fn is_occupied_by_other(&self, cell: Vec2, agent: usize) -> bool {
        self.occupants(cell).iter().any(|&o| o != agent)
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Dense blocked-cell bitset, one bit per board cell
#[derive(Debug, Clone)]
pub struct CellMask {
    cols: u32,
    rows: u32,
    bits: BitVec,
}

impl CellMask {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            bits: bitvec![0; cols as usize * rows as usize],
        }
    }

    /// Mask covering living agents' segments and the given extra cells
    pub fn from_world<'a>(
        cols: u32,
        rows: u32,
        agents: &[Agent],
        extra: impl IntoIterator<Item = &'a Vec2>,
    ) -> Self {
        let mut mask = Self::new(cols, rows);
        for agent in agents.iter().filter(|a| a.alive) {
            mask.insert_all(agent.segments.iter().copied());
        }
        mask.insert_all(extra.into_iter().copied());
        mask
    }

    /// Mark a cell blocked (out-of-bounds cells are ignored)
    #[inline]
    pub fn insert(&mut self, cell: Vec2) {
        if cell.in_bounds(self.cols, self.rows) {
            self.bits.set(cell.cell_key(self.cols) as usize, true);
        }
    }

    pub fn insert_all(&mut self, cells: impl IntoIterator<Item = Vec2>) {
        for cell in cells {
            self.insert(cell);
        }
    }

    /// Out-of-bounds cells count as blocked
    #[inline]
    pub fn is_blocked(&self, cell: Vec2) -> bool {
        if !cell.in_bounds(self.cols, self.rows) {
            return true;
        }
        self.bits[cell.cell_key(self.cols) as usize]
    }

    pub fn blocked_count(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn free_count(&self) -> usize {
        self.bits.count_zeros()
    }
}
