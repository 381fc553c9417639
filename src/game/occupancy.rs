//! # Occupancy
//!
//! "Can I step there" questions built on [`SpatialQueries`].

use crate::{AgentId, Cell, Direction, SpatialQueries};

/// Whether the cell one step from `cell` in `direction` is closed to `self_id`.
///
/// A cell is closed when it holds a wall or any agent other than `self_id`.
pub fn is_blocked<Q>(queries: &Q, cell: Cell, direction: Direction, self_id: AgentId) -> bool
where
    Q: SpatialQueries + ?Sized,
{
    let next = cell.step(direction);
    queries.is_wall_at(next) || queries.is_occupied_by_other_agent(next, self_id)
}

/// Open directions from `cell` in [`Direction::ALL`] order, skipping `exclude`.
pub fn open_directions<Q>(
    queries: &Q,
    cell: Cell,
    exclude: Option<Direction>,
    self_id: AgentId,
) -> Vec<Direction>
where
    Q: SpatialQueries + ?Sized,
{
    Direction::ALL
        .into_iter()
        .filter(|direction| Some(*direction) != exclude)
        .filter(|direction| !is_blocked(queries, cell, *direction, self_id))
        .collect()
}
