//! Move proposal and collision resolution
//!
//! Two passes over the proposed moves. The first checks walls and bodies in
//! agent order. The second settles cells wanted by more than one head, and
//! head swaps, by length. Both passes read only the pre-move world, so
//! verdicts never depend on map iteration order.

use hashbrown::HashMap;
use smallvec::{smallvec, SmallVec};

use crate::game::spatial::{CellKey, OccupancyGrid};
use crate::game::state::{Agent, CollisionKind, Food};
use crate::util::vec2::{Direction, Vec2};

/// One agent's intended step this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProposedMove {
    pub target: Vec2,
    pub direction: Direction,
    /// Index into the food list if the target holds food
    pub food: Option<usize>,
    /// Growth gained from that food (0 when none)
    pub growth: u32,
    /// Tail cell is free for others this tick (no growth pending or gained)
    pub vacates_tail: bool,
}

/// Per-agent collision verdict, `None` when the agent survives the tick
pub type Verdicts = Vec<Option<CollisionKind>>;

type Contestants = SmallVec<[usize; 4]>;

/// Compute the next head of every agent flagged in `moving`
pub fn propose_moves(agents: &[Agent], moving: &[bool], food: &[Food]) -> Vec<Option<ProposedMove>> {
    agents
        .iter()
        .zip(moving)
        .map(|(agent, &moves)| {
            if !moves || !agent.alive {
                return None;
            }
            let direction = agent.heading();
            let target = agent.head().step(direction);
            let food_index = food.iter().position(|f| f.position == target);
            let growth = food_index.map_or(0, |i| food[i].growth);
            Some(ProposedMove {
                target,
                direction,
                food: food_index,
                growth,
                vacates_tail: agent.pending_growth + growth == 0,
            })
        })
        .collect()
}

/// Resolve every proposed move against the pre-move board
///
/// `occupancy` must be built from `agents` as they were before this tick's
/// moves; `tick` is the tick being resolved (for safe windows).
pub fn resolve(
    agents: &[Agent],
    moves: &[Option<ProposedMove>],
    occupancy: &OccupancyGrid,
    cols: u32,
    rows: u32,
    tick: u64,
) -> Verdicts {
    let mut verdicts: Verdicts = vec![None; agents.len()];
    let mut swaps: Vec<(usize, usize)> = Vec::new();

    for (index, proposed) in moves.iter().enumerate() {
        let Some(proposed) = proposed else {
            continue;
        };
        match check_move(index, proposed, agents, moves, occupancy, cols, rows, tick) {
            MoveCheck::Clear => {}
            MoveCheck::Swap(other) => {
                let pair = (index.min(other), index.max(other));
                if !swaps.contains(&pair) {
                    swaps.push(pair);
                }
            }
            MoveCheck::Collides(kind) => verdicts[index] = Some(kind),
        }
    }

    let losers = head_contest_losers(agents, moves, &verdicts, &swaps, cols, tick);
    for index in losers {
        verdicts[index] = Some(CollisionKind::Head);
    }

    for (agent, verdict) in agents.iter().zip(&verdicts) {
        if let Some(kind) = verdict {
            tracing::debug!("Agent {} collided ({:?}) at tick {}", agent.id, kind, tick);
        }
    }

    verdicts
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MoveCheck {
    Clear,
    /// Head-to-head swap with another agent, settled by the contest pass
    Swap(usize),
    Collides(CollisionKind),
}

#[allow(clippy::too_many_arguments)]
fn check_move(
    index: usize,
    proposed: &ProposedMove,
    agents: &[Agent],
    moves: &[Option<ProposedMove>],
    occupancy: &OccupancyGrid,
    cols: u32,
    rows: u32,
    tick: u64,
) -> MoveCheck {
    if !proposed.target.in_bounds(cols, rows) {
        return MoveCheck::Collides(CollisionKind::Wall);
    }

    let mover = &agents[index];
    let mut result = MoveCheck::Clear;

    for &other in occupancy.occupants(proposed.target) {
        // Own body never collides
        if other == index {
            continue;
        }
        let occupant = &agents[other];
        if mover.is_safe(tick) || occupant.is_safe(tick) {
            continue;
        }

        if let Some(theirs) = &moves[other] {
            if theirs.target == mover.head() && occupant.head() == proposed.target {
                result = MoveCheck::Swap(other);
                continue;
            }
            if theirs.vacates_tail && occupant.tail() == proposed.target {
                continue;
            }
        }

        return MoveCheck::Collides(CollisionKind::Body);
    }

    result
}

/// Agents losing a head-to-head contest
///
/// Contests are every cell targeted by two or more surviving movers, plus
/// each swap pair. Safe agents sit out. A unique longest contestant wins;
/// otherwise every contestant loses.
fn head_contest_losers(
    agents: &[Agent],
    moves: &[Option<ProposedMove>],
    verdicts: &Verdicts,
    swaps: &[(usize, usize)],
    cols: u32,
    tick: u64,
) -> Vec<usize> {
    let mut by_target: HashMap<CellKey, Contestants> = HashMap::new();
    for (index, proposed) in moves.iter().enumerate() {
        if let (Some(proposed), None) = (proposed, verdicts[index]) {
            by_target
                .entry(proposed.target.cell_key(cols))
                .or_default()
                .push(index);
        }
    }

    let contests = by_target
        .into_values()
        .filter(|group| group.len() > 1)
        .chain(swaps.iter().map(|&(a, b)| -> Contestants { smallvec![a, b] }));

    let mut losers = Vec::new();
    for group in contests {
        let contestants: Contestants = group
            .into_iter()
            .filter(|&i| verdicts[i].is_none() && !agents[i].is_safe(tick))
            .collect();
        if contestants.len() < 2 {
            continue;
        }

        let max_len = contestants.iter().map(|&i| agents[i].len()).max().unwrap_or(0);
        let leaders = contestants.iter().filter(|&&i| agents[i].len() == max_len).count();

        for &i in &contestants {
            if leaders > 1 || agents[i].len() < max_len {
                losers.push(i);
            }
        }
    }

    losers.sort_unstable();
    losers.dedup();
    losers
}
