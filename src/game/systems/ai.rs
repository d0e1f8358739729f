//! Heuristic turn policy for AI-controlled agents
//!
//! Candidates are scored by distance to the nearest food, a bonus for
//! keeping the current heading, and a small seeded noise term. Everything
//! it reads is the pre-turn world, so every AI sees the same board.

use crate::game::constants::ai::{CONTINUATION_BONUS, NOISE_AMPLITUDE};
use crate::game::rng::SeededRng;
use crate::game::spatial::OccupancyGrid;
use crate::game::state::{Agent, Food, WorldState};
use crate::util::vec2::{Direction, Vec2};

/// Pick a direction for `agent`, or None if every candidate is blocked.
///
/// `index` is the agent's position in the agent list used to build
/// `occupancy`. Draws one noise value per legal candidate from `rng`.
pub fn choose_direction(
    agent: &Agent,
    index: usize,
    world: &WorldState,
    occupancy: &OccupancyGrid,
    rng: &mut SeededRng,
) -> Option<Direction> {
    if !agent.alive {
        return None;
    }

    let head = agent.head();
    let mut best: Option<(Direction, f64)> = None;

    for candidate in Direction::ALL {
        if candidate.is_reverse_of(agent.direction) {
            continue;
        }

        let target = head.step(candidate);
        if !is_passable(agent, index, target, world, occupancy) {
            continue;
        }

        let mut score = -(nearest_food_distance(target, &world.food) as f64);
        if candidate == agent.direction {
            score += CONTINUATION_BONUS;
        }
        score += rng.next_signed(NOISE_AMPLITUDE);

        // Strictly greater: the first candidate keeps ties
        let improves = best.map_or(true, |(_, best_score)| score > best_score);
        if improves {
            best = Some((candidate, score));
        }
    }

    tracing::trace!(
        "AI {} at {:?} facing {:?} chose {:?}",
        agent.id,
        head,
        agent.direction,
        best.map(|(dir, _)| dir)
    );

    best.map(|(dir, _)| dir)
}

/// In bounds and free, except for the agent's own tail when it will move away
fn is_passable(
    agent: &Agent,
    index: usize,
    target: Vec2,
    world: &WorldState,
    occupancy: &OccupancyGrid,
) -> bool {
    if !target.in_bounds(world.config.cols, world.config.rows) {
        return false;
    }

    if !occupancy.is_occupied(target) {
        return true;
    }

    let own_tail_vacating = target == agent.tail() && agent.pending_growth == 0;
    own_tail_vacating && !occupancy.is_occupied_by_other(target, index)
}

/// Manhattan distance to the closest food, 0 when the board has none
fn nearest_food_distance(cell: Vec2, food: &[Food]) -> u32 {
    food.iter()
        .map(|f| f.position.manhattan(cell))
        .min()
        .unwrap_or(0)
}
