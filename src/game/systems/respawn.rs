//! Spawn layouts and the delayed AI respawn queue

use crate::config::GameConfig;
use crate::game::constants::{snake, spawn, spawn_margin};
use crate::game::rng::SeededRng;
use crate::game::spatial::CellMask;
use crate::game::state::{straight_body, Agent, AgentId, Controller, RespawnTicket};
use crate::util::vec2::{Direction, Vec2};

/// Candidate spawn point: head cell plus initial facing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnLayout {
    pub head: Vec2,
    pub facing: Direction,
}

/// Fixed spawn points: the four corners then top and bottom center, inset by
/// the board's spawn margin. Each faces into the board so its body trails
/// toward the nearest edge.
pub fn spawn_layouts(cols: u32, rows: u32) -> Vec<SpawnLayout> {
    let m = spawn_margin(cols, rows) as i32;
    let (c, r) = (cols as i32, rows as i32);
    let mid = c / 2;

    vec![
        SpawnLayout { head: Vec2::new(m, m), facing: Direction::Right },
        SpawnLayout { head: Vec2::new(c - 1 - m, r - 1 - m), facing: Direction::Left },
        SpawnLayout { head: Vec2::new(c - 1 - m, m), facing: Direction::Down },
        SpawnLayout { head: Vec2::new(m, r - 1 - m), facing: Direction::Up },
        SpawnLayout { head: Vec2::new(mid, m), facing: Direction::Down },
        SpawnLayout { head: Vec2::new(mid, r - 1 - m), facing: Direction::Up },
    ]
}

/// First layout, trying in rotation from `start`, whose whole spawn body is
/// in bounds and clear of `blocked`
pub fn place(
    layouts: &[SpawnLayout],
    start: usize,
    blocked: &CellMask,
    config: &GameConfig,
) -> Option<SpawnLayout> {
    if layouts.is_empty() {
        return None;
    }

    (0..layouts.len())
        .map(|offset| layouts[(start + offset) % layouts.len()])
        .find(|layout| {
            straight_body(layout.head, layout.facing, snake::SPAWN_LENGTH)
                .iter()
                .all(|cell| cell.in_bounds(config.cols, config.rows) && !blocked.is_blocked(*cell))
        })
}

/// Result of one pass over the respawn queue
#[derive(Debug, Default)]
pub struct RespawnOutcome {
    /// Tickets still waiting, including re-armed ones
    pub tickets: Vec<RespawnTicket>,
    pub respawned: Vec<AgentId>,
    /// Tickets that expired this tick but found no free layout
    pub deferred: Vec<AgentId>,
}

/// Count every ticket down and respawn the AI agents whose delay ran out
///
/// Placement draws one start index from `rng` per expired AI ticket, in
/// queue order. A placed agent replaces its dead entry in `agents` (keeping
/// list order), is safe until `tick + SAFE_WINDOW` and its cells are added
/// to `blocked`. Expired player tickets are dropped.
pub fn process_tickets(
    tickets: &[RespawnTicket],
    agents: &mut Vec<Agent>,
    blocked: &mut CellMask,
    config: &GameConfig,
    tick: u64,
    rng: &mut SeededRng,
) -> RespawnOutcome {
    let mut outcome = RespawnOutcome::default();
    let layouts = spawn_layouts(config.cols, config.rows);

    for ticket in tickets {
        let remaining = ticket.ticks_remaining.saturating_sub(1);
        if remaining > 0 {
            outcome.tickets.push(RespawnTicket {
                ticks_remaining: remaining,
                ..ticket.clone()
            });
            continue;
        }

        if ticket.controller != Controller::Ai {
            continue;
        }

        let start = rng.next_index(layouts.len());
        match place(&layouts, start, blocked, config) {
            Some(layout) => {
                let mut agent = Agent::spawn(ticket.agent_id.clone(), Controller::Ai, layout.head, layout.facing);
                agent.safe_until_tick = tick + spawn::SAFE_WINDOW;
                blocked.insert_all(agent.segments.iter().copied());

                tracing::debug!(
                    "Respawned {} at {:?} facing {:?} (safe until tick {})",
                    agent.id,
                    layout.head,
                    layout.facing,
                    agent.safe_until_tick
                );

                match agents.iter_mut().find(|a| a.id == ticket.agent_id) {
                    Some(slot) => *slot = agent,
                    None => agents.push(agent),
                }
                outcome.respawned.push(ticket.agent_id.clone());
            }
            None => {
                tracing::debug!("No free spawn layout for {}, retrying next tick", ticket.agent_id);
                outcome.tickets.push(RespawnTicket {
                    ticks_remaining: 1,
                    ..ticket.clone()
                });
                outcome.deferred.push(ticket.agent_id.clone());
            }
        }
    }

    outcome
}
