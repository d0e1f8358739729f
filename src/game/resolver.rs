//! Tick resolver
//!
//! `advance` is a pure function of (previous state, commands). It clones what
//! it changes, forks the generator from the stored state once, and threads
//! that single generator through AI turns, respawn placement and food
//! replenishment in that order.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::game::constants::{food, spawn};
use crate::game::outcome::{self, RunEndReason};
use crate::game::rng::SeededRng;
use crate::game::spatial::{CellMask, OccupancyGrid};
use crate::game::state::{
    Agent, AgentId, CollisionKind, Food, FoodKind, RespawnTicket, RunStatus, WorldState,
};
use crate::game::systems::collision::{self, ProposedMove};
use crate::game::systems::{ai, effects, food as food_system, respawn};
use crate::util::vec2::{Direction, Vec2};

/// At most one queued turn per agent for a tick
pub type CommandMap = FxHashMap<AgentId, Direction>;

/// Collapse an ordered command list into a map; later entries win
pub fn commands_from<I, S>(commands: I) -> CommandMap
where
    I: IntoIterator<Item = (S, Direction)>,
    S: Into<AgentId>,
{
    let mut map = CommandMap::default();
    for (agent_id, direction) in commands {
        map.insert(agent_id.into(), direction);
    }
    map
}

/// Something observable that happened while resolving a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TickEvent {
    AgentEliminated {
        agent_id: AgentId,
        cause: CollisionKind,
    },
    FoodEaten {
        agent_id: AgentId,
        food_id: String,
        kind: FoodKind,
    },
    AgentRespawned {
        agent_id: AgentId,
        tick: u64,
    },
    /// Respawn delay expired but every spawn layout was blocked
    RespawnDeferred {
        agent_id: AgentId,
    },
    FoodSpawned {
        food_id: String,
        position: Vec2,
        kind: FoodKind,
    },
    RunEnded {
        reason: RunEndReason,
    },
}

/// Advance the world by one tick
pub fn advance(prev: &WorldState, commands: &CommandMap) -> WorldState {
    advance_with_events(prev, commands).0
}

/// Advance the world by one tick, also reporting what happened
///
/// Returns a clone of `prev` and no events once the run is over.
pub fn advance_with_events(prev: &WorldState, commands: &CommandMap) -> (WorldState, Vec<TickEvent>) {
    if !prev.is_running() {
        return (prev.clone(), Vec::new());
    }

    let tick = prev.tick;
    let config = prev.config;
    let (cols, rows) = (config.cols, config.rows);
    let mut rng = SeededRng::from_state(prev.rng_state);
    let mut events = Vec::new();
    let mut agents = prev.agents.clone();

    // 1. Expire effects
    for agent in agents.iter_mut().filter(|a| a.alive) {
        effects::prune_expired(&mut agent.effects, tick);
    }

    // 2. Explicit commands, backfilled by the AI policy on the pre-turn board
    let occupancy = OccupancyGrid::build(&agents, cols, rows);
    let turns: Vec<Option<Direction>> = agents
        .iter()
        .enumerate()
        .map(|(index, agent)| {
            if !agent.alive {
                return None;
            }
            match commands.get(&agent.id) {
                Some(&direction) => Some(direction),
                None if agent.is_ai() => ai::choose_direction(agent, index, prev, &occupancy, &mut rng),
                None => None,
            }
        })
        .collect();

    // 3. Queue turns (reversals are dropped)
    for (agent, turn) in agents.iter_mut().zip(&turns) {
        if let Some(direction) = turn {
            agent.queue_turn(*direction);
        }
    }

    // 4. Movement credit
    let moving: Vec<bool> = agents
        .iter_mut()
        .map(|agent| agent.alive && effects::gate_movement(agent))
        .collect();

    // 5-8. Proposed heads and collisions
    let moves = collision::propose_moves(&agents, &moving, &prev.food);
    let verdicts = collision::resolve(&agents, &moves, &occupancy, cols, rows, tick);

    // 9. Apply
    let mut respawn_queue = prev.respawn_queue.clone();
    let mut eaten_ids: Vec<&str> = Vec::new();

    for (index, agent) in agents.iter_mut().enumerate() {
        if let Some(cause) = verdicts[index] {
            eliminate(agent, cause, tick);
            events.push(TickEvent::AgentEliminated {
                agent_id: agent.id.clone(),
                cause,
            });
            if agent.is_ai() {
                respawn_queue.push(RespawnTicket {
                    agent_id: agent.id.clone(),
                    controller: agent.controller,
                    ticks_remaining: spawn::RESPAWN_DELAY,
                });
            }
            continue;
        }

        let Some(proposed) = &moves[index] else {
            continue;
        };
        let eaten = proposed.food.map(|i| &prev.food[i]);
        apply_move(agent, proposed, eaten, tick);

        if let Some(item) = eaten {
            events.push(TickEvent::FoodEaten {
                agent_id: agent.id.clone(),
                food_id: item.id.clone(),
                kind: item.kind,
            });
            eaten_ids.push(&item.id);
        }
    }

    // 10. Drop eaten food
    let mut food_items: Vec<Food> = prev
        .food
        .iter()
        .filter(|f| !eaten_ids.contains(&f.id.as_str()))
        .cloned()
        .collect();

    // 11. Respawns, placed against survivors plus remaining food
    let mut blocked = CellMask::from_world(cols, rows, &agents, food_items.iter().map(|f| &f.position));
    let respawns = respawn::process_tickets(&respawn_queue, &mut agents, &mut blocked, &config, tick, &mut rng);
    for agent_id in respawns.respawned {
        events.push(TickEvent::AgentRespawned { agent_id, tick });
    }
    for agent_id in respawns.deferred {
        events.push(TickEvent::RespawnDeferred { agent_id });
    }

    // 12. Top up food
    let mut food_serial = prev.food_serial;
    let before = food_items.len();
    food_system::replenish(
        &mut food_items,
        &mut blocked,
        &food::TABLE,
        &config,
        tick,
        &mut food_serial,
        &mut rng,
    );
    for item in &food_items[before..] {
        events.push(TickEvent::FoodSpawned {
            food_id: item.id.clone(),
            position: item.position,
            kind: item.kind,
        });
    }

    // 13-14. Status and tick counter
    let mut next = WorldState {
        tick: tick + 1,
        config,
        agents,
        food: food_items,
        rng_state: rng.state(),
        status: RunStatus::Running,
        respawn_queue: respawns.tickets,
        food_serial,
    };

    if let Some(reason) = outcome::check_run_end(&next) {
        tracing::debug!("Run ended at tick {}: {:?}", tick, reason);
        next.status = RunStatus::GameOver;
        events.push(TickEvent::RunEnded { reason });
    }

    (next, events)
}

/// Mark an agent dead, clearing everything that would carry into a respawn
fn eliminate(agent: &mut Agent, cause: CollisionKind, tick: u64) {
    agent.alive = false;
    agent.effects.clear();
    agent.pending_growth = 0;
    agent.speed_accumulator = 0.0;
    agent.safe_until_tick = tick;
    agent.pending_turn = None;
    agent.eliminated_by = Some(cause);
}

/// Step the body forward one cell, applying any food picked up
fn apply_move(agent: &mut Agent, proposed: &ProposedMove, eaten: Option<&Food>, tick: u64) {
    agent.segments.insert(0, proposed.target);

    if let Some(effect) = eaten.and_then(|f| f.effect) {
        agent.effects.push(effect.instantiate(tick));
    }

    let growth = agent.pending_growth + proposed.growth;
    if growth > 0 {
        agent.pending_growth = growth - 1;
    } else {
        agent.segments.pop();
    }

    agent.direction = proposed.direction;
    agent.pending_turn = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::constants::{food::MAX_FOOD, food::SPEED_BOOST, snake};
    use crate::game::state::Controller;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn fast(mut agent: Agent) -> Agent {
        agent.speed = 1.0;
        agent
    }

    fn player_at(x: i32, y: i32, facing: Direction) -> Agent {
        fast(Agent::spawn(snake::PLAYER_ID, Controller::Player, Vec2::new(x, y), facing))
    }

    fn ai_at(id: &str, x: i32, y: i32, facing: Direction) -> Agent {
        fast(Agent::spawn(id, Controller::Ai, Vec2::new(x, y), facing))
    }

    fn with_length(mut agent: Agent, length: usize) -> Agent {
        let back = agent.direction.opposite().delta();
        while agent.len() < length {
            let tail = agent.tail();
            agent.segments.push(tail + back);
        }
        agent
    }

    fn food_at(id: &str, x: i32, y: i32, kind: FoodKind, growth: u32) -> Food {
        Food {
            id: id.to_string(),
            position: Vec2::new(x, y),
            kind,
            growth,
            effect: if kind == FoodKind::Speed { Some(SPEED_BOOST) } else { None },
        }
    }

    /// Five items along the bottom-right edge keep the board at the food cap
    fn parked_food() -> Vec<Food> {
        (11..16)
            .map(|x| food_at(&format!("parked-{x}"), x, 15, FoodKind::Standard, 1))
            .collect()
    }

    /// 16x16 board with hand-placed agents and parked food
    fn arena(agents: Vec<Agent>) -> WorldState {
        let mut state = WorldState::new(GameConfig::new(16, 16, 12, 1, 0));
        state.agents = agents;
        state.food = parked_food();
        state
    }

    fn cmds(list: &[(&str, Direction)]) -> CommandMap {
        commands_from(list.iter().map(|(id, dir)| (id.to_string(), *dir)))
    }

    fn agent<'a>(state: &'a WorldState, id: &str) -> &'a Agent {
        state.get_agent(id).unwrap()
    }

    #[test]
    fn test_commands_from_last_wins() {
        let map = cmds(&[
            ("player", Direction::Up),
            ("ai-1", Direction::Left),
            ("player", Direction::Down),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["player"], Direction::Down);
    }

    #[test]
    fn test_tick_increments_and_input_untouched() {
        let prev = WorldState::new(GameConfig::default());
        let snapshot = prev.clone();
        let next = advance(&prev, &CommandMap::default());

        assert_eq!(next.tick, prev.tick + 1);
        assert_eq!(prev, snapshot);
    }

    #[test]
    fn test_noop_when_not_running() {
        let mut prev = WorldState::new(GameConfig::default());
        prev.status = RunStatus::GameOver;

        let (next, events) = advance_with_events(&prev, &cmds(&[("player", Direction::Up)]));
        assert_eq!(next, prev);
        assert!(events.is_empty());
    }

    #[test]
    fn test_wall_scenario_ends_run() {
        // 32x24, seed 1, no AI, no commands: the player runs right into the wall
        let mut state = WorldState::new(GameConfig::new(32, 24, 12, 1, 0));
        let none = CommandMap::default();

        for _ in 0..50 {
            if !state.is_running() {
                break;
            }
            let next = advance(&state, &none);
            let player = agent(&next, "player");
            if player.alive {
                assert_eq!(player.head().y, 12);
                assert_eq!(player.direction, Direction::Right);
            }
            state = next;
        }

        assert_eq!(state.status, RunStatus::GameOver);
        let player = agent(&state, "player");
        assert!(!player.alive);
        assert_eq!(player.eliminated_by, Some(CollisionKind::Wall));
        assert_eq!(player.head().x, 31);
    }

    #[test]
    fn test_base_speed_moves_every_other_tick() {
        let mut state = arena(vec![Agent::spawn(
            snake::PLAYER_ID,
            Controller::Player,
            Vec2::new(4, 4),
            Direction::Right,
        )]);
        let none = CommandMap::default();

        let mut heads = Vec::new();
        for _ in 0..4 {
            state = advance(&state, &none);
            heads.push(agent(&state, "player").head().x);
        }
        assert_eq!(heads, vec![4, 5, 5, 6]);
    }

    #[test]
    fn test_head_on_tie_kills_both() {
        let state = arena(vec![
            player_at(5, 5, Direction::Right),
            ai_at("ai-1", 7, 5, Direction::Left),
        ]);

        let (next, events) = advance_with_events(&state, &cmds(&[("ai-1", Direction::Left)]));

        assert!(!agent(&next, "player").alive);
        assert!(!agent(&next, "ai-1").alive);
        assert_eq!(agent(&next, "player").eliminated_by, Some(CollisionKind::Head));
        assert_eq!(agent(&next, "ai-1").eliminated_by, Some(CollisionKind::Head));
        assert_eq!(next.status, RunStatus::GameOver);
        assert!(events.contains(&TickEvent::RunEnded {
            reason: RunEndReason::NoAgents
        }));
        // Only the AI gets a ticket
        assert_eq!(next.respawn_queue.len(), 1);
        assert_eq!(next.respawn_queue[0].agent_id, "ai-1");
        assert_eq!(next.respawn_queue[0].ticks_remaining, spawn::RESPAWN_DELAY - 1);
    }

    #[test]
    fn test_three_way_tie_kills_shorter_contestant_too() {
        // {5, 5, 3} converge on (8, 8); the player watches from afar
        let state = arena(vec![
            player_at(2, 12, Direction::Up),
            with_length(ai_at("ai-1", 7, 8, Direction::Right), 5),
            with_length(ai_at("ai-2", 9, 8, Direction::Left), 5),
            ai_at("ai-3", 8, 9, Direction::Up),
        ]);
        let commands = cmds(&[
            ("ai-1", Direction::Right),
            ("ai-2", Direction::Left),
            ("ai-3", Direction::Up),
        ]);

        let next = advance(&state, &commands);

        for id in ["ai-1", "ai-2", "ai-3"] {
            assert!(!agent(&next, id).alive, "{id} survived");
            assert_eq!(agent(&next, id).eliminated_by, Some(CollisionKind::Head));
        }
        assert!(agent(&next, "player").alive);
        assert_eq!(next.status, RunStatus::Running);
    }

    #[test]
    fn test_longer_agent_wins_head_on() {
        let state = arena(vec![
            with_length(player_at(5, 5, Direction::Right), 4),
            ai_at("ai-1", 7, 5, Direction::Left),
        ]);

        let next = advance(&state, &cmds(&[("ai-1", Direction::Left)]));

        let player = agent(&next, "player");
        assert!(player.alive);
        assert_eq!(player.head(), Vec2::new(6, 5));
        assert_eq!(player.len(), 4);
        assert_eq!(agent(&next, "ai-1").eliminated_by, Some(CollisionKind::Head));
        assert_eq!(next.status, RunStatus::Running);
    }

    #[test]
    fn test_dead_agent_is_reset() {
        let mut ai = ai_at("ai-1", 7, 5, Direction::Left);
        ai.pending_growth = 2;
        ai.effects.push(SPEED_BOOST.instantiate(0));
        ai.pending_turn = Some(Direction::Left);
        let state = arena(vec![with_length(player_at(5, 5, Direction::Right), 4), ai]);

        let next = advance(&state, &cmds(&[("ai-1", Direction::Left)]));
        let dead = agent(&next, "ai-1");
        assert!(!dead.alive);
        assert!(dead.effects.is_empty());
        assert_eq!(dead.pending_growth, 0);
        assert_eq!(dead.speed_accumulator, 0.0);
        assert_eq!(dead.safe_until_tick, state.tick);
        assert_eq!(dead.pending_turn, None);
    }

    #[test]
    fn test_safety_window_bounds() {
        // ai-1 drives into the middle of the player's vertical body
        let build = |tick: u64| {
            let mut ai = ai_at("ai-1", 5, 5, Direction::Right);
            ai.safe_until_tick = 30 + spawn::SAFE_WINDOW;
            let mut state = arena(vec![player_at(6, 4, Direction::Up), ai]);
            state.tick = tick;
            state
        };
        let commands = cmds(&[("player", Direction::Up), ("ai-1", Direction::Right)]);

        for tick in 30..30 + spawn::SAFE_WINDOW {
            let next = advance(&build(tick), &commands);
            assert!(agent(&next, "ai-1").alive, "died inside window at tick {tick}");
            assert!(agent(&next, "player").alive);
        }

        let next = advance(&build(30 + spawn::SAFE_WINDOW), &commands);
        assert_eq!(agent(&next, "ai-1").eliminated_by, Some(CollisionKind::Body));
        assert!(agent(&next, "player").alive);
    }

    #[test]
    fn test_reversal_is_ignored() {
        let state = arena(vec![player_at(5, 5, Direction::Right)]);
        let next = advance(&state, &cmds(&[("player", Direction::Left)]));

        let player = agent(&next, "player");
        assert_eq!(player.direction, Direction::Right);
        assert_eq!(player.head(), Vec2::new(6, 5));
    }

    #[test]
    fn test_turn_waits_for_next_move() {
        let mut slow = player_at(5, 5, Direction::Right);
        slow.speed = 0.5;
        let state = arena(vec![slow]);

        // Not enough credit: the turn is queued, nothing moves
        let next = advance(&state, &cmds(&[("player", Direction::Down)]));
        let player = agent(&next, "player");
        assert_eq!(player.head(), Vec2::new(5, 5));
        assert_eq!(player.pending_turn, Some(Direction::Down));

        let next = advance(&next, &CommandMap::default());
        let player = agent(&next, "player");
        assert_eq!(player.head(), Vec2::new(5, 6));
        assert_eq!(player.direction, Direction::Down);
        assert_eq!(player.pending_turn, None);
    }

    #[test]
    fn test_standard_food_grows_by_one() {
        // A sixth parked item keeps the refill from landing in the lane
        let mut state = arena(vec![player_at(5, 5, Direction::Right)]);
        state.food.push(food_at("snack", 6, 5, FoodKind::Standard, 1));

        let (next, events) = advance_with_events(&state, &CommandMap::default());
        assert_eq!(agent(&next, "player").len(), 4);
        assert_eq!(agent(&next, "player").pending_growth, 0);
        assert!(!next.food.iter().any(|f| f.id == "snack"));
        assert!(events.contains(&TickEvent::FoodEaten {
            agent_id: "player".into(),
            food_id: "snack".into(),
            kind: FoodKind::Standard,
        }));

        let after = advance(&next, &CommandMap::default());
        assert_eq!(agent(&after, "player").len(), 4);
    }

    #[test]
    fn test_eaten_food_is_replaced() {
        let mut state = arena(vec![player_at(5, 5, Direction::Right)]);
        state.food[0] = food_at("snack", 6, 5, FoodKind::Standard, 1);

        let (next, events) = advance_with_events(&state, &CommandMap::default());
        assert_eq!(next.food.len(), MAX_FOOD);
        assert_eq!(next.food_serial, state.food_serial + 1);
        let spawned = events
            .iter()
            .filter(|e| matches!(e, TickEvent::FoodSpawned { .. }))
            .count();
        assert_eq!(spawned, 1);
        // Never on the body that just ate
        let player = agent(&next, "player");
        assert!(next.food.iter().all(|f| !player.segments.contains(&f.position)));
    }

    #[test]
    fn test_bulk_food_grows_over_ticks() {
        let mut state = arena(vec![player_at(2, 5, Direction::Right)]);
        state.food.push(food_at("feast", 3, 5, FoodKind::Bulk, 3));
        let none = CommandMap::default();

        let mut lengths = Vec::new();
        for _ in 0..4 {
            state = advance(&state, &none);
            lengths.push(agent(&state, "player").len());
        }
        assert_eq!(lengths, vec![4, 5, 6, 6]);
        assert_eq!(agent(&state, "player").pending_growth, 0);
    }

    #[test]
    fn test_speed_food_adds_effect_until_expiry() {
        let mut state = arena(vec![player_at(1, 5, Direction::Right)]);
        state.food[0] = food_at("zoom", 2, 5, FoodKind::Speed, 1);
        state.agents[0].speed = snake::BASE_SPEED;
        state.agents[0].speed_accumulator = 0.5;

        let next = advance(&state, &CommandMap::default());
        let player = agent(&next, "player");
        assert!(player.has_speed_boost());
        assert_eq!(player.effects[0].expires_at_tick, SPEED_BOOST.duration_ticks);

        // Jump to the expiry tick: pruned before movement
        let mut later = next.clone();
        later.tick = SPEED_BOOST.duration_ticks;
        let after = advance(&later, &CommandMap::default());
        assert!(!agent(&after, "player").has_speed_boost());
    }

    #[test]
    fn test_follow_vacating_tail() {
        // Player's target is ai-1's tail, which pops this tick
        let state = arena(vec![
            player_at(5, 5, Direction::Right),
            ai_at("ai-1", 6, 3, Direction::Up),
        ]);
        let next = advance(&state, &cmds(&[("ai-1", Direction::Up)]));

        assert!(agent(&next, "player").alive);
        assert!(agent(&next, "ai-1").alive);
        assert_eq!(agent(&next, "player").head(), Vec2::new(6, 5));
    }

    #[test]
    fn test_head_swap_tie_kills_both() {
        let state = arena(vec![
            player_at(5, 5, Direction::Right),
            ai_at("ai-1", 6, 5, Direction::Left),
        ]);
        let next = advance(&state, &cmds(&[("ai-1", Direction::Left)]));

        assert_eq!(agent(&next, "player").eliminated_by, Some(CollisionKind::Head));
        assert_eq!(agent(&next, "ai-1").eliminated_by, Some(CollisionKind::Head));
    }

    #[test]
    fn test_ai_backfills_toward_food() {
        let mut state = arena(vec![
            player_at(1, 3, Direction::Down),
            ai_at("ai-1", 8, 8, Direction::Right),
        ]);
        state.food = vec![food_at("bait", 8, 3, FoodKind::Standard, 1)];

        let next = advance(&state, &CommandMap::default());
        let ai = agent(&next, "ai-1");
        assert_eq!(ai.direction, Direction::Up);
        assert_eq!(ai.head(), Vec2::new(8, 7));
    }

    #[test]
    fn test_respawn_after_delay_with_safe_window() {
        let mut state = WorldState::new(GameConfig::new(32, 24, 12, 1, 1));
        // Park food in the top row, away from the player's lane and the spawn bodies
        state.food = (0..5)
            .map(|x| food_at(&format!("top-{x}"), x, 0, FoodKind::Standard, 1))
            .collect();
        state.agents[1].alive = false;
        state.respawn_queue.push(RespawnTicket {
            agent_id: "ai-1".into(),
            controller: Controller::Ai,
            ticks_remaining: spawn::RESPAWN_DELAY,
        });
        let none = CommandMap::default();

        let mut respawned_at = None;
        for _ in 0..spawn::RESPAWN_DELAY {
            let (next, events) = advance_with_events(&state, &none);
            for event in &events {
                if let TickEvent::AgentRespawned { agent_id, tick } = event {
                    assert_eq!(agent_id, "ai-1");
                    respawned_at = Some(*tick);
                }
            }
            state = next;
            if respawned_at.is_some() {
                break;
            }
        }

        let tick = respawned_at.unwrap();
        assert_eq!(tick, spawn::RESPAWN_DELAY as u64 - 1);
        let ai = agent(&state, "ai-1");
        assert!(ai.alive);
        assert_eq!(ai.len(), snake::SPAWN_LENGTH);
        assert_eq!(ai.safe_until_tick, tick + spawn::SAFE_WINDOW);
        assert!(state.respawn_queue.is_empty());
        // List order is preserved
        assert_eq!(state.agents[1].id, "ai-1");
    }

    /// Food on the head of every spawn layout except `open`
    fn food_on_layout_heads(cols: u32, rows: u32, open: Option<usize>) -> Vec<Food> {
        respawn::spawn_layouts(cols, rows)
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != open)
            .map(|(i, layout)| {
                food_at(&format!("block-{i}"), layout.head.x, layout.head.y, FoodKind::Standard, 1)
            })
            .collect()
    }

    fn dead_ai_with_ticket(state: &mut WorldState) {
        let mut ai = ai_at("ai-1", 2, 12, Direction::Up);
        ai.alive = false;
        state.agents.push(ai);
        state.respawn_queue.push(RespawnTicket {
            agent_id: "ai-1".into(),
            controller: Controller::Ai,
            ticks_remaining: 1,
        });
    }

    #[test]
    fn test_blocked_respawn_waits_for_free_layout() {
        let mut state = arena(vec![player_at(5, 7, Direction::Right)]);
        state.food = food_on_layout_heads(16, 16, None);
        dead_ai_with_ticket(&mut state);
        let none = CommandMap::default();

        for _ in 0..3 {
            let (next, events) = advance_with_events(&state, &none);
            assert!(events.contains(&TickEvent::RespawnDeferred { agent_id: "ai-1".into() }));
            assert!(!events.iter().any(|e| matches!(e, TickEvent::AgentRespawned { .. })));
            assert_eq!(next.respawn_queue.len(), 1);
            assert_eq!(next.respawn_queue[0].ticks_remaining, 1);
            assert!(!agent(&next, "ai-1").alive);
            state = next;
        }

        // Free every layout
        state.food = parked_food();
        let tick = state.tick;
        let (next, events) = advance_with_events(&state, &none);
        assert!(events.contains(&TickEvent::AgentRespawned { agent_id: "ai-1".into(), tick }));
        assert!(next.respawn_queue.is_empty());
        let ai = agent(&next, "ai-1");
        assert!(ai.alive);
        assert_eq!(ai.safe_until_tick, tick + spawn::SAFE_WINDOW);
    }

    #[test]
    fn test_respawned_agent_safe_window_bounds() {
        // Only layout 0 is open, so the respawn position is known
        let layout = respawn::spawn_layouts(16, 16)[0];
        let mut state = arena(vec![player_at(5, 7, Direction::Right)]);
        state.food = food_on_layout_heads(16, 16, Some(0));
        dead_ai_with_ticket(&mut state);

        let (respawned, events) = advance_with_events(&state, &CommandMap::default());
        let spawned_at = state.tick;
        assert!(events.contains(&TickEvent::AgentRespawned { agent_id: "ai-1".into(), tick: spawned_at }));
        assert_eq!(agent(&respawned, "ai-1").head(), layout.head);
        assert_eq!(agent(&respawned, "ai-1").safe_until_tick, spawned_at + spawn::SAFE_WINDOW);

        // The player's vertical body sits directly in front of the respawned head
        let build = |tick: u64| {
            let mut next = respawned.clone();
            next.tick = tick;
            let ai = next.agents.iter_mut().find(|a| a.id == "ai-1").unwrap();
            ai.speed = 1.0;
            next.agents[0] = player_at(layout.head.x + 1, layout.head.y - 1, Direction::Up);
            next
        };
        let commands = cmds(&[("player", Direction::Up), ("ai-1", layout.facing)]);

        for tick in spawned_at..spawned_at + spawn::SAFE_WINDOW {
            let next = advance(&build(tick), &commands);
            assert!(agent(&next, "ai-1").alive, "died inside window at tick {tick}");
            assert!(agent(&next, "player").alive);
        }

        let next = advance(&build(spawned_at + spawn::SAFE_WINDOW), &commands);
        assert_eq!(agent(&next, "ai-1").eliminated_by, Some(CollisionKind::Body));
        assert!(agent(&next, "player").alive);
    }

    #[test]
    fn test_player_is_never_respawned() {
        let mut state = arena(vec![player_at(5, 5, Direction::Right), ai_at("ai-1", 2, 12, Direction::Up)]);
        state.respawn_queue.push(RespawnTicket {
            agent_id: "player".into(),
            controller: Controller::Player,
            ticks_remaining: 1,
        });

        let next = advance(&state, &cmds(&[("ai-1", Direction::Up)]));
        assert!(next.respawn_queue.is_empty());
        assert_eq!(next.agents.len(), 2);
    }

    fn random_commands(rng: &mut StdRng) -> CommandMap {
        let mut map = CommandMap::default();
        if rng.gen_bool(0.3) {
            map.insert("player".into(), Direction::ALL[rng.gen_range(0..4)]);
        }
        if rng.gen_bool(0.1) {
            let id = format!("ai-{}", rng.gen_range(1..=4));
            map.insert(id, Direction::ALL[rng.gen_range(0..4)]);
        }
        map
    }

    fn run_random(seed: u64, ticks: usize) -> Vec<WorldState> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = WorldState::new(GameConfig::new(24, 24, 12, 7, 4));
        let mut history = vec![state.clone()];
        for _ in 0..ticks {
            state = advance(&state, &random_commands(&mut rng));
            history.push(state.clone());
        }
        history
    }

    #[test]
    fn test_determinism() {
        let a = run_random(2024, 300);
        let b = run_random(2024, 300);
        assert_eq!(a, b);
    }

    #[test]
    fn test_invariants_over_random_runs() {
        for seed in 0..5 {
            let history = run_random(seed, 300);
            for pair in history.windows(2) {
                let (prev, next) = (&pair[0], &pair[1]);

                assert!(next.food.len() <= MAX_FOOD);

                let mut ids: Vec<_> = next.food.iter().map(|f| &f.id).collect();
                ids.sort();
                ids.dedup();
                assert_eq!(ids.len(), next.food.len(), "duplicate food ids");

                for (before, after) in prev.agents.iter().zip(&next.agents) {
                    if before.alive && after.alive {
                        assert_ne!(after.direction, before.direction.opposite());
                        assert!(after.len() >= snake::SPAWN_LENGTH);
                        assert!(after.speed_accumulator >= 0.0 && after.speed_accumulator < 1.0);
                    }
                }

                if prev.is_running() {
                    assert_eq!(next.tick, prev.tick + 1);
                }
            }
        }
    }
}
