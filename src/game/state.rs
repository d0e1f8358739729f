//! World state definitions and structures
//!
//! Contains every entity (agents, food, effects, respawn tickets) and the
//! root `WorldState` snapshot handed into and out of the resolver.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::GameConfig;
use crate::game::constants::{food, snake};
use crate::game::rng::SeededRng;
use crate::game::spatial::CellMask;
use crate::game::systems::{food as food_system, respawn};
use crate::util::vec2::{Direction, Vec2};

/// Stable agent identifier (`"player"` or `"ai-<n>"`)
pub type AgentId = String;

/// Who issues an agent's turns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Controller {
    Player,
    Ai,
}

/// Reason an agent was eliminated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CollisionKind {
    /// Head left the board
    Wall,
    /// Head entered another agent's body
    Body,
    /// Lost (or tied) a head-to-head contest
    Head,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EffectKind {
    SpeedBoost,
}

/// Timed effect active on an agent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub multiplier: f64,
    /// Pruned once `expires_at_tick <= tick`
    pub expires_at_tick: u64,
}

/// Effect carried by a food item, instantiated on pickup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EffectTemplate {
    pub kind: EffectKind,
    pub multiplier: f64,
    pub duration_ticks: u64,
}

impl EffectTemplate {
    pub fn instantiate(&self, tick: u64) -> Effect {
        Effect {
            kind: self.kind,
            multiplier: self.multiplier,
            expires_at_tick: tick + self.duration_ticks,
        }
    }
}

/// Inline storage: agents rarely carry more than a couple of effects
pub type EffectSet = SmallVec<[Effect; 2]>;

/// A controllable snake
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    /// Body cells, `segments[0]` is the head
    pub segments: Vec<Vec2>,
    pub direction: Direction,
    /// Turn applied on the next tick the agent actually moves
    pub pending_turn: Option<Direction>,
    pub alive: bool,
    /// Cells per tick before effects
    pub speed: f64,
    /// Fractional movement credit in [0, 1)
    pub speed_accumulator: f64,
    pub controller: Controller,
    /// Segments still to add before the tail trims again
    pub pending_growth: u32,
    pub effects: EffectSet,
    /// Immune to lethal collisions while `tick < safe_until_tick`
    pub safe_until_tick: u64,
    #[serde(default)]
    pub eliminated_by: Option<CollisionKind>,
}

impl Agent {
    /// Build a fresh agent with a straight body trailing behind `head`
    pub fn spawn(id: impl Into<AgentId>, controller: Controller, head: Vec2, facing: Direction) -> Self {
        Self {
            id: id.into(),
            segments: straight_body(head, facing, snake::SPAWN_LENGTH),
            direction: facing,
            pending_turn: None,
            alive: true,
            speed: snake::BASE_SPEED,
            speed_accumulator: 0.0,
            controller,
            pending_growth: 0,
            effects: EffectSet::new(),
            safe_until_tick: 0,
            eliminated_by: None,
        }
    }

    #[inline]
    pub fn head(&self) -> Vec2 {
        self.segments[0]
    }

    #[inline]
    pub fn tail(&self) -> Vec2 {
        self.segments[self.segments.len() - 1]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn is_ai(&self) -> bool {
        self.controller == Controller::Ai
    }

    /// Check if the agent is inside its post-spawn immunity window
    #[inline]
    pub fn is_safe(&self, tick: u64) -> bool {
        tick < self.safe_until_tick
    }

    /// Direction the next move will use
    #[inline]
    pub fn heading(&self) -> Direction {
        self.pending_turn.unwrap_or(self.direction)
    }

    /// Queue a turn, replacing any unapplied one. 180-degree reversals of
    /// the current direction are ignored. Returns whether the turn was kept.
    pub fn queue_turn(&mut self, direction: Direction) -> bool {
        if direction.is_reverse_of(self.direction) {
            return false;
        }
        self.pending_turn = Some(direction);
        true
    }

    pub fn has_speed_boost(&self) -> bool {
        self.effects.iter().any(|e| e.kind == EffectKind::SpeedBoost)
    }
}

/// Body cells for a spawn: head first, trailing opposite to `facing`
pub fn straight_body(head: Vec2, facing: Direction, length: usize) -> Vec<Vec2> {
    let back = facing.opposite().delta();
    let mut segments = Vec::with_capacity(length);
    let mut cell = head;
    for _ in 0..length {
        segments.push(cell);
        cell += back;
    }
    segments
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FoodKind {
    Standard,
    Bulk,
    Speed,
}

impl FoodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodKind::Standard => "standard",
            FoodKind::Bulk => "bulk",
            FoodKind::Speed => "speed",
        }
    }
}

/// One row of the weighted food table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodSpec {
    pub kind: FoodKind,
    pub weight: f64,
    pub growth: u32,
    pub effect: Option<EffectTemplate>,
}

/// Collectible food item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Food {
    pub id: String,
    pub position: Vec2,
    pub kind: FoodKind,
    pub growth: u32,
    pub effect: Option<EffectTemplate>,
}

/// Pending re-creation of an eliminated agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RespawnTicket {
    pub agent_id: AgentId,
    pub controller: Controller,
    pub ticks_remaining: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    GameOver,
}

/// Root snapshot of the simulation
///
/// Treated as immutable: the resolver always builds a new one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldState {
    pub tick: u64,
    pub config: GameConfig,
    /// Player first, then AI agents in creation order
    pub agents: Vec<Agent>,
    pub food: Vec<Food>,
    pub rng_state: u32,
    pub status: RunStatus,
    pub respawn_queue: Vec<RespawnTicket>,
    /// Monotonic counter keeping food ids unique within a run
    pub food_serial: u64,
}

impl WorldState {
    /// Initial state for a run (also used on restart)
    pub fn new(config: GameConfig) -> Self {
        let config = config.clamped();
        let mut rng = SeededRng::new(config.seed);
        let mut blocked = CellMask::new(config.cols, config.rows);

        let center = Vec2::new((config.cols / 2) as i32, (config.rows / 2) as i32);
        let player = Agent::spawn(snake::PLAYER_ID, Controller::Player, center, Direction::Right);
        blocked.insert_all(player.segments.iter().copied());

        let mut agents = Vec::with_capacity(1 + config.ai_count as usize);
        agents.push(player);
        let mut respawn_queue = Vec::new();

        let layouts = respawn::spawn_layouts(config.cols, config.rows);
        for n in 1..=config.ai_count as usize {
            let id = format!("ai-{n}");
            match respawn::place(&layouts, n - 1, &blocked, &config) {
                Some(layout) => {
                    let agent = Agent::spawn(id, Controller::Ai, layout.head, layout.facing);
                    blocked.insert_all(agent.segments.iter().copied());
                    agents.push(agent);
                }
                None => {
                    tracing::debug!("No free spawn layout for {}, deferring", id);
                    let mut agent = Agent::spawn(id.clone(), Controller::Ai, center, Direction::Right);
                    agent.alive = false;
                    agents.push(agent);
                    respawn_queue.push(RespawnTicket {
                        agent_id: id,
                        controller: Controller::Ai,
                        ticks_remaining: 1,
                    });
                }
            }
        }

        let mut food_items = Vec::with_capacity(food::MAX_FOOD);
        let mut food_serial = 0;
        food_system::replenish(
            &mut food_items,
            &mut blocked,
            &food::TABLE,
            &config,
            0,
            &mut food_serial,
            &mut rng,
        );

        Self {
            tick: 0,
            config,
            agents,
            food: food_items,
            rng_state: rng.state(),
            status: RunStatus::Running,
            respawn_queue,
            food_serial,
        }
    }

    pub fn get_agent(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn player(&self) -> Option<&Agent> {
        self.agents.iter().find(|a| a.controller == Controller::Player)
    }

    pub fn alive_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.alive)
    }

    pub fn alive_count(&self) -> usize {
        self.alive_agents().count()
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }
}
