//! Food placement and weighted kind selection

use crate::config::GameConfig;
use crate::game::constants::food::MAX_FOOD;
use crate::game::rng::SeededRng;
use crate::game::spatial::CellMask;
use crate::game::state::{Food, FoodSpec};
use crate::util::vec2::Vec2;

/// Top the board up to `MAX_FOOD` items
///
/// Each slot samples uniform coordinates until it finds a cell not in
/// `blocked`, giving up after `area` attempts (board treated as full).
/// Placed cells are added to `blocked`. Returns the number of items placed.
pub fn replenish(
    food: &mut Vec<Food>,
    blocked: &mut CellMask,
    table: &[FoodSpec],
    config: &GameConfig,
    tick: u64,
    serial: &mut u64,
    rng: &mut SeededRng,
) -> usize {
    if table.is_empty() {
        return 0;
    }

    let mut placed = 0;
    while food.len() < MAX_FOOD {
        let Some(position) = find_free_cell(blocked, config, rng) else {
            tracing::debug!(
                "Food placement gave up at tick {} with {} items, board full",
                tick,
                food.len()
            );
            break;
        };

        let spec = pick_kind(table, rng.next_f64());
        let item = Food {
            id: format!("f{}-{}-{}", tick, *serial, spec.kind.as_str()),
            position,
            kind: spec.kind,
            growth: spec.growth,
            effect: spec.effect,
        };
        *serial += 1;

        blocked.insert(position);
        food.push(item);
        placed += 1;
    }
    placed
}

/// Rejection-sample a free cell, at most `area` draws of (x, y)
fn find_free_cell(blocked: &CellMask, config: &GameConfig, rng: &mut SeededRng) -> Option<Vec2> {
    for _ in 0..config.area() {
        let x = rng.next_index(config.cols as usize) as i32;
        let y = rng.next_index(config.rows as usize) as i32;
        let cell = Vec2::new(x, y);
        if !blocked.is_blocked(cell) {
            return Some(cell);
        }
    }
    None
}

/// Cumulative-weight selection. `roll` is in [0, 1) and is scaled by the
/// table's total weight. Falls back to the last row on rounding.
///
/// `table` must not be empty.
pub fn pick_kind(table: &[FoodSpec], roll: f64) -> &FoodSpec {
    let total: f64 = table.iter().map(|spec| spec.weight).sum();
    let target = roll * total;

    let mut cumulative = 0.0;
    for spec in table {
        cumulative += spec.weight;
        if target < cumulative {
            return spec;
        }
    }
    &table[table.len() - 1]
}
