//! Autopilot for unattended demo play
//!
//! Aims at the most dangerous threat (closest to the vault), falls back to
//! the nearest pickup, and keeps the trigger down while there is a target.

use super::state::{PowerUpCategory, PowerUpKind};
use super::tick::{FrameInput, GamePhase, Simulation};
use crate::angle_between;

/// Hold the freeze until this many threats are live
const FREEZE_CROWD: usize = 4;

/// Input the autopilot would give this frame
pub fn autopilot_input(sim: &Simulation, now: f64) -> FrameInput {
    let state = sim.state();
    let vault = state.vault.pos;

    let threat = state
        .threats
        .iter()
        .filter(|t| t.alive)
        .min_by(|a, b| a.pos.distance_squared(vault).total_cmp(&b.pos.distance_squared(vault)))
        .map(|t| t.pos);
    let pickup = || {
        state
            .pickups
            .iter()
            .filter(|p| p.alive)
            .min_by(|a, b| a.pos.distance_squared(vault).total_cmp(&b.pos.distance_squared(vault)))
            .map(|p| p.pos)
    };

    let target = threat.or_else(pickup);
    FrameInput {
        aim_angle: target.map(|pos| angle_between(vault, pos)),
        fire_requested: target.is_some(),
        fire_held: target.is_some(),
        last_activity: now,
    }
}

/// Power-up the autopilot would activate now, if any
pub fn autopilot_activation(sim: &Simulation) -> Option<PowerUpKind> {
    if sim.phase() != GamePhase::Playing {
        return None;
    }
    let state = sim.state();
    if state.inventory.is_empty() {
        return None;
    }
    let config = sim.config();
    let category = |kind: &PowerUpKind| config.powerups.get(kind).map(|d| d.category);

    let weapon_active = state
        .active_powerups
        .iter()
        .any(|p| p.category == PowerUpCategory::Weapon);
    if !weapon_active {
        let best = PowerUpKind::DISPLAY_ORDER
            .iter()
            .filter(|k| state.inventory.count(**k) > 0)
            .filter(|k| category(*k) == Some(PowerUpCategory::Weapon))
            .max_by_key(|k| config.powerups.get(*k).map(|d| d.priority).unwrap_or(0));
        if let Some(&kind) = best {
            return Some(kind);
        }
    }

    if !state.freeze_active() && state.live_threat_count() >= FREEZE_CROWD {
        return PowerUpKind::DISPLAY_ORDER
            .iter()
            .copied()
            .find(|k| state.inventory.count(*k) > 0 && category(k) == Some(PowerUpCategory::Tool));
    }
    None
}
