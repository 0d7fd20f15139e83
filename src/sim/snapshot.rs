//! Read-only views handed to presentation collaborators

use std::collections::BTreeMap;

use serde::Serialize;

use super::events::PopupInfo;
use super::scoring::Scoreboard;
use super::spawner::Spawner;
use super::state::{
    Effect, GameState, Laser, Pickup, PowerUpKind, Projectile, Threat, ThreatKind, Vault,
    Viewport, WaveRing,
};
use super::tick::GamePhase;
use crate::config::GameConfig;

/// Everything a renderer draws in one frame, borrowed from the simulation
#[derive(Debug, Clone, Copy)]
pub struct RenderSnapshot<'a> {
    pub phase: GamePhase,
    pub bounds: Viewport,
    pub scale: f32,
    /// Seconds since the simulation was created (background animation)
    pub elapsed: f32,
    pub vault: &'a Vault,
    pub threats: &'a [Threat],
    pub pickups: &'a [Pickup],
    pub projectiles: &'a [Projectile],
    pub lasers: &'a [Laser],
    pub rings: &'a [WaveRing],
    pub effects: &'a [Effect],
    pub aim_angle: f32,
    /// Remaining fraction of the freeze tool while it is active
    pub freeze_progress: Option<f32>,
    pub popup: Option<&'a PopupInfo>,
}

impl<'a> RenderSnapshot<'a> {
    pub fn capture(
        state: &'a GameState,
        phase: GamePhase,
        elapsed: f32,
        popup: Option<&'a PopupInfo>,
    ) -> Self {
        Self {
            phase,
            bounds: state.bounds,
            scale: state.scale(),
            elapsed,
            vault: &state.vault,
            threats: &state.threats,
            pickups: &state.pickups,
            projectiles: &state.projectiles,
            lasers: &state.lasers,
            rings: &state.rings,
            effects: &state.effects,
            aim_angle: state.aim_angle,
            freeze_progress: state.active_tool().map(|t| t.fraction_remaining()),
            popup,
        }
    }
}

/// One inventory slot (1-based hotkey)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySlot {
    pub slot: usize,
    pub kind: PowerUpKind,
    pub label: String,
    pub icon: String,
    pub count: u32,
}

/// A running power-up with its countdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveView {
    pub kind: PowerUpKind,
    pub label: String,
    pub remaining: f32,
    pub duration: f32,
}

/// HUD values, owned so they can be serialized or sent across a boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub time_left: f32,
    /// Zero-based wave index
    pub wave_index: usize,
    pub wave_name: String,
    pub wave_total: usize,
    pub integrity_percent: f32,
    pub score: u64,
    pub inventory: Vec<InventorySlot>,
    pub active: Vec<ActiveView>,
    pub kills: u32,
    pub kills_by_kind: BTreeMap<ThreatKind, u32>,
}

impl HudSnapshot {
    pub fn capture(
        state: &GameState,
        config: &GameConfig,
        spawner: &Spawner,
        scoreboard: &Scoreboard,
    ) -> Self {
        let label = |kind: PowerUpKind| {
            config
                .powerups
                .get(&kind)
                .map(|d| d.label.clone())
                .unwrap_or_else(|| kind.key().to_string())
        };

        let inventory = state
            .inventory
            .counts()
            .into_iter()
            .take(config.max_inventory_slots)
            .enumerate()
            .map(|(i, (kind, count))| InventorySlot {
                slot: i + 1,
                kind,
                label: label(kind),
                icon: config
                    .powerups
                    .get(&kind)
                    .map(|d| d.icon.clone())
                    .unwrap_or_default(),
                count,
            })
            .collect();

        let active = state
            .active_powerups
            .iter()
            .map(|p| ActiveView {
                kind: p.kind,
                label: label(p.kind),
                remaining: p.remaining.max(0.0),
                duration: p.duration,
            })
            .collect();

        let wave_total = config.waves.len();
        let wave_index = spawner.wave_index().min(wave_total.saturating_sub(1));

        Self {
            time_left: state.time_left.max(0.0),
            wave_index,
            wave_name: config.wave_name(wave_index).to_string(),
            wave_total,
            integrity_percent: state.vault.integrity_percent(),
            score: scoreboard.score,
            inventory,
            active,
            kills: scoreboard.kills,
            kills_by_kind: scoreboard.kills_by_kind.clone(),
        }
    }
}
