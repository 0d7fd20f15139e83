//! Outbound simulation events
//!
//! The simulation never calls into presentation code. Everything a renderer,
//! HUD, audio player or leaderboard needs to react to is pushed onto a queue
//! that collaborators drain once per frame.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, PowerUpKind, ThreatKind};
use super::tick::GamePhase;

/// Named sound cues (fire-and-forget)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Shoot,
    Laser,
    Hit,
    Kill,
    Pickup,
    Expire,
    VaultHit,
    WaveStart,
    GameOver,
}

impl SoundCue {
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Shoot => "shoot",
            SoundCue::Laser => "laser",
            SoundCue::Hit => "hit",
            SoundCue::Kill => "kill",
            SoundCue::Pickup => "pickup",
            SoundCue::Expire => "expire",
            SoundCue::VaultHit => "vault_hit",
            SoundCue::WaveStart => "wave_start",
            SoundCue::GameOver => "game_over",
        }
    }
}

/// Raw outcome of the collision pass, applied by the game loop
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEvent {
    ThreatHit {
        id: EntityId,
        kind: ThreatKind,
        pos: Vec2,
    },
    ThreatKilled {
        id: EntityId,
        kind: ThreatKind,
        pos: Vec2,
        points: u32,
        /// Any power-up active at the moment of the kill
        powerup_active: bool,
    },
    PickupHit {
        id: EntityId,
        kind: PowerUpKind,
        pos: Vec2,
    },
    PickupCollected {
        id: EntityId,
        kind: PowerUpKind,
        pos: Vec2,
    },
    VaultHit {
        threat_id: EntityId,
        kind: ThreatKind,
        damage: i32,
    },
}

/// Educational popup contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupInfo {
    pub kind: PowerUpKind,
    pub label: String,
    pub chip_color: String,
    pub description: String,
}

/// End-of-game results for the summary screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub survived: bool,
    pub score: u64,
    pub rank: String,
    pub kills: u32,
    pub kills_by_kind: BTreeMap<ThreatKind, u32>,
    pub integrity: i32,
    pub max_integrity: i32,
    pub time_left: f32,
    pub time_bonus: u64,
}

/// Leaderboard entry handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub initials: String,
    pub score: u64,
    pub rank: String,
    /// Unix timestamp (ms)
    pub timestamp: f64,
}

/// Events drained by presentation collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundCue),
    PhaseChanged { from: GamePhase, to: GamePhase },
    WaveStarted { index: usize, name: String },
    ThreatKilled { kind: ThreatKind, points: u64 },
    PickupCollected { kind: PowerUpKind },
    VaultHit { damage: i32, integrity: i32 },
    PowerUpActivated {
        kind: PowerUpKind,
        evicted: Option<PowerUpKind>,
    },
    PowerUpExpired { kind: PowerUpKind },
    PopupShown(PopupInfo),
    PopupDismissed,
    GameOver(GameSummary),
    ScoreRecorded(ScoreRecord),
}
