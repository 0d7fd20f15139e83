//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Wall-clock time enters only through `Simulation::frame`
//! - Seeded RNG only (gameplay and cosmetic streams kept apart)
//! - Stable iteration order (spawn order, ordered maps)
//! - No rendering, audio or platform dependencies beyond the score timestamp

pub mod autopilot;
pub mod collision;
pub mod events;
pub mod scoring;
pub mod snapshot;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod weapon;

pub use autopilot::{autopilot_activation, autopilot_input};
pub use collision::{circles_overlap, detect_collisions, in_ring_band, point_segment_distance};
pub use events::{CollisionEvent, GameEvent, GameSummary, PopupInfo, ScoreRecord, SoundCue};
pub use scoring::{Scoreboard, rank_for, rank_index};
pub use snapshot::{ActiveView, HudSnapshot, InventorySlot, RenderSnapshot};
pub use spawner::{SpawnOutcome, Spawner, random_edge_position, weighted_pickup};
pub use state::{
    ActivePowerUp, Effect, EffectKind, EntityId, GameState, Inventory, Laser, Particle, Pickup,
    PowerUpCategory, PowerUpKind, Projectile, Threat, ThreatKind, Vault, Viewport, WaveRing,
    WeaponVariant,
};
pub use tick::{FrameInput, GamePhase, Simulation};
pub use weapon::{ActivationRejected, Volley, active_weapon, activate, fire, pull_trigger};
