//! Game state and core simulation types
//!
//! Entity records plus their constructors. Constructors read the
//! configuration and return `None` for kinds the configuration does not
//! define, so callers can skip the spawn instead of building a broken entity.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::consts::*;
use crate::{angle_between, polar_to_cartesian};

/// Stable identity for threats and pickups (shared counter, never reused within a game)
pub type EntityId = u32;

/// Threat categories
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatKind {
    WeakPassword,
    ShadowItApp,
    ShadowAiBot,
    Phishing,
    InsiderAnomaly,
}

impl ThreatKind {
    pub const ALL: [ThreatKind; 5] = [
        ThreatKind::WeakPassword,
        ThreatKind::ShadowItApp,
        ThreatKind::ShadowAiBot,
        ThreatKind::Phishing,
        ThreatKind::InsiderAnomaly,
    ];

    /// Configuration key
    pub fn key(&self) -> &'static str {
        match self {
            ThreatKind::WeakPassword => "WEAK_PASSWORD",
            ThreatKind::ShadowItApp => "SHADOW_IT_APP",
            ThreatKind::ShadowAiBot => "SHADOW_AI_BOT",
            ThreatKind::Phishing => "PHISHING",
            ThreatKind::InsiderAnomaly => "INSIDER_ANOMALY",
        }
    }
}

/// Power-up kinds (collected as pickups, activated from the inventory)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerUpKind {
    /// Twin beams; streams while fire is held
    StrongPassword,
    /// Seven-shot cone burst
    Mfa,
    /// Persistent laser line
    Sso,
    /// Expanding ring
    PasswordManager,
    /// Freezes every threat
    ItAdminDashboard,
}

impl PowerUpKind {
    /// Fixed inventory display order (hotkeys 1-5)
    pub const DISPLAY_ORDER: [PowerUpKind; 5] = [
        PowerUpKind::StrongPassword,
        PowerUpKind::Sso,
        PowerUpKind::Mfa,
        PowerUpKind::PasswordManager,
        PowerUpKind::ItAdminDashboard,
    ];

    /// Weapon variant granted while active (`None` for tools)
    pub fn weapon_variant(&self) -> Option<WeaponVariant> {
        match self {
            PowerUpKind::StrongPassword => Some(WeaponVariant::Twin),
            PowerUpKind::Sso => Some(WeaponVariant::Laser),
            PowerUpKind::Mfa => Some(WeaponVariant::Spread),
            PowerUpKind::PasswordManager => Some(WeaponVariant::Ring),
            PowerUpKind::ItAdminDashboard => None,
        }
    }

    /// Configuration key
    pub fn key(&self) -> &'static str {
        match self {
            PowerUpKind::StrongPassword => "STRONG_PASSWORD",
            PowerUpKind::Mfa => "MFA",
            PowerUpKind::Sso => "SSO",
            PowerUpKind::PasswordManager => "PASSWORD_MANAGER",
            PowerUpKind::ItAdminDashboard => "IT_ADMIN_DASHBOARD",
        }
    }
}

/// Slot category of a power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpCategory {
    Weapon,
    Tool,
}

/// Firing pattern of the vault's weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeaponVariant {
    /// Single forward shot, unlimited
    #[default]
    Default,
    Twin,
    Laser,
    Spread,
    Ring,
}

impl WeaponVariant {
    /// Damage dealt per hit
    pub fn damage(&self) -> i32 {
        match self {
            WeaponVariant::Default => 1,
            WeaponVariant::Twin => 2,
            WeaponVariant::Laser => 3,
            WeaponVariant::Spread => 4,
            WeaponVariant::Ring => 5,
        }
    }
}

/// Screen bounds in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Converts authored base sizes to the current resolution
    pub fn scale(&self) -> f32 {
        self.width.min(self.height) / REFERENCE_EXTENT
    }

    /// Longest screen edge; used as laser reach
    pub fn max_extent(&self) -> f32 {
        self.width.max(self.height)
    }

    /// True if `pos` is further than `margin` outside the screen
    pub fn is_outside(&self, pos: Vec2, margin: f32) -> bool {
        pos.x < -margin
            || pos.x > self.width + margin
            || pos.y < -margin
            || pos.y > self.height + margin
    }
}

/// The defended vault core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub pos: Vec2,
    /// Base radius (unscaled)
    pub radius: f32,
    pub integrity: i32,
    pub max_integrity: i32,
    /// Flash-on-hit timer
    pub shield_flash: f32,
    /// Glow animation phase
    pub pulse_phase: f32,
}

impl Vault {
    pub fn new(pos: Vec2, config: &GameConfig) -> Self {
        Self {
            pos,
            radius: config.vault_radius,
            integrity: config.vault_integrity,
            max_integrity: config.vault_integrity,
            shield_flash: 0.0,
            pulse_phase: 0.0,
        }
    }

    pub fn scaled_radius(&self, scale: f32) -> f32 {
        self.radius * scale
    }

    /// Integrity as a percentage of max, clamped to [0, 100]
    pub fn integrity_percent(&self) -> f32 {
        if self.max_integrity <= 0 {
            return 0.0;
        }
        (self.integrity.max(0) as f32 / self.max_integrity as f32 * 100.0).min(100.0)
    }

    pub fn is_breached(&self) -> bool {
        self.integrity <= 0
    }

    /// Decay flash and advance pulse
    pub fn update(&mut self, dt: f32) {
        if self.shield_flash > 0.0 {
            self.shield_flash -= dt;
        }
        self.pulse_phase = (self.pulse_phase + dt * 2.0) % std::f32::consts::TAU;
    }
}

/// A hostile entity advancing on the vault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub id: EntityId,
    pub kind: ThreatKind,
    pub pos: Vec2,
    /// Pixels per second (already scaled to the viewport)
    pub speed: f32,
    pub hp: i32,
    pub max_hp: i32,
    /// Integrity removed on vault contact
    pub damage: i32,
    /// Base radius (unscaled)
    pub radius: f32,
    pub points: u32,
    pub alive: bool,
    pub hit_flash: f32,
    pub frozen: bool,
    /// Visual spin
    pub angle: f32,
}

impl Threat {
    /// Build a threat from its configured stats
    pub fn spawn(
        id: EntityId,
        kind: ThreatKind,
        pos: Vec2,
        speed: f32,
        config: &GameConfig,
    ) -> Option<Self> {
        let def = config.enemies.get(&kind)?;
        Some(Self {
            id,
            kind,
            pos,
            speed,
            hp: def.hp,
            max_hp: def.hp,
            damage: def.damage,
            radius: def.radius,
            points: def.points,
            alive: true,
            hit_flash: 0.0,
            frozen: false,
            angle: 0.0,
        })
    }

    pub fn scaled_radius(&self, scale: f32) -> f32 {
        self.radius * scale
    }

    /// Move toward `target` unless frozen; decay hit flash either way
    pub fn advance(&mut self, target: Vec2, dt: f32, frozen: bool) {
        self.frozen = frozen;
        if !frozen {
            let to_target = target - self.pos;
            let dist = to_target.length();
            if dist > 0.0 {
                self.pos += to_target / dist * (self.speed * dt).min(dist);
            }
            self.angle += dt * THREAT_SPIN_RATE;
        }
        if self.hit_flash > 0.0 {
            self.hit_flash -= dt;
        }
    }

    /// Subtract hp and flash. Returns true if this hit killed the threat.
    pub fn take_damage(&mut self, amount: i32, flash: f32) -> bool {
        self.hp -= amount;
        self.hit_flash = flash;
        if self.hp <= 0 {
            self.alive = false;
            true
        } else {
            false
        }
    }
}

/// A collectible chip drifting toward the vault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    /// Hits remaining until collected
    pub hp: i32,
    pub drift_angle: f32,
    /// Base drift speed (unscaled)
    pub drift_speed: f32,
    /// Base radius (unscaled)
    pub radius: f32,
    pub alive: bool,
    pub hit_flash: f32,
    pub bob_phase: f32,
}

impl Pickup {
    /// Build a pickup aimed at `vault_pos`
    pub fn spawn(
        id: EntityId,
        kind: PowerUpKind,
        pos: Vec2,
        vault_pos: Vec2,
        bob_phase: f32,
        config: &GameConfig,
    ) -> Option<Self> {
        config.powerups.get(&kind)?;
        Some(Self {
            id,
            kind,
            pos,
            hp: PICKUP_HP,
            drift_angle: angle_between(pos, vault_pos),
            drift_speed: PICKUP_DRIFT_SPEED,
            radius: PICKUP_RADIUS,
            alive: true,
            hit_flash: 0.0,
            bob_phase,
        })
    }

    pub fn scaled_radius(&self, scale: f32) -> f32 {
        self.radius * scale
    }

    /// Drift along the pre-computed angle; decay hit flash
    pub fn drift(&mut self, dt: f32, scale: f32) {
        self.pos += polar_to_cartesian(self.drift_speed * scale * dt, self.drift_angle);
        if self.hit_flash > 0.0 {
            self.hit_flash -= dt;
        }
    }

    /// Subtract one hit. Returns true if this hit collected the pickup.
    pub fn take_hit(&mut self, flash: f32) -> bool {
        self.hp -= 1;
        self.hit_flash = flash;
        if self.hp <= 0 {
            self.alive = false;
            true
        } else {
            false
        }
    }
}

/// A time-limited effect currently in play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub category: PowerUpCategory,
    pub priority: i32,
    pub remaining: f32,
    pub duration: f32,
}

impl ActivePowerUp {
    pub fn from_config(kind: PowerUpKind, config: &GameConfig) -> Option<Self> {
        let def = config.powerups.get(&kind)?;
        Some(Self {
            kind,
            category: def.category,
            priority: def.priority,
            remaining: def.duration_seconds,
            duration: def.duration_seconds,
        })
    }

    /// Remaining time as a fraction of the total
    pub fn fraction_remaining(&self) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else {
            (self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Collected power-ups waiting to be activated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    counts: BTreeMap<PowerUpKind, u32>,
}

impl Inventory {
    pub fn add(&mut self, kind: PowerUpKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    /// Remove one unit. Returns false if none are held.
    pub fn take(&mut self, kind: PowerUpKind) -> bool {
        match self.counts.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn count(&self, kind: PowerUpKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Counts in display order, zeros included
    pub fn counts(&self) -> Vec<(PowerUpKind, u32)> {
        PowerUpKind::DISPLAY_ORDER
            .iter()
            .map(|&kind| (kind, self.count(kind)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|&c| c == 0)
    }
}

/// A moving shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub angle: f32,
    /// Pixels per second (already scaled)
    pub speed: f32,
    pub variant: WeaponVariant,
    pub age: f32,
    /// Collision radius in pixels
    pub radius: f32,
    pub alive: bool,
}

impl Projectile {
    pub fn new(pos: Vec2, angle: f32, speed: f32, variant: WeaponVariant) -> Self {
        Self {
            pos,
            angle,
            speed,
            variant,
            age: 0.0,
            radius: PROJECTILE_RADIUS,
            alive: true,
        }
    }

    pub fn advance(&mut self, dt: f32, bounds: &Viewport) {
        self.pos += polar_to_cartesian(self.speed * dt, self.angle);
        self.age += dt;
        if bounds.is_outside(self.pos, PROJECTILE_BOUNDS_MARGIN) {
            self.alive = false;
        }
    }
}

/// A persistent line from the vault at a fixed angle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laser {
    pub angle: f32,
    pub age: f32,
    pub duration: f32,
    pub width: f32,
    pub variant: WeaponVariant,
    pub alive: bool,
}

impl Laser {
    pub fn new(angle: f32) -> Self {
        Self {
            angle,
            age: 0.0,
            duration: LASER_DURATION,
            width: LASER_WIDTH,
            variant: WeaponVariant::Laser,
            alive: true,
        }
    }

    /// Beam segment from `origin` out to `reach`
    pub fn segment(&self, origin: Vec2, reach: f32) -> (Vec2, Vec2) {
        (origin, origin + polar_to_cartesian(reach, self.angle))
    }

    pub fn update(&mut self, dt: f32) {
        self.age += dt;
        if self.age >= self.duration {
            self.alive = false;
        }
    }
}

/// An expanding ring that damages each target once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveRing {
    pub center: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    /// Base expansion speed (unscaled)
    pub speed: f32,
    pub age: f32,
    pub variant: WeaponVariant,
    pub alive: bool,
    /// Targets already damaged by this ring
    #[serde(skip)]
    pub hit_set: HashSet<EntityId>,
}

impl WaveRing {
    pub fn new(center: Vec2, max_radius: f32) -> Self {
        Self {
            center,
            radius: RING_START_RADIUS,
            max_radius,
            speed: RING_SPEED,
            age: 0.0,
            variant: WeaponVariant::Ring,
            alive: true,
            hit_set: HashSet::new(),
        }
    }

    pub fn expand(&mut self, dt: f32, scale: f32) {
        self.radius += self.speed * scale * dt;
        self.age += dt;
        if self.radius >= self.max_radius {
            self.alive = false;
        }
    }

    /// Record a hit on `id`. Returns false if `id` was already hit.
    pub fn mark_hit(&mut self, id: EntityId) -> bool {
        self.hit_set.insert(id)
    }
}

/// A single explosion particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub alpha: f32,
}

/// Visual effect kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    Explosion { particles: Vec<Particle> },
    FloatingText { text: String },
    Flash,
}

/// Non-interactive visual record; never affects the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub pos: Vec2,
    pub color: String,
    pub age: f32,
    pub duration: f32,
    pub alive: bool,
}

impl Effect {
    fn with_kind(kind: EffectKind, pos: Vec2, color: &str, duration: f32) -> Self {
        Self {
            kind,
            pos,
            color: color.to_string(),
            age: 0.0,
            duration,
            alive: true,
        }
    }

    /// Radial burst of `count` particles
    pub fn explosion<R: Rng + ?Sized>(pos: Vec2, color: &str, count: usize, rng: &mut R) -> Self {
        let count = count.max(1);
        let particles = (0..count)
            .map(|i| {
                let a = std::f32::consts::TAU / count as f32 * i as f32
                    + (rng.random::<f32>() - 0.5) * 0.4;
                let speed = 60.0 + rng.random::<f32>() * 100.0;
                Particle {
                    pos,
                    vel: polar_to_cartesian(speed, a),
                    radius: 2.0 + rng.random::<f32>() * 3.0,
                    alpha: 1.0,
                }
            })
            .collect();
        Self::with_kind(EffectKind::Explosion { particles }, pos, color, 0.5)
    }

    pub fn floating_text(pos: Vec2, text: impl Into<String>, color: &str) -> Self {
        Self::with_kind(EffectKind::FloatingText { text: text.into() }, pos, color, 0.8)
    }

    pub fn flash(pos: Vec2, color: &str) -> Self {
        Self::with_kind(EffectKind::Flash, pos, color, 0.4)
    }

    pub fn update(&mut self, dt: f32) {
        self.age += dt;
        if self.age >= self.duration {
            self.alive = false;
            return;
        }
        let fade = (1.0 - self.age / self.duration).max(0.0);
        match &mut self.kind {
            EffectKind::Explosion { particles } => {
                for p in particles.iter_mut() {
                    p.pos += p.vel * dt;
                    p.alpha = fade;
                }
            }
            EffectKind::FloatingText { .. } => {
                self.pos.y -= 30.0 * dt;
            }
            EffectKind::Flash => {}
        }
    }
}

/// Everything that lives on the playfield during one game
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub bounds: Viewport,
    pub vault: Vault,
    pub threats: Vec<Threat>,
    pub pickups: Vec<Pickup>,
    pub projectiles: Vec<Projectile>,
    pub lasers: Vec<Laser>,
    pub rings: Vec<WaveRing>,
    pub effects: Vec<Effect>,
    pub active_powerups: Vec<ActivePowerUp>,
    pub inventory: Inventory,
    /// Countdown (seconds)
    pub time_left: f32,
    /// Current aim (radians)
    pub aim_angle: f32,
    /// Seconds until the next discrete shot
    pub fire_cooldown: f32,
    /// Next entity ID
    next_id: EntityId,
}

impl GameState {
    /// Fresh playfield with the vault at the screen center
    pub fn new(config: &GameConfig, bounds: Viewport) -> Self {
        Self {
            bounds,
            vault: Vault::new(bounds.center(), config),
            threats: Vec::new(),
            pickups: Vec::new(),
            projectiles: Vec::new(),
            lasers: Vec::new(),
            rings: Vec::new(),
            effects: Vec::new(),
            active_powerups: Vec::new(),
            inventory: Inventory::default(),
            time_left: config.duration_seconds,
            aim_angle: -std::f32::consts::FRAC_PI_2,
            fire_cooldown: 0.0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn scale(&self) -> f32 {
        self.bounds.scale()
    }

    /// True while any power-up is active (kill bonus condition)
    pub fn powerup_active(&self) -> bool {
        !self.active_powerups.is_empty()
    }

    /// The active tool, if any
    pub fn active_tool(&self) -> Option<&ActivePowerUp> {
        self.active_powerups
            .iter()
            .find(|p| p.category == PowerUpCategory::Tool)
    }

    /// True while threats are frozen
    pub fn freeze_active(&self) -> bool {
        self.active_tool().is_some()
    }

    pub fn live_threat_count(&self) -> usize {
        self.threats.iter().filter(|t| t.alive).count()
    }
}
