//! Per-frame simulation loop and game-state machine
//!
//! `Simulation` owns every piece of mutable game state. Presentation code
//! feeds it a `FrameInput` and a wall-clock timestamp once per frame, then
//! reads snapshots and drains the outbound event queue.

use std::collections::{BTreeSet, VecDeque};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::detect_collisions;
use super::events::{CollisionEvent, GameEvent, GameSummary, PopupInfo, ScoreRecord, SoundCue};
use super::scoring::{Scoreboard, rank_for};
use super::snapshot::{HudSnapshot, RenderSnapshot};
use super::spawner::Spawner;
use super::state::{Effect, GameState, Pickup, PowerUpKind, Threat, Viewport};
use super::weapon::{self, ActivationRejected};
use crate::config::GameConfig;
use crate::consts::MAX_FRAME_DT;
use crate::highscores::{DEFAULT_INITIALS, normalize_initials};
use crate::normalize_angle;
use crate::platform;

/// Coarse game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title loop, no simulation
    #[default]
    Attract,
    Playing,
    /// Frozen behind an educational popup
    Paused,
    /// Post-game results and initials entry
    Summary,
}

/// Input for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Aim direction from the vault (radians); `None` keeps the current aim
    pub aim_angle: Option<f32>,
    /// One-shot fire request (click, tap, key press)
    pub fire_requested: bool,
    /// Fire button currently held
    pub fire_held: bool,
    /// Timestamp of the most recent user input, same clock as `frame`
    pub last_activity: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Popup {
    info: PopupInfo,
    shown_at: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct SummaryScreen {
    result: GameSummary,
    entered_at: f64,
    record: Option<ScoreRecord>,
}

const EXPLOSION_KILL: usize = 10;
const EXPLOSION_PICKUP: usize = 8;
const EXPLOSION_VAULT: usize = 6;
const VAULT_HIT_COLOR: &str = "#FF4444";
const SCORE_TEXT_COLOR: &str = "#FFFFFF";
const SCORE_TEXT_LIFT: f32 = 20.0;
/// Stream selector for the cosmetic rng
const FX_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// The game: state, timers, rng streams and outbound events
#[derive(Debug, Clone)]
pub struct Simulation {
    config: GameConfig,
    phase: GamePhase,
    state: GameState,
    spawner: Spawner,
    scoreboard: Scoreboard,
    /// Gameplay randomness (spawns, spread jitter)
    rng: Pcg32,
    /// Cosmetic randomness (particles, bob phase)
    fx_rng: Pcg32,
    events: Vec<GameEvent>,
    last_frame: Option<f64>,
    /// Idle is measured from the later of this and the last input
    activity_floor: f64,
    elapsed: f32,
    popup: Option<Popup>,
    /// Popups collected while another was up, shown in turn
    pending_popups: VecDeque<PopupInfo>,
    /// Kinds whose popup has been shown this session
    shown_popups: BTreeSet<PowerUpKind>,
    summary: Option<SummaryScreen>,
    demo: bool,
}

impl Simulation {
    pub fn new(config: GameConfig, viewport: Viewport, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let fx_rng = Pcg32::new(seed, FX_STREAM);
        let spawner = Spawner::new(&config, false, &mut rng);
        let state = GameState::new(&config, viewport);
        Self {
            config,
            phase: GamePhase::Attract,
            state,
            spawner,
            scoreboard: Scoreboard::default(),
            rng,
            fx_rng,
            events: Vec::new(),
            last_frame: None,
            activity_floor: 0.0,
            elapsed: 0.0,
            popup: None,
            pending_popups: VecDeque::new(),
            shown_popups: BTreeSet::new(),
            summary: None,
            demo: false,
        }
    }

    /// Use the abbreviated demo timings for every following game
    pub fn with_demo(mut self, demo: bool) -> Self {
        self.demo = demo;
        self.spawner = Spawner::new(&self.config, demo, &mut self.rng);
        self
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn popup(&self) -> Option<&PopupInfo> {
        self.popup.as_ref().map(|p| &p.info)
    }

    /// Results of the last game while the summary is up
    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref().map(|s| &s.result)
    }

    /// True while the summary is waiting for initials
    pub fn awaiting_initials(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| s.record.is_none())
    }

    /// Seconds left before the initials prompt auto-submits
    pub fn initials_time_left(&self, now: f64) -> Option<f32> {
        let s = self.summary.as_ref().filter(|s| s.record.is_none())?;
        let left = self.config.initials_timeout_seconds as f64 - (now - s.entered_at);
        Some(left.max(0.0) as f32)
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn render_snapshot(&self) -> RenderSnapshot<'_> {
        RenderSnapshot::capture(&self.state, self.phase, self.elapsed, self.popup())
    }

    pub fn hud_snapshot(&self) -> HudSnapshot {
        HudSnapshot::capture(&self.state, &self.config, &self.spawner, &self.scoreboard)
    }

    // === Commands ===

    /// Begin a fresh game. Ignored while a game is in progress.
    pub fn start(&mut self, now: f64) {
        if matches!(self.phase, GamePhase::Playing | GamePhase::Paused) {
            log::debug!("Start ignored, game already running");
            return;
        }

        self.state = GameState::new(&self.config, self.state.bounds);
        self.scoreboard.reset();
        self.spawner = Spawner::new(&self.config, self.demo, &mut self.rng);
        self.popup = None;
        self.pending_popups.clear();
        self.summary = None;
        self.activity_floor = now;
        self.last_frame = Some(now);

        log::info!("Game started{}", if self.demo { " (demo)" } else { "" });
        self.set_phase(GamePhase::Playing);
        self.emit(GameEvent::WaveStarted {
            index: 0,
            name: self.config.wave_name(0).to_string(),
        });
    }

    /// Leave the summary for the attract loop, saving with default initials
    /// if none were entered
    pub fn restart(&mut self) {
        if self.phase != GamePhase::Summary {
            return;
        }
        if self.awaiting_initials() {
            self.record_score(DEFAULT_INITIALS);
        }
        self.to_attract();
    }

    /// Advance one frame. `now` is wall-clock seconds.
    pub fn frame(&mut self, input: &FrameInput, now: f64) {
        let dt = match self.last_frame {
            Some(last) => ((now - last).max(0.0) as f32).min(MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_frame = Some(now);
        self.elapsed += dt;

        match self.phase {
            GamePhase::Attract => {}
            GamePhase::Paused => self.update_popup(now),
            GamePhase::Summary => self.update_summary(input, now),
            GamePhase::Playing => self.update_playing(input, dt, now),
        }
    }

    /// Activate one held power-up
    pub fn activate(
        &mut self,
        kind: PowerUpKind,
    ) -> Result<Option<PowerUpKind>, ActivationRejected> {
        if self.phase != GamePhase::Playing {
            return Err(ActivationRejected::NotPlaying);
        }
        let evicted = weapon::activate(
            &mut self.state.active_powerups,
            &mut self.state.inventory,
            kind,
            &self.config,
        )?;

        log::debug!("Activated {} (evicted {:?})", kind.key(), evicted);
        self.emit(GameEvent::Sound(SoundCue::Pickup));
        self.emit(GameEvent::PowerUpActivated { kind, evicted });
        Ok(evicted)
    }

    /// Activate by 1-based hotkey in inventory display order
    pub fn activate_slot(
        &mut self,
        slot: usize,
    ) -> Result<Option<PowerUpKind>, ActivationRejected> {
        let kind = slot
            .checked_sub(1)
            .and_then(|i| PowerUpKind::DISPLAY_ORDER.get(i))
            .copied()
            .ok_or(ActivationRejected::NoSuchSlot(slot))?;
        self.activate(kind)
    }

    /// Close the popup; play resumes once no other popup is queued
    pub fn dismiss_popup(&mut self, now: f64) {
        if self.phase != GamePhase::Paused || self.popup.take().is_none() {
            return;
        }
        // Time spent reading does not count as idle
        self.activity_floor = now;
        self.emit(GameEvent::PopupDismissed);
        match self.pending_popups.pop_front() {
            Some(next) => self.show_popup(next, now),
            None => self.set_phase(GamePhase::Playing),
        }
    }

    /// Record the finished game under `initials`
    pub fn submit_initials(&mut self, initials: &str, now: f64) -> Option<ScoreRecord> {
        if !self.awaiting_initials() {
            return None;
        }
        let record = self.record_score(initials);
        self.activity_floor = now;
        record
    }

    /// Debug: end the running game immediately
    pub fn force_end(&mut self, survived: bool, now: f64) {
        if !matches!(self.phase, GamePhase::Playing | GamePhase::Paused) {
            return;
        }
        log::info!("Forced {}", if survived { "win" } else { "loss" });
        if !survived {
            self.state.vault.integrity = 0;
        }
        self.end_game(survived, now);
    }

    /// Track a new screen size; the vault stays centered
    pub fn resize(&mut self, width: f32, height: f32) {
        let bounds = Viewport::new(width, height);
        log::debug!("Resize to {width}x{height} (scale {:.3})", bounds.scale());
        self.state.bounds = bounds;
        self.state.vault.pos = bounds.center();
    }

    // === Internals ===

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    fn to_attract(&mut self) {
        self.popup = None;
        self.pending_popups.clear();
        self.summary = None;
        self.set_phase(GamePhase::Attract);
    }

    fn idle_seconds(&self, input: &FrameInput, now: f64) -> f64 {
        now - input.last_activity.max(self.activity_floor)
    }

    fn update_popup(&mut self, now: f64) {
        let expired = self
            .popup
            .as_ref()
            .is_some_and(|p| now - p.shown_at >= self.config.popup_duration_seconds as f64);
        if expired {
            self.dismiss_popup(now);
        }
    }

    fn update_summary(&mut self, input: &FrameInput, now: f64) {
        let Some(entered_at) = self.summary.as_ref().map(|s| s.entered_at) else {
            return;
        };
        if self.awaiting_initials() {
            if now - entered_at >= self.config.initials_timeout_seconds as f64 {
                log::debug!("Initials timed out");
                self.submit_initials(DEFAULT_INITIALS, now);
            }
            return;
        }
        if self.idle_seconds(input, now) >= self.config.attract_reset_seconds as f64 {
            self.to_attract();
        }
    }

    fn update_playing(&mut self, input: &FrameInput, dt: f32, now: f64) {
        // --- Clock and idle ---
        self.state.time_left -= dt;
        if self.idle_seconds(input, now) >= self.config.idle_timeout_seconds as f64 {
            log::info!("Idle timeout, abandoning game");
            self.to_attract();
            return;
        }

        // --- Loss check ---
        if self.state.vault.is_breached() {
            self.end_game(false, now);
            return;
        }
        self.state.time_left = self.state.time_left.max(0.0);

        // --- Input ---
        if let Some(aim) = input.aim_angle.filter(|a| a.is_finite()) {
            self.state.aim_angle = normalize_angle(aim);
        }
        self.handle_fire(input, dt);

        // --- Spawner ---
        self.run_spawner(dt);

        // --- Movement and aging ---
        self.advance_entities(dt);

        // --- Power-up countdown ---
        for kind in weapon::tick_active(&mut self.state.active_powerups, dt) {
            log::debug!("Power-up expired: {}", kind.key());
            self.emit(GameEvent::Sound(SoundCue::Expire));
            self.emit(GameEvent::PowerUpExpired { kind });
        }

        // --- Collisions ---
        for hit in detect_collisions(&mut self.state) {
            self.apply_collision(hit, now);
        }

        // --- Win/loss ---
        if self.state.vault.is_breached() {
            self.end_game(false, now);
        } else if self.state.time_left <= 0.0
            || (self.spawner.waves_complete() && self.state.live_threat_count() == 0)
        {
            self.end_game(true, now);
        }
    }

    fn handle_fire(&mut self, input: &FrameInput, dt: f32) {
        let variant = weapon::active_weapon(&self.state.active_powerups);
        let shoot = weapon::pull_trigger(
            &mut self.state.fire_cooldown,
            variant,
            input.fire_requested,
            input.fire_held,
            dt,
            self.config.fire_rate,
        );
        if !shoot {
            return;
        }

        let speed = self.config.projectile_speed * self.state.scale();
        let volley = weapon::fire(
            variant,
            self.state.vault.pos,
            self.state.aim_angle,
            speed,
            &self.state.bounds,
            &mut self.rng,
        );
        self.state.projectiles.extend(volley.projectiles);
        self.state.lasers.extend(volley.lasers);
        self.state.rings.extend(volley.rings);
        if let Some(cue) = volley.cue {
            self.emit(GameEvent::Sound(cue));
        }
    }

    fn run_spawner(&mut self, dt: f32) {
        let vault_pos = self.state.vault.pos;
        let out = self.spawner.tick(
            dt,
            &self.config,
            self.state.bounds,
            vault_pos,
            &mut self.rng,
        );

        if let Some(index) = out.wave_started {
            let name = self.config.wave_name(index).to_string();
            log::info!("Wave {} started: {}", index + 1, name);
            self.emit(GameEvent::Sound(SoundCue::WaveStart));
            self.emit(GameEvent::WaveStarted { index, name });
        }

        for spawn in out.threats {
            let id = self.state.next_entity_id();
            if let Some(threat) = Threat::spawn(id, spawn.kind, spawn.pos, spawn.speed, &self.config)
            {
                self.state.threats.push(threat);
            }
        }

        for spawn in out.pickups {
            let id = self.state.next_entity_id();
            let bob_phase = self.fx_rng.random::<f32>() * std::f32::consts::TAU;
            if let Some(mut pickup) =
                Pickup::spawn(id, spawn.kind, spawn.pos, vault_pos, bob_phase, &self.config)
            {
                pickup.drift_angle = spawn.drift_angle;
                self.state.pickups.push(pickup);
            }
        }
    }

    fn advance_entities(&mut self, dt: f32) {
        let state = &mut self.state;
        let scale = state.scale();
        let frozen = state.freeze_active();
        let bounds = state.bounds;
        let vault_pos = state.vault.pos;
        let vault_radius = state.vault.scaled_radius(scale);

        state.threats.retain(|t| t.alive);
        for threat in &mut state.threats {
            threat.advance(vault_pos, dt, frozen);
        }

        state.pickups.retain(|p| p.alive);
        for pickup in &mut state.pickups {
            pickup.drift(dt, scale);
            // Reached the vault uncollected
            if pickup.pos.distance(vault_pos) < vault_radius {
                pickup.alive = false;
            }
        }

        state.projectiles.retain(|p| p.alive);
        for proj in &mut state.projectiles {
            proj.advance(dt, &bounds);
        }

        for laser in &mut state.lasers {
            laser.update(dt);
        }
        state.lasers.retain(|l| l.alive);

        for ring in &mut state.rings {
            ring.expand(dt, scale);
        }
        state.rings.retain(|r| r.alive);

        state.vault.update(dt);

        for effect in &mut state.effects {
            effect.update(dt);
        }
        state.effects.retain(|e| e.alive);
    }

    fn apply_collision(&mut self, hit: CollisionEvent, now: f64) {
        match hit {
            CollisionEvent::ThreatHit { .. } | CollisionEvent::PickupHit { .. } => {
                self.emit(GameEvent::Sound(SoundCue::Hit));
            }
            CollisionEvent::ThreatKilled {
                kind,
                pos,
                points,
                powerup_active,
                ..
            } => {
                let awarded = self.scoreboard.record_kill(
                    kind,
                    points,
                    powerup_active,
                    self.config.powerup_kill_bonus,
                );
                let color = self
                    .config
                    .enemies
                    .get(&kind)
                    .map(|d| d.color.as_str())
                    .unwrap_or(SCORE_TEXT_COLOR);
                let burst = Effect::explosion(pos, color, EXPLOSION_KILL, &mut self.fx_rng);
                self.state.effects.push(burst);
                self.state.effects.push(Effect::floating_text(
                    pos - Vec2::new(0.0, SCORE_TEXT_LIFT),
                    format!("+{awarded}"),
                    SCORE_TEXT_COLOR,
                ));
                log::debug!("Kill {} +{}", kind.key(), awarded);
                self.emit(GameEvent::Sound(SoundCue::Kill));
                self.emit(GameEvent::ThreatKilled {
                    kind,
                    points: awarded,
                });
            }
            CollisionEvent::PickupCollected { kind, pos, .. } => {
                self.state.inventory.add(kind);
                let color = self
                    .config
                    .powerups
                    .get(&kind)
                    .map(|d| d.chip_color.as_str())
                    .unwrap_or(SCORE_TEXT_COLOR);
                let burst = Effect::explosion(pos, color, EXPLOSION_PICKUP, &mut self.fx_rng);
                self.state.effects.push(burst);
                self.state.effects.push(Effect::flash(pos, color));
                log::debug!("Collected {}", kind.key());
                self.emit(GameEvent::Sound(SoundCue::Pickup));
                self.emit(GameEvent::PickupCollected { kind });
                self.maybe_show_popup(kind, now);
            }
            CollisionEvent::VaultHit { damage, .. } => {
                let vault_pos = self.state.vault.pos;
                let burst =
                    Effect::explosion(vault_pos, VAULT_HIT_COLOR, EXPLOSION_VAULT, &mut self.fx_rng);
                self.state.effects.push(burst);
                let integrity = self.state.vault.integrity;
                log::debug!("Vault hit for {damage}, integrity {integrity}");
                self.emit(GameEvent::Sound(SoundCue::VaultHit));
                self.emit(GameEvent::VaultHit { damage, integrity });
            }
        }
    }

    /// First collection of a kind this session pauses play behind a popup
    fn maybe_show_popup(&mut self, kind: PowerUpKind, now: f64) {
        if !self.shown_popups.insert(kind) {
            return;
        }
        let Some(def) = self.config.powerups.get(&kind) else {
            return;
        };
        if def.description.is_empty() {
            return;
        }
        let info = PopupInfo {
            kind,
            label: def.label.clone(),
            chip_color: def.chip_color.clone(),
            description: def.description.clone(),
        };
        if self.popup.is_some() {
            self.pending_popups.push_back(info);
        } else {
            self.show_popup(info, now);
        }
    }

    fn show_popup(&mut self, info: PopupInfo, now: f64) {
        self.popup = Some(Popup {
            info: info.clone(),
            shown_at: now,
        });
        self.emit(GameEvent::PopupShown(info));
        self.set_phase(GamePhase::Paused);
    }

    fn end_game(&mut self, survived: bool, now: f64) {
        if !survived {
            self.state.vault.integrity = self.state.vault.integrity.max(0);
        }
        let time_bonus = if survived {
            self.scoreboard.add_time_bonus(self.state.time_left)
        } else {
            0
        };
        let score = self.scoreboard.score;
        let rank = rank_for(score, &self.config.rank_thresholds)
            .unwrap_or_default()
            .to_string();

        let result = GameSummary {
            survived,
            score,
            rank,
            kills: self.scoreboard.kills,
            kills_by_kind: self.scoreboard.kills_by_kind.clone(),
            integrity: self.state.vault.integrity,
            max_integrity: self.state.vault.max_integrity,
            time_left: self.state.time_left.max(0.0),
            time_bonus,
        };
        log::info!(
            "Game over: {} score={} rank={}",
            if survived { "survived" } else { "breached" },
            result.score,
            result.rank
        );

        self.popup = None;
        self.pending_popups.clear();
        if !survived {
            self.emit(GameEvent::Sound(SoundCue::GameOver));
        }
        self.set_phase(GamePhase::Summary);
        self.emit(GameEvent::GameOver(result.clone()));
        self.summary = Some(SummaryScreen {
            result,
            entered_at: now,
            record: None,
        });
    }

    fn record_score(&mut self, initials: &str) -> Option<ScoreRecord> {
        let summary = self.summary.as_mut()?;
        let record = ScoreRecord {
            initials: normalize_initials(initials),
            score: summary.result.score,
            rank: summary.result.rank.clone(),
            timestamp: platform::unix_time_ms(),
        };
        summary.record = Some(record.clone());
        log::info!("Score recorded: {} {}", record.initials, record.score);
        self.emit(GameEvent::ScoreRecorded(record.clone()));
        Some(record)
    }
}
