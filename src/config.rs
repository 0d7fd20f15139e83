//! Game configuration
//!
//! A structured JSON document (camelCase keys) describing waves, threat and
//! power-up stats, rank thresholds and demo tuning. `GameConfig::default()` is
//! the embedded document; any load failure falls back to it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::state::{PowerUpCategory, PowerUpKind, ThreatKind};

/// Configuration load/validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Document could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// Document is not valid JSON for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// Document parsed but violates a structural requirement
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One timed wave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveDef {
    #[serde(default)]
    pub name: String,
    /// Seconds
    pub duration: f32,
    /// Seconds between threat spawns
    pub spawn_interval: f32,
    /// Eligible threat kinds (uniform pick)
    pub enemies: Vec<ThreatKind>,
    #[serde(default = "one")]
    pub speed_multiplier: f32,
}

/// Per-kind threat stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatDef {
    #[serde(default)]
    pub color: String,
    pub speed_min: f32,
    pub speed_max: f32,
    pub damage: i32,
    pub hp: i32,
    pub radius: f32,
    #[serde(default)]
    pub shape: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "one_point")]
    pub points: u32,
}

/// Per-kind power-up stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpDef {
    #[serde(default)]
    pub icon: String,
    pub duration_seconds: f32,
    /// Relative spawn weight (higher = more frequent)
    pub rarity: f32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub chip_color: String,
    #[serde(rename = "type")]
    pub category: PowerUpCategory,
    #[serde(default)]
    pub priority: i32,
    /// Educational popup text
    #[serde(default)]
    pub description: String,
}

/// Minimum score for a rank title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankThreshold {
    pub min: u64,
    pub rank: String,
}

/// Abbreviated timings for unattended looping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoConfig {
    pub wave_duration: f32,
    pub spawn_interval_multiplier: f32,
    pub pickup_spawn_interval: f32,
    pub speed_multiplier: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            wave_duration: 5.0,
            spawn_interval_multiplier: 0.6,
            pickup_spawn_interval: 3.0,
            speed_multiplier: 0.8,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Game length (seconds)
    pub duration_seconds: f32,
    pub vault_radius: f32,
    pub vault_integrity: i32,
    #[serde(default = "default_popup_duration")]
    pub popup_duration_seconds: f32,
    #[serde(default = "default_inventory_slots")]
    pub max_inventory_slots: usize,
    pub waves: Vec<WaveDef>,
    pub pickup_spawn_interval: f32,
    #[serde(default)]
    pub pickup_spawn_variance: f32,
    /// Concurrent weapon power-ups
    pub max_active_powerups: usize,
    pub rank_thresholds: Vec<RankThreshold>,
    pub enemies: BTreeMap<ThreatKind, ThreatDef>,
    pub powerups: BTreeMap<PowerUpKind, PowerUpDef>,
    pub base_enemy_speed: f32,
    pub projectile_speed: f32,
    /// Seconds between discrete shots
    pub fire_rate: f32,
    pub idle_timeout_seconds: f32,
    pub attract_reset_seconds: f32,
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    #[serde(default = "default_initials_timeout")]
    pub initials_timeout_seconds: f32,
    /// Flat bonus per kill while any power-up is active
    #[serde(default = "one_point")]
    pub powerup_kill_bonus: u32,
    #[serde(default)]
    pub demo: DemoConfig,

    // === Presentation flags (passed through to collaborators) ===
    #[serde(default)]
    pub audio_enabled: bool,
    #[serde(default)]
    pub color_blind_mode: bool,
    #[serde(default)]
    pub reduced_motion: bool,
}

fn one() -> f32 {
    1.0
}

fn one_point() -> u32 {
    1
}

fn default_popup_duration() -> f32 {
    6.0
}

fn default_inventory_slots() -> usize {
    5
}

fn default_leaderboard_size() -> usize {
    crate::highscores::MAX_HIGH_SCORES
}

fn default_initials_timeout() -> f32 {
    5.0
}

fn wave(name: &str, duration: f32, spawn_interval: f32, enemies: &[ThreatKind], speed: f32) -> WaveDef {
    WaveDef {
        name: name.to_string(),
        duration,
        spawn_interval,
        enemies: enemies.to_vec(),
        speed_multiplier: speed,
    }
}

#[allow(clippy::too_many_arguments)]
fn threat(
    color: &str,
    speed_min: f32,
    speed_max: f32,
    damage: i32,
    hp: i32,
    radius: f32,
    label: &str,
    category: &str,
) -> ThreatDef {
    ThreatDef {
        color: color.to_string(),
        speed_min,
        speed_max,
        damage,
        hp,
        radius,
        shape: "invader".to_string(),
        label: label.to_string(),
        category: category.to_string(),
        // Tougher threats are worth more
        points: hp.max(1) as u32,
    }
}

#[allow(clippy::too_many_arguments)]
fn powerup(
    icon: &str,
    duration_seconds: f32,
    rarity: f32,
    label: &str,
    chip_color: &str,
    category: PowerUpCategory,
    priority: i32,
    description: &str,
) -> PowerUpDef {
    PowerUpDef {
        icon: icon.to_string(),
        duration_seconds,
        rarity,
        label: label.to_string(),
        chip_color: chip_color.to_string(),
        category,
        priority,
        description: description.to_string(),
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        use PowerUpCategory::{Tool, Weapon};
        use ThreatKind::*;

        let waves = vec![
            wave("Recon", 30.0, 3.5, &[WeakPassword], 0.45),
            wave("Infiltration", 30.0, 2.8, &[WeakPassword, ShadowItApp], 0.55),
            wave("Escalation", 30.0, 2.2, &[ShadowItApp, ShadowAiBot, WeakPassword], 0.7),
            wave(
                "Assault",
                30.0,
                1.6,
                &[ShadowItApp, ShadowAiBot, WeakPassword, Phishing],
                0.85,
            ),
            wave(
                "Full Breach",
                30.0,
                1.0,
                &[ShadowItApp, ShadowAiBot, WeakPassword, Phishing, InsiderAnomaly],
                1.1,
            ),
        ];

        let enemies = BTreeMap::from([
            (WeakPassword, threat("#E74C3C", 1.8, 2.4, 6, 1, 14.0, "Bad Password", "Bad Passwords")),
            (ShadowItApp, threat("#F39C12", 1.6, 2.2, 9, 2, 16.0, "Phishing", "Phishing Attacks")),
            (ShadowAiBot, threat("#9B59B6", 1.2, 1.6, 8, 3, 18.0, "Shadow IT", "Shadow IT Apps")),
            (Phishing, threat("#3498DB", 0.9, 1.3, 12, 4, 20.0, "Third Party", "Third Party Risks")),
            (InsiderAnomaly, threat("#2ECC71", 0.6, 1.0, 15, 5, 22.0, "Hacker", "Hackers")),
        ]);

        let powerups = BTreeMap::from([
            (
                PowerUpKind::StrongPassword,
                powerup(
                    "SP",
                    10.0,
                    0.3,
                    "Strong Password",
                    "#FF6B6B",
                    Weapon,
                    1,
                    "Strong, unique passwords are your first line of defense. A password manager generates and stores complex passwords so you never have to remember them.",
                ),
            ),
            (
                PowerUpKind::Mfa,
                powerup(
                    "MF",
                    8.0,
                    0.2,
                    "Multi-Factor Auth",
                    "#4ECDC4",
                    Weapon,
                    3,
                    "MFA blocks 99.9% of automated attacks. Even if a password is stolen, multi-factor authentication stops unauthorized access cold.",
                ),
            ),
            (
                PowerUpKind::Sso,
                powerup(
                    "SS",
                    8.0,
                    0.2,
                    "Single Sign-On",
                    "#45B7D1",
                    Weapon,
                    2,
                    "One secure login for all your apps. Single Sign-On eliminates password fatigue and reduces attack surfaces across your organization.",
                ),
            ),
            (
                PowerUpKind::PasswordManager,
                powerup(
                    "PM",
                    7.0,
                    0.15,
                    "Password Manager",
                    "#96CEB4",
                    Weapon,
                    4,
                    "Password reuse is the #1 cause of breaches. A password manager secures every credential and eliminates the risk automatically.",
                ),
            ),
            (
                PowerUpKind::ItAdminDashboard,
                powerup(
                    "IT",
                    5.0,
                    0.15,
                    "SaaS Monitoring & Protect",
                    "#FFEAA7",
                    Tool,
                    0,
                    "Freeze all threats! SaaS Monitoring reveals Shadow IT, enforces security policies, and stops threats cold across your organization.",
                ),
            ),
        ]);

        let rank_thresholds = [
            (0, "Novice"),
            (50, "Analyst"),
            (100, "Guardian"),
            (150, "Sentinel"),
            (220, "Zero-Knowledge Master"),
        ]
        .into_iter()
        .map(|(min, rank)| RankThreshold {
            min,
            rank: rank.to_string(),
        })
        .collect();

        Self {
            duration_seconds: 150.0,
            vault_radius: 40.0,
            vault_integrity: 100,
            popup_duration_seconds: default_popup_duration(),
            max_inventory_slots: default_inventory_slots(),
            waves,
            pickup_spawn_interval: 10.0,
            pickup_spawn_variance: 3.0,
            max_active_powerups: 2,
            rank_thresholds,
            enemies,
            powerups,
            base_enemy_speed: 60.0,
            projectile_speed: 1000.0,
            fire_rate: 0.15,
            idle_timeout_seconds: 20.0,
            attract_reset_seconds: 15.0,
            leaderboard_size: default_leaderboard_size(),
            initials_timeout_seconds: default_initials_timeout(),
            powerup_kill_bonus: 1,
            demo: DemoConfig::default(),
            audio_enabled: false,
            color_blind_mode: false,
            reduced_motion: false,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: GameConfig = serde_json::from_str(json)?;
        config.normalize();
        config.check_structure()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse `json`, falling back to the embedded defaults on any failure
    pub fn load_or_default(json: Option<&str>) -> Self {
        let Some(json) = json else {
            log::info!("No config document, using embedded defaults");
            return Self::default();
        };
        match Self::from_json(json) {
            Ok(config) => {
                config.log_warnings();
                log::info!("Loaded config ({} waves)", config.waves.len());
                config
            }
            Err(e) => {
                log::warn!("{e}; using embedded defaults");
                Self::default()
            }
        }
    }

    /// Read `path`, falling back to the embedded defaults on any failure
    pub fn load_path_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => Self::load_or_default(Some(&json)),
            Err(e) => {
                log::warn!("Failed to read {}: {e}; using embedded defaults", path.display());
                Self::default()
            }
        }
    }

    /// Sort rank thresholds ascending so rank lookup can scan in order
    fn normalize(&mut self) {
        self.rank_thresholds.sort_by_key(|t| t.min);
    }

    /// Reject documents the simulation cannot run
    fn check_structure(&self) -> Result<(), ConfigError> {
        if self.waves.is_empty() {
            return Err(ConfigError::Invalid("no waves defined".into()));
        }
        if self.rank_thresholds.is_empty() {
            return Err(ConfigError::Invalid("no rank thresholds defined".into()));
        }
        for (i, w) in self.waves.iter().enumerate() {
            if w.duration <= 0.0 || w.spawn_interval <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "wave {i} needs positive duration and spawn interval"
                )));
            }
        }
        if self.demo.wave_duration <= 0.0 || self.demo.spawn_interval_multiplier <= 0.0 {
            return Err(ConfigError::Invalid("demo timings must be positive".into()));
        }
        if self.vault_integrity <= 0 {
            return Err(ConfigError::Invalid("vault integrity must be positive".into()));
        }
        Ok(())
    }

    /// Non-fatal problems: wave entries naming unconfigured threat kinds
    /// (those spawns are skipped at runtime)
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for w in &self.waves {
            for kind in &w.enemies {
                if !self.enemies.contains_key(kind) {
                    out.push(format!(
                        "wave '{}' lists {} which has no stats",
                        w.name,
                        kind.key()
                    ));
                }
            }
        }
        out
    }

    fn log_warnings(&self) {
        for w in self.warnings() {
            log::warn!("{w}");
        }
    }

    /// Wave label for the HUD
    pub fn wave_name(&self, index: usize) -> &str {
        self.waves.get(index).map(|w| w.name.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_json() {
        let cfg = GameConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back = GameConfig::from_json(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn test_parses_camel_case_document() {
        let json = r##"{
            "durationSeconds": 60,
            "vaultRadius": 50,
            "vaultIntegrity": 80,
            "waves": [
                { "name": "Only", "duration": 60, "spawnInterval": 2,
                  "enemies": ["WEAK_PASSWORD", "PHISHING"], "speedMultiplier": 0.5 }
            ],
            "pickupSpawnInterval": 8,
            "maxActivePowerups": 1,
            "rankThresholds": [ { "min": 10, "rank": "B" }, { "min": 0, "rank": "A" } ],
            "enemies": {
                "WEAK_PASSWORD": { "speedMin": 1, "speedMax": 2, "damage": 5, "hp": 1, "radius": 10 }
            },
            "powerups": {
                "SSO": { "durationSeconds": 8, "rarity": 1, "type": "weapon", "priority": 2 }
            },
            "baseEnemySpeed": 60,
            "projectileSpeed": 900,
            "fireRate": 0.2,
            "idleTimeoutSeconds": 30,
            "attractResetSeconds": 10
        }"##;
        let cfg = GameConfig::from_json(json).unwrap();
        assert_eq!(cfg.vault_integrity, 80);
        assert_eq!(cfg.waves[0].enemies, vec![ThreatKind::WeakPassword, ThreatKind::Phishing]);
        assert_eq!(cfg.powerups[&PowerUpKind::Sso].category, PowerUpCategory::Weapon);
        // Thresholds sorted ascending on load
        assert_eq!(cfg.rank_thresholds[0].rank, "A");
        // Defaults for omitted fields
        assert_eq!(cfg.enemies[&ThreatKind::WeakPassword].points, 1);
        assert_eq!(cfg.demo, DemoConfig::default());
        // Phishing has no stats: reported, not fatal
        assert_eq!(cfg.warnings().len(), 1);
    }

    #[test]
    fn test_malformed_falls_back_to_default() {
        let cfg = GameConfig::load_or_default(Some("{ not json"));
        assert_eq!(cfg, GameConfig::default());
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_document_uses_default() {
        assert_eq!(GameConfig::load_or_default(None), GameConfig::default());
        let cfg = GameConfig::load_path_or_default("/nonexistent/vault-guardian.json");
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn test_rejects_empty_waves() {
        let mut cfg = GameConfig::default();
        cfg.waves.clear();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(matches!(
            GameConfig::from_json(&json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_errors_keep_their_source() {
        use std::error::Error;

        let err = GameConfig::from_path("/nonexistent/vault-guardian/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("failed to read config"));
        assert!(err.source().is_some());

        let err = GameConfig::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_default_has_no_warnings() {
        assert!(GameConfig::default().warnings().is_empty());
        assert_eq!(GameConfig::default().wave_name(4), "Full Breach");
        assert_eq!(GameConfig::default().wave_name(9), "");
    }
}
