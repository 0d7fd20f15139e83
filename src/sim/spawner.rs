//! Wave progression and timed threat/pickup emission
//!
//! The spawner only decides *what* to create and *where*; the caller turns
//! the returned requests into entities (allocating IDs through the factory).

use glam::Vec2;
use rand::Rng;

use super::state::{PowerUpKind, ThreatKind, Viewport};
use crate::config::GameConfig;
use crate::consts::PICKUP_EDGE_PADDING;
use crate::angle_between;

/// A threat to be created
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatSpawn {
    pub kind: ThreatKind,
    pub pos: Vec2,
    /// Pixels per second (scaled)
    pub speed: f32,
}

/// A pickup to be created
#[derive(Debug, Clone, PartialEq)]
pub struct PickupSpawn {
    pub kind: PowerUpKind,
    pub pos: Vec2,
    /// Pre-computed heading toward the vault
    pub drift_angle: f32,
}

/// Result of one spawner tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnOutcome {
    pub threats: Vec<ThreatSpawn>,
    pub pickups: Vec<PickupSpawn>,
    /// Index of a wave that started during this tick
    pub wave_started: Option<usize>,
    pub waves_complete: bool,
}

/// Wave and spawn timers
#[derive(Debug, Clone, PartialEq)]
pub struct Spawner {
    wave_index: usize,
    /// Seconds into the current wave
    wave_timer: f32,
    spawn_accum: f32,
    pickup_accum: f32,
    /// Seconds until the next pickup
    next_pickup_at: f32,
    waves_complete: bool,
    demo: bool,
}

impl Spawner {
    pub fn new<R: Rng + ?Sized>(config: &GameConfig, demo: bool, rng: &mut R) -> Self {
        let mut spawner = Self {
            wave_index: 0,
            wave_timer: 0.0,
            spawn_accum: 0.0,
            pickup_accum: 0.0,
            next_pickup_at: 0.0,
            waves_complete: false,
            demo,
        };
        spawner.next_pickup_at = spawner.next_pickup_delay(config, rng);
        spawner
    }

    pub fn wave_index(&self) -> usize {
        self.wave_index
    }

    pub fn waves_complete(&self) -> bool {
        self.waves_complete
    }

    fn next_pickup_delay<R: Rng + ?Sized>(&self, config: &GameConfig, rng: &mut R) -> f32 {
        let base = if self.demo {
            config.demo.pickup_spawn_interval
        } else {
            config.pickup_spawn_interval
        };
        base + (rng.random::<f32>() * 2.0 - 1.0) * config.pickup_spawn_variance
    }

    fn wave_duration(&self, config: &GameConfig, index: usize) -> f32 {
        if self.demo {
            config.demo.wave_duration
        } else {
            config.waves[index].duration
        }
    }

    fn spawn_interval(&self, config: &GameConfig, index: usize) -> f32 {
        let mult = if self.demo {
            config.demo.spawn_interval_multiplier
        } else {
            1.0
        };
        config.waves[index].spawn_interval * mult
    }

    /// Advance timers by `dt` and emit spawns
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        config: &GameConfig,
        bounds: Viewport,
        vault_pos: Vec2,
        rng: &mut R,
    ) -> SpawnOutcome {
        let mut out = SpawnOutcome::default();

        if self.waves_complete {
            out.waves_complete = true;
            return out;
        }
        if self.wave_index >= config.waves.len() {
            self.waves_complete = true;
            out.waves_complete = true;
            return out;
        }

        self.wave_timer += dt;
        self.spawn_accum += dt;
        self.pickup_accum += dt;

        // Wave transition (timer keeps the overshoot)
        let duration = self.wave_duration(config, self.wave_index);
        if self.wave_timer >= duration {
            self.wave_timer -= duration;
            self.wave_index += 1;
            if self.wave_index >= config.waves.len() {
                log::info!("All waves complete");
                self.waves_complete = true;
                out.waves_complete = true;
                return out;
            }
            out.wave_started = Some(self.wave_index);
        }

        let wave = &config.waves[self.wave_index];
        let interval = self.spawn_interval(config, self.wave_index);
        let scale = bounds.scale();

        if interval > 0.0 {
            while self.spawn_accum >= interval {
                self.spawn_accum -= interval;
                if wave.enemies.is_empty() {
                    continue;
                }
                let kind = wave.enemies[rng.random_range(0..wave.enemies.len())];
                let Some(def) = config.enemies.get(&kind) else {
                    log::debug!("Skipping spawn of unconfigured {}", kind.key());
                    continue;
                };

                let demo_mult = if self.demo {
                    config.demo.speed_multiplier
                } else {
                    1.0
                };
                let base = def.speed_min + rng.random::<f32>() * (def.speed_max - def.speed_min);
                let speed =
                    base * config.base_enemy_speed * wave.speed_multiplier * demo_mult * scale;
                let pos = random_edge_position(rng, bounds, def.radius * scale);

                log::debug!("Spawn {} at ({:.0}, {:.0})", kind.key(), pos.x, pos.y);
                out.threats.push(ThreatSpawn { kind, pos, speed });
            }
        }

        if self.pickup_accum >= self.next_pickup_at {
            self.pickup_accum -= self.next_pickup_at;
            self.next_pickup_at = self.next_pickup_delay(config, rng);

            if let Some(kind) = weighted_pickup(rng, config) {
                let pos = random_edge_position(rng, bounds, PICKUP_EDGE_PADDING);
                log::debug!("Pickup spawn {}", kind.key());
                out.pickups.push(PickupSpawn {
                    kind,
                    pos,
                    drift_angle: angle_between(pos, vault_pos),
                });
            }
        }

        out
    }
}

/// Weighted draw over configured rarity (higher = more frequent)
pub fn weighted_pickup<R: Rng + ?Sized>(rng: &mut R, config: &GameConfig) -> Option<PowerUpKind> {
    let total: f32 = config.powerups.values().map(|d| d.rarity.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let r = rng.random::<f32>() * total;
    let mut accum = 0.0;
    for (&kind, def) in &config.powerups {
        if def.rarity <= 0.0 {
            continue;
        }
        accum += def.rarity;
        if r <= accum {
            return Some(kind);
        }
    }
    config
        .powerups
        .iter()
        .rev()
        .find(|(_, def)| def.rarity > 0.0)
        .map(|(&kind, _)| kind)
}

/// Uniform point on one of the four screen edges, pushed `pad` pixels outward
pub fn random_edge_position<R: Rng + ?Sized>(rng: &mut R, bounds: Viewport, pad: f32) -> Vec2 {
    let (w, h) = (bounds.width, bounds.height);
    match rng.random_range(0..4u8) {
        0 => Vec2::new(-pad, rng.random::<f32>() * h),    // left
        1 => Vec2::new(w + pad, rng.random::<f32>() * h), // right
        2 => Vec2::new(rng.random::<f32>() * w, -pad),    // top
        _ => Vec2::new(rng.random::<f32>() * w, h + pad), // bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn bounds() -> Viewport {
        Viewport::new(1920.0, 1080.0)
    }

    #[test]
    fn test_zero_delta_spawns_nothing() {
        let cfg = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut s = Spawner::new(&cfg, false, &mut rng);
        for _ in 0..10 {
            let out = s.tick(0.0, &cfg, bounds(), bounds().center(), &mut rng);
            assert!(out.threats.is_empty());
            assert!(out.pickups.is_empty());
            assert_eq!(out.wave_started, None);
        }
        assert_eq!(s.wave_index(), 0);
    }

    #[test]
    fn test_spawn_interval_cadence() {
        let cfg = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut s = Spawner::new(&cfg, false, &mut rng);
        // Wave 0: one spawn every 3.5s
        let mut count = 0;
        for _ in 0..(10 * 60) {
            count += s
                .tick(1.0 / 60.0, &cfg, bounds(), bounds().center(), &mut rng)
                .threats
                .len();
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_threats_spawn_outside_edges_with_scaled_speed() {
        let cfg = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut s = Spawner::new(&cfg, false, &mut rng);
        let b = bounds();
        let out = s.tick(7.0, &cfg, b, b.center(), &mut rng);
        assert_eq!(out.threats.len(), 2);
        let def = &cfg.enemies[&ThreatKind::WeakPassword];
        for t in &out.threats {
            assert_eq!(t.kind, ThreatKind::WeakPassword);
            let outside = t.pos.x < 0.0 || t.pos.x > b.width || t.pos.y < 0.0 || t.pos.y > b.height;
            assert!(outside, "spawn at {:?} is on screen", t.pos);
            let lo = def.speed_min * cfg.base_enemy_speed * 0.45;
            let hi = def.speed_max * cfg.base_enemy_speed * 0.45;
            assert!(t.speed >= lo - 1e-3 && t.speed <= hi + 1e-3);
        }
    }

    #[test]
    fn test_wave_progression_and_completion() {
        let cfg = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut s = Spawner::new(&cfg, false, &mut rng);
        let mut started = Vec::new();
        let mut complete = false;
        for _ in 0..160 {
            let out = s.tick(1.0, &cfg, bounds(), bounds().center(), &mut rng);
            if let Some(i) = out.wave_started {
                started.push(i);
            }
            if out.waves_complete {
                complete = true;
                break;
            }
        }
        assert_eq!(started, vec![1, 2, 3, 4]);
        assert!(complete);
        assert!(s.waves_complete());
        // Stays complete and idle
        let out = s.tick(1.0, &cfg, bounds(), bounds().center(), &mut rng);
        assert!(out.waves_complete);
        assert!(out.threats.is_empty());
    }

    #[test]
    fn test_demo_mode_shortens_waves() {
        let cfg = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut s = Spawner::new(&cfg, true, &mut rng);
        let out = s.tick(5.0, &cfg, bounds(), bounds().center(), &mut rng);
        assert_eq!(out.wave_started, Some(1));
    }

    #[test]
    fn test_unconfigured_threat_kind_is_skipped() {
        let mut cfg = GameConfig::default();
        cfg.enemies.remove(&ThreatKind::WeakPassword);
        let mut rng = Pcg32::seed_from_u64(6);
        let mut s = Spawner::new(&cfg, false, &mut rng);
        let out = s.tick(10.0, &cfg, bounds(), bounds().center(), &mut rng);
        assert!(out.threats.is_empty());
    }

    #[test]
    fn test_pickup_spawns_with_drift_toward_vault() {
        let cfg = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut s = Spawner::new(&cfg, false, &mut rng);
        let b = bounds();
        // Longest possible first delay is interval + variance
        let out = s.tick(
            cfg.pickup_spawn_interval + cfg.pickup_spawn_variance + 0.01,
            &cfg,
            b,
            b.center(),
            &mut rng,
        );
        assert_eq!(out.pickups.len(), 1);
        let p = &out.pickups[0];
        let heading = crate::polar_to_cartesian(1.0, p.drift_angle);
        let to_vault = (b.center() - p.pos).normalize();
        assert!(heading.dot(to_vault) > 0.999);
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let cfg = GameConfig::default();
        let run = |seed| {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut s = Spawner::new(&cfg, false, &mut rng);
            (0..300)
                .map(|_| s.tick(0.1, &cfg, bounds(), bounds().center(), &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_weighted_pickup_respects_weights() {
        let mut cfg = GameConfig::default();
        for (kind, def) in cfg.powerups.iter_mut() {
            def.rarity = if *kind == PowerUpKind::Mfa { 1.0 } else { 0.0 };
        }
        let mut rng = Pcg32::seed_from_u64(8);
        for _ in 0..50 {
            assert_eq!(weighted_pickup(&mut rng, &cfg), Some(PowerUpKind::Mfa));
        }
        for def in cfg.powerups.values_mut() {
            def.rarity = 0.0;
        }
        assert_eq!(weighted_pickup(&mut rng, &cfg), None);
    }
}
