//! Collision detection and damage application
//!
//! One pass per frame, five ordered checks:
//! 1. projectiles vs threats
//! 2. projectiles vs pickups
//! 3. lasers vs threats and pickups
//! 4. wave rings vs threats and pickups
//! 5. threats vs the vault
//!
//! Hit points, integrity and alive flags are mutated here (the authoritative
//! damage application). Score, effects and sound are left to the caller,
//! which receives a list of [`CollisionEvent`]s.

use glam::Vec2;

use super::events::CollisionEvent;
use super::state::{GameState, Pickup, Threat};
use crate::consts::*;

/// Circle-circle overlap (strict)
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    a.distance(b) < a_radius + b_radius
}

/// Distance from `p` to the segment `a`-`b`
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// True if `p` lies within `reach` of the ring's edge
#[inline]
pub fn in_ring_band(center: Vec2, ring_radius: f32, p: Vec2, reach: f32) -> bool {
    (p.distance(center) - ring_radius).abs() < reach
}

fn hit_threat(
    threat: &mut Threat,
    damage: i32,
    flash: f32,
    powerup_active: bool,
    events: &mut Vec<CollisionEvent>,
) {
    if threat.take_damage(damage, flash) {
        events.push(CollisionEvent::ThreatKilled {
            id: threat.id,
            kind: threat.kind,
            pos: threat.pos,
            points: threat.points,
            powerup_active,
        });
    } else {
        events.push(CollisionEvent::ThreatHit {
            id: threat.id,
            kind: threat.kind,
            pos: threat.pos,
        });
    }
}

fn hit_pickup(pickup: &mut Pickup, flash: f32, events: &mut Vec<CollisionEvent>) {
    if pickup.take_hit(flash) {
        events.push(CollisionEvent::PickupCollected {
            id: pickup.id,
            kind: pickup.kind,
            pos: pickup.pos,
        });
    } else {
        events.push(CollisionEvent::PickupHit {
            id: pickup.id,
            kind: pickup.kind,
            pos: pickup.pos,
        });
    }
}

/// Run the collision pass over the current playfield
pub fn detect_collisions(state: &mut GameState) -> Vec<CollisionEvent> {
    let mut events = Vec::new();
    let scale = state.scale();
    let powerup_active = state.powerup_active();
    let reach = state.bounds.max_extent();

    let vault = &mut state.vault;
    let threats = &mut state.threats;
    let pickups = &mut state.pickups;
    let projectiles = &mut state.projectiles;

    // --- 1. Projectiles vs threats (first match consumes the projectile) ---
    for proj in projectiles.iter_mut().filter(|p| p.alive) {
        let target = threats.iter_mut().find(|t| {
            t.alive && circles_overlap(proj.pos, proj.radius, t.pos, t.scaled_radius(scale))
        });
        if let Some(threat) = target {
            proj.alive = false;
            hit_threat(threat, proj.variant.damage(), HIT_FLASH, powerup_active, &mut events);
        }
    }

    // --- 2. Projectiles vs pickups (fixed 1 hit, weapon-independent) ---
    for proj in projectiles.iter_mut().filter(|p| p.alive) {
        let target = pickups.iter_mut().find(|k| {
            k.alive && circles_overlap(proj.pos, proj.radius, k.pos, k.scaled_radius(scale))
        });
        if let Some(pickup) = target {
            proj.alive = false;
            hit_pickup(pickup, HIT_FLASH, &mut events);
        }
    }

    // --- 3. Lasers, throttled by each target's own hit flash ---
    for laser in state.lasers.iter().filter(|l| l.alive) {
        let (a, b) = laser.segment(vault.pos, reach);

        for threat in threats.iter_mut().filter(|t| t.alive) {
            let dist = point_segment_distance(threat.pos, a, b);
            if dist < threat.scaled_radius(scale) + laser.width && threat.hit_flash <= 0.0 {
                hit_threat(
                    threat,
                    laser.variant.damage(),
                    LASER_HIT_FLASH,
                    powerup_active,
                    &mut events,
                );
            }
        }

        for pickup in pickups.iter_mut().filter(|k| k.alive) {
            let dist = point_segment_distance(pickup.pos, a, b);
            if dist < pickup.scaled_radius(scale) + laser.width && pickup.hit_flash <= 0.0 {
                hit_pickup(pickup, LASER_HIT_FLASH, &mut events);
            }
        }
    }

    // --- 4. Wave rings, each target at most once per ring ---
    for ring in state.rings.iter_mut().filter(|r| r.alive) {
        for threat in threats.iter_mut().filter(|t| t.alive) {
            let band = threat.scaled_radius(scale) + RING_THICKNESS;
            if in_ring_band(ring.center, ring.radius, threat.pos, band) && ring.mark_hit(threat.id)
            {
                hit_threat(threat, ring.variant.damage(), HIT_FLASH, powerup_active, &mut events);
            }
        }

        for pickup in pickups.iter_mut().filter(|k| k.alive) {
            let band = pickup.scaled_radius(scale) + RING_THICKNESS;
            if in_ring_band(ring.center, ring.radius, pickup.pos, band) && ring.mark_hit(pickup.id)
            {
                hit_pickup(pickup, HIT_FLASH, &mut events);
            }
        }
    }

    // --- 5. Threats vs vault (one contact hit, then the threat is gone) ---
    let vault_radius = vault.scaled_radius(scale);
    for threat in threats.iter_mut().filter(|t| t.alive) {
        let threat_reach = threat.scaled_radius(scale) * VAULT_REACH;
        if circles_overlap(threat.pos, threat_reach, vault.pos, vault_radius) {
            vault.integrity -= threat.damage;
            vault.shield_flash = SHIELD_FLASH;
            threat.alive = false;
            events.push(CollisionEvent::VaultHit {
                threat_id: threat.id,
                kind: threat.kind,
                damage: threat.damage,
            });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::state::{
        ActivePowerUp, Laser, PowerUpKind, Projectile, ThreatKind, Viewport, WaveRing,
        WeaponVariant,
    };

    /// 1080x1080 viewport so scale == 1
    fn setup() -> (GameConfig, GameState) {
        let cfg = GameConfig::default();
        let state = GameState::new(&cfg, Viewport::new(1080.0, 1080.0));
        (cfg, state)
    }

    fn add_threat(state: &mut GameState, cfg: &GameConfig, kind: ThreatKind, pos: Vec2) -> usize {
        let id = state.next_entity_id();
        state
            .threats
            .push(Threat::spawn(id, kind, pos, 0.0, cfg).unwrap());
        state.threats.len() - 1
    }

    fn add_pickup(state: &mut GameState, cfg: &GameConfig, pos: Vec2) -> usize {
        let id = state.next_entity_id();
        let vault = state.vault.pos;
        state
            .pickups
            .push(Pickup::spawn(id, PowerUpKind::Sso, pos, vault, 0.0, cfg).unwrap());
        state.pickups.len() - 1
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert!((point_segment_distance(Vec2::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-6);
        assert!((point_segment_distance(Vec2::new(-4.0, 3.0), a, b) - 5.0).abs() < 1e-6);
        assert!((point_segment_distance(Vec2::new(1.0, 1.0), a, a) - 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_vault_contact_scenario() {
        let (cfg, mut state) = setup();
        let vault = state.vault.pos;
        let i = add_threat(&mut state, &cfg, ThreatKind::InsiderAnomaly, vault + Vec2::new(30.0, 0.0));
        assert_eq!(state.vault.integrity, 100);

        let events = detect_collisions(&mut state);
        assert_eq!(state.vault.integrity, 85);
        assert!(!state.threats[i].alive);
        assert!(state.vault.shield_flash > 0.0);
        assert_eq!(
            events,
            vec![CollisionEvent::VaultHit {
                threat_id: state.threats[i].id,
                kind: ThreatKind::InsiderAnomaly,
                damage: 15,
            }]
        );

        // One contact hit only
        assert!(detect_collisions(&mut state).is_empty());
        assert_eq!(state.vault.integrity, 85);
    }

    #[test]
    fn test_strongest_projectile_kills_and_is_consumed() {
        let (cfg, mut state) = setup();
        let pos = Vec2::new(200.0, 200.0);
        let i = add_threat(&mut state, &cfg, ThreatKind::ShadowAiBot, pos);
        assert_eq!(state.threats[i].hp, 3);
        state
            .projectiles
            .push(Projectile::new(pos, 0.0, 0.0, WeaponVariant::Ring));

        let events = detect_collisions(&mut state);
        assert_eq!(state.threats[i].hp, -2);
        assert!(!state.threats[i].alive);
        assert!(!state.projectiles[0].alive);
        assert!(matches!(
            events[..],
            [CollisionEvent::ThreatKilled { powerup_active: false, .. }]
        ));
    }

    #[test]
    fn test_projectile_hits_only_first_threat() {
        let (cfg, mut state) = setup();
        let pos = Vec2::new(200.0, 200.0);
        add_threat(&mut state, &cfg, ThreatKind::Phishing, pos);
        add_threat(&mut state, &cfg, ThreatKind::Phishing, pos);
        state
            .projectiles
            .push(Projectile::new(pos, 0.0, 0.0, WeaponVariant::Default));

        let events = detect_collisions(&mut state);
        assert_eq!(events.len(), 1);
        assert_eq!(state.threats[0].hp, 3);
        assert_eq!(state.threats[1].hp, 4);
        assert!(state.threats[0].hit_flash > 0.0);
    }

    #[test]
    fn test_kill_reports_active_powerup() {
        let (cfg, mut state) = setup();
        let pos = Vec2::new(200.0, 200.0);
        add_threat(&mut state, &cfg, ThreatKind::WeakPassword, pos);
        state
            .active_powerups
            .push(ActivePowerUp::from_config(PowerUpKind::ItAdminDashboard, &cfg).unwrap());
        state
            .projectiles
            .push(Projectile::new(pos, 0.0, 0.0, WeaponVariant::Default));
        let events = detect_collisions(&mut state);
        assert!(matches!(
            events[..],
            [CollisionEvent::ThreatKilled { powerup_active: true, points: 1, .. }]
        ));
    }

    #[test]
    fn test_pickup_needs_two_hits() {
        let (cfg, mut state) = setup();
        let pos = Vec2::new(100.0, 100.0);
        let i = add_pickup(&mut state, &cfg, pos);

        state
            .projectiles
            .push(Projectile::new(pos, 0.0, 0.0, WeaponVariant::Spread));
        let events = detect_collisions(&mut state);
        assert_eq!(state.pickups[i].hp, 1);
        assert!(matches!(events[..], [CollisionEvent::PickupHit { .. }]));

        state
            .projectiles
            .push(Projectile::new(pos, 0.0, 0.0, WeaponVariant::Default));
        let events = detect_collisions(&mut state);
        assert!(!state.pickups[i].alive);
        assert!(matches!(
            events[..],
            [CollisionEvent::PickupCollected { kind: PowerUpKind::Sso, .. }]
        ));
    }

    #[test]
    fn test_laser_damage_is_throttled_by_hit_flash() {
        let (cfg, mut state) = setup();
        let vault = state.vault.pos;
        // Straight right of the vault, on the beam
        let i = add_threat(&mut state, &cfg, ThreatKind::InsiderAnomaly, vault + Vec2::new(300.0, 0.0));
        state.lasers.push(Laser::new(0.0));

        let dt = 1.0 / 60.0;
        let mut hits = 0;
        for _ in 0..60 {
            hits += detect_collisions(&mut state).len();
            state.threats[i].advance(vault, dt, true);
        }
        // 1s of exposure with a 0.15s throttle: far fewer than 60 ticks
        assert!((1..=7).contains(&hits), "hits = {hits}");
        assert!(state.threats[i].hp < 5);
    }

    #[test]
    fn test_laser_collects_pickup_after_throttled_second_hit() {
        let (cfg, mut state) = setup();
        let vault = state.vault.pos;
        let k = add_pickup(&mut state, &cfg, vault + Vec2::new(300.0, 0.0));
        state.lasers.push(Laser::new(0.0));

        let dt = 1.0 / 60.0;
        let mut frames = Vec::new();
        for _ in 0..30 {
            frames.push(detect_collisions(&mut state));
            state.pickups[k].drift(dt, 1.0);
        }

        assert!(matches!(frames[0][..], [CollisionEvent::PickupHit { .. }]));
        let collected_at = frames
            .iter()
            .position(|f| matches!(f[..], [CollisionEvent::PickupCollected { .. }]))
            .unwrap();
        // Quiet while the 0.15s hit flash runs down
        assert!(collected_at >= 8, "collected at frame {collected_at}");
        assert!(frames[1..collected_at].iter().all(|f| f.is_empty()));
        assert!(frames[collected_at + 1..].iter().all(|f| f.is_empty()));
        assert!(!state.pickups[k].alive);
    }

    #[test]
    fn test_laser_misses_off_axis_target() {
        let (cfg, mut state) = setup();
        let vault = state.vault.pos;
        add_threat(&mut state, &cfg, ThreatKind::InsiderAnomaly, vault + Vec2::new(0.0, 300.0));
        state.lasers.push(Laser::new(0.0));
        assert!(detect_collisions(&mut state).is_empty());
    }

    #[test]
    fn test_ring_hits_each_target_once() {
        let (cfg, mut state) = setup();
        let vault = state.vault.pos;
        let i = add_threat(&mut state, &cfg, ThreatKind::InsiderAnomaly, vault + Vec2::new(25.0, 0.0));
        let k = add_pickup(&mut state, &cfg, vault + Vec2::new(0.0, -25.0));
        // Keep the threat off the vault so only the ring matters
        state.vault.radius = 0.0;
        state.threats[i].radius = 10.0;
        state.rings.push(WaveRing::new(vault, 1000.0));

        for _ in 0..20 {
            detect_collisions(&mut state);
        }
        assert_eq!(state.threats[i].hp, 0);
        assert!(!state.threats[i].alive);
        assert_eq!(state.pickups[k].hp, 1);
        assert_eq!(state.rings[0].hit_set.len(), 2);
    }

    #[test]
    fn test_dead_targets_are_ignored() {
        let (cfg, mut state) = setup();
        let pos = Vec2::new(200.0, 200.0);
        let i = add_threat(&mut state, &cfg, ThreatKind::WeakPassword, pos);
        state.threats[i].alive = false;
        state
            .projectiles
            .push(Projectile::new(pos, 0.0, 0.0, WeaponVariant::Default));
        assert!(detect_collisions(&mut state).is_empty());
        assert!(state.projectiles[0].alive);
    }
}
