//! Weapon resolution, firing patterns and power-up activation

use glam::Vec2;
use rand::Rng;
use thiserror::Error;

use super::events::SoundCue;
use super::state::{
    ActivePowerUp, Inventory, Laser, PowerUpCategory, PowerUpKind, Projectile, Viewport,
    WaveRing, WeaponVariant,
};
use crate::config::GameConfig;
use crate::consts::*;

/// Highest-priority active weapon, or the default shot
pub fn active_weapon(active: &[ActivePowerUp]) -> WeaponVariant {
    active
        .iter()
        .filter(|p| p.category == PowerUpCategory::Weapon)
        .max_by_key(|p| p.priority)
        .and_then(|p| p.kind.weapon_variant())
        .unwrap_or_default()
}

/// Everything one trigger pull puts on the field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Volley {
    pub projectiles: Vec<Projectile>,
    pub lasers: Vec<Laser>,
    pub rings: Vec<WaveRing>,
    pub cue: Option<SoundCue>,
}

/// Build the shots for `variant` fired from `origin` toward `aim`.
///
/// `speed` is the already-scaled projectile speed. Spread shots jitter their
/// speed using `rng`.
pub fn fire<R: Rng + ?Sized>(
    variant: WeaponVariant,
    origin: Vec2,
    aim: f32,
    speed: f32,
    bounds: &Viewport,
    rng: &mut R,
) -> Volley {
    let mut volley = Volley {
        cue: Some(SoundCue::Shoot),
        ..Default::default()
    };

    match variant {
        WeaponVariant::Default => {
            volley
                .projectiles
                .push(Projectile::new(origin, aim, speed, variant));
        }
        WeaponVariant::Twin => {
            for offset in [-TWIN_SPREAD, TWIN_SPREAD] {
                volley
                    .projectiles
                    .push(Projectile::new(origin, aim + offset, speed, variant));
            }
        }
        WeaponVariant::Laser => {
            volley.lasers.push(Laser::new(aim));
            volley.cue = Some(SoundCue::Laser);
        }
        WeaponVariant::Spread => {
            let step = 2.0 * SPREAD_HALF_ANGLE / (SPREAD_SHOTS - 1) as f32;
            for i in 0..SPREAD_SHOTS {
                let angle = aim - SPREAD_HALF_ANGLE + step * i as f32;
                let jitter = 1.0 - SPREAD_SPEED_JITTER / 2.0 + rng.random::<f32>() * SPREAD_SPEED_JITTER;
                volley
                    .projectiles
                    .push(Projectile::new(origin, angle, speed * jitter, variant));
            }
        }
        WeaponVariant::Ring => {
            volley
                .rings
                .push(WaveRing::new(origin, bounds.max_extent() * RING_REACH));
        }
    }

    volley
}

/// Advance the fire cooldown and decide whether a shot goes out this frame.
///
/// Twin streams on `fire_held` at a fixed cadence and ignores one-shot
/// requests. Every other variant fires once per request, gated by `fire_rate`.
pub fn pull_trigger(
    cooldown: &mut f32,
    variant: WeaponVariant,
    fire_requested: bool,
    fire_held: bool,
    dt: f32,
    fire_rate: f32,
) -> bool {
    *cooldown = (*cooldown - dt).max(0.0);

    let (wants, cadence) = match variant {
        WeaponVariant::Twin => (fire_held, STREAM_COOLDOWN),
        _ => (fire_requested, fire_rate),
    };
    if wants && *cooldown <= 0.0 {
        *cooldown = cadence;
        true
    } else {
        false
    }
}

/// Why an activation did not happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActivationRejected {
    /// No units of this kind in the inventory
    #[error("no {} in inventory", .0.key())]
    NotHeld(PowerUpKind),
    /// The configuration does not define this kind
    #[error("{} is not configured", .0.key())]
    Unconfigured(PowerUpKind),
    /// Weapon slots are full of higher-priority weapons
    #[error("{} is outranked by every active weapon", .0.key())]
    Outranked(PowerUpKind),
    /// Hotkey outside 1..=5
    #[error("no inventory slot {0}")]
    NoSuchSlot(usize),
    /// Not in a phase that accepts activations
    #[error("activation only allowed during play")]
    NotPlaying,
}

/// Move one `kind` from the inventory into the active set.
///
/// Returns the evicted power-up, if any. On rejection the inventory and the
/// active set are unchanged.
pub fn activate(
    active: &mut Vec<ActivePowerUp>,
    inventory: &mut Inventory,
    kind: PowerUpKind,
    config: &GameConfig,
) -> Result<Option<PowerUpKind>, ActivationRejected> {
    if inventory.count(kind) == 0 {
        return Err(ActivationRejected::NotHeld(kind));
    }
    let new = ActivePowerUp::from_config(kind, config)
        .ok_or(ActivationRejected::Unconfigured(kind))?;

    let mut evicted = None;
    match new.category {
        PowerUpCategory::Weapon => {
            let weapons = active
                .iter()
                .filter(|p| p.category == PowerUpCategory::Weapon)
                .count();
            if weapons >= config.max_active_powerups {
                let lowest = active
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.category == PowerUpCategory::Weapon)
                    .min_by_key(|(_, p)| p.priority)
                    .map(|(i, p)| (i, p.priority));
                match lowest {
                    Some((i, priority)) if new.priority >= priority => {
                        evicted = Some(active.remove(i).kind);
                    }
                    _ => return Err(ActivationRejected::Outranked(kind)),
                }
            }
        }
        PowerUpCategory::Tool => {
            if let Some(i) = active
                .iter()
                .rposition(|p| p.category == PowerUpCategory::Tool)
            {
                evicted = Some(active.remove(i).kind);
            }
        }
    }

    inventory.take(kind);
    active.push(new);
    Ok(evicted)
}

/// Count down active power-ups; returns the kinds that expired
pub fn tick_active(active: &mut Vec<ActivePowerUp>, dt: f32) -> Vec<PowerUpKind> {
    let mut expired = Vec::new();
    active.retain_mut(|p| {
        p.remaining -= dt;
        if p.remaining <= 0.0 {
            expired.push(p.kind);
            false
        } else {
            true
        }
    });
    expired
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn stocked(kinds: &[PowerUpKind]) -> Inventory {
        let mut inv = Inventory::default();
        for &k in kinds {
            inv.add(k);
        }
        inv
    }

    #[test]
    fn test_active_weapon_picks_highest_priority() {
        let cfg = GameConfig::default();
        assert_eq!(active_weapon(&[]), WeaponVariant::Default);

        let sp = ActivePowerUp::from_config(PowerUpKind::StrongPassword, &cfg).unwrap();
        let pm = ActivePowerUp::from_config(PowerUpKind::PasswordManager, &cfg).unwrap();
        let it = ActivePowerUp::from_config(PowerUpKind::ItAdminDashboard, &cfg).unwrap();
        assert_eq!(active_weapon(&[sp.clone(), pm]), WeaponVariant::Ring);
        assert_eq!(active_weapon(&[it.clone()]), WeaponVariant::Default);
        assert_eq!(active_weapon(&[it, sp]), WeaponVariant::Twin);
    }

    #[test]
    fn test_fire_patterns() {
        let mut rng = Pcg32::seed_from_u64(1);
        let bounds = Viewport::new(1920.0, 1080.0);
        let origin = bounds.center();

        let v = fire(WeaponVariant::Default, origin, 0.0, 1000.0, &bounds, &mut rng);
        assert_eq!(v.projectiles.len(), 1);
        assert_eq!(v.cue, Some(SoundCue::Shoot));

        let v = fire(WeaponVariant::Twin, origin, 1.0, 1000.0, &bounds, &mut rng);
        assert_eq!(v.projectiles.len(), 2);
        assert!((v.projectiles[0].angle - (1.0 - TWIN_SPREAD)).abs() < 1e-6);
        assert!((v.projectiles[1].angle - (1.0 + TWIN_SPREAD)).abs() < 1e-6);

        let v = fire(WeaponVariant::Laser, origin, 0.5, 1000.0, &bounds, &mut rng);
        assert!(v.projectiles.is_empty());
        assert_eq!(v.lasers.len(), 1);
        assert_eq!(v.cue, Some(SoundCue::Laser));

        let v = fire(WeaponVariant::Ring, origin, 0.0, 1000.0, &bounds, &mut rng);
        assert_eq!(v.rings.len(), 1);
        assert!((v.rings[0].max_radius - 1920.0 * RING_REACH).abs() < 1e-3);
    }

    #[test]
    fn test_spread_covers_cone_with_jittered_speed() {
        let mut rng = Pcg32::seed_from_u64(2);
        let bounds = Viewport::new(1080.0, 1080.0);
        let v = fire(WeaponVariant::Spread, Vec2::ZERO, 0.0, 1000.0, &bounds, &mut rng);
        assert_eq!(v.projectiles.len(), SPREAD_SHOTS);
        assert!((v.projectiles[0].angle + SPREAD_HALF_ANGLE).abs() < 1e-5);
        assert!((v.projectiles[SPREAD_SHOTS - 1].angle - SPREAD_HALF_ANGLE).abs() < 1e-5);
        for p in &v.projectiles {
            assert!(p.speed >= 850.0 - 1e-3 && p.speed < 1150.0);
        }
    }

    #[test]
    fn test_twin_streams_while_held() {
        let mut cd = 0.0;
        let dt = 1.0 / 60.0;
        let shots = (0..60)
            .filter(|_| pull_trigger(&mut cd, WeaponVariant::Twin, false, true, dt, 0.15))
            .count();
        // ~16/sec at a 0.06s cadence, frame-quantized
        assert!((14..=17).contains(&shots), "shots = {shots}");

        // One-shot requests are ignored for the twin
        let mut cd = 0.0;
        assert!(!pull_trigger(&mut cd, WeaponVariant::Twin, true, false, dt, 0.15));
    }

    #[test]
    fn test_discrete_fire_respects_cooldown() {
        let mut cd = 0.0;
        let dt = 1.0 / 60.0;
        assert!(pull_trigger(&mut cd, WeaponVariant::Default, true, false, dt, 0.15));
        assert!(!pull_trigger(&mut cd, WeaponVariant::Default, true, false, dt, 0.15));
        // Holding does not auto-fire the default shot
        for _ in 0..20 {
            assert!(!pull_trigger(&mut cd, WeaponVariant::Default, false, true, dt, 0.15));
        }
        assert!(pull_trigger(&mut cd, WeaponVariant::Default, true, false, dt, 0.15));
    }

    #[test]
    fn test_activation_consumes_inventory() {
        let cfg = GameConfig::default();
        let mut active = Vec::new();
        let mut inv = stocked(&[PowerUpKind::Mfa]);
        assert_eq!(activate(&mut active, &mut inv, PowerUpKind::Mfa, &cfg), Ok(None));
        assert_eq!(inv.count(PowerUpKind::Mfa), 0);
        assert_eq!(active.len(), 1);
        assert_eq!(
            activate(&mut active, &mut inv, PowerUpKind::Mfa, &cfg),
            Err(ActivationRejected::NotHeld(PowerUpKind::Mfa))
        );
    }

    #[test]
    fn test_lower_priority_weapon_is_rejected_at_capacity() {
        let cfg = GameConfig::default();
        let mut active = Vec::new();
        let mut inv = stocked(&[PowerUpKind::Mfa, PowerUpKind::PasswordManager, PowerUpKind::StrongPassword]);
        activate(&mut active, &mut inv, PowerUpKind::Mfa, &cfg).unwrap();
        activate(&mut active, &mut inv, PowerUpKind::PasswordManager, &cfg).unwrap();

        let before = active.clone();
        assert_eq!(
            activate(&mut active, &mut inv, PowerUpKind::StrongPassword, &cfg),
            Err(ActivationRejected::Outranked(PowerUpKind::StrongPassword))
        );
        assert_eq!(active, before);
        assert_eq!(inv.count(PowerUpKind::StrongPassword), 1);
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            ActivationRejected::Outranked(PowerUpKind::StrongPassword).to_string(),
            "STRONG_PASSWORD is outranked by every active weapon"
        );
        assert_eq!(ActivationRejected::NoSuchSlot(7).to_string(), "no inventory slot 7");
    }

    #[test]
    fn test_tool_replaces_tool() {
        let cfg = GameConfig::default();
        let mut active = Vec::new();
        let mut inv = stocked(&[PowerUpKind::ItAdminDashboard, PowerUpKind::ItAdminDashboard]);
        assert_eq!(
            activate(&mut active, &mut inv, PowerUpKind::ItAdminDashboard, &cfg),
            Ok(None)
        );
        active[0].remaining = 1.0;
        assert_eq!(
            activate(&mut active, &mut inv, PowerUpKind::ItAdminDashboard, &cfg),
            Ok(Some(PowerUpKind::ItAdminDashboard))
        );
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].remaining, active[0].duration);
    }

    #[test]
    fn test_tick_active_expires() {
        let cfg = GameConfig::default();
        let mut active = vec![
            ActivePowerUp::from_config(PowerUpKind::ItAdminDashboard, &cfg).unwrap(),
            ActivePowerUp::from_config(PowerUpKind::StrongPassword, &cfg).unwrap(),
        ];
        assert!(tick_active(&mut active, 4.0).is_empty());
        assert_eq!(tick_active(&mut active, 1.0), vec![PowerUpKind::ItAdminDashboard]);
        assert_eq!(active.len(), 1);
    }

    fn any_kind() -> impl Strategy<Value = PowerUpKind> {
        prop::sample::select(PowerUpKind::DISPLAY_ORDER.to_vec())
    }

    proptest! {
        #[test]
        fn prop_slot_contention(kinds in prop::collection::vec(any_kind(), 1..24)) {
            let cfg = GameConfig::default();
            let mut active: Vec<ActivePowerUp> = Vec::new();
            let mut inv = stocked(&kinds);

            for kind in kinds {
                let before = active.clone();
                let weapons_before: Vec<_> = before
                    .iter()
                    .filter(|p| p.category == PowerUpCategory::Weapon)
                    .cloned()
                    .collect();
                let held = inv.count(kind);

                match activate(&mut active, &mut inv, kind, &cfg) {
                    Ok(evicted) => {
                        prop_assert_eq!(inv.count(kind), held - 1);
                        if let Some(gone) = evicted {
                            let gone_def = &cfg.powerups[&gone];
                            if gone_def.category == PowerUpCategory::Weapon {
                                // Only the lowest-priority weapon may be evicted
                                let min = weapons_before.iter().map(|p| p.priority).min().unwrap();
                                prop_assert_eq!(gone_def.priority, min);
                                prop_assert!(cfg.powerups[&kind].priority >= min);
                            }
                        }
                    }
                    Err(_) => {
                        prop_assert_eq!(&active, &before);
                        prop_assert_eq!(inv.count(kind), held);
                    }
                }

                let weapons = active.iter().filter(|p| p.category == PowerUpCategory::Weapon).count();
                let tools = active.iter().filter(|p| p.category == PowerUpCategory::Tool).count();
                prop_assert!(weapons <= cfg.max_active_powerups);
                prop_assert!(tools <= 1);
            }
        }
    }
}
