//! Score, kill tally and rank lookup

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::ThreatKind;
use crate::config::RankThreshold;

/// Running totals for one game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    pub kills: u32,
    pub kills_by_kind: BTreeMap<ThreatKind, u32>,
}

impl Scoreboard {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Award a kill. Returns the points added.
    pub fn record_kill(
        &mut self,
        kind: ThreatKind,
        points: u32,
        powerup_active: bool,
        powerup_bonus: u32,
    ) -> u64 {
        let mut awarded = points as u64;
        if powerup_active {
            awarded += powerup_bonus as u64;
        }
        self.score += awarded;
        self.kills += 1;
        *self.kills_by_kind.entry(kind).or_insert(0) += 1;
        awarded
    }

    /// Whole seconds left on the clock, added once on victory
    pub fn add_time_bonus(&mut self, seconds_left: f32) -> u64 {
        let bonus = seconds_left.max(0.0).floor() as u64;
        self.score += bonus;
        bonus
    }

    pub fn kills_of(&self, kind: ThreatKind) -> u32 {
        self.kills_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// Index of the rank for `score` in ascending `thresholds`
///
/// Last threshold whose `min` ≤ score; scores below every threshold land on
/// the first one.
pub fn rank_index(score: u64, thresholds: &[RankThreshold]) -> Option<usize> {
    if thresholds.is_empty() {
        return None;
    }
    Some(
        thresholds
            .iter()
            .rposition(|t| t.min <= score)
            .unwrap_or(0),
    )
}

pub fn rank_for(score: u64, thresholds: &[RankThreshold]) -> Option<&str> {
    rank_index(score, thresholds).map(|i| thresholds[i].rank.as_str())
}
