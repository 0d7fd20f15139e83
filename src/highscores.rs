//! High score leaderboard system
//!
//! Persisted through the platform storage (LocalStorage on web, a JSON file
//! natively). Keeps a generous buffer of entries so the "today" view still
//! has something to show once the all-time board is full.

use serde::{Deserialize, Serialize};

use crate::platform;
use crate::sim::ScoreRecord;

/// Default number of high scores shown
pub const MAX_HIGH_SCORES: usize = 10;

/// Initials used when the player enters none
pub const DEFAULT_INITIALS: &str = "GST";

const INITIALS_LEN: usize = 3;
/// Stored entries per displayed entry
const BUFFER_FACTOR: usize = 3;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Upper-case, trim and cut to three characters; empty input gets the default
pub fn normalize_initials(raw: &str) -> String {
    let initials: String = raw
        .trim()
        .chars()
        .flat_map(char::to_uppercase)
        .take(INITIALS_LEN)
        .collect();
    if initials.is_empty() {
        DEFAULT_INITIALS.to_string()
    } else {
        initials
    }
}

/// Start of the UTC day containing `now_ms`
pub fn start_of_day_ms(now_ms: f64) -> f64 {
    now_ms - now_ms.rem_euclid(MS_PER_DAY)
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub initials: String,
    pub score: u64,
    pub rank: String,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

impl From<&ScoreRecord> for HighScoreEntry {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            initials: normalize_initials(&record.initials),
            score: record.score,
            rank: record.rank.clone(),
            timestamp: record.timestamp,
        }
    }
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    /// Sorted by score, descending
    entries: Vec<HighScoreEntry>,
    /// Entries shown per view
    limit: usize,
}

impl Default for HighScores {
    fn default() -> Self {
        Self::new()
    }
}

impl HighScores {
    /// Storage key
    const STORAGE_KEY: &'static str = "vaultguardian_leaderboard";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::with_limit(MAX_HIGH_SCORES)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Check if a score would make the all-time board
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        let board = self.all_time();
        if board.len() < self.limit {
            return true;
        }
        board.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let board = self.all_time();
        let rank = board.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(board.len()) + 1)
    }

    /// Add a finished game. Returns the all-time rank (1-indexed) if it made
    /// the visible board.
    pub fn add_entry(&mut self, record: &ScoreRecord) -> Option<usize> {
        let entry = HighScoreEntry::from(record);
        // After any equal scores, so earlier games keep their place
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(self.limit * BUFFER_FACTOR);

        (pos < self.limit).then_some(pos + 1)
    }

    /// Top entries of all time
    pub fn all_time(&self) -> &[HighScoreEntry] {
        &self.entries[..self.entries.len().min(self.limit)]
    }

    /// Top entries recorded at or after `start_of_day` (Unix ms)
    pub fn today(&self, start_of_day: f64) -> Vec<&HighScoreEntry> {
        self.entries
            .iter()
            .filter(|e| e.timestamp >= start_of_day)
            .take(self.limit)
            .collect()
    }

    /// Remove every entry, including the stored copy
    pub fn clear(&mut self) {
        self.entries.clear();
        platform::storage_remove(Self::STORAGE_KEY);
        log::info!("High scores cleared");
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Parse a stored entry list. Unsorted input is re-sorted.
    pub fn from_json(json: &str, limit: usize) -> Result<Self, serde_json::Error> {
        let mut entries: Vec<HighScoreEntry> = serde_json::from_str(json)?;
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        let mut scores = Self::with_limit(limit);
        entries.truncate(scores.limit * BUFFER_FACTOR);
        scores.entries = entries;
        Ok(scores)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }

    /// Load from storage; anything unreadable yields an empty board
    pub fn load(limit: usize) -> Self {
        let Some(json) = platform::storage_read(Self::STORAGE_KEY) else {
            log::info!("No high scores found, starting fresh");
            return Self::with_limit(limit);
        };
        match Self::from_json(&json, limit) {
            Ok(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(e) => {
                log::warn!("Discarding unreadable high scores: {}", e);
                Self::with_limit(limit)
            }
        }
    }

    /// Save to storage; failures are logged and ignored
    pub fn save(&self) {
        match self.to_json() {
            Ok(json) => {
                if platform::storage_write(Self::STORAGE_KEY, &json) {
                    log::info!("High scores saved ({} entries)", self.entries.len());
                }
            }
            Err(e) => log::warn!("Could not encode high scores: {}", e),
        }
    }
}

/// Format a timestamp relative to `now` (both Unix ms)
pub fn format_age(timestamp: f64, now: f64) -> String {
    let diff_mins = (now - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}
