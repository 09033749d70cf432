//! Durable per-world hunt progress: the system of record.
//!
//! One [`AscendancyLedger`] exists per world save. The host owns its
//! persistence; the ledger only flags itself dirty on mutation and exposes
//! [`AscendancyLedger::take_dirty`] for the host's flush schedule. All maps
//! are `BTreeMap`/`BTreeSet` keyed by [`PlayerId`] so serialization and
//! iteration stay deterministic.

use runecove_core::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Highest admin-settable hunt stage.
pub const MAX_STAGE: u8 = 6;

/// Per-player durable record. Created lazily, never deleted (only fields
/// reset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Display-only hunt stage (0-6), mirrored from item state by commands.
    pub stage: u8,
    /// Epoch-millisecond timestamp the failure cooldown expires, if any.
    pub cooldown_until_ms: Option<u64>,
    /// Opaque dialogue keys already shown to this player.
    pub seen_dialogue: BTreeSet<String>,
}

/// World-scoped hunt progress store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AscendancyLedger {
    records: BTreeMap<PlayerId, PlayerRecord>,
    /// Append-only completion order; index + 1 is a player's placement.
    completion_order: Vec<PlayerId>,
    winner: Option<PlayerId>,
    first_completion_ms: Option<u64>,
    #[serde(skip)]
    dirty: bool,
}

impl AscendancyLedger {
    /// Empty ledger for a new world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or lazily create) a player's record.
    pub fn record(&mut self, player: PlayerId) -> &mut PlayerRecord {
        self.records.entry(player).or_default()
    }

    /// Read-only record access; absent players read as default.
    pub fn record_ref(&self, player: PlayerId) -> PlayerRecord {
        self.records.get(&player).cloned().unwrap_or_default()
    }

    // === Completion ledger ===

    /// Record a hunt completion. Appends the player if not already present
    /// and returns their 1-based placement either way; the first entrant is
    /// also recorded as the winner. Idempotent.
    pub fn record_completion(&mut self, player: PlayerId, now_ms: u64) -> u32 {
        if !self.completion_order.contains(&player) {
            self.completion_order.push(player);
            if self.completion_order.len() == 1 {
                self.winner = Some(player);
                self.first_completion_ms = Some(now_ms);
                info!(%player, "hunt has its first champion");
            }
            self.dirty = true;
            info!(
                %player,
                placement = self.completion_order.len(),
                "recorded hunt completion"
            );
        }
        self.placement_of(player)
    }

    /// A player's 1-based placement, or 0 if they have not completed.
    pub fn placement_of(&self, player: PlayerId) -> u32 {
        self.completion_order
            .iter()
            .position(|&p| p == player)
            .map(|i| i as u32 + 1)
            .unwrap_or(0)
    }

    /// Whether a player has completed the hunt.
    pub fn has_completed(&self, player: PlayerId) -> bool {
        self.completion_order.contains(&player)
    }

    /// Total completions so far.
    pub fn completion_count(&self) -> usize {
        self.completion_order.len()
    }

    /// Completion order, earliest first.
    pub fn completions(&self) -> &[PlayerId] {
        &self.completion_order
    }

    /// The first entrant, if anyone has completed.
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Remove a player from the completion ledger. If they were the winner,
    /// the next entrant is promoted (or the winner is cleared if the ledger
    /// is now empty). Returns whether anything was removed.
    pub fn clear_completion(&mut self, player: PlayerId) -> bool {
        let Some(index) = self.completion_order.iter().position(|&p| p == player) else {
            return false;
        };
        self.completion_order.remove(index);
        if self.winner == Some(player) {
            self.winner = self.completion_order.first().copied();
            if self.winner.is_none() {
                self.first_completion_ms = None;
            }
        }
        self.dirty = true;
        info!(%player, "cleared hunt completion");
        true
    }

    // === Stage progress ===

    /// A player's display stage (0 if never set).
    pub fn stage(&self, player: PlayerId) -> u8 {
        self.records.get(&player).map(|r| r.stage).unwrap_or(0)
    }

    /// Set a player's display stage, clamped to 0..=[`MAX_STAGE`].
    pub fn set_stage(&mut self, player: PlayerId, stage: u8) {
        let stage = stage.min(MAX_STAGE);
        self.record(player).stage = stage;
        self.dirty = true;
        info!(%player, stage, "hunt stage set");
    }

    /// Reset a player's display stage to 0.
    pub fn clear_stage(&mut self, player: PlayerId) {
        if let Some(record) = self.records.get_mut(&player) {
            record.stage = 0;
            self.dirty = true;
        }
    }

    // === Cooldowns ===

    /// Start a cooldown ending `duration_ms` after `now_ms`.
    pub fn set_cooldown(&mut self, player: PlayerId, now_ms: u64, duration_ms: u64) {
        self.record(player).cooldown_until_ms = Some(now_ms + duration_ms);
        self.dirty = true;
    }

    /// Whether a player's cooldown is still running. A query past expiry
    /// evicts the entry as a side effect.
    pub fn is_on_cooldown(&mut self, player: PlayerId, now_ms: u64) -> bool {
        let Some(record) = self.records.get_mut(&player) else {
            return false;
        };
        match record.cooldown_until_ms {
            Some(until) if now_ms >= until => {
                record.cooldown_until_ms = None;
                self.dirty = true;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Milliseconds remaining on a player's cooldown (0 if none).
    pub fn cooldown_remaining(&self, player: PlayerId, now_ms: u64) -> u64 {
        self.records
            .get(&player)
            .and_then(|r| r.cooldown_until_ms)
            .map(|until| until.saturating_sub(now_ms))
            .unwrap_or(0)
    }

    /// Cancel a player's cooldown.
    pub fn clear_cooldown(&mut self, player: PlayerId) {
        if let Some(record) = self.records.get_mut(&player) {
            if record.cooldown_until_ms.take().is_some() {
                self.dirty = true;
            }
        }
    }

    // === One-time dialogue gating ===

    /// Mark a dialogue line as seen. Keys compose as `action:line`.
    pub fn mark_dialogue_seen(&mut self, player: PlayerId, action: &str, line: &str) {
        let key = format!("{action}:{line}");
        if self.record(player).seen_dialogue.insert(key.clone()) {
            self.dirty = true;
            debug!(%player, key, "dialogue line marked seen");
        }
    }

    /// Whether a player has seen a dialogue line.
    pub fn has_seen_dialogue(&self, player: PlayerId, action: &str, line: &str) -> bool {
        let key = format!("{action}:{line}");
        self.records
            .get(&player)
            .is_some_and(|r| r.seen_dialogue.contains(&key))
    }

    /// Forget every dialogue line a player has seen. Returns whether any
    /// were present.
    pub fn clear_dialogue(&mut self, player: PlayerId) -> bool {
        let Some(record) = self.records.get_mut(&player) else {
            return false;
        };
        if record.seen_dialogue.is_empty() {
            return false;
        }
        record.seen_dialogue.clear();
        self.dirty = true;
        true
    }

    /// Forget one specific dialogue line. Returns whether it was present.
    pub fn clear_dialogue_line(&mut self, player: PlayerId, action: &str, line: &str) -> bool {
        let key = format!("{action}:{line}");
        let removed = self
            .records
            .get_mut(&player)
            .is_some_and(|r| r.seen_dialogue.remove(&key));
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Forget every dialogue line for every player.
    pub fn clear_all_dialogue(&mut self) {
        let mut any = false;
        for record in self.records.values_mut() {
            any |= !record.seen_dialogue.is_empty();
            record.seen_dialogue.clear();
        }
        if any {
            self.dirty = true;
        }
    }

    // === Maintenance ===

    /// Wipe every field back to a fresh-world state.
    pub fn reset(&mut self) {
        self.records.clear();
        self.completion_order.clear();
        self.winner = None;
        self.first_completion_ms = None;
        self.dirty = true;
        info!("hunt ledger reset");
    }

    /// Consume the dirty flag; true means the host should flush to disk.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// Human-readable cooldown remainder for user messaging.
pub fn format_cooldown(remaining_ms: u64) -> String {
    let seconds = remaining_ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{} hours, {} minutes", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{} minutes, {} seconds", minutes, seconds % 60)
    } else {
        format!("{seconds} seconds")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);
    const CAROL: PlayerId = PlayerId(3);

    #[test]
    fn completion_is_idempotent() {
        let mut ledger = AscendancyLedger::new();
        assert_eq!(ledger.record_completion(ALICE, 0), 1);
        assert_eq!(ledger.record_completion(ALICE, 5), 1);
        assert_eq!(ledger.completion_count(), 1);
        assert_eq!(ledger.winner(), Some(ALICE));
    }

    #[test]
    fn placements_follow_arrival_order() {
        let mut ledger = AscendancyLedger::new();
        ledger.record_completion(ALICE, 0);
        ledger.record_completion(BOB, 1);
        assert_eq!(ledger.record_completion(CAROL, 2), 3);
        assert_eq!(ledger.placement_of(BOB), 2);
        assert_eq!(ledger.placement_of(PlayerId(99)), 0);
        assert_eq!(ledger.winner(), Some(ALICE));
    }

    #[test]
    fn clearing_winner_promotes_next_entrant() {
        let mut ledger = AscendancyLedger::new();
        ledger.record_completion(ALICE, 0);
        ledger.record_completion(BOB, 1);

        assert!(ledger.clear_completion(ALICE));
        assert_eq!(ledger.winner(), Some(BOB));
        assert_eq!(ledger.placement_of(BOB), 1);
    }

    #[test]
    fn clearing_sole_completion_unsets_winner() {
        let mut ledger = AscendancyLedger::new();
        ledger.record_completion(ALICE, 42);
        assert!(ledger.clear_completion(ALICE));
        assert_eq!(ledger.winner(), None);
        assert_eq!(ledger.completion_count(), 0);
        assert!(!ledger.clear_completion(ALICE));
    }

    #[test]
    fn stage_is_clamped() {
        let mut ledger = AscendancyLedger::new();
        ledger.set_stage(ALICE, 9);
        assert_eq!(ledger.stage(ALICE), MAX_STAGE);
        ledger.clear_stage(ALICE);
        assert_eq!(ledger.stage(ALICE), 0);
        assert_eq!(ledger.stage(BOB), 0, "absent player reads stage 0");
    }

    #[test]
    fn cooldown_expires_lazily_and_evicts() {
        let mut ledger = AscendancyLedger::new();
        ledger.set_cooldown(ALICE, 1_000, 500);

        assert!(ledger.is_on_cooldown(ALICE, 1_400));
        assert_eq!(ledger.cooldown_remaining(ALICE, 1_400), 100);

        assert!(!ledger.is_on_cooldown(ALICE, 1_500));
        // Entry was evicted by the expired query.
        assert_eq!(ledger.cooldown_remaining(ALICE, 1_500), 0);
        assert!(!ledger.is_on_cooldown(ALICE, 1_400));
    }

    #[test]
    fn dialogue_keys_compose_and_clear() {
        let mut ledger = AscendancyLedger::new();
        ledger.mark_dialogue_seen(ALICE, "treasure_hunter", "greeting");
        assert!(ledger.has_seen_dialogue(ALICE, "treasure_hunter", "greeting"));
        assert!(!ledger.has_seen_dialogue(ALICE, "treasure_hunter", "farewell"));
        assert!(!ledger.has_seen_dialogue(BOB, "treasure_hunter", "greeting"));

        assert!(ledger.clear_dialogue_line(ALICE, "treasure_hunter", "greeting"));
        assert!(!ledger.clear_dialogue_line(ALICE, "treasure_hunter", "greeting"));

        ledger.mark_dialogue_seen(ALICE, "a", "1");
        ledger.mark_dialogue_seen(BOB, "a", "1");
        ledger.clear_all_dialogue();
        assert!(!ledger.has_seen_dialogue(ALICE, "a", "1"));
        assert!(!ledger.has_seen_dialogue(BOB, "a", "1"));
    }

    #[test]
    fn dirty_flag_tracks_mutation() {
        let mut ledger = AscendancyLedger::new();
        assert!(!ledger.take_dirty());
        ledger.set_stage(ALICE, 2);
        assert!(ledger.take_dirty());
        assert!(!ledger.take_dirty());
    }

    #[test]
    fn cooldown_formatting() {
        assert_eq!(format_cooldown(30_000), "30 seconds");
        assert_eq!(format_cooldown(90_000), "1 minutes, 30 seconds");
        assert_eq!(format_cooldown(3_660_000), "1 hours, 1 minutes");
    }
}
