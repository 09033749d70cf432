//! Typed quest-item state for the mysterious orb.
//!
//! One [`OrbData`] corresponds to one physical item stack. The host persists
//! it through the component-bag adapter in [`crate::components`]; all logic
//! in this crate operates on the typed struct only.

use crate::config::HuntConfig;
use crate::encoding::{DigitMask, RuneMask};
use serde::{Deserialize, Serialize};

/// Width of the X coordinate digit mask.
pub const X_DIGIT_COUNT: u8 = 4;
/// Width of the Y coordinate digit mask.
pub const Y_DIGIT_COUNT: u8 = 2;
/// Width of the Z coordinate digit mask.
pub const Z_DIGIT_COUNT: u8 = 4;

/// Fill state of the orb. Monotonically non-decreasing except on an
/// explicit full reset, and derived entirely from the revealed-rune count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum OrbState {
    /// Freshly traded, nothing revealed.
    #[default]
    Empty,
    /// First rune revealed.
    Stage1,
    /// Coordinate half of the inscription complete.
    Half,
    /// Entire inscription revealed; coordinate puzzles unlock.
    Final,
}

impl OrbState {
    /// Derive the state from a revealed-rune count against the configured
    /// thresholds.
    pub fn from_rune_count(count: u32, config: &HuntConfig) -> Self {
        if count >= config.runes_for_final {
            OrbState::Final
        } else if count >= config.runes_for_half {
            OrbState::Half
        } else if count >= config.runes_for_stage1 {
            OrbState::Stage1
        } else {
            OrbState::Empty
        }
    }

    /// Stable integer value for persistence.
    pub fn to_value(self) -> i64 {
        match self {
            OrbState::Empty => 0,
            OrbState::Stage1 => 1,
            OrbState::Half => 2,
            OrbState::Final => 3,
        }
    }

    /// Inverse of [`OrbState::to_value`]; unknown values decode as Empty.
    pub fn from_value(value: i64) -> Self {
        match value {
            1 => OrbState::Stage1,
            2 => OrbState::Half,
            3 => OrbState::Final,
            _ => OrbState::Empty,
        }
    }
}

/// Result of a qualifying battle victory that revealed a new rune.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuneReveal {
    /// Revealed-rune count after this reveal.
    pub revealed: u32,
    /// Configured rune total, for progress messaging.
    pub total: u32,
    /// New state if the reveal crossed a threshold.
    pub state_change: Option<OrbState>,
}

/// Full persisted state of one orb instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbData {
    /// Fill state, derived from the rune mask.
    pub state: OrbState,
    /// Victories since the last rune reveal.
    pub kill_count: u32,
    /// Which inscription runes are unscrambled.
    pub runes: RuneMask,
    /// X coordinate reveal mask (4 digits + shadow hints).
    pub x_digits: DigitMask,
    /// Y coordinate reveal mask (2 digits).
    pub y_digits: DigitMask,
    /// Z coordinate reveal mask (4 digits).
    pub z_digits: DigitMask,
    /// Transient origin-proximity tier (0-4), recomputed every tick and
    /// kept only for display coloring.
    pub proximity: u8,
    /// Hidden Y-coordinate hint, set exactly once when the orb fills.
    pub fathom_mark: Option<String>,
    /// Completion placement; present only on trophy orbs.
    pub edition: Option<u32>,
}

impl Default for OrbData {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbData {
    /// A never-touched orb.
    pub fn new() -> Self {
        Self {
            state: OrbState::Empty,
            kill_count: 0,
            runes: RuneMask::new(),
            x_digits: DigitMask::new(X_DIGIT_COUNT),
            y_digits: DigitMask::new(Y_DIGIT_COUNT),
            z_digits: DigitMask::new(Z_DIGIT_COUNT),
            proximity: 0,
            fathom_mark: None,
            edition: None,
        }
    }

    /// Record a qualifying battle victory. Increments the kill counter and,
    /// once the per-rune threshold is met, resets it and reveals the next
    /// rune in index order, recomputing the state.
    ///
    /// No-op returning `None` once the orb is Final: further victories
    /// never matter again.
    pub fn on_battle_won(&mut self, config: &HuntConfig) -> Option<RuneReveal> {
        if self.state == OrbState::Final {
            return None;
        }

        self.kill_count += 1;
        if self.kill_count < config.kills_per_rune {
            return None;
        }
        self.kill_count = 0;

        self.runes.reveal_next(config.total_runes)?;
        let revealed = self.runes.revealed_count();

        let new_state = OrbState::from_rune_count(revealed, config);
        let state_change = (new_state != self.state).then_some(new_state);
        self.state = new_state;

        if new_state == OrbState::Final && self.fathom_mark.is_none() {
            // Cryptic Y hint: a dozen fathoms down ("II" = 12, "below" = negative).
            self.fathom_mark = Some("II below".to_string());
        }

        Some(RuneReveal {
            revealed,
            total: config.total_runes,
            state_change,
        })
    }

    /// Apply a star-puzzle reveal to one X digit position. Pure data
    /// mutation; the caller gates on orb state.
    pub fn reveal_x_digit(&mut self, position: u8, exact: bool) {
        if exact {
            self.x_digits.reveal_exact(position);
        } else {
            self.x_digits.reveal_close(position);
        }
    }

    /// Reveal one Y digit position exactly.
    pub fn reveal_y_digit(&mut self, position: u8) {
        self.y_digits.reveal_exact(position);
    }

    /// Reveal every Z digit at once (standing at the origin).
    pub fn reveal_all_z(&mut self) {
        self.z_digits.reveal_all();
    }

    /// Ritual eligibility: the orb is fully filled and both the X and Z
    /// coordinates are exactly revealed.
    pub fn is_powered(&self) -> bool {
        self.state == OrbState::Final && self.x_digits.all_exact() && self.z_digits.all_exact()
    }

    /// Whether this orb is a completed trophy (immutable terminal state).
    pub fn is_trophy(&self) -> bool {
        self.edition.is_some()
    }

    /// Full rollback to the never-touched state. The only path by which
    /// state regresses.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_orb_is_empty_and_unpowered() {
        let orb = OrbData::new();
        assert_eq!(orb.state, OrbState::Empty);
        assert!(!orb.is_powered());
        assert!(!orb.is_trophy());
    }

    #[test]
    fn first_victory_reveals_rune_and_reaches_stage1() {
        let config = HuntConfig::default();
        let mut orb = OrbData::new();

        let reveal = orb.on_battle_won(&config).expect("threshold of 1 reveals");
        assert_eq!(reveal.revealed, 1);
        assert_eq!(reveal.state_change, Some(OrbState::Stage1));
        assert_eq!(orb.kill_count, 0);
        assert_eq!(orb.runes.revealed_count(), 1);
    }

    #[test]
    fn victories_below_threshold_only_count() {
        let mut config = HuntConfig::default();
        config.kills_per_rune = 3;
        let mut orb = OrbData::new();

        assert!(orb.on_battle_won(&config).is_none());
        assert!(orb.on_battle_won(&config).is_none());
        assert_eq!(orb.kill_count, 2);

        let reveal = orb.on_battle_won(&config).unwrap();
        assert_eq!(reveal.revealed, 1);
        assert_eq!(orb.kill_count, 0);
    }

    #[test]
    fn state_progression_follows_thresholds() {
        let config = HuntConfig::default();
        let mut orb = OrbData::new();

        let mut states = Vec::new();
        for _ in 0..config.total_runes {
            if let Some(reveal) = orb.on_battle_won(&config) {
                if let Some(state) = reveal.state_change {
                    states.push((reveal.revealed, state));
                }
            }
        }

        assert_eq!(
            states,
            vec![
                (1, OrbState::Stage1),
                (10, OrbState::Half),
                (18, OrbState::Final),
            ]
        );
        assert_eq!(orb.fathom_mark.as_deref(), Some("II below"));
    }

    #[test]
    fn final_orb_ignores_further_victories() {
        let config = HuntConfig::default();
        let mut orb = OrbData::new();
        for _ in 0..config.total_runes {
            orb.on_battle_won(&config);
        }
        assert_eq!(orb.state, OrbState::Final);

        let before = orb.clone();
        assert!(orb.on_battle_won(&config).is_none());
        assert_eq!(orb, before, "final orb must not mutate");
    }

    #[test]
    fn powered_requires_final_and_both_axes() {
        let config = HuntConfig::default();
        let mut orb = OrbData::new();

        // X and Z revealed but not Final: not powered.
        orb.x_digits.reveal_all();
        orb.z_digits.reveal_all();
        assert!(!orb.is_powered());

        for _ in 0..config.total_runes {
            orb.on_battle_won(&config);
        }
        assert!(orb.is_powered());

        // Final but a Z digit only close-revealed: not powered.
        let mut partial = OrbData::new();
        for _ in 0..config.total_runes {
            partial.on_battle_won(&config);
        }
        partial.x_digits.reveal_all();
        for position in 0..3 {
            partial.z_digits.reveal_exact(position);
        }
        partial.z_digits.reveal_close(3);
        assert!(!partial.is_powered());
    }

    #[test]
    fn reset_zeroes_everything() {
        let config = HuntConfig::default();
        let mut orb = OrbData::new();
        for _ in 0..config.total_runes {
            orb.on_battle_won(&config);
        }
        orb.reveal_x_digit(0, true);
        orb.proximity = 3;

        orb.reset();
        assert_eq!(orb, OrbData::new());
    }

    #[test]
    fn state_value_roundtrip() {
        for state in [OrbState::Empty, OrbState::Stage1, OrbState::Half, OrbState::Final] {
            assert_eq!(OrbState::from_value(state.to_value()), state);
        }
        assert_eq!(OrbState::from_value(99), OrbState::Empty);
    }
}
