//! Hunt tuning constants, loadable from TOML with full defaults.

use runecove_core::BlockPos;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a loaded configuration is internally inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The per-axis digit arrays must spell out the destination coordinates.
    #[error("{axis} digits {digits:?} do not spell coordinate {coordinate}")]
    DigitMismatch {
        /// Axis name ("x", "y" or "z").
        axis: &'static str,
        /// Configured digit array.
        digits: Vec<u8>,
        /// Coordinate the digits must spell (absolute value).
        coordinate: i32,
    },
    /// Rune thresholds must be ordered and bounded by the rune total.
    #[error("rune thresholds {stage1}/{half}/{final_} invalid for {total} runes")]
    BadThresholds {
        /// Stage 1 threshold.
        stage1: u32,
        /// Half threshold.
        half: u32,
        /// Final threshold.
        final_: u32,
        /// Total rune count.
        total: u32,
    },
}

/// All hunt tunables. Defaults carry the shipped balance; a server can
/// override any subset from its config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// Battle victories needed to reveal one rune.
    pub kills_per_rune: u32,
    /// Total runes in the inscription ("xxxx yy zzzz" + trailing message).
    pub total_runes: u32,
    /// Revealed-rune count at which the orb leaves Empty.
    pub runes_for_stage1: u32,
    /// Revealed-rune count at which the orb is half filled.
    pub runes_for_half: u32,
    /// Revealed-rune count at which the orb is fully filled.
    pub runes_for_final: u32,

    /// Star puzzle: angular band (degrees) for the audio proximity cue.
    pub star_beep_range_deg: f32,
    /// Star puzzle: angular band for the "close" shadow reveal.
    pub star_close_range_deg: f32,
    /// Star puzzle: angular band for the exact reveal.
    pub star_exact_range_deg: f32,
    /// Star puzzle: pitch the player must match (looking up).
    pub star_target_pitch_deg: f32,
    /// Star puzzle: minimum upward pitch before the puzzle engages at all.
    pub star_min_pitch_deg: f32,
    /// Star puzzle: target yaw per digit position (NE, SE, SW, NW).
    pub star_target_yaws_deg: [f32; 4],

    /// Day length in ticks.
    pub ticks_per_day: u64,
    /// First tick of the night window (inclusive).
    pub night_start: u64,
    /// Last tick of the night window (inclusive).
    pub night_end: u64,

    /// Origin puzzle: outermost hum band, blocks from the origin column.
    pub origin_far_blocks: f64,
    /// Origin puzzle: middle hum band.
    pub origin_medium_blocks: f64,
    /// Origin puzzle: innermost hum band.
    pub origin_close_blocks: f64,

    /// Center of the trigger zone for the ritual.
    pub cove_pos: BlockPos,
    /// Trigger zone radius in blocks.
    pub cove_radius: i32,

    /// Length of the rising ritual animation in ticks.
    pub ritual_duration_ticks: u32,
    /// Total rise height of the orb over the ritual, in blocks.
    pub orb_rise_height: f64,
    /// Dropped quest items are gate-checked every this many ticks.
    pub trigger_sample_interval: u32,
    /// Player puzzle evaluation runs every this many ticks.
    pub puzzle_sample_interval: u64,

    /// Boss species key handed to the injected spawner.
    pub boss_species: String,
    /// Boss level handed to the injected spawner.
    pub boss_level: u8,
    /// Cooldown applied after a failed encounter, in milliseconds.
    pub failure_cooldown_ms: u64,

    /// X coordinate digits of the destination (most significant first).
    pub x_digits: [u8; 4],
    /// Y coordinate digits of the destination (sign is hinted separately).
    pub y_digits: [u8; 2],
    /// Z coordinate digits of the destination.
    pub z_digits: [u8; 4],
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            kills_per_rune: 1,
            total_runes: 18,
            runes_for_stage1: 1,
            runes_for_half: 10,
            runes_for_final: 18,
            star_beep_range_deg: 45.0,
            star_close_range_deg: 20.0,
            star_exact_range_deg: 10.0,
            star_target_pitch_deg: -60.0,
            star_min_pitch_deg: -30.0,
            star_target_yaws_deg: [45.0, 135.0, 225.0, 315.0],
            ticks_per_day: 24_000,
            night_start: 13_000,
            night_end: 23_000,
            origin_far_blocks: 100.0,
            origin_medium_blocks: 50.0,
            origin_close_blocks: 25.0,
            cove_pos: BlockPos::new(2889, -42, 2233),
            cove_radius: 50,
            ritual_duration_ticks: 100,
            orb_rise_height: 4.0,
            trigger_sample_interval: 10,
            puzzle_sample_interval: 5,
            boss_species: "kyogre".to_string(),
            boss_level: 70,
            failure_cooldown_ms: 5 * 60 * 60 * 1000,
            x_digits: [2, 8, 8, 9],
            y_digits: [4, 2],
            z_digits: [2, 2, 3, 3],
        }
    }
}

impl HuntConfig {
    /// Check internal consistency: digit arrays must spell the cove
    /// coordinates and the rune thresholds must be ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.runes_for_stage1 <= self.runes_for_half
            && self.runes_for_half <= self.runes_for_final
            && self.runes_for_final <= self.total_runes)
        {
            return Err(ConfigError::BadThresholds {
                stage1: self.runes_for_stage1,
                half: self.runes_for_half,
                final_: self.runes_for_final,
                total: self.total_runes,
            });
        }

        check_digits("x", &self.x_digits, self.cove_pos.x)?;
        check_digits("y", &self.y_digits, self.cove_pos.y)?;
        check_digits("z", &self.z_digits, self.cove_pos.z)?;
        Ok(())
    }

    /// Whether a day-cycle tick falls inside the night window.
    pub fn is_night(&self, day_time: u64) -> bool {
        let t = day_time % self.ticks_per_day;
        t >= self.night_start && t <= self.night_end
    }
}

fn check_digits(axis: &'static str, digits: &[u8], coordinate: i32) -> Result<(), ConfigError> {
    let spelled: i32 = digits.iter().fold(0, |acc, &d| acc * 10 + d as i32);
    if spelled != coordinate.abs() {
        return Err(ConfigError::DigitMismatch {
            axis,
            digits: digits.to_vec(),
            coordinate: coordinate.abs(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        HuntConfig::default().validate().unwrap();
    }

    #[test]
    fn digit_mismatch_is_rejected() {
        let mut config = HuntConfig::default();
        config.x_digits = [1, 2, 3, 4];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DigitMismatch { axis: "x", .. })
        ));
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let mut config = HuntConfig::default();
        config.runes_for_half = 19;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadThresholds { .. })
        ));
    }

    #[test]
    fn night_window_wraps_day_cycle() {
        let config = HuntConfig::default();
        assert!(!config.is_night(6_000));
        assert!(config.is_night(13_000));
        assert!(config.is_night(18_500));
        assert!(config.is_night(23_000));
        assert!(!config.is_night(23_500));
        // Second day, same window.
        assert!(config.is_night(24_000 + 14_000));
    }
}
