//! Per-tick coordinate puzzle evaluation.
//!
//! Two independent puzzles run while a player carries a fully filled orb:
//!
//! - **Star puzzle** (X digits): at night, the player must look toward a
//!   target direction selected by the lunar phase. Three concentric
//!   accuracy bands give an exact reveal, a close shadow reveal with an
//!   action-bar hint, or an accelerating proximity bell.
//! - **Origin puzzle** (Z digits): horizontal proximity to the world origin
//!   drives a four-tier hum; standing exactly at (0, 0, 0) reveals the
//!   whole Z coordinate at once.
//!
//! When both puzzles want the action bar in the same tick, the star
//! puzzle's "close" hint wins and the origin hint is suppressed.
//!
//! All rate limiting is tick-based. The per-player timestamps live on the
//! evaluator itself, constructed once at server start.

use crate::config::HuntConfig;
use crate::effects::{HuntEffect, SoundKind};
use crate::orb::{OrbData, OrbState};
use runecove_core::{BlockPos, PlayerId, SimTick};
use std::collections::BTreeMap;
use tracing::debug;

/// Minimum ticks between exact star reveals (2 s).
const STAR_EXACT_COOLDOWN: u64 = SimTick::from_millis(2_000);
/// Minimum ticks between close star triggers (500 ms).
const STAR_CLOSE_COOLDOWN: u64 = SimTick::from_millis(500);
/// Fastest proximity bell cadence (150 ms).
const BEEP_MIN_INTERVAL: u64 = SimTick::from_millis(150);
/// Cadence added at the edge of the beep band (600 ms span).
const BEEP_INTERVAL_SPAN: u64 = SimTick::from_millis(600);
/// Minimum ticks between origin reveals while standing still (10 s).
const ORIGIN_REVEAL_COOLDOWN: u64 = SimTick::from_millis(10_000);

/// Origin hum cadence per proximity tier (index 1..=3), in ticks.
const HUM_INTERVALS: [u64; 4] = [0, SimTick::from_millis(1_000), SimTick::from_millis(600), SimTick::from_millis(300)];
/// Origin hum volume per proximity tier.
const HUM_VOLUMES: [f32; 4] = [0.0, 0.6, 0.9, 1.2];
/// Origin hum pitch per proximity tier.
const HUM_PITCHES: [f32; 4] = [0.0, 0.4, 0.5, 0.7];

/// Read-only view of one player for a single evaluation tick.
#[derive(Debug, Clone, Copy)]
pub struct PlayerSnapshot {
    /// Player identity.
    pub id: PlayerId,
    /// Block position.
    pub pos: BlockPos,
    /// Horizontal look angle in degrees.
    pub yaw_deg: f32,
    /// Vertical look angle in degrees (negative = looking up).
    pub pitch_deg: f32,
}

/// Read-only sky state for a single evaluation tick.
#[derive(Debug, Clone, Copy)]
pub struct SkySnapshot {
    /// Ticks into the day cycle.
    pub day_time: u64,
    /// Lunar phase, 0..=7.
    pub moon_phase: u8,
}

/// Stateless puzzle rules plus per-player rate-limit bookkeeping.
#[derive(Debug, Default)]
pub struct PuzzleEvaluator {
    last_star_trigger: BTreeMap<PlayerId, SimTick>,
    last_origin_hum: BTreeMap<PlayerId, SimTick>,
    last_origin_reveal: BTreeMap<PlayerId, SimTick>,
}

impl PuzzleEvaluator {
    /// Fresh evaluator with no rate-limit history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate both puzzles for one player/orb pair. Reveals are written
    /// into `orb`; presentation cues are appended to `out`.
    pub fn evaluate(
        &mut self,
        config: &HuntConfig,
        player: &PlayerSnapshot,
        sky: &SkySnapshot,
        orb: &mut OrbData,
        now: SimTick,
        out: &mut Vec<HuntEffect>,
    ) {
        // Coordinate puzzles unlock only once the inscription is complete.
        if orb.state != OrbState::Final {
            return;
        }

        let star_close_active = self.star_puzzle(config, player, sky, orb, now, out);
        self.origin_puzzle(config, player, orb, now, star_close_active, out);
    }

    /// Drop rate-limit history for a departed player.
    pub fn forget_player(&mut self, player: PlayerId) {
        self.last_star_trigger.remove(&player);
        self.last_origin_hum.remove(&player);
        self.last_origin_reveal.remove(&player);
    }

    /// Returns true when the "close" hint occupies the action bar this tick.
    fn star_puzzle(
        &mut self,
        config: &HuntConfig,
        player: &PlayerSnapshot,
        sky: &SkySnapshot,
        orb: &mut OrbData,
        now: SimTick,
        out: &mut Vec<HuntEffect>,
    ) -> bool {
        if !config.is_night(sky.day_time) {
            return false;
        }
        if player.pitch_deg > config.star_min_pitch_deg {
            return false;
        }

        // The lunar phase (0..=7) selects which of the four digits is
        // currently findable.
        let digit_position = (sky.moon_phase / 2).min(3);
        if orb.x_digits.is_exact(digit_position) {
            return false;
        }

        let target_yaw = config.star_target_yaws_deg[digit_position as usize];
        let yaw_diff = angle_difference(normalize_angle(player.yaw_deg), normalize_angle(target_yaw)).abs();
        let pitch_diff = (player.pitch_deg - config.star_target_pitch_deg).abs();
        let accuracy = (yaw_diff + pitch_diff) / 2.0;

        let last = self.last_star_trigger.get(&player.id).copied();
        let elapsed = last.map(|t| now.since(t)).unwrap_or(u64::MAX);

        if accuracy < config.star_exact_range_deg {
            if elapsed > STAR_EXACT_COOLDOWN {
                orb.x_digits.reveal_exact(digit_position);
                self.last_star_trigger.insert(player.id, now);
                debug!(player = %player.id, digit_position, "star puzzle exact reveal");

                out.push(HuntEffect::sound(player.pos, SoundKind::StarChime, 1.5, 1.8));
                out.push(HuntEffect::sound(player.pos, SoundKind::RuneGlimmer, 1.0, 1.5));
                out.push(HuntEffect::Message {
                    player: player.id,
                    text: "✦ The stars align! The inscription on the orb becomes a little more clear. ✦".into(),
                });
            }
            false
        } else if accuracy < config.star_close_range_deg {
            if elapsed > STAR_CLOSE_COOLDOWN {
                orb.x_digits.reveal_close(digit_position);
                self.last_star_trigger.insert(player.id, now);
                out.push(HuntEffect::sound(player.pos, SoundKind::CloseChime, 0.8, 1.5));
            }
            // The hint shows every evaluation while in band, not just when
            // the reveal fires; it takes precedence over the origin hum.
            out.push(HuntEffect::ActionBar {
                player: player.id,
                text: "The orb shimmers happily. You must be close...".into(),
            });
            true
        } else if accuracy < config.star_beep_range_deg {
            let interval = beep_interval(accuracy, config.star_beep_range_deg);
            if elapsed > interval {
                let pitch = beep_pitch(accuracy, config.star_beep_range_deg);
                out.push(HuntEffect::sound(player.pos, SoundKind::SeekerBell, 0.9, pitch));
                self.last_star_trigger.insert(player.id, now);
            }
            false
        } else {
            false
        }
    }

    fn origin_puzzle(
        &mut self,
        config: &HuntConfig,
        player: &PlayerSnapshot,
        orb: &mut OrbData,
        now: SimTick,
        star_close_active: bool,
        out: &mut Vec<HuntEffect>,
    ) {
        let at_exact_origin = player.pos == BlockPos::new(0, 0, 0);
        let tier = proximity_tier(player.pos, config);

        // Transient display state: only rewritten when the tier changes.
        if orb.proximity != tier {
            orb.proximity = tier;
        }

        let hint = match tier {
            4 => Some("✦ The orb resonates with the origin ✦"),
            3 => Some("The orb hums even louder..."),
            2 => Some("The orb hums loudly..."),
            1 => Some("The orb hums softly..."),
            _ => None,
        };
        if let Some(text) = hint {
            if !star_close_active {
                out.push(HuntEffect::ActionBar {
                    player: player.id,
                    text: text.into(),
                });
            }
        }

        // Audio cadence for the three non-exact bands.
        if (1..=3).contains(&tier) {
            let tier_idx = tier as usize;
            let elapsed = self
                .last_origin_hum
                .get(&player.id)
                .map(|t| now.since(*t))
                .unwrap_or(u64::MAX);
            if elapsed > HUM_INTERVALS[tier_idx] {
                out.push(HuntEffect::sound(
                    player.pos,
                    SoundKind::OriginHum,
                    HUM_VOLUMES[tier_idx],
                    HUM_PITCHES[tier_idx],
                ));
                self.last_origin_hum.insert(player.id, now);
            }
        }

        if at_exact_origin {
            let elapsed = self
                .last_origin_reveal
                .get(&player.id)
                .map(|t| now.since(*t))
                .unwrap_or(u64::MAX);
            if elapsed > ORIGIN_REVEAL_COOLDOWN {
                self.reveal_z(player, orb, out);
                self.last_origin_reveal.insert(player.id, now);
            }
        }
    }

    fn reveal_z(&mut self, player: &PlayerSnapshot, orb: &mut OrbData, out: &mut Vec<HuntEffect>) {
        if orb.z_digits.all_exact() {
            // Already solved; acknowledge gently.
            out.push(HuntEffect::sound(player.pos, SoundKind::SoftConfirm, 0.5, 1.0));
            return;
        }

        debug!(player = %player.id, "origin puzzle revealed Z coordinate");
        out.push(HuntEffect::sound(player.pos, SoundKind::OriginFanfare, 1.5, 1.2));
        orb.reveal_all_z();
        out.push(HuntEffect::Message {
            player: player.id,
            text: "✦ The orb swirls with satisfaction. The inscription becomes ever clearer. ✦".into(),
        });
        out.push(HuntEffect::sound(player.pos, SoundKind::Triumph, 1.0, 1.0));
        out.push(HuntEffect::sound(player.pos, SoundKind::StarChime, 1.0, 1.5));
    }
}

/// Horizontal proximity tier: 0 = out of range, 1 = far, 2 = medium,
/// 3 = close, 4 = standing exactly at the origin block.
pub fn proximity_tier(pos: BlockPos, config: &HuntConfig) -> u8 {
    if pos == BlockPos::new(0, 0, 0) {
        return 4;
    }
    let distance = pos.horizontal_distance_to_origin();
    if distance <= config.origin_close_blocks {
        3
    } else if distance <= config.origin_medium_blocks {
        2
    } else if distance <= config.origin_far_blocks {
        1
    } else {
        0
    }
}

/// Bell cadence in ticks: linear between the min interval (dead-on) and
/// min + span (edge of the band).
fn beep_interval(accuracy: f32, beep_range: f32) -> u64 {
    let normalized = (accuracy / beep_range).clamp(0.0, 1.0) as f64;
    BEEP_MIN_INTERVAL + (normalized * BEEP_INTERVAL_SPAN as f64) as u64
}

/// Bell pitch: rises from 0.6 toward 1.8 as accuracy improves.
fn beep_pitch(accuracy: f32, beep_range: f32) -> f32 {
    0.6 + (1.0 - (accuracy / beep_range).clamp(0.0, 1.0)) * 1.2
}

/// Normalize an angle to [0, 360).
pub fn normalize_angle(mut angle: f32) -> f32 {
    angle %= 360.0;
    if angle < 0.0 {
        angle += 360.0;
    }
    angle
}

/// Shortest-path signed difference between two angles, in (-180, 180].
pub fn angle_difference(a: f32, b: f32) -> f32 {
    let mut diff = a - b;
    while diff > 180.0 {
        diff -= 360.0;
    }
    while diff < -180.0 {
        diff += 360.0;
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::SoundEffect;

    fn final_orb(config: &HuntConfig) -> OrbData {
        let mut orb = OrbData::new();
        for _ in 0..config.total_runes {
            orb.on_battle_won(config);
        }
        orb
    }

    fn snapshot(pos: BlockPos, yaw: f32, pitch: f32) -> PlayerSnapshot {
        PlayerSnapshot {
            id: PlayerId(1),
            pos,
            yaw_deg: yaw,
            pitch_deg: pitch,
        }
    }

    const NIGHT: SkySnapshot = SkySnapshot {
        day_time: 18_000,
        moon_phase: 0,
    };

    fn sounds(effects: &[HuntEffect]) -> Vec<SoundEffect> {
        effects
            .iter()
            .filter_map(|e| match e {
                HuntEffect::Sound { sound, .. } => Some(*sound),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn angle_helpers_wrap_correctly() {
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(725.0), 5.0);
        assert_eq!(angle_difference(350.0, 10.0), -20.0);
        assert_eq!(angle_difference(10.0, 350.0), 20.0);
    }

    #[test]
    fn puzzles_are_inert_before_final() {
        let config = HuntConfig::default();
        let mut evaluator = PuzzleEvaluator::new();
        let mut orb = OrbData::new();
        let mut out = Vec::new();

        let player = snapshot(BlockPos::new(0, 0, 0), 45.0, -60.0);
        evaluator.evaluate(&config, &player, &NIGHT, &mut orb, SimTick(100), &mut out);
        assert!(out.is_empty());
        assert!(!orb.z_digits.all_exact());
    }

    #[test]
    fn perfect_look_reveals_digit_exactly() {
        let config = HuntConfig::default();
        let mut evaluator = PuzzleEvaluator::new();
        let mut orb = final_orb(&config);
        let mut out = Vec::new();

        // Moon phase 0 selects digit 0, target yaw 45, target pitch -60.
        let player = snapshot(BlockPos::new(500, 64, 500), 45.0, -60.0);
        evaluator.evaluate(&config, &player, &NIGHT, &mut orb, SimTick(100), &mut out);

        assert!(orb.x_digits.is_exact(0));
        assert!(out
            .iter()
            .any(|e| matches!(e, HuntEffect::Message { .. })));
    }

    #[test]
    fn exact_reveal_is_rate_limited() {
        let config = HuntConfig::default();
        let mut evaluator = PuzzleEvaluator::new();
        let mut orb = final_orb(&config);
        let player = snapshot(BlockPos::new(500, 64, 500), 135.0, -60.0);
        let sky = SkySnapshot {
            day_time: 18_000,
            moon_phase: 2, // digit 1
        };

        let mut out = Vec::new();
        evaluator.evaluate(&config, &player, &sky, &mut orb, SimTick(100), &mut out);
        assert!(orb.x_digits.is_exact(1));

        // Same digit already revealed: the puzzle skips it entirely.
        let mut out2 = Vec::new();
        evaluator.evaluate(&config, &player, &sky, &mut orb, SimTick(105), &mut out2);
        assert!(sounds(&out2).is_empty());
    }

    #[test]
    fn close_band_sets_shadow_and_hint() {
        let config = HuntConfig::default();
        let mut evaluator = PuzzleEvaluator::new();
        let mut orb = final_orb(&config);
        let mut out = Vec::new();

        // 30 degrees off target yaw averages to accuracy 15: inside close
        // (20) but outside exact (10).
        let player = snapshot(BlockPos::new(500, 64, 500), 75.0, -60.0);
        evaluator.evaluate(&config, &player, &NIGHT, &mut orb, SimTick(100), &mut out);

        assert!(orb.x_digits.is_close(0));
        assert!(!orb.x_digits.is_exact(0));
        assert!(matches!(
            out.iter().find(|e| matches!(e, HuntEffect::ActionBar { .. })),
            Some(HuntEffect::ActionBar { text, .. }) if text.contains("close")
        ));
    }

    #[test]
    fn daytime_disables_star_puzzle() {
        let config = HuntConfig::default();
        let mut evaluator = PuzzleEvaluator::new();
        let mut orb = final_orb(&config);
        let mut out = Vec::new();

        let player = snapshot(BlockPos::new(500, 64, 500), 45.0, -60.0);
        let noon = SkySnapshot {
            day_time: 6_000,
            moon_phase: 0,
        };
        evaluator.evaluate(&config, &player, &noon, &mut orb, SimTick(100), &mut out);
        assert!(!orb.x_digits.is_exact(0));
        assert!(!orb.x_digits.is_close(0));
    }

    #[test]
    fn beep_cadence_tightens_with_accuracy() {
        let range = 45.0;
        assert_eq!(beep_interval(0.0, range), 3);
        assert_eq!(beep_interval(45.0, range), 15);
        assert!(beep_interval(10.0, range) < beep_interval(40.0, range));
        assert!(beep_pitch(5.0, range) > beep_pitch(40.0, range));
    }

    #[test]
    fn proximity_tiers_match_bands() {
        let config = HuntConfig::default();
        assert_eq!(proximity_tier(BlockPos::new(0, 0, 0), &config), 4);
        assert_eq!(proximity_tier(BlockPos::new(0, 64, 0), &config), 3);
        assert_eq!(proximity_tier(BlockPos::new(30, 64, 0), &config), 2);
        assert_eq!(proximity_tier(BlockPos::new(0, 64, 80), &config), 1);
        assert_eq!(proximity_tier(BlockPos::new(200, 64, 200), &config), 0);
    }

    #[test]
    fn standing_at_origin_reveals_z_once_per_window() {
        let config = HuntConfig::default();
        let mut evaluator = PuzzleEvaluator::new();
        let mut orb = final_orb(&config);
        let player = snapshot(BlockPos::new(0, 0, 0), 0.0, 0.0);

        let mut out = Vec::new();
        evaluator.evaluate(&config, &player, &NIGHT, &mut orb, SimTick(100), &mut out);
        assert!(orb.z_digits.all_exact());
        assert_eq!(orb.proximity, 4);
        let fanfares = sounds(&out)
            .iter()
            .filter(|s| s.kind == SoundKind::OriginFanfare)
            .count();
        assert_eq!(fanfares, 1);

        // Re-trigger inside the cooldown window: nothing further.
        let mut out2 = Vec::new();
        evaluator.evaluate(&config, &player, &NIGHT, &mut orb, SimTick(150), &mut out2);
        assert!(!sounds(&out2).iter().any(|s| s.kind == SoundKind::OriginFanfare));
        assert!(!sounds(&out2).iter().any(|s| s.kind == SoundKind::SoftConfirm));

        // Past the cooldown with Z already solved: soft confirmation only.
        let mut out3 = Vec::new();
        evaluator.evaluate(&config, &player, &NIGHT, &mut orb, SimTick(301), &mut out3);
        assert!(sounds(&out3).iter().any(|s| s.kind == SoundKind::SoftConfirm));
    }

    #[test]
    fn star_close_hint_suppresses_origin_hint() {
        let config = HuntConfig::default();
        let mut evaluator = PuzzleEvaluator::new();
        let mut orb = final_orb(&config);
        let mut out = Vec::new();

        // Close star band while inside the origin far band.
        let player = snapshot(BlockPos::new(60, 64, 0), 75.0, -60.0);
        evaluator.evaluate(&config, &player, &NIGHT, &mut orb, SimTick(100), &mut out);

        let hints: Vec<&str> = out
            .iter()
            .filter_map(|e| match e {
                HuntEffect::ActionBar { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(hints.len(), 1, "only the star hint may show: {hints:?}");
        assert!(hints[0].contains("close"));
        // Proximity display state still updates underneath.
        assert_eq!(orb.proximity, 1);
    }
}
