//! Single entry point the host embeds: owns the config, the ledger, and
//! all three stage machines, and exposes one method per host event.
//!
//! There is no global state anywhere in the crate. A server constructs one
//! [`HuntService`] at startup, feeds it events and tick snapshots, applies
//! the returned effects, and persists the ledger when it reports dirty.

use crate::config::{ConfigError, HuntConfig};
use crate::effects::{HuntEffect, SoundKind};
use crate::encounter::{EncounterFailure, EncounterReconciler, EncounterSpawner, MarkApplicator};
use crate::ledger::AscendancyLedger;
use crate::orb::{OrbData, OrbState};
use crate::puzzle::{PlayerSnapshot, PuzzleEvaluator, SkySnapshot};
use crate::ritual::{RitualOrchestrator, WorldItemView};
use runecove_core::{BlockPos, PlayerId, SimTick};
use std::collections::BTreeSet;
use tracing::info;

/// The hunt subsystem as one embeddable service.
pub struct HuntService {
    config: HuntConfig,
    ledger: AscendancyLedger,
    puzzles: PuzzleEvaluator,
    rituals: RitualOrchestrator,
    encounters: EncounterReconciler,
    spawner: Box<dyn EncounterSpawner>,
    marks: Option<Box<dyn MarkApplicator>>,
}

impl HuntService {
    /// Build the service, validating the configuration up front. The mark
    /// applicator is optional: without one, completions still record but
    /// the champion goes unbranded.
    pub fn new(
        config: HuntConfig,
        spawner: Box<dyn EncounterSpawner>,
        marks: Option<Box<dyn MarkApplicator>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ledger: AscendancyLedger::new(),
            puzzles: PuzzleEvaluator::new(),
            rituals: RitualOrchestrator::new(),
            encounters: EncounterReconciler::new(),
            spawner,
            marks,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &HuntConfig {
        &self.config
    }

    /// Read access to the ascendancy ledger.
    pub fn ledger(&self) -> &AscendancyLedger {
        &self.ledger
    }

    /// Mutable ledger access, for persistence restore and admin commands.
    pub fn ledger_mut(&mut self) -> &mut AscendancyLedger {
        &mut self.ledger
    }

    /// Whether this player has a ritual or encounter in flight.
    pub fn is_busy(&self, player: PlayerId) -> bool {
        self.rituals.has_active(player) || self.encounters.is_engaged(player)
    }

    /// Handle a battle victory. For an engaged player this is a knockout
    /// of the boss, which fails the hunt; capture is the only winning
    /// outcome. Otherwise the victory feeds the carried orb's rune
    /// progression.
    pub fn on_battle_victory(
        &mut self,
        player: PlayerId,
        orb: Option<&mut OrbData>,
        pos: BlockPos,
        now_ms: u64,
    ) -> Vec<HuntEffect> {
        let mut out = Vec::new();

        if self.encounters.is_engaged(player) {
            self.encounters.fail(
                player,
                EncounterFailure::Defeated,
                &mut self.ledger,
                now_ms,
                &self.config,
                &mut out,
            );
            return out;
        }

        let Some(orb) = orb else {
            return out;
        };
        let Some(reveal) = orb.on_battle_won(&self.config) else {
            return out;
        };

        out.push(HuntEffect::sound(pos, SoundKind::RuneGlimmer, 1.0, 1.2));
        out.push(HuntEffect::Message {
            player,
            text: format!(
                "A new rune materializes within the orb... ({}/{})",
                reveal.revealed, reveal.total
            ),
        });

        match reveal.state_change {
            Some(OrbState::Stage1) => out.push(HuntEffect::Message {
                player,
                text: "The orb begins to stir with faint light...".into(),
            }),
            Some(OrbState::Half) => out.push(HuntEffect::Message {
                player,
                text: "The orb is now halfway filled! Its inscription sharpens.".into(),
            }),
            Some(OrbState::Final) => {
                out.push(HuntEffect::Message {
                    player,
                    text: "✦ The orb blazes with complete radiance! The runes have aligned! ✦".into(),
                });
                out.push(HuntEffect::sound(pos, SoundKind::VictoryToast, 1.0, 1.0));
                info!(player = %player, "orb fully filled");
            }
            _ => {}
        }
        out
    }

    /// Per-player puzzle evaluation, sampled every few ticks.
    pub fn player_tick(
        &mut self,
        player: &PlayerSnapshot,
        sky: &SkySnapshot,
        orb: &mut OrbData,
        now: SimTick,
    ) -> Vec<HuntEffect> {
        let mut out = Vec::new();
        if now.0 % self.config.puzzle_sample_interval != 0 {
            return out;
        }
        self.puzzles
            .evaluate(&self.config, player, sky, orb, now, &mut out);
        out
    }

    /// Feed one dropped-item observation to the ritual trigger.
    pub fn observe_world_item(
        &mut self,
        item: &WorldItemView,
        online: &BTreeSet<PlayerId>,
        now_ms: u64,
    ) -> Vec<HuntEffect> {
        let mut out = Vec::new();
        if item.age_ticks % self.config.trigger_sample_interval != 0 {
            return out;
        }
        let encounters = &self.encounters;
        self.rituals.observe_item(
            &self.config,
            item,
            &mut self.ledger,
            online,
            |p| encounters.is_engaged(p),
            now_ms,
            &mut out,
        );
        out
    }

    /// Advance the world by one tick: rituals progress, and each completed
    /// ritual hands off to a boss spawn.
    pub fn tick(
        &mut self,
        now: SimTick,
        online: &BTreeSet<PlayerId>,
        _now_ms: u64,
    ) -> Vec<HuntEffect> {
        let mut out = Vec::new();
        let completions = self.rituals.tick(&self.config, now, online, &mut out);
        for completion in completions {
            self.encounters
                .begin(&self.config, completion, self.spawner.as_mut(), &mut out);
        }
        out
    }

    /// Handle a capture event from the host's battle system.
    pub fn on_capture(&mut self, player: PlayerId, species: &str, now_ms: u64) -> Vec<HuntEffect> {
        let mut out = Vec::new();
        self.encounters.on_capture(
            player,
            species,
            &mut self.ledger,
            self.marks.as_deref_mut(),
            now_ms,
            &self.config,
            &mut out,
        );
        out
    }

    /// The engaged player's team was wiped out.
    pub fn on_battle_defeat(&mut self, player: PlayerId, now_ms: u64) -> Vec<HuntEffect> {
        self.fail_encounter(player, EncounterFailure::Defeated, now_ms)
    }

    /// The engaged player fled the boss battle.
    pub fn on_battle_fled(&mut self, player: PlayerId, now_ms: u64) -> Vec<HuntEffect> {
        self.fail_encounter(player, EncounterFailure::Fled, now_ms)
    }

    /// The engaged player died in the world.
    pub fn on_player_death(&mut self, player: PlayerId, now_ms: u64) -> Vec<HuntEffect> {
        self.fail_encounter(player, EncounterFailure::PlayerDied, now_ms)
    }

    /// A player disconnected. Fails any live encounter and drops the
    /// puzzle rate-limit history; an in-flight ritual resolves on the next
    /// tick via the online roster.
    pub fn on_player_disconnect(&mut self, player: PlayerId, now_ms: u64) -> Vec<HuntEffect> {
        self.puzzles.forget_player(player);
        self.fail_encounter(player, EncounterFailure::Disconnected, now_ms)
    }

    fn fail_encounter(
        &mut self,
        player: PlayerId,
        reason: EncounterFailure,
        now_ms: u64,
    ) -> Vec<HuntEffect> {
        let mut out = Vec::new();
        self.encounters.fail(
            player,
            reason,
            &mut self.ledger,
            now_ms,
            &self.config,
            &mut out,
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::SpawnError;
    use runecove_core::{EncounterId, WorldItemId};

    struct CountingSpawner {
        spawned: u64,
    }

    impl EncounterSpawner for CountingSpawner {
        fn spawn(&mut self, _species: &str, _level: u8, _pos: BlockPos) -> Result<EncounterId, SpawnError> {
            self.spawned += 1;
            Ok(EncounterId(self.spawned))
        }
    }

    fn service() -> HuntService {
        HuntService::new(
            HuntConfig::default(),
            Box::new(CountingSpawner { spawned: 0 }),
            None,
        )
        .unwrap()
    }

    fn powered_orb(config: &HuntConfig) -> OrbData {
        let mut orb = OrbData::new();
        for _ in 0..config.total_runes {
            orb.on_battle_won(config);
        }
        orb.x_digits.reveal_all();
        orb.z_digits.reveal_all();
        orb
    }

    fn run_full_hunt(service: &mut HuntService, player: PlayerId) {
        let config = service.config().clone();
        let orb = powered_orb(&config);
        let online: BTreeSet<PlayerId> = [player].into();
        let item = WorldItemView {
            id: WorldItemId(player.0),
            pos: config.cove_pos.into(),
            submerged: true,
            owner: Some(player),
            age_ticks: 20,
            orb,
        };
        let effects = service.observe_world_item(&item, &online, 0);
        assert!(
            effects.iter().any(|e| matches!(e, HuntEffect::ConsumeWorldItem { .. })),
            "ritual should start: {effects:?}"
        );
        for tick in 1..=u64::from(config.ritual_duration_ticks) {
            service.tick(SimTick(tick), &online, 0);
        }
        assert!(service.encounters.is_engaged(player));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = HuntConfig::default();
        config.z_digits = [9, 9, 9, 9];
        let result = HuntService::new(config, Box::new(CountingSpawner { spawned: 0 }), None);
        assert!(result.is_err());
    }

    #[test]
    fn victories_progress_a_carried_orb() {
        let mut service = service();
        let player = PlayerId(1);
        let mut orb = OrbData::new();
        let pos = BlockPos::new(0, 64, 0);

        let effects = service.on_battle_victory(player, Some(&mut orb), pos, 0);
        assert_eq!(orb.state, OrbState::Stage1);
        assert!(effects
            .iter()
            .any(|e| matches!(e, HuntEffect::Message { text, .. } if text.contains("(1/18)"))));
    }

    #[test]
    fn victory_without_orb_is_inert() {
        let mut service = service();
        let effects = service.on_battle_victory(PlayerId(1), None, BlockPos::default(), 0);
        assert!(effects.is_empty());
    }

    #[test]
    fn full_pipeline_ritual_to_capture() {
        let mut service = service();
        let player = PlayerId(1);
        run_full_hunt(&mut service, player);

        let effects = service.on_capture(player, "kyogre", 5_000);
        assert!(service.ledger().has_completed(player));
        assert_eq!(service.ledger().placement_of(player), 1);
        assert!(effects.iter().any(|e| matches!(e, HuntEffect::Broadcast { .. })));
    }

    #[test]
    fn knockout_of_the_boss_fails_the_hunt() {
        let mut service = service();
        let player = PlayerId(1);
        run_full_hunt(&mut service, player);

        // While engaged, a battle victory means the boss was knocked out.
        let effects = service.on_battle_victory(player, None, BlockPos::default(), 1_000);
        assert!(!service.encounters.is_engaged(player));
        assert!(!service.ledger().has_completed(player));
        assert!(service.ledger_mut().is_on_cooldown(player, 2_000));
        assert!(effects
            .iter()
            .any(|e| matches!(e, HuntEffect::ReturnItem { orb, .. } if *orb == OrbData::new())));
    }

    #[test]
    fn disconnect_fails_a_live_encounter() {
        let mut service = service();
        let player = PlayerId(1);
        run_full_hunt(&mut service, player);

        let effects = service.on_player_disconnect(player, 0);
        assert!(!service.is_busy(player));
        assert!(effects.iter().any(|e| matches!(e, HuntEffect::DespawnEncounter { .. })));
    }

    #[test]
    fn puzzle_sampling_respects_interval() {
        let mut service = service();
        let config = service.config().clone();
        let mut orb = powered_orb(&config);
        orb.x_digits = crate::encoding::DigitMask::new(4);
        let snapshot = PlayerSnapshot {
            id: PlayerId(1),
            pos: BlockPos::new(500, 64, 500),
            yaw_deg: 45.0,
            pitch_deg: -60.0,
        };
        let sky = SkySnapshot {
            day_time: 18_000,
            moon_phase: 0,
        };

        // Off-interval tick: nothing happens.
        let effects = service.player_tick(&snapshot, &sky, &mut orb, SimTick(7));
        assert!(effects.is_empty());
        assert!(!orb.x_digits.is_exact(0));

        // On-interval tick: the star puzzle fires.
        let effects = service.player_tick(&snapshot, &sky, &mut orb, SimTick(10));
        assert!(!effects.is_empty());
        assert!(orb.x_digits.is_exact(0));
    }

    #[test]
    fn off_interval_item_observations_are_skipped() {
        let mut service = service();
        let config = service.config().clone();
        let player = PlayerId(1);
        let online: BTreeSet<PlayerId> = [player].into();
        let mut item = WorldItemView {
            id: WorldItemId(1),
            pos: config.cove_pos.into(),
            submerged: true,
            owner: Some(player),
            age_ticks: 23,
            orb: powered_orb(&config),
        };

        assert!(service.observe_world_item(&item, &online, 0).is_empty());
        item.age_ticks = 30;
        assert!(!service.observe_world_item(&item, &online, 0).is_empty());
    }
}
