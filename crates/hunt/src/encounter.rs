//! Boss encounter lifecycle: spawning at the end of a ritual and
//! reconciling the outcome back into orbs and the ledger.
//!
//! Spawning is delegated to an injected [`EncounterSpawner`] so the core
//! never touches entity machinery. The reconciler keeps a registry of live
//! encounters keyed by the spawned entity id, plus the set of engaged
//! players; an engaged player's regular battle victories are routed here
//! instead of the rune-reveal path.

use crate::config::HuntConfig;
use crate::effects::{HuntEffect, SoundKind};
use crate::ledger::AscendancyLedger;
use crate::orb::OrbData;
use crate::ritual::RitualCompletion;
use runecove_core::{BlockPos, EncounterId, PlayerId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, info, warn};

/// Why an encounter could not be spawned.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The configured species key is unknown to the host.
    #[error("unknown encounter species {0:?}")]
    UnknownSpecies(String),
    /// The host refused the spawn position.
    #[error("spawn rejected at {0:?}")]
    Rejected(BlockPos),
}

/// Host hook that materializes a boss entity.
pub trait EncounterSpawner {
    /// Spawn one encounter entity and return its stable id.
    fn spawn(&mut self, species: &str, level: u8, pos: BlockPos) -> Result<EncounterId, SpawnError>;
}

/// Optional host hook that brands the captured boss with its placement.
pub trait MarkApplicator {
    /// Apply the champion mark for the given placement.
    fn apply_champion_mark(&mut self, player: PlayerId, placement: u32) -> anyhow::Result<()>;
}

/// How an encounter ended without a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterFailure {
    /// The player's team was defeated.
    Defeated,
    /// The player fled the battle.
    Fled,
    /// The player died in the world.
    PlayerDied,
    /// The player disconnected mid-encounter.
    Disconnected,
}

#[derive(Debug, Clone)]
struct EncounterContext {
    player: PlayerId,
    orb: OrbData,
    pos: BlockPos,
}

/// Live-encounter registry and outcome reconciliation.
#[derive(Debug, Default)]
pub struct EncounterReconciler {
    registry: BTreeMap<EncounterId, EncounterContext>,
    engaged: BTreeSet<PlayerId>,
}

impl EncounterReconciler {
    /// Reconciler with no live encounters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this player currently has a live encounter.
    pub fn is_engaged(&self, player: PlayerId) -> bool {
        self.engaged.contains(&player)
    }

    /// Spawn the boss for a completed ritual. On spawner failure the
    /// consumed orb is handed back so the player loses nothing.
    pub fn begin(
        &mut self,
        config: &HuntConfig,
        completion: RitualCompletion,
        spawner: &mut dyn EncounterSpawner,
        out: &mut Vec<HuntEffect>,
    ) {
        let pos = completion.pos.to_block();
        let id = match spawner.spawn(&config.boss_species, config.boss_level, pos) {
            Ok(id) => id,
            Err(err) => {
                error!(player = %completion.player, %err, "encounter spawn failed");
                out.push(HuntEffect::ReturnItem {
                    player: completion.player,
                    orb: completion.orb,
                });
                return;
            }
        };

        info!(player = %completion.player, encounter = %id, "boss encounter spawned");
        self.engaged.insert(completion.player);
        self.registry.insert(
            id,
            EncounterContext {
                player: completion.player,
                orb: completion.orb,
                pos,
            },
        );

        out.push(HuntEffect::sound(pos, SoundKind::BossEmergence, 2.0, 0.5));
        out.push(HuntEffect::sound(pos, SoundKind::FinalOmen, 1.5, 0.8));
        out.push(HuntEffect::Message {
            player: completion.player,
            text: "The deep answers your call. Prove yourself worthy of its crown!".into(),
        });
    }

    /// Reconcile a capture. Returns the player's placement when the capture
    /// closes one of our encounters; `None` when the species does not match
    /// or the player has no live encounter.
    ///
    /// First match wins: duplicate capture events for the same player are
    /// absorbed by the registry removal.
    #[allow(clippy::too_many_arguments)]
    pub fn on_capture(
        &mut self,
        player: PlayerId,
        species: &str,
        ledger: &mut AscendancyLedger,
        mark: Option<&mut (dyn MarkApplicator + 'static)>,
        now_ms: u64,
        config: &HuntConfig,
        out: &mut Vec<HuntEffect>,
    ) -> Option<u32> {
        if !species.eq_ignore_ascii_case(&config.boss_species) {
            return None;
        }
        let id = self
            .registry
            .iter()
            .find(|(_, ctx)| ctx.player == player)
            .map(|(id, _)| *id)?;
        let ctx = match self.registry.remove(&id) {
            Some(ctx) => ctx,
            None => return None,
        };
        self.engaged.remove(&player);

        let placement = ledger.record_completion(player, now_ms);
        info!(player = %player, placement, "hunt completed");

        let mut trophy = ctx.orb;
        trophy.edition = Some(placement);
        out.push(HuntEffect::GiveItem {
            player,
            orb: trophy,
        });

        match mark {
            Some(applicator) => {
                if let Err(err) = applicator.apply_champion_mark(player, placement) {
                    warn!(player = %player, %err, "champion mark could not be applied");
                }
                out.push(HuntEffect::Message {
                    player,
                    text: format!(
                        "Your orb and your champion now bear the mark of the {} ascendant.",
                        ordinal(placement)
                    ),
                });
            }
            None => {
                out.push(HuntEffect::Message {
                    player,
                    text: "The deep remembers your triumph, even if it leaves no mark.".into(),
                });
            }
        }

        out.push(HuntEffect::sound(ctx.pos, SoundKind::VictoryToast, 1.0, 1.0));
        out.push(HuntEffect::sound(ctx.pos, SoundKind::VictoryTwinkle, 1.0, 1.2));
        out.push(HuntEffect::Broadcast {
            text: format!(
                "A hunter has claimed the crown of the deep, {} to do so!",
                ordinal(placement)
            ),
        });

        Some(placement)
    }

    /// Reconcile a failed encounter. The player's orb is replaced with a
    /// fresh one, the boss entity is despawned, and a retry cooldown is
    /// applied. Returns false when the player had no live encounter.
    pub fn fail(
        &mut self,
        player: PlayerId,
        reason: EncounterFailure,
        ledger: &mut AscendancyLedger,
        now_ms: u64,
        config: &HuntConfig,
        out: &mut Vec<HuntEffect>,
    ) -> bool {
        let id = match self
            .registry
            .iter()
            .find(|(_, ctx)| ctx.player == player)
            .map(|(id, _)| *id)
        {
            Some(id) => id,
            None => return false,
        };
        let ctx = match self.registry.remove(&id) {
            Some(ctx) => ctx,
            None => return false,
        };
        self.engaged.remove(&player);

        info!(player = %player, ?reason, "encounter failed, orb reset");
        ledger.set_cooldown(player, now_ms, config.failure_cooldown_ms);

        out.push(HuntEffect::DespawnEncounter { id });
        out.push(HuntEffect::ReturnItem {
            player,
            orb: OrbData::new(),
        });
        out.push(HuntEffect::Message {
            player,
            text: "The ancient power slips away, and the orb's inscription fades to nothing...".into(),
        });
        out.push(HuntEffect::Message {
            player,
            text: "You must begin the hunt anew.".into(),
        });
        out.push(HuntEffect::sound(ctx.pos, SoundKind::DefeatKnell, 0.8, 0.5));
        true
    }
}

/// English ordinal ("1st", "2nd", "3rd", "11th", ...).
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
