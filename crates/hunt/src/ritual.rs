//! Cove ritual: detecting a powered orb tossed into the cove waters and
//! animating its ascent until the encounter is handed off.
//!
//! The orchestrator watches dropped-item observations from the host. A
//! powered orb that lands submerged inside the cove radius is consumed and
//! replaced by a scripted rise: one hundred ticks of particles and swelling
//! audio, after which the orchestrator emits a [`RitualCompletion`] for the
//! encounter layer. One ritual per player; a second orb thrown mid-ritual
//! is ignored until the first resolves.

use crate::config::HuntConfig;
use crate::effects::{HuntEffect, ParticleBurst, ParticleKind, SoundKind};
use crate::ledger::AscendancyLedger;
use crate::orb::OrbData;
use runecove_core::{PlayerId, SimTick, Vec3, WorldItemId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Ticks a dropped item must settle before it is considered (lets the host
/// finish physics and ownership assignment).
const MIN_ITEM_AGE_TICKS: u32 = 10;
/// Cadence of the escalating ritual soundscape.
const RITUAL_CUE_INTERVAL_TICKS: u32 = 20;

/// Host-reported observation of one dropped item entity. Sampled, not
/// streamed; the orchestrator deduplicates via its processed set.
#[derive(Debug, Clone)]
pub struct WorldItemView {
    /// Stable id of the item entity.
    pub id: WorldItemId,
    /// Current entity position.
    pub pos: Vec3,
    /// Whether the entity is underwater.
    pub submerged: bool,
    /// The player who dropped it, if the host still knows.
    pub owner: Option<PlayerId>,
    /// Entity age in ticks.
    pub age_ticks: u32,
    /// Decoded item state.
    pub orb: OrbData,
}

/// One in-flight ritual.
#[derive(Debug, Clone)]
struct RitualContext {
    orb: OrbData,
    origin: Vec3,
    ticks: u32,
}

/// A ritual that ran to completion this tick; the encounter layer takes
/// over from here.
#[derive(Debug, Clone)]
pub struct RitualCompletion {
    /// The player whose orb powered the ritual.
    pub player: PlayerId,
    /// The consumed orb, carried through to the trophy on victory.
    pub orb: OrbData,
    /// Apex position of the risen orb.
    pub pos: Vec3,
}

/// Tracks in-flight rituals and the set of already-processed item entities.
#[derive(Debug, Default)]
pub struct RitualOrchestrator {
    active: BTreeMap<PlayerId, RitualContext>,
    processed_items: BTreeSet<WorldItemId>,
    last_tick: Option<SimTick>,
}

impl RitualOrchestrator {
    /// Orchestrator with no ritual in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this player has a ritual in flight.
    pub fn has_active(&self, player: PlayerId) -> bool {
        self.active.contains_key(&player)
    }

    /// Number of rituals currently in flight.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Consider one dropped-item observation. Returns true when the item
    /// started a ritual (and was consumed via an emitted effect).
    ///
    /// Gate order matters: item-scoped checks run before any per-player
    /// state is touched, and the item is marked processed the moment it
    /// qualifies so a re-observation of the same entity is inert.
    #[allow(clippy::too_many_arguments)]
    pub fn observe_item(
        &mut self,
        config: &HuntConfig,
        item: &WorldItemView,
        ledger: &mut AscendancyLedger,
        online: &BTreeSet<PlayerId>,
        engaged: impl Fn(PlayerId) -> bool,
        now_ms: u64,
        out: &mut Vec<HuntEffect>,
    ) -> bool {
        if self.processed_items.contains(&item.id) {
            return false;
        }
        if item.age_ticks < MIN_ITEM_AGE_TICKS {
            return false;
        }
        if !item.submerged {
            return false;
        }
        let cove: Vec3 = config.cove_pos.into();
        if item.pos.distance_to(cove) > f64::from(config.cove_radius) {
            return false;
        }
        if item.orb.is_trophy() || !item.orb.is_powered() {
            return false;
        }

        let Some(player) = item.owner else {
            debug!(item = %item.id, "powered orb with no traceable owner, leaving it");
            return false;
        };

        if ledger.has_completed(player) {
            self.processed_items.insert(item.id);
            out.push(HuntEffect::ConsumeWorldItem { item: item.id });
            out.push(HuntEffect::ReturnItem {
                player,
                orb: item.orb.clone(),
            });
            out.push(HuntEffect::Message {
                player,
                text: "The waters stay calm. The deep has already yielded to you.".into(),
            });
            return false;
        }
        if ledger.is_on_cooldown(player, now_ms) {
            self.processed_items.insert(item.id);
            out.push(HuntEffect::ConsumeWorldItem { item: item.id });
            out.push(HuntEffect::ReturnItem {
                player,
                orb: item.orb.clone(),
            });
            out.push(HuntEffect::Message {
                player,
                text: "The orb trembles, but the deep is not ready to stir again.".into(),
            });
            return false;
        }
        if !online.contains(&player) {
            return false;
        }
        if self.has_active(player) || engaged(player) {
            return false;
        }

        self.processed_items.insert(item.id);
        out.push(HuntEffect::ConsumeWorldItem { item: item.id });
        out.push(HuntEffect::Message {
            player,
            text: "The waters churn violently as an ancient power awakens...".into(),
        });
        out.push(HuntEffect::sound(
            item.pos.to_block(),
            SoundKind::RitualResonance,
            1.0,
            0.5,
        ));

        info!(player = %player, pos = ?item.pos, "cove ritual started");
        self.active.insert(
            player,
            RitualContext {
                orb: item.orb.clone(),
                origin: item.pos,
                ticks: 0,
            },
        );
        true
    }

    /// Advance all rituals by one tick. Idempotent within a tick: a second
    /// call with the same `now` does nothing.
    pub fn tick(
        &mut self,
        config: &HuntConfig,
        now: SimTick,
        online: &BTreeSet<PlayerId>,
        out: &mut Vec<HuntEffect>,
    ) -> Vec<RitualCompletion> {
        if self.last_tick == Some(now) {
            return Vec::new();
        }
        self.last_tick = Some(now);

        let mut completions = Vec::new();
        let mut finished = Vec::new();

        for (&player, ritual) in self.active.iter_mut() {
            if !online.contains(&player) {
                // Abandoned mid-rise: the orb goes back to its owner rather
                // than vanishing with the animation.
                info!(player = %player, "ritual abandoned, returning orb");
                out.push(HuntEffect::ReturnItem {
                    player,
                    orb: ritual.orb.clone(),
                });
                finished.push(player);
                continue;
            }

            ritual.ticks += 1;
            let progress = ritual.ticks as f64 / config.ritual_duration_ticks as f64;
            let pos = Vec3::new(
                ritual.origin.x,
                ritual.origin.y + config.orb_rise_height * progress,
                ritual.origin.z,
            );

            emit_rise_particles(pos, ritual.origin, progress, out);
            if ritual.ticks % RITUAL_CUE_INTERVAL_TICKS == 0 {
                emit_rise_audio(pos, progress, out);
            }

            if ritual.ticks >= config.ritual_duration_ticks {
                completions.push(RitualCompletion {
                    player,
                    orb: ritual.orb.clone(),
                    pos,
                });
                finished.push(player);
            }
        }

        for player in finished {
            self.active.remove(&player);
        }
        completions
    }

    /// Cancel a player's ritual, if any, returning their orb via an effect.
    pub fn cancel(&mut self, player: PlayerId, out: &mut Vec<HuntEffect>) -> bool {
        match self.active.remove(&player) {
            Some(ritual) => {
                out.push(HuntEffect::ReturnItem {
                    player,
                    orb: ritual.orb,
                });
                true
            }
            None => false,
        }
    }
}

fn emit_rise_particles(pos: Vec3, origin: Vec3, progress: f64, out: &mut Vec<HuntEffect>) {
    let flame_count = 5 + (progress * 20.0) as u32;
    out.push(HuntEffect::Particles(ParticleBurst {
        kind: ParticleKind::SoulFlame,
        pos,
        count: flame_count,
    }));
    out.push(HuntEffect::Particles(ParticleBurst {
        kind: ParticleKind::Sparkle,
        pos,
        count: (flame_count / 3).max(1),
    }));
    out.push(HuntEffect::Particles(ParticleBurst {
        kind: ParticleKind::Splash,
        pos: origin,
        count: 3,
    }));
    if progress > 0.5 {
        out.push(HuntEffect::Particles(ParticleBurst {
            kind: ParticleKind::BubbleColumn,
            pos: origin,
            count: 2,
        }));
    }
}

fn emit_rise_audio(pos: Vec3, progress: f64, out: &mut Vec<HuntEffect>) {
    let at = pos.to_block();
    if progress < 1.0 / 3.0 {
        out.push(HuntEffect::sound(
            at,
            SoundKind::RitualResonance,
            (0.5 + progress) as f32,
            (0.5 + 0.5 * progress) as f32,
        ));
    } else if progress < 2.0 / 3.0 {
        out.push(HuntEffect::sound(at, SoundKind::RitualHum, 1.0, 0.8));
        out.push(HuntEffect::sound(at, SoundKind::StarChime, 0.6, 1.2));
    } else {
        out.push(HuntEffect::sound(at, SoundKind::RitualSurge, 1.2, 0.9));
        out.push(HuntEffect::sound(at, SoundKind::ThunderSting, 0.5, 0.8));
        if progress > 0.9 {
            out.push(HuntEffect::sound(at, SoundKind::FinalOmen, 1.0, 0.7));
        }
    }
}
