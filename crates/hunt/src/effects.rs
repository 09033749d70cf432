//! Host-facing effect vocabulary.
//!
//! The hunt core never plays audio, renders particles, or mutates
//! inventories. Every operation appends [`HuntEffect`] values the host
//! engine translates into real side effects on its own tick. Effects are
//! serializable so headless runs can log them as JSONL.

use crate::orb::OrbData;
use runecove_core::{BlockPos, EncounterId, PlayerId, Vec3, WorldItemId};
use serde::{Deserialize, Serialize};

/// Timbre of an audio cue. Named for the role the sound plays rather than
/// any particular asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundKind {
    /// Bright chime on an exact star-puzzle reveal.
    StarChime,
    /// Sparkling reveal accent layered under chimes.
    RuneGlimmer,
    /// High chime for the "close" star band.
    CloseChime,
    /// Proximity bell whose cadence tightens with accuracy.
    SeekerBell,
    /// Low ambient hum near the origin.
    OriginHum,
    /// Fanfare when the origin reveals the Z coordinate.
    OriginFanfare,
    /// Level-up flourish layered on major reveals.
    Triumph,
    /// Soft confirmation when re-visiting an already-solved spot.
    SoftConfirm,
    /// Deep resonance opening the ritual.
    RitualResonance,
    /// Mid-ritual ambient swell.
    RitualHum,
    /// Late-ritual surge.
    RitualSurge,
    /// Distant thunder under the late ritual.
    ThunderSting,
    /// Ominous curse just before the encounter spawns.
    FinalOmen,
    /// Boss emergence roar.
    BossEmergence,
    /// Victory toast on hunt completion.
    VictoryToast,
    /// Celebration twinkle layered under the toast.
    VictoryTwinkle,
    /// Knell on a lost encounter.
    DefeatKnell,
}

/// One positional audio cue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundEffect {
    /// Which cue to play.
    pub kind: SoundKind,
    /// Linear volume scale.
    pub volume: f32,
    /// Playback pitch scale.
    pub pitch: f32,
}

impl SoundEffect {
    /// Cue at default volume and pitch.
    pub fn new(kind: SoundKind) -> Self {
        Self {
            kind,
            volume: 1.0,
            pitch: 1.0,
        }
    }

    /// Cue with explicit volume and pitch.
    pub fn scaled(kind: SoundKind, volume: f32, pitch: f32) -> Self {
        Self {
            kind,
            volume,
            pitch,
        }
    }
}

/// Particle families used by the ritual animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Mystical flames spiraling around the rising orb.
    SoulFlame,
    /// Sparkles accenting the spiral.
    Sparkle,
    /// Water splashes below the orb.
    Splash,
    /// Bubble column once the ritual passes its midpoint.
    BubbleColumn,
}

/// A burst of particles at a world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleBurst {
    /// Particle family.
    pub kind: ParticleKind,
    /// Emission center.
    pub pos: Vec3,
    /// Approximate particle count.
    pub count: u32,
}

/// A side effect the host must apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HuntEffect {
    /// Play a positional sound.
    Sound {
        /// Emission position.
        at: BlockPos,
        /// The cue.
        sound: SoundEffect,
    },
    /// Emit a particle burst.
    Particles(ParticleBurst),
    /// Transient action-bar hint for one player.
    ActionBar {
        /// Recipient.
        player: PlayerId,
        /// Hint text.
        text: String,
    },
    /// Chat message for one player.
    Message {
        /// Recipient.
        player: PlayerId,
        /// Message text.
        text: String,
    },
    /// Chat message for every connected player.
    Broadcast {
        /// Message text.
        text: String,
    },
    /// Put an orb into a player's inventory (drop in world on overflow).
    GiveItem {
        /// Recipient.
        player: PlayerId,
        /// Item state to materialize.
        orb: OrbData,
    },
    /// Hand an orb back to a player who may be offline; the host delivers
    /// it on reconnect.
    ReturnItem {
        /// Owner.
        player: PlayerId,
        /// Item state to materialize.
        orb: OrbData,
    },
    /// Remove a dropped item entity from the world.
    ConsumeWorldItem {
        /// The observed item entity.
        item: WorldItemId,
    },
    /// Remove a spawned encounter entity if still present.
    DespawnEncounter {
        /// The encounter entity.
        id: EncounterId,
    },
}

impl HuntEffect {
    /// Convenience constructor for a positional sound.
    pub fn sound(at: BlockPos, kind: SoundKind, volume: f32, pitch: f32) -> Self {
        HuntEffect::Sound {
            at,
            sound: SoundEffect::scaled(kind, volume, pitch),
        }
    }
}
