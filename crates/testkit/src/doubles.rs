//! Scripted stand-ins for the host hooks the hunt service is built over.

use anyhow::bail;
use runecove_core::{BlockPos, EncounterId, PlayerId};
use runecove_hunt::{EncounterSpawner, MarkApplicator, SpawnError};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// One spawn the [`ScriptedSpawner`] performed.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRecord {
    /// Species key the service requested.
    pub species: String,
    /// Requested level.
    pub level: u8,
    /// Requested position.
    pub pos: BlockPos,
    /// Id handed back to the service.
    pub id: EncounterId,
}

/// Spawner double that hands out sequential ids and records every call.
/// Flip `fail_next` to script a spawn rejection.
#[derive(Debug, Default)]
pub struct ScriptedSpawner {
    next_id: u64,
    /// When set, the next spawn call fails and clears the flag.
    pub fail_next: bool,
    /// Every successful spawn, in call order.
    pub spawned: Vec<SpawnRecord>,
}

impl ScriptedSpawner {
    /// Fresh spawner with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle for tests that need to inspect the spawner after
    /// handing it to the service.
    pub fn shared() -> SharedSpawner {
        SharedSpawner(Rc::new(RefCell::new(Self::new())))
    }
}

impl EncounterSpawner for ScriptedSpawner {
    fn spawn(&mut self, species: &str, level: u8, pos: BlockPos) -> Result<EncounterId, SpawnError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(SpawnError::Rejected(pos));
        }
        self.next_id += 1;
        let id = EncounterId(self.next_id);
        self.spawned.push(SpawnRecord {
            species: species.to_string(),
            level,
            pos,
            id,
        });
        Ok(id)
    }
}

/// Cloneable handle over a [`ScriptedSpawner`]; the orphan rule forbids
/// implementing [`EncounterSpawner`] directly for `Rc<RefCell<_>>`.
#[derive(Debug, Clone)]
pub struct SharedSpawner(Rc<RefCell<ScriptedSpawner>>);

impl SharedSpawner {
    /// Immutable view of the wrapped spawner.
    pub fn borrow(&self) -> Ref<'_, ScriptedSpawner> {
        self.0.borrow()
    }

    /// Mutable view of the wrapped spawner.
    pub fn borrow_mut(&self) -> RefMut<'_, ScriptedSpawner> {
        self.0.borrow_mut()
    }
}

impl EncounterSpawner for SharedSpawner {
    fn spawn(&mut self, species: &str, level: u8, pos: BlockPos) -> Result<EncounterId, SpawnError> {
        self.0.borrow_mut().spawn(species, level, pos)
    }
}

/// Mark applicator double recording every branding call.
#[derive(Debug, Default)]
pub struct RecordingMarks {
    /// When set, every call fails (the service must tolerate this).
    pub fail: bool,
    /// Every successful branding, in call order.
    pub applied: Vec<(PlayerId, u32)>,
}

impl RecordingMarks {
    /// Fresh recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, mirroring [`ScriptedSpawner::shared`].
    pub fn shared() -> SharedMarks {
        SharedMarks(Rc::new(RefCell::new(Self::new())))
    }
}

impl MarkApplicator for RecordingMarks {
    fn apply_champion_mark(&mut self, player: PlayerId, placement: u32) -> anyhow::Result<()> {
        if self.fail {
            bail!("scripted mark failure");
        }
        self.applied.push((player, placement));
        Ok(())
    }
}

/// Cloneable handle over a [`RecordingMarks`], mirroring [`SharedSpawner`].
#[derive(Debug, Clone)]
pub struct SharedMarks(Rc<RefCell<RecordingMarks>>);

impl SharedMarks {
    /// Immutable view of the wrapped recorder.
    pub fn borrow(&self) -> Ref<'_, RecordingMarks> {
        self.0.borrow()
    }

    /// Mutable view of the wrapped recorder.
    pub fn borrow_mut(&self) -> RefMut<'_, RecordingMarks> {
        self.0.borrow_mut()
    }
}

impl MarkApplicator for SharedMarks {
    fn apply_champion_mark(&mut self, player: PlayerId, placement: u32) -> anyhow::Result<()> {
        self.0.borrow_mut().apply_champion_mark(player, placement)
    }
}
