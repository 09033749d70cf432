#![warn(missing_docs)]
//! Deterministic testing surfaces: scripted host doubles, an event stream
//! sink, snapshot helpers, and a micro-simulation harness.

mod doubles;
mod metrics;
mod micro_simtest;
mod snapshot;

use anyhow::Result;
use runecove_core::SimTick;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub use doubles::*;
pub use metrics::*;
pub use micro_simtest::*;
pub use snapshot::*;

/// Primary event record captured by headless runs.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Simulation tick when the event occurred.
    pub tick: SimTick,
    /// Human-readable kind label.
    pub kind: &'a str,
    /// Free-form payload for smoke tests.
    pub payload: &'a str,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &EventRecord<'_>) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }

    /// Append any serializable value as one line.
    pub fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let line = serde_json::to_string(value)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn jsonl_sink_writes_one_line_per_event() {
        let path = std::env::temp_dir().join(format!(
            "hunt-events-{}.jsonl",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let mut sink = JsonlSink::create(&path).expect("sink create");
        sink.write(&EventRecord {
            tick: SimTick(1),
            kind: "ritual_started",
            payload: "player-1",
        })
        .expect("write succeeds");
        sink.write(&EventRecord {
            tick: SimTick(101),
            kind: "encounter_spawned",
            payload: "player-1",
        })
        .expect("write succeeds");

        let contents = std::fs::read_to_string(&path).expect("file readable");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("ritual_started"));
        std::fs::remove_file(&path).ok();
    }
}
