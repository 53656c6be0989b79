//! Tick-based replay capture for determinism checks.
//!
//! A replay steps some state for a fixed number of ticks and snapshots it after
//! every step. Two replays of the same seeded run must serialize to identical
//! canonical JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use voxstream_core::SimTick;

/// Single snapshot frame captured at a given tick.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayFrame<S> {
    /// Tick number.
    pub tick: u64,
    /// Snapshot payload.
    pub snapshot: S,
}

/// Named sequence of frames.
#[derive(Debug, Clone, Serialize)]
pub struct Replay<S> {
    /// Human-readable name.
    pub name: String,
    /// Frames in tick order, starting with tick 0.
    pub frames: Vec<ReplayFrame<S>>,
}

/// Capture a replay.
///
/// Takes the initial snapshot at tick 0, then steps `ticks` times, capturing a
/// snapshot after each step (so the replay contains `ticks + 1` frames).
pub fn capture_replay<State, Snapshot, StepFn, SnapFn>(
    name: impl Into<String>,
    ticks: u64,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Replay<Snapshot>
where
    Snapshot: Serialize,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let mut frames = Vec::with_capacity(ticks as usize + 1);

    let mut tick = SimTick::ZERO;
    frames.push(ReplayFrame {
        tick: tick.0,
        snapshot: snapshot(tick, &state),
    });

    for _ in 0..ticks {
        step(tick, &mut state);
        tick = tick.advance(1);
        frames.push(ReplayFrame {
            tick: tick.0,
            snapshot: snapshot(tick, &state),
        });
    }

    Replay {
        name: name.into(),
        frames,
    }
}

/// Fail unless both values serialize to the same canonical JSON.
pub fn assert_same_json<A: Serialize, B: Serialize>(expected: &A, actual: &B) -> Result<()> {
    let expected = canonical_json(expected)?;
    let actual = canonical_json(actual)?;
    if expected != actual {
        let line = expected
            .lines()
            .zip(actual.lines())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| expected.lines().count().min(actual.lines().count()));
        anyhow::bail!("JSON diverges at line {}", line + 1);
    }
    Ok(())
}

/// Pretty JSON with object keys sorted, ending in a newline.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let value = canonicalize_value(value);
    let mut s = serde_json::to_string_pretty(&value).context("Failed to format snapshot JSON")?;
    s.push('\n');
    Ok(s)
}

fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries {
                out.insert(k, canonicalize_value(v));
            }
            Value::Object(out)
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_has_initial_frame() {
        let replay = capture_replay("counter", 3, 0u32, |_, n| *n += 2, |_, n| *n);
        let values: Vec<u32> = replay.frames.iter().map(|f| f.snapshot).collect();
        assert_eq!(values, vec![0, 2, 4, 6]);
        assert_eq!(replay.frames.last().unwrap().tick, 3);
    }

    #[test]
    fn canonical_json_sorts_keys() {
        let a = serde_json::json!({"b": 1, "a": {"d": 2, "c": 3}});
        let s = canonical_json(&a).unwrap();
        assert!(s.find("\"a\"").unwrap() < s.find("\"b\"").unwrap());
        assert!(s.find("\"c\"").unwrap() < s.find("\"d\"").unwrap());
    }

    #[test]
    fn diverging_values_are_reported() {
        assert!(assert_same_json(&vec![1, 2, 3], &vec![1, 2, 3]).is_ok());
        let err = assert_same_json(&vec![1, 2, 3], &vec![1, 5, 3]).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }
}
