//! Trace rows for replay.
//!
//! A trace is the recorded output of a scheduler run: one row per scheduler
//! event, each carrying a full snapshot of zone membership at that time.
//! Rows are never deltas; a later row supersedes every earlier assignment.
//!
//! # Row Contents
//!
//! - **time**: simulated timestamp, non-decreasing across the trace
//! - **event_type**: tag such as `dispatch_cpu` or `preempt_cpu`
//! - **event**: free-text description from the producer
//! - **process**: entity the row is about, if any
//! - **ready_queue / wait_queue**: ordered queue members
//! - **cpus / ios**: one entry per processor / device, `None` when idle
//! - **completed**: the named process finished all of its work
//!
//! # Example
//!
//! ```rust
//! use scheduler_replay_core_rs::models::event::{EventType, TraceEvent};
//! use scheduler_replay_core_rs::EntityId;
//!
//! let row = TraceEvent::new(0, EventType::Dispatch)
//!     .with_process("1")
//!     .with_cpus(vec![Some(EntityId::new("1"))]);
//!
//! assert_eq!(row.time, 0);
//! assert!(row.event_type.is_dispatch());
//! ```

use crate::models::entity::{self, EntityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Description fragment older trace producers use to flag completion
pub const LEGACY_COMPLETION_MARKER: &str = "finished all bursts";

/// Errors raised while loading a trace
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Malformed trace: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Type tag of a trace row
///
/// Only the CPU dispatch and preemption markers carry meaning for the
/// replay; every other tag is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// `dispatch_cpu`: a process was placed on a processor
    Dispatch,
    /// `preempt_cpu`: a process was forced off a processor
    Preempt,
    /// Any other tag
    Other(String),
}

impl EventType {
    pub const DISPATCH_TAG: &'static str = "dispatch_cpu";
    pub const PREEMPT_TAG: &'static str = "preempt_cpu";

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Dispatch => Self::DISPATCH_TAG,
            EventType::Preempt => Self::PREEMPT_TAG,
            EventType::Other(tag) => tag,
        }
    }

    pub fn is_dispatch(&self) -> bool {
        matches!(self, EventType::Dispatch)
    }

    pub fn is_preempt(&self) -> bool {
        matches!(self, EventType::Preempt)
    }
}

impl From<String> for EventType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            Self::DISPATCH_TAG => EventType::Dispatch,
            Self::PREEMPT_TAG => EventType::Preempt,
            _ => EventType::Other(tag),
        }
    }
}

impl From<&str> for EventType {
    fn from(tag: &str) -> Self {
        EventType::from(tag.to_string())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One trace row: a full snapshot of scheduler state at `time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTraceEvent")]
pub struct TraceEvent {
    pub time: u64,
    pub event_type: EventType,
    pub event: String,
    pub process: Option<EntityId>,
    pub ready_queue: Vec<EntityId>,
    pub wait_queue: Vec<EntityId>,
    pub cpus: Vec<Option<EntityId>>,
    pub ios: Vec<Option<EntityId>>,
    /// `process` finished all of its work in this row
    pub completed: bool,
}

impl TraceEvent {
    /// Create a row with empty zones
    pub fn new(time: u64, event_type: impl Into<EventType>) -> Self {
        Self {
            time,
            event_type: event_type.into(),
            event: String::new(),
            process: None,
            ready_queue: Vec::new(),
            wait_queue: Vec::new(),
            cpus: Vec::new(),
            ios: Vec::new(),
            completed: false,
        }
    }

    pub fn with_description(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    pub fn with_process(mut self, process: impl Into<EntityId>) -> Self {
        self.process = Some(process.into());
        self
    }

    pub fn with_ready(mut self, ready_queue: Vec<EntityId>) -> Self {
        self.ready_queue = ready_queue;
        self
    }

    pub fn with_wait(mut self, wait_queue: Vec<EntityId>) -> Self {
        self.wait_queue = wait_queue;
        self
    }

    pub fn with_cpus(mut self, cpus: Vec<Option<EntityId>>) -> Self {
        self.cpus = cpus;
        self
    }

    pub fn with_ios(mut self, ios: Vec<Option<EntityId>>) -> Self {
        self.ios = ios;
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }

    /// Whether a description follows the legacy completion wording
    ///
    /// Loaders use this only when the input carries no explicit flag.
    pub fn description_marks_completion(description: &str) -> bool {
        description.contains(LEGACY_COMPLETION_MARKER)
    }

    /// Every entity named by this row, in zone order, with repeats
    pub fn named_entities(&self) -> impl Iterator<Item = &EntityId> {
        self.process
            .iter()
            .chain(self.ready_queue.iter())
            .chain(self.wait_queue.iter())
            .chain(self.cpus.iter().flatten())
            .chain(self.ios.iter().flatten())
    }
}

/// Wire shape of a row; `completed` may be absent in older traces
#[derive(Deserialize)]
struct RawTraceEvent {
    time: u64,
    event_type: EventType,
    #[serde(default)]
    event: String,
    #[serde(default, deserialize_with = "entity::deserialize_optional")]
    process: Option<EntityId>,
    #[serde(default, deserialize_with = "entity::deserialize_queue")]
    ready_queue: Vec<EntityId>,
    #[serde(default, deserialize_with = "entity::deserialize_queue")]
    wait_queue: Vec<EntityId>,
    #[serde(default, deserialize_with = "entity::deserialize_slots")]
    cpus: Vec<Option<EntityId>>,
    #[serde(default, deserialize_with = "entity::deserialize_slots")]
    ios: Vec<Option<EntityId>>,
    #[serde(default)]
    completed: Option<bool>,
}

impl From<RawTraceEvent> for TraceEvent {
    fn from(raw: RawTraceEvent) -> Self {
        let completed = raw
            .completed
            .unwrap_or_else(|| TraceEvent::description_marks_completion(&raw.event));
        TraceEvent {
            time: raw.time,
            event_type: raw.event_type,
            event: raw.event,
            process: raw.process,
            ready_queue: raw.ready_queue,
            wait_queue: raw.wait_queue,
            cpus: raw.cpus,
            ios: raw.ios,
            completed,
        }
    }
}

/// Read-only trace for replay and analysis.
///
/// A thin wrapper around `Vec<TraceEvent>` with query helpers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceLog {
    events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn new(events: Vec<TraceEvent>) -> Self {
        Self { events }
    }

    /// Parse a JSON array of rows
    pub fn from_json_str(json: &str) -> Result<Self, TraceError> {
        let events: Vec<TraceEvent> = serde_json::from_str(json)?;
        Ok(Self::new(events))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&TraceEvent> {
        self.events.get(index)
    }

    /// Rows recorded at exactly `time`
    pub fn events_at_time(&self, time: u64) -> Vec<&TraceEvent> {
        self.events.iter().filter(|e| e.time == time).collect()
    }

    /// Rows carrying the given tag
    pub fn events_of_type(&self, event_type: &EventType) -> Vec<&TraceEvent> {
        self.events
            .iter()
            .filter(|e| &e.event_type == event_type)
            .collect()
    }

    /// Rows whose `process` is `id`
    pub fn events_for_process(&self, id: &EntityId) -> Vec<&TraceEvent> {
        self.events
            .iter()
            .filter(|e| e.process.as_ref() == Some(id))
            .collect()
    }

    /// Processor and device counts, read from the first row
    pub fn infer_device_counts(&self) -> (usize, usize) {
        self.events
            .first()
            .map(|e| (e.cpus.len(), e.ios.len()))
            .unwrap_or((0, 0))
    }

    /// Every entity mentioned anywhere in the trace, in id order
    pub fn entities(&self) -> Vec<EntityId> {
        let ids: BTreeSet<&EntityId> = self
            .events
            .iter()
            .flat_map(|e| e.named_entities())
            .collect();
        ids.into_iter().cloned().collect()
    }

    /// Index of the first row whose time is earlier than its predecessor
    pub fn first_out_of_order(&self) -> Option<usize> {
        self.events
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
            .map(|i| i + 1)
    }
}

impl From<Vec<TraceEvent>> for TraceLog {
    fn from(events: Vec<TraceEvent>) -> Self {
        Self::new(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|s| EntityId::new(*s)).collect()
    }

    #[test]
    fn test_event_type_tags() {
        assert_eq!(EventType::from("dispatch_cpu"), EventType::Dispatch);
        assert_eq!(EventType::from("preempt_cpu"), EventType::Preempt);
        assert_eq!(
            EventType::from("io_request"),
            EventType::Other("io_request".to_string())
        );
        assert_eq!(EventType::Preempt.to_string(), "preempt_cpu");
    }

    #[test]
    fn test_legacy_completion_fallback() {
        let json = r#"[
            {"time": 3, "event_type": "exit", "event": "Process 2 finished all bursts", "process": 2},
            {"time": 4, "event_type": "exit", "event": "Process 3 finished all bursts", "process": 3, "completed": false}
        ]"#;
        let log = TraceLog::from_json_str(json).unwrap();

        assert!(log.events()[0].completed);
        assert!(!log.events()[1].completed, "explicit flag wins over text");
    }

    #[test]
    fn test_query_by_time_and_type() {
        let log = TraceLog::new(vec![
            TraceEvent::new(0, EventType::Dispatch).with_process("1"),
            TraceEvent::new(4, EventType::Preempt).with_process("1"),
            TraceEvent::new(4, EventType::Dispatch).with_process("2"),
        ]);

        assert_eq!(log.events_at_time(4).len(), 2);
        assert_eq!(log.events_of_type(&EventType::Dispatch).len(), 2);
        assert_eq!(log.events_for_process(&EntityId::new("1")).len(), 2);
    }

    #[test]
    fn test_entities_are_ordered_and_unique() {
        let log = TraceLog::new(vec![
            TraceEvent::new(0, "arrive").with_ready(ids(&["10", "2"])),
            TraceEvent::new(1, EventType::Dispatch)
                .with_process("2")
                .with_ready(ids(&["10"]))
                .with_cpus(vec![Some(EntityId::new("2")), None]),
        ]);

        assert_eq!(log.entities(), ids(&["2", "10"]));
    }

    #[test]
    fn test_device_counts_from_first_row() {
        let log = TraceLog::new(vec![TraceEvent::new(0, "arrive")
            .with_cpus(vec![None, None])
            .with_ios(vec![None])]);
        assert_eq!(log.infer_device_counts(), (2, 1));
        assert_eq!(TraceLog::default().infer_device_counts(), (0, 0));
    }

    #[test]
    fn test_first_out_of_order() {
        let log = TraceLog::new(vec![
            TraceEvent::new(0, "a"),
            TraceEvent::new(2, "b"),
            TraceEvent::new(1, "c"),
        ]);
        assert_eq!(log.first_out_of_order(), Some(2));
        assert_eq!(TraceLog::default().first_out_of_order(), None);
    }
}
