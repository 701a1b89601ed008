//! Replay Cursor
//!
//! Walks the trace in order and turns each due row into target positions.
//!
//! # Row Application
//!
//! ```text
//! For each unapplied row with time <= simulated time:
//! 1. Ready queue   → Ready slots by rank
//! 2. Wait queue    → Wait slots by rank
//! 3. Processors    → processor centres; occupancy fed to quantum bookkeeping
//! 4. Devices       → device centres
//! 5. Completion    → append the named process to the finished order once
//! 6. Finished      → Finished slots for every finished entity
//! ```
//!
//! Targets are recomputed from the row's own lists every time. Nothing is
//! diffed against the previous row, and entities a row does not mention keep
//! their previous target. Finished placement runs last, so it wins over any
//! list that still names a finished entity.

use crate::models::entity::EntityId;
use crate::models::event::{TraceEvent, TraceLog};
use crate::models::layout::{Point, ZoneId, ZoneLayout};
use crate::models::state::ReplayState;
use crate::quantum::TimeSlicing;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Kind of fixed-capacity zone a slot index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotKind {
    Cpu,
    Io,
}

/// Condition in the trace the caller may want to report
///
/// Diagnostics never stop the replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Diagnostic {
    /// An occupied `cpus`/`ios` entry beyond the configured count; ignored
    SlotOutOfRange {
        time: u64,
        kind: SlotKind,
        index: usize,
        entity: EntityId,
    },
    /// An entity listed in more than one zone of the same row
    ///
    /// The last zone in ready, wait, processor, device order decides the target.
    DuplicateMembership {
        time: u64,
        entity: EntityId,
        zones: Vec<ZoneId>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SlotOutOfRange {
                time,
                kind,
                index,
                entity,
            } => write!(
                f,
                "t={}: {:?} slot {} (entity {}) is beyond the configured count",
                time, kind, index, entity
            ),
            Diagnostic::DuplicateMembership { time, entity, zones } => {
                let names: Vec<String> = zones.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "t={}: entity {} listed in several zones: {}",
                    time,
                    entity,
                    names.join(", ")
                )
            }
        }
    }
}

/// Result of applying due rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutcome {
    /// Rows applied by this call
    pub rows_applied: usize,
    /// Entities observed for the first time
    pub new_entities: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Position of the replay within the trace
#[derive(Debug, Clone)]
pub struct ReplayCursor {
    log: TraceLog,
    layout: ZoneLayout,
    /// Index of the next row to apply; never decreases
    next_index: usize,
    state: ReplayState,
}

impl ReplayCursor {
    pub fn new(log: TraceLog, layout: ZoneLayout) -> Self {
        Self {
            log,
            layout,
            next_index: 0,
            state: ReplayState::new(),
        }
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// All rows have been applied
    pub fn is_exhausted(&self) -> bool {
        self.next_index >= self.log.len()
    }

    pub fn log(&self) -> &TraceLog {
        &self.log
    }

    pub fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ReplayState {
        &mut self.state
    }

    /// Apply every unapplied row whose time has been reached
    pub fn apply_due(&mut self, simulated_time: u64, slicing: &mut TimeSlicing) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        while let Some(row) = self.log.get(self.next_index) {
            if row.time > simulated_time {
                break;
            }
            let row = row.clone();
            debug!(
                index = self.next_index,
                time = row.time,
                event_type = %row.event_type,
                "applying trace row"
            );
            self.apply_row(&row, slicing, &mut outcome);
            self.next_index += 1;
            outcome.rows_applied += 1;
        }

        outcome
    }

    fn apply_row(&mut self, row: &TraceEvent, slicing: &mut TimeSlicing, outcome: &mut ApplyOutcome) {
        let mut assignments: Vec<(EntityId, ZoneId, Point)> = Vec::new();

        for (zone, members) in [(ZoneId::Ready, &row.ready_queue), (ZoneId::Wait, &row.wait_queue)] {
            for (rank, id) in members.iter().enumerate() {
                if let Some(point) = self.layout.slot(zone, rank) {
                    assignments.push((id.clone(), zone, point));
                }
            }
        }

        for (index, occupant) in row.cpus.iter().enumerate() {
            let Some(id) = occupant else { continue };
            if index >= self.layout.cpu_count() {
                outcome.diagnostics.push(Diagnostic::SlotOutOfRange {
                    time: row.time,
                    kind: SlotKind::Cpu,
                    index,
                    entity: id.clone(),
                });
                continue;
            }
            if let Some(point) = self.layout.slot(ZoneId::Cpu(index), 0) {
                assignments.push((id.clone(), ZoneId::Cpu(index), point));
            }
            slicing.observe(index, id);
        }

        for (index, occupant) in row.ios.iter().enumerate() {
            let Some(id) = occupant else { continue };
            if index >= self.layout.io_count() {
                outcome.diagnostics.push(Diagnostic::SlotOutOfRange {
                    time: row.time,
                    kind: SlotKind::Io,
                    index,
                    entity: id.clone(),
                });
                continue;
            }
            if let Some(point) = self.layout.slot(ZoneId::Io(index), 0) {
                assignments.push((id.clone(), ZoneId::Io(index), point));
            }
        }

        outcome
            .diagnostics
            .extend(duplicate_memberships(row.time, &assignments));

        for (id, zone, point) in assignments {
            if self.state.set_target(id, zone, point) {
                outcome.new_entities += 1;
            }
        }

        if row.completed {
            if let Some(process) = &row.process {
                if self.state.mark_finished(process.clone()) {
                    debug!(time = row.time, process = %process, "process finished");
                }
            }
        }

        let finished: Vec<EntityId> = self.state.finished_order().to_vec();
        for (rank, id) in finished.into_iter().enumerate() {
            if let Some(point) = self.layout.slot(ZoneId::Finished, rank) {
                if self.state.set_target(id, ZoneId::Finished, point) {
                    outcome.new_entities += 1;
                }
            }
        }
    }
}

fn duplicate_memberships(time: u64, assignments: &[(EntityId, ZoneId, Point)]) -> Vec<Diagnostic> {
    let mut zones_by_entity: BTreeMap<&EntityId, Vec<ZoneId>> = BTreeMap::new();
    for (id, zone, _) in assignments {
        zones_by_entity.entry(id).or_default().push(*zone);
    }
    zones_by_entity
        .into_iter()
        .filter(|(_, zones)| zones.len() > 1)
        .map(|(id, zones)| Diagnostic::DuplicateMembership {
            time,
            entity: id.clone(),
            zones,
        })
        .collect()
}
