//! Round-robin quantum inference and countdown bookkeeping
//!
//! The trace does not say which policy produced it. A run counts as
//! round-robin when any row carries the preemption marker; the quantum is
//! the gap between the first preemption and the latest earlier dispatch of
//! the same process. The quantum is assumed constant for the whole run.
//!
//! Bookkeeping is a tagged sub-state: [`TimeSlicing::NotTimeSliced`] when
//! the run is not round-robin or the quantum could not be resolved, and
//! [`TimeSlicing::TimeSliced`] carrying one countdown per processor
//! otherwise.

use crate::models::entity::EntityId;
use crate::models::event::TraceLog;
use serde::Serialize;

/// Outcome of quantum inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QuantumInference {
    /// Some row carries the preemption marker
    pub round_robin: bool,
    /// Resolved quantum, `None` when no dispatch precedes a preemption
    pub quantum: Option<u64>,
}

/// Detect round-robin mode and its quantum
///
/// # Example
///
/// ```rust
/// use scheduler_replay_core_rs::models::event::{EventType, TraceEvent, TraceLog};
/// use scheduler_replay_core_rs::quantum::infer_quantum;
///
/// let log = TraceLog::new(vec![
///     TraceEvent::new(0, EventType::Dispatch).with_process("1"),
///     TraceEvent::new(4, EventType::Preempt).with_process("1"),
/// ]);
///
/// let inference = infer_quantum(&log);
/// assert!(inference.round_robin);
/// assert_eq!(inference.quantum, Some(4));
/// ```
pub fn infer_quantum(log: &TraceLog) -> QuantumInference {
    let events = log.events();
    let round_robin = events.iter().any(|e| e.event_type.is_preempt());
    if !round_robin {
        return QuantumInference::default();
    }

    let quantum = events
        .iter()
        .filter(|e| e.event_type.is_preempt())
        .find_map(|preempt| {
            let process = preempt.process.as_ref()?;
            let dispatched_at = events
                .iter()
                .filter(|e| {
                    e.event_type.is_dispatch()
                        && e.process.as_ref() == Some(process)
                        && e.time < preempt.time
                })
                .map(|e| e.time)
                .max()?;
            Some(preempt.time - dispatched_at)
        });

    QuantumInference {
        round_robin,
        quantum,
    }
}

/// Countdown state of one processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessorQuantum {
    /// Last occupant observed on the processor
    pub occupant: Option<EntityId>,
    /// Ticks left before a forced rotation is predicted
    pub remaining_ticks: i64,
}

/// Round-robin bookkeeping, present only for time-sliced runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSlicing {
    NotTimeSliced,
    TimeSliced {
        quantum: u64,
        processors: Vec<ProcessorQuantum>,
    },
}

impl TimeSlicing {
    /// Build bookkeeping from an inference result
    ///
    /// A zero quantum is treated as unresolved.
    pub fn from_inference(inference: QuantumInference, cpu_count: usize) -> Self {
        match inference.quantum {
            Some(quantum) if inference.round_robin && quantum > 0 => TimeSlicing::TimeSliced {
                quantum,
                processors: vec![
                    ProcessorQuantum {
                        occupant: None,
                        remaining_ticks: quantum as i64,
                    };
                    cpu_count
                ],
            },
            _ => TimeSlicing::NotTimeSliced,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TimeSlicing::TimeSliced { .. })
    }

    pub fn quantum(&self) -> Option<u64> {
        match self {
            TimeSlicing::TimeSliced { quantum, .. } => Some(*quantum),
            TimeSlicing::NotTimeSliced => None,
        }
    }

    /// Per-processor countdowns; empty when not time-sliced
    pub fn processors(&self) -> &[ProcessorQuantum] {
        match self {
            TimeSlicing::TimeSliced { processors, .. } => processors,
            TimeSlicing::NotTimeSliced => &[],
        }
    }

    /// Advance every occupied processor by one simulated tick
    ///
    /// An expired countdown clears the occupant and restarts at the quantum,
    /// predicting the rotation before the trace records it.
    pub fn tick(&mut self) {
        if let TimeSlicing::TimeSliced {
            quantum,
            processors,
        } = self
        {
            for cpu in processors.iter_mut().filter(|cpu| cpu.occupant.is_some()) {
                cpu.remaining_ticks -= 1;
                if cpu.remaining_ticks <= 0 {
                    cpu.occupant = None;
                    cpu.remaining_ticks = *quantum as i64;
                }
            }
        }
    }

    /// Record the occupant a snapshot shows on processor `cpu`
    ///
    /// A different occupant restarts the countdown. Returns `true` on reset.
    pub fn observe(&mut self, cpu: usize, occupant: &EntityId) -> bool {
        let TimeSlicing::TimeSliced {
            quantum,
            processors,
        } = self
        else {
            return false;
        };
        let Some(state) = processors.get_mut(cpu) else {
            return false;
        };
        if state.occupant.as_ref() == Some(occupant) {
            return false;
        }
        state.occupant = Some(occupant.clone());
        state.remaining_ticks = *quantum as i64;
        true
    }
}
