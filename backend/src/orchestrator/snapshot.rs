//! Frame Snapshot - read-only view for renderers
//!
//! Captures everything a renderer draws for one frame: zones, entity
//! positions and colours, quantum labels, simulated time and control state.
//! Snapshots serialize to JSON so out-of-process front-ends can consume them.

use crate::models::entity::EntityId;
use crate::models::layout::{Point, Rect, Rgb, ZoneId};
use crate::orchestrator::engine::ReplayEngine;
use crate::quantum::ProcessorQuantum;
use serde::Serialize;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete renderable state of one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub simulated_time: u64,
    pub frame: u64,
    pub paused: bool,
    pub speed: f64,
    pub clock_divisor: u32,
    pub round_robin: bool,
    pub quantum: Option<u64>,
    pub zones: Vec<ZoneSnapshot>,
    pub entities: Vec<EntitySnapshot>,
    /// Empty unless round-robin bookkeeping is active
    pub processors: Vec<ProcessorSnapshot>,
    pub finished_order: Vec<EntityId>,
    /// All rows applied and every entity at rest
    pub finished: bool,
}

/// Zone rectangle with its display name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSnapshot {
    pub zone: ZoneId,
    pub name: String,
    pub rect: Rect,
}

/// One entity's animated and target positions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub position: Point,
    pub target: Point,
    pub zone: ZoneId,
    pub color: Option<Rgb>,
}

/// Quantum label for one processor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessorSnapshot {
    pub name: String,
    pub occupant: Option<EntityId>,
    pub remaining_ticks: i64,
}

impl ProcessorSnapshot {
    fn from_quantum(index: usize, quantum: &ProcessorQuantum) -> Self {
        ProcessorSnapshot {
            name: ZoneId::Cpu(index).to_string(),
            occupant: quantum.occupant.clone(),
            remaining_ticks: quantum.remaining_ticks,
        }
    }

    /// Label text in the `CPU 0 Q: 3` form
    pub fn label(&self) -> String {
        format!("{} Q: {}", self.name, self.remaining_ticks)
    }
}

impl From<&ReplayEngine> for FrameSnapshot {
    fn from(engine: &ReplayEngine) -> Self {
        let zones = engine
            .layout()
            .zones()
            .map(|(zone, rect)| ZoneSnapshot {
                zone,
                name: zone.to_string(),
                rect,
            })
            .collect();

        let entities = engine
            .cursor()
            .state()
            .entities()
            .iter()
            .map(|(id, entity)| EntitySnapshot {
                id: id.clone(),
                position: entity.current,
                target: entity.target,
                zone: entity.zone,
                color: engine.colors().get(id).copied(),
            })
            .collect();

        let processors = engine
            .quantum_remaining()
            .iter()
            .enumerate()
            .map(|(i, q)| ProcessorSnapshot::from_quantum(i, q))
            .collect();

        FrameSnapshot {
            simulated_time: engine.simulated_time(),
            frame: engine.frames(),
            paused: engine.is_paused(),
            speed: engine.speed(),
            clock_divisor: engine.clock_divisor(),
            round_robin: engine.is_round_robin(),
            quantum: engine.quantum(),
            zones,
            entities,
            processors,
            finished_order: engine.finished_order().to_vec(),
            finished: engine.is_finished(),
        }
    }
}

impl ReplayEngine {
    /// Capture the current frame for a renderer
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::from(self)
    }
}
