//! Scheduler Replay Core - Rust Engine
//!
//! Reconstructs the moment-by-moment state of a CPU-scheduling run from a
//! recorded trace and drives a time-decoupled animation of it.
//!
//! # Architecture
//!
//! - **core**: Simulated clock driven by animation frames
//! - **models**: Domain types (EntityId, TraceEvent, ZoneLayout, ReplayState)
//! - **quantum**: Round-robin detection and per-processor countdowns
//! - **replay**: Cursor applying trace rows as they come due
//! - **motion**: Position interpolation towards targets
//! - **orchestrator**: Engine facade and renderer snapshots
//!
//! # Critical Invariants
//!
//! 1. Rows apply strictly in trace order, never before their time
//! 2. Every row is a full snapshot; targets are recomputed, never merged
//! 3. Replay is driven by step count alone, never by wall-clock time

// Module declarations
pub mod core;
pub mod models;
pub mod motion;
pub mod orchestrator;
pub mod quantum;
pub mod replay;

// Re-exports for convenience
pub use crate::core::time::ReplayClock;
pub use models::{
    entity::EntityId,
    event::{EventType, TraceError, TraceEvent, TraceLog},
    layout::{LayoutConfig, Point, Rect, Rgb, ZoneId, ZoneLayout},
    state::ReplayState,
};
pub use orchestrator::{
    Command, EngineConfig, EngineError, FrameSnapshot, ReplayEngine, StepResult,
};
pub use quantum::{infer_quantum, QuantumInference, TimeSlicing};
pub use replay::{Diagnostic, ReplayCursor};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn scheduler_replay_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::engine::PyReplayEngine>()?;
    Ok(())
}
