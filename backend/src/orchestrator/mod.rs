//! Orchestrator - the replay engine facade
//!
//! Composes clock, cursor, quantum bookkeeping and interpolation into one
//! step function for an external render loop.
//!
//! See `engine.rs` for the step loop and `snapshot.rs` for the renderer view.

pub mod engine;
pub mod snapshot;

// Re-export main types for convenience
pub use engine::{Command, EngineConfig, EngineError, ReplayEngine, StepResult};
pub use snapshot::{EntitySnapshot, FrameSnapshot, ProcessorSnapshot, ZoneSnapshot};
