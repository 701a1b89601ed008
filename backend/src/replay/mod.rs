//! Replay of a recorded trace against simulated time

pub mod cursor;

pub use cursor::{ApplyOutcome, Diagnostic, ReplayCursor, SlotKind};
