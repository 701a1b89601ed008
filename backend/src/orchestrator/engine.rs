//! Replay Engine
//!
//! Single entry point for an external render loop. Owns every piece of
//! mutable replay state: clock, cursor, quantum bookkeeping and control
//! settings. One call to [`ReplayEngine::step`] per rendered frame.
//!
//! # Architecture
//!
//! ```text
//! For each animation frame (unless paused):
//! 1. Count the frame; every `clock_divisor` frames:
//!    a. advance simulated time by one
//!    b. tick round-robin countdowns
//! 2. Apply trace rows with time <= simulated time
//! 3. Move every entity towards its target by `speed`
//! ```
//!
//! # Example
//!
//! ```rust
//! use scheduler_replay_core_rs::models::event::{EventType, TraceEvent, TraceLog};
//! use scheduler_replay_core_rs::{EngineConfig, EntityId, ReplayEngine};
//!
//! let log = TraceLog::new(vec![
//!     TraceEvent::new(0, EventType::Dispatch)
//!         .with_process("1")
//!         .with_cpus(vec![Some(EntityId::new("1"))]),
//! ]);
//! let config = EngineConfig {
//!     clock_divisor: 1,
//!     ..EngineConfig::default()
//! };
//!
//! let mut engine = ReplayEngine::new(log, config).unwrap();
//! let result = engine.step(1);
//!
//! assert_eq!(result.simulated_time, 1);
//! assert_eq!(result.rows_applied, 1);
//! assert!(engine.position(&EntityId::new("1")).is_some());
//! ```

use crate::core::time::ReplayClock;
use crate::models::entity::EntityId;
use crate::models::event::TraceLog;
use crate::models::layout::{assign_colors, LayoutConfig, Point, Rgb, ZoneLayout};
use crate::motion::interpolate_all;
use crate::quantum::{infer_quantum, ProcessorQuantum, QuantumInference, TimeSlicing};
use crate::replay::{Diagnostic, ReplayCursor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, trace};

// ============================================================================
// Configuration Types
// ============================================================================

/// Engine configuration
///
/// Defaults match the classic visualiser: speed 6, 32 frames per time
/// unit, speed clamped to 1..=60, divisor clamped to 1..=120.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Processor count; `None` reads it from the first trace row
    pub cpu_count: Option<usize>,

    /// Device count; `None` reads it from the first trace row
    pub io_count: Option<usize>,

    /// Animation distance per frame
    pub speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Increment used by `SpeedUp` / `SlowDown`
    pub speed_step: f64,

    /// Animation frames per simulated time unit
    pub clock_divisor: u32,
    pub max_clock_divisor: u32,

    /// Scene geometry
    pub layout: LayoutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cpu_count: None,
            io_count: None,
            speed: 6.0,
            min_speed: 1.0,
            max_speed: 60.0,
            speed_step: 1.0,
            clock_divisor: 32,
            max_clock_divisor: 120,
            layout: LayoutConfig::default(),
        }
    }
}

/// Discrete commands from an external input handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    TogglePause,
    /// Faster animation (larger speed)
    SpeedUp,
    /// Slower animation
    SlowDown,
    /// Faster simulated clock (fewer frames per time unit)
    ClockFaster,
    /// Slower simulated clock
    ClockSlower,
    Quit,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::TogglePause => "toggle_pause",
            Command::SpeedUp => "speed_up",
            Command::SlowDown => "slow_down",
            Command::ClockFaster => "clock_faster",
            Command::ClockSlower => "clock_slower",
            Command::Quit => "quit",
        }
    }
}

impl FromStr for Command {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "toggle_pause" => Ok(Command::TogglePause),
            "speed_up" => Ok(Command::SpeedUp),
            "slow_down" => Ok(Command::SlowDown),
            "clock_faster" => Ok(Command::ClockFaster),
            "clock_slower" => Ok(Command::ClockSlower),
            "quit" => Ok(Command::Quit),
            other => Err(EngineError::UnknownCommand(other.to_string())),
        }
    }
}

/// Engine errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Trace row {index} has time {time}, earlier than the preceding row's {previous}")]
    UnsortedTrace { index: usize, previous: u64, time: u64 },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Result of a call to [`ReplayEngine::step`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    /// Simulated time after the step
    pub simulated_time: u64,

    /// Frames actually advanced (0 while paused or for an empty trace)
    pub frames_advanced: u32,

    /// Simulated time units that elapsed during the step
    pub clock_ticks: u32,

    /// Trace rows applied during the step
    pub rows_applied: usize,

    /// Entities observed for the first time
    pub new_entities: usize,

    /// Entities not yet on their target after the step
    pub entities_in_motion: usize,

    /// Trace conditions worth reporting; the replay continues regardless
    pub diagnostics: Vec<Diagnostic>,
}

// ============================================================================
// Engine
// ============================================================================

/// Replay engine driven one frame at a time by an external render loop
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    clock: ReplayClock,
    cursor: ReplayCursor,
    inference: QuantumInference,
    slicing: TimeSlicing,
    colors: BTreeMap<EntityId, Rgb>,
    speed: f64,
    min_speed: f64,
    max_speed: f64,
    speed_step: f64,
    max_clock_divisor: u32,
    paused: bool,
    quit_requested: bool,
}

impl ReplayEngine {
    /// Create an engine for a time-sorted trace
    ///
    /// Infers the round-robin quantum once, up front.
    pub fn new(log: TraceLog, config: EngineConfig) -> Result<Self, EngineError> {
        Self::validate_config(&config)?;
        Self::validate_trace(&log)?;

        let (inferred_cpus, inferred_ios) = log.infer_device_counts();
        let cpu_count = config.cpu_count.unwrap_or(inferred_cpus);
        let io_count = config.io_count.unwrap_or(inferred_ios);

        let inference = infer_quantum(&log);
        let slicing = TimeSlicing::from_inference(inference, cpu_count);
        let colors = assign_colors(&log.entities());

        info!(
            rows = log.len(),
            cpu_count,
            io_count,
            round_robin = inference.round_robin,
            quantum = ?inference.quantum,
            "replay engine ready"
        );

        let layout = ZoneLayout::new(cpu_count, io_count, &config.layout);

        Ok(Self {
            clock: ReplayClock::new(config.clock_divisor),
            cursor: ReplayCursor::new(log, layout),
            inference,
            slicing,
            colors,
            speed: config.speed,
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            speed_step: config.speed_step,
            max_clock_divisor: config.max_clock_divisor,
            paused: false,
            quit_requested: false,
        })
    }

    fn validate_config(config: &EngineConfig) -> Result<(), EngineError> {
        if !(config.min_speed > 0.0) || !config.max_speed.is_finite() {
            return Err(EngineError::InvalidConfig(
                "speed range must be positive and finite".to_string(),
            ));
        }

        if config.min_speed > config.max_speed {
            return Err(EngineError::InvalidConfig(format!(
                "min_speed {} exceeds max_speed {}",
                config.min_speed, config.max_speed
            )));
        }

        if !(config.min_speed..=config.max_speed).contains(&config.speed) {
            return Err(EngineError::InvalidConfig(format!(
                "speed {} outside {}..={}",
                config.speed, config.min_speed, config.max_speed
            )));
        }

        if !(config.speed_step > 0.0) {
            return Err(EngineError::InvalidConfig(
                "speed_step must be > 0".to_string(),
            ));
        }

        if config.max_clock_divisor == 0 {
            return Err(EngineError::InvalidConfig(
                "max_clock_divisor must be > 0".to_string(),
            ));
        }

        if config.clock_divisor == 0 || config.clock_divisor > config.max_clock_divisor {
            return Err(EngineError::InvalidConfig(format!(
                "clock_divisor {} outside 1..={}",
                config.clock_divisor, config.max_clock_divisor
            )));
        }

        Ok(())
    }

    fn validate_trace(log: &TraceLog) -> Result<(), EngineError> {
        match log.first_out_of_order() {
            Some(index) => Err(EngineError::UnsortedTrace {
                index,
                previous: log.events()[index - 1].time,
                time: log.events()[index].time,
            }),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Advance the replay by `elapsed_frames` animation frames
    ///
    /// Does nothing while paused or when the trace is empty, so simulated
    /// time on an empty trace stays at 0. Each frame is processed in full
    /// before the next, so `step(3)` is identical to three calls of `step(1)`.
    pub fn step(&mut self, elapsed_frames: u32) -> StepResult {
        let mut result = StepResult {
            simulated_time: self.clock.simulated_time(),
            ..StepResult::default()
        };
        if self.paused || self.cursor.log().is_empty() {
            return result;
        }

        for _ in 0..elapsed_frames {
            if self.clock.advance_frame() {
                self.slicing.tick();
                result.clock_ticks += 1;
                trace!(simulated_time = self.clock.simulated_time(), "clock tick");
            }

            let outcome = self
                .cursor
                .apply_due(self.clock.simulated_time(), &mut self.slicing);
            result.rows_applied += outcome.rows_applied;
            result.new_entities += outcome.new_entities;
            result.diagnostics.extend(outcome.diagnostics);

            result.entities_in_motion = interpolate_all(self.cursor.state_mut(), self.speed);
            result.frames_advanced += 1;
        }

        result.simulated_time = self.clock.simulated_time();
        result
    }

    // ========================================================================
    // Controls
    // ========================================================================

    /// Apply an input command
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::TogglePause => self.toggle_pause(),
            Command::SpeedUp => {
                self.set_speed(self.speed + self.speed_step);
            }
            Command::SlowDown => {
                self.set_speed(self.speed - self.speed_step);
            }
            Command::ClockFaster => {
                self.set_clock_divisor(self.clock.clock_divisor().saturating_sub(1));
            }
            Command::ClockSlower => {
                self.set_clock_divisor(self.clock.clock_divisor().saturating_add(1));
            }
            Command::Quit => self.quit_requested = true,
        }
    }

    /// Set the animation speed, clamped to the configured range
    ///
    /// Returns the speed in effect.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        if !speed.is_nan() {
            self.speed = speed.clamp(self.min_speed, self.max_speed);
        }
        self.speed
    }

    /// Set frames per simulated time unit, clamped to `1..=max_clock_divisor`
    ///
    /// Returns the divisor in effect.
    pub fn set_clock_divisor(&mut self, clock_divisor: u32) -> u32 {
        let clamped = clock_divisor.clamp(1, self.max_clock_divisor);
        self.clock.set_clock_divisor(clamped);
        clamped
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn simulated_time(&self) -> u64 {
        self.clock.simulated_time()
    }

    pub fn frames(&self) -> u64 {
        self.clock.frames()
    }

    /// Animated position of every known entity, in id order
    pub fn positions(&self) -> BTreeMap<EntityId, Point> {
        self.cursor
            .state()
            .entities()
            .iter()
            .map(|(id, entity)| (id.clone(), entity.current))
            .collect()
    }

    pub fn position(&self, id: &EntityId) -> Option<Point> {
        self.cursor.state().position(id)
    }

    pub fn target(&self, id: &EntityId) -> Option<Point> {
        self.cursor.state().target(id)
    }

    /// Per-processor countdowns; empty unless round-robin bookkeeping is active
    pub fn quantum_remaining(&self) -> &[ProcessorQuantum] {
        self.slicing.processors()
    }

    pub fn finished_order(&self) -> &[EntityId] {
        self.cursor.state().finished_order()
    }

    pub fn is_round_robin(&self) -> bool {
        self.inference.round_robin
    }

    /// Inferred quantum, `None` when it could not be resolved
    pub fn quantum(&self) -> Option<u64> {
        self.inference.quantum
    }

    pub fn time_slicing(&self) -> &TimeSlicing {
        &self.slicing
    }

    pub fn cursor(&self) -> &ReplayCursor {
        &self.cursor
    }

    pub fn layout(&self) -> &ZoneLayout {
        self.cursor.layout()
    }

    pub fn colors(&self) -> &BTreeMap<EntityId, Rgb> {
        &self.colors
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn clock_divisor(&self) -> u32 {
        self.clock.clock_divisor()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Every row applied and every entity at rest
    pub fn is_finished(&self) -> bool {
        self.cursor.is_exhausted() && self.cursor.state().all_at_rest()
    }
}

// ============================================================================
// Tests
// ============================================================================
