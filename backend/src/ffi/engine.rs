//! PyO3 wrapper for ReplayEngine
//!
//! This module provides the Python interface to the Rust replay engine.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use super::types::{parse_engine_config, parse_trace, snapshot_to_py, step_result_to_py};
use crate::models::entity::EntityId;
use crate::orchestrator::{Command, ReplayEngine as RustReplayEngine};

/// Python wrapper for Rust ReplayEngine
///
/// # Example (from Python)
///
/// ```python
/// from scheduler_replay_core_rs import ReplayEngine
///
/// rows = [
///     {"time": 0, "event_type": "dispatch_cpu", "process": 1, "cpus": [1]},
///     {"time": 4, "event_type": "preempt_cpu", "process": 1,
///      "ready_queue": [1], "cpus": [None]},
/// ]
/// engine = ReplayEngine.new(rows, {"clock_divisor": 8})
///
/// while not engine.quit_requested():
///     engine.step(1)
///     frame = engine.snapshot()
///     for entity in frame["entities"]:
///         pygame.draw.circle(screen, entity["color"], entity["position"], 12)
/// ```
#[pyclass(name = "ReplayEngine")]
pub struct PyReplayEngine {
    inner: RustReplayEngine,
}

#[pymethods]
impl PyReplayEngine {
    /// Create a new engine from trace rows and an optional config dict
    ///
    /// # Errors
    ///
    /// Raises ValueError if a row is malformed, RuntimeError if the config
    /// is invalid or the rows are not time-sorted.
    #[staticmethod]
    #[pyo3(signature = (rows, config = None))]
    fn new(rows: &Bound<'_, PyList>, config: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let log = parse_trace(rows)?;
        let config = parse_engine_config(config)?;

        let inner = RustReplayEngine::new(log, config)
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to create engine: {}", e)))?;

        Ok(PyReplayEngine { inner })
    }

    /// Advance by `frames` animation frames and return the step summary
    #[pyo3(signature = (frames = 1))]
    fn step(&mut self, py: Python<'_>, frames: u32) -> PyResult<Py<PyDict>> {
        let result = self.inner.step(frames);
        step_result_to_py(py, &result)
    }

    /// Apply a named command: toggle_pause, speed_up, slow_down,
    /// clock_faster, clock_slower or quit
    fn apply(&mut self, command: &str) -> PyResult<()> {
        let command: Command = command
            .parse()
            .map_err(|e| PyValueError::new_err(format!("{}", e)))?;
        self.inner.apply(command);
        Ok(())
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn resume(&mut self) {
        self.inner.resume();
    }

    fn set_speed(&mut self, speed: f64) -> f64 {
        self.inner.set_speed(speed)
    }

    fn set_clock_divisor(&mut self, clock_divisor: u32) -> u32 {
        self.inner.set_clock_divisor(clock_divisor)
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    fn simulated_time(&self) -> u64 {
        self.inner.simulated_time()
    }

    /// Animated position of an entity as `(x, y)`, or None if never observed
    fn position(&self, entity_id: &str) -> Option<(f64, f64)> {
        self.inner
            .position(&EntityId::new(entity_id))
            .map(|p| (p.x, p.y))
    }

    /// Positions of every known entity, keyed by id
    fn positions(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new(py);
        for (id, point) in self.inner.positions() {
            dict.set_item(id.as_str(), (point.x, point.y))?;
        }
        Ok(dict.unbind())
    }

    /// Remaining quantum ticks per processor; empty unless round-robin
    fn quantum_remaining(&self) -> Vec<i64> {
        self.inner
            .quantum_remaining()
            .iter()
            .map(|q| q.remaining_ticks)
            .collect()
    }

    fn finished_order(&self) -> Vec<String> {
        self.inner
            .finished_order()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn is_round_robin(&self) -> bool {
        self.inner.is_round_robin()
    }

    fn quantum(&self) -> Option<u64> {
        self.inner.quantum()
    }

    fn is_paused(&self) -> bool {
        self.inner.is_paused()
    }

    fn speed(&self) -> f64 {
        self.inner.speed()
    }

    fn clock_divisor(&self) -> u32 {
        self.inner.clock_divisor()
    }

    fn quit_requested(&self) -> bool {
        self.inner.quit_requested()
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Everything a renderer needs for the current frame
    fn snapshot(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        snapshot_to_py(py, &self.inner.snapshot())
    }
}
