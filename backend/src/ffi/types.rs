//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList, etc.)

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::models::entity::EntityId;
use crate::models::event::{EventType, TraceEvent, TraceLog};
use crate::models::layout::{LayoutConfig, Rect};
use crate::orchestrator::{EngineConfig, FrameSnapshot, StepResult};

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field from a Python dict with clear error messages.
///
/// # Errors
/// Returns PyValueError if the field is missing or has the wrong type
fn extract_required<'py, T>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<T>
where
    T: FromPyObject<'py>,
{
    dict.get_item(key)?
        .ok_or_else(|| PyValueError::new_err(format!("Missing required field '{}'", key)))?
        .extract()
}

/// Extract an optional field from a Python dict.
///
/// Missing keys and `None` values both yield `None`.
fn extract_optional<'py, T>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<Option<T>>
where
    T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => Ok(Some(value.extract()?)),
        _ => Ok(None),
    }
}

// ========================================================================
// Trace Parsing
// ========================================================================

/// Normalise any Python value into an entity id
///
/// Uses the value's `str()` form, so `3`, `3.0` and `"3"` all map to `"3"`.
fn entity_from_py(value: &Bound<'_, PyAny>) -> PyResult<Option<EntityId>> {
    if value.is_none() {
        return Ok(None);
    }
    Ok(EntityId::parse(&value.str()?.to_string_lossy()))
}

fn queue_from_py(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<Vec<EntityId>> {
    Ok(slots_from_py(dict, key)?.into_iter().flatten().collect())
}

fn slots_from_py(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<Vec<Option<EntityId>>> {
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => value
            .try_iter()?
            .map(|item| entity_from_py(&item?))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Convert one row dict into a TraceEvent
///
/// Rows without a `completed` key fall back to the legacy description text.
fn parse_trace_row(row: &Bound<'_, PyDict>) -> PyResult<TraceEvent> {
    let time: u64 = extract_required(row, "time")?;
    let event_type: String = extract_required(row, "event_type")?;
    let event: String = extract_optional(row, "event")?.unwrap_or_default();
    let process = match row.get_item("process")? {
        Some(value) => entity_from_py(&value)?,
        None => None,
    };
    let completed: Option<bool> = extract_optional(row, "completed")?;

    Ok(TraceEvent {
        time,
        event_type: EventType::from(event_type),
        completed: completed.unwrap_or_else(|| TraceEvent::description_marks_completion(&event)),
        event,
        process,
        ready_queue: queue_from_py(row, "ready_queue")?,
        wait_queue: queue_from_py(row, "wait_queue")?,
        cpus: slots_from_py(row, "cpus")?,
        ios: slots_from_py(row, "ios")?,
    })
}

/// Convert a Python list of row dicts into a TraceLog
pub fn parse_trace(rows: &Bound<'_, PyList>) -> PyResult<TraceLog> {
    let events = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let row = row.downcast::<PyDict>().map_err(|_| {
                PyValueError::new_err(format!("Trace row {} must be a dict", i))
            })?;
            parse_trace_row(row)
        })
        .collect::<PyResult<Vec<_>>>()?;
    Ok(TraceLog::new(events))
}

// ========================================================================
// Configuration Parsers
// ========================================================================

/// Convert an optional Python dict to EngineConfig; missing keys keep defaults
pub fn parse_engine_config(py_config: Option<&Bound<'_, PyDict>>) -> PyResult<EngineConfig> {
    let mut config = EngineConfig::default();
    let Some(dict) = py_config else {
        return Ok(config);
    };

    config.cpu_count = extract_optional(dict, "cpu_count")?;
    config.io_count = extract_optional(dict, "io_count")?;
    if let Some(speed) = extract_optional(dict, "speed")? {
        config.speed = speed;
    }
    if let Some(min_speed) = extract_optional(dict, "min_speed")? {
        config.min_speed = min_speed;
    }
    if let Some(max_speed) = extract_optional(dict, "max_speed")? {
        config.max_speed = max_speed;
    }
    if let Some(speed_step) = extract_optional(dict, "speed_step")? {
        config.speed_step = speed_step;
    }
    if let Some(clock_divisor) = extract_optional(dict, "clock_divisor")? {
        config.clock_divisor = clock_divisor;
    }
    if let Some(max_clock_divisor) = extract_optional(dict, "max_clock_divisor")? {
        config.max_clock_divisor = max_clock_divisor;
    }
    if let Some(layout) = extract_optional::<Bound<'_, PyDict>>(dict, "layout")? {
        config.layout = parse_layout_config(&layout)?;
    }

    Ok(config)
}

/// Convert a layout dict to LayoutConfig; missing keys keep defaults
///
/// Rectangles are `(x, y, w, h)` tuples, origins and sizes `(a, b)` pairs,
/// the same shapes `snapshot_to_py` emits.
pub fn parse_layout_config(dict: &Bound<'_, PyDict>) -> PyResult<LayoutConfig> {
    let mut layout = LayoutConfig::default();

    let rect = |key: &str| -> PyResult<Option<Rect>> {
        Ok(extract_optional::<(i32, i32, i32, i32)>(dict, key)?
            .map(|(x, y, w, h)| Rect::new(x, y, w, h)))
    };
    if let Some(ready) = rect("ready")? {
        layout.ready = ready;
    }
    if let Some(wait) = rect("wait")? {
        layout.wait = wait;
    }
    if let Some(finished) = rect("finished")? {
        layout.finished = finished;
    }

    if let Some(cpu_origin) = extract_optional(dict, "cpu_origin")? {
        layout.cpu_origin = cpu_origin;
    }
    if let Some(io_origin) = extract_optional(dict, "io_origin")? {
        layout.io_origin = io_origin;
    }
    if let Some(unit_size) = extract_optional(dict, "unit_size")? {
        layout.unit_size = unit_size;
    }
    if let Some(unit_gap) = extract_optional(dict, "unit_gap")? {
        layout.unit_gap = unit_gap;
    }
    if let Some(queue_inset) = extract_optional(dict, "queue_inset")? {
        layout.queue_inset = queue_inset;
    }
    if let Some(queue_pitch) = extract_optional(dict, "queue_pitch")? {
        layout.queue_pitch = queue_pitch;
    }

    Ok(layout)
}

// ========================================================================
// Result Converters
// ========================================================================

/// Convert StepResult to Python dict
pub fn step_result_to_py(py: Python<'_>, result: &StepResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);

    dict.set_item("simulated_time", result.simulated_time)?;
    dict.set_item("frames_advanced", result.frames_advanced)?;
    dict.set_item("clock_ticks", result.clock_ticks)?;
    dict.set_item("rows_applied", result.rows_applied)?;
    dict.set_item("new_entities", result.new_entities)?;
    dict.set_item("entities_in_motion", result.entities_in_motion)?;

    let diagnostics: Vec<String> = result.diagnostics.iter().map(ToString::to_string).collect();
    dict.set_item("diagnostics", diagnostics)?;

    Ok(dict.unbind())
}

/// Convert FrameSnapshot to Python dict
///
/// Points become `(x, y)` tuples, rectangles `(x, y, w, h)` and colours
/// `(r, g, b)`, matching what pygame's draw calls accept.
pub fn snapshot_to_py(py: Python<'_>, snapshot: &FrameSnapshot) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);

    dict.set_item("simulated_time", snapshot.simulated_time)?;
    dict.set_item("frame", snapshot.frame)?;
    dict.set_item("paused", snapshot.paused)?;
    dict.set_item("speed", snapshot.speed)?;
    dict.set_item("clock_divisor", snapshot.clock_divisor)?;
    dict.set_item("round_robin", snapshot.round_robin)?;
    dict.set_item("quantum", snapshot.quantum)?;
    dict.set_item("finished", snapshot.finished)?;

    let zones = PyDict::new(py);
    for zone in &snapshot.zones {
        let r = zone.rect;
        zones.set_item(&zone.name, (r.x, r.y, r.w, r.h))?;
    }
    dict.set_item("zones", zones)?;

    let entities = PyList::empty(py);
    for entity in &snapshot.entities {
        let item = PyDict::new(py);
        item.set_item("id", entity.id.as_str())?;
        item.set_item("position", (entity.position.x, entity.position.y))?;
        item.set_item("target", (entity.target.x, entity.target.y))?;
        item.set_item("zone", entity.zone.to_string())?;
        item.set_item("color", entity.color.map(|c| (c.0, c.1, c.2)))?;
        entities.append(item)?;
    }
    dict.set_item("entities", entities)?;

    let processors = PyList::empty(py);
    for processor in &snapshot.processors {
        let item = PyDict::new(py);
        item.set_item("name", &processor.name)?;
        item.set_item("occupant", processor.occupant.as_ref().map(EntityId::as_str))?;
        item.set_item("remaining_ticks", processor.remaining_ticks)?;
        item.set_item("label", processor.label())?;
        processors.append(item)?;
    }
    dict.set_item("processors", processors)?;

    let finished: Vec<&str> = snapshot.finished_order.iter().map(EntityId::as_str).collect();
    dict.set_item("finished_order", finished)?;

    Ok(dict.unbind())
}
