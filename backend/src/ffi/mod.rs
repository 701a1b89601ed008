//! Python bindings (feature `pyo3`)
//!
//! Lets a Python front-end (the pygame visualiser) drive the replay engine
//! and draw from its snapshots.

pub mod engine;
pub mod types;
