//! FFI Configuration Tests
//!
//! Python config dicts must reach the same EngineConfig fields as the TOML
//! file read by the CLI, including the nested scene layout.

#[cfg(feature = "pyo3")]
mod ffi_tests {
    use pyo3::prelude::*;
    use pyo3::types::PyDict;
    use scheduler_replay_core_rs::ffi::types::parse_engine_config;
    use scheduler_replay_core_rs::models::layout::{LayoutConfig, Rect};

    #[test]
    fn test_layout_dict_overrides_geometry() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let layout = PyDict::new(py);
            layout.set_item("ready", (10, 20, 300, 60)).unwrap();
            layout.set_item("cpu_origin", (100, 200)).unwrap();
            layout.set_item("queue_pitch", 40).unwrap();

            let config = PyDict::new(py);
            config.set_item("clock_divisor", 8).unwrap();
            config.set_item("layout", layout).unwrap();

            let parsed = parse_engine_config(Some(&config)).unwrap();

            assert_eq!(parsed.clock_divisor, 8);
            assert_eq!(parsed.layout.ready, Rect::new(10, 20, 300, 60));
            assert_eq!(parsed.layout.cpu_origin, (100, 200));
            assert_eq!(parsed.layout.queue_pitch, 40);

            // Untouched keys keep their defaults
            let defaults = LayoutConfig::default();
            assert_eq!(parsed.layout.wait, defaults.wait);
            assert_eq!(parsed.layout.queue_inset, defaults.queue_inset);
        });
    }

    #[test]
    fn test_missing_layout_keeps_defaults() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let config = PyDict::new(py);
            config.set_item("layout", py.None()).unwrap();

            let parsed = parse_engine_config(Some(&config)).unwrap();
            assert_eq!(parsed.layout, LayoutConfig::default());
        });
    }

    #[test]
    fn test_malformed_rect_is_rejected() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let layout = PyDict::new(py);
            layout.set_item("finished", (1, 2)).unwrap();
            let config = PyDict::new(py);
            config.set_item("layout", layout).unwrap();

            assert!(parse_engine_config(Some(&config)).is_err());
        });
    }
}
