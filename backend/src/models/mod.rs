//! Domain models for the trace replay

pub mod entity;
pub mod event;
pub mod layout;
pub mod state;

// Re-exports
pub use entity::EntityId;
pub use event::{EventType, TraceError, TraceEvent, TraceLog};
pub use layout::{LayoutConfig, Point, Rect, Rgb, ZoneId, ZoneLayout};
pub use state::{EntityState, ReplayState};
