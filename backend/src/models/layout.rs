//! Zone Layout
//!
//! Static geometry of the replay scene: the Ready, Wait and Finished queues,
//! one box per processor and one per device. Slot positions depend only on
//! an entity's rank in its zone's current membership list, so a member's
//! slot shifts whenever the list changes. That mirrors the snapshot
//! semantics of the trace.
//!
//! # Example
//!
//! ```rust
//! use scheduler_replay_core_rs::models::layout::{LayoutConfig, Point, ZoneId, ZoneLayout};
//!
//! let layout = ZoneLayout::new(1, 1, &LayoutConfig::default());
//!
//! // Ready is (50, 50, 250, 75): first slot is inset 30, vertically centred
//! assert_eq!(layout.slot(ZoneId::Ready, 0), Some(Point::new(80.0, 87.0)));
//! assert_eq!(layout.slot(ZoneId::Ready, 2), Some(Point::new(140.0, 87.0)));
//!
//! // CPU 0 is (240, 150, 100, 100): every rank sits at the centre
//! assert_eq!(layout.slot(ZoneId::Cpu(0), 0), Some(Point::new(290.0, 200.0)));
//! ```

use crate::models::entity::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Point in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Axis-aligned rectangle `(x, y, w, h)`, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Centre with integer halving
    pub fn center(&self) -> Point {
        Point::new(f64::from(self.x + self.w / 2), f64::from(self.y + self.h / 2))
    }
}

/// A named logical location that holds entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZoneId {
    Ready,
    Wait,
    Cpu(usize),
    Io(usize),
    Finished,
}

impl ZoneId {
    /// Queue zones hold an ordered, unbounded list of members
    pub fn is_queue(&self) -> bool {
        matches!(self, ZoneId::Ready | ZoneId::Wait | ZoneId::Finished)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneId::Ready => write!(f, "Ready"),
            ZoneId::Wait => write!(f, "Wait"),
            ZoneId::Finished => write!(f, "Finished"),
            ZoneId::Cpu(i) => write!(f, "CPU {}", i),
            ZoneId::Io(i) => write!(f, "IO {}", i),
        }
    }
}

/// Scene geometry
///
/// Defaults reproduce the classic 900x500 visualiser window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub ready: Rect,
    pub wait: Rect,
    pub finished: Rect,
    /// Top-left of processor box 0
    pub cpu_origin: (i32, i32),
    /// Top-left of device box 0
    pub io_origin: (i32, i32),
    /// Width and height of processor / device boxes
    pub unit_size: (i32, i32),
    /// Horizontal distance between consecutive processor / device boxes
    pub unit_gap: i32,
    /// Offset of the first queue slot from the zone's left edge
    pub queue_inset: i32,
    /// Distance between consecutive queue slots
    pub queue_pitch: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            ready: Rect::new(50, 50, 250, 75),
            wait: Rect::new(600, 50, 250, 75),
            finished: Rect::new(50, 410, 800, 75),
            cpu_origin: (240, 150),
            io_origin: (240, 300),
            unit_size: (100, 100),
            unit_gap: 150,
            queue_inset: 30,
            queue_pitch: 30,
        }
    }
}

/// Zone rectangles for a run with fixed processor and device counts
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneLayout {
    zones: BTreeMap<ZoneId, Rect>,
    cpu_count: usize,
    io_count: usize,
    queue_inset: i32,
    queue_pitch: i32,
}

impl ZoneLayout {
    pub fn new(cpu_count: usize, io_count: usize, config: &LayoutConfig) -> Self {
        let mut zones = BTreeMap::new();
        zones.insert(ZoneId::Ready, config.ready);
        zones.insert(ZoneId::Wait, config.wait);
        zones.insert(ZoneId::Finished, config.finished);

        let (w, h) = config.unit_size;
        let unit = |origin: (i32, i32), i: usize| {
            Rect::new(origin.0 + i as i32 * config.unit_gap, origin.1, w, h)
        };
        for i in 0..cpu_count {
            zones.insert(ZoneId::Cpu(i), unit(config.cpu_origin, i));
        }
        for i in 0..io_count {
            zones.insert(ZoneId::Io(i), unit(config.io_origin, i));
        }

        Self {
            zones,
            cpu_count,
            io_count,
            queue_inset: config.queue_inset,
            queue_pitch: config.queue_pitch,
        }
    }

    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    pub fn io_count(&self) -> usize {
        self.io_count
    }

    /// Rectangle of a zone, `None` for a processor or device beyond the configured count
    pub fn rect(&self, zone: ZoneId) -> Option<Rect> {
        self.zones.get(&zone).copied()
    }

    /// All zones in display order
    pub fn zones(&self) -> impl Iterator<Item = (ZoneId, Rect)> + '_ {
        self.zones.iter().map(|(zone, rect)| (*zone, *rect))
    }

    /// Position of the member at `index` in a zone's membership list
    pub fn slot(&self, zone: ZoneId, index: usize) -> Option<Point> {
        let rect = self.rect(zone)?;
        if zone.is_queue() {
            let x = rect.x + self.queue_inset + index as i32 * self.queue_pitch;
            Some(Point::new(f64::from(x), f64::from(rect.y + rect.h / 2)))
        } else {
            Some(rect.center())
        }
    }

    /// Positions for `member_count` members of a zone, by rank
    pub fn slots(&self, zone: ZoneId, member_count: usize) -> Vec<Point> {
        (0..member_count)
            .filter_map(|index| self.slot(zone, index))
            .collect()
    }
}

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Convert a hue in `[0, 1)` at full saturation and value
    pub fn from_hue(hue: f64) -> Self {
        let h = (hue.rem_euclid(1.0)) * 6.0;
        let sector = h.floor() as u8;
        let f = h - h.floor();
        let to_u8 = |v: f64| (v * 255.0) as u8;
        let (r, g, b) = match sector {
            0 => (1.0, f, 0.0),
            1 => (1.0 - f, 1.0, 0.0),
            2 => (0.0, 1.0, f),
            3 => (0.0, 1.0 - f, 1.0),
            4 => (f, 0.0, 1.0),
            _ => (1.0, 0.0, 1.0 - f),
        };
        Rgb(to_u8(r), to_u8(g), to_u8(b))
    }
}

/// Give each entity a distinct hue, spaced evenly in id order
pub fn assign_colors(entities: &[EntityId]) -> BTreeMap<EntityId, Rgb> {
    let mut sorted: Vec<&EntityId> = entities.iter().collect();
    sorted.sort();
    sorted.dedup();
    let n = sorted.len().max(1) as f64;
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), Rgb::from_hue(i as f64 / n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_names() {
        assert_eq!(ZoneId::Cpu(0).to_string(), "CPU 0");
        assert_eq!(ZoneId::Io(2).to_string(), "IO 2");
        assert_eq!(ZoneId::Finished.to_string(), "Finished");
    }

    #[test]
    fn test_processor_and_device_boxes() {
        let layout = ZoneLayout::new(2, 1, &LayoutConfig::default());

        assert_eq!(layout.rect(ZoneId::Cpu(1)), Some(Rect::new(390, 150, 100, 100)));
        assert_eq!(layout.rect(ZoneId::Io(0)), Some(Rect::new(240, 300, 100, 100)));
        assert_eq!(layout.rect(ZoneId::Cpu(2)), None);
        assert_eq!(layout.rect(ZoneId::Io(1)), None);
        assert_eq!(layout.zones().count(), 6);
    }

    #[test]
    fn test_queue_slots_by_rank() {
        let layout = ZoneLayout::new(0, 0, &LayoutConfig::default());

        let slots = layout.slots(ZoneId::Finished, 3);
        assert_eq!(
            slots,
            vec![
                Point::new(80.0, 447.0),
                Point::new(110.0, 447.0),
                Point::new(140.0, 447.0),
            ]
        );
    }

    #[test]
    fn test_slot_out_of_range_zone() {
        let layout = ZoneLayout::new(1, 0, &LayoutConfig::default());
        assert_eq!(layout.slot(ZoneId::Io(0), 0), None);
        assert!(layout.slots(ZoneId::Cpu(3), 1).is_empty());
    }

    #[test]
    fn test_primary_hues() {
        assert_eq!(Rgb::from_hue(0.0), Rgb(255, 0, 0));
        assert_eq!(Rgb::from_hue(1.0 / 3.0), Rgb(0, 255, 0));
        assert_eq!(Rgb::from_hue(2.0 / 3.0), Rgb(0, 0, 255));
    }

    #[test]
    fn test_colors_follow_id_order() {
        let ids = vec![EntityId::new("10"), EntityId::new("2"), EntityId::new("2")];
        let colors = assign_colors(&ids);

        assert_eq!(colors.len(), 2);
        assert_eq!(colors[&EntityId::new("2")], Rgb(255, 0, 0));
        assert_ne!(colors[&EntityId::new("10")], Rgb(255, 0, 0));
    }
}
