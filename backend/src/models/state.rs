//! Replay State
//!
//! Per-entity positions reconstructed from the trace, plus the order in
//! which entities finished.
//!
//! # Critical Invariants
//!
//! 1. **Observed once, tracked forever**: an entity enters the map on its
//!    first appearance in any zone list and is never removed
//! 2. **No undefined origin**: a newly observed entity starts at its target
//! 3. **Finish once**: each id appears in `finished_order` at most once, at
//!    the index of its first completion

use crate::models::entity::EntityId;
use crate::models::layout::{Point, ZoneId};
use std::collections::BTreeMap;

/// Visual and logical position of one entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    /// Animated position shown by the renderer
    pub current: Point,
    /// Snapshot-derived destination
    pub target: Point,
    /// Zone the target belongs to
    pub zone: ZoneId,
}

impl EntityState {
    pub fn at_rest(&self) -> bool {
        self.current == self.target
    }
}

/// Complete reconstructed state of the replayed run
///
/// # Example
///
/// ```rust
/// use scheduler_replay_core_rs::models::layout::{Point, ZoneId};
/// use scheduler_replay_core_rs::{EntityId, ReplayState};
///
/// let mut state = ReplayState::new();
/// state.set_target(EntityId::new("1"), ZoneId::Ready, Point::new(80.0, 87.0));
///
/// assert_eq!(state.num_entities(), 1);
/// assert_eq!(state.position(&EntityId::new("1")), Some(Point::new(80.0, 87.0)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReplayState {
    /// Every observed entity, in id order
    entities: BTreeMap<EntityId, EntityState>,

    /// Entities that completed, in first-finish order
    finished_order: Vec<EntityId>,
}

impl ReplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point an entity at a new target
    ///
    /// Returns `true` when the entity was observed for the first time, in
    /// which case its current position is initialised to the target.
    pub fn set_target(&mut self, id: EntityId, zone: ZoneId, target: Point) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.target = target;
                entity.zone = zone;
                false
            }
            None => {
                self.entities.insert(
                    id,
                    EntityState {
                        current: target,
                        target,
                        zone,
                    },
                );
                true
            }
        }
    }

    /// Record a completion
    ///
    /// Returns `false` if the entity had already finished.
    pub fn mark_finished(&mut self, id: EntityId) -> bool {
        if self.finished_order.contains(&id) {
            return false;
        }
        self.finished_order.push(id);
        true
    }

    pub fn get(&self, id: &EntityId) -> Option<&EntityState> {
        self.entities.get(id)
    }

    pub fn position(&self, id: &EntityId) -> Option<Point> {
        self.entities.get(id).map(|e| e.current)
    }

    pub fn target(&self, id: &EntityId) -> Option<Point> {
        self.entities.get(id).map(|e| e.target)
    }

    pub fn zone(&self, id: &EntityId) -> Option<ZoneId> {
        self.entities.get(id).map(|e| e.zone)
    }

    pub fn entities(&self) -> &BTreeMap<EntityId, EntityState> {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut BTreeMap<EntityId, EntityState> {
        &mut self.entities
    }

    pub fn finished_order(&self) -> &[EntityId] {
        &self.finished_order
    }

    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    /// Every entity sits on its target
    pub fn all_at_rest(&self) -> bool {
        self.entities.values().all(EntityState::at_rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_starts_at_target() {
        let mut state = ReplayState::new();
        let id = EntityId::new("1");

        assert!(state.set_target(id.clone(), ZoneId::Wait, Point::new(630.0, 87.0)));

        let entity = state.get(&id).unwrap();
        assert_eq!(entity.current, entity.target);
        assert_eq!(entity.zone, ZoneId::Wait);
        assert!(state.all_at_rest());
    }

    #[test]
    fn test_retarget_keeps_current_position() {
        let mut state = ReplayState::new();
        let id = EntityId::new("1");

        state.set_target(id.clone(), ZoneId::Ready, Point::new(80.0, 87.0));
        assert!(!state.set_target(id.clone(), ZoneId::Cpu(0), Point::new(290.0, 200.0)));

        assert_eq!(state.position(&id), Some(Point::new(80.0, 87.0)));
        assert_eq!(state.target(&id), Some(Point::new(290.0, 200.0)));
        assert_eq!(state.zone(&id), Some(ZoneId::Cpu(0)));
        assert!(!state.all_at_rest());
    }

    #[test]
    fn test_mark_finished_once() {
        let mut state = ReplayState::new();

        assert!(state.mark_finished(EntityId::new("2")));
        assert!(state.mark_finished(EntityId::new("1")));
        assert!(!state.mark_finished(EntityId::new("2")));

        assert_eq!(
            state.finished_order(),
            &[EntityId::new("2"), EntityId::new("1")]
        );
    }
}
