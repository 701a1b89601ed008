//! Position Interpolator
//!
//! Moves each entity's animated position towards its target by at most
//! `speed` per animation step. Runs every step whether or not simulated time
//! advanced, so motion and the replay clock can be slowed independently.

use crate::models::layout::Point;
use crate::models::state::ReplayState;

/// Move `current` at most `speed` towards `target`
///
/// Snaps exactly onto the target once the remaining distance is within
/// `speed`.
///
/// # Example
///
/// ```rust
/// use scheduler_replay_core_rs::models::layout::Point;
/// use scheduler_replay_core_rs::motion::step_towards;
///
/// let next = step_towards(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 4.0);
/// assert_eq!(next, Point::new(4.0, 0.0));
///
/// let next = step_towards(Point::new(8.0, 0.0), Point::new(10.0, 0.0), 4.0);
/// assert_eq!(next, Point::new(10.0, 0.0));
/// ```
pub fn step_towards(current: Point, target: Point, speed: f64) -> Point {
    let (dx, dy) = (target.x - current.x, target.y - current.y);
    let distance = dx.hypot(dy);
    if distance == 0.0 {
        return current;
    }
    if distance <= speed {
        return target;
    }
    Point::new(
        current.x + dx / distance * speed,
        current.y + dy / distance * speed,
    )
}

/// Advance every entity of the state by one animation step
///
/// Returns the number of entities still in motion afterwards.
pub fn interpolate_all(state: &mut ReplayState, speed: f64) -> usize {
    state
        .entities_mut()
        .values_mut()
        .map(|entity| {
            entity.current = step_towards(entity.current, entity.target, speed);
            !entity.at_rest()
        })
        .filter(|moving| *moving)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::EntityId;
    use crate::models::layout::ZoneId;
    use proptest::prelude::*;

    #[test]
    fn test_zero_distance_is_noop() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(step_towards(p, p, 5.0), p);
    }

    #[test]
    fn test_diagonal_step_length() {
        let next = step_towards(Point::new(0.0, 0.0), Point::new(30.0, 40.0), 5.0);
        assert!((next.x - 3.0).abs() < 1e-9);
        assert!((next.y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_all_counts_moving() {
        let mut state = ReplayState::new();
        state.set_target(EntityId::new("1"), ZoneId::Ready, Point::new(0.0, 0.0));
        state.set_target(EntityId::new("2"), ZoneId::Ready, Point::new(30.0, 0.0));
        state.set_target(EntityId::new("1"), ZoneId::Cpu(0), Point::new(100.0, 0.0));

        assert_eq!(interpolate_all(&mut state, 40.0), 1);
        assert_eq!(interpolate_all(&mut state, 40.0), 1);
        assert_eq!(interpolate_all(&mut state, 40.0), 0);
        assert!(state.all_at_rest());
    }

    proptest! {
        #[test]
        fn prop_converges_without_overshoot(
            sx in -1000.0f64..1000.0,
            sy in -1000.0f64..1000.0,
            tx in -1000.0f64..1000.0,
            ty in -1000.0f64..1000.0,
            speed in 0.5f64..100.0,
        ) {
            let target = Point::new(tx, ty);
            let mut current = Point::new(sx, sy);
            let bound = (current.distance_to(target) / speed).ceil() as usize;

            let mut steps = 0;
            while current != target {
                let before = current.distance_to(target);
                current = step_towards(current, target, speed);
                prop_assert!(current.distance_to(target) < before + 1e-9);
                steps += 1;
                // One extra step allowed for rounding when d / speed is integral
                prop_assert!(steps <= bound + 1, "took {} steps, bound {}", steps, bound);
            }

            // Further steps stay on the target
            prop_assert_eq!(step_towards(current, target, speed), target);
        }
    }
}
