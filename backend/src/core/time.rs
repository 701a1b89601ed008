//! Time management for the replay
//!
//! The replay operates on two clocks. Animation frames arrive from the
//! external render loop; every `clock_divisor` frames advance simulated time
//! by one unit. Neither clock depends on wall-clock time.

use serde::{Deserialize, Serialize};

/// Simulated time driven by an animation frame accumulator
///
/// # Example
/// ```
/// use scheduler_replay_core_rs::ReplayClock;
///
/// let mut clock = ReplayClock::new(2); // 2 frames per time unit
/// assert_eq!(clock.simulated_time(), 0);
///
/// assert!(!clock.advance_frame());
/// assert!(clock.advance_frame());
/// assert_eq!(clock.simulated_time(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayClock {
    /// Simulated time units elapsed since replay start
    simulated_time: u64,
    /// Frames accumulated towards the next time unit
    frame_accumulator: u32,
    /// Number of frames per simulated time unit
    clock_divisor: u32,
    /// Total frames observed (never reset)
    frames: u64,
}

impl ReplayClock {
    /// Create a new clock
    ///
    /// # Arguments
    /// * `clock_divisor` - Number of animation frames per simulated time unit
    ///
    /// # Example
    /// ```
    /// use scheduler_replay_core_rs::ReplayClock;
    ///
    /// let clock = ReplayClock::new(32);
    /// assert_eq!(clock.clock_divisor(), 32);
    /// ```
    pub fn new(clock_divisor: u32) -> Self {
        assert!(clock_divisor > 0, "clock_divisor must be positive");
        Self {
            simulated_time: 0,
            frame_accumulator: 0,
            clock_divisor,
            frames: 0,
        }
    }

    /// Count one animation frame
    ///
    /// Returns `true` when the frame completed a simulated time unit, in which
    /// case simulated time has already been advanced.
    pub fn advance_frame(&mut self) -> bool {
        self.frames += 1;
        self.frame_accumulator += 1;
        if self.frame_accumulator >= self.clock_divisor {
            self.frame_accumulator = 0;
            self.simulated_time += 1;
            true
        } else {
            false
        }
    }

    /// Current simulated time
    pub fn simulated_time(&self) -> u64 {
        self.simulated_time
    }

    /// Frames accumulated towards the next time unit
    pub fn frame_accumulator(&self) -> u32 {
        self.frame_accumulator
    }

    /// Total frames counted since the clock was created
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames per simulated time unit
    pub fn clock_divisor(&self) -> u32 {
        self.clock_divisor
    }

    /// Change the number of frames per simulated time unit
    ///
    /// The accumulator is kept, so a lowered divisor takes effect on the
    /// next frame.
    ///
    /// # Example
    /// ```
    /// use scheduler_replay_core_rs::ReplayClock;
    ///
    /// let mut clock = ReplayClock::new(10);
    /// for _ in 0..5 {
    ///     clock.advance_frame();
    /// }
    /// clock.set_clock_divisor(3);
    /// assert!(clock.advance_frame());
    /// assert_eq!(clock.simulated_time(), 1);
    /// ```
    pub fn set_clock_divisor(&mut self, clock_divisor: u32) {
        assert!(clock_divisor > 0, "clock_divisor must be positive");
        self.clock_divisor = clock_divisor;
    }
}
