//! The simulation clock: two time streams advanced in lockstep.

use cgmath::BaseFloat;

use core::epsilon;

/// Raised when a non-positive time scale is requested.
#[derive(Debug, Fail)]
#[fail(display = "time scale must be positive, got {}", speed)]
pub struct SpeedError {
    /// The rejected time scale.
    pub speed: f64,
}

/// Clock resource carrying both time streams.
///
/// `real_time` follows the wall clock (minus the offset of the first tick,
/// so it starts at zero). `game_time` advances `speed` times as fast, and
/// not at all while paused. Game-time events are compared against real-time
/// events through [`project`](struct.GameClock.html#method.project).
#[derive(Clone, Debug)]
pub struct GameClock<S> {
    real_time: S,
    game_time: S,
    speed: S,
    paused: bool,
    init_offset: Option<S>,
    ticks: u64,
}

impl<S> Default for GameClock<S>
where
    S: BaseFloat,
{
    fn default() -> Self {
        GameClock::new()
    }
}

impl<S> GameClock<S>
where
    S: BaseFloat,
{
    /// Create a clock at time zero, unpaused, running at real-time speed.
    pub fn new() -> Self {
        GameClock {
            real_time: S::zero(),
            game_time: S::zero(),
            speed: S::one(),
            paused: false,
            init_offset: None,
            ticks: 0,
        }
    }

    /// Wall-clock seconds since the first tick.
    pub fn real_time(&self) -> S {
        self.real_time
    }

    /// Simulation seconds elapsed.
    pub fn game_time(&self) -> S {
        self.game_time
    }

    /// Current time scale.
    pub fn speed(&self) -> S {
        self.speed
    }

    /// Whether game time is frozen.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of ticks begun so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Set the time scale. The stored value survives pausing, so unpausing
    /// resumes at the previous rate.
    pub fn set_speed(&mut self, speed: S) -> Result<(), SpeedError> {
        if speed <= S::zero() {
            return Err(SpeedError {
                speed: speed.to_f64().unwrap_or(::std::f64::NAN),
            });
        }
        self.speed = speed;
        Ok(())
    }

    /// Freeze or thaw game time.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Toggle the paused state.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// The wall-clock time at which the given game-time instant will be
    /// reached; +∞ while paused.
    pub fn project(&self, game_event_time: S) -> S {
        if self.paused {
            return S::infinity();
        }
        self.real_time + (game_event_time - self.game_time) / self.speed
    }

    /// Advance both streams to the given real time. Game time moves by the
    /// scaled delta, or not at all while paused.
    pub fn advance_to_real(&mut self, real: S) {
        let delta = real - self.real_time;
        debug_assert!(delta >= -epsilon::<S>(), "clock moved backwards");
        if !self.paused {
            self.game_time = self.game_time + delta * self.speed;
        }
        self.real_time = real;
    }

    /// Begin a tick at the given raw clock reading, in seconds. Returns the
    /// frame time this tick advances toward. The first call records the
    /// reading as the offset that pins real time to zero.
    pub fn begin_tick(&mut self, now: S) -> S {
        let offset = match self.init_offset {
            Some(offset) => offset,
            None => {
                self.init_offset = Some(now);
                now
            }
        };
        self.ticks += 1;
        now - offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_offset() {
        let mut clock = GameClock::<f64>::new();
        assert_eq!(clock.begin_tick(5.), 0.);
        assert_eq!(clock.begin_tick(5.25), 0.25);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn test_advance_scales_game_time() {
        let mut clock = GameClock::<f64>::new();
        clock.set_speed(2.).unwrap();
        clock.advance_to_real(0.5);
        assert_ulps_eq!(clock.real_time(), 0.5);
        assert_ulps_eq!(clock.game_time(), 1.);
    }

    #[test]
    fn test_pause_freezes_game_time() {
        let mut clock = GameClock::<f64>::new();
        clock.advance_to_real(0.3);
        clock.set_paused(true);
        clock.advance_to_real(1.3);
        assert_ulps_eq!(clock.game_time(), 0.3);
        assert_ulps_eq!(clock.real_time(), 1.3);
        clock.set_paused(false);
        clock.advance_to_real(2.0);
        assert_ulps_eq!(clock.game_time(), 1.0);
    }

    #[test]
    fn test_projection() {
        let mut clock = GameClock::<f64>::new();
        clock.set_speed(2.).unwrap();
        // game time 1.0 is half a real second away
        assert_ulps_eq!(clock.project(1.), 0.5);
        clock.set_paused(true);
        assert_eq!(clock.project(1.), ::std::f64::INFINITY);
    }

    #[test]
    fn test_invalid_speed() {
        let mut clock = GameClock::<f64>::new();
        assert!(clock.set_speed(0.).is_err());
        assert!(clock.set_speed(-1.).is_err());
        assert_eq!(clock.speed(), 1.);
    }
}
