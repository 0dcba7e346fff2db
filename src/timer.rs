use parking_lot::Mutex;
use std::time::Instant;

/// timers tick down at 60Hz
const TICKS_PER_SECOND: u128 = 60;
const MICROS_PER_SECOND: u128 = 1_000_000;
/// 1_000_000 / 60, rounded; only ever applied to the part of the elapsed
/// time under a second so the error can't build up
const MICROS_PER_TICK: u128 = 16_667;

struct TimerState {
    value: u8,
    set_at: Instant,
}

/// An 8-bit counter that decays at 60Hz until it reaches zero.
///
/// Nothing ticks in the background: the timer remembers what it was set to
/// and when, and works out its current value on demand. The state sits
/// behind a lock so one timer can be shared between the interpreter and the
/// speaker thread.
pub struct Timer {
    state: Mutex<TimerState>,
}

impl Timer {
    pub fn new() -> Self {
        Timer {
            state: Mutex::new(TimerState {
                value: 0,
                set_at: Instant::now(),
            }),
        }
    }

    pub fn set(&self, value: u8) {
        self.set_at(value, Instant::now());
    }

    pub fn set_at(&self, value: u8, now: Instant) {
        let mut state = self.state.lock();
        state.value = value;
        state.set_at = now;
    }

    pub fn value(&self) -> u8 {
        self.value_at(Instant::now())
    }

    /// value as seen at `now`; an instant before the last `set` counts as
    /// no time elapsed
    pub fn value_at(&self, now: Instant) -> u8 {
        let state = self.state.lock();
        if state.value == 0 {
            return 0;
        }
        let micros = now.saturating_duration_since(state.set_at).as_micros();
        let ticks = TICKS_PER_SECOND * (micros / MICROS_PER_SECOND)
            + (micros % MICROS_PER_SECOND) / MICROS_PER_TICK;
        if ticks >= state.value as u128 {
            0
        } else {
            state.value - ticks as u8
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_timer_is_zero() {
        assert_eq!(Timer::new().value(), 0);
    }

    #[test]
    fn test_value_right_after_set() {
        let t = Timer::new();
        let now = Instant::now();
        t.set_at(42, now);
        assert_eq!(t.value_at(now), 42);
    }

    #[test]
    fn test_decay_half_second() {
        let t = Timer::new();
        let now = Instant::now();
        t.set_at(60, now);
        let v = t.value_at(now + Duration::from_millis(500));
        assert!((29..=31).contains(&v), "got {}", v);
    }

    #[test]
    fn test_decay_past_zero() {
        let t = Timer::new();
        let now = Instant::now();
        t.set_at(60, now);
        assert_eq!(t.value_at(now + Duration::from_millis(1100)), 0);
    }

    #[test]
    fn test_whole_seconds_are_exact() {
        let t = Timer::new();
        let now = Instant::now();
        t.set_at(255, now);
        // 4 * 60 ticks, with no rounding error from the per-tick approximation
        assert_eq!(t.value_at(now + Duration::from_secs(4)), 15);
    }

    #[test]
    fn test_one_tick() {
        let t = Timer::new();
        let now = Instant::now();
        t.set_at(10, now);
        assert_eq!(t.value_at(now + Duration::from_micros(16_666)), 10);
        assert_eq!(t.value_at(now + Duration::from_micros(16_667)), 9);
    }

    #[test]
    fn test_reading_doesnt_change_state() {
        let t = Timer::new();
        let now = Instant::now();
        t.set_at(20, now);
        let later = now + Duration::from_millis(100);
        assert_eq!(t.value_at(later), t.value_at(later));
        assert_eq!(t.value_at(now), 20);
    }

    #[test]
    fn test_set_restarts_decay() {
        let t = Timer::new();
        let now = Instant::now();
        t.set_at(5, now);
        let later = now + Duration::from_secs(1);
        assert_eq!(t.value_at(later), 0);
        t.set_at(5, later);
        assert_eq!(t.value_at(later), 5);
    }
}
