//! Triangle-wave opacity generator for the ping-pong cycle.
//!
//! A counter advances by [`Wave::STEP`] on every tick.  Taking it modulo
//! `range = 2 * max` and folding the upper half back down yields a value
//! that climbs linearly to `max` and falls back to zero:
//!
//! ```text
//! relative = counter % range
//! value    = if relative > max { range - relative } else { relative }
//! ```
//!
//! `max` is 300, above the 255 opacity ceiling.  Values over 255 are clamped,
//! so the window holds full opacity for a few ticks at the top of every
//! period before fading again.

/// Clamp an intermediate opacity value into `0..=255`.
pub fn clamp_opacity(value: i64) -> u8 {
    value.clamp(0, u8::MAX as i64) as u8
}

/// Ping-pong wave state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    counter: u64,
    step: u64,
    max: u64,
}

impl Default for Wave {
    fn default() -> Self {
        Self::new(Self::BASE, Self::STEP, Self::MAX)
    }
}

impl Wave {
    /// Counter value a fresh wave starts from (full opacity).
    pub const BASE: u64 = 255;
    /// Counter increment per tick.
    pub const STEP: u64 = 10;
    /// Wave amplitude.
    pub const MAX: u64 = 300;

    /// Build a wave with explicit parameters.  `max` must be non-zero.
    pub fn new(counter: u64, step: u64, max: u64) -> Self {
        debug_assert!(max > 0, "wave amplitude must be non-zero");
        Self { counter, step, max }
    }

    /// Length of one full rise-and-fall in counter units.
    pub fn range(&self) -> u64 {
        self.max * 2
    }

    /// Number of ticks in one period.
    pub fn period(&self) -> u64 {
        self.range() / self.step.max(1)
    }

    /// Current counter value.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Wave value (unclamped) for the current counter.
    pub fn value(&self) -> u64 {
        let range = self.range();
        let relative = self.counter % range;
        if relative > self.max {
            range - relative
        } else {
            relative
        }
    }

    /// Advance one tick and return the new unclamped value.
    pub fn advance(&mut self) -> u64 {
        self.counter += self.step;
        self.value()
    }

    /// Advance one tick and return the value as a window opacity.
    pub fn next_opacity(&mut self) -> u8 {
        clamp_opacity(self.advance() as i64)
    }
}
