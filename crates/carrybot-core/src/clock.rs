//! Simulation clock.
//!
//! The clock advances in fixed steps of `dt` simulated seconds. The tick
//! counter is the source of truth for "how many steps ran"; elapsed time
//! is accumulated alongside it so subtask due times compare against the
//! same value the controller sees.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// The step length is not a positive finite number.
    #[error("invalid tick length: {dt}")]
    InvalidDt {
        /// The rejected step length in seconds.
        dt: f64,
    },
}

/// Fixed-step simulation clock.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    /// Number of completed steps.
    tick: u64,
    /// Seconds per step.
    dt: f64,
    /// Simulated seconds since start.
    elapsed: f64,
}

impl SimClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDt`] unless `dt` is positive and finite.
    pub fn new(dt: f64) -> Result<Self, ClockError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ClockError::InvalidDt { dt });
        }
        Ok(Self {
            tick: 0,
            dt,
            elapsed: 0.0,
        })
    }

    /// Advance one step. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.elapsed += self.dt;
        Ok(self.tick)
    }

    /// Completed steps.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Seconds per step.
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Simulated seconds since start.
    pub const fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }
}
