//! Player configuration, validation, and error types.
//!
//! [`PlayerConfig`] is the input for constructing a [`Player`](crate::Player).
//! [`validate()`](PlayerConfig::validate) checks every field once at
//! startup; nothing is re-validated on the hot path.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use tapedeck_core::SensorSet;

// ── PlayerConfig ───────────────────────────────────────────────────

/// Complete configuration for a playback session.
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    /// Playback speed multiplier. `0.0` stalls playback. Default: 1.0.
    pub rate: f64,
    /// Restart from the beginning when the timeline ends. Default: false.
    pub looping: bool,
    /// Elide stop regions instead of replaying them. Default: true.
    pub skip_stops: bool,
    /// Begin playing as soon as the threads are up. Default: true.
    pub auto_start: bool,
    /// Period of the virtual clock ticker. Default: 500µs. Must be in
    /// `(0, 100ms]`.
    pub tick_period: Duration,
    /// Emit a progress heartbeat every this many dispatched entries.
    /// Default: 100. Must be at least 1.
    pub heartbeat_every: u64,
    /// Minimum recording-time gap (ns) between two clock publications.
    /// Default: 10ms. Must be non-negative.
    pub clock_interval_ns: i64,
    /// How far behind the last known file index a heavy sensor starts
    /// searching its file list. Default: 10.
    pub search_window: usize,
    /// Sensors whose workers are started. Entries for other sensors are
    /// dropped by the dispatcher. Default: all.
    pub enabled: SensorSet,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            looping: false,
            skip_stops: true,
            auto_start: true,
            tick_period: Duration::from_micros(500),
            heartbeat_every: 100,
            clock_interval_ns: 10_000_000,
            search_window: 10,
            enabled: SensorSet::all(),
        }
    }
}

/// Longest accepted ticker period.
const MAX_TICK_PERIOD: Duration = Duration::from_millis(100);

impl PlayerConfig {
    /// Validate all fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(ConfigError::InvalidRate { value: self.rate });
        }
        if self.tick_period.is_zero() || self.tick_period > MAX_TICK_PERIOD {
            return Err(ConfigError::InvalidTickPeriod {
                period: self.tick_period,
            });
        }
        if self.heartbeat_every == 0 {
            return Err(ConfigError::ZeroHeartbeat);
        }
        if self.clock_interval_ns < 0 {
            return Err(ConfigError::NegativeClockInterval {
                value: self.clock_interval_ns,
            });
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building a [`Player`](crate::Player).
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// `rate` is NaN, infinite, or negative.
    InvalidRate {
        /// The invalid value.
        value: f64,
    },
    /// `tick_period` is zero or longer than 100ms.
    InvalidTickPeriod {
        /// The invalid period.
        period: Duration,
    },
    /// `heartbeat_every` is zero.
    ZeroHeartbeat,
    /// `clock_interval_ns` is negative.
    NegativeClockInterval {
        /// The invalid value.
        value: i64,
    },
    /// A background thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRate { value } => {
                write!(f, "rate must be finite and non-negative, got {value}")
            }
            Self::InvalidTickPeriod { period } => {
                write!(f, "tick_period must be in (0, 100ms], got {period:?}")
            }
            Self::ZeroHeartbeat => write!(f, "heartbeat_every must be at least 1"),
            Self::NegativeClockInterval { value } => {
                write!(f, "clock_interval_ns must be non-negative, got {value}")
            }
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(PlayerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_rate_is_valid() {
        let config = PlayerConfig {
            rate: 0.0,
            ..PlayerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_rates_are_rejected() {
        for rate in [-1.0, f64::NAN, f64::INFINITY] {
            let config = PlayerConfig {
                rate,
                ..PlayerConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidRate { .. })
            ));
        }
    }

    #[test]
    fn tick_period_bounds() {
        let zero = PlayerConfig {
            tick_period: Duration::ZERO,
            ..PlayerConfig::default()
        };
        assert_eq!(
            zero.validate(),
            Err(ConfigError::InvalidTickPeriod {
                period: Duration::ZERO
            })
        );
        let slow = PlayerConfig {
            tick_period: Duration::from_secs(1),
            ..PlayerConfig::default()
        };
        assert!(slow.validate().is_err());
    }

    #[test]
    fn zero_heartbeat_is_rejected() {
        let config = PlayerConfig {
            heartbeat_every: 0,
            ..PlayerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroHeartbeat));
    }

    #[test]
    fn negative_clock_interval_is_rejected() {
        let config = PlayerConfig {
            clock_interval_ns: -1,
            ..PlayerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeClockInterval { value: -1 })
        );
    }
}
