//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default interval between progress events (500 milliseconds)
pub const DEFAULT_METERING_INTERVAL_MS: u64 = 500;

/// Shortest interval the progress emitter accepts
pub const MIN_METERING_INTERVAL_MS: u64 = 10;

/// Default bound on waiting for a permission answer (30 seconds)
pub const DEFAULT_PERMISSION_TIMEOUT_SECS: u64 = 30;

/// Value object representing a time duration with millisecond precision.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Create a metering interval from fractional seconds, as hosts pass it.
    ///
    /// Non-finite, negative or too-small values clamp to the minimum interval.
    pub fn metering_from_secs_f64(secs: f64) -> Self {
        let ms = if secs.is_finite() && secs > 0.0 {
            (secs * 1000.0).round() as u64
        } else {
            0
        };
        Self::from_millis(ms.max(MIN_METERING_INTERVAL_MS))
    }

    /// Default progress interval
    pub const fn default_metering_interval() -> Self {
        Self::from_millis(DEFAULT_METERING_INTERVAL_MS)
    }

    /// Default permission wait
    pub const fn default_permission_timeout() -> Self {
        Self::from_secs(DEFAULT_PERMISSION_TIMEOUT_SECS)
    }

    /// Get duration in whole seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }

    /// Clamp to the shortest interval the progress emitter accepts
    pub fn clamp_to_metering(self) -> Self {
        Self::from_millis(self.milliseconds.max(MIN_METERING_INTERVAL_MS))
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a duration string into a Duration value object.
    /// Supported formats: "500ms", "0.5s", "30s", "1m", "2m30s"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let err = || DurationParseError {
            input: s.to_string(),
        };

        let mut total_ms: f64 = 0.0;
        let mut current_num = String::new();
        let mut found_any = false;
        let mut chars = input.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch.is_ascii_digit() || ch == '.' {
                current_num.push(ch);
                continue;
            }
            if current_num.is_empty() {
                return Err(err());
            }
            let value: f64 = current_num.parse().map_err(|_| err())?;
            let unit_ms = match ch {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1.0
                }
                'm' => 60_000.0,
                's' => 1000.0,
                _ => return Err(err()),
            };
            total_ms += value * unit_ms;
            current_num.clear();
            found_any = true;
        }

        // Leftover digits without a unit
        if !current_num.is_empty() || !found_any {
            return Err(err());
        }

        let milliseconds = total_ms.round() as u64;
        if milliseconds == 0 {
            return Err(err());
        }

        Ok(Self { milliseconds })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.milliseconds % 1000 != 0 {
            return write!(f, "{}ms", self.milliseconds);
        }

        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        if minutes == 0 {
            write!(f, "{}s", seconds)
        } else if seconds == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}s", minutes, seconds)
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::default_metering_interval()
    }
}
