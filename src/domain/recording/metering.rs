//! Level metering and silence detection

/// Reference amplitude for 0 dBFS with 16-bit samples
pub const FULL_SCALE_AMPLITUDE: f64 = 32767.0;

/// Level reported when amplitude is zero or unavailable
pub const METERING_FLOOR_DB: f64 = -160.0;

/// Levels at or below this are treated as no input at all
pub const NEAR_FLOOR_DB: f64 = -120.0;

/// Default number of consecutive near-floor samples before silence is flagged
pub const DEFAULT_SILENCE_THRESHOLD: u32 = 10;

/// Convert a peak amplitude to a level in dBFS.
///
/// Zero, negative and non-finite amplitudes map to [`METERING_FLOOR_DB`].
pub fn amplitude_to_db(amplitude: f64) -> f64 {
    if !amplitude.is_finite() || amplitude <= 0.0 {
        return METERING_FLOOR_DB;
    }
    (20.0 * (amplitude / FULL_SCALE_AMPLITUDE).log10()).clamp(METERING_FLOOR_DB, 0.0)
}

/// Change in the silence condition observed by [`SilenceDetector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceTransition {
    /// Input has been at the floor for the configured number of samples
    Silenced,
    /// Input returned after a silenced stretch
    Restored,
}

/// Debounced silence detector.
///
/// A single dropout is not silence: the condition is flagged only after
/// `threshold` consecutive near-floor samples, and cleared by the first audible one.
#[derive(Debug, Clone)]
pub struct SilenceDetector {
    threshold: u32,
    consecutive: u32,
    silenced: bool,
}

impl SilenceDetector {
    /// A threshold of zero disables detection
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive: 0,
            silenced: false,
        }
    }

    pub fn is_silenced(&self) -> bool {
        self.silenced
    }

    /// Feed one level sample
    pub fn observe(&mut self, level_db: f64) -> Option<SilenceTransition> {
        if self.threshold == 0 {
            return None;
        }

        if level_db <= NEAR_FLOOR_DB {
            self.consecutive = self.consecutive.saturating_add(1);
            if !self.silenced && self.consecutive >= self.threshold {
                self.silenced = true;
                return Some(SilenceTransition::Silenced);
            }
            return None;
        }

        self.consecutive = 0;
        if self.silenced {
            self.silenced = false;
            return Some(SilenceTransition::Restored);
        }
        None
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
        self.silenced = false;
    }
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_is_zero_db() {
        assert!((amplitude_to_db(FULL_SCALE_AMPLITUDE) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn half_scale_is_about_minus_six_db() {
        let db = amplitude_to_db(FULL_SCALE_AMPLITUDE / 2.0);
        assert!((db + 6.02).abs() < 0.01);
    }

    #[test]
    fn zero_and_invalid_clamp_to_floor() {
        assert_eq!(amplitude_to_db(0.0), METERING_FLOOR_DB);
        assert_eq!(amplitude_to_db(-5.0), METERING_FLOOR_DB);
        assert_eq!(amplitude_to_db(f64::NAN), METERING_FLOOR_DB);
    }

    #[test]
    fn over_full_scale_clamps_to_zero() {
        assert_eq!(amplitude_to_db(40000.0), 0.0);
    }

    #[test]
    fn single_dropout_is_not_silence() {
        let mut detector = SilenceDetector::new(3);
        assert_eq!(detector.observe(METERING_FLOOR_DB), None);
        assert_eq!(detector.observe(-30.0), None);
        assert_eq!(detector.observe(METERING_FLOOR_DB), None);
        assert_eq!(detector.observe(METERING_FLOOR_DB), None);
        assert!(!detector.is_silenced());
    }

    #[test]
    fn consecutive_floor_samples_flag_silence_once() {
        let mut detector = SilenceDetector::new(3);
        assert_eq!(detector.observe(METERING_FLOOR_DB), None);
        assert_eq!(detector.observe(METERING_FLOOR_DB), None);
        assert_eq!(
            detector.observe(METERING_FLOOR_DB),
            Some(SilenceTransition::Silenced)
        );
        assert_eq!(detector.observe(METERING_FLOOR_DB), None);
        assert!(detector.is_silenced());
    }

    #[test]
    fn audible_sample_restores() {
        let mut detector = SilenceDetector::new(1);
        assert_eq!(
            detector.observe(METERING_FLOOR_DB),
            Some(SilenceTransition::Silenced)
        );
        assert_eq!(detector.observe(-40.0), Some(SilenceTransition::Restored));
        assert_eq!(detector.observe(-40.0), None);
    }

    #[test]
    fn zero_threshold_disables() {
        let mut detector = SilenceDetector::new(0);
        for _ in 0..100 {
            assert_eq!(detector.observe(METERING_FLOOR_DB), None);
        }
    }
}
