use std::time::{SystemTime, UNIX_EPOCH};

use otpgate_core::DEFAULT_PERIOD;

use crate::{ConfigError, Error};

/// Maps wall-clock time to HOTP counters in fixed time steps (RFC 6238).
///
/// Both sides of a TOTP exchange rely on synchronized real time, so the clock works with
/// [`SystemTime`] and never with monotonic uptime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TotpClock {
    epoch: u64,
    period: u64,
}

impl TotpClock {
    /// Create a clock that starts counting at `epoch` (Unix seconds) and advances the counter every
    /// `period` seconds.
    pub fn new(epoch: u64, period: u64) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::Period);
        }

        Ok(Self { epoch, period })
    }

    /// Counter value for the given point in time, `floor((instant - epoch) / period)`.
    pub fn counter_at(&self, instant: SystemTime) -> Result<u64, Error> {
        Ok(self.elapsed(instant)? / self.period)
    }

    /// Seconds left until the time step containing `instant` ends.
    pub fn remaining(&self, instant: SystemTime) -> Result<u64, Error> {
        Ok(self.period - self.elapsed(instant)? % self.period)
    }

    fn elapsed(&self, instant: SystemTime) -> Result<u64, Error> {
        instant
            .duration_since(UNIX_EPOCH)?
            .as_secs()
            .checked_sub(self.epoch)
            .ok_or(Error::BeforeEpoch)
    }
}

impl Default for TotpClock {
    fn default() -> Self {
        Self {
            epoch: 0,
            period: DEFAULT_PERIOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn counter_steps() {
        let clock = TotpClock::default();

        assert_eq!(0, clock.counter_at(at(0)).unwrap());
        assert_eq!(0, clock.counter_at(at(29)).unwrap());
        assert_eq!(1, clock.counter_at(at(30)).unwrap());
        assert_eq!(1, clock.counter_at(at(59)).unwrap());
        assert_eq!(37_037_036, clock.counter_at(at(1_111_111_109)).unwrap());
    }

    #[test]
    fn sub_second_precision_is_floored() {
        let clock = TotpClock::default();
        let instant = at(29) + Duration::from_millis(999);

        assert_eq!(0, clock.counter_at(instant).unwrap());
    }

    #[test]
    fn custom_epoch() {
        let clock = TotpClock::new(1_000, 60).unwrap();

        assert_eq!(0, clock.counter_at(at(1_000)).unwrap());
        assert_eq!(2, clock.counter_at(at(1_120)).unwrap());
        assert!(matches!(clock.counter_at(at(999)), Err(Error::BeforeEpoch)));
    }

    #[test]
    fn zero_period() {
        assert!(matches!(TotpClock::new(0, 0), Err(ConfigError::Period)));
    }

    #[test]
    fn remaining() {
        let clock = TotpClock::default();

        assert_eq!(30, clock.remaining(at(60)).unwrap());
        assert_eq!(1, clock.remaining(at(89)).unwrap());
    }
}
