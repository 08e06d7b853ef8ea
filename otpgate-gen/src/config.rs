use otpgate_core::{Algorithm, DEFAULT_DIGITS, DEFAULT_PERIOD};
use serde::Deserialize;

use crate::TotpClock;

/// Smallest accepted secret length in bytes (128 bits).
pub const MIN_SECRET_LENGTH: usize = 16;
/// Recommended secret length in bytes (160 bits).
pub const DEFAULT_SECRET_LENGTH: usize = 20;
/// Largest accepted drift window, in time steps on either side.
pub const MAX_WINDOW: u32 = 10;

/// Settings that were out of their allowed range.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported amount of digits {0}, only 6 to 8 are supported")]
    Digits(u8),
    #[error("the time step must be at least 1 second")]
    Period,
    #[error("drift window of {0} steps is too large, at most 10 are allowed")]
    Window(u32),
    #[error("secret length of {0} bytes is insecure, at least 16 are required")]
    SecretLength(usize),
}

/// Parameters shared by enrollment and verification.
///
/// Usually loaded once at startup, where a failed [`TotpConfig::validate`] should abort the
/// program rather than fail individual requests.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TotpConfig {
    /// MAC digest used for code derivation.
    pub algorithm: Algorithm,
    /// Length of generated codes.
    pub digits: u8,
    /// Time step in seconds.
    pub period: u64,
    /// Unix time at which counting starts.
    pub epoch: u64,
    /// Amount of time steps before and after the current one that are accepted as well.
    pub window: u32,
    /// Length in bytes of newly generated secrets.
    pub secret_length: usize,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Sha1,
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
            epoch: 0,
            window: 1,
            secret_length: DEFAULT_SECRET_LENGTH,
        }
    }
}

impl TotpConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(6..=8).contains(&self.digits) {
            return Err(ConfigError::Digits(self.digits));
        }
        if self.period == 0 {
            return Err(ConfigError::Period);
        }
        if self.window > MAX_WINDOW {
            return Err(ConfigError::Window(self.window));
        }
        if self.secret_length < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretLength(self.secret_length));
        }

        Ok(())
    }

    pub fn clock(&self) -> Result<TotpClock, ConfigError> {
        TotpClock::new(self.epoch, self.period)
    }
}
