//! Drift tolerant TOTP verification.
//!
//! Every check derives all candidate codes of the window and compares each of them in constant
//! time, independent of whether the submitted code is well-formed or where it differs from a
//! candidate. Rejections all display as `invalid code` so callers can't accidentally reveal why a
//! code failed.

use std::time::SystemTime;

use otpgate_core::{base32::DecodeError, Algorithm};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use crate::{hotp, ConfigError, Error, TotpClock, TotpConfig};

/// Reasons for a submitted code to be turned down.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    /// The code doesn't consist of exactly the configured amount of decimal digits.
    #[error("invalid code")]
    MalformedCode,
    /// The code didn't match any counter inside the window.
    #[error("invalid code")]
    Mismatch,
    /// The code matched, but for a counter that was already accepted before.
    #[error("invalid code")]
    Replayed,
    /// The stored secret couldn't be decoded into raw key bytes.
    #[error("secret is not valid base32")]
    InvalidSecretEncoding(#[from] DecodeError),
    /// Deriving the candidate codes failed.
    #[error("failed to derive codes")]
    Engine(#[from] Error),
}

/// Checks submitted codes against a secret and the current time.
#[derive(Clone, Debug)]
pub struct TotpVerifier {
    clock: TotpClock,
    algorithm: Algorithm,
    digits: u8,
    window: u64,
}

impl TotpVerifier {
    pub fn new(config: &TotpConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            clock: config.clock()?,
            algorithm: config.algorithm,
            digits: config.digits,
            window: u64::from(config.window),
        })
    }

    /// Whether `code` is a valid proof of possession of `secret` at `now`.
    #[must_use]
    pub fn verify(&self, secret: &[u8], code: &str, now: SystemTime) -> bool {
        self.check(secret, code, now).is_ok()
    }

    /// Same as [`Self::verify`], for a secret in its Base32 form.
    #[must_use]
    pub fn verify_encoded(&self, encoded_secret: &str, code: &str, now: SystemTime) -> bool {
        otpgate_core::base32::decode(encoded_secret)
            .map_or(false, |secret| self.verify(&secret, code, now))
    }

    /// Check `code` and return the counter it was generated for.
    pub fn check(&self, secret: &[u8], code: &str, now: SystemTime) -> Result<u64, Rejection> {
        self.check_after(secret, code, now, None)
    }

    /// Check `code` like [`Self::check`], but additionally reject codes whose counter is not
    /// greater than `last_accepted`.
    ///
    /// Accepted codes stay valid for the rest of the window. Callers that store the returned
    /// counter and pass it back in here block replays of the same code.
    pub fn check_after(
        &self,
        secret: &[u8],
        code: &str,
        now: SystemTime,
        last_accepted: Option<u64>,
    ) -> Result<u64, Rejection> {
        if secret.is_empty() {
            return Err(DecodeError::Empty.into());
        }

        let well_formed = well_formed(code, self.digits);
        let current = self.clock.counter_at(now)?;

        let mut matched = Choice::from(0);
        let mut counter = 0_u64;

        for candidate in current.saturating_sub(self.window)..=current.saturating_add(self.window)
        {
            let expected = hotp::compute(secret, candidate, self.digits, self.algorithm)?;
            let hit = expected.to_string().as_bytes().ct_eq(code.as_bytes());

            counter.conditional_assign(&candidate, hit);
            matched |= hit;
        }

        if !bool::from(well_formed) {
            return Err(Rejection::MalformedCode);
        }
        if !bool::from(matched) {
            return Err(Rejection::Mismatch);
        }
        if last_accepted.map_or(false, |last| counter <= last) {
            return Err(Rejection::Replayed);
        }

        Ok(counter)
    }
}

/// Exactly `digits` ASCII digits, evaluated over the whole input without early exit.
fn well_formed(code: &str, digits: u8) -> Choice {
    let numeric = code.bytes().fold(Choice::from(1), |acc, b| {
        acc & Choice::from(u8::from(b.is_ascii_digit()))
    });

    numeric & (code.len() as u64).ct_eq(&u64::from(digits))
}
