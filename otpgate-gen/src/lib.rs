//! # OTPGate Gen(erator)
//!
//! Generator component of **OTPGate**. It creates new secrets, derives HOTP/TOTP codes from them
//! and verifies codes submitted by users against the current time.

#![deny(rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]

use std::time::{SystemTime, SystemTimeError};

use otpgate_core::ExposeSecret;
pub use otpgate_core::{Algorithm, SecretKey};

pub use self::{
    clock::TotpClock,
    config::{ConfigError, TotpConfig},
    hotp::{compute, OtpCode},
    random::{generate_secret, generate_secret_with},
    verify::{Rejection, TotpVerifier},
};

mod clock;
mod config;
mod hotp;
mod random;
mod verify;

/// Errors that can occur when generating secrets or OTPs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to get a timestamp from the system.
    #[error("failed to get time since unix epoch")]
    Time(#[from] SystemTimeError),
    /// The point in time lies before the epoch of the TOTP clock.
    #[error("the given time lies before the clock epoch")]
    BeforeEpoch,
    /// The provided key was rejected by the MAC.
    #[error("the given key has an invalid length")]
    KeyLength(#[from] hmac::digest::InvalidLength),
    /// The secure random source of the system couldn't be read.
    #[error("secure random source is unavailable")]
    Entropy(#[from] rand::Error),
    /// Parameters were out of their allowed range.
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
}

/// Create the TOTP code of `secret` that is valid at the given `instant`.
pub fn generate(
    secret: &SecretKey,
    config: &TotpConfig,
    instant: SystemTime,
) -> Result<OtpCode, Error> {
    let counter = config.clock()?.counter_at(instant)?;
    compute(secret.expose_secret(), counter, config.digits, config.algorithm)
}
