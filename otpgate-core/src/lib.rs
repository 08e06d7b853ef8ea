//! # OTPGate Core
//!
//! Core component of **OTPGate** that is shared between all other components and serves as
//! building block. It holds the [`SecretKey`] of an enrollment, the Base32 codec used to show that
//! secret to users, and the [`Enrollment`] data that authenticator apps receive through an
//! `otpauth://` URI.

#![deny(rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::inline_always, clippy::missing_errors_doc)]

use std::{
    fmt::{self, Display},
    str::FromStr,
};

pub use key::SecretKey;
pub use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

#[cfg(feature = "otpurl")]
pub use self::url::{build as build_uri, LabelError, ParseError};

pub mod base32;
pub mod de;
mod key;
#[cfg(feature = "otpurl")]
mod url;

/// Most common amount of digits for OTPs.
pub const DEFAULT_DIGITS: u8 = 6;
/// Default time step of TOTP codes, in seconds.
pub const DEFAULT_PERIOD: u64 = 30;

/// A TOTP enrollment that contains the information to create OTPs for a single account.
#[derive(Serialize, Deserialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Enrollment {
    /// Name of the service that issued the secret, shown as title in authenticator apps.
    pub issuer: String,
    /// Account the secret belongs to, usually a user name or mail address.
    pub account: String,
    /// The secret key to generate correct OTPs.
    pub secret: SecretKey,
    /// Amount of digits to produce as OTP.
    pub digits: u8,
    /// Seconds that an OTP is considered valid.
    pub period: u64,
    /// Algorithm that is used to generate OTPs.
    pub algorithm: Algorithm,
}

#[cfg(feature = "otpurl")]
impl FromStr for Enrollment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::url::parse(s)
    }
}

/// Algorithm used in the OTP generation to create the final code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Algorithm {
    /// SHA-1 algorithm, most common and the only one every authenticator app supports.
    #[default]
    Sha1,
    /// SHA(2)-256 algorithm.
    Sha256,
    /// SHA(2)-512 algorithm.
    Sha512,
}

impl Algorithm {
    /// Name of the algorithm as used in the `algorithm` parameter of otpauth URIs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The named digest algorithm isn't one of the supported ones.
#[derive(Debug, thiserror::Error)]
#[error("unsupported digest algorithm `{0}`, only SHA1, SHA256 or SHA512 are supported")]
pub struct UnsupportedAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("sha1") {
            Self::Sha1
        } else if s.eq_ignore_ascii_case("sha256") {
            Self::Sha256
        } else if s.eq_ignore_ascii_case("sha512") {
            Self::Sha512
        } else {
            return Err(UnsupportedAlgorithm(s.to_owned()));
        })
    }
}

impl TryFrom<String> for Algorithm {
    type Error = UnsupportedAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Algorithm> for &'static str {
    fn from(value: Algorithm) -> Self {
        value.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names() {
        assert_eq!(Algorithm::Sha1, "sha1".parse::<Algorithm>().unwrap());
        assert_eq!(Algorithm::Sha256, "SHA256".parse::<Algorithm>().unwrap());
        assert_eq!(Algorithm::Sha512, "Sha512".parse::<Algorithm>().unwrap());
        assert!("md5".parse::<Algorithm>().is_err());
        assert!("sha-1".parse::<Algorithm>().is_err());

        assert_eq!("SHA512", Algorithm::Sha512.to_string());
    }
}
