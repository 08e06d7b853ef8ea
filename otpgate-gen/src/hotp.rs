//! HMAC based one-time passwords (RFC 4226).

use std::fmt::{self, Display};

use hmac::{
    digest::{InvalidLength, KeyInit},
    Hmac, Mac,
};
use otpgate_core::Algorithm;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::{ConfigError, Error};

/// Compute the HOTP code of `secret` for the given `counter`.
///
/// This is a pure function, the same inputs always result in the same code. The only failure is a
/// `digits` value outside of `6..=8`.
pub fn compute(
    secret: &[u8],
    counter: u64,
    digits: u8,
    algorithm: Algorithm,
) -> Result<OtpCode, Error> {
    if !(6..=8).contains(&digits) {
        return Err(ConfigError::Digits(digits).into());
    }

    let digest = match algorithm {
        Algorithm::Sha1 => mac::<Hmac<Sha1>>(secret, counter)?,
        Algorithm::Sha256 => mac::<Hmac<Sha256>>(secret, counter)?,
        Algorithm::Sha512 => mac::<Hmac<Sha512>>(secret, counter)?,
    };

    Ok(OtpCode {
        value: truncate(&digest, digits),
        digits,
    })
}

fn mac<M: Mac + KeyInit>(key: &[u8], counter: u64) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = <M as KeyInit>::new_from_slice(key)?;
    mac.update(&counter.to_be_bytes());

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Dynamic truncation of the MAC output into a number with at most `digits` decimal digits.
fn truncate(digest: &[u8], digits: u8) -> u32 {
    let offset = (digest[digest.len() - 1] & 0xf) as usize;
    let bin_code = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    bin_code % 10_u32.pow(u32::from(digits))
}

/// A generated OTP code that can be used to verify identity against a service.
///
/// The numeric value may have fewer decimal places than `digits`, so it is left-padded with zeroes
/// when displayed. Call `to_string()` on an instance to get the final code.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(Debug))]
pub struct OtpCode {
    value: u32,
    digits: u8,
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0>1$}", self.value, self.digits as usize)
    }
}
