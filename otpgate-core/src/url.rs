use std::str::FromStr;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::{Algorithm, Enrollment, SecretKey, DEFAULT_DIGITS, DEFAULT_PERIOD};

/// Characters that are escaped in the issuer and account parts. Everything except the RFC 3986
/// unreserved set, so a `:` inside either part can't be confused with the label separator.
const LABEL: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The issuer or account of an enrollment is unusable.
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    /// The issuer was empty.
    #[error("the issuer must not be empty")]
    EmptyIssuer,
    /// The account name was empty.
    #[error("the account must not be empty")]
    EmptyAccount,
}

/// Any error that can happen when parsing an [`Enrollment`](crate::Enrollment) from an URL.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input didn't form a valid URL.
    #[error("the URL is not valid")]
    InvalidUrl(#[from] url::ParseError),
    /// An unknown scheme was used in the URL.
    #[error("the scheme `{0}` is not supported, only `otpauth`")]
    InvalidScheme(String),
    /// The host part of the URL was missing.
    #[error("host is missing")]
    MissingHost,
    /// The host part of the URL was unsupported.
    #[error("host (otp type) is `{0}` but only `totp` is supported")]
    InvalidHost(String),
    /// Parameters of the URL failed to deserialize.
    #[error("parameters failed to deserialize")]
    Deserialize(#[from] serde_qs::Error),
    /// The input was no proper UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Issuer or account are missing.
    #[error("invalid label")]
    Label(#[from] LabelError),
    /// The amount of digits is outside of `6..=8`.
    #[error("unsupported amount of digits {0}, only 6 to 8 are supported")]
    InvalidDigits(u8),
    /// The period was zero.
    #[error("the period must be at least 1 second")]
    InvalidPeriod,
}

#[derive(Deserialize)]
struct Params {
    secret: SecretKey,
    issuer: Option<String>,
    #[serde(default)]
    algorithm: Algorithm,
    #[serde(default = "default_digits")]
    digits: u8,
    #[serde(default = "default_period")]
    period: u64,
}

/// Kind of OTP named in the host part. Counter based and vendor specific variants aren't
/// supported.
#[derive(Clone, Copy, Debug)]
enum OtpType {
    Totp,
}

impl FromStr for OtpType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("totp") {
            Ok(Self::Totp)
        } else {
            Err(ParseError::InvalidHost(s.to_owned()))
        }
    }
}

#[inline(always)]
fn default_digits() -> u8 {
    DEFAULT_DIGITS
}

#[inline(always)]
fn default_period() -> u64 {
    DEFAULT_PERIOD
}

/// Format the `otpauth://` URI that authenticator apps consume, usually by scanning it as QR code.
///
/// The `issuer` and `account` are percent-encoded, while the `encoded_secret` is expected to be in
/// Base32 already and is embedded verbatim.
pub fn build(
    issuer: &str,
    account: &str,
    encoded_secret: &str,
    digits: u8,
    period: u64,
    algorithm: Algorithm,
) -> Result<String, LabelError> {
    if issuer.is_empty() {
        return Err(LabelError::EmptyIssuer);
    }
    if account.is_empty() {
        return Err(LabelError::EmptyAccount);
    }

    let issuer = percent_encoding::utf8_percent_encode(issuer, LABEL);
    let account = percent_encoding::utf8_percent_encode(account, LABEL);

    Ok(format!(
        "otpauth://totp/{issuer}:{account}?secret={encoded_secret}&issuer={issuer}\
         &algorithm={algorithm}&digits={digits}&period={period}"
    ))
}

impl Enrollment {
    /// Create the `otpauth://` URI for this enrollment.
    pub fn to_uri(&self) -> Result<String, LabelError> {
        build(
            &self.issuer,
            &self.account,
            &self.secret.to_base32(),
            self.digits,
            self.period,
            self.algorithm,
        )
    }
}

pub fn parse(value: &str) -> Result<Enrollment, ParseError> {
    let url = url::Url::parse(value)?;

    if url.scheme() != "otpauth" {
        return Err(ParseError::InvalidScheme(url.scheme().to_owned()));
    }

    url.host_str()
        .ok_or(ParseError::MissingHost)?
        .parse::<OtpType>()?;

    let query = url.query().unwrap_or_default();
    let params = serde_qs::from_str::<Params>(query)?;

    let path = url.path();
    let label = path.strip_prefix('/').unwrap_or(path);

    // Split before decoding, an escaped `:` belongs to the issuer or account itself.
    let (prefix, account) = match label.split_once(':') {
        Some((issuer, account)) => (Some(decode(issuer)?), decode(account)?),
        None => (None, decode(label)?),
    };

    let issuer = params
        .issuer
        .filter(|i| !i.is_empty())
        .or(prefix)
        .filter(|i| !i.is_empty())
        .ok_or(LabelError::EmptyIssuer)?;

    if account.is_empty() {
        return Err(LabelError::EmptyAccount.into());
    }
    if !(6..=8).contains(&params.digits) {
        return Err(ParseError::InvalidDigits(params.digits));
    }
    if params.period == 0 {
        return Err(ParseError::InvalidPeriod);
    }

    Ok(Enrollment {
        issuer,
        account,
        secret: params.secret,
        digits: params.digits,
        period: params.period,
        algorithm: params.algorithm,
    })
}

fn decode(value: &str) -> Result<String, ParseError> {
    Ok(percent_encoding::percent_decode_str(value)
        .decode_utf8()?
        .into_owned())
}
