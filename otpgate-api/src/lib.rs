//! # OTPGate API
//!
//! Request and response contracts of the enrollment and verification endpoints. A web layer
//! deserializes requests into the types of this crate, calls the [`Authenticator`] and sends back
//! the [`Reply`] with the status code it carries. Nothing in here performs any network I/O.

#![deny(rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

use std::time::SystemTime;

use otpgate_core::{Enrollment, ExposeSecret};
use otpgate_gen::{ConfigError, Error, Rejection, TotpConfig, TotpVerifier};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Message for every rejected code, no matter whether it was malformed, wrong or expired.
pub const INVALID_CODE: &str = "invalid code";
const MISSING_FIELDS: &str = "code and secret are required";
const INVALID_SECRET: &str = "secret is not valid base32";
const INVALID_REQUEST: &str = "request body is not valid";
const ENTROPY_FAILURE: &str = "failed to generate secret";
const SERVER_FAILURE: &str = "server error during verification";

/// Outcome class of a request, mapping to an HTTP status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// The caller sent something unusable.
    ClientFault,
    /// The request failed for reasons the caller can't influence.
    ServerFault,
}

impl Status {
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::ClientFault => 400,
            Self::ServerFault => 500,
        }
    }
}

/// Response body, either the success payload or an error message.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Body<T> {
    Success(T),
    Error { error: String },
}

/// Response of an endpoint, ready to be sent by the web layer.
#[derive(Debug, PartialEq, Eq)]
pub struct Reply<T> {
    pub status: Status,
    pub body: Body<T>,
}

impl<T> Reply<T> {
    /// Split into the success payload or the error message.
    pub fn into_result(self) -> Result<T, String> {
        match self.body {
            Body::Success(value) => Ok(value),
            Body::Error { error } => Err(error),
        }
    }
}

impl<T: Serialize> Reply<T> {
    fn success(body: T) -> Self {
        Self {
            status: Status::Ok,
            body: Body::Success(body),
        }
    }

    fn error(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Body::Error {
                error: message.into(),
            },
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Ok
    }

    /// Render the body as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body)
    }
}

/// Successful enrollment: the secret to show the user and the URI to render as QR code.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrolled {
    pub encoded_secret: String,
    #[serde(rename = "enrollmentURI")]
    pub enrollment_uri: String,
}

/// Verification request as sent by the client. Both fields are optional on the wire, so missing
/// ones can be reported as client fault instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub submitted_code: Option<String>,
    pub encoded_secret: Option<String>,
}

/// Successful verification.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Verified {
    pub success: bool,
}

/// Serves enrollments and verifications for a single issuer.
pub struct Authenticator {
    issuer: String,
    config: TotpConfig,
    verifier: TotpVerifier,
}

impl Authenticator {
    /// Create a new instance, failing on invalid settings so that a misconfiguration surfaces at
    /// startup rather than per request.
    pub fn new(issuer: impl Into<String>, config: TotpConfig) -> Result<Self, ConfigError> {
        let verifier = TotpVerifier::new(&config)?;

        Ok(Self {
            issuer: issuer.into(),
            config,
            verifier,
        })
    }

    /// Start a new enrollment for `account`, with a secret from the system's secure random source.
    pub fn enroll(&self, account: &str) -> Reply<Enrolled> {
        self.enroll_with(&mut OsRng, account)
    }

    /// Start a new enrollment for `account`, drawing the secret from `rng`.
    pub fn enroll_with<R>(&self, rng: &mut R, account: &str) -> Reply<Enrolled>
    where
        R: RngCore + CryptoRng,
    {
        let secret = match otpgate_gen::generate_secret_with(rng, self.config.secret_length) {
            Ok(secret) => secret,
            Err(e) => {
                error!(error = %e, "failed generating secret");
                return Reply::error(Status::ServerFault, ENTROPY_FAILURE);
            }
        };

        let enrollment = Enrollment {
            issuer: self.issuer.clone(),
            account: account.to_owned(),
            secret,
            digits: self.config.digits,
            period: self.config.period,
            algorithm: self.config.algorithm,
        };

        match enrollment.to_uri() {
            Ok(uri) => {
                info!(
                    issuer = %enrollment.issuer,
                    account = %enrollment.account,
                    bits = enrollment.secret.len() * 8,
                    "created enrollment"
                );

                Reply::success(Enrolled {
                    encoded_secret: enrollment.secret.to_base32(),
                    enrollment_uri: uri,
                })
            }
            Err(e) => {
                warn!(error = %e, "rejected enrollment");
                Reply::error(Status::ClientFault, e.to_string())
            }
        }
    }

    /// Verify a code submitted for the given secret.
    pub fn verify(&self, request: &VerifyRequest, now: SystemTime) -> Reply<Verified> {
        let (Some(code), Some(secret)) = (
            request.submitted_code.as_deref().filter(|c| !c.is_empty()),
            request.encoded_secret.as_deref().filter(|s| !s.is_empty()),
        ) else {
            warn!("verification request without code or secret");
            return Reply::error(Status::ClientFault, MISSING_FIELDS);
        };

        let secret = match otpgate_core::SecretKey::from_base32(secret) {
            Ok(secret) => secret,
            Err(_) => {
                warn!("verification request with undecodable secret");
                return Reply::error(Status::ClientFault, INVALID_SECRET);
            }
        };

        match self.verifier.check(secret.expose_secret(), code, now) {
            Ok(_) => {
                info!("code accepted");
                Reply::success(Verified { success: true })
            }
            Err(Rejection::Engine(e)) => server_failure(&e),
            Err(Rejection::InvalidSecretEncoding(_)) => {
                Reply::error(Status::ClientFault, INVALID_SECRET)
            }
            Err(reason) => {
                info!(reason = rejection_kind(&reason), "code rejected");
                Reply::error(Status::ClientFault, INVALID_CODE)
            }
        }
    }

    /// Verify a code from a raw JSON request body.
    pub fn verify_json(&self, body: &str, now: SystemTime) -> Reply<Verified> {
        match serde_json::from_str::<VerifyRequest>(body) {
            Ok(request) => self.verify(&request, now),
            Err(e) => {
                warn!(error = %e, "malformed verification request");
                Reply::error(Status::ClientFault, INVALID_REQUEST)
            }
        }
    }
}

fn server_failure(e: &Error) -> Reply<Verified> {
    error!(error = %e, "verification failed");
    Reply::error(Status::ServerFault, SERVER_FAILURE)
}

fn rejection_kind(reason: &Rejection) -> &'static str {
    match reason {
        Rejection::MalformedCode => "malformed",
        Rejection::Mismatch => "mismatch",
        Rejection::Replayed => "replayed",
        Rejection::InvalidSecretEncoding(_) => "secret",
        Rejection::Engine(_) => "engine",
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use otpgate_core::SecretKey;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn authenticator() -> Authenticator {
        Authenticator::new("ACME Co", TotpConfig::default()).unwrap()
    }

    fn request(code: Option<&str>, secret: Option<&str>) -> VerifyRequest {
        VerifyRequest {
            submitted_code: code.map(ToOwned::to_owned),
            encoded_secret: secret.map(ToOwned::to_owned),
        }
    }

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn enroll_contract() {
        let mut rng = StdRng::seed_from_u64(1);
        let reply = authenticator().enroll_with(&mut rng, "john.doe@example.com");

        assert_eq!(Status::Ok, reply.status);
        let Body::Success(enrolled) = &reply.body else {
            panic!("enrollment failed");
        };

        let secret = SecretKey::from_base32(&enrolled.encoded_secret).unwrap();
        assert_eq!(20, secret.len());
        assert_eq!(
            format!(
                "otpauth://totp/ACME%20Co:john.doe%40example.com?secret={}\
                 &issuer=ACME%20Co&algorithm=SHA1&digits=6&period=30",
                enrolled.encoded_secret
            ),
            enrolled.enrollment_uri
        );

        let json = serde_json::from_str::<serde_json::Value>(&reply.to_json().unwrap()).unwrap();
        assert_eq!(
            serde_json::json!({
                "encodedSecret": enrolled.encoded_secret,
                "enrollmentURI": enrolled.enrollment_uri,
            }),
            json
        );
    }

    #[test]
    fn enroll_with_system_entropy() {
        let reply = authenticator().enroll("Jane Smith");
        let Body::Success(enrolled) = &reply.body else {
            panic!("enrollment failed");
        };

        let secret = SecretKey::from_base32(&enrolled.encoded_secret).unwrap();
        assert_eq!(20, secret.len());
        assert!(enrolled
            .enrollment_uri
            .starts_with("otpauth://totp/ACME%20Co:Jane%20Smith?secret="));
        assert!(enrolled
            .enrollment_uri
            .contains(&format!("secret={}&", enrolled.encoded_secret)));
    }

    #[test]
    fn enroll_entropy_failure() {
        struct Exhausted;

        impl RngCore for Exhausted {
            fn next_u32(&mut self) -> u32 {
                0
            }

            fn next_u64(&mut self) -> u64 {
                0
            }

            fn fill_bytes(&mut self, _dest: &mut [u8]) {}

            fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
                Err(rand::Error::new("entropy source closed"))
            }
        }

        impl CryptoRng for Exhausted {}

        let reply = authenticator().enroll_with(&mut Exhausted, "jane");
        assert_eq!(Status::ServerFault, reply.status);
        assert_eq!(
            r#"{"error":"failed to generate secret"}"#,
            reply.to_json().unwrap()
        );
    }

    #[test]
    fn enroll_escapes_reserved_characters() {
        let auth = Authenticator::new("Big: Corp", TotpConfig::default()).unwrap();
        let enrolled = auth.enroll("a:b&c=d").into_result().unwrap();

        assert_eq!(
            format!(
                "otpauth://totp/Big%3A%20Corp:a%3Ab%26c%3Dd?secret={}\
                 &issuer=Big%3A%20Corp&algorithm=SHA1&digits=6&period=30",
                enrolled.encoded_secret
            ),
            enrolled.enrollment_uri
        );

        let parsed = enrolled.enrollment_uri.parse::<Enrollment>().unwrap();
        assert_eq!("Big: Corp", parsed.issuer);
        assert_eq!("a:b&c=d", parsed.account);
        assert_eq!(enrolled.encoded_secret, parsed.secret.to_base32());
    }

    #[test]
    fn enroll_rejects_empty_account() {
        let reply = authenticator().enroll("");
        assert_eq!(Status::ClientFault, reply.status);
    }

    #[test]
    fn verify_accepts() {
        let reply = authenticator().verify(&request(Some("287082"), Some(SECRET)), at(59));

        assert_eq!(Status::Ok, reply.status);
        assert_eq!(r#"{"success":true}"#, reply.to_json().unwrap());
    }

    #[test]
    fn verify_missing_fields() {
        let auth = authenticator();

        for req in [
            request(None, Some(SECRET)),
            request(Some("287082"), None),
            request(Some(""), Some(SECRET)),
            request(None, None),
        ] {
            let reply = auth.verify(&req, at(59));
            assert_eq!(Status::ClientFault, reply.status);
            assert_eq!(
                Body::Error {
                    error: MISSING_FIELDS.to_owned()
                },
                reply.body
            );
        }
    }

    #[test]
    fn verify_bad_secret() {
        let reply = authenticator().verify(&request(Some("287082"), Some("0189")), at(59));

        assert_eq!(Status::ClientFault, reply.status);
        assert_eq!(
            Body::Error {
                error: INVALID_SECRET.to_owned()
            },
            reply.body
        );
    }

    #[test]
    fn verify_padding_only_secret() {
        let code = otpgate_gen::compute(&[], 1, 6, otpgate_core::Algorithm::Sha1)
            .unwrap()
            .to_string();

        for secret in ["=", "===="] {
            let reply =
                authenticator().verify(&request(Some(code.as_str()), Some(secret)), at(59));

            assert_eq!(Status::ClientFault, reply.status);
            assert_eq!(Err(INVALID_SECRET.to_owned()), reply.into_result());
        }
    }

    #[test]
    fn into_result() {
        let reply = authenticator().verify(&request(Some("287082"), Some(SECRET)), at(59));
        assert_eq!(Ok(Verified { success: true }), reply.into_result());

        let reply = authenticator().verify(&request(Some("287083"), Some(SECRET)), at(59));
        assert_eq!(Err(INVALID_CODE.to_owned()), reply.into_result());
    }

    #[test]
    fn verify_uniform_rejection() {
        let auth = authenticator();

        for (code, time) in [
            ("28708", 59),
            ("28708x", 59),
            ("287083", 59),
            ("287082", 59 + 90),
        ] {
            let reply = auth.verify(&request(Some(code), Some(SECRET)), at(time));
            assert_eq!(Status::ClientFault, reply.status);
            assert_eq!(r#"{"error":"invalid code"}"#, reply.to_json().unwrap());
        }
    }

    #[test]
    fn verify_json_body() {
        let auth = authenticator();

        let reply = auth.verify_json(
            &format!(r#"{{"submittedCode":"287082","encodedSecret":"{SECRET}"}}"#),
            at(59),
        );
        assert!(reply.is_success());

        let reply = auth.verify_json("{not json", at(59));
        assert_eq!(Status::ClientFault, reply.status);
    }

    #[test]
    fn verify_before_epoch() {
        let auth = Authenticator::new(
            "ACME",
            TotpConfig {
                epoch: 1_000,
                ..TotpConfig::default()
            },
        )
        .unwrap();

        let reply = auth.verify(&request(Some("287082"), Some(SECRET)), at(59));
        assert_eq!(Status::ServerFault, reply.status);
        assert_eq!(500, reply.status.code());
    }

    #[test]
    fn invalid_config_fails_early() {
        assert!(Authenticator::new(
            "ACME",
            TotpConfig {
                digits: 10,
                ..TotpConfig::default()
            }
        )
        .is_err());
    }
}
