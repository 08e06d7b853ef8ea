use rand::{rngs::OsRng, CryptoRng, RngCore};

use crate::{config::MIN_SECRET_LENGTH, ConfigError, Error, SecretKey};

/// Generate a new secret of `length` bytes from the operating system's secure random source.
///
/// Fails if the random source can't be read. There is no fallback to a weaker generator.
pub fn generate_secret(length: usize) -> Result<SecretKey, Error> {
    generate_secret_with(&mut OsRng, length)
}

/// Generate a new secret of `length` bytes from the given cryptographically secure generator.
pub fn generate_secret_with<R>(rng: &mut R, length: usize) -> Result<SecretKey, Error>
where
    R: RngCore + CryptoRng,
{
    if length < MIN_SECRET_LENGTH {
        return Err(ConfigError::SecretLength(length).into());
    }

    let mut bytes = vec![0; length];
    rng.try_fill_bytes(&mut bytes)?;

    Ok(SecretKey::new(bytes))
}
