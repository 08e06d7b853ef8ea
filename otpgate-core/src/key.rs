use secrecy::{ExposeSecret, Zeroize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Raw secret of a TOTP enrollment that should be kept private as much as possible.
///
/// The bytes are wiped from memory on drop. Outside of the process the secret only ever travels in
/// its Base32 form, which is also what the [`Serialize`] and [`Deserialize`] implementations
/// produce and expect.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    #[must_use]
    pub fn new(content: Vec<u8>) -> Self {
        Self(content)
    }

    /// Decode a secret from its Base32 text form. Text that decodes to zero bytes is rejected.
    pub fn from_base32(text: &str) -> Result<Self, crate::base32::DecodeError> {
        let bytes = crate::base32::decode(text)?;
        if bytes.is_empty() {
            return Err(crate::base32::DecodeError::Empty);
        }

        Ok(Self(bytes))
    }

    /// Encode the secret into its Base32 text form, as shown to users and embedded in URIs.
    #[must_use]
    pub fn to_base32(&self) -> String {
        crate::base32::encode(&self.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl ExposeSecret<Vec<u8>> for SecretKey {
    fn expose_secret(&self) -> &Vec<u8> {
        &self.0
    }
}

#[cfg(test)]
impl secrecy::DebugSecret for SecretKey {}

impl Serialize for SecretKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        crate::de::base32_string::serialize(self.expose_secret(), serializer)
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = crate::de::base32_string::deserialize(deserializer)?;
        if bytes.is_empty() {
            return Err(serde::de::Error::custom(crate::base32::DecodeError::Empty));
        }

        Ok(Self(bytes))
    }
}
