//! Base32 codec (RFC 4648 alphabet) for secrets.
//!
//! Encoding always produces uppercase text without padding, which is the form authenticator apps
//! expect. Decoding is tolerant about letter case and trailing `=` padding, but anything else that
//! isn't part of the alphabet, as well as input with a truncated final group, is rejected.

use data_encoding::BASE32_NOPAD;
use secrecy::Zeroize;

/// Failed to decode Base32 text into raw bytes.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The text contains characters outside the Base32 alphabet or has an impossible length.
    #[error("invalid base32 encoding")]
    InvalidEncoding(#[from] data_encoding::DecodeError),
    /// The text decoded to zero bytes, which is no usable secret.
    #[error("the secret is empty")]
    Empty,
}

/// Encode raw bytes as uppercase Base32 text without padding.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    BASE32_NOPAD.encode(bytes)
}

/// Decode Base32 text back into raw bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let mut text = text.trim_end_matches('=').to_ascii_uppercase();
    let decoded = BASE32_NOPAD.decode(text.as_bytes());
    text.zeroize();

    decoded.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const VECTORS: &[(&str, &str)] = &[
        ("", ""),
        ("f", "MY"),
        ("fo", "MZXQ"),
        ("foo", "MZXW6"),
        ("foob", "MZXW6YQ"),
        ("fooba", "MZXW6YTB"),
        ("foobar", "MZXW6YTBOI"),
    ];

    #[test]
    fn rfc4648_vectors() {
        for (raw, encoded) in VECTORS {
            assert_eq!(*encoded, encode(raw.as_bytes()));
            assert_eq!(raw.as_bytes(), decode(encoded).unwrap().as_slice());
        }
    }

    #[test]
    fn roundtrip_all_lengths() {
        for len in 0..=64_u8 {
            let bytes = (0..len).map(|b| b.wrapping_mul(37) ^ 0xa5).collect::<Vec<_>>();
            assert_eq!(bytes, decode(&encode(&bytes)).unwrap());
        }
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!(b"foobar".to_vec(), decode("mzxw6ytboi").unwrap());
        assert_eq!(b"foobar".to_vec(), decode("MzXw6YtBoI").unwrap());
    }

    #[test]
    fn decode_accepts_padding() {
        assert_eq!(b"foob".to_vec(), decode("MZXW6YQ=").unwrap());
        assert_eq!(b"f".to_vec(), decode("MY======").unwrap());
    }

    #[test]
    fn decode_rejects_foreign_symbols() {
        assert!(decode("MZXW1").is_err());
        assert!(decode("MZXW 6").is_err());
        assert!(decode("MZ=XW6").is_err());
        assert!(decode("MZXWÄ").is_err());
    }

    #[test]
    fn decode_rejects_truncated_input() {
        // 3 symbols can't form a whole number of bytes.
        assert!(decode("MZX").is_err());
        // Non-zero leftover bits would be silently dropped.
        assert!(decode("MZ").is_err());
    }
}
