//! Key management and signing

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Ed25519 private key used to sign frozen request bodies.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    pub fn generate() -> Self {
        Self(SigningKey::generate(&mut OsRng))
    }

    /// Accepts a 32-byte seed or a 64-byte seed+public concatenation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: [u8; 32] = match bytes.len() {
            32 | 64 => bytes[..32]
                .try_into()
                .map_err(|_| Error::Key("seed slice conversion failed".into()))?,
            other => {
                return Err(Error::Key(format!(
                    "expected 32 or 64 key bytes, got {other}"
                )))
            }
        };
        if seed.iter().all(|&b| b == 0) {
            return Err(Error::Key("all-zero key rejected".into()));
        }
        Ok(Self(SigningKey::from_bytes(&seed)))
    }

    /// Load a key from a file holding raw bytes, a hex string, or a JSON
    /// byte array.
    pub fn from_file(path: &str) -> Result<Self> {
        let mut raw = std::fs::read(path)
            .map_err(|e| Error::Key(format!("failed to read key file {path}: {e}")))?;

        let key = if raw.len() == 32 || raw.len() == 64 {
            Self::from_bytes(&raw)
        } else if let Ok(text) = std::str::from_utf8(&raw) {
            let trimmed = text.trim();
            if trimmed.starts_with('[') {
                let mut bytes: Vec<u8> = serde_json::from_str(trimmed)
                    .map_err(|e| Error::Key(format!("invalid JSON key file {path}: {e}")))?;
                let key = Self::from_bytes(&bytes);
                bytes.zeroize();
                key
            } else {
                trimmed.parse()
            }
        } else {
            Err(Error::Key(format!("unrecognized key file format: {path}")))
        };

        raw.zeroize();
        key
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Sign `message`, returning the 64-byte detached signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.0.sign(message).to_bytes().to_vec()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&"<redacted>").finish()
    }
}

impl FromStr for PrivateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes =
            hex::decode(s.trim()).map_err(|_| Error::Key("key is not valid hex".into()))?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }
}

/// Ed25519 public key; also the signature-entry identity in signed payloads.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Key(format!("expected 32 public key bytes, got {}", bytes.len())))?;
        VerifyingKey::from_bytes(&arr)
            .map(Self)
            .map_err(|e| Error::Key(format!("invalid public key: {e}")))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let signature = ed25519_dalek::Signature::from_slice(signature)
            .map_err(|e| Error::Signature(format!("malformed signature: {e}")))?;
        self.0
            .verify(message, &signature)
            .map_err(|e| Error::Signature(format!("verification failed: {e}")))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_bytes()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes =
            hex::decode(s.trim()).map_err(|_| Error::Key("key is not valid hex".into()))?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let key = PrivateKey::generate();
        let message = b"frozen body bytes";
        let signature = key.sign(message);
        assert_eq!(signature.len(), 64);
        key.public_key().verify(message, &signature).unwrap();
        assert!(key.public_key().verify(b"other", &signature).is_err());
    }

    #[test]
    fn from_bytes_accepts_seed_and_keypair_lengths() {
        let key = PrivateKey::generate();
        let seed = key.to_bytes();

        let from_seed = PrivateKey::from_bytes(&seed).unwrap();
        assert_eq!(from_seed.public_key(), key.public_key());

        let mut keypair = seed.to_vec();
        keypair.extend_from_slice(&key.public_key().to_bytes());
        let from_pair = PrivateKey::from_bytes(&keypair).unwrap();
        assert_eq!(from_pair.public_key(), key.public_key());

        assert!(PrivateKey::from_bytes(&[1u8; 16]).is_err());
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn hex_round_trip() {
        let key = PrivateKey::generate();
        let parsed: PrivateKey = hex::encode(key.to_bytes()).parse().unwrap();
        assert_eq!(parsed.public_key(), key.public_key());

        let public: PublicKey = key.public_key().to_string().parse().unwrap();
        assert_eq!(public, key.public_key());
    }

    #[test]
    fn debug_never_prints_secret_material() {
        let key = PrivateKey::generate();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains(&hex::encode(key.to_bytes())));
    }
}
