//! Sender public keys and a file-backed key store.
//!
//! Keys are Ed25519 verifying keys exchanged as 64 lowercase hex characters.
//! `KeyStore` is the simplest `SenderKeyFetcher`: a handle -> key map loaded
//! from JSON, for callers that do not resolve keys over the network.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

use crate::SenderHandle;
use crate::protocols::SenderKeyFetcher;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid key encoding: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid key length: need 32 bytes, got {actual}")]
    InvalidLength { actual: usize },
    #[error("bytes are not a valid Ed25519 public key")]
    InvalidPoint,
}

/// Ed25519 public key of a remote sender.
///
/// # Examples
/// ```
/// use fedwire_core::PublicKey;
///
/// let err = PublicKey::from_hex("abcd").unwrap_err();
/// assert!(err.to_string().contains("invalid key length"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_LEN]) -> Result<Self, KeyError> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidPoint)
    }

    pub fn from_hex(value: &str) -> Result<Self, KeyError> {
        let raw = hex::decode(value.trim())?;
        let bytes: [u8; PUBLIC_KEY_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidLength { actual: raw.len() })?;
        Self::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        self.0.as_bytes()
    }

    /// Check `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_LEN]) -> bool {
        let signature = Signature::from_bytes(signature);
        self.0.verify(message, &signature).is_ok()
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        Self(key)
    }
}

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("key store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid key for {handle}: {source}")]
    Key {
        handle: String,
        #[source]
        source: KeyError,
    },
}

/// Handle -> public key map, iterated in handle order.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    keys: BTreeMap<String, PublicKey>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object mapping handles to hex-encoded keys.
    pub fn from_json_str(json: &str) -> Result<Self, KeyStoreError> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        let mut store = Self::new();
        for (handle, encoded) in raw {
            let key = PublicKey::from_hex(&encoded).map_err(|source| KeyStoreError::Key {
                handle: handle.clone(),
                source,
            })?;
            store.insert(handle, key);
        }
        Ok(store)
    }

    pub fn load(path: &Path) -> Result<Self, KeyStoreError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, handle: impl Into<String>, key: PublicKey) -> Option<PublicKey> {
        self.keys.insert(handle.into(), key)
    }

    pub fn get(&self, handle: &str) -> Option<&PublicKey> {
        self.keys.get(handle)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SenderKeyFetcher for KeyStore {
    fn fetch(&self, sender: &SenderHandle) -> Option<PublicKey> {
        self.get(sender.as_str()).copied()
    }
}
