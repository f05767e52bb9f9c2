//! secp256k1 private key with WIF import/export and deterministic signing.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::base58;
use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::PrimitivesError;

const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// WIF version byte for mainnet keys.
pub const MAINNET_WIF_PREFIX: u8 = 0x80;

/// WIF version byte for testnet and regtest keys.
pub const TESTNET_WIF_PREFIX: u8 = 0xef;

/// Trailing byte marking a WIF key whose public key is used compressed.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 signing key.
///
/// The caller owns key material; nothing in cashkit stores or generates keys.
/// The inner `SigningKey` wipes its scalar on drop.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a random key from the operating system RNG.
    pub fn random() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
        }
    }

    /// Parse a 32-byte big-endian scalar.
    ///
    /// Zero and values at or above the curve order are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Decode a Wallet Import Format string.
    ///
    /// Both mainnet (`0x80`) and testnet (`0xef`) prefixes are accepted, with
    /// or without the compression flag.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        let payload = base58::check_decode(wif).map_err(|e| match e {
            PrimitivesError::ChecksumMismatch => e,
            other => PrimitivesError::InvalidWif(other.to_string()),
        })?;

        let key_bytes = match payload.len() {
            33 => &payload[1..],
            34 if payload[33] == COMPRESS_MAGIC => &payload[1..33],
            34 => {
                return Err(PrimitivesError::InvalidWif(
                    "malformed private key: invalid compression flag".to_string(),
                ))
            }
            n => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "malformed private key: invalid length {}",
                    n
                )))
            }
        };
        if payload[0] != MAINNET_WIF_PREFIX && payload[0] != TESTNET_WIF_PREFIX {
            return Err(PrimitivesError::InvalidWif(format!(
                "unknown network prefix 0x{:02x}",
                payload[0]
            )));
        }
        Self::from_bytes(key_bytes)
    }

    /// Mainnet compressed WIF.
    pub fn to_wif(&self) -> String {
        self.to_wif_prefix(MAINNET_WIF_PREFIX)
    }

    /// Compressed WIF with an explicit network prefix byte.
    pub fn to_wif_prefix(&self, prefix: u8) -> String {
        let mut payload = Vec::with_capacity(PRIVATE_KEY_BYTES_LEN + 2);
        payload.push(prefix);
        payload.extend_from_slice(&self.to_bytes());
        payload.push(COMPRESS_MAGIC);
        let wif = base58::check_encode(&payload);
        payload.zeroize();
        wif
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The matching public key.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_k256_verifying_key(self.inner.verifying_key())
    }

    /// Sign a 32-byte digest with an RFC 6979 nonce, producing a low-S
    /// signature.
    pub fn sign(&self, hash: &[u8]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PrivateKey {}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey({})", self.pub_key())
    }
}
