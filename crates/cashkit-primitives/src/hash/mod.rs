//! Hash functions used by addresses, transaction ids and signature digests.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Double SHA-256, the digest behind transaction ids and signature hashes.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD-160 of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// Hash160: RIPEMD-160 over SHA-256.
///
/// Public key hashes (P2PKH) and redeem script hashes (P2SH) are both
/// Hash160 digests.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256d_empty() {
        assert_eq!(
            hex::encode(sha256d(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_ripemd160_empty() {
        assert_eq!(
            hex::encode(ripemd160(b"")),
            "9c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
    }

    /// Hash160 of a compressed public key gives its P2PKH pubkey hash.
    #[test]
    fn test_hash160_of_public_key() {
        let pubkey = hex::decode(
            "03b8b40a84123121d260f5c109bc5a46ec819c2e4002e5ba08638783bfb4e01435",
        )
        .unwrap();
        assert_eq!(
            hex::encode(hash160(&pubkey)),
            "c0a3c167a28cabb9fbb495affa0761e6e74ac60d"
        );
    }
}
