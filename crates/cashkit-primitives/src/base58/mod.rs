//! Base58Check: Base58 text over `payload || sha256d(payload)[..4]`.
//!
//! Used for WIF private keys and legacy addresses.

use crate::hash::sha256d;
use crate::PrimitivesError;

const CHECKSUM_LEN: usize = 4;

/// Append the 4-byte checksum and Base58-encode.
pub fn check_encode(payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&sha256d(payload)[..CHECKSUM_LEN]);
    bs58::encode(data).into_string()
}

/// Decode Base58 text and verify and strip its checksum.
pub fn check_decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let mut decoded = bs58::decode(s)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))?;
    if decoded.len() < CHECKSUM_LEN {
        return Err(PrimitivesError::InvalidBase58(
            "data too short for checksum".to_string(),
        ));
    }
    let split = decoded.len() - CHECKSUM_LEN;
    if sha256d(&decoded[..split])[..CHECKSUM_LEN] != decoded[split..] {
        return Err(PrimitivesError::ChecksumMismatch);
    }
    decoded.truncate(split);
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_decode_address() {
        let payload = check_decode("1BpEi6DfDAUFd7GtittLSdBeYJvcoaVggu").unwrap();
        assert_eq!(payload[0], 0x00);
        assert_eq!(
            hex::encode(&payload[1..]),
            "76a04053bda0a88bda5177b86a15c3b29f559873"
        );
    }

    #[test]
    fn test_check_encode_inverts_decode() {
        let payload = hex::decode("0076a04053bda0a88bda5177b86a15c3b29f559873").unwrap();
        assert_eq!(check_encode(&payload), "1BpEi6DfDAUFd7GtittLSdBeYJvcoaVggu");
    }

    #[test]
    fn test_check_decode_errors() {
        assert!(matches!(
            check_decode("1BpEi6DfDAUFd7GtittLSdBeYJvcoaVggv"),
            Err(PrimitivesError::ChecksumMismatch)
        ));
        assert!(matches!(check_decode("0OIl"), Err(PrimitivesError::InvalidBase58(_))));
        assert!(check_decode("1").is_err());
    }
}
