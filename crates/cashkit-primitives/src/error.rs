/// Error type for hashing, key handling, encoding and wire reads.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    /// The private key scalar or its encoding is invalid.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The bytes do not encode a point on secp256k1.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Malformed or out-of-range ECDSA signature.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Wallet Import Format string could not be decoded.
    #[error("invalid WIF format: {0}")]
    InvalidWif(String),

    /// A Base58Check checksum did not match its payload.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Chain hash text or bytes of the wrong size.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    /// The reader ran out of bytes.
    #[error("unexpected end of data")]
    UnexpectedEof,
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}

impl From<k256::ecdsa::Error> for PrimitivesError {
    fn from(e: k256::ecdsa::Error) -> Self {
        PrimitivesError::InvalidPublicKey(e.to_string())
    }
}
