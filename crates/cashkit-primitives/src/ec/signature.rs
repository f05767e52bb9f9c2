//! ECDSA signature: RFC 6979 signing, low-S normalization, strict DER.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// secp256k1 group order N, big-endian.
const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
    0x41, 0x41,
];

/// N / 2. Any S above this is replaced by N - S.
const HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B,
    0x20, 0xA0,
];

const DER_SEQUENCE: u8 = 0x30;
const DER_INTEGER: u8 = 0x02;

/// An ECDSA signature as big-endian R and S.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Signature { r, s }
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Sign a digest with `priv_key`.
    ///
    /// The nonce is derived per RFC 6979, so the same key and digest always
    /// give the same signature. S is normalized to the lower half of the
    /// group order (BIP 62), as relay policy requires.
    pub fn sign(hash: &[u8], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let digest = to_digest(hash)?;
        let (sig, _) = priv_key
            .signing_key()
            .sign_prehash_recoverable(&digest)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;

        let (r_bytes, s_bytes) = sig.split_bytes();
        Ok(Signature {
            r: r_bytes.into(),
            s: low_s(s_bytes.into()),
        })
    }

    pub fn verify(&self, hash: &[u8], pub_key: &PublicKey) -> bool {
        let Ok(digest) = to_digest(hash) else {
            return false;
        };
        let Ok(sig) = ecdsa::Signature::from_scalars(self.r, self.s) else {
            return false;
        };
        pub_key.verifying_key().verify_prehash(&digest, &sig).is_ok()
    }

    /// Parse a strict DER signature: `30 len 02 rlen R 02 slen S`.
    ///
    /// Trailing bytes after the sequence (such as a sighash flag) are
    /// rejected; strip them first.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let malformed = |why: &str| PrimitivesError::InvalidSignature(format!("malformed signature: {}", why));

        match bytes {
            [DER_SEQUENCE, len, body @ ..] if *len as usize == body.len() => {
                let (r, rest) = read_der_integer(body).ok_or_else(|| malformed("bad R"))?;
                let (s, rest) = read_der_integer(rest).ok_or_else(|| malformed("bad S"))?;
                if !rest.is_empty() {
                    return Err(malformed("trailing bytes"));
                }
                for (name, v) in [("R", &r), ("S", &s)] {
                    if v.iter().all(|&b| b == 0) || *v >= CURVE_ORDER {
                        return Err(PrimitivesError::InvalidSignature(format!(
                            "signature {} is out of range",
                            name
                        )));
                    }
                }
                Ok(Signature { r, s })
            }
            [DER_SEQUENCE, ..] => Err(malformed("bad length")),
            _ => Err(malformed("no header magic")),
        }
    }

    /// DER encoding with low-S normalization applied.
    pub fn to_der(&self) -> Vec<u8> {
        let rb = der_int(&self.r);
        let sb = der_int(&low_s(self.s));

        let mut out = Vec::with_capacity(6 + rb.len() + sb.len());
        out.push(DER_SEQUENCE);
        out.push((4 + rb.len() + sb.len()) as u8);
        for int in [rb, sb] {
            out.push(DER_INTEGER);
            out.push(int.len() as u8);
            out.extend_from_slice(&int);
        }
        out
    }
}

fn to_digest(hash: &[u8]) -> Result<[u8; 32], PrimitivesError> {
    hash.try_into().map_err(|_| {
        PrimitivesError::InvalidSignature(format!("expected a 32-byte digest, got {}", hash.len()))
    })
}

/// Minimal big-endian two's-complement integer body for DER.
fn der_int(val: &[u8; 32]) -> Vec<u8> {
    let start = val.iter().position(|&b| b != 0).unwrap_or(31);
    let trimmed = &val[start..];
    let mut out = Vec::with_capacity(33);
    if trimmed[0] & 0x80 != 0 {
        out.push(0x00);
    }
    out.extend_from_slice(trimmed);
    out
}

/// Read `02 len bytes` and left-pad the integer to 32 bytes.
fn read_der_integer(data: &[u8]) -> Option<([u8; 32], &[u8])> {
    let [DER_INTEGER, len, rest @ ..] = data else {
        return None;
    };
    let len = *len as usize;
    if len == 0 || len > rest.len() {
        return None;
    }
    let (int, rest) = rest.split_at(len);
    let start = int.iter().position(|&b| b != 0).unwrap_or(int.len());
    let significant = &int[start..];
    if significant.len() > 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out[32 - significant.len()..].copy_from_slice(significant);
    Some((out, rest))
}

fn low_s(s: [u8; 32]) -> [u8; 32] {
    if s <= HALF_ORDER {
        return s;
    }
    // N - s with byte-wise borrow.
    let mut out = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = CURVE_ORDER[i] as i16 - s[i] as i16 - borrow;
        borrow = 0;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        }
        out[i] = diff as u8;
    }
    out
}
