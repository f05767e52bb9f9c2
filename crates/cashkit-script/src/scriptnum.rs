//! Script number encoding: minimal little-endian magnitude with the sign in
//! the high bit of the last byte. Zero is the empty byte string.

use crate::ScriptError;

/// Encode `n` as a minimally-encoded script number.
pub fn encode(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }
    let negative = n < 0;
    let mut magnitude = n.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    // A set high bit would read as the sign, so add a byte to carry it.
    match out.last_mut() {
        Some(last) if *last & 0x80 != 0 => out.push(if negative { 0x80 } else { 0x00 }),
        Some(last) if negative => *last |= 0x80,
        _ => {}
    }
    out
}

/// Decode a script number of at most `max_len` bytes.
///
/// Non-minimal encodings are rejected, as consensus does for
/// `OP_CHECKLOCKTIMEVERIFY` operands.
pub fn decode(bytes: &[u8], max_len: usize) -> Result<i64, ScriptError> {
    if bytes.len() > max_len || bytes.len() > 8 {
        return Err(ScriptError::InvalidOpcodeData);
    }
    let Some((&last, rest)) = bytes.split_last() else {
        return Ok(0);
    };
    if last & 0x7f == 0 && rest.last().map_or(true, |b| b & 0x80 == 0) {
        return Err(ScriptError::InvalidOpcodeData);
    }

    let mut magnitude: u64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let b = if i == bytes.len() - 1 { b & 0x7f } else { b };
        magnitude |= (b as u64) << (8 * i);
    }
    let magnitude = i64::try_from(magnitude).map_err(|_| ScriptError::InvalidOpcodeData)?;
    Ok(if last & 0x80 != 0 { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_values() {
        let cases: [(i64, &str); 10] = [
            (0, ""),
            (1, "01"),
            (-1, "81"),
            (127, "7f"),
            (128, "8000"),
            (-128, "8080"),
            (255, "ff00"),
            (256, "0001"),
            (500_000_000, "0065cd1d"),
            (1_700_000_000, "00f15365"),
        ];
        for (n, expected) in cases {
            assert_eq!(hex::encode(encode(n)), expected, "encoding of {}", n);
            assert_eq!(decode(&encode(n), 5).unwrap(), n);
        }
    }

    #[test]
    fn test_decode_rejects_non_minimal() {
        assert!(decode(&[0x00], 4).is_err());
        assert!(decode(&[0x01, 0x00], 4).is_err());
        assert!(decode(&[0x80], 4).is_err());
        // a padding byte is allowed when it carries the sign bit
        assert_eq!(decode(&[0xff, 0x00], 4).unwrap(), 255);
        assert!(decode(&[1, 2, 3, 4, 5], 4).is_err());
    }
}
