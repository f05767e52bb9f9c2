//! Script chunk parsing and push encoding.
//!
//! A chunk is one opcode, or one push opcode together with the bytes it
//! pushes.

use crate::opcodes::*;
use crate::ScriptError;

/// One parsed element of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes) this is the length.
    pub op: u8,
    /// Pushed bytes, `None` for non-push opcodes.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// True for an opcode chunk (no pushed data).
    pub fn is_opcode(&self) -> bool {
        self.data.is_none()
    }

    /// ASM token: hex for pushes, the opcode name otherwise.
    pub fn to_asm_string(&self) -> String {
        match &self.data {
            Some(data) => hex::encode(data),
            None => opcode_to_string(self.op).to_string(),
        }
    }
}

/// Parse the chunk starting at `*pos` and advance past it.
pub(crate) fn read_chunk(bytes: &[u8], pos: &mut usize) -> Result<ScriptChunk, ScriptError> {
    let op = *bytes.get(*pos).ok_or(ScriptError::DataTooSmall)?;
    let mut cursor = *pos + 1;

    let len = match op {
        OP_DATA_1..=OP_DATA_75 => op as usize,
        OP_PUSHDATA1 => read_le(bytes, &mut cursor, 1)?,
        OP_PUSHDATA2 => read_le(bytes, &mut cursor, 2)?,
        OP_PUSHDATA4 => read_le(bytes, &mut cursor, 4)?,
        _ => {
            *pos = cursor;
            return Ok(ScriptChunk { op, data: None });
        }
    };

    let end = cursor.checked_add(len).ok_or(ScriptError::DataTooSmall)?;
    let data = bytes.get(cursor..end).ok_or(ScriptError::DataTooSmall)?.to_vec();
    *pos = end;
    Ok(ScriptChunk { op, data: Some(data) })
}

fn read_le(bytes: &[u8], cursor: &mut usize, width: usize) -> Result<usize, ScriptError> {
    let raw = bytes
        .get(*cursor..*cursor + width)
        .ok_or(ScriptError::DataTooSmall)?;
    *cursor += width;
    Ok(raw.iter().rev().fold(0usize, |acc, &b| (acc << 8) | b as usize))
}

/// Decode raw script bytes into chunks.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        chunks.push(read_chunk(bytes, &mut pos)?);
    }
    Ok(chunks)
}

/// The minimal push prefix for `data_len` bytes.
///
/// Empty pushes use `OP_0`, which pushes the empty byte string.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    let prefix = match data_len {
        0 => vec![OP_0],
        1..=75 => vec![data_len as u8],
        76..=0xff => vec![OP_PUSHDATA1, data_len as u8],
        0x100..=0xffff => {
            let mut p = vec![OP_PUSHDATA2];
            p.extend_from_slice(&(data_len as u16).to_le_bytes());
            p
        }
        _ => {
            let len = u32::try_from(data_len).map_err(|_| ScriptError::DataTooBig)?;
            let mut p = vec![OP_PUSHDATA4];
            p.extend_from_slice(&len.to_le_bytes());
            p
        }
    };
    Ok(prefix)
}
