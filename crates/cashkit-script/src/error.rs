/// Errors from script parsing, address decoding and script construction.
///
/// Construction failures (`InvalidThreshold`, `InvalidAddress`,
/// `ScriptTooLarge`, `InvalidLockTime`, `EmptyScript`) are caller mistakes
/// and are never worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Multisig threshold outside `1..=keys` or key count outside `1..=16`.
    #[error("invalid multisig threshold: {required} of {keys}")]
    InvalidThreshold { required: usize, keys: usize },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The encoded script exceeds the protocol size limit.
    #[error("script too large: {size} bytes (limit {limit})")]
    ScriptTooLarge { size: usize, limit: usize },

    /// The lock time does not fit the 32-bit `nLockTime` field.
    #[error("invalid lock time: {0}")]
    InvalidLockTime(String),

    /// A non-empty script or script list was required.
    #[error("script is empty")]
    EmptyScript,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Push opcodes must go through `append_push_data`.
    #[error("use append_push_data for push data opcodes: {0}")]
    InvalidOpcodeType(String),

    #[error("invalid opcode data")]
    InvalidOpcodeData,

    #[error("not a P2PKH")]
    NotP2PKH,

    /// A push claims more bytes than the script holds.
    #[error("not enough data")]
    DataTooSmall,

    #[error("data too big")]
    DataTooBig,

    #[error("primitives error: {0}")]
    Primitives(#[from] cashkit_primitives::PrimitivesError),
}
