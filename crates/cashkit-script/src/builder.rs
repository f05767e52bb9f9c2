//! Locking and unlocking script builders.
//!
//! Every builder is a pure function of its arguments, apart from
//! [`build_lock_time`], which reads the wall clock once. Failures are typed
//! [`ScriptError`]s; a builder never hands back a half-built script.

use chrono::{Duration, Utc};
use log::debug;

use cashkit_primitives::ec::{PublicKey, Signature};
use cashkit_primitives::hash::hash160;

use crate::address::{Address, AddressKind};
use crate::opcodes::*;
use crate::{scriptnum, Script, ScriptError, MAX_SCRIPT_ELEMENT_SIZE, MAX_SCRIPT_SIZE};

/// Lock time values below this are block heights, at or above it Unix
/// timestamps.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Most public keys a bare `OP_CHECKMULTISIG` script can name, since the key
/// count is pushed as `OP_1`..`OP_16`.
pub const MAX_MULTISIG_KEYS: usize = 16;

/// How [`build_condition`] combines its scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionMode {
    /// The spender satisfies any one script, choosing it with
    /// `OP_IF`/`OP_ELSE` selector values in the unlocking script.
    #[default]
    Any,
    /// The spender satisfies every script in order.
    All,
}

// ---------------------------------------------------------------------------
// Locking scripts
// ---------------------------------------------------------------------------

/// `OP_DUP OP_HASH160 <pubkey_hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn build_p2pkh_lock(pubkey_hash: &[u8; 20]) -> Script {
    let mut bytes = Vec::with_capacity(25);
    bytes.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
    bytes.extend_from_slice(pubkey_hash);
    bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    Script::from(bytes)
}

/// `OP_HASH160 <hash160(redeem_script)> OP_EQUAL`
///
/// The redeem script is pushed whole when spending, so it must fit a single
/// stack element.
pub fn build_p2sh_lock(redeem_script: &Script) -> Result<Script, ScriptError> {
    if redeem_script.len() > MAX_SCRIPT_ELEMENT_SIZE {
        return Err(ScriptError::ScriptTooLarge {
            size: redeem_script.len(),
            limit: MAX_SCRIPT_ELEMENT_SIZE,
        });
    }
    Ok(script_hash_lock(&hash160(redeem_script.to_bytes())))
}

fn script_hash_lock(hash: &[u8; 20]) -> Script {
    let mut bytes = Vec::with_capacity(23);
    bytes.extend_from_slice(&[OP_HASH160, OP_DATA_20]);
    bytes.extend_from_slice(hash);
    bytes.push(OP_EQUAL);
    Script::from(bytes)
}

/// The standard locking script paying `address`: P2PKH or P2SH by kind.
pub fn build_address_lock(address: &Address) -> Script {
    match address.kind {
        AddressKind::PubKeyHash => build_p2pkh_lock(&address.hash),
        AddressKind::ScriptHash => script_hash_lock(&address.hash),
    }
}

/// `OP_m <pubkey_1> ... <pubkey_n> OP_n OP_CHECKMULTISIG`
///
/// Keys are pushed compressed, in the order given; the order matters to
/// spenders, whose signatures must follow it.
pub fn build_multisig(public_keys: &[PublicKey], signatures_required: usize) -> Result<Script, ScriptError> {
    let keys = public_keys.len();
    let invalid = ScriptError::InvalidThreshold {
        required: signatures_required,
        keys,
    };
    if keys == 0 || keys > MAX_MULTISIG_KEYS || signatures_required == 0 || signatures_required > keys {
        return Err(invalid);
    }
    let (Some(m), Some(n)) = (small_int_opcode(signatures_required as u8), small_int_opcode(keys as u8)) else {
        return Err(invalid);
    };

    let mut script = Script::new();
    script.append_opcodes(&[m])?;
    for key in public_keys {
        script.append_push_data(&key.to_compressed())?;
    }
    script.append_opcodes(&[n, OP_CHECKMULTISIG])?;
    Ok(script)
}

/// A data carrier output: `OP_FALSE OP_RETURN <part>...`.
pub fn build_op_return(parts: &[&[u8]]) -> Result<Script, ScriptError> {
    let mut script = Script::new();
    script.append_opcodes(&[OP_FALSE, OP_RETURN])?;
    for part in parts {
        script.append_push_data(part)?;
    }
    check_size(script)
}

// ---------------------------------------------------------------------------
// Time locks
// ---------------------------------------------------------------------------

/// Lock funds to `address` until `lock_interval_since_now` has passed.
///
/// The unlock time is computed once, now, as a Unix timestamp:
/// `<now + interval> OP_CHECKLOCKTIMEVERIFY OP_DROP <address lock>`.
pub fn build_lock_time(address: &str, lock_interval_since_now: Duration) -> Result<Script, ScriptError> {
    let unlock_at = Utc::now()
        .checked_add_signed(lock_interval_since_now)
        .ok_or_else(|| ScriptError::InvalidLockTime("interval overflows the calendar".to_string()))?
        .timestamp();
    let lock_time = u32::try_from(unlock_at)
        .map_err(|_| ScriptError::InvalidLockTime(format!("{} does not fit nLockTime", unlock_at)))?;
    if lock_time < LOCKTIME_THRESHOLD {
        return Err(ScriptError::InvalidLockTime(format!(
            "timestamp {} would be read as a block height",
            lock_time
        )));
    }
    debug!("time lock for {} computed as {}", address, lock_time);
    build_lock_time_at(address, lock_time)
}

/// Lock funds to `address` until an absolute `lock_time` (block height
/// below [`LOCKTIME_THRESHOLD`], Unix time at or above it).
pub fn build_lock_time_at(address: &str, lock_time: u32) -> Result<Script, ScriptError> {
    let address = Address::from_string(address)?;
    build_lock_time_script(&build_address_lock(&address), lock_time)
}

/// Prefix an arbitrary script with `<lock_time> OP_CHECKLOCKTIMEVERIFY OP_DROP`.
pub fn build_lock_time_script(script: &Script, lock_time: u32) -> Result<Script, ScriptError> {
    let mut locked = Script::new();
    append_number(&mut locked, lock_time as i64)?;
    locked.append_opcodes(&[OP_CHECKLOCKTIMEVERIFY, OP_DROP])?;
    locked.append_script(script);
    check_size(locked)
}

/// Push a number minimally: `OP_0`, `OP_1NEGATE`, `OP_1`..`OP_16`, or a
/// script-number push.
fn append_number(script: &mut Script, n: i64) -> Result<(), ScriptError> {
    match n {
        -1 => script.append_opcodes(&[OP_1NEGATE]),
        0..=16 => match small_int_opcode(n as u8) {
            Some(op) => script.append_opcodes(&[op]),
            None => script.append_push_data(&scriptnum::encode(n)),
        },
        _ => script.append_push_data(&scriptnum::encode(n)),
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Combine locking scripts into one.
///
/// [`ConditionMode::Any`] pairs scripts up as `OP_IF a OP_ELSE b OP_ENDIF`,
/// level by level, until one remains. An unpaired script on a level becomes
/// `OP_DROP s`, so every level consumes exactly one selector from the
/// unlocking script. A single script is returned as is.
///
/// [`ConditionMode::All`] concatenates the scripts. Each script but the
/// last must leave nothing behind, so its final result-producing opcode is
/// swapped for its `VERIFY` form, or `OP_VERIFY` is appended.
pub fn build_condition(scripts: &[Script], mode: ConditionMode) -> Result<Script, ScriptError> {
    if scripts.is_empty() || scripts.iter().any(Script::is_empty) {
        return Err(ScriptError::EmptyScript);
    }
    let composed = match mode {
        ConditionMode::Any => any_of(scripts.to_vec())?,
        ConditionMode::All => all_of(scripts)?,
    };
    check_size(composed)
}

fn any_of(mut level: Vec<Script>) -> Result<Script, ScriptError> {
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let mut branch = Script::new();
            if let [a, b] = pair {
                branch.append_opcodes(&[OP_IF])?;
                branch.append_script(a);
                branch.append_opcodes(&[OP_ELSE])?;
                branch.append_script(b);
                branch.append_opcodes(&[OP_ENDIF])?;
            } else {
                branch.append_opcodes(&[OP_DROP])?;
                for single in pair {
                    branch.append_script(single);
                }
            }
            next.push(branch);
        }
        level = next;
    }
    level.pop().ok_or(ScriptError::EmptyScript)
}

fn all_of(scripts: &[Script]) -> Result<Script, ScriptError> {
    let Some((last, init)) = scripts.split_last() else {
        return Err(ScriptError::EmptyScript);
    };
    let mut combined = Script::new();
    for script in init {
        combined.append_script(&into_verify(script)?);
    }
    combined.append_script(last);
    Ok(combined)
}

/// Rewrite a script so that it fails instead of leaving false on the stack.
fn into_verify(script: &Script) -> Result<Script, ScriptError> {
    let last = script.last_chunk()?.ok_or(ScriptError::EmptyScript)?;
    let verify_form = match last.op {
        OP_CHECKSIG => Some(OP_CHECKSIGVERIFY),
        OP_CHECKMULTISIG => Some(OP_CHECKMULTISIGVERIFY),
        OP_EQUAL => Some(OP_EQUALVERIFY),
        OP_NUMEQUAL => Some(OP_NUMEQUALVERIFY),
        OP_CHECKDATASIG => Some(OP_CHECKDATASIGVERIFY),
        _ => None,
    };
    let mut bytes = script.to_bytes().to_vec();
    match verify_form {
        Some(op) if last.is_opcode() => {
            let end = bytes.len() - 1;
            bytes[end] = op;
        }
        _ => bytes.push(OP_VERIFY),
    }
    Ok(Script::from(bytes))
}

fn check_size(script: Script) -> Result<Script, ScriptError> {
    if script.len() > MAX_SCRIPT_SIZE {
        return Err(ScriptError::ScriptTooLarge {
            size: script.len(),
            limit: MAX_SCRIPT_SIZE,
        });
    }
    Ok(script)
}

// ---------------------------------------------------------------------------
// Unlocking scripts
// ---------------------------------------------------------------------------

/// `<DER(signature) || sighash_flag> <compressed public key>`, the P2PKH
/// unlocking script.
pub fn build_unlocking_script(signature: &Signature, public_key: &PublicKey, sighash_flag: u8) -> Script {
    let der = signature.to_der();
    let pubkey = public_key.to_compressed();

    // DER signatures are at most 72 bytes, so both pushes are direct.
    let mut bytes = Vec::with_capacity(der.len() + pubkey.len() + 3);
    bytes.push((der.len() + 1) as u8);
    bytes.extend_from_slice(&der);
    bytes.push(sighash_flag);
    bytes.push(pubkey.len() as u8);
    bytes.extend_from_slice(&pubkey);
    Script::from(bytes)
}


#[cfg(test)]
mod tests {
    use super::*;
    use cashkit_primitives::ec::PrivateKey;

    const ADDRESS: &str = "1BpEi6DfDAUFd7GtittLSdBeYJvcoaVggu";
    const PKH_HEX: &str = "76a04053bda0a88bda5177b86a15c3b29f559873";
    const P2PKH_HEX: &str = "76a91476a04053bda0a88bda5177b86a15c3b29f55987388ac";
    const MULTISIG_HEX: &str = "52210279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
                                2102c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee552ae";

    fn pkh() -> [u8; 20] {
        hex::decode(PKH_HEX).unwrap().try_into().unwrap()
    }

    /// Keys with secrets 1 and 2, i.e. G and 2G.
    fn keys() -> Vec<PublicKey> {
        ["01", "02"]
            .iter()
            .map(|last| {
                let hex_key = format!("{:0>64}", last);
                PrivateKey::from_hex(&hex_key).unwrap().pub_key()
            })
            .collect()
    }

    #[test]
    fn test_p2pkh_lock() {
        let script = build_p2pkh_lock(&pkh());
        assert_eq!(script.to_hex(), P2PKH_HEX);
        assert!(script.is_p2pkh());
        assert_eq!(script.public_key_hash().unwrap(), pkh());
    }

    #[test]
    fn test_address_lock_by_kind() {
        let p2pkh = Address::from_string(ADDRESS).unwrap();
        assert_eq!(build_address_lock(&p2pkh).to_hex(), P2PKH_HEX);

        let p2sh = Address::from_string("3CWFddi6m4ndiGyKqzYvsFYagqDLPVMTzC").unwrap();
        assert_eq!(
            build_address_lock(&p2sh).to_hex(),
            format!("a914{}87", PKH_HEX)
        );
    }

    #[test]
    fn test_multisig_two_of_two() {
        let script = build_multisig(&keys(), 2).unwrap();
        assert_eq!(script.to_hex(), MULTISIG_HEX);
        assert!(script.is_multisig_out());

        let one_of_two = build_multisig(&keys(), 1).unwrap();
        assert_eq!(one_of_two.to_bytes()[0], OP_1);
        assert_eq!(one_of_two.to_bytes()[one_of_two.len() - 2], OP_2);
    }

    #[test]
    fn test_multisig_invalid_thresholds() {
        let two = keys();
        let seventeen: Vec<PublicKey> = (0..17).map(|_| two[0].clone()).collect();
        let cases: [(&[PublicKey], usize); 4] = [
            (two.as_slice(), 0),
            (two.as_slice(), 3),
            (&[], 1),
            (seventeen.as_slice(), 2),
        ];
        for (keys, m) in cases {
            match build_multisig(keys, m) {
                Err(ScriptError::InvalidThreshold { required, keys: n }) => {
                    assert_eq!((required, n), (m, keys.len()));
                }
                other => panic!("{} of {} gave {:?}", m, keys.len(), other),
            }
        }
    }

    #[test]
    fn test_p2sh_lock() {
        let redeem = Script::from_hex(MULTISIG_HEX).unwrap();
        let script = build_p2sh_lock(&redeem).unwrap();
        assert_eq!(script.to_hex(), "a91412fcac201d73f5b5dba0f1f22c40f02da17bb4a487");
        assert!(script.is_p2sh());

        let too_big = Script::from_bytes(&[OP_NOP; MAX_SCRIPT_ELEMENT_SIZE + 1]);
        assert!(matches!(
            build_p2sh_lock(&too_big),
            Err(ScriptError::ScriptTooLarge { size: 521, limit: 520 })
        ));
    }

    /// Test the absolute time lock layout against a hand-assembled script.
    #[test]
    fn test_lock_time_at() {
        let script = build_lock_time_at(ADDRESS, 1_700_000_000).unwrap();
        assert_eq!(script.to_hex(), format!("0400f15365b175{}", P2PKH_HEX));
        assert_eq!(
            script.to_asm(),
            format!(
                "00f15365 OP_CHECKLOCKTIMEVERIFY OP_DROP OP_DUP OP_HASH160 {} OP_EQUALVERIFY OP_CHECKSIG",
                PKH_HEX
            )
        );

        // Small heights use OP_n.
        let low = build_lock_time_at(ADDRESS, 16).unwrap();
        assert_eq!(low.to_bytes()[0], OP_16);
    }

    #[test]
    fn test_lock_time_from_now() {
        let before = Utc::now().timestamp();
        let script = build_lock_time(ADDRESS, Duration::seconds(86_400)).unwrap();
        let after = Utc::now().timestamp();

        let chunks = script.chunks().unwrap();
        let lock_time = scriptnum::decode(chunks[0].data.as_ref().unwrap(), 5).unwrap();
        assert!(lock_time >= before + 86_400 && lock_time <= after + 86_400);
        assert_eq!(chunks[1].op, OP_CHECKLOCKTIMEVERIFY);
        assert_eq!(chunks[2].op, OP_DROP);
        assert!(script.to_hex().ends_with(P2PKH_HEX));
    }

    #[test]
    fn test_lock_time_errors() {
        assert!(matches!(
            build_lock_time("not-an-address", Duration::seconds(60)),
            Err(ScriptError::InvalidAddress(_))
        ));
        assert!(matches!(
            build_lock_time(ADDRESS, Duration::days(365 * 200)),
            Err(ScriptError::InvalidLockTime(_))
        ));
        assert!(matches!(
            build_lock_time(ADDRESS, Duration::days(-365 * 60)),
            Err(ScriptError::InvalidLockTime(_))
        ));
    }

    /// Test the composite lock a wallet uses: a 2-of-2 or, after a day,
    /// the user alone.
    #[test]
    fn test_condition_any_of_two() {
        let multisig = build_multisig(&keys(), 2).unwrap();
        let timelocked = build_lock_time_at(ADDRESS, 1_700_000_000).unwrap();
        let script = build_condition(&[multisig.clone(), timelocked.clone()], ConditionMode::Any).unwrap();

        let mut expected = vec![OP_IF];
        expected.extend_from_slice(multisig.to_bytes());
        expected.push(OP_ELSE);
        expected.extend_from_slice(timelocked.to_bytes());
        expected.push(OP_ENDIF);
        assert_eq!(script.to_bytes(), expected.as_slice());
    }

    #[test]
    fn test_condition_any_of_three_folds_levels() {
        let a = Script::from_bytes(&[OP_1]);
        let b = Script::from_bytes(&[OP_2]);
        let c = Script::from_bytes(&[OP_3]);
        let script = build_condition(&[a, b, c], ConditionMode::Any).unwrap();
        assert_eq!(
            script.to_asm(),
            "OP_IF OP_IF OP_1 OP_ELSE OP_2 OP_ENDIF OP_ELSE OP_DROP OP_3 OP_ENDIF"
        );
    }

    #[test]
    fn test_condition_single_script_unchanged() {
        let only = build_p2pkh_lock(&pkh());
        for mode in [ConditionMode::Any, ConditionMode::All] {
            assert_eq!(build_condition(&[only.clone()], mode).unwrap(), only);
        }
    }

    #[test]
    fn test_condition_all_converts_to_verify() {
        let p2pkh = build_p2pkh_lock(&pkh());
        let multisig = build_multisig(&keys(), 2).unwrap();
        let script = build_condition(&[p2pkh.clone(), multisig.clone()], ConditionMode::All).unwrap();

        let mut expected = p2pkh.to_bytes().to_vec();
        *expected.last_mut().unwrap() = OP_CHECKSIGVERIFY;
        expected.extend_from_slice(multisig.to_bytes());
        assert_eq!(script.to_bytes(), expected.as_slice());

        // No verify form: OP_VERIFY is appended. A trailing push is data,
        // never an opcode to rewrite.
        let mut pushes_ac = Script::new();
        pushes_ac.append_push_data(&[OP_CHECKSIG]).unwrap();
        let script = build_condition(&[pushes_ac.clone(), p2pkh.clone()], ConditionMode::All).unwrap();
        assert_eq!(&script.to_bytes()[..3], &[0x01, OP_CHECKSIG, OP_VERIFY]);
    }

    #[test]
    fn test_condition_errors() {
        for mode in [ConditionMode::Any, ConditionMode::All] {
            assert!(matches!(build_condition(&[], mode), Err(ScriptError::EmptyScript)));
            assert!(matches!(
                build_condition(&[Script::new(), build_p2pkh_lock(&pkh())], mode),
                Err(ScriptError::EmptyScript)
            ));
        }

        let big = Script::from_bytes(&[OP_NOP; 6_000]);
        assert!(matches!(
            build_condition(&[big.clone(), big], ConditionMode::Any),
            Err(ScriptError::ScriptTooLarge { limit: MAX_SCRIPT_SIZE, .. })
        ));
    }

    #[test]
    fn test_op_return() {
        let script = build_op_return(&[b"hello"]).unwrap();
        assert_eq!(script.to_hex(), "006a0568656c6c6f");
        assert!(script.is_data());
    }

    #[test]
    fn test_unlocking_script_layout() {
        let key = PrivateKey::from_hex(&format!("{:0>64}", "01")).unwrap();
        let digest = [7u8; 32];
        let sig = key.sign(&digest).unwrap();
        let script = build_unlocking_script(&sig, &key.pub_key(), 0x41);

        let chunks = script.chunks().unwrap();
        assert_eq!(chunks.len(), 2);
        let sig_push = chunks[0].data.as_ref().unwrap();
        assert_eq!(*sig_push.last().unwrap(), 0x41);
        assert_eq!(&sig_push[..sig_push.len() - 1], sig.to_der().as_slice());
        assert_eq!(chunks[1].data.as_deref(), Some(&key.pub_key().to_compressed()[..]));
    }
}
