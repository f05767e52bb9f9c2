//! Address decoding.
//!
//! Two text forms reach the builders: legacy Base58Check addresses
//! (`1...`, `3...`, `m...`/`n...`, `2...`) and CashAddr
//! (`bitcoincash:q...`), with or without the network prefix. Both decode to
//! the same `{kind, hash, network}` triple.

use std::fmt;
use std::str::FromStr;

use cashkit_primitives::base58;
use cashkit_primitives::ec::PublicKey;

use crate::ScriptError;

const MAINNET_P2PKH: u8 = 0x00;
const MAINNET_P2SH: u8 = 0x05;
const TESTNET_P2PKH: u8 = 0x6f;
const TESTNET_P2SH: u8 = 0xc4;

const CASHADDR_CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const CASHADDR_CHECKSUM_LEN: usize = 8;

/// Network an address belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    /// CashAddr human-readable prefix.
    pub fn cashaddr_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "bitcoincash",
            Network::Testnet => "bchtest",
            Network::Regtest => "bchreg",
        }
    }

    const ALL: [Network; 3] = [Network::Mainnet, Network::Testnet, Network::Regtest];
}

/// What the 20-byte hash commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// Hash160 of a public key, paid with a P2PKH script.
    PubKeyHash,
    /// Hash160 of a redeem script, paid with a P2SH script.
    ScriptHash,
}

/// A decoded address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    /// The text the address was parsed from (or generated as).
    pub address_string: String,
    pub hash: [u8; 20],
    pub kind: AddressKind,
    pub network: Network,
}

impl Address {
    /// Decode legacy or CashAddr text.
    ///
    /// Text with a `prefix:` is CashAddr. Otherwise legacy decoding is tried
    /// first and CashAddr (under each known prefix) second.
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        if addr.contains(':') {
            return Self::from_cashaddr(addr);
        }
        Self::from_legacy(addr).or_else(|legacy_err| Self::from_cashaddr(addr).map_err(|_| legacy_err))
    }

    /// Decode a Base58Check address.
    ///
    /// Regtest shares testnet version bytes, so such addresses report
    /// [`Network::Testnet`].
    pub fn from_legacy(addr: &str) -> Result<Self, ScriptError> {
        let payload = base58::check_decode(addr)
            .map_err(|e| ScriptError::InvalidAddress(format!("{}: {}", addr, e)))?;
        if payload.len() != 21 {
            return Err(ScriptError::InvalidAddress(format!(
                "{}: invalid length {}",
                addr,
                payload.len()
            )));
        }
        let (kind, network) = match payload[0] {
            MAINNET_P2PKH => (AddressKind::PubKeyHash, Network::Mainnet),
            MAINNET_P2SH => (AddressKind::ScriptHash, Network::Mainnet),
            TESTNET_P2PKH => (AddressKind::PubKeyHash, Network::Testnet),
            TESTNET_P2SH => (AddressKind::ScriptHash, Network::Testnet),
            v => {
                return Err(ScriptError::InvalidAddress(format!(
                    "{}: unknown version byte 0x{:02x}",
                    addr, v
                )))
            }
        };
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        Ok(Address {
            address_string: addr.to_string(),
            hash,
            kind,
            network,
        })
    }

    /// Decode a CashAddr address, with or without its prefix.
    pub fn from_cashaddr(addr: &str) -> Result<Self, ScriptError> {
        let invalid = |why: &str| ScriptError::InvalidAddress(format!("{}: {}", addr, why));

        if addr.chars().any(|c| c.is_ascii_lowercase()) && addr.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(invalid("mixed case"));
        }
        let lower = addr.to_ascii_lowercase();

        let (networks, body): (Vec<Network>, &str) = match lower.split_once(':') {
            Some((prefix, body)) => {
                let network = Network::ALL
                    .into_iter()
                    .find(|n| n.cashaddr_prefix() == prefix)
                    .ok_or_else(|| invalid("unknown prefix"))?;
                (vec![network], body)
            }
            None => (Network::ALL.to_vec(), lower.as_str()),
        };

        let values = body
            .bytes()
            .map(|c| CASHADDR_CHARSET.iter().position(|&x| x == c).map(|v| v as u8))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| invalid("invalid character"))?;
        if values.len() <= CASHADDR_CHECKSUM_LEN {
            return Err(invalid("too short"));
        }

        let network = networks
            .into_iter()
            .find(|n| cashaddr_polymod(n.cashaddr_prefix(), &values) == 0)
            .ok_or_else(|| invalid("checksum mismatch"))?;

        let data = &values[..values.len() - CASHADDR_CHECKSUM_LEN];
        let payload = convert_bits_5_to_8(data).ok_or_else(|| invalid("invalid padding"))?;
        let (&version, hash_bytes) = payload.split_first().ok_or_else(|| invalid("empty payload"))?;

        // High bit reserved, then 4 type bits and 3 size bits. Size 0 is 160 bits.
        if version & 0x80 != 0 || version & 0x07 != 0 || hash_bytes.len() != 20 {
            return Err(invalid("unsupported hash size"));
        }
        let kind = match version >> 3 {
            0 => AddressKind::PubKeyHash,
            1 => AddressKind::ScriptHash,
            _ => return Err(invalid("unknown address type")),
        };

        let mut hash = [0u8; 20];
        hash.copy_from_slice(hash_bytes);
        Ok(Address {
            address_string: addr.to_string(),
            hash,
            kind,
            network,
        })
    }

    /// A legacy P2PKH address for `hash`.
    pub fn from_public_key_hash(hash: &[u8; 20], network: Network) -> Self {
        Self::legacy(hash, AddressKind::PubKeyHash, network)
    }

    /// A legacy P2PKH address for the compressed key.
    pub fn from_public_key(public_key: &PublicKey, network: Network) -> Self {
        Self::from_public_key_hash(&public_key.hash160(), network)
    }

    /// A legacy P2SH address for a script hash.
    pub fn from_script_hash(hash: &[u8; 20], network: Network) -> Self {
        Self::legacy(hash, AddressKind::ScriptHash, network)
    }

    fn legacy(hash: &[u8; 20], kind: AddressKind, network: Network) -> Self {
        let version = match (kind, network) {
            (AddressKind::PubKeyHash, Network::Mainnet) => MAINNET_P2PKH,
            (AddressKind::ScriptHash, Network::Mainnet) => MAINNET_P2SH,
            (AddressKind::PubKeyHash, _) => TESTNET_P2PKH,
            (AddressKind::ScriptHash, _) => TESTNET_P2SH,
        };
        let mut payload = Vec::with_capacity(21);
        payload.push(version);
        payload.extend_from_slice(hash);
        Address {
            address_string: base58::check_encode(&payload),
            hash: *hash,
            kind,
            network,
        }
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address_string)
    }
}

/// BCH code checksum over `prefix (low 5 bits) || 0 || values`; zero when
/// `values` ends with a valid checksum.
fn cashaddr_polymod(prefix: &str, values: &[u8]) -> u64 {
    const GENERATORS: [u64; 5] = [
        0x98f2bc8e61,
        0x79b76d99e2,
        0xf33e5fb3c4,
        0xae2eabe2a8,
        0x1e4f43e470,
    ];
    let input = prefix
        .bytes()
        .map(|c| c & 0x1f)
        .chain(std::iter::once(0))
        .chain(values.iter().copied());

    let mut c: u64 = 1;
    for d in input {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x07_ffff_ffff) << 5) ^ d as u64;
        for (i, g) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 == 1 {
                c ^= g;
            }
        }
    }
    c ^ 1
}

/// Regroup 5-bit values into bytes. Leftover bits must be fewer than five
/// and all zero.
fn convert_bits_5_to_8(data: &[u8]) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits = 0;
    let mut out = Vec::with_capacity(data.len() * 5 / 8);
    for &v in data {
        acc = (acc << 5) | v as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
        acc &= (1 << bits) - 1;
    }
    if bits >= 5 || acc != 0 {
        return None;
    }
    Some(out)
}
