//! Canonical forms for chain ids and accounts reported by connectors.

use crate::errors::Web3Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A chain id exactly as a connector reports it: wallets hand out either a
/// number or a hex/decimal string (`"0x1"`, `"1"`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ChainIdInput {
    Number(u64),
    Text(String),
}

impl From<u64> for ChainIdInput {
    fn from(id: u64) -> Self {
        ChainIdInput::Number(id)
    }
}

impl From<&str> for ChainIdInput {
    fn from(id: &str) -> Self {
        ChainIdInput::Text(id.to_string())
    }
}

impl From<String> for ChainIdInput {
    fn from(id: String) -> Self {
        ChainIdInput::Text(id)
    }
}

/// Converts a reported chain id into its canonical integer.
///
/// Strings are trimmed; a `0x`/`0X` prefix selects base 16 (the `Ox` typo some
/// wallets emit is accepted too), anything else is parsed as decimal.
pub fn normalize_chain_id(input: impl Into<ChainIdInput>) -> Result<u64, Web3Error> {
    match input.into() {
        ChainIdInput::Number(id) => Ok(id),
        ChainIdInput::Text(raw) => {
            let trimmed = raw.trim();
            let hex_digits = ["0x", "0X", "Ox"]
                .iter()
                .find_map(|prefix| trimmed.strip_prefix(prefix));

            let parsed = match hex_digits {
                // `from_str_radix` alone would let a sign through.
                Some(digits) if digits.bytes().all(|b| b.is_ascii_hexdigit()) => {
                    u64::from_str_radix(digits, 16).ok()
                }
                Some(_) => None,
                None => trimmed.parse::<u64>().ok(),
            };
            parsed.ok_or_else(|| Web3Error::InvalidChainId(raw.clone()))
        }
    }
}

/// Converts an address into its canonical lowercase `0x`-prefixed form.
///
/// Checksummed and lowercase inputs map to the same value. Explicit "no
/// account" (`None`) never reaches this function; callers pass it through.
pub fn normalize_account(account: &str) -> Result<String, Web3Error> {
    let trimmed = account.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| Web3Error::InvalidAccount(account.to_string()))?;

    let bytes = hex::decode(digits).map_err(|_| Web3Error::InvalidAccount(account.to_string()))?;
    if bytes.len() != 20 {
        return Err(Web3Error::InvalidAccount(account.to_string()));
    }
    Ok(format!("0x{}", hex::encode(bytes)))
}

/// Checks `chain_id` against a connector's allowlist. `None` or an empty list
/// accepts every chain.
pub fn ensure_supported(chain_id: u64, supported: Option<&[u64]>) -> Result<(), Web3Error> {
    match supported {
        Some(list) if !list.is_empty() && !list.contains(&chain_id) => {
            Err(Web3Error::UnsupportedChainId {
                chain_id,
                supported: list.to_vec(),
            })
        }
        _ => Ok(()),
    }
}
