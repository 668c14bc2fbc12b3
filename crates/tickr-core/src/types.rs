use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::METADATA_POINTER_LEN;
use crate::error::TickrError;

/// Fee amount in base units of the fee token (18 decimals). u128 leaves
/// ample headroom for any realistic fee schedule.
pub type Balance = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte identity of a registrant, the administrator, the treasury or the
/// downstream registry.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, TickrError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TickrError::InvalidParameter(format!("account id: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            TickrError::InvalidParameter(format!("account id must be 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b58 = self.to_b58();
        write!(f, "AccountId({})", &b58[..b58.len().min(8)])
    }
}

// ── MetadataPointer ──────────────────────────────────────────────────────────

/// Fixed-size reference to off-chain descriptive content (e.g. a swarm or
/// IPFS hash). The registry stores it verbatim and never interprets it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MetadataPointer(pub [u8; METADATA_POINTER_LEN]);

impl MetadataPointer {
    pub fn from_bytes(b: [u8; METADATA_POINTER_LEN]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; METADATA_POINTER_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, TickrError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| TickrError::InvalidParameter(format!("metadata pointer: {e}")))?;
        let arr: [u8; METADATA_POINTER_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            TickrError::InvalidParameter(format!(
                "metadata pointer must be {METADATA_POINTER_LEN} bytes, got {}",
                v.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Pack short text into the pointer: left-aligned, zero padded.
    pub fn from_text(s: &str) -> Result<Self, TickrError> {
        let bytes = s.as_bytes();
        if bytes.len() > METADATA_POINTER_LEN {
            return Err(TickrError::InvalidParameter(format!(
                "metadata text exceeds {METADATA_POINTER_LEN} bytes"
            )));
        }
        let mut arr = [0u8; METADATA_POINTER_LEN];
        arr[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// The packed text with trailing zero bytes removed, if it is UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        let end = self
            .0
            .iter()
            .rposition(|b| *b != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        std::str::from_utf8(&self.0[..end]).ok()
    }
}

impl fmt::Debug for MetadataPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataPointer({}…)", &self.to_hex()[..16])
    }
}
