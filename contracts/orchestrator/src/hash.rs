//! Hashing helpers for cross-chain requests
//!
//! Function selectors follow the EVM convention (first 4 bytes of the
//! keccak256 of the signature) so payloads stay recognisable to EVM-side
//! orchestrators.
//!
//! # Request ID Layout
//! - Bytes 0-7:  origin Zorro chain id (u64, big-endian)
//! - Bytes 8-..: full payload (selector ‖ nonce ‖ fields)
//!
//! The nonce inside the payload makes every dispatched request unique even
//! when two users send identical parameters.

use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash of arbitrary data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// 4-byte function selector for a signature string
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Request id shared by the sending and the receiving orchestrator
pub fn compute_request_id(origin_chain_id: u64, payload: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(&origin_chain_id.to_be_bytes());
    hasher.update(payload);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Convert 32-byte hash to hex string (for attributes/logging)
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a 32-byte hash from raw bytes
pub fn bytes32_from_slice(bytes: &[u8]) -> Option<[u8; 32]> {
    bytes.try_into().ok()
}
