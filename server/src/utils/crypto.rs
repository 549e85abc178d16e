//! Hashing helpers

use sha2::{Digest, Sha256};

/// Lowercase hex encoding
pub fn encode_hex(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        out.push(HEX_CHARS[(byte >> 4) as usize] as char);
        out.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
    }
    out
}

/// SHA-256 digest of a string as lowercase hex
pub fn sha256_hex(data: &str) -> String {
    encode_hex(&Sha256::digest(data.as_bytes()))
}
