//! # Payload Cipher
//!
//! Optional in-transit concealment of the broadcast payload. The goal is to
//! keep an untrusted intermediate relay context from casually reading the
//! payload; the key is the originating context's identity, which already
//! travels in the envelope, so this is obfuscation against passive
//! inspection, not confidentiality against a party holding the full
//! envelope.
//!
//! ## Transform
//!
//! The payload's canonical JSON text is processed per UTF-16 code unit: at
//! position `i`, the unit is XORed with the position-cycled key unit and
//! with `i mod 256`, then the transformed units are emitted as
//! little-endian byte pairs and base64-encoded. The result is wrapped as
//! `"BE:" + ciphertext + ":" + key` so the receiving hop can recover the
//! key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crosscast_types::SEAL_MARKER;
use serde_json::{Map, Value};
use thiserror::Error;

/// Failures while sealing or opening a payload.
///
/// Opening failures are always recovered by the caller: the payload
/// degrades to an empty mapping and the broadcast proceeds dataless.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Sealing requires a non-empty key.
    #[error("Cipher key is empty")]
    EmptyKey,

    /// The sealed string does not start with the `BE:` marker.
    #[error("Sealed payload missing marker prefix")]
    MissingMarker,

    /// The sealed string does not split into ciphertext and key.
    #[error("Sealed payload wrapper is malformed")]
    MalformedWrapper,

    /// The ciphertext is not valid base64 or has a truncated unit.
    #[error("Sealed payload encoding is corrupt: {0}")]
    Encoding(String),

    /// The unmasked units do not form valid UTF-16 text.
    #[error("Sealed payload does not decode to text")]
    Utf16,

    /// The recovered text does not deserialize.
    #[error("Sealed payload does not deserialize: {0}")]
    Json(#[from] serde_json::Error),

    /// The recovered value is not a structured mapping.
    #[error("Sealed payload is not a structured mapping")]
    NotAMapping,
}

/// Mask text with the position-cycled key.
///
/// Applied twice with the same key, the transform is the identity — the
/// same routine serves both directions.
fn mask(units: impl Iterator<Item = u16>, key_units: &[u16]) -> Vec<u16> {
    units
        .enumerate()
        .map(|(i, unit)| unit ^ key_units[i % key_units.len()] ^ ((i % 256) as u16))
        .collect()
}

/// Seal plaintext under the given key.
///
/// # Errors
///
/// Returns [`CipherError::EmptyKey`] when the key carries no units.
pub fn seal(plaintext: &str, key: &str) -> Result<String, CipherError> {
    let key_units: Vec<u16> = key.encode_utf16().collect();
    if key_units.is_empty() {
        return Err(CipherError::EmptyKey);
    }

    let masked = mask(plaintext.encode_utf16(), &key_units);
    let mut bytes = Vec::with_capacity(masked.len() * 2);
    for unit in masked {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    Ok(format!("{SEAL_MARKER}{}:{key}", STANDARD.encode(bytes)))
}

/// Open a sealed payload, recovering the key from the wrapper.
///
/// # Errors
///
/// Any malformed wrapper, corrupt encoding, or non-text result is an
/// error; the caller degrades the broadcast to an empty payload.
pub fn open(sealed: &str) -> Result<String, CipherError> {
    let body = sealed
        .strip_prefix(SEAL_MARKER)
        .ok_or(CipherError::MissingMarker)?;

    // The key (base-36) and the base64 alphabet are both colon-free, so the
    // last separator is unambiguous.
    let (ciphertext, key) = body.rsplit_once(':').ok_or(CipherError::MalformedWrapper)?;
    let key_units: Vec<u16> = key.encode_utf16().collect();
    if key_units.is_empty() {
        return Err(CipherError::EmptyKey);
    }

    let bytes = STANDARD
        .decode(ciphertext)
        .map_err(|e| CipherError::Encoding(e.to_string()))?;
    if bytes.len() % 2 != 0 {
        return Err(CipherError::Encoding("truncated code unit".to_string()));
    }

    let masked = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let units = mask(masked, &key_units);

    String::from_utf16(&units).map_err(|_| CipherError::Utf16)
}

/// Seal a structured payload: canonical JSON text, then [`seal`].
///
/// # Errors
///
/// Returns [`CipherError::EmptyKey`] when the key carries no units.
pub fn seal_object(detail: &Map<String, Value>, key: &str) -> Result<String, CipherError> {
    let text = serde_json::to_string(&Value::Object(detail.clone()))?;
    seal(&text, key)
}

/// Open a sealed payload back into a structured mapping.
///
/// # Errors
///
/// Propagates [`open`] failures, plus [`CipherError::Json`] /
/// [`CipherError::NotAMapping`] when the recovered text is not a JSON
/// object.
pub fn open_object(sealed: &str) -> Result<Map<String, Value>, CipherError> {
    let text = open(sealed)?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(CipherError::NotAMapping),
    }
}
