//! URL state codec: bounded, reversible encoding of a directive into a URL
//! query value.
//!
//! Short payloads travel as raw base64url JSON. Payloads over
//! [`UNCOMPRESSED_THRESHOLD`] are deflate-compressed and prefixed with `"c:"`.
//! Nothing longer than [`HARD_CAP`] is ever emitted: oversized state is a
//! typed error so the one caller that can react (the URL write-back path)
//! retries with the narration stripped.
//!
//! All decode and validation failures collapse to `None` at this boundary.
//! Callers treat `None` as "fall back to the landing directive".

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::types::{Directive, ThemeCatalog, ThemeName};

/// Above this encoded length, the JSON payload is compressed.
pub const UNCOMPRESSED_THRESHOLD: usize = 1800;

/// Hard cap on the emitted string length. Encoding fails rather than exceed it.
pub const HARD_CAP: usize = 7500;

/// Prefix marking a compressed payload.
pub const COMPRESSED_PREFIX: &str = "c:";

/// Error type for state encoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Encoded state exceeds [`HARD_CAP`] even after compression.
    #[error("encoded state is {size} chars, over the {cap} cap", cap = HARD_CAP)]
    StateTooLarge {
        /// Length the emitted string would have had.
        size: usize,
    },
    /// Directive serialization failed.
    #[error("state serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Compression failed.
    #[error("state compression failed: {0}")]
    Compress(#[from] std::io::Error),
}

impl CodecError {
    /// Whether this is the recoverable oversize error.
    pub fn is_too_large(&self) -> bool {
        matches!(self, Self::StateTooLarge { .. })
    }
}

/// Encode a directive into a URL-safe state string.
///
/// Output is clean base64url: never contains `+`, `/`, or `=` padding, and is
/// never longer than [`HARD_CAP`].
pub fn encode_state(directive: &Directive) -> Result<String, CodecError> {
    let json = serde_json::to_vec(directive)?;

    let raw = URL_SAFE_NO_PAD.encode(&json);
    if raw.len() <= UNCOMPRESSED_THRESHOLD {
        return Ok(raw);
    }

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    let packed = format!("{COMPRESSED_PREFIX}{}", URL_SAFE_NO_PAD.encode(compressed));
    if packed.len() > HARD_CAP {
        return Err(CodecError::StateTooLarge { size: packed.len() });
    }
    Ok(packed)
}

/// Decode a state string back into raw JSON.
///
/// Returns `None` on any malformed input; never panics past this boundary.
pub fn decode_state(state: &str) -> Option<serde_json::Value> {
    if let Some(rest) = state.strip_prefix(COMPRESSED_PREFIX) {
        let compressed = URL_SAFE_NO_PAD.decode(rest).ok()?;
        let mut decoder = DeflateDecoder::new(compressed.as_slice());
        let mut json = Vec::new();
        decoder.read_to_end(&mut json).ok()?;
        serde_json::from_slice(&json).ok()
    } else {
        let json = URL_SAFE_NO_PAD.decode(state).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

/// Validate decoded JSON against the directive union.
///
/// Stricter than the in-memory schema: `theme` is required here and must name
/// a theme from the injected catalog. Highlights default to empty and are
/// capped, confidence defaults to 0.7 and is clamped. Unknown extra fields
/// pass through untouched.
///
/// Returns `None` on any failure; callers fall back to a landing directive.
pub fn validate_directive(
    value: serde_json::Value,
    themes: &ThemeCatalog,
) -> Option<Directive> {
    let mut directive: Directive = serde_json::from_value(value).ok()?;

    let theme = directive.theme()?;
    if !themes.contains(theme) {
        return None;
    }

    directive.normalize();
    Some(directive)
}

/// Inject a fallback theme iff the directive has none. Idempotent.
pub fn ensure_theme(directive: &mut Directive, fallback: &ThemeName) {
    if directive.theme().is_none() {
        directive.set_theme(fallback.clone());
    }
}

/// Bridge a URL-validated directive to the store schema.
///
/// Narration is already defaulted to the empty string during deserialization;
/// this re-applies normalization so the store never sees an over-cap payload.
pub fn to_store_directive(mut directive: Directive) -> Directive {
    directive.normalize();
    directive
}
