//! Persisted value format.
//!
//! Every cached value is a [`serde_json::Value`] persisted as compact JSON
//! text. JSON is self-describing, so scalars, mappings, lists, and arbitrary
//! nestings of them round-trip without a side schema, and parsing it back is
//! a pure data operation; no evaluation of stored text ever happens.
//!
//! [`decode`] is lenient by design: a persisted value that is not valid JSON
//! (for instance one imported from an older store that serialized values with
//! a different formatter) is not an error. The caller keeps the raw text
//! verbatim as a string value and records the fallback.

use serde_json::Value;

use crate::error::Result;

/// Serialize a value to its persisted textual form.
pub fn encode(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Parse persisted text back into a structured value.
///
/// Returns `None` when the text is not valid JSON; the caller decides how to
/// fall back (the leaf cache keeps the raw text as a string).
pub fn decode(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

// ── tests ────────────────────────────────────────────────────────────
