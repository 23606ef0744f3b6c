// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull structured results out of free-form session transcripts.
//!
//! Transcripts mix prose, code fences and JSON. Only the last complete
//! top-level object counts, and it must deserialize into the expected shape
//! as a whole; there is no field-by-field salvage.

use serde::de::DeserializeOwned;
use serde_json::{Deserializer, Map, Value};

/// The last well-formed top-level JSON object in `text`.
pub fn last_json_object(text: &str) -> Option<Map<String, Value>> {
    let mut last = None;
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        let mut stream = Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => {
                last = Some(map);
                // Skip past the object so nested objects are not candidates
                pos = start + stream.byte_offset();
            }
            _ => pos = start + 1,
        }
    }
    last
}

/// Deserialize the last top-level object of `text` into `T`.
pub fn extract_last<T: DeserializeOwned>(text: &str) -> Option<T> {
    let map = last_json_object(text)?;
    match serde_json::from_value(Value::Object(map)) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "last JSON object has the wrong shape");
            None
        }
    }
}

#[cfg(test)]
#[path = "json_extract_tests.rs"]
mod tests;
