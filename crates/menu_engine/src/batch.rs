//! Batch payload parsing at the collaborator boundary.
//!
//! The payload must be a JSON array of objects (discovery payloads may also
//! arrive wrapped as `{"restaurants": [...]}`). Anything else is
//! `InvalidInput` for the whole batch. Individual entries are decoded and
//! validated one at a time; what happens to a bad entry is the caller's
//! `BatchPolicy`:
//!
//! - `Partial`: skip it and report it in `rejected`.
//! - `Strict`: fail the batch with that entry's error.

use common::config::BatchPolicy;
use common::{Candidate, Error, RestaurantRecord, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::rank::validate_candidate;

/// One entry the batch skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedEntry {
    /// Position in the payload array.
    pub index: usize,
    /// Identity, when the entry got far enough to have one.
    pub restaurant_id: Option<String>,
    pub reason: String,
}

/// Entries that survived, plus the ones that did not.
#[derive(Debug, Clone)]
pub struct BatchParse<T> {
    pub entries: Vec<T>,
    pub rejected: Vec<RejectedEntry>,
    /// Entries in the payload, good or bad.
    pub total: usize,
}

impl<T> BatchParse<T> {
    /// Skip or abort on a bad entry, per policy.
    pub(crate) fn reject(
        &mut self,
        policy: BatchPolicy,
        index: usize,
        restaurant_id: Option<String>,
        err: Error,
    ) -> Result<()> {
        if policy == BatchPolicy::Strict {
            return Err(with_index(index, err));
        }
        warn!("batch entry {} rejected: {}", index, err);
        self.rejected.push(RejectedEntry {
            index,
            restaurant_id,
            reason: err.to_string(),
        });
        Ok(())
    }
}

fn with_index(index: usize, err: Error) -> Error {
    match err {
        Error::Validation(msg) => Error::Validation(format!("entry {}: {}", index, msg)),
        Error::InvalidInput(msg) => Error::InvalidInput(format!("entry {}: {}", index, msg)),
        other => other,
    }
}

fn array_entries(json: &str, envelope_key: Option<&str>) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::invalid_input(format!("batch payload is not valid JSON: {}", e)))?;
    match value {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => match envelope_key.and_then(|k| map.remove(k)) {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(Error::invalid_input(
                "batch payload must be a JSON array of objects",
            )),
        },
        _ => Err(Error::invalid_input(
            "batch payload must be a JSON array of objects",
        )),
    }
}

fn entry_id(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn parse_entries<T, F>(
    json: &str,
    envelope_key: Option<&str>,
    id_key: &str,
    policy: BatchPolicy,
    validate: F,
) -> Result<BatchParse<T>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Result<()>,
{
    let values = array_entries(json, envelope_key)?;
    let mut parsed = BatchParse {
        entries: Vec::with_capacity(values.len()),
        rejected: Vec::new(),
        total: values.len(),
    };

    for (index, value) in values.into_iter().enumerate() {
        let id = entry_id(&value, id_key);
        if !value.is_object() {
            parsed.reject(
                policy,
                index,
                None,
                Error::invalid_input("entry is not a JSON object"),
            )?;
            continue;
        }
        let entry: T = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                parsed.reject(policy, index, id, Error::invalid_input(e.to_string()))?;
                continue;
            }
        };
        if let Err(e) = validate(&entry) {
            parsed.reject(policy, index, id, e)?;
            continue;
        }
        parsed.entries.push(entry);
    }

    Ok(parsed)
}

/// Parse discovery records (`[{"id": ..., "name": ..., "price_level": ...}]`).
pub fn parse_restaurants(json: &str, policy: BatchPolicy) -> Result<BatchParse<RestaurantRecord>> {
    parse_entries(json, Some("restaurants"), "id", policy, |record: &RestaurantRecord| {
        if record.id.trim().is_empty() {
            return Err(Error::validation("restaurant record is missing id"));
        }
        Ok(())
    })
}

/// Parse candidates already carrying a menu and delivery info.
pub fn parse_candidates(json: &str, policy: BatchPolicy) -> Result<BatchParse<Candidate>> {
    parse_entries(json, None, "restaurant_id", policy, validate_candidate)
}
