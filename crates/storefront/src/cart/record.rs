//! Versioned on-disk format of the cart.
//!
//! ```json
//! {"version":1,"saved_at":"2026-10-19T12:00:00Z","items":[{"id":1,"title":"…","price":179.9,"image":"…","amount":2}]}
//! ```
//!
//! Carts saved before versioning were a bare JSON array of entries. Those are
//! still accepted and upgraded on read.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rocketshoes_core::CartEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written by [`encode`].
pub const CURRENT_VERSION: u32 = 1;

/// Why a stored cart could not be adopted.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed cart record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported cart record version {0}")]
    UnsupportedVersion(u64),

    #[error("invalid cart record: {0}")]
    Invalid(String),
}

/// A successfully decoded cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Stored in the current format.
    Current(Vec<CartEntry>),
    /// Stored in the legacy unversioned format.
    Legacy(Vec<CartEntry>),
}

impl Decoded {
    /// The entries, whichever format they came from.
    #[must_use]
    pub fn into_entries(self) -> Vec<CartEntry> {
        match self {
            Self::Current(entries) | Self::Legacy(entries) => entries,
        }
    }
}

#[derive(Serialize)]
struct RecordOut<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    items: &'a [CartEntry],
}

#[derive(Deserialize)]
struct RecordIn {
    items: Vec<CartEntry>,
}

/// Serialize entries as a current-version record.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(entries: &[CartEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&RecordOut {
        version: CURRENT_VERSION,
        saved_at: Utc::now(),
        items: entries,
    })
}

/// Parse a stored cart, upgrading legacy data.
///
/// # Errors
///
/// Returns an error if the text is not a cart record, carries an unknown
/// version, or breaks the cart's invariants (zero amounts, repeated ids).
pub fn decode(raw: &str) -> Result<Decoded, RecordError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;

    let decoded = if value.is_array() {
        Decoded::Legacy(serde_json::from_value(value)?)
    } else {
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| RecordError::Invalid("missing version".to_string()))?;
        if version != u64::from(CURRENT_VERSION) {
            return Err(RecordError::UnsupportedVersion(version));
        }
        let record: RecordIn = serde_json::from_value(value)?;
        Decoded::Current(record.items)
    };

    match &decoded {
        Decoded::Current(entries) | Decoded::Legacy(entries) => validate(entries)?,
    }
    Ok(decoded)
}

fn validate(entries: &[CartEntry]) -> Result<(), RecordError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.amount == 0 {
            return Err(RecordError::Invalid(format!(
                "product {} has amount 0",
                entry.id
            )));
        }
        if !seen.insert(entry.id) {
            return Err(RecordError::Invalid(format!(
                "product {} appears more than once",
                entry.id
            )));
        }
    }
    Ok(())
}
