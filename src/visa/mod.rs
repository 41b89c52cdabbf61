//! Visa requirement decoding.
//!
//! Each passport (origin) has a blob of concatenated `CCKTT` records: a
//! 2-letter destination code followed by base-32 digits for the kind,
//! sub-type and validity term. The digits index into the tables in
//! [`tables`].

mod packed;
mod tables;

use std::collections::HashMap;

use ratatui::style::Color;
use tracing::debug;

use crate::error::VisaError;

pub use packed::{parse_records, PackedCode, Record, RECORD_WIDTH};
pub use tables::{color_for_code, VisaKind, FULL_KINDS, KINDS, NEUTRAL, TERMS, TYPES};

/// Indices used for destinations missing from a blob: visa required, no sub-type, no term
const FALLBACK: (u32, u32, u32) = (4, 0, 0);

/// Decoded requirement for one (destination, origin) pair.
/// Each field is `None` where the lookup tables have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub kind: Option<VisaKind>,
    pub label: Option<&'static str>,
    pub term: Option<&'static str>,
}

impl Requirement {
    /// Resolve raw digit indices against the lookup tables
    pub fn resolve(kind: Option<u32>, visa_type: Option<u32>, term: Option<u32>) -> Self {
        let kind_label = kind.and_then(|k| FULL_KINDS.get(k as usize).copied());
        let label = match visa_type {
            Some(t) if t != 0 => TYPES.get(t as usize).copied(),
            _ => kind_label,
        };

        Self {
            kind: kind.and_then(VisaKind::from_index),
            label,
            term: term.and_then(|t| TERMS.get(t as usize).copied().flatten()),
        }
    }

    /// Short kind code, empty when the kind is missing
    pub fn kind_code(&self) -> &'static str {
        self.kind.map(VisaKind::code).unwrap_or("")
    }

    pub fn color(&self) -> Option<Color> {
        self.kind.map(VisaKind::color)
    }

    /// Tooltip detail: non-empty label and term joined by " / "
    pub fn detail(&self) -> Option<String> {
        let parts: Vec<&str> = [self.label, self.term]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }
}

/// Requirement data for every passport, keyed by upper-case origin code
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    origins: HashMap<String, HashMap<[u8; 2], PackedCode>>,
}

impl Dataset {
    /// Build from raw `origin -> blob` pairs
    pub fn from_blobs<I, K, V>(blobs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let origins = blobs
            .into_iter()
            .map(|(origin, blob)| {
                let origin = origin.as_ref().to_ascii_uppercase();
                let mut records = HashMap::new();
                for record in parse_records(&origin, blob.as_ref()) {
                    // First occurrence wins
                    records.entry(record.code).or_insert(record.packed);
                }
                (origin, records)
            })
            .collect();

        Self { origins }
    }

    pub fn contains_origin(&self, origin: &str) -> bool {
        self.origins.contains_key(origin)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Packed record for a destination, if the origin lists it
    pub fn lookup(&self, destination: &str, origin: &str) -> Result<Option<PackedCode>, VisaError> {
        let records = self
            .origins
            .get(origin)
            .ok_or_else(|| VisaError::UnknownOrigin(origin.to_string()))?;

        let packed = <[u8; 2]>::try_from(destination.as_bytes())
            .ok()
            .and_then(|code| records.get(&code).copied());
        Ok(packed)
    }
}

/// Decode the requirement for travelling to `destination` on an `origin` passport.
///
/// Destinations the origin does not list fall back to "visa required".
pub fn decode(
    destination: &str,
    origin: &str,
    dataset: &Dataset,
) -> Result<Requirement, VisaError> {
    let (kind, visa_type, term) = match dataset.lookup(destination, origin)? {
        Some(packed) => {
            let indices = packed.indices();
            if matches!(indices, (None, _, _) | (_, None, _) | (_, _, None)) {
                debug!(origin, destination, digits = packed.as_str(), "malformed visa digits");
            }
            indices
        }
        None => {
            let (k, t, r) = FALLBACK;
            (Some(k), Some(t), Some(r))
        }
    };

    Ok(Requirement::resolve(kind, visa_type, term))
}
