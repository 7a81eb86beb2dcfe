//! Data models.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AvwxError;

/// Station identifier in canonical form
///
/// Canonical identifiers carry a country-code prefix. Bare identifiers are
/// prefixed with `K`; `C` is the recognized alternate prefix and is left
/// alone, as are identifiers already starting with `K`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StationId(String);

impl StationId {
    /// Canonicalize an identifier from a bulk or streaming source.
    pub fn canonical(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('K') || trimmed.starts_with('C') {
            Self(trimmed.to_string())
        } else {
            Self(format!("K{trimmed}"))
        }
    }

    /// Prefix unconditionally.
    ///
    /// PIREP and upper-winds feed messages carry bare identifiers even when
    /// they start with `K` or `C`, so the prefix is always applied.
    pub fn prefixed(raw: &str) -> Self {
        Self(format!("K{}", raw.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Merged per-station snapshot entry
///
/// The four bulletin text fields are updated independently; an empty string
/// means the field is unknown, never that it was cleared by another bulletin
/// kind. Field names match the persisted snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StationReport {
    /// Canonical station identifier
    #[serde(rename = "Location")]
    pub location: String,
    /// Timestamp of the most recent merge into any field
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Metar")]
    pub metar: String,
    #[serde(rename = "Pirep")]
    pub pirep: String,
    #[serde(rename = "TAF")]
    pub taf: String,
    #[serde(rename = "Winds")]
    pub winds: String,
    /// Coordinates in source string form, captured when a bulletin source
    /// supplies them. Not part of the persisted document; the batch pipeline
    /// falls back to the airport reference list for reports without them.
    #[serde(skip)]
    pub lat: String,
    #[serde(skip)]
    pub lng: String,
    /// Flight category code supplied by the bulletin source (`VFR`, `MVFR`,
    /// `IFR`, `LIFR`). Not part of the persisted document; resets to empty
    /// when a snapshot is loaded.
    #[serde(skip)]
    pub cond: String,
}

/// Kinds of streaming update messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Metar,
    Speci,
    Taf,
    TafAmd,
    Pirep,
    Winds,
}

impl MessageKind {
    pub fn parse(kind: &str) -> Result<Self, AvwxError> {
        match kind {
            "METAR" => Ok(Self::Metar),
            "SPECI" => Ok(Self::Speci),
            "TAF" => Ok(Self::Taf),
            "TAF.AMD" => Ok(Self::TafAmd),
            "PIREP" => Ok(Self::Pirep),
            "WINDS" => Ok(Self::Winds),
            other => Err(AvwxError::UnknownMessageType(other.to_string())),
        }
    }
}

/// One decoded update message from the streaming feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherMessage {
    #[serde(rename = "Type")]
    pub message_type: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Time", default)]
    pub time: String,
    #[serde(rename = "Data")]
    pub data: String,
}

/// Airport reference record
///
/// Coordinates stay in their source string form; consumers parse them at the
/// point of use and skip records that fail to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub icao: String,
    pub lat: String,
    pub lng: String,
    pub alt: String,
}

/// Pilot report with its location
///
/// Pireps are kept as a flat list and filtered spatially; they are never
/// merged into a [`StationReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Pirep {
    #[serde(rename = "Report")]
    pub report: String,
    #[serde(rename = "Lng")]
    pub lng: String,
    #[serde(rename = "Lat")]
    pub lat: String,
}
