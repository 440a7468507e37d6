//! Visit counting from a visitor's attraction history.
//!
//! Only visits made after the visitor's most recent prize redemption count
//! toward the next draw.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::PRIZE_REDEMPTION_TAG;
use crate::numbers::{floor_f64_to_i64, usize_to_u32};

/// One recorded attraction visit.
///
/// Fields decode leniently: a field of the wrong type never rejects the
/// entry. Numeric timestamps are epoch milliseconds; any other non-text
/// timestamp is left empty and sorts as earliest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub attraction: String,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub personality: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub staff: Option<String>,
    /// ISO 8601 timestamp.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub visited_at: String,
}

/// Any JSON value, reduced to what a visit field can use.
enum FieldValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Other,
}

struct FieldVisitor;

impl<'de> Visitor<'de> for FieldVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a visit field")
    }

    fn visit_str<E>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Integer(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<FieldValue, E> {
        Ok(i64::try_from(v).map_or(FieldValue::Other, FieldValue::Integer))
    }

    fn visit_f64<E>(self, v: f64) -> Result<FieldValue, E> {
        Ok(FieldValue::Real(v))
    }

    fn visit_bool<E>(self, _v: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Other)
    }

    fn visit_unit<E>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Other)
    }

    fn visit_none<E>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Other)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<FieldValue, D::Error> {
        deserializer.deserialize_any(Self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FieldValue, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(FieldValue::Other)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FieldValue, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(FieldValue::Other)
    }
}

fn field_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldValue, D::Error> {
    deserializer.deserialize_any(FieldVisitor)
}

fn lenient_optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match field_value(deserializer)? {
        FieldValue::Text(text) => Some(text),
        FieldValue::Integer(n) => Some(n.to_string()),
        FieldValue::Real(n) => Some(n.to_string()),
        FieldValue::Other => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_optional_text(deserializer)?.unwrap_or_default())
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let millis = match field_value(deserializer)? {
        FieldValue::Text(text) => return Ok(text),
        FieldValue::Integer(n) => Some(n),
        FieldValue::Real(n) => floor_f64_to_i64(n),
        FieldValue::Other => None,
    };
    Ok(millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.to_rfc3339())
        .unwrap_or_default())
}

impl VisitEntry {
    #[must_use]
    pub fn new(attraction: impl Into<String>, visited_at: impl Into<String>) -> Self {
        Self {
            attraction: attraction.into(),
            personality: None,
            staff: None,
            visited_at: visited_at.into(),
        }
    }

    #[must_use]
    pub fn is_redemption(&self) -> bool {
        self.attraction == PRIZE_REDEMPTION_TAG
    }

    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.visited_at)
    }
}

/// History payload as returned by the visitor lookup service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitHistory {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub history: Vec<VisitEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryPayload {
    Envelope(VisitHistory),
    Bare(Vec<VisitEntry>),
}

impl VisitHistory {
    /// Decode either `{ "userId", "history": [...] }` or a bare entry array.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON matches neither shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::from_str::<HistoryPayload>(json)? {
            HistoryPayload::Envelope(history) => history,
            HistoryPayload::Bare(history) => Self {
                user_id: None,
                history,
            },
        })
    }

    #[must_use]
    pub fn visits(&self) -> u32 {
        compute_visits(&self.history)
    }
}

/// Best-effort ISO 8601 parsing.
///
/// Accepts RFC 3339, a zone-less date-time (read as UTC), or a bare date
/// (midnight UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

/// Count visits since the most recent prize redemption.
///
/// Entries are ordered by timestamp first (stable, so equal timestamps keep
/// caller order). Unparseable timestamps sort as the earliest entries.
#[must_use]
pub fn compute_visits(history: &[VisitEntry]) -> u32 {
    if history.is_empty() {
        return 0;
    }

    let mut ordered: Vec<(Option<DateTime<Utc>>, &VisitEntry)> = history
        .iter()
        .map(|entry| (entry.timestamp(), entry))
        .collect();
    ordered.sort_by_key(|(at, _)| *at);

    let counted = ordered
        .iter()
        .rposition(|(_, entry)| entry.is_redemption())
        .map_or(ordered.len(), |last| ordered.len() - (last + 1));
    usize_to_u32(counted)
}

/// Count visits straight from a service response; undecodable payloads count as zero.
#[must_use]
pub fn visits_from_json(json: &str) -> u32 {
    match VisitHistory::from_json(json) {
        Ok(history) => history.visits(),
        Err(err) => {
            log::warn!("ignoring undecodable visit history: {err}");
            0
        }
    }
}
