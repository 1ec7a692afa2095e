//! Serde adapters for the service's ISO-8601 timestamps.
//!
//! The service stamps records with RFC 3339 strings. Rows written by older
//! deployments occasionally carry nulls or free-form text, so the optional
//! adapter maps anything unparseable to `None` instead of failing the whole
//! listing.

use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Deserialize an optional RFC 3339 string, treating null or garbage as `None`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.and_then(|s| OffsetDateTime::parse(s.trim(), &Rfc3339).ok()))
}

/// Serialize an optional timestamp as an RFC 3339 string or null.
pub fn serialize<S>(datetime: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match datetime {
        Some(datetime) => {
            let s = datetime
                .format(&Rfc3339)
                .map_err(serde::ser::Error::custom)?;
            serializer.serialize_str(&s)
        }
        None => serializer.serialize_none(),
    }
}
