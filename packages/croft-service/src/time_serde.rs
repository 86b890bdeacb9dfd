//! RFC 3339 timestamps on the wire.
//!
//! Applied with `#[serde(with = "time_serde")]` to the timestamp fields of
//! `EntityResponse`, `MembershipResponse`, and `DeadLetterJob`, which expose
//! `time::OffsetDateTime` columns as strings.

use serde::{Deserialize, Deserializer, Serializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(timestamp: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let rendered = timestamp.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&rendered)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let rendered = String::deserialize(deserializer)?;

	OffsetDateTime::parse(&rendered, &Rfc3339).map_err(serde::de::Error::custom)
}
