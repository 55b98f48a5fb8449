//! Serde helpers for optional RFC 3339 timestamps on the wire.

use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Deserialize an optional RFC 3339 formatted string into an OffsetDateTime.
///
/// The service emits `created_at` values by appending "Z" to an isoformat
/// string that already carries a "+00:00" offset; such doubled suffixes are
/// accepted by stripping the trailing "Z".
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(s) => parse_lenient(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Serialize an optional OffsetDateTime into an RFC 3339 formatted string.
pub fn serialize<S>(datetime: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match datetime {
        None => serializer.serialize_none(),
        Some(datetime) => {
            let s = datetime
                .format(&Rfc3339)
                .map_err(serde::ser::Error::custom)?;
            serializer.serialize_some(&s)
        }
    }
}

fn parse_lenient(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    match OffsetDateTime::parse(s, &Rfc3339) {
        Ok(datetime) => Ok(datetime),
        Err(err) => {
            if let Some(stripped) = s.strip_suffix('Z') {
                if stripped.ends_with("+00:00") {
                    return OffsetDateTime::parse(stripped, &Rfc3339);
                }
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "super")]
        created_at: Option<OffsetDateTime>,
    }

    #[test]
    fn parses_rfc3339() {
        let stamped: Stamped =
            serde_json::from_str(r#"{"created_at":"2024-05-01T12:30:00Z"}"#).unwrap();
        assert_eq!(stamped.created_at.unwrap().unix_timestamp(), 1714566600);
    }

    #[test]
    fn parses_doubled_suffix() {
        let stamped: Stamped =
            serde_json::from_str(r#"{"created_at":"2024-05-01T12:30:00+00:00Z"}"#).unwrap();
        assert_eq!(stamped.created_at.unwrap().unix_timestamp(), 1714566600);
    }

    #[test]
    fn round_trips_none() {
        let stamped: Stamped = serde_json::from_str(r#"{"created_at":null}"#).unwrap();
        assert!(stamped.created_at.is_none());
        assert_eq!(
            serde_json::to_string(&stamped).unwrap(),
            r#"{"created_at":null}"#
        );
    }
}
