use chrono::{DateTime, FixedOffset};
use clap::ValueEnum;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use ulid::Ulid;

/// Key under which a snapshot's capture time is stored alongside the payload.
pub const LOGGED_AT_KEY: &str = "logged_at";

/// One shopping-list record.
///
/// Entries are never mutated after creation; they are only deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingEntry {
    pub id: Ulid,
    #[serde(rename = "item")]
    pub text: String,
    pub flagged: bool,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<FixedOffset>,
    pub source: String,
}

impl ShoppingEntry {
    /// Build a new entry with a fresh id.
    pub fn new(
        text: impl Into<String>,
        flagged: bool,
        source: impl Into<String>,
        created_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: Ulid::new(),
            text: text.into(),
            flagged,
            created_at,
            source: source.into(),
        }
    }
}

/// One status reading captured from the pool sensor.
///
/// Serialized as the device's JSON object with a `logged_at` key added, which
/// is also the shape of each line in the pool log.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub payload: Map<String, Value>,
    pub logged_at: DateTime<FixedOffset>,
}

impl StatusSnapshot {
    pub fn new(payload: Map<String, Value>, logged_at: DateTime<FixedOffset>) -> Self {
        Self { payload, logged_at }
    }
}

impl Serialize for StatusSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.payload {
            // The capture time always wins over a device-reported key.
            if key != LOGGED_AT_KEY {
                map.serialize_entry(key, value)?;
            }
        }
        map.serialize_entry(LOGGED_AT_KEY, &self.logged_at)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for StatusSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut payload = Map::<String, Value>::deserialize(deserializer)?;
        let logged_at = payload
            .remove(LOGGED_AT_KEY)
            .ok_or_else(|| D::Error::missing_field(LOGGED_AT_KEY))?;
        let logged_at = logged_at
            .as_str()
            .ok_or_else(|| D::Error::custom("logged_at must be an RFC 3339 string"))?;
        let logged_at = DateTime::parse_from_rfc3339(logged_at).map_err(D::Error::custom)?;
        Ok(Self { payload, logged_at })
    }
}

/// Output format for CLI responses
#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn berlin_winter() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    #[test]
    fn test_entry_uses_legacy_field_names_on_disk() {
        let ts = berlin_winter()
            .with_ymd_and_hms(2025, 1, 4, 9, 30, 0)
            .unwrap();
        let entry = ShoppingEntry::new("milk", false, "alexa", ts);
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["item"], "milk");
        assert_eq!(value["flagged"], false);
        assert_eq!(value["source"], "alexa");
        assert_eq!(value["timestamp"], "2025-01-04T09:30:00+01:00");
        assert_eq!(value["id"], entry.id.to_string());
    }

    #[test]
    fn test_entry_roundtrip_preserves_offset() {
        let ts = berlin_winter()
            .with_ymd_and_hms(2025, 1, 4, 9, 30, 0)
            .unwrap();
        let entry = ShoppingEntry::new("eggs", true, "telegram", ts);
        let json = serde_json::to_string(&entry).unwrap();
        let back: ShoppingEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(back, entry);
        assert_eq!(back.created_at.offset(), &berlin_winter());
    }

    #[test]
    fn test_fresh_ids_are_distinct() {
        let ts = berlin_winter().with_ymd_and_hms(2025, 1, 4, 9, 0, 0).unwrap();
        let a = ShoppingEntry::new("a", false, "s", ts);
        let b = ShoppingEntry::new("a", false, "s", ts);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_snapshot_flattens_payload_with_logged_at() {
        let ts = berlin_winter()
            .with_ymd_and_hms(2025, 7, 1, 14, 0, 0)
            .unwrap();
        let payload = json!({"temp": 26.5, "ph": 7.1}).as_object().cloned().unwrap();
        let snapshot = StatusSnapshot::new(payload, ts);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["temp"], 26.5);
        assert_eq!(value["ph"], 7.1);
        assert_eq!(value["logged_at"], "2025-07-01T14:00:00+01:00");

        let back: StatusSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_snapshot_capture_time_overrides_device_key() {
        let ts = berlin_winter()
            .with_ymd_and_hms(2025, 7, 1, 14, 0, 0)
            .unwrap();
        let payload = json!({"logged_at": "device-clock", "temp": 20})
            .as_object()
            .cloned()
            .unwrap();
        let value = serde_json::to_value(StatusSnapshot::new(payload, ts)).unwrap();
        assert_eq!(value["logged_at"], "2025-07-01T14:00:00+01:00");
    }

    #[test]
    fn test_snapshot_requires_logged_at() {
        let err = serde_json::from_str::<StatusSnapshot>(r#"{"temp": 20}"#).unwrap_err();
        assert!(err.to_string().contains("logged_at"), "{err}");

        assert!(serde_json::from_str::<StatusSnapshot>(r#"{"logged_at": 5}"#).is_err());
        assert!(serde_json::from_str::<StatusSnapshot>(r#"[1, 2]"#).is_err());
    }
}
