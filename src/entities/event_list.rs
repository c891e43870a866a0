//! Event list: the read-only catalogue of recorded events the viewer browses.
//!
//! Generated outside the viewer (a cron job walking the recorder's event
//! directories) and loaded once per session from JSON:
//!
//! ```json
//! { "root": "file:///var/cache/zm/events/1",
//!   "timestamp": "2014-09-12T18:04:33",
//!   "list": [ { "evtnum": 2731, "lastframe": 145, "sigdigits": 3 } ] }
//! ```
//!
//! `evtnum` may be a JSON number or string; it is kept as text because it is
//! only ever used as a directory name.

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Timestamp layout written by the list generator
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One recorded event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "evtnum", deserialize_with = "event_number_from_any")]
    pub number: String,
    /// Frame count; frames are numbered 1..=last_frame
    #[serde(rename = "lastframe")]
    pub last_frame: u32,
    /// Minimum zero-padded width of frame file names
    #[serde(rename = "sigdigits")]
    pub significant_digits: u32,
}

impl Event {
    pub fn new(number: impl Into<String>, last_frame: u32, significant_digits: u32) -> Self {
        Self {
            number: number.into(),
            last_frame,
            significant_digits,
        }
    }
}

fn event_number_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "evtnum must be a string or number, got {}",
            other
        ))),
    }
}

/// Ordered events plus the root they live under
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventList {
    pub root: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub list: Vec<Event>,
}

impl EventList {
    pub fn new(root: impl Into<String>, timestamp: impl Into<String>, list: Vec<Event>) -> Self {
        Self {
            root: root.into(),
            timestamp: timestamp.into(),
            list,
        }
    }

    /// Parse and validate a list from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let list: EventList = serde_json::from_str(json).context("Failed to parse event list")?;
        list.validate()?;
        Ok(list)
    }

    /// Load and validate a list file
    pub fn from_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event list: {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid event list: {}", path.display()))
    }

    /// Every event needs at least one frame and a positive padding width
    pub fn validate(&self) -> Result<()> {
        for (idx, event) in self.list.iter().enumerate() {
            if event.last_frame == 0 {
                bail!("event {} (index {}) has no frames", event.number, idx);
            }
            if event.significant_digits == 0 {
                bail!("event {} (index {}) has sigdigits 0", event.number, idx);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.list.get(index)
    }

    /// Root for display, without a leading `file:///`
    pub fn location(&self) -> &str {
        self.root.strip_prefix("file:///").unwrap_or(&self.root)
    }

    pub fn generated_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }

    /// "(list updated 2014-09-12 18:04:33)", raw timestamp if it doesn't parse
    pub fn updated_label(&self) -> String {
        match self.generated_at() {
            Some(at) => format!(
                "(list updated {} {})",
                at.format("%Y-%m-%d"),
                at.format("%H:%M:%S")
            ),
            None => format!("(list updated {})", self.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "root": "file:///var/cache/zm/events/1",
        "timestamp": "2014-09-12T18:04:33",
        "list": [
            { "evtnum": 2731, "lastframe": 145, "sigdigits": 3 },
            { "evtnum": "2732", "lastframe": 9, "sigdigits": 1 }
        ]
    }"#;

    #[test]
    fn test_parse_numeric_and_string_event_numbers() {
        let list = EventList::from_json_str(SAMPLE).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.list[0], Event::new("2731", 145, 3));
        assert_eq!(list.list[1], Event::new("2732", 9, 1));
    }

    #[test]
    fn test_location_strips_file_scheme() {
        let list = EventList::from_json_str(SAMPLE).unwrap();
        assert_eq!(list.location(), "var/cache/zm/events/1");

        let plain = EventList::new("/srv/zm", "", vec![]);
        assert_eq!(plain.location(), "/srv/zm");
    }

    #[test]
    fn test_updated_label() {
        let list = EventList::from_json_str(SAMPLE).unwrap();
        assert_eq!(list.updated_label(), "(list updated 2014-09-12 18:04:33)");

        let odd = EventList::new("/srv/zm", "yesterday", vec![]);
        assert!(odd.generated_at().is_none());
        assert_eq!(odd.updated_label(), "(list updated yesterday)");
    }

    #[test]
    fn test_validation_rejects_empty_events() {
        let json = r#"{ "root": "/r", "list": [ { "evtnum": 1, "lastframe": 0, "sigdigits": 2 } ] }"#;
        let err = EventList::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("no frames"));

        let json = r#"{ "root": "/r", "list": [ { "evtnum": 1, "lastframe": 3, "sigdigits": 0 } ] }"#;
        assert!(EventList::from_json_str(json).is_err());
    }

    #[test]
    fn test_bad_event_number_type() {
        let json = r#"{ "root": "/r", "list": [ { "evtnum": [1], "lastframe": 3, "sigdigits": 2 } ] }"#;
        assert!(EventList::from_json_str(json).is_err());
    }

    #[test]
    fn test_empty_list_is_valid() {
        let list = EventList::from_json_str(r#"{ "root": "/r" }"#).unwrap();
        assert!(list.is_empty());
        assert!(list.get(0).is_none());
    }

    #[test]
    fn test_from_json_file() {
        let dir = std::env::temp_dir().join("zmeview_test_event_list");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("events.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let list = EventList::from_json(&path).unwrap();
        assert_eq!(list.get(1).map(|e| e.number.as_str()), Some("2732"));

        let missing = EventList::from_json(&dir.join("nope.json"));
        assert!(missing.is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
