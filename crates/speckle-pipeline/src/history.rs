//! Past submissions and the local "clear history" view.
//!
//! The history itself lives in the processing service and is append-only.
//! Clearing it here never deletes anything: [`HistoryView`] remembers a
//! timestamp and hides entries created before it.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One recorded submission as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub iv_original: Option<f64>,
    #[serde(default)]
    pub iv_processed: Option<f64>,
    #[serde(default)]
    pub zncc: Option<f64>,
    #[serde(default)]
    pub rssd: Option<f64>,
    /// Filters that were enabled, by wire name.
    #[serde(default)]
    pub ops: Option<Vec<String>>,
    /// Parameters that were submitted, keyed by filter wire name.
    #[serde(default)]
    pub params: Option<BTreeMap<String, BTreeMap<String, f64>>>,
    #[serde(default)]
    pub filter_metrics: Option<BTreeMap<String, BTreeMap<String, f64>>>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Parse an RFC 3339 timestamp, or an ISO 8601 one without an offset,
/// which the service writes for UTC.
///
/// # Errors
///
/// Returns a [`chrono::ParseError`] if `text` is neither form.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").map(|ts| ts.and_utc())
        })
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(serde::de::Error::custom)
}

/// A local visibility boundary over the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryView {
    cleared_at: Option<DateTime<Utc>>,
}

impl HistoryView {
    /// A view that shows everything.
    #[must_use]
    pub const fn new() -> Self {
        Self { cleared_at: None }
    }

    /// A view that hides entries created before `cleared_at`.
    #[must_use]
    pub const fn cleared_at(cleared_at: DateTime<Utc>) -> Self {
        Self {
            cleared_at: Some(cleared_at),
        }
    }

    /// Hide every entry created before `now`.
    pub const fn clear(&mut self, now: DateTime<Utc>) {
        self.cleared_at = Some(now);
    }

    /// The current boundary, if history has been cleared.
    #[must_use]
    pub const fn boundary(&self) -> Option<DateTime<Utc>> {
        self.cleared_at
    }

    /// Returns `true` if `entry` is not hidden by the boundary.
    #[must_use]
    pub fn shows(&self, entry: &HistoryEntry) -> bool {
        self.cleared_at.is_none_or(|boundary| entry.created_at >= boundary)
    }

    /// The entries not hidden by the boundary, in their original order.
    pub fn visible<'a>(
        &self,
        entries: &'a [HistoryEntry],
    ) -> impl Iterator<Item = &'a HistoryEntry> {
        let view = *self;
        entries.iter().filter(move |entry| view.shows(entry))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn entry(id: i64, hour: u32) -> HistoryEntry {
        HistoryEntry {
            id,
            filename: "sample.png".into(),
            iv_original: Some(100.0),
            iv_processed: None,
            zncc: None,
            rssd: None,
            ops: None,
            params: None,
            filter_metrics: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn uncleared_view_shows_everything() {
        let entries = [entry(1, 8), entry(2, 9)];
        assert_eq!(HistoryView::new().visible(&entries).count(), 2);
    }

    #[test]
    fn clear_hides_only_older_entries() {
        let entries = [entry(3, 12), entry(2, 10), entry(1, 8)];
        let mut view = HistoryView::new();
        view.clear(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());

        let ids: Vec<i64> = view.visible(&entries).map(|e| e.id).collect();
        assert_eq!(ids, [3, 2]);
        // The source slice is untouched.
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn entries_created_after_clearing_are_visible() {
        let view = HistoryView::cleared_at(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap());
        assert!(!view.shows(&entry(1, 9)));
        assert!(view.shows(&entry(2, 10)));
    }

    #[test]
    fn deserializes_service_entry_with_offset_timestamp() {
        let json = r#"{
            "id": 12,
            "filename": "ref.png",
            "iv_original": 101.2,
            "iv_processed": 98.0,
            "zncc": 0.97,
            "rssd": 1520.5,
            "ops": ["gaussian", "canny"],
            "params": {"gaussian": {"ksize": 5, "sigmaX": 1.2}},
            "filter_metrics": null,
            "created_at": "2025-03-01T10:15:00+02:00"
        }"#;
        let parsed: HistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.created_at,
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 15, 0).unwrap()
        );
        assert_eq!(parsed.ops.unwrap(), ["gaussian", "canny"]);
        assert!(parsed.filter_metrics.is_none());
    }

    #[test]
    fn naive_timestamps_are_utc() {
        assert_eq!(
            parse_timestamp("2025-03-01T10:15:00.250000").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap()
                + chrono::Duration::milliseconds(250)
        );
        assert_eq!(
            parse_timestamp("2025-03-01T10:15:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }
}
