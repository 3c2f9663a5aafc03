use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Marker the server sends in `inProgress` when no export has ever run.
pub const NOT_APPLICABLE: &str = "n/a";

/// The `inProgress` flag as the server actually sends it: a boolean, a
/// text marker, or nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InProgress {
    Flag(bool),
    Label(String),
    #[default]
    Absent,
}

impl InProgress {
    pub fn is_absent(&self) -> bool {
        matches!(self, InProgress::Absent)
    }

    /// `false`, absent or `"n/a"` all mean the job is not running.
    pub fn is_idle(&self) -> bool {
        match self {
            InProgress::Flag(running) => !running,
            InProgress::Label(label) => label == NOT_APPLICABLE,
            InProgress::Absent => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "Count", default)]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(default)]
    pub processing_state: String,
    #[serde(default, skip_serializing_if = "InProgress::is_absent")]
    pub in_progress: InProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_counters: Option<BTreeMap<String, Counter>>,
}

impl StatusSnapshot {
    pub fn is_complete(&self) -> bool {
        self.in_progress.is_idle()
    }

    /// Only an explicit `false` counts as "finished before we looked".
    pub fn finished(&self) -> bool {
        self.in_progress == InProgress::Flag(false)
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        self.target_counters
            .as_ref()
            .and_then(|counters| counters.get(name))
            .and_then(|counter| counter.count)
    }
}

/// Current and previous snapshot, always published together.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPair {
    pub current: Option<Arc<StatusSnapshot>>,
    pub previous: Option<Arc<StatusSnapshot>>,
}

impl SnapshotPair {
    pub fn shift(&mut self, next: Option<StatusSnapshot>) {
        self.previous = self.current.take();
        self.current = next.map(Arc::new);
    }
}

/// Decodes a status response body. An empty body or a JSON `null` is
/// "no data", not an error.
pub fn parse_status_body(body: &str) -> Result<Option<StatusSnapshot>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Option<StatusSnapshot>>(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_running_snapshot() {
        let body = r#"{
            "processingState": "RUNNING",
            "inProgress": true,
            "targetCounters": { "Folders submitted": { "Count": 5 } }
        }"#;
        let snapshot = parse_status_body(body).unwrap().unwrap();
        assert_eq!(snapshot.processing_state, "RUNNING");
        assert_eq!(snapshot.in_progress, InProgress::Flag(true));
        assert_eq!(snapshot.counter("Folders submitted"), Some(5));
        assert_eq!(snapshot.end_date, None);
        assert!(!snapshot.is_complete());
    }

    #[test]
    fn completion_markers() {
        let finished = parse_status_body(r#"{"processingState":"DONE","inProgress":false}"#)
            .unwrap()
            .unwrap();
        assert!(finished.is_complete());
        assert!(finished.finished());

        let never_run = parse_status_body(r#"{"processingState":"Never run","inProgress":"n/a"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(never_run.in_progress, InProgress::Label("n/a".to_string()));
        assert!(never_run.is_complete());
        assert!(!never_run.finished());

        let absent = parse_status_body(r#"{"processingState":"?"}"#).unwrap().unwrap();
        assert!(absent.in_progress.is_absent());
        assert!(absent.is_complete());

        let null_flag = parse_status_body(r#"{"processingState":"?","inProgress":null}"#)
            .unwrap()
            .unwrap();
        assert!(null_flag.is_complete());
    }

    #[test]
    fn other_labels_are_not_completion() {
        let snapshot = parse_status_body(r#"{"processingState":"x","inProgress":"yes"}"#)
            .unwrap()
            .unwrap();
        assert!(!snapshot.is_complete());
    }

    #[test]
    fn null_and_empty_bodies_are_no_data() {
        assert_eq!(parse_status_body("null").unwrap(), None);
        assert_eq!(parse_status_body("  \n").unwrap(), None);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_status_body("{\"processingState\": ").is_err());
        assert!(parse_status_body("<html>").is_err());
    }

    #[test]
    fn null_count_reads_as_missing() {
        let snapshot =
            parse_status_body(r#"{"targetCounters":{"Nodes submitted":{"Count":null}}}"#)
                .unwrap()
                .unwrap();
        assert_eq!(snapshot.counter("Nodes submitted"), None);
    }

    #[test]
    fn shift_moves_current_to_previous() {
        let mut pair = SnapshotPair::default();
        pair.shift(Some(StatusSnapshot {
            processing_state: "one".into(),
            ..Default::default()
        }));
        pair.shift(Some(StatusSnapshot {
            processing_state: "two".into(),
            ..Default::default()
        }));
        assert_eq!(pair.previous.as_ref().unwrap().processing_state, "one");
        assert_eq!(pair.current.as_ref().unwrap().processing_state, "two");

        pair.shift(None);
        assert!(pair.current.is_none());
        assert_eq!(pair.previous.as_ref().unwrap().processing_state, "two");
    }
}
