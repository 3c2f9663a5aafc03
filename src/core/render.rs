use tracing::debug;

use crate::core::board::{StatusBoard, CURRENT_STATUS, DURATION, END_DATE};
use crate::core::counters::COUNTER_FIELDS;
use crate::core::snapshot::StatusSnapshot;

pub const MISSING_COUNT: &str = "0";

/// One render pass. Returns false when there was nothing to render.
pub fn render_fields<B: StatusBoard + ?Sized>(
    board: &mut B,
    snapshot: Option<&StatusSnapshot>,
) -> bool {
    let Some(snapshot) = snapshot else {
        return false;
    };

    board.set_text(CURRENT_STATUS, &snapshot.processing_state);

    if let Some(end_date) = non_empty(snapshot.end_date.as_deref()) {
        board.set_text(END_DATE, end_date);
    }
    if let Some(duration) = non_empty(snapshot.duration.as_deref()) {
        board.set_text(DURATION, duration);
    }

    if snapshot.target_counters.is_some() {
        for entry in COUNTER_FIELDS.iter() {
            match snapshot.counter(entry.counter) {
                Some(count) => board.set_text(entry.field, &count.to_string()),
                None => {
                    debug!(
                        event = "status.render.counter_missing",
                        counter = entry.counter,
                        field = entry.field
                    );
                    board.set_text(entry.field, MISSING_COUNT);
                }
            }
        }
    }

    true
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::core::board::FieldBoard;
    use crate::core::snapshot::{Counter, InProgress};

    fn all_counters() -> BTreeMap<String, Counter> {
        COUNTER_FIELDS
            .iter()
            .enumerate()
            .map(|(idx, f)| {
                (
                    f.counter.to_string(),
                    Counter {
                        count: Some(idx as u64 + 1),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn absent_snapshot_is_a_no_op() {
        let mut board = FieldBoard::new();
        assert!(!render_fields(&mut board, None));
        assert_eq!(board, FieldBoard::new());
    }

    #[test]
    fn every_counter_field_gets_its_count() {
        let counters = all_counters();
        let snapshot = StatusSnapshot {
            processing_state: "RUNNING".into(),
            in_progress: InProgress::Flag(true),
            target_counters: Some(counters.clone()),
            ..Default::default()
        };
        let mut board = FieldBoard::new();
        assert!(render_fields(&mut board, Some(&snapshot)));

        assert_eq!(board.text(CURRENT_STATUS), Some("RUNNING"));
        for entry in COUNTER_FIELDS.iter() {
            let expected = counters[entry.counter].count.unwrap().to_string();
            assert_eq!(board.text(entry.field), Some(expected.as_str()), "{}", entry.field);
        }
        assert_eq!(board.text("foldersMetadataSubmitted"), board.text("foldersSubmitted"));
    }

    #[test]
    fn no_target_counters_touches_no_counter_field() {
        let snapshot = StatusSnapshot {
            processing_state: "RUNNING".into(),
            ..Default::default()
        };
        let mut board = FieldBoard::new();
        render_fields(&mut board, Some(&snapshot));

        assert_eq!(board.text(CURRENT_STATUS), Some("RUNNING"));
        assert_eq!(board.text(END_DATE), None);
        for entry in COUNTER_FIELDS.iter() {
            assert_eq!(board.text(entry.field), None);
        }
    }

    #[test]
    fn missing_counter_renders_zero_and_keeps_going() {
        let mut counters = all_counters();
        counters.remove("Folder Batches submitted");
        let snapshot = StatusSnapshot {
            target_counters: Some(counters),
            ..Default::default()
        };
        let mut board = FieldBoard::new();
        render_fields(&mut board, Some(&snapshot));

        assert_eq!(board.text("folderBatchesSubmitted"), Some(MISSING_COUNT));
        assert_eq!(board.text("versionsMetadataErrors"), Some("28"));
    }

    #[test]
    fn end_date_and_duration_only_update_when_present() {
        let mut board = FieldBoard::new();
        board.set_text(END_DATE, "earlier");
        board.set_text(DURATION, "1m");

        let without = StatusSnapshot {
            processing_state: "RUNNING".into(),
            end_date: Some(String::new()),
            ..Default::default()
        };
        render_fields(&mut board, Some(&without));
        assert_eq!(board.text(END_DATE), Some("earlier"));
        assert_eq!(board.text(DURATION), Some("1m"));

        let with = StatusSnapshot {
            processing_state: "COMPLETE".into(),
            end_date: Some("2024-01-01".into()),
            duration: Some("3m 2s".into()),
            ..Default::default()
        };
        render_fields(&mut board, Some(&with));
        assert_eq!(board.text(END_DATE), Some("2024-01-01"));
        assert_eq!(board.text(DURATION), Some("3m 2s"));
    }
}
