use std::time::Duration;

use crate::core::board::{FieldBoard, CURRENT_STATUS, DURATION, END_DATE};
use crate::core::counters::COUNTER_FIELDS;
use crate::core::event::WidgetEvent;
use crate::core::snapshot::InProgress;
use crate::core::state::IdleReason;

pub const PLACEHOLDER: &str = "--";

pub fn format_event_line(event: &WidgetEvent) -> String {
    match event {
        WidgetEvent::Started { polling: true } => "Export in progress, polling status.".to_string(),
        WidgetEvent::Started { polling: false } => {
            "Export had already finished when the monitor started.".to_string()
        }
        WidgetEvent::Polled {
            processing_state,
            in_progress,
        } => format!(
            "status: {} ({})",
            or_placeholder(processing_state),
            format_in_progress(in_progress)
        ),
        WidgetEvent::NoData => "No data received from server.".to_string(),
        WidgetEvent::PollFailed(message) => format!("error: {message}"),
        WidgetEvent::Idle(IdleReason::Completed) => {
            "Export finished. Polling stopped.".to_string()
        }
        WidgetEvent::Idle(IdleReason::FinishedBeforeStart) => "Nothing left to poll.".to_string(),
        WidgetEvent::Stopped => "Polling stopped.".to_string(),
    }
}

pub fn format_in_progress(in_progress: &InProgress) -> String {
    match in_progress {
        InProgress::Flag(true) => "running".to_string(),
        InProgress::Flag(false) => "finished".to_string(),
        InProgress::Label(label) => label.clone(),
        InProgress::Absent => "unknown".to_string(),
    }
}

/// Plain-text dump of the board, one `label: value` per line.
pub fn format_board_lines(board: &FieldBoard) -> Vec<String> {
    let mut lines = vec![
        format!("Status   : {}", board.text_or(CURRENT_STATUS, PLACEHOLDER)),
        format!("End date : {}", board.text_or(END_DATE, PLACEHOLDER)),
        format!("Duration : {}", board.text_or(DURATION, PLACEHOLDER)),
    ];
    let width = COUNTER_FIELDS
        .iter()
        .map(|f| f.field.len())
        .max()
        .unwrap_or(0);
    for entry in COUNTER_FIELDS.iter() {
        lines.push(format!(
            "{:<width$} : {}",
            entry.field,
            board.text_or(entry.field, PLACEHOLDER)
        ));
    }
    lines
}

pub fn format_elapsed(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        PLACEHOLDER
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::StatusBoard;

    #[test]
    fn polled_line_shows_state_and_flag() {
        let line = format_event_line(&WidgetEvent::Polled {
            processing_state: "RUNNING".into(),
            in_progress: InProgress::Flag(true),
        });
        assert_eq!(line, "status: RUNNING (running)");

        let line = format_event_line(&WidgetEvent::Polled {
            processing_state: String::new(),
            in_progress: InProgress::Label("n/a".into()),
        });
        assert_eq!(line, "status: -- (n/a)");
    }

    #[test]
    fn board_lines_fill_gaps_with_placeholder() {
        let mut board = FieldBoard::new();
        board.set_text(CURRENT_STATUS, "COMPLETE");
        board.set_text("foldersSubmitted", "5");

        let lines = format_board_lines(&board);
        assert_eq!(lines[0], "Status   : COMPLETE");
        assert_eq!(lines[1], "End date : --");
        assert_eq!(lines.len(), 3 + COUNTER_FIELDS.len());
        assert!(lines.iter().any(|l| l.starts_with("foldersSubmitted ") && l.ends_with(": 5")));
    }

    #[test]
    fn elapsed_is_clock_style() {
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "01:02:05");
    }
}
