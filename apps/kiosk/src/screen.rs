use booking_cell::StatusView;
use booking_queue_cell::QueueView;
use shared_models::QueueSnapshot;

/// One line of waiting-room display text for the current view state.
pub fn queue_line(view: &QueueView<QueueSnapshot>) -> String {
    if view.show_spinner() {
        return "Loading queue status...".to_string();
    }

    if view.is_empty_queue() {
        return "No patients currently waiting.".to_string();
    }

    let Some(display) = view.display() else {
        return match &view.error {
            Some(error) => format!("Queue status unavailable: {}", error),
            None => "Queue status not available yet.".to_string(),
        };
    };

    let line = format!(
        "Now serving: {} | Next: {} | Waiting: {}",
        display.currently_serving, display.next_patient, display.total_waiting
    );

    // A failed background refresh keeps the last snapshot and adds a banner.
    match &view.error {
        Some(error) => format!("{} [{}]", line, error),
        None => line,
    }
}

pub fn booking_line(view: &StatusView) -> Option<String> {
    if let Some(detail) = view.visible_detail() {
        let position = detail
            .position
            .map(|p| format!(", position {}", p))
            .unwrap_or_default();
        return Some(format!(
            "Booking {} for {}: {}{}",
            detail.booking_id,
            detail.patient_name,
            detail.status.label(),
            position
        ));
    }

    view.error.clone().or_else(|| view.no_result_notice())
}
