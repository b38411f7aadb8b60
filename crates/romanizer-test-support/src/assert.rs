//! Assertions over published events.

use romanizer_events::{Event, EventStream, NotificationLevel};

/// Drain every buffered event from `stream`, dropping envelopes.
#[must_use]
pub fn drain_events(stream: &mut EventStream) -> Vec<Event> {
    stream
        .drain()
        .into_iter()
        .map(|envelope| envelope.event)
        .collect()
}

/// Notification messages at `level`, in publication order.
#[must_use]
pub fn notifications(events: &[Event], level: NotificationLevel) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Notification {
                level: found,
                message,
            } if *found == level => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Number of events of the given kind (see [`Event::kind`]).
#[must_use]
pub fn count_kind(events: &[Event], kind: &str) -> usize {
    events.iter().filter(|event| event.kind() == kind).count()
}

/// Assert exactly one notification at `level` was published, returning it.
///
/// # Panics
///
/// Panics when zero or several notifications at `level` are present.
#[track_caller]
pub fn single_notification(events: &[Event], level: NotificationLevel) -> String {
    let mut found = notifications(events, level);
    assert_eq!(
        found.len(),
        1,
        "expected exactly one {level} notification, got {found:?}"
    );
    found.remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_notifications_by_level() {
        let events = vec![
            Event::notification(NotificationLevel::Info, "checking"),
            Event::notification(NotificationLevel::Success, "done"),
            Event::SelectionChanged {
                selected: 1,
                total: 2,
            },
        ];
        assert_eq!(single_notification(&events, NotificationLevel::Success), "done");
        assert!(notifications(&events, NotificationLevel::Error).is_empty());
        assert_eq!(count_kind(&events, "selection_changed"), 1);
    }
}
