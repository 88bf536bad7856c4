use std::collections::BTreeMap;

use super::model::{EventInterval, Instant};

// ---------------------------------------------------------------------------
// Toggle state: which event types are shown
// ---------------------------------------------------------------------------

/// Per-type visibility: event type → shown. A type absent from the map is shown.
pub type EventToggles = BTreeMap<String, bool>;

/// Initialise [`EventToggles`] with every type switched on, keeping the
/// previous choice for types that were already known.
pub fn init_toggles(events: &[EventInterval], previous: &EventToggles) -> EventToggles {
    events
        .iter()
        .map(|ev| {
            let on = previous.get(&ev.event_type).copied().unwrap_or(true);
            (ev.event_type.clone(), on)
        })
        .collect()
}

/// The chart's current time domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDomain {
    pub min: Instant,
    pub max: Instant,
}

impl TimeDomain {
    /// Whether an interval lies entirely before or after the domain.
    pub fn excludes(&self, start: Instant, end: Instant) -> bool {
        end < self.min || start > self.max
    }
}

/// Events split for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewWindow<'a> {
    /// Events whose type is toggled on.
    pub visible: Vec<&'a EventInterval>,
    /// Visible events lying completely outside the current domain.
    pub off_screen: Vec<&'a EventInterval>,
}

/// Apply the type toggles and find which shown events are scrolled away.
///
/// Without a domain (nothing plotted yet) no event counts as off screen.
pub fn view_window<'a>(
    events: &'a [EventInterval],
    toggles: &EventToggles,
    domain: Option<TimeDomain>,
) -> ViewWindow<'a> {
    let visible: Vec<&EventInterval> = events
        .iter()
        .filter(|ev| toggles.get(&ev.event_type).copied().unwrap_or(true))
        .collect();

    let off_screen = match domain {
        Some(d) => visible
            .iter()
            .copied()
            .filter(|ev| d.excludes(ev.start, ev.end))
            .collect(),
        None => Vec::new(),
    };

    ViewWindow { visible, off_screen }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::EventSource;
    use chrono::{TimeZone, Utc};

    fn at(h: u32) -> Instant {
        Utc.with_ymd_and_hms(2025, 1, 1, h, 0, 0).unwrap()
    }

    fn event(ty: &str, start: u32, end: u32) -> EventInterval {
        EventInterval {
            id: format!("csv-{ty}-{start}"),
            event_type: ty.to_string(),
            display_label: ty.to_string(),
            start: at(start),
            end: at(end),
            date_key: "2025-01-01".into(),
            notes: None,
            location: None,
            source: EventSource::Csv,
        }
    }

    #[test]
    fn test_toggles_hide_types() {
        let events = vec![event("Meal", 8, 9), event("Sleep", 1, 6), event("Meal", 12, 13)];
        let mut toggles = init_toggles(&events, &EventToggles::new());
        assert_eq!(toggles.len(), 2);
        assert!(toggles.values().all(|on| *on));

        toggles.insert("Meal".into(), false);
        let view = view_window(&events, &toggles, None);
        assert_eq!(view.visible.len(), 1);
        assert_eq!(view.visible[0].event_type, "Sleep");
        assert!(view.off_screen.is_empty());
    }

    #[test]
    fn test_off_screen_subset() {
        let events = vec![
            event("Sleep", 1, 6),
            event("Meal", 8, 9),
            event("Walk", 9, 11),
            event("Dinner", 19, 20),
        ];
        let toggles = init_toggles(&events, &EventToggles::new());
        let domain = TimeDomain {
            min: at(7),
            max: at(10),
        };
        let view = view_window(&events, &toggles, Some(domain));
        assert_eq!(view.visible.len(), 4);
        let off: Vec<&str> = view.off_screen.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(off, vec!["Sleep", "Dinner"]);
    }

    #[test]
    fn test_hidden_events_never_off_screen() {
        let events = vec![event("Sleep", 1, 6)];
        let mut toggles = EventToggles::new();
        toggles.insert("Sleep".into(), false);
        let domain = TimeDomain {
            min: at(7),
            max: at(10),
        };
        let view = view_window(&events, &toggles, Some(domain));
        assert!(view.visible.is_empty());
        assert!(view.off_screen.is_empty());
    }

    #[test]
    fn test_init_keeps_previous_choice() {
        let events = vec![event("Meal", 8, 9), event("Walk", 9, 10)];
        let mut previous = EventToggles::new();
        previous.insert("Meal".into(), false);
        let toggles = init_toggles(&events, &previous);
        assert_eq!(toggles.get("Meal"), Some(&false));
        assert_eq!(toggles.get("Walk"), Some(&true));
    }

    #[test]
    fn test_touching_domain_edges_is_on_screen() {
        let domain = TimeDomain {
            min: at(7),
            max: at(10),
        };
        assert!(!domain.excludes(at(6), at(7)));
        assert!(!domain.excludes(at(10), at(11)));
        assert!(domain.excludes(at(11), at(12)));
    }
}
