use chrono::{NaiveDate, Utc};

use crate::color::EventColors;
use crate::config::Settings;
use crate::data::error::ManualEntryError;
use crate::data::events::{parse_manual_events, validate_manual_event, EventContext, ManualEvent};
use crate::data::filter::{init_toggles, view_window, EventToggles, TimeDomain, ViewWindow};
use crate::data::loader::{detect_base_date, parse_and_merge, EventsInput, InputFile, SessionInputs};
use crate::data::model::{EventSource, Session};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Which of the three input files a loaded file is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSlot {
    Distal,
    Proximal,
    Events,
}

impl InputSlot {
    pub fn label(self) -> &'static str {
        match self {
            InputSlot::Distal => "distal",
            InputSlot::Proximal => "proximal",
            InputSlot::Events => "events",
        }
    }
}

/// Text fields of the manual event form.
#[derive(Debug, Clone)]
pub struct ManualEntryForm {
    pub date: NaiveDate,
    pub start: String,
    pub end: String,
    pub event_type: String,
    pub notes: String,
}

impl Default for ManualEntryForm {
    fn default() -> Self {
        Self {
            date: Utc::now().date_naive(),
            start: String::new(),
            end: String::new(),
            event_type: String::new(),
            notes: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    pub distal: Option<InputFile>,
    pub proximal: Option<InputFile>,
    pub events_file: Option<InputFile>,

    /// Events typed in by the user; when present they replace the events file.
    pub manual_events: Vec<ManualEvent>,
    pub form: ManualEntryForm,

    /// Session calendar date for bare time-of-day values.
    pub base_date: Option<NaiveDate>,
    /// Set once the user picks a date, so file names stop overriding it.
    pub base_date_pinned: bool,

    /// Last successful parse & merge (None until the first one).
    pub session: Option<Session>,

    /// Per-type event visibility.
    pub toggles: EventToggles,
    pub event_colors: EventColors,

    /// Time range currently shown by the plot.
    pub domain: Option<TimeDomain>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            distal: None,
            proximal: None,
            events_file: None,
            manual_events: Vec::new(),
            form: ManualEntryForm::default(),
            base_date: None,
            base_date_pinned: false,
            session: None,
            toggles: EventToggles::new(),
            event_colors: EventColors::default(),
            domain: None,
            status_message: None,
        }
    }

    /// Store a freshly read file and refresh the detected base date.
    pub fn set_input(&mut self, slot: InputSlot, file: InputFile) {
        log::info!("loaded {} file {}", slot.label(), file.name);
        match slot {
            InputSlot::Distal => self.distal = Some(file),
            InputSlot::Proximal => self.proximal = Some(file),
            InputSlot::Events => self.events_file = Some(file),
        }
        if !self.base_date_pinned {
            let names = [&self.distal, &self.proximal]
                .into_iter()
                .flatten()
                .map(|f| f.name.as_str());
            if let Some(date) = detect_base_date(names) {
                self.base_date = Some(date);
                self.form.date = date;
            }
        }
        self.status_message = None;
    }

    /// Date the base-date picker shows: the base date, or the form date
    /// while none is set.
    pub fn base_date_shown(&self) -> NaiveDate {
        self.base_date.unwrap_or(self.form.date)
    }

    /// User-chosen base date.
    pub fn pin_base_date(&mut self, date: NaiveDate) {
        self.base_date = Some(date);
        self.base_date_pinned = true;
    }

    fn events_input(&self) -> EventsInput {
        if !self.manual_events.is_empty() {
            EventsInput::Manual(self.manual_events.clone())
        } else if let Some(file) = &self.events_file {
            EventsInput::Csv(file.clone())
        } else {
            EventsInput::None
        }
    }

    /// Recompute the whole session from the current inputs. On failure the
    /// previous session stays in place.
    pub fn parse_and_merge(&mut self) {
        let (Some(distal), Some(proximal)) = (&self.distal, &self.proximal) else {
            self.status_message = Some("Load both a distal and a proximal file first".into());
            return;
        };
        let inputs = SessionInputs {
            distal: distal.clone(),
            proximal: proximal.clone(),
            events: self.events_input(),
            base_date: self.base_date,
        };
        match parse_and_merge(&inputs, &self.settings) {
            Ok(session) => self.set_session(session),
            Err(e) => {
                log::error!("parse & merge failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a new session, refreshing toggles and colours.
    pub fn set_session(&mut self, session: Session) {
        self.toggles = init_toggles(&session.events, &self.toggles);
        self.event_colors = EventColors::new(&session.event_types());
        if let Some(range) = session.date_range {
            if !range.contains(self.form.date) {
                self.form.date = range.first;
            }
        }
        self.domain = None;
        self.session = Some(session);
        self.status_message = None;
    }

    /// Validate the form and append it as a manual event. Nothing changes
    /// unless the event is accepted.
    pub fn add_manual_event(&mut self) {
        if let Err(e) = self.try_add_manual_event() {
            log::warn!("manual event rejected: {e}");
            self.status_message = Some(format!("Error: {e}"));
        }
    }

    fn try_add_manual_event(&mut self) -> Result<(), String> {
        let f = &self.form;
        let event = ManualEvent::from_form(f.date, &f.start, &f.end, &f.event_type, &f.notes)
            .map_err(|e: ManualEntryError| e.to_string())?;
        let date_range = self.session.as_ref().and_then(|s| s.date_range);
        validate_manual_event(
            &event,
            self.manual_events.len(),
            date_range,
            self.settings.max_events,
            self.settings.max_notes_len,
        )
        .map_err(|e| e.to_string())?;

        let mut list = self.manual_events.clone();
        list.push(event);
        self.apply_manual_events(list)?;
        self.form = ManualEntryForm {
            date: self.form.date,
            ..ManualEntryForm::default()
        };
        Ok(())
    }

    /// Drop one manual event and re-derive the overlay.
    pub fn remove_manual_event(&mut self, idx: usize) {
        if idx >= self.manual_events.len() {
            return;
        }
        let mut list = self.manual_events.clone();
        list.remove(idx);
        if let Err(e) = self.apply_manual_events(list) {
            self.status_message = Some(format!("Error: {e}"));
        }
    }

    /// Re-parse the event overlay from `list` and commit both on success.
    fn apply_manual_events(&mut self, list: Vec<ManualEvent>) -> Result<(), String> {
        if let Some(session) = &self.session {
            let ctx = EventContext {
                base_date: self.base_date,
                date_range: session.date_range,
                max_events: self.settings.max_events,
                source: EventSource::Manual,
            };
            let events = if list.is_empty() {
                Vec::new()
            } else {
                parse_manual_events(&list, &ctx).map_err(|e| e.to_string())?
            };
            let mut next = session.clone();
            next.events = events;
            self.manual_events = list;
            let domain = self.domain;
            self.set_session(next);
            self.domain = domain;
        } else {
            self.manual_events = list;
        }
        Ok(())
    }

    /// Flip visibility of one event type.
    pub fn toggle_event_type(&mut self, event_type: &str) {
        let on = self.toggles.entry(event_type.to_string()).or_insert(true);
        *on = !*on;
    }

    /// Visible and off-screen events for the current toggles and domain.
    pub fn view(&self) -> ViewWindow<'_> {
        match &self.session {
            Some(s) => view_window(&s.events, &self.toggles, self.domain),
            None => ViewWindow::default(),
        }
    }
}
