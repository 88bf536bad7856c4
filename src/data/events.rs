use chrono::{Days, NaiveDate, NaiveTime};

use super::error::{AnalysisError, ManualEntryError, TimestampError};
use super::model::{DateRange, EventInterval, EventSource, Instant};
use super::timestamp::{parse_iso, parse_time_of_day};

/// Upper bound on events overlaid at once.
pub const DEFAULT_MAX_EVENTS: usize = 10;

/// Upper bound on manual-entry notes length, in characters.
pub const DEFAULT_MAX_NOTES_LEN: usize = 200;

/// Header written for manually entered events.
pub const MANUAL_CSV_HEADER: [&str; 4] = ["Start Time", "End Time", "Event Type", "Notes"];

const START_HEADERS: &[&str] = &["start_time", "Start Time", "start", "Start", "startTime", "Start time"];
const END_HEADERS: &[&str] = &["end_time", "End Time", "end", "End", "endTime", "End time"];
const TYPE_HEADERS: &[&str] = &[
    "event_type",
    "Event Type",
    "type",
    "Type",
    "activity",
    "Activity",
    "event",
    "Event",
];
const NOTES_HEADERS: &[&str] = &["notes", "Notes", "note", "Note"];
const LOCATION_HEADERS: &[&str] = &["location", "Location"];

/// Type assigned to rows with no type column or an empty type cell.
const UNKNOWN_TYPE: &str = "Unknown";

/// Everything event parsing needs to know about the analyzed recording.
#[derive(Debug, Clone, Copy)]
pub struct EventContext {
    pub base_date: Option<NaiveDate>,
    pub date_range: Option<DateRange>,
    pub max_events: usize,
    pub source: EventSource,
}

impl Default for EventContext {
    fn default() -> Self {
        Self {
            base_date: None,
            date_range: None,
            max_events: DEFAULT_MAX_EVENTS,
            source: EventSource::Csv,
        }
    }
}

// ---------------------------------------------------------------------------
// Column lookup
// ---------------------------------------------------------------------------

/// Candidate column indices per role, in header-spelling priority order.
struct EventColumns {
    start: Vec<usize>,
    end: Vec<usize>,
    event_type: Vec<usize>,
    notes: Vec<usize>,
    location: Vec<usize>,
}

impl EventColumns {
    fn new(headers: &csv::StringRecord) -> Self {
        let lookup = |names: &[&str]| -> Vec<usize> {
            names
                .iter()
                .filter_map(|name| headers.iter().position(|h| h.trim() == *name))
                .collect()
        };
        EventColumns {
            start: lookup(START_HEADERS),
            end: lookup(END_HEADERS),
            event_type: lookup(TYPE_HEADERS),
            notes: lookup(NOTES_HEADERS),
            location: lookup(LOCATION_HEADERS),
        }
    }
}

/// First non-empty cell among the candidate columns.
fn first_value<'r>(record: &'r csv::StringRecord, candidates: &[usize]) -> Option<&'r str> {
    candidates
        .iter()
        .filter_map(|&i| record.get(i))
        .map(str::trim)
        .find(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// CSV → EventInterval
// ---------------------------------------------------------------------------

/// Parse an events CSV into intervals.
///
/// Rows missing a start or end are skipped, as are rows whose times cannot
/// be read. A start containing `T` or `-` marks the row as ISO-8601;
/// otherwise both ends are times of day on `ctx.base_date`. In both forms
/// an end before its start is read as crossing midnight and moved forward
/// by whole days. More than `ctx.max_events` resulting events rejects the
/// whole input.
pub fn parse_events(text: &str, ctx: &EventContext) -> Result<Vec<EventInterval>, AnalysisError> {
    let input = format!("{} events", ctx.source);
    let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| AnalysisError::csv(&input, e))?
        .clone();
    let columns = EventColumns::new(&headers);

    let mut events = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AnalysisError::csv(&input, e))?;

        let (Some(start_raw), Some(end_raw)) = (
            first_value(&record, &columns.start),
            first_value(&record, &columns.end),
        ) else {
            log::debug!("{input}: row {row} has no start/end, skipped");
            continue;
        };

        let Some((start, end)) = resolve_interval(start_raw, end_raw, ctx.base_date)
            .map_err(|value| AnalysisError::BaseDateRequired {
                input: input.clone(),
                value,
            })?
        else {
            log::warn!("{input}: row {row} has unreadable times '{start_raw}'..'{end_raw}', skipped");
            continue;
        };

        let event_type = first_value(&record, &columns.event_type)
            .unwrap_or(UNKNOWN_TYPE)
            .to_string();
        let date = start.date_naive();

        events.push(EventInterval {
            id: format!("{}-{row}", ctx.source),
            display_label: display_label(&event_type, date, ctx.date_range),
            event_type,
            start,
            end,
            date_key: date.format("%Y-%m-%d").to_string(),
            notes: first_value(&record, &columns.notes).map(str::to_string),
            location: first_value(&record, &columns.location).map(str::to_string),
            source: ctx.source,
        });
    }

    if events.len() > ctx.max_events {
        return Err(AnalysisError::TooManyEvents {
            count: events.len(),
            cap: ctx.max_events,
        });
    }

    log::info!("{input}: parsed {} event(s)", events.len());
    Ok(events)
}

/// Resolve a start/end pair. `Ok(None)` means the row is unreadable and is
/// skipped; `Err` carries a bare time that needed a base date.
fn resolve_interval(
    start_raw: &str,
    end_raw: &str,
    base_date: Option<NaiveDate>,
) -> Result<Option<(Instant, Instant)>, String> {
    let (start, end) = if start_raw.contains('T') || start_raw.contains('-') {
        let (Some(start), Some(end)) = (parse_iso(start_raw), parse_iso(end_raw)) else {
            return Ok(None);
        };
        (start, end)
    } else {
        let bare = |raw: &str| match parse_time_of_day(raw, base_date) {
            Ok(ts) => Ok(Some(ts)),
            Err(TimestampError::Unparseable(_)) => Ok(None),
            Err(TimestampError::BaseDateRequired(value)) => Err(value),
        };
        let (Some(start), Some(end)) = (bare(start_raw)?, bare(end_raw)?) else {
            return Ok(None);
        };
        (start, end)
    };
    Ok(roll_end_forward(start, end).map(|end| (start, end)))
}

/// Move an end that precedes its start forward by whole days until it no
/// longer does. `None` only when the shifted end leaves chrono's range.
fn roll_end_forward(start: Instant, end: Instant) -> Option<Instant> {
    if end >= start {
        return Some(end);
    }
    // num_days truncates, so at most one more day is needed.
    let days = u64::try_from((start - end).num_days()).ok()?;
    let shifted = end.checked_add_days(Days::new(days))?;
    if shifted >= start {
        Some(shifted)
    } else {
        shifted.checked_add_days(Days::new(1))
    }
}

/// Type name, with the date appended when the recording spans several days.
pub fn display_label(event_type: &str, date: NaiveDate, range: Option<DateRange>) -> String {
    match range {
        Some(r) if r.spans_multiple_days() => format!("{event_type} ({})", date.format("%b %-d")),
        _ => event_type.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Manual entry
// ---------------------------------------------------------------------------

/// An event typed in by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEvent {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub event_type: String,
    pub notes: Option<String>,
}

impl ManualEvent {
    /// Build from raw form text. Times accept `HH:MM` or `HH:MM:SS`.
    pub fn from_form(
        date: NaiveDate,
        start: &str,
        end: &str,
        event_type: &str,
        notes: &str,
    ) -> Result<Self, ManualEntryError> {
        let event_type = event_type.trim();
        if event_type.is_empty() {
            return Err(ManualEntryError::MissingField("event type"));
        }
        let start_time = parse_form_time(start).ok_or(ManualEntryError::MissingField("start time"))?;
        let end_time = parse_form_time(end).ok_or(ManualEntryError::MissingField("end time"))?;
        let notes = notes.trim();

        Ok(ManualEvent {
            date,
            start_time,
            end_time,
            event_type: event_type.to_string(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

fn parse_form_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Check a manual event against the already entered ones. Nothing is
/// mutated; callers only append on `Ok`.
pub fn validate_manual_event(
    event: &ManualEvent,
    existing: usize,
    date_range: Option<DateRange>,
    max_events: usize,
    max_notes_len: usize,
) -> Result<(), ManualEntryError> {
    if event.event_type.trim().is_empty() {
        return Err(ManualEntryError::MissingField("event type"));
    }
    if event.end_time <= event.start_time {
        return Err(ManualEntryError::EndNotAfterStart);
    }

    let notes = event.notes.as_deref().unwrap_or("").trim();
    let len = notes.chars().count();
    if len > max_notes_len {
        return Err(ManualEntryError::NotesTooLong {
            len,
            max: max_notes_len,
        });
    }
    if notes.is_empty() && event.event_type.trim().eq_ignore_ascii_case("other") {
        return Err(ManualEntryError::NotesRequired(event.event_type.clone()));
    }

    if let Some(range) = date_range {
        if !range.contains(event.date) {
            return Err(ManualEntryError::DateOutOfRange {
                date: event.date,
                first: range.first,
                last: range.last,
            });
        }
    }
    if existing >= max_events {
        return Err(ManualEntryError::TooManyEvents { cap: max_events });
    }
    Ok(())
}

/// Render manual events as an events CSV (`Start Time,End Time,Event Type,Notes`)
/// with full ISO start/end values.
pub fn manual_events_to_csv(events: &[ManualEvent]) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    let mut writer = csv::Writer::from_writer(&mut buf);
    writer.write_record(MANUAL_CSV_HEADER)?;
    for ev in events {
        let start = ev.date.and_time(ev.start_time).format("%Y-%m-%dT%H:%M:%S").to_string();
        let end = ev.date.and_time(ev.end_time).format("%Y-%m-%dT%H:%M:%S").to_string();
        writer.write_record([
            start.as_str(),
            end.as_str(),
            ev.event_type.as_str(),
            ev.notes.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    drop(writer);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Manual events through the same path as an events file.
pub fn parse_manual_events(
    events: &[ManualEvent],
    ctx: &EventContext,
) -> Result<Vec<EventInterval>, AnalysisError> {
    let text = manual_events_to_csv(events).map_err(|e| AnalysisError::csv("manual events", e))?;
    parse_events(
        &text,
        &EventContext {
            source: EventSource::Manual,
            ..*ctx
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn ctx_with_base() -> EventContext {
        EventContext {
            base_date: Some(date(1)),
            ..Default::default()
        }
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn manual(d: u32, start: NaiveTime, end: NaiveTime, ty: &str, notes: Option<&str>) -> ManualEvent {
        ManualEvent {
            date: date(d),
            start_time: start,
            end_time: end,
            event_type: ty.to_string(),
            notes: notes.map(str::to_string),
        }
    }

    #[test]
    fn test_bare_time_cross_midnight() {
        let csv = "start_time,end_time,event_type\n09:00:00,08:30:00,Sleep\n";
        let events = parse_events(csv, &ctx_with_base()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
        assert_eq!(events[0].end, Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 0).unwrap());
        assert_eq!(events[0].date_key, "2025-01-01");
        assert_eq!(events[0].source, EventSource::Csv);
        assert_eq!(events[0].id, "csv-0");
    }

    #[test]
    fn test_iso_rows_and_title_case_headers() {
        let csv = "Start Time,End Time,Event Type,Notes,Location\n\
                   2025-01-02T10:00:00Z,2025-01-02T10:30:00Z,Meal,lunch,home\n";
        let events = parse_events(csv, &EventContext::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "Meal");
        assert_eq!(events[0].display_label, "Meal");
        assert_eq!(events[0].date_key, "2025-01-02");
        assert_eq!(events[0].notes.as_deref(), Some("lunch"));
        assert_eq!(events[0].location.as_deref(), Some("home"));
    }

    #[test]
    fn test_iso_inverted_interval_moves_to_next_day() {
        let csv = "start_time,end_time,event_type\n\
                   2025-01-01T23:00:00Z,2025-01-01T01:00:00Z,Sleep\n\
                   2025-01-03T10:00:00Z,2025-01-01T09:00:00Z,Nap\n";
        let events = parse_events(csv, &EventContext::default()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start, Utc.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap());
        assert_eq!(events[0].end, Utc.with_ymd_and_hms(2025, 1, 2, 1, 0, 0).unwrap());
        assert_eq!(events[0].date_key, "2025-01-01");
        // Several days behind: shifted until it is no longer before the start.
        assert_eq!(events[1].end, Utc.with_ymd_and_hms(2025, 1, 4, 9, 0, 0).unwrap());
        for ev in &events {
            assert!(ev.start <= ev.end);
        }
    }

    #[test]
    fn test_first_non_empty_spelling_wins() {
        let csv = "start_time,Start Time,end_time,type\n,10:00:00,11:00:00,Walk\n";
        let events = parse_events(csv, &ctx_with_base()).unwrap();
        assert_eq!(events[0].start, Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap());
        assert_eq!(events[0].event_type, "Walk");
    }

    #[test]
    fn test_rows_without_times_are_dropped() {
        let csv = "start_time,end_time,event_type\n,10:00:00,A\n10:00:00,,B\nnonsense,11:00:00,C\n10:00:00,11:00:00,\n";
        let events = parse_events(csv, &ctx_with_base()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, UNKNOWN_TYPE);
        assert_eq!(events[0].id, "csv-3");
    }

    #[test]
    fn test_bare_time_without_base_date_is_an_error() {
        let csv = "start_time,end_time\n10:00:00,11:00:00\n";
        let err = parse_events(csv, &EventContext::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::BaseDateRequired { .. }));
    }

    #[test]
    fn test_event_cap() {
        let mut csv = String::from("start_time,end_time,event_type\n");
        for i in 0..10 {
            csv.push_str(&format!("{:02}:00:00,{:02}:30:00,E{i}\n", i + 1, i + 1));
        }
        assert_eq!(parse_events(&csv, &ctx_with_base()).unwrap().len(), 10);

        csv.push_str("20:00:00,20:30:00,E10\n");
        match parse_events(&csv, &ctx_with_base()) {
            Err(AnalysisError::TooManyEvents { count, cap }) => {
                assert_eq!(count, 11);
                assert_eq!(cap, 10);
            }
            other => panic!("expected cap failure, got {other:?}"),
        }
    }

    #[test]
    fn test_display_label_multi_day() {
        let range = DateRange {
            first: date(1),
            last: date(2),
        };
        assert_eq!(display_label("Meal", date(2), Some(range)), "Meal (Jan 2)");
        let single = DateRange {
            first: date(1),
            last: date(1),
        };
        assert_eq!(display_label("Meal", date(1), Some(single)), "Meal");
        assert_eq!(display_label("Meal", date(1), None), "Meal");
    }

    #[test]
    fn test_malformed_csv_is_reported() {
        let csv = "start_time,end_time\n10:00:00,11:00:00,extra\n";
        let err = parse_events(csv, &ctx_with_base()).unwrap_err();
        assert!(matches!(err, AnalysisError::Csv { .. }));
    }

    #[test]
    fn test_manual_round_trip() {
        let manual_events = vec![
            manual(1, time(8, 0), time(8, 30), "Meal", Some("oats, milk")),
            manual(2, time(22, 0), time(23, 15), "Exercise", None),
            manual(2, time(6, 5), time(6, 20), "Other", Some("shower")),
        ];
        let csv = manual_events_to_csv(&manual_events).unwrap();
        assert!(csv.starts_with("Start Time,End Time,Event Type,Notes"));

        let parsed = parse_manual_events(&manual_events, &EventContext::default()).unwrap();
        assert_eq!(parsed.len(), manual_events.len());
        for (ev, orig) in parsed.iter().zip(&manual_events) {
            assert_eq!(ev.event_type, orig.event_type);
            assert_eq!(ev.start.date_naive(), orig.date);
            assert_eq!(ev.start.time(), orig.start_time);
            assert_eq!(ev.end.time(), orig.end_time);
            assert_eq!(ev.notes, orig.notes);
            assert_eq!(ev.source, EventSource::Manual);
        }
    }

    #[test]
    fn test_manual_validation() {
        let range = Some(DateRange {
            first: date(1),
            last: date(2),
        });
        let ok = manual(1, time(8, 0), time(9, 0), "Meal", None);
        assert_eq!(validate_manual_event(&ok, 0, range, 10, 200), Ok(()));

        let inverted = manual(1, time(9, 0), time(9, 0), "Meal", None);
        assert_eq!(
            validate_manual_event(&inverted, 0, range, 10, 200),
            Err(ManualEntryError::EndNotAfterStart)
        );

        let other = manual(1, time(8, 0), time(9, 0), "Other", None);
        assert!(matches!(
            validate_manual_event(&other, 0, range, 10, 200),
            Err(ManualEntryError::NotesRequired(_))
        ));

        let long = manual(1, time(8, 0), time(9, 0), "Meal", Some("x".repeat(201).as_str()));
        assert_eq!(
            validate_manual_event(&long, 0, range, 10, 200),
            Err(ManualEntryError::NotesTooLong { len: 201, max: 200 })
        );

        let outside = manual(3, time(8, 0), time(9, 0), "Meal", None);
        assert!(matches!(
            validate_manual_event(&outside, 0, range, 10, 200),
            Err(ManualEntryError::DateOutOfRange { .. })
        ));

        assert_eq!(
            validate_manual_event(&ok, 10, range, 10, 200),
            Err(ManualEntryError::TooManyEvents { cap: 10 })
        );
    }

    #[test]
    fn test_manual_from_form() {
        let ev = ManualEvent::from_form(date(1), "08:15", "09:00:30", " Meal ", "").unwrap();
        assert_eq!(ev.start_time, time(8, 15));
        assert_eq!(ev.end_time, NaiveTime::from_hms_opt(9, 0, 30).unwrap());
        assert_eq!(ev.event_type, "Meal");
        assert_eq!(ev.notes, None);

        assert_eq!(
            ManualEvent::from_form(date(1), "08:15", "09:00", "", ""),
            Err(ManualEntryError::MissingField("event type"))
        );
        assert_eq!(
            ManualEvent::from_form(date(1), "", "09:00", "Meal", ""),
            Err(ManualEntryError::MissingField("start time"))
        );
    }
}
