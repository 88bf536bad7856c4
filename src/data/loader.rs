use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::error::{AnalysisError, TimestampError};
use super::events::{parse_events, parse_manual_events, EventContext, ManualEvent};
use super::headers::HeaderMap;
use super::merge::merge_streams;
use super::model::{DateRange, EventSource, MergeSummary, NormalizedSample, Session};
use super::rollover::correct_rollover;
use super::timestamp::{base_date_from_filename, parse_timestamp};
use crate::config::Settings;

// ---------------------------------------------------------------------------
// Input files
// ---------------------------------------------------------------------------

/// A CSV file read into memory, with the name used in messages and for
/// base date detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub text: String,
}

impl InputFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Read a UTF-8 CSV file from disk.
pub fn load_input(path: &Path) -> Result<InputFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();
    Ok(InputFile { name, text })
}

/// Session date from the first file name carrying a `DD-MM-YYYY` date.
pub fn detect_base_date<'a, I>(names: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().find_map(base_date_from_filename)
}

// ---------------------------------------------------------------------------
// Sensor CSV
// ---------------------------------------------------------------------------

/// Samples read from one sensor file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorStream {
    pub samples: Vec<NormalizedSample>,
    /// Rows skipped for a missing or unparseable timestamp.
    pub dropped_rows: usize,
}

/// Parse a sensor export. Rows whose timestamp cannot be read are dropped;
/// malformed CSV or a bare time without `base_date` fails the whole file.
pub fn parse_sensor_csv(
    input: &InputFile,
    base_date: Option<NaiveDate>,
) -> Result<SensorStream, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(input.text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| AnalysisError::csv(&input.name, e))?
        .clone();
    let map = HeaderMap::new(headers.iter());
    if !map.has_time() {
        log::warn!("{}: no time column among {:?}", input.name, headers);
    }

    let mut samples = Vec::new();
    let mut dropped_rows = 0;
    for record in reader.records() {
        let record = record.map_err(|e| AnalysisError::csv(&input.name, e))?;
        let row = map.apply(|i| record.get(i));

        let Some(raw_time) = row.time else {
            dropped_rows += 1;
            continue;
        };
        match parse_timestamp(&raw_time, base_date) {
            Ok(timestamp) => samples.push(NormalizedSample {
                timestamp,
                fields: row.fields,
            }),
            Err(TimestampError::Unparseable(_)) => dropped_rows += 1,
            Err(TimestampError::BaseDateRequired(value)) => {
                return Err(AnalysisError::BaseDateRequired {
                    input: input.name.clone(),
                    value,
                })
            }
        }
    }

    if dropped_rows > 0 {
        log::warn!("{}: dropped {dropped_rows} row(s) without a readable timestamp", input.name);
    }
    log::debug!(
        "{}: {} samples, fields {:?}",
        input.name,
        samples.len(),
        map.mapped_fields()
    );
    Ok(SensorStream {
        samples,
        dropped_rows,
    })
}

// ---------------------------------------------------------------------------
// Parse & merge
// ---------------------------------------------------------------------------

/// Where the event overlay comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventsInput {
    #[default]
    None,
    Csv(InputFile),
    Manual(Vec<ManualEvent>),
}

/// Everything a parse & merge run reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInputs {
    pub distal: InputFile,
    pub proximal: InputFile,
    pub events: EventsInput,
    pub base_date: Option<NaiveDate>,
}

/// Build a fresh [`Session`] from the inputs. Pure: either the complete
/// session or the first error, never a partial result.
pub fn parse_and_merge(inputs: &SessionInputs, settings: &Settings) -> Result<Session, AnalysisError> {
    let mut distal = parse_sensor_csv(&inputs.distal, inputs.base_date)?;
    let mut proximal = parse_sensor_csv(&inputs.proximal, inputs.base_date)?;

    correct_rollover(&mut distal.samples);
    correct_rollover(&mut proximal.samples);

    let merged = merge_streams(&distal.samples, &proximal.samples, settings.merge_tolerance_secs);
    let date_range = DateRange::from_instants(merged.iter().map(|m| m.timestamp));

    let ctx = EventContext {
        base_date: inputs.base_date,
        date_range,
        max_events: settings.max_events,
        source: EventSource::Csv,
    };
    let events = match &inputs.events {
        EventsInput::None => Vec::new(),
        EventsInput::Csv(file) => parse_events(&file.text, &ctx)?,
        EventsInput::Manual(list) => parse_manual_events(list, &ctx)?,
    };

    let summary = MergeSummary {
        distal_samples: distal.samples.len(),
        proximal_samples: proximal.samples.len(),
        matched: merged.iter().filter(|m| m.proximal_row.is_some()).count(),
        dropped_rows: distal.dropped_rows + proximal.dropped_rows,
    };
    log::info!(
        "merged {} distal with {} proximal samples: {} matched, {} rows dropped, {} events",
        summary.distal_samples,
        summary.proximal_samples,
        summary.matched,
        summary.dropped_rows,
        events.len()
    );

    Ok(Session {
        merged,
        events,
        date_range,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Field;
    use chrono::{TimeZone, Utc};

    const DISTAL: &str = "Time,Skin Temp (C),Heart Rate\n\
                          23:59:30,31.0,60\n\
                          bogus,31.1,61\n\
                          00:00:30,31.2,\n\
                          00:01:30,31.3,62\n";

    const PROXIMAL: &str = "timestamp,skinT\n\
                            23:59:40,34.0\n\
                            00:00:20,34.1\n";

    fn inputs(events: EventsInput) -> SessionInputs {
        SessionInputs {
            distal: InputFile::new("distal_01-01-2025.csv", DISTAL),
            proximal: InputFile::new("proximal_01-01-2025.csv", PROXIMAL),
            events,
            base_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        }
    }

    #[test]
    fn test_parse_sensor_csv_drops_bad_rows() {
        let stream = parse_sensor_csv(&inputs(EventsInput::None).distal, NaiveDate::from_ymd_opt(2025, 1, 1))
            .unwrap();
        assert_eq!(stream.samples.len(), 3);
        assert_eq!(stream.dropped_rows, 1);
        assert_eq!(stream.samples[1].fields[Field::SkinTemp], Some(31.2));
        assert_eq!(stream.samples[1].fields[Field::HeartRate], None);
        assert_eq!(stream.samples[1].fields[Field::Spo2], None);
    }

    #[test]
    fn test_missing_base_date_aborts() {
        let err = parse_sensor_csv(&InputFile::new("d.csv", DISTAL), None).unwrap_err();
        assert!(matches!(err, AnalysisError::BaseDateRequired { .. }));
    }

    #[test]
    fn test_malformed_csv_aborts() {
        let file = InputFile::new("d.csv", "time,skinT\n08:00:00,31.0,extra\n");
        let err = parse_sensor_csv(&file, NaiveDate::from_ymd_opt(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, AnalysisError::Csv { .. }));
    }

    #[test]
    fn test_detect_base_date() {
        assert_eq!(
            detect_base_date(["distal.csv", "prox_02-03-2025.csv"]),
            NaiveDate::from_ymd_opt(2025, 3, 2)
        );
        assert_eq!(detect_base_date(["a.csv", "b.csv"]), None);
    }

    #[test]
    fn test_parse_and_merge_across_midnight() {
        let session = parse_and_merge(&inputs(EventsInput::None), &Settings::default()).unwrap();

        let stamps: Vec<_> = session.merged.iter().map(|m| m.timestamp).collect();
        assert_eq!(
            stamps,
            vec![
                Utc.with_ymd_and_hms(2025, 1, 1, 23, 59, 30).unwrap(),
                Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 30).unwrap(),
                Utc.with_ymd_and_hms(2025, 1, 2, 0, 1, 30).unwrap(),
            ]
        );
        assert_eq!(session.summary.matched, 2);
        assert_eq!(session.summary.dropped_rows, 1);
        assert_eq!(session.merged[0].differential, Some(31.0 - 34.0));
        assert_eq!(session.merged[2].differential, None);

        let range = session.date_range.unwrap();
        assert!(range.spans_multiple_days());
    }

    #[test]
    fn test_matched_counts_partners_with_empty_fields() {
        let mut session_inputs = inputs(EventsInput::None);
        session_inputs.proximal = InputFile::new("p.csv", "timestamp,skinT\n23:59:40,\n00:00:20,\n");
        let session = parse_and_merge(&session_inputs, &Settings::default()).unwrap();
        assert_eq!(session.summary.matched, 2);
        assert!(session.merged.iter().all(|m| m.differential.is_none()));
    }

    #[test]
    fn test_events_get_day_labels_on_multi_day_sessions() {
        let events = InputFile::new("events.csv", "start_time,end_time,event_type\n23:50:00,00:10:00,Sleep\n");
        let session = parse_and_merge(&inputs(EventsInput::Csv(events)), &Settings::default()).unwrap();
        assert_eq!(session.events.len(), 1);
        assert_eq!(session.events[0].display_label, "Sleep (Jan 1)");
        assert_eq!(
            session.events[0].end,
            Utc.with_ymd_and_hms(2025, 1, 2, 0, 10, 0).unwrap()
        );
    }

    #[test]
    fn test_event_cap_fails_whole_run() {
        let mut text = String::from("start_time,end_time,event_type\n");
        for i in 0..11 {
            text.push_str(&format!("{:02}:00:00,{:02}:10:00,E{i}\n", i, i));
        }
        let err = parse_and_merge(
            &inputs(EventsInput::Csv(InputFile::new("events.csv", text))),
            &Settings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::TooManyEvents { count: 11, cap: 10 }));
    }

    #[test]
    fn test_parse_and_merge_is_deterministic() {
        let a = parse_and_merge(&inputs(EventsInput::None), &Settings::default()).unwrap();
        let b = parse_and_merge(&inputs(EventsInput::None), &Settings::default()).unwrap();
        assert_eq!(a, b);
    }
}
