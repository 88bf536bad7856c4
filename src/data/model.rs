use std::fmt;
use std::ops::{Index, IndexMut};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Absolute point in time used across the whole engine.
pub type Instant = DateTime<Utc>;

// ---------------------------------------------------------------------------
// Field – the canonical sensor channels
// ---------------------------------------------------------------------------

/// One of the eleven semantic sensor channels a wearable export may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    SkinTemp,
    AmbientTemp,
    AccX,
    AccY,
    AccZ,
    GyroX,
    GyroY,
    GyroZ,
    HeatFlux,
    HeartRate,
    Spo2,
}

impl Field {
    pub const COUNT: usize = 11;

    pub const ALL: [Field; Field::COUNT] = [
        Field::SkinTemp,
        Field::AmbientTemp,
        Field::AccX,
        Field::AccY,
        Field::AccZ,
        Field::GyroX,
        Field::GyroY,
        Field::GyroZ,
        Field::HeatFlux,
        Field::HeartRate,
        Field::Spo2,
    ];

    /// Stable camelCase key, also used for export column names.
    pub fn key(self) -> &'static str {
        match self {
            Field::SkinTemp => "skinTemp",
            Field::AmbientTemp => "ambientTemp",
            Field::AccX => "accX",
            Field::AccY => "accY",
            Field::AccZ => "accZ",
            Field::GyroX => "gyroX",
            Field::GyroY => "gyroY",
            Field::GyroZ => "gyroZ",
            Field::HeatFlux => "heatFlux",
            Field::HeartRate => "heartRate",
            Field::Spo2 => "spo2",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// SensorFields – full field set, nulls kept explicit
// ---------------------------------------------------------------------------

/// Values for every [`Field`]. A missing or malformed cell is `None`,
/// never an absent entry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorFields([Option<f64>; Field::COUNT]);

impl SensorFields {
    /// All fields null; attached to distal samples that found no partner.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.0[field.slot()]
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        self.0[field.slot()] = value;
    }

    /// Iterate `(field, value)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<f64>)> + '_ {
        Field::ALL.iter().map(move |&f| (f, self.get(f)))
    }
}

impl Index<Field> for SensorFields {
    type Output = Option<f64>;

    fn index(&self, field: Field) -> &Self::Output {
        &self.0[field.slot()]
    }
}

impl IndexMut<Field> for SensorFields {
    fn index_mut(&mut self, field: Field) -> &mut Self::Output {
        &mut self.0[field.slot()]
    }
}

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// A single row of a sensor export after header normalization and
/// timestamp parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSample {
    pub timestamp: Instant,
    pub fields: SensorFields,
}

/// Anything carrying a timestamp that rollover correction may shift.
pub trait Timestamped {
    fn timestamp(&self) -> Instant;
    fn set_timestamp(&mut self, ts: Instant);
}

impl Timestamped for NormalizedSample {
    fn timestamp(&self) -> Instant {
        self.timestamp
    }

    fn set_timestamp(&mut self, ts: Instant) {
        self.timestamp = ts;
    }
}

/// One distal sample joined with its proximal partner (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSample {
    pub timestamp: Instant,
    pub distal: SensorFields,
    pub proximal: SensorFields,
    /// Row of the paired proximal sample; `None` when nothing was in tolerance.
    pub proximal_row: Option<usize>,
    /// Distal minus proximal skin temperature (DPG).
    pub differential: Option<f64>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Where an event interval came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Csv,
    Manual,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Csv => write!(f, "csv"),
            EventSource::Manual => write!(f, "manual"),
        }
    }
}

/// A typed activity interval overlaid on the chart. `start <= end` holds
/// from parse time onwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInterval {
    pub id: String,
    pub event_type: String,
    pub display_label: String,
    pub start: Instant,
    pub end: Instant,
    /// `YYYY-MM-DD` of `start` (UTC).
    pub date_key: String,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub source: EventSource,
}

// ---------------------------------------------------------------------------
// DateRange – calendar span covered by the analyzed recording
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    /// Calendar span of a time-ordered instant sequence (first and last element).
    pub fn from_instants<I>(instants: I) -> Option<Self>
    where
        I: IntoIterator<Item = Instant>,
    {
        let mut iter = instants.into_iter();
        let first = iter.next()?;
        let last = iter.last().unwrap_or(first);
        let (lo, hi) = if last < first { (last, first) } else { (first, last) };
        Some(DateRange {
            first: lo.date_naive(),
            last: hi.date_naive(),
        })
    }

    pub fn spans_multiple_days(&self) -> bool {
        self.last > self.first
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last
    }
}

// ---------------------------------------------------------------------------
// Session – everything one "parse & merge" produces
// ---------------------------------------------------------------------------

/// Counts reported after a successful parse & merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub distal_samples: usize,
    pub proximal_samples: usize,
    pub matched: usize,
    pub dropped_rows: usize,
}

/// Derived dataset. Replaced wholesale on every parse & merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub merged: Vec<MergedSample>,
    pub events: Vec<EventInterval>,
    pub date_range: Option<DateRange>,
    pub summary: MergeSummary,
}

impl Session {
    /// Number of merged samples.
    pub fn len(&self) -> usize {
        self.merged.len()
    }

    /// Whether the merged timeline is empty.
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    /// Unique event types in first-seen order.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for ev in &self.events {
            if !types.contains(&ev.event_type) {
                types.push(ev.event_type.clone());
            }
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sensor_fields_default_all_null() {
        let fields = SensorFields::empty();
        assert_eq!(fields.iter().count(), Field::COUNT);
        assert!(fields.iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn test_sensor_fields_index() {
        let mut fields = SensorFields::empty();
        fields[Field::HeartRate] = Some(72.0);
        fields.set(Field::Spo2, Some(98.0));
        assert_eq!(fields.get(Field::HeartRate), Some(72.0));
        assert_eq!(fields[Field::Spo2], Some(98.0));
        assert_eq!(fields[Field::SkinTemp], None);
    }

    #[test]
    fn test_date_range() {
        let a = Utc.with_ymd_and_hms(2025, 1, 1, 22, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 1, 2, 3, 0, 0).unwrap();
        let range = DateRange::from_instants([a, b]).unwrap();
        assert!(range.spans_multiple_days());
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()));

        let single = DateRange::from_instants([a]).unwrap();
        assert!(!single.spans_multiple_days());
        assert!(DateRange::from_instants(Vec::<Instant>::new()).is_none());
    }

    #[test]
    fn test_field_keys_match_serde() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.key()));
        }
    }
}
