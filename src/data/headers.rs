use std::collections::BTreeMap;

use super::model::{Field, SensorFields};

/// One CSV row as read: raw column name → raw cell text.
pub type RawRow = BTreeMap<String, String>;

/// Canonical meaning of a raw CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Time,
    Sensor(Field),
}

/// Ordered substring rules; the first rule whose needle occurs in the
/// normalized key decides the column. Acc/gyro carry no axis here, it is
/// read from the text after the keyword.
enum Rule {
    Time,
    Field(Field),
    Acc,
    Gyro,
}

const RULES: &[(&[&str], Rule)] = &[
    (&["time"], Rule::Time),
    (&["skint", "skin"], Rule::Field(Field::SkinTemp)),
    (&["ambt", "ambient", "amb"], Rule::Field(Field::AmbientTemp)),
    (&["heatflux", "heat flux", "heat", "hf"], Rule::Field(Field::HeatFlux)),
    (&["acc"], Rule::Acc),
    (&["gyr"], Rule::Gyro),
    (&["heart", "bpm", "pulse", "hr"], Rule::Field(Field::HeartRate)),
    (&["spo2", "oxygen", "o2"], Rule::Field(Field::Spo2)),
];

/// Lowercase, drop bracket characters, trim and collapse internal whitespace.
pub fn normalize_key(raw: &str) -> String {
    let lowered: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '[' | ']' | '{' | '}'))
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a raw header into a canonical column, if any rule matches.
pub fn classify_header(raw: &str) -> Option<Column> {
    let key = normalize_key(raw);
    for (needles, rule) in RULES {
        let Some(pos) = needles.iter().find_map(|n| key.find(n).map(|p| p + n.len())) else {
            continue;
        };
        return match rule {
            Rule::Time => Some(Column::Time),
            Rule::Field(f) => Some(Column::Sensor(*f)),
            Rule::Acc => axis(&key[pos..], [Field::AccX, Field::AccY, Field::AccZ]),
            Rule::Gyro => axis(&key[pos..], [Field::GyroX, Field::GyroY, Field::GyroZ]),
        };
    }
    None
}

fn axis(rest: &str, fields: [Field; 3]) -> Option<Column> {
    rest.chars().find_map(|c| match c {
        'x' => Some(Column::Sensor(fields[0])),
        'y' => Some(Column::Sensor(fields[1])),
        'z' => Some(Column::Sensor(fields[2])),
        _ => None,
    })
}

/// Lenient numeric cell parse: empty, malformed or non-finite text is null.
pub fn parse_numeric(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// HeaderMap – classification computed once per header row
// ---------------------------------------------------------------------------

/// A row reduced to its canonical content.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub time: Option<String>,
    pub fields: SensorFields,
}

/// Column index → canonical column for one CSV file. When two columns map
/// to the same canonical column, the leftmost one is used.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    time: Option<usize>,
    fields: Vec<(usize, Field)>,
}

impl HeaderMap {
    pub fn new<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut time = None;
        let mut fields: Vec<(usize, Field)> = Vec::new();
        for (idx, raw) in headers.into_iter().enumerate() {
            match classify_header(raw) {
                Some(Column::Time) if time.is_none() => time = Some(idx),
                Some(Column::Sensor(f)) if !fields.iter().any(|(_, g)| *g == f) => {
                    fields.push((idx, f))
                }
                _ => log::debug!("ignoring column '{raw}'"),
            }
        }
        HeaderMap { time, fields }
    }

    pub fn has_time(&self) -> bool {
        self.time.is_some()
    }

    /// Fields that at least one column maps to.
    pub fn mapped_fields(&self) -> Vec<Field> {
        self.fields.iter().map(|(_, f)| *f).collect()
    }

    /// Apply to one record given as cell accessor.
    pub fn apply<'a, F>(&self, cell: F) -> NormalizedRow
    where
        F: Fn(usize) -> Option<&'a str>,
    {
        let time = self
            .time
            .and_then(|i| cell(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let mut fields = SensorFields::empty();
        for &(idx, field) in &self.fields {
            fields[field] = cell(idx).and_then(parse_numeric);
        }
        NormalizedRow { time, fields }
    }
}

/// Normalize a single keyed row. Keys are visited in map order.
pub fn normalize_row(row: &RawRow) -> NormalizedRow {
    let keys: Vec<&str> = row.keys().map(String::as_str).collect();
    let values: Vec<&str> = row.values().map(String::as_str).collect();
    HeaderMap::new(keys.iter().copied()).apply(|i| values.get(i).copied())
}
