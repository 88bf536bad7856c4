use chrono::NaiveDate;
use thiserror::Error;

/// Failure to turn a raw timestamp string into an instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Neither ISO-8601 nor `H:MM:SS`; callers drop the row.
    #[error("unparseable timestamp '{0}'")]
    Unparseable(String),
    /// Bare time-of-day value with no session date to anchor it.
    #[error("base date required to interpret time-of-day value '{0}'")]
    BaseDateRequired(String),
}

/// Failure of a whole parse & merge batch. Nothing derived is applied.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{input}: {source}")]
    Csv {
        input: String,
        #[source]
        source: csv::Error,
    },

    #[error("{input}: base date required to interpret time-of-day value '{value}'")]
    BaseDateRequired { input: String, value: String },

    #[error("too many events: {count} found, at most {cap} are allowed")]
    TooManyEvents { count: usize, cap: usize },
}

impl AnalysisError {
    pub(crate) fn csv(input: &str, source: csv::Error) -> Self {
        AnalysisError::Csv {
            input: input.to_string(),
            source,
        }
    }
}

/// Rejection of a manually entered event before any state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManualEntryError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("end time must be after start time")]
    EndNotAfterStart,

    #[error("notes are limited to {max} characters ({len} given)")]
    NotesTooLong { len: usize, max: usize },

    #[error("notes are required for events of type '{0}'")]
    NotesRequired(String),

    #[error("{date} is outside the analyzed range {first} to {last}")]
    DateOutOfRange {
        date: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },

    #[error("at most {cap} events are allowed")]
    TooManyEvents { cap: usize },
}
