//! Evaluation record ingestion

pub mod intra;
pub mod record;

pub use intra::IntraClient;
pub use record::{Participant, Record};

use crate::error::FetchError;
use chrono::NaiveDate;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of evaluation start dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    begin: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Result<Self, FetchError> {
        if begin > end {
            return Err(FetchError::InvalidRange(format!(
                "begin {} is after end {}",
                begin.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(Self { begin, end })
    }

    /// Range from dates the caller already knows to be ordered
    pub(crate) const fn from_ordered(begin: NaiveDate, end: NaiveDate) -> Self {
        Self { begin, end }
    }

    /// Parse two `YYYY-MM-DD` dates
    pub fn parse(begin: &str, end: &str) -> Result<Self, FetchError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map_err(|e| FetchError::InvalidRange(format!("`{s}`: {e}")))
        };
        Self::new(parse(begin)?, parse(end)?)
    }

    pub fn begin(&self) -> NaiveDate {
        self.begin
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Formats as the API's `range[begin_at]` value: `YYYY-MM-DD,YYYY-MM-DD`
impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}",
            self.begin.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Which evaluations to pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationQuery {
    pub campus_id: u32,
    pub cursus_id: u32,
    pub range: DateRange,
}

/// Anything that can produce the full record sequence for a query
pub trait RecordSource {
    fn fetch_records(&self, query: &EvaluationQuery) -> Result<Vec<Record>, FetchError>;
}
