use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

/// Placeholder shown for any reading the upstream did not deliver
pub const NO_DATA: &str = "-";

/// A fixed observation point, identified by its upstream station code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Station {
    pub code: String,
    pub name: String,
}

impl Station {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Snow depth currently on the ground
    TotalSnow,
    /// Snow fallen since the start of the day
    NewSnow,
}

impl MetricKind {
    pub const ALL: [MetricKind; 2] = [MetricKind::TotalSnow, MetricKind::NewSnow];

    /// Value of the `sd` query parameter on the upstream API
    pub fn query_code(self) -> &'static str {
        match self {
            MetricKind::TotalSnow => "tot",
            MetricKind::NewSnow => "day",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_code())
    }
}

/// One hour of one calendar day; the unit of upstream fan-out.
///
/// Ordering is by date, then hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourSlot {
    date: NaiveDate,
    hour: u32,
}

impl HourSlot {
    /// Returns `None` when `hour` is outside `0..24`
    pub fn new(date: NaiveDate, hour: u32) -> Option<Self> {
        (hour < 24).then_some(Self { date, hour })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Ten character `YYYYMMDDHH` timestamp
    pub fn timestamp(&self) -> String {
        format!("{}{:02}", self.date.format("%Y%m%d"), self.hour)
    }

    /// Two digit hour label used in result rows
    pub fn hour_label(&self) -> String {
        format!("{:02}", self.hour)
    }
}

impl fmt::Display for HourSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.timestamp())
    }
}

/// Value for one (hour, station, metric) triple
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Reading {
    #[default]
    NoData,
    Value(String),
}

impl Reading {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Reading::NoData)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Reading::NoData => NO_DATA,
            Reading::Value(v) => v,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One output row: readings of both metrics for a station at one hour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResultRow {
    #[schema(example = "07")]
    pub hour: String,
    #[schema(example = "군산")]
    pub name: String,
    /// Total snow depth in cm, or "-"
    #[schema(value_type = String, example = "3.2")]
    pub tot: Reading,
    /// New snow in cm, or "-"
    #[schema(value_type = String, example = "-")]
    pub day: Reading,
}

impl ResultRow {
    pub fn is_empty(&self) -> bool {
        self.tot.is_no_data() && self.day.is_no_data()
    }
}

/// Parse an 8 digit `YYYYMMDD` date as accepted by the query endpoints
pub fn parse_query_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 8 || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}
