use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Standard trading periods a performance summary reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformancePeriod {
    OneDay,
    OneMonth,
    ThreeMonths,
    SixMonths,
    YearToDate,
    OneYear,
    ThreeYears,
    FiveYears,
    TenYears,
    Max,
}

impl PerformancePeriod {
    /// All periods in report order
    pub fn all() -> [PerformancePeriod; 10] {
        [
            PerformancePeriod::OneDay,
            PerformancePeriod::OneMonth,
            PerformancePeriod::ThreeMonths,
            PerformancePeriod::SixMonths,
            PerformancePeriod::YearToDate,
            PerformancePeriod::OneYear,
            PerformancePeriod::ThreeYears,
            PerformancePeriod::FiveYears,
            PerformancePeriod::TenYears,
            PerformancePeriod::Max,
        ]
    }

    /// Convert from the wire/database code
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "1D" => Ok(PerformancePeriod::OneDay),
            "1M" => Ok(PerformancePeriod::OneMonth),
            "3M" => Ok(PerformancePeriod::ThreeMonths),
            "6M" => Ok(PerformancePeriod::SixMonths),
            "YTD" => Ok(PerformancePeriod::YearToDate),
            "1Y" => Ok(PerformancePeriod::OneYear),
            "3Y" => Ok(PerformancePeriod::ThreeYears),
            "5Y" => Ok(PerformancePeriod::FiveYears),
            "10Y" => Ok(PerformancePeriod::TenYears),
            "MAX" => Ok(PerformancePeriod::Max),
            _ => Err(format!("Invalid performance period: {}", s)),
        }
    }

    /// Convert to the wire code
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformancePeriod::OneDay => "1D",
            PerformancePeriod::OneMonth => "1M",
            PerformancePeriod::ThreeMonths => "3M",
            PerformancePeriod::SixMonths => "6M",
            PerformancePeriod::YearToDate => "YTD",
            PerformancePeriod::OneYear => "1Y",
            PerformancePeriod::ThreeYears => "3Y",
            PerformancePeriod::FiveYears => "5Y",
            PerformancePeriod::TenYears => "10Y",
            PerformancePeriod::Max => "MAX",
        }
    }

    /// Target baseline date for rolling periods: the as-of date minus the
    /// period's calendar offset. `None` for the anchored periods (YTD, MAX),
    /// which do not use a rolling target.
    ///
    /// Month and year offsets clamp to the end of the month the way calendar
    /// arithmetic does (e.g. Mar 31 minus one month is Feb 28/29).
    pub fn target_date(&self, as_of: NaiveDate) -> Option<NaiveDate> {
        match self {
            PerformancePeriod::OneDay => as_of.pred_opt(),
            PerformancePeriod::OneMonth => as_of.checked_sub_months(Months::new(1)),
            PerformancePeriod::ThreeMonths => as_of.checked_sub_months(Months::new(3)),
            PerformancePeriod::SixMonths => as_of.checked_sub_months(Months::new(6)),
            PerformancePeriod::OneYear => as_of.checked_sub_months(Months::new(12)),
            PerformancePeriod::ThreeYears => as_of.checked_sub_months(Months::new(36)),
            PerformancePeriod::FiveYears => as_of.checked_sub_months(Months::new(60)),
            PerformancePeriod::TenYears => as_of.checked_sub_months(Months::new(120)),
            PerformancePeriod::YearToDate | PerformancePeriod::Max => None,
        }
    }
}

impl From<PerformancePeriod> for String {
    fn from(period: PerformancePeriod) -> Self {
        period.as_str().to_string()
    }
}
