use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Workflow status of a leave request. Stored as an uppercase VARCHAR;
/// transitions are one-way, PENDING -> APPROVED or PENDING -> REJECTED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Leave classification, decided solely by the month the leave starts in.
/// May is the summer-vacation month; everything else is a regular leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LeaveKind {
    Summer,
    Regular,
}

/// May, as a calendar month number.
pub const SUMMER_MONTH: u32 = 5;

impl LeaveKind {
    pub fn of(start_date: NaiveDate) -> Self {
        if start_date.month() == SUMMER_MONTH {
            LeaveKind::Summer
        } else {
            LeaveKind::Regular
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2024-07-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-07-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub number_of_days: u32,
    #[schema(example = "family function")]
    pub reason: String,
    #[schema(example = "PENDING")]
    pub status: String,
    #[schema(example = "2024-07-01T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(example = "2024-07-01T00:00:00Z", value_type = String, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    pub fn kind(&self) -> LeaveKind {
        LeaveKind::of(self.start_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_db_strings() {
        assert_eq!(LeaveStatus::Pending.to_string(), "PENDING");
        assert_eq!(LeaveStatus::from_str("APPROVED").unwrap(), LeaveStatus::Approved);
        assert_eq!(LeaveStatus::from_str("REJECTED").unwrap(), LeaveStatus::Rejected);
        assert!(LeaveStatus::from_str("CANCELLED").is_err());
    }

    #[test]
    fn kind_depends_only_on_start_month() {
        let may = NaiveDate::from_ymd_opt(2024, 5, 28).unwrap();
        let june = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(LeaveKind::of(may), LeaveKind::Summer);
        assert_eq!(LeaveKind::of(june), LeaveKind::Regular);
    }
}
