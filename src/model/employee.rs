use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Department codes carried on the employee record. The set is closed;
/// anything else is rejected at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Department {
    #[strum(serialize = "CSE")]
    Cse,
    #[strum(serialize = "ECE")]
    Ece,
    #[strum(serialize = "EEE")]
    Eee,
    #[strum(serialize = "MECH")]
    Mech,
    #[strum(serialize = "CIVIL")]
    Civil,
    #[strum(serialize = "AI")]
    Ai,
    #[strum(serialize = "NON_TEACHING")]
    NonTeaching,
    #[strum(serialize = "MATH")]
    Math,
    #[strum(serialize = "ENGLISH")]
    English,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "UR01",
        "first_name": "John",
        "last_name": "Doe",
        "department": "CSE",
        "date_joined": "2023-08-15",
        "casual_leaves_remaining": 3,
        "summer_leaves_remaining": 5,
        "extra_leaves_taken": 0,
        "last_increment_date": "2023-10-01"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// Stored uppercase; matched case-insensitively on lookup.
    #[schema(example = "UR01")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "CSE")]
    pub department: String,

    /// Immutable after creation.
    #[schema(example = "2023-08-15", value_type = String, format = "date")]
    pub date_joined: NaiveDate,

    #[schema(example = 3)]
    pub casual_leaves_remaining: u32,

    #[schema(example = 5)]
    pub summer_leaves_remaining: u32,

    #[schema(example = 0)]
    pub extra_leaves_taken: u32,

    /// Always the first day of a month; advanced only by the accrual engine.
    #[schema(example = "2023-10-01", value_type = String, format = "date")]
    pub last_increment_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn department_codes_round_trip() {
        assert_eq!(Department::from_str("CSE").unwrap(), Department::Cse);
        assert_eq!(
            Department::from_str("NON_TEACHING").unwrap(),
            Department::NonTeaching
        );
        assert_eq!(Department::Mech.to_string(), "MECH");
    }

    #[test]
    fn unknown_department_code_is_rejected() {
        assert!(Department::from_str("PHYSICS").is_err());
        assert!(Department::from_str("cse").is_err());
    }
}
