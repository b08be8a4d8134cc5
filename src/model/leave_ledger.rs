use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-employee, per-calendar-month record of leave days taken by type.
/// One row per (employee_id, month, year); counters only ever grow, and
/// only the approval path writes them.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MonthlyLeaveLedger {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 7, minimum = 1, maximum = 12)]
    pub month: u32,
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 2)]
    pub casual_leaves_taken: u32,
    #[schema(example = 0)]
    pub extra_leaves_taken: u32,
    #[schema(example = 0)]
    pub summer_leaves_taken: u32,
}
