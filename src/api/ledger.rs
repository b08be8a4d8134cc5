use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::error::LeaveError;
use crate::leave::service;
use crate::model::employee::Employee;

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "UR01")]
    pub employee_code: String,
    #[schema(example = 3)]
    pub casual_leaves_remaining: u32,
    #[schema(example = 5)]
    pub summer_leaves_remaining: u32,
    #[schema(example = 0)]
    pub extra_leaves_taken: u32,
    #[schema(example = "2023-10-01", value_type = String, format = "date")]
    pub last_increment_date: NaiveDate,
}

impl From<Employee> for BalanceResponse {
    fn from(employee: Employee) -> Self {
        Self {
            employee_id: employee.id,
            employee_code: employee.employee_code,
            casual_leaves_remaining: employee.casual_leaves_remaining,
            summer_leaves_remaining: employee.summer_leaves_remaining,
            extra_leaves_taken: employee.extra_leaves_taken,
            last_increment_date: employee.last_increment_date,
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AccrueQuery {
    /// Accrual date; defaults to today (UTC).
    #[param(example = "2024-07-01", value_type = String)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LedgerQuery {
    /// Calendar year to report; defaults to the current year.
    #[param(example = 2024)]
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct YearlyTotals {
    #[schema(example = 6)]
    pub casual_leaves: u32,
    #[schema(example = 1)]
    pub extra_leaves: u32,
    #[schema(example = 3)]
    pub summer_leaves: u32,
    #[schema(example = 10)]
    pub total_days: u32,
}

#[derive(Serialize, ToSchema)]
pub struct LedgerReportResponse {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 2024)]
    pub year: i32,
    pub months: Vec<service::LedgerMonth>,
    pub yearly_totals: YearlyTotals,
}

/// Get the stored leave balance
///
/// Reads the row as-is; run the accrual endpoint first for a figure
/// current as of a given date.
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}/balance",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Current stored balance", body = BalanceResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "Ledger"
)]
pub async fn get_balance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let employee_id = path.into_inner();
    let employee = service::balance(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(employee)))
}

/// Accrue leave up to a date
///
/// Runs the academic-year/monthly accrual rule and persists the result.
/// Safe to call repeatedly; a second run in the same month is a no-op.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{employee_id}/accrue",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        AccrueQuery
    ),
    responses(
        (status = 200, description = "Balance after accrual", body = BalanceResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "Ledger"
)]
pub async fn accrue(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<AccrueQuery>,
) -> Result<HttpResponse, LeaveError> {
    let employee_id = path.into_inner();
    let today = query.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let employee = service::accrue_employee(pool.get_ref(), employee_id, today).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(employee)))
}

/// Monthly leave report for a calendar year
///
/// Twelve rows, zero-filled for months with no approved leave, plus the
/// yearly totals.
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}/ledger",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        LedgerQuery
    ),
    responses(
        (status = 200, description = "Twelve-month ledger report", body = LedgerReportResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "Ledger"
)]
pub async fn monthly_ledger(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<LedgerQuery>,
) -> Result<HttpResponse, LeaveError> {
    let employee_id = path.into_inner();
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let months = service::monthly_ledger(pool.get_ref(), employee_id, year).await?;

    let yearly_totals = YearlyTotals {
        casual_leaves: months.iter().map(|m| m.casual_leaves_taken).sum(),
        extra_leaves: months.iter().map(|m| m.extra_leaves_taken).sum(),
        summer_leaves: months.iter().map(|m| m.summer_leaves_taken).sum(),
        total_days: months.iter().map(|m| m.total_days).sum(),
    };

    Ok(HttpResponse::Ok().json(LedgerReportResponse {
        employee_id,
        year,
        months,
        yearly_totals,
    }))
}
