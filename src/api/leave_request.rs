use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::error::LeaveError;
use crate::leave::service;
use crate::model::leave_request::LeaveRequest;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2024-07-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-07-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "family function")]
    pub reason: String,
    /// Decision date for accrual and validation; defaults to today (UTC).
    #[schema(example = "2024-07-01", format = "date", value_type = String)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AsOfQuery {
    /// Decision date for accrual and settlement; defaults to today (UTC).
    #[param(example = "2024-07-01", value_type = String)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[param(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[param(example = "PENDING")]
    /// Filter by leave status
    pub status: Option<String>,
    #[param(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[param(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Submit leave request
========================= */
/// Submit a leave request for an employee
///
/// The employee's balance is accrued up to the decision date first, then
/// the request is validated: dates must be a future-dated, well-ordered
/// range with no overlap against pending/approved requests. May requests
/// hard-cap at the summer balance; other months accept overdraw and flag
/// it as extra leave.
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "id": 1,
            "status": "PENDING",
            "number_of_days": 3,
            "draws_extra": false
         })
        ),
        (status = 400, description = "Invalid date range or insufficient summer leave"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Overlapping request exists")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, LeaveError> {
    let today = payload.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let submitted = service::submit_request(
        pool.get_ref(),
        payload.employee_id,
        payload.start_date,
        payload.end_date,
        &payload.reason,
        today,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "id": submitted.request.id,
        "status": submitted.request.status,
        "number_of_days": submitted.request.number_of_days,
        "draws_extra": submitted.draws_extra
    })))
}

/* =========================
Approve leave (admin)
========================= */
/// Approve a pending leave request
///
/// Re-accrues the balance, deducts the days (casual first, overflow to
/// extra; May requests against the summer balance, floored at zero) and
/// folds them into the monthly ledger.
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve"),
        AsOfQuery
    ),
    responses(
        (status = 200, description = "Leave approved with updated balance and ledger row"),
        (status = 400, description = "Leave request is not pending", body = Object, example = json!({
            "message": "leave request is not pending"
        })),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<AsOfQuery>,
) -> Result<HttpResponse, LeaveError> {
    let leave_id = path.into_inner();
    let today = query.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let (employee, ledger) = service::approve_request(pool.get_ref(), leave_id, today).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved",
        "balance": {
            "casual_leaves_remaining": employee.casual_leaves_remaining,
            "summer_leaves_remaining": employee.summer_leaves_remaining,
            "extra_leaves_taken": employee.extra_leaves_taken
        },
        "ledger": ledger
    })))
}

/* =========================
Reject leave (admin)
========================= */
/// Reject a pending leave request
///
/// A pure status change; balances and the ledger are untouched.
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request is not pending"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let leave_id = path.into_inner();

    service::reject_request(pool.get_ref(), leave_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/// Get a leave application's details
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>("SELECT * FROM leave_requests WHERE id = ?")
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match leave {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave request not found"
        }))),
    }
}

/// List leave applications
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse)
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT *
        FROM leave_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
