//! Transactional orchestration around the policy engine.
//!
//! Every balance-mutating operation runs in one MySQL transaction with the
//! employee row locked (`SELECT ... FOR UPDATE`), so concurrent submissions
//! and approvals for the same employee serialize while different employees
//! proceed in parallel. The account is always re-accrued inside the lock
//! before any decision is made.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::LeaveError;
use crate::leave::policy::{self, AccrualOutcome, LeaveAccount};
use crate::model::employee::Employee;
use crate::model::leave_ledger::MonthlyLeaveLedger;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

/// Transactions aborted by InnoDB lock conflicts are retried this many
/// times before the error is surfaced.
const LOCK_RETRY_ATTEMPTS: u32 = 3;

// MySQL error numbers for "lock wait timeout exceeded" and "deadlock found".
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;

fn is_lock_conflict(err: &LeaveError) -> bool {
    if let LeaveError::Database(sqlx::Error::Database(db_err)) = err {
        if let Some(mysql_err) = db_err.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
            return matches!(
                mysql_err.number(),
                ER_LOCK_WAIT_TIMEOUT | ER_LOCK_DEADLOCK
            );
        }
    }
    false
}

async fn lock_employee(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
) -> Result<Employee, LeaveError> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ? FOR UPDATE")
        .bind(employee_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(LeaveError::AccountNotFound(employee_id))
}

async fn lock_request(
    tx: &mut Transaction<'_, MySql>,
    request_id: u64,
) -> Result<LeaveRequest, LeaveError> {
    sqlx::query_as::<_, LeaveRequest>("SELECT * FROM leave_requests WHERE id = ? FOR UPDATE")
        .bind(request_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(LeaveError::RequestNotFound(request_id))
}

async fn store_account(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    account: &LeaveAccount,
) -> Result<(), LeaveError> {
    sqlx::query(
        r#"
        UPDATE employees
        SET casual_leaves_remaining = ?,
            summer_leaves_remaining = ?,
            extra_leaves_taken = ?,
            last_increment_date = ?
        WHERE id = ?
        "#,
    )
    .bind(account.casual_leaves_remaining)
    .bind(account.summer_leaves_remaining)
    .bind(account.extra_leaves_taken)
    .bind(account.last_increment_date)
    .bind(employee_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Run the accrual engine on a locked row and persist the result when it
/// moved. Returns the refreshed account.
async fn accrue_locked(
    tx: &mut Transaction<'_, MySql>,
    employee: &Employee,
    today: NaiveDate,
) -> Result<LeaveAccount, LeaveError> {
    let mut account = LeaveAccount::of(employee);
    let outcome = policy::accrue(&mut account, today);
    match outcome {
        AccrualOutcome::Unchanged => {}
        AccrualOutcome::Rollover => {
            info!(
                employee_id = employee.id,
                %today,
                "Academic-year rollover applied"
            );
            store_account(tx, employee.id, &account).await?;
        }
        AccrualOutcome::MonthlyGrant(months) => {
            info!(
                employee_id = employee.id,
                months,
                casual_leaves_remaining = account.casual_leaves_remaining,
                "Monthly casual leave granted"
            );
            store_account(tx, employee.id, &account).await?;
        }
    }
    Ok(account)
}

async fn overlapping_request_exists(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    exclude_id: Option<u64>,
) -> Result<bool, LeaveError> {
    // Inclusive-intersection test over non-terminal requests, the SQL twin
    // of policy::ranges_overlap.
    let exists = match exclude_id {
        Some(id) => {
            sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM leave_requests
                    WHERE employee_id = ?
                    AND status IN ('PENDING', 'APPROVED')
                    AND start_date <= ?
                    AND end_date >= ?
                    AND id <> ?
                )
                "#,
            )
            .bind(employee_id)
            .bind(end_date)
            .bind(start_date)
            .bind(id)
            .fetch_one(&mut **tx)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM leave_requests
                    WHERE employee_id = ?
                    AND status IN ('PENDING', 'APPROVED')
                    AND start_date <= ?
                    AND end_date >= ?
                )
                "#,
            )
            .bind(employee_id)
            .bind(end_date)
            .bind(start_date)
            .fetch_one(&mut **tx)
            .await?
        }
    };
    Ok(exists)
}

/// Bring an employee's balance current as of `today` and return the row.
pub async fn accrue_employee(
    pool: &MySqlPool,
    employee_id: u64,
    today: NaiveDate,
) -> Result<Employee, LeaveError> {
    let mut tx = pool.begin().await?;
    let employee = lock_employee(&mut tx, employee_id).await?;
    accrue_locked(&mut tx, &employee, today).await?;
    let refreshed = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(refreshed)
}

/// Outcome of a successful submission.
#[derive(Debug)]
pub struct SubmittedRequest {
    pub request: LeaveRequest,
    /// Set when a regular request exceeds the casual balance. Not stored;
    /// the overflow is recomputed from live balances at approval time.
    pub draws_extra: bool,
}

/// Validate and store a leave request as PENDING.
///
/// The account is accrued first, under the employee row lock, and that
/// accrual is committed even when the request itself is turned away.
pub async fn submit_request(
    pool: &MySqlPool,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: &str,
    today: NaiveDate,
) -> Result<SubmittedRequest, LeaveError> {
    let mut attempt = 0;
    loop {
        match submit_request_tx(pool, employee_id, start_date, end_date, reason, today).await {
            Err(e) if is_lock_conflict(&e) && attempt + 1 < LOCK_RETRY_ATTEMPTS => {
                attempt += 1;
                warn!(employee_id, attempt, "Lock conflict on submission, retrying");
            }
            other => return other,
        }
    }
}

async fn submit_request_tx(
    pool: &MySqlPool,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: &str,
    today: NaiveDate,
) -> Result<SubmittedRequest, LeaveError> {
    let mut tx = pool.begin().await?;

    let employee = lock_employee(&mut tx, employee_id).await?;
    let account = accrue_locked(&mut tx, &employee, today).await?;

    // Checks run in order and short-circuit: dates, overlap, then the
    // per-kind balance rule. A refused request still keeps the refreshed
    // balance, so each rejection path commits before returning.
    if let Err(e) = policy::validate_dates(start_date, end_date, today) {
        tx.commit().await?;
        return Err(e);
    }

    if overlapping_request_exists(&mut tx, employee_id, start_date, end_date, None).await? {
        tx.commit().await?;
        return Err(LeaveError::OverlappingRequest);
    }

    let validated = match policy::classify_request(&account, start_date, end_date) {
        Ok(v) => v,
        Err(e) => {
            tx.commit().await?;
            return Err(e);
        }
    };

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, start_date, end_date, number_of_days, reason, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(start_date)
    .bind(end_date)
    .bind(validated.number_of_days)
    .bind(reason)
    .bind(LeaveStatus::Pending.to_string())
    .execute(&mut *tx)
    .await?;

    let request_id = result.last_insert_id();
    let request = sqlx::query_as::<_, LeaveRequest>("SELECT * FROM leave_requests WHERE id = ?")
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        employee_id,
        request_id,
        number_of_days = validated.number_of_days,
        kind = ?validated.kind,
        draws_extra = validated.draws_extra,
        "Leave request submitted"
    );

    Ok(SubmittedRequest {
        request,
        draws_extra: validated.draws_extra,
    })
}

/// Approve a pending request: re-accrue, settle the days against the
/// account, and fold them into the monthly ledger, all atomically.
pub async fn approve_request(
    pool: &MySqlPool,
    request_id: u64,
    today: NaiveDate,
) -> Result<(Employee, MonthlyLeaveLedger), LeaveError> {
    let mut attempt = 0;
    loop {
        match approve_request_tx(pool, request_id, today).await {
            Err(e) if is_lock_conflict(&e) && attempt + 1 < LOCK_RETRY_ATTEMPTS => {
                attempt += 1;
                warn!(request_id, attempt, "Lock conflict on approval, retrying");
            }
            other => return other,
        }
    }
}

async fn approve_request_tx(
    pool: &MySqlPool,
    request_id: u64,
    today: NaiveDate,
) -> Result<(Employee, MonthlyLeaveLedger), LeaveError> {
    let mut tx = pool.begin().await?;

    // Request first, then employee: every writer takes the employee lock
    // second, so two approvals for one employee cannot deadlock.
    let request = lock_request(&mut tx, request_id).await?;
    if request.status != LeaveStatus::Pending.to_string() {
        return Err(LeaveError::NotPending);
    }

    let employee = lock_employee(&mut tx, request.employee_id).await?;
    let mut account = accrue_locked(&mut tx, &employee, today).await?;

    // The submission check ran under the same employee lock, but histories
    // written by other tools may disagree; re-verify before settling.
    if overlapping_request_exists(
        &mut tx,
        request.employee_id,
        request.start_date,
        request.end_date,
        Some(request.id),
    )
    .await?
    {
        return Err(LeaveError::OverlappingRequest);
    }

    let kind = request.kind();
    let delta = policy::settle(&mut account, kind, request.number_of_days);

    let month = request.start_date.month();
    let year = request.start_date.year();

    sqlx::query(
        r#"
        INSERT INTO leave_ledger
            (employee_id, month, year, casual_leaves_taken, extra_leaves_taken, summer_leaves_taken)
        VALUES (?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            casual_leaves_taken = casual_leaves_taken + VALUES(casual_leaves_taken),
            extra_leaves_taken = extra_leaves_taken + VALUES(extra_leaves_taken),
            summer_leaves_taken = summer_leaves_taken + VALUES(summer_leaves_taken)
        "#,
    )
    .bind(request.employee_id)
    .bind(month)
    .bind(year)
    .bind(delta.casual)
    .bind(delta.extra)
    .bind(delta.summer)
    .execute(&mut *tx)
    .await?;

    store_account(&mut tx, request.employee_id, &account).await?;

    sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
        .bind(LeaveStatus::Approved.to_string())
        .bind(request.id)
        .execute(&mut *tx)
        .await?;

    let updated_employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(request.employee_id)
        .fetch_one(&mut *tx)
        .await?;

    let ledger = sqlx::query_as::<_, MonthlyLeaveLedger>(
        "SELECT * FROM leave_ledger WHERE employee_id = ? AND month = ? AND year = ?",
    )
    .bind(request.employee_id)
    .bind(month)
    .bind(year)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        request_id,
        employee_id = request.employee_id,
        casual = delta.casual,
        extra = delta.extra,
        summer = delta.summer,
        "Leave request approved"
    );

    Ok((updated_employee, ledger))
}

/// Reject a pending request. A pure status flip; balances and ledger rows
/// are untouched no matter the leave type.
pub async fn reject_request(pool: &MySqlPool, request_id: u64) -> Result<(), LeaveError> {
    let mut tx = pool.begin().await?;

    let request = lock_request(&mut tx, request_id).await?;
    if request.status != LeaveStatus::Pending.to_string() {
        return Err(LeaveError::NotPending);
    }

    sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
        .bind(LeaveStatus::Rejected.to_string())
        .bind(request.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(request_id, employee_id = request.employee_id, "Leave request rejected");
    Ok(())
}

/// Current stored balance. A plain read; callers wanting the balance as of
/// a given date go through [`accrue_employee`] first.
pub async fn balance(pool: &MySqlPool, employee_id: u64) -> Result<Employee, LeaveError> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await?
        .ok_or(LeaveError::AccountNotFound(employee_id))
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One calendar month of the yearly ledger report.
#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerMonth {
    #[schema(example = 7, minimum = 1, maximum = 12)]
    pub month: u32,
    #[schema(example = "July", value_type = String)]
    pub month_name: &'static str,
    #[schema(example = 2)]
    pub casual_leaves_taken: u32,
    #[schema(example = 0)]
    pub extra_leaves_taken: u32,
    #[schema(example = 0)]
    pub summer_leaves_taken: u32,
    #[schema(example = 2)]
    pub total_days: u32,
}

/// The twelve months of a calendar year, zero-filled where no leave was
/// approved.
pub async fn monthly_ledger(
    pool: &MySqlPool,
    employee_id: u64,
    year: i32,
) -> Result<Vec<LedgerMonth>, LeaveError> {
    // Surface a 404 rather than an empty report for unknown employees.
    balance(pool, employee_id).await?;

    let rows = sqlx::query_as::<_, MonthlyLeaveLedger>(
        "SELECT * FROM leave_ledger WHERE employee_id = ? AND year = ?",
    )
    .bind(employee_id)
    .bind(year)
    .fetch_all(pool)
    .await?;

    Ok(zero_filled_year(&rows))
}

fn zero_filled_year(rows: &[MonthlyLeaveLedger]) -> Vec<LedgerMonth> {
    (1..=12u32)
        .map(|month| {
            let row = rows.iter().find(|r| r.month == month);
            let casual = row.map_or(0, |r| r.casual_leaves_taken);
            let extra = row.map_or(0, |r| r.extra_leaves_taken);
            let summer = row.map_or(0, |r| r.summer_leaves_taken);
            LedgerMonth {
                month,
                month_name: MONTH_NAMES[(month - 1) as usize],
                casual_leaves_taken: casual,
                extra_leaves_taken: extra,
                summer_leaves_taken: summer,
                total_days: casual + extra + summer,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_row(month: u32, casual: u32, extra: u32, summer: u32) -> MonthlyLeaveLedger {
        MonthlyLeaveLedger {
            id: month as u64,
            employee_id: 1,
            month,
            year: 2024,
            casual_leaves_taken: casual,
            extra_leaves_taken: extra,
            summer_leaves_taken: summer,
        }
    }

    #[test]
    fn report_always_has_twelve_months() {
        let report = zero_filled_year(&[]);
        assert_eq!(report.len(), 12);
        assert!(report.iter().all(|m| m.total_days == 0));
        assert_eq!(report[0].month_name, "January");
        assert_eq!(report[11].month_name, "December");
    }

    #[test]
    fn report_merges_rows_into_their_months() {
        let rows = vec![ledger_row(5, 0, 0, 3), ledger_row(7, 2, 1, 0)];
        let report = zero_filled_year(&rows);

        assert_eq!(report[4].summer_leaves_taken, 3);
        assert_eq!(report[4].total_days, 3);
        assert_eq!(report[6].casual_leaves_taken, 2);
        assert_eq!(report[6].extra_leaves_taken, 1);
        assert_eq!(report[6].total_days, 3);
        assert_eq!(report[0].total_days, 0);
    }
}
