use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::ledger::{BalanceResponse, LedgerReportResponse, YearlyTotals};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::leave::service::LedgerMonth;
use crate::model::employee::{Department, Employee};
use crate::model::leave_ledger::MonthlyLeaveLedger;
use crate::model::leave_request::{LeaveKind, LeaveRequest, LeaveStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management System API",
        version = "1.0.0",
        description = r#"
## Leave Management System

This API tracks employee leave entitlement and consumption across an
academic-year cycle (June 1 – May 31), with an admin approval workflow.

### 🔹 Key Features
- **Employee Management**
  - Register, update, list, and view employee profiles with their leave accounts
- **Leave Accrual**
  - One casual day per elapsed month, annual reset with a fresh summer allotment,
    no accrual during the May vacation month
- **Leave Requests**
  - Submit, approve, and reject requests; summer requests cap at the remaining
    allotment while regular requests may overdraw into extra leave
- **Monthly Ledger**
  - Per-month record of casual/extra/summer days taken, written only on approval

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
- Every accrual/adjudication endpoint accepts an explicit `as_of` date for
  deterministic decisions

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::ledger::get_balance,
        crate::api::ledger::accrue,
        crate::api::ledger::monthly_ledger
    ),
    components(
        schemas(
            LeaveFilter,
            CreateLeave,
            LeaveRequest,
            LeaveStatus,
            LeaveKind,
            LeaveListResponse,
            CreateEmployee,
            EmployeeQuery,
            Employee,
            Department,
            EmployeeListResponse,
            BalanceResponse,
            MonthlyLeaveLedger,
            LedgerMonth,
            LedgerReportResponse,
            YearlyTotals
        )
    ),
    tags(
        (name = "Leave", description = "Leave request submission and approval APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Ledger", description = "Balance, accrual, and monthly report APIs"),
    )
)]
pub struct ApiDoc;
