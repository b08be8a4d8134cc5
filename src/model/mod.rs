pub mod employee;
pub mod leave_ledger;
pub mod leave_request;
