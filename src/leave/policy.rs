//! Leave accrual and consumption rules.
//!
//! Everything in this module is pure: the caller supplies the account
//! snapshot and the current date, and gets back the mutated snapshot plus
//! a description of what happened. Persistence and locking live in
//! [`crate::leave::service`].

use chrono::{Datelike, NaiveDate};

use crate::error::LeaveError;
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveKind, SUMMER_MONTH};

/// Casual days granted for June when a new academic year opens.
pub const ROLLOVER_CASUAL_GRANT: u32 = 1;
/// Summer days granted once per academic year, usable only in May.
pub const ANNUAL_SUMMER_ALLOTMENT: u32 = 5;

/// The mutable slice of an employee row the policy engine operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveAccount {
    pub casual_leaves_remaining: u32,
    pub summer_leaves_remaining: u32,
    pub extra_leaves_taken: u32,
    /// Always the first day of a month; never moves backwards.
    pub last_increment_date: NaiveDate,
    pub date_joined: NaiveDate,
}

impl LeaveAccount {
    pub fn of(employee: &Employee) -> Self {
        Self {
            casual_leaves_remaining: employee.casual_leaves_remaining,
            summer_leaves_remaining: employee.summer_leaves_remaining,
            extra_leaves_taken: employee.extra_leaves_taken,
            last_increment_date: employee.last_increment_date,
            date_joined: employee.date_joined,
        }
    }

    /// Account state for a freshly registered employee: one casual day for
    /// the current month, the full summer allotment, counters at zero.
    pub fn opening(date_joined: NaiveDate) -> Self {
        Self {
            casual_leaves_remaining: ROLLOVER_CASUAL_GRANT,
            summer_leaves_remaining: ANNUAL_SUMMER_ALLOTMENT,
            extra_leaves_taken: 0,
            last_increment_date: first_of_month(date_joined),
            date_joined,
        }
    }
}

/// What a single accrual run did to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// Nothing to do: same month, or May of the same academic year.
    Unchanged,
    /// A new academic year opened; balances were reset.
    Rollover,
    /// Casual days granted for the months elapsed since the last increment.
    MonthlyGrant(u32),
}

/// Academic years run June 1 to May 31 and are labelled by the June's
/// calendar year.
pub fn academic_year(today: NaiveDate) -> i32 {
    if today.month() < 6 {
        today.year() - 1
    } else {
        today.year()
    }
}

/// Bring the account current as of `today`.
///
/// Idempotent within a calendar month: once the rollover has stamped
/// `last_increment_date` into the current academic year and the monthly
/// grant has stamped the current month, a second call with the same date
/// returns [`AccrualOutcome::Unchanged`].
pub fn accrue(account: &mut LeaveAccount, today: NaiveDate) -> AccrualOutcome {
    let current_academic_year = academic_year(today);

    // Compared as academic years, so a January-to-May increment date (which
    // belongs to the previous academic year) still rolls over in June.
    if academic_year(account.last_increment_date) < current_academic_year {
        account.casual_leaves_remaining = ROLLOVER_CASUAL_GRANT;
        account.extra_leaves_taken = 0;
        account.summer_leaves_remaining = ANNUAL_SUMMER_ALLOTMENT;
        account.last_increment_date = june_first(current_academic_year);
        return AccrualOutcome::Rollover;
    }

    // Casual leaves do not accrue during the summer-vacation month.
    if today.month() == SUMMER_MONTH {
        return AccrualOutcome::Unchanged;
    }

    let mut months_diff = months_between(account.last_increment_date, today);
    if months_diff <= 0 {
        return AccrualOutcome::Unchanged;
    }

    // An employee hired mid-year only accrues from their join month, not
    // from the June the academic year opened.
    if account.date_joined > june_first(current_academic_year) {
        let months_since_joining = months_between(first_of_month(account.date_joined), today);
        months_diff = months_diff.min(months_since_joining);
        if months_diff <= 0 {
            return AccrualOutcome::Unchanged;
        }
    }

    let granted = months_diff as u32;
    account.casual_leaves_remaining += granted;
    account.last_increment_date = first_of_month(today);
    AccrualOutcome::MonthlyGrant(granted)
}

/// A submission that passed validation, ready to be stored as PENDING.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub kind: LeaveKind,
    pub number_of_days: u32,
    /// Regular leave asking for more days than the casual balance covers.
    /// The request is still accepted; the overflow settles as extra leave
    /// at approval time.
    pub draws_extra: bool,
}

/// Date sanity for a submission: a well-ordered range starting strictly
/// after `today`. Runs before the overlap check and the balance rule.
pub fn validate_dates(
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> Result<(), LeaveError> {
    if end_date < start_date {
        return Err(LeaveError::InvalidDateRange(LeaveError::END_BEFORE_START));
    }
    if start_date <= today {
        return Err(LeaveError::InvalidDateRange(LeaveError::START_NOT_IN_FUTURE));
    }
    Ok(())
}

/// Classify a date-validated submission against a freshly accrued account.
///
/// Summer leave hard-caps at the remaining allotment; regular leave never
/// rejects on overdraw, it only flags.
pub fn classify_request(
    account: &LeaveAccount,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<ValidatedRequest, LeaveError> {
    let number_of_days = ((end_date - start_date).num_days() + 1) as u32;
    let kind = LeaveKind::of(start_date);

    match kind {
        LeaveKind::Summer => {
            if number_of_days > account.summer_leaves_remaining {
                return Err(LeaveError::InsufficientSummerLeave {
                    remaining: account.summer_leaves_remaining,
                });
            }
            Ok(ValidatedRequest {
                kind,
                number_of_days,
                draws_extra: false,
            })
        }
        LeaveKind::Regular => Ok(ValidatedRequest {
            kind,
            number_of_days,
            draws_extra: number_of_days > account.casual_leaves_remaining,
        }),
    }
}

/// Inclusive-range intersection; both endpoints count as leave days.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Days to add to a monthly ledger row, split by type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LedgerDelta {
    pub casual: u32,
    pub extra: u32,
    pub summer: u32,
}

/// Deduct an approved request from the account and split the days for the
/// ledger.
///
/// Summer days floor at zero; there is no deficit carry. Regular days drain
/// the casual balance first and the remainder accumulates as extra leave,
/// both on the ledger and on the account's cumulative counter.
pub fn settle(account: &mut LeaveAccount, kind: LeaveKind, number_of_days: u32) -> LedgerDelta {
    match kind {
        LeaveKind::Summer => {
            account.summer_leaves_remaining =
                account.summer_leaves_remaining.saturating_sub(number_of_days);
            LedgerDelta {
                summer: number_of_days,
                ..LedgerDelta::default()
            }
        }
        LeaveKind::Regular => {
            let casual = account.casual_leaves_remaining.min(number_of_days);
            let extra = number_of_days - casual;
            account.casual_leaves_remaining -= casual;
            account.extra_leaves_taken += extra;
            LedgerDelta {
                casual,
                extra,
                ..LedgerDelta::default()
            }
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("day 1 exists in every month")
}

fn june_first(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 6, 1).expect("June 1 is a valid date")
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn account(casual: u32, summer: u32, extra: u32, last: NaiveDate) -> LeaveAccount {
        LeaveAccount {
            casual_leaves_remaining: casual,
            summer_leaves_remaining: summer,
            extra_leaves_taken: extra,
            last_increment_date: last,
            // Joined well before any academic year used in these tests.
            date_joined: date(2020, 1, 15),
        }
    }

    #[test]
    fn academic_year_splits_at_june() {
        assert_eq!(academic_year(date(2023, 5, 31)), 2022);
        assert_eq!(academic_year(date(2023, 6, 1)), 2023);
        assert_eq!(academic_year(date(2024, 1, 10)), 2023);
        assert_eq!(academic_year(date(2024, 12, 31)), 2024);
    }

    #[test]
    fn rollover_resets_the_account() {
        let mut acc = account(4, 1, 7, date(2023, 4, 1));
        let outcome = accrue(&mut acc, date(2023, 6, 15));

        assert_eq!(outcome, AccrualOutcome::Rollover);
        assert_eq!(acc.casual_leaves_remaining, 1);
        assert_eq!(acc.summer_leaves_remaining, 5);
        assert_eq!(acc.extra_leaves_taken, 0);
        assert_eq!(acc.last_increment_date, date(2023, 6, 1));
    }

    #[test]
    fn rollover_does_not_refire_on_second_call() {
        let mut acc = account(4, 1, 7, date(2023, 4, 1));
        accrue(&mut acc, date(2023, 6, 15));
        let again = acc.clone();
        let outcome = accrue(&mut acc, date(2023, 6, 15));

        assert_eq!(outcome, AccrualOutcome::Unchanged);
        assert_eq!(acc, again);
    }

    #[test]
    fn monthly_grant_adds_one_day_per_elapsed_month() {
        let mut acc = account(1, 5, 0, date(2023, 6, 1));
        let outcome = accrue(&mut acc, date(2023, 8, 10));

        assert_eq!(outcome, AccrualOutcome::MonthlyGrant(2));
        assert_eq!(acc.casual_leaves_remaining, 3);
        assert_eq!(acc.last_increment_date, date(2023, 8, 1));
    }

    #[test]
    fn accrual_is_idempotent_within_a_month() {
        let mut acc = account(1, 5, 0, date(2023, 6, 1));
        accrue(&mut acc, date(2023, 8, 10));
        let settled = acc.clone();

        assert_eq!(accrue(&mut acc, date(2023, 8, 10)), AccrualOutcome::Unchanged);
        assert_eq!(accrue(&mut acc, date(2023, 8, 28)), AccrualOutcome::Unchanged);
        assert_eq!(acc, settled);
    }

    #[test]
    fn no_accrual_in_may() {
        let mut acc = account(9, 5, 0, date(2024, 2, 1));
        let outcome = accrue(&mut acc, date(2024, 5, 15));

        assert_eq!(outcome, AccrualOutcome::Unchanged);
        assert_eq!(acc.casual_leaves_remaining, 9);
        assert_eq!(acc.last_increment_date, date(2024, 2, 1));
    }

    #[test]
    fn rollover_still_fires_in_may_of_a_new_academic_year() {
        // Last increment in academic year 2022, accrual in May 2024
        // (academic year 2023): the rollover branch wins over the May rule.
        let mut acc = account(9, 0, 3, date(2023, 3, 1));
        let outcome = accrue(&mut acc, date(2024, 5, 10));

        assert_eq!(outcome, AccrualOutcome::Rollover);
        assert_eq!(acc.last_increment_date, date(2023, 6, 1));
        assert_eq!(acc.summer_leaves_remaining, 5);
    }

    #[test]
    fn mid_year_hire_only_accrues_from_join_month() {
        let mut acc = LeaveAccount {
            casual_leaves_remaining: 1,
            summer_leaves_remaining: 5,
            extra_leaves_taken: 0,
            last_increment_date: date(2023, 6, 1),
            date_joined: date(2023, 9, 20),
        };
        // June..October is 4 month-steps, but the employee joined in
        // September: capped at 1 (September -> October).
        let outcome = accrue(&mut acc, date(2023, 10, 5));

        assert_eq!(outcome, AccrualOutcome::MonthlyGrant(1));
        assert_eq!(acc.casual_leaves_remaining, 2);
        assert_eq!(acc.last_increment_date, date(2023, 10, 1));
    }

    #[test]
    fn hire_in_current_month_accrues_nothing_extra() {
        let mut acc = LeaveAccount {
            casual_leaves_remaining: 1,
            summer_leaves_remaining: 5,
            extra_leaves_taken: 0,
            last_increment_date: date(2023, 6, 1),
            date_joined: date(2023, 10, 2),
        };
        assert_eq!(accrue(&mut acc, date(2023, 10, 20)), AccrualOutcome::Unchanged);
        assert_eq!(acc.casual_leaves_remaining, 1);
    }

    #[test]
    fn opening_account_starts_with_one_casual_day() {
        let acc = LeaveAccount::opening(date(2023, 8, 15));
        assert_eq!(acc.casual_leaves_remaining, 1);
        assert_eq!(acc.summer_leaves_remaining, 5);
        assert_eq!(acc.extra_leaves_taken, 0);
        assert_eq!(acc.last_increment_date, date(2023, 8, 1));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err =
            validate_dates(date(2024, 7, 10), date(2024, 7, 8), date(2024, 6, 20)).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::InvalidDateRange(LeaveError::END_BEFORE_START)
        ));
    }

    #[test]
    fn start_today_or_earlier_is_rejected() {
        let today = date(2024, 6, 20);

        for start in [today, date(2024, 6, 19)] {
            let err = validate_dates(start, start, today).unwrap_err();
            assert!(matches!(
                err,
                LeaveError::InvalidDateRange(LeaveError::START_NOT_IN_FUTURE)
            ));
        }
    }

    #[test]
    fn future_well_ordered_range_passes() {
        assert!(validate_dates(date(2024, 6, 21), date(2024, 6, 21), date(2024, 6, 20)).is_ok());
    }

    #[test]
    fn summer_overdraw_is_rejected_with_remaining_count() {
        let acc = account(5, 2, 0, date(2024, 2, 1));
        let err = classify_request(&acc, date(2025, 5, 5), date(2025, 5, 7)).unwrap_err();
        assert!(matches!(err, LeaveError::InsufficientSummerLeave { remaining: 2 }));
    }

    #[test]
    fn summer_within_allotment_is_accepted() {
        let acc = account(0, 5, 0, date(2024, 2, 1));
        let validated = classify_request(&acc, date(2025, 5, 5), date(2025, 5, 9)).unwrap();
        assert_eq!(validated.kind, LeaveKind::Summer);
        assert_eq!(validated.number_of_days, 5);
        assert!(!validated.draws_extra);
    }

    #[test]
    fn regular_overdraw_is_accepted_with_flag() {
        let acc = account(1, 5, 0, date(2024, 6, 1));
        let validated = classify_request(&acc, date(2024, 6, 10), date(2024, 6, 12)).unwrap();
        assert_eq!(validated.kind, LeaveKind::Regular);
        assert_eq!(validated.number_of_days, 3);
        assert!(validated.draws_extra);
    }

    #[test]
    fn regular_within_balance_carries_no_flag() {
        let acc = account(4, 5, 0, date(2024, 6, 1));
        let validated = classify_request(&acc, date(2024, 6, 10), date(2024, 6, 12)).unwrap();
        assert!(!validated.draws_extra);
    }

    #[test]
    fn inclusive_ranges_overlap_on_shared_endpoint() {
        let overlap = ranges_overlap(
            date(2024, 7, 10),
            date(2024, 7, 12),
            date(2024, 7, 12),
            date(2024, 7, 14),
        );
        assert!(overlap);

        let disjoint = ranges_overlap(
            date(2024, 7, 10),
            date(2024, 7, 12),
            date(2024, 7, 13),
            date(2024, 7, 14),
        );
        assert!(!disjoint);
    }

    #[test]
    fn summer_settlement_floors_at_zero() {
        let mut acc = account(3, 2, 0, date(2024, 2, 1));
        let delta = settle(&mut acc, LeaveKind::Summer, 4);

        assert_eq!(delta, LedgerDelta { casual: 0, extra: 0, summer: 4 });
        assert_eq!(acc.summer_leaves_remaining, 0);
        assert_eq!(acc.casual_leaves_remaining, 3);
    }

    #[test]
    fn regular_settlement_uses_casual_first() {
        let mut acc = account(5, 5, 0, date(2024, 6, 1));
        let delta = settle(&mut acc, LeaveKind::Regular, 3);

        assert_eq!(delta, LedgerDelta { casual: 3, extra: 0, summer: 0 });
        assert_eq!(acc.casual_leaves_remaining, 2);
        assert_eq!(acc.extra_leaves_taken, 0);
    }

    #[test]
    fn regular_settlement_splits_overflow_into_extra() {
        let mut acc = account(1, 5, 0, date(2024, 6, 1));
        let delta = settle(&mut acc, LeaveKind::Regular, 3);

        assert_eq!(delta, LedgerDelta { casual: 1, extra: 2, summer: 0 });
        assert_eq!(acc.casual_leaves_remaining, 0);
        assert_eq!(acc.extra_leaves_taken, 2);
    }

    #[test]
    fn regular_settlement_with_no_casual_is_all_extra() {
        let mut acc = account(0, 5, 4, date(2024, 6, 1));
        let delta = settle(&mut acc, LeaveKind::Regular, 2);

        assert_eq!(delta, LedgerDelta { casual: 0, extra: 2, summer: 0 });
        assert_eq!(acc.extra_leaves_taken, 6);
    }

    #[test]
    fn balances_never_observed_negative() {
        // Unsigned fields make underflow a panic, not a negative: exercise
        // the paths that subtract.
        let mut acc = account(0, 0, 0, date(2024, 6, 1));
        settle(&mut acc, LeaveKind::Summer, 10);
        settle(&mut acc, LeaveKind::Regular, 10);
        assert_eq!(acc.casual_leaves_remaining, 0);
        assert_eq!(acc.summer_leaves_remaining, 0);
    }
}
