/// Attendance-to-payment reconciliation core
///
/// Converts a sequence of raw check-in/check-out events into billable
/// hours and a monetary amount. The pieces:
///
/// - [`work_seconds`]: the time-interval reducer — ordered events in,
///   total elapsed whole seconds out
/// - [`round_hours`] / [`billable_amount`]: the rounding laws
/// - [`summarize_pending`]: groups unbilled events by (helper, job) into
///   transient [`PendingBillingSummary`] rows for dashboards
///
/// Everything here is pure; persistence (payment insertion and event
/// tagging) lives in `models::payment`.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::attendance::{AttendanceAction, UnbilledEventRow};

/// Reduces an ordered event sequence to total elapsed whole seconds
///
/// Maintains a single open-interval marker:
///
/// - `check-in` opens an interval at that timestamp; a check-in while an
///   interval is already open overwrites the marker (last check-in wins,
///   no error);
/// - `check-out` with an open interval closes it, adding the difference
///   in whole seconds (floored) when the checkout is strictly later; a
///   check-out with no open interval is a no-op;
/// - an interval still open after the last event is counted up to `now`,
///   so an in-progress shift can be partially billed.
///
/// Events must be supplied in ascending timestamp order; the caller (the
/// unbilled-attendance selector) is responsible for ordering. Empty input
/// yields zero.
pub fn work_seconds<I>(events: I, now: DateTime<Utc>) -> i64
where
    I: IntoIterator<Item = (AttendanceAction, DateTime<Utc>)>,
{
    let mut total: i64 = 0;
    let mut open: Option<DateTime<Utc>> = None;

    for (action, at) in events {
        match action {
            AttendanceAction::CheckIn => {
                open = Some(at);
            }
            AttendanceAction::CheckOut => {
                if let Some(start) = open.take() {
                    if at > start {
                        total += (at - start).num_seconds();
                    }
                }
            }
        }
    }

    if let Some(start) = open {
        if now > start {
            total += (now - start).num_seconds();
        }
    }

    total
}

/// Converts seconds to hours, rounded to 2 decimal places
///
/// An epsilon is added before rounding to counter binary floating-point
/// representation error (e.g., 6480 s must come out as exactly 1.8 h).
pub fn round_hours(seconds: i64) -> f64 {
    ((seconds as f64 / 3600.0 + f64::EPSILON) * 100.0).round() / 100.0
}

/// Computes the billable amount: hours × rate, rounded half-up to the
/// nearest integer currency unit
pub fn billable_amount(hours: f64, rate: i64) -> i64 {
    (hours * rate as f64).round() as i64
}

/// Transient pending-billing projection for one (helper, job) group
///
/// Never persisted — this is the computed counterpart of a `Payment`,
/// presented in the same `{hours, rate, amount}` shape so dashboards can
/// render pending and paid rows symmetrically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingBillingSummary {
    /// Helper owed for this group
    pub helper_id: Uuid,

    /// Job the work belongs to (None groups legacy job-less events)
    pub job_id: Option<Uuid>,

    /// Helper display name
    pub helper_name: String,

    /// Job title, when a job is attached
    pub job_title: Option<String>,

    /// Job scheduled date, when a job is attached
    pub job_date: Option<String>,

    /// Accumulated unbilled hours (2 decimals)
    pub hours_worked: f64,

    /// Hourly rate from the job (0 when the job has none)
    pub rate: i64,

    /// Amount that a reconciliation run now would bill
    pub amount: i64,

    /// Always "pending"; kept for shape symmetry with persisted payments
    pub status: String,
}

/// Groups unbilled event rows by (helper, job) and reduces each group
///
/// Input rows must be sorted by (helper_id, job_id, created_at), which is
/// how the attendance queries return them; groups are therefore
/// consecutive runs. A null job id forms its own group.
pub fn summarize_pending(rows: &[UnbilledEventRow], now: DateTime<Utc>) -> Vec<PendingBillingSummary> {
    let mut summaries = Vec::new();
    let mut i = 0;

    while i < rows.len() {
        let key = (rows[i].helper_id, rows[i].job_id);
        let start = i;
        while i < rows.len() && (rows[i].helper_id, rows[i].job_id) == key {
            i += 1;
        }
        let group = &rows[start..i];

        let seconds = work_seconds(group.iter().map(|r| (r.action, r.created_at)), now);
        let hours = round_hours(seconds);
        let rate = group[0].pay_per_hour.unwrap_or(0);

        summaries.push(PendingBillingSummary {
            helper_id: key.0,
            job_id: key.1,
            helper_name: group[0].helper_name.clone(),
            job_title: group[0].job_title.clone(),
            job_date: group[0].job_date.clone(),
            hours_worked: hours,
            rate,
            amount: billable_amount(hours, rate),
            status: "pending".to_string(),
        });
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_closed_pair() {
        let events = vec![
            (AttendanceAction::CheckIn, t0()),
            (AttendanceAction::CheckOut, t0() + Duration::seconds(3600)),
        ];
        assert_eq!(work_seconds(events, t0() + Duration::hours(10)), 3600);
    }

    #[test]
    fn test_open_interval_counted_to_now() {
        let events = vec![(AttendanceAction::CheckIn, t0())];
        assert_eq!(work_seconds(events, t0() + Duration::seconds(1800)), 1800);
    }

    #[test]
    fn test_orphan_checkout_ignored() {
        let events = vec![(AttendanceAction::CheckOut, t0())];
        assert_eq!(work_seconds(events, t0() + Duration::hours(1)), 0);
    }

    #[test]
    fn test_last_checkin_wins() {
        let events = vec![
            (AttendanceAction::CheckIn, t0()),
            (AttendanceAction::CheckIn, t0() + Duration::seconds(10)),
            (AttendanceAction::CheckOut, t0() + Duration::seconds(3600)),
        ];
        assert_eq!(work_seconds(events, t0() + Duration::hours(2)), 3590);
    }

    #[test]
    fn test_checkout_before_checkin_adds_nothing() {
        let events = vec![
            (AttendanceAction::CheckIn, t0()),
            (AttendanceAction::CheckOut, t0() - Duration::seconds(5)),
        ];
        // Interval closes without contributing, and nothing stays open.
        assert_eq!(work_seconds(events, t0() + Duration::hours(1)), 0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(work_seconds(Vec::new(), t0()), 0);
    }

    #[test]
    fn test_multiple_shifts_accumulate() {
        let events = vec![
            (AttendanceAction::CheckIn, t0()),
            (AttendanceAction::CheckOut, t0() + Duration::seconds(1000)),
            (AttendanceAction::CheckIn, t0() + Duration::seconds(2000)),
            (AttendanceAction::CheckOut, t0() + Duration::seconds(2500)),
        ];
        assert_eq!(work_seconds(events, t0() + Duration::hours(3)), 1500);
    }

    #[test]
    fn test_round_hours() {
        assert_eq!(round_hours(6480), 1.8);
        assert_eq!(round_hours(3600), 1.0);
        assert_eq!(round_hours(0), 0.0);
        assert_eq!(round_hours(28800), 8.0);
        // 5432 s = 1.50888... h → 1.51
        assert_eq!(round_hours(5432), 1.51);
    }

    #[test]
    fn test_billable_amount() {
        assert_eq!(billable_amount(1.8, 200), 360);
        assert_eq!(billable_amount(8.0, 150), 1200);
        assert_eq!(billable_amount(0.0, 500), 0);
        // Half-up rounding: 1.51 h × 175 = 264.25 → 264
        assert_eq!(billable_amount(1.51, 175), 264);
    }

    fn row(
        helper_id: Uuid,
        job_id: Option<Uuid>,
        action: AttendanceAction,
        at: DateTime<Utc>,
        rate: Option<i64>,
    ) -> UnbilledEventRow {
        UnbilledEventRow {
            helper_id,
            job_id,
            action,
            created_at: at,
            helper_name: "Maria".to_string(),
            job_title: job_id.map(|_| "Housekeeping".to_string()),
            job_date: None,
            pay_per_hour: rate,
        }
    }

    #[test]
    fn test_summarize_pending_groups_by_helper_and_job() {
        let helper = Uuid::new_v4();
        let job = Uuid::new_v4();
        let now = t0() + Duration::hours(12);

        let rows = vec![
            // Job group: a full hour
            row(helper, Some(job), AttendanceAction::CheckIn, t0(), Some(200)),
            row(
                helper,
                Some(job),
                AttendanceAction::CheckOut,
                t0() + Duration::hours(1),
                Some(200),
            ),
            // Legacy null-job group: 30 minutes
            row(helper, None, AttendanceAction::CheckIn, t0(), None),
            row(
                helper,
                None,
                AttendanceAction::CheckOut,
                t0() + Duration::minutes(30),
                None,
            ),
        ];

        let summaries = summarize_pending(&rows, now);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].job_id, Some(job));
        assert_eq!(summaries[0].hours_worked, 1.0);
        assert_eq!(summaries[0].rate, 200);
        assert_eq!(summaries[0].amount, 200);
        assert_eq!(summaries[0].status, "pending");

        // Null-job group bills at rate 0
        assert_eq!(summaries[1].job_id, None);
        assert_eq!(summaries[1].hours_worked, 0.5);
        assert_eq!(summaries[1].rate, 0);
        assert_eq!(summaries[1].amount, 0);
    }

    #[test]
    fn test_summarize_pending_empty() {
        assert!(summarize_pending(&[], t0()).is_empty());
    }
}
