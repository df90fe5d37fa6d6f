use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::config::PayrollSettings;
use crate::errors::AppResult;
use crate::model::{
    attendance::CoachAttendance,
    coach::Coach,
    payroll::{MonthlyPayroll, PayrollRow},
    pt_session::PtSession,
};
use crate::repository::AcademyRepository;
use crate::services::month::MonthRange;

/// Seconds of a closed shift. Open shifts and inverted times count as zero.
pub fn worked_seconds(record: &CoachAttendance) -> i64 {
    match (record.check_in_time, record.check_out_time) {
        (Some(check_in), Some(check_out)) => (check_out - check_in).num_seconds().max(0),
        _ => 0,
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Builds the payroll for `range` from rows that were already fetched.
/// Rows dated outside the range are ignored.
pub fn build_payroll(
    range: MonthRange,
    settings: &PayrollSettings,
    coaches: &[Coach],
    attendance: &[CoachAttendance],
    sessions: &[PtSession],
) -> MonthlyPayroll {
    let mut seconds_by_coach: HashMap<u64, i64> = HashMap::new();
    for record in attendance.iter().filter(|a| range.contains(a.date)) {
        *seconds_by_coach.entry(record.coach_id).or_default() += worked_seconds(record);
    }

    let mut sessions_by_coach: HashMap<u64, Vec<&PtSession>> = HashMap::new();
    for session in sessions.iter().filter(|s| range.contains(s.date)) {
        sessions_by_coach.entry(session.coach_id).or_default().push(session);
    }

    let rows: Vec<PayrollRow> = coaches
        .iter()
        .filter(|c| !settings.is_excluded(c.role))
        .map(|coach| {
            let pt_rate = coach.pt_rate.unwrap_or(0.0);
            let salary = coach.salary.unwrap_or(0.0);
            let coach_sessions = sessions_by_coach
                .get(&coach.id)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let total_pt_sessions: i64 = coach_sessions.iter().map(|s| s.effective_count()).sum();
            let pt_earnings: f64 = coach_sessions
                .iter()
                .map(|s| s.effective_count() as f64 * s.coach_share.unwrap_or(pt_rate))
                .sum();
            let seconds = seconds_by_coach.get(&coach.id).copied().unwrap_or(0);

            PayrollRow {
                coach_id: coach.id,
                full_name: coach.full_name.clone(),
                role: coach.role,
                pt_rate,
                salary,
                total_hours: round_to_tenth(seconds as f64 / 3600.0),
                total_pt_sessions,
                pt_earnings,
                total_earnings: pt_earnings + salary,
            }
        })
        .collect();

    let total_payroll = rows.iter().map(|r| r.total_earnings).sum();

    MonthlyPayroll {
        month: range.key(),
        period_start: range.first,
        period_end: range.last,
        currency: settings.currency.clone(),
        rows,
        total_payroll,
    }
}

/// Reads the roster and the month's rows, then aggregates. Any failed read
/// aborts the whole report.
#[instrument(name = "monthly_payroll", skip(repo, settings), fields(month = %range.key()))]
pub async fn monthly_payroll<R>(
    repo: &R,
    settings: &PayrollSettings,
    range: MonthRange,
) -> AppResult<MonthlyPayroll>
where
    R: AcademyRepository + ?Sized,
{
    let (coaches, attendance, sessions) = futures::try_join!(
        repo.list_coaches(),
        repo.coach_attendance_between(range.first, range.last),
        repo.pt_sessions_between(range.first, range.last),
    )?;

    let payroll = build_payroll(range, settings, &coaches, &attendance, &sessions);
    debug!(
        rows = payroll.rows.len(),
        total = payroll.total_payroll,
        "Payroll computed"
    );

    Ok(payroll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::model::{attendance::AttendanceStatus, coach::StaffRole};
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};

    struct FakeRepo {
        coaches: Vec<Coach>,
        attendance: Vec<CoachAttendance>,
        sessions: Vec<PtSession>,
        fail_sessions: bool,
    }

    impl FakeRepo {
        fn new(coaches: Vec<Coach>) -> Self {
            Self {
                coaches,
                attendance: Vec::new(),
                sessions: Vec::new(),
                fail_sessions: false,
            }
        }
    }

    #[async_trait]
    impl AcademyRepository for FakeRepo {
        async fn list_coaches(&self) -> AppResult<Vec<Coach>> {
            Ok(self.coaches.clone())
        }

        async fn coach_attendance_between(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> AppResult<Vec<CoachAttendance>> {
            Ok(self
                .attendance
                .iter()
                .filter(|a| from <= a.date && a.date <= to)
                .cloned()
                .collect())
        }

        async fn pt_sessions_between(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> AppResult<Vec<PtSession>> {
            if self.fail_sessions {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(self
                .sessions
                .iter()
                .filter(|s| from <= s.date && s.date <= to)
                .cloned()
                .collect())
        }
    }

    fn february() -> MonthRange {
        MonthRange::parse("2026-02").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn coach(id: u64, role: StaffRole, pt_rate: Option<f64>, salary: Option<f64>) -> Coach {
        Coach {
            id,
            profile_id: None,
            email: None,
            full_name: format!("Coach {id}"),
            phone: None,
            role,
            pt_rate,
            salary,
            specialty: None,
            avatar_url: None,
        }
    }

    fn session(coach_id: u64, date: NaiveDate, count: Option<i32>, share: Option<f64>) -> PtSession {
        PtSession {
            id: 0,
            coach_id,
            date,
            sessions_count: count,
            coach_share: share,
            student_name: Some("Guest".to_string()),
            student_id: None,
            subscription_id: None,
        }
    }

    fn shift(coach_id: u64, date: NaiveDate, check_in: NaiveTime, check_out: Option<NaiveTime>) -> CoachAttendance {
        CoachAttendance {
            id: 0,
            coach_id,
            date,
            check_in_time: Some(check_in),
            check_out_time: check_out,
            status: if check_out.is_some() {
                AttendanceStatus::Completed
            } else {
                AttendanceStatus::Present
            },
        }
    }

    #[actix_web::test]
    async fn salary_plus_sessions_at_standard_rate() {
        let mut repo = FakeRepo::new(vec![coach(1, StaffRole::Coach, Some(20.0), Some(500.0))]);
        repo.sessions.push(session(1, day(3), Some(2), None));

        let payroll = monthly_payroll(&repo, &PayrollSettings::default(), february())
            .await
            .unwrap();

        let row = &payroll.rows[0];
        assert_eq!(row.total_pt_sessions, 2);
        assert_eq!(row.pt_earnings, 40.0);
        assert_eq!(row.total_earnings, 540.0);
        assert_eq!(payroll.total_payroll, 540.0);
    }

    #[actix_web::test]
    async fn coach_share_overrides_rate_for_its_row_only() {
        let mut repo = FakeRepo::new(vec![coach(1, StaffRole::Coach, Some(20.0), None)]);
        repo.sessions.push(session(1, day(3), Some(2), Some(25.0)));
        repo.sessions.push(session(1, day(4), Some(1), None));

        let payroll = monthly_payroll(&repo, &PayrollSettings::default(), february())
            .await
            .unwrap();

        assert_eq!(payroll.rows[0].total_pt_sessions, 3);
        assert_eq!(payroll.rows[0].pt_earnings, 70.0);
        assert_eq!(payroll.rows[0].total_earnings, 70.0);
    }

    #[actix_web::test]
    async fn closed_shifts_count_and_open_shifts_do_not() {
        let mut repo = FakeRepo::new(vec![coach(1, StaffRole::Coach, None, None)]);
        repo.attendance.push(shift(1, day(2), time(9, 0), Some(time(12, 30))));
        repo.attendance.push(shift(1, day(3), time(9, 0), None));

        let payroll = monthly_payroll(&repo, &PayrollSettings::default(), february())
            .await
            .unwrap();

        assert_eq!(payroll.rows[0].total_hours, 3.5);
    }

    #[actix_web::test]
    async fn admins_are_left_out_of_rows_and_total() {
        let mut repo = FakeRepo::new(vec![
            coach(1, StaffRole::Admin, Some(50.0), Some(3000.0)),
            coach(2, StaffRole::Reception, None, Some(800.0)),
        ]);
        repo.sessions.push(session(1, day(5), Some(4), None));

        let payroll = monthly_payroll(&repo, &PayrollSettings::default(), february())
            .await
            .unwrap();

        assert_eq!(payroll.rows.len(), 1);
        assert_eq!(payroll.rows[0].coach_id, 2);
        assert_eq!(payroll.total_payroll, 800.0);
    }

    #[actix_web::test]
    async fn failed_read_aborts_the_report() {
        let mut repo = FakeRepo::new(vec![coach(1, StaffRole::Coach, Some(20.0), Some(500.0))]);
        repo.fail_sessions = true;

        let result = monthly_payroll(&repo, &PayrollSettings::default(), february()).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[actix_web::test]
    async fn report_carries_month_bounds_and_currency() {
        let repo = FakeRepo::new(Vec::new());
        let settings = PayrollSettings {
            currency: "EUR".to_string(),
            ..PayrollSettings::default()
        };

        let payroll = monthly_payroll(&repo, &settings, february()).await.unwrap();

        assert_eq!(payroll.month, "2026-02");
        assert_eq!(payroll.period_start, day(1));
        assert_eq!(payroll.period_end, day(28));
        assert_eq!(payroll.currency, "EUR");
        assert!(payroll.rows.is_empty());
        assert_eq!(payroll.total_payroll, 0.0);
    }

    #[test]
    fn missing_count_is_one_session_and_missing_rate_earns_nothing() {
        let coaches = vec![coach(1, StaffRole::Coach, None, None)];
        let sessions = vec![session(1, day(10), None, None)];

        let payroll = build_payroll(february(), &PayrollSettings::default(), &coaches, &[], &sessions);

        assert_eq!(payroll.rows[0].total_pt_sessions, 1);
        assert_eq!(payroll.rows[0].pt_earnings, 0.0);
    }

    #[test]
    fn rows_outside_the_month_are_ignored() {
        let coaches = vec![coach(1, StaffRole::Coach, Some(10.0), None)];
        let march = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let sessions = vec![session(1, march, Some(5), None), session(1, day(28), Some(1), None)];
        let attendance = vec![shift(1, march, time(8, 0), Some(time(16, 0)))];

        let payroll = build_payroll(
            february(),
            &PayrollSettings::default(),
            &coaches,
            &attendance,
            &sessions,
        );

        assert_eq!(payroll.rows[0].total_pt_sessions, 1);
        assert_eq!(payroll.rows[0].pt_earnings, 10.0);
        assert_eq!(payroll.rows[0].total_hours, 0.0);
    }

    #[test]
    fn hours_round_to_one_decimal() {
        let coaches = vec![coach(1, StaffRole::Coach, None, None)];
        let attendance = vec![
            shift(1, day(2), time(9, 0), Some(time(10, 20))),
            shift(1, day(3), time(18, 0), Some(time(17, 0))),
        ];

        let payroll = build_payroll(february(), &PayrollSettings::default(), &coaches, &attendance, &[]);

        assert_eq!(payroll.rows[0].total_hours, 1.3);
    }

    #[test]
    fn excluded_roles_come_from_settings() {
        let coaches = vec![
            coach(1, StaffRole::Admin, None, Some(100.0)),
            coach(2, StaffRole::Cleaner, None, Some(200.0)),
        ];
        let settings = PayrollSettings {
            excluded_roles: vec![StaffRole::Cleaner],
            ..PayrollSettings::default()
        };

        let payroll = build_payroll(february(), &settings, &coaches, &[], &[]);

        assert_eq!(payroll.rows.len(), 1);
        assert_eq!(payroll.rows[0].role, StaffRole::Admin);
        assert_eq!(payroll.total_payroll, 100.0);
    }
}
