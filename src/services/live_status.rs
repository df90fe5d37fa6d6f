use std::collections::HashMap;

use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::errors::AppResult;
use crate::model::{
    attendance::{CoachAttendance, LiveStatus},
    coach::Coach,
};
use crate::repository::AcademyRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveState {
    pub status: LiveStatus,
    pub elapsed_seconds: i64,
}

/// A coach with today's attendance folded in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CoachOverview {
    #[serde(flatten)]
    pub coach: Coach,
    pub status: LiveStatus,
    pub elapsed_seconds: i64,

    #[schema(value_type = Option<String>)]
    pub check_in_time: Option<NaiveTime>,

    #[schema(value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,
}

/// Classifies today's attendance record. `now` is read on every call so an
/// open shift keeps counting up.
pub fn derive_live_state(record: Option<&CoachAttendance>, now: NaiveDateTime) -> LiveState {
    let away = LiveState {
        status: LiveStatus::Away,
        elapsed_seconds: 0,
    };

    let Some(record) = record else {
        return away;
    };
    let Some(check_in) = record.check_in_time else {
        return away;
    };

    match record.check_out_time {
        None => LiveState {
            status: LiveStatus::Working,
            elapsed_seconds: (now - record.date.and_time(check_in)).num_seconds().max(0),
        },
        Some(check_out) => LiveState {
            status: LiveStatus::Done,
            elapsed_seconds: (check_out - check_in).num_seconds().max(0),
        },
    }
}

/// Joins each coach with its attendance row for `now`'s date.
pub fn coach_overviews(
    coaches: Vec<Coach>,
    attendance: &[CoachAttendance],
    now: NaiveDateTime,
) -> Vec<CoachOverview> {
    let today = now.date();
    let by_coach: HashMap<u64, &CoachAttendance> = attendance
        .iter()
        .filter(|a| a.date == today)
        .map(|a| (a.coach_id, a))
        .collect();

    coaches
        .into_iter()
        .map(|coach| {
            let record = by_coach.get(&coach.id).copied();
            let state = derive_live_state(record, now);

            CoachOverview {
                status: state.status,
                elapsed_seconds: state.elapsed_seconds,
                check_in_time: record.and_then(|r| r.check_in_time),
                check_out_time: record.and_then(|r| r.check_out_time),
                coach,
            }
        })
        .collect()
}

/// Today's attendance joined onto the roster. A failed roster read is an
/// error; a failed attendance read degrades to everyone away.
pub async fn todays_overviews<R>(repo: &R, now: NaiveDateTime) -> AppResult<Vec<CoachOverview>>
where
    R: AcademyRepository + ?Sized,
{
    let coaches = repo.list_coaches().await?;
    let today = now.date();

    let attendance = match repo.coach_attendance_between(today, today).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "Today's attendance unavailable, showing everyone away");
            Vec::new()
        }
    };

    Ok(coach_overviews(coaches, &attendance, now))
}
