use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Completed,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse()
    }
}

/// One row of `coach_attendance`; `(coach_id, date)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CoachAttendance {
    pub id: u64,
    pub coach_id: u64,

    #[schema(value_type = String, format = "date", example = "2026-02-14")]
    pub date: NaiveDate,

    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub check_in_time: Option<NaiveTime>,

    /// `None` while the shift is still open.
    #[schema(value_type = Option<String>, example = "12:30:00")]
    pub check_out_time: Option<NaiveTime>,

    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
}

/// Where a coach is right now, derived from today's attendance row.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LiveStatus {
    Away,
    Working,
    Done,
}
