//! Read port used by the aggregation services.
//!
//! Handlers that only reshape rows talk to the pool directly; everything that
//! derives numbers from several tables goes through this trait so it can be
//! driven by an in-memory fake in tests.

pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::AppResult;
use crate::model::{attendance::CoachAttendance, coach::Coach, pt_session::PtSession};

pub use mysql::MySqlAcademyRepository;

#[async_trait]
pub trait AcademyRepository: Send + Sync {
    /// Every staff row, unfiltered.
    async fn list_coaches(&self) -> AppResult<Vec<Coach>>;

    /// Attendance rows with `from <= date <= to`.
    async fn coach_attendance_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<CoachAttendance>>;

    /// PT session rows with `from <= date <= to`.
    async fn pt_sessions_between(&self, from: NaiveDate, to: NaiveDate)
    -> AppResult<Vec<PtSession>>;
}
