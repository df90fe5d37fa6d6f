use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::debug;

use super::AcademyRepository;
use crate::errors::AppResult;
use crate::model::{attendance::CoachAttendance, coach::Coach, pt_session::PtSession};

pub const COACH_COLUMNS: &str =
    "id, profile_id, email, full_name, phone, role, pt_rate, salary, specialty, avatar_url";

pub const ATTENDANCE_COLUMNS: &str = "id, coach_id, date, check_in_time, check_out_time, status";

pub const PT_SESSION_COLUMNS: &str =
    "id, coach_id, date, sessions_count, coach_share, student_name, student_id, subscription_id";

pub const PT_SUBSCRIPTION_COLUMNS: &str =
    "id, student_id, coach_id, sessions_total, price, starts_on";

#[derive(Clone)]
pub struct MySqlAcademyRepository {
    pool: MySqlPool,
}

impl MySqlAcademyRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AcademyRepository for MySqlAcademyRepository {
    async fn list_coaches(&self) -> AppResult<Vec<Coach>> {
        let sql = format!("SELECT {COACH_COLUMNS} FROM coaches ORDER BY full_name, id");
        let coaches = sqlx::query_as::<_, Coach>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = coaches.len(), "Fetched coaches");
        Ok(coaches)
    }

    async fn coach_attendance_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<CoachAttendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM coach_attendance \
             WHERE date BETWEEN ? AND ? ORDER BY date, coach_id"
        );
        let rows = sqlx::query_as::<_, CoachAttendance>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        debug!(%from, %to, count = rows.len(), "Fetched coach attendance");
        Ok(rows)
    }

    async fn pt_sessions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<PtSession>> {
        let sql = format!(
            "SELECT {PT_SESSION_COLUMNS} FROM pt_sessions \
             WHERE date BETWEEN ? AND ? ORDER BY date, id"
        );
        let rows = sqlx::query_as::<_, PtSession>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        debug!(%from, %to, count = rows.len(), "Fetched PT sessions");
        Ok(rows)
    }
}
