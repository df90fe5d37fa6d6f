use crate::{
    auth::auth::AuthUser,
    errors::AppResult,
    model::attendance::CoachAttendance,
    repository::mysql::ATTENDANCE_COLUMNS,
    services::month::MonthRange,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ClockRequest {
    #[schema(example = 7)]
    pub coach_id: u64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    /// `YYYY-MM`, defaults to the current month
    #[schema(example = "2026-02")]
    pub month: Option<String>,
    #[schema(example = 7)]
    pub coach_id: Option<u64>,
}

pub(crate) fn month_or_current(month: Option<&str>) -> AppResult<MonthRange> {
    match month {
        Some(key) => MonthRange::parse(key),
        None => Ok(MonthRange::containing(Local::now().date_naive())),
    }
}

/// Front desk may clock anyone in; other staff only themselves.
async fn ensure_can_clock(auth: &AuthUser, pool: &MySqlPool, coach_id: u64) -> actix_web::Result<()> {
    if auth.require_front_desk().is_ok() {
        return Ok(());
    }

    let own = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM coaches WHERE id = ? AND profile_id = ?)",
    )
    .bind(coach_id)
    .bind(&auth.profile_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        error!(error = %e, coach_id, "Failed to resolve coach profile");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if own {
        Ok(())
    } else {
        Err(actix_web::error::ErrorForbidden("Cannot record attendance for another coach"))
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockRequest>,
) -> actix_web::Result<impl Responder> {
    let coach_id = payload.coach_id;
    ensure_can_clock(&auth, pool.get_ref(), coach_id).await?;

    let now = Local::now().naive_local();

    // (coach_id, date) is unique: a second check-in on the same day reopens
    // the shift from the latest time.
    sqlx::query(
        r#"
        INSERT INTO coach_attendance (coach_id, date, check_in_time, check_out_time, status)
        VALUES (?, ?, ?, NULL, 'present')
        ON DUPLICATE KEY UPDATE
            check_in_time = VALUES(check_in_time),
            check_out_time = NULL,
            status = 'present'
        "#,
    )
    .bind(coach_id)
    .bind(now.date())
    .bind(now.time())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, coach_id, "Check-in failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    info!(coach_id, "Coach checked in");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully"
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockRequest>,
) -> actix_web::Result<impl Responder> {
    let coach_id = payload.coach_id;
    ensure_can_clock(&auth, pool.get_ref(), coach_id).await?;

    let now = Local::now().naive_local();

    let result = sqlx::query(
        r#"
        UPDATE coach_attendance
        SET check_out_time = ?, status = 'completed'
        WHERE coach_id = ?
        AND date = ?
        AND check_in_time IS NOT NULL
        AND check_out_time IS NULL
        "#,
    )
    .bind(now.time())
    .bind(coach_id)
    .bind(now.date())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, coach_id, "Check-out failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active check-in found for today"
        })));
    }

    info!(coach_id, "Coach checked out");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

/// Attendance rows of one month
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, body = [CoachAttendance]),
        (status = 400, description = "Invalid month")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_front_desk()?;
    let range = month_or_current(query.month.as_deref())?;

    let mut sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM coach_attendance WHERE date BETWEEN ? AND ?"
    );
    if query.coach_id.is_some() {
        sql.push_str(" AND coach_id = ?");
    }
    sql.push_str(" ORDER BY date DESC, coach_id");

    let mut q = sqlx::query_as::<_, CoachAttendance>(&sql)
        .bind(range.first)
        .bind(range.last);
    if let Some(coach_id) = query.coach_id {
        q = q.bind(coach_id);
    }

    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, month = %range.key(), "Failed to fetch attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}
