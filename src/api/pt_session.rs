use crate::{
    api::{attendance::month_or_current, pt_subscription::subscription_balance},
    auth::auth::AuthUser,
    errors::{AppError, AppResult},
    model::{pt_session::PtSession, pt_subscription::SubscriptionBalance},
    repository::mysql::PT_SESSION_COLUMNS,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreatePtSession {
    #[schema(example = 7)]
    pub coach_id: u64,
    #[schema(example = "2026-02-03", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = 2)]
    pub sessions_count: Option<i32>,
    /// Overrides the coach's standard rate for this row
    #[schema(example = 25.0)]
    pub coach_share: Option<f64>,
    #[schema(example = "Lina K.")]
    pub student_name: Option<String>,
    pub student_id: Option<u64>,
    pub subscription_id: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PtSessionQuery {
    /// `YYYY-MM`, defaults to the current month
    #[schema(example = "2026-02")]
    pub month: Option<String>,
    pub coach_id: Option<u64>,
}

/// Sessions drawn from a bundle must belong to its coach and fit in what is left.
fn check_subscription(balance: &SubscriptionBalance, coach_id: u64, count: i64) -> AppResult<()> {
    if balance.subscription.coach_id != coach_id {
        return Err(AppError::BadRequest(format!(
            "Subscription {} belongs to coach {}",
            balance.subscription.id, balance.subscription.coach_id
        )));
    }
    if balance.remaining_sessions < count {
        return Err(AppError::Conflict(format!(
            "Subscription {} has {} sessions left",
            balance.subscription.id,
            balance.remaining_sessions.max(0)
        )));
    }
    Ok(())
}

/// Record PT sessions
#[utoipa::path(
    post,
    path = "/api/pt-sessions",
    request_body = CreatePtSession,
    responses(
        (status = 201, description = "PT sessions recorded"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Subscription exhausted")
    ),
    security(("bearer_auth" = [])),
    tag = "PT"
)]
pub async fn create_pt_session(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePtSession>,
) -> actix_web::Result<impl Responder> {
    auth.require_front_desk()?;

    if payload.sessions_count.is_some_and(|c| c < 0) {
        return Err(AppError::BadRequest("sessions_count must not be negative".into()).into());
    }
    if payload.coach_share.is_some_and(|s| s < 0.0) {
        return Err(AppError::BadRequest("coach_share must not be negative".into()).into());
    }

    if let Some(subscription_id) = payload.subscription_id {
        let balance = subscription_balance(pool.get_ref(), subscription_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("Unknown subscription {}", subscription_id))
            })?;
        let count = payload.sessions_count.map(i64::from).unwrap_or(1);
        check_subscription(&balance, payload.coach_id, count)?;
    }

    let result = sqlx::query(
        r#"
        INSERT INTO pt_sessions
        (coach_id, date, sessions_count, coach_share, student_name, student_id, subscription_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.coach_id)
    .bind(payload.date)
    .bind(payload.sessions_count)
    .bind(payload.coach_share)
    .bind(&payload.student_name)
    .bind(payload.student_id)
    .bind(payload.subscription_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, coach_id = payload.coach_id, "Failed to record PT sessions");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    info!(coach_id = payload.coach_id, id = result.last_insert_id(), "PT sessions recorded");
    Ok(HttpResponse::Created().json(json!({
        "id": result.last_insert_id(),
        "message": "PT sessions recorded"
    })))
}

/// PT session rows of one month
#[utoipa::path(
    get,
    path = "/api/pt-sessions",
    params(PtSessionQuery),
    responses(
        (status = 200, body = [PtSession]),
        (status = 400, description = "Invalid month")
    ),
    security(("bearer_auth" = [])),
    tag = "PT"
)]
pub async fn list_pt_sessions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PtSessionQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_front_desk()?;
    let range = month_or_current(query.month.as_deref())?;

    let mut sql = format!("SELECT {PT_SESSION_COLUMNS} FROM pt_sessions WHERE date BETWEEN ? AND ?");
    if query.coach_id.is_some() {
        sql.push_str(" AND coach_id = ?");
    }
    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut q = sqlx::query_as::<_, PtSession>(&sql)
        .bind(range.first)
        .bind(range.last);
    if let Some(coach_id) = query.coach_id {
        q = q.bind(coach_id);
    }

    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, month = %range.key(), "Failed to fetch PT sessions");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pt_subscription::PtSubscription;

    fn balance(coach_id: u64, remaining: i64) -> SubscriptionBalance {
        SubscriptionBalance {
            subscription: PtSubscription {
                id: 4,
                student_id: Some(12),
                coach_id,
                sessions_total: 10,
                price: 180.0,
                starts_on: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            },
            used_sessions: 10 - remaining,
            remaining_sessions: remaining,
        }
    }

    #[test]
    fn sessions_fitting_the_bundle_are_accepted() {
        assert!(check_subscription(&balance(7, 3), 7, 3).is_ok());
        assert!(check_subscription(&balance(7, 3), 7, 0).is_ok());
    }

    #[test]
    fn bundle_of_another_coach_is_rejected() {
        assert!(matches!(
            check_subscription(&balance(7, 3), 8, 1),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn exhausted_bundle_is_a_conflict() {
        let err = check_subscription(&balance(7, 1), 7, 2).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("1 sessions left"));

        assert!(matches!(
            check_subscription(&balance(7, -2), 7, 1),
            Err(AppError::Conflict(_))
        ));
    }
}
