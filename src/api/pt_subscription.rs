use crate::{
    auth::auth::AuthUser,
    errors::{AppError, AppResult},
    model::{
        pt_session::PtSession,
        pt_subscription::{PtSubscription, SubscriptionBalance},
    },
    repository::mysql::{PT_SESSION_COLUMNS, PT_SUBSCRIPTION_COLUMNS},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreatePtSubscription {
    #[schema(example = 12)]
    pub student_id: Option<u64>,
    #[schema(example = 7)]
    pub coach_id: u64,
    #[schema(example = 10)]
    pub sessions_total: i32,
    #[schema(example = 180.0)]
    pub price: f64,
    #[schema(example = "2026-02-01", format = "date", value_type = String)]
    pub starts_on: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PtSubscriptionQuery {
    #[schema(example = 7)]
    pub coach_id: Option<u64>,
    #[schema(example = 12)]
    pub student_id: Option<u64>,
}

fn validate_subscription(payload: &CreatePtSubscription) -> AppResult<()> {
    if payload.sessions_total <= 0 {
        return Err(AppError::BadRequest("sessions_total must be positive".into()));
    }
    if !payload.price.is_finite() || payload.price < 0.0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    Ok(())
}

/// Attaches used and remaining counts from the sessions logged against each bundle.
async fn with_balances(
    pool: &MySqlPool,
    subscriptions: Vec<PtSubscription>,
) -> AppResult<Vec<SubscriptionBalance>> {
    if subscriptions.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; subscriptions.len()].join(", ");
    let sql = format!(
        "SELECT {PT_SESSION_COLUMNS} FROM pt_sessions WHERE subscription_id IN ({placeholders})"
    );

    let mut q = sqlx::query_as::<_, PtSession>(&sql);
    for s in &subscriptions {
        q = q.bind(s.id);
    }
    let sessions = q.fetch_all(pool).await?;
    debug!(
        subscriptions = subscriptions.len(),
        sessions = sessions.len(),
        "Fetched subscription usage"
    );

    Ok(subscriptions
        .into_iter()
        .map(|s| s.balance(&sessions))
        .collect())
}

pub(crate) async fn subscription_balance(
    pool: &MySqlPool,
    subscription_id: u64,
) -> AppResult<Option<SubscriptionBalance>> {
    let sql = format!("SELECT {PT_SUBSCRIPTION_COLUMNS} FROM pt_subscriptions WHERE id = ?");
    let subscription = sqlx::query_as::<_, PtSubscription>(&sql)
        .bind(subscription_id)
        .fetch_optional(pool)
        .await?;

    match subscription {
        Some(s) => Ok(with_balances(pool, vec![s]).await?.pop()),
        None => Ok(None),
    }
}

/// Sell a PT bundle
#[utoipa::path(
    post,
    path = "/api/pt-subscriptions",
    request_body = CreatePtSubscription,
    responses(
        (status = 201, description = "Subscription created", body = Object, example = json!({
            "id": 4,
            "message": "Subscription created"
        })),
        (status = 400, description = "Invalid payload or unknown coach")
    ),
    security(("bearer_auth" = [])),
    tag = "PT"
)]
#[instrument(name = "create_pt_subscription", skip(auth, pool, payload), fields(coach_id = payload.coach_id))]
pub async fn create_pt_subscription(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePtSubscription>,
) -> actix_web::Result<impl Responder> {
    auth.require_front_desk()?;
    validate_subscription(&payload)?;

    let result = sqlx::query(
        r#"
        INSERT INTO pt_subscriptions
        (student_id, coach_id, sessions_total, price, starts_on)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.student_id)
    .bind(payload.coach_id)
    .bind(payload.sessions_total)
    .bind(payload.price)
    .bind(payload.starts_on)
    .execute(pool.get_ref())
    .await
    .map_err(|e| match &e {
        // Foreign key on coach_id.
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
            AppError::BadRequest(format!("Unknown coach {}", payload.coach_id))
        }
        _ => AppError::Database(e),
    })?;

    info!(id = result.last_insert_id(), "PT subscription created");
    Ok(HttpResponse::Created().json(json!({
        "id": result.last_insert_id(),
        "message": "Subscription created"
    })))
}

/// PT bundles with their remaining sessions
#[utoipa::path(
    get,
    path = "/api/pt-subscriptions",
    params(PtSubscriptionQuery),
    responses(
        (status = 200, body = [SubscriptionBalance])
    ),
    security(("bearer_auth" = [])),
    tag = "PT"
)]
pub async fn list_pt_subscriptions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PtSubscriptionQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_front_desk()?;

    let mut conditions = Vec::new();
    let mut bindings = Vec::new();
    if let Some(coach_id) = query.coach_id {
        conditions.push("coach_id = ?");
        bindings.push(coach_id);
    }
    if let Some(student_id) = query.student_id {
        conditions.push("student_id = ?");
        bindings.push(student_id);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    let sql = format!(
        "SELECT {PT_SUBSCRIPTION_COLUMNS} FROM pt_subscriptions {where_clause} ORDER BY starts_on DESC, id DESC"
    );

    let mut q = sqlx::query_as::<_, PtSubscription>(&sql);
    for b in bindings {
        q = q.bind(b);
    }
    let subscriptions = q.fetch_all(pool.get_ref()).await.map_err(AppError::from)?;

    let balances = with_balances(pool.get_ref(), subscriptions).await?;
    Ok(HttpResponse::Ok().json(balances))
}

/// One PT bundle with its remaining sessions
#[utoipa::path(
    get,
    path = "/api/pt-subscriptions/{subscription_id}",
    params(("subscription_id", Path, description = "Subscription ID")),
    responses(
        (status = 200, body = SubscriptionBalance),
        (status = 404, description = "Subscription not found")
    ),
    security(("bearer_auth" = [])),
    tag = "PT"
)]
pub async fn get_pt_subscription(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_front_desk()?;

    let balance = subscription_balance(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;

    Ok(HttpResponse::Ok().json(balance))
}
