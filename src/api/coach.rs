use crate::{
    auth::{auth::AuthUser, password::hash_password},
    errors::{AppError, AppResult},
    model::coach::{Coach, StaffRole},
    repository::{MySqlAcademyRepository, mysql::COACH_COLUMNS},
    services::{
        dedup::dedupe_coaches,
        live_status::{CoachOverview, todays_overviews},
    },
    utils::{
        db_utils::{build_update_sql, execute_update},
        email_cache::{COACH_EMAIL_CACHE, EmailOwner, lookup},
        email_filter::{COACH_EMAIL_FILTER, normalize},
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const UPDATABLE_COLUMNS: &[&str] = &[
    "full_name",
    "email",
    "phone",
    "role",
    "pt_rate",
    "salary",
    "specialty",
    "avatar_url",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateCoach {
    #[schema(example = "Maya Petrova")]
    pub full_name: String,
    #[schema(example = "maya@academy.test", format = "email")]
    pub email: Option<String>,
    #[schema(example = "+15550100")]
    pub phone: Option<String>,
    pub role: StaffRole,
    #[schema(example = 20.0)]
    pub pt_rate: Option<f64>,
    #[schema(example = 500.0)]
    pub salary: Option<f64>,
    #[schema(example = "beam")]
    pub specialty: Option<String>,
    /// When present, a login profile is created together with the coach.
    #[schema(example = "change-me-please", format = "password")]
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreatedCoach {
    pub id: u64,
    #[schema(nullable = true)]
    pub profile_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CoachListResponse {
    pub data: Vec<CoachOverview>,
    pub total: usize,
}

fn validate_compensation(pt_rate: Option<f64>, salary: Option<f64>) -> AppResult<()> {
    if pt_rate.is_some_and(|r| r < 0.0) || salary.is_some_and(|s| s < 0.0) {
        return Err(AppError::BadRequest("pt_rate and salary must not be negative".into()));
    }
    Ok(())
}

/// Reads `pt_rate` and `salary` from a partial update. Absent and null are `None`.
fn compensation_in(body: &Value) -> AppResult<(Option<f64>, Option<f64>)> {
    let number = |key: &str| match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("{} must be a number", key))),
    };
    Ok((number("pt_rate")?, number("salary")?))
}

/// Id of a coach row already carrying `email`, if any.
async fn coach_with_email(pool: &MySqlPool, email: &str) -> AppResult<Option<u64>> {
    match lookup(&COACH_EMAIL_FILTER, &COACH_EMAIL_CACHE, email).await {
        EmailOwner::Free => Ok(None),
        EmailOwner::Coach(id) => Ok(Some(id)),
        EmailOwner::Unknown => {
            let owner = sqlx::query_scalar::<_, u64>(
                "SELECT id FROM coaches WHERE LOWER(TRIM(email)) = ? ORDER BY id LIMIT 1",
            )
            .bind(normalize(email))
            .fetch_optional(pool)
            .await?;

            debug!(email, ?owner, "Coach email resolved from database");
            if let Some(id) = owner {
                COACH_EMAIL_CACHE.remember(email, id).await;
            }
            Ok(owner)
        }
    }
}

async fn index_email(email: &str, coach_id: u64) {
    COACH_EMAIL_FILTER.insert(email);
    COACH_EMAIL_CACHE.remember(email, coach_id).await;
}

/// Creates the login profile and the coach row in one transaction and
/// returns both ids.
async fn insert_coach_with_login(
    pool: &MySqlPool,
    payload: &CreateCoach,
    email: &str,
    password: &str,
) -> AppResult<CreatedCoach> {
    let password_hash = hash_password(password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        AppError::BadRequest("Password could not be processed".into())
    })?;
    let profile_id = Uuid::new_v4().to_string();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO profiles (id, email, password_hash, role, created_at)
        VALUES (?, ?, ?, ?, NOW())
        "#,
    )
    .bind(&profile_id)
    .bind(email)
    .bind(&password_hash)
    .bind(payload.role.to_string())
    .execute(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
            AppError::Conflict("Email already has a login".into())
        }
        _ => AppError::Database(e),
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO coaches
        (profile_id, email, full_name, phone, role, pt_rate, salary, specialty)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&profile_id)
    .bind(email)
    .bind(payload.full_name.trim())
    .bind(&payload.phone)
    .bind(payload.role.to_string())
    .bind(payload.pt_rate)
    .bind(payload.salary)
    .bind(&payload.specialty)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(CreatedCoach {
        id: result.last_insert_id(),
        profile_id: Some(profile_id),
    })
}

/// Create a coach, optionally with a login
#[utoipa::path(
    post,
    path = "/api/coaches",
    request_body = CreateCoach,
    responses(
        (status = 201, description = "Coach created", body = CreatedCoach),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already used by a coach or a login")
    ),
    tag = "Coach",
    security(("bearer_auth" = []))
)]
#[instrument(name = "create_coach", skip(auth, pool, payload), fields(role = %payload.role))]
pub async fn create_coach(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCoach>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    if payload.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("full_name must not be empty".into()).into());
    }
    validate_compensation(payload.pt_rate, payload.salary)?;

    let email = payload
        .email
        .as_deref()
        .map(normalize)
        .filter(|e| !e.is_empty());

    if let Some(email) = &email {
        if let Some(owner) = coach_with_email(pool.get_ref(), email).await? {
            return Err(AppError::Conflict(format!("Email already belongs to coach {}", owner)).into());
        }
    }

    let created = match (&payload.password, &email) {
        (Some(password), Some(email)) => {
            if password.len() < 8 {
                return Err(AppError::BadRequest("Password must be at least 8 characters".into()).into());
            }
            insert_coach_with_login(pool.get_ref(), &payload, email, password).await?
        }
        (Some(_), None) => {
            return Err(AppError::BadRequest("A login requires an email".into()).into());
        }
        (None, _) => {
            let result = sqlx::query(
                r#"
                INSERT INTO coaches
                (email, full_name, phone, role, pt_rate, salary, specialty)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&email)
            .bind(payload.full_name.trim())
            .bind(&payload.phone)
            .bind(payload.role.to_string())
            .bind(payload.pt_rate)
            .bind(payload.salary)
            .bind(&payload.specialty)
            .execute(pool.get_ref())
            .await
            .map_err(AppError::from)?;

            CreatedCoach {
                id: result.last_insert_id(),
                profile_id: None,
            }
        }
    };

    if let Some(email) = &email {
        index_email(email, created.id).await;
    }

    info!(coach_id = created.id, "Coach created");
    Ok(HttpResponse::Created().json(created))
}

/// List coaches, one entry per person, with live status
#[utoipa::path(
    get,
    path = "/api/coaches",
    responses(
        (status = 200, description = "De-duplicated coach list", body = CoachListResponse)
    ),
    tag = "Coach",
    security(("bearer_auth" = []))
)]
pub async fn list_coaches(
    _auth: AuthUser,
    repo: web::Data<MySqlAcademyRepository>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now().naive_local();
    let data = dedupe_coaches(todays_overviews(repo.get_ref(), now).await?);

    Ok(HttpResponse::Ok().json(CoachListResponse {
        total: data.len(),
        data,
    }))
}

/// Live status of every coach row for today
#[utoipa::path(
    get,
    path = "/api/coaches/status",
    responses(
        (status = 200, description = "Status per coach row", body = [CoachOverview])
    ),
    tag = "Coach",
    security(("bearer_auth" = []))
)]
pub async fn coach_status(
    _auth: AuthUser,
    repo: web::Data<MySqlAcademyRepository>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now().naive_local();
    let data = todays_overviews(repo.get_ref(), now).await?;

    Ok(HttpResponse::Ok().json(data))
}

/// Get coach by ID
#[utoipa::path(
    get,
    path = "/api/coaches/{coach_id}",
    params(("coach_id", Path, description = "Coach ID")),
    responses(
        (status = 200, description = "Coach found", body = Coach),
        (status = 404, description = "Coach not found")
    ),
    tag = "Coach",
    security(("bearer_auth" = []))
)]
pub async fn get_coach(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let coach_id = path.into_inner();

    let sql = format!("SELECT {COACH_COLUMNS} FROM coaches WHERE id = ?");
    let coach = sqlx::query_as::<_, Coach>(&sql)
        .bind(coach_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, coach_id, "Failed to fetch coach");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let coach = coach.ok_or_else(|| AppError::NotFound("Coach not found".into()))?;
    Ok(HttpResponse::Ok().json(coach))
}

/// Update coach
#[utoipa::path(
    put,
    path = "/api/coaches/{coach_id}",
    params(("coach_id", Path, description = "Coach ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Coach updated"),
        (status = 400, description = "Field cannot be updated"),
        (status = 404, description = "Coach not found"),
        (status = 409, description = "Email already belongs to another coach")
    ),
    tag = "Coach",
    security(("bearer_auth" = []))
)]
pub async fn update_coach(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;
    let coach_id = path.into_inner();
    let mut body = body.into_inner();

    if let Some(role) = body.get("role").and_then(Value::as_str) {
        role.parse::<StaffRole>()
            .map_err(|_| AppError::BadRequest(format!("Unknown role '{}'", role)))?;
    }
    let (pt_rate, salary) = compensation_in(&body)?;
    validate_compensation(pt_rate, salary)?;

    // Some(new) when the update touches the email column; new is None when cleared.
    let email_change = match body.get("email") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(raw)) => Some(Some(normalize(raw)).filter(|e| !e.is_empty())),
        Some(_) => return Err(AppError::BadRequest("email must be a string".into()).into()),
    };

    let previous_email = match &email_change {
        Some(new_email) => {
            if let Some(email) = new_email {
                if let Some(owner) = coach_with_email(pool.get_ref(), email).await? {
                    if owner != coach_id {
                        return Err(AppError::Conflict(format!(
                            "Email already belongs to coach {}",
                            owner
                        ))
                        .into());
                    }
                }
            }
            body["email"] = new_email.clone().map(Value::String).unwrap_or(Value::Null);

            sqlx::query_scalar::<_, Option<String>>("SELECT email FROM coaches WHERE id = ?")
                .bind(coach_id)
                .fetch_optional(pool.get_ref())
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::NotFound("Coach not found".into()))?
        }
        None => None,
    };

    let update = build_update_sql("coaches", &body, UPDATABLE_COLUMNS, "id", coach_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, coach_id, "Failed to update coach");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Err(AppError::NotFound("Coach not found".into()).into());
    }

    if let Some(new_email) = email_change {
        if let Some(old) = previous_email {
            COACH_EMAIL_CACHE.forget(&old).await;
        }
        if let Some(email) = new_email {
            index_email(&email, coach_id).await;
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Coach updated successfully" })))
}

/// Delete coach
#[utoipa::path(
    delete,
    path = "/api/coaches/{coach_id}",
    params(("coach_id", Path, description = "Coach ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Coach not found")
    ),
    tag = "Coach",
    security(("bearer_auth" = []))
)]
pub async fn delete_coach(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let coach_id = path.into_inner();

    let email = sqlx::query_scalar::<_, Option<String>>("SELECT email FROM coaches WHERE id = ?")
        .bind(coach_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Coach not found".into()))?;

    let result = sqlx::query("DELETE FROM coaches WHERE id = ?")
        .bind(coach_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => {
            Err(AppError::NotFound("Coach not found".into()).into())
        }
        Ok(_) => {
            if let Some(email) = email {
                COACH_EMAIL_CACHE.forget(&email).await;
            }
            info!(coach_id, "Coach deleted");
            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Err(e) => {
            error!(error = %e, coach_id, "Failed to delete coach");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_compensation_is_rejected() {
        assert!(validate_compensation(Some(20.0), Some(500.0)).is_ok());
        assert!(validate_compensation(None, Some(0.0)).is_ok());
        assert!(matches!(
            validate_compensation(Some(-1.0), None),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_compensation(None, Some(-0.5)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn partial_update_compensation_is_checked_like_creation() {
        let (pt_rate, salary) = compensation_in(&json!({ "salary": -100.0 })).unwrap();
        assert_eq!((pt_rate, salary), (None, Some(-100.0)));
        assert!(validate_compensation(pt_rate, salary).is_err());

        let (pt_rate, salary) = compensation_in(&json!({ "pt_rate": null, "full_name": "A" })).unwrap();
        assert_eq!((pt_rate, salary), (None, None));
        assert!(validate_compensation(pt_rate, salary).is_ok());

        assert!(matches!(
            compensation_in(&json!({ "pt_rate": "twenty" })),
            Err(AppError::BadRequest(_))
        ));
    }
}
