use crate::{
    auth::auth::AuthUser,
    errors::AppError,
    model::skill::{Skill, SkillAssessment, overall_percentage},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateAssessment {
    pub coach_id: Option<u64>,
    #[schema(example = "2026-02-20", format = "date", value_type = String)]
    pub assessed_on: NaiveDate,
    pub skills: Vec<Skill>,
    pub notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AssessmentView {
    #[serde(flatten)]
    pub assessment: SkillAssessment,
    #[schema(nullable = true, example = 73.3)]
    pub overall_percentage: Option<f64>,
}

/// Record a skill assessment
#[utoipa::path(
    post,
    path = "/api/students/{student_id}/skills",
    params(("student_id", Path, description = "Student ID")),
    request_body = CreateAssessment,
    responses(
        (status = 201, description = "Assessment recorded"),
        (status = 400, description = "Invalid skill scores")
    ),
    tag = "Student",
    security(("bearer_auth" = []))
)]
pub async fn create_assessment(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateAssessment>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    if payload.skills.is_empty() {
        return Err(AppError::BadRequest("At least one skill is required".into()).into());
    }
    if let Some(bad) = payload
        .skills
        .iter()
        .find(|s| s.name.trim().is_empty() || s.max_score <= 0.0 || s.score < 0.0)
    {
        return Err(AppError::BadRequest(format!("Invalid score for skill '{}'", bad.name)).into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO skill_assessments (student_id, coach_id, assessed_on, skills, notes)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(student_id)
    .bind(payload.coach_id)
    .bind(payload.assessed_on)
    .bind(Json(&payload.skills))
    .bind(&payload.notes)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, student_id, "Failed to record assessment");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "id": result.last_insert_id(),
        "overall_percentage": overall_percentage(&payload.skills),
    })))
}

/// Skill assessments of a student, newest first
#[utoipa::path(
    get,
    path = "/api/students/{student_id}/skills",
    params(("student_id", Path, description = "Student ID")),
    responses((status = 200, body = [AssessmentView])),
    tag = "Student",
    security(("bearer_auth" = []))
)]
pub async fn list_assessments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    let rows = sqlx::query_as::<_, SkillAssessment>(
        r#"
        SELECT id, student_id, coach_id, assessed_on, skills, notes
        FROM skill_assessments
        WHERE student_id = ?
        ORDER BY assessed_on DESC, id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, student_id, "Failed to fetch assessments");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data: Vec<AssessmentView> = rows
        .into_iter()
        .map(|assessment| AssessmentView {
            overall_percentage: overall_percentage(&assessment.skills),
            assessment,
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}
