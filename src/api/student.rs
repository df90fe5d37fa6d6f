use crate::{
    auth::auth::AuthUser,
    errors::AppError,
    model::student::{Student, TrainingScheduleEntry},
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

const STUDENT_COLUMNS: &str = "id, full_name, birth_date, parent_name, phone, email, \
     training_group, training_schedule, joined_on, status";

const UPDATABLE_COLUMNS: &[&str] = &[
    "full_name",
    "birth_date",
    "parent_name",
    "phone",
    "email",
    "training_group",
    "training_schedule",
    "joined_on",
    "status",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateStudent {
    #[schema(example = "Lina Kovac")]
    pub full_name: String,
    #[schema(example = "2016-05-09", format = "date", value_type = Option<String>)]
    pub birth_date: Option<NaiveDate>,
    #[schema(example = "Ivana Kovac")]
    pub parent_name: Option<String>,
    #[schema(example = "+15550111")]
    pub phone: Option<String>,
    pub email: Option<String>,
    #[schema(example = "juniors-a")]
    pub training_group: Option<String>,
    #[serde(default)]
    pub training_schedule: Vec<TrainingScheduleEntry>,
    #[schema(example = "2025-09-01", format = "date", value_type = String)]
    pub joined_on: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StudentQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// active / inactive
    pub status: Option<String>,
    pub training_group: Option<String>,
    /// Matches name, parent name or phone
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<Student>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

fn validate_schedule(entries: &[TrainingScheduleEntry]) -> Result<(), AppError> {
    match entries.iter().find(|e| !e.is_valid()) {
        Some(bad) => Err(AppError::BadRequest(format!(
            "Training slot on {} must end after it starts",
            bad.day
        ))),
        None => Ok(()),
    }
}

/// Create student
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created", body = Object, example = json!({
            "id": 12,
            "message": "Student created successfully"
        })),
        (status = 400, description = "Invalid payload")
    ),
    tag = "Student",
    security(("bearer_auth" = []))
)]
pub async fn create_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_front_desk()?;

    if payload.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("full_name must not be empty".into()).into());
    }
    validate_schedule(&payload.training_schedule)?;

    let result = sqlx::query(
        r#"
        INSERT INTO students
        (full_name, birth_date, parent_name, phone, email, training_group, training_schedule, joined_on)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.full_name.trim())
    .bind(payload.birth_date)
    .bind(&payload.parent_name)
    .bind(&payload.phone)
    .bind(&payload.email)
    .bind(&payload.training_group)
    .bind(Json(&payload.training_schedule))
    .bind(payload.joined_on)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => Ok(HttpResponse::Created().json(json!({
            "id": res.last_insert_id(),
            "message": "Student created successfully"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentQuery),
    responses(
        (status = 200, description = "Paginated student list", body = StudentListResponse)
    ),
    tag = "Student",
    security(("bearer_auth" = []))
)]
pub async fn list_students(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StudentQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    if let Some(group) = &query.training_group {
        conditions.push("training_group = ?");
        bindings.push(group.clone());
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("(full_name LIKE ? OR parent_name LIKE ? OR phone LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM students {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting students");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count students");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {STUDENT_COLUMNS} FROM students {} ORDER BY full_name, id LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching students");

    let mut data_query = sqlx::query_as::<_, Student>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let students = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch students");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(StudentListResponse {
        data: students,
        page,
        per_page,
        total,
    }))
}

/// Get student by ID
#[utoipa::path(
    get,
    path = "/api/students/{student_id}",
    params(("student_id", Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student found", body = Student),
        (status = 404, description = "Student not found")
    ),
    tag = "Student",
    security(("bearer_auth" = []))
)]
pub async fn get_student(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?");
    let student = sqlx::query_as::<_, Student>(&sql)
        .bind(student_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, student_id, "Failed to fetch student");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let student = student.ok_or_else(|| AppError::NotFound("Student not found".into()))?;
    Ok(HttpResponse::Ok().json(student))
}

/// Update student
#[utoipa::path(
    put,
    path = "/api/students/{student_id}",
    params(("student_id", Path, description = "Student ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Student updated"),
        (status = 400, description = "Field cannot be updated"),
        (status = 404, description = "Student not found")
    ),
    tag = "Student",
    security(("bearer_auth" = []))
)]
pub async fn update_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_front_desk()?;
    let student_id = path.into_inner();

    if let Some(schedule) = body.get("training_schedule") {
        let entries: Vec<TrainingScheduleEntry> = serde_json::from_value(schedule.clone())
            .map_err(|e| AppError::BadRequest(format!("Invalid training_schedule: {}", e)))?;
        validate_schedule(&entries)?;
    }

    let update = build_update_sql("students", &body, UPDATABLE_COLUMNS, "id", student_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, student_id, "Failed to update student");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Err(AppError::NotFound("Student not found".into()).into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Student updated successfully" })))
}

/// Delete student
#[utoipa::path(
    delete,
    path = "/api/students/{student_id}",
    params(("student_id", Path, description = "Student ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Student not found")
    ),
    tag = "Student",
    security(("bearer_auth" = []))
)]
pub async fn delete_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;
    let student_id = path.into_inner();

    let result = sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(student_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => {
            Err(AppError::NotFound("Student not found".into()).into())
        }
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "message": "Successfully deleted"
        }))),
        Err(e) => {
            error!(error = %e, student_id, "Failed to delete student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};

    fn slot(day: Weekday, start: (u32, u32), end: (u32, u32)) -> TrainingScheduleEntry {
        TrainingScheduleEntry {
            day,
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        }
    }

    #[test]
    fn schedule_with_inverted_slot_is_rejected() {
        let entries = vec![slot(Weekday::Mon, (16, 0), (17, 30)), slot(Weekday::Wed, (18, 0), (17, 0))];
        let err = validate_schedule(&entries).unwrap_err();
        assert!(err.to_string().contains("Wed"));
    }

    #[test]
    fn schedule_parses_from_wire_format() {
        let raw = json!([{ "day": "Fri", "start": "16:00:00", "end": "17:00:00" }]);
        let entries: Vec<TrainingScheduleEntry> = serde_json::from_value(raw).unwrap();
        assert_eq!(entries, vec![slot(Weekday::Fri, (16, 0), (17, 0))]);
        assert!(validate_schedule(&entries).is_ok());
    }
}
