use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use sqlx::MySqlPool;
use sqlx::types::Json;

use crate::errors::{AppError, AppResult};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Json(Value),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

fn classify_string(s: &str) -> SqlValue {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        SqlValue::Date(d)
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        SqlValue::DateTime(dt)
    } else if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
        SqlValue::Time(t)
    } else {
        SqlValue::String(s.to_string())
    }
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed` may appear in the payload; they are the only
/// text spliced into the statement.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> AppResult<SqlUpdate> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(AppError::BadRequest("No fields provided for update".into()));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(AppError::BadRequest(format!("Field '{}' cannot be updated", unknown)));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);

    for value in obj.values() {
        let bound = match value {
            Value::String(s) => classify_string(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::I64(i)
                } else if let Some(u) = n.as_u64() {
                    SqlValue::U64(u)
                } else if let Some(f) = n.as_f64() {
                    SqlValue::F64(f)
                } else {
                    return Err(AppError::BadRequest("Unsupported number".into()));
                }
            }
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Null => SqlValue::Null,
            Value::Array(_) | Value::Object(_) => SqlValue::Json(value.clone()),
        };
        values.push(bound);
    }

    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Time(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Json(v) => query.bind(Json(v)),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[&str] = &["full_name", "pt_rate", "joined_on", "training_schedule"];

    #[test]
    fn builds_statement_with_typed_values() {
        let payload = json!({
            "full_name": "Maya P.",
            "pt_rate": 22.5,
            "joined_on": "2026-01-05",
            "training_schedule": [{"day": "Mon", "start": "16:00:00", "end": "17:00:00"}]
        });

        let update = build_update_sql("students", &payload, COLUMNS, "id", 12).unwrap();

        assert!(update.sql.starts_with("UPDATE students SET "));
        assert!(update.sql.ends_with(" WHERE id = ?"));
        assert_eq!(update.values.len(), 5);
        assert!(update.values.contains(&SqlValue::F64(22.5)));
        assert!(update.values.contains(&SqlValue::Date(
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
        )));
        assert_eq!(update.values.last(), Some(&SqlValue::U64(12)));
    }

    #[test]
    fn rejects_columns_outside_the_allow_list() {
        let payload = json!({ "id = 1; DROP TABLE students; --": 1 });
        let err = build_update_sql("students", &payload, COLUMNS, "id", 1).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("students", &json!({}), COLUMNS, "id", 1).is_err());
        assert!(build_update_sql("students", &json!([1, 2]), COLUMNS, "id", 1).is_err());
    }

    #[test]
    fn time_strings_bind_as_times() {
        assert_eq!(
            classify_string("09:30:00"),
            SqlValue::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap())
        );
        assert_eq!(classify_string("beam"), SqlValue::String("beam".into()));
    }
}
