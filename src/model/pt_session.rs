use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 31,
        "coach_id": 7,
        "date": "2026-02-03",
        "sessions_count": 2,
        "coach_share": null,
        "student_name": "Lina K.",
        "student_id": 12,
        "subscription_id": 4
    })
)]
pub struct PtSession {
    pub id: u64,
    pub coach_id: u64,

    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,

    /// Treated as one session when absent.
    #[schema(nullable = true)]
    pub sessions_count: Option<i32>,

    /// Per-row override of the coach's `pt_rate`.
    #[schema(nullable = true)]
    pub coach_share: Option<f64>,

    /// Free text; guest sessions have no student record.
    #[schema(nullable = true)]
    pub student_name: Option<String>,

    #[schema(nullable = true)]
    pub student_id: Option<u64>,

    #[schema(nullable = true)]
    pub subscription_id: Option<u64>,
}

impl PtSession {
    pub fn effective_count(&self) -> i64 {
        self.sessions_count.map(i64::from).unwrap_or(1)
    }
}
