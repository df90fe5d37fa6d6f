use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::coach::StaffRole;

/// Derived monthly earnings for one coach. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollRow {
    pub coach_id: u64,
    pub full_name: String,
    pub role: StaffRole,
    pub pt_rate: f64,
    pub salary: f64,
    /// Closed shifts only, rounded to one decimal.
    pub total_hours: f64,
    pub total_pt_sessions: i64,
    pub pt_earnings: f64,
    pub total_earnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(
    example = json!({
        "month": "2026-02",
        "period_start": "2026-02-01",
        "period_end": "2026-02-28",
        "currency": "USD",
        "rows": [],
        "total_payroll": 0.0
    })
)]
pub struct MonthlyPayroll {
    pub month: String,

    #[schema(value_type = String, format = "date")]
    pub period_start: NaiveDate,

    #[schema(value_type = String, format = "date")]
    pub period_end: NaiveDate,

    pub currency: String,
    pub rows: Vec<PayrollRow>,
    pub total_payroll: f64,
}
