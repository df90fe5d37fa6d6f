use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::pt_session::PtSession;

/// A prepaid bundle of PT sessions with one coach.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 4,
        "student_id": 12,
        "coach_id": 7,
        "sessions_total": 10,
        "price": 180.0,
        "starts_on": "2026-02-01"
    })
)]
pub struct PtSubscription {
    pub id: u64,

    #[schema(nullable = true)]
    pub student_id: Option<u64>,

    pub coach_id: u64,
    pub sessions_total: i32,
    pub price: f64,

    #[schema(value_type = String, format = "date")]
    pub starts_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionBalance {
    #[serde(flatten)]
    pub subscription: PtSubscription,
    pub used_sessions: i64,
    /// Negative when more sessions were logged than were bought.
    pub remaining_sessions: i64,
}

impl PtSubscription {
    /// Sessions drawn from this bundle, counting a row without a count as one.
    pub fn used_sessions(&self, sessions: &[PtSession]) -> i64 {
        sessions
            .iter()
            .filter(|s| s.subscription_id == Some(self.id))
            .map(PtSession::effective_count)
            .sum()
    }

    pub fn balance(self, sessions: &[PtSession]) -> SubscriptionBalance {
        let used_sessions = self.used_sessions(sessions);
        SubscriptionBalance {
            remaining_sessions: i64::from(self.sessions_total) - used_sessions,
            used_sessions,
            subscription: self,
        }
    }
}
