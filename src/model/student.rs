use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

/// A weekly training slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrainingScheduleEntry {
    #[schema(value_type = String, example = "Mon")]
    pub day: Weekday,

    #[schema(value_type = String, example = "16:00:00")]
    pub start: NaiveTime,

    #[schema(value_type = String, example = "17:30:00")]
    pub end: NaiveTime,
}

impl TrainingScheduleEntry {
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "full_name": "Lina Kovac",
        "birth_date": "2016-05-09",
        "parent_name": "Ivana Kovac",
        "phone": "+15550111",
        "email": null,
        "training_group": "juniors-a",
        "training_schedule": [{"day": "Mon", "start": "16:00:00", "end": "17:30:00"}],
        "joined_on": "2025-09-01",
        "status": "active"
    })
)]
pub struct Student {
    pub id: u64,
    pub full_name: String,

    #[schema(value_type = Option<String>, format = "date")]
    pub birth_date: Option<NaiveDate>,

    #[schema(nullable = true)]
    pub parent_name: Option<String>,

    #[schema(nullable = true)]
    pub phone: Option<String>,

    #[schema(nullable = true)]
    pub email: Option<String>,

    #[schema(nullable = true)]
    pub training_group: Option<String>,

    #[schema(value_type = Vec<TrainingScheduleEntry>)]
    pub training_schedule: Json<Vec<TrainingScheduleEntry>>,

    #[schema(value_type = String, format = "date")]
    pub joined_on: NaiveDate,

    #[schema(example = "active")]
    pub status: String,
}
