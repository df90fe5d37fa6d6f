use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Staff roles as stored in `coaches.role`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StaffRole {
    Admin,
    HeadCoach,
    Coach,
    Reception,
    Cleaner,
}

impl TryFrom<String> for StaffRole {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "profile_id": "3f1c2a9e-5b7d-4e0a-9c61-2d8f4b7a1e33",
        "email": "maya@academy.test",
        "full_name": "Maya Petrova",
        "phone": "+15550100",
        "role": "coach",
        "pt_rate": 20.0,
        "salary": 500.0,
        "specialty": "beam",
        "avatar_url": null
    })
)]
pub struct Coach {
    pub id: u64,

    /// Login identity issued by the auth provider, if the coach has one.
    #[schema(nullable = true)]
    pub profile_id: Option<String>,

    #[schema(nullable = true)]
    pub email: Option<String>,

    pub full_name: String,

    #[schema(nullable = true)]
    pub phone: Option<String>,

    #[sqlx(try_from = "String")]
    pub role: StaffRole,

    /// Currency per PT session.
    #[schema(nullable = true)]
    pub pt_rate: Option<f64>,

    /// Fixed monthly amount.
    #[schema(nullable = true)]
    pub salary: Option<f64>,

    #[schema(nullable = true)]
    pub specialty: Option<String>,

    #[schema(nullable = true)]
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_snake_case_names() {
        assert_eq!(StaffRole::HeadCoach.to_string(), "head_coach");
        assert_eq!(
            StaffRole::try_from(" reception ".to_string()).unwrap(),
            StaffRole::Reception
        );
        assert!(StaffRole::try_from("owner".to_string()).is_err());
    }
}
