use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Skill {
    #[schema(example = "back handspring")]
    pub name: String,
    #[schema(example = 7.5)]
    pub score: f64,
    #[schema(example = 10.0)]
    pub max_score: f64,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SkillAssessment {
    pub id: u64,
    pub student_id: u64,

    #[schema(nullable = true)]
    pub coach_id: Option<u64>,

    #[schema(value_type = String, format = "date")]
    pub assessed_on: NaiveDate,

    #[schema(value_type = Vec<Skill>)]
    pub skills: Json<Vec<Skill>>,

    #[schema(nullable = true)]
    pub notes: Option<String>,
}

/// Sum of scores over sum of maxima, as a percentage with one decimal.
/// Skills with a non-positive maximum are ignored.
pub fn overall_percentage(skills: &[Skill]) -> Option<f64> {
    let (score, max) = skills
        .iter()
        .filter(|s| s.max_score > 0.0)
        .fold((0.0, 0.0), |(score, max), s| {
            (score + s.score.clamp(0.0, s.max_score), max + s.max_score)
        });

    if max == 0.0 {
        return None;
    }

    Some((score / max * 1000.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str, score: f64, max_score: f64) -> Skill {
        Skill {
            name: name.to_string(),
            score,
            max_score,
        }
    }

    #[test]
    fn percentage_over_all_skills() {
        let skills = vec![skill("cartwheel", 8.0, 10.0), skill("split", 3.0, 5.0)];
        assert_eq!(overall_percentage(&skills), Some(73.3));
    }

    #[test]
    fn scores_above_maximum_are_capped() {
        let skills = vec![skill("bridge", 12.0, 10.0)];
        assert_eq!(overall_percentage(&skills), Some(100.0));
    }

    #[test]
    fn no_scorable_skills_gives_none() {
        assert_eq!(overall_percentage(&[]), None);
        assert_eq!(overall_percentage(&[skill("x", 1.0, 0.0)]), None);
    }
}
