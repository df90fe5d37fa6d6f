//! Entity resolution for staff rows.
//!
//! The coaches table has no uniqueness constraint on identity, so the same
//! person can show up more than once (joins, imported history, a login
//! created after the row). Rows are collapsed by walking them in priority
//! order and dropping any row whose identifying values were already claimed
//! by a retained row.

use std::collections::{HashMap, HashSet};

use crate::model::{attendance::LiveStatus, coach::Coach};
use crate::services::live_status::CoachOverview;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Id,
    ProfileId,
    Email,
    FullName,
}

#[derive(Debug, Clone, Copy)]
pub enum MatchRule {
    /// A previously seen value always marks a duplicate.
    Always(IdentityKey),
    /// A previously seen value marks a duplicate only when the candidate is
    /// missing at least one of the listed keys.
    WhenMissingAny(IdentityKey, &'static [IdentityKey]),
}

impl MatchRule {
    fn key(&self) -> IdentityKey {
        match self {
            MatchRule::Always(key) | MatchRule::WhenMissingAny(key, _) => *key,
        }
    }
}

pub const COACH_MATCH_RULES: &[MatchRule] = &[
    MatchRule::Always(IdentityKey::Id),
    MatchRule::Always(IdentityKey::Email),
    MatchRule::Always(IdentityKey::ProfileId),
    MatchRule::WhenMissingAny(
        IdentityKey::FullName,
        &[IdentityKey::ProfileId, IdentityKey::Email],
    ),
];

/// Something that exposes normalized identity values. Blank values must be
/// reported as `None`.
pub trait Identified {
    fn identity(&self, key: IdentityKey) -> Option<String>;
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

impl Identified for Coach {
    fn identity(&self, key: IdentityKey) -> Option<String> {
        match key {
            IdentityKey::Id => Some(self.id.to_string()),
            IdentityKey::ProfileId => self
                .profile_id
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            IdentityKey::Email => normalized(self.email.as_deref()),
            IdentityKey::FullName => normalized(Some(&self.full_name)),
        }
    }
}

impl Identified for CoachOverview {
    fn identity(&self, key: IdentityKey) -> Option<String> {
        self.coach.identity(key)
    }
}

/// Keeps the first item of every identity cluster, in input order.
pub fn resolve_entities<T, I>(items: I, rules: &[MatchRule]) -> Vec<T>
where
    T: Identified,
    I: IntoIterator<Item = T>,
{
    let mut seen: HashMap<IdentityKey, HashSet<String>> = HashMap::new();
    let mut kept = Vec::new();

    for item in items {
        let is_duplicate = rules.iter().any(|rule| {
            let applies = match rule {
                MatchRule::Always(_) => true,
                MatchRule::WhenMissingAny(_, anchors) => {
                    anchors.iter().any(|a| item.identity(*a).is_none())
                }
            };

            applies
                && item
                    .identity(rule.key())
                    .is_some_and(|v| seen.get(&rule.key()).is_some_and(|s| s.contains(&v)))
        });

        if is_duplicate {
            continue;
        }

        for rule in rules {
            if let Some(value) = item.identity(rule.key()) {
                seen.entry(rule.key()).or_default().insert(value);
            }
        }
        kept.push(item);
    }

    kept
}

/// One entry per real person. Rows linked to a login win over orphans, and a
/// coach currently on shift wins over an idle duplicate.
pub fn dedupe_coaches(mut coaches: Vec<CoachOverview>) -> Vec<CoachOverview> {
    coaches.sort_by_key(|c| {
        (
            c.identity(IdentityKey::ProfileId).is_none(),
            c.status != LiveStatus::Working,
        )
    });

    resolve_entities(coaches, COACH_MATCH_RULES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::coach::StaffRole;

    fn coach(id: u64, full_name: &str, email: Option<&str>, profile_id: Option<&str>) -> Coach {
        Coach {
            id,
            profile_id: profile_id.map(str::to_string),
            email: email.map(str::to_string),
            full_name: full_name.to_string(),
            phone: None,
            role: StaffRole::Coach,
            pt_rate: None,
            salary: None,
            specialty: None,
            avatar_url: None,
        }
    }

    fn overview(coach: Coach, status: LiveStatus) -> CoachOverview {
        CoachOverview {
            coach,
            status,
            elapsed_seconds: 0,
            check_in_time: None,
            check_out_time: None,
        }
    }

    fn away(coach: Coach) -> CoachOverview {
        overview(coach, LiveStatus::Away)
    }

    #[test]
    fn email_match_ignores_case_and_whitespace() {
        let result = dedupe_coaches(vec![
            away(coach(1, "Anna", Some("a@x.com"), None)),
            away(coach(2, "Anna B.", Some("A@X.com "), None)),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].coach.id, 1);
    }

    #[test]
    fn shared_name_with_strong_identifiers_is_not_merged() {
        let result = dedupe_coaches(vec![
            away(coach(1, "John Doe", Some("john1@x.com"), Some("p-1"))),
            away(coach(2, "John Doe", Some("john2@x.com"), Some("p-2"))),
        ]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn orphans_with_the_same_name_collapse() {
        let result = dedupe_coaches(vec![
            away(coach(1, "Ann", None, None)),
            away(coach(2, "Ann", None, None)),
        ]);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn same_id_collapses() {
        let result = dedupe_coaches(vec![
            away(coach(5, "Ivo", None, None)),
            away(coach(5, "Ivo Renamed", Some("ivo@x.com"), None)),
        ]);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn same_profile_collapses_and_keeps_working_row() {
        let result = dedupe_coaches(vec![
            away(coach(1, "Mira", Some("mira@x.com"), Some("p-9"))),
            overview(coach(2, "Mira S.", None, Some("p-9")), LiveStatus::Working),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].coach.id, 2);
        assert_eq!(result[0].status, LiveStatus::Working);
    }

    #[test]
    fn profile_linked_row_wins_over_orphan() {
        let result = dedupe_coaches(vec![
            away(coach(1, "Lea", Some("lea@x.com"), None)),
            away(coach(2, "Lea", Some("lea@x.com"), Some("p-3"))),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].coach.id, 2);
    }

    #[test]
    fn blank_values_never_match() {
        let result = dedupe_coaches(vec![
            away(coach(1, "  ", Some(" "), Some(""))),
            away(coach(2, "", Some(""), Some("  "))),
        ]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn name_fallback_applies_when_only_email_is_missing() {
        let result = dedupe_coaches(vec![
            away(coach(1, "Petra", Some("petra@x.com"), Some("p-1"))),
            away(coach(2, "petra ", None, Some("p-2"))),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].coach.id, 1);
    }

    #[test]
    fn resolve_keeps_input_order_without_priority_sort() {
        let coaches = vec![
            coach(3, "C", None, None),
            coach(1, "A", None, None),
            coach(3, "C again", None, None),
        ];
        let kept = resolve_entities(coaches, &[MatchRule::Always(IdentityKey::Id)]);
        let ids: Vec<u64> = kept.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
