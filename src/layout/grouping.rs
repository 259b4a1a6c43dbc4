use std::collections::{BTreeSet, HashMap};

use super::{Grouping, GroupingKind, InnerGrouping};
use crate::model::{Team, VerticalHint};

pub const UNGROUPED: &str = "(Ungrouped)";

/// Partitions `teams` by `key`, keeping groups in first-seen order.
/// Teams without a key land in `fallback` when given, otherwise they are dropped.
pub fn classify_by_key<'a, F>(
    teams: &'a [Team],
    kind: GroupingKind,
    fallback: Option<&str>,
    key: F,
) -> Vec<Grouping<'a>>
where
    F: Fn(&'a Team) -> Option<&'a str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groupings: Vec<Grouping<'a>> = Vec::new();

    for team in teams {
        let name = match key(team) {
            Some(name) => name,
            None => match fallback {
                Some(name) => name,
                None => continue,
            },
        };
        let slot = *index.entry(name.to_string()).or_insert_with(|| {
            groupings.push(Grouping {
                name: name.to_string(),
                kind,
                teams: Vec::new(),
            });
            groupings.len() - 1
        });
        groupings[slot].teams.push(team);
    }

    groupings
}

/// Value-stream groupings, including an "(Ungrouped)" bucket for teams without one.
pub fn value_stream_groupings(teams: &[Team]) -> Vec<Grouping<'_>> {
    classify_by_key(teams, GroupingKind::ValueStream, Some(UNGROUPED), |team| {
        team.value_stream()
    })
}

/// Platform groupings. Teams without a platform grouping appear in none of them.
pub fn platform_groupings(teams: &[Team]) -> Vec<Grouping<'_>> {
    classify_by_key(teams, GroupingKind::Platform, None, |team| {
        team.platform_grouping()
    })
}

/// Nested boxes keyed by `outer::inner`; the outer grouping is the value stream if any,
/// else the platform grouping.
pub fn inner_groupings(teams: &[Team]) -> Vec<InnerGrouping<'_>> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groupings: Vec<InnerGrouping<'_>> = Vec::new();

    for team in teams {
        let Some(inner) = team
            .value_stream_inner()
            .or_else(|| team.platform_grouping_inner())
        else {
            continue;
        };
        let Some(outer) = team.value_stream().or_else(|| team.platform_grouping()) else {
            continue;
        };
        let key = (outer.to_string(), inner.to_string());
        let slot = *index.entry(key).or_insert_with(|| {
            groupings.push(InnerGrouping {
                name: inner.to_string(),
                parent: outer.to_string(),
                teams: Vec::new(),
            });
            groupings.len() - 1
        });
        groupings[slot].teams.push(team);
    }

    groupings
}

/// First explicit vertical hint among the members.
pub fn grouping_vertical_hint(grouping: &Grouping<'_>) -> Option<VerticalHint> {
    grouping.teams.iter().find_map(|team| team.hint_y())
}

pub fn value_stream_names(teams: &[Team]) -> Vec<String> {
    sorted_names(teams.iter().filter_map(Team::value_stream))
}

pub fn platform_grouping_names(teams: &[Team]) -> Vec<String> {
    sorted_names(teams.iter().filter_map(Team::platform_grouping))
}

fn sorted_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    names
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Grouping filter. A team is visible when it matches any active criterion,
/// or when no criterion is active.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingFilter {
    pub value_streams: Vec<String>,
    pub platform_groupings: Vec<String>,
    pub show_ungrouped: bool,
}

impl GroupingFilter {
    pub fn is_active(&self) -> bool {
        !self.value_streams.is_empty() || !self.platform_groupings.is_empty() || self.show_ungrouped
    }

    pub fn matches(&self, team: &Team) -> bool {
        if !self.is_active() {
            return true;
        }
        let value_stream = team.value_stream();
        let platform = team.platform_grouping();
        if let Some(vs) = value_stream {
            if self.value_streams.iter().any(|name| name == vs) {
                return true;
            }
        }
        if let Some(pg) = platform {
            if self.platform_groupings.iter().any(|name| name == pg) {
                return true;
            }
        }
        self.show_ungrouped && value_stream.is_none() && platform.is_none()
    }

    pub fn apply<'a>(&self, teams: &'a [Team]) -> Vec<&'a Team> {
        teams.iter().filter(|team| self.matches(team)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TeamType;

    fn names<'a>(grouping: &Grouping<'a>) -> Vec<&'a str> {
        grouping.teams.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let teams = vec![
            Team::new("A", TeamType::StreamAligned).in_value_stream("Zeta"),
            Team::new("B", TeamType::StreamAligned).in_value_stream("Alpha"),
            Team::new("C", TeamType::Enabling),
            Team::new("D", TeamType::Platform).in_value_stream("Zeta"),
        ];
        let groupings = value_stream_groupings(&teams);
        let order: Vec<&str> = groupings.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(order, vec!["Zeta", "Alpha", UNGROUPED]);
        assert_eq!(names(&groupings[0]), vec!["A", "D"]);
        assert_eq!(names(&groupings[2]), vec!["C"]);
    }

    #[test]
    fn platform_groupings_drop_teams_without_key() {
        let teams = vec![
            Team::new("A", TeamType::Platform).in_platform_grouping("Data"),
            Team::new("B", TeamType::Platform),
            Team::new("C", TeamType::Platform)
                .with_metadata("platform_grouping", "Data"),
        ];
        let groupings = platform_groupings(&teams);
        assert_eq!(groupings.len(), 1);
        assert_eq!(names(&groupings[0]), vec!["A", "C"]);
        assert!(groupings.iter().all(|g| g.kind == GroupingKind::Platform));
    }

    #[test]
    fn empty_input_yields_no_groupings() {
        assert!(value_stream_groupings(&[]).is_empty());
        assert!(platform_groupings(&[]).is_empty());
        assert!(inner_groupings(&[]).is_empty());
    }

    #[test]
    fn inner_groupings_nest_under_outer_key() {
        let mut checkout = Team::new("A", TeamType::StreamAligned).in_value_stream("Shop");
        checkout.value_stream_inner = Some("Checkout".to_string());
        let mut data = Team::new("B", TeamType::Platform).in_platform_grouping("Data");
        data.platform_grouping_inner = Some("Storage".to_string());
        let mut orphan = Team::new("C", TeamType::Platform);
        orphan.platform_grouping_inner = Some("Nowhere".to_string());

        let teams = vec![checkout, data, orphan];
        let inner = inner_groupings(&teams);
        assert_eq!(inner.len(), 2);
        assert_eq!((inner[0].parent.as_str(), inner[0].name.as_str()), ("Shop", "Checkout"));
        assert_eq!((inner[1].parent.as_str(), inner[1].name.as_str()), ("Data", "Storage"));
    }

    #[test]
    fn names_are_sorted_and_unique() {
        let teams = vec![
            Team::new("A", TeamType::StreamAligned).in_value_stream("b"),
            Team::new("B", TeamType::StreamAligned).in_value_stream("a"),
            Team::new("C", TeamType::StreamAligned).in_value_stream("b"),
        ];
        assert_eq!(value_stream_names(&teams), vec!["a", "b"]);
        assert!(platform_grouping_names(&teams).is_empty());
    }

    #[test]
    fn filter_matches_any_criterion() {
        let teams = vec![
            Team::new("A", TeamType::StreamAligned).in_value_stream("Shop"),
            Team::new("B", TeamType::Platform).in_platform_grouping("Data"),
            Team::new("C", TeamType::Enabling),
        ];
        let everything = GroupingFilter::default();
        assert_eq!(everything.apply(&teams).len(), 3);

        let filter = GroupingFilter {
            value_streams: vec!["Shop".to_string()],
            platform_groupings: Vec::new(),
            show_ungrouped: true,
        };
        let visible: Vec<&str> = filter.apply(&teams).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(visible, vec!["A", "C"]);
    }
}
