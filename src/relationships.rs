use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{InteractionMode, Team, TeamType};

/// Consumer counts at or above this are "moderate" adoption.
pub const MODERATE_ADOPTION_MIN: usize = 11;
/// Consumer counts at or above this are "heavy" and flag the platform as overloaded.
pub const HEAVY_ADOPTION_MIN: usize = 16;

const UNASSIGNED: &str = "Unassigned";

/// Names one hop away from `team`, including its own name.
///
/// Covers its dependencies, teams depending on it, its interaction partners and teams that
/// list it as an interaction partner. Indirect relationships are not followed.
pub fn direct_relationships(team: &Team, all_teams: &[Team]) -> BTreeSet<String> {
    let mut related = BTreeSet::new();
    related.insert(team.name.clone());
    related.extend(team.dependencies.iter().cloned());
    related.extend(team.interaction_modes.keys().cloned());
    for other in all_teams {
        let depends = other.dependencies.iter().any(|name| name == &team.name);
        if depends || other.interaction_modes.contains_key(&team.name) {
            related.insert(other.name.clone());
        }
    }
    related
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionLevel {
    Light,
    Moderate,
    Heavy,
}

impl AdoptionLevel {
    pub fn from_count(count: usize) -> Self {
        if count >= HEAVY_ADOPTION_MIN {
            Self::Heavy
        } else if count >= MODERATE_ADOPTION_MIN {
            Self::Moderate
        } else {
            Self::Light
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consumer {
    pub name: String,
    pub mode: InteractionMode,
    pub value_stream: String,
    pub team_type: TeamType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformConsumers {
    pub consumers: Vec<Consumer>,
    pub by_value_stream: BTreeMap<String, usize>,
    pub adoption_level: AdoptionLevel,
    pub overloaded: bool,
}

impl PlatformConsumers {
    pub fn total(&self) -> usize {
        self.consumers.len()
    }
}

/// Teams whose interaction modes name `team_name`, grouped by value stream.
pub fn platform_consumers(team_name: &str, all_teams: &[Team]) -> PlatformConsumers {
    let mut consumers = Vec::new();
    let mut by_value_stream: BTreeMap<String, usize> = BTreeMap::new();

    for team in all_teams.iter().filter(|team| team.name != team_name) {
        let Some(mode) = team.interaction_modes.get(team_name) else {
            continue;
        };
        let value_stream = team.value_stream().unwrap_or(UNASSIGNED).to_string();
        *by_value_stream.entry(value_stream.clone()).or_default() += 1;
        consumers.push(Consumer {
            name: team.name.clone(),
            mode: mode.clone(),
            value_stream,
            team_type: team.team_type,
        });
    }

    let adoption_level = AdoptionLevel::from_count(consumers.len());
    PlatformConsumers {
        consumers,
        by_value_stream,
        adoption_level,
        overloaded: adoption_level == AdoptionLevel::Heavy,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dependency {
    pub name: String,
    pub mode: InteractionMode,
    pub team_type: TeamType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DependencyMetrics {
    pub consumers: Vec<Consumer>,
    pub dependencies: Vec<Dependency>,
}

/// Consumers of `team_name` plus the interaction partners it names that exist in `all_teams`.
/// Unknown teams yield empty metrics.
pub fn dependency_metrics(team_name: &str, all_teams: &[Team]) -> DependencyMetrics {
    let Some(team) = all_teams.iter().find(|team| team.name == team_name) else {
        return DependencyMetrics::default();
    };
    let dependencies = team
        .interaction_modes
        .iter()
        .filter_map(|(name, mode)| {
            let target = all_teams.iter().find(|other| &other.name == name)?;
            Some(Dependency {
                name: name.clone(),
                mode: mode.clone(),
                team_type: target.team_type,
            })
        })
        .collect();
    DependencyMetrics {
        consumers: platform_consumers(team_name, all_teams).consumers,
        dependencies,
    }
}
