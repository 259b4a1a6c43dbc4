use proptest::prelude::*;

use team_topology_layout::layout::{compute_layout, team_rect};
use team_topology_layout::model::{CompanyNode, DepartmentNode, SubManagerNode};
use team_topology_layout::{
    LayoutConfig, OrganizationHierarchy, Team, TeamType, ViewMode, align, apply_updates,
};

fn arb_team_type() -> impl Strategy<Value = TeamType> {
    prop_oneof![
        Just(TeamType::StreamAligned),
        Just(TeamType::Platform),
        Just(TeamType::Enabling),
        Just(TeamType::ComplicatedSubsystem),
        Just(TeamType::Undefined),
    ]
}

#[derive(Debug, Clone)]
enum Membership {
    None,
    ValueStream(usize),
    Platform(usize),
}

fn arb_membership() -> impl Strategy<Value = Membership> {
    prop_oneof![
        Just(Membership::None),
        (0usize..3).prop_map(Membership::ValueStream),
        (0usize..2).prop_map(Membership::Platform),
    ]
}

fn arb_hint_x() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some("left")), Just(Some("center")), Just(Some("right"))]
}

fn arb_hint_y() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some("top")), Just(Some("bottom"))]
}

/// Teams with unique names, at most one grouping each, random hints and positions.
fn arb_teams() -> impl Strategy<Value = Vec<Team>> {
    prop::collection::vec(
        (
            arb_team_type(),
            arb_membership(),
            arb_hint_x(),
            arb_hint_y(),
            prop::option::of((-500.0f32..4000.0, -500.0f32..4000.0)),
        ),
        0..18,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(idx, (team_type, membership, hint_x, hint_y, position))| {
                let mut team = Team::new(format!("T{idx}"), team_type);
                match membership {
                    Membership::None => {}
                    Membership::ValueStream(vs) => team.value_stream = Some(format!("VS{vs}")),
                    Membership::Platform(pg) => team.platform_grouping = Some(format!("PG{pg}")),
                }
                if let Some(hint) = hint_x {
                    team = team.with_metadata("align_hint_x", hint);
                }
                if let Some(hint) = hint_y {
                    team = team.with_metadata("align_hint_y", hint);
                }
                if let Some((x, y)) = position {
                    team = team.at(x, y);
                }
                team
            })
            .collect()
    })
}

#[derive(Debug, Clone, Copy)]
enum SubManagerKey {
    LineManagers,
    Regions,
    Both,
    Neither,
}

fn arb_sub_manager_key() -> impl Strategy<Value = SubManagerKey> {
    prop_oneof![
        Just(SubManagerKey::LineManagers),
        Just(SubManagerKey::Regions),
        Just(SubManagerKey::Both),
        Just(SubManagerKey::Neither),
    ]
}

/// Org tree over `T0..Tn` (plus some names that resolve to nothing). Departments list their
/// sub-managers under `line_managers`, `regions`, both keys or neither.
fn arb_org(team_count: usize) -> impl Strategy<Value = OrganizationHierarchy> {
    let names = prop::collection::vec(0usize..team_count.max(1) + 3, 0..6);
    let department = (
        arb_sub_manager_key(),
        prop::collection::vec(names, 0..3),
    );
    prop::collection::vec(department, 0..4).prop_map(|departments| OrganizationHierarchy {
        company: Some(CompanyNode {
            name: "Co".to_string(),
            children: departments
                .into_iter()
                .enumerate()
                .map(|(d, (key, subs))| {
                    let subs: Vec<SubManagerNode> = subs
                        .into_iter()
                        .enumerate()
                        .map(|(s, teams)| SubManagerNode {
                            name: format!("M{d}.{s}"),
                            teams: teams.into_iter().map(|t| format!("T{t}")).collect(),
                        })
                        .collect();
                    let (line_managers, regions) = match key {
                        SubManagerKey::LineManagers => (Some(subs), None),
                        SubManagerKey::Regions => (None, Some(subs)),
                        SubManagerKey::Both => {
                            let shadowed = subs.iter().rev().cloned().collect();
                            (Some(subs), Some(shadowed))
                        }
                        SubManagerKey::Neither => (None, None),
                    };
                    DepartmentNode {
                        name: format!("D{d}"),
                        line_managers,
                        regions,
                    }
                })
                .collect(),
        }),
    })
}

fn teams_with_org() -> impl Strategy<Value = (Vec<Team>, OrganizationHierarchy)> {
    arb_teams().prop_flat_map(|teams| {
        let count = teams.len();
        (Just(teams), arb_org(count))
    })
}

proptest! {
    #[test]
    fn grouping_alignment_is_idempotent(mut teams in arb_teams()) {
        let config = LayoutConfig::default();
        let first = align(&teams, None, ViewMode::Design, &config);
        apply_updates(&mut teams, &first);
        let second = align(&teams, None, ViewMode::Design, &config);
        prop_assert!(second.is_empty(), "second pass moved {:?}", second);
    }

    #[test]
    fn hierarchy_alignment_is_idempotent((mut teams, org) in teams_with_org()) {
        let config = LayoutConfig::default();
        let first = align(&teams, Some(&org), ViewMode::Current, &config);
        apply_updates(&mut teams, &first);
        let second = align(&teams, Some(&org), ViewMode::Current, &config);
        prop_assert!(second.is_empty(), "second pass moved {:?}", second);
    }

    #[test]
    fn alignment_is_deterministic((teams, org) in teams_with_org()) {
        let config = LayoutConfig::default();
        for view in [ViewMode::Current, ViewMode::Design] {
            let a = align(&teams, Some(&org), view, &config);
            let b = align(&teams, Some(&org), view, &config);
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn updates_report_real_moves_only((teams, org) in teams_with_org()) {
        let config = LayoutConfig::default();
        for view in [ViewMode::Current, ViewMode::Design] {
            for update in align(&teams, Some(&org), view, &config) {
                prop_assert!(update.to.differs_from(&update.from, config.move_tolerance));
            }
        }
    }

    #[test]
    fn regions_place_like_line_managers((teams, org) in teams_with_org()) {
        let config = LayoutConfig::default();
        let mut as_regions = org.clone();
        if let Some(company) = as_regions.company.as_mut() {
            for dept in &mut company.children {
                let subs = dept.sub_managers().to_vec();
                dept.line_managers = None;
                dept.regions = Some(subs);
            }
        }
        prop_assert_eq!(
            align(&teams, Some(&org), ViewMode::Current, &config),
            align(&teams, Some(&as_regions), ViewMode::Current, &config)
        );
    }

    #[test]
    fn aligned_design_view_has_no_overlaps(mut teams in arb_teams()) {
        let config = LayoutConfig::default();
        let updates = align(&teams, None, ViewMode::Design, &config);
        apply_updates(&mut teams, &updates);
        let layout = compute_layout(&teams, None, ViewMode::Design, &config);

        for (idx, a) in teams.iter().enumerate() {
            let ra = team_rect(a, ViewMode::Design);
            for b in &teams[idx + 1..] {
                let rb = team_rect(b, ViewMode::Design);
                prop_assert!(!ra.intersects(&rb), "{} overlaps {}", a.name, b.name);
            }
        }

        for grouping in &layout.groupings {
            for team in teams.iter().filter(|team| {
                team.value_stream() == Some(grouping.name.as_str())
                    || team.platform_grouping() == Some(grouping.name.as_str())
            }) {
                prop_assert!(grouping.rect.contains_rect(&team_rect(team, ViewMode::Design)));
            }
        }
        for (idx, a) in layout.groupings.iter().enumerate() {
            for b in &layout.groupings[idx + 1..] {
                prop_assert!(!a.rect.intersects(&b.rect), "{} overlaps {}", a.name, b.name);
            }
            for team in teams.iter().filter(|team| !team.is_grouped()) {
                prop_assert!(!a.rect.intersects(&team_rect(team, ViewMode::Design)));
            }
        }
    }
}
