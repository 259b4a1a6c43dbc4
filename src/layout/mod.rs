mod bounds;
mod design;
mod geometry;
mod grouping;
mod hierarchy;
pub(crate) mod types;
mod viewport;

pub use bounds::{LABEL_BAND_HEIGHT, compute_bounds, union_bounds};
pub use design::align_by_grouping;
pub use geometry::{
    OCTAGON_CORNER, STANDARD_HEIGHT, STANDARD_WIDTH, TypeProfile, WIDE_WIDTH, box_height,
    box_width, darken, point_in_box, point_in_octagon, team_rect,
};
pub use grouping::{
    GroupingFilter, UNGROUPED, classify_by_key, grouping_vertical_hint, inner_groupings,
    platform_grouping_names, platform_groupings, value_stream_groupings, value_stream_names,
};
pub use hierarchy::{DepartmentSlot, OrgBox, OrgChart, SubManagerSlot, align_by_hierarchy};
pub(crate) use types::Extent;
pub use types::*;
pub use viewport::{
    HitShape, fit_to_view, hit_shape, screen_to_world, team_at_point, world_to_screen, zoom_in,
    zoom_out,
};

use std::collections::HashMap;

use tracing::debug;

use crate::config::LayoutConfig;
use crate::model::{InteractionMode, OrganizationHierarchy, Position, Team, TeamType, ViewMode};

/// Writes each update's target into the matching team. Returns how many teams were found.
pub fn apply_updates(teams: &mut [Team], updates: &[PositionUpdate]) -> usize {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(teams.len());
    for (idx, team) in teams.iter().enumerate() {
        index.entry(team.name.as_str()).or_insert(idx);
    }
    let slots: Vec<(usize, Position)> = updates
        .iter()
        .filter_map(|update| index.get(update.team.as_str()).map(|idx| (*idx, update.to)))
        .collect();
    for (idx, to) in &slots {
        teams[*idx].set_pos(*to);
    }
    slots.len()
}

/// Runs the alignment that belongs to `view`.
pub fn align(
    teams: &[Team],
    org: Option<&OrganizationHierarchy>,
    view: ViewMode,
    config: &LayoutConfig,
) -> Vec<PositionUpdate> {
    match view {
        ViewMode::Current => {
            align_by_hierarchy(teams, org, &config.hierarchy, config.move_tolerance)
        }
        ViewMode::Design => align_by_grouping(teams, &config.grouping, config.move_tolerance),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamBox {
    pub name: String,
    pub team_type: TeamType,
    pub rect: Rect,
    pub shape: HitShape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupingBox {
    pub name: String,
    pub kind: GroupingKind,
    /// Outer grouping name for nested boxes.
    pub parent: Option<String>,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    Dependency,
    Interaction(InteractionMode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub start: Position,
    pub end: Position,
}

/// Everything a renderer needs to draw one view.
#[derive(Debug, Clone)]
pub struct DiagramLayout {
    pub view: ViewMode,
    pub teams: Vec<TeamBox>,
    pub groupings: Vec<GroupingBox>,
    pub inner_groupings: Vec<GroupingBox>,
    pub org_chart: Option<OrgChart>,
    pub edges: Vec<EdgeLayout>,
    pub bounds: Rect,
}

/// Collects boxes and edges at the teams' current positions. Does not move anything.
pub fn compute_layout(
    teams: &[Team],
    org: Option<&OrganizationHierarchy>,
    view: ViewMode,
    config: &LayoutConfig,
) -> DiagramLayout {
    let team_boxes: Vec<TeamBox> = teams
        .iter()
        .map(|team| TeamBox {
            name: team.name.clone(),
            team_type: team.team_type,
            rect: team_rect(team, view),
            shape: hit_shape(team, view),
        })
        .collect();

    let mut groupings = Vec::new();
    let mut inner = Vec::new();
    let mut org_chart = None;

    match view {
        ViewMode::Design => {
            let padding = config.grouping.padding;
            let label = config.grouping.label_height;
            let outer = value_stream_groupings(teams)
                .into_iter()
                .filter(|grouping| grouping.name != UNGROUPED)
                .chain(platform_groupings(teams));
            for grouping in outer {
                groupings.push(GroupingBox {
                    rect: compute_bounds(grouping.teams.iter().copied(), padding, label, view),
                    name: grouping.name,
                    kind: grouping.kind,
                    parent: None,
                });
            }
            for grouping in inner_groupings(teams) {
                let kind = match grouping.teams.first().and_then(|team| team.value_stream()) {
                    Some(_) => GroupingKind::ValueStream,
                    None => GroupingKind::Platform,
                };
                inner.push(GroupingBox {
                    rect: compute_bounds(
                        grouping.teams.iter().copied(),
                        config.grouping.inner_padding,
                        config.grouping.inner_label_height,
                        view,
                    ),
                    name: grouping.name,
                    kind,
                    parent: Some(grouping.parent),
                });
            }
        }
        ViewMode::Current => {
            org_chart = org.and_then(|org| OrgChart::build(org, &config.hierarchy));
        }
    }

    let edges = edge_layouts(teams, &team_boxes, view);

    let mut extent = Extent::empty();
    for team in &team_boxes {
        extent.include(team.rect);
    }
    for grouping in groupings.iter().chain(inner.iter()) {
        extent.include(grouping.rect);
    }
    if let Some(chart) = &org_chart {
        extent.include(chart.extent());
    }

    debug!(
        view = view.as_str(),
        teams = team_boxes.len(),
        groupings = groupings.len(),
        edges = edges.len(),
        "computed diagram layout"
    );

    DiagramLayout {
        view,
        teams: team_boxes,
        groupings,
        inner_groupings: inner,
        org_chart,
        edges,
        bounds: extent.to_rect().unwrap_or_default(),
    }
}

fn edge_layouts(teams: &[Team], boxes: &[TeamBox], view: ViewMode) -> Vec<EdgeLayout> {
    let lookup: HashMap<&str, &Rect> = boxes
        .iter()
        .map(|team_box| (team_box.name.as_str(), &team_box.rect))
        .collect();
    let mut edges = Vec::new();

    for team in teams {
        let Some(from_rect) = lookup.get(team.name.as_str()) else {
            continue;
        };
        let targets: Vec<(&str, EdgeKind)> = match view {
            ViewMode::Current => team
                .dependencies
                .iter()
                .map(|name| (name.as_str(), EdgeKind::Dependency))
                .collect(),
            ViewMode::Design => team
                .interaction_modes
                .iter()
                .map(|(name, mode)| (name.as_str(), EdgeKind::Interaction(mode.clone())))
                .collect(),
        };
        for (target, kind) in targets {
            if target == team.name {
                continue;
            }
            let Some(to_rect) = lookup.get(target) else {
                continue;
            };
            let from_center = center(from_rect);
            let to_center = center(to_rect);
            edges.push(EdgeLayout {
                from: team.name.clone(),
                to: target.to_string(),
                kind,
                start: clip_to_border(to_center, from_center, from_rect),
                end: clip_to_border(from_center, to_center, to_rect),
            });
        }
    }

    edges
}

fn center(rect: &Rect) -> Position {
    Position::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
}

/// Point where the segment from `outside` to `inside` (the center of `rect`) crosses its border.
fn clip_to_border(outside: Position, inside: Position, rect: &Rect) -> Position {
    let dx = outside.x - inside.x;
    let dy = outside.y - inside.y;
    if dx == 0.0 && dy == 0.0 {
        return inside;
    }
    let half_w = rect.width / 2.0;
    let half_h = rect.height / 2.0;
    let tx = if dx == 0.0 { f32::INFINITY } else { half_w / dx.abs() };
    let ty = if dy == 0.0 { f32::INFINITY } else { half_h / dy.abs() };
    let t = tx.min(ty).min(1.0);
    Position::new(inside.x + dx * t, inside.y + dy * t)
}
