use std::collections::HashSet;

use tracing::debug;

use super::geometry::{box_height, box_width};
use super::grouping::{
    UNGROUPED, grouping_vertical_hint, platform_groupings, value_stream_groupings,
};
use super::{Grouping, PositionUpdate};
use crate::config::GroupingLayoutConfig;
use crate::model::{Position, Team, VerticalHint, ViewMode};

const VIEW: ViewMode = ViewMode::Design;

/// Accumulates targets; a team keeps the first target it is given.
struct Placement<'a> {
    tolerance: f32,
    placed: HashSet<&'a str>,
    updates: Vec<PositionUpdate>,
}

impl<'a> Placement<'a> {
    fn new(tolerance: f32) -> Self {
        Self {
            tolerance,
            placed: HashSet::new(),
            updates: Vec::new(),
        }
    }

    fn is_placed(&self, team: &Team) -> bool {
        self.placed.contains(team.name.as_str())
    }

    fn place(&mut self, team: &'a Team, target: Position) {
        if !self.placed.insert(team.name.as_str()) {
            return;
        }
        let current = team.pos();
        if target.differs_from(&current, self.tolerance) {
            self.updates.push(PositionUpdate {
                team: team.name.clone(),
                from: current,
                to: target,
            });
        }
    }
}

/// Horizontal rule for one laid-out area.
#[derive(Clone, Copy)]
struct Area {
    left: f32,
    width: f32,
    /// Inside groupings the team type picks a default column; the ungrouped area only honours hints.
    type_defaults: bool,
}

impl Area {
    fn preferred_x(&self, team: &Team) -> f32 {
        let fraction = match team.hint_x() {
            Some(hint) => hint.fraction(),
            None if self.type_defaults => team.team_type.profile().default_fraction,
            None => 0.0,
        };
        self.left + fraction * self.width
    }
}

/// Lays out value-stream and platform groupings on a grid, then the ungrouped teams in their
/// own area to the right of it.
///
/// Returns one update per team whose target differs from its position by more than
/// `tolerance` on either axis. A team in both a value stream and a platform grouping is placed
/// with the first grouping that reaches it.
pub fn align_by_grouping(
    teams: &[Team],
    config: &GroupingLayoutConfig,
    tolerance: f32,
) -> Vec<PositionUpdate> {
    if teams.is_empty() {
        return Vec::new();
    }

    let value_streams: Vec<Grouping<'_>> = value_stream_groupings(teams)
        .into_iter()
        .filter(|grouping| grouping.name != UNGROUPED)
        .collect();
    let platforms = platform_groupings(teams);

    let mut top: Vec<&Grouping<'_>> = Vec::new();
    let mut bottom: Vec<&Grouping<'_>> = Vec::new();
    for grouping in &value_streams {
        match grouping_vertical_hint(grouping) {
            Some(VerticalHint::Bottom) => bottom.push(grouping),
            _ => top.push(grouping),
        }
    }
    for grouping in &platforms {
        match grouping_vertical_hint(grouping) {
            Some(VerticalHint::Top) => top.push(grouping),
            _ => bottom.push(grouping),
        }
    }

    let mut placement = Placement::new(tolerance);
    let mut grid = Grid::new(config);
    for grouping in top {
        grid.place_grouping(grouping, &mut placement);
    }
    grid.break_row();
    for grouping in bottom {
        grid.place_grouping(grouping, &mut placement);
    }
    grid.break_row();
    let grid_bottom = grid.y;

    let ungrouped: Vec<&Team> = teams.iter().filter(|team| !team.is_grouped()).collect();
    layout_ungrouped(&ungrouped, grid_bottom, config, &mut placement);

    debug!(
        groupings = value_streams.len() + platforms.len(),
        ungrouped = ungrouped.len(),
        moved = placement.updates.len(),
        "grouping alignment finished"
    );
    placement.updates
}

struct Grid<'c> {
    config: &'c GroupingLayoutConfig,
    y: f32,
    column: usize,
    row_height: f32,
}

impl<'c> Grid<'c> {
    fn new(config: &'c GroupingLayoutConfig) -> Self {
        Self {
            config,
            y: config.start_y,
            column: 0,
            row_height: 0.0,
        }
    }

    fn place_grouping<'a>(&mut self, grouping: &Grouping<'a>, placement: &mut Placement<'a>) {
        let members: Vec<&'a Team> = grouping
            .teams
            .iter()
            .copied()
            .filter(|team| !placement.is_placed(team))
            .collect();
        if members.is_empty() {
            debug!(grouping = %grouping.name, "every member already placed, skipping grouping");
            return;
        }

        let cfg = self.config;
        let x = cfg.start_x + self.column as f32 * cfg.grouping_spacing_x;
        let height = layout_grouping(&members, x, self.y, cfg, placement);
        debug!(
            grouping = %grouping.name,
            kind = ?grouping.kind,
            members = members.len(),
            x,
            y = self.y,
            height,
            "placed grouping"
        );
        self.row_height = self.row_height.max(height);
        self.column += 1;
        if self.column >= cfg.groupings_per_row.max(1) {
            self.break_row();
        }
    }

    fn break_row(&mut self) {
        if self.column == 0 {
            return;
        }
        self.y += self.row_height + self.config.grouping_spacing_y;
        self.column = 0;
        self.row_height = 0.0;
    }
}

/// Places one grouping's members with the grouping's top-left corner at `(x, y)` and returns
/// the grouping height.
fn layout_grouping<'a>(
    members: &[&'a Team],
    x: f32,
    y: f32,
    config: &GroupingLayoutConfig,
    placement: &mut Placement<'a>,
) -> f32 {
    let area = Area {
        left: x + config.padding,
        width: config.content_width(),
        type_defaults: true,
    };
    let top = y + config.padding + config.label_height;
    let cursor = stack_sections(members, area, top, config, placement);
    cursor - y + config.bottom_spacing + config.padding
}

/// Wide members stacked in a band, narrow members in wrapping rows below it.
/// Returns the bottom edge of the last placed box.
fn stack_sections<'a>(
    members: &[&'a Team],
    area: Area,
    top: f32,
    config: &GroupingLayoutConfig,
    placement: &mut Placement<'a>,
) -> f32 {
    let (wide, narrow): (Vec<&'a Team>, Vec<&'a Team>) = members
        .iter()
        .copied()
        .partition(|team| team.team_type.is_wide());

    let mut cursor = top;
    if !wide.is_empty() {
        for &team in &wide {
            placement.place(team, Position::new(area.preferred_x(team), cursor));
            cursor += box_height(team, VIEW) + config.wide_team_gap;
        }
        cursor -= config.wide_team_gap;
    }

    if narrow.is_empty() {
        return cursor;
    }
    if !wide.is_empty() {
        cursor += config.section_gap + config.padding;
    }

    let right = area.left + area.width;
    for row in narrow.chunks(config.narrow_per_row.max(1)) {
        let widths: Vec<f32> = row.iter().map(|team| box_width(team, VIEW)).collect();
        let mut next_free = area.left;
        let mut row_height: f32 = 0.0;
        for (idx, &team) in row.iter().enumerate() {
            let remaining: f32 = widths[idx..].iter().sum::<f32>()
                + (row.len() - idx - 1) as f32 * config.narrow_column_gap;
            let x = area
                .preferred_x(team)
                .max(next_free)
                .min(right - remaining)
                .max(next_free);
            placement.place(team, Position::new(x, cursor));
            next_free = x + widths[idx] + config.narrow_column_gap;
            row_height = row_height.max(box_height(team, VIEW));
        }
        cursor += row_height + config.narrow_row_gap;
    }
    cursor - config.narrow_row_gap
}

fn layout_ungrouped<'a>(
    teams: &[&'a Team],
    grid_bottom: f32,
    config: &GroupingLayoutConfig,
    placement: &mut Placement<'a>,
) {
    if teams.is_empty() {
        return;
    }
    let area = Area {
        left: config.ungrouped_x(),
        width: config.content_width(),
        type_defaults: false,
    };
    let (bottom, top): (Vec<&'a Team>, Vec<&'a Team>) = teams
        .iter()
        .copied()
        .partition(|team| team.hint_y() == Some(VerticalHint::Bottom));

    let mut top_bottom = config.start_y;
    if !top.is_empty() {
        top_bottom = stack_sections(&top, area, config.start_y, config, placement);
    }
    if !bottom.is_empty() {
        let start = grid_bottom.max(top_bottom + config.grouping_spacing_y);
        stack_sections(&bottom, area, start, config, placement);
    }
    debug!(
        top = top.len(),
        bottom = bottom.len(),
        x = area.left,
        "placed ungrouped teams"
    );
}
