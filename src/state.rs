use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::config::LayoutConfig;
use crate::layout::{
    self, CanvasSize, DiagramLayout, GroupingFilter, OrgChart, PositionUpdate, ViewTransform,
    screen_to_world, team_at_point,
};
use crate::model::{OrganizationHierarchy, Position, Team, ViewMode};
use crate::relationships::direct_relationships;

/// Grid used for teams loaded without a stored position.
const DEFAULT_ORIGIN: Position = Position::new(100.0, 100.0);
const DEFAULT_COLUMNS: usize = 3;
const DEFAULT_STEP_X: f32 = 250.0;
const DEFAULT_STEP_Y: f32 = 150.0;

/// Gives every team without a position (or sitting exactly on the origin) a slot on a
/// three-column grid keyed by its index in the list.
pub fn assign_default_positions(teams: &mut [Team]) -> usize {
    let mut assigned = 0;
    for (idx, team) in teams.iter_mut().enumerate() {
        let unplaced = match team.position {
            None => true,
            Some(pos) => pos.x == 0.0 && pos.y == 0.0,
        };
        if !unplaced {
            continue;
        }
        team.set_pos(Position::new(
            DEFAULT_ORIGIN.x + (idx % DEFAULT_COLUMNS) as f32 * DEFAULT_STEP_X,
            DEFAULT_ORIGIN.y + (idx / DEFAULT_COLUMNS) as f32 * DEFAULT_STEP_Y,
        ));
        assigned += 1;
    }
    assigned
}

#[derive(Debug, Clone)]
struct Snapshot {
    positions: Vec<(String, Option<Position>)>,
}

impl Snapshot {
    fn capture(teams: &[Team]) -> Self {
        Self {
            positions: teams
                .iter()
                .map(|team| (team.name.clone(), team.position))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct Drag {
    team: String,
    start: Position,
    last_world: Position,
    before: Snapshot,
}

/// Interactive state of one diagram: teams, view, pan/zoom, filters, focus, undo history and
/// the drag in progress. Layout functions only ever see what this hands them.
#[derive(Debug, Clone)]
pub struct AppState {
    pub teams: Vec<Team>,
    pub organization: Option<OrganizationHierarchy>,
    pub view: ViewMode,
    pub transform: ViewTransform,
    pub filter: GroupingFilter,
    pub config: LayoutConfig,
    history: VecDeque<Snapshot>,
    drag: Option<Drag>,
    focus: Option<(String, BTreeSet<String>)>,
}

impl AppState {
    pub fn new(mut teams: Vec<Team>, view: ViewMode, config: LayoutConfig) -> Self {
        let placed = assign_default_positions(&mut teams);
        if placed > 0 {
            debug!(placed, "assigned default positions");
        }
        Self {
            teams,
            organization: None,
            view,
            transform: ViewTransform::default(),
            filter: GroupingFilter::default(),
            config,
            history: VecDeque::new(),
            drag: None,
            focus: None,
        }
    }

    pub fn with_organization(mut self, organization: Option<OrganizationHierarchy>) -> Self {
        self.organization = organization;
        self
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.name == name)
    }

    pub fn visible_teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter().filter(|team| self.filter.matches(team))
    }

    /// Boxes and edges of the visible teams at their current positions.
    pub fn diagram(&self) -> DiagramLayout {
        let visible: Vec<Team> = self.visible_teams().cloned().collect();
        layout::compute_layout(
            &visible,
            self.organization.as_ref(),
            self.view,
            &self.config,
        )
    }

    pub fn org_chart(&self) -> Option<OrgChart> {
        self.organization
            .as_ref()
            .and_then(|org| OrgChart::build(org, &self.config.hierarchy))
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn push_history(&mut self) {
        self.push_snapshot(Snapshot::capture(&self.teams));
    }

    fn push_snapshot(&mut self, snapshot: Snapshot) {
        let limit = self.config.viewport.history_size;
        if limit == 0 {
            return;
        }
        self.history.push_back(snapshot);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }

    /// Runs the alignment for the active view, applies it and returns the updates to persist.
    pub fn align(&mut self) -> Vec<PositionUpdate> {
        let updates = layout::align(
            &self.teams,
            self.organization.as_ref(),
            self.view,
            &self.config,
        );
        if updates.is_empty() {
            return updates;
        }
        self.push_history();
        layout::apply_updates(&mut self.teams, &updates);
        updates
    }

    /// Restores the last snapshot. Returns the updates that revert the current positions.
    pub fn undo(&mut self) -> Vec<PositionUpdate> {
        let Some(snapshot) = self.history.pop_back() else {
            return Vec::new();
        };
        let mut updates = Vec::new();
        for (name, previous) in snapshot.positions {
            let Some(team) = self.teams.iter_mut().find(|team| team.name == name) else {
                continue;
            };
            if team.position == previous {
                continue;
            }
            updates.push(PositionUpdate {
                team: name,
                from: team.pos(),
                to: previous.unwrap_or_default(),
            });
            team.position = previous;
        }
        debug!(reverted = updates.len(), "undo");
        updates
    }

    /// Starts dragging the visible team under the screen point, if any.
    pub fn begin_drag(&mut self, px: f32, py: f32) -> Option<String> {
        let hit = team_at_point(self.visible_teams(), px, py, &self.transform, self.view)?;
        let name = hit.name.clone();
        let start = hit.pos();
        self.drag = Some(Drag {
            team: name.clone(),
            start,
            last_world: screen_to_world(px, py, &self.transform),
            before: Snapshot::capture(&self.teams),
        });
        Some(name)
    }

    /// Moves the dragged team by the world-space pointer delta.
    pub fn drag_to(&mut self, px: f32, py: f32) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let world = screen_to_world(px, py, &self.transform);
        let (dx, dy) = (world.x - drag.last_world.x, world.y - drag.last_world.y);
        drag.last_world = world;
        if let Some(team) = self.teams.iter_mut().find(|team| team.name == drag.team) {
            let pos = team.pos();
            team.set_pos(Position::new(pos.x + dx, pos.y + dy));
        }
    }

    /// Finishes the drag and returns the single update to persist, if the team moved.
    /// Only a drag that moved the team becomes an undo step.
    pub fn end_drag(&mut self) -> Option<PositionUpdate> {
        let drag = self.drag.take()?;
        let to = self.team(&drag.team)?.pos();
        if to == drag.start {
            return None;
        }
        self.push_snapshot(drag.before);
        Some(PositionUpdate {
            team: drag.team,
            from: drag.start,
            to,
        })
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Focus on `name`; `None` or an unknown team clears focus.
    pub fn set_focus(&mut self, name: Option<&str>) {
        self.focus = name
            .and_then(|name| self.team(name))
            .map(|team| (team.name.clone(), direct_relationships(team, &self.teams)));
    }

    pub fn focused_team(&self) -> Option<&str> {
        self.focus.as_ref().map(|(name, _)| name.as_str())
    }

    /// Teams drawn at full strength while a focus is active.
    pub fn focus_set(&self) -> Option<&BTreeSet<String>> {
        self.focus.as_ref().map(|(_, related)| related)
    }

    /// True when a focus is active and `name` is not one hop from it.
    pub fn is_dimmed(&self, name: &str) -> bool {
        match &self.focus {
            Some((_, related)) => !related.contains(name),
            None => false,
        }
    }

    /// Frames the visible teams. Leaves the transform alone when nothing is visible.
    pub fn fit_to_view(&mut self, canvas: CanvasSize, sidebar_width: f32) -> bool {
        let chart = self.org_chart();
        let fit = layout::fit_to_view(
            self.visible_teams(),
            self.view,
            chart.as_ref(),
            canvas,
            sidebar_width,
            &self.config.viewport,
        );
        match fit {
            Some(transform) => {
                self.transform = transform;
                true
            }
            None => false,
        }
    }

    pub fn zoom_in(&mut self, anchor: Position) {
        self.transform = layout::zoom_in(&self.transform, anchor, &self.config.viewport);
    }

    pub fn zoom_out(&mut self, anchor: Position) {
        self.transform = layout::zoom_out(&self.transform, anchor, &self.config.viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TeamType;

    fn state(teams: Vec<Team>, view: ViewMode) -> AppState {
        AppState::new(teams, view, LayoutConfig::default())
    }

    #[test]
    fn default_positions_fill_three_columns() {
        let mut teams = vec![
            Team::new("A", TeamType::Platform),
            Team::new("B", TeamType::Platform).at(0.0, 0.0),
            Team::new("C", TeamType::Platform).at(7.0, 0.0),
            Team::new("D", TeamType::Platform),
        ];
        assert_eq!(assign_default_positions(&mut teams), 3);
        assert_eq!(teams[0].pos(), Position::new(100.0, 100.0));
        assert_eq!(teams[1].pos(), Position::new(350.0, 100.0));
        assert_eq!(teams[2].pos(), Position::new(7.0, 0.0));
        assert_eq!(teams[3].pos(), Position::new(100.0, 250.0));
    }

    #[test]
    fn align_then_undo_restores_positions() {
        let mut app = state(
            vec![
                Team::new("A", TeamType::StreamAligned)
                    .in_value_stream("Shop")
                    .at(5000.0, 5000.0),
                Team::new("B", TeamType::Enabling).at(10.0, 10.0),
            ],
            ViewMode::Design,
        );
        let updates = app.align();
        assert_eq!(updates.len(), 2);
        assert_eq!(app.history_len(), 1);
        assert!(app.align().is_empty());
        assert_eq!(app.history_len(), 1);

        let reverted = app.undo();
        assert_eq!(reverted.len(), 2);
        assert_eq!(app.team("A").unwrap().pos(), Position::new(5000.0, 5000.0));
        assert!(app.undo().is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let mut config = LayoutConfig::default();
        config.viewport.history_size = 2;
        let mut app = AppState::new(
            vec![Team::new("A", TeamType::Platform).at(10.0, 10.0)],
            ViewMode::Current,
            config,
        );
        for _ in 0..5 {
            assert!(app.begin_drag(50.0, 50.0).is_some());
            app.drag_to(60.0, 50.0);
            assert!(app.end_drag().is_some());
        }
        assert_eq!(app.history_len(), 2);
    }

    #[test]
    fn click_on_full_history_keeps_oldest_step() {
        let mut config = LayoutConfig::default();
        config.viewport.history_size = 2;
        let mut app = AppState::new(
            vec![Team::new("A", TeamType::Platform).at(10.0, 10.0)],
            ViewMode::Current,
            config,
        );
        for target in [60.0, 110.0] {
            assert!(app.begin_drag(target - 40.0, 50.0).is_some());
            app.drag_to(target, 50.0);
            assert!(app.end_drag().is_some());
        }
        assert_eq!(app.team("A").unwrap().pos(), Position::new(90.0, 10.0));

        assert!(app.begin_drag(150.0, 50.0).is_some());
        assert!(app.end_drag().is_none());
        assert_eq!(app.history_len(), 2);

        app.undo();
        assert_eq!(app.team("A").unwrap().pos(), Position::new(50.0, 10.0));
        app.undo();
        assert_eq!(app.team("A").unwrap().pos(), Position::new(10.0, 10.0));
    }

    #[test]
    fn drag_moves_by_world_delta() {
        let mut app = state(
            vec![Team::new("A", TeamType::Platform).at(100.0, 100.0)],
            ViewMode::Current,
        );
        app.transform = ViewTransform {
            scale: 2.0,
            offset: Position::new(0.0, 0.0),
        };
        assert_eq!(app.begin_drag(210.0, 210.0).as_deref(), Some("A"));
        assert!(app.is_dragging());
        app.drag_to(250.0, 230.0);
        app.drag_to(270.0, 250.0);
        let update = app.end_drag().unwrap();
        assert_eq!(update.from, Position::new(100.0, 100.0));
        assert_eq!(update.to, Position::new(130.0, 120.0));
        assert!(!app.is_dragging());
    }

    #[test]
    fn click_without_move_is_not_persisted() {
        let mut app = state(
            vec![Team::new("A", TeamType::Platform).at(100.0, 100.0)],
            ViewMode::Current,
        );
        app.begin_drag(110.0, 110.0);
        assert!(app.end_drag().is_none());
        assert_eq!(app.history_len(), 0);
        assert!(app.begin_drag(10.0, 10.0).is_none());
    }

    #[test]
    fn hidden_teams_are_not_draggable() {
        let mut app = state(
            vec![
                Team::new("Hidden", TeamType::Platform)
                    .in_platform_grouping("Data")
                    .at(100.0, 100.0),
                Team::new("Shown", TeamType::Platform)
                    .in_value_stream("Shop")
                    .at(100.0, 100.0),
            ],
            ViewMode::Current,
        );
        app.filter.value_streams.push("Shop".to_string());
        assert_eq!(app.begin_drag(110.0, 110.0).as_deref(), Some("Shown"));
    }

    #[test]
    fn focus_dims_unrelated_teams() {
        let mut app = state(
            vec![
                Team::new("A", TeamType::StreamAligned).depends_on("B"),
                Team::new("B", TeamType::Platform).depends_on("C"),
                Team::new("C", TeamType::Platform),
            ],
            ViewMode::Current,
        );
        assert!(!app.is_dimmed("C"));
        app.set_focus(Some("A"));
        assert_eq!(app.focused_team(), Some("A"));
        assert!(!app.is_dimmed("B"));
        assert!(app.is_dimmed("C"));
        assert_eq!(app.focus_set().map(|set| set.len()), Some(2));
        app.set_focus(Some("Nobody"));
        assert!(app.focused_team().is_none());
        assert!(!app.is_dimmed("C"));
    }

    #[test]
    fn fit_to_view_uses_visible_teams() {
        let mut app = state(
            vec![
                Team::new("Near", TeamType::Platform)
                    .in_value_stream("Shop")
                    .at(0.0, 0.0),
                Team::new("Far", TeamType::Platform).at(10000.0, 10000.0),
            ],
            ViewMode::Current,
        );
        app.filter.value_streams.push("Shop".to_string());
        assert_eq!(app.diagram().teams.len(), 1);
        assert!(app.fit_to_view(CanvasSize::new(1200.0, 800.0), 0.0));
        assert_eq!(app.transform.scale, 1.5);

        app.filter.value_streams = vec!["Nothing".to_string()];
        let before = app.transform;
        assert!(!app.fit_to_view(CanvasSize::new(1200.0, 800.0), 0.0));
        assert_eq!(app.transform, before);
    }

    #[test]
    fn zoom_round_trip_returns_to_scale() {
        let mut app = state(Vec::new(), ViewMode::Design);
        let anchor = Position::new(300.0, 200.0);
        app.zoom_in(anchor);
        app.zoom_out(anchor);
        assert!((app.transform.scale - 1.0).abs() < 1e-5);
    }
}
