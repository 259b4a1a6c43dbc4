use super::geometry::{box_height, box_width, point_in_box, point_in_octagon};
use super::{CanvasSize, Extent, OrgChart, ViewTransform};
use crate::config::ViewportConfig;
use crate::model::{Position, Team, TeamType, ViewMode};

/// Outline used for hit-testing and drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitShape {
    Rectangle,
    Octagon,
}

pub fn hit_shape(team: &Team, view: ViewMode) -> HitShape {
    if view == ViewMode::Design && team.team_type == TeamType::ComplicatedSubsystem {
        HitShape::Octagon
    } else {
        HitShape::Rectangle
    }
}

/// `world = (screen - offset) / scale`
pub fn screen_to_world(px: f32, py: f32, transform: &ViewTransform) -> Position {
    Position::new(
        (px - transform.offset.x) / transform.scale,
        (py - transform.offset.y) / transform.scale,
    )
}

pub fn world_to_screen(point: Position, transform: &ViewTransform) -> Position {
    Position::new(
        point.x * transform.scale + transform.offset.x,
        point.y * transform.scale + transform.offset.y,
    )
}

/// First team in list order whose box contains the screen point.
pub fn team_at_point<'a, I>(
    teams: I,
    px: f32,
    py: f32,
    transform: &ViewTransform,
    view: ViewMode,
) -> Option<&'a Team>
where
    I: IntoIterator<Item = &'a Team>,
{
    let world = screen_to_world(px, py, transform);
    teams.into_iter().find(|team| {
        let pos = team.pos();
        let (width, height) = (box_width(team, view), box_height(team, view));
        match hit_shape(team, view) {
            HitShape::Rectangle => point_in_box(world.x, world.y, pos.x, pos.y, width, height),
            HitShape::Octagon => point_in_octagon(world.x, world.y, pos.x, pos.y, width, height),
        }
    })
}

/// Scale and offset that frame every given team (and the org chart, when drawn) inside the
/// canvas area right of the sidebar. `None` when there is nothing to frame.
pub fn fit_to_view<'a, I>(
    teams: I,
    view: ViewMode,
    org_chart: Option<&OrgChart>,
    canvas: CanvasSize,
    sidebar_width: f32,
    config: &ViewportConfig,
) -> Option<ViewTransform>
where
    I: IntoIterator<Item = &'a Team>,
{
    let mut extent = Extent::empty();
    for team in teams {
        extent.include(super::team_rect(team, view));
    }
    if extent.is_empty() {
        return None;
    }
    if view == ViewMode::Current {
        if let Some(chart) = org_chart {
            extent.include(chart.extent());
        }
    }
    let content = extent.to_rect()?;

    let available_w = canvas.width - sidebar_width - config.fit_padding;
    let available_h = canvas.height - config.fit_padding;
    let scale_x = available_w / content.width.max(1.0);
    let scale_y = available_h / content.height.max(1.0);
    let scale = scale_x.min(scale_y).min(config.max_fit_scale);
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }

    let offset = Position::new(
        sidebar_width + (canvas.width - sidebar_width - content.width * scale) / 2.0
            - content.x * scale,
        (canvas.height - content.height * scale) / 2.0 - content.y * scale,
    );
    Some(ViewTransform { scale, offset })
}

pub fn zoom_in(
    transform: &ViewTransform,
    anchor: Position,
    config: &ViewportConfig,
) -> ViewTransform {
    zoom_by(transform, anchor, config.zoom_step, config)
}

pub fn zoom_out(
    transform: &ViewTransform,
    anchor: Position,
    config: &ViewportConfig,
) -> ViewTransform {
    zoom_by(transform, anchor, 1.0 / config.zoom_step, config)
}

/// Rescales around the screen point `anchor`, which keeps pointing at the same world point.
fn zoom_by(
    transform: &ViewTransform,
    anchor: Position,
    factor: f32,
    config: &ViewportConfig,
) -> ViewTransform {
    let scale = (transform.scale * factor).clamp(config.min_scale, config.max_scale);
    let world = screen_to_world(anchor.x, anchor.y, transform);
    ViewTransform {
        scale,
        offset: Position::new(anchor.x - world.x * scale, anchor.y - world.y * scale),
    }
}
