use super::geometry::team_rect;
use super::{Extent, Rect};
use crate::model::{Team, ViewMode};

/// Label band reserved above grouping content.
pub const LABEL_BAND_HEIGHT: f32 = 35.0;

/// Smallest rectangle enclosing every member box, grown by `padding` on all sides and by
/// `label_height` above. Member sizes come from the type table, never from a nominal height.
pub fn compute_bounds<'a, I>(teams: I, padding: f32, label_height: f32, view: ViewMode) -> Rect
where
    I: IntoIterator<Item = &'a Team>,
{
    let mut extent = Extent::empty();
    for team in teams {
        extent.include(team_rect(team, view));
    }
    let Some(content) = extent.to_rect() else {
        return Rect::default();
    };
    Rect::new(
        content.x - padding,
        content.y - padding - label_height,
        content.width + 2.0 * padding,
        content.height + 2.0 * padding + label_height,
    )
}

/// Union of the member boxes without padding; `None` for no teams.
pub fn union_bounds<'a, I>(teams: I, view: ViewMode) -> Option<Rect>
where
    I: IntoIterator<Item = &'a Team>,
{
    let mut extent = Extent::empty();
    for team in teams {
        extent.include(team_rect(team, view));
    }
    extent.to_rect()
}
