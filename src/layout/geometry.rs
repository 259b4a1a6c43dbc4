use once_cell::sync::Lazy;
use regex::Regex;

use super::Rect;
use crate::model::{Team, TeamType, ViewMode};

pub const STANDARD_WIDTH: f32 = 144.0;
pub const STANDARD_HEIGHT: f32 = 80.0;
pub const WIDE_WIDTH: f32 = 560.0;
/// Corner cut of the complicated-subsystem octagon, relative to its width.
pub const OCTAGON_CORNER: f32 = 0.167;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{6}|[0-9a-fA-F]{3})$").unwrap());

/// Per-type geometry rules. Alignment and bounds both read from this one table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeProfile {
    /// Wide teams span the flow of change and stack in the band above narrow teams.
    pub wide: bool,
    /// Default horizontal placement as a fraction of a grouping's content width.
    pub default_fraction: f32,
    /// Box height in the design view.
    pub design_height: f32,
}

impl TeamType {
    pub const fn profile(self) -> TypeProfile {
        match self {
            TeamType::StreamAligned => TypeProfile {
                wide: true,
                default_fraction: 0.7,
                design_height: 64.0,
            },
            TeamType::Platform => TypeProfile {
                wide: true,
                default_fraction: 0.0,
                design_height: STANDARD_HEIGHT,
            },
            TeamType::Enabling => TypeProfile {
                wide: false,
                default_fraction: 0.35,
                design_height: 140.0,
            },
            TeamType::ComplicatedSubsystem => TypeProfile {
                wide: false,
                default_fraction: 0.2,
                design_height: 100.0,
            },
            TeamType::Undefined => TypeProfile {
                wide: false,
                default_fraction: 0.2,
                design_height: STANDARD_HEIGHT,
            },
        }
    }

    pub const fn is_wide(self) -> bool {
        self.profile().wide
    }
}

pub fn box_width(team: &Team, view: ViewMode) -> f32 {
    if view == ViewMode::Design && team.team_type.is_wide() && team.is_grouped() {
        WIDE_WIDTH
    } else {
        STANDARD_WIDTH
    }
}

pub fn box_height(team: &Team, view: ViewMode) -> f32 {
    match view {
        ViewMode::Design => team.team_type.profile().design_height,
        ViewMode::Current => STANDARD_HEIGHT,
    }
}

/// Box of a team at its current position.
pub fn team_rect(team: &Team, view: ViewMode) -> Rect {
    let pos = team.pos();
    Rect::new(pos.x, pos.y, box_width(team, view), box_height(team, view))
}

/// Closed-interval containment: edges count as inside.
pub fn point_in_box(px: f32, py: f32, box_x: f32, box_y: f32, width: f32, height: f32) -> bool {
    px >= box_x && px <= box_x + width && py >= box_y && py <= box_y + height
}

/// Box containment minus the four cut corners of an octagon inscribed in the box.
pub fn point_in_octagon(px: f32, py: f32, x: f32, y: f32, width: f32, height: f32) -> bool {
    if !point_in_box(px, py, x, y, width, height) {
        return false;
    }
    let corner = width * OCTAGON_CORNER;
    let dx = (px - x).min(x + width - px);
    let dy = (py - y).min(y + height - py);
    !(dx < corner && dy < corner && dx + dy < corner)
}

/// Scales each RGB channel by `factor` (clamped to `0..=1`). Invalid input yields `#333333`.
pub fn darken(hex: &str, factor: f32) -> String {
    let Some(caps) = HEX_COLOR_RE.captures(hex.trim()) else {
        return "#333333".to_string();
    };
    let digits = &caps[1];
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };
    let Ok(rgb) = u32::from_str_radix(&expanded, 16) else {
        return "#333333".to_string();
    };
    let factor = if factor.is_finite() {
        factor.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let scale = |channel: u32| ((channel & 0xFF) as f32 * factor).floor() as u32;
    let r = scale(rgb >> 16);
    let g = scale(rgb >> 8);
    let b = scale(rgb);
    format!("#{:06x}", (r << 16) | (g << 8) | b)
}
