use crate::layout::darken;
use crate::model::{InteractionMode, TeamType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f32,
    pub corner_radius: f32,
    pub label_color: String,
    pub label_font_size: f32,
    pub label_padding: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: String,
    pub width: f32,
    pub dasharray: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub text_color: String,
    pub line_color: String,
    pub stream_aligned_color: String,
    pub platform_color: String,
    pub enabling_color: String,
    pub complicated_subsystem_color: String,
    pub undefined_color: String,
    pub border_darken_factor: f32,
    pub border_width: f32,
    pub org_box_fill: String,
    pub org_sub_box_fill: String,
    pub org_sub_box_text: String,
    pub value_stream: GroupingStyle,
    pub platform_grouping: GroupingStyle,
    pub inner_grouping: GroupingStyle,
    pub collaboration: LineStyle,
    pub x_as_a_service: LineStyle,
    pub facilitating: LineStyle,
}

impl Theme {
    /// Team Topologies book palette.
    pub fn classic() -> Self {
        Self {
            font_family: "Arial, sans-serif".to_string(),
            font_size: 13.0,
            background: "#FFFFFF".to_string(),
            text_color: "#222222".to_string(),
            line_color: "#666666".to_string(),
            stream_aligned_color: "#FFEDB8".to_string(),
            platform_color: "#B7CDF1".to_string(),
            enabling_color: "#DFBDCF".to_string(),
            complicated_subsystem_color: "#FFC08B".to_string(),
            undefined_color: "#EEEEEE".to_string(),
            border_darken_factor: 0.7,
            border_width: 3.0,
            org_box_fill: "#E8E8E8".to_string(),
            org_sub_box_fill: "#A0A0A0".to_string(),
            org_sub_box_text: "#FFFFFF".to_string(),
            value_stream: GroupingStyle {
                fill: "rgba(255, 245, 215, 0.4)".to_string(),
                stroke: "rgba(255, 200, 130, 0.5)".to_string(),
                stroke_width: 2.0,
                corner_radius: 10.0,
                label_color: "#666666".to_string(),
                label_font_size: 16.0,
                label_padding: 10.0,
            },
            platform_grouping: GroupingStyle {
                fill: "rgba(126, 200, 227, 0.15)".to_string(),
                stroke: "rgba(74, 159, 216, 0.4)".to_string(),
                stroke_width: 2.0,
                corner_radius: 10.0,
                label_color: "#666666".to_string(),
                label_font_size: 16.0,
                label_padding: 10.0,
            },
            inner_grouping: GroupingStyle {
                fill: "rgba(255, 255, 255, 0.35)".to_string(),
                stroke: "rgba(120, 120, 120, 0.4)".to_string(),
                stroke_width: 1.0,
                corner_radius: 6.0,
                label_color: "#777777".to_string(),
                label_font_size: 11.0,
                label_padding: 6.0,
            },
            collaboration: LineStyle {
                color: "#7A5FA6".to_string(),
                width: 2.0,
                dasharray: None,
            },
            x_as_a_service: LineStyle {
                color: "#222222".to_string(),
                width: 1.0,
                dasharray: Some("10 5".to_string()),
            },
            facilitating: LineStyle {
                color: "#6FA98C".to_string(),
                width: 0.5,
                dasharray: Some("5 5".to_string()),
            },
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            background: "#FBFCFE".to_string(),
            text_color: "#1C2430".to_string(),
            line_color: "#7A8AA6".to_string(),
            border_width: 2.0,
            org_box_fill: "#EEF2F8".to_string(),
            org_sub_box_fill: "#7A8AA6".to_string(),
            ..Self::classic()
        }
    }

    pub fn team_fill(&self, team_type: TeamType) -> &str {
        match team_type {
            TeamType::StreamAligned => &self.stream_aligned_color,
            TeamType::Platform => &self.platform_color,
            TeamType::Enabling => &self.enabling_color,
            TeamType::ComplicatedSubsystem => &self.complicated_subsystem_color,
            TeamType::Undefined => &self.undefined_color,
        }
    }

    pub fn team_border(&self, team_type: TeamType) -> String {
        darken(self.team_fill(team_type), self.border_darken_factor)
    }

    pub fn interaction_style(&self, mode: &InteractionMode) -> &LineStyle {
        match mode {
            InteractionMode::Collaboration => &self.collaboration,
            InteractionMode::XAsAService | InteractionMode::Other(_) => &self.x_as_a_service,
            InteractionMode::Facilitating => &self.facilitating,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borders_are_darker_than_fills() {
        let theme = Theme::classic();
        assert_eq!(theme.team_border(TeamType::Undefined), "#a6a6a6");
        assert_eq!(theme.team_border(TeamType::Platform), "#808fa8");
    }

    #[test]
    fn unknown_interaction_modes_render_as_service() {
        let theme = Theme::modern();
        let style = theme.interaction_style(&InteractionMode::Other("pairing".to_string()));
        assert_eq!(style.dasharray.as_deref(), Some("10 5"));
    }
}
