use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: json5::Error,
    },
}

/// Org-chart geometry shared by the hierarchy alignment, the renderer and fit-to-view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyLayoutConfig {
    pub company_x: f32,
    pub company_y: f32,
    pub level_height: f32,
    pub vertical_spacing: f32,
    pub dept_start_x: f32,
    pub dept_spacing: f32,
    pub sub_manager_spacing: f32,
    pub dept_box_width: f32,
    pub dept_box_height: f32,
    pub company_box_width: f32,
    pub company_box_height: f32,
    pub team_x_offset: f32,
    pub connector_x_offset: f32,
}

impl Default for HierarchyLayoutConfig {
    fn default() -> Self {
        Self {
            company_x: 550.0,
            company_y: 50.0,
            level_height: 120.0,
            vertical_spacing: 120.0,
            dept_start_x: 550.0,
            dept_spacing: 230.0,
            sub_manager_spacing: 180.0,
            dept_box_width: 200.0,
            dept_box_height: 80.0,
            company_box_width: 300.0,
            company_box_height: 80.0,
            team_x_offset: 2.0 / 5.0,
            connector_x_offset: 1.0 / 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingLayoutConfig {
    pub start_x: f32,
    pub start_y: f32,
    pub grouping_width: f32,
    pub grouping_spacing_x: f32,
    pub grouping_spacing_y: f32,
    pub groupings_per_row: usize,
    pub padding: f32,
    pub label_height: f32,
    pub wide_team_gap: f32,
    pub section_gap: f32,
    pub narrow_per_row: usize,
    pub narrow_column_gap: f32,
    pub narrow_row_gap: f32,
    pub bottom_spacing: f32,
    pub ungrouped_gap: f32,
    pub inner_padding: f32,
    pub inner_label_height: f32,
}

impl GroupingLayoutConfig {
    pub fn content_width(&self) -> f32 {
        (self.grouping_width - 2.0 * self.padding).max(0.0)
    }

    pub fn ungrouped_x(&self) -> f32 {
        self.start_x + self.groupings_per_row.max(1) as f32 * self.grouping_spacing_x
    }
}

impl Default for GroupingLayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 100.0,
            start_y: 100.0,
            grouping_width: 800.0,
            grouping_spacing_x: 1250.0,
            grouping_spacing_y: 50.0,
            groupings_per_row: 2,
            padding: 30.0,
            label_height: 35.0,
            wide_team_gap: 60.0,
            section_gap: 20.0,
            narrow_per_row: 3,
            narrow_column_gap: 40.0,
            narrow_row_gap: 40.0,
            bottom_spacing: 40.0,
            ungrouped_gap: 40.0,
            inner_padding: 15.0,
            inner_label_height: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub fit_padding: f32,
    pub max_fit_scale: f32,
    pub zoom_step: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub history_size: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            fit_padding: 40.0,
            max_fit_scale: 1.5,
            zoom_step: 1.2,
            min_scale: 0.1,
            max_scale: 3.0,
            history_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Position changes at or below this many pixels (per axis) are not reported as moves.
    pub move_tolerance: f32,
    pub hierarchy: HierarchyLayoutConfig,
    pub grouping: GroupingLayoutConfig,
    pub viewport: ViewportConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            move_tolerance: 5.0,
            hierarchy: HierarchyLayoutConfig::default(),
            grouping: GroupingLayoutConfig::default(),
            viewport: ViewportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub margin: f32,
    pub sidebar_width: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
            margin: 20.0,
            sidebar_width: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    text_color: Option<String>,
    line_color: Option<String>,
    stream_aligned_color: Option<String>,
    platform_color: Option<String>,
    enabling_color: Option<String>,
    complicated_subsystem_color: Option<String>,
    undefined_color: Option<String>,
    border_darken_factor: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct HierarchyConfigFile {
    company_x: Option<f32>,
    company_y: Option<f32>,
    level_height: Option<f32>,
    vertical_spacing: Option<f32>,
    dept_start_x: Option<f32>,
    dept_spacing: Option<f32>,
    sub_manager_spacing: Option<f32>,
    dept_box_width: Option<f32>,
    dept_box_height: Option<f32>,
    team_x_offset: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GroupingConfigFile {
    start_x: Option<f32>,
    start_y: Option<f32>,
    grouping_width: Option<f32>,
    grouping_spacing_x: Option<f32>,
    grouping_spacing_y: Option<f32>,
    groupings_per_row: Option<usize>,
    padding: Option<f32>,
    label_height: Option<f32>,
    wide_team_gap: Option<f32>,
    section_gap: Option<f32>,
    narrow_per_row: Option<usize>,
    narrow_column_gap: Option<f32>,
    narrow_row_gap: Option<f32>,
    bottom_spacing: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ViewportConfigFile {
    fit_padding: Option<f32>,
    max_fit_scale: Option<f32>,
    zoom_step: Option<f32>,
    history_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    move_tolerance: Option<f32>,
    hierarchy: Option<HierarchyConfigFile>,
    grouping: Option<GroupingConfigFile>,
    viewport: Option<ViewportConfigFile>,
    sidebar_width: Option<f32>,
    margin: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn parse_config(contents: &str) -> Result<Config, json5::Error> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "default" || theme_name == "classic" {
            config.theme = Theme::classic();
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.stream_aligned_color {
            config.theme.stream_aligned_color = v;
        }
        if let Some(v) = vars.platform_color {
            config.theme.platform_color = v;
        }
        if let Some(v) = vars.enabling_color {
            config.theme.enabling_color = v;
        }
        if let Some(v) = vars.complicated_subsystem_color {
            config.theme.complicated_subsystem_color = v;
        }
        if let Some(v) = vars.undefined_color {
            config.theme.undefined_color = v;
        }
        if let Some(v) = vars.border_darken_factor {
            config.theme.border_darken_factor = v;
        }
    }

    if let Some(v) = parsed.move_tolerance {
        config.layout.move_tolerance = v.max(0.0);
    }

    if let Some(h) = parsed.hierarchy {
        let cfg = &mut config.layout.hierarchy;
        if let Some(v) = h.company_x {
            cfg.company_x = v;
        }
        if let Some(v) = h.company_y {
            cfg.company_y = v;
        }
        if let Some(v) = h.level_height {
            cfg.level_height = v;
        }
        if let Some(v) = h.vertical_spacing {
            cfg.vertical_spacing = v;
        }
        if let Some(v) = h.dept_start_x {
            cfg.dept_start_x = v;
        }
        if let Some(v) = h.dept_spacing {
            cfg.dept_spacing = v;
        }
        if let Some(v) = h.sub_manager_spacing {
            cfg.sub_manager_spacing = v;
        }
        if let Some(v) = h.dept_box_width {
            cfg.dept_box_width = v;
        }
        if let Some(v) = h.dept_box_height {
            cfg.dept_box_height = v;
        }
        if let Some(v) = h.team_x_offset {
            cfg.team_x_offset = v;
        }
    }

    if let Some(g) = parsed.grouping {
        let cfg = &mut config.layout.grouping;
        if let Some(v) = g.start_x {
            cfg.start_x = v;
        }
        if let Some(v) = g.start_y {
            cfg.start_y = v;
        }
        if let Some(v) = g.grouping_width {
            cfg.grouping_width = v;
        }
        if let Some(v) = g.grouping_spacing_x {
            cfg.grouping_spacing_x = v;
        }
        if let Some(v) = g.grouping_spacing_y {
            cfg.grouping_spacing_y = v;
        }
        if let Some(v) = g.groupings_per_row {
            cfg.groupings_per_row = v.max(1);
        }
        if let Some(v) = g.padding {
            cfg.padding = v;
        }
        if let Some(v) = g.label_height {
            cfg.label_height = v;
        }
        if let Some(v) = g.wide_team_gap {
            cfg.wide_team_gap = v;
        }
        if let Some(v) = g.section_gap {
            cfg.section_gap = v;
        }
        if let Some(v) = g.narrow_per_row {
            cfg.narrow_per_row = v.max(1);
        }
        if let Some(v) = g.narrow_column_gap {
            cfg.narrow_column_gap = v;
        }
        if let Some(v) = g.narrow_row_gap {
            cfg.narrow_row_gap = v;
        }
        if let Some(v) = g.bottom_spacing {
            cfg.bottom_spacing = v;
        }
    }

    if let Some(vp) = parsed.viewport {
        let cfg = &mut config.layout.viewport;
        if let Some(v) = vp.fit_padding {
            cfg.fit_padding = v;
        }
        if let Some(v) = vp.max_fit_scale {
            cfg.max_fit_scale = v;
        }
        if let Some(v) = vp.zoom_step {
            cfg.zoom_step = v;
        }
        if let Some(v) = vp.history_size {
            cfg.history_size = v;
        }
    }

    if let Some(v) = parsed.sidebar_width {
        config.render.sidebar_width = v.max(0.0);
    }
    if let Some(v) = parsed.margin {
        config.render.margin = v.max(0.0);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_place_ungrouped_area_right_of_grid() {
        let cfg = GroupingLayoutConfig::default();
        assert_eq!(cfg.content_width(), 740.0);
        assert_eq!(cfg.ungrouped_x(), 100.0 + 2.0 * 1250.0);
    }

    #[test]
    fn parses_json5_overrides() {
        let config = parse_config(
            r##"{
                // comments are allowed
                theme: "modern",
                themeVariables: { platformColor: "#123456", fontSize: 11 },
                moveTolerance: 2,
                grouping: { groupingsPerRow: 0, padding: 20 },
                hierarchy: { deptSpacing: 300 },
                sidebarWidth: 320,
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.platform_color, "#123456");
        assert_eq!(config.theme.font_size, 11.0);
        assert_eq!(config.layout.move_tolerance, 2.0);
        assert_eq!(config.layout.grouping.groupings_per_row, 1);
        assert_eq!(config.layout.grouping.padding, 20.0);
        assert_eq!(config.layout.hierarchy.dept_spacing, 300.0);
        assert_eq!(config.render.sidebar_width, 320.0);
        assert_eq!(config.render.background, Theme::modern().background);
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.move_tolerance, 5.0);
        assert_eq!(config.layout.grouping.groupings_per_row, 2);
    }

    #[test]
    fn unreadable_path_reports_path() {
        let err = load_config(Some(Path::new("/nonexistent/ttlayout.json5"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ttlayout.json5"));
    }
}
