use serde::Deserialize;
use team_topology_layout::render::render_svg_focused;
use team_topology_layout::theme::Theme;
use team_topology_layout::{AppState, Config, OrganizationHierarchy, Team, ViewMode};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamLayoutOptions {
    view: Option<String>,
    organization: Option<OrganizationHierarchy>,
    theme: Option<String>,
    focus: Option<String>,
    move_tolerance: Option<f32>,
    align: Option<bool>,
}

fn to_js(error: impl ToString) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_options(options_json: Option<String>) -> Result<TeamLayoutOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(to_js),
        None => Ok(TeamLayoutOptions::default()),
    }
}

fn build_state(teams_json: &str, options: &mut TeamLayoutOptions) -> Result<AppState, JsValue> {
    let teams: Vec<Team> = serde_json::from_str(teams_json).map_err(to_js)?;
    let view = match options.view.as_deref() {
        Some(raw) => ViewMode::from_token(raw)
            .ok_or_else(|| JsValue::from_str(&format!("unknown view '{raw}'")))?,
        None => ViewMode::Current,
    };
    let mut config = Config::default();
    if let Some(tolerance) = options.move_tolerance {
        config.layout.move_tolerance = tolerance.max(0.0);
    }
    Ok(AppState::new(teams, view, config.layout).with_organization(options.organization.take()))
}

/// Runs the alignment for the requested view and returns the position updates as JSON.
#[wasm_bindgen]
pub fn align_teams(teams_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let mut options = parse_options(options_json)?;
    let mut state = build_state(teams_json, &mut options)?;
    let updates = state.align();
    serde_json::to_string(&updates).map_err(to_js)
}

/// Renders the teams as SVG, optionally aligning them first.
#[wasm_bindgen]
pub fn render_teams_svg(teams_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let mut options = parse_options(options_json)?;
    let mut state = build_state(teams_json, &mut options)?;
    if options.align.unwrap_or(false) {
        state.align();
    }
    state.set_focus(options.focus.as_deref());

    let mut config = Config::default();
    if options.theme.as_deref() == Some("modern") {
        config.theme = Theme::modern();
        config.render.background = config.theme.background.clone();
    }
    let layout = state.diagram();
    Ok(render_svg_focused(
        &layout,
        &config.theme,
        &config.render,
        state.focus_set(),
    ))
}
