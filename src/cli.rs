use crate::config::{Config, load_config};
use crate::layout::{CanvasSize, PositionUpdate};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::model::{OrganizationHierarchy, Team, ViewMode};
use crate::render::{render_svg_focused, write_output_svg};
use crate::state::AppState;
use crate::store::{JsonFileStore, persist_updates};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "ttlayout",
    version,
    about = "Auto-layout and export for team topology diagrams"
)]
pub struct Args {
    /// Team list (JSON array) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Organization hierarchy JSON, used by the current view
    #[arg(long = "org")]
    pub org: Option<PathBuf>,

    /// Diagram view: current (org chart) or tt (value streams and platforms)
    #[arg(long = "view", value_parser = parse_view, default_value = "current")]
    pub view: ViewMode,

    /// Run the auto-alignment for the view before exporting
    #[arg(long = "align")]
    pub align: bool,

    /// Save moved positions back into the input file
    #[arg(long = "write-back", requires = "align")]
    pub write_back: bool,

    /// Output file. Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON5 file (theme, themeVariables, layout constants)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Fade every team not directly related to this one
    #[arg(long = "focus")]
    pub focus: Option<String>,

    /// Only show teams in these value streams
    #[arg(long = "value-stream")]
    pub value_streams: Vec<String>,

    /// Only show teams in these platform groupings
    #[arg(long = "platform-grouping")]
    pub platform_groupings: Vec<String>,

    /// Also show teams without any grouping when filtering
    #[arg(long = "show-ungrouped")]
    pub show_ungrouped: bool,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

fn parse_view(raw: &str) -> Result<ViewMode, String> {
    ViewMode::from_token(raw).ok_or_else(|| format!("unknown view '{raw}' (use current or tt)"))
}

/// `RUST_LOG` when it is set and parses, `warn` otherwise.
fn log_filter(directives: Option<&str>) -> tracing_subscriber::EnvFilter {
    directives
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| tracing_subscriber::EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("warn"))
}

pub fn run() -> Result<()> {
    let directives = std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;

    let teams = read_teams(args.input.as_deref())?;
    let organization = args.org.as_deref().map(read_organization).transpose()?;

    let mut state = AppState::new(teams, args.view, config.layout.clone())
        .with_organization(organization);
    state.filter.value_streams = args.value_streams.clone();
    state.filter.platform_groupings = args.platform_groupings.clone();
    state.filter.show_ungrouped = args.show_ungrouped;

    let moved = if args.align { state.align() } else { Vec::new() };
    info!(view = args.view.as_str(), moved = moved.len(), "aligned teams");

    if let Some(name) = args.focus.as_deref() {
        state.set_focus(Some(name));
        if state.focused_team().is_none() {
            warn!(team = name, "focus team not found");
        }
    }
    state.fit_to_view(
        CanvasSize::new(config.render.width, config.render.height),
        config.render.sidebar_width,
    );

    export(&state, &moved, &args, &config)?;

    if args.write_back {
        write_back(args.input.as_deref(), state.view, &moved)?;
    }
    Ok(())
}

fn export(state: &AppState, moved: &[PositionUpdate], args: &Args, config: &Config) -> Result<()> {
    let layout = state.diagram();
    match args.output_format {
        OutputFormat::Json => {
            let dump = LayoutDump::from_layout(&layout).with_moves(moved);
            write_layout_dump(args.output.as_deref(), &dump)
        }
        OutputFormat::Svg => {
            let svg = render_svg_focused(&layout, &config.theme, &config.render, state.focus_set());
            write_output_svg(&svg, args.output.as_deref())
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render_svg_focused(&layout, &config.theme, &config.render, state.focus_set());
            write_png(&svg, &output, config)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}

fn write_back(input: Option<&Path>, view: ViewMode, moved: &[PositionUpdate]) -> Result<()> {
    let path = input
        .filter(|path| *path != Path::new("-"))
        .ok_or_else(|| anyhow::anyhow!("--write-back needs a team file, not stdin"))?;
    if moved.is_empty() {
        return Ok(());
    }
    let store = JsonFileStore::open(path)?;
    let report = persist_updates(&store, view, moved);
    if !report.is_complete() {
        return Err(anyhow::anyhow!(
            "{} of {} position writes failed",
            report.failed.len(),
            moved.len()
        ));
    }
    info!(saved = report.saved.len(), path = %path.display(), "wrote positions");
    Ok(())
}

fn read_source(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn read_teams(path: Option<&Path>) -> Result<Vec<Team>> {
    let contents = read_source(path)?;
    parse_teams(&contents)
}

fn parse_teams(contents: &str) -> Result<Vec<Team>> {
    serde_json::from_str(contents).context("team file must be a JSON array of teams")
}

fn read_organization(path: &Path) -> Result<OrganizationHierarchy> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid organization hierarchy in {}", path.display()))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
