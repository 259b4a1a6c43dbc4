use crate::config::RenderConfig;
use crate::layout::{
    DiagramLayout, EdgeKind, EdgeLayout, GroupingBox, GroupingKind, HitShape, OCTAGON_CORNER,
    OrgChart, Rect, TeamBox,
};
use crate::model::{TeamType, ViewMode};
use crate::theme::{GroupingStyle, Theme};
use anyhow::Result;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

const DIMMED_OPACITY: f32 = 0.25;
/// Rough glyph advance as a fraction of the font size, used for wrapping.
const CHAR_WIDTH_RATIO: f32 = 0.6;

pub fn render_svg(layout: &DiagramLayout, theme: &Theme, config: &RenderConfig) -> String {
    render_svg_focused(layout, theme, config, None)
}

/// Renders the diagram; teams outside `related` (when given) are drawn faded.
pub fn render_svg_focused(
    layout: &DiagramLayout,
    theme: &Theme,
    config: &RenderConfig,
    related: Option<&BTreeSet<String>>,
) -> String {
    let mut svg = String::new();
    let margin = config.margin;
    let min_x = layout.bounds.x - margin;
    let min_y = layout.bounds.y - margin;
    let width = (layout.bounds.width + margin * 2.0).max(200.0);
    let height = (layout.bounds.height + margin * 2.0).max(200.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"{min_x:.2} {min_y:.2} {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect x=\"{min_x:.2}\" y=\"{min_y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\"/>",
        config.background
    ));
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str("</defs>");

    for grouping in &layout.groupings {
        let style = match grouping.kind {
            GroupingKind::ValueStream => &theme.value_stream,
            GroupingKind::Platform => &theme.platform_grouping,
        };
        svg.push_str(&grouping_svg(grouping, style, theme));
    }
    for grouping in &layout.inner_groupings {
        svg.push_str(&grouping_svg(grouping, &theme.inner_grouping, theme));
    }

    let rects: HashMap<&str, &Rect> = layout
        .teams
        .iter()
        .map(|team| (team.name.as_str(), &team.rect))
        .collect();
    if let Some(chart) = &layout.org_chart {
        svg.push_str(&org_chart_svg(chart, &rects, theme));
    }

    let faded = |name: &str| related.is_some_and(|set| !set.contains(name));

    for edge in &layout.edges {
        let dim = faded(&edge.from) && faded(&edge.to);
        svg.push_str(&edge_svg(edge, theme, dim));
    }

    for team in &layout.teams {
        svg.push_str(&team_svg(team, layout.view, theme, faded(&team.name)));
    }

    svg.push_str("</svg>");
    svg
}

fn grouping_svg(grouping: &GroupingBox, style: &GroupingStyle, theme: &Theme) -> String {
    let rect = grouping.rect;
    let mut out = format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        style.fill,
        style.stroke,
        style.stroke_width,
        r = style.corner_radius,
    );
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
        rect.x + style.label_padding,
        rect.y + style.label_padding + style.label_font_size,
        theme.font_family,
        style.label_font_size,
        style.label_color,
        escape_xml(&grouping.name)
    ));
    out
}

fn org_chart_svg(chart: &OrgChart, teams: &HashMap<&str, &Rect>, theme: &Theme) -> String {
    let mut out = String::new();
    let company = chart.company.rect;
    let company_anchor = (company.x + company.width / 2.0, company.bottom());

    for dept in &chart.departments {
        let rect = dept.node.rect;
        out.push_str(&line_svg(
            company_anchor,
            (rect.x + rect.width / 2.0, rect.y),
            &theme.line_color,
            1.5,
            None,
        ));
        for sub in &dept.sub_managers {
            let sub_rect = sub.node.rect;
            out.push_str(&line_svg(
                (rect.x + rect.width / 2.0, rect.bottom()),
                (sub_rect.x + sub_rect.width / 2.0, sub_rect.y),
                &theme.line_color,
                1.5,
                None,
            ));
            let members: Vec<&Rect> = sub
                .teams
                .iter()
                .filter_map(|name| teams.get(name.as_str()).copied())
                .collect();
            let Some(lowest) = members
                .iter()
                .map(|team| team.y + team.height / 2.0)
                .reduce(f32::max)
            else {
                continue;
            };
            out.push_str(&line_svg(
                (sub.connector_x, sub_rect.bottom()),
                (sub.connector_x, lowest),
                &theme.line_color,
                1.5,
                None,
            ));
            for team in members {
                let mid_y = team.y + team.height / 2.0;
                out.push_str(&line_svg(
                    (sub.connector_x, mid_y),
                    (team.x, mid_y),
                    &theme.line_color,
                    1.5,
                    None,
                ));
            }
        }
    }

    out.push_str(&org_box_svg(
        &company,
        &chart.company.label,
        &theme.org_box_fill,
        &theme.text_color,
        theme,
    ));
    for dept in &chart.departments {
        out.push_str(&org_box_svg(
            &dept.node.rect,
            &dept.node.label,
            &theme.org_box_fill,
            &theme.text_color,
            theme,
        ));
        for sub in &dept.sub_managers {
            out.push_str(&org_box_svg(
                &sub.node.rect,
                &sub.node.label,
                &theme.org_sub_box_fill,
                &theme.org_sub_box_text,
                theme,
            ));
        }
    }
    out
}

fn org_box_svg(rect: &Rect, label: &str, fill: &str, text: &str, theme: &Theme) -> String {
    let mut out = format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"5\" ry=\"5\" fill=\"{fill}\" stroke=\"{}\" stroke-width=\"1\"/>",
        rect.x, rect.y, rect.width, rect.height, theme.line_color
    );
    out.push_str(&label_svg(rect, label, text, theme, false));
    out
}

fn edge_svg(edge: &EdgeLayout, theme: &Theme, dim: bool) -> String {
    let opacity = if dim { DIMMED_OPACITY } else { 1.0 };
    match &edge.kind {
        EdgeKind::Dependency => format!(
            "<path d=\"M {:.2} {:.2} L {:.2} {:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" opacity=\"{opacity}\" marker-end=\"url(#arrow)\"/>",
            edge.start.x, edge.start.y, edge.end.x, edge.end.y, theme.line_color
        ),
        EdgeKind::Interaction(mode) => {
            let style = theme.interaction_style(mode);
            let mut line = line_svg(
                (edge.start.x, edge.start.y),
                (edge.end.x, edge.end.y),
                &style.color,
                style.width,
                style.dasharray.as_deref(),
            );
            if dim {
                line = line.replace("/>", &format!(" opacity=\"{opacity}\"/>"));
            }
            line
        }
    }
}

fn line_svg(
    from: (f32, f32),
    to: (f32, f32),
    color: &str,
    width: f32,
    dasharray: Option<&str>,
) -> String {
    let dash = dasharray
        .map(|d| format!(" stroke-dasharray=\"{d}\""))
        .unwrap_or_default();
    format!(
        "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{color}\" stroke-width=\"{width}\"{dash}/>",
        from.0, from.1, to.0, to.1
    )
}

fn team_svg(team: &TeamBox, view: ViewMode, theme: &Theme, dim: bool) -> String {
    let rect = team.rect;
    let fill = theme.team_fill(team.team_type);
    let stroke = theme.team_border(team.team_type);
    let stroke_width = theme.border_width;
    let opacity = if dim { DIMMED_OPACITY } else { 1.0 };
    let mut out = format!("<g opacity=\"{opacity}\">");

    match team.shape {
        HitShape::Octagon => {
            let c = rect.width * OCTAGON_CORNER;
            let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
            let points = [
                (l + c, t),
                (r - c, t),
                (r, t + c),
                (r, b - c),
                (r - c, b),
                (l + c, b),
                (l, b - c),
                (l, t + c),
            ]
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
            out.push_str(&format!(
                "<polygon points=\"{points}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>"
            ));
        }
        HitShape::Rectangle => {
            let radius = match (view, team.team_type) {
                (ViewMode::Design, TeamType::StreamAligned) => 20.0,
                (ViewMode::Design, TeamType::Platform) => 0.0,
                (ViewMode::Design, _) => 10.0,
                (ViewMode::Current, _) => 5.0,
            };
            let dash = if team.team_type == TeamType::Undefined {
                " stroke-dasharray=\"6 4\""
            } else {
                ""
            };
            out.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{radius}\" ry=\"{radius}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"{dash}/>",
                rect.x, rect.y, rect.width, rect.height
            ));
        }
    }

    let vertical = view == ViewMode::Design && team.team_type == TeamType::Enabling;
    out.push_str(&label_svg(&rect, &team.name, &theme.text_color, theme, vertical));
    out.push_str("</g>");
    out
}

/// Centered, word-wrapped label. Vertical labels are rotated to read bottom-up.
fn label_svg(rect: &Rect, label: &str, color: &str, theme: &Theme, vertical: bool) -> String {
    let cx = rect.x + rect.width / 2.0;
    let cy = rect.y + rect.height / 2.0;
    let span = if vertical { rect.height } else { rect.width };
    let max_chars = ((span - 12.0) / (theme.font_size * CHAR_WIDTH_RATIO)).max(4.0) as usize;
    let lines = wrap_label(label, max_chars);
    let line_height = theme.font_size * 1.2;
    let start = -(lines.len() as f32 - 1.0) * line_height / 2.0;
    let transform = if vertical {
        format!(" transform=\"rotate(-90 {cx:.2} {cy:.2})\"")
    } else {
        String::new()
    };

    let mut text = format!(
        "<text x=\"{cx:.2}\" y=\"{cy:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{color}\"{transform}>",
        theme.font_family, theme.font_size
    );
    for (idx, line) in lines.iter().enumerate() {
        let dy = if idx == 0 { start } else { line_height };
        text.push_str(&format!(
            "<tspan x=\"{cx:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        ));
    }
    text.push_str("</text>");
    text
}

fn wrap_label(label: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in label.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Arial".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .or_else(|| usvg::Size::from_wh(1200.0, 800.0))
        .ok_or_else(|| anyhow::anyhow!("invalid canvas size"))?;
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::compute_layout;
    use crate::model::{
        CompanyNode, DepartmentNode, InteractionMode, OrganizationHierarchy, SubManagerNode, Team,
    };

    #[test]
    fn design_view_draws_groupings_and_shapes() {
        let teams = vec![
            Team::new("Checkout & Payments", TeamType::StreamAligned)
                .in_value_stream("Shop")
                .at(648.0, 165.0)
                .interacts_with("Data", InteractionMode::XAsAService),
            Team::new("Data", TeamType::Platform)
                .in_platform_grouping("Core")
                .at(130.0, 600.0),
            Team::new("Search", TeamType::ComplicatedSubsystem).at(2600.0, 100.0),
        ];
        let layout = compute_layout(&teams, None, ViewMode::Design, &LayoutConfig::default());
        let svg = render_svg(&layout, &Theme::classic(), &RenderConfig::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Checkout &amp; Payments"));
        assert!(svg.contains(">Shop</text>"));
        assert!(svg.contains(">Core</text>"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("stroke-dasharray=\"10 5\""));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn current_view_draws_org_chart_and_dependencies() {
        let org = OrganizationHierarchy {
            company: Some(CompanyNode {
                name: "Acme".to_string(),
                children: vec![DepartmentNode {
                    name: "Engineering".to_string(),
                    line_managers: Some(vec![SubManagerNode {
                        name: "Lee".to_string(),
                        teams: vec!["A".to_string(), "B".to_string()],
                    }]),
                    regions: None,
                }],
            }),
        };
        let teams = vec![
            Team::new("A", TeamType::StreamAligned)
                .at(630.0, 410.0)
                .depends_on("B"),
            Team::new("B", TeamType::Platform).at(630.0, 530.0),
        ];
        let layout =
            compute_layout(&teams, Some(&org), ViewMode::Current, &LayoutConfig::default());
        let svg = render_svg(&layout, &Theme::classic(), &RenderConfig::default());
        assert!(svg.contains("Acme"));
        assert!(svg.contains("Engineering"));
        assert!(svg.contains("marker-end=\"url(#arrow)\""));
        // Connector from the sub-manager column down to the lowest team center.
        assert!(svg.contains("x1=\"590.00\" y1=\"360.00\" x2=\"590.00\" y2=\"570.00\""));
    }

    #[test]
    fn focus_fades_unrelated_teams() {
        let teams = vec![
            Team::new("A", TeamType::Platform).at(0.0, 0.0),
            Team::new("B", TeamType::Platform).at(300.0, 0.0),
        ];
        let layout = compute_layout(&teams, None, ViewMode::Current, &LayoutConfig::default());
        let related: BTreeSet<String> = BTreeSet::from(["A".to_string()]);
        let svg = render_svg_focused(
            &layout,
            &Theme::classic(),
            &RenderConfig::default(),
            Some(&related),
        );
        assert_eq!(svg.matches("<g opacity=\"0.25\">").count(), 1);
        assert_eq!(svg.matches("<g opacity=\"1\">").count(), 1);
    }

    #[test]
    fn labels_wrap_on_words() {
        assert_eq!(wrap_label("Checkout Payments Team", 12), vec!["Checkout", "Payments", "Team"]);
        assert_eq!(wrap_label("Tiny Team", 20), vec!["Tiny Team"]);
        assert_eq!(wrap_label("", 5), vec![""]);
    }
}
