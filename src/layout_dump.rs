use crate::layout::{DiagramLayout, EdgeKind, GroupingKind, PositionUpdate, Rect};
use crate::model::ViewMode;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub view: ViewMode,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub teams: Vec<TeamDump>,
    pub groupings: Vec<GroupingDump>,
    pub org_chart: Vec<OrgNodeDump>,
    pub edges: Vec<EdgeDump>,
    /// Moves made by the alignment pass that produced this layout, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub moved: Vec<PositionUpdate>,
}

#[derive(Debug, Serialize)]
pub struct TeamDump {
    pub name: String,
    pub team_type: String,
    pub shape: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct GroupingDump {
    pub name: String,
    pub kind: GroupingKind,
    pub parent: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct OrgNodeDump {
    pub label: String,
    /// 0 for the company, 1 for departments, 2 for sub-managers.
    pub level: u8,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub kind: String,
    pub points: Vec<[f32; 2]>,
}

fn grouping_dump(name: &str, kind: GroupingKind, parent: Option<&String>, rect: &Rect) -> GroupingDump {
    GroupingDump {
        name: name.to_string(),
        kind,
        parent: parent.cloned(),
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
    }
}

fn org_node(label: &str, level: u8, rect: &Rect) -> OrgNodeDump {
    OrgNodeDump {
        label: label.to_string(),
        level,
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
    }
}

impl LayoutDump {
    pub fn from_layout(layout: &DiagramLayout) -> Self {
        let teams = layout
            .teams
            .iter()
            .map(|team| TeamDump {
                name: team.name.clone(),
                team_type: team.team_type.as_str().to_string(),
                shape: format!("{:?}", team.shape).to_lowercase(),
                x: team.rect.x,
                y: team.rect.y,
                width: team.rect.width,
                height: team.rect.height,
            })
            .collect();

        let groupings = layout
            .groupings
            .iter()
            .chain(layout.inner_groupings.iter())
            .map(|grouping| {
                grouping_dump(
                    &grouping.name,
                    grouping.kind,
                    grouping.parent.as_ref(),
                    &grouping.rect,
                )
            })
            .collect();

        let mut org_chart = Vec::new();
        if let Some(chart) = &layout.org_chart {
            org_chart.push(org_node(&chart.company.label, 0, &chart.company.rect));
            for dept in &chart.departments {
                org_chart.push(org_node(&dept.node.label, 1, &dept.node.rect));
                for sub in &dept.sub_managers {
                    org_chart.push(org_node(&sub.node.label, 2, &sub.node.rect));
                }
            }
        }

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                kind: match &edge.kind {
                    EdgeKind::Dependency => "dependency".to_string(),
                    EdgeKind::Interaction(mode) => mode.as_str().to_string(),
                },
                points: vec![[edge.start.x, edge.start.y], [edge.end.x, edge.end.y]],
            })
            .collect();

        LayoutDump {
            view: layout.view,
            x: layout.bounds.x,
            y: layout.bounds.y,
            width: layout.bounds.width,
            height: layout.bounds.height,
            teams,
            groupings,
            org_chart,
            edges,
            moved: Vec::new(),
        }
    }

    pub fn with_moves(mut self, moved: &[PositionUpdate]) -> Self {
        self.moved = moved.to_vec();
        self
    }
}

pub fn write_layout_dump(path: Option<&Path>, dump: &LayoutDump) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, dump)?;
        }
        None => {
            println!("{}", serde_json::to_string_pretty(dump)?);
        }
    }
    Ok(())
}
