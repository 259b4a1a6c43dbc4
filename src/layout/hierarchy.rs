use std::collections::HashSet;

use tracing::debug;

use super::{Extent, PositionUpdate, Rect};
use crate::config::HierarchyLayoutConfig;
use crate::model::{OrganizationHierarchy, Position, Team};

#[derive(Debug, Clone, PartialEq)]
pub struct OrgBox {
    pub label: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubManagerSlot {
    pub node: OrgBox,
    /// Horizontal anchor of the sub-manager column; team x is derived from it.
    pub anchor_x: f32,
    /// x of the vertical line linking the sub-manager box to its teams.
    pub connector_x: f32,
    pub teams: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentSlot {
    pub node: OrgBox,
    pub sub_managers: Vec<SubManagerSlot>,
}

/// Computed geometry of the organization chart above the teams.
#[derive(Debug, Clone, PartialEq)]
pub struct OrgChart {
    pub company: OrgBox,
    pub departments: Vec<DepartmentSlot>,
    /// First team row, three levels below the company row.
    pub team_row_y: f32,
}

impl OrgChart {
    pub fn build(org: &OrganizationHierarchy, config: &HierarchyLayoutConfig) -> Option<Self> {
        let company = org.company.as_ref()?;
        let dept_y = config.company_y + config.level_height;
        let sub_y = dept_y + config.level_height;

        let departments = company
            .children
            .iter()
            .enumerate()
            .map(|(dept_idx, dept)| {
                let dept_x = config.dept_start_x + dept_idx as f32 * config.dept_spacing;
                let subs = dept.sub_managers();
                let count = subs.len();
                let first_x = dept_x
                    - (count.saturating_sub(1) as f32 * config.sub_manager_spacing) / 2.0;
                let sub_managers = subs
                    .iter()
                    .enumerate()
                    .map(|(sub_idx, sub)| {
                        let anchor_x = first_x + sub_idx as f32 * config.sub_manager_spacing;
                        SubManagerSlot {
                            node: OrgBox {
                                label: sub.name.clone(),
                                rect: Rect::new(
                                    anchor_x,
                                    sub_y,
                                    config.dept_box_width,
                                    config.dept_box_height - 10.0,
                                ),
                            },
                            anchor_x,
                            connector_x: anchor_x
                                + config.dept_box_width * config.connector_x_offset,
                            teams: sub.teams.clone(),
                        }
                    })
                    .collect();
                DepartmentSlot {
                    node: OrgBox {
                        label: dept.name.clone(),
                        rect: Rect::new(
                            dept_x,
                            dept_y,
                            config.dept_box_width,
                            config.dept_box_height,
                        ),
                    },
                    sub_managers,
                }
            })
            .collect();

        Some(Self {
            company: OrgBox {
                label: company.name.clone(),
                rect: Rect::new(
                    config.company_x,
                    config.company_y,
                    config.company_box_width,
                    config.company_box_height,
                ),
            },
            departments,
            team_row_y: config.company_y + 3.0 * config.level_height,
        })
    }

    /// Union of every chart box.
    pub fn extent(&self) -> Rect {
        let mut extent = Extent::empty();
        extent.include(self.company.rect);
        for dept in &self.departments {
            extent.include(dept.node.rect);
            for sub in &dept.sub_managers {
                extent.include(sub.node.rect);
            }
        }
        extent.to_rect().unwrap_or(self.company.rect)
    }
}

/// Stacks each sub-manager's teams under it, org-chart style.
///
/// Unresolved team names are skipped. A team listed under several sub-managers keeps its
/// first slot. Only teams whose target differs from their position by more than
/// `tolerance` on either axis are returned.
pub fn align_by_hierarchy(
    teams: &[Team],
    org: Option<&OrganizationHierarchy>,
    config: &HierarchyLayoutConfig,
    tolerance: f32,
) -> Vec<PositionUpdate> {
    let Some(chart) = org.and_then(|org| OrgChart::build(org, config)) else {
        debug!("no organization hierarchy, skipping hierarchy alignment");
        return Vec::new();
    };

    let mut placed: HashSet<&str> = HashSet::new();
    let mut updates = Vec::new();

    for dept in &chart.departments {
        if dept.sub_managers.is_empty() {
            debug!(department = %dept.node.label, "department has no line managers or regions");
            continue;
        }
        for sub in &dept.sub_managers {
            let x = sub.anchor_x + config.dept_box_width * config.team_x_offset;
            let resolved = sub
                .teams
                .iter()
                .filter_map(|name| {
                    let team = teams.iter().find(|team| &team.name == name);
                    if team.is_none() {
                        debug!(team = %name, manager = %sub.node.label, "unresolved team name");
                    }
                    team
                })
                .filter(|team| placed.insert(team.name.as_str()));
            for (row, team) in resolved.enumerate() {
                let target = Position::new(x, chart.team_row_y + row as f32 * config.vertical_spacing);
                let current = team.pos();
                if target.differs_from(&current, tolerance) {
                    updates.push(PositionUpdate {
                        team: team.name.clone(),
                        from: current,
                        to: target,
                    });
                }
            }
        }
    }

    debug!(moved = updates.len(), "hierarchy alignment finished");
    updates
}
