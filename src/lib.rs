#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod relationships;
pub mod render;
pub mod state;
pub mod store;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use layout::{
    DiagramLayout, PositionUpdate, align, align_by_grouping, align_by_hierarchy, apply_updates,
    compute_layout,
};
pub use model::{OrganizationHierarchy, Position, Team, TeamType, ViewMode};
pub use state::AppState;
pub use store::{PositionStore, StoreError, persist_updates};
