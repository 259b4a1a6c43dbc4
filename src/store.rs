use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::PositionUpdate;
use crate::model::{Position, Team, ViewMode};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("team {team} not found in {view} view")]
    UnknownTeam { team: String, view: &'static str },
    #[error("position write for {team} rejected")]
    Rejected { team: String },
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid team file {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store lock poisoned")]
    Poisoned,
}

/// Where team positions live between sessions. One write per team, per view.
pub trait PositionStore {
    /// Returns `Ok(false)` when the store accepted the request but did not apply it.
    fn save_position(
        &self,
        view: ViewMode,
        team: &str,
        position: Position,
    ) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistFailure {
    pub team: String,
    pub error: String,
}

/// Outcome of persisting one alignment batch or drag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersistReport {
    pub saved: Vec<String>,
    pub failed: Vec<PersistFailure>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Writes every update and collects the failures. Positions already applied in memory are
/// left as they are; callers recover through undo.
pub fn persist_updates<S>(store: &S, view: ViewMode, updates: &[PositionUpdate]) -> PersistReport
where
    S: PositionStore + ?Sized,
{
    let mut report = PersistReport::default();
    for update in updates {
        match store.save_position(view, &update.team, update.to) {
            Ok(true) => report.saved.push(update.team.clone()),
            Ok(false) => {
                warn!(team = %update.team, view = view.as_str(), "position write not applied");
                report.failed.push(PersistFailure {
                    team: update.team.clone(),
                    error: "not applied".to_string(),
                });
            }
            Err(err) => {
                warn!(
                    team = %update.team,
                    view = view.as_str(),
                    error = %err,
                    "position write failed"
                );
                report.failed.push(PersistFailure {
                    team: update.team.clone(),
                    error: err.to_string(),
                });
            }
        }
    }
    debug!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        "persisted position updates"
    );
    report
}

/// In-process store keyed by view and team name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    positions: Mutex<BTreeMap<(ViewMode, String), Position>>,
    rejected: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose writes for the named teams fail with `StoreError::Rejected`.
    pub fn rejecting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            positions: Mutex::new(BTreeMap::new()),
            rejected: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn position(&self, view: ViewMode, team: &str) -> Option<Position> {
        let positions = self.positions.lock().ok()?;
        positions.get(&(view, team.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PositionStore for MemoryStore {
    fn save_position(
        &self,
        view: ViewMode,
        team: &str,
        position: Position,
    ) -> Result<bool, StoreError> {
        if self.rejected.contains(team) {
            return Err(StoreError::Rejected {
                team: team.to_string(),
            });
        }
        let mut positions = self.positions.lock().map_err(|_| StoreError::Poisoned)?;
        positions.insert((view, team.to_string()), position);
        Ok(true)
    }
}

/// Team list kept in a JSON file. Each save rewrites the file.
///
/// Records are kept as raw JSON and only their `position` is patched, so fields the
/// layout does not model survive a save. The file holds the teams of a single view, so
/// `view` only shows up in error messages.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<Vec<Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<Value> =
            serde_json::from_str(&contents).map_err(|source| StoreError::Format {
                path: path.display().to_string(),
                source,
            })?;
        let store = Self {
            path,
            records: Mutex::new(records),
        };
        store.teams()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn teams(&self) -> Result<Vec<Team>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records
            .iter()
            .map(|record| Team::deserialize(record).map_err(|source| self.format_error(source)))
            .collect()
    }

    fn format_error(&self, source: serde_json::Error) -> StoreError {
        StoreError::Format {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn flush(&self, records: &[Value]) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(records).map_err(|source| self.format_error(source))?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl PositionStore for JsonFileStore {
    fn save_position(
        &self,
        view: ViewMode,
        team: &str,
        position: Position,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(fields) = records
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|fields| fields.get("name").and_then(Value::as_str) == Some(team))
        else {
            return Err(StoreError::UnknownTeam {
                team: team.to_string(),
                view: view.as_str(),
            });
        };
        let stored = fields
            .get("position")
            .and_then(|raw| Position::deserialize(raw).ok());
        if stored == Some(position) {
            return Ok(true);
        }
        let encoded = serde_json::to_value(position).map_err(|source| self.format_error(source))?;
        fields.insert("position".to_string(), encoded);
        self.flush(&records)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TeamType;

    fn update(team: &str, x: f32, y: f32) -> PositionUpdate {
        PositionUpdate {
            team: team.to_string(),
            from: Position::default(),
            to: Position::new(x, y),
        }
    }

    #[test]
    fn memory_store_keeps_views_apart() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store
            .save_position(ViewMode::Design, "A", Position::new(1.0, 2.0))
            .unwrap();
        assert_eq!(
            store.position(ViewMode::Design, "A"),
            Some(Position::new(1.0, 2.0))
        );
        assert_eq!(store.position(ViewMode::Current, "A"), None);
    }

    #[test]
    fn partial_failure_keeps_other_writes() {
        let store = MemoryStore::rejecting(["B"]);
        let updates = vec![update("A", 1.0, 1.0), update("B", 2.0, 2.0), update("C", 3.0, 3.0)];
        let report = persist_updates(&store, ViewMode::Current, &updates);
        assert!(!report.is_complete());
        assert_eq!(report.saved, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].team, "B");
        assert!(report.failed[0].error.contains("rejected"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn empty_batch_is_complete() {
        let store = MemoryStore::new();
        let report = persist_updates(&store, ViewMode::Design, &[]);
        assert!(report.is_complete());
        assert!(report.saved.is_empty());
    }

    #[test]
    fn json_file_store_rewrites_positions() {
        let dir = std::env::temp_dir().join(format!("ttlayout-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("teams.json");
        let teams = vec![
            Team::new("A", TeamType::Platform).at(1.0, 1.0),
            Team::new("B", TeamType::Enabling),
        ];
        std::fs::write(&path, serde_json::to_string(&teams).unwrap()).unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        let report = persist_updates(
            &store,
            ViewMode::Design,
            &[update("B", 40.0, 50.0), update("Ghost", 0.0, 0.0)],
        );
        assert_eq!(report.saved, vec!["B".to_string()]);
        assert!(report.failed[0].error.contains("Ghost"));

        let reloaded = JsonFileStore::open(&path).unwrap().teams().unwrap();
        assert_eq!(reloaded[1].pos(), Position::new(40.0, 50.0));
        assert_eq!(reloaded[0].pos(), Position::new(1.0, 1.0));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn json_file_store_keeps_unmodelled_fields() {
        let dir = std::env::temp_dir().join(format!("ttlayout-extra-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("teams.json");
        std::fs::write(
            &path,
            r#"[{"name":"A","team_type":"platform","description":"keep me",
                 "cognitive_load":{"domain":3},"dependencies":null}]"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(
            store
                .save_position(ViewMode::Design, "A", Position::new(10.0, 20.0))
                .unwrap()
        );

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["description"], "keep me");
        assert_eq!(raw[0]["cognitive_load"]["domain"], 3);
        assert_eq!(raw[0]["position"]["x"], 10.0);
        let reloaded = JsonFileStore::open(&path).unwrap().teams().unwrap();
        assert_eq!(reloaded[0].pos(), Position::new(10.0, 20.0));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn json_file_store_rejects_non_team_records() {
        let dir = std::env::temp_dir().join(format!("ttlayout-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("teams.json");
        std::fs::write(&path, r#"[{"team_type":"platform"}]"#).unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Format { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn json_file_store_reports_bad_files() {
        let err = JsonFileStore::open("/nonexistent/teams.json").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
