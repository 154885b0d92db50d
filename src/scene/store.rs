//! Scenario persistence collaborator.
//!
//! The designer never talks to a backend directly; page controllers go through
//! [`ScenarioStore`]. [`FileScenarioStore`] keeps one JSON document per
//! scenario and applies the same validation a remote response gets.

use crate::scene::serialization::{self, SerializationError};
use crate::scene::{ScenarioData, ScenarioId};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error("scenario {0} not found")]
    NotFound(ScenarioId),
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub trait ScenarioStore {
    fn list_scenarios(&self) -> Result<Vec<ScenarioData>>;
    fn get_scenario(&self, id: ScenarioId) -> Result<ScenarioData>;
    /// Persists a new scenario and returns the id it was stored under.
    fn create_scenario(&mut self, data: &ScenarioData) -> Result<ScenarioId>;
    fn update_scenario(&mut self, id: ScenarioId, data: &ScenarioData) -> Result<bool>;
    fn delete_scenario(&mut self, id: ScenarioId) -> Result<bool>;
}

pub struct FileScenarioStore {
    root: PathBuf,
}

impl FileScenarioStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        log::info!("Scenario store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: ScenarioId) -> PathBuf {
        self.root.join(format!("scenario_{id}.json"))
    }

    fn stored_ids(&self) -> Result<Vec<ScenarioId>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let id = name
                .strip_prefix("scenario_")
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|digits| digits.parse::<ScenarioId>().ok());
            if let Some(id) = id {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

impl ScenarioStore for FileScenarioStore {
    fn list_scenarios(&self) -> Result<Vec<ScenarioData>> {
        self.stored_ids()?
            .into_iter()
            .map(|id| self.get_scenario(id))
            .collect()
    }

    fn get_scenario(&self, id: ScenarioId) -> Result<ScenarioData> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id));
        }
        Ok(serialization::load_scenario_from_file(&path)?)
    }

    fn create_scenario(&mut self, data: &ScenarioData) -> Result<ScenarioId> {
        serialization::validate_scenario(data).map_err(SerializationError::from)?;
        let id = self
            .stored_ids()?
            .last()
            .map(|max| max.saturating_add(1))
            .unwrap_or(1);
        let stored = ScenarioData {
            id,
            ..data.clone()
        };
        serialization::save_scenario_to_file(&stored, &self.path_for(id))?;
        log::info!("Created scenario {} '{}'", id, stored.name);
        Ok(id)
    }

    fn update_scenario(&mut self, id: ScenarioId, data: &ScenarioData) -> Result<bool> {
        serialization::validate_scenario(data).map_err(SerializationError::from)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(false);
        }
        let stored = ScenarioData {
            id,
            ..data.clone()
        };
        serialization::save_scenario_to_file(&stored, &path)?;
        log::info!("Updated scenario {}", id);
        Ok(true)
    }

    fn delete_scenario(&mut self, id: ScenarioId) -> Result<bool> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        log::info!("Deleted scenario {}", id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{EmitterData, Position};

    fn scenario(name: &str) -> ScenarioData {
        let mut data = ScenarioData {
            name: name.to_string(),
            ..ScenarioData::default()
        };
        data.emitters
            .push(EmitterData::new(0, Position::new(1.0, 1.0, 1.0)));
        data
    }

    #[test]
    fn create_assigns_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScenarioStore::open(dir.path()).unwrap();
        let first = store.create_scenario(&scenario("One")).unwrap();
        let second = store.create_scenario(&scenario("Two")).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        let listed = store.list_scenarios().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].name, "Two");
        assert_eq!(listed[1].id, 2);
    }

    #[test]
    fn update_and_delete_report_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScenarioStore::open(dir.path()).unwrap();
        assert!(!store.update_scenario(5, &scenario("Ghost")).unwrap());
        assert!(!store.delete_scenario(5).unwrap());
        assert!(matches!(store.get_scenario(5), Err(StoreError::NotFound(5))));

        let id = store.create_scenario(&scenario("Real")).unwrap();
        let mut edited = store.get_scenario(id).unwrap();
        edited.name = "Renamed".to_string();
        assert!(store.update_scenario(id, &edited).unwrap());
        assert_eq!(store.get_scenario(id).unwrap().name, "Renamed");
        assert!(store.delete_scenario(id).unwrap());
        assert!(store.list_scenarios().unwrap().is_empty());
    }

    #[test]
    fn malformed_files_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScenarioStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("scenario_4.json"), "{\"id\": 4}").unwrap();
        assert!(matches!(
            store.get_scenario(4),
            Err(StoreError::Serialization(SerializationError::Json(_)))
        ));
    }

    #[test]
    fn invalid_records_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScenarioStore::open(dir.path()).unwrap();
        let mut bad = scenario("Bad");
        bad.emitters[0].end_time = Some(2.0);
        assert!(store.create_scenario(&bad).is_err());
        assert!(store.list_scenarios().unwrap().is_empty());
    }
}
