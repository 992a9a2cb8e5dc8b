//! Saves an in-progress draft so a session survives a restart or a failed
//! submission. The quote is stripped on save; it is derived state and gets
//! recomputed once a rate table is available again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::domain::BookingDraft;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "ShipBook";
const APP_NAME: &str = "ShipBook";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedDraft {
    pub draft: BookingDraft,
    /// 1-based step index the session had reached.
    pub step_index: u8,
}

fn data_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("draft.json"))
}

pub fn load_persisted_draft() -> Option<PersistedDraft> {
    let path = data_file()?;
    load_from(&path)
}

pub fn save_persisted_draft(persisted: &PersistedDraft) -> Result<(), PersistSaveError> {
    let path = data_file().ok_or(PersistSaveError::StorageUnavailable)?;
    save_to(&path, persisted)
}

pub fn discard_persisted_draft() {
    if let Some(path) = data_file() {
        let _ = fs::remove_file(path);
    }
}

fn load_from(path: &Path) -> Option<PersistedDraft> {
    let data = fs::read_to_string(path).ok()?;
    let mut persisted: PersistedDraft = serde_json::from_str(&data).ok()?;
    persisted.draft.quote = None;
    Some(persisted)
}

fn save_to(path: &Path, persisted: &PersistedDraft) -> Result<(), PersistSaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut snapshot = persisted.clone();
    snapshot.draft.quote = None;
    let json = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PersistSaveError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Party, Quote, Zone};

    #[test]
    fn round_trips_a_draft_without_its_quote() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("draft.json");

        let mut draft = BookingDraft::with_default_origin(Party {
            name: "Sender".to_string(),
            ..Party::default()
        });
        draft.quote = Some(Quote {
            base_price: 55.0,
            tax: 9.9,
            final_price: 64.9,
            zone: Zone::Assam,
            transport_mode_used: None,
            chargeable_weight_used: 0.7,
        });

        save_to(&path, &PersistedDraft { draft: draft.clone(), step_index: 4 }).unwrap();
        let restored = load_from(&path).unwrap();

        assert_eq!(restored.step_index, 4);
        assert_eq!(restored.draft.origin.name, "Sender");
        assert_eq!(restored.draft.quote, None);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(&dir.path().join("absent.json")).is_none());
    }
}
