//! Mapping repository for reusing confirmed mappings across uploads.
//!
//! # Storage Format
//!
//! Each event's confirmed mapping is stored as a JSON file named
//! `{event_id}.json`, with non-alphanumeric characters of the id replaced by
//! `_`. The file carries a format version and the time it was saved.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::ConfirmedMapping;

const FORMAT_VERSION: &str = "1.0";

/// Directory-backed store of confirmed mappings, one file per event.
#[derive(Debug, Clone)]
pub struct MappingRepository {
    base_dir: PathBuf,
}

/// Metadata about a stored mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingMetadata {
    pub event_id: String,
    pub file_path: PathBuf,
    pub mapping_count: usize,
    pub unmapped_count: usize,
    pub saved_at: Option<DateTime<Utc>>,
}

/// Confirmed mapping plus repository metadata, as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMapping {
    #[serde(flatten)]
    pub mapping: ConfirmedMapping,
    pub saved_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl StoredMapping {
    pub fn new(mapping: ConfirmedMapping) -> Self {
        Self {
            mapping,
            saved_at: Some(Utc::now()),
            description: None,
            version: default_version(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl MappingRepository {
    /// Opens a repository, creating the directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).with_context(|| {
            format!(
                "Failed to create mapping repository: {}",
                base_dir.display()
            )
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn save(&self, mapping: &ConfirmedMapping) -> Result<PathBuf> {
        self.save_stored(&StoredMapping::new(mapping.clone()))
    }

    pub fn save_stored(&self, stored: &StoredMapping) -> Result<PathBuf> {
        let path = self.path_for(&stored.mapping.event_id);
        let json = serde_json::to_string_pretty(stored).with_context(|| {
            format!("Failed to serialize mapping for {}", stored.mapping.event_id)
        })?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write mapping to {}", path.display()))?;
        debug!(path = %path.display(), columns = stored.mapping.len(), "mapping saved");
        Ok(path)
    }

    /// Loads the confirmed mapping for an event; `None` if none was saved.
    pub fn load(&self, event_id: &str) -> Result<Option<ConfirmedMapping>> {
        Ok(self.load_stored(event_id)?.map(|stored| stored.mapping))
    }

    pub fn load_stored(&self, event_id: &str) -> Result<Option<StoredMapping>> {
        let path = self.path_for(event_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read mapping from {}", path.display()))?;
        let stored: StoredMapping = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse mapping from {}", path.display()))?;
        Ok(Some(stored))
    }

    /// Lists stored mappings sorted by event id. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<MappingMetadata>> {
        let mut metadata = Vec::new();
        for entry in fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read repository: {}", self.base_dir.display()))?
        {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            match serde_json::from_str::<StoredMapping>(&contents) {
                Ok(stored) => metadata.push(MappingMetadata {
                    event_id: stored.mapping.event_id.clone(),
                    file_path: path,
                    mapping_count: stored.mapping.columns.len(),
                    unmapped_count: stored.mapping.unmapped_columns.len(),
                    saved_at: stored.saved_at,
                }),
                Err(err) => warn!(path = %path.display(), %err, "skipping unreadable mapping"),
            }
        }
        metadata.sort_by(|a, b| a.event_id.cmp(&b.event_id));
        Ok(metadata)
    }

    pub fn delete(&self, event_id: &str) -> Result<bool> {
        let path = self.path_for(event_id);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete mapping: {}", path.display()))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn exists(&self, event_id: &str) -> bool {
        self.path_for(event_id).exists()
    }

    fn path_for(&self, event_id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", normalize_id(event_id)))
    }
}

/// Normalize an ID for use in filenames.
fn normalize_id(id: &str) -> String {
    id.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
