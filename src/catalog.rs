use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of the creature catalog. Loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl CreatureDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stage: None,
            kind: None,
        }
    }

    pub fn stage_label(&self) -> &str {
        self.stage.as_deref().filter(|s| !s.is_empty()).unwrap_or("Rookie")
    }

    pub fn kind_label(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CreatureDefinition>,
}

impl Catalog {
    /// Builds a catalog, rejecting blank ids or names and duplicate ids.
    pub fn from_definitions(entries: Vec<CreatureDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "entry {index} has an empty id"
                )));
            }
            if entry.name.trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "entry '{}' has an empty name",
                    entry.id
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogError::Validation(format!(
                    "creature id '{}' defined more than once",
                    entry.id
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CreatureDefinition> = serde_json::from_str(text)?;
        Self::from_definitions(entries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn get(&self, id: &str) -> Option<&CreatureDefinition> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[CreatureDefinition] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
