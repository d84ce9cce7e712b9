//! Generated index artifact.
//!
//! A JSON snapshot of a built index that can be reloaded without walking
//! the registry again. Patterns are stored as raw sources and recompiled on
//! load, so a hand-edited artifact is validated the same way a build is.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::index::{BackendId, IndexError, IndexResult, PatternIndex, PatternIndexEntry, UrlPattern};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Serialized form of a [`PatternIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub generated_by: String,
    pub format_version: u32,
    pub entries: Vec<ArtifactEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub backend: BackendId,
    pub pattern: String,
}

impl IndexArtifact {
    pub fn from_index(index: &PatternIndex) -> Self {
        Self {
            generated_by: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            format_version: FORMAT_VERSION,
            entries: index
                .iter()
                .map(|e| ArtifactEntry {
                    backend: e.backend.clone(),
                    pattern: e.pattern.source().to_string(),
                })
                .collect(),
        }
    }

    /// Recompile every pattern into an index.
    pub fn into_index(self) -> IndexResult<PatternIndex> {
        if self.format_version != FORMAT_VERSION {
            return Err(IndexError::ArtifactVersion {
                found: self.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let pattern = UrlPattern::compile(entry.pattern.as_str()).map_err(|source| {
                IndexError::PatternCompile {
                    backend: entry.backend.clone(),
                    pattern: entry.pattern.clone(),
                    source,
                }
            })?;
            entries.push(PatternIndexEntry::new(entry.backend, pattern));
        }
        Ok(PatternIndex::new(entries))
    }

    /// Pretty JSON with a trailing newline, one entry per block.
    pub fn to_json(&self) -> IndexResult<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(json: &str) -> IndexResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Write the index to `path`, replacing any previous artifact.
pub fn write(index: &PatternIndex, path: &Path) -> IndexResult<()> {
    let json = IndexArtifact::from_index(index).to_json()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), entries = index.len(), "Index artifact written");
    Ok(())
}

/// Load an index from an artifact written by [`write`].
pub fn load(path: &Path) -> IndexResult<PatternIndex> {
    let content = fs::read_to_string(path)?;
    let index = IndexArtifact::from_json(&content)?.into_index()?;
    tracing::info!(path = %path.display(), entries = index.len(), "Index artifact loaded");
    Ok(index)
}
