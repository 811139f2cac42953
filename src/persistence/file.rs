//! One JSON file per entity under a data directory

use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::persistence::PersistenceStore;
use crate::sync::codec;
use crate::sync::message::PersistedRecord;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each record as `<root>/<entity-uuid>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, entity: EntityId) -> PathBuf {
        self.root.join(format!("{}.json", entity))
    }
}

impl PersistenceStore for JsonFileStore {
    fn load_record(&self, entity: EntityId) -> Result<Option<PersistedRecord>> {
        let path = self.path_for(entity);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = codec::decode_record(&bytes)?;
        tracing::debug!(%entity, path = %path.display(), "loaded record");
        Ok(Some(record))
    }

    fn save_record(&self, entity: EntityId, record: &PersistedRecord) -> Result<()> {
        let path = self.path_for(entity);
        let tmp = path.with_extension("json.tmp");
        let bytes = codec::encode_record(record)?;

        // Write-then-rename so a crash never leaves a half-written record
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(%entity, path = %path.display(), "saved record");
        Ok(())
    }
}
