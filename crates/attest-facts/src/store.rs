//! Fact persistence between harvest and verification.
//!
//! The store is one binary blob: an 8-byte magic, then a bincode-encoded
//! `{ version, facts }` record. Writes replace the whole file atomically.
//! Reads come in two flavours:
//! - [`FactStore::try_read`] reports exactly what went wrong
//! - [`FactStore::read`] returns an empty set on any failure, so a missing or
//!   corrupt store means "nothing to verify", never "everything passed"

use std::io::Write;
use std::path::{Path, PathBuf};

use attest_facts_core::FactSet;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Default location, relative to the project root.
pub const DEFAULT_STORE_PATH: &str = "target/attest/facts.bin";

const MAGIC: &[u8; 8] = b"ATTESTFS";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    facts: FactSet,
}

/// A fact set persisted at a single path.
#[derive(Debug, Clone)]
pub struct FactStore {
    path: PathBuf,
}

impl FactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at [`DEFAULT_STORE_PATH`] under `root`.
    pub fn in_project(root: &Path) -> Self {
        Self::new(root.join(DEFAULT_STORE_PATH))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the store's content with `facts`.
    pub fn write(&self, facts: &FactSet) -> Result<(), StoreError> {
        let bytes = Self::encode(facts)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| self.io(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io(e))?;
        tmp.write_all(&bytes).map_err(|e| self.io(e))?;
        tmp.flush().map_err(|e| self.io(e))?;
        tmp.persist(&self.path).map_err(|e| self.io(e.error))?;

        tracing::debug!(path = %self.path.display(), facts = facts.len(), "wrote fact store");
        Ok(())
    }

    /// Load the store, reporting why it could not be loaded.
    pub fn try_read(&self) -> Result<FactSet, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(self.io(e)),
        };
        Self::decode(&bytes)
    }

    /// Load the store; any failure yields the empty set.
    pub fn read(&self) -> FactSet {
        match self.try_read() {
            Ok(facts) => {
                tracing::debug!(path = %self.path.display(), facts = facts.len(), "read fact store");
                facts
            }
            Err(e @ StoreError::NotFound(_)) => {
                tracing::debug!(error = %e, "no fact store, nothing to verify");
                FactSet::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "unreadable fact store, nothing to verify");
                FactSet::new()
            }
        }
    }

    /// Encode a fact set into the store format.
    pub fn encode(facts: &FactSet) -> Result<Vec<u8>, StoreError> {
        let record = StoreFile {
            version: FORMAT_VERSION,
            facts: facts.clone(),
        };
        let body = bincode::serialize(&record).map_err(|e| StoreError::Encode(e.to_string()))?;
        let mut bytes = Vec::with_capacity(MAGIC.len() + body.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode store bytes, e.g. a blob embedded with `include_bytes!`.
    pub fn decode(bytes: &[u8]) -> Result<FactSet, StoreError> {
        let body = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| StoreError::Decode("missing fact store header".to_string()))?;
        let record: StoreFile =
            bincode::deserialize(body).map_err(|e| StoreError::Decode(e.to_string()))?;
        if record.version != FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                found: record.version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(record.facts)
    }

    fn io(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_facts_core::{
        ConstructorFact, Fact, FactKind, MethodFact, ResourceBundleFact, SerializableFact,
    };
    use tempfile::TempDir;

    fn sample() -> FactSet {
        let mut facts = FactSet::new();
        facts.insert(Fact::new(
            "com.example.App",
            FactKind::Constructor(ConstructorFact {
                target_class: "com.example.Dto".into(),
                parameters: vec!["java.lang.String".into(), "double[]".into()],
            }),
        ));
        facts.insert(
            Fact::new(
                "com.example.App.main",
                FactKind::Method(MethodFact {
                    target_class: "com.example.Dto".into(),
                    value: "run".into(),
                    return_type: Some("void".into()),
                    parameters: None,
                }),
            )
            .with_message("run() is gone"),
        );
        facts.insert(Fact::new(
            "com.example.App",
            FactKind::ResourceBundle(ResourceBundleFact {
                base_name: "Messages".into(),
                locales: ["".to_string(), "de".to_string()].into_iter().collect(),
            }),
        ));
        facts.insert(Fact::new(
            "com.example.model",
            FactKind::Serializable(SerializableFact {
                target_package: None,
                excludes: Default::default(),
            }),
        ));
        facts
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FactStore::in_project(dir.path());
        store.write(&sample()).unwrap();
        assert_eq!(store.try_read().unwrap(), sample());
    }

    #[test]
    fn test_write_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let store = FactStore::new(dir.path().join("facts.bin"));
        store.write(&sample()).unwrap();
        store.write(&FactSet::new()).unwrap();
        assert!(store.try_read().unwrap().is_empty());
    }

    #[test]
    fn test_missing_store_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FactStore::new(dir.path().join("absent.bin"));
        assert!(matches!(store.try_read(), Err(StoreError::NotFound(_))));
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_corrupt_store_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("facts.bin");
        std::fs::write(&path, b"not a fact store").unwrap();
        let store = FactStore::new(&path);
        assert!(matches!(store.try_read(), Err(StoreError::Decode(_))));
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_truncated_store_reads_as_empty() {
        let bytes = FactStore::encode(&sample()).unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(FactStore::decode(truncated).is_err());
    }

    #[test]
    fn test_version_mismatch() {
        let record = StoreFile {
            version: FORMAT_VERSION + 1,
            facts: sample(),
        };
        let mut bytes = MAGIC.to_vec();
        bytes.extend(bincode::serialize(&record).unwrap());
        assert!(matches!(
            FactStore::decode(&bytes),
            Err(StoreError::VersionMismatch { .. })
        ));
    }
}
