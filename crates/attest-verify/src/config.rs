//! Configuration for attest.
//!
//! Loads config from:
//! 1. Global: ~/.config/attest/config.toml
//! 2. Per-project: .attest/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! [store]
//! path = "build/attest/facts.bin"
//!
//! [bundles]
//! roots = ["src/main/resources"]
//!
//! [serializable]
//! marker = "java.io.Serializable"
//!
//! [verify]
//! parallel = false
//! ```

use std::path::{Path, PathBuf};

use attest_facts::{DEFAULT_STORE_PATH, FactStore, HarvestOptions};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, SerialPolicy};

/// Fact store location.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct StoreConfig {
    /// Store file, relative to the project root (default: target/attest/facts.bin).
    pub path: Option<PathBuf>,
}

/// Where `.properties` bundles are looked up.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct BundlesConfig {
    /// Resource roots, relative to the project root (default: src/main/resources,
    /// src/test/resources).
    pub roots: Option<Vec<PathBuf>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct HarvestConfig {
    /// Only recognize annotations declared in these packages. Empty accepts any.
    pub annotation_packages: Option<Vec<String>>,
}

/// Type names the serializability check is built on.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct SerializableConfig {
    pub marker: Option<String>,
    pub iterable: Option<String>,
    pub map: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct VerifyConfig {
    /// Check facts on the rayon pool (default: true).
    pub parallel: Option<bool>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(default)]
pub struct AttestConfig {
    pub store: StoreConfig,
    pub bundles: BundlesConfig,
    pub harvest: HarvestConfig,
    pub serializable: SerializableConfig,
    pub verify: VerifyConfig,
}

impl AttestConfig {
    /// Load configuration for a project.
    ///
    /// Unreadable or malformed files are logged and skipped, so a broken
    /// global config never stops verification.
    pub fn load(root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            config = config.merge_file(&global_path);
        }
        config.merge_file(&root.join(".attest").join("config.toml"))
    }

    /// Get the global config path.
    pub fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("attest").join("config.toml"))
    }

    /// Load one config file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn merge_file(self, path: &Path) -> Self {
        if !path.exists() {
            return self;
        }
        match Self::load_file(path) {
            Ok(other) => self.merge(other),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring config file");
                self
            }
        }
    }

    /// Merge another config into this one. Values set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            store: StoreConfig {
                path: other.store.path.or(self.store.path),
            },
            bundles: BundlesConfig {
                roots: other.bundles.roots.or(self.bundles.roots),
            },
            harvest: HarvestConfig {
                annotation_packages: other
                    .harvest
                    .annotation_packages
                    .or(self.harvest.annotation_packages),
            },
            serializable: SerializableConfig {
                marker: other.serializable.marker.or(self.serializable.marker),
                iterable: other.serializable.iterable.or(self.serializable.iterable),
                map: other.serializable.map.or(self.serializable.map),
            },
            verify: VerifyConfig {
                parallel: other.verify.parallel.or(self.verify.parallel),
            },
        }
    }

    pub fn store_path(&self, root: &Path) -> PathBuf {
        root.join(
            self.store
                .path
                .as_deref()
                .unwrap_or(Path::new(DEFAULT_STORE_PATH)),
        )
    }

    pub fn store(&self, root: &Path) -> FactStore {
        FactStore::new(self.store_path(root))
    }

    pub fn bundle_roots(&self, root: &Path) -> Vec<PathBuf> {
        match &self.bundles.roots {
            Some(roots) => roots.iter().map(|r| root.join(r)).collect(),
            None => vec![
                root.join("src").join("main").join("resources"),
                root.join("src").join("test").join("resources"),
            ],
        }
    }

    pub fn harvest_options(&self) -> HarvestOptions {
        HarvestOptions {
            annotation_packages: self.harvest.annotation_packages.clone().unwrap_or_default(),
        }
    }

    pub fn serial_policy(&self) -> SerialPolicy {
        let defaults = SerialPolicy::default();
        SerialPolicy {
            marker: self.serializable.marker.clone().unwrap_or(defaults.marker),
            iterable: self.serializable.iterable.clone().unwrap_or(defaults.iterable),
            map: self.serializable.map.clone().unwrap_or(defaults.map),
        }
    }

    pub fn parallel(&self) -> bool {
        self.verify.parallel.unwrap_or(true)
    }
}

/// JSON schema of the config file.
pub fn schema() -> schemars::Schema {
    schemars::schema_for!(AttestConfig)
}
