use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::{BundleError, Locale, parse_properties};

/// A resolved bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    /// Effective locale tag; differs from the requested one after a fallback.
    pub locale: String,
    /// Keys defined by the effective bundle itself.
    pub own_keys: BTreeSet<String>,
    /// Keys visible through the bundle, parents included.
    pub keys: BTreeSet<String>,
}

/// Locale-aware bundle lookup.
///
/// Implementors provide exact lookup; [`BundleLoader::load`] layers the
/// candidate-locale fallback on top.
pub trait BundleLoader: Send + Sync {
    /// Keys of the bundle for exactly this canonical locale tag, if it exists.
    fn bundle_keys(&self, base_name: &str, locale: &str)
    -> Result<Option<BTreeSet<String>>, BundleError>;

    fn load(&self, base_name: &str, locale: &str) -> Result<Bundle, BundleError> {
        let mut found: Option<Bundle> = None;
        for candidate in Locale::parse(locale).candidates() {
            let tag = candidate.tag();
            let Some(keys) = self.bundle_keys(base_name, &tag)? else {
                continue;
            };
            match &mut found {
                None => {
                    found = Some(Bundle {
                        locale: tag,
                        own_keys: keys.clone(),
                        keys,
                    });
                }
                Some(bundle) => bundle.keys.extend(keys),
            }
        }
        found.ok_or_else(|| BundleError::NotFound {
            base_name: base_name.to_string(),
            locale: locale.to_string(),
        })
    }
}

/// Keys from `keys` the bundle does not contain (parents included), in order.
pub fn missing_keys(
    loader: &dyn BundleLoader,
    base_name: &str,
    locale: Option<&str>,
    keys: &[String],
) -> Result<Vec<String>, BundleError> {
    let bundle = loader.load(base_name, locale.unwrap_or_default())?;
    Ok(keys
        .iter()
        .filter(|k| !bundle.keys.contains(*k))
        .cloned()
        .collect())
}

/// Loads `<base/name/path>[_<locale>].properties` from a list of roots.
///
/// The base name's dots become path separators, as on a class path. The first
/// root holding a file wins.
#[derive(Debug, Clone, Default)]
pub struct PropertiesLoader {
    roots: Vec<PathBuf>,
}

impl PropertiesLoader {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn relative_path(base_name: &str, locale: &str) -> PathBuf {
        let stem = base_name.replace('.', "/");
        if locale.is_empty() {
            PathBuf::from(format!("{}.properties", stem))
        } else {
            PathBuf::from(format!("{}_{}.properties", stem, locale))
        }
    }

    fn read(path: &Path) -> Result<String, BundleError> {
        let bytes = std::fs::read(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // UTF-8 first, ISO-8859-1 otherwise, as PropertyResourceBundle does
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
        })
    }
}

impl BundleLoader for PropertiesLoader {
    fn bundle_keys(
        &self,
        base_name: &str,
        locale: &str,
    ) -> Result<Option<BTreeSet<String>>, BundleError> {
        let relative = Self::relative_path(base_name, locale);
        for root in &self.roots {
            let path = root.join(&relative);
            if path.is_file() {
                let text = Self::read(&path)?;
                tracing::debug!(path = %path.display(), "loaded resource bundle");
                return Ok(Some(parse_properties(&text).into_keys().collect()));
            }
        }
        Ok(None)
    }
}

/// Bundles held in memory, keyed by base name and canonical locale tag.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    bundles: BTreeMap<(String, String), BTreeSet<String>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, base_name: &str, locale: &str, keys: &[&str]) -> Self {
        self.insert(base_name, locale, keys.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn insert(&mut self, base_name: &str, locale: &str, keys: BTreeSet<String>) {
        self.bundles
            .insert((base_name.to_string(), Locale::parse(locale).tag()), keys);
    }
}

impl BundleLoader for MemoryLoader {
    fn bundle_keys(
        &self,
        base_name: &str,
        locale: &str,
    ) -> Result<Option<BTreeSet<String>>, BundleError> {
        Ok(self
            .bundles
            .get(&(base_name.to_string(), locale.to_string()))
            .cloned())
    }
}
