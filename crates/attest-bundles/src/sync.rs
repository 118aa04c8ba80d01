//! Key-set synchronization across the locales of one bundle.

use std::collections::{BTreeMap, BTreeSet};

use crate::{BundleError, BundleLoader, Locale};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Fewer than two distinct locales: nothing to compare.
    Skipped { distinct: usize },
    /// Requested locales served by no bundle or only by a fallback, as given.
    MissingLocales(Vec<String>),
    /// Per requested locale, the keys other locales define but it does not.
    AbsentKeys(BTreeMap<String, Vec<String>>),
    Synchronized,
}

/// Compare the own key sets of `base_name` across `locales`.
///
/// Locale tags are compared in canonical form, so `de-CH` and `de_CH` are one
/// locale.
pub fn synchronize(
    loader: &dyn BundleLoader,
    base_name: &str,
    locales: &BTreeSet<String>,
) -> SyncOutcome {
    let mut requested: BTreeMap<String, &str> = BTreeMap::new();
    for tag in locales {
        requested.entry(Locale::parse(tag).tag()).or_insert(tag.as_str());
    }
    if requested.len() < 2 {
        return SyncOutcome::Skipped {
            distinct: requested.len(),
        };
    }

    let mut keys: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    let mut missing = Vec::new();
    for (canonical, &tag) in &requested {
        match loader.load(base_name, canonical) {
            Ok(bundle) if &bundle.locale == canonical => {
                keys.insert(tag, bundle.own_keys);
            }
            Ok(bundle) => {
                tracing::debug!(base_name, locale = tag, effective = %bundle.locale, "bundle resolved by fallback");
                missing.push(tag.to_string());
            }
            Err(BundleError::NotFound { .. }) => missing.push(tag.to_string()),
            Err(e) => {
                tracing::warn!(base_name, locale = tag, error = %e, "unreadable resource bundle");
                missing.push(tag.to_string());
            }
        }
    }
    if !missing.is_empty() {
        return SyncOutcome::MissingLocales(missing);
    }

    let union: BTreeSet<&String> = keys.values().flatten().collect();
    let absent: BTreeMap<String, Vec<String>> = keys
        .iter()
        .filter_map(|(tag, own)| {
            let gaps: Vec<String> = union
                .iter()
                .filter(|k| !own.contains(**k))
                .map(|k| k.to_string())
                .collect();
            (!gaps.is_empty()).then(|| (tag.to_string(), gaps))
        })
        .collect();

    if absent.is_empty() {
        SyncOutcome::Synchronized
    } else {
        SyncOutcome::AbsentKeys(absent)
    }
}
