//! Resource bundles keyed by `(baseName, locale)`.
//!
//! A bundle is resolved the way `java.util.ResourceBundle` does it: the
//! requested locale's candidate list (`de_CH`, `de`, default) is searched in
//! order, the first hit is the bundle and its *effective* locale, the rest of
//! the list forms its parent chain.
//!
//! On top of a [`BundleLoader`]:
//! - [`missing_keys`] checks one bundle for a list of keys
//! - [`synchronize`] diffs the own key sets of several locales

mod error;
mod loader;
mod locale;
mod properties;
mod sync;

pub use error::BundleError;
pub use loader::{Bundle, BundleLoader, MemoryLoader, PropertiesLoader, missing_keys};
pub use locale::Locale;
pub use properties::parse_properties;
pub use sync::{SyncOutcome, synchronize};
