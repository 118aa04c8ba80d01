//! Verification of harvested facts.
//!
//! The [`Verifier`] reads a fact set back and checks each fact against:
//! - a [`TypeSystem`](attest_types::TypeSystem) for constructors, fields,
//!   methods and serializability
//! - a [`BundleLoader`](attest_bundles::BundleLoader) for resource bundle keys
//!
//! Each fact yields one [`CheckResult`]: passed, failed with a message, or
//! skipped with a reason.
//!
//! ```ignore
//! let config = AttestConfig::load(root);
//! let project = JavaProject::load(&root.join("src/main/java"))?;
//! let bundles = PropertiesLoader::new(config.bundle_roots(root));
//! let report = Verifier::from_config(&project.types, &bundles, &config)
//!     .verify_store(&config.store(root));
//! ```

mod config;
mod error;
mod report;
mod serial;
mod verifier;

pub use config::{
    AttestConfig, BundlesConfig, HarvestConfig, SerializableConfig, StoreConfig, VerifyConfig,
    schema,
};
pub use error::ConfigError;
pub use report::{CheckResult, Outcome, Report};
pub use serial::{SerialChecker, SerialFindings, SerialPolicy};
pub use verifier::Verifier;
