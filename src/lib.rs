//! Shared library for the zoned catalog helpers.
//!
//! The crate reads per-provider catalog trees, folds every provider's variant
//! of a logical source into one multi-provider record, and projects those
//! records into one catalog per zone. Public functions here form the contract
//! the binaries depend on: catalog reading and writing, the merge operators,
//! zone projection, and the flat index consumed by report tooling.

pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod merge;
pub mod pipeline;
pub mod provider;
pub mod shallow;
pub mod zones;

pub use catalog::{
    CATALOG_FILE_NAME, CatalogDocument, CatalogNode, CatalogTree, DataSourceRecord,
    ParameterDescriptor, ParameterEntry, ProviderName, RawDataSource, ReaderOptions, Scalar,
    SourceEntry, SourceId, ZoneName, load_document, read_catalog, write_catalog,
};
pub use config::CombineConfig;
pub use error::CatalogError;
pub use index::{Availability, FlatIndex, IndexEntry, build_index};
pub use merge::{Merge, merge_all, merge_optional};
pub use pipeline::{ZonedCatalogs, combine};
pub use provider::{MultiProviderRecord, collect_records, providers_from_root};
pub use zones::{ZoneDefinition, ZoneProjection, join, project_zone, select_binding};

/// Install the stderr subscriber used by the helper binaries.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects `debug` over `warn`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    // A second install (e.g., from tests) keeps the existing subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Split comma- or whitespace-delimited configuration lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
