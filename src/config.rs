//! Run configuration for `combine-catalogs`.
//!
//! Values come from CLI flags first and environment variables second; the
//! binaries own argument parsing and hand the raw values to
//! [`CombineConfig::resolve`].

use crate::catalog::{CATALOG_FILE_NAME, ReaderOptions};
use crate::split_list;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Extra leaf drivers, comma- or whitespace-separated.
pub const LEAF_DRIVERS_ENV: &str = "ZONECAT_LEAF_DRIVERS";

pub const DEFAULT_INDEX_NAME: &str = "mlds.json";

#[derive(Clone, Debug)]
/// Fully resolved inputs and outputs of one combine run.
pub struct CombineConfig {
    pub zones_file: PathBuf,
    pub outdir: PathBuf,
    /// Root catalog whose top-level entries are the providers.
    pub catalog: PathBuf,
    pub reader: ReaderOptions,
    pub index_name: String,
}

impl CombineConfig {
    /// Apply defaults: the root catalog sits next to the zones file unless
    /// overridden, and leaf drivers from flags and `env_drivers` extend the
    /// built-in set.
    pub fn resolve(
        zones_file: PathBuf,
        outdir: PathBuf,
        catalog: Option<PathBuf>,
        leaf_drivers: &[String],
        env_drivers: Option<&str>,
        index_name: Option<String>,
    ) -> Result<Self> {
        let catalog = match catalog {
            Some(path) => path,
            None => default_root_catalog(&zones_file)?,
        };
        let mut extra: Vec<String> = leaf_drivers.to_vec();
        if let Some(raw) = env_drivers {
            extra.extend(split_list(raw));
        }
        Ok(CombineConfig {
            zones_file,
            outdir,
            catalog,
            reader: ReaderOptions::with_extra_drivers(extra),
            index_name: index_name.unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
        })
    }
}

/// `catalog.yaml` in the directory holding the zone definition.
pub fn default_root_catalog(zones_file: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(zones_file)
        .with_context(|| format!("resolving {}", zones_file.display()))?;
    let base = absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join(CATALOG_FILE_NAME))
}

/// Read `name` from the environment, treating empty values as unset.
pub fn env_non_empty(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
