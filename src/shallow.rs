//! Shallow merge of whole catalog documents.
//!
//! Unlike the provider merge, this does not look inside entries: each
//! document's top-level `sources` replace same-named entries from earlier
//! documents, and every entry is carried over verbatim, including keys the
//! typed model does not know about. Inputs only need the reader's top-level
//! shape (`sources` and nothing else).

use crate::catalog::schema::{SOURCES_KEY, check_top_level_keys};
use crate::error::CatalogError;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load the `sources` mapping of one catalog document without interpreting entries.
pub fn load_sources(path: &Path) -> Result<Map<String, Value>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let document: Value = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;

    let location = path.display().to_string();
    check_top_level_keys(&document, &location)?;
    match document.get(SOURCES_KEY) {
        Some(Value::Object(sources)) => Ok(sources.clone()),
        Some(Value::Null) | None => Ok(Map::new()),
        Some(_) => Err(CatalogError::schema(location, "'sources' must be a mapping").into()),
    }
}

/// Merge `sources` mappings in order; the last one to define a name wins.
///
/// A replaced name keeps the position where it was first defined.
pub fn merge_sources<I>(documents: I) -> Map<String, Value>
where
    I: IntoIterator<Item = Map<String, Value>>,
{
    let mut merged = Map::new();
    for sources in documents {
        for (name, entry) in sources {
            merged.insert(name, entry);
        }
    }
    merged
}

/// Load and merge the catalog files at `paths` into one `{sources: ...}` document.
pub fn merge_catalog_files<P: AsRef<Path>>(paths: &[P]) -> Result<Value> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let sources = load_sources(path)?;
        debug!(path = %path.display(), sources = sources.len(), "loaded catalog");
        documents.push(sources);
    }
    let mut merged = Map::new();
    merged.insert(SOURCES_KEY.to_string(), Value::Object(merge_sources(documents)));
    Ok(Value::Object(merged))
}

pub fn write_merged(document: &Value, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(document)
        .with_context(|| format!("serializing {}", path.display()))?;
    fs::write(path, yaml).with_context(|| format!("writing {}", path.display()))
}
