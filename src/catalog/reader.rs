//! Catalog Tree Reader.
//!
//! Loads a catalog document from YAML, validates it, and recursively follows
//! `yaml_file_cat` references into nested trees. Every other entry must use a
//! recognized leaf driver and becomes a `DataSourceRecord`.

use crate::catalog::model::{CatalogDocument, DataSourceRecord, NESTED_CATALOG_DRIVER, SourceEntry};
use crate::catalog::schema::{SOURCES_KEY, validate_document};
use crate::catalog::tree::{CatalogNode, CatalogTree};
use crate::error::CatalogError;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder in reference paths that resolves to the referencing document's directory.
pub const CATALOG_DIR_PLACEHOLDER: &str = "CATALOG_DIR";

const DEFAULT_LEAF_DRIVERS: &[&str] = &["zarr"];

#[derive(Clone, Debug)]
/// Reader settings: which driver tags denote data-source leaves.
pub struct ReaderOptions {
    pub leaf_drivers: BTreeSet<String>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            leaf_drivers: DEFAULT_LEAF_DRIVERS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl ReaderOptions {
    /// Default drivers plus `extra`.
    pub fn with_extra_drivers<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = ReaderOptions::default();
        options.leaf_drivers.extend(extra.into_iter().map(Into::into));
        options
    }
}

/// Parse and validate one catalog document without following references.
pub fn load_document(path: &Path) -> Result<CatalogDocument> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut value: Value = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;

    let location = path.display().to_string();
    validate_document(&value, &location)?;

    // `sources:` with nothing under it parses as null.
    if let Some(sources) = value.get_mut(SOURCES_KEY) {
        if sources.is_null() {
            *sources = Value::Object(Default::default());
        }
    }

    let document: CatalogDocument = serde_json::from_value(value)
        .map_err(|err| CatalogError::schema(&location, err.to_string()))?;
    Ok(document)
}

/// Read the catalog at `path` and every catalog it references.
pub fn read_catalog(path: &Path, options: &ReaderOptions) -> Result<CatalogTree> {
    let mut visiting = Vec::new();
    read_catalog_inner(path, options, &mut visiting)
}

fn read_catalog_inner(
    path: &Path,
    options: &ReaderOptions,
    visiting: &mut Vec<PathBuf>,
) -> Result<CatalogTree> {
    let canonical = fs::canonicalize(path)
        .with_context(|| format!("resolving catalog path {}", path.display()))?;
    if visiting.contains(&canonical) {
        return Err(CatalogError::schema(
            path.display().to_string(),
            "catalog references itself through a cycle of yaml_file_cat entries",
        )
        .into());
    }

    let document = load_document(path)?;
    let catalog_dir = canonical
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    visiting.push(canonical);
    let mut sources = IndexMap::new();
    for (name, entry) in &document.sources {
        check_source_name(name)
            .map_err(|reason| CatalogError::schema(path.display().to_string(), reason))?;
        let node = parse_source(name, entry, path, &catalog_dir, options, visiting)?;
        sources.insert(name.clone(), node);
    }
    visiting.pop();

    Ok(CatalogTree {
        sources,
        location: Some(catalog_dir),
        description: None,
    })
}

fn parse_source(
    name: &str,
    entry: &SourceEntry,
    path: &Path,
    catalog_dir: &Path,
    options: &ReaderOptions,
    visiting: &mut Vec<PathBuf>,
) -> Result<CatalogNode> {
    if entry.driver == NESTED_CATALOG_DRIVER {
        let location = format!("{} (source '{name}')", path.display());
        let template = entry
            .args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CatalogError::schema(&location, "yaml_file_cat entry needs a string args.path")
            })?;
        let child_path = resolve_reference(template, catalog_dir)
            .map_err(|reason| CatalogError::schema(&location, reason))?;
        debug!(source = name, path = %child_path.display(), "following nested catalog");
        let child = read_catalog_inner(&child_path, options, visiting)
            .with_context(|| {
                format!("reading catalog referenced by '{name}' in {}", path.display())
            })?;
        return Ok(CatalogNode::Catalog(
            child.with_description(entry.description.clone()),
        ));
    }

    if !options.leaf_drivers.contains(&entry.driver) {
        return Err(CatalogError::schema(
            format!("{} (source '{name}')", path.display()),
            format!(
                "unrecognized driver '{}', expected {NESTED_CATALOG_DRIVER} or one of {:?}",
                entry.driver, options.leaf_drivers
            ),
        )
        .into());
    }

    Ok(CatalogNode::Source(DataSourceRecord::from_entry(entry)))
}

/// Names become id segments and output directories.
pub(crate) fn check_source_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("invalid source name '{name}'"));
    }
    if let Some(bad) = name.chars().find(|c| matches!(c, '.' | '/' | '\\')) {
        return Err(format!("source name '{name}' must not contain '{bad}'"));
    }
    Ok(())
}

/// Substitute `{{CATALOG_DIR}}` and anchor relative results at `catalog_dir`.
fn resolve_reference(template: &str, catalog_dir: &Path) -> Result<PathBuf, String> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or_else(|| format!("unterminated placeholder in '{template}'"))?;
        let placeholder = after_open[..end].trim();
        if placeholder != CATALOG_DIR_PLACEHOLDER {
            return Err(format!(
                "unknown placeholder '{placeholder}' in '{template}', only {CATALOG_DIR_PLACEHOLDER} is supported"
            ));
        }
        rendered.push_str(&catalog_dir.to_string_lossy());
        rest = &after_open[end + 2..];
    }
    rendered.push_str(rest);

    let resolved = PathBuf::from(rendered);
    if resolved.is_absolute() {
        Ok(resolved)
    } else {
        Ok(catalog_dir.join(resolved))
    }
}
