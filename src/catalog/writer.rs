//! Catalog Tree Writer: one `catalog.yaml` per nested level.

use crate::catalog::model::{CatalogDocument, SourceEntry};
use crate::catalog::tree::{CatalogNode, CatalogTree};
use crate::error::CatalogError;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const CATALOG_FILE_NAME: &str = "catalog.yaml";

/// Render one level of a tree; sub-trees become `yaml_file_cat` references.
pub fn tree_to_document(tree: &CatalogTree) -> Result<CatalogDocument, CatalogError> {
    let mut document = CatalogDocument::default();
    for (name, node) in &tree.sources {
        let entry = match node {
            CatalogNode::Catalog(child) => {
                SourceEntry::nested_reference(name, child.description.clone())
            }
            CatalogNode::Source(record) => record.to_entry().map_err(|err| match err {
                CatalogError::Schema { location, reason } => {
                    CatalogError::schema(format!("source '{name}', {location}"), reason)
                }
                other => other,
            })?,
        };
        document.sources.insert(name.clone(), entry);
    }
    Ok(document)
}

pub fn write_document(document: &CatalogDocument, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(document)
        .with_context(|| format!("serializing {}", path.display()))?;
    fs::write(path, yaml).with_context(|| format!("writing {}", path.display()))
}

/// Write `tree` under `dir`, recursing into `dir/<name>/` for every sub-tree.
pub fn write_catalog(tree: &CatalogTree, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let document = tree_to_document(tree)?;
    write_document(&document, &dir.join(CATALOG_FILE_NAME))?;

    for (name, node) in &tree.sources {
        if let CatalogNode::Catalog(child) = node {
            write_catalog(child, &dir.join(name))?;
        }
    }
    Ok(())
}
