//! The merge operator (⊕) for each catalog entity kind.
//!
//! Every kind implements [`Merge`]; [`merge_optional`] adds the `None`
//! identity so `a ⊕ None == a` and `None ⊕ a == a` hold uniformly. Merges
//! consume their operands and return a new value.

use crate::catalog::{CatalogNode, CatalogTree, DataSourceRecord};
use crate::error::CatalogError;
use indexmap::IndexMap;

/// Left-to-right merge of two values of the same kind.
pub trait Merge: Sized {
    fn merge(self, other: Self) -> Result<Self, CatalogError>;
}

/// `left ⊕ right` with `None` as the identity element.
pub fn merge_optional<T: Merge>(
    left: Option<T>,
    right: Option<T>,
) -> Result<Option<T>, CatalogError> {
    match (left, right) {
        (None, other) | (other, None) => Ok(other),
        (Some(left), Some(right)) => left.merge(right).map(Some),
    }
}

/// Fold `items` in iteration order; empty input yields `None`.
pub fn merge_all<T, I>(items: I) -> Result<Option<T>, CatalogError>
where
    T: Merge,
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .try_fold(None, |acc, item| merge_optional(acc, Some(item)))
}

impl Merge for DataSourceRecord {
    /// The later record replaces the earlier one.
    fn merge(self, other: Self) -> Result<Self, CatalogError> {
        Ok(other)
    }
}

impl Merge for CatalogTree {
    /// Key-wise union; shared names merge recursively.
    fn merge(self, other: Self) -> Result<Self, CatalogError> {
        merge_tree_at(self, other, &mut Vec::new())
    }
}

impl Merge for CatalogNode {
    fn merge(self, other: Self) -> Result<Self, CatalogError> {
        merge_node_at(self, other, &mut Vec::new())
    }
}

fn merge_tree_at(
    left: CatalogTree,
    mut right: CatalogTree,
    path: &mut Vec<String>,
) -> Result<CatalogTree, CatalogError> {
    let mut sources = IndexMap::with_capacity(left.sources.len().max(right.sources.len()));
    for (name, node) in left.sources {
        let merged = match right.sources.shift_remove(&name) {
            Some(other) => {
                path.push(name.clone());
                let merged = merge_node_at(node, other, path)?;
                path.pop();
                merged
            }
            None => node,
        };
        sources.insert(name, merged);
    }
    sources.extend(right.sources);

    Ok(CatalogTree {
        sources,
        location: left.location.or(right.location),
        description: left.description.or(right.description),
    })
}

fn merge_node_at(
    left: CatalogNode,
    right: CatalogNode,
    path: &mut Vec<String>,
) -> Result<CatalogNode, CatalogError> {
    match (left, right) {
        (CatalogNode::Catalog(left), CatalogNode::Catalog(right)) => {
            merge_tree_at(left, right, path).map(CatalogNode::Catalog)
        }
        (CatalogNode::Source(left), CatalogNode::Source(right)) => {
            left.merge(right).map(CatalogNode::Source)
        }
        (CatalogNode::Catalog(_), CatalogNode::Source(_))
        | (CatalogNode::Source(_), CatalogNode::Catalog(_)) => Err(CatalogError::schema(
            path.join("."),
            "name is a nested catalog on one side of the merge and a data source on the other",
        )),
    }
}
