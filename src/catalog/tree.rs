//! Nested catalog trees and their depth-first flattening.

use crate::catalog::identity::SourceId;
use crate::catalog::model::DataSourceRecord;
use indexmap::IndexMap;
use indexmap::map::Iter;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
/// A child of a catalog: either another catalog or a leaf record.
pub enum CatalogNode {
    Catalog(CatalogTree),
    Source(DataSourceRecord),
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Named mapping of children, in document order.
///
/// Trees are values: merging or projecting always builds a new tree.
pub struct CatalogTree {
    pub sources: IndexMap<String, CatalogNode>,
    /// Directory of the document the tree was read from.
    pub location: Option<PathBuf>,
    pub description: Option<String>,
}

impl CatalogTree {
    pub fn new(sources: IndexMap<String, CatalogNode>) -> Self {
        CatalogTree {
            sources,
            location: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Look up a node by its path segments.
    pub fn get<'a, I>(&self, path: I) -> Option<&CatalogNode>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut segments = path.into_iter();
        let mut node = self.sources.get(segments.next()?)?;
        for segment in segments {
            match node {
                CatalogNode::Catalog(tree) => node = tree.sources.get(segment)?,
                CatalogNode::Source(_) => return None,
            }
        }
        Some(node)
    }

    /// Leaf record at a dotted id, if the tree has one.
    pub fn source(&self, id: &SourceId) -> Option<&DataSourceRecord> {
        match self.get(id.segments())? {
            CatalogNode::Source(record) => Some(record),
            CatalogNode::Catalog(_) => None,
        }
    }

    /// Depth-first `(dotted id, leaf)` pairs in key insertion order.
    pub fn iter_sources(&self) -> Sources<'_> {
        Sources {
            stack: vec![(Vec::new(), self.sources.iter())],
        }
    }
}

/// Lazy flattening iterator returned by [`CatalogTree::iter_sources`].
pub struct Sources<'a> {
    stack: Vec<(Vec<&'a str>, Iter<'a, String, CatalogNode>)>,
}

impl<'a> Iterator for Sources<'a> {
    type Item = (SourceId, &'a DataSourceRecord);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, children) = self.stack.last_mut()?;
            let Some((name, node)) = children.next() else {
                self.stack.pop();
                continue;
            };
            let mut path = prefix.clone();
            path.push(name.as_str());
            match node {
                CatalogNode::Source(record) => {
                    return Some((SourceId::from_segments(&path), record));
                }
                CatalogNode::Catalog(child) => {
                    self.stack.push((path, child.sources.iter()));
                }
            }
        }
    }
}
