//! Catalog documents and trees.
//!
//! This module covers reading provider catalogs from YAML, the in-memory tree
//! of nested catalogs and leaf records, and writing trees back out. Merging
//! lives in `crate::merge`; the types here only describe and flatten trees.

pub mod identity;
pub mod model;
pub mod reader;
pub mod schema;
pub mod tree;
pub mod writer;

pub use identity::{ProviderName, SourceId, ZoneName};
pub use model::{
    CatalogDocument, DataSourceRecord, NESTED_CATALOG_DRIVER, ParameterDescriptor,
    ParameterEntry, RawDataSource, Scalar, SourceEntry,
};
pub use reader::{ReaderOptions, load_document, read_catalog};
pub use tree::{CatalogNode, CatalogTree, Sources};
pub use writer::{CATALOG_FILE_NAME, tree_to_document, write_catalog, write_document};
