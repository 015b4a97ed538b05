//! Multi-provider records: one logical source across every provider.
//!
//! Providers may only differ in their raw driver bindings. Description,
//! parameter descriptors, and metadata are shared: a provider either repeats
//! them verbatim or leaves them empty, and any other divergence is a
//! `Conflict`.

use crate::catalog::{
    CatalogNode, CatalogTree, DataSourceRecord, ParameterDescriptor, ParameterEntry,
    ProviderName, RawDataSource, Scalar, SourceId,
};
use crate::error::CatalogError;
use crate::merge::{Merge, merge_all};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Aggregate of one logical source across providers.
pub struct MultiProviderRecord {
    pub id: SourceId,
    pub raw: IndexMap<ProviderName, RawDataSource>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameter_descriptors: IndexMap<String, ParameterDescriptor>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl MultiProviderRecord {
    /// Wrap one provider's leaf as a single-provider record.
    pub fn from_record(id: SourceId, provider: ProviderName, record: &DataSourceRecord) -> Self {
        let mut raw = IndexMap::new();
        raw.insert(provider, record.raw.clone());
        MultiProviderRecord {
            id,
            raw,
            description: record.description.clone(),
            parameter_descriptors: record.parameter_descriptors.clone(),
            metadata: record.metadata.clone(),
        }
    }

    pub fn providers(&self) -> Vec<ProviderName> {
        self.raw.keys().cloned().collect()
    }

    /// Documented parameters with `allowed` unioned over every provider.
    ///
    /// This is the set of values valid under *some* provider; it is for
    /// reporting only and never validates a specific binding.
    pub fn parameters(&self) -> IndexMap<String, ParameterEntry> {
        self.parameter_descriptors
            .iter()
            .map(|(name, descriptor)| {
                let allowed: BTreeSet<Scalar> = self
                    .raw
                    .values()
                    .filter_map(|raw| raw.allowed_parameters.get(name))
                    .flatten()
                    .cloned()
                    .collect();
                (
                    name.clone(),
                    ParameterEntry::from_descriptor(descriptor, allowed.into_iter().collect()),
                )
            })
            .collect()
    }
}

trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Blank for IndexMap<K, V> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for Map<String, Value> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

struct SharedField<'a> {
    id: &'a SourceId,
    left: &'a [ProviderName],
    right: &'a [ProviderName],
}

impl SharedField<'_> {
    fn pick<T: Blank + PartialEq>(
        &self,
        field: &'static str,
        left: T,
        right: T,
    ) -> Result<T, CatalogError> {
        if left.is_blank() {
            return Ok(right);
        }
        if !right.is_blank() && left != right {
            return Err(CatalogError::Conflict {
                field,
                id: self.id.clone(),
                left: self.left.to_vec(),
                right: self.right.to_vec(),
            });
        }
        Ok(left)
    }
}

impl Merge for MultiProviderRecord {
    /// Union of raw bindings (later provider wins on a shared key) with
    /// conflict-checked shared fields.
    fn merge(self, other: Self) -> Result<Self, CatalogError> {
        if self.id != other.id {
            return Err(CatalogError::IdentityMismatch {
                left: self.id,
                right: other.id,
            });
        }

        let left_providers = self.providers();
        let right_providers = other.providers();
        let shared = SharedField {
            id: &self.id,
            left: &left_providers,
            right: &right_providers,
        };
        let description = shared.pick("description", self.description, other.description)?;
        let parameter_descriptors = shared.pick(
            "parameter_descriptors",
            self.parameter_descriptors,
            other.parameter_descriptors,
        )?;
        let metadata = shared.pick("metadata", self.metadata, other.metadata)?;

        let mut raw = self.raw;
        raw.extend(other.raw);

        Ok(MultiProviderRecord {
            id: self.id,
            raw,
            description,
            parameter_descriptors,
            metadata,
        })
    }
}

/// Split a root catalog into its providers, one per top-level entry.
///
/// Provider order is the root's key order.
pub fn providers_from_root(
    root: CatalogTree,
) -> Result<IndexMap<ProviderName, CatalogTree>, CatalogError> {
    root.sources
        .into_iter()
        .map(|(name, node)| match node {
            CatalogNode::Catalog(tree) => Ok((ProviderName(name), tree)),
            CatalogNode::Source(_) => Err(CatalogError::schema(
                format!("provider '{name}'"),
                "top-level entries of the root catalog must be yaml_file_cat references",
            )),
        })
        .collect()
}

/// Flatten every provider and fold each id's records in provider order.
///
/// The result keeps ids in first-seen order.
pub fn collect_records(
    providers: &IndexMap<ProviderName, CatalogTree>,
) -> Result<IndexMap<SourceId, MultiProviderRecord>, CatalogError> {
    let mut grouped: IndexMap<SourceId, Vec<MultiProviderRecord>> = IndexMap::new();
    for (provider, tree) in providers {
        let mut count = 0usize;
        for (id, record) in tree.iter_sources() {
            grouped
                .entry(id.clone())
                .or_default()
                .push(MultiProviderRecord::from_record(id, provider.clone(), record));
            count += 1;
        }
        debug!(provider = %provider, sources = count, "flattened provider catalog");
    }

    let mut records = IndexMap::with_capacity(grouped.len());
    for (id, per_provider) in grouped {
        if let Some(merged) = merge_all(per_provider)? {
            records.insert(id, merged);
        }
    }
    Ok(records)
}
