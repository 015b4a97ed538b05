//! Zone definitions and per-zone projection.
//!
//! A zone lists the providers it may use, lowest priority first. Projecting a
//! multi-provider record into a zone keeps the binding of the last listed
//! provider that supplies the source; a record with no listed provider is
//! invisible to that zone.

use crate::catalog::{
    CatalogNode, CatalogTree, DataSourceRecord, ProviderName, RawDataSource, SourceId, ZoneName,
};
use crate::error::CatalogError;
use crate::provider::MultiProviderRecord;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
/// Zone name → visible providers, highest priority last.
pub struct ZoneDefinition {
    pub zones: IndexMap<ZoneName, Vec<ProviderName>>,
}

impl ZoneDefinition {
    /// Read and validate a zone definition document.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let definition: ZoneDefinition = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing zone definition {}", path.display()))?;
        definition.validate(&path.display().to_string())?;
        Ok(definition)
    }

    /// Zone names must be usable as directory names; provider names must not be empty.
    pub fn validate(&self, location: &str) -> Result<(), CatalogError> {
        for (zone, providers) in &self.zones {
            let name = zone.as_str();
            if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
                return Err(CatalogError::schema(
                    location,
                    format!("invalid zone name '{name}'"),
                ));
            }
            if providers.iter().any(|p| p.as_str().trim().is_empty()) {
                return Err(CatalogError::schema(
                    location,
                    format!("zone '{name}' lists an empty provider name"),
                ));
            }
            let unique: BTreeSet<&ProviderName> = providers.iter().collect();
            if unique.len() != providers.len() {
                warn!(zone = %zone, "zone lists a provider more than once; only the last occurrence counts");
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ZoneName, &[ProviderName])> {
        self.zones
            .iter()
            .map(|(zone, providers)| (zone, providers.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// The provider whose binding `visible` selects, with that binding.
pub fn select_binding<'a>(
    record: &'a MultiProviderRecord,
    visible: &[ProviderName],
) -> Option<(&'a ProviderName, &'a RawDataSource)> {
    visible
        .iter()
        .filter_map(|provider| record.raw.get_key_value(provider))
        .last()
}

/// The record as seen through `visible`, or `None` if no listed provider has it.
pub fn join(record: &MultiProviderRecord, visible: &[ProviderName]) -> Option<DataSourceRecord> {
    let (_, raw) = select_binding(record, visible)?;
    Some(bind(record, raw))
}

fn bind(record: &MultiProviderRecord, raw: &RawDataSource) -> DataSourceRecord {
    DataSourceRecord {
        raw: raw.clone(),
        description: record.description.clone(),
        parameter_descriptors: record.parameter_descriptors.clone(),
        metadata: record.metadata.clone(),
    }
}

/// Projected tree for one zone plus the ids it can see, in record order.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneProjection {
    pub tree: CatalogTree,
    pub visible: Vec<SourceId>,
}

/// Project every record into one zone.
pub fn project_zone(
    zone: &ZoneName,
    visible: &[ProviderName],
    records: &IndexMap<SourceId, MultiProviderRecord>,
) -> Result<ZoneProjection, CatalogError> {
    let mut pending = PendingTree::default();
    let mut seen = Vec::new();
    for (id, record) in records {
        let Some((provider, raw)) = select_binding(record, visible) else {
            continue;
        };
        let unbound = record
            .parameter_descriptors
            .keys()
            .find(|name| !raw.allowed_parameters.contains_key(*name));
        if let Some(parameter) = unbound {
            return Err(CatalogError::UnboundParameter {
                zone: zone.clone(),
                id: id.clone(),
                provider: provider.clone(),
                parameter: parameter.clone(),
            });
        }
        let projected = bind(record, raw);
        pending
            .insert(id, projected)
            .map_err(|segment| CatalogError::PathCollision {
                zone: zone.clone(),
                id: id.clone(),
                segment,
            })?;
        seen.push(id.clone());
    }
    debug!(zone = %zone, sources = seen.len(), "projected zone");

    Ok(ZoneProjection {
        tree: pending.into_tree(),
        visible: seen,
    })
}

enum PendingNode {
    Branch(PendingTree),
    Leaf(DataSourceRecord),
}

/// Path-segment trie collecting a zone's leaves before the tree is built.
#[derive(Default)]
struct PendingTree {
    children: IndexMap<String, PendingNode>,
}

impl PendingTree {
    /// Returns the offending segment when the id's path runs into a leaf.
    fn insert(&mut self, id: &SourceId, record: DataSourceRecord) -> Result<(), String> {
        let segments: Vec<&str> = id.segments().collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(String::new());
        };

        let mut level = self;
        for segment in parents {
            let node = level
                .children
                .entry(segment.to_string())
                .or_insert_with(|| PendingNode::Branch(PendingTree::default()));
            level = match node {
                PendingNode::Branch(branch) => branch,
                PendingNode::Leaf(_) => return Err(segment.to_string()),
            };
        }

        if level.children.contains_key(*last) {
            return Err(last.to_string());
        }
        level
            .children
            .insert(last.to_string(), PendingNode::Leaf(record));
        Ok(())
    }

    fn into_tree(self) -> CatalogTree {
        CatalogTree::new(
            self.children
                .into_iter()
                .map(|(name, node)| {
                    let node = match node {
                        PendingNode::Branch(branch) => CatalogNode::Catalog(branch.into_tree()),
                        PendingNode::Leaf(record) => CatalogNode::Source(record),
                    };
                    (name, node)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tree::tests::leaf;
    use crate::catalog::{ParameterDescriptor, Scalar};
    use crate::merge::Merge;

    fn record(id: &str, bindings: &[(&str, &str)]) -> MultiProviderRecord {
        bindings
            .iter()
            .map(|(provider, driver)| {
                MultiProviderRecord::from_record(
                    SourceId::from(id),
                    ProviderName::from(*provider),
                    &leaf(driver),
                )
            })
            .reduce(|acc, next| acc.merge(next).unwrap())
            .unwrap()
    }

    fn providers(names: &[&str]) -> Vec<ProviderName> {
        names.iter().map(|n| ProviderName::from(*n)).collect()
    }

    #[test]
    fn last_listed_and_present_provider_wins() {
        let mlds = record("sst", &[("a", "driver-x"), ("b", "driver-y")]);
        let forward = join(&mlds, &providers(&["a", "b"])).unwrap();
        assert_eq!(forward.raw.driver, "driver-y");
        let reversed = join(&mlds, &providers(&["b", "a"])).unwrap();
        assert_eq!(reversed.raw.driver, "driver-x");
        let skipping = join(&mlds, &providers(&["b", "missing"])).unwrap();
        assert_eq!(skipping.raw.driver, "driver-y");
    }

    #[test]
    fn unlisted_providers_make_source_invisible() {
        let mlds = record("sst", &[("a", "driver-x")]);
        assert!(join(&mlds, &providers(&["c", "d"])).is_none());
        assert!(join(&mlds, &[]).is_none());
    }

    #[test]
    fn projection_rebuilds_nested_tree() {
        let mut records = IndexMap::new();
        for id in ["sst.daily", "sst.monthly", "orography", "atmos.winds.u10"] {
            records.insert(SourceId::from(id), record(id, &[("a", "zarr")]));
        }
        records.insert(SourceId::from("hidden"), record("hidden", &[("b", "zarr")]));

        let projection = project_zone(&ZoneName::from("eu"), &providers(&["a"]), &records).unwrap();
        let ids: Vec<String> = projection.tree.iter_sources().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec!["sst.daily", "sst.monthly", "orography", "atmos.winds.u10"]);
        assert_eq!(projection.visible.len(), 4);
        assert!(matches!(projection.tree.sources["sst"], CatalogNode::Catalog(_)));
    }

    #[test]
    fn leaf_blocking_a_path_is_a_collision() {
        let mut records = IndexMap::new();
        records.insert(SourceId::from("sst"), record("sst", &[("a", "zarr")]));
        records.insert(SourceId::from("sst.daily"), record("sst.daily", &[("b", "zarr")]));

        let zone = ZoneName::from("eu");
        let err = project_zone(&zone, &providers(&["a", "b"]), &records).expect_err("collision");
        assert!(matches!(err, CatalogError::PathCollision { ref segment, .. } if segment == "sst"));

        // Each provider alone is consistent.
        assert!(project_zone(&zone, &providers(&["a"]), &records).is_ok());
    }

    #[test]
    fn validate_rejects_bad_names() {
        let mut definition = ZoneDefinition::default();
        definition.zones.insert(ZoneName::from("eu"), providers(&["a", ""]));
        assert!(definition.validate("zones.yaml").is_err());

        let mut definition = ZoneDefinition::default();
        definition.zones.insert(ZoneName::from("../up"), providers(&["a"]));
        assert!(definition.validate("zones.yaml").is_err());

        let mut definition = ZoneDefinition::default();
        definition.zones.insert(ZoneName::from("eu"), providers(&["a", "b", "a"]));
        assert!(definition.validate("zones.yaml").is_ok());
    }

    #[test]
    fn zone_definition_keeps_document_order() {
        let definition: ZoneDefinition =
            serde_yaml::from_str("us: [satellite]\neu: [satellite, reanalysis]\n").unwrap();
        let zones: Vec<&str> = definition.iter().map(|(zone, _)| zone.as_str()).collect();
        assert_eq!(zones, vec!["us", "eu"]);
        assert_eq!(
            definition.zones[&ZoneName::from("eu")],
            providers(&["satellite", "reanalysis"])
        );
    }

    #[test]
    fn selected_binding_must_list_documented_parameters() {
        let bare = MultiProviderRecord::from_record(
            SourceId::from("sst"),
            ProviderName::from("reanalysis"),
            &leaf("zarr"),
        );
        let mut documented = leaf("zarr");
        documented.parameter_descriptors.insert(
            "zoom".into(),
            ParameterDescriptor {
                default: Scalar::Int(0),
                kind: "int".into(),
                description: String::new(),
            },
        );
        documented
            .raw
            .allowed_parameters
            .insert("zoom".into(), vec![Scalar::Int(0)]);
        let documented = MultiProviderRecord::from_record(
            SourceId::from("sst"),
            ProviderName::from("satellite"),
            &documented,
        );
        let mut records = IndexMap::new();
        records.insert(SourceId::from("sst"), documented.merge(bare).unwrap());

        let zone = ZoneName::from("us");
        let err = project_zone(&zone, &providers(&["reanalysis"]), &records)
            .expect_err("reanalysis binding has no allowed zoom values");
        match &err {
            CatalogError::UnboundParameter {
                zone,
                id,
                provider,
                parameter,
            } => {
                assert_eq!(zone.as_str(), "us");
                assert_eq!(id.as_str(), "sst");
                assert_eq!(provider.as_str(), "reanalysis");
                assert_eq!(parameter, "zoom");
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(err.to_string().contains("provider reanalysis"));

        let projection = project_zone(&zone, &providers(&["satellite"]), &records).unwrap();
        assert!(projection.tree.source(&SourceId::from("sst")).is_some());
    }
}
