//! Flat index of every logical source with its zone availability.
//!
//! The index is the only document the report generator reads. It lists each
//! multi-provider record regardless of whether any zone can see it, plus the
//! sorted zones that can.

use crate::catalog::{SourceId, ZoneName};
use crate::provider::MultiProviderRecord;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One id's entry in the flat index document.
pub struct IndexEntry {
    #[serde(flatten)]
    pub record: MultiProviderRecord,
    pub available_at: Vec<ZoneName>,
}

#[derive(Clone, Debug, Default)]
/// Zones in which each id survived projection.
pub struct Availability {
    by_id: BTreeMap<SourceId, BTreeSet<ZoneName>>,
}

impl Availability {
    pub fn record<'a, I>(&mut self, zone: &ZoneName, visible: I)
    where
        I: IntoIterator<Item = &'a SourceId>,
    {
        for id in visible {
            self.by_id
                .entry(id.clone())
                .or_default()
                .insert(zone.clone());
        }
    }

    /// Lexicographically sorted zones for `id`; empty when no zone sees it.
    pub fn zones_for(&self, id: &SourceId) -> Vec<ZoneName> {
        self.by_id
            .get(id)
            .map(|zones| zones.iter().cloned().collect())
            .unwrap_or_default()
    }
}

pub type FlatIndex = IndexMap<SourceId, IndexEntry>;

/// Attach availability to every record, keeping record order.
pub fn build_index(
    records: &IndexMap<SourceId, MultiProviderRecord>,
    availability: &Availability,
) -> FlatIndex {
    records
        .iter()
        .map(|(id, record)| {
            (
                id.clone(),
                IndexEntry {
                    record: record.clone(),
                    available_at: availability.zones_for(id),
                },
            )
        })
        .collect()
}
