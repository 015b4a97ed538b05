//! End-to-end build of zoned catalogs and their all-or-nothing emission.
//!
//! `ZonedCatalogs::build` is pure: it either returns every zone tree and the
//! flat index, or the first error. `emit` stages all documents in a temporary
//! directory next to the output and only moves them into place once every
//! write has succeeded.

use crate::catalog::{
    CATALOG_FILE_NAME, CatalogDocument, CatalogTree, ProviderName, SourceEntry, ZoneName,
    read_catalog, write_catalog, write_document,
};
use crate::config::CombineConfig;
use crate::error::CatalogError;
use crate::index::{Availability, FlatIndex, build_index};
use crate::provider::{collect_records, providers_from_root};
use crate::zones::{ZoneDefinition, project_zone};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
/// Every zone's projected tree plus the flat index, ready to write.
pub struct ZonedCatalogs {
    pub zones: IndexMap<ZoneName, CatalogTree>,
    pub index: FlatIndex,
}

impl ZonedCatalogs {
    pub fn build(
        providers: &IndexMap<ProviderName, CatalogTree>,
        zones: &ZoneDefinition,
    ) -> Result<Self, CatalogError> {
        let records = collect_records(providers)?;

        let mut availability = Availability::default();
        let mut trees = IndexMap::with_capacity(zones.len());
        for (zone, visible) in zones.iter() {
            let unknown: BTreeSet<&str> = visible
                .iter()
                .filter(|provider| !providers.contains_key(*provider))
                .map(ProviderName::as_str)
                .collect();
            if !unknown.is_empty() {
                warn!(zone = %zone, providers = ?unknown, "zone lists providers that supply no catalog");
            }

            let projection = project_zone(zone, visible, &records)?;
            if projection.visible.is_empty() {
                warn!(zone = %zone, "zone sees no data sources");
            }
            availability.record(zone, &projection.visible);
            trees.insert(zone.clone(), projection.tree);
        }

        info!(
            sources = records.len(),
            providers = providers.len(),
            zones = zones.len(),
            "built zoned catalogs"
        );
        Ok(ZonedCatalogs {
            zones: trees,
            index: build_index(&records, &availability),
        })
    }

    /// Catalog of catalogs: one reference per zone, in zone order.
    pub fn top_level_document(&self) -> CatalogDocument {
        let mut document = CatalogDocument::default();
        for zone in self.zones.keys() {
            document.sources.insert(
                zone.0.clone(),
                SourceEntry::nested_reference(
                    zone.as_str(),
                    Some(format!("catalog as visible from {zone}")),
                ),
            );
        }
        document
    }

    /// Write zone catalogs, the flat index, and the top-level catalog under `outdir`.
    pub fn emit(&self, outdir: &Path, index_name: &str) -> Result<()> {
        let parent = outdir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        let staging = tempfile::Builder::new()
            .prefix(".zonecat-")
            .tempdir_in(parent)
            .with_context(|| format!("creating staging directory in {}", parent.display()))?;

        self.write_all(staging.path(), index_name)?;
        publish(staging.path(), outdir, parent)?;
        info!(outdir = %outdir.display(), zones = self.zones.len(), "wrote zoned catalogs");
        Ok(())
    }

    fn write_all(&self, dir: &Path, index_name: &str) -> Result<()> {
        for (zone, tree) in &self.zones {
            write_catalog(tree, &dir.join(zone.as_str()))
                .with_context(|| format!("writing catalog for zone {zone}"))?;
        }

        let index_path = dir.join(index_name);
        let file = File::create(&index_path)
            .with_context(|| format!("creating {}", index_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.index)
            .with_context(|| format!("writing {}", index_path.display()))?;
        writer
            .flush()
            .with_context(|| format!("flushing {}", index_path.display()))?;

        write_document(&self.top_level_document(), &dir.join(CATALOG_FILE_NAME))
    }
}

/// Move staged output into place as `outdir`.
///
/// An existing `outdir` is first moved aside into `parent` and restored if the
/// staged directory cannot take its place, so readers see either the previous
/// output or the new one in full.
fn publish(staging: &Path, outdir: &Path, parent: &Path) -> Result<()> {
    if !outdir.exists() {
        return fs::rename(staging, outdir).with_context(|| {
            format!("moving {} to {}", staging.display(), outdir.display())
        });
    }

    let previous = tempfile::Builder::new()
        .prefix(".zonecat-previous-")
        .tempdir_in(parent)
        .with_context(|| format!("creating backup directory in {}", parent.display()))?;
    let backup = previous.path().join("output");
    fs::rename(outdir, &backup)
        .with_context(|| format!("moving previous output {} aside", outdir.display()))?;

    if let Err(err) = fs::rename(staging, outdir) {
        fs::rename(&backup, outdir).with_context(|| {
            format!("restoring previous output {} from {}", outdir.display(), backup.display())
        })?;
        return Err(err)
            .with_context(|| format!("moving {} to {}", staging.display(), outdir.display()));
    }
    debug!(outdir = %outdir.display(), "replaced previous output");
    Ok(())
}

/// Read inputs named by `config`, build every zone, and emit the result.
pub fn combine(config: &CombineConfig) -> Result<ZonedCatalogs> {
    let zones = ZoneDefinition::load(&config.zones_file)?;
    let root = read_catalog(&config.catalog, &config.reader)
        .with_context(|| format!("reading root catalog {}", config.catalog.display()))?;
    let providers = providers_from_root(root)?;

    let zoned = ZonedCatalogs::build(&providers, &zones)?;
    zoned.emit(&config.outdir, &config.index_name)?;
    Ok(zoned)
}
