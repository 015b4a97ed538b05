use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn combine_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_combine-catalogs"))
}

pub fn merge_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_merge-catalogs"))
}

pub fn write_file(root: &Path, rel: &str, contents: &str) -> Result<PathBuf> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Entry pointing at `<name>/catalog.yaml` next to the referencing document.
pub fn nested(name: &str) -> String {
    format!(
        "  {name}:\n    driver: yaml_file_cat\n    args:\n      path: \"{{{{CATALOG_DIR}}}}/{name}/catalog.yaml\"\n"
    )
}

/// Leaf with a `zoom` parameter shared by every provider.
pub fn zoom_leaf(name: &str, urlpath: &str, allowed: &[i64], description: Option<&str>) -> String {
    let allowed = allowed
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let mut entry = format!(
        "  {name}:\n    driver: zarr\n    args:\n      urlpath: {urlpath}\n    parameters:\n      zoom:\n        default: 0\n        type: int\n        description: HEALPix zoom level\n        allowed: [{allowed}]\n"
    );
    if let Some(text) = description {
        entry.push_str(&format!("    description: {text}\n"));
    }
    entry
}

/// Two providers (`satellite`, `reanalysis`) each offering `sst.daily`, plus
/// a satellite-only `clouds` source, and zones `eu`/`us`.
pub fn write_sst_fixture(root: &Path) -> Result<PathBuf> {
    write_file(
        root,
        "catalog.yaml",
        &format!("sources:\n{}{}", nested("satellite"), nested("reanalysis")),
    )?;
    write_file(
        root,
        "satellite/catalog.yaml",
        &format!(
            "sources:\n{}  clouds:\n    driver: zarr\n    args:\n      urlpath: s3://satellite/clouds.zarr\n",
            nested("sst")
        ),
    )?;
    write_file(
        root,
        "satellite/sst/catalog.yaml",
        &format!(
            "sources:\n{}",
            zoom_leaf(
                "daily",
                "s3://satellite/sst.zarr",
                &[0, 1],
                Some("Daily sea surface temperature")
            )
        ),
    )?;
    write_file(
        root,
        "reanalysis/catalog.yaml",
        &format!("sources:\n{}", nested("sst")),
    )?;
    write_file(
        root,
        "reanalysis/sst/catalog.yaml",
        &format!(
            "sources:\n{}",
            zoom_leaf("daily", "s3://reanalysis/sst.zarr", &[0], None)
        ),
    )?;
    write_file(
        root,
        "zones.yaml",
        "eu: [satellite, reanalysis]\nus: [satellite]\n",
    )
}
