//! Data-source records and the on-disk entry types they are read from.
//!
//! `SourceEntry` mirrors one entry in a catalog document's `sources` mapping;
//! `DataSourceRecord` is the resolved leaf built from it. The split keeps the
//! provider-specific binding (`RawDataSource`) apart from the descriptive
//! fields that must agree across providers.

use crate::error::CatalogError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Driver tag for an entry that points at another catalog document.
pub const NESTED_CATALOG_DRIVER: &str = "yaml_file_cat";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
/// Parameter value as it appears in `default` or `allowed`.
///
/// Ordering puts booleans before numbers before strings and compares numbers
/// by exact value, so `1` and `1.0` are the same allowed value.
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn rank(&self) -> u8 {
        match self {
            Scalar::Bool(_) => 0,
            Scalar::Int(_) | Scalar::Float(_) => 1,
            Scalar::Str(_) => 2,
        }
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Float(b)) => cmp_int_float(*a, *b),
            (Scalar::Float(a), Scalar::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Scalar::Float(a), Scalar::Float(b)) => {
                a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))
            }
            (Scalar::Str(a), Scalar::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Exact comparison of an integer with a float; NaN sorts by sign, as in `total_cmp`.
fn cmp_int_float(int: i64, float: f64) -> Ordering {
    // 2^63, the first float above i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() {
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if float >= LIMIT {
        return Ordering::Less;
    }
    if float < -LIMIT {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    // In range and integral, so the cast is exact.
    match int.cmp(&(whole as i64)) {
        Ordering::Equal if float > whole => Ordering::Less,
        Ordering::Equal if float < whole => Ordering::Greater,
        other => other,
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Documented default, declared type, and description of one parameter.
pub struct ParameterDescriptor {
    pub default: Scalar,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One provider's concrete binding for a logical source.
pub struct RawDataSource {
    pub driver: String,
    pub args: Map<String, Value>,
    pub allowed_parameters: IndexMap<String, Vec<Scalar>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Parameter block of a catalog entry: descriptor fields plus `allowed`.
pub struct ParameterEntry {
    pub default: Scalar,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub allowed: Vec<Scalar>,
}

impl ParameterEntry {
    pub fn from_descriptor(descriptor: &ParameterDescriptor, allowed: Vec<Scalar>) -> Self {
        ParameterEntry {
            default: descriptor.default.clone(),
            kind: descriptor.kind.clone(),
            description: descriptor.description.clone(),
            allowed,
        }
    }

    fn descriptor(&self) -> ParameterDescriptor {
        ParameterDescriptor {
            default: self.default.clone(),
            kind: self.kind.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One entry of a catalog document's `sources` mapping.
///
/// Nested catalog references only carry `driver`, `args.path`, and an optional
/// description; leaves carry every field.
pub struct SourceEntry {
    pub driver: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, ParameterEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SourceEntry {
    /// Entry pointing at `<CATALOG_DIR>/<name>/catalog.yaml`.
    pub fn nested_reference(name: &str, description: Option<String>) -> Self {
        let mut args = Map::new();
        args.insert(
            "path".to_string(),
            Value::String(format!("{{{{CATALOG_DIR}}}}/{name}/catalog.yaml")),
        );
        SourceEntry {
            driver: NESTED_CATALOG_DRIVER.to_string(),
            args,
            parameters: None,
            metadata: None,
            description,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// A catalog document: exactly one `sources` mapping.
pub struct CatalogDocument {
    pub sources: IndexMap<String, SourceEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A fully resolved leaf as read from one provider's catalog.
pub struct DataSourceRecord {
    pub raw: RawDataSource,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameter_descriptors: IndexMap<String, ParameterDescriptor>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl DataSourceRecord {
    pub fn from_entry(entry: &SourceEntry) -> Self {
        let parameters = entry.parameters.clone().unwrap_or_default();
        let raw = RawDataSource {
            driver: entry.driver.clone(),
            args: entry.args.clone(),
            allowed_parameters: parameters
                .iter()
                .map(|(name, param)| (name.clone(), param.allowed.clone()))
                .collect(),
        };
        DataSourceRecord {
            raw,
            description: entry.description.clone().unwrap_or_default(),
            parameter_descriptors: parameters
                .iter()
                .map(|(name, param)| (name.clone(), param.descriptor()))
                .collect(),
            metadata: entry.metadata.clone().unwrap_or_default(),
        }
    }

    /// Descriptor fields joined with the values this binding allows.
    ///
    /// Fails when a declared parameter has no `allowed` list in the binding.
    pub fn parameters(&self) -> Result<IndexMap<String, ParameterEntry>, CatalogError> {
        self.parameter_descriptors
            .iter()
            .map(|(name, descriptor)| {
                let allowed = self.raw.allowed_parameters.get(name).ok_or_else(|| {
                    CatalogError::schema(
                        format!("parameter '{name}'"),
                        format!(
                            "declared, but the {} binding lists no allowed values for it",
                            self.raw.driver
                        ),
                    )
                })?;
                Ok((
                    name.clone(),
                    ParameterEntry::from_descriptor(descriptor, allowed.clone()),
                ))
            })
            .collect()
    }

    pub fn to_entry(&self) -> Result<SourceEntry, CatalogError> {
        Ok(SourceEntry {
            driver: self.raw.driver.clone(),
            args: self.raw.args.clone(),
            parameters: Some(self.parameters()?),
            metadata: Some(self.metadata.clone()),
            description: Some(self.description.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_entry() -> SourceEntry {
        serde_json::from_value(json!({
            "driver": "zarr",
            "args": {"urlpath": "s3://bucket/sst.zarr"},
            "parameters": {
                "zoom": {"default": 1, "type": "int", "description": "zoom level", "allowed": [0, 1]}
            },
            "description": "sea surface temperature",
            "metadata": {"units": "K"}
        }))
        .unwrap()
    }

    #[test]
    fn from_entry_splits_binding_and_descriptors() {
        let record = DataSourceRecord::from_entry(&sample_entry());
        assert_eq!(record.raw.driver, "zarr");
        assert_eq!(
            record.raw.allowed_parameters["zoom"],
            vec![Scalar::Int(0), Scalar::Int(1)]
        );
        let zoom = &record.parameter_descriptors["zoom"];
        assert_eq!(zoom.default, Scalar::Int(1));
        assert_eq!(zoom.kind, "int");
        assert_eq!(record.description, "sea surface temperature");
        assert_eq!(record.metadata.get("units"), Some(&json!("K")));
    }

    #[test]
    fn from_entry_defaults_missing_optional_fields() {
        let entry: SourceEntry =
            serde_json::from_value(json!({"driver": "zarr", "args": {}})).unwrap();
        let record = DataSourceRecord::from_entry(&entry);
        assert!(record.description.is_empty());
        assert!(record.metadata.is_empty());
        assert!(record.parameter_descriptors.is_empty());
        assert!(record.raw.allowed_parameters.is_empty());
    }

    #[test]
    fn to_entry_restores_the_source_entry() {
        let entry = sample_entry();
        let record = DataSourceRecord::from_entry(&entry);
        assert_eq!(record.to_entry().unwrap(), entry);
    }

    #[test]
    fn parameters_reject_missing_allowed_values() {
        let mut record = DataSourceRecord::from_entry(&sample_entry());
        record.raw.allowed_parameters.clear();
        let err = record.parameters().expect_err("missing allowed list must fail");
        assert!(err.to_string().contains("zoom"));
    }

    #[test]
    fn scalars_order_by_kind_then_value() {
        let mut values = vec![
            Scalar::from("b"),
            Scalar::Float(0.5),
            Scalar::Int(2),
            Scalar::Bool(true),
            Scalar::from("a"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Scalar::Bool(true),
                Scalar::Float(0.5),
                Scalar::Int(2),
                Scalar::from("a"),
                Scalar::from("b"),
            ]
        );
        assert_eq!(Scalar::Int(1), Scalar::Float(1.0));
    }

    #[test]
    fn large_integers_compare_exactly_with_floats() {
        let two_53 = 1_i64 << 53;
        assert_eq!(Scalar::Int(two_53), Scalar::Float(two_53 as f64));
        assert!(Scalar::Int(two_53 + 1) > Scalar::Float(two_53 as f64));
        assert!(Scalar::Int(i64::MAX) < Scalar::Float(9_223_372_036_854_775_808.0));
        assert!(Scalar::Int(i64::MIN) == Scalar::Float(-9_223_372_036_854_775_808.0));
        assert!(Scalar::Int(0) < Scalar::Float(0.5));
        assert!(Scalar::Int(-1) < Scalar::Float(-0.5));
        assert!(Scalar::Int(0) > Scalar::Float(-0.5));
        assert_eq!(Scalar::Float(-0.0), Scalar::Int(0));
        assert_eq!(Scalar::Float(-0.0), Scalar::Float(0.0));
        assert!(Scalar::Int(i64::MAX) < Scalar::Float(f64::INFINITY));
        assert!(Scalar::Int(i64::MIN) > Scalar::Float(f64::NEG_INFINITY));

        let set: std::collections::BTreeSet<Scalar> = [
            Scalar::Int(two_53 + 1),
            Scalar::Float(two_53 as f64),
            Scalar::Int(two_53),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn nested_reference_uses_catalog_dir_placeholder() {
        let entry = SourceEntry::nested_reference("ocean", Some("ocean data".into()));
        assert_eq!(entry.driver, NESTED_CATALOG_DRIVER);
        assert_eq!(
            entry.args.get("path"),
            Some(&json!("{{CATALOG_DIR}}/ocean/catalog.yaml"))
        );
        let yaml = serde_yaml::to_string(&entry).unwrap();
        assert!(!yaml.contains("parameters"));
        assert!(!yaml.contains("metadata"));
    }
}
