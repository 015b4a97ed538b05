//! JSON Schema for catalog documents.
//!
//! Documents are parsed from YAML into `serde_json::Value` and checked here
//! before being deserialized, so shape problems surface as `Schema` errors
//! with every violation listed instead of a single serde message.

use crate::error::CatalogError;
use jsonschema::JSONSchema;
use serde_json::{Value, json};

/// The only top-level key a catalog document may carry.
pub const SOURCES_KEY: &str = "sources";

fn catalog_document_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["sources"],
        "additionalProperties": false,
        "properties": {
            "sources": {
                "type": ["object", "null"],
                "additionalProperties": {"$ref": "#/definitions/entry"}
            }
        },
        "definitions": {
            "scalar": {"type": ["string", "number", "boolean"]},
            "entry": {
                "type": "object",
                "required": ["driver", "args"],
                "properties": {
                    "driver": {"type": "string", "minLength": 1},
                    "args": {"type": "object"},
                    "description": {"type": "string"},
                    "metadata": {"type": "object"},
                    "parameters": {
                        "type": "object",
                        "additionalProperties": {
                            "type": "object",
                            "required": ["default", "type", "allowed"],
                            "properties": {
                                "default": {"$ref": "#/definitions/scalar"},
                                "type": {"type": "string"},
                                "description": {"type": "string"},
                                "allowed": {
                                    "type": "array",
                                    "items": {"$ref": "#/definitions/scalar"}
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Reject documents whose top level is anything other than `{sources: ...}`.
pub fn check_top_level_keys(document: &Value, location: &str) -> Result<(), CatalogError> {
    let Some(object) = document.as_object() else {
        return Err(CatalogError::schema(
            location,
            "catalog document must be a mapping",
        ));
    };
    let unexpected: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|key| *key != SOURCES_KEY)
        .collect();
    if !unexpected.is_empty() {
        return Err(CatalogError::schema(
            location,
            format!(
                "can't handle catalogs which not only have sources (found {})",
                unexpected.join(", ")
            ),
        ));
    }
    if !object.contains_key(SOURCES_KEY) {
        return Err(CatalogError::schema(location, "missing 'sources' mapping"));
    }
    Ok(())
}

/// Validate the full document shape, listing every violation.
pub fn validate_document(document: &Value, location: &str) -> Result<(), CatalogError> {
    check_top_level_keys(document, location)?;

    let schema = catalog_document_schema();
    let compiled = JSONSchema::compile(&schema).map_err(|err| {
        CatalogError::schema(location, format!("compiling catalog schema: {err}"))
    })?;

    if let Err(errors) = compiled.validate(document) {
        let details = errors
            .map(|err| format!("{} at {}", err, err.instance_path))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(CatalogError::schema(
            location,
            format!("catalog failed schema validation:\n{details}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minimal_leaf_and_nested_entries() {
        let doc = json!({
            "sources": {
                "ocean": {"driver": "yaml_file_cat", "args": {"path": "{{CATALOG_DIR}}/ocean/catalog.yaml"}},
                "orography": {"driver": "zarr", "args": {"urlpath": "x.zarr"}}
            }
        });
        validate_document(&doc, "catalog.yaml").expect("valid document");
    }

    #[test]
    fn rejects_extra_top_level_keys() {
        let doc = json!({"sources": {}, "metadata": {"version": 1}});
        let err = validate_document(&doc, "catalog.yaml").expect_err("extra key");
        match err {
            CatalogError::Schema { location, reason } => {
                assert_eq!(location, "catalog.yaml");
                assert!(reason.contains("metadata"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_parameters_without_allowed_values() {
        let doc = json!({
            "sources": {
                "sst": {
                    "driver": "zarr",
                    "args": {},
                    "parameters": {"zoom": {"default": 0, "type": "int"}}
                }
            }
        });
        let err = validate_document(&doc, "catalog.yaml").expect_err("missing allowed");
        assert!(err.to_string().contains("allowed"), "{err}");
    }

    #[test]
    fn rejects_non_mapping_documents() {
        let err = check_top_level_keys(&json!(["sources"]), "list.yaml").expect_err("list");
        assert!(err.to_string().contains("must be a mapping"));
    }
}
