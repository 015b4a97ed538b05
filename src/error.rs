//! Error types for catalog reading, merging, and zone projection.

use crate::catalog::{ProviderName, SourceId, ZoneName};

/// Fatal conditions detected by the merge engine.
///
/// Every variant aborts the run; nothing is downgraded to a warning and no
/// output is emitted once one of these surfaces.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// An input document has an unexpected shape or an unrecognized driver.
    #[error("schema error in {location}: {reason}")]
    Schema { location: String, reason: String },

    /// Two records with different ids were handed to the merge operator.
    #[error(
        "trying to merge data sources with different ids: {left} != {right}, this is likely a bug in the caller"
    )]
    IdentityMismatch { left: SourceId, right: SourceId },

    /// Providers disagree on a field that must be provider-independent.
    #[error(
        "{field} of source {id} differs between providers {} and {}; make them identical or specify it only once and leave the others empty",
        provider_list(.left),
        provider_list(.right)
    )]
    Conflict {
        field: &'static str,
        id: SourceId,
        left: Vec<ProviderName>,
        right: Vec<ProviderName>,
    },

    /// The binding a zone selects declares no allowed values for a documented parameter.
    #[error(
        "source {id} in zone {zone} uses the binding of provider {provider}, which lists no allowed values for parameter '{parameter}'"
    )]
    UnboundParameter {
        zone: ZoneName,
        id: SourceId,
        provider: ProviderName,
        parameter: String,
    },

    /// A dotted id needs a sub-catalog where the zone already holds a leaf.
    #[error("source {id} cannot be placed in zone {zone}: '{segment}' is already a data source")]
    PathCollision {
        zone: ZoneName,
        id: SourceId,
        segment: String,
    },
}

impl CatalogError {
    pub(crate) fn schema(location: impl Into<String>, reason: impl Into<String>) -> Self {
        CatalogError::Schema {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

fn provider_list(providers: &[ProviderName]) -> String {
    let names = providers
        .iter()
        .map(ProviderName::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{names}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_field_id_and_providers() {
        let err = CatalogError::Conflict {
            field: "description",
            id: SourceId::from("sst.daily"),
            left: vec![ProviderName::from("satellite")],
            right: vec![ProviderName::from("reanalysis"), ProviderName::from("model")],
        };
        let message = err.to_string();
        assert!(message.starts_with("description of source sst.daily"));
        assert!(message.contains("[satellite] and [reanalysis, model]"));
    }
}
