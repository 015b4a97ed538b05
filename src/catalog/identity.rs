use serde::{Deserialize, Serialize};
use std::fmt;

/// Dotted path identifying one logical data source across providers and zones
/// (e.g., `sst.daily`).
///
/// The id is derived from the position of a leaf in a provider's catalog tree;
/// it is a key, not a reference, and stays the same through every merge.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

/// Name of a catalog contributor offering its own driver bindings.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderName(pub String);

/// Name of a visibility scope in the zone definition.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneName(pub String);

impl SourceId {
    /// Join path segments with `.`.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let joined = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(".");
        SourceId(joined)
    }

    /// Split the id back into the catalog path it was derived from.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ProviderName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ZoneName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ZoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderName {
    fn from(value: &str) -> Self {
        ProviderName(value.to_string())
    }
}

impl From<&str> for ZoneName {
    fn from(value: &str) -> Self {
        ZoneName(value.to_string())
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        SourceId(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_joins_and_splits_segments() {
        let id = SourceId::from_segments(&["sst", "daily"]);
        assert_eq!(id.as_str(), "sst.daily");
        assert_eq!(id.segments().collect::<Vec<_>>(), vec!["sst", "daily"]);

        let single = SourceId::from_segments(&["orography"]);
        assert_eq!(single.segments().count(), 1);
    }

    #[test]
    fn names_serialize_transparently() {
        let provider = ProviderName::from("satellite");
        let serialized = serde_json::to_string(&provider).unwrap();
        assert_eq!(serialized, "\"satellite\"");
        let parsed: ProviderName = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, provider);

        let zone: ZoneName = serde_json::from_str("\"eu\"").unwrap();
        assert_eq!(zone.to_string(), "eu");
    }
}
