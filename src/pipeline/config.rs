//! Pipeline configuration, loaded from YAML

use crate::enrich::EnrichStrategy;
use crate::service::FieldMapping;
use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MAX_RESULTS: usize = 100;
pub const MAX_RESULTS_LIMIT: usize = 10_000;
/// SWEREF 99 TM
pub const DEFAULT_WKID: u32 = 3006;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("max_results must be between 1 and 10000, got {0}")]
    MaxResults(usize),

    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("data source not configured: {0}")]
    MissingDataSource(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

impl Default for SpatialReference {
    fn default() -> Self {
        Self { wkid: DEFAULT_WKID }
    }
}

/// Settings for one selection pipeline.
///
/// ```yaml
/// property_data_source_id: parcels
/// owner_data_source_id: owners
/// allowed_hosts: [maps.example.se]
/// data_sources:
///   parcels: { url: "https://maps.example.se/arcgis/rest/services/Fastighet/MapServer/0" }
///   owners:  { url: "https://maps.example.se/arcgis/rest/services/Agare/MapServer/1" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub property_data_source_id: String,
    pub owner_data_source_id: String,
    pub max_results: usize,
    pub enable_toggle_removal: bool,
    pub enable_pii_masking: bool,
    pub allowed_hosts: Vec<String>,
    pub enable_batch_owner_query: bool,
    pub relationship_id: Option<u32>,
    pub data_sources: BTreeMap<String, DataSourceConfig>,
    pub fields: FieldMapping,
    pub spatial_reference: SpatialReference,
    /// Overrides for placeholder texts, by translation key
    pub messages: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            property_data_source_id: String::new(),
            owner_data_source_id: String::new(),
            max_results: DEFAULT_MAX_RESULTS,
            enable_toggle_removal: true,
            enable_pii_masking: true,
            allowed_hosts: Vec::new(),
            enable_batch_owner_query: false,
            relationship_id: None,
            data_sources: BTreeMap::new(),
            fields: FieldMapping::default(),
            spatial_reference: SpatialReference::default(),
            messages: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Config with both data sources registered under the given ids.
    pub fn new(
        property_data_source_id: impl Into<String>,
        property_url: impl Into<String>,
        owner_data_source_id: impl Into<String>,
        owner_url: impl Into<String>,
    ) -> Self {
        let property_id = property_data_source_id.into();
        let owner_id = owner_data_source_id.into();
        Self {
            property_data_source_id: property_id.clone(),
            owner_data_source_id: owner_id.clone(),
            ..Self::default()
        }
        .with_data_source(property_id, property_url)
        .with_data_source(owner_id, owner_url)
    }

    pub fn with_data_source(mut self, id: impl Into<String>, url: impl Into<String>) -> Self {
        self.data_sources
            .insert(id.into(), DataSourceConfig { url: url.into() });
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_toggle_removal(mut self, enabled: bool) -> Self {
        self.enable_toggle_removal = enabled;
        self
    }

    pub fn with_pii_masking(mut self, enabled: bool) -> Self {
        self.enable_pii_masking = enabled;
        self
    }

    pub fn with_allowed_hosts(mut self, hosts: Vec<String>) -> Self {
        self.allowed_hosts = hosts;
        self
    }

    /// Enable the batch strategy over `relationship_id`.
    pub fn with_batch_owner_query(mut self, relationship_id: u32) -> Self {
        self.enable_batch_owner_query = true;
        self.relationship_id = Some(relationship_id);
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.display(), sources = config.data_sources.len(), "Loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_results) {
            return Err(ConfigError::MaxResults(self.max_results));
        }
        if self.property_data_source_id.trim().is_empty() {
            return Err(ConfigError::MissingSetting("property_data_source_id"));
        }
        if self.owner_data_source_id.trim().is_empty() {
            return Err(ConfigError::MissingSetting("owner_data_source_id"));
        }
        for id in [&self.property_data_source_id, &self.owner_data_source_id] {
            if !self.data_sources.contains_key(id) {
                return Err(ConfigError::MissingDataSource(id.clone()));
            }
        }
        Ok(())
    }

    /// Batch only when enabled and a relationship is configured.
    pub fn strategy(&self) -> EnrichStrategy {
        match (self.enable_batch_owner_query, self.relationship_id) {
            (true, Some(relationship_id)) => EnrichStrategy::Batch { relationship_id },
            _ => EnrichStrategy::Individual,
        }
    }

    /// `max_results` forced into the supported range.
    pub fn effective_max_results(&self) -> usize {
        self.max_results.clamp(1, MAX_RESULTS_LIMIT)
    }

    pub fn data_source_url(&self, id: &str) -> ValidationResult<&str> {
        self.data_sources
            .get(id)
            .map(|source| source.url.as_str())
            .ok_or_else(|| ValidationError::MissingDataSource(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
property_data_source_id: parcels
owner_data_source_id: owners
max_results: 25
allowed_hosts: [maps.example.se]
enable_batch_owner_query: true
relationship_id: 4
data_sources:
  parcels:
    url: https://maps.example.se/arcgis/rest/services/Fastighet/MapServer/0
  owners:
    url: https://maps.example.se/arcgis/rest/services/Agare/MapServer/1
fields:
  owner:
    name: AGARE_NAMN
messages:
  unknownOwner: Okänd ägare
"#;

    #[test]
    fn parses_yaml_with_defaults() {
        let config = PipelineConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.max_results, 25);
        assert!(config.enable_toggle_removal);
        assert!(config.enable_pii_masking);
        assert_eq!(config.spatial_reference.wkid, DEFAULT_WKID);
        assert_eq!(config.fields.owner.name, "AGARE_NAMN");
        assert_eq!(config.fields.owner.address, "ADRESS");
        assert_eq!(config.messages["unknownOwner"], "Okänd ägare");
        assert_eq!(config.strategy(), EnrichStrategy::Batch { relationship_id: 4 });
    }

    #[test]
    fn batch_needs_a_relationship() {
        let mut config = PipelineConfig::from_yaml_str(YAML).unwrap();
        config.relationship_id = None;
        assert_eq!(config.strategy(), EnrichStrategy::Individual);
    }

    #[test]
    fn rejects_out_of_range_max_results() {
        let yaml = YAML.replace("max_results: 25", "max_results: 0");
        let err = PipelineConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MaxResults(0)));
    }

    #[test]
    fn rejects_unknown_data_source_reference() {
        let yaml = YAML.replace("owner_data_source_id: owners", "owner_data_source_id: missing");
        let err = PipelineConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDataSource(id) if id == "missing"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();
        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.data_sources.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn builder_registers_sources() {
        let config = PipelineConfig::new("p", "https://a.se/x/MapServer/0", "o", "https://a.se/x/MapServer/1")
            .with_max_results(3);
        assert!(config.validate().is_ok());
        assert_eq!(config.data_source_url("o").unwrap(), "https://a.se/x/MapServer/1");
        assert_eq!(
            config.data_source_url("z"),
            Err(ValidationError::MissingDataSource("z".into()))
        );
    }
}
