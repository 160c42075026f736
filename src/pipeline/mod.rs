//! Pipeline orchestration, configuration, caches, and messages

mod cache;
mod config;
mod error;
mod messages;
mod orchestrator;

#[cfg(test)]
mod integration_tests;

pub use cache::{BoundedCache, FormatCache, LayerCache, FORMAT_CACHE_CAPACITY, LAYER_CACHE_CAPACITY};
pub use config::{
    ConfigError, DataSourceConfig, PipelineConfig, SpatialReference, DEFAULT_MAX_RESULTS, DEFAULT_WKID,
    MAX_RESULTS_LIMIT,
};
pub use error::PipelineError;
pub use messages::{keys, Messages, Translate};
pub use orchestrator::SelectionPipeline;
