//! Node configuration
//!
//! Configuration types and the parser for the `node.toml` text embedded in
//! the firmware image.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ConfigError};
pub use types::*;

use crate::pipeline::{Pipeline, PipelineBuilder, PipelineError};

impl NodeConfig {
    /// Validate the configured sensors into a pipeline layout
    pub fn pipeline(&self) -> Result<Pipeline, PipelineError> {
        self.sensors
            .iter()
            .cloned()
            .try_fold(PipelineBuilder::new(), PipelineBuilder::producer)
            .map(PipelineBuilder::build)
    }
}
