//! Pipeline assembly
//!
//! Collects producer configurations and validates them before any task is
//! spawned. Each producer gets its own priority so the bus arbiter always has
//! a strict order to serve them in.

use heapless::Vec;

use super::message::{payload_tag, sensor_name, SensorName, STARTUP_NAME};
use super::{PipelineError, Priority, MAX_PRODUCERS};

/// Static description of one sensor producer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProducerConfig {
    pub name: SensorName,
    pub poll_interval_ms: u32,
    pub priority: Priority,
}

impl ProducerConfig {
    pub fn new(name: &str, poll_interval_ms: u32, priority: Priority) -> Self {
        Self {
            name: sensor_name(name),
            poll_interval_ms,
            priority,
        }
    }
}

/// Validated producer layout, most urgent first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    producers: Vec<ProducerConfig, MAX_PRODUCERS>,
}

impl Pipeline {
    pub fn producers(&self) -> &[ProducerConfig] {
        &self.producers
    }

    /// Priority of the display consumer
    pub fn display_priority(&self) -> Priority {
        Priority::Background
    }
}

#[derive(Default)]
pub struct PipelineBuilder {
    producers: Vec<ProducerConfig, MAX_PRODUCERS>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn producer(mut self, config: ProducerConfig) -> Result<Self, PipelineError> {
        if config.name.is_empty() || config.name == STARTUP_NAME {
            return Err(PipelineError::ReservedName);
        }
        if config.priority == Priority::Background {
            return Err(PipelineError::ReservedPriority);
        }
        if config.poll_interval_ms == 0 {
            return Err(PipelineError::InvalidInterval);
        }
        if self.producers.iter().any(|p| p.name == config.name) {
            return Err(PipelineError::DuplicateName);
        }
        if self
            .producers
            .iter()
            .any(|p| payload_tag(&p.name) == payload_tag(&config.name))
        {
            return Err(PipelineError::DuplicateTag);
        }
        if self.producers.iter().any(|p| p.priority == config.priority) {
            return Err(PipelineError::DuplicatePriority);
        }

        self.producers
            .push(config)
            .map_err(|_| PipelineError::TooManyProducers)?;
        Ok(self)
    }

    pub fn build(mut self) -> Pipeline {
        self.producers.sort_unstable_by_key(|p| p.priority);
        Pipeline {
            producers: self.producers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_most_urgent_first() {
        let pipeline = PipelineBuilder::new()
            .producer(ProducerConfig::new("hum", 2000, Priority::Low))
            .unwrap()
            .producer(ProducerConfig::new("tmp", 1000, Priority::Critical))
            .unwrap()
            .producer(ProducerConfig::new("alt", 1500, Priority::Normal))
            .unwrap()
            .build();

        let names: std::vec::Vec<&str> = pipeline.producers().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["tmp", "alt", "hum"]);
        assert_eq!(pipeline.display_priority(), Priority::Background);
    }

    #[test]
    fn test_rejects_duplicates() {
        let builder = PipelineBuilder::new()
            .producer(ProducerConfig::new("tmp", 1000, Priority::High))
            .unwrap();

        assert_eq!(
            builder
                .producer(ProducerConfig::new("tmp", 500, Priority::Low))
                .err(),
            Some(PipelineError::DuplicateName)
        );

        let builder = PipelineBuilder::new()
            .producer(ProducerConfig::new("tmp", 1000, Priority::High))
            .unwrap();
        assert_eq!(
            builder
                .producer(ProducerConfig::new("hum", 1000, Priority::High))
                .err(),
            Some(PipelineError::DuplicatePriority)
        );
    }

    #[test]
    fn test_rejects_shared_payload_tag() {
        let builder = PipelineBuilder::new()
            .producer(ProducerConfig::new("tmp", 1000, Priority::High))
            .unwrap();

        assert_eq!(
            builder
                .producer(ProducerConfig::new("tem", 1000, Priority::Low))
                .err(),
            Some(PipelineError::DuplicateTag)
        );
    }

    #[test]
    fn test_rejects_reserved() {
        assert_eq!(
            PipelineBuilder::new()
                .producer(ProducerConfig::new("000", 1000, Priority::High))
                .err(),
            Some(PipelineError::ReservedName)
        );
        assert_eq!(
            PipelineBuilder::new()
                .producer(ProducerConfig::new("tmp", 1000, Priority::Background))
                .err(),
            Some(PipelineError::ReservedPriority)
        );
        assert_eq!(
            PipelineBuilder::new()
                .producer(ProducerConfig::new("tmp", 0, Priority::High))
                .err(),
            Some(PipelineError::InvalidInterval)
        );
    }

    #[test]
    fn test_at_most_four_producers() {
        let builder = PipelineBuilder::new()
            .producer(ProducerConfig::new("a", 100, Priority::Critical))
            .unwrap()
            .producer(ProducerConfig::new("b", 100, Priority::High))
            .unwrap()
            .producer(ProducerConfig::new("c", 100, Priority::Normal))
            .unwrap()
            .producer(ProducerConfig::new("d", 100, Priority::Low))
            .unwrap();

        assert_eq!(builder.build().producers().len(), MAX_PRODUCERS);
    }
}
