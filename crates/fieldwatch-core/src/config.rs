//! Engine configuration.

use std::fmt;

use fieldwatch_proto::ExternalChange;

/// Hook that receives the external form of every emitted record.
///
/// This is the last in-process stop before any off-process transport; the
/// transport itself (message bus, queue, log) lives with the collaborator
/// that installs the hook.
pub type EmitFn = Box<dyn Fn(&ExternalChange) + Send + Sync>;

/// Configuration for a [`Monitor`](crate::Monitor).
///
/// Carries the publisher identity stamped into every emitted record, the
/// topic name transports may route by, and the optional emitter hook.
pub struct Config {
    publisher_name: String,
    producer_topic: String,
    emitter: Option<EmitFn>,
}

impl Config {
    /// Create a configuration with default publisher and topic names and
    /// no emitter.
    pub fn new() -> Self {
        Self {
            publisher_name: "fieldwatch".to_string(),
            producer_topic: "fieldwatch".to_string(),
            emitter: None,
        }
    }

    /// Set the publisher name stamped into emitted records.
    pub fn with_publisher_name(mut self, name: impl Into<String>) -> Self {
        self.publisher_name = name.into();
        self
    }

    /// Set the topic name transports may route by.
    pub fn with_producer_topic(mut self, topic: impl Into<String>) -> Self {
        self.producer_topic = topic.into();
        self
    }

    /// Install the emitter hook.
    pub fn with_emitter<F>(mut self, emitter: F) -> Self
    where
        F: Fn(&ExternalChange) + Send + Sync + 'static,
    {
        self.emitter = Some(Box::new(emitter));
        self
    }

    /// The publisher name.
    pub fn publisher_name(&self) -> &str {
        &self.publisher_name
    }

    /// The producer topic.
    pub fn producer_topic(&self) -> &str {
        &self.producer_topic
    }

    /// The emitter hook, when installed.
    pub fn emitter(&self) -> Option<&EmitFn> {
        self.emitter.as_ref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("publisher_name", &self.publisher_name)
            .field("producer_topic", &self.producer_topic)
            .field("emitter", &self.emitter.is_some())
            .finish()
    }
}
