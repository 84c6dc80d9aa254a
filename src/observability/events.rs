//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events in groundcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded
    ConfigLoaded,
    /// Schema registry populated
    SchemasLoaded,
    /// Payload matched its schema
    ValidationComplete,
    /// Payload rejected
    ValidationRejected,
    /// Value mapped back to wire names
    SerializationComplete,
    /// Value rejected while serializing
    SerializationRejected,
    /// HTTP server listening
    Serving,
    /// HTTP server stopped
    ShutdownComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::ValidationComplete => "VALIDATION_COMPLETE",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::SerializationComplete => "SERIALIZATION_COMPLETE",
            Event::SerializationRejected => "SERIALIZATION_REJECTED",
            Event::Serving => "GROUNDCAST_SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
        }
    }

    /// Returns true if the event reports a rejected payload
    pub fn is_rejection(&self) -> bool {
        matches!(self, Event::ValidationRejected | Event::SerializationRejected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
