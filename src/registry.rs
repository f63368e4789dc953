//! Figuring out what kind of event we've been given.
//!
//! Lambda hands us a JSON document with no indication of which trigger
//! produced it. Each [`Adapter`] knows one event shape: how to recognize it,
//! how to turn it into a [`Request`], and how to turn a finished
//! [`ResponseWriter`] into the reply that the trigger expects.
//!
//! Recognition is deliberately shallow. Each adapter looks at one or two
//! fields that tell the shapes apart, rather than validating the whole
//! schema, so that AWS adding fields to an event doesn't break anything. The
//! full structure is only checked when decoding.

use serde_json::Value;

use crate::{
    alb::AlbTargetGroup, apigw::ApiGatewayProxy, apigwv2::ApiGatewayV2Http, error::Error,
    request::Request, response::ResponseWriter,
};

/// One supported event shape.
///
/// Implementations are stateless; the same value is used for every
/// invocation, possibly from several threads at once.
pub trait Adapter: Send + Sync {
    /// A short name for logging.
    fn name(&self) -> &'static str;

    /// Whether `event` looks like this shape.
    fn matches(&self, event: &Value) -> bool;

    /// Decode the event into a request.
    fn decode(&self, event: &Value) -> Result<Request, Error>;

    /// Encode the handler's response as this shape's reply.
    fn encode(&self, response: &ResponseWriter) -> Result<Value, Error>;
}

/// Whether the field at `pointer` exists, whatever its value.
pub(crate) fn has_field(event: &Value, pointer: &str) -> bool {
    event.pointer(pointer).is_some()
}

/// An ordered table of adapters. The first one that matches an event wins.
pub struct Registry {
    adapters: Vec<Box<dyn Adapter>>,
}

impl Registry {
    pub fn new(adapters: Vec<Box<dyn Adapter>>) -> Self {
        Registry { adapters }
    }

    /// The adapters for every event shape that we know about.
    ///
    /// The HTTP API check is the only one that looks at `version`, and the
    /// REST API check requires `version` to be absent, so the two can't both
    /// match. ALB events have neither a `version` nor an `apiId`.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ApiGatewayV2Http),
            Box::new(ApiGatewayProxy),
            Box::new(AlbTargetGroup),
        ])
    }

    pub fn adapters(&self) -> impl Iterator<Item = &dyn Adapter> {
        self.adapters.iter().map(|a| &**a)
    }

    /// Find the adapter for `event`.
    pub fn resolve(&self, event: &Value) -> Result<&dyn Adapter, Error> {
        self.adapters()
            .find(|a| a.matches(event))
            .ok_or(Error::UnsupportedEventType)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
