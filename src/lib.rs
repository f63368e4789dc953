//! Run plain HTTP request handlers as AWS Lambda functions.
//!
//! A Lambda function sitting behind API Gateway or a load balancer doesn't
//! receive HTTP requests. It receives JSON events describing them, in one of
//! several formats depending on which service triggered it, and it has to
//! reply with JSON in the matching format. This crate hides all of that: you
//! write a [`Handler`] against a canonical [`Request`] and [`ResponseWriter`],
//! and [`Wrapper::invoke`] takes care of recognizing the event, decoding it,
//! and encoding the reply.
//!
//! Supported triggers:
//!
//! - REST API Gateway proxy integrations ([`apigw`])
//! - HTTP API Gateway, payload format 2.0 ([`apigwv2`])
//! - Application Load Balancer target groups ([`alb`])
//!
//! Responses are buffered. Lambda replies are JSON documents, so there's no
//! way to stream a body out anyway, and buffered functions are cheaper.

use lambda_runtime::{service_fn, tracing, LambdaEvent};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

pub mod alb;
pub mod apigw;
pub mod apigwv2;
pub mod error;
pub mod multimap;
pub mod registry;
pub mod request;
pub mod response;
pub mod sniff;

pub use error::Error;
pub use registry::{Adapter, Registry};
pub use request::{Request, SourceEvent};
pub use response::ResponseWriter;

/// Something that can answer a request.
///
/// The handler writes its status, headers and body into the writer and
/// returns; whatever is in the writer at that point is the response. Any
/// closure taking `(&Request, &mut ResponseWriter)` is a handler.
pub trait Handler {
    fn serve(&self, req: &Request, w: &mut ResponseWriter);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut ResponseWriter),
{
    fn serve(&self, req: &Request, w: &mut ResponseWriter) {
        self(req, w)
    }
}

/// A handler that replies with the request line, `<METHOD> <target>`. Handy
/// for checking that a deployment is wired up correctly.
pub fn echo(req: &Request, w: &mut ResponseWriter) {
    w.write_body(format!("{} {}", req.method(), req.uri()).as_bytes());
}

/// A handler together with the event shapes that it can be invoked with.
pub struct Wrapper<H> {
    handler: H,
    registry: Registry,
}

/// Wrap `handler` so that it can be invoked with any of the standard event
/// shapes.
pub fn wrap<H: Handler>(handler: H) -> Wrapper<H> {
    Wrapper::with_registry(handler, Registry::standard())
}

impl<H: Handler> Wrapper<H> {
    pub fn with_registry(handler: H, registry: Registry) -> Self {
        Wrapper { handler, registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle one invocation, given the raw event payload. Returns the raw
    /// reply payload.
    pub fn invoke(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        let event: Value = serde_json::from_slice(payload).map_err(Error::malformed)?;
        let reply = self.invoke_event(&event)?;
        serde_json::to_vec(&reply).map_err(Error::Reply)
    }

    /// Handle one invocation whose payload has already been parsed.
    ///
    /// If the event can't be recognized or decoded, the handler is not run
    /// and the error comes straight back.
    pub fn invoke_event(&self, event: &Value) -> Result<Value, Error> {
        let adapter = self.registry.resolve(event).inspect_err(|_| {
            tracing::warn!("unsupported lambda event type");
        })?;

        let req = adapter.decode(event).inspect_err(|e| {
            tracing::warn!(shape = adapter.name(), "rejecting event: {e}");
        })?;

        tracing::debug!(
            shape = adapter.name(),
            method = %req.method(),
            target = %req.uri(),
            "invoking handler"
        );

        let mut w = ResponseWriter::new();
        self.handler.serve(&req, &mut w);

        tracing::debug!(
            shape = adapter.name(),
            status = w.status().as_u16(),
            bytes = w.body().len(),
            "handler finished"
        );

        adapter.encode(&w)
    }
}

/// Set up logging the way Lambda likes it: no timestamps, since CloudWatch
/// adds its own, and no module paths. The filter comes from `RUST_LOG` and
/// defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // don't print the module name
        .without_time() // don't print time (CloudWatch has it)
        .init();
}

/// Serve `handler` as this process's Lambda function, until the runtime
/// shuts us down.
///
/// Logging is not set up here; call [`init_tracing`] first if you want it.
pub async fn start<H: Handler + Sync>(handler: H) -> Result<(), lambda_runtime::Error> {
    let wrapper = wrap(handler);
    let ref_wrapper = &wrapper;

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| async move {
        let (payload, context) = event.into_parts();
        tracing::debug!(request_id = %context.request_id, "received event");

        let reply: Result<Value, lambda_runtime::Error> =
            ref_wrapper.invoke_event(&payload).map_err(Into::into);
        reply
    }))
    .await
}
