//! REST API Gateway "proxy integration" events (payload format 1.0).
//!
//! <https://docs.aws.amazon.com/apigateway/latest/developerguide/set-up-lambda-proxy-integrations.html>
//!
//! These carry headers and query parameters twice, as single-value and
//! multi-value maps; see [`crate::multimap::reconcile`] for which one we
//! believe.

use lambda_http::aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;

use crate::{
    error::Error,
    multimap::{reconcile, MultiMap},
    registry::{has_field, Adapter},
    request::{decode_body, Request, SourceEvent},
    response::{encode_body, reply_value, ResponseWriter},
};

impl From<&ResponseWriter> for ApiGatewayProxyResponse {
    fn from(w: &ResponseWriter) -> Self {
        let (body, is_base64_encoded) = encode_body(w.body());

        ApiGatewayProxyResponse {
            status_code: w.status().as_u16().into(),
            headers: w.headers().clone(),
            multi_value_headers: w.headers().clone(),
            body: Some(body),
            is_base64_encoded,
        }
    }
}

/// The event type requires the request context's own copy of the method,
/// which hand-built events often leave out. Fill it in from the top level.
fn with_context_method(event: &Value) -> Cow<'_, Value> {
    let present = event
        .pointer("/requestContext/httpMethod")
        .is_some_and(|m| !m.is_null());

    if present {
        return Cow::Borrowed(event);
    }

    let mut event = event.clone();
    let method = event.get("httpMethod").cloned().unwrap_or(Value::Null);

    if let Some(context) = event.get_mut("requestContext").and_then(Value::as_object_mut) {
        context.insert("httpMethod".to_owned(), method);
    }

    Cow::Owned(event)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ApiGatewayProxy;

impl Adapter for ApiGatewayProxy {
    fn name(&self) -> &'static str {
        "apigw"
    }

    /// Version 1.0 REST events have no `version` field; HTTP API events do.
    fn matches(&self, event: &Value) -> bool {
        !has_field(event, "/version") && has_field(event, "/requestContext/apiId")
    }

    fn decode(&self, event: &Value) -> Result<Request, Error> {
        let event = with_context_method(event);
        let e = ApiGatewayProxyRequest::deserialize(&*event).map_err(Error::malformed)?;

        let path = e
            .path
            .as_deref()
            .ok_or_else(|| Error::malformed("missing field `path`"))?;

        let query = reconcile(
            MultiMap::from_query_map(&e.query_string_parameters)?,
            MultiMap::from_query_map(&e.multi_value_query_string_parameters)?,
        );
        let headers = reconcile(e.headers.clone(), e.multi_value_headers.clone());
        let body = decode_body(e.body.as_deref(), e.is_base64_encoded)?;

        let req = Request::new(e.http_method.clone(), path, query, headers, body)?;
        Ok(req.with_source(SourceEvent::ApiGatewayProxy(e)))
    }

    fn encode(&self, response: &ResponseWriter) -> Result<Value, Error> {
        reply_value(&ApiGatewayProxyResponse::from(response))
    }
}
