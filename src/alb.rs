//! Application Load Balancer target group events.
//!
//! <https://docs.aws.amazon.com/elasticloadbalancing/latest/application/lambda-functions.html>
//!
//! Structurally these are close to the REST API Gateway events. The target
//! group sends either the single-value maps or, if multi-value headers are
//! enabled on it, the multi-value maps; never both. The reply has to include
//! a status line as well as the status code.

use lambda_http::aws_lambda_events::alb::{AlbTargetGroupRequest, AlbTargetGroupResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use std::borrow::Cow;

use crate::{
    error::Error,
    multimap::{reconcile, MultiMap},
    registry::{has_field, Adapter},
    request::{decode_body, Request, SourceEvent},
    response::{encode_body, reply_value, ResponseWriter},
};

impl From<&ResponseWriter> for AlbTargetGroupResponse {
    fn from(w: &ResponseWriter) -> Self {
        let (body, is_base64_encoded) = encode_body(w.body());

        AlbTargetGroupResponse {
            status_code: w.status().as_u16().into(),
            status_description: Some(w.status_description()),
            headers: w.headers().clone(),
            multi_value_headers: w.headers().clone(),
            body: Some(body),
            is_base64_encoded,
        }
    }
}

/// `"elb": null` is enough to be recognized as an ALB event, but the event
/// type wants an object there.
fn with_elb_context(event: &Value) -> Cow<'_, Value> {
    if !event.pointer("/requestContext/elb").is_some_and(Value::is_null) {
        return Cow::Borrowed(event);
    }

    let mut event = event.clone();

    if let Some(context) = event.get_mut("requestContext").and_then(Value::as_object_mut) {
        context.insert("elb".to_owned(), json!({}));
    }

    Cow::Owned(event)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AlbTargetGroup;

impl Adapter for AlbTargetGroup {
    fn name(&self) -> &'static str {
        "alb"
    }

    fn matches(&self, event: &Value) -> bool {
        has_field(event, "/requestContext/elb")
    }

    fn decode(&self, event: &Value) -> Result<Request, Error> {
        let event = with_elb_context(event);
        let e = AlbTargetGroupRequest::deserialize(&*event).map_err(Error::malformed)?;

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
        Ok(req.with_source(SourceEvent::AlbTargetGroup(e)))
    }

    fn encode(&self, response: &ResponseWriter) -> Result<Value, Error> {
        reply_value(&AlbTargetGroupResponse::from(response))
    }
}
