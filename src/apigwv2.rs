//! HTTP API Gateway events (payload format 2.0).
//!
//! <https://docs.aws.amazon.com/apigateway/latest/developerguide/http-api-develop-integrations-lambda.html>
//!
//! This format dropped the multi-value maps. Repeated headers and query
//! parameters are joined with commas instead, which can't be undone for a
//! value that itself contains a comma, so we parse `rawQueryString` when
//! it's there. Cookies
//! are split out of the headers into their own array, in both directions.

use lambda_http::{
    aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse},
    http::header::{HeaderValue, COOKIE, SET_COOKIE},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::Error,
    multimap::MultiMap,
    registry::Adapter,
    request::{decode_body, Request, SourceEvent},
    response::{encode_body, reply_value, ResponseWriter},
};

impl From<&ResponseWriter> for ApiGatewayV2httpResponse {
    fn from(w: &ResponseWriter) -> Self {
        let (body, is_base64_encoded) = encode_body(w.body());

        let cookies = w
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();

        ApiGatewayV2httpResponse {
            status_code: w.status().as_u16().into(),
            headers: w.headers().clone(),
            multi_value_headers: w.headers().clone(),
            body: Some(body),
            is_base64_encoded,
            cookies,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ApiGatewayV2Http;

impl Adapter for ApiGatewayV2Http {
    fn name(&self) -> &'static str {
        "apigwv2"
    }

    /// Only `"2.0"` counts. REST events that carry a `version` at all (the
    /// optional `"1.0"`) match neither this nor the REST check, and are
    /// unsupported.
    fn matches(&self, event: &Value) -> bool {
        event.get("version").and_then(Value::as_str) == Some("2.0")
    }

    fn decode(&self, event: &Value) -> Result<Request, Error> {
        let e = ApiGatewayV2httpRequest::deserialize(event).map_err(Error::malformed)?;

        let path = e
            .raw_path
            .as_deref()
            .ok_or_else(|| Error::malformed("missing field `rawPath`"))?;

        let query = match e.raw_query_string.as_deref() {
            Some(raw) if !raw.is_empty() => MultiMap::from_query_string(raw),
            _ => MultiMap::from_query_map(&e.query_string_parameters)?,
        };

        let mut headers = e.headers.clone();

        if let Some(cookies) = e.cookies.as_ref().filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(&cookies.join("; "))
                .map_err(|err| Error::malformed(format!("invalid cookies: {err}")))?;
            headers.append(COOKIE, value);
        }

        let body = decode_body(e.body.as_deref(), e.is_base64_encoded)?;

        let req = Request::new(
            e.request_context.http.method.clone(),
            path,
            query,
            headers,
            body,
        )?;
        Ok(req.with_source(SourceEvent::ApiGatewayV2Http(e)))
    }

    fn encode(&self, response: &ResponseWriter) -> Result<Value, Error> {
        reply_value(&ApiGatewayV2httpResponse::from(response))
    }
}
