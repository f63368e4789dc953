//! The canonical request handed to the wrapped handler.

use base64::{engine::general_purpose::STANDARD, Engine};
use lambda_http::{
    aws_lambda_events::{
        alb::AlbTargetGroupRequest,
        apigw::{ApiGatewayProxyRequest, ApiGatewayV2httpRequest},
    },
    http::{self, HeaderMap, Method, Uri},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

use crate::{error::Error, multimap::MultiMap};

/// The event that a request was decoded from.
///
/// Handlers that need trigger-specific details (the request context, stage
/// variables, the ALB target group ARN, ...) can match on this. Handlers that
/// don't care about where they are deployed should ignore it.
#[derive(Clone, Debug, Serialize)]
pub enum SourceEvent {
    ApiGatewayProxy(ApiGatewayProxyRequest),
    ApiGatewayV2Http(ApiGatewayV2httpRequest),
    AlbTargetGroup(AlbTargetGroupRequest),
}

/// Bytes that can't appear as-is in the path of a request target. Anything
/// outside ASCII is escaped too.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    query: MultiMap,
    headers: HeaderMap,
    body: Vec<u8>,
    source: Option<SourceEvent>,
}

impl Request {
    /// Assemble a request from its decoded parts.
    ///
    /// The path is used verbatim, trailing slash and all, except that
    /// characters which can't appear in a request target (spaces, `?`, `#`,
    /// non-ASCII, ...) are percent-encoded. Escapes already in the path are
    /// kept as they are, so each `%` must start a valid one. Control
    /// characters are rejected. The query is form-encoded after a `?`.
    pub fn new(
        method: Method,
        path: &str,
        query: MultiMap,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<Self, Error> {
        let suffix = if query.is_empty() {
            String::new()
        } else {
            format!("?{}", query.to_query_string())
        };

        check_path(path)
            .map_err(|reason| Error::invalid_target(&format!("{path}{suffix}"), reason))?;

        let target = format!("{}{suffix}", utf8_percent_encode(path, PATH));
        let uri: Uri = target
            .parse()
            .map_err(|e| Error::invalid_target(&target, e))?;

        Ok(Request {
            method,
            uri,
            query,
            headers,
            body,
            source: None,
        })
    }

    pub fn with_source(mut self, source: SourceEvent) -> Self {
        self.source = Some(source);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request target: path and, if there is one, query string.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> &MultiMap {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body[..]
    }

    pub fn source(&self) -> Option<&SourceEvent> {
        self.source.as_ref()
    }

    /// Convert into an [`http::Request`], for handlers written against the
    /// `http` crate's types. The source event, if any, is stored as an
    /// extension.
    pub fn into_http(self) -> http::Request<Vec<u8>> {
        let mut req = http::Request::new(self.body);
        *req.method_mut() = self.method;
        *req.uri_mut() = self.uri;
        *req.headers_mut() = self.headers;

        if let Some(source) = self.source {
            req.extensions_mut().insert(source);
        }

        req
    }
}

/// Escapes that don't decode and raw control characters can't be fixed up
/// without guessing what the client meant.
fn check_path(path: &str) -> Result<(), String> {
    let bytes = path.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let valid = bytes.len() > i + 2
                    && bytes[i + 1].is_ascii_hexdigit()
                    && bytes[i + 2].is_ascii_hexdigit();

                if !valid {
                    let end = usize::min(i + 3, bytes.len());
                    return Err(format!(
                        "invalid URL escape {:?}",
                        String::from_utf8_lossy(&bytes[i..end])
                    ));
                }

                i += 3;
            }
            b if b.is_ascii_control() => {
                return Err(format!("invalid control character {b:#04x} in path"));
            }
            _ => i += 1,
        }
    }

    Ok(())
}

/// Decode an event body, which may be base64-encoded. A missing body is
/// empty.
pub(crate) fn decode_body(body: Option<&str>, is_base64_encoded: bool) -> Result<Vec<u8>, Error> {
    let body = body.unwrap_or_default();

    if is_base64_encoded {
        STANDARD
            .decode(body)
            .map_err(|e| Error::malformed(format!("invalid base64 body: {e}")))
    } else {
        Ok(body.as_bytes().to_vec())
    }
}
