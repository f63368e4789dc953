//! The buffered response that a handler writes into.
//!
//! Lambda replies are a single JSON document, so nothing can be streamed: we
//! collect the status, headers and body here and the adapter turns them into
//! a reply once the handler has returned.
//!
//! The status line behaves like a regular HTTP server's. It is committed by
//! the first call to [`ResponseWriter::write_status`] or the first body
//! write, whichever comes first, and can't be changed after that. A body
//! write that commits also fills in a `Content-Type` if the handler didn't
//! set one.

use lambda_http::{
    http::{
        header::{CONTENT_TYPE, TRANSFER_ENCODING},
        HeaderMap, HeaderValue, StatusCode,
    },
    Body,
};
use serde::Serialize;
use serde_json::Value;
use std::io;

use crate::{error::Error, sniff};

#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    wrote_header: bool,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        ResponseWriter {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            wrote_header: false,
        }
    }
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The status as a status line, e.g. `200 OK`.
    ///
    /// Codes without a standard reason phrase render with an empty one
    /// (`"599 "`).
    pub fn status_description(&self) -> String {
        format!(
            "{} {}",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("")
        )
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body[..]
    }

    /// Whether the status has been committed.
    pub fn wrote_header(&self) -> bool {
        self.wrote_header
    }

    /// Set the status code. Only the first call has any effect, and only if
    /// no body bytes have been written yet.
    pub fn write_status(&mut self, status: StatusCode) {
        if self.wrote_header {
            return;
        }

        self.status = status;
        self.wrote_header = true;
    }

    /// Append to the body, committing the status first if needed.
    pub fn write_body(&mut self, data: &[u8]) {
        self.commit(data);
        self.body.extend_from_slice(data);
    }

    fn commit(&mut self, data: &[u8]) {
        if self.wrote_header {
            return;
        }

        let chunked = self
            .headers
            .get(TRANSFER_ENCODING)
            .is_some_and(|v| !v.is_empty());

        if !self.headers.contains_key(CONTENT_TYPE) && !chunked {
            self.headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static(sniff::detect_content_type(data)),
            );
        }

        self.write_status(StatusCode::OK);
    }
}

/// Render a body for a JSON reply. Text goes out as-is; anything that isn't
/// UTF-8 goes out as binary, which serializes as base64, and the flag says
/// so.
pub(crate) fn encode_body(body: &[u8]) -> (Body, bool) {
    match std::str::from_utf8(body) {
        Ok(text) => (Body::Text(text.to_owned()), false),
        Err(_) => (Body::Binary(body.to_vec()), true),
    }
}

/// The conventional spelling of a header name: `x-custom-header` becomes
/// `X-Custom-Header`.
pub fn canonical_header_name(name: &str) -> String {
    let mut upper = true;

    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

/// Serialize a reply document. `HeaderMap` only knows lowercase names, so
/// the keys of the header maps are respelled with [`canonical_header_name`].
pub(crate) fn reply_value<T: Serialize>(reply: &T) -> Result<Value, Error> {
    let mut value = serde_json::to_value(reply).map_err(Error::Reply)?;

    for field in ["headers", "multiValueHeaders"] {
        if let Some(Value::Object(map)) = value.get_mut(field) {
            *map = std::mem::take(map)
                .into_iter()
                .map(|(name, v)| (canonical_header_name(&name), v))
                .collect();
        }
    }

    Ok(value)
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
