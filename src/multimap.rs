//! Reconciling single- and multi-value maps.
//!
//! The REST API Gateway and ALB events can describe headers and query
//! parameters twice: once as a `{"key": "value"}` map and once as a
//! `{"key": ["value", ...]}` map. Depending on how the trigger is configured
//! either, both, or neither may be present, and when both are present they
//! are not guaranteed to agree. Everything funnels through [`reconcile`] so
//! that all of the adapters make the same choice.
//!
//! The event types hold query parameters in hash maps, so any order they
//! arrived in is gone by the time we see them. [`MultiMap`] keeps keys
//! sorted, which gives every request a stable target.

use lambda_http::{aws_lambda_events::query_map::QueryMap, http::HeaderMap};
use serde::Deserialize;
use std::collections::BTreeMap;
use url::form_urlencoded;

use crate::error::Error;

/// A multi-map of string keys to string values.
///
/// Keys are kept sorted and each key's values keep the order in which they
/// were added. Lookups are exact-match; headers are handed to the handler as
/// a case-insensitive [`HeaderMap`] instead.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct MultiMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl MultiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out an event's query map. Keys with no values are left out.
    pub fn from_query_map(map: &QueryMap) -> Result<Self, Error> {
        // `QueryMap::iter` can't cope with a key that has no values, so go
        // through its serialized form instead.
        let value = serde_json::to_value(map).map_err(Error::malformed)?;
        let mut mm: MultiMap = serde_json::from_value(value).map_err(Error::malformed)?;
        mm.entries.retain(|_, vs| !vs.is_empty());
        Ok(mm)
    }

    /// Parse an `application/x-www-form-urlencoded` string, such as the raw
    /// query string of an HTTP API event.
    pub fn from_query_string(query: &str) -> Self {
        form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn add(&mut self, key: &str, value: &str) {
        self.entries
            .entry(key.to_owned())
            .or_default()
            .push(value.to_owned());
    }

    /// The first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(|vs| &vs[..]).unwrap_or(&[])
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every key/value pair, keys in order and each key's values in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl FromIterator<(String, String)> for MultiMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut mm = Self::new();

        for (k, v) in iter {
            mm.add(&k, &v);
        }

        mm
    }
}

/// A map whose distinct keys can be counted.
pub trait KeyCount {
    fn key_count(&self) -> usize;
}

impl KeyCount for MultiMap {
    fn key_count(&self) -> usize {
        self.len()
    }
}

impl KeyCount for HeaderMap {
    fn key_count(&self) -> usize {
        self.keys_len()
    }
}

/// Pick between the single- and multi-value representations of one map.
///
/// If the multi-value map has *more than one key* it is used exclusively and
/// the single-value map is ignored. Otherwise the single-value map is used.
///
/// Beware that this means a multi-value map with exactly one key is thrown
/// away: a request whose only query parameter is `?a=1&a=2` is seen with
/// whatever single value the trigger chose for `a`. This matches what
/// deployed functions have always observed, so it is kept as-is.
pub fn reconcile<M: KeyCount>(single: M, multi: M) -> M {
    if multi.key_count() > 1 {
        multi
    } else {
        single
    }
}
