// gstore: Rust client for signed REST object storage
// Copyright 2025 The gstore Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request construction: paths, query strings and required headers

use http::Method;

use crate::gs::client::ClientConfig;
use crate::gs::header_constants::{CONTENT_LENGTH, DATE, HOST, USER_AGENT};
use crate::gs::operation::Operation;
use crate::gs::signer::sign_goog1;
use crate::gs::utils::{Headers, UtcTime, to_http_header_value, urlencode};

/// Ordered query parameters.
///
/// A parameter without a value (`?acl`) is a flag. Names are sent as given,
/// values are percent-encoded when the query string is built. Adding an
/// existing name replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(String, Option<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query selecting a sub-resource, e.g. `acl`.
    pub fn subresource(name: &str) -> Self {
        let mut query = Self::new();
        query.add_flag(name);
        query
    }

    pub fn add<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.set(name.into(), Some(value.into()));
    }

    pub fn add_flag<K: Into<String>>(&mut self, name: K) {
        self.set(name.into(), None);
    }

    fn set(&mut self, name: String, value: Option<String>) {
        match self.params.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.params.push((name, value)),
        }
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Converts to HTTP query string, including the leading `?` when not
    /// empty
    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .params
            .iter()
            .map(|(name, value)| match value.as_deref() {
                Some(v) if !v.is_empty() => format!("{name}={}", urlencode(v)),
                _ => name.clone(),
            })
            .collect();
        format!("?{}", parts.join("&"))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Option<V>)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut query = QueryParams::new();
        for (k, v) in iter {
            query.set(k.into(), v.map(Into::into));
        }
        query
    }
}

/// Returns the URL path for given bucket and object names
///
/// An object name is only used together with a bucket name.
pub fn get_path(bucket_name: Option<&str>, object_name: Option<&str>) -> String {
    let mut path = String::from("/");
    if let Some(bucket) = bucket_name.filter(|b| !b.is_empty()) {
        path.push_str(&urlencode(bucket));
        if let Some(key) = object_name.filter(|k| !k.is_empty()) {
            path.push('/');
            path.push_str(&urlencode(key));
        }
    }
    path
}

/// Returns the headers sent with a fresh (not redirected) request
pub fn get_request_headers(
    config: &ClientConfig,
    method: &Method,
    path: &str,
    query_params: Option<&QueryParams>,
    extra_headers: Option<&Headers>,
    content_length: u64,
    date: UtcTime,
) -> Headers {
    let mut headers = Headers::new();
    headers.insert(CONTENT_LENGTH.to_string(), content_length.to_string());
    headers.insert(DATE.to_string(), to_http_header_value(date));
    headers.insert(HOST.to_string(), config.host_header_value());
    headers.insert(USER_AGENT.to_string(), config.user_agent.clone());

    if let Some(extra) = extra_headers {
        for (k, v) in extra {
            headers.insert(k.clone(), v.clone());
        }
    }

    if let Some((access_key, secret)) = config.credentials() {
        sign_goog1(
            &config.auth_scheme,
            method,
            path,
            query_params,
            &mut headers,
            access_key,
            secret,
        );
    }

    headers
}

/// What to send, before it is turned into an [`Operation`].
#[derive(Clone, Debug)]
pub struct Request<'a> {
    pub method: Method,
    pub bucket_name: Option<&'a str>,
    pub object_name: Option<&'a str>,
    pub extra_headers: Option<&'a Headers>,
    pub query_params: Option<&'a QueryParams>,
}

impl<'a> Request<'a> {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            bucket_name: None,
            object_name: None,
            extra_headers: None,
            query_params: None,
        }
    }

    pub fn bucket(mut self, bucket_name: &'a str) -> Self {
        self.bucket_name = Some(bucket_name);
        self
    }

    pub fn object(mut self, object_name: &'a str) -> Self {
        self.object_name = Some(object_name);
        self
    }

    pub fn extra_headers(mut self, extra_headers: Option<&'a Headers>) -> Self {
        self.extra_headers = extra_headers;
        self
    }

    pub fn query_params(mut self, query_params: Option<&'a QueryParams>) -> Self {
        self.query_params = query_params;
        self
    }

    pub fn path(&self) -> String {
        get_path(self.bucket_name, self.object_name)
    }

    pub fn path_and_query(&self) -> String {
        let mut s = self.path();
        if let Some(q) = self.query_params {
            s.push_str(&q.to_query_string());
        }
        s
    }

    /// Builds a fresh, signed attempt dated `date`.
    pub(crate) fn to_operation(
        &self,
        config: &ClientConfig,
        date: UtcTime,
        content_length: u64,
    ) -> Operation {
        let path = self.path();
        let headers = get_request_headers(
            config,
            &self.method,
            &path,
            self.query_params,
            self.extra_headers,
            content_length,
            date,
        );
        let (host, port) = config.connection_target();
        Operation::new(
            host,
            port,
            self.method.clone(),
            self.path_and_query(),
            headers,
        )
    }
}
