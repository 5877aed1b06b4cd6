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

//! Record of a single HTTP attempt

use std::fmt;

use http::Method;
use url::Url;

use crate::gs::error::Error;
use crate::gs::header_constants::HOST;
use crate::gs::utils::Headers;

/// Request and response details of one HTTP attempt.
///
/// The executor fills in the response half while the attempt runs; callers
/// only ever see finished records, in the order the attempts were made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) method: Method,
    pub(crate) path_and_query: String,
    pub(crate) request_headers: Headers,
    pub(crate) response_status: Option<u16>,
    pub(crate) response_headers: Option<Headers>,
    pub(crate) response_error_body: Option<String>,
}

impl Operation {
    pub(crate) fn new(
        host: impl Into<String>,
        port: u16,
        method: Method,
        path_and_query: impl Into<String>,
        request_headers: Headers,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            method,
            path_and_query: path_and_query.into(),
            request_headers,
            response_status: None,
            response_headers: None,
            response_error_body: None,
        }
    }

    /// Builds the follow-up attempt for a redirect to `location`.
    ///
    /// Method and request headers are carried over, the `Host` header names
    /// the new target. With a proxy the connection still goes to the proxy.
    pub(crate) fn redirect(
        &self,
        location: &str,
        proxy: Option<(&str, u16)>,
    ) -> Result<Operation, Error> {
        let target = match Url::parse(location) {
            Ok(v) => v,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = match self.request_headers.get(HOST) {
                    Some(h) => format!("http://{h}/"),
                    None => format!("http://{}:{}/", self.host, self.port),
                };
                Url::parse(&base)
                    .and_then(|b| b.join(location))
                    .map_err(|_| Error::InvalidLocation(location.to_string()))?
            }
            Err(_) => return Err(Error::InvalidLocation(location.to_string())),
        };

        let target_host = target
            .host_str()
            .ok_or_else(|| Error::InvalidLocation(location.to_string()))?;
        let host_header = match target.port() {
            Some(p) => format!("{target_host}:{p}"),
            None => target_host.to_string(),
        };

        let (host, port) = match proxy {
            Some((h, p)) => (h.to_string(), p),
            // The transport fixes the scheme, so an https location without
            // a port still goes to 80.
            None => (target_host.to_string(), target.port().unwrap_or(80)),
        };

        let mut path_and_query = target.path().to_string();
        if let Some(q) = target.query() {
            path_and_query.push('?');
            path_and_query.push_str(q);
        }

        let mut request_headers = self.request_headers.clone();
        request_headers.insert(HOST.to_string(), host_header);

        Ok(Operation::new(
            host,
            port,
            self.method.clone(),
            path_and_query,
            request_headers,
        ))
    }

    /// Host connected to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port connected to
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    pub fn request_headers(&self) -> &Headers {
        &self.request_headers
    }

    /// Status code, unset if the attempt failed before a response arrived.
    pub fn response_status(&self) -> Option<u16> {
        self.response_status
    }

    pub fn response_headers(&self) -> Option<&Headers> {
        self.response_headers.as_ref()
    }

    /// Body of a non-success response, or a note describing a broken
    /// transfer.
    pub fn response_error_body(&self) -> Option<&str> {
        self.response_error_body.as_deref()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REQUEST:")?;
        write!(f, "\nSent to host: {}:{}", self.host, self.port)?;
        write!(f, "\n{} {}", self.method, self.path_and_query)?;
        for (k, v) in &self.request_headers {
            write!(f, "\n{k}: {v}")?;
        }
        write!(f, "\nRESPONSE:")?;
        write!(f, "\n{}", self.response_status.unwrap_or(0))?;
        if let Some(headers) = &self.response_headers {
            for (k, v) in headers {
                write!(f, "\n{k}: {v}")?;
            }
        }
        if let Some(body) = &self.response_error_body {
            write!(f, "\n{body}")?;
        }
        Ok(())
    }
}
