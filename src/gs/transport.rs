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

//! Network layer seen by the request executor.
//!
//! A [`Transport`] opens one [`Connection`] per attempt. The connection is
//! driven in a fixed order: request line, headers, body, response head,
//! response body, close. Substitute both traits to run the client against
//! something other than a real HTTP server.

use std::fmt::Debug;
use std::io::Read;

use http::Method;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::redirect::Policy;

use crate::gs::error::TransportError;
use crate::gs::header_constants::CONTENT_LENGTH;
use crate::gs::utils::Headers;

/// Status line and headers of a response. Header names are lower case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Headers,
}

/// Opens connections to a host.
pub trait Transport: Debug + Send + Sync {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection>, TransportError>;
}

/// One request/response exchange.
pub trait Connection {
    /// Starts the request. Headers follow; no `Host` header is implied.
    fn put_request(&mut self, method: &Method, path_and_query: &str)
    -> Result<(), TransportError>;

    fn put_header(&mut self, name: &str, value: &str) -> Result<(), TransportError>;

    fn end_headers(&mut self) -> Result<(), TransportError>;

    /// Sends body bytes; an empty slice just flushes what was written.
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    fn get_response(&mut self) -> Result<ResponseHead, TransportError>;

    /// Reads response body bytes, returning 0 at the end of the body.
    ///
    /// A body cut short fails with [`TransportError::IncompleteRead`].
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    fn close(&mut self);
}

/// [`Transport`] over a blocking `reqwest` client.
///
/// Redirects are never followed here; the executor follows them itself so
/// every hop is recorded.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http_client: HttpClient,
    https: bool,
}

impl HttpTransport {
    /// Plain HTTP transport.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_scheme(false)
    }

    /// HTTPS transport.
    pub fn https() -> Result<Self, TransportError> {
        Self::with_scheme(true)
    }

    fn with_scheme(https: bool) -> Result<Self, TransportError> {
        let http_client = HttpClient::builder()
            .redirect(Policy::none())
            .no_proxy()
            .build()?;
        Ok(Self { http_client, https })
    }
}

impl Transport for HttpTransport {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection>, TransportError> {
        let scheme = if self.https { "https" } else { "http" };
        Ok(Box::new(HttpConnection {
            http_client: self.http_client.clone(),
            base_url: format!("{scheme}://{host}:{port}"),
            method: Method::GET,
            path_and_query: String::from("/"),
            headers: Vec::new(),
            body: Vec::new(),
            response: None,
            expected_len: None,
            received: 0,
        }))
    }
}

/// Buffers the request until the response is asked for, then hands it to
/// reqwest in one go.
struct HttpConnection {
    http_client: HttpClient,
    base_url: String,
    method: Method,
    path_and_query: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    response: Option<Response>,
    expected_len: Option<u64>,
    received: u64,
}

impl HttpConnection {
    fn short_read(&self) -> bool {
        self.expected_len.is_some_and(|n| self.received < n)
    }
}

impl Connection for HttpConnection {
    fn put_request(
        &mut self,
        method: &Method,
        path_and_query: &str,
    ) -> Result<(), TransportError> {
        self.method = method.clone();
        self.path_and_query = path_and_query.to_string();
        Ok(())
    }

    fn put_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        // Set again from the buffered body when the request goes out.
        if !name.eq_ignore_ascii_case(CONTENT_LENGTH) {
            self.headers.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    fn end_headers(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.body.extend_from_slice(data);
        Ok(())
    }

    fn get_response(&mut self) -> Result<ResponseHead, TransportError> {
        let url = format!("{}{}", self.base_url, self.path_and_query);
        let mut req = self.http_client.request(self.method.clone(), url);
        for (name, value) in &self.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        // Sent even when zero; servers answer 411 to a bodiless PUT without it.
        let body = std::mem::take(&mut self.body);
        req = req.header(CONTENT_LENGTH, body.len().to_string());
        req = req.body(body);

        let resp = req.send()?;
        let status = resp.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in resp.headers() {
            headers.insert(
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        self.expected_len = headers
            .get(&CONTENT_LENGTH.to_lowercase())
            .and_then(|v| v.trim().parse::<u64>().ok());
        self.received = 0;
        self.response = Some(resp);

        Ok(ResponseHead { status, headers })
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let resp = match self.response.as_mut() {
            Some(r) => r,
            None => return Ok(0),
        };
        match resp.read(buf) {
            Ok(0) if self.short_read() => Err(TransportError::IncompleteRead {
                partial: self.received,
            }),
            Ok(n) => {
                self.received += n as u64;
                Ok(n)
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof || self.short_read() => {
                log::warn!("response body ended early: {e}");
                Err(TransportError::IncompleteRead {
                    partial: self.received,
                })
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn close(&mut self) {
        self.response = None;
        self.body.clear();
    }
}
