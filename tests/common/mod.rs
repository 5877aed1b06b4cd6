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

//! In-memory transport, clock and sleeper for driving the client in tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use http::Method;

use gstore::gs::ClientBuilder;
use gstore::gs::client::Client;
use gstore::gs::clock::{Clock, Sleeper};
use gstore::gs::error::TransportError;
use gstore::gs::transport::{Connection, ResponseHead, Transport};
use gstore::gs::utils::{Headers, UtcTime};

pub const TEST_HOST: &str = "storage.example.com";
pub const TEST_DATE: &str = "Tue, 01 Jan 2013 00:00:00 GMT";

/// Canned response served by [`FakeTransport`].
#[derive(Clone, Debug, Default)]
pub struct ScriptedResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
    /// Body ends after this many bytes with an incomplete read.
    pub cut_at: Option<usize>,
}

impl ScriptedResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn cut_at(mut self, n: usize) -> Self {
        self.cut_at = Some(n);
        self
    }
}

/// What the client sent on one connection.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub host: String,
    pub port: u16,
    pub method: Method,
    pub path_and_query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct FakeState {
    responses: VecDeque<ScriptedResponse>,
    requests: Vec<RecordedRequest>,
    connects: usize,
    closes: usize,
}

/// Serves scripted responses in order and records every request.
#[derive(Clone, Debug, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        let transport = Self::default();
        transport.state.lock().unwrap().responses = responses.into();
        transport
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().unwrap().responses.len()
    }
}

impl Transport for FakeTransport {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection>, TransportError> {
        self.state.lock().unwrap().connects += 1;
        Ok(Box::new(FakeConnection {
            state: self.state.clone(),
            request: RecordedRequest {
                host: host.to_string(),
                port,
                method: Method::GET,
                path_and_query: String::new(),
                headers: Vec::new(),
                body: Vec::new(),
            },
            response: None,
            pos: 0,
        }))
    }
}

struct FakeConnection {
    state: Arc<Mutex<FakeState>>,
    request: RecordedRequest,
    response: Option<ScriptedResponse>,
    pos: usize,
}

impl Connection for FakeConnection {
    fn put_request(&mut self, method: &Method, path_and_query: &str) -> Result<(), TransportError> {
        self.request.method = method.clone();
        self.request.path_and_query = path_and_query.to_string();
        Ok(())
    }

    fn put_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        self.request
            .headers
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn end_headers(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.request.body.extend_from_slice(data);
        Ok(())
    }

    fn get_response(&mut self) -> Result<ResponseHead, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(self.request.clone());
        let response = state.responses.pop_front().ok_or_else(|| {
            TransportError::Io(std::io::Error::other("no scripted response left"))
        })?;
        let head = ResponseHead {
            status: response.status,
            headers: response.headers.clone(),
        };
        self.response = Some(response);
        Ok(head)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let response = match &self.response {
            Some(r) => r,
            None => return Ok(0),
        };
        let end = response.cut_at.unwrap_or(response.body.len());
        if self.pos >= end {
            if response.cut_at.is_some() {
                return Err(TransportError::IncompleteRead {
                    partial: self.pos as u64,
                });
            }
            return Ok(0);
        }
        let n = buf.len().min(end - self.pos);
        buf[..n].copy_from_slice(&response.body[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closes += 1;
    }
}

/// Always answers 2013-01-01T00:00:00Z.
#[derive(Debug, Default)]
pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> UtcTime {
        Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Clone, Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub struct TestContext {
    pub client: Client,
    pub transport: FakeTransport,
    pub sleeper: RecordingSleeper,
}

impl TestContext {
    /// Signed client against [`TEST_HOST`] serving `responses`.
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self::with_builder(
            ClientBuilder::new(TEST_HOST).credentials("GOOGKEY", "secret"),
            responses,
        )
    }

    pub fn with_builder(builder: ClientBuilder, responses: Vec<ScriptedResponse>) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let transport = FakeTransport::new(responses);
        let sleeper = RecordingSleeper::default();
        let client = builder
            .transport(Arc::new(transport.clone()))
            .clock(Arc::new(FixedClock))
            .sleeper(Arc::new(sleeper.clone()))
            .build()
            .unwrap();
        Self {
            client,
            transport,
            sleeper,
        }
    }
}

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}
