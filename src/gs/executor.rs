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

//! Retry, redirect and backoff loop around single HTTP attempts.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::sync::{Mutex, MutexGuard};

use http::Method;

use crate::gs::backoff::Backoff;
use crate::gs::client::ClientConfig;
use crate::gs::clock::{Clock, Sleeper};
use crate::gs::error::{Error, ServiceFailure, TransportError};
use crate::gs::header_constants::LOCATION;
use crate::gs::http::Request;
use crate::gs::operation::Operation;
use crate::gs::transport::{Connection, Transport};

/// Statuses that make the executor follow the `Location` header.
pub const REDIRECT_CODES: &[u16] = &[301, 302, 303, 307];

/// Message of the failure raised when a call does not succeed.
pub const SERVICE_FAILURE: &str = "Service Failure";

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Request body read from any seekable reader. The reader is rewound before
/// every attempt.
pub trait ObjectSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> ObjectSource for T {}

/// Destination of a success response body. Rewound before every write, so a
/// retried download overwrites the partial data of the previous attempt.
pub trait ObjectSink: Write + Seek {}

impl<T: Write + Seek + ?Sized> ObjectSink for T {}

/// Status codes treated as success, and those worth another attempt. Every
/// other non-redirect status ends the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusPolicy<'a> {
    pub success: &'a [u16],
    pub retryable: &'a [u16],
}

impl StatusPolicy<'static> {
    pub const DEFAULT: StatusPolicy<'static> = StatusPolicy {
        success: &[200],
        retryable: &[408, 500, 502, 503, 504],
    };

    /// Range reads answer 206.
    pub const GET_OBJECT: StatusPolicy<'static> = StatusPolicy {
        success: &[200, 206],
        retryable: StatusPolicy::DEFAULT.retryable,
    };

    /// A freshly emptied bucket can still look missing or non-empty for a
    /// while, so 404 and 409 are retried.
    pub const DELETE_BUCKET: StatusPolicy<'static> = StatusPolicy {
        success: &[204],
        retryable: &[404, 408, 409, 500, 502, 503, 504],
    };

    pub const DELETE_OBJECT: StatusPolicy<'static> = StatusPolicy {
        success: &[204],
        retryable: StatusPolicy::DEFAULT.retryable,
    };
}

impl Default for StatusPolicy<'static> {
    fn default() -> Self {
        StatusPolicy::DEFAULT
    }
}

impl StatusPolicy<'_> {
    pub fn is_success(&self, status: u16) -> bool {
        self.success.contains(&status)
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable.contains(&status)
    }
}

/// What to do after an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Disposition {
    Success,
    Redirect,
    Retry,
    Fatal,
}

impl Disposition {
    fn of(status: u16, policy: &StatusPolicy) -> Self {
        if policy.is_success(status) {
            Disposition::Success
        } else if REDIRECT_CODES.contains(&status) {
            Disposition::Redirect
        } else if policy.is_retryable(status) {
            Disposition::Retry
        } else {
            Disposition::Fatal
        }
    }
}

/// Runs one client call: repeated attempts until success, a fatal status,
/// or the retry/redirect allowance is used up.
pub(crate) struct Executor<'a> {
    pub config: &'a ClientConfig,
    pub transport: &'a dyn Transport,
    pub clock: &'a dyn Clock,
    pub sleeper: &'a dyn Sleeper,
    pub backoff: &'a Mutex<Backoff>,
}

impl Executor<'_> {
    /// Sends `request` and returns every attempt made, oldest first.
    pub fn send(
        &self,
        request: &Request,
        mut source: Option<&mut dyn ObjectSource>,
        mut sink: Option<&mut dyn ObjectSink>,
        chunk_size: usize,
        policy: &StatusPolicy,
    ) -> Result<Vec<Operation>, Error> {
        let content_length = match source.as_deref_mut() {
            Some(s) => stream_len(s)?,
            None => 0,
        };

        let mut operations: Vec<Operation> = Vec::new();
        let mut redirect_location: Option<String> = None;
        let mut retries: u32 = 0;
        let mut redirects: u32 = 0;

        while retries <= self.config.max_retries && redirects <= self.config.max_redirects {
            let delay = self.backoff().delay();
            if let Some(delay) = delay {
                log::debug!("backoff sleep, retrying in {} seconds", delay.as_secs());
                self.sleeper.sleep(delay);
            }

            let mut op = match (redirect_location.take(), operations.last()) {
                (Some(location), Some(previous)) => {
                    previous.redirect(&location, self.config.proxy())?
                }
                _ => request.to_operation(self.config, self.clock.now(), content_length),
            };

            let result = self.exec_operation(
                &mut op,
                source.as_deref_mut(),
                sink.as_deref_mut(),
                chunk_size,
                policy,
            );
            let status = op.response_status;
            operations.push(op);

            match result {
                Ok(()) => {}
                Err(Error::Transport(TransportError::IncompleteRead { partial })) => {
                    log::warn!("incomplete read after {partial} bytes, retrying");
                    if let Some(op) = operations.last_mut() {
                        op.response_error_body =
                            Some(TransportError::IncompleteRead { partial }.to_string());
                    }
                    retries += 1;
                    self.backoff().increment();
                    continue;
                }
                Err(Error::Transport(source)) => {
                    return Err(Error::Interrupted { source, operations });
                }
                Err(e) => return Err(e),
            }

            let status = status.unwrap_or_default();
            match Disposition::of(status, policy) {
                Disposition::Success => {
                    self.backoff().decrement();
                    return Ok(operations);
                }
                Disposition::Redirect => {
                    self.backoff().decrement();
                    let location = operations
                        .last()
                        .and_then(|op| op.response_headers())
                        .and_then(|h| h.get(LOCATION))
                        .cloned();
                    match location {
                        Some(location) => {
                            log::debug!("redirected to {location}");
                            redirect_location = Some(location);
                            redirects += 1;
                        }
                        None => {
                            log::warn!("{status} response without a location header");
                            break;
                        }
                    }
                }
                Disposition::Retry => {
                    log::warn!("retryable status {status}");
                    self.backoff().increment();
                    retries += 1;
                }
                Disposition::Fatal => {
                    self.backoff().increment();
                    break;
                }
            }
        }

        Err(ServiceFailure::new(SERVICE_FAILURE, operations).into())
    }

    fn backoff(&self) -> MutexGuard<'_, Backoff> {
        // The exponent is a plain integer and stays valid across a panic.
        self.backoff.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs one attempt and fills in the response half of `op`.
    fn exec_operation(
        &self,
        op: &mut Operation,
        source: Option<&mut (dyn ObjectSource + '_)>,
        sink: Option<&mut (dyn ObjectSink + '_)>,
        chunk_size: usize,
        policy: &StatusPolicy,
    ) -> Result<(), Error> {
        log::debug!(
            "{} {} {:?}",
            op.method,
            op.path_and_query,
            op.request_headers
        );
        let mut conn = self.transport.connect(&op.host, op.port)?;
        let result = exchange(conn.as_mut(), op, source, sink, chunk_size, policy);
        conn.close();
        result
    }
}

fn exchange(
    conn: &mut dyn Connection,
    op: &mut Operation,
    source: Option<&mut (dyn ObjectSource + '_)>,
    sink: Option<&mut (dyn ObjectSink + '_)>,
    chunk_size: usize,
    policy: &StatusPolicy,
) -> Result<(), Error> {
    conn.put_request(&op.method, &op.path_and_query)?;
    for (name, value) in &op.request_headers {
        conn.put_header(name, value)?;
    }
    conn.end_headers()?;

    match source {
        Some(source) => write_body(conn, source, chunk_size)?,
        None => conn.send(&[])?,
    }

    let head = conn.get_response()?;
    op.response_status = Some(head.status);
    op.response_headers = Some(head.headers);

    if op.method == Method::HEAD {
        return Ok(());
    }
    if policy.is_success(head.status) {
        if let Some(sink) = sink {
            read_body(conn, sink, chunk_size)?;
        }
    } else {
        let mut body = Cursor::new(Vec::new());
        read_body(conn, &mut body, 0)?;
        op.response_error_body = Some(String::from_utf8_lossy(body.get_ref()).into_owned());
    }
    Ok(())
}

fn stream_len(source: &mut (dyn ObjectSource + '_)) -> Result<u64, Error> {
    let len = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(0))?;
    Ok(len)
}

/// Sends the whole source, in `chunk_size` pieces when non-zero.
fn write_body(
    conn: &mut dyn Connection,
    source: &mut (dyn ObjectSource + '_),
    chunk_size: usize,
) -> Result<(), Error> {
    source.seek(SeekFrom::Start(0))?;
    if chunk_size == 0 {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        conn.send(&data)?;
        return Ok(());
    }
    let mut buf = vec![0u8; chunk_size];
    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        conn.send(&buf[..n])?;
    }
}

/// Copies the response body into `sink`, reading `chunk_size` bytes at a
/// time when non-zero.
fn read_body<W: Write + Seek + ?Sized>(
    conn: &mut dyn Connection,
    sink: &mut W,
    chunk_size: usize,
) -> Result<(), Error> {
    sink.seek(SeekFrom::Start(0))?;
    let size = if chunk_size > 0 {
        chunk_size
    } else {
        READ_BUFFER_SIZE
    };
    let mut buf = vec![0u8; size];
    loop {
        let n = conn.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n])?;
    }
    sink.flush()?;
    Ok(())
}
