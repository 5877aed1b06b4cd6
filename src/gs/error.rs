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

//! Error definitions for object storage operations

use std::fmt;

use thiserror::Error;

use crate::gs::operation::Operation;

/// Failure reported by the network layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection ended before the announced body was transferred.
    /// Retried by the executor.
    #[error("IncompleteRead: {partial} bytes read")]
    IncompleteRead { partial: u64 },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The service did not answer with a success status; either the status was
/// fatal or retries/redirects ran out.
///
/// Carries every attempt made for the call, oldest first.
#[derive(Clone, Debug)]
pub struct ServiceFailure {
    message: String,
    operations: Vec<Operation>,
}

impl ServiceFailure {
    pub fn new(message: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            message: message.into(),
            operations,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Status of the final attempt, if it got that far.
    pub fn last_status(&self) -> Option<u16> {
        self.operations.last().and_then(|op| op.response_status())
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceFailure: {}", self.message)?;
        for (i, op) in self.operations.iter().enumerate() {
            write!(f, "\n\nOPERATION {i}:\n{op}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceFailure {}

/// Error definitions
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Service(#[from] ServiceFailure),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The network failed part way through a call. Not retried; carries the
    /// attempts made so far, the failing one last.
    #[error("{source}")]
    Interrupted {
        source: TransportError,
        operations: Vec<Operation>,
    },

    /// A response body that should have been XML could not be parsed. The
    /// HTTP exchange itself succeeded and is not retried.
    #[error("XML parse error: {0}")]
    XmlParse(#[from] xmltree::ParseError),

    #[error("XML write error: {0}")]
    XmlWrite(#[from] xmltree::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid redirect location '{0}'")]
    InvalidLocation(String),
}

impl Error {
    /// Attempts recorded for a failed call; only service failures and
    /// interrupted calls carry them.
    pub fn operations(&self) -> Option<&[Operation]> {
        match self {
            Error::Service(e) => Some(e.operations()),
            Error::Interrupted { operations, .. } => Some(operations),
            _ => None,
        }
    }
}
