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

//! Implementation of the Google Storage style object storage client

pub mod backoff;
pub mod client;
pub mod clock;
pub mod error;
pub mod executor;
pub mod header_constants;
pub mod http;
pub mod operation;
pub mod signer;
pub mod transport;
pub mod types;
pub mod utils;
pub mod xml;

#[cfg(test)]
mod http_tests;

pub use client::{Client, ClientBuilder, ClientConfig, RequestOptions};
pub use error::{Error, ServiceFailure};
pub use executor::{ObjectSink, ObjectSource, StatusPolicy};
pub use http::{QueryParams, Request};
pub use operation::Operation;
pub use types::{AccessControlList, AclEntry, BucketListResult, ObjectListResult};
