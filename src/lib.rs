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

//! # gstore
//!
//! A small, synchronous client for Google Storage style object storage: a
//! signed REST protocol (`GOOG1` HMAC-SHA1 request signing) with retries,
//! redirect following and exponential backoff.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use gstore::gs::ClientBuilder;
//! use std::io::Cursor;
//!
//! let client = ClientBuilder::new("commondatastorage.googleapis.com")
//!     .credentials("GOOGACCESSKEY", "secret")
//!     .build()
//!     .unwrap();
//!
//! client.put_bucket("my-bucket", None, None).unwrap();
//! let mut data = Cursor::new(b"hello".to_vec());
//! client.put_object("my-bucket", "hello.txt", &mut data, None).unwrap();
//! let listing = client.get_bucket("my-bucket", None).unwrap();
//! assert_eq!(listing.keys(), vec!["hello.txt"]);
//! ```
//!
//! ## Design
//! - Every call runs on the calling thread and blocks until done.
//! - Each HTTP attempt is recorded as an [`gs::operation::Operation`]; a failed
//!   call returns [`gs::error::ServiceFailure`] carrying all of them.
//! - The network, the clock and backoff sleeping are pluggable through
//!   [`gs::transport::Transport`], [`gs::clock::Clock`] and
//!   [`gs::clock::Sleeper`].
//!
//! Users of this crate never percent-encode arguments themselves: bucket
//! names, object names and query values are encoded when the request is
//! built, and names returned in listings come back decoded.

#![allow(clippy::result_large_err)]
#![allow(clippy::too_many_arguments)]
pub mod gs;

#[cfg(test)]
#[macro_use]
extern crate quickcheck;
