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

//! Object storage client to perform bucket and object operations.
//!
//! All calls block the calling thread. Between attempts the client may sleep
//! for up to 32 seconds of backoff after a run of failures.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use crate::gs::backoff::Backoff;
use crate::gs::clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
use crate::gs::error::Error;
use crate::gs::executor::{Executor, ObjectSink, ObjectSource, StatusPolicy};
use crate::gs::http::{QueryParams, Request};
use crate::gs::operation::Operation;
use crate::gs::transport::{HttpTransport, Transport};
use crate::gs::utils::Headers;

mod buckets;
mod objects;

pub const DEFAULT_HOST: &str = "commondatastorage.googleapis.com";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_AUTH_SCHEME: &str = "GOOG1";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Environment variables read by [`ClientConfig::from_env`].
pub const ENV_ACCESS_KEY: &str = "GS_ACCESS";
pub const ENV_SECRET: &str = "GS_SECRET";
pub const ENV_HOST: &str = "GS_HOST";
pub const ENV_PROXY_HOST: &str = "GS_PROXY_HOST";
pub const ENV_PROXY_PORT: &str = "GS_PROXY_PORT";

/// Connection and signing settings, fixed for the lifetime of a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Requests are signed only when both key and secret are set.
    pub access_key: Option<String>,
    pub secret: Option<String>,
    pub host: String,
    pub port: u16,
    /// When set, every attempt connects here instead of to `host`.
    pub proxy_host: Option<String>,
    pub proxy_port: u16,
    pub auth_scheme: String,
    pub max_retries: u32,
    pub max_redirects: u32,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

impl ClientConfig {
    /// Anonymous configuration for `host` with default limits.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            access_key: None,
            secret: None,
            host: host.into(),
            port: DEFAULT_PORT,
            proxy_host: None,
            proxy_port: DEFAULT_PORT,
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: format!("gstore/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Reads credentials, host and proxy from `GS_*` environment variables;
    /// anything unset keeps its default.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// [`ClientConfig::from_env`] over any variable lookup. Empty values
    /// count as unset.
    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let mut config = Self::new(var(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()));
        config.access_key = var(ENV_ACCESS_KEY);
        config.secret = var(ENV_SECRET);
        config.proxy_host = var(ENV_PROXY_HOST);
        if let Some(port) = var(ENV_PROXY_PORT) {
            match port.parse::<u16>() {
                Ok(p) => config.proxy_port = p,
                Err(e) => log::warn!("ignoring {ENV_PROXY_PORT}={port:?}: {e}"),
            }
        }
        config
    }

    /// Access key and secret, if both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key.as_deref(), self.secret.as_deref()) {
            (Some(k), Some(s)) if !k.is_empty() && !s.is_empty() => Some((k, s)),
            _ => None,
        }
    }

    /// Value of the `Host` header for fresh requests.
    pub fn host_header_value(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn proxy(&self) -> Option<(&str, u16)> {
        self.proxy_host.as_deref().map(|h| (h, self.proxy_port))
    }

    /// Host and port a fresh request connects to.
    pub fn connection_target(&self) -> (&str, u16) {
        self.proxy().unwrap_or((self.host.as_str(), self.port))
    }
}

/// Optional per-call extras for bucket and object requests.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub extra_headers: Option<Headers>,
    pub query_params: Option<QueryParams>,
    /// Size of each body read or write; 0 moves the body in one piece.
    pub chunk_size: usize,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a request header; a header the client sets itself is replaced.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn query_params(mut self, query_params: QueryParams) -> Self {
        self.query_params = Some(query_params);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Client Builder manufactures a [`Client`] from given parameters.
#[derive(Debug)]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    backoff_exponent: i32,
}

impl ClientBuilder {
    /// Creates a builder for the service at `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(host))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            clock: None,
            sleeper: None,
            backoff_exponent: Backoff::default().exponent(),
        }
    }

    /// Set the access key and secret. Without them requests are anonymous.
    pub fn credentials(mut self, access_key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.config.access_key = Some(access_key.into());
        self.config.secret = Some(secret.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Route every attempt through a proxy at `host:port`.
    pub fn proxy(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.proxy_host = Some(host.into());
        self.config.proxy_port = port;
        self
    }

    pub fn auth_scheme(mut self, auth_scheme: impl Into<String>) -> Self {
        self.config.auth_scheme = auth_scheme.into();
        self
    }

    /// Attempts allowed after retryable failures; 0 means a single attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the network layer. Defaults to [`HttpTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the source of the `Date` header. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set how backoff sleeps. Defaults to [`ThreadSleeper`].
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Start with given backoff exponent instead of -1 (off). Clamped to
    /// `-1..=5`.
    pub fn backoff_exponent(mut self, exponent: i32) -> Self {
        self.backoff_exponent = exponent;
        self
    }

    /// Build the Client.
    pub fn build(self) -> Result<Client, Error> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new()?),
        };
        Ok(Client {
            shared: Arc::new(SharedClientItems {
                config: self.config,
                transport,
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                sleeper: self.sleeper.unwrap_or_else(|| Arc::new(ThreadSleeper)),
                backoff: Mutex::new(Backoff::new(self.backoff_exponent)),
            }),
        })
    }
}

/// Object storage client.
///
/// Requests are signed with the configured auth scheme when credentials are
/// present, otherwise they are sent anonymously. Clones share one backoff
/// state.
#[derive(Clone, Debug)]
pub struct Client {
    pub(crate) shared: Arc<SharedClientItems>,
}

#[derive(Debug)]
pub(crate) struct SharedClientItems {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    backoff: Mutex<Backoff>,
}

impl Client {
    /// Returns a client for `host` using the default transport.
    pub fn new(host: impl Into<String>) -> Result<Self, Error> {
        ClientBuilder::new(host).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Current backoff exponent; -1 when no backoff sleep is pending.
    pub fn backoff_exponent(&self) -> i32 {
        let backoff = self.shared.backoff.lock().unwrap_or_else(|e| e.into_inner());
        backoff.exponent()
    }

    /// Sends a request with retries, redirects and backoff, and returns every
    /// attempt made.
    ///
    /// `source` supplies the request body and is rewound first. The body of
    /// a success response goes to `sink`; other response bodies are kept on
    /// the [`Operation`] as error text. Fails with
    /// [`crate::gs::error::ServiceFailure`] if no attempt succeeded, and with
    /// [`Error::Interrupted`] if the network failed, both carrying the
    /// attempts made.
    pub fn send_request(
        &self,
        request: &Request,
        source: Option<&mut dyn ObjectSource>,
        sink: Option<&mut dyn ObjectSink>,
        chunk_size: usize,
        policy: &StatusPolicy,
    ) -> Result<Vec<Operation>, Error> {
        let shared = &self.shared;
        let executor = Executor {
            config: &shared.config,
            transport: shared.transport.as_ref(),
            clock: shared.clock.as_ref(),
            sleeper: shared.sleeper.as_ref(),
            backoff: &shared.backoff,
        };
        executor.send(request, source, sink, chunk_size, policy)
    }
}
