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

use super::client::ClientConfig;
use super::header_constants::{AUTHORIZATION, CONTENT_LENGTH, DATE, HOST, USER_AGENT};
use super::http::{QueryParams, Request, get_path, get_request_headers};
use super::signer::get_signature;
use super::utils::{Headers, UtcTime};
use chrono::{TimeZone, Utc};
use http::Method;

fn get_test_date() -> UtcTime {
    Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()
}

fn get_test_config() -> ClientConfig {
    let mut config = ClientConfig::new("storage.example.com");
    config.access_key = Some("GOOGKEY".to_string());
    config.secret = Some("secret".to_string());
    config
}

// ===========================
// Path Tests
// ===========================

#[test]
fn test_path_escapes_bucket_and_object() {
    assert_eq!(
        get_path(Some("my bucket"), Some("a/b c")),
        "/my%20bucket/a%2Fb%20c"
    );
}

#[test]
fn test_path_service() {
    assert_eq!(get_path(None, None), "/");
    assert_eq!(get_path(None, Some("ignored")), "/");
}

#[test]
fn test_path_bucket_only() {
    assert_eq!(get_path(Some("bucket"), None), "/bucket");
}

// ===========================
// QueryParams Tests
// ===========================

#[test]
fn test_query_string_empty() {
    assert_eq!(QueryParams::new().to_query_string(), "");
}

#[test]
fn test_query_string_keeps_insertion_order() {
    let mut query = QueryParams::new();
    query.add("prefix", "photos/2013 jan");
    query.add_flag("acl");
    query.add("marker", "a&b");
    query.add("delimiter", "");
    assert_eq!(
        query.to_query_string(),
        "?prefix=photos%2F2013%20jan&acl&marker=a%26b&delimiter"
    );
}

#[test]
fn test_query_add_replaces_in_place() {
    let mut query = QueryParams::new();
    query.add("a", "1");
    query.add("b", "2");
    query.add("a", "3");
    assert_eq!(query.to_query_string(), "?a=3&b=2");
    assert_eq!(
        query.iter().collect::<Vec<_>>(),
        vec![("a", Some("3")), ("b", Some("2"))]
    );
    assert!(!query.contains_key("c"));
}

#[test]
fn test_query_from_iterator() {
    let query: QueryParams = [("acl", None), ("max-keys", Some("10"))]
        .into_iter()
        .collect();
    assert!(query.contains_key("acl"));
    assert_eq!(query.to_query_string(), "?acl&max-keys=10");
}

// ===========================
// Header Tests
// ===========================

#[test]
fn test_request_headers_required() {
    let config = get_test_config();
    let headers = get_request_headers(
        &config,
        &Method::GET,
        "/bucket",
        None,
        None,
        0,
        get_test_date(),
    );
    assert_eq!(headers.get(CONTENT_LENGTH).unwrap(), "0");
    assert_eq!(headers.get(DATE).unwrap(), "Tue, 01 Jan 2013 00:00:00 GMT");
    assert_eq!(headers.get(HOST).unwrap(), "storage.example.com");
    assert_eq!(headers.get(USER_AGENT).unwrap(), &config.user_agent);
    assert!(headers.get(AUTHORIZATION).unwrap().starts_with("GOOG1 GOOGKEY:"));
}

#[test]
fn test_request_headers_extra_headers_win() {
    let mut extra = Headers::new();
    extra.insert(USER_AGENT.to_string(), "custom/2.0".to_string());
    extra.insert("x-goog-acl".to_string(), "public-read".to_string());
    let query = QueryParams::subresource("acl");
    let headers = get_request_headers(
        &get_test_config(),
        &Method::PUT,
        "/bucket/key",
        Some(&query),
        Some(&extra),
        12,
        get_test_date(),
    );
    assert_eq!(headers.get(USER_AGENT).unwrap(), "custom/2.0");
    assert_eq!(headers.get(CONTENT_LENGTH).unwrap(), "12");

    let signature = get_signature(
        "secret",
        "PUT\n\n\nTue, 01 Jan 2013 00:00:00 GMT\nx-goog-acl:public-read\n/bucket/key?acl",
    );
    assert_eq!(
        headers.get(AUTHORIZATION).unwrap(),
        &format!("GOOG1 GOOGKEY:{signature}")
    );
}

#[test]
fn test_request_headers_anonymous() {
    let config = ClientConfig::new("storage.example.com");
    let headers = get_request_headers(
        &config,
        &Method::GET,
        "/",
        None,
        None,
        0,
        get_test_date(),
    );
    assert!(!headers.contains_key(AUTHORIZATION));
}

#[test]
fn test_request_headers_host_with_port() {
    let mut config = get_test_config();
    config.port = 8080;
    let headers = get_request_headers(
        &config,
        &Method::GET,
        "/",
        None,
        None,
        0,
        get_test_date(),
    );
    assert_eq!(headers.get(HOST).unwrap(), "storage.example.com:8080");
}

// ===========================
// Request Tests
// ===========================

#[test]
fn test_request_to_operation() {
    let config = get_test_config();
    let query = QueryParams::subresource("acl");
    let op = Request::new(Method::GET)
        .bucket("my bucket")
        .object("a/b c")
        .query_params(Some(&query))
        .to_operation(&config, get_test_date(), 0);
    assert_eq!(op.host(), "storage.example.com");
    assert_eq!(op.port(), 80);
    assert_eq!(op.method(), &Method::GET);
    assert_eq!(op.path_and_query(), "/my%20bucket/a%2Fb%20c?acl");
    assert_eq!(op.response_status(), None);
    assert!(op.request_headers().contains_key(AUTHORIZATION));
}

#[test]
fn test_request_to_operation_through_proxy() {
    let mut config = get_test_config();
    config.proxy_host = Some("proxy.local".to_string());
    config.proxy_port = 3128;
    let op = Request::new(Method::GET)
        .bucket("b")
        .to_operation(&config, get_test_date(), 0);
    assert_eq!(op.host(), "proxy.local");
    assert_eq!(op.port(), 3128);
    assert_eq!(op.request_headers().get(HOST).unwrap(), "storage.example.com");
}
