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

//! HMAC-SHA1 request signing (`GOOG1` scheme)

use hmac::{Hmac, Mac};
use http::Method;
use sha1::Sha1;

use crate::gs::header_constants::{
    AUTHORIZATION, CONTENT_MD5, CONTENT_TYPE, DATE, X_GOOG_DATE, X_GOOG_PREFIX,
};
use crate::gs::http::QueryParams;
use crate::gs::utils::{Headers, b64encode};

/// Query parameters that select a sub-resource and therefore take part in
/// the signature. Only the first one present, in this order, is signed.
pub const SIGNED_SUBRESOURCES: [&str; 4] = ["acl", "location", "logging", "torrent"];

/// Returns HMAC-SHA1 hash for given key and data
pub fn hmac_hash(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut hasher = Hmac::<Sha1>::new_from_slice(key).expect("HMAC can take key of any size");
    hasher.update(data);
    hasher.finalize().into_bytes().to_vec()
}

/// Returns the canonical string-to-sign for given request parts
pub fn get_string_to_sign(
    method: &Method,
    path: &str,
    query_params: Option<&QueryParams>,
    headers: &Headers,
) -> String {
    // StringToSign =
    //   HTTP-Verb + '\n' +
    //   Content-MD5 + '\n' +
    //   Content-Type + '\n' +
    //   Date + '\n' +              (empty when x-goog-date is sent)
    //   CanonicalExtensionHeaders +
    //   CanonicalResource
    let mut s = String::new();
    s.push_str(method.as_str());
    s.push('\n');
    if let Some(v) = headers.get(CONTENT_MD5) {
        s.push_str(v.trim());
    }
    s.push('\n');
    if let Some(v) = headers.get(CONTENT_TYPE) {
        s.push_str(v.trim());
    }
    s.push('\n');
    if !headers.contains_key(X_GOOG_DATE) {
        if let Some(v) = headers.get(DATE) {
            s.push_str(v);
        }
    }
    s.push('\n');

    // Headers are kept ordered by name.
    for (k, v) in headers.iter().filter(|(k, _)| k.starts_with(X_GOOG_PREFIX)) {
        s.push_str(k);
        s.push(':');
        s.push_str(v);
        s.push('\n');
    }

    s.push_str(path);
    if let Some(query) = query_params {
        if let Some(sub) = SIGNED_SUBRESOURCES
            .iter()
            .find(|name| query.contains_key(name))
        {
            s.push('?');
            s.push_str(sub);
        }
    }
    s
}

/// Returns base64 encoded signature of given string-to-sign
pub fn get_signature(secret: &str, string_to_sign: &str) -> String {
    b64encode(hmac_hash(secret.as_bytes(), string_to_sign.as_bytes()))
}

/// Returns authorization value for given scheme, access key and signature
pub fn get_authorization(auth_scheme: &str, access_key: &str, signature: &str) -> String {
    format!("{auth_scheme} {access_key}:{signature}")
}

/// Signs and updates headers for given parameters
///
/// Headers must already hold everything that is sent, apart from
/// `Authorization` itself.
pub fn sign_goog1(
    auth_scheme: &str,
    method: &Method,
    path: &str,
    query_params: Option<&QueryParams>,
    headers: &mut Headers,
    access_key: &str,
    secret: &str,
) {
    let string_to_sign = get_string_to_sign(method, path, query_params, headers);
    log::trace!("string to sign: {string_to_sign:?}");
    let signature = get_signature(secret, &string_to_sign);
    let authorization = get_authorization(auth_scheme, access_key, &signature);

    headers.insert(AUTHORIZATION.to_string(), authorization);
}
