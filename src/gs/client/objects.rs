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

use std::io::Cursor;

use http::Method;

use super::{Client, RequestOptions};
use crate::gs::error::Error;
use crate::gs::executor::{ObjectSink, ObjectSource, StatusPolicy};
use crate::gs::http::{QueryParams, Request};
use crate::gs::types::AccessControlList;
use crate::gs::utils::Headers;

fn object_request<'a>(
    method: Method,
    bucket: &'a str,
    key: &'a str,
    options: Option<&'a RequestOptions>,
) -> Request<'a> {
    Request::new(method)
        .bucket(bucket)
        .object(key)
        .extra_headers(options.and_then(|o| o.extra_headers.as_ref()))
        .query_params(options.and_then(|o| o.query_params.as_ref()))
}

impl Client {
    /// Downloads an object into `sink`.
    ///
    /// Only a success response (200, or 206 for a range read) is written to
    /// the sink.
    pub fn get_object(
        &self,
        bucket: &str,
        key: &str,
        sink: &mut dyn ObjectSink,
        options: Option<&RequestOptions>,
    ) -> Result<(), Error> {
        let request = object_request(Method::GET, bucket, key, options);
        let chunk_size = options.map_or(0, |o| o.chunk_size);
        self.send_request(
            &request,
            None,
            Some(sink),
            chunk_size,
            &StatusPolicy::GET_OBJECT,
        )?;
        Ok(())
    }

    pub fn get_object_acl(&self, bucket: &str, key: &str) -> Result<AccessControlList, Error> {
        let query = QueryParams::subresource("acl");
        let request = Request::new(Method::GET)
            .bucket(bucket)
            .object(key)
            .query_params(Some(&query));
        let body = self.get_document(&request)?;
        AccessControlList::from_xml(&body)
    }

    /// Returns the response headers of the object, names in lower case.
    pub fn head_object(
        &self,
        bucket: &str,
        key: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Headers, Error> {
        let request = object_request(Method::HEAD, bucket, key, options);
        let operations = self.send_request(&request, None, None, 0, &StatusPolicy::DEFAULT)?;
        Ok(operations
            .last()
            .and_then(|op| op.response_headers())
            .cloned()
            .unwrap_or_default())
    }

    /// Uploads the whole of `source`, starting from its beginning.
    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &mut dyn ObjectSource,
        options: Option<&RequestOptions>,
    ) -> Result<(), Error> {
        let request = object_request(Method::PUT, bucket, key, options);
        let chunk_size = options.map_or(0, |o| o.chunk_size);
        self.send_request(
            &request,
            Some(source),
            None,
            chunk_size,
            &StatusPolicy::DEFAULT,
        )?;
        Ok(())
    }

    pub fn put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &AccessControlList,
    ) -> Result<(), Error> {
        let mut body = Cursor::new(acl.to_xml(false)?.into_bytes());
        let options = RequestOptions::new().query_params(QueryParams::subresource("acl"));
        self.put_object(bucket, key, &mut body, Some(&options))
    }

    pub fn delete_object(&self, bucket: &str, key: &str) -> Result<(), Error> {
        let request = Request::new(Method::DELETE).bucket(bucket).object(key);
        self.send_request(&request, None, None, 0, &StatusPolicy::DELETE_OBJECT)?;
        Ok(())
    }
}
