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
use crate::gs::executor::{ObjectSource, StatusPolicy};
use crate::gs::http::{QueryParams, Request};
use crate::gs::types::{AccessControlList, BucketListResult, ObjectListResult};

impl Client {
    /// Lists the buckets owned by the authenticated user.
    pub fn get_service(&self) -> Result<BucketListResult, Error> {
        let body = self.get_document(&Request::new(Method::GET))?;
        BucketListResult::from_xml(&body)
    }

    /// Lists objects in a bucket.
    ///
    /// `query_params` may carry `prefix`, `marker`, `delimiter` and
    /// `max-keys`.
    pub fn get_bucket(
        &self,
        bucket: &str,
        query_params: Option<&QueryParams>,
    ) -> Result<ObjectListResult, Error> {
        let request = Request::new(Method::GET)
            .bucket(bucket)
            .query_params(query_params);
        let body = self.get_document(&request)?;
        ObjectListResult::from_xml(&body)
    }

    pub fn get_bucket_acl(&self, bucket: &str) -> Result<AccessControlList, Error> {
        let query = QueryParams::subresource("acl");
        let request = Request::new(Method::GET)
            .bucket(bucket)
            .query_params(Some(&query));
        let body = self.get_document(&request)?;
        AccessControlList::from_xml(&body)
    }

    /// Creates a bucket, or updates a bucket sub-resource when `options`
    /// selects one. `source` is sent as the request body.
    pub fn put_bucket(
        &self,
        bucket: &str,
        source: Option<&mut dyn ObjectSource>,
        options: Option<&RequestOptions>,
    ) -> Result<(), Error> {
        let request = Request::new(Method::PUT)
            .bucket(bucket)
            .extra_headers(options.and_then(|o| o.extra_headers.as_ref()))
            .query_params(options.and_then(|o| o.query_params.as_ref()));
        let chunk_size = options.map_or(0, |o| o.chunk_size);
        self.send_request(&request, source, None, chunk_size, &StatusPolicy::DEFAULT)?;
        Ok(())
    }

    pub fn put_bucket_acl(&self, bucket: &str, acl: &AccessControlList) -> Result<(), Error> {
        let mut body = Cursor::new(acl.to_xml(false)?.into_bytes());
        let options = RequestOptions::new().query_params(QueryParams::subresource("acl"));
        self.put_bucket(bucket, Some(&mut body), Some(&options))
    }

    /// Deletes an empty bucket.
    ///
    /// 404 and 409 are retried, since a bucket emptied just before may still
    /// be reported as missing or non-empty.
    pub fn delete_bucket(&self, bucket: &str) -> Result<(), Error> {
        let request = Request::new(Method::DELETE).bucket(bucket);
        self.send_request(&request, None, None, 0, &StatusPolicy::DELETE_BUCKET)?;
        Ok(())
    }

    /// Runs a GET and returns the success body.
    pub(crate) fn get_document(&self, request: &Request) -> Result<Vec<u8>, Error> {
        let mut body = Cursor::new(Vec::new());
        self.send_request(request, None, Some(&mut body), 0, &StatusPolicy::DEFAULT)?;
        Ok(body.into_inner())
    }
}
