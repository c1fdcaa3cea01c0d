/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::io::InputStream;
use crate::types::{FailedMultipartUploadPolicy, StorageTier};

use super::{UploadHandle, UploadInputBuilder};

/// Fluent builder for constructing a single object upload transfer
#[derive(Debug)]
pub struct UploadFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: UploadInputBuilder,
}

impl UploadFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Initiate an upload transfer for a single object.
    ///
    /// Must be called from within a tokio runtime. Returns as soon as the transfer is started;
    /// use the returned handle to wait for it.
    pub fn initiate(self) -> Result<UploadHandle, Error> {
        let input = self.inner.build()?;
        crate::operation::upload::Upload::orchestrate(self.handle, input)
    }

    /// Object key the body is stored under
    ///
    /// This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.key(input);
        self
    }

    /// Object key the body is stored under
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_key(input);
        self
    }

    /// Object key the body is stored under
    pub fn get_key(&self) -> &Option<String> {
        self.inner.get_key()
    }

    /// Object data
    ///
    /// This field is required.
    pub fn body(mut self, input: InputStream) -> Self {
        self.inner = self.inner.body(input);
        self
    }

    /// Object data
    pub fn set_body(mut self, input: Option<InputStream>) -> Self {
        self.inner = self.inner.set_body(input);
        self
    }

    /// Object data
    pub fn get_body(&self) -> &Option<InputStream> {
        self.inner.get_body()
    }

    /// Storage tier for the object, overrides the client's default tier
    pub fn storage_tier(mut self, input: StorageTier) -> Self {
        self.inner = self.inner.storage_tier(input);
        self
    }

    /// Storage tier for the object, overrides the client's default tier
    pub fn set_storage_tier(mut self, input: Option<StorageTier>) -> Self {
        self.inner = self.inner.set_storage_tier(input);
        self
    }

    /// Storage tier for the object
    pub fn get_storage_tier(&self) -> &Option<StorageTier> {
        self.inner.get_storage_tier()
    }

    /// How a failed multipart upload is cleaned up, overrides the client's configuration
    pub fn failed_multipart_upload_policy(mut self, input: FailedMultipartUploadPolicy) -> Self {
        self.inner = self.inner.failed_multipart_upload_policy(input);
        self
    }

    /// How a failed multipart upload is cleaned up, overrides the client's configuration
    pub fn set_failed_multipart_upload_policy(
        mut self,
        input: Option<FailedMultipartUploadPolicy>,
    ) -> Self {
        self.inner = self.inner.set_failed_multipart_upload_policy(input);
        self
    }

    /// How a failed multipart upload is cleaned up
    pub fn get_failed_multipart_upload_policy(&self) -> &Option<FailedMultipartUploadPolicy> {
        self.inner.get_failed_multipart_upload_policy()
    }

    /// Cancel the upload when `input` is cancelled
    pub fn cancellation_token(mut self, input: CancellationToken) -> Self {
        self.inner = self.inner.cancellation_token(input);
        self
    }

    /// Cancel the upload when `input` is cancelled
    pub fn set_cancellation_token(mut self, input: Option<CancellationToken>) -> Self {
        self.inner = self.inner.set_cancellation_token(input);
        self
    }

    /// Cancel the upload when `input` is cancelled
    pub fn get_cancellation_token(&self) -> &Option<CancellationToken> {
        self.inner.get_cancellation_token()
    }
}

impl crate::operation::upload::input::UploadInputBuilder {
    /// Initiate an upload transfer for a single object with this input using the given client.
    pub fn initiate_with(self, client: &crate::Client) -> Result<UploadHandle, Error> {
        let mut fluent_builder = client.upload();
        fluent_builder.inner = self;
        fluent_builder.initiate()
    }
}
