/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::types::{FailedMultipartUploadPolicy, StorageTier};

use super::{CopyHandle, CopyInputBuilder};

/// Fluent builder for constructing a single object copy transfer
#[derive(Debug)]
pub struct CopyFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: CopyInputBuilder,
}

impl CopyFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Initiate a copy transfer for a single object.
    ///
    /// Must be called from within a tokio runtime.
    pub fn initiate(self) -> Result<CopyHandle, Error> {
        let input = self.inner.build()?;
        crate::operation::copy::CopyObject::orchestrate(self.handle, input)
    }

    /// Key of the object to copy
    ///
    /// This field is required.
    pub fn source_key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.source_key(input);
        self
    }

    /// Key of the object to copy
    pub fn set_source_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_source_key(input);
        self
    }

    /// Key of the object to copy
    pub fn get_source_key(&self) -> &Option<String> {
        self.inner.get_source_key()
    }

    /// Key of the new object
    ///
    /// This field is required.
    pub fn destination_key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.destination_key(input);
        self
    }

    /// Key of the new object
    pub fn set_destination_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_destination_key(input);
        self
    }

    /// Key of the new object
    pub fn get_destination_key(&self) -> &Option<String> {
        self.inner.get_destination_key()
    }

    /// Size of the source object, skips looking it up when set
    pub fn source_size(mut self, input: u64) -> Self {
        self.inner = self.inner.source_size(input);
        self
    }

    /// Size of the source object, skips looking it up when set
    pub fn set_source_size(mut self, input: Option<u64>) -> Self {
        self.inner = self.inner.set_source_size(input);
        self
    }

    /// Size of the source object
    pub fn get_source_size(&self) -> &Option<u64> {
        self.inner.get_source_size()
    }

    /// Storage tier of the new object, overrides the client's default tier
    pub fn storage_tier(mut self, input: StorageTier) -> Self {
        self.inner = self.inner.storage_tier(input);
        self
    }

    /// Storage tier of the new object, overrides the client's default tier
    pub fn set_storage_tier(mut self, input: Option<StorageTier>) -> Self {
        self.inner = self.inner.set_storage_tier(input);
        self
    }

    /// Storage tier of the new object
    pub fn get_storage_tier(&self) -> &Option<StorageTier> {
        self.inner.get_storage_tier()
    }

    /// How a failed chunked copy is cleaned up, overrides the client's configuration
    pub fn failed_multipart_upload_policy(mut self, input: FailedMultipartUploadPolicy) -> Self {
        self.inner = self.inner.failed_multipart_upload_policy(input);
        self
    }

    /// How a failed chunked copy is cleaned up, overrides the client's configuration
    pub fn set_failed_multipart_upload_policy(
        mut self,
        input: Option<FailedMultipartUploadPolicy>,
    ) -> Self {
        self.inner = self.inner.set_failed_multipart_upload_policy(input);
        self
    }

    /// How a failed chunked copy is cleaned up
    pub fn get_failed_multipart_upload_policy(&self) -> &Option<FailedMultipartUploadPolicy> {
        self.inner.get_failed_multipart_upload_policy()
    }

    /// Cancel the copy when `input` is cancelled
    pub fn cancellation_token(mut self, input: CancellationToken) -> Self {
        self.inner = self.inner.cancellation_token(input);
        self
    }

    /// Cancel the copy when `input` is cancelled
    pub fn set_cancellation_token(mut self, input: Option<CancellationToken>) -> Self {
        self.inner = self.inner.set_cancellation_token(input);
        self
    }

    /// Cancel the copy when `input` is cancelled
    pub fn get_cancellation_token(&self) -> &Option<CancellationToken> {
        self.inner.get_cancellation_token()
    }
}

impl crate::operation::copy::input::CopyInputBuilder {
    /// Initiate a copy transfer for a single object with this input using the given client.
    pub fn initiate_with(self, client: &crate::Client) -> Result<CopyHandle, Error> {
        let mut fluent_builder = client.copy();
        fluent_builder.inner = self;
        fluent_builder.initiate()
    }
}
