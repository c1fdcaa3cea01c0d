/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_types::error::operation::BuildError;
use tokio_util::sync::CancellationToken;

use crate::io::InputStream;
use crate::types::{FailedMultipartUploadPolicy, StorageTier};

/// Request type for uploading a single object
#[non_exhaustive]
#[derive(Debug)]
pub struct UploadInput {
    pub(crate) key: String,
    pub(crate) body: InputStream,
    pub(crate) storage_tier: Option<StorageTier>,
    pub(crate) failed_multipart_upload_policy: Option<FailedMultipartUploadPolicy>,
    pub(crate) cancellation_token: Option<CancellationToken>,
}

impl UploadInput {
    /// Creates a new builder-style object to manufacture [`UploadInput`].
    pub fn builder() -> UploadInputBuilder {
        UploadInputBuilder::default()
    }

    /// Object key the body is stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Object data
    pub fn body(&self) -> &InputStream {
        &self.body
    }

    /// Storage tier for the object, falls back to the client's default tier
    pub fn storage_tier(&self) -> Option<StorageTier> {
        self.storage_tier
    }

    /// How a failed multipart upload is cleaned up, falls back to the client's configuration
    pub fn failed_multipart_upload_policy(&self) -> Option<&FailedMultipartUploadPolicy> {
        self.failed_multipart_upload_policy.as_ref()
    }

    /// Token that cancels the upload when cancelled
    pub fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancellation_token.as_ref()
    }
}

/// A builder for [`UploadInput`].
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct UploadInputBuilder {
    pub(crate) key: Option<String>,
    pub(crate) body: Option<InputStream>,
    pub(crate) storage_tier: Option<StorageTier>,
    pub(crate) failed_multipart_upload_policy: Option<FailedMultipartUploadPolicy>,
    pub(crate) cancellation_token: Option<CancellationToken>,
}

impl UploadInputBuilder {
    /// Object key the body is stored under
    ///
    /// This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// Object key the body is stored under
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.key = input;
        self
    }

    /// Object key the body is stored under
    pub fn get_key(&self) -> &Option<String> {
        &self.key
    }

    /// Object data
    ///
    /// This field is required.
    pub fn body(mut self, input: InputStream) -> Self {
        self.body = Some(input);
        self
    }

    /// Object data
    pub fn set_body(mut self, input: Option<InputStream>) -> Self {
        self.body = input;
        self
    }

    /// Object data
    pub fn get_body(&self) -> &Option<InputStream> {
        &self.body
    }

    /// Storage tier for the object
    pub fn storage_tier(mut self, input: StorageTier) -> Self {
        self.storage_tier = Some(input);
        self
    }

    /// Storage tier for the object
    pub fn set_storage_tier(mut self, input: Option<StorageTier>) -> Self {
        self.storage_tier = input;
        self
    }

    /// Storage tier for the object
    pub fn get_storage_tier(&self) -> &Option<StorageTier> {
        &self.storage_tier
    }

    /// How a failed multipart upload is cleaned up
    pub fn failed_multipart_upload_policy(mut self, input: FailedMultipartUploadPolicy) -> Self {
        self.failed_multipart_upload_policy = Some(input);
        self
    }

    /// How a failed multipart upload is cleaned up
    pub fn set_failed_multipart_upload_policy(
        mut self,
        input: Option<FailedMultipartUploadPolicy>,
    ) -> Self {
        self.failed_multipart_upload_policy = input;
        self
    }

    /// How a failed multipart upload is cleaned up
    pub fn get_failed_multipart_upload_policy(&self) -> &Option<FailedMultipartUploadPolicy> {
        &self.failed_multipart_upload_policy
    }

    /// Cancel the upload when `input` is cancelled.
    ///
    /// Cancelling stops new parts from being sent, interrupts the ones in flight and applies the
    /// failed multipart upload policy.
    pub fn cancellation_token(mut self, input: CancellationToken) -> Self {
        self.cancellation_token = Some(input);
        self
    }

    /// Cancel the upload when `input` is cancelled
    pub fn set_cancellation_token(mut self, input: Option<CancellationToken>) -> Self {
        self.cancellation_token = input;
        self
    }

    /// Cancel the upload when `input` is cancelled
    pub fn get_cancellation_token(&self) -> &Option<CancellationToken> {
        &self.cancellation_token
    }

    /// Consumes the builder and constructs an [`UploadInput`]
    pub fn build(self) -> Result<UploadInput, BuildError> {
        let key = self
            .key
            .ok_or_else(|| BuildError::missing_field("key", "A key is required"))?;
        if key.is_empty() {
            return Err(BuildError::invalid_field("key", "The key must not be empty"));
        }
        let body = self
            .body
            .ok_or_else(|| BuildError::missing_field("body", "A body is required"))?;

        Ok(UploadInput {
            key,
            body,
            storage_tier: self.storage_tier,
            failed_multipart_upload_policy: self.failed_multipart_upload_policy,
            cancellation_token: self.cancellation_token,
        })
    }
}
