/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_types::error::operation::BuildError;
use tokio_util::sync::CancellationToken;

use crate::types::{FailedMultipartUploadPolicy, StorageTier};

/// Request type for copying a single object
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct CopyInput {
    pub(crate) source_key: String,
    pub(crate) destination_key: String,
    pub(crate) source_size: Option<u64>,
    pub(crate) storage_tier: Option<StorageTier>,
    pub(crate) failed_multipart_upload_policy: Option<FailedMultipartUploadPolicy>,
    pub(crate) cancellation_token: Option<CancellationToken>,
}

impl CopyInput {
    /// Creates a new builder-style object to manufacture [`CopyInput`].
    pub fn builder() -> CopyInputBuilder {
        CopyInputBuilder::default()
    }

    /// Key of the object to copy
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    /// Key of the new object
    pub fn destination_key(&self) -> &str {
        &self.destination_key
    }

    /// Size of the source object, if already known
    pub fn source_size(&self) -> Option<u64> {
        self.source_size
    }

    /// Storage tier of the new object
    pub fn storage_tier(&self) -> Option<StorageTier> {
        self.storage_tier
    }

    /// How a failed chunked copy is cleaned up
    pub fn failed_multipart_upload_policy(&self) -> Option<&FailedMultipartUploadPolicy> {
        self.failed_multipart_upload_policy.as_ref()
    }

    /// Token that cancels the copy when cancelled
    pub fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancellation_token.as_ref()
    }
}

/// A builder for [`CopyInput`].
#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct CopyInputBuilder {
    pub(crate) source_key: Option<String>,
    pub(crate) destination_key: Option<String>,
    pub(crate) source_size: Option<u64>,
    pub(crate) storage_tier: Option<StorageTier>,
    pub(crate) failed_multipart_upload_policy: Option<FailedMultipartUploadPolicy>,
    pub(crate) cancellation_token: Option<CancellationToken>,
}

impl CopyInputBuilder {
    /// Key of the object to copy
    ///
    /// This field is required.
    pub fn source_key(mut self, input: impl Into<String>) -> Self {
        self.source_key = Some(input.into());
        self
    }

    /// Key of the object to copy
    pub fn set_source_key(mut self, input: Option<String>) -> Self {
        self.source_key = input;
        self
    }

    /// Key of the object to copy
    pub fn get_source_key(&self) -> &Option<String> {
        &self.source_key
    }

    /// Key of the new object
    ///
    /// This field is required.
    pub fn destination_key(mut self, input: impl Into<String>) -> Self {
        self.destination_key = Some(input.into());
        self
    }

    /// Key of the new object
    pub fn set_destination_key(mut self, input: Option<String>) -> Self {
        self.destination_key = input;
        self
    }

    /// Key of the new object
    pub fn get_destination_key(&self) -> &Option<String> {
        &self.destination_key
    }

    /// Size of the source object.
    ///
    /// When not set the size is looked up with a metadata request before copying.
    pub fn source_size(mut self, input: u64) -> Self {
        self.source_size = Some(input);
        self
    }

    /// Size of the source object
    pub fn set_source_size(mut self, input: Option<u64>) -> Self {
        self.source_size = input;
        self
    }

    /// Size of the source object
    pub fn get_source_size(&self) -> &Option<u64> {
        &self.source_size
    }

    /// Storage tier of the new object
    pub fn storage_tier(mut self, input: StorageTier) -> Self {
        self.storage_tier = Some(input);
        self
    }

    /// Storage tier of the new object
    pub fn set_storage_tier(mut self, input: Option<StorageTier>) -> Self {
        self.storage_tier = input;
        self
    }

    /// Storage tier of the new object
    pub fn get_storage_tier(&self) -> &Option<StorageTier> {
        &self.storage_tier
    }

    /// How a failed chunked copy is cleaned up
    pub fn failed_multipart_upload_policy(mut self, input: FailedMultipartUploadPolicy) -> Self {
        self.failed_multipart_upload_policy = Some(input);
        self
    }

    /// How a failed chunked copy is cleaned up
    pub fn set_failed_multipart_upload_policy(
        mut self,
        input: Option<FailedMultipartUploadPolicy>,
    ) -> Self {
        self.failed_multipart_upload_policy = input;
        self
    }

    /// How a failed chunked copy is cleaned up
    pub fn get_failed_multipart_upload_policy(&self) -> &Option<FailedMultipartUploadPolicy> {
        &self.failed_multipart_upload_policy
    }

    /// Cancel the copy when `input` is cancelled.
    ///
    /// Cancelling stops polling an asynchronous copy without touching the remote operation.
    pub fn cancellation_token(mut self, input: CancellationToken) -> Self {
        self.cancellation_token = Some(input);
        self
    }

    /// Cancel the copy when `input` is cancelled
    pub fn set_cancellation_token(mut self, input: Option<CancellationToken>) -> Self {
        self.cancellation_token = input;
        self
    }

    /// Cancel the copy when `input` is cancelled
    pub fn get_cancellation_token(&self) -> &Option<CancellationToken> {
        &self.cancellation_token
    }

    /// Consumes the builder and constructs a [`CopyInput`]
    pub fn build(self) -> Result<CopyInput, BuildError> {
        let source_key = self
            .source_key
            .ok_or_else(|| BuildError::missing_field("source_key", "A source key is required"))?;
        let destination_key = self.destination_key.ok_or_else(|| {
            BuildError::missing_field("destination_key", "A destination key is required")
        })?;
        if source_key == destination_key {
            return Err(BuildError::invalid_field(
                "destination_key",
                "An object cannot be copied onto itself",
            ));
        }

        Ok(CopyInput {
            source_key,
            destination_key,
            source_size: self.source_size,
            storage_tier: self.storage_tier,
            failed_multipart_upload_policy: self.failed_multipart_upload_policy,
            cancellation_token: self.cancellation_token,
        })
    }
}
