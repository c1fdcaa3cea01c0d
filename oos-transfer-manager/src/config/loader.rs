/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use crate::config::Builder;
use crate::error::{self, Error};
use crate::storage::s3::S3Storage;
use crate::types::StorageTier;
use crate::Config;

/// Load transfer manager [`Config`] from the environment.
///
/// Credentials and region are resolved by `aws-config` from the usual environment variables,
/// shared config files and instance metadata. Transfers go to a single S3 bucket which must be
/// set with [`bucket`](ConfigLoader::bucket).
#[derive(Default, Debug)]
pub struct ConfigLoader {
    builder: Builder,
    bucket: Option<String>,
}

impl ConfigLoader {
    /// The bucket objects are transferred to and from (required)
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Objects larger than this are uploaded in chunks.
    ///
    /// See [`Builder::upload_cutoff`]
    pub fn upload_cutoff(mut self, upload_cutoff: u64) -> Self {
        self.builder = self.builder.upload_cutoff(upload_cutoff);
        self
    }

    /// The size of each part of a chunked upload.
    ///
    /// See [`Builder::chunk_size`]
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.builder = self.builder.chunk_size(chunk_size);
        self
    }

    /// Maximum number of parts of a single transfer that are in flight at once
    pub fn upload_concurrency(mut self, upload_concurrency: usize) -> Self {
        self.builder = self.builder.upload_concurrency(upload_concurrency);
        self
    }

    /// Objects larger than this are copied in chunks
    pub fn copy_cutoff(mut self, copy_cutoff: u64) -> Self {
        self.builder = self.builder.copy_cutoff(copy_cutoff);
        self
    }

    /// How long to wait for an asynchronous copy to finish
    pub fn copy_timeout(mut self, copy_timeout: Duration) -> Self {
        self.builder = self.builder.copy_timeout(copy_timeout);
        self
    }

    /// Don't compute the MD5 digest of uploaded data
    pub fn disable_checksum(mut self, disable_checksum: bool) -> Self {
        self.builder = self.builder.disable_checksum(disable_checksum);
        self
    }

    /// Leave failed multipart sessions open instead of aborting them
    pub fn leave_parts_on_error(mut self, leave_parts_on_error: bool) -> Self {
        self.builder = self.builder.leave_parts_on_error(leave_parts_on_error);
        self
    }

    /// The default storage tier for new objects
    pub fn storage_tier(mut self, storage_tier: StorageTier) -> Self {
        self.builder = self.builder.storage_tier(storage_tier);
        self
    }

    /// How many times a part failing with a transient error is retried
    pub fn part_retry_attempts(mut self, part_retry_attempts: usize) -> Self {
        self.builder = self.builder.part_retry_attempts(part_retry_attempts);
        self
    }

    /// Load the default configuration
    ///
    /// If fields have been overridden during builder construction, the override values will be
    /// used. Otherwise, the default values for each field will be provided.
    pub async fn load(self) -> Result<Config, Error> {
        let bucket = self
            .bucket
            .ok_or_else(|| error::invalid_input("a bucket is required"))?;
        let shared_config = aws_config::from_env().load().await;
        let s3_client = aws_sdk_s3::Client::new(&shared_config);
        tracing::debug!(bucket = %bucket, "loaded S3 configuration from the environment");
        self.builder
            .storage(S3Storage::new(s3_client, bucket))
            .build()
    }
}
