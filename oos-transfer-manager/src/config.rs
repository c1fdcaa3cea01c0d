/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use aws_smithy_async::rt::sleep::{AsyncSleep, SharedAsyncSleep, TokioSleep};
use aws_smithy_async::time::{SharedTimeSource, SystemTimeSource, TimeSource};

use crate::error::{self, Error};
use crate::metrics::unit::ByteUnit;
use crate::plan::{self, ChunkLimits};
use crate::storage::{ObjectStorage, SharedStorage};
use crate::types::StorageTier;

/// Loader for [`Config`] backed by the AWS shared configuration
pub mod loader;

const DEFAULT_UPLOAD_CUTOFF: u64 = ByteUnit::Mebibyte.bytes(200);
const DEFAULT_CHUNK_SIZE: u64 = ByteUnit::Mebibyte.bytes(5);
const DEFAULT_UPLOAD_CONCURRENCY: usize = 10;
const DEFAULT_COPY_CUTOFF: u64 = ByteUnit::Mebibyte.bytes(4768);
const MAX_COPY_CUTOFF: u64 = ByteUnit::Gibibyte.bytes(5);
const DEFAULT_COPY_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_PART_RETRY_ATTEMPTS: usize = 2;

/// Configuration for a [`Client`](crate::client::Client)
///
/// A `Config` is immutable once built and is read by every transfer started from the client.
#[derive(Debug, Clone)]
pub struct Config {
    upload_cutoff: u64,
    chunk_size: u64,
    upload_concurrency: usize,
    copy_cutoff: u64,
    copy_timeout: Duration,
    disable_checksum: bool,
    leave_parts_on_error: bool,
    storage_tier: StorageTier,
    part_retry_attempts: usize,
    chunk_limits: ChunkLimits,
    time_source: SharedTimeSource,
    sleep_impl: SharedAsyncSleep,
    storage: SharedStorage,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Objects larger than this are uploaded in chunks
    pub fn upload_cutoff(&self) -> u64 {
        self.upload_cutoff
    }

    /// The size of each part of a chunked upload.
    ///
    /// The effective size of a transfer may be larger if this size would need more parts than a
    /// multipart session allows.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Maximum number of parts of a single transfer that are in flight at once
    pub fn upload_concurrency(&self) -> usize {
        self.upload_concurrency
    }

    /// Objects larger than this are copied in chunks
    pub fn copy_cutoff(&self) -> u64 {
        self.copy_cutoff
    }

    /// How long to wait for an asynchronous copy before giving up
    pub fn copy_timeout(&self) -> Duration {
        self.copy_timeout
    }

    /// Whether computing the MD5 digest of uploads is disabled
    pub fn disable_checksum(&self) -> bool {
        self.disable_checksum
    }

    /// Whether failed multipart sessions are left open instead of aborted
    pub fn leave_parts_on_error(&self) -> bool {
        self.leave_parts_on_error
    }

    /// The default storage tier for new objects
    pub fn storage_tier(&self) -> StorageTier {
        self.storage_tier
    }

    /// How many times a part failing with a transient error is retried
    pub fn part_retry_attempts(&self) -> usize {
        self.part_retry_attempts
    }

    /// Limits of the multipart sessions of the storage service
    pub fn chunk_limits(&self) -> &ChunkLimits {
        &self.chunk_limits
    }

    /// The time source used to measure copy timeouts
    pub fn time_source(&self) -> &SharedTimeSource {
        &self.time_source
    }

    /// The sleep implementation used between copy status polls
    pub fn sleep_impl(&self) -> &SharedAsyncSleep {
        &self.sleep_impl
    }

    /// The object storage transfers are executed against
    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    upload_cutoff: Option<u64>,
    chunk_size: Option<u64>,
    upload_concurrency: Option<usize>,
    copy_cutoff: Option<u64>,
    copy_timeout: Option<Duration>,
    disable_checksum: bool,
    leave_parts_on_error: bool,
    storage_tier: StorageTier,
    part_retry_attempts: Option<usize>,
    chunk_limits: ChunkLimits,
    time_source: Option<SharedTimeSource>,
    sleep_impl: Option<SharedAsyncSleep>,
    storage: Option<SharedStorage>,
}

impl Builder {
    /// Objects larger than this are uploaded in chunks.
    ///
    /// Objects of unknown size are always uploaded in chunks. Default is 200 MiB, the maximum is
    /// 5 GiB.
    pub fn upload_cutoff(mut self, upload_cutoff: u64) -> Self {
        self.upload_cutoff = Some(upload_cutoff);
        self
    }

    /// The size of each part of a chunked upload.
    ///
    /// Default is 5 MiB, which is also the minimum. Larger chunks use more memory: up to
    /// `chunk_size * upload_concurrency` bytes are buffered per transfer.
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Maximum number of parts of a single transfer that are in flight at once.
    ///
    /// Default is 10.
    pub fn upload_concurrency(mut self, upload_concurrency: usize) -> Self {
        self.upload_concurrency = Some(upload_concurrency);
        self
    }

    /// Objects larger than this are copied in chunks.
    ///
    /// Default is 4768 MiB, the maximum is 5 GiB.
    pub fn copy_cutoff(mut self, copy_cutoff: u64) -> Self {
        self.copy_cutoff = Some(copy_cutoff);
        self
    }

    /// How long to wait for an asynchronous copy to finish.
    ///
    /// Default is one minute. The copy itself is not cancelled when the timeout elapses.
    pub fn copy_timeout(mut self, copy_timeout: Duration) -> Self {
        self.copy_timeout = Some(copy_timeout);
        self
    }

    /// Don't compute the MD5 digest of uploaded data
    pub fn disable_checksum(mut self, disable_checksum: bool) -> Self {
        self.disable_checksum = disable_checksum;
        self
    }

    /// Leave failed multipart sessions open so they can be resumed or cleaned up later.
    ///
    /// Parts of an open session are billed until the session is completed or aborted.
    pub fn leave_parts_on_error(mut self, leave_parts_on_error: bool) -> Self {
        self.leave_parts_on_error = leave_parts_on_error;
        self
    }

    /// The default storage tier for new objects
    pub fn storage_tier(mut self, storage_tier: StorageTier) -> Self {
        self.storage_tier = storage_tier;
        self
    }

    /// How many times a part failing with a transient error is retried. Default is 2.
    pub fn part_retry_attempts(mut self, part_retry_attempts: usize) -> Self {
        self.part_retry_attempts = Some(part_retry_attempts);
        self
    }

    /// Override the time source used to measure copy timeouts
    pub fn time_source(mut self, time_source: impl TimeSource + 'static) -> Self {
        self.time_source = Some(SharedTimeSource::new(time_source));
        self
    }

    /// Override the sleep implementation used between copy status polls
    pub fn sleep_impl(mut self, sleep_impl: impl AsyncSleep + 'static) -> Self {
        self.sleep_impl = Some(SharedAsyncSleep::new(sleep_impl));
        self
    }

    /// Set the object storage to transfer objects to and from
    pub fn storage(mut self, storage: impl ObjectStorage + 'static) -> Self {
        self.storage = Some(SharedStorage::new(storage));
        self
    }

    /// Set an already shared object storage
    pub fn shared_storage(mut self, storage: SharedStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Consumes the builder and constructs a [`Config`]
    pub fn build(self) -> Result<Config, Error> {
        let limits = self.chunk_limits;
        let upload_cutoff = self.upload_cutoff.unwrap_or(DEFAULT_UPLOAD_CUTOFF);
        plan::validate_upload_cutoff(upload_cutoff, &limits)?;
        let chunk_size = self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        plan::validate_chunk_size(chunk_size, &limits)?;

        let copy_cutoff = self.copy_cutoff.unwrap_or(DEFAULT_COPY_CUTOFF);
        if copy_cutoff > MAX_COPY_CUTOFF {
            return Err(error::invalid_size_configuration(format!(
                "copy cutoff {} is larger than the maximum of {}",
                ByteUnit::display(copy_cutoff),
                ByteUnit::display(MAX_COPY_CUTOFF)
            )));
        }

        let upload_concurrency = self
            .upload_concurrency
            .unwrap_or(DEFAULT_UPLOAD_CONCURRENCY);
        if upload_concurrency == 0 {
            return Err(error::invalid_input("upload concurrency must be at least 1"));
        }

        let storage = self
            .storage
            .ok_or_else(|| error::invalid_input("an object storage is required"))?;

        Ok(Config {
            upload_cutoff,
            chunk_size,
            upload_concurrency,
            copy_cutoff,
            copy_timeout: self.copy_timeout.unwrap_or(DEFAULT_COPY_TIMEOUT),
            disable_checksum: self.disable_checksum,
            leave_parts_on_error: self.leave_parts_on_error,
            storage_tier: self.storage_tier,
            part_retry_attempts: self
                .part_retry_attempts
                .unwrap_or(DEFAULT_PART_RETRY_ATTEMPTS),
            chunk_limits: limits,
            time_source: self
                .time_source
                .unwrap_or_else(|| SharedTimeSource::new(SystemTimeSource::new())),
            sleep_impl: self
                .sleep_impl
                .unwrap_or_else(|| SharedAsyncSleep::new(TokioSleep::new())),
            storage,
        })
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Builder {
    /// Override the limits of the storage service's multipart sessions
    pub fn chunk_limits(mut self, chunk_limits: ChunkLimits) -> Self {
        self.chunk_limits = chunk_limits;
        self
    }
}
