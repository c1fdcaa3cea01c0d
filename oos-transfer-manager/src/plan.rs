/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::ops::Range;

use crate::error::{self, Error};
use crate::metrics::unit::ByteUnit;
use crate::types::TransferMode;

/// Decide how an object of the given size is transferred.
///
/// Objects of unknown size are always streamed as a chunked transfer.
pub fn classify(total_size: Option<u64>, cutoff: u64) -> TransferMode {
    match total_size {
        Some(size) if size <= cutoff => TransferMode::Simple,
        _ => TransferMode::Chunked,
    }
}

/// Limits the object storage service places on multipart sessions.
///
/// The limits are fixed in production. Tests may shrink them to exercise part count edge cases
/// without moving gigabytes of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    min_chunk_size: u64,
    max_chunk_size: u64,
    max_part_count: u64,
    max_upload_cutoff: u64,
    granularity: u64,
}

impl Default for ChunkLimits {
    fn default() -> Self {
        Self {
            min_chunk_size: ByteUnit::Mebibyte.bytes(5),
            max_chunk_size: ByteUnit::Gibibyte.bytes(5),
            max_part_count: 10_000,
            max_upload_cutoff: ByteUnit::Gibibyte.bytes(5),
            granularity: ByteUnit::Mebibyte.as_bytes_u64(),
        }
    }
}

impl ChunkLimits {
    /// Smallest chunk size a multipart session accepts (the last part may be smaller)
    pub fn min_chunk_size(&self) -> u64 {
        self.min_chunk_size
    }

    /// Largest chunk size a multipart session accepts
    pub fn max_chunk_size(&self) -> u64 {
        self.max_chunk_size
    }

    /// Maximum number of parts in a multipart session
    pub fn max_part_count(&self) -> u64 {
        self.max_part_count
    }

    /// Largest object that can be stored with a single request
    pub fn max_upload_cutoff(&self) -> u64 {
        self.max_upload_cutoff
    }

    /// Chunk sizes grown to stay under the part count ceiling are rounded up to a multiple of
    /// this value
    pub fn granularity(&self) -> u64 {
        self.granularity
    }
}

#[cfg(any(test, feature = "test-util"))]
impl ChunkLimits {
    /// Override the minimum chunk size
    pub fn with_min_chunk_size(mut self, min_chunk_size: u64) -> Self {
        self.min_chunk_size = min_chunk_size;
        self
    }

    /// Override the maximum chunk size
    pub fn with_max_chunk_size(mut self, max_chunk_size: u64) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// Override the maximum part count
    pub fn with_max_part_count(mut self, max_part_count: u64) -> Self {
        self.max_part_count = max_part_count;
        self
    }

    /// Override the maximum upload cutoff
    pub fn with_max_upload_cutoff(mut self, max_upload_cutoff: u64) -> Self {
        self.max_upload_cutoff = max_upload_cutoff;
        self
    }

    /// Override the chunk growth granularity
    pub fn with_granularity(mut self, granularity: u64) -> Self {
        self.granularity = granularity.max(1);
        self
    }
}

/// How a chunked transfer is split into parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    chunk_size: u64,
    chunk_count: Option<u64>,
    max_chunk_count: u64,
}

impl ChunkPlan {
    /// Size of every part except possibly the last one
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Number of parts, if the size of the object is known up front
    pub fn chunk_count(&self) -> Option<u64> {
        self.chunk_count
    }

    /// Maximum number of parts the session accepts
    pub fn max_chunk_count(&self) -> u64 {
        self.max_chunk_count
    }

    /// Byte range of the given 1-based part of an object of `total_size` bytes
    pub(crate) fn part_range(&self, part_number: u64, total_size: u64) -> Range<u64> {
        let start = (part_number - 1).saturating_mul(self.chunk_size).min(total_size);
        let end = start.saturating_add(self.chunk_size).min(total_size);
        start..end
    }
}

/// Reject an upload cutoff the service cannot honor
pub(crate) fn validate_upload_cutoff(cutoff: u64, limits: &ChunkLimits) -> Result<(), Error> {
    if cutoff > limits.max_upload_cutoff {
        return Err(error::invalid_size_configuration(format!(
            "upload cutoff {} is larger than the maximum of {}",
            ByteUnit::display(cutoff),
            ByteUnit::display(limits.max_upload_cutoff)
        )));
    }
    Ok(())
}

/// Reject a chunk size the service cannot honor
pub(crate) fn validate_chunk_size(chunk_size: u64, limits: &ChunkLimits) -> Result<(), Error> {
    if chunk_size < limits.min_chunk_size {
        return Err(error::invalid_size_configuration(format!(
            "chunk size {} is smaller than the minimum of {}",
            ByteUnit::display(chunk_size),
            ByteUnit::display(limits.min_chunk_size)
        )));
    }
    if chunk_size > limits.max_chunk_size {
        return Err(error::invalid_size_configuration(format!(
            "chunk size {} is larger than the maximum of {}",
            ByteUnit::display(chunk_size),
            ByteUnit::display(limits.max_chunk_size)
        )));
    }
    Ok(())
}

/// Plan a chunked transfer of `total_size` bytes (`None` when streaming an unknown size).
///
/// When `chunk_size` would need more parts than [`ChunkLimits::max_part_count`] the chunk size is
/// grown to `ceil(total_size / max_part_count)` rounded up to [`ChunkLimits::granularity`]. The
/// resulting chunk size is never smaller than the configured one.
pub fn plan(
    total_size: Option<u64>,
    chunk_size: u64,
    limits: &ChunkLimits,
) -> Result<ChunkPlan, Error> {
    validate_chunk_size(chunk_size, limits)?;

    let Some(total_size) = total_size else {
        tracing::trace!(chunk_size, "planned streaming transfer of unknown size");
        return Ok(ChunkPlan {
            chunk_size,
            chunk_count: None,
            max_chunk_count: limits.max_part_count,
        });
    };

    let mut effective = chunk_size;
    if total_size.div_ceil(chunk_size) > limits.max_part_count {
        effective = total_size
            .div_ceil(limits.max_part_count)
            .next_multiple_of(limits.granularity)
            .max(chunk_size);
        tracing::trace!(
            configured = chunk_size,
            effective,
            "grew chunk size to stay within {} parts",
            limits.max_part_count
        );
    }

    if effective > limits.max_chunk_size {
        return Err(error::invalid_input(format!(
            "object of {} is too large for {} parts of at most {}",
            ByteUnit::display(total_size),
            limits.max_part_count,
            ByteUnit::display(limits.max_chunk_size)
        )));
    }

    let chunk_count = total_size.div_ceil(effective).max(1);
    tracing::trace!(
        total_size,
        chunk_size = effective,
        chunk_count,
        "planned chunked transfer"
    );
    Ok(ChunkPlan {
        chunk_size: effective,
        chunk_count: Some(chunk_count),
        max_chunk_count: limits.max_part_count,
    })
}
