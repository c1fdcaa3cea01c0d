/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tower::Service;
use tracing::Instrument;

use crate::error::Error;
use crate::operation::copy::context::CopyContext;
use crate::operation::multipart::{self, scheduler::PartSource};
use crate::plan::ChunkPlan;
use crate::storage::{CompletedPart, UploadPartCopyRequest};

/// Produces ranged copy requests covering the whole source object
#[derive(Debug)]
pub(super) struct CopyParts {
    pub(super) plan: ChunkPlan,
    pub(super) total_size: u64,
    pub(super) source_key: String,
    pub(super) destination_key: String,
    pub(super) upload_id: String,
    pub(super) next_part_number: u64,
}

impl PartSource for CopyParts {
    type Request = UploadPartCopyRequest;

    async fn next_request(&mut self) -> Result<Option<(u64, UploadPartCopyRequest)>, Error> {
        let part_number = self.next_part_number;
        if part_number > self.plan.chunk_count().unwrap_or(0) {
            return Ok(None);
        }
        self.next_part_number += 1;

        let request = UploadPartCopyRequest {
            source_key: self.source_key.clone(),
            destination_key: self.destination_key.clone(),
            upload_id: self.upload_id.clone(),
            part_number,
            range: self.plan.part_range(part_number, self.total_size),
        };
        Ok(Some((part_number, request)))
    }
}

/// Create a new tower::Service for copying individual parts of an object
pub(super) fn upload_part_copy_service(
    ctx: &CopyContext,
) -> impl Service<UploadPartCopyRequest, Response = CompletedPart, Error = Error, Future: Send + 'static>
       + Send {
    let storage = ctx.storage().clone();
    multipart::part_service(ctx.config(), move |request: UploadPartCopyRequest| {
        let storage = storage.clone();
        async move {
            let span = tracing::debug_span!(
                "send-upload-part-copy",
                part_number = request.part_number,
                range = ?request.range
            );
            storage.upload_part_copy(request).instrument(span).await
        }
    })
}
