/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tower::Service;
use tracing::Instrument;

use crate::error::Error;
use crate::io::part_reader::PartReader;
use crate::operation::multipart::{self, scheduler::PartSource};
use crate::operation::upload::context::UploadContext;
use crate::storage::{CompletedPart, UploadPartRequest};

/// Produces upload requests by reading the body one part at a time
#[derive(Debug)]
pub(super) struct UploadParts {
    pub(super) reader: PartReader,
    pub(super) key: String,
    pub(super) upload_id: String,
}

impl PartSource for UploadParts {
    type Request = UploadPartRequest;

    async fn next_request(&mut self) -> Result<Option<(u64, UploadPartRequest)>, Error> {
        let Some(part) = self.reader.read_part().await? else {
            return Ok(None);
        };
        let request = UploadPartRequest {
            key: self.key.clone(),
            upload_id: self.upload_id.clone(),
            part_number: part.part_number,
            body: part.data,
        };
        Ok(Some((part.part_number, request)))
    }
}

/// Create a new tower::Service for uploading individual parts of an object
pub(super) fn upload_part_service(
    ctx: &UploadContext,
) -> impl Service<UploadPartRequest, Response = CompletedPart, Error = Error, Future: Send + 'static>
       + Send {
    let storage = ctx.storage().clone();
    multipart::part_service(ctx.config(), move |request: UploadPartRequest| {
        let storage = storage.clone();
        async move {
            let part_number = request.part_number;
            let content_length = request.body.len();
            storage
                .upload_part(request)
                .instrument(tracing::debug_span!(
                    "send-upload-part",
                    part_number,
                    content_length
                ))
                .await
        }
    })
}
