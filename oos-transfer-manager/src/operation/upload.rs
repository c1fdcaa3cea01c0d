/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;
mod input;
mod output;

mod context;
mod handle;
mod service;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::Instrument;

use crate::error::{Error, ErrorKind};
use crate::io::checksum;
use crate::io::part_reader::PartReader;
use crate::io::InputStream;
use crate::operation::multipart::session::MultipartSession;
use crate::operation::multipart::{resolver, scheduler};
use crate::operation::{cancellable, transfer_token};
use crate::plan;
use crate::storage::{CreateMultipartUploadRequest, PutObjectRequest, MD5_METADATA_KEY};
use crate::types::{FailedMultipartUploadPolicy, TransferMode};
use context::UploadContext;
pub use handle::UploadHandle;
/// Request type for uploading a single object
pub use input::{UploadInput, UploadInputBuilder};
/// Response type for uploading a single object
pub use output::UploadOutput;
use service::{upload_part_service, UploadParts};

/// Operation struct for single object upload
#[derive(Clone, Default, Debug)]
pub(crate) struct Upload;

impl Upload {
    /// Execute a single `Upload` transfer operation
    ///
    /// The transfer runs on its own task; the returned handle joins or aborts it.
    pub(crate) fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: UploadInput,
    ) -> Result<UploadHandle, Error> {
        let UploadInput {
            key,
            body,
            storage_tier,
            failed_multipart_upload_policy,
            cancellation_token,
        } = input;

        let token = transfer_token(cancellation_token.as_ref());
        let ctx = UploadContext {
            storage_tier: storage_tier.unwrap_or(handle.config.storage_tier()),
            policy: failed_multipart_upload_policy.unwrap_or_else(|| {
                FailedMultipartUploadPolicy::from_leave_parts_on_error(
                    handle.config.leave_parts_on_error(),
                )
            }),
            handle,
            key,
            token: token.clone(),
        };

        ctx.handle.metrics.increment_transfers_initiated();
        let task = tokio::spawn(async move {
            let result = upload(&ctx, body).await;
            let bytes = result.as_ref().map_or(0, |output| output.content_length);
            ctx.handle.metrics.record(&result, bytes);
            if let Err(err) = &result {
                tracing::error!(key = %ctx.key, "upload failed: {err}");
            }
            result
        });

        Ok(UploadHandle::new(task, token.drop_guard()))
    }
}

async fn upload(ctx: &UploadContext, body: InputStream) -> Result<UploadOutput, Error> {
    let size_hint = body.size_hint();
    let total_size = size_hint.upper();
    match plan::classify(total_size, ctx.config().upload_cutoff()) {
        TransferMode::Simple => {
            tracing::trace!(
                "upload size hint ({total_size:?}) at most the upload cutoff; sending as a single request"
            );
            put_object(ctx, body).await
        }
        TransferMode::Chunked => multipart_upload(ctx, body, total_size).await,
    }
}

async fn put_object(ctx: &UploadContext, body: InputStream) -> Result<UploadOutput, Error> {
    let data = cancellable(&ctx.token, body.collect()).await?;
    let content_length = data.len() as u64;
    let content_md5 = (!ctx.config().disable_checksum()).then(|| checksum::md5_base64(&data));

    let mut metadata = HashMap::new();
    if let Some(md5) = &content_md5 {
        metadata.insert(MD5_METADATA_KEY.to_owned(), md5.clone());
    }
    let request = PutObjectRequest {
        key: ctx.key.clone(),
        body: data,
        storage_tier: ctx.storage_tier,
        content_md5: content_md5.clone(),
        metadata,
    };

    let put = ctx
        .storage()
        .put_object(request)
        .instrument(tracing::debug_span!("send-put-object", content_length));
    let response = cancellable(&ctx.token, put).await?;

    if let (Some(expected), Some(reported)) = (&content_md5, &response.content_md5) {
        if expected != reported {
            return Err(Error::new(
                ErrorKind::IntegrityCheckFailed,
                format!("stored object has MD5 {reported}, expected {expected}"),
            ));
        }
    }

    Ok(UploadOutput {
        key: ctx.key.clone(),
        e_tag: response.e_tag,
        upload_id: None,
        part_count: 1,
        content_length,
        content_md5,
        transfer_mode: TransferMode::Simple,
    })
}

/// Upload the body as a multipart session
///
/// # Arguments
///
/// * `ctx` - The upload context
/// * `body` - The content to upload
/// * `total_size` - The upper bound on the content length, `None` when streaming an unknown size
async fn multipart_upload(
    ctx: &UploadContext,
    body: InputStream,
    total_size: Option<u64>,
) -> Result<UploadOutput, Error> {
    let config = ctx.config();
    let plan = plan::plan(total_size, config.chunk_size(), config.chunk_limits())?;
    tracing::trace!(
        "upload request using multipart upload with part size: {} bytes",
        plan.chunk_size()
    );

    let create = ctx
        .storage()
        .create_multipart_upload(CreateMultipartUploadRequest {
            key: ctx.key.clone(),
            storage_tier: ctx.storage_tier,
            metadata: HashMap::new(),
        })
        .instrument(tracing::debug_span!("send-create-multipart-upload"));
    let upload_id = cancellable(&ctx.token, create).await?;
    tracing::trace!("multipart upload started with upload id: {upload_id}");

    let mut session = MultipartSession::new(ctx.key.clone(), upload_id.clone());
    let mut parts = UploadParts {
        reader: PartReader::new(body, &plan, !config.disable_checksum()),
        key: ctx.key.clone(),
        upload_id: upload_id.clone(),
    };

    let outcome = scheduler::schedule(
        &mut session,
        &mut parts,
        upload_part_service(ctx),
        &ctx.token,
    )
    .await;
    let content_md5 = parts.reader.content_md5().map(str::to_owned);
    let response = resolver::resolve(
        ctx.storage(),
        &mut session,
        outcome,
        &ctx.policy,
        &ctx.token,
        content_md5.clone(),
    )
    .await?;

    Ok(UploadOutput {
        key: ctx.key.clone(),
        e_tag: response.e_tag,
        upload_id: Some(upload_id),
        part_count: session.completed_parts().len() as u64,
        content_length: parts.reader.bytes_read(),
        content_md5,
        transfer_mode: TransferMode::Chunked,
    })
}

