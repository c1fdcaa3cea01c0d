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
use crate::operation::multipart::session::MultipartSession;
use crate::operation::multipart::{resolver, scheduler};
use crate::operation::{cancellable, transfer_token};
use crate::plan;
use crate::runtime::pacer::{self, Pacer};
use crate::storage::{CopyObjectRequest, CopyStart, CreateMultipartUploadRequest};
use crate::types::{CopyState, FailedMultipartUploadPolicy, TransferMode};
use context::CopyContext;
pub use handle::CopyHandle;
/// Request type for copying a single object
pub use input::{CopyInput, CopyInputBuilder};
/// Response type for copying a single object
pub use output::CopyOutput;
use service::{upload_part_copy_service, CopyParts};

/// Operation struct for single object copy
#[derive(Clone, Default, Debug)]
pub(crate) struct CopyObject;

impl CopyObject {
    /// Execute a single `Copy` transfer operation
    pub(crate) fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: CopyInput,
    ) -> Result<CopyHandle, Error> {
        let CopyInput {
            source_key,
            destination_key,
            source_size,
            storage_tier,
            failed_multipart_upload_policy,
            cancellation_token,
        } = input;

        let token = transfer_token(cancellation_token.as_ref());
        let ctx = CopyContext {
            storage_tier: storage_tier.unwrap_or(handle.config.storage_tier()),
            policy: failed_multipart_upload_policy.unwrap_or_else(|| {
                FailedMultipartUploadPolicy::from_leave_parts_on_error(
                    handle.config.leave_parts_on_error(),
                )
            }),
            handle,
            source_key,
            destination_key,
            token: token.clone(),
        };

        ctx.handle.metrics.increment_transfers_initiated();
        let task = tokio::spawn(async move {
            let result = copy(&ctx, source_size).await;
            let bytes = result.as_ref().map_or(0, |output| output.content_length);
            ctx.handle.metrics.record(&result, bytes);
            if let Err(err) = &result {
                tracing::error!(
                    source_key = %ctx.source_key,
                    destination_key = %ctx.destination_key,
                    "copy failed: {err}"
                );
            }
            result
        });

        Ok(CopyHandle::new(task, token.drop_guard()))
    }
}

async fn copy(ctx: &CopyContext, source_size: Option<u64>) -> Result<CopyOutput, Error> {
    let (size, metadata) = match source_size {
        Some(size) => (size, HashMap::new()),
        None => {
            let head = ctx
                .storage()
                .head_object(&ctx.source_key)
                .instrument(tracing::debug_span!("send-head-object"));
            let source = cancellable(&ctx.token, head).await?;
            (source.content_length, source.metadata)
        }
    };

    match plan::classify(Some(size), ctx.config().copy_cutoff()) {
        TransferMode::Simple => copy_object(ctx, size).await,
        TransferMode::Chunked => {
            tracing::trace!(
                "source size ({size}) above the copy cutoff; copying in parts"
            );
            multipart_copy(ctx, size, metadata).await
        }
    }
}

fn transition(ctx: &CopyContext, state: CopyState) -> CopyState {
    tracing::debug!(
        destination_key = %ctx.destination_key,
        ?state,
        terminal = state.is_terminal(),
        "copy state"
    );
    state
}

/// Copy with a single request, pacing status polls if the storage copies asynchronously
async fn copy_object(ctx: &CopyContext, size: u64) -> Result<CopyOutput, Error> {
    transition(ctx, CopyState::Requested);
    let request = CopyObjectRequest {
        source_key: ctx.source_key.clone(),
        destination_key: ctx.destination_key.clone(),
        storage_tier: ctx.storage_tier,
    };
    let send = ctx
        .storage()
        .copy_object(request)
        .instrument(tracing::debug_span!("send-copy-object"));

    let e_tag = match cancellable(&ctx.token, send).await? {
        CopyStart::Completed { e_tag } => e_tag,
        CopyStart::Pending(copy_token) => {
            transition(ctx, CopyState::InProgress);
            let config = ctx.config();
            let storage = ctx.storage().clone();
            let waited = pacer::wait_for_copy(
                Pacer::default(),
                config.time_source(),
                config.sleep_impl(),
                config.copy_timeout(),
                &ctx.token,
                || {
                    let storage = storage.clone();
                    let copy_token = copy_token.clone();
                    async move { storage.copy_status(&copy_token).await }
                },
            )
            .await;
            if let Err(err) = waited {
                let state = match err.kind() {
                    ErrorKind::CopyFailed => CopyState::Failed,
                    ErrorKind::CopyTimeout => CopyState::TimedOut,
                    // cancelled, the remote copy carries on
                    _ => CopyState::InProgress,
                };
                transition(ctx, state);
                return Err(err);
            }
            None
        }
    };

    Ok(CopyOutput {
        source_key: ctx.source_key.clone(),
        destination_key: ctx.destination_key.clone(),
        e_tag,
        upload_id: None,
        part_count: 1,
        content_length: size,
        transfer_mode: TransferMode::Simple,
        state: transition(ctx, CopyState::Succeeded),
    })
}

/// Copy in byte ranges into a multipart session on the destination
async fn multipart_copy(
    ctx: &CopyContext,
    size: u64,
    metadata: HashMap<String, String>,
) -> Result<CopyOutput, Error> {
    let config = ctx.config();
    let limits = config.chunk_limits();
    let chunk_size = config
        .copy_cutoff()
        .max(limits.min_chunk_size())
        .min(limits.max_chunk_size());
    let plan = plan::plan(Some(size), chunk_size, limits)?;

    transition(ctx, CopyState::Requested);
    let create = ctx
        .storage()
        .create_multipart_upload(CreateMultipartUploadRequest {
            key: ctx.destination_key.clone(),
            storage_tier: ctx.storage_tier,
            metadata,
        })
        .instrument(tracing::debug_span!("send-create-multipart-upload"));
    let upload_id = cancellable(&ctx.token, create).await?;
    transition(ctx, CopyState::InProgress);

    let mut session = MultipartSession::new(ctx.destination_key.clone(), upload_id.clone());
    let mut parts = CopyParts {
        plan,
        total_size: size,
        source_key: ctx.source_key.clone(),
        destination_key: ctx.destination_key.clone(),
        upload_id: upload_id.clone(),
        next_part_number: 1,
    };
    let outcome = scheduler::schedule(
        &mut session,
        &mut parts,
        upload_part_copy_service(ctx),
        &ctx.token,
    )
    .await;
    let response = resolver::resolve(
        ctx.storage(),
        &mut session,
        outcome,
        &ctx.policy,
        &ctx.token,
        None,
    )
    .await
    .inspect_err(|_| {
        transition(ctx, CopyState::Failed);
    })?;

    Ok(CopyOutput {
        source_key: ctx.source_key.clone(),
        destination_key: ctx.destination_key.clone(),
        e_tag: response.e_tag,
        upload_id: Some(upload_id),
        part_count: session.completed_parts().len() as u64,
        content_length: size,
        transfer_mode: TransferMode::Chunked,
        state: transition(ctx, CopyState::Succeeded),
    })
}
