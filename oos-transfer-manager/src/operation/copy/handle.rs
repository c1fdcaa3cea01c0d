/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tokio::task::JoinHandle;
use tokio_util::sync::DropGuard;

use crate::error::Error;
use crate::operation::copy::CopyOutput;
use crate::operation::multipart;
use crate::types::AbortedUpload;

/// Response type for a single copy object request.
///
/// # Cancellation
///
/// Dropping the handle or calling [`Self::abort`] cancels the copy. Polling of an asynchronous
/// copy stops without touching the remote operation, which may still complete. A chunked copy
/// stops sending parts and applies the failed multipart upload policy of the request.
#[derive(Debug)]
#[non_exhaustive]
pub struct CopyHandle {
    task: JoinHandle<Result<CopyOutput, Error>>,
    cancel: DropGuard,
}

impl CopyHandle {
    pub(crate) fn new(task: JoinHandle<Result<CopyOutput, Error>>, cancel: DropGuard) -> Self {
        Self { task, cancel }
    }

    /// Consume the handle and wait for the copy to complete
    #[tracing::instrument(skip_all, level = "debug", name = "join-copy")]
    pub async fn join(self) -> Result<CopyOutput, Error> {
        let Self { task, cancel } = self;
        let result = task.await?;
        cancel.disarm();
        result
    }

    /// Abort the copy and wait for any multipart session to be cleaned up.
    #[tracing::instrument(skip_all, level = "debug", name = "abort-copy")]
    pub async fn abort(self) -> Result<AbortedUpload, Error> {
        let Self { task, cancel } = self;
        cancel.disarm().cancel();

        match task.await? {
            Ok(output) => {
                tracing::debug!(
                    destination_key = %output.destination_key,
                    "copy completed before it could be aborted"
                );
                Ok(AbortedUpload::default())
            }
            Err(err) => multipart::aborted(err),
        }
    }
}
