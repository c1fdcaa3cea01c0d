/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tokio::task::JoinHandle;
use tokio_util::sync::DropGuard;

use crate::error::Error;
use crate::operation::multipart;
use crate::operation::upload::UploadOutput;
use crate::types::AbortedUpload;

/// Response type for a single upload object request.
///
/// # Cancellation
///
/// The operation can be cancelled either by dropping this handle or by calling
/// [`Self::abort`]. In both cases no new parts are read or sent, the part uploads in flight are
/// interrupted and the failed multipart upload policy of the request is applied to any multipart
/// session that was already created.
///
/// Dropping the handle does not wait for that cleanup to finish. [`Self::abort`] does, and
/// reports how the session was left.
#[derive(Debug)]
#[non_exhaustive]
pub struct UploadHandle {
    task: JoinHandle<Result<UploadOutput, Error>>,
    cancel: DropGuard,
}

impl UploadHandle {
    pub(crate) fn new(task: JoinHandle<Result<UploadOutput, Error>>, cancel: DropGuard) -> Self {
        Self { task, cancel }
    }

    /// Consume the handle and wait for upload to complete
    #[tracing::instrument(skip_all, level = "debug", name = "join-upload")]
    pub async fn join(self) -> Result<UploadOutput, Error> {
        let Self { task, cancel } = self;
        let result = task.await?;
        cancel.disarm();
        result
    }

    /// Abort the upload and wait for the failed multipart upload policy to be applied.
    #[tracing::instrument(skip_all, level = "debug", name = "abort-upload")]
    pub async fn abort(self) -> Result<AbortedUpload, Error> {
        let Self { task, cancel } = self;
        cancel.disarm().cancel();

        match task.await? {
            Ok(output) => {
                tracing::debug!(key = %output.key, "upload completed before it could be aborted");
                Ok(AbortedUpload::default())
            }
            Err(err) => multipart::aborted(err),
        }
    }
}

