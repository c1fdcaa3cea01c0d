/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{self, Error, ErrorKind};
use crate::operation::multipart::session::MultipartSession;
use crate::storage::{
    CompleteMultipartUploadRequest, CompleteMultipartUploadResponse, SharedStorage,
};
use crate::types::{FailedMultipartUploadPolicy, SessionState};

/// Turn the outcome of the part transfers into the outcome of the whole session.
///
/// A successful outcome finalizes the session with its parts in ascending order. A failed part
/// transfer or a rejected finalize applies `policy`: the session is either aborted (once) or
/// left open. Every failure returned from here carries the session's failure report.
pub(crate) async fn resolve(
    storage: &SharedStorage,
    session: &mut MultipartSession,
    outcome: Result<(), Error>,
    policy: &FailedMultipartUploadPolicy,
    token: &CancellationToken,
    content_md5: Option<String>,
) -> Result<CompleteMultipartUploadResponse, Error> {
    let err = match outcome {
        Ok(()) => match finalize(storage, session, token, content_md5).await {
            Ok(response) => {
                session.set_state(SessionState::Completed);
                tracing::trace!(upload_id = %session.upload_id(), "multipart upload completed");
                return Ok(response);
            }
            Err(err) => err,
        },
        Err(err) => err,
    };

    tracing::debug!(
        key = %session.key(),
        upload_id = %session.upload_id(),
        "multipart upload failed, applying {policy:?}: {err}"
    );
    cleanup(storage, session, policy).await;
    Err(err.with_failed_upload(session.failure_report()))
}

async fn finalize(
    storage: &SharedStorage,
    session: &mut MultipartSession,
    token: &CancellationToken,
    content_md5: Option<String>,
) -> Result<CompleteMultipartUploadResponse, Error> {
    session.set_state(SessionState::Completing);
    let parts = session.ordered_parts()?;
    let request = CompleteMultipartUploadRequest {
        key: session.key().to_owned(),
        upload_id: session.upload_id().to_owned(),
        parts,
        content_md5,
    };

    let complete = storage
        .complete_multipart_upload(request)
        .instrument(tracing::debug_span!(
            "send-complete-multipart-upload",
            upload_id = %session.upload_id()
        ));
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(error::operation_cancelled()),
        response = complete => response.map_err(error::from_kind(ErrorKind::FinalizeFailed)),
    }
}

/// Apply the failed upload policy.
///
/// The abort is not tied to the transfer's cancellation token; cancelling a transfer has to
/// release its parts too.
async fn cleanup(
    storage: &SharedStorage,
    session: &mut MultipartSession,
    policy: &FailedMultipartUploadPolicy,
) {
    match policy {
        FailedMultipartUploadPolicy::Retain => {
            tracing::warn!(
                key = %session.key(),
                upload_id = %session.upload_id(),
                "leaving multipart upload open; its parts are billed until the upload is completed or aborted"
            );
            session.set_state(SessionState::LeftOpen);
        }
        FailedMultipartUploadPolicy::AbortUpload => {
            let aborted = storage
                .abort_multipart_upload(session.key(), session.upload_id())
                .instrument(tracing::debug_span!(
                    "send-abort-multipart-upload",
                    upload_id = %session.upload_id()
                ))
                .await;
            match aborted {
                Ok(()) => session.set_state(SessionState::Aborted),
                Err(err) => {
                    tracing::error!(
                        upload_id = %session.upload_id(),
                        "failed to abort multipart upload, its parts may still exist: {err}"
                    );
                    session.set_state(SessionState::AbortAttempted);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use bytes::Bytes;
    use tokio_util::sync::CancellationToken;

    use super::resolve;
    use crate::error::{self, ErrorKind};
    use crate::operation::multipart::session::MultipartSession;
    use crate::storage::in_memory::InMemoryStorage;
    use crate::storage::{
        CreateMultipartUploadRequest, ObjectStorage, SharedStorage, UploadPartRequest,
    };
    use crate::types::{FailedMultipartUploadPolicy, SessionState, StorageTier};

    async fn open_session(storage: &InMemoryStorage, parts: &[&'static [u8]]) -> MultipartSession {
        let upload_id = storage
            .create_multipart_upload(CreateMultipartUploadRequest {
                key: "key".to_owned(),
                storage_tier: StorageTier::Standard,
                metadata: HashMap::new(),
            })
            .await
            .unwrap();
        let mut session = MultipartSession::new("key", upload_id.clone());
        for (idx, data) in parts.iter().enumerate() {
            let part_number = idx as u64 + 1;
            session.dispatched(part_number);
            let part = storage
                .upload_part(UploadPartRequest {
                    key: "key".to_owned(),
                    upload_id: upload_id.clone(),
                    part_number,
                    body: Bytes::from_static(*data),
                })
                .await
                .unwrap();
            session.succeeded(part);
        }
        session
    }

    #[tokio::test]
    async fn test_success_finalizes_in_order() {
        let storage = InMemoryStorage::new();
        let mut session = open_session(&storage, &[&b"hello "[..], &b"world"[..]]).await;

        resolve(
            &SharedStorage::new(storage.clone()),
            &mut session,
            Ok(()),
            &FailedMultipartUploadPolicy::AbortUpload,
            &CancellationToken::new(),
            Some("digest".to_owned()),
        )
        .await
        .unwrap();

        assert_eq!(SessionState::Completed, session.state());
        let object = storage.object("key").unwrap();
        assert_eq!(&b"hello world"[..], &object.body[..]);
        assert_eq!(Some("digest"), object.metadata.get("md5chksum").map(String::as_str));
        assert_eq!(0, storage.abort_multipart_upload_calls());
    }

    #[tokio::test]
    async fn test_failure_aborts_once() {
        let storage = InMemoryStorage::new();
        let mut session = open_session(&storage, &[&b"hello "[..]]).await;

        let err = resolve(
            &SharedStorage::new(storage.clone()),
            &mut session,
            Err(error::chunk_failed(2, "boom")),
            &FailedMultipartUploadPolicy::AbortUpload,
            &CancellationToken::new(),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::ChunkFailed(_)));
        let report = err.failed_upload().unwrap();
        assert_eq!(SessionState::Aborted, report.state());
        assert_eq!(1, report.completed_parts().len());
        assert_eq!(1, storage.abort_multipart_upload_calls());
        assert!(storage.open_uploads().is_empty());
    }

    #[tokio::test]
    async fn test_failure_leaves_parts() {
        let storage = InMemoryStorage::new();
        let mut session = open_session(&storage, &[&b"hello "[..]]).await;

        let err = resolve(
            &SharedStorage::new(storage.clone()),
            &mut session,
            Err(error::chunk_failed(2, "boom")),
            &FailedMultipartUploadPolicy::Retain,
            &CancellationToken::new(),
            None,
        )
        .await
        .unwrap_err();

        let report = err.failed_upload().unwrap();
        assert_eq!(SessionState::LeftOpen, report.state());
        assert_eq!(session.upload_id(), report.upload_id());
        assert_eq!(0, storage.abort_multipart_upload_calls());
        assert_eq!(vec![session.upload_id().to_owned()], storage.open_uploads());
    }

    #[tokio::test]
    async fn test_rejected_finalize_runs_cleanup() {
        let storage = InMemoryStorage::new();
        storage.fail_complete();
        let mut session = open_session(&storage, &[&b"hello "[..]]).await;

        let err = resolve(
            &SharedStorage::new(storage.clone()),
            &mut session,
            Ok(()),
            &FailedMultipartUploadPolicy::AbortUpload,
            &CancellationToken::new(),
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(&ErrorKind::FinalizeFailed, err.kind());
        assert_eq!(SessionState::Aborted, err.failed_upload().unwrap().state());
        assert_eq!(1, storage.abort_multipart_upload_calls());
    }

    #[tokio::test]
    async fn test_failed_abort_is_reported() {
        let storage = InMemoryStorage::new();
        storage.fail_abort();
        let mut session = open_session(&storage, &[&b"hello "[..]]).await;

        let err = resolve(
            &SharedStorage::new(storage.clone()),
            &mut session,
            Err(error::chunk_failed(2, "boom")),
            &FailedMultipartUploadPolicy::AbortUpload,
            &CancellationToken::new(),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::ChunkFailed(_)));
        assert_eq!(SessionState::AbortAttempted, err.failed_upload().unwrap().state());
    }

    #[tokio::test]
    async fn test_cancelled_finalize_still_aborts() {
        let storage = InMemoryStorage::new();
        let mut session = open_session(&storage, &[&b"hello "[..]]).await;
        let token = CancellationToken::new();
        token.cancel();

        let err = resolve(
            &SharedStorage::new(storage.clone()),
            &mut session,
            Ok(()),
            &FailedMultipartUploadPolicy::AbortUpload,
            &token,
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(&ErrorKind::OperationCancelled, err.kind());
        assert_eq!(0, storage.complete_multipart_upload_calls());
        assert_eq!(1, storage.abort_multipart_upload_calls());
    }
}
