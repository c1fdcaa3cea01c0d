/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::io::Cursor;
use std::time::Duration;

use bytes::Bytes;
use oos_transfer_manager::error::ErrorKind;
use oos_transfer_manager::io::InputStream;
use oos_transfer_manager::operation::upload::UploadInput;
use oos_transfer_manager::storage::in_memory::InMemoryStorage;
use oos_transfer_manager::types::{
    FailedMultipartUploadPolicy, SessionState, StorageTier, TransferMode,
};
use test_common::{client, payload, scaled_config, scaled_limits, temp_file, unknown_size, KIB};
use tokio_util::sync::CancellationToken;

fn md5_base64(data: &[u8]) -> String {
    aws_smithy_types::base64::encode(md5::compute(data).0)
}

#[tokio::test]
async fn test_empty_object_is_a_single_put() {
    let storage = InMemoryStorage::new();
    let tm = client(scaled_config(&storage));

    let output = tm
        .upload()
        .key("empty")
        .body(InputStream::from(Bytes::new()))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(TransferMode::Simple, output.transfer_mode());
    assert_eq!(1, output.part_count());
    assert_eq!(0, output.content_length());
    assert_eq!(None, output.upload_id());
    assert_eq!(1, storage.put_object_calls());
    assert_eq!(0, storage.create_multipart_upload_calls());

    let object = storage.object("empty").unwrap();
    assert!(object.body.is_empty());
    assert_eq!(
        Some(&md5_base64(b"")),
        object.metadata.get("md5chksum"),
    );
}

// 1 GiB in 5 MiB chunks with a 200 MiB cutoff, every size scaled down by 1024
#[tokio::test]
async fn test_chunked_upload_of_205_parts() {
    let storage = InMemoryStorage::new();
    let tm = client(scaled_config(&storage));
    let data = payload((KIB * KIB) as usize);

    let output = tm
        .upload()
        .key("large")
        .body(InputStream::from(data.clone()))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(TransferMode::Chunked, output.transfer_mode());
    assert_eq!(205, output.part_count());
    assert_eq!(KIB * KIB, output.content_length());
    assert!(output.upload_id().is_some());
    assert_eq!((1..=205).collect::<Vec<u64>>(), storage.completed_part_numbers());
    assert!(storage.max_parts_in_flight() <= 10);
    assert!(storage.open_uploads().is_empty());

    let object = storage.object("large").unwrap();
    assert_eq!(data, object.body);
    let digest = md5_base64(&data);
    assert_eq!(Some(digest.as_str()), output.content_md5());
    assert_eq!(Some(&digest), object.metadata.get("md5chksum"));

    assert_eq!(1, tm.metrics().transfers_completed());
    assert_eq!(KIB * KIB, tm.metrics().total_bytes_transferred());
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_is_bounded() {
    let storage = InMemoryStorage::new();
    storage.set_part_delay(Duration::from_millis(10));
    let tm = client(scaled_config(&storage).upload_concurrency(3));
    let data = payload((100 * KIB) as usize);

    let output = tm
        .upload()
        .key("bounded")
        .body(unknown_size(data.clone()))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(20, output.part_count());
    assert_eq!(3, storage.max_parts_in_flight());
    assert_eq!(data, storage.object("bounded").unwrap().body);
}

#[tokio::test]
async fn test_failed_part_aborts_once() {
    let storage = InMemoryStorage::new();
    storage.fail_part(3);
    let tm = client(scaled_config(&storage));

    let err = tm
        .upload()
        .key("doomed")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    match err.kind() {
        ErrorKind::ChunkFailed(chunk) => assert_eq!(3, chunk.part_number()),
        kind => panic!("unexpected kind {kind:?}"),
    }
    let report = err.failed_upload().unwrap();
    assert_eq!(SessionState::Aborted, report.state());
    assert!(report.completed_parts().iter().all(|p| p.part_number != 3));
    assert_eq!(1, storage.abort_multipart_upload_calls());
    assert_eq!(0, storage.complete_multipart_upload_calls());
    assert!(storage.open_uploads().is_empty());
    assert!(storage.object("doomed").is_none());
    assert_eq!(1, tm.metrics().transfers_failed());
}

#[tokio::test]
async fn test_leave_parts_on_error() {
    let storage = InMemoryStorage::new();
    storage.fail_part(2);
    let tm = client(scaled_config(&storage).leave_parts_on_error(true));

    let err = tm
        .upload()
        .key("kept")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    let report = err.failed_upload().unwrap();
    assert_eq!(SessionState::LeftOpen, report.state());
    assert_eq!(vec![report.upload_id().to_owned()], storage.open_uploads());
    assert_eq!(0, storage.abort_multipart_upload_calls());
}

#[tokio::test]
async fn test_request_policy_overrides_config() {
    let storage = InMemoryStorage::new();
    storage.fail_part(1);
    let tm = client(scaled_config(&storage));

    let err = UploadInput::builder()
        .key("kept")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .failed_multipart_upload_policy(FailedMultipartUploadPolicy::Retain)
        .initiate_with(&tm)
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(
        SessionState::LeftOpen,
        err.failed_upload().unwrap().state()
    );
    assert_eq!(1, storage.open_uploads().len());
}

#[tokio::test]
async fn test_rejected_finalize_aborts() {
    let storage = InMemoryStorage::new();
    storage.fail_complete();
    let tm = client(scaled_config(&storage));

    let err = tm
        .upload()
        .key("unfinished")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::FinalizeFailed, err.kind());
    let report = err.failed_upload().unwrap();
    assert_eq!(SessionState::Aborted, report.state());
    assert_eq!(60, report.completed_parts().len());
    assert_eq!(1, storage.abort_multipart_upload_calls());
}

#[tokio::test]
async fn test_failed_abort_is_reported() {
    let storage = InMemoryStorage::new();
    storage.fail_part(2);
    storage.fail_abort();
    let tm = client(scaled_config(&storage));

    let err = tm
        .upload()
        .key("stuck")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::ChunkFailed(_)));
    let report = err.failed_upload().unwrap();
    assert_eq!(SessionState::AbortAttempted, report.state());
    assert_eq!(vec![report.upload_id().to_owned()], storage.open_uploads());
}

#[tokio::test]
async fn test_transient_part_failures_are_retried() {
    let storage = InMemoryStorage::new();
    storage.fail_part_transiently(2, 2);
    let tm = client(scaled_config(&storage));
    let data = payload((300 * KIB) as usize);

    tm.upload()
        .key("flaky")
        .body(InputStream::from(data.clone()))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(62, storage.upload_part_calls());
    assert_eq!(data, storage.object("flaky").unwrap().body);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let storage = InMemoryStorage::new();
    storage.fail_part_transiently(2, 5);
    let tm = client(scaled_config(&storage).part_retry_attempts(1));

    let err = tm
        .upload()
        .key("flaky")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    match err.kind() {
        ErrorKind::ChunkFailed(chunk) => assert_eq!(2, chunk.part_number()),
        kind => panic!("unexpected kind {kind:?}"),
    }
    assert_eq!(SessionState::Aborted, err.failed_upload().unwrap().state());
}

#[tokio::test]
async fn test_unknown_size_stream_exceeding_part_count() {
    let storage = InMemoryStorage::new();
    let tm = client(
        scaled_config(&storage).chunk_limits(scaled_limits().with_max_part_count(4)),
    );

    let err = tm
        .upload()
        .key("endless")
        .body(unknown_size(payload((20 * KIB + 1) as usize)))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::PartCountExceeded, err.kind());
    let report = err.failed_upload().unwrap();
    assert_eq!(SessionState::Aborted, report.state());
    assert_eq!(4, report.completed_parts().len());
    assert_eq!(0, storage.complete_multipart_upload_calls());
    assert!(storage.object("endless").is_none());
}

#[tokio::test]
async fn test_unknown_size_stream_is_chunked() {
    let storage = InMemoryStorage::new();
    let tm = client(scaled_config(&storage));

    let output = tm
        .upload()
        .key("small")
        .body(unknown_size(payload((3 * KIB) as usize)))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(TransferMode::Chunked, output.transfer_mode());
    assert_eq!(1, output.part_count());

    let output = tm
        .upload()
        .key("nothing")
        .body(unknown_size(Bytes::new()))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(1, output.part_count());
    assert!(storage.object("nothing").unwrap().body.is_empty());
    assert_eq!(0, storage.put_object_calls());
}

#[tokio::test]
async fn test_stream_shorter_than_declared() {
    let storage = InMemoryStorage::new();
    let tm = client(scaled_config(&storage));

    let err = tm
        .upload()
        .key("short")
        .body(InputStream::from_reader_with_length(
            Cursor::new(vec![0u8; 10]),
            20,
        ))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::InputInvalid, err.kind());
    assert_eq!(0, storage.put_object_calls());
}

#[tokio::test]
async fn test_mismatched_digest_fails_integrity_check() {
    let storage = InMemoryStorage::new();
    storage.report_wrong_md5();
    let tm = client(scaled_config(&storage));

    let err = tm
        .upload()
        .key("corrupt")
        .body(InputStream::from_static(b"some data"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::IntegrityCheckFailed, err.kind());
}

#[tokio::test]
async fn test_disable_checksum() {
    let storage = InMemoryStorage::new();
    storage.report_wrong_md5();
    let tm = client(scaled_config(&storage).disable_checksum(true));

    let output = tm
        .upload()
        .key("unchecked")
        .body(InputStream::from_static(b"some data"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(None, output.content_md5());
    assert!(storage.object("unchecked").unwrap().metadata.is_empty());
}

#[tokio::test]
async fn test_storage_tier() {
    let storage = InMemoryStorage::new();
    let tm = client(scaled_config(&storage).storage_tier(StorageTier::InfrequentAccess));

    tm.upload()
        .key("default")
        .body(InputStream::from_static(b"data"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();
    tm.upload()
        .key("archived")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .storage_tier(StorageTier::Archive)
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(
        StorageTier::InfrequentAccess,
        storage.object("default").unwrap().storage_tier
    );
    assert_eq!(
        StorageTier::Archive,
        storage.object("archived").unwrap().storage_tier
    );
}

#[tokio::test]
async fn test_upload_from_file() {
    let storage = InMemoryStorage::new();
    let tm = client(scaled_config(&storage));
    let data = payload((300 * KIB) as usize);
    let file = temp_file(&data);

    let output = tm
        .upload()
        .key("file")
        .body(InputStream::from_path(file.path()).unwrap())
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(60, output.part_count());
    assert_eq!(data, storage.object("file").unwrap().body);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_aborts_session() {
    let storage = InMemoryStorage::new();
    storage.hang_part(2);
    let tm = client(scaled_config(&storage));
    let token = CancellationToken::new();

    let handle = tm
        .upload()
        .key("cancelled")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .cancellation_token(token.clone())
        .initiate()
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    token.cancel();
    let err = handle.join().await.unwrap_err();

    assert_eq!(&ErrorKind::OperationCancelled, err.kind());
    assert_eq!(SessionState::Aborted, err.failed_upload().unwrap().state());
    assert_eq!(0, storage.complete_multipart_upload_calls());
    assert_eq!(1, storage.abort_multipart_upload_calls());
    assert_eq!(0, storage.parts_in_flight());
    assert!(storage.open_uploads().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_handle_abort() {
    let storage = InMemoryStorage::new();
    storage.hang_part(5);
    let tm = client(scaled_config(&storage));

    let handle = tm
        .upload()
        .key("aborted")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .initiate()
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    let aborted = handle.abort().await.unwrap();

    assert_eq!(Some(SessionState::Aborted), aborted.state());
    assert!(aborted.upload_id().is_some());
    assert!(storage.open_uploads().is_empty());
    assert!(storage.object("aborted").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_cancels() {
    let storage = InMemoryStorage::new();
    storage.hang_part(1);
    let tm = client(scaled_config(&storage));

    let handle = tm
        .upload()
        .key("dropped")
        .body(InputStream::from(payload((300 * KIB) as usize)))
        .initiate()
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    drop(handle);

    // the transfer task cleans up on its own
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(1, storage.abort_multipart_upload_calls());
    assert!(storage.open_uploads().is_empty());
}
