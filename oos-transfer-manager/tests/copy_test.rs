/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::{Duration, UNIX_EPOCH};

use aws_smithy_async::test_util::instant_time_and_sleep;
use aws_smithy_async::time::TimeSource;
use aws_smithy_runtime::test_util::capture_test_logs::capture_test_logs;
use oos_transfer_manager::error::ErrorKind;
use oos_transfer_manager::operation::copy::CopyInput;
use oos_transfer_manager::storage::in_memory::InMemoryStorage;
use oos_transfer_manager::types::{CopyState, SessionState, StorageTier, TransferMode};
use test_common::{client, payload, scaled_config, KIB};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_copy_with_single_request() {
    let storage = InMemoryStorage::new();
    let data = payload(1000);
    storage.insert_object("src", data.clone());
    let tm = client(scaled_config(&storage));

    let output = tm
        .copy()
        .source_key("src")
        .destination_key("dst")
        .storage_tier(StorageTier::Archive)
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(TransferMode::Simple, output.transfer_mode());
    assert_eq!(CopyState::Succeeded, output.state());
    assert_eq!(1000, output.content_length());
    assert!(output.e_tag().is_some());
    assert_eq!(1, storage.head_object_calls());
    assert_eq!(1, storage.copy_object_calls());
    assert_eq!(0, storage.copy_status_calls());

    let copy = storage.object("dst").unwrap();
    assert_eq!(data, copy.body);
    assert_eq!(StorageTier::Archive, copy.storage_tier);
}

#[tokio::test]
async fn test_missing_source() {
    let storage = InMemoryStorage::new();
    let tm = client(scaled_config(&storage));

    let err = tm
        .copy()
        .source_key("missing")
        .destination_key("dst")
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::NotFound, err.kind());
    assert_eq!(0, storage.copy_object_calls());
}

#[tokio::test]
async fn test_asynchronous_copy_is_paced() {
    let storage = InMemoryStorage::new();
    storage.insert_object("src", payload(1000));
    storage.complete_copies_after(Some(2));
    let (time_source, sleep) = instant_time_and_sleep(UNIX_EPOCH);
    let tm = client(
        scaled_config(&storage)
            .time_source(time_source)
            .sleep_impl(sleep.clone()),
    );

    let output = CopyInput::builder()
        .source_key("src")
        .destination_key("dst")
        .source_size(1000)
        .initiate_with(&tm)
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(CopyState::Succeeded, output.state());
    assert_eq!(0, storage.head_object_calls());
    assert_eq!(3, storage.copy_status_calls());
    assert_eq!(
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400)
        ],
        sleep.logs()
    );
    assert!(storage.object("dst").is_some());
}

#[tokio::test]
async fn test_asynchronous_copy_times_out() {
    let (_guard, rx) = capture_test_logs();
    let storage = InMemoryStorage::new();
    storage.insert_object("src", payload(1000));
    storage.complete_copies_after(None);
    let (time_source, sleep) = instant_time_and_sleep(UNIX_EPOCH);
    let tm = client(
        scaled_config(&storage)
            .copy_timeout(Duration::from_secs(60))
            .time_source(time_source.clone())
            .sleep_impl(sleep.clone()),
    );

    let err = tm
        .copy()
        .source_key("src")
        .destination_key("dst")
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::CopyTimeout, err.kind());
    let elapsed = time_source.now().duration_since(UNIX_EPOCH).unwrap();
    assert_eq!(Duration::from_secs(60), elapsed);
    let logs = sleep.logs();
    let (last, paced) = logs.split_last().unwrap();
    assert!(paced.windows(2).all(|w| w[0] <= w[1]));
    assert!(*last <= *paced.last().unwrap() * 2);
    assert_eq!(logs.len(), storage.copy_status_calls());
    assert!(storage.object("dst").is_none());
    assert!(rx.contents().contains("gave up waiting for copy"));
}

#[tokio::test]
async fn test_asynchronous_copy_fails() {
    let storage = InMemoryStorage::new();
    storage.insert_object("src", payload(1000));
    storage.fail_copies();
    let (time_source, sleep) = instant_time_and_sleep(UNIX_EPOCH);
    let tm = client(
        scaled_config(&storage)
            .time_source(time_source)
            .sleep_impl(sleep),
    );

    let err = tm
        .copy()
        .source_key("src")
        .destination_key("dst")
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::CopyFailed, err.kind());
    assert_eq!(1, storage.copy_status_calls());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let storage = InMemoryStorage::new();
    storage.insert_object("src", payload(1000));
    storage.complete_copies_after(None);
    let tm = client(scaled_config(&storage).copy_timeout(Duration::from_secs(3600)));
    let token = CancellationToken::new();

    let handle = tm
        .copy()
        .source_key("src")
        .destination_key("dst")
        .cancellation_token(token.clone())
        .initiate()
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    token.cancel();
    let err = handle.join().await.unwrap_err();

    assert_eq!(&ErrorKind::OperationCancelled, err.kind());
    let polls = storage.copy_status_calls();
    assert!(polls > 0);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(polls, storage.copy_status_calls());
}

#[tokio::test(start_paused = true)]
async fn test_handle_abort_while_polling() {
    let storage = InMemoryStorage::new();
    storage.insert_object("src", payload(1000));
    storage.complete_copies_after(None);
    let tm = client(scaled_config(&storage).copy_timeout(Duration::from_secs(3600)));

    let handle = tm
        .copy()
        .source_key("src")
        .destination_key("dst")
        .initiate()
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let aborted = handle.abort().await.unwrap();
    assert_eq!(None, aborted.upload_id());
}

#[tokio::test]
async fn test_chunked_copy() {
    let storage = InMemoryStorage::new();
    let data = payload((12 * KIB) as usize);
    storage.insert_object("src", data.clone());
    let tm = client(scaled_config(&storage).copy_cutoff(5 * KIB));

    let output = tm
        .copy()
        .source_key("src")
        .destination_key("dst")
        .source_size(12 * KIB)
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(TransferMode::Chunked, output.transfer_mode());
    assert_eq!(CopyState::Succeeded, output.state());
    assert_eq!(3, output.part_count());
    assert!(output.upload_id().is_some());
    assert_eq!(3, storage.upload_part_copy_calls());
    assert_eq!(0, storage.copy_object_calls());
    assert_eq!(0, storage.head_object_calls());
    assert_eq!(vec![1, 2, 3], storage.completed_part_numbers());
    assert_eq!(data, storage.object("dst").unwrap().body);
}

#[tokio::test]
async fn test_chunked_copy_failure_aborts() {
    let storage = InMemoryStorage::new();
    storage.insert_object("src", payload((12 * KIB) as usize));
    storage.fail_part(2);
    let tm = client(scaled_config(&storage).copy_cutoff(5 * KIB));

    let err = tm
        .copy()
        .source_key("src")
        .destination_key("dst")
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
    assert_eq!(1, storage.head_object_calls());
    assert_eq!(1, storage.abort_multipart_upload_calls());
    assert!(storage.open_uploads().is_empty());
    assert!(storage.object("dst").is_none());
}
