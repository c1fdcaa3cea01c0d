/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

use crate::error::{self, Error, ErrorKind};
use crate::storage::{
    CompleteMultipartUploadRequest, CompleteMultipartUploadResponse, CompletedPart,
    CopyObjectRequest, CopyStart, CopyStatus, CopyToken, CreateMultipartUploadRequest,
    ObjectMetadata, ObjectStorage, PutObjectRequest, PutObjectResponse, UploadPartCopyRequest,
    UploadPartRequest, MD5_METADATA_KEY,
};
use crate::types::StorageTier;

/// An object stored in [`InMemoryStorage`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object contents
    pub body: Bytes,
    /// Tier the object was written to
    pub storage_tier: StorageTier,
    /// User metadata
    pub metadata: HashMap<String, String>,
    /// Hex encoded MD5 of the contents (or of the part entity tags for multipart objects)
    pub e_tag: String,
}

/// Object storage that keeps everything in memory.
///
/// Besides storing data it records how it was called and can inject faults into individual
/// requests, which makes it suitable for exercising transfers end to end in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    parts_in_flight: AtomicUsize,
    max_parts_in_flight: AtomicUsize,
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<String, StoredObject>,
    uploads: HashMap<String, OpenUpload>,
    copies: HashMap<CopyToken, PendingCopy>,
    next_id: u64,
    faults: Faults,
    calls: Calls,
    last_completed_parts: Vec<u64>,
}

#[derive(Debug)]
struct OpenUpload {
    key: String,
    storage_tier: StorageTier,
    metadata: HashMap<String, String>,
    parts: HashMap<u64, (String, Bytes)>,
}

#[derive(Debug)]
struct PendingCopy {
    request: CopyObjectRequest,
    remaining_polls: Option<usize>,
}

#[derive(Debug, Default)]
struct Faults {
    failing_parts: HashSet<u64>,
    transient_parts: HashMap<u64, usize>,
    hanging_parts: HashSet<u64>,
    part_delay: Option<Duration>,
    fail_complete: bool,
    fail_abort: bool,
    report_wrong_md5: bool,
    async_copies: Option<Option<usize>>,
    fail_copies: bool,
}

#[derive(Debug, Default)]
struct Calls {
    put_object: usize,
    create_multipart_upload: usize,
    upload_part: usize,
    upload_part_copy: usize,
    complete_multipart_upload: usize,
    abort_multipart_upload: usize,
    head_object: usize,
    copy_object: usize,
    copy_status: usize,
}

enum PartFault {
    Fail,
    Transient,
    Hang,
}

// decrements the in-flight gauge even when the part future is dropped mid request
struct InFlightGuard<'a>(&'a Inner);

impl<'a> InFlightGuard<'a> {
    fn new(inner: &'a Inner) -> Self {
        let now = inner.parts_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_parts_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(inner)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.parts_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn e_tag(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

fn base64_md5(data: &[u8]) -> String {
    aws_smithy_types::base64::encode(md5::compute(data).0)
}

fn not_found(what: impl Into<String>) -> Error {
    Error::new(ErrorKind::NotFound, what.into())
}

fn rejected(what: impl Into<String>) -> Error {
    Error::new(ErrorKind::ServiceError, what.into())
}

impl InMemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an object directly, bypassing the call counters
    pub fn insert_object(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        let body = body.into();
        let object = StoredObject {
            e_tag: e_tag(&body),
            body,
            storage_tier: StorageTier::Standard,
            metadata: HashMap::new(),
        };
        self.lock().objects.insert(key.into(), object);
    }

    /// Fail every attempt to upload the given part with a non retryable error
    pub fn fail_part(&self, part_number: u64) {
        self.lock().faults.failing_parts.insert(part_number);
    }

    /// Fail the first `times` attempts to upload the given part with a transient error
    pub fn fail_part_transiently(&self, part_number: u64, times: usize) {
        self.lock()
            .faults
            .transient_parts
            .insert(part_number, times);
    }

    /// Never respond to requests for the given part
    pub fn hang_part(&self, part_number: u64) {
        self.lock().faults.hanging_parts.insert(part_number);
    }

    /// Delay every part request by `delay`
    pub fn set_part_delay(&self, delay: Duration) {
        self.lock().faults.part_delay = Some(delay);
    }

    /// Reject every request to complete a multipart session
    pub fn fail_complete(&self) {
        self.lock().faults.fail_complete = true;
    }

    /// Reject every request to abort a multipart session
    pub fn fail_abort(&self) {
        self.lock().faults.fail_abort = true;
    }

    /// Report a digest that does not match the stored data on single request uploads
    pub fn report_wrong_md5(&self) {
        self.lock().faults.report_wrong_md5 = true;
    }

    /// Run copies asynchronously. They succeed after `polls` status requests, or never when
    /// `polls` is `None`.
    pub fn complete_copies_after(&self, polls: Option<usize>) {
        self.lock().faults.async_copies = Some(polls);
    }

    /// Report asynchronous copies as failed on their first status request
    pub fn fail_copies(&self) {
        let mut state = self.lock();
        state.faults.async_copies.get_or_insert(Some(0));
        state.faults.fail_copies = true;
    }

    /// Look up a stored object
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.lock().objects.get(key).cloned()
    }

    /// Identifiers of multipart sessions that were neither completed nor aborted
    pub fn open_uploads(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.lock().uploads.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Part numbers handed to the most recent successful complete request
    pub fn completed_part_numbers(&self) -> Vec<u64> {
        self.lock().last_completed_parts.clone()
    }

    /// Largest number of part requests that were in progress at the same time
    pub fn max_parts_in_flight(&self) -> usize {
        self.inner.max_parts_in_flight.load(Ordering::SeqCst)
    }

    /// Number of part requests currently in progress
    pub fn parts_in_flight(&self) -> usize {
        self.inner.parts_in_flight.load(Ordering::SeqCst)
    }

    /// Number of single request uploads
    pub fn put_object_calls(&self) -> usize {
        self.lock().calls.put_object
    }

    /// Number of multipart sessions opened
    pub fn create_multipart_upload_calls(&self) -> usize {
        self.lock().calls.create_multipart_upload
    }

    /// Number of part upload attempts
    pub fn upload_part_calls(&self) -> usize {
        self.lock().calls.upload_part
    }

    /// Number of part copy attempts
    pub fn upload_part_copy_calls(&self) -> usize {
        self.lock().calls.upload_part_copy
    }

    /// Number of complete requests
    pub fn complete_multipart_upload_calls(&self) -> usize {
        self.lock().calls.complete_multipart_upload
    }

    /// Number of abort requests
    pub fn abort_multipart_upload_calls(&self) -> usize {
        self.lock().calls.abort_multipart_upload
    }

    /// Number of metadata lookups
    pub fn head_object_calls(&self) -> usize {
        self.lock().calls.head_object
    }

    /// Number of copy requests
    pub fn copy_object_calls(&self) -> usize {
        self.lock().calls.copy_object
    }

    /// Number of copy status polls
    pub fn copy_status_calls(&self) -> usize {
        self.lock().calls.copy_status
    }

    async fn part_faults(&self, part_number: u64) -> Result<(), Error> {
        let (fault, delay) = {
            let mut state = self.lock();
            let faults = &mut state.faults;
            let fault = if faults.hanging_parts.contains(&part_number) {
                Some(PartFault::Hang)
            } else if faults.failing_parts.contains(&part_number) {
                Some(PartFault::Fail)
            } else {
                match faults.transient_parts.get_mut(&part_number) {
                    Some(remaining) if *remaining > 0 => {
                        *remaining -= 1;
                        Some(PartFault::Transient)
                    }
                    _ => None,
                }
            };
            (fault, faults.part_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match fault {
            None => Ok(()),
            Some(PartFault::Fail) => Err(rejected(format!("part {part_number} was rejected"))),
            Some(PartFault::Transient) => Err(Error::new(
                ErrorKind::Transient,
                format!("part {part_number} failed, please slow down"),
            )),
            Some(PartFault::Hang) => futures_util::future::pending().await,
        }
    }

    fn store_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u64,
        body: Bytes,
    ) -> Result<CompletedPart, Error> {
        let mut state = self.lock();
        let upload = state
            .uploads
            .get_mut(upload_id)
            .ok_or_else(|| not_found(format!("no such upload: {upload_id}")))?;
        if upload.key != key {
            return Err(error::invalid_input(format!(
                "upload {upload_id} belongs to a different key"
            )));
        }
        let e_tag = e_tag(&body);
        upload.parts.insert(part_number, (e_tag.clone(), body));
        Ok(CompletedPart { part_number, e_tag })
    }

    fn copy_now(state: &mut State, request: &CopyObjectRequest) -> Result<String, Error> {
        let source = state
            .objects
            .get(&request.source_key)
            .ok_or_else(|| not_found(format!("no such key: {}", request.source_key)))?;
        let copy = StoredObject {
            storage_tier: request.storage_tier,
            ..source.clone()
        };
        let e_tag = copy.e_tag.clone();
        state
            .objects
            .insert(request.destination_key.clone(), copy);
        Ok(e_tag)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectResponse, Error> {
        let mut state = self.lock();
        state.calls.put_object += 1;

        let digest = base64_md5(&request.body);
        if let Some(expected) = &request.content_md5 {
            if *expected != digest {
                return Err(Error::new(
                    ErrorKind::IntegrityCheckFailed,
                    "the Content-MD5 you specified did not match what was received",
                ));
            }
        }

        let content_md5 = if state.faults.report_wrong_md5 {
            base64_md5(b"not the data you sent")
        } else {
            digest
        };
        let object = StoredObject {
            e_tag: e_tag(&request.body),
            body: request.body,
            storage_tier: request.storage_tier,
            metadata: request.metadata,
        };
        let response = PutObjectResponse {
            e_tag: Some(object.e_tag.clone()),
            content_md5: Some(content_md5),
        };
        state.objects.insert(request.key, object);
        Ok(response)
    }

    async fn create_multipart_upload(
        &self,
        request: CreateMultipartUploadRequest,
    ) -> Result<String, Error> {
        let mut state = self.lock();
        state.calls.create_multipart_upload += 1;
        state.next_id += 1;
        let upload_id = format!("upload-{}", state.next_id);
        state.uploads.insert(
            upload_id.clone(),
            OpenUpload {
                key: request.key,
                storage_tier: request.storage_tier,
                metadata: request.metadata,
                parts: HashMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(&self, request: UploadPartRequest) -> Result<CompletedPart, Error> {
        let _guard = InFlightGuard::new(&self.inner);
        self.lock().calls.upload_part += 1;
        self.part_faults(request.part_number).await?;
        self.store_part(
            &request.key,
            &request.upload_id,
            request.part_number,
            request.body,
        )
    }

    async fn upload_part_copy(
        &self,
        request: UploadPartCopyRequest,
    ) -> Result<CompletedPart, Error> {
        let _guard = InFlightGuard::new(&self.inner);
        self.lock().calls.upload_part_copy += 1;
        self.part_faults(request.part_number).await?;

        let body = {
            let state = self.lock();
            let source = state
                .objects
                .get(&request.source_key)
                .ok_or_else(|| not_found(format!("no such key: {}", request.source_key)))?;
            let len = source.body.len() as u64;
            if request.range.is_empty() || request.range.end > len {
                return Err(error::invalid_input(format!(
                    "range {:?} is not satisfiable for an object of {len} bytes",
                    request.range
                )));
            }
            source
                .body
                .slice(request.range.start as usize..request.range.end as usize)
        };
        self.store_part(
            &request.destination_key,
            &request.upload_id,
            request.part_number,
            body,
        )
    }

    async fn complete_multipart_upload(
        &self,
        request: CompleteMultipartUploadRequest,
    ) -> Result<CompleteMultipartUploadResponse, Error> {
        let mut state = self.lock();
        state.calls.complete_multipart_upload += 1;
        if state.faults.fail_complete {
            return Err(rejected("the service refused to complete the upload"));
        }

        let upload = state
            .uploads
            .get(&request.upload_id)
            .ok_or_else(|| not_found(format!("no such upload: {}", request.upload_id)))?;

        let mut body = BytesMut::new();
        let mut e_tags = String::new();
        for (idx, part) in request.parts.iter().enumerate() {
            if part.part_number != idx as u64 + 1 {
                return Err(error::invalid_input(format!(
                    "parts must be sequential starting at 1, found part {} at position {idx}",
                    part.part_number
                )));
            }
            match upload.parts.get(&part.part_number) {
                Some((e_tag, data)) if *e_tag == part.e_tag => {
                    body.extend_from_slice(data);
                    e_tags.push_str(e_tag);
                }
                _ => {
                    return Err(error::invalid_input(format!(
                        "part {} was not uploaded",
                        part.part_number
                    )))
                }
            }
        }

        let mut upload = state
            .uploads
            .remove(&request.upload_id)
            .ok_or_else(|| not_found(format!("no such upload: {}", request.upload_id)))?;
        if let Some(content_md5) = request.content_md5 {
            upload
                .metadata
                .insert(MD5_METADATA_KEY.to_owned(), content_md5);
        }
        let e_tag = format!("{}-{}", e_tag(e_tags.as_bytes()), request.parts.len());
        state.last_completed_parts = request.parts.iter().map(|p| p.part_number).collect();
        state.objects.insert(
            upload.key,
            StoredObject {
                body: body.freeze(),
                storage_tier: upload.storage_tier,
                metadata: upload.metadata,
                e_tag: e_tag.clone(),
            },
        );
        Ok(CompleteMultipartUploadResponse { e_tag: Some(e_tag) })
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), Error> {
        let mut state = self.lock();
        state.calls.abort_multipart_upload += 1;
        if state.faults.fail_abort {
            return Err(rejected("the service refused to abort the upload"));
        }
        let owned = state
            .uploads
            .get(upload_id)
            .is_some_and(|upload| upload.key == key);
        if !owned {
            return Err(not_found(format!("no such upload: {upload_id}")));
        }
        state.uploads.remove(upload_id);
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<ObjectMetadata, Error> {
        let mut state = self.lock();
        state.calls.head_object += 1;
        let object = state
            .objects
            .get(key)
            .ok_or_else(|| not_found(format!("no such key: {key}")))?;
        Ok(ObjectMetadata {
            content_length: object.body.len() as u64,
            e_tag: Some(object.e_tag.clone()),
            metadata: object.metadata.clone(),
        })
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> Result<CopyStart, Error> {
        let mut state = self.lock();
        state.calls.copy_object += 1;
        if !state.objects.contains_key(&request.source_key) {
            return Err(not_found(format!("no such key: {}", request.source_key)));
        }

        match state.faults.async_copies {
            None => {
                let e_tag = Self::copy_now(&mut state, &request)?;
                Ok(CopyStart::Completed { e_tag: Some(e_tag) })
            }
            Some(remaining_polls) => {
                state.next_id += 1;
                let token = CopyToken::new(format!("copy-{}", state.next_id));
                state.copies.insert(
                    token.clone(),
                    PendingCopy {
                        request,
                        remaining_polls,
                    },
                );
                Ok(CopyStart::Pending(token))
            }
        }
    }

    async fn copy_status(&self, token: &CopyToken) -> Result<CopyStatus, Error> {
        let mut state = self.lock();
        state.calls.copy_status += 1;
        let fail_copies = state.faults.fail_copies;
        let finished = {
            let copy = state
                .copies
                .get_mut(token)
                .ok_or_else(|| not_found(format!("no such copy: {token}")))?;
            match copy.remaining_polls.as_mut() {
                None => false,
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    false
                }
                Some(_) => true,
            }
        };

        if fail_copies {
            state.copies.remove(token);
            return Ok(CopyStatus::Failed("source object changed during copy".into()));
        }
        if !finished {
            return Ok(CopyStatus::InProgress);
        }
        let copy = state
            .copies
            .remove(token)
            .ok_or_else(|| not_found(format!("no such copy: {token}")))?;
        Self::copy_now(&mut state, &copy.request)?;
        Ok(CopyStatus::Succeeded)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use bytes::Bytes;

    use super::InMemoryStorage;
    use crate::error::ErrorKind;
    use crate::storage::{
        CompleteMultipartUploadRequest, CompletedPart, CopyObjectRequest, CopyStart, CopyStatus,
        CreateMultipartUploadRequest, ObjectStorage, UploadPartRequest,
    };
    use crate::types::StorageTier;

    async fn open(storage: &InMemoryStorage) -> String {
        storage
            .create_multipart_upload(CreateMultipartUploadRequest {
                key: "key".to_owned(),
                storage_tier: StorageTier::Standard,
                metadata: HashMap::new(),
            })
            .await
            .unwrap()
    }

    async fn part(
        storage: &InMemoryStorage,
        upload_id: &str,
        n: u64,
        data: &'static [u8],
    ) -> CompletedPart {
        storage
            .upload_part(UploadPartRequest {
                key: "key".to_owned(),
                upload_id: upload_id.to_owned(),
                part_number: n,
                body: Bytes::from_static(data),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_complete_assembles_parts_in_order() {
        let storage = InMemoryStorage::new();
        let upload_id = open(&storage).await;
        let second = part(&storage, &upload_id, 2, b"world").await;
        let first = part(&storage, &upload_id, 1, b"hello ").await;

        storage
            .complete_multipart_upload(CompleteMultipartUploadRequest {
                key: "key".to_owned(),
                upload_id,
                parts: vec![first, second],
                content_md5: None,
            })
            .await
            .unwrap();

        assert_eq!(
            Bytes::from_static(b"hello world"),
            storage.object("key").unwrap().body
        );
        assert!(storage.open_uploads().is_empty());
        assert_eq!(vec![1, 2], storage.completed_part_numbers());
    }

    #[tokio::test]
    async fn test_complete_rejects_gaps() {
        let storage = InMemoryStorage::new();
        let upload_id = open(&storage).await;
        let second = part(&storage, &upload_id, 2, b"world").await;

        let err = storage
            .complete_multipart_upload(CompleteMultipartUploadRequest {
                key: "key".to_owned(),
                upload_id: upload_id.clone(),
                parts: vec![second],
                content_md5: None,
            })
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
        assert_eq!(vec![upload_id], storage.open_uploads());
    }

    #[tokio::test]
    async fn test_async_copy_completes_after_polls() {
        let storage = InMemoryStorage::new();
        storage.insert_object("src", Bytes::from_static(b"data"));
        storage.complete_copies_after(Some(1));

        let start = storage
            .copy_object(CopyObjectRequest {
                source_key: "src".to_owned(),
                destination_key: "dst".to_owned(),
                storage_tier: StorageTier::Archive,
            })
            .await
            .unwrap();
        let token = match start {
            CopyStart::Pending(token) => token,
            other => panic!("expected a pending copy, got {other:?}"),
        };

        assert_eq!(CopyStatus::InProgress, storage.copy_status(&token).await.unwrap());
        assert!(storage.object("dst").is_none());
        assert_eq!(CopyStatus::Succeeded, storage.copy_status(&token).await.unwrap());
        let copy = storage.object("dst").unwrap();
        assert_eq!(StorageTier::Archive, copy.storage_tier);
        assert_eq!(Bytes::from_static(b"data"), copy.body);
    }
}
