/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Error;
use crate::types::StorageTier;

/// Amazon S3 backed storage
pub mod s3;

/// In-memory storage for tests
#[cfg(any(test, feature = "test-util"))]
pub mod in_memory;

/// User metadata key the object MD5 digest (base64) is stored under
pub const MD5_METADATA_KEY: &str = "md5chksum";

/// The remote object storage API a transfer is orchestrated against.
///
/// Implementations are shared between concurrently running transfers and part uploads and must
/// be safe to call from many tasks at once. Every call is a potential suspension point; the
/// transfer manager drops in-flight futures when a transfer is cancelled.
#[async_trait]
pub trait ObjectStorage: fmt::Debug + Send + Sync {
    /// Store an object with a single request
    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectResponse, Error>;

    /// Open a multipart session for `key` and return the session (upload) identifier
    async fn create_multipart_upload(
        &self,
        request: CreateMultipartUploadRequest,
    ) -> Result<String, Error>;

    /// Upload a single part of a multipart session
    async fn upload_part(&self, request: UploadPartRequest) -> Result<CompletedPart, Error>;

    /// Copy a byte range of an existing object into a part of a multipart session
    async fn upload_part_copy(
        &self,
        request: UploadPartCopyRequest,
    ) -> Result<CompletedPart, Error>;

    /// Assemble the given parts, ordered by part number, into the final object
    async fn complete_multipart_upload(
        &self,
        request: CompleteMultipartUploadRequest,
    ) -> Result<CompleteMultipartUploadResponse, Error>;

    /// Discard a multipart session and any parts uploaded to it
    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), Error>;

    /// Retrieve the metadata of an existing object
    async fn head_object(&self, key: &str) -> Result<ObjectMetadata, Error>;

    /// Start a server side copy. The service may finish the copy before responding or hand back
    /// a token that can be polled with [`ObjectStorage::copy_status`].
    async fn copy_object(&self, request: CopyObjectRequest) -> Result<CopyStart, Error>;

    /// Poll the status of an asynchronous copy
    async fn copy_status(&self, token: &CopyToken) -> Result<CopyStatus, Error>;
}

/// A shared, type erased [`ObjectStorage`] implementation
#[derive(Debug, Clone)]
pub struct SharedStorage(Arc<dyn ObjectStorage>);

impl SharedStorage {
    /// Wrap an [`ObjectStorage`] implementation
    pub fn new(storage: impl ObjectStorage + 'static) -> Self {
        Self(Arc::new(storage))
    }
}

impl std::ops::Deref for SharedStorage {
    type Target = dyn ObjectStorage;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl From<Arc<dyn ObjectStorage>> for SharedStorage {
    fn from(value: Arc<dyn ObjectStorage>) -> Self {
        Self(value)
    }
}

/// Request to store an object with a single request
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    /// Object key
    pub key: String,
    /// Object contents
    pub body: Bytes,
    /// Storage tier to write to
    pub storage_tier: StorageTier,
    /// Base64 encoded MD5 digest of `body`, if computed
    pub content_md5: Option<String>,
    /// User metadata
    pub metadata: HashMap<String, String>,
}

/// Response of a single request upload
#[derive(Debug, Clone, Default)]
pub struct PutObjectResponse {
    /// Entity tag of the stored object
    pub e_tag: Option<String>,
    /// Base64 encoded MD5 digest of the stored object as reported by the service, if any
    pub content_md5: Option<String>,
}

/// Request to open a multipart session
#[derive(Debug, Clone)]
pub struct CreateMultipartUploadRequest {
    /// Object key
    pub key: String,
    /// Storage tier to write to
    pub storage_tier: StorageTier,
    /// User metadata
    pub metadata: HashMap<String, String>,
}

/// Request to upload one part of a multipart session
#[derive(Debug, Clone)]
pub struct UploadPartRequest {
    /// Object key
    pub key: String,
    /// Session identifier
    pub upload_id: String,
    /// 1-based part number
    pub part_number: u64,
    /// Part contents
    pub body: Bytes,
}

/// Request to copy a byte range of an existing object into one part of a multipart session
#[derive(Debug, Clone)]
pub struct UploadPartCopyRequest {
    /// Key of the object being copied
    pub source_key: String,
    /// Key of the object being assembled
    pub destination_key: String,
    /// Session identifier
    pub upload_id: String,
    /// 1-based part number
    pub part_number: u64,
    /// Byte range of the source to copy (end exclusive)
    pub range: Range<u64>,
}

/// A successfully transferred part of a multipart session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// 1-based part number
    pub part_number: u64,
    /// Service assigned part identifier
    pub e_tag: String,
}

/// Request to finalize a multipart session
#[derive(Debug, Clone)]
pub struct CompleteMultipartUploadRequest {
    /// Object key
    pub key: String,
    /// Session identifier
    pub upload_id: String,
    /// All parts of the session ordered by part number
    pub parts: Vec<CompletedPart>,
    /// Base64 encoded MD5 digest of the whole object, if computed while uploading
    pub content_md5: Option<String>,
}

/// Response of finalizing a multipart session
#[derive(Debug, Clone, Default)]
pub struct CompleteMultipartUploadResponse {
    /// Entity tag of the assembled object
    pub e_tag: Option<String>,
}

/// Metadata of an existing object
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    /// Size of the object in bytes
    pub content_length: u64,
    /// Entity tag of the object
    pub e_tag: Option<String>,
    /// User metadata
    pub metadata: HashMap<String, String>,
}

/// Request for a server side copy
#[derive(Debug, Clone)]
pub struct CopyObjectRequest {
    /// Key of the object being copied
    pub source_key: String,
    /// Key of the new object
    pub destination_key: String,
    /// Storage tier of the new object
    pub storage_tier: StorageTier,
}

/// Opaque token identifying an asynchronous copy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CopyToken(String);

impl CopyToken {
    /// Create a token from the identifier issued by the service
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The identifier issued by the service
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CopyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the service responded to a copy request
#[derive(Debug, Clone)]
pub enum CopyStart {
    /// The copy finished before the service responded
    Completed {
        /// Entity tag of the new object
        e_tag: Option<String>,
    },
    /// The copy runs asynchronously and has to be polled
    Pending(CopyToken),
}

/// Status of an asynchronous copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyStatus {
    /// The copy is still running
    InProgress,
    /// The copy finished successfully
    Succeeded,
    /// The copy finished unsuccessfully
    Failed(String),
}
