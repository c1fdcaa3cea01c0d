/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::TransferMode;

/// Common response fields for uploading an object
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutput {
    /// Object key the body was stored under
    pub key: String,

    /// Entity tag the storage assigned to the object
    pub e_tag: Option<String>,

    /// ID of the multipart session, if the object was uploaded in chunks
    pub upload_id: Option<String>,

    /// Number of parts the object was assembled from (1 for a single request upload)
    pub part_count: u64,

    /// Number of bytes uploaded
    pub content_length: u64,

    /// Base64 encoded MD5 digest of the object, unless checksums are disabled
    pub content_md5: Option<String>,

    /// Whether the object was uploaded with a single request or in chunks
    pub transfer_mode: TransferMode,
}

impl UploadOutput {
    /// Object key the body was stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Entity tag the storage assigned to the object
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }

    /// ID of the multipart session, if the object was uploaded in chunks
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Number of parts the object was assembled from
    pub fn part_count(&self) -> u64 {
        self.part_count
    }

    /// Number of bytes uploaded
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Base64 encoded MD5 digest of the object
    pub fn content_md5(&self) -> Option<&str> {
        self.content_md5.as_deref()
    }

    /// Whether the object was uploaded with a single request or in chunks
    pub fn transfer_mode(&self) -> TransferMode {
        self.transfer_mode
    }
}
