/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::{CopyState, TransferMode};

/// Response fields for copying an object
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct CopyOutput {
    /// Key of the copied object
    pub source_key: String,

    /// Key of the new object
    pub destination_key: String,

    /// Entity tag of the new object, if the storage reported one
    pub e_tag: Option<String>,

    /// ID of the multipart session, if the object was copied in chunks
    pub upload_id: Option<String>,

    /// Number of parts the new object was assembled from (1 for a single request copy)
    pub part_count: u64,

    /// Size of the object in bytes
    pub content_length: u64,

    /// Whether the object was copied with a single request or in chunks
    pub transfer_mode: TransferMode,

    /// Final state of the copy
    pub state: CopyState,
}

impl CopyOutput {
    /// Key of the copied object
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    /// Key of the new object
    pub fn destination_key(&self) -> &str {
        &self.destination_key
    }

    /// Entity tag of the new object
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }

    /// ID of the multipart session, if the object was copied in chunks
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Number of parts the new object was assembled from
    pub fn part_count(&self) -> u64 {
        self.part_count
    }

    /// Size of the object in bytes
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Whether the object was copied with a single request or in chunks
    pub fn transfer_mode(&self) -> TransferMode {
        self.transfer_mode
    }

    /// Final state of the copy
    pub fn state(&self) -> CopyState {
        self.state
    }
}
