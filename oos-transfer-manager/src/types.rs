/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::str::FromStr;

use crate::storage::CompletedPart;

/// The storage tier new objects are written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageTier {
    /// Standard storage tier, this is the default tier
    #[default]
    Standard,
    /// Infrequent access storage tier
    InfrequentAccess,
    /// Archive storage tier
    Archive,
}

impl StorageTier {
    /// The name of the tier as understood by the object storage service
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTier::Standard => "Standard",
            StorageTier::InfrequentAccess => "InfrequentAccess",
            StorageTier::Archive => "Archive",
        }
    }
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageTier {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Standard" => Ok(StorageTier::Standard),
            "InfrequentAccess" => Ok(StorageTier::InfrequentAccess),
            "Archive" => Ok(StorageTier::Archive),
            _ => Err(crate::error::invalid_input(format!(
                "unknown storage tier '{s}'"
            ))),
        }
    }
}

/// Whether an object is moved with one request or as a chunked multipart transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// A single `put_object` (or `copy_object`) request
    Simple,
    /// A multipart session assembled from sequentially indexed parts
    Chunked,
}

/// Lifecycle of a server side copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    /// The copy was requested but the service has not accepted it yet
    Requested,
    /// The service accepted the copy and is still working on it
    InProgress,
    /// The new object exists
    Succeeded,
    /// The service gave up on the copy
    Failed,
    /// Polling stopped before the service reported a terminal state
    TimedOut,
}

impl CopyState {
    /// Whether the copy can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CopyState::Succeeded | CopyState::Failed | CopyState::TimedOut
        )
    }
}

/// Policy for how to handle a failed multipart upload
///
/// Default is to abort the upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FailedMultipartUploadPolicy {
    /// Abort the upload on any individual part failure
    #[default]
    AbortUpload,
    /// Retain any uploaded parts. The upload ID will be available in the error.
    ///
    /// Parts of an incomplete multipart upload count towards storage usage and will incur
    /// costs until the session is completed or aborted.
    Retain,
}

impl FailedMultipartUploadPolicy {
    pub(crate) fn from_leave_parts_on_error(leave_parts_on_error: bool) -> Self {
        if leave_parts_on_error {
            FailedMultipartUploadPolicy::Retain
        } else {
            FailedMultipartUploadPolicy::AbortUpload
        }
    }
}

/// Lifecycle of a multipart session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Parts are being transferred
    Open,
    /// All parts succeeded and the session is being finalized
    Completing,
    /// The session was finalized into an object
    Completed,
    /// The session was aborted and its parts discarded
    Aborted,
    /// Aborting the session was attempted but failed; parts may still exist remotely
    AbortAttempted,
    /// The session was deliberately left open so its parts can be recovered
    LeftOpen,
}

/// Partial state of a multipart session that did not complete.
#[derive(Debug, Clone)]
pub struct FailedMultipartUpload {
    pub(crate) key: String,
    pub(crate) upload_id: String,
    pub(crate) state: SessionState,
    pub(crate) completed_parts: Vec<CompletedPart>,
}

impl FailedMultipartUpload {
    /// The key the session was writing to
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The session identifier issued by the service
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    /// The state the session was left in
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Parts that were successfully transferred, ordered by part number
    pub fn completed_parts(&self) -> &[CompletedPart] {
        &self.completed_parts
    }
}

/// Describes the result of aborting an in-progress upload.
#[derive(Debug, Default)]
pub struct AbortedUpload {
    pub(crate) upload_id: Option<String>,
    pub(crate) state: Option<SessionState>,
}

impl AbortedUpload {
    /// Get the multipart upload ID that was cancelled
    ///
    /// Not present for uploads that did not utilize a multipart upload
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// The state the multipart session was left in, if one was created
    pub fn state(&self) -> Option<SessionState> {
        self.state
    }
}

impl From<&FailedMultipartUpload> for AbortedUpload {
    fn from(value: &FailedMultipartUpload) -> Self {
        AbortedUpload {
            upload_id: Some(value.upload_id.clone()),
            state: Some(value.state),
        }
    }
}

#[cfg(test)]
mod test {
    use super::StorageTier;

    #[test]
    fn test_storage_tier_from_str() {
        assert_eq!(StorageTier::Archive, "Archive".parse().unwrap());
        assert_eq!(
            StorageTier::InfrequentAccess,
            StorageTier::InfrequentAccess.as_str().parse().unwrap()
        );
        assert!("Glacier".parse::<StorageTier>().is_err());
    }
}
