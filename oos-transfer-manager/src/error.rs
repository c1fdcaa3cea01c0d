/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use aws_sdk_s3::error::ProvideErrorMetadata;

use crate::types::FailedMultipartUpload;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
    failed_upload: Option<Box<FailedMultipartUpload>>,
}

/// General categories of transfer errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues
    InputInvalid,

    /// Size related settings are out of range (chunk size too small, cutoff too large, ...)
    InvalidSizeConfiguration,

    /// A transfer would need more parts than a multipart session accepts
    PartCountExceeded,

    /// I/O errors
    IOError,

    /// Some kind of internal runtime issue (e.g. task failure, poisoned mutex, etc)
    RuntimeError,

    /// Resource not found (e.g. key or multipart upload ID not found)
    NotFound,

    /// The remote service failed in a way that may succeed if the request is retried
    Transient,

    /// The remote service rejected the request
    ServiceError,

    /// Failed to upload or copy a single part of an object
    ChunkFailed(ChunkFailed),

    /// The remote service rejected the request to complete a multipart session
    FinalizeFailed,

    /// Aborting a multipart session failed
    AbortFailed,

    /// A server side copy finished unsuccessfully
    CopyFailed,

    /// Gave up waiting for an asynchronous copy to finish. The remote copy may still complete.
    CopyTimeout,

    /// Data integrity verification failed
    IntegrityCheckFailed,

    /// The operation was cancelled, either by the caller or because the handle was dropped
    OperationCancelled,
}

/// Stores information about a failed chunk
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChunkFailed {
    part_number: u64,
}

impl ChunkFailed {
    /// The 1-based sequence index of the part that failed
    pub fn part_number(&self) -> u64 {
        self.part_number
    }
}

impl Error {
    /// Creates a new transfer [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
            failed_upload: None,
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if retrying the failed request may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Transient
    }

    /// State of the multipart session when the transfer failed.
    ///
    /// Present for any failure that happened after a multipart session was created. It lists the
    /// parts that made it to the service and, if parts were left on error, the upload ID needed
    /// to resume or clean up the session.
    pub fn failed_upload(&self) -> Option<&FailedMultipartUpload> {
        self.failed_upload.as_deref()
    }

    pub(crate) fn with_failed_upload(mut self, failed_upload: FailedMultipartUpload) -> Self {
        self.failed_upload = Some(Box::new(failed_upload));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::InvalidSizeConfiguration => write!(f, "invalid size configuration"),
            ErrorKind::PartCountExceeded => write!(f, "maximum number of parts exceeded"),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::Transient => write!(f, "transient service error"),
            ErrorKind::ServiceError => write!(f, "service error"),
            ErrorKind::ChunkFailed(chunk_failed) => {
                write!(f, "failed to transfer part {}", chunk_failed.part_number)
            }
            ErrorKind::FinalizeFailed => write!(f, "failed to complete multipart upload"),
            ErrorKind::AbortFailed => write!(f, "failed to abort multipart upload"),
            ErrorKind::CopyFailed => write!(f, "copy failed"),
            ErrorKind::CopyTimeout => write!(f, "timed out waiting for copy to complete"),
            ErrorKind::IntegrityCheckFailed => write!(f, "integrity check failed"),
            ErrorKind::OperationCancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error
where
    T: Send + Sync + 'static,
{
    fn from(value: std::sync::PoisonError<T>) -> Self {
        Self::new(ErrorKind::RuntimeError, value.to_string())
    }
}

impl From<aws_smithy_types::error::operation::BuildError> for Error {
    fn from(value: aws_smithy_types::error::operation::BuildError) -> Self {
        Self::new(ErrorKind::InputInvalid, value)
    }
}

impl<E, R> From<aws_sdk_s3::error::SdkError<E, R>> for Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: Send + Sync + fmt::Debug + 'static,
{
    fn from(value: aws_sdk_s3::error::SdkError<E, R>) -> Self {
        use aws_sdk_s3::error::SdkError;

        let kind = match &value {
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::Transient,
            SdkError::ResponseError(_) => ErrorKind::Transient,
            _ => match value.code() {
                Some("NotFound" | "NoSuchKey" | "NoSuchUpload" | "NoSuchBucket") => {
                    ErrorKind::NotFound
                }
                Some("BadDigest" | "InvalidDigest") => ErrorKind::IntegrityCheckFailed,
                Some(
                    "SlowDown" | "Throttling" | "ThrottlingException" | "RequestTimeout"
                    | "InternalError" | "ServiceUnavailable",
                ) => ErrorKind::Transient,
                _ => ErrorKind::ServiceError,
            },
        };

        Error::new(kind, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn invalid_size_configuration<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InvalidSizeConfiguration, err)
}

pub(crate) fn part_count_exceeded(max_parts: u64, part_size: u64) -> Error {
    Error::new(
        ErrorKind::PartCountExceeded,
        format!(
            "stream exceeded the maximum of {max_parts} parts of {part_size} bytes; \
             increase the chunk size to upload larger streams of unknown size"
        ),
    )
}

pub(crate) fn chunk_failed<E>(part_number: u64, err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::ChunkFailed(ChunkFailed { part_number }), err)
}

pub(crate) fn from_kind<E>(kind: ErrorKind) -> impl FnOnce(E) -> Error
where
    E: Into<BoxError>,
{
    |err| Error::new(kind, err)
}

static CANCELLATION_ERROR: &str = "the transfer was cancelled before it could complete";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::OperationCancelled, CANCELLATION_ERROR)
}

#[cfg(test)]
mod test {
    use super::{chunk_failed, Error, ErrorKind};

    #[test]
    fn test_chunk_failed_reports_part_number() {
        let err = chunk_failed(7, "connection reset");
        match err.kind() {
            ErrorKind::ChunkFailed(chunk) => assert_eq!(7, chunk.part_number()),
            kind => panic!("unexpected kind {kind:?}"),
        }
        assert_eq!("failed to transfer part 7", err.to_string());
    }

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(Error::new(ErrorKind::Transient, "slow down").is_retryable());
        assert!(!Error::new(ErrorKind::ServiceError, "denied").is_retryable());
        assert!(!super::operation_cancelled().is_retryable());
    }
}
