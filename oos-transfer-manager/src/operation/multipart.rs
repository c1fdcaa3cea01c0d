/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Machinery shared by every operation that assembles an object from a multipart session.

use std::future::Future;

use tower::{service_fn, Service, ServiceBuilder};

use crate::error::{Error, ErrorKind};
use crate::middleware::retry::RetryPolicy;
use crate::storage::CompletedPart;
use crate::types::{AbortedUpload, SessionState};
use crate::Config;

pub(crate) mod resolver;
pub(crate) mod scheduler;
pub(crate) mod session;

/// Wrap a single part request in the layers every part transfer goes through.
///
/// The concurrency limit is the only bound on parts in flight (and parts buffered) for one
/// transfer. Transient failures are retried underneath it, so a retry keeps its slot.
pub(crate) fn part_service<Req, F, Fut>(
    config: &Config,
    send: F,
) -> impl Service<Req, Response = CompletedPart, Error = Error, Future: Send + 'static> + Send
where
    Req: Clone + Send + 'static,
    F: FnMut(Req) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<CompletedPart, Error>> + Send + 'static,
{
    ServiceBuilder::new()
        .concurrency_limit(config.upload_concurrency())
        .retry(RetryPolicy::new(config.part_retry_attempts()))
        .service(service_fn(send))
}

/// Map the error a cancelled transfer ended with to the result of aborting it.
///
/// A transfer that never created a session has nothing to report. A session whose abort failed
/// turns into [`ErrorKind::AbortFailed`] so the caller knows parts may remain.
pub(crate) fn aborted(err: Error) -> Result<AbortedUpload, Error> {
    match err.failed_upload() {
        Some(report) if report.state() == SessionState::AbortAttempted => {
            let report = report.clone();
            Err(Error::new(ErrorKind::AbortFailed, err).with_failed_upload(report))
        }
        Some(report) => Ok(AbortedUpload::from(report)),
        None if *err.kind() == ErrorKind::OperationCancelled => Ok(AbortedUpload::default()),
        None => Err(err),
    }
}
