/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{self, Error};

/// Types for single object upload operation
pub mod upload;

/// Types for single object copy operation
pub mod copy;

pub(crate) mod multipart;

/// Run `fut` unless `token` is cancelled first
pub(crate) async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(error::operation_cancelled()),
        result = fut => result,
    }
}

/// The token a transfer observes: a child of the caller's token if one was given
pub(crate) fn transfer_token(parent: Option<&CancellationToken>) -> CancellationToken {
    parent
        .map(CancellationToken::child_token)
        .unwrap_or_default()
}
