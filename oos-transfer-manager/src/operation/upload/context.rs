/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::storage::SharedStorage;
use crate::types::{FailedMultipartUploadPolicy, StorageTier};
use crate::Config;

/// Internal context used to drive a single Upload operation
#[derive(Debug, Clone)]
pub(crate) struct UploadContext {
    /// reference to client handle used to do actual work
    pub(crate) handle: Arc<crate::client::Handle>,
    pub(crate) key: String,
    /// request override or the client default
    pub(crate) storage_tier: StorageTier,
    /// request override or the client default
    pub(crate) policy: FailedMultipartUploadPolicy,
    /// cancelled by the handle, or by the caller's token
    pub(crate) token: CancellationToken,
}

impl UploadContext {
    pub(crate) fn config(&self) -> &Config {
        &self.handle.config
    }

    /// The storage to use for remote operations
    pub(crate) fn storage(&self) -> &SharedStorage {
        self.handle.config.storage()
    }
}
