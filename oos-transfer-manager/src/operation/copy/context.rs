/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::storage::SharedStorage;
use crate::types::{FailedMultipartUploadPolicy, StorageTier};
use crate::Config;

/// Internal context used to drive a single Copy operation
#[derive(Debug, Clone)]
pub(crate) struct CopyContext {
    pub(crate) handle: Arc<crate::client::Handle>,
    pub(crate) source_key: String,
    pub(crate) destination_key: String,
    pub(crate) storage_tier: StorageTier,
    pub(crate) policy: FailedMultipartUploadPolicy,
    pub(crate) token: CancellationToken,
}

impl CopyContext {
    pub(crate) fn config(&self) -> &Config {
        &self.handle.config
    }

    pub(crate) fn storage(&self) -> &SharedStorage {
        self.handle.config.storage()
    }
}
