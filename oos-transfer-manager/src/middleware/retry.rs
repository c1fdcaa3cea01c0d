/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use futures_util::future;
use tower::retry::budget::{Budget, TpsBudget};

use crate::error::Error;

/// A `tower::retry::Policy` that retries part requests failing with a transient error
#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    budget: Arc<TpsBudget>,
    remaining_attempts: usize,
}

impl RetryPolicy {
    /// Retry each request at most `attempts` times
    pub(crate) fn new(attempts: usize) -> Self {
        Self {
            budget: Arc::new(TpsBudget::default()),
            remaining_attempts: attempts,
        }
    }
}

impl<Req, Res> tower::retry::Policy<Req, Res, Error> for RetryPolicy
where
    Req: Clone,
{
    type Future = future::Ready<()>;

    fn retry(&mut self, _req: &mut Req, result: &mut Result<Res, Error>) -> Option<Self::Future> {
        match result {
            Ok(_) => {
                self.budget.deposit();
                None
            }
            Err(err) => {
                if !err.is_retryable() || self.remaining_attempts == 0 || !self.budget.withdraw()
                {
                    return None;
                }
                self.remaining_attempts -= 1;
                tracing::debug!(
                    remaining_attempts = self.remaining_attempts,
                    "retrying request after transient error: {err}"
                );
                Some(future::ready(()))
            }
        }
    }

    fn clone_request(&mut self, req: &Req) -> Option<Req> {
        Some(req.clone())
    }
}
