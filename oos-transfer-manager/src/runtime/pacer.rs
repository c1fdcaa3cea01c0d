/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::future::Future;
use std::time::Duration;

use aws_smithy_async::rt::sleep::{AsyncSleep, SharedAsyncSleep};
use aws_smithy_async::time::SharedTimeSource;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{self, Error, ErrorKind};
use crate::storage::CopyStatus;

/// Shortest interval between two status polls
pub(crate) const MIN_SLEEP: Duration = Duration::from_millis(100);

/// Longest interval between two status polls
pub(crate) const MAX_SLEEP: Duration = Duration::from_secs(5 * 60);

/// Controls how fast the poll interval approaches [`MAX_SLEEP`]
pub(crate) const DECAY_CONSTANT: u32 = 1;

// keeps the shift below well inside u128
const MAX_DECAY_CONSTANT: u32 = 32;

/// The interval to wait after another "still in progress" observation.
///
/// The interval grows by a factor of `2^k / (2^k - 1)` with `k = max(decay_constant, 1)`, so a
/// larger decay constant approaches `max` more slowly. The result is clamped to `[min, max]`.
pub(crate) fn next_sleep(current: Duration, min: Duration, max: Duration, decay_constant: u32) -> Duration {
    let k = decay_constant.clamp(1, MAX_DECAY_CONSTANT);
    let grown = (current.as_nanos() << k) / ((1u128 << k) - 1);
    let grown = Duration::from_nanos(u64::try_from(grown).unwrap_or(u64::MAX));
    grown.clamp(min, max)
}

/// Spaces out repeated status checks of a single asynchronous operation
#[derive(Debug, Clone)]
pub(crate) struct Pacer {
    current: Duration,
    min_sleep: Duration,
    max_sleep: Duration,
    decay_constant: u32,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(MIN_SLEEP, MAX_SLEEP, DECAY_CONSTANT)
    }
}

impl Pacer {
    pub(crate) fn new(min_sleep: Duration, max_sleep: Duration, decay_constant: u32) -> Self {
        let max_sleep = max_sleep.max(min_sleep);
        Self {
            current: min_sleep,
            min_sleep,
            max_sleep,
            decay_constant,
        }
    }

    /// The interval to sleep before the next poll
    pub(crate) fn current(&self) -> Duration {
        self.current
    }

    fn grow(&mut self) {
        self.current = next_sleep(
            self.current,
            self.min_sleep,
            self.max_sleep,
            self.decay_constant,
        );
    }
}

/// Poll an asynchronous copy until it reaches a terminal state.
///
/// Every poll is preceded by a sleep of the current pacer interval, cut short so it never runs
/// past the deadline. The poll made at the deadline is the last one: if the copy is still in
/// progress then, polling stops with [`ErrorKind::CopyTimeout`]. The remote copy itself is left
/// alone and may still complete.
/// Cancelling `token` stops polling without touching the remote operation.
pub(crate) async fn wait_for_copy<F, Fut>(
    mut pacer: Pacer,
    time_source: &SharedTimeSource,
    sleep_impl: &SharedAsyncSleep,
    timeout: Duration,
    token: &CancellationToken,
    mut poll: F,
) -> Result<(), Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CopyStatus, Error>>,
{
    let start = time_source.now();
    let deadline = start + timeout;
    let mut polls = 0u32;

    loop {
        let remaining = deadline
            .duration_since(time_source.now())
            .unwrap_or_default();
        tokio::select! {
            biased;
            _ = token.cancelled() => return Err(error::operation_cancelled()),
            _ = sleep_impl.sleep(pacer.current().min(remaining)) => {}
        }

        polls += 1;
        let status = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(error::operation_cancelled()),
            status = poll().instrument(tracing::debug_span!("poll-copy-status", polls)) => status?,
        };

        match status {
            CopyStatus::Succeeded => {
                tracing::debug!(polls, "copy succeeded");
                return Ok(());
            }
            CopyStatus::Failed(reason) => {
                return Err(Error::new(ErrorKind::CopyFailed, reason));
            }
            CopyStatus::InProgress => {
                let now = time_source.now();
                if now >= deadline {
                    let elapsed = now.duration_since(start).unwrap_or_default();
                    tracing::warn!(
                        polls,
                        "gave up waiting for copy after {elapsed:?}; it may still complete"
                    );
                    return Err(Error::new(
                        ErrorKind::CopyTimeout,
                        format!("copy still in progress after {elapsed:?}"),
                    ));
                }
                pacer.grow();
                tracing::trace!(next = ?pacer.current(), "copy in progress");
            }
        }
    }
}
